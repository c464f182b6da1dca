use terminal_size::{terminal_size, Width};

/// Width of the terminal on stdout, or 120 if not a terminal.
pub fn get_terminal_width() -> usize {
    terminal_size()
        .map(|(Width(w), _)| w.into())
        .unwrap_or(120)
}
