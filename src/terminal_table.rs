//! Printing tables either for humans (padded columns, bold italic
//! title row) or as TSV (tab separated, no ANSI codes). Fields are
//! printed via `Display` without escaping, thus values must not
//! contain tabs or newlines.

use std::{fmt::Display, io::Write};

use anyhow::{bail, Result};
use chrono::{SecondsFormat, TimeZone, Utc};
use itertools::{EitherOrBoth, Itertools};
use yansi::{Paint, Style};

use crate::table::DatasetTable;

/// Streams rows, which requires knowing the column widths up front.
/// A value wider than its column still gets one space after it. The
/// last column has no width and is not padded.
pub struct TerminalTable {
    widths: Vec<usize>,
    titles: Vec<String>,
    padding: String,
    pub tsv_mode: bool,
}

impl TerminalTable {
    /// `widths` must be one shorter than `titles`. A space is
    /// appended to each title so that italics are not clipped.
    pub fn new<S: Display>(widths: &[usize], titles: &[S], tsv_mode: bool) -> Self {
        let titles = titles.iter().map(|title| format!("{title} ")).collect();
        let max_width = widths.iter().max().copied().unwrap_or(0);
        Self {
            widths: widths.to_owned(),
            titles,
            padding: " ".repeat(max_width),
            tsv_mode,
        }
    }

    fn write_row<V: Display>(
        &self,
        row: &[V],
        style: Option<Style>,
        out: &mut impl Write,
    ) -> Result<()> {
        if row.is_empty() || self.widths.len() != row.len() - 1 {
            bail!(
                "need one more value than widths, got {} values for {} widths",
                row.len(),
                self.widths.len()
            )
        }
        for (i, cell) in self.widths.iter().zip_longest(row).enumerate() {
            if self.tsv_mode && i > 0 {
                out.write_all(b"\t")?;
            }
            let (width, val) = match cell {
                EitherOrBoth::Both(width, val) => (Some(*width), val),
                EitherOrBoth::Right(val) => (None, val),
                EitherOrBoth::Left(_) => unreachable!("row length checked above"),
            };
            let s = val.to_string();
            match style {
                Some(style) => write!(out, "{}", s.as_str().paint(style))?,
                None => out.write_all(s.as_bytes())?,
            }
            if let (Some(width), false) = (width, self.tsv_mode) {
                let needed = width.saturating_sub(s.len()).max(1);
                match self.padding.get(..needed) {
                    Some(padding) => out.write_all(padding.as_bytes())?,
                    None => out.write_all(b" ")?,
                }
            }
        }
        out.write_all(b"\n")?;
        Ok(())
    }

    pub fn write_title_row(&self, out: &mut impl Write) -> Result<()> {
        const STYLE: Style = Style::new().bold().italic();
        self.write_row(&self.titles, (!self.tsv_mode).then_some(STYLE), out)
    }

    pub fn write_data_row<V: Display>(&self, data: &[V], out: &mut impl Write) -> Result<()> {
        self.write_row(data, None, out)
    }
}

fn format_time(millis: i64) -> String {
    match Utc.timestamp_millis_opt(millis).single() {
        Some(t) => t.to_rfc3339_opts(SecondsFormat::Secs, true),
        None => millis.to_string(),
    }
}

/// The cells of the first `limit` rows of `table`, as strings, in
/// schema order. Missing values are empty in TSV mode, "-" otherwise.
pub fn dataset_table_cells(
    table: &DatasetTable,
    limit: Option<usize>,
    tsv_mode: bool,
) -> Vec<Vec<String>> {
    let missing = if tsv_mode { "" } else { "-" };
    table
        .rows()
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|row| {
            let mut cells = vec![format_time(row.key.time)];
            cells.extend(row.key.dimensions.iter().map(|d| d.to_string()));
            cells.extend(row.val.iter().map(|v| match v {
                Some(v) => v.to_string(),
                None => missing.to_string(),
            }));
            cells
        })
        .collect()
}

/// Print the first `limit` rows of `table`, with a title row.
pub fn write_dataset_table(
    table: &DatasetTable,
    limit: Option<usize>,
    tsv_mode: bool,
    out: &mut impl Write,
) -> Result<()> {
    let titles = table.column_names();
    let cells = dataset_table_cells(table, limit, tsv_mode);
    let widths: Vec<usize> = (0..titles.len() - 1)
        .map(|i| {
            let widest = cells
                .iter()
                .map(|row| row[i].len())
                .chain([titles[i].len() + 1])
                .max()
                .unwrap_or(0);
            widest + 2
        })
        .collect();
    let terminal_table = TerminalTable::new(&widths, &titles, tsv_mode);
    terminal_table.write_title_row(out)?;
    for row in &cells {
        terminal_table.write_data_row(row, out)?;
    }
    Ok(())
}
