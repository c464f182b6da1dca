use std::{
    io::{stdout, Write},
    path::PathBuf,
};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::Parser;
use itertools::Itertools;

use mock_datasets::{
    config::MockConfig,
    config_file::LoadConfigFile,
    get_terminal_width::get_terminal_width,
    info,
    registry::{GenerationOptions, Registry},
    terminal_table::{write_dataset_table, TerminalTable},
    utillib::logging::{set_log_level, LogLevelOpt},
};

const PROGRAM_NAME: &str = "mock-datasets";
const PROGRAM_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(clap::Parser, Debug)]
#[clap(next_line_help = true)]
#[clap(term_width = get_terminal_width())]
/// Generate synthetic time series datasets from a config file and
/// inspect them.
struct Opts {
    #[clap(flatten)]
    log_level: LogLevelOpt,

    /// Path to the config file (.json5, .json, .yml, .yaml or .hcl).
    /// Default: `~/.mock-datasets.*`
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Seed for the random values (overrides the config file)
    #[clap(long)]
    seed: Option<u64>,

    /// Number of days before now to generate data for (overrides
    /// the config file)
    #[clap(long)]
    lookback_days: Option<u32>,

    /// The subcommand to run. Use `--help` after the sub-command to
    /// get a list of the allowed options there.
    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Print version
    Version,

    /// List the names of the datasets
    List,

    /// List the metric ids with their dataset and metric name
    Metrics {
        /// Print as tab-separated values, without padding
        #[clap(long)]
        tsv: bool,
    },

    /// Print the generated table of a dataset
    Show {
        dataset: String,

        /// Print as tab-separated values, without padding
        #[clap(long)]
        tsv: bool,

        /// Print at most this many rows
        #[clap(short, long)]
        limit: Option<usize>,
    },

    /// Show the distinct values of every dimension of a dataset, and
    /// its latest time
    Filters { dataset: String },
}

fn build_registry(
    config_path: Option<PathBuf>,
    seed: Option<u64>,
    lookback_days: Option<u32>,
) -> Result<Registry> {
    let mut config = MockConfig::load_config(config_path, |msg| {
        Err(anyhow!("no config file found: {msg}"))
    })?;
    if let Some(days) = lookback_days {
        config.lookback_days = Some(days);
    }
    let mut options = GenerationOptions::from_config(&config, Utc::now())?;
    if seed.is_some() {
        options.seed = seed;
    }
    info!("loaded {} dataset(s)", config.datasets.len());
    Registry::build(&config, &options).context("generating the datasets")
}

fn main() -> Result<()> {
    let Opts {
        log_level,
        config,
        seed,
        lookback_days,
        command,
    } = Opts::parse();
    set_log_level(log_level.try_into()?);

    let registry = || build_registry(config.clone(), seed, lookback_days);
    let mut out = stdout().lock();

    match command {
        Command::Version => writeln!(out, "{PROGRAM_NAME} version {PROGRAM_VERSION}")?,

        Command::List => {
            for name in registry()?.list_datasets() {
                writeln!(out, "{name}")?;
            }
        }

        Command::Metrics { tsv } => {
            let registry = registry()?;
            let table = TerminalTable::new(&[8, 20], &["id", "dataset", "metric"], tsv);
            table.write_title_row(&mut out)?;
            for (id, r) in registry.metric_ids() {
                table.write_data_row(
                    &[id.to_string(), r.dataset.to_string(), r.metric.to_string()],
                    &mut out,
                )?;
            }
        }

        Command::Show {
            dataset,
            tsv,
            limit,
        } => {
            let registry = registry()?;
            write_dataset_table(registry.resolve(&dataset)?, limit, tsv, &mut out)?;
        }

        Command::Filters { dataset } => {
            let registry = registry()?;
            for (dimension, values) in registry.dimension_filters(&dataset)? {
                writeln!(out, "{dimension}: {}", values.iter().join(", "))?;
            }
            match registry.max_time(&dataset)? {
                Some(t) => writeln!(out, "max time: {t}")?,
                None => writeln!(out, "max time: none (no rows)")?,
            }
            writeln!(out, "window: {}", registry.window())?;
        }
    }
    Ok(())
}
