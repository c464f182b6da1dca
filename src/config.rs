//! The raw configuration, as read from a file. Validated into
//! `DatasetSpec`s by the registry.

use std::{collections::BTreeMap, path::PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config_file::LoadConfigFile;

/// File name below $HOME (without extension) of the default config
/// file.
const DEFAULT_CONFIG_FILE_NAME: &str = ".mock-datasets";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MockConfig {
    /// Makes the generated values reproducible. Without it, only the
    /// structure of the data is.
    pub seed: Option<u64>,

    /// How many days before now the generated data starts (default
    /// 28).
    pub lookback_days: Option<u32>,

    #[serde(default)]
    pub datasets: BTreeMap<String, DatasetConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetConfig {
    /// IANA time zone id; default "America/Los_Angeles"
    pub timezone: Option<String>,

    /// Names of the dimensions, in the order of nesting in `metrics`
    #[serde(default)]
    pub dimensions: Vec<String>,

    /// E.g. "1hour", "15 minutes", "1d"; default "1hour"
    pub granularity: Option<String>,

    /// Metric name to nested dimension values to `{ mean, std }`.
    /// Kept raw here, it can only be checked against `dimensions`.
    pub metrics: Option<Value>,
}

impl LoadConfigFile for MockConfig {
    fn default_config_path_without_suffix() -> Result<Option<PathBuf>> {
        Ok(std::env::var_os("HOME").map(|home| PathBuf::from(home).join(DEFAULT_CONFIG_FILE_NAME)))
    }
}
