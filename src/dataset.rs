//! A validated dataset configuration.

use std::collections::{BTreeMap, BTreeSet};

use chrono_tz::Tz;
use kstring::KString;

use crate::{
    config::DatasetConfig,
    config_tree::ConfigTree,
    date_and_time::{parse_timezone, DEFAULT_TIMEZONE},
    error::MockDataError,
    leaf_path::METRICS_SEGMENT,
    period::{Period, DEFAULT_GRANULARITY},
    table::COL_TIME,
};

/// Everything needed to generate one dataset. Once constructed, the
/// metric trees match `dimensions` in depth and the column names of
/// the resulting table are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSpec {
    pub name: KString,
    pub timezone: Tz,
    pub dimensions: Vec<KString>,
    pub granularity: Period,
    /// Sorted by metric name
    pub metrics: BTreeMap<KString, ConfigTree>,
}

impl DatasetSpec {
    pub fn from_config(name: &str, config: &DatasetConfig) -> Result<Self, MockDataError> {
        let DatasetConfig {
            timezone,
            dimensions,
            granularity,
            metrics,
        } = config;

        let timezone = parse_timezone(timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE))?;
        let granularity: Period = granularity
            .as_deref()
            .unwrap_or(DEFAULT_GRANULARITY)
            .parse()?;

        let mut columns = BTreeSet::from([COL_TIME]);
        for dimension in dimensions {
            if !columns.insert(dimension.as_str()) {
                return Err(MockDataError::malformed(
                    format!("{name}/dimensions"),
                    format!("dimension name {dimension:?} is used twice or is reserved"),
                ));
            }
        }

        let metrics_context = format!("{name}/{METRICS_SEGMENT}");
        let metrics = metrics
            .as_ref()
            .ok_or_else(|| MockDataError::malformed(&metrics_context, "missing metrics map"))?;
        let metrics = metrics.as_object().ok_or_else(|| {
            MockDataError::malformed(
                &metrics_context,
                format!("expecting an object keyed by metric name, got {metrics}"),
            )
        })?;
        let mut trees = BTreeMap::new();
        for (metric, value) in metrics {
            let context = format!("{metrics_context}/{metric}");
            if columns.contains(metric.as_str()) {
                return Err(MockDataError::malformed(
                    context,
                    "metric name collides with a dimension or the time column",
                ));
            }
            trees.insert(
                KString::from_ref(metric),
                ConfigTree::from_value(value, dimensions.len(), &context)?,
            );
        }

        Ok(Self {
            name: KString::from_ref(name),
            timezone,
            dimensions: dimensions.iter().map(|d| KString::from_ref(d)).collect(),
            granularity,
            metrics: trees,
        })
    }

    pub fn metric_names(&self) -> Vec<KString> {
        self.metrics.keys().cloned().collect()
    }
}
