//! Building all datasets of a configuration, and looking them up
//! afterwards.
//!
//! Construction is one call, `Registry::build`, which first validates
//! the whole configuration, then synthesizes every leaf series (in
//! parallel), then assembles and merges the tables and assigns the
//! metric ids (sequentially, in lexicographic dataset and metric
//! order). It either returns a complete `Registry` or an error; the
//! result is immutable and can be shared between threads freely.

use std::{collections::BTreeMap, fmt::Display};

use chrono::{DateTime, Utc};
use kstring::KString;
use rayon::prelude::*;

use crate::{
    config::MockConfig,
    config_tree::GeneratorParams,
    dataset::DatasetSpec,
    date_and_time::{TimeWindow, DEFAULT_LOOKBACK_DAYS},
    debug,
    enumerate::metric_leaf_paths,
    error::{LookupKind, MockDataError},
    info,
    leaf_path::LeafPath,
    merge::merge_dataset,
    series::{leaf_rng, synthesize, RawSeries},
    table::{DatasetTable, MetricTable},
    warn,
};

/// Handle for a metric of a dataset, unique within a `Registry`.
/// Assigned from 1 upwards in (dataset, metric) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricId(pub u64);

impl Display for MetricId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricRef {
    pub dataset: KString,
    pub metric: KString,
}

impl Display for MetricRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self { dataset, metric } = self;
        write!(f, "{dataset}/{metric}")
    }
}

/// What the generation depends on besides the datasets themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub window: TimeWindow,
    /// None: draw from entropy, values differ between runs
    pub seed: Option<u64>,
}

impl GenerationOptions {
    /// The `lookback_days` (default 28) days up to `now`, and the
    /// configured seed.
    pub fn from_config(config: &MockConfig, now: DateTime<Utc>) -> Result<Self, MockDataError> {
        let days = config.lookback_days.unwrap_or(DEFAULT_LOOKBACK_DAYS);
        Ok(Self {
            window: TimeWindow::last_days(now, days)?,
            seed: config.seed,
        })
    }
}

/// The leaves of one metric, with the parameters for each.
struct MetricJob {
    metric: KString,
    leaves: Vec<(LeafPath, GeneratorParams)>,
}

struct DatasetJob {
    spec: DatasetSpec,
    metrics: Vec<MetricJob>,
}

impl DatasetJob {
    fn new(spec: DatasetSpec) -> Result<Self, MockDataError> {
        let mut metrics = Vec::with_capacity(spec.metrics.len());
        for (metric, tree) in &spec.metrics {
            let paths = metric_leaf_paths(&spec.name, metric, tree, spec.dimensions.len())?;
            let leaves = paths
                .into_iter()
                .map(|path| {
                    let params = tree.params_at(path.dimension_values()).ok_or_else(|| {
                        MockDataError::malformed(path.to_string(), "no parameters for leaf")
                    })?;
                    Ok((path, params))
                })
                .collect::<Result<Vec<_>, MockDataError>>()?;
            if leaves.is_empty() {
                warn!(
                    "metric {}/{metric} has no leaves, its column will be empty",
                    spec.name
                );
            }
            metrics.push(MetricJob {
                metric: metric.clone(),
                leaves,
            });
        }
        Ok(Self { spec, metrics })
    }
}

#[derive(Debug, Clone)]
pub struct Registry {
    window: TimeWindow,
    datasets: BTreeMap<KString, DatasetTable>,
    /// Index is id - 1
    metrics: Vec<MetricRef>,
}

impl Registry {
    pub fn build(config: &MockConfig, options: &GenerationOptions) -> Result<Self, MockDataError> {
        let specs = config
            .datasets
            .iter()
            .map(|(name, dataset)| DatasetSpec::from_config(name, dataset))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_specs(specs, options)
    }

    /// Generate from already validated datasets. Their order does not
    /// matter; names must be unique.
    pub fn from_specs(
        mut specs: Vec<DatasetSpec>,
        options: &GenerationOptions,
    ) -> Result<Self, MockDataError> {
        let GenerationOptions { window, seed } = options;
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(pair) = specs.windows(2).find(|pair| pair[0].name == pair[1].name) {
            return Err(MockDataError::malformed(
                pair[0].name.as_str(),
                "dataset name used more than once",
            ));
        }
        info!(
            "generating {} dataset(s) over {window}{}",
            specs.len(),
            if seed.is_some() { ", seeded" } else { "" }
        );

        let jobs = specs
            .into_iter()
            .map(DatasetJob::new)
            .collect::<Result<Vec<_>, _>>()?;

        let series: Vec<RawSeries> = {
            let leaves: Vec<(&DatasetSpec, &LeafPath, &GeneratorParams)> = jobs
                .iter()
                .flat_map(|job| {
                    job.metrics.iter().flat_map(move |metric| {
                        metric
                            .leaves
                            .iter()
                            .map(move |(path, params)| (&job.spec, path, params))
                    })
                })
                .collect();
            leaves
                .par_iter()
                .map(|&(spec, path, params)| {
                    debug!("generating {path}");
                    let mut rng = leaf_rng(*seed, path);
                    synthesize(params, window, &spec.granularity, &spec.timezone, &mut rng)
                })
                .collect::<Result<_, _>>()?
        };

        // In job order
        let mut series = series.into_iter();
        let mut datasets = BTreeMap::new();
        let mut metrics = Vec::new();
        for DatasetJob {
            spec,
            metrics: metric_jobs,
        } in jobs
        {
            let mut tables = Vec::with_capacity(metric_jobs.len());
            for MetricJob { metric, leaves } in metric_jobs {
                let metric_series: Vec<RawSeries> = series.by_ref().take(leaves.len()).collect();
                let table = MetricTable::assemble(
                    &metric,
                    &spec.dimensions,
                    leaves.iter().map(|(path, _)| path).zip(&metric_series),
                )?;
                debug!("metric {}/{metric}: {} rows", spec.name, table.len());
                tables.push(table);
                metrics.push(MetricRef {
                    dataset: spec.name.clone(),
                    metric,
                });
            }
            let table = merge_dataset(&spec.name, &spec.dimensions, &spec.metric_names(), tables)?;
            info!(
                "dataset {}: {} rows, {} columns",
                spec.name,
                table.len(),
                table.schema().len()
            );
            datasets.insert(spec.name, table);
        }

        Ok(Self {
            window: *window,
            datasets,
            metrics,
        })
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    /// The table of `dataset`.
    pub fn resolve(&self, dataset: &str) -> Result<&DatasetTable, MockDataError> {
        self.datasets
            .get(dataset)
            .ok_or_else(|| MockDataError::not_found(LookupKind::Dataset, dataset))
    }

    /// Sorted
    pub fn list_datasets(&self) -> Vec<&str> {
        self.datasets.keys().map(|name| name.as_str()).collect()
    }

    pub fn metric(&self, id: MetricId) -> Result<&MetricRef, MockDataError> {
        id.0.checked_sub(1)
            .and_then(|i| usize::try_from(i).ok())
            .and_then(|i| self.metrics.get(i))
            .ok_or_else(|| MockDataError::not_found(LookupKind::MetricId, id))
    }

    pub fn metric_name(&self, id: MetricId) -> Result<&str, MockDataError> {
        Ok(&self.metric(id)?.metric)
    }

    pub fn metric_id(&self, dataset: &str, metric: &str) -> Result<MetricId, MockDataError> {
        // Sorted by (dataset, metric)
        self.metrics
            .binary_search_by(|r| (r.dataset.as_str(), r.metric.as_str()).cmp(&(dataset, metric)))
            .map(|i| MetricId(i as u64 + 1))
            .map_err(|_| MockDataError::not_found(LookupKind::Metric, format!("{dataset}/{metric}")))
    }

    /// All assignments, in id order.
    pub fn metric_ids(&self) -> impl Iterator<Item = (MetricId, &MetricRef)> {
        self.metrics
            .iter()
            .enumerate()
            .map(|(i, r)| (MetricId(i as u64 + 1), r))
    }

    /// The latest time in `dataset`, None if it has no rows.
    pub fn max_time(&self, dataset: &str) -> Result<Option<i64>, MockDataError> {
        Ok(self.resolve(dataset)?.max_time())
    }

    /// Distinct values per dimension of `dataset`.
    pub fn dimension_filters(
        &self,
        dataset: &str,
    ) -> Result<BTreeMap<KString, Vec<KString>>, MockDataError> {
        Ok(self.resolve(dataset)?.dimension_filters())
    }
}
