//! In-memory tables: `MetricTable` holds the rows of one metric
//! (union of all its leaves), `DatasetTable` the wide table of a
//! whole dataset. Both are logically indexed by `RowKey`, i.e. time
//! plus the values of the dataset's dimensions in declared order.

use std::{borrow::Cow, collections::BTreeMap, fmt::Display};

use kstring::KString;

use crate::{
    error::MockDataError,
    join::{first_duplicate_key, KeyVal},
    leaf_path::LeafPath,
    series::RawSeries,
};

/// Name of the time column.
pub const COL_TIME: &str = "time";

/// Name of the value column of a raw series, before it is renamed to
/// the metric it belongs to.
pub const COL_VALUE: &str = "value";

/// The composite index key. Orders by time first, then by the
/// dimension values.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey {
    /// Epoch milliseconds
    pub time: i64,
    pub dimensions: Vec<KString>,
}

impl Display for RowKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self { time, dimensions } = self;
        write!(f, "({time}")?;
        for d in dimensions {
            write!(f, ", {d}")?;
        }
        f.write_str(")")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Epoch milliseconds
    Long,
    String,
    Double,
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ColumnType::Long => "LONG",
            ColumnType::String => "STRING",
            ColumnType::Double => "DOUBLE",
        })
    }
}

/// The rows of one metric, in the order they were assembled in.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTable {
    metric: KString,
    dimensions: Vec<KString>,
    rows: Vec<KeyVal<RowKey, f64>>,
}

impl MetricTable {
    /// Turn the series of all leaves of `metric` into one table. Each
    /// leaf contributes one row per series point, tagged with the
    /// leaf's dimension values (the `LeafPath` suffix, positionally
    /// matched with `dimensions`). Plain concatenation: nothing is
    /// deduplicated or reordered.
    pub fn assemble<'l>(
        metric: &str,
        dimensions: &[KString],
        leaves: impl IntoIterator<Item = (&'l LeafPath, &'l RawSeries)>,
    ) -> Result<Self, MockDataError> {
        let mut rows = Vec::new();
        for (path, series) in leaves {
            let values = path.dimension_values();
            if values.len() != dimensions.len() {
                return Err(MockDataError::malformed(
                    path.to_string(),
                    format!(
                        "path has {} dimension value(s), dataset declares {} dimension(s) {:?}",
                        values.len(),
                        dimensions.len(),
                        dimensions
                    ),
                ));
            }
            if let Some(path_metric) = path.metric() {
                if path_metric != metric {
                    return Err(MockDataError::malformed(
                        path.to_string(),
                        format!("leaf does not belong to metric {metric:?}"),
                    ));
                }
            }
            rows.reserve(series.len());
            for point in series.points() {
                rows.push(KeyVal {
                    key: RowKey {
                        time: point.time,
                        dimensions: values.to_vec(),
                    },
                    val: point.value,
                });
            }
        }
        Ok(Self {
            metric: KString::from_ref(metric),
            dimensions: dimensions.to_vec(),
            rows,
        })
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn dimensions(&self) -> &[KString] {
        &self.dimensions
    }

    pub fn rows(&self) -> &[KeyVal<RowKey, f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `time`, the dimensions, and the metric itself in place of
    /// `COL_VALUE`.
    pub fn column_names(&self) -> Vec<&str> {
        let mut names = vec![COL_TIME];
        names.extend(self.dimensions.iter().map(|d| d.as_str()));
        names.push(&self.metric);
        names
    }

    /// The rows sorted by their index key. Errors if a key appears
    /// twice, which can only come from a broken model.
    pub fn into_indexed(self) -> Result<Vec<KeyVal<RowKey, f64>>, MockDataError> {
        let Self {
            metric,
            dimensions: _,
            mut rows,
        } = self;
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        if let Some(key) = first_duplicate_key(&rows) {
            return Err(MockDataError::DuplicateKey {
                metric: metric.to_string(),
                key: key.to_string(),
            });
        }
        Ok(rows)
    }
}

/// One row per distinct `RowKey` over all metrics of the dataset,
/// with one (possibly missing) value per metric. Rows are sorted by
/// key.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetTable {
    name: KString,
    dimensions: Vec<KString>,
    /// Sorted
    metrics: Vec<KString>,
    rows: Vec<KeyVal<RowKey, Vec<Option<f64>>>>,
}

impl DatasetTable {
    /// A table with all columns but no rows. `metrics` are sorted and
    /// deduplicated.
    pub fn empty(name: &str, dimensions: &[KString], metrics: &[KString]) -> Self {
        let mut metrics = metrics.to_vec();
        metrics.sort();
        metrics.dedup();
        Self {
            name: KString::from_ref(name),
            dimensions: dimensions.to_vec(),
            metrics,
            rows: Vec::new(),
        }
    }

    /// Only for the merger, which keeps `rows` sorted and matching
    /// the metric columns.
    pub(crate) fn replace_rows(&mut self, rows: Vec<KeyVal<RowKey, Vec<Option<f64>>>>) {
        self.rows = rows;
    }

    pub(crate) fn take_rows(&mut self) -> Vec<KeyVal<RowKey, Vec<Option<f64>>>> {
        std::mem::take(&mut self.rows)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> &[KString] {
        &self.dimensions
    }

    pub fn metrics(&self) -> &[KString] {
        &self.metrics
    }

    pub fn rows(&self) -> &[KeyVal<RowKey, Vec<Option<f64>>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names and types: `time`, then the dimensions, then the
    /// metrics.
    pub fn schema(&self) -> Vec<(Cow<'_, str>, ColumnType)> {
        let mut schema = vec![(Cow::Borrowed(COL_TIME), ColumnType::Long)];
        for d in &self.dimensions {
            schema.push((Cow::Borrowed(d.as_str()), ColumnType::String));
        }
        for m in &self.metrics {
            schema.push((Cow::Borrowed(m.as_str()), ColumnType::Double));
        }
        schema
    }

    pub fn column_names(&self) -> Vec<&str> {
        let mut names = vec![COL_TIME];
        names.extend(self.dimensions.iter().map(|d| d.as_str()));
        names.extend(self.metrics.iter().map(|m| m.as_str()));
        names
    }

    pub fn metric_index(&self, metric: &str) -> Option<usize> {
        self.metrics.binary_search_by(|m| m.as_str().cmp(metric)).ok()
    }

    pub fn dimension_index(&self, dimension: &str) -> Option<usize> {
        self.dimensions.iter().position(|d| d.as_str() == dimension)
    }

    pub fn times(&self) -> impl Iterator<Item = i64> + '_ {
        self.rows.iter().map(|row| row.key.time)
    }

    pub fn dimension_column(&self, dimension: &str) -> Option<Vec<&str>> {
        let i = self.dimension_index(dimension)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.key.dimensions[i].as_str())
                .collect(),
        )
    }

    pub fn metric_column(&self, metric: &str) -> Option<Vec<Option<f64>>> {
        let i = self.metric_index(metric)?;
        Some(self.rows.iter().map(|row| row.val[i]).collect())
    }

    /// The value of `metric` at `key`: None if there is no such row
    /// or column, Some(None) if the row exists but has no value for
    /// the metric.
    pub fn get(&self, key: &RowKey, metric: &str) -> Option<Option<f64>> {
        let i = self.metric_index(metric)?;
        let row = self
            .rows
            .binary_search_by(|row| row.key.cmp(key))
            .ok()?;
        Some(self.rows[row].val[i])
    }

    /// The latest time present in the table.
    pub fn max_time(&self) -> Option<i64> {
        // sorted by time first
        self.rows.last().map(|row| row.key.time)
    }

    /// The sorted distinct values of every dimension.
    pub fn dimension_filters(&self) -> BTreeMap<KString, Vec<KString>> {
        self.dimensions
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let mut values: Vec<KString> = self
                    .rows
                    .iter()
                    .map(|row| row.key.dimensions[i].clone())
                    .collect();
                values.sort();
                values.dedup();
                (d.clone(), values)
            })
            .collect()
    }
}
