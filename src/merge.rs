//! Merging the metric tables of a dataset into one wide table.

use std::collections::BTreeMap;

use itertools::EitherOrBoth;
use kstring::KString;

use crate::{
    error::MockDataError,
    join::{keyval_outer_join_2, KeyVal},
    table::{DatasetTable, MetricTable},
};

/// Fold `tables` into a `DatasetTable` with one outer join per
/// metric, in lexicographic metric order. The row set of the result
/// is the union of the keys of all tables; a metric without a value
/// at a key is `None` there.
///
/// When a key is on both sides, the incoming table's value replaces
/// whatever the accumulated table held for that metric (the
/// placeholder); values are not coalesced. A declared metric without
/// a table becomes an all-`None` column.
pub fn merge_dataset(
    name: &str,
    dimensions: &[KString],
    metrics: &[KString],
    tables: impl IntoIterator<Item = MetricTable>,
) -> Result<DatasetTable, MockDataError> {
    let mut merged = DatasetTable::empty(name, dimensions, metrics);
    let num_metrics = merged.metrics().len();

    // metric -> (column index, table)
    let mut by_metric: BTreeMap<KString, (usize, MetricTable)> = BTreeMap::new();
    for table in tables {
        let context = || format!("{name}/metrics/{}", table.metric());
        let Some(column) = merged.metric_index(table.metric()) else {
            return Err(MockDataError::malformed(
                context(),
                format!("metric is not declared, known are {:?}", merged.metrics()),
            ));
        };
        if table.dimensions() != dimensions {
            return Err(MockDataError::malformed(
                context(),
                format!(
                    "table has dimensions {:?}, dataset declares {dimensions:?}",
                    table.dimensions()
                ),
            ));
        }
        if by_metric.contains_key(table.metric()) {
            return Err(MockDataError::malformed(context(), "more than one table for metric"));
        }
        by_metric.insert(KString::from_ref(table.metric()), (column, table));
    }

    // BTreeMap iteration is the lexicographic fold order
    for (column, table) in by_metric.into_values() {
        let incoming = table.into_indexed()?;
        let rows = keyval_outer_join_2(merged.take_rows(), incoming)
            .map(|KeyVal { key, val }| {
                let (existing, incoming) = match val {
                    EitherOrBoth::Both(existing, incoming) => (Some(existing), Some(incoming)),
                    EitherOrBoth::Left(existing) => (Some(existing), None),
                    EitherOrBoth::Right(incoming) => (None, Some(incoming)),
                };
                let mut vals = existing.unwrap_or_else(|| vec![None; num_metrics]);
                vals[column] = incoming;
                KeyVal { key, val: vals }
            })
            .collect();
        merged.replace_rows(rows);
    }
    Ok(merged)
}
