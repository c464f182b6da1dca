//! Synthetic multi-dimensional time series datasets, generated in
//! memory from a nested configuration.
//!
//! Per dataset, each metric's configuration tree is expanded into one
//! leaf per combination of dimension values (`enumerate`), a series is
//! drawn for every leaf (`series`), the leaves of a metric are
//! concatenated into a `table::MetricTable`, and the metric tables are
//! outer-joined into one wide `table::DatasetTable` (`merge`). The
//! `registry::Registry` runs all of this and offers lookups on the
//! result.

pub mod config;
pub mod config_file;
pub mod config_tree;
pub mod dataset;
pub mod date_and_time;
pub mod enumerate;
pub mod error;
pub mod get_terminal_width;
pub mod join;
pub mod leaf_path;
pub mod merge;
pub mod period;
pub mod registry;
pub mod series;
pub mod table;
pub mod terminal_table;
pub mod utillib;
