//! Errors from validating a mock data configuration, generating the
//! data, and looking things up in the finished `Registry`.

use std::fmt::Display;

/// What kind of thing a failed lookup was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Dataset,
    MetricId,
    Metric,
}

impl Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LookupKind::Dataset => "dataset",
            LookupKind::MetricId => "metric id",
            LookupKind::Metric => "metric",
        })
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum MockDataError {
    /// The configuration does not have the expected shape. `context`
    /// is the path to the offending node, e.g. "d1/metrics/m1/us".
    #[error("malformed config at {context:?}: {reason}")]
    ConfigMalformed { context: String, reason: String },

    #[error("unknown time zone id {0:?}")]
    InvalidTimezone(String),

    #[error("invalid period {period:?}: {reason}")]
    InvalidPeriod { period: String, reason: String },

    /// Two rows of the same metric table share time and dimension
    /// values.
    #[error("duplicate index key in metric {metric:?}: {key}")]
    DuplicateKey { metric: String, key: String },

    /// Not fatal; returned by lookups on a finished `Registry`.
    #[error("{kind} not found: {name:?}")]
    NotFound { kind: LookupKind, name: String },
}

impl MockDataError {
    pub fn malformed(context: impl Into<String>, reason: impl Into<String>) -> Self {
        MockDataError::ConfigMalformed {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(kind: LookupKind, name: impl ToString) -> Self {
        MockDataError::NotFound {
            kind,
            name: name.to_string(),
        }
    }

    /// Whether this error can happen after a registry was built
    /// successfully (i.e. a lookup miss rather than a config problem).
    pub fn is_lookup_miss(&self) -> bool {
        matches!(self, MockDataError::NotFound { .. })
    }
}
