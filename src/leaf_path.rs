use std::fmt::Display;

use kstring::KString;

/// The fixed second segment of every leaf path.
pub const METRICS_SEGMENT: &str = "metrics";

/// Number of segments before the dimension values:
/// `(dataset, "metrics", metric)`.
pub const PREFIX_LEN: usize = 3;

/// The coordinate of one synthesized series:
/// `(dataset, "metrics", metric, dim_value_1, .., dim_value_k)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LeafPath(Vec<KString>);

impl LeafPath {
    /// The path prefix all leaves of `metric` share.
    pub fn metric_prefix(dataset: &str, metric: &str) -> Self {
        Self(vec![
            KString::from_ref(dataset),
            KString::from_static(METRICS_SEGMENT),
            KString::from_ref(metric),
        ])
    }

    pub fn segments(&self) -> &[KString] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A new path with `segment` appended.
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend(self.0.iter().cloned());
        segments.push(KString::from_ref(segment));
        Self(segments)
    }

    pub fn metric(&self) -> Option<&str> {
        self.0.get(PREFIX_LEN - 1).map(|s| s.as_str())
    }

    /// The segments after `(dataset, "metrics", metric)`, in declared
    /// dimension order.
    pub fn dimension_values(&self) -> &[KString] {
        self.0.get(PREFIX_LEN..).unwrap_or(&[])
    }
}

impl Display for LeafPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for segment in &self.0 {
            if !first {
                f.write_str("/")?;
            }
            f.write_str(segment)?;
            first = false;
        }
        Ok(())
    }
}
