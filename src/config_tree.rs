//! The per-metric generator configuration: one level of nesting per
//! declared dimension, with the generator parameters at the bottom,
//! e.g. for dimensions `[region, device]`:
//!
//! ```text
//! { "us": { "web": { "mean": 10, "std": 2 }, "app": { "mean": 4 } },
//!   "eu": { "web": { "mean": 7 } } }
//! ```
//!
//! The raw value is validated once, when converting it into a
//! `ConfigTree`, so that traversal later on never has to guess what a
//! node is.

use std::collections::BTreeMap;

use kstring::KString;
use serde_json::Value;

use crate::error::MockDataError;

/// Parameters of the normal distribution that values of one leaf are
/// drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorParams {
    pub mean: f64,
    pub std: f64,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            mean: 0.,
            std: 1.,
        }
    }
}

impl GeneratorParams {
    pub fn new(mean: f64, std: f64) -> Result<Self, MockDataError> {
        Self::checked(mean, std, "")
    }

    fn checked(mean: f64, std: f64, context: &str) -> Result<Self, MockDataError> {
        if !mean.is_finite() {
            return Err(MockDataError::malformed(
                context,
                format!("mean must be a finite number, got {mean}"),
            ));
        }
        if !(std.is_finite() && std >= 0.) {
            return Err(MockDataError::malformed(
                context,
                format!("std must be a finite, non-negative number, got {std}"),
            ));
        }
        Ok(Self { mean, std })
    }

    /// Missing fields take their defaults; other keys in the object
    /// are ignored.
    fn from_value(value: &Value, context: &str) -> Result<Self, MockDataError> {
        let map = value.as_object().ok_or_else(|| {
            MockDataError::malformed(
                context,
                format!("expecting an object with mean and std, got {value}"),
            )
        })?;
        let field = |name: &str, default: f64| -> Result<f64, MockDataError> {
            match map.get(name) {
                None => Ok(default),
                Some(v) => v.as_f64().ok_or_else(|| {
                    MockDataError::malformed(
                        context,
                        format!("field {name:?} must be a number, got {v}"),
                    )
                }),
            }
        };
        let Self {
            mean: default_mean,
            std: default_std,
        } = Self::default();
        Self::checked(field("mean", default_mean)?, field("std", default_std)?, context)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigTree {
    /// Maps a dimension value to the subtree for it.
    Branch(BTreeMap<KString, ConfigTree>),
    Leaf(GeneratorParams),
}

impl ConfigTree {
    pub fn leaf(mean: f64, std: f64) -> Result<Self, MockDataError> {
        Ok(ConfigTree::Leaf(GeneratorParams::new(mean, std)?))
    }

    pub fn branch<'s>(children: impl IntoIterator<Item = (&'s str, ConfigTree)>) -> Self {
        ConfigTree::Branch(
            children
                .into_iter()
                .map(|(key, tree)| (KString::from_ref(key), tree))
                .collect(),
        )
    }

    /// Build a tree from a raw configuration value. `depth` is the
    /// number of dimension levels expected above the leaves; `context`
    /// names the location of `value` for error messages.
    pub fn from_value(value: &Value, depth: usize, context: &str) -> Result<Self, MockDataError> {
        if depth == 0 {
            return Ok(ConfigTree::Leaf(GeneratorParams::from_value(
                value, context,
            )?));
        }
        let map = value.as_object().ok_or_else(|| {
            MockDataError::malformed(
                context,
                format!(
                    "expecting an object keyed by dimension value \
                     ({depth} more level(s) before the generator parameters), got {value}"
                ),
            )
        })?;
        let mut children = BTreeMap::new();
        for (key, child) in map {
            let child_context = format!("{context}/{key}");
            children.insert(
                KString::from_ref(key),
                ConfigTree::from_value(child, depth - 1, &child_context)?,
            );
        }
        Ok(ConfigTree::Branch(children))
    }

    /// Walk down along `segments`. Returns None if a segment is
    /// missing or a leaf is reached before the end.
    pub fn resolve<S: AsRef<str>>(&self, segments: &[S]) -> Option<&ConfigTree> {
        let mut node = self;
        for segment in segments {
            match node {
                ConfigTree::Branch(children) => {
                    node = children.get(segment.as_ref())?;
                }
                ConfigTree::Leaf(_) => return None,
            }
        }
        Some(node)
    }

    /// The generator parameters for the node at `segments`. A branch
    /// there (possible in hand-built trees that nest deeper than the
    /// declared dimensions) gets the default parameters.
    pub fn params_at<S: AsRef<str>>(&self, segments: &[S]) -> Option<GeneratorParams> {
        match self.resolve(segments)? {
            ConfigTree::Leaf(params) => Some(*params),
            ConfigTree::Branch(_) => Some(GeneratorParams::default()),
        }
    }
}
