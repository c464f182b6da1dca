//! Expansion of a metric's `ConfigTree` into the coordinates of all
//! its leaves.

use crate::{config_tree::ConfigTree, error::MockDataError, leaf_path::LeafPath};

/// Depth-first expansion of `root` into leaf paths of exactly
/// `max_depth` segments, each starting with `prefix`. Uses an explicit
/// stack instead of recursion.
///
/// A node is emitted as soon as its path is `max_depth` long, even if
/// it still has children; deeper levels are never looked at. A leaf
/// above `max_depth` is an error.
///
/// The order of the result is the stack order, i.e. *not* sorted;
/// sort it if you need a deterministic order.
pub fn enumerate_leaves(
    root: &ConfigTree,
    prefix: LeafPath,
    max_depth: usize,
) -> Result<Vec<LeafPath>, MockDataError> {
    let mut leaves = Vec::new();
    let mut stack: Vec<(LeafPath, &ConfigTree)> = vec![(prefix, root)];
    while let Some((path, node)) = stack.pop() {
        if path.len() >= max_depth {
            leaves.push(path);
            continue;
        }
        match node {
            ConfigTree::Branch(children) => {
                for (key, child) in children {
                    stack.push((path.child(key), child));
                }
            }
            ConfigTree::Leaf(_) => {
                return Err(MockDataError::malformed(
                    path.to_string(),
                    format!(
                        "expecting {} more dimension level(s), found generator parameters",
                        max_depth - path.len()
                    ),
                ));
            }
        }
    }
    Ok(leaves)
}

/// All leaf paths of `metric` in `dataset`, which declares
/// `num_dimensions` dimensions, sorted.
pub fn metric_leaf_paths(
    dataset: &str,
    metric: &str,
    tree: &ConfigTree,
    num_dimensions: usize,
) -> Result<Vec<LeafPath>, MockDataError> {
    let prefix = LeafPath::metric_prefix(dataset, metric);
    let max_depth = prefix.len() + num_dimensions;
    let mut leaves = enumerate_leaves(tree, prefix, max_depth)?;
    leaves.sort();
    Ok(leaves)
}
