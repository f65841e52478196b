use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::FlowRecord;

/// The routing decision tree: classifies one flow row to its edge ids.
///
/// A `Branch` selects a child by the row's value for `attr`; a missing or
/// unmatched value falls through to `default`, so evaluation is total. A
/// `Leaf` ends traversal and yields its edge ids. Dispatch cost is the tree
/// depth, independent of the number of edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Tree {
    Leaf {
        value: Vec<usize>,
    },
    Branch {
        attr: String,
        branches: BTreeMap<String, Tree>,
        default: Box<Tree>,
    },
}

impl Tree {
    pub fn leaf<I: IntoIterator<Item = usize>>(edge_ids: I) -> Self {
        Tree::Leaf {
            value: edge_ids.into_iter().collect(),
        }
    }

    pub fn branch(
        attr: impl Into<String>,
        branches: BTreeMap<String, Tree>,
        default: Tree,
    ) -> Self {
        Tree::Branch {
            attr: attr.into(),
            branches,
            default: Box::new(default),
        }
    }

    /// Routes one row to its edge ids.
    ///
    /// Pure and allocation-free: the returned slice borrows the matched leaf.
    pub fn route<'a, R: FlowRecord + ?Sized>(&'a self, row: &R) -> &'a [usize] {
        let mut node = self;
        loop {
            match node {
                Tree::Leaf { value } => return value,
                Tree::Branch {
                    attr,
                    branches,
                    default,
                } => {
                    let child = row
                        .value(attr)
                        .and_then(|v| v.as_key())
                        .and_then(|key| branches.get(key.as_ref()));
                    node = child.unwrap_or(default.as_ref());
                }
            }
        }
    }

    /// Total number of leaves, mostly useful for diagnostics.
    pub fn leaf_count(&self) -> usize {
        match self {
            Tree::Leaf { .. } => 1,
            Tree::Branch {
                branches, default, ..
            } => branches.values().map(Tree::leaf_count).sum::<usize>() + default.leaf_count(),
        }
    }
}
