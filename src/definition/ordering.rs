use serde::{Deserialize, Serialize};

/// The layout grid: layers, vertical bands within a layer, and node order
/// within a band.
///
/// The nesting is semantic. Downstream consumers need the band grouping for
/// vertical layout, so it is never flattened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Ordering {
    layers: Vec<Vec<Vec<String>>>,
}

impl Ordering {
    /// Full three-level form: layers of bands of node ids.
    pub fn new<L, B, S>(layers: L) -> Self
    where
        L: IntoIterator<Item = B>,
        B: IntoIterator<Item = Vec<S>>,
        S: Into<String>,
    {
        Self {
            layers: layers
                .into_iter()
                .map(|bands| {
                    bands
                        .into_iter()
                        .map(|band| band.into_iter().map(Into::into).collect())
                        .collect()
                })
                .collect(),
        }
    }

    /// Two-level shorthand: each layer becomes a single band.
    pub fn simple<L, B, S>(layers: L) -> Self
    where
        L: IntoIterator<Item = B>,
        B: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            layers: layers
                .into_iter()
                .map(|band| vec![band.into_iter().map(Into::into).collect()])
                .collect(),
        }
    }

    pub fn layers(&self) -> &[Vec<Vec<String>>] {
        &self.layers
    }

    /// The horizontal layer index of a node, if it is placed.
    pub fn rank(&self, node: &str) -> Option<usize> {
        self.layers.iter().position(|bands| {
            bands
                .iter()
                .any(|band| band.iter().any(|id| id == node))
        })
    }

    /// Every placed node id, in layout order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &str> {
        self.layers
            .iter()
            .flatten()
            .flatten()
            .map(String::as_str)
    }
}
