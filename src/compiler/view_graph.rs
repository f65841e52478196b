//! Bundle expansion: waypoint chains and boundary residuals.
//!
//! Every declared bundle becomes a chain of segments through its waypoints.
//! On top of the declared bundles, residual Elsewhere bundles are authored
//! for process groups whose flows can enter or leave the system boundary, so
//! that rows not captured by any declared bundle still balance each node.

use std::fmt;

use ahash::AHashSet;
use log::debug;

use crate::definition::{DefNode, Direction, FlowSelection, Partition, SankeyDefinition};
use crate::error::CompileError;

/// Stable identity of a bundle: declared bundles by origin index, authored
/// residuals by the node they drain or feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BundleId {
    Defined(usize),
    ImplicitTo(String),
    ImplicitFrom(String),
}

impl BundleId {
    pub fn is_implicit(&self) -> bool {
        matches!(self, BundleId::ImplicitTo(_) | BundleId::ImplicitFrom(_))
    }
}

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleId::Defined(i) => write!(f, "{}", i),
            BundleId::ImplicitTo(node) => write!(f, "__{}>", node),
            BundleId::ImplicitFrom(node) => write!(f, "__>{}", node),
        }
    }
}

/// One hop of a bundle's chain. `None` is the system boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    pub source: Option<String>,
    pub target: Option<String>,
}

/// A bundle expanded to its segment chain, with the selection and effective
/// flow partition every segment inherits.
#[derive(Debug, Clone)]
pub struct ViewBundle {
    pub id: BundleId,
    pub segments: Vec<Segment>,
    pub flow_selection: Option<FlowSelection>,
    pub flow_partition: Option<Partition>,
}

impl ViewBundle {
    pub fn from_elsewhere(&self) -> bool {
        self.segments
            .first()
            .is_some_and(|s| s.source.is_none())
    }

    pub fn to_elsewhere(&self) -> bool {
        self.segments.last().is_some_and(|s| s.target.is_none())
    }

    /// The process-group end(s) of the chain.
    pub fn source_group(&self) -> Option<&str> {
        self.segments.first().and_then(|s| s.source.as_deref())
    }

    pub fn target_group(&self) -> Option<&str> {
        self.segments.last().and_then(|s| s.target.as_deref())
    }
}

/// The expanded intermediate graph: declared bundles first, residuals after.
#[derive(Debug, Clone)]
pub struct ViewGraph {
    pub bundles: Vec<ViewBundle>,
}

impl ViewGraph {
    pub fn expand(sdd: &SankeyDefinition) -> Result<Self, CompileError> {
        let mut bundles = Vec::new();

        // Nodes with an unconditional declared Elsewhere bundle do not get a
        // residual in that direction; a selection-restricted one still does,
        // so the unselected remainder is not lost.
        let mut covered_to = AHashSet::new();
        let mut covered_from = AHashSet::new();
        let mut declared_to = AHashSet::new();
        let mut declared_from = AHashSet::new();

        for (index, bundle) in sdd.bundles().iter().enumerate() {
            let id = BundleId::Defined(index);

            if bundle.from_elsewhere() && bundle.to_elsewhere() {
                return Err(CompileError::BothEndsElsewhere {
                    bundle: id.to_string(),
                });
            }

            if let Some(node) = bundle.source.as_node() {
                if bundle.to_elsewhere() && !declared_to.insert(node.to_string()) {
                    return Err(CompileError::DuplicateElsewhereBundle {
                        node_id: node.to_string(),
                    });
                }
                if bundle.to_elsewhere() && bundle.flow_selection.is_none() {
                    covered_to.insert(node.to_string());
                }
            }
            if let Some(node) = bundle.target.as_node() {
                if bundle.from_elsewhere() && !declared_from.insert(node.to_string()) {
                    return Err(CompileError::DuplicateElsewhereBundle {
                        node_id: node.to_string(),
                    });
                }
                if bundle.from_elsewhere() && bundle.flow_selection.is_none() {
                    covered_from.insert(node.to_string());
                }
            }

            let mut chain: Vec<Option<String>> =
                vec![bundle.source.as_node().map(str::to_string)];
            chain.extend(bundle.waypoints.iter().map(|w| Some(w.clone())));
            chain.push(bundle.target.as_node().map(str::to_string));

            let mut segments = Vec::with_capacity(chain.len() - 1);
            for pair in chain.windows(2) {
                let (source, target) = (&pair[0], &pair[1]);
                if let (Some(s), Some(t)) = (source, target) {
                    if s == t {
                        return Err(CompileError::CyclicBundle {
                            bundle: id.to_string(),
                            node_id: s.clone(),
                        });
                    }
                }
                segments.push(Segment {
                    source: source.clone(),
                    target: target.clone(),
                });
            }

            bundles.push(ViewBundle {
                id,
                segments,
                flow_selection: bundle.flow_selection.clone(),
                flow_partition: bundle
                    .flow_partition
                    .clone()
                    .or_else(|| sdd.flow_partition().cloned()),
            });
        }

        // Residual Elsewhere bundles keep each process group balanced. They
        // are only authored where the ordering leaves room for the flow to
        // continue in the node's direction, and carry no partitions: the
        // residual edge is a single generic stub.
        let layer_count = sdd.ordering().layers().len() as isize;
        let no_bundles = sdd.bundles().is_empty();

        for (node_id, node) in sdd.nodes() {
            let DefNode::Process(group) = node else {
                continue;
            };
            if group.selection.is_empty() {
                continue;
            }
            let Some(rank) = sdd.ordering().rank(node_id) else {
                continue;
            };
            let rank = rank as isize;
            let step: isize = match node.direction() {
                Direction::R => 1,
                Direction::L => -1,
            };

            let outward = rank + step;
            if no_bundles
                || ((0..layer_count).contains(&outward) && !covered_to.contains(node_id))
            {
                bundles.push(ViewBundle {
                    id: BundleId::ImplicitTo(node_id.to_string()),
                    segments: vec![Segment {
                        source: Some(node_id.to_string()),
                        target: None,
                    }],
                    flow_selection: None,
                    flow_partition: None,
                });
            }

            let inward = rank - step;
            if no_bundles
                || ((0..layer_count).contains(&inward) && !covered_from.contains(node_id))
            {
                bundles.push(ViewBundle {
                    id: BundleId::ImplicitFrom(node_id.to_string()),
                    segments: vec![Segment {
                        source: None,
                        target: Some(node_id.to_string()),
                    }],
                    flow_selection: None,
                    flow_partition: None,
                });
            }
        }

        debug!(
            "expanded {} declared bundles into {} view bundles",
            sdd.bundles().len(),
            bundles.len()
        );

        Ok(ViewGraph { bundles })
    }

    /// Checks that bundles sharing an interior segment agree on the flow
    /// partition that splits it.
    pub fn check_shared_segments(&self) -> Result<(), CompileError> {
        let mut seen: Vec<(&Segment, Option<&Partition>)> = Vec::new();
        for bundle in &self.bundles {
            for segment in &bundle.segments {
                if segment.source.is_none() || segment.target.is_none() {
                    continue;
                }
                match seen.iter().find(|(s, _)| *s == segment) {
                    Some((_, partition)) => {
                        if *partition != bundle.flow_partition.as_ref() {
                            return Err(CompileError::ConflictingFlowPartitions {
                                segment_source: segment.source.clone().unwrap_or_default(),
                                target: segment.target.clone().unwrap_or_default(),
                            });
                        }
                    }
                    None => seen.push((segment, bundle.flow_partition.as_ref())),
                }
            }
        }
        Ok(())
    }
}
