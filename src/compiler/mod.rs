//! Compilation of a [`SankeyDefinition`] into a [`WeaverSpec`].
//!
//! The compiler validates the definition, expands bundles through their
//! waypoints, crosses partitions into concrete edges, builds the routing
//! tree, and assembles the frozen plan. Compilation either succeeds
//! completely or fails with a [`CompileError`]; no partial spec is returned.

pub mod partition_cross;
pub mod router;
pub mod rules;
pub mod selection;
pub mod view_graph;

use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashSet;
use log::{debug, info};

use crate::definition::{DefNode, Partition, SankeyDefinition};
use crate::error::CompileError;
use crate::spec::{
    Aggregation, ColorSpec, DisplaySpec, EdgeSpec, GroupSpec, MeasureSpec, NodeKind, NodeSpec,
    WeaverSpec, SPEC_VERSION,
};

use partition_cross::expanded_sub_nodes;
use view_graph::{BundleId, ViewGraph};

const FALLBACK_COLOR: &str = "#cccccc";

/// Link colour configuration, resolved against the generated edges at compile
/// time. Palettes are literal colour lists.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkColor {
    /// Colours assigned per observed value of a categorical attribute.
    /// Values without a seeded entry receive palette colours in sorted
    /// order, cycling when the palette runs out.
    Categorical {
        attr: String,
        palette: Vec<String>,
        lookup: BTreeMap<String, String>,
        default: Option<String>,
    },
    /// Linear interpolation over a palette, driven by an aggregated measure.
    Quantitative {
        attr: String,
        intensity: Option<String>,
        domain: (f64, f64),
        palette: Vec<String>,
    },
}

impl LinkColor {
    pub fn categorical(attr: impl Into<String>) -> Self {
        LinkColor::Categorical {
            attr: attr.into(),
            palette: Vec::new(),
            lookup: BTreeMap::new(),
            default: None,
        }
    }

    pub fn categorical_with_palette<I, S>(attr: impl Into<String>, palette: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        LinkColor::Categorical {
            attr: attr.into(),
            palette: palette.into_iter().map(Into::into).collect(),
            lookup: BTreeMap::new(),
            default: None,
        }
    }

    pub fn quantitative<I, S>(attr: impl Into<String>, domain: (f64, f64), palette: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        LinkColor::Quantitative {
            attr: attr.into(),
            intensity: None,
            domain,
            palette: palette.into_iter().map(Into::into).collect(),
        }
    }

    /// Divides the colour attribute by this measure before normalising.
    pub fn with_intensity(mut self, column: impl Into<String>) -> Self {
        if let LinkColor::Quantitative { intensity, .. } = &mut self {
            *intensity = Some(column.into());
        }
        self
    }
}

/// Builds a [`Compiler`] with measure and display configuration.
pub struct CompilerBuilder {
    sdd: SankeyDefinition,
    measures: Vec<MeasureSpec>,
    link_width: Option<String>,
    link_color: Option<LinkColor>,
}

impl CompilerBuilder {
    pub fn new(sdd: SankeyDefinition) -> Self {
        Self {
            sdd,
            measures: Vec::new(),
            link_width: None,
            link_color: None,
        }
    }

    pub fn with_measure(mut self, column: impl Into<String>, aggregation: Aggregation) -> Self {
        self.measures.push(MeasureSpec {
            column: column.into(),
            aggregation,
        });
        self
    }

    /// Measure column used for link width. Defaults to the first measure.
    pub fn with_link_width(mut self, column: impl Into<String>) -> Self {
        self.link_width = Some(column.into());
        self
    }

    pub fn with_link_color(mut self, color: LinkColor) -> Self {
        self.link_color = Some(color);
        self
    }

    pub fn build(self) -> Compiler {
        let measures = if self.measures.is_empty() {
            vec![MeasureSpec {
                column: "value".to_string(),
                aggregation: Aggregation::Sum,
            }]
        } else {
            self.measures
        };
        let link_width = self
            .link_width
            .unwrap_or_else(|| measures[0].column.clone());
        Compiler {
            sdd: self.sdd,
            measures,
            link_width,
            link_color: self.link_color,
        }
    }
}

/// Compiles one definition into a frozen, data-independent plan.
pub struct Compiler {
    sdd: SankeyDefinition,
    measures: Vec<MeasureSpec>,
    link_width: String,
    link_color: Option<LinkColor>,
}

impl Compiler {
    pub fn builder(sdd: SankeyDefinition) -> CompilerBuilder {
        CompilerBuilder::new(sdd)
    }

    pub fn compile(self) -> Result<WeaverSpec, CompileError> {
        validate(&self.sdd)?;

        let view = ViewGraph::expand(&self.sdd)?;
        let (tree, edges) = router::build_router(&self.sdd, &view)?;

        let (nodes, groups) = expand_nodes(&self.sdd);
        let ordering = expand_ordering(&self.sdd);
        let link_color = resolve_link_color(self.link_color, &edges);

        info!(
            "compiled spec: {} nodes, {} groups, {} edges",
            nodes.len(),
            groups.len(),
            edges.len()
        );

        Ok(WeaverSpec {
            version: SPEC_VERSION.to_string(),
            nodes,
            groups,
            edges,
            ordering,
            measures: self.measures,
            display: DisplaySpec {
                link_width: self.link_width,
                link_color,
            },
            routing_tree: tree,
        })
    }
}

fn validate(sdd: &SankeyDefinition) -> Result<(), CompileError> {
    let mut declared: AHashSet<&str> = AHashSet::new();
    for (id, _) in sdd.nodes() {
        if !declared.insert(id) {
            return Err(CompileError::DuplicateNode {
                node_id: id.to_string(),
            });
        }
    }

    let mut placed: AHashSet<&str> = AHashSet::new();
    for id in sdd.ordering().iter_nodes() {
        if sdd.node(id).is_none() {
            return Err(CompileError::UnknownOrderingNode {
                node_id: id.to_string(),
            });
        }
        if !placed.insert(id) {
            return Err(CompileError::DuplicateOrderingNode {
                node_id: id.to_string(),
            });
        }
    }

    for (index, bundle) in sdd.bundles().iter().enumerate() {
        let bundle_name = BundleId::Defined(index).to_string();

        for endpoint in [&bundle.source, &bundle.target] {
            let Some(id) = endpoint.as_node() else {
                continue;
            };
            match sdd.node(id) {
                None => {
                    return Err(CompileError::UnknownNode {
                        node_id: id.to_string(),
                        bundle: bundle_name.clone(),
                    })
                }
                Some(DefNode::Waypoint(_)) => {
                    return Err(CompileError::NotAProcessGroup {
                        node_id: id.to_string(),
                        bundle: bundle_name.clone(),
                    })
                }
                Some(DefNode::Process(_)) => {}
            }
            if !placed.contains(id) {
                return Err(CompileError::NodeNotInOrdering {
                    node_id: id.to_string(),
                    bundle: bundle_name.clone(),
                });
            }
        }

        for waypoint in &bundle.waypoints {
            match sdd.node(waypoint) {
                None => {
                    return Err(CompileError::UnknownNode {
                        node_id: waypoint.clone(),
                        bundle: bundle_name.clone(),
                    })
                }
                Some(DefNode::Process(_)) => {
                    return Err(CompileError::NotAWaypoint {
                        node_id: waypoint.clone(),
                        bundle: bundle_name.clone(),
                    })
                }
                Some(DefNode::Waypoint(_)) => {}
            }
            if !placed.contains(waypoint.as_str()) {
                return Err(CompileError::NodeNotInOrdering {
                    node_id: waypoint.clone(),
                    bundle: bundle_name.clone(),
                });
            }
        }

        if let Some(partition) = &bundle.flow_partition {
            check_partition_labels(partition)?;
        }
    }

    for (_, node) in sdd.nodes() {
        if let Some(partition) = node.partition() {
            check_partition_labels(partition)?;
        }
    }
    if let Some(partition) = sdd.flow_partition() {
        check_partition_labels(partition)?;
    }
    if let Some(partition) = sdd.time_partition() {
        check_partition_labels(partition)?;
    }

    debug!("definition validated: {} nodes, {} bundles", declared.len(), sdd.bundles().len());
    Ok(())
}

fn check_partition_labels(partition: &Partition) -> Result<(), CompileError> {
    let mut seen = BTreeSet::new();
    for label in partition.labels() {
        if !seen.insert(label) {
            return Err(CompileError::DuplicatePartitionLabel {
                label: label.to_string(),
            });
        }
    }
    Ok(())
}

/// Expands every declared node into its sub-nodes and records the grouping.
fn expand_nodes(sdd: &SankeyDefinition) -> (BTreeMap<String, NodeSpec>, Vec<GroupSpec>) {
    let mut nodes = BTreeMap::new();
    let mut groups = Vec::new();

    for (id, node) in sdd.nodes() {
        let kind = if node.is_process() {
            NodeKind::Process
        } else {
            NodeKind::Waypoint
        };
        let style = node.style().unwrap_or(kind.as_str()).to_string();
        let mut members = Vec::new();

        for (sub_id, label) in expanded_sub_nodes(id, node.partition()) {
            let (title, hidden) = match &label {
                // An unpartitioned node keeps its own identity.
                None => (node.title().unwrap_or(id).to_string(), false),
                // Partition members are titled by their bucket; the residual
                // bucket exists for balance, not display.
                Some(label) => (label.clone(), label == "_"),
            };
            nodes.insert(
                sub_id.clone(),
                NodeSpec {
                    title,
                    kind,
                    group: Some(id.to_string()),
                    style: style.clone(),
                    direction: node.direction(),
                    hidden,
                },
            );
            members.push(sub_id);
        }

        groups.push(GroupSpec {
            id: id.to_string(),
            title: node.title().unwrap_or("").to_string(),
            nodes: members,
        });
    }

    (nodes, groups)
}

/// Rewrites the ordering onto expanded sub-node ids, preserving the
/// layer/band structure.
fn expand_ordering(sdd: &SankeyDefinition) -> Vec<Vec<Vec<String>>> {
    sdd.ordering()
        .layers()
        .iter()
        .map(|bands| {
            bands
                .iter()
                .map(|band| {
                    band.iter()
                        .flat_map(|id| {
                            let partition = sdd.node(id).and_then(DefNode::partition);
                            expanded_sub_nodes(id, partition)
                                .into_iter()
                                .map(|(sub_id, _)| sub_id)
                        })
                        .collect()
                })
                .collect()
        })
        .collect()
}

/// Completes the colour configuration against the edges actually generated.
fn resolve_link_color(color: Option<LinkColor>, edges: &[EdgeSpec]) -> ColorSpec {
    let color = color.unwrap_or_else(|| LinkColor::categorical("type"));
    match color {
        LinkColor::Categorical {
            attr,
            palette,
            mut lookup,
            default,
        } => {
            let observed: BTreeSet<&str> = match attr.as_str() {
                "type" => edges.iter().map(|e| e.kind.as_str()).filter(|k| *k != "_").collect(),
                "source" => edges.iter().filter_map(|e| e.source.as_deref()).collect(),
                "target" => edges.iter().filter_map(|e| e.target.as_deref()).collect(),
                _ => BTreeSet::new(),
            };
            if !palette.is_empty() {
                let mut next = lookup.len() % palette.len();
                for value in observed {
                    if !lookup.contains_key(value) {
                        lookup.insert(value.to_string(), palette[next % palette.len()].clone());
                        next += 1;
                    }
                }
            }
            ColorSpec::Categorical {
                attr,
                lookup,
                default: default.unwrap_or_else(|| FALLBACK_COLOR.to_string()),
            }
        }
        LinkColor::Quantitative {
            attr,
            intensity,
            domain,
            palette,
        } => ColorSpec::Quantitative {
            attr,
            intensity,
            domain,
            palette,
        },
    }
}
