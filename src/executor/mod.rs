//! Execution of a [`WeaverSpec`] against flow data.
//!
//! The executor routes every row through the spec's decision tree, aggregates
//! measures per edge, applies colour, and emits the final diagram data with
//! unused nodes, groups and layers pruned. It is pure and single-threaded per
//! call; a spec shared by reference can drive many executors in parallel.

pub mod color;

use std::collections::BTreeMap;

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::data::FlowRecord;
use crate::definition::Direction;
use crate::error::ExecuteError;
use crate::spec::{Aggregation, MeasureSpec, NodeKind, WeaverSpec};

/// One rendered flow between two nodes (or between a node and the system
/// boundary, when an endpoint is `None`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SankeyLink {
    pub source: Option<String>,
    pub target: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub time: String,
    pub link_width: f64,
    /// Aggregated measure values for the rows on this link.
    pub data: BTreeMap<String, f64>,
    pub title: String,
    pub color: String,
    pub opacity: f64,
    /// Indices of the dataset rows aggregated into this link.
    pub original_flows: Vec<usize>,
}

/// One rendered node, with any boundary-crossing links attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SankeyNode {
    pub id: String,
    pub title: String,
    pub direction: Direction,
    pub hidden: bool,
    pub style: String,
    pub from_elsewhere_links: Vec<SankeyLink>,
    pub to_elsewhere_links: Vec<SankeyLink>,
}

/// A surviving node group (partition sub-nodes of one declared node).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SankeyGroup {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub nodes: Vec<String>,
}

/// The final diagram data, ready for layout and rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SankeyData {
    pub nodes: Vec<SankeyNode>,
    pub links: Vec<SankeyLink>,
    pub groups: Vec<SankeyGroup>,
    pub ordering: Vec<Vec<Vec<String>>>,
}

/// Applies one compiled spec to row data, any number of times.
pub struct Executor<'a> {
    spec: &'a WeaverSpec,
}

impl<'a> Executor<'a> {
    pub fn new(spec: &'a WeaverSpec) -> Self {
        Self { spec }
    }

    pub fn execute<R: FlowRecord>(&self, rows: &[R]) -> Result<SankeyData, ExecuteError> {
        let spec = self.spec;
        let edge_count = spec.edges.len();

        // Route every row; rows classified to no edge are simply dropped
        // (their balance is carried by the boundary edges the spec authored).
        let mut accumulators: Vec<Vec<usize>> = vec![Vec::new(); edge_count];
        for (index, row) in rows.iter().enumerate() {
            for &edge_id in spec.routing_tree.route(row) {
                if edge_id >= edge_count {
                    return Err(ExecuteError::EdgeOutOfRange {
                        id: edge_id,
                        edges: edge_count,
                    });
                }
                accumulators[edge_id].push(index);
            }
        }

        let mut links = Vec::new();
        let mut from_elsewhere: AHashMap<&str, Vec<SankeyLink>> = AHashMap::new();
        let mut to_elsewhere: AHashMap<&str, Vec<SankeyLink>> = AHashMap::new();

        for (edge_id, indices) in accumulators.iter().enumerate() {
            if indices.is_empty() {
                continue;
            }
            let edge = &spec.edges[edge_id];
            let data = aggregate(rows, indices, &spec.measures);
            let link_width = data.get(&spec.display.link_width).copied().unwrap_or(0.0);
            let color = color::link_color(&spec.display.link_color, edge, &data)?;

            let link = SankeyLink {
                source: edge.source.clone(),
                target: edge.target.clone(),
                kind: edge.kind.clone(),
                time: edge.time.clone(),
                link_width,
                data,
                title: edge.kind.clone(),
                color,
                opacity: 1.0,
                original_flows: indices.clone(),
            };

            match (&edge.source, &edge.target) {
                (Some(_), Some(_)) => links.push(link),
                (None, Some(target)) => from_elsewhere.entry(target).or_default().push(link),
                (Some(source), None) => to_elsewhere.entry(source).or_default().push(link),
                (None, None) => return Err(ExecuteError::DanglingEdge { id: edge_id }),
            }
        }

        // A node survives iff it carries flow: as a regular endpoint or as
        // the anchor of a boundary link.
        let mut used: AHashSet<&str> = AHashSet::new();
        for link in &links {
            if let Some(source) = &link.source {
                used.insert(source);
            }
            if let Some(target) = &link.target {
                used.insert(target);
            }
        }
        used.extend(from_elsewhere.keys());
        used.extend(to_elsewhere.keys());

        let mut nodes = Vec::new();
        for (id, node_spec) in &spec.nodes {
            if !used.contains(id.as_str()) {
                continue;
            }
            nodes.push(SankeyNode {
                id: id.clone(),
                title: node_spec.title.clone(),
                direction: node_spec.direction,
                hidden: node_spec.hidden,
                style: node_spec.style.clone(),
                from_elsewhere_links: from_elsewhere.remove(id.as_str()).unwrap_or_default(),
                to_elsewhere_links: to_elsewhere.remove(id.as_str()).unwrap_or_default(),
            });
        }

        let groups = build_groups(spec, &used);
        let ordering = filter_ordering(&spec.ordering, &used);

        Ok(SankeyData {
            nodes,
            links,
            groups,
            ordering,
        })
    }
}

/// Aggregates the measures over the selected rows.
///
/// Absent and non-numeric values are skipped; an aggregate over nothing is 0.
fn aggregate<R: FlowRecord>(
    rows: &[R],
    indices: &[usize],
    measures: &[MeasureSpec],
) -> BTreeMap<String, f64> {
    let mut result = BTreeMap::new();
    for measure in measures {
        let values: Vec<f64> = indices
            .iter()
            .filter_map(|&i| rows[i].value(&measure.column))
            .filter_map(|v| v.as_number())
            .collect();
        let aggregated = match measure.aggregation {
            Aggregation::Sum => values.iter().sum(),
            Aggregation::Mean => {
                if values.is_empty() {
                    0.0
                } else {
                    values.iter().sum::<f64>() / values.len() as f64
                }
            }
        };
        result.insert(measure.column.clone(), aggregated);
    }
    result
}

fn build_groups(spec: &WeaverSpec, used: &AHashSet<&str>) -> Vec<SankeyGroup> {
    let mut groups = Vec::new();
    for group in &spec.groups {
        let members: Vec<String> = group
            .nodes
            .iter()
            .filter(|id| used.contains(id.as_str()))
            .cloned()
            .collect();
        if members.is_empty() {
            continue;
        }

        let kind = spec
            .nodes
            .get(&members[0])
            .map(|n| n.kind)
            .unwrap_or(NodeKind::Process);

        // A group wrapping a single node that already bears its name adds
        // nothing; drop it rather than nest.
        if members.len() == 1 {
            let member_title = spec
                .nodes
                .get(&members[0])
                .map(|n| n.title.as_str())
                .unwrap_or_default();
            let group_title = if group.title.is_empty() {
                group.id.as_str()
            } else {
                group.title.as_str()
            };
            if member_title == group_title {
                continue;
            }
        }

        groups.push(SankeyGroup {
            id: group.id.clone(),
            title: group.title.clone(),
            kind,
            nodes: members,
        });
    }
    groups
}

/// Keeps the layer/band structure but only the nodes that survived; layers
/// whose every band emptied out are dropped.
fn filter_ordering(
    ordering: &[Vec<Vec<String>>],
    used: &AHashSet<&str>,
) -> Vec<Vec<Vec<String>>> {
    let mut layers = Vec::new();
    for bands in ordering {
        let filtered: Vec<Vec<String>> = bands
            .iter()
            .map(|band| {
                band.iter()
                    .filter(|id| used.contains(id.as_str()))
                    .cloned()
                    .collect()
            })
            .collect();
        if filtered.iter().any(|band| !band.is_empty()) {
            layers.push(filtered);
        }
    }
    layers
}
