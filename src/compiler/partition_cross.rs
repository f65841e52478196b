//! Lowering partitions into routing rules and concrete edge keys.
//!
//! One bundle segment crosses four partitions: source node, target node, flow
//! and time. Each is expanded into labelled rules over row attributes, the
//! four rule sets are combined by query intersection, and every surviving
//! region is keyed by the `(source_sub, target_sub, type, time)` tuple that
//! names a concrete edge.

use crate::definition::Partition;
use crate::error::CompileError;

use super::rules::{intersect_constraints, Constraint, Query, Rules};

/// Which end of a segment a node partition sits on. Resolves the reserved
/// `process` dimension to the `source` or `target` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Target,
}

/// Identity of one concrete edge. `None` endpoints are the system boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub source: Option<String>,
    pub target: Option<String>,
    pub kind: String,
    pub time: String,
}

fn translate_attr(attr: &str, side: Option<Side>) -> Result<String, CompileError> {
    if attr == "process" {
        match side {
            Some(Side::Source) => Ok("source".to_string()),
            Some(Side::Target) => Ok("target".to_string()),
            None => Err(CompileError::ProcessDimensionMisused),
        }
    } else {
        Ok(attr.to_string())
    }
}

/// The explicit (label-bearing) rules of a partition, before the residual
/// bucket is added.
fn partition_rules(
    partition: &Partition,
    side: Option<Side>,
) -> Result<Rules<String>, CompileError> {
    let mut items = Vec::new();
    for group in &partition.groups {
        let mut query = Query::new();
        for (attr, values) in &group.query {
            let attr = translate_attr(attr, side)?;
            let constraint = Constraint::includes(values.iter().cloned());
            match query.get_mut(&attr) {
                Some(existing) => *existing = intersect_constraints(existing, &constraint),
                None => {
                    query.insert(attr, constraint);
                }
            }
        }
        items.push((query, group.label.clone()));
    }
    Ok(Rules::new(items))
}

/// Refines partition rules into disjoint buckets, assigning `default` to the
/// residual region. Two labels claiming one region means the partition's
/// groups overlap.
fn resolve_regions<L: Clone>(
    rules: Rules<String>,
    wrap: impl Fn(&str) -> L,
    default: L,
) -> Result<Rules<L>, CompileError> {
    let mut items = Vec::new();
    for (query, labels) in rules.refine().items {
        match labels.as_slice() {
            [] => items.push((query, default.clone())),
            [label] => items.push((query, wrap(label))),
            many => {
                return Err(CompileError::OverlappingPartitionGroups {
                    labels: many.to_vec(),
                })
            }
        }
    }
    Ok(Rules::new(items))
}

/// Sub-node ids a declared node expands into, paired with the partition label
/// (`None` for an unpartitioned node, which keeps its own id). The residual
/// `_` bucket comes last.
pub fn expanded_sub_nodes(
    node: &str,
    partition: Option<&Partition>,
) -> Vec<(String, Option<String>)> {
    match partition {
        None => vec![(node.to_string(), None)],
        Some(p) => p
            .labels()
            .chain(std::iter::once("_"))
            .map(|label| (format!("{}^{}", node, label), Some(label.to_string())))
            .collect(),
    }
}

/// Expands a node-side partition into rules labelled by sub-node id.
///
/// The system boundary side collapses to a single `None` identity with no
/// constraints: Elsewhere is everywhere.
pub fn expand_node_partition(
    node: Option<&str>,
    partition: Option<&Partition>,
    side: Side,
) -> Result<Rules<Option<String>>, CompileError> {
    let Some(node) = node else {
        return Ok(Rules::single(Query::new(), None));
    };
    let Some(partition) = partition else {
        return Ok(Rules::single(Query::new(), Some(node.to_string())));
    };
    let explicit = partition_rules(partition, Some(side))?;
    resolve_regions(
        explicit,
        |label| Some(format!("{}^{}", node, label)),
        Some(format!("{}^_", node)),
    )
}

/// Expands a flow or time partition into labelled rules: `*` when absent,
/// otherwise the group labels plus the `_` residual.
pub fn expand_flow_partition(partition: Option<&Partition>) -> Result<Rules<String>, CompileError> {
    let Some(partition) = partition else {
        return Ok(Rules::single(Query::new(), "*".to_string()));
    };
    let explicit = partition_rules(partition, None)?;
    resolve_regions(explicit, str::to_string, "_".to_string())
}

/// Labels a flow or time partition contributes to edge enumeration, in
/// declaration order with the residual last.
pub fn flow_labels(partition: Option<&Partition>) -> Vec<String> {
    match partition {
        None => vec!["*".to_string()],
        Some(p) => p
            .labels()
            .map(str::to_string)
            .chain(std::iter::once("_".to_string()))
            .collect(),
    }
}

/// Routing rules for one segment: the four partition expansions combined.
pub fn segment_routing(
    source: Option<&str>,
    target: Option<&str>,
    source_partition: Option<&Partition>,
    target_partition: Option<&Partition>,
    flow_partition: Option<&Partition>,
    time_partition: Option<&Partition>,
) -> Result<Rules<EdgeKey>, CompileError> {
    let sources = expand_node_partition(source, source_partition, Side::Source)?;
    let targets = expand_node_partition(target, target_partition, Side::Target)?;
    let kinds = expand_flow_partition(flow_partition)?;
    let times = expand_flow_partition(time_partition)?;

    let endpoints = sources.product(&targets, |s, t| (s.clone(), t.clone()));
    let typed = endpoints.product(&kinds, |(s, t), kind| (s.clone(), t.clone(), kind.clone()));
    Ok(typed.product(&times, |(s, t, kind), time| EdgeKey {
        source: s.clone(),
        target: t.clone(),
        kind: kind.clone(),
        time: time.clone(),
    }))
}

/// Merges a bundle's segment routings: a row travelling the bundle collects
/// one edge key per segment of the chain.
pub fn merge_segments(segments: &[Rules<EdgeKey>]) -> Rules<Vec<EdgeKey>> {
    let mut merged = segments[0].map(|key| vec![key.clone()]);
    for segment in &segments[1..] {
        merged = merged.product(segment, |keys, key| {
            let mut chain = keys.clone();
            chain.push(key.clone());
            chain
        });
    }
    merged
}
