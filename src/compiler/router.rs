//! Combining selections and partitions into the edge list and routing tree.
//!
//! Selection rules decide which bundle a row belongs to; partition rules
//! decide which concrete edge(s) of that bundle it travels. Their combination
//! is a disjoint rule set from row regions to edge-id lists, lowered into a
//! decision tree for O(depth) dispatch per row.

use std::collections::{BTreeMap, BTreeSet};

use ahash::{AHashMap, AHashSet};
use log::debug;

use crate::definition::{DefNode, SankeyDefinition};
use crate::error::CompileError;
use crate::spec::{EdgeSpec, Tree};

use super::partition_cross::{
    expanded_sub_nodes, flow_labels, merge_segments, segment_routing, EdgeKey,
};
use super::rules::{Constraint, Query, Rules};
use super::selection::{build_selection_rules, BundleMatch, BundleSelection};
use super::view_graph::{BundleId, Segment, ViewBundle, ViewGraph};

/// An edge key together with the bundle that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TaggedKey {
    key: EdgeKey,
    bundle: BundleId,
}

/// Builds the routing tree and the edge list it refers to.
pub fn build_router(
    sdd: &SankeyDefinition,
    view: &ViewGraph,
) -> Result<(Tree, Vec<EdgeSpec>), CompileError> {
    view.check_shared_segments()?;

    // Granular routing per bundle: which edge chain a row collects once the
    // bundle has claimed it.
    let mut partition_rules: AHashMap<BundleId, Rules<Vec<TaggedKey>>> = AHashMap::new();
    for bundle in &view.bundles {
        let mut segment_rules = Vec::with_capacity(bundle.segments.len());
        for segment in &bundle.segments {
            segment_rules.push(segment_routing(
                segment.source.as_deref(),
                segment.target.as_deref(),
                segment
                    .source
                    .as_deref()
                    .and_then(|id| sdd.node(id))
                    .and_then(DefNode::partition),
                segment
                    .target
                    .as_deref()
                    .and_then(|id| sdd.node(id))
                    .and_then(DefNode::partition),
                bundle.flow_partition.as_ref(),
                time_partition(sdd, bundle),
            )?);
        }
        let merged = merge_segments(&segment_rules);
        let tagged = merged.map(|keys| {
            keys.iter()
                .map(|key| TaggedKey {
                    key: key.clone(),
                    bundle: bundle.id.clone(),
                })
                .collect::<Vec<_>>()
        });
        partition_rules.insert(bundle.id.clone(), tagged);
    }

    // Selection rules: which bundle(s) claim a row in the first place.
    let selections: Vec<BundleSelection> = view
        .bundles
        .iter()
        .map(|bundle| bundle_selection(sdd, bundle))
        .collect();
    let selection_rules = build_selection_rules(&selections)?;

    // A row crossing the boundary at both ends belongs to two bundles at
    // once and collects the edges of both stubs.
    let empty = Rules::new(Vec::new());
    let routing = selection_rules.expand(|matched| match matched {
        BundleMatch::Single(id) => partition_rules.get(id).cloned().unwrap_or_else(|| empty.clone()),
        BundleMatch::Pair { from, to } => {
            let from_rules = &partition_rules[from];
            let to_rules = &partition_rules[to];
            from_rules.product(to_rules, |a, b| {
                let mut keys = a.clone();
                keys.extend(b.iter().cloned());
                keys
            })
        }
    });

    // Edge ids are allocated by enumerating candidate keys in canonical
    // order (bundle origin, segment, source sub, target sub, type, time) and
    // keeping those a routing rule can actually reach. Identical keys from
    // different bundles merge into one edge that records every origin.
    let mut reachable: AHashSet<(BundleId, EdgeKey)> = AHashSet::new();
    for (_, tagged_keys) in &routing.items {
        for tagged in tagged_keys {
            reachable.insert((tagged.bundle.clone(), tagged.key.clone()));
        }
    }

    let mut edge_index: AHashMap<EdgeKey, usize> = AHashMap::new();
    let mut edges: Vec<EdgeSpec> = Vec::new();
    for bundle in &view.bundles {
        for segment in &bundle.segments {
            for key in candidate_keys(sdd, bundle, segment) {
                if !reachable.contains(&(bundle.id.clone(), key.clone())) {
                    continue;
                }
                match edge_index.get(&key) {
                    Some(&index) => {
                        let ids = &mut edges[index].bundle_ids;
                        let id = bundle.id.to_string();
                        if !ids.contains(&id) {
                            ids.push(id);
                        }
                    }
                    None => {
                        edge_index.insert(key.clone(), edges.len());
                        edges.push(EdgeSpec {
                            source: key.source,
                            target: key.target,
                            kind: key.kind,
                            time: key.time,
                            bundle_ids: vec![bundle.id.to_string()],
                        });
                    }
                }
            }
        }
    }

    // Replace keys with edge ids; ascending id order is the allocation order.
    let indexed = routing.map(|tagged_keys| {
        let mut ids: Vec<usize> = tagged_keys
            .iter()
            .map(|tagged| edge_index[&tagged.key])
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    });

    let order = branch_order(sdd, &indexed);
    let tree = build_tree(&indexed.items, &order);

    debug!(
        "routing tree: {} edges, {} branch attributes, {} leaves",
        edges.len(),
        order.len(),
        tree.leaf_count()
    );

    Ok((tree, edges))
}

fn time_partition<'a>(
    sdd: &'a SankeyDefinition,
    bundle: &ViewBundle,
) -> Option<&'a crate::definition::Partition> {
    // Residual boundary stubs stay generic; only declared bundles split by
    // time.
    if bundle.id.is_implicit() {
        None
    } else {
        sdd.time_partition()
    }
}

fn bundle_selection(sdd: &SankeyDefinition, bundle: &ViewBundle) -> BundleSelection {
    let group_processes = |id: Option<&str>| -> BTreeSet<String> {
        id.and_then(|id| sdd.node(id))
            .map(|node| match node {
                DefNode::Process(group) => group.selection.iter().cloned().collect(),
                DefNode::Waypoint(_) => BTreeSet::new(),
            })
            .unwrap_or_default()
    };

    BundleSelection {
        id: bundle.id.clone(),
        from_elsewhere: bundle.from_elsewhere(),
        to_elsewhere: bundle.to_elsewhere(),
        source_ids: group_processes(bundle.source_group()),
        target_ids: group_processes(bundle.target_group()),
        flow_selection: bundle.flow_selection.clone(),
    }
}

/// Every `(source_sub, target_sub, type, time)` key a segment can produce, in
/// canonical order.
fn candidate_keys(
    sdd: &SankeyDefinition,
    bundle: &ViewBundle,
    segment: &Segment,
) -> Vec<EdgeKey> {
    let sub_labels = |node: Option<&str>| -> Vec<Option<String>> {
        match node {
            None => vec![None],
            Some(id) => {
                let partition = sdd.node(id).and_then(DefNode::partition);
                expanded_sub_nodes(id, partition)
                    .into_iter()
                    .map(|(sub_id, _)| Some(sub_id))
                    .collect()
            }
        }
    };

    let sources = sub_labels(segment.source.as_deref());
    let targets = sub_labels(segment.target.as_deref());
    let kinds = flow_labels(bundle.flow_partition.as_ref());
    let times = flow_labels(if bundle.id.is_implicit() {
        None
    } else {
        sdd.time_partition()
    });

    let mut keys =
        Vec::with_capacity(sources.len() * targets.len() * kinds.len() * times.len());
    for source in &sources {
        for target in &targets {
            for kind in &kinds {
                for time in &times {
                    keys.push(EdgeKey {
                        source: source.clone(),
                        target: target.clone(),
                        kind: kind.clone(),
                        time: time.clone(),
                    });
                }
            }
        }
    }
    keys
}

/// Branch attribute order: most selective first.
///
/// `source` and `target` narrow the row to a bundle fastest, then selection
/// attributes, then partition dimensions. Attributes only materialise as
/// branches on paths whose rules constrain them.
fn branch_order(sdd: &SankeyDefinition, rules: &Rules<Vec<usize>>) -> Vec<String> {
    let attrs = rules.attrs();
    let mut order: Vec<String> = Vec::with_capacity(attrs.len());
    let mut push = |attr: &str, order: &mut Vec<String>| {
        if attrs.contains(attr) && !order.iter().any(|a| a == attr) {
            order.push(attr.to_string());
        }
    };

    push("source", &mut order);
    push("target", &mut order);

    for bundle in sdd.bundles() {
        if let Some(selection) = &bundle.flow_selection {
            for clause in &selection.clauses {
                push(&clause.attr, &mut order);
            }
        }
    }

    let partitions = sdd
        .flow_partition()
        .into_iter()
        .chain(sdd.bundles().iter().filter_map(|b| b.flow_partition.as_ref()))
        .chain(sdd.time_partition())
        .chain(sdd.nodes().filter_map(|(_, node)| node.partition()));
    for partition in partitions {
        for group in &partition.groups {
            for (attr, _) in &group.query {
                // Node partitions on `process` resolve to source/target,
                // which are already first.
                if attr != "process" {
                    push(attr, &mut order);
                }
            }
        }
    }

    for attr in &attrs {
        push(attr, &mut order);
    }

    order
}

/// Lowers disjoint rules into a decision tree, branching on `order` in turn.
fn build_tree(rules: &[(Query, Vec<usize>)], order: &[String]) -> Tree {
    let Some((attr, rest)) = order.split_first() else {
        let mut ids: Vec<usize> = rules
            .iter()
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        return Tree::leaf(ids);
    };

    let mut all_values: BTreeSet<&str> = BTreeSet::new();
    for (query, _) in rules {
        if let Some(constraint) = query.get(attr) {
            all_values.extend(constraint.values().iter().map(String::as_str));
        }
    }

    let mut by_value: BTreeMap<&str, Vec<(Query, Vec<usize>)>> = BTreeMap::new();
    let mut default_rules: Vec<(Query, Vec<usize>)> = Vec::new();
    let mut everywhere: Vec<(Query, Vec<usize>)> = Vec::new();

    for rule in rules {
        match rule.0.get(attr) {
            None => everywhere.push(rule.clone()),
            Some(Constraint::Includes(values)) => {
                for value in values {
                    by_value.entry(value.as_str()).or_default().push(rule.clone());
                }
            }
            Some(Constraint::Excludes(values)) => {
                // An exclusion matches every other explicit branch and the
                // default region.
                for value in &all_values {
                    if !values.contains(*value) {
                        by_value.entry(*value).or_default().push(rule.clone());
                    }
                }
                default_rules.push(rule.clone());
            }
        }
    }

    let mut branches = BTreeMap::new();
    for value in &all_values {
        let mut branch_rules = by_value.remove(value).unwrap_or_default();
        branch_rules.extend(everywhere.iter().cloned());
        branches.insert(value.to_string(), build_tree(&branch_rules, rest));
    }

    default_rules.extend(everywhere);
    let default = build_tree(&default_rules, rest);

    if branches.is_empty() {
        default
    } else {
        Tree::branch(attr.clone(), branches, default)
    }
}
