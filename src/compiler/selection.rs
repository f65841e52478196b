//! Bundle selection: which bundle(s) claim a given flow row.
//!
//! Each bundle contributes one query over the row's `source`, `target` and
//! selection attributes. The queries are refined into disjoint regions and
//! each region resolves its candidate bundles: a declared bundle always claims
//! a row before any Elsewhere bundle can, and Elsewhere bundles only match
//! rows whose far endpoint lies outside the group's own processes. That is
//! what keeps every process balanced when some flows are not captured.

use std::collections::BTreeSet;

use ahash::AHashMap;

use crate::definition::FlowSelection;
use crate::error::CompileError;

use super::rules::{intersect_constraints, Constraint, Query, Rules};
use super::view_graph::BundleId;

/// The selection-relevant shape of one view bundle.
#[derive(Debug, Clone)]
pub struct BundleSelection {
    pub id: BundleId,
    pub from_elsewhere: bool,
    pub to_elsewhere: bool,
    /// Process ids of the source group (empty when the source is Elsewhere).
    pub source_ids: BTreeSet<String>,
    /// Process ids of the target group (empty when the target is Elsewhere).
    pub target_ids: BTreeSet<String>,
    pub flow_selection: Option<FlowSelection>,
}

/// Which bundle(s) a region of row space belongs to.
///
/// A region may legitimately belong to a from-Elsewhere and a to-Elsewhere
/// bundle at once: the row is then the two visible stubs of one flow whose
/// middle crosses outside the system boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleMatch {
    Single(BundleId),
    Pair { from: BundleId, to: BundleId },
}

fn selection_query(bundle: &BundleSelection) -> Query {
    let mut query = Query::new();

    // An Elsewhere endpoint matches anything except the far group's own
    // processes; a row internal to the group must not count as crossing the
    // boundary.
    let source = if bundle.from_elsewhere {
        Constraint::Excludes(bundle.target_ids.clone())
    } else {
        Constraint::Includes(bundle.source_ids.clone())
    };
    let target = if bundle.to_elsewhere {
        Constraint::Excludes(bundle.source_ids.clone())
    } else {
        Constraint::Includes(bundle.target_ids.clone())
    };
    query.insert("source".to_string(), source);
    query.insert("target".to_string(), target);

    if let Some(selection) = &bundle.flow_selection {
        for clause in &selection.clauses {
            let constraint = if clause.negated {
                Constraint::excludes(clause.values.iter().cloned())
            } else {
                Constraint::includes(clause.values.iter().cloned())
            };
            match query.get_mut(&clause.attr) {
                Some(existing) => *existing = intersect_constraints(existing, &constraint),
                None => {
                    query.insert(clause.attr.clone(), constraint);
                }
            }
        }
    }

    query
}

/// Picks the winning bundle(s) among every candidate covering one region.
fn resolve_candidates(
    candidates: &[BundleId],
    bundles: &AHashMap<&BundleId, &BundleSelection>,
) -> Result<Option<BundleMatch>, CompileError> {
    let mut explicit_regular = Vec::new();
    let mut explicit_from = Vec::new();
    let mut explicit_to = Vec::new();
    let mut implicit_from = Vec::new();
    let mut implicit_to = Vec::new();

    for id in candidates {
        let bundle = bundles[id];
        let bucket = if bundle.from_elsewhere {
            if id.is_implicit() {
                &mut implicit_from
            } else {
                &mut explicit_from
            }
        } else if bundle.to_elsewhere {
            if id.is_implicit() {
                &mut implicit_to
            } else {
                &mut explicit_to
            }
        } else {
            &mut explicit_regular
        };
        bucket.push(id.clone());
    }

    if explicit_regular.len() > 1 {
        return Err(CompileError::OverlappingBundles {
            bundles: explicit_regular.iter().map(BundleId::to_string).collect(),
        });
    }
    if explicit_from.len() > 1 || explicit_to.len() > 1 {
        let mut overlapping = explicit_from;
        overlapping.extend(explicit_to);
        return Err(CompileError::OverlappingBundles {
            bundles: overlapping.iter().map(BundleId::to_string).collect(),
        });
    }

    if let Some(id) = explicit_regular.into_iter().next() {
        return Ok(Some(BundleMatch::Single(id)));
    }

    let from = explicit_from.into_iter().next().or_else(|| implicit_from.into_iter().next());
    let to = explicit_to.into_iter().next().or_else(|| implicit_to.into_iter().next());

    Ok(match (from, to) {
        (Some(from), Some(to)) => Some(BundleMatch::Pair { from, to }),
        (Some(id), None) | (None, Some(id)) => Some(BundleMatch::Single(id)),
        (None, None) => None,
    })
}

/// Builds the disjoint selection rules mapping row regions to bundle matches.
pub fn build_selection_rules(
    selections: &[BundleSelection],
) -> Result<Rules<BundleMatch>, CompileError> {
    let by_id: AHashMap<&BundleId, &BundleSelection> =
        selections.iter().map(|b| (&b.id, b)).collect();

    let candidate_rules = Rules::new(
        selections
            .iter()
            .map(|b| (selection_query(b), b.id.clone()))
            .collect(),
    );

    let mut items = Vec::new();
    for (query, candidates) in candidate_rules.refine().items {
        if let Some(resolved) = resolve_candidates(&candidates, &by_id)? {
            items.push((query, resolved));
        }
    }
    Ok(Rules::new(items))
}
