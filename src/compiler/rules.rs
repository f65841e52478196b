//! Queries and rules over row-attribute space.
//!
//! A [`Query`] constrains some attributes to include or exclude value sets; a
//! [`Rules`] collection pairs queries with labels, defining a partial function
//! from attribute space. Bundle selections and partition buckets are both
//! expressed this way, which is what lets them be combined by plain query
//! intersection and then lowered into a single decision tree.

use std::collections::{BTreeMap, BTreeSet};

/// A constraint on one attribute's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    Includes(BTreeSet<String>),
    Excludes(BTreeSet<String>),
}

impl Constraint {
    pub fn includes<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Constraint::Includes(values.into_iter().map(Into::into).collect())
    }

    pub fn excludes<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Constraint::Excludes(values.into_iter().map(Into::into).collect())
    }

    /// All values this constraint names, regardless of polarity.
    pub fn values(&self) -> &BTreeSet<String> {
        match self {
            Constraint::Includes(v) | Constraint::Excludes(v) => v,
        }
    }
}

/// Intersection of two constraints on the same attribute.
pub fn intersect_constraints(a: &Constraint, b: &Constraint) -> Constraint {
    use Constraint::*;
    match (a, b) {
        (Includes(i1), Includes(i2)) => Includes(i1.intersection(i2).cloned().collect()),
        (Includes(i), Excludes(e)) | (Excludes(e), Includes(i)) => {
            Includes(i.difference(e).cloned().collect())
        }
        (Excludes(e1), Excludes(e2)) => Excludes(e1.union(e2).cloned().collect()),
    }
}

/// A conjunction of per-attribute constraints. Ordered so that region
/// enumeration is deterministic.
pub type Query = BTreeMap<String, Constraint>;

pub fn intersect_queries(a: &Query, b: &Query) -> Query {
    let mut result = a.clone();
    for (attr, c2) in b {
        match result.get_mut(attr) {
            Some(c1) => *c1 = intersect_constraints(c1, c2),
            None => {
                result.insert(attr.clone(), c2.clone());
            }
        }
    }
    result
}

/// A query is unsatisfiable iff some attribute must be in an empty set.
pub fn is_satisfiable(q: &Query) -> bool {
    q.values()
        .all(|c| !matches!(c, Constraint::Includes(v) if v.is_empty()))
}

/// An ordered collection of `(query, label)` rules.
#[derive(Debug, Clone, PartialEq)]
pub struct Rules<T> {
    pub items: Vec<(Query, T)>,
}

impl<T: Clone> Rules<T> {
    pub fn new(items: Vec<(Query, T)>) -> Self {
        Self { items }
    }

    pub fn single(query: Query, label: T) -> Self {
        Self {
            items: vec![(query, label)],
        }
    }

    pub fn map<U, F: Fn(&T) -> U>(&self, f: F) -> Rules<U> {
        Rules {
            items: self
                .items
                .iter()
                .map(|(q, label)| (q.clone(), f(label)))
                .collect(),
        }
    }

    /// All attributes constrained by any rule.
    pub fn attrs(&self) -> BTreeSet<String> {
        self.items
            .iter()
            .flat_map(|(q, _)| q.keys().cloned())
            .collect()
    }

    /// All values named in constraints on `attr`, regardless of polarity.
    pub fn query_values(&self, attr: &str) -> BTreeSet<String> {
        self.items
            .iter()
            .filter_map(|(q, _)| q.get(attr))
            .flat_map(|c| c.values().iter().cloned())
            .collect()
    }

    /// Expands each rule via `f`, intersecting queries and dropping
    /// unsatisfiable results.
    pub fn expand<U, F>(&self, f: F) -> Rules<U>
    where
        F: Fn(&T) -> Rules<U>,
    {
        let mut items = Vec::new();
        for (q1, label) in &self.items {
            for (q2, new_label) in f(label).items {
                let combined = intersect_queries(q1, &q2);
                if is_satisfiable(&combined) {
                    items.push((combined, new_label));
                }
            }
        }
        Rules { items }
    }

    /// Pairwise product of two rule sets by query intersection.
    pub fn product<U: Clone, V, F>(&self, other: &Rules<U>, combine: F) -> Rules<V>
    where
        F: Fn(&T, &U) -> V,
    {
        self.expand(|t| other.map(|u| combine(t, u)))
    }

    /// Common refinement: the distinct regions of attribute space, each
    /// carrying every label whose rule covers it.
    ///
    /// Input rules may overlap; output regions never do.
    pub fn refine(&self) -> Rules<Vec<T>> {
        let attrs: Vec<String> = self.attrs().into_iter().collect();
        let mut out = Vec::new();
        refine_recursive(&self.items, &attrs, &Query::new(), &mut out);
        Rules { items: out }
    }
}

fn refine_recursive<T: Clone>(
    rules: &[(Query, T)],
    remaining: &[String],
    prefix: &Query,
    out: &mut Vec<(Query, Vec<T>)>,
) {
    let Some((attr, rest)) = remaining.split_first() else {
        let labels = rules.iter().map(|(_, label)| label.clone()).collect();
        out.push((prefix.clone(), labels));
        return;
    };

    let explicit = explicit_values(rules, attr);

    for value in &explicit {
        let restricted = restrict_to_value(rules, attr, value);
        let mut p = prefix.clone();
        p.insert(attr.clone(), Constraint::includes([value.clone()]));
        refine_recursive(&restricted, rest, &p, out);
    }

    let restricted = restrict_to_default(rules, attr, &explicit);
    if explicit.is_empty() {
        refine_recursive(&restricted, rest, prefix, out);
    } else {
        let mut p = prefix.clone();
        p.insert(attr.clone(), Constraint::Excludes(explicit.clone()));
        refine_recursive(&restricted, rest, &p, out);
    }
}

fn explicit_values<T>(rules: &[(Query, T)], attr: &str) -> BTreeSet<String> {
    rules
        .iter()
        .filter_map(|(q, _)| q.get(attr))
        .flat_map(|c| c.values().iter().cloned())
        .collect()
}

fn without_attr(query: &Query, attr: &str) -> Query {
    let mut q = query.clone();
    q.remove(attr);
    q
}

/// Rules still satisfiable given `attr == value`, with the now-redundant
/// constraint removed.
fn restrict_to_value<T: Clone>(
    rules: &[(Query, T)],
    attr: &str,
    value: &str,
) -> Vec<(Query, T)> {
    let mut result = Vec::new();
    for (query, label) in rules {
        match query.get(attr) {
            None => result.push((query.clone(), label.clone())),
            Some(Constraint::Includes(values)) if values.contains(value) => {
                result.push((without_attr(query, attr), label.clone()));
            }
            Some(Constraint::Excludes(values)) if !values.contains(value) => {
                result.push((without_attr(query, attr), label.clone()));
            }
            _ => {}
        }
    }
    result
}

/// Rules matching the region where `attr` takes none of the explicit values.
fn restrict_to_default<T: Clone>(
    rules: &[(Query, T)],
    attr: &str,
    explicit: &BTreeSet<String>,
) -> Vec<(Query, T)> {
    let mut result = Vec::new();
    for (query, label) in rules {
        match query.get(attr) {
            None => result.push((query.clone(), label.clone())),
            // An Excludes matches the default region when everything it
            // excludes is already excluded by the region itself.
            Some(Constraint::Excludes(values)) if values.is_subset(explicit) => {
                result.push((without_attr(query, attr), label.clone()));
            }
            _ => {}
        }
    }
    result
}
