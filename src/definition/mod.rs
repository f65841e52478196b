//! The input model: a declarative description of which diagram to draw.
//!
//! A [`SankeyDefinition`] collects named nodes ([`ProcessGroup`]s and
//! [`Waypoint`]s), the [`Bundle`]s of flows connecting them, and an
//! [`Ordering`] fixing the visual layout grid. Construction is infallible;
//! all cross-referencing rules are checked when the definition is compiled.

mod bundle;
mod node;
mod ordering;
mod partition;

pub use bundle::{Bundle, Endpoint, FlowSelection, SelectionClause};
pub use node::{DefNode, Direction, ProcessGroup, Waypoint};
pub use ordering::Ordering;
pub use partition::{Partition, PartitionGroup};

use ahash::AHashMap;

/// A complete, declarative Sankey diagram definition.
///
/// Nodes keep their declaration order; bundle position in the list is the
/// bundle's origin index, used for deterministic edge numbering downstream.
#[derive(Debug, Clone)]
pub struct SankeyDefinition {
    nodes: Vec<(String, DefNode)>,
    index: AHashMap<String, usize>,
    bundles: Vec<Bundle>,
    ordering: Ordering,
    flow_partition: Option<Partition>,
    time_partition: Option<Partition>,
}

impl SankeyDefinition {
    pub fn new<I, S>(nodes: I, bundles: Vec<Bundle>, ordering: Ordering) -> Self
    where
        I: IntoIterator<Item = (S, DefNode)>,
        S: Into<String>,
    {
        let nodes: Vec<(String, DefNode)> =
            nodes.into_iter().map(|(id, n)| (id.into(), n)).collect();
        let mut index = AHashMap::with_capacity(nodes.len());
        for (i, (id, _)) in nodes.iter().enumerate() {
            // First declaration wins; duplicates are rejected during compilation.
            index.entry(id.clone()).or_insert(i);
        }
        Self {
            nodes,
            index,
            bundles,
            ordering,
            flow_partition: None,
            time_partition: None,
        }
    }

    /// Sets the default flow partition, applied to every bundle that does not
    /// override it.
    pub fn with_flow_partition(mut self, partition: Partition) -> Self {
        self.flow_partition = Some(partition);
        self
    }

    /// Sets the time partition, applied to every edge.
    pub fn with_time_partition(mut self, partition: Partition) -> Self {
        self.time_partition = Some(partition);
        self
    }

    pub fn node(&self, id: &str) -> Option<&DefNode> {
        self.index.get(id).map(|&i| &self.nodes[i].1)
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = (&str, &DefNode)> {
        self.nodes.iter().map(|(id, n)| (id.as_str(), n))
    }

    pub fn bundles(&self) -> &[Bundle] {
        &self.bundles
    }

    pub fn ordering(&self) -> &Ordering {
        &self.ordering
    }

    pub fn flow_partition(&self) -> Option<&Partition> {
        self.flow_partition.as_ref()
    }

    pub fn time_partition(&self) -> Option<&Partition> {
        self.time_partition.as_ref()
    }
}
