use serde::{Deserialize, Serialize};

use super::Partition;

/// Horizontal flow direction of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Direction {
    L,
    #[default]
    R,
}

/// A named aggregation of raw process IDs from the flow data.
///
/// By default all selected processes are lumped into one node in the diagram;
/// setting a `partition` splits the node into labelled sub-nodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessGroup {
    pub selection: Vec<String>,
    pub partition: Option<Partition>,
    pub direction: Direction,
    pub title: Option<String>,
    pub style: Option<String>,
}

impl ProcessGroup {
    pub fn new<I, S>(selection: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            selection: selection.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_partition(mut self, partition: Partition) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }
}

/// A routing-only control point along bundles of flows.
///
/// A waypoint selects no processes; it exists to steer bundles through the
/// diagram and, optionally, to split them with a `partition`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Waypoint {
    pub partition: Option<Partition>,
    pub direction: Direction,
    pub title: Option<String>,
    pub style: Option<String>,
}

impl Waypoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_partition(mut self, partition: Partition) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }
}

/// Either kind of declared node.
#[derive(Debug, Clone, PartialEq)]
pub enum DefNode {
    Process(ProcessGroup),
    Waypoint(Waypoint),
}

impl DefNode {
    pub fn is_process(&self) -> bool {
        matches!(self, DefNode::Process(_))
    }

    pub fn partition(&self) -> Option<&Partition> {
        match self {
            DefNode::Process(p) => p.partition.as_ref(),
            DefNode::Waypoint(w) => w.partition.as_ref(),
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            DefNode::Process(p) => p.direction,
            DefNode::Waypoint(w) => w.direction,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            DefNode::Process(p) => p.title.as_deref(),
            DefNode::Waypoint(w) => w.title.as_deref(),
        }
    }

    pub fn style(&self) -> Option<&str> {
        match self {
            DefNode::Process(p) => p.style.as_deref(),
            DefNode::Waypoint(w) => w.style.as_deref(),
        }
    }
}

impl From<ProcessGroup> for DefNode {
    fn from(p: ProcessGroup) -> Self {
        DefNode::Process(p)
    }
}

impl From<Waypoint> for DefNode {
    fn from(w: Waypoint) -> Self {
        DefNode::Waypoint(w)
    }
}
