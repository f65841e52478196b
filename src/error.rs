use thiserror::Error;

/// Errors that can occur while compiling a `SankeyDefinition` into a `WeaverSpec`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Node '{node_id}' is declared more than once")]
    DuplicateNode { node_id: String },

    #[error("Unknown node '{node_id}' referenced by bundle {bundle}")]
    UnknownNode { node_id: String, bundle: String },

    #[error("Endpoint '{node_id}' of bundle {bundle} is not a process group")]
    NotAProcessGroup { node_id: String, bundle: String },

    #[error("Waypoint '{node_id}' of bundle {bundle} is not declared as a waypoint")]
    NotAWaypoint { node_id: String, bundle: String },

    #[error("Both endpoints of bundle {bundle} are Elsewhere")]
    BothEndsElsewhere { bundle: String },

    #[error("Duplicate unconditional Elsewhere bundle at node '{node_id}'")]
    DuplicateElsewhereBundle { node_id: String },

    #[error("Unknown node '{node_id}' in ordering")]
    UnknownOrderingNode { node_id: String },

    #[error("Node '{node_id}' appears more than once in the ordering")]
    DuplicateOrderingNode { node_id: String },

    #[error("Node '{node_id}' is used by bundle {bundle} but missing from the ordering")]
    NodeNotInOrdering { node_id: String, bundle: String },

    #[error("Bundle {bundle} chains back onto node '{node_id}'")]
    CyclicBundle { bundle: String, node_id: String },

    #[error("Duplicate label '{label}' in partition")]
    DuplicatePartitionLabel { label: String },

    #[error("Partition groups overlap: labels {labels:?} claim the same values")]
    OverlappingPartitionGroups { labels: Vec<String> },

    #[error("Partition dimension 'process' is only valid on a node partition")]
    ProcessDimensionMisused,

    #[error("Bundles sharing segment '{segment_source}' -> '{target}' have conflicting flow partitions")]
    ConflictingFlowPartitions { segment_source: String, target: String },

    #[error("Multiple explicit bundles match the same flows: {bundles:?}")]
    OverlappingBundles { bundles: Vec<String> },
}

/// Errors that can occur while executing a `WeaverSpec` against flow data.
///
/// These only ever signal a malformed spec; imperfect data (missing columns,
/// null values, unmatched branch keys) is always routed to defaults instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecuteError {
    #[error("Routing tree references edge {id}, but the spec has only {edges} edges")]
    EdgeOutOfRange { id: usize, edges: usize },

    #[error("Edge {id} has no source and no target")]
    DanglingEdge { id: usize },

    #[error("Invalid colour '{0}' in display spec")]
    InvalidColor(String),
}
