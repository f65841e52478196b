//! Convenient imports for the common compile-and-execute workflow.
//!
//! ```rust,no_run
//! use weft::prelude::*;
//!
//! # fn run() -> Result<()> {
//! let nodes = vec![
//!     ("farm", DefNode::from(ProcessGroup::new(["farm1", "farm2"]))),
//!     ("market", DefNode::from(ProcessGroup::new(["market1"]))),
//! ];
//! let bundles = vec![Bundle::new("farm", "market")];
//! let sdd = SankeyDefinition::new(nodes, bundles, Ordering::simple(vec![vec!["farm"], vec!["market"]]));
//!
//! let spec = Compiler::builder(sdd).build().compile()?;
//! let rows: Vec<FlowRow> = Vec::new();
//! let result = Executor::new(&spec).execute(&rows)?;
//! println!("{} links", result.links.len());
//! # Ok(())
//! # }
//! ```

// Definition model
pub use crate::definition::{
    Bundle, DefNode, Direction, Endpoint, FlowSelection, Ordering, Partition, PartitionGroup,
    ProcessGroup, SankeyDefinition, SelectionClause, Waypoint,
};

// Compilation
pub use crate::compiler::{Compiler, CompilerBuilder, LinkColor};

// Compiled artifact
pub use crate::spec::{
    Aggregation, ColorSpec, DisplaySpec, EdgeSpec, GroupSpec, MeasureSpec, NodeKind, NodeSpec,
    Tree, WeaverSpec, SPEC_VERSION,
};

// Execution
pub use crate::executor::{Executor, SankeyData, SankeyGroup, SankeyLink, SankeyNode};

// Flow data
pub use crate::data::{FlowRecord, FlowRow, FlowValue};

// Error types
pub use crate::error::{CompileError, ExecuteError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
