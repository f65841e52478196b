//! # Weft - Sankey Diagram Compilation and Evaluation Engine
//!
//! **Weft** compiles a declarative Sankey diagram definition into a portable,
//! data-independent plan that can be applied repeatedly to tabular flow data.
//! The expensive structural work -- expanding process groups, chaining bundles
//! through waypoints, crossing partitions, and building a decision tree for
//! row routing -- happens once, ahead of time; applying the plan to a dataset
//! is a single pass over the rows.
//!
//! ## Core Workflow
//!
//! 1.  **Define**: Describe the diagram with a [`SankeyDefinition`]: process
//!     groups selecting raw process IDs, waypoints, bundles of flows between
//!     them, and an ordering that fixes the layout grid.
//! 2.  **Compile**: [`Compiler`] turns the definition into a [`WeaverSpec`]:
//!     typed nodes, a flat edge list, a routing tree, measure aggregation
//!     rules, and a display description. The spec is pure data and can be
//!     serialized to a JSON document.
//! 3.  **Execute**: [`Executor`] routes every flow row through the tree,
//!     aggregates measures per edge, applies colour, and emits the final
//!     nodes-and-links data with everything unused pruned away.
//!
//! ## Quick Start
//!
//! ```rust
//! use weft::prelude::*;
//!
//! fn main() -> Result<()> {
//!     // Two process groups connected by one bundle.
//!     let nodes = vec![
//!         ("a", DefNode::from(ProcessGroup::new(["a1"]))),
//!         ("b", DefNode::from(ProcessGroup::new(["b1"]))),
//!     ];
//!     let bundles = vec![Bundle::new("a", "b")];
//!     let ordering = Ordering::simple(vec![vec!["a"], vec!["b"]]);
//!     let sdd = SankeyDefinition::new(nodes, bundles, ordering);
//!
//!     // Compile once...
//!     let spec = Compiler::builder(sdd).build().compile()?;
//!
//!     // ...then execute against any compatible dataset.
//!     let rows: Vec<FlowRow> = vec![
//!         FlowRow::from([
//!             ("source".to_string(), FlowValue::from("a1")),
//!             ("target".to_string(), FlowValue::from("b1")),
//!             ("value".to_string(), FlowValue::from(3.0)),
//!         ]),
//!     ];
//!     let result = Executor::new(&spec).execute(&rows)?;
//!
//!     assert_eq!(result.links.len(), 1);
//!     assert_eq!(result.links[0].link_width, 3.0);
//!     Ok(())
//! }
//! ```
//!
//! ## Boundary Flows
//!
//! A bundle endpoint may be [`Endpoint::Elsewhere`], meaning the flow enters
//! or leaves the system boundary. The compiler also authors residual boundary
//! edges for each process group, so flows not captured by any declared bundle
//! still balance the nodes they touch instead of silently disappearing.

pub mod compiler;
pub mod data;
pub mod definition;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod spec;

pub use compiler::{Compiler, CompilerBuilder, LinkColor};
pub use definition::SankeyDefinition;
pub use executor::Executor;
pub use spec::WeaverSpec;
