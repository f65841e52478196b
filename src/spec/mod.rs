//! The compiled artifact: a frozen, data-independent plan.
//!
//! A [`WeaverSpec`] is pure data. It is produced once by the compiler,
//! optionally serialized to a JSON-shaped document, and then consumed
//! repeatedly by executors; nothing in it is mutated after construction.

mod tree;

pub use tree::Tree;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::definition::Direction;

/// Version tag written into every compiled spec.
pub const SPEC_VERSION: &str = "2.0";

/// What kind of declared node a spec node came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Process,
    Waypoint,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Process => "process",
            NodeKind::Waypoint => "waypoint",
        }
    }
}

/// One diagram node, expanded from a process group or waypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Id of the declared node this sub-node was expanded from.
    #[serde(default)]
    pub group: Option<String>,
    pub style: String,
    pub direction: Direction,
    #[serde(default)]
    pub hidden: bool,
}

/// The sub-nodes formed by partition expansion of a single declared node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub id: String,
    pub title: String,
    pub nodes: Vec<String>,
}

/// One concrete edge. A `None` endpoint means the flow crosses the system
/// boundary there (serialized as `null`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub time: String,
    pub bundle_ids: Vec<String>,
}

/// How one measure column is aggregated per edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Sum,
    Mean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureSpec {
    pub column: String,
    pub aggregation: Aggregation,
}

/// Link colour rule: a lookup table keyed by a categorical attribute, or
/// linear interpolation over a palette for a quantitative one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColorSpec {
    Categorical {
        attr: String,
        lookup: BTreeMap<String, String>,
        default: String,
    },
    Quantitative {
        attr: String,
        intensity: Option<String>,
        domain: (f64, f64),
        palette: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySpec {
    /// Measure column used for link width.
    pub link_width: String,
    pub link_color: ColorSpec,
}

/// The complete compiled plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaverSpec {
    pub version: String,
    pub nodes: BTreeMap<String, NodeSpec>,
    pub groups: Vec<GroupSpec>,
    /// Edges in edge-id order; the routing tree refers to them by index.
    pub edges: Vec<EdgeSpec>,
    /// Layers of bands of node ids.
    pub ordering: Vec<Vec<Vec<String>>>,
    pub measures: Vec<MeasureSpec>,
    pub display: DisplaySpec,
    pub routing_tree: Tree,
}

impl WeaverSpec {
    /// Serializes to the portable JSON document.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Reads a spec back from its JSON document form.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
