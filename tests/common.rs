//! Common test utilities for building definitions and flow rows.
use weft::prelude::*;

/// Two process groups joined by one bundle. Process ids match the node ids,
/// so rows can use `a` and `b` directly.
#[allow(dead_code)]
pub fn two_node_sdd() -> SankeyDefinition {
    SankeyDefinition::new(
        vec![
            ("a", DefNode::from(ProcessGroup::new(["a"]))),
            ("b", DefNode::from(ProcessGroup::new(["b"]))),
        ],
        vec![Bundle::new("a", "b")],
        Ordering::simple(vec![vec!["a"], vec!["b"]]),
    )
}

/// A group feeding the boundary through a waypoint, restricted to one
/// material; other materials leave through the residual stub.
#[allow(dead_code)]
pub fn boundary_selection_sdd() -> SankeyDefinition {
    SankeyDefinition::new(
        vec![
            ("src", DefNode::from(ProcessGroup::new(["s1"]))),
            ("w", DefNode::from(Waypoint::new())),
        ],
        vec![Bundle::new("src", Endpoint::Elsewhere)
            .with_waypoints(["w"])
            .with_flow_selection(FlowSelection::eq("material", "m1"))],
        Ordering::simple(vec![vec!["src"], vec!["w"]]),
    )
}

/// Two sources sharing a waypoint on their way to one sink, with a default
/// flow partition splitting every bundle by material.
#[allow(dead_code)]
pub fn shared_waypoint_sdd() -> SankeyDefinition {
    SankeyDefinition::new(
        vec![
            ("a", DefNode::from(ProcessGroup::new(["a1", "a2"]))),
            ("b", DefNode::from(ProcessGroup::new(["b1"]))),
            ("c", DefNode::from(ProcessGroup::new(["c1"]))),
            ("via", DefNode::from(Waypoint::new())),
        ],
        vec![
            Bundle::new("a", "c").with_waypoints(["via"]),
            Bundle::new("b", "c").with_waypoints(["via"]),
        ],
        Ordering::new(vec![
            vec![vec!["a", "b"]],
            vec![vec!["via"]],
            vec![vec!["c"]],
        ]),
    )
    .with_flow_partition(Partition::simple("material", ["m", "n"]))
}

#[allow(dead_code)]
pub fn flow(source: &str, target: &str, value: f64) -> FlowRow {
    FlowRow::from([
        ("source".to_string(), FlowValue::from(source)),
        ("target".to_string(), FlowValue::from(target)),
        ("value".to_string(), FlowValue::from(value)),
    ])
}

#[allow(dead_code)]
pub fn with_attr(mut row: FlowRow, column: &str, value: impl Into<FlowValue>) -> FlowRow {
    row.insert(column.to_string(), value.into());
    row
}

/// Compiles with default measures and executes in one step.
#[allow(dead_code)]
pub fn weave(sdd: SankeyDefinition, rows: &[FlowRow]) -> SankeyData {
    let spec = Compiler::builder(sdd).build().compile().unwrap();
    Executor::new(&spec).execute(rows).unwrap()
}

/// The link between two regular endpoints, if present.
#[allow(dead_code)]
pub fn find_link<'a>(data: &'a SankeyData, source: &str, target: &str) -> Option<&'a SankeyLink> {
    data.links
        .iter()
        .find(|l| l.source.as_deref() == Some(source) && l.target.as_deref() == Some(target))
}

#[allow(dead_code)]
pub fn find_node<'a>(data: &'a SankeyData, id: &str) -> Option<&'a SankeyNode> {
    data.nodes.iter().find(|n| n.id == id)
}
