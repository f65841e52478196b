//! Tests for definition validation, edge generation and tree construction.
mod common;

use common::*;
use weft::prelude::*;

fn compile(sdd: SankeyDefinition) -> WeaverSpec {
    Compiler::builder(sdd).build().compile().unwrap()
}

fn compile_err(sdd: SankeyDefinition) -> CompileError {
    Compiler::builder(sdd).build().compile().unwrap_err()
}

#[test]
fn test_two_node_edges_and_ids() {
    let spec = compile(two_node_sdd());

    // The declared bundle's edge first, then the boundary residuals in node
    // declaration order.
    assert_eq!(spec.edges.len(), 3);

    let edge = &spec.edges[0];
    assert_eq!(edge.source.as_deref(), Some("a"));
    assert_eq!(edge.target.as_deref(), Some("b"));
    assert_eq!(edge.kind, "*");
    assert_eq!(edge.time, "*");
    assert_eq!(edge.bundle_ids, vec!["0"]);

    assert_eq!(spec.edges[1].source.as_deref(), Some("a"));
    assert_eq!(spec.edges[1].target, None);
    assert_eq!(spec.edges[1].bundle_ids, vec!["__a>"]);

    assert_eq!(spec.edges[2].source, None);
    assert_eq!(spec.edges[2].target.as_deref(), Some("b"));
    assert_eq!(spec.edges[2].bundle_ids, vec!["__>b"]);
}

#[test]
fn test_two_node_routing() {
    let spec = compile(two_node_sdd());

    assert_eq!(spec.routing_tree.route(&flow("a", "b", 1.0)).to_vec(), vec![0]);
    // Leaving the system...
    assert_eq!(spec.routing_tree.route(&flow("a", "x", 1.0)).to_vec(), vec![1]);
    // ...entering it...
    assert_eq!(spec.routing_tree.route(&flow("x", "b", 1.0)).to_vec(), vec![2]);
    // ...or never touching it.
    assert!(spec.routing_tree.route(&flow("x", "y", 1.0)).is_empty());
}

#[test]
fn test_node_map_and_groups() {
    let spec = compile(two_node_sdd());

    let a = &spec.nodes["a"];
    assert_eq!(a.title, "a");
    assert_eq!(a.kind, NodeKind::Process);
    assert_eq!(a.group.as_deref(), Some("a"));
    assert!(!a.hidden);

    let ids: Vec<&String> = spec.groups.iter().map(|g| &g.id).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(spec.groups[0].nodes, vec!["a"]);
}

#[test]
fn test_partitioned_node_expansion() {
    let partition = Partition::grouped(
        "day",
        [
            ("weekday", vec!["mon", "tue", "wed", "thu", "fri"]),
            ("weekend", vec!["sat", "sun"]),
        ],
    );
    let sdd = SankeyDefinition::new(
        vec![
            ("i", DefNode::from(ProcessGroup::new(["i1"]))),
            (
                "j",
                DefNode::from(ProcessGroup::new(["j1"]).with_partition(partition)),
            ),
        ],
        vec![Bundle::new("i", "j")],
        Ordering::simple(vec![vec!["i"], vec!["j"]]),
    );
    let spec = compile(sdd);

    // Sub-nodes for every bucket plus the hidden residual.
    assert!(spec.nodes.contains_key("j^weekday"));
    assert!(spec.nodes.contains_key("j^weekend"));
    assert!(spec.nodes["j^_"].hidden);
    assert_eq!(spec.nodes["j^weekday"].title, "weekday");

    let group = spec.groups.iter().find(|g| g.id == "j").unwrap();
    assert_eq!(group.nodes, vec!["j^weekday", "j^weekend", "j^_"]);

    // The declared bundle expands to one edge per bucket, in partition order.
    assert_eq!(spec.edges[0].target.as_deref(), Some("j^weekday"));
    assert_eq!(spec.edges[1].target.as_deref(), Some("j^weekend"));
    assert_eq!(spec.edges[2].target.as_deref(), Some("j^_"));

    // The ordering follows the expansion.
    assert_eq!(
        spec.ordering[1][0],
        vec!["j^weekday", "j^weekend", "j^_"]
    );

    // Rows route by the partition dimension.
    let monday = with_attr(flow("i1", "j1", 1.0), "day", "mon");
    assert_eq!(spec.routing_tree.route(&monday).to_vec(), vec![0]);
    let sunday = with_attr(flow("i1", "j1", 1.0), "day", "sun");
    assert_eq!(spec.routing_tree.route(&sunday).to_vec(), vec![1]);
    let unknown = with_attr(flow("i1", "j1", 1.0), "day", "holiday");
    assert_eq!(spec.routing_tree.route(&unknown).to_vec(), vec![2]);
}

#[test]
fn test_shared_segment_merges_edges() {
    let spec = compile(shared_waypoint_sdd());

    let shared: Vec<&EdgeSpec> = spec
        .edges
        .iter()
        .filter(|e| e.source.as_deref() == Some("via") && e.target.as_deref() == Some("c"))
        .collect();

    // One edge per material bucket, each owned by both bundles.
    assert_eq!(shared.len(), 3);
    for edge in shared {
        assert_eq!(edge.bundle_ids, vec!["0", "1"]);
    }
}

#[test]
fn test_shared_segment_flow_partition_conflict() {
    // One bundle overrides the partition on the shared leg.
    let sdd = SankeyDefinition::new(
        vec![
            ("a", DefNode::from(ProcessGroup::new(["a1", "a2"]))),
            ("b", DefNode::from(ProcessGroup::new(["b1"]))),
            ("c", DefNode::from(ProcessGroup::new(["c1"]))),
            ("via", DefNode::from(Waypoint::new())),
        ],
        vec![
            Bundle::new("a", "c").with_waypoints(["via"]),
            Bundle::new("b", "c")
                .with_waypoints(["via"])
                .with_flow_partition(Partition::simple("material", ["m"])),
        ],
        Ordering::new(vec![
            vec![vec!["a", "b"]],
            vec![vec!["via"]],
            vec![vec!["c"]],
        ]),
    )
    .with_flow_partition(Partition::simple("material", ["m", "n"]));

    assert!(matches!(
        compile_err(sdd),
        CompileError::ConflictingFlowPartitions { .. }
    ));
}

#[test]
fn test_unknown_bundle_endpoint() {
    let sdd = SankeyDefinition::new(
        vec![("a", DefNode::from(ProcessGroup::new(["a"])))],
        vec![Bundle::new("a", "missing")],
        Ordering::simple(vec![vec!["a"]]),
    );
    assert_eq!(
        compile_err(sdd),
        CompileError::UnknownNode {
            node_id: "missing".to_string(),
            bundle: "0".to_string(),
        }
    );
}

#[test]
fn test_bundle_endpoint_must_be_process_group() {
    let sdd = SankeyDefinition::new(
        vec![
            ("a", DefNode::from(ProcessGroup::new(["a"]))),
            ("w", DefNode::from(Waypoint::new())),
        ],
        vec![Bundle::new("a", "w")],
        Ordering::simple(vec![vec!["a"], vec!["w"]]),
    );
    assert!(matches!(
        compile_err(sdd),
        CompileError::NotAProcessGroup { .. }
    ));
}

#[test]
fn test_waypoint_must_be_declared_as_waypoint() {
    let sdd = SankeyDefinition::new(
        vec![
            ("a", DefNode::from(ProcessGroup::new(["a"]))),
            ("b", DefNode::from(ProcessGroup::new(["b"]))),
            ("c", DefNode::from(ProcessGroup::new(["c"]))),
        ],
        vec![Bundle::new("a", "b").with_waypoints(["c"])],
        Ordering::simple(vec![vec!["a"], vec!["c"], vec!["b"]]),
    );
    assert!(matches!(compile_err(sdd), CompileError::NotAWaypoint { .. }));
}

#[test]
fn test_unknown_ordering_node() {
    let sdd = SankeyDefinition::new(
        vec![("a", DefNode::from(ProcessGroup::new(["a"])))],
        vec![],
        Ordering::simple(vec![vec!["a", "ghost"]]),
    );
    assert_eq!(
        compile_err(sdd),
        CompileError::UnknownOrderingNode {
            node_id: "ghost".to_string(),
        }
    );
}

#[test]
fn test_bundle_node_missing_from_ordering() {
    let sdd = SankeyDefinition::new(
        vec![
            ("a", DefNode::from(ProcessGroup::new(["a"]))),
            ("b", DefNode::from(ProcessGroup::new(["b"]))),
        ],
        vec![Bundle::new("a", "b")],
        Ordering::simple(vec![vec!["a"]]),
    );
    assert!(matches!(
        compile_err(sdd),
        CompileError::NodeNotInOrdering { .. }
    ));
}

#[test]
fn test_both_ends_elsewhere_rejected() {
    let sdd = SankeyDefinition::new(
        vec![("a", DefNode::from(ProcessGroup::new(["a"])))],
        vec![Bundle::new(Endpoint::Elsewhere, Endpoint::Elsewhere)],
        Ordering::simple(vec![vec!["a"]]),
    );
    assert!(matches!(
        compile_err(sdd),
        CompileError::BothEndsElsewhere { .. }
    ));
}

#[test]
fn test_cyclic_waypoint_chain_rejected() {
    let sdd = SankeyDefinition::new(
        vec![
            ("a", DefNode::from(ProcessGroup::new(["a"]))),
            ("b", DefNode::from(ProcessGroup::new(["b"]))),
            ("w", DefNode::from(Waypoint::new())),
        ],
        vec![Bundle::new("a", "b").with_waypoints(["w", "w"])],
        Ordering::simple(vec![vec!["a"], vec!["w"], vec!["b"]]),
    );
    assert!(matches!(compile_err(sdd), CompileError::CyclicBundle { .. }));
}

#[test]
fn test_duplicate_partition_label_rejected() {
    let partition = Partition::grouped("m", [("x", vec!["1"]), ("x", vec!["2"])]);
    let sdd = SankeyDefinition::new(
        vec![
            ("a", DefNode::from(ProcessGroup::new(["a"]).with_partition(partition))),
            ("b", DefNode::from(ProcessGroup::new(["b"]))),
        ],
        vec![Bundle::new("a", "b")],
        Ordering::simple(vec![vec!["a"], vec!["b"]]),
    );
    assert_eq!(
        compile_err(sdd),
        CompileError::DuplicatePartitionLabel {
            label: "x".to_string(),
        }
    );
}

#[test]
fn test_categorical_palette_assignment() {
    let sdd = two_node_sdd().with_flow_partition(Partition::simple("material", ["m", "n"]));
    let spec = Compiler::builder(sdd)
        .with_link_color(LinkColor::categorical_with_palette(
            "type",
            ["#111111", "#222222", "#333333"],
        ))
        .build()
        .compile()
        .unwrap();

    match &spec.display.link_color {
        ColorSpec::Categorical { lookup, default, .. } => {
            // Observed types in sorted order get palette colours. The
            // boundary stubs keep the generic `*` type, so it is coloured
            // too; only the residual bucket stays unlisted.
            assert_eq!(lookup.get("*").unwrap(), "#111111");
            assert_eq!(lookup.get("m").unwrap(), "#222222");
            assert_eq!(lookup.get("n").unwrap(), "#333333");
            assert!(!lookup.contains_key("_"));
            assert_eq!(default, "#cccccc");
        }
        other => panic!("unexpected colour spec {:?}", other),
    }
}

#[test]
fn test_measures_and_link_width_defaults() {
    let spec = compile(two_node_sdd());
    assert_eq!(spec.measures.len(), 1);
    assert_eq!(spec.measures[0].column, "value");
    assert_eq!(spec.measures[0].aggregation, Aggregation::Sum);
    assert_eq!(spec.display.link_width, "value");
    assert_eq!(spec.version, SPEC_VERSION);
}

#[test]
fn test_selection_attribute_becomes_branch() {
    let spec = compile(boundary_selection_sdd());

    // m1 travels the waypoint chain; anything else leaves directly.
    let m1 = with_attr(flow("s1", "x", 1.0), "material", "m1");
    let chain = spec.routing_tree.route(&m1).to_vec();
    assert_eq!(chain.len(), 2);

    let m2 = with_attr(flow("s1", "x", 1.0), "material", "m2");
    let residual = spec.routing_tree.route(&m2).to_vec();
    assert_eq!(residual.len(), 1);
    assert!(chain.iter().all(|id| !residual.contains(id)));
}
