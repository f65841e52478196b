//! Tests for routing, aggregation, colour and pruning at execution time.
mod common;

use common::*;
use weft::prelude::*;

#[test]
fn test_single_bundle_aggregation() {
    let rows = vec![flow("a", "b", 5.0), flow("a", "b", 3.0), flow("x", "y", 10.0)];
    let result = weave(two_node_sdd(), &rows);

    assert_eq!(result.links.len(), 1);
    let link = &result.links[0];
    assert_eq!(link.source.as_deref(), Some("a"));
    assert_eq!(link.target.as_deref(), Some("b"));
    assert_eq!(link.link_width, 8.0);
    assert_eq!(link.original_flows, vec![0, 1]);
    assert_eq!(link.data["value"], 8.0);
    assert_eq!(link.opacity, 1.0);
    assert_eq!(link.title, "*");

    // The unrelated row is dropped, and only the two endpoints survive.
    assert_eq!(result.nodes.len(), 2);
    assert_eq!(result.nodes[0].id, "a");
    assert_eq!(result.nodes[1].id, "b");
}

#[test]
fn test_from_elsewhere_attachment() {
    let sdd = SankeyDefinition::new(
        vec![("a", DefNode::from(ProcessGroup::new(["a"])))],
        vec![Bundle::new(Endpoint::Elsewhere, "a")],
        Ordering::simple(vec![vec!["a"]]),
    );
    let rows = vec![flow("x", "a", 7.0), flow("y", "a", 3.0)];
    let result = weave(sdd, &rows);

    assert!(result.links.is_empty());
    assert_eq!(result.nodes.len(), 1);

    let node = &result.nodes[0];
    assert_eq!(node.id, "a");
    assert_eq!(node.from_elsewhere_links.len(), 1);
    assert_eq!(node.from_elsewhere_links[0].link_width, 10.0);
    assert_eq!(node.from_elsewhere_links[0].original_flows, vec![0, 1]);
    assert!(node.to_elsewhere_links.is_empty());
}

#[test]
fn test_sum_and_mean_measures() {
    let rows = vec![
        with_attr(flow("a", "b", 10.0), "intensity", 2.0),
        with_attr(flow("a", "b", 20.0), "intensity", 4.0),
    ];
    let spec = Compiler::builder(two_node_sdd())
        .with_measure("value", Aggregation::Sum)
        .with_measure("intensity", Aggregation::Mean)
        .build()
        .compile()
        .unwrap();
    let result = Executor::new(&spec).execute(&rows).unwrap();

    let link = find_link(&result, "a", "b").unwrap();
    assert_eq!(link.data["value"], 30.0);
    assert_eq!(link.data["intensity"], 3.0);
}

#[test]
fn test_mean_ignores_missing_values() {
    let rows = vec![
        with_attr(flow("a", "b", 1.0), "score", 4.0),
        flow("a", "b", 1.0),
        with_attr(flow("a", "b", 1.0), "score", FlowValue::Null),
    ];
    let spec = Compiler::builder(two_node_sdd())
        .with_measure("value", Aggregation::Sum)
        .with_measure("score", Aggregation::Mean)
        .build()
        .compile()
        .unwrap();
    let result = Executor::new(&spec).execute(&rows).unwrap();

    let link = find_link(&result, "a", "b").unwrap();
    // One present value out of three rows.
    assert_eq!(link.data["score"], 4.0);
    assert_eq!(link.data["value"], 3.0);
}

#[test]
fn test_missing_measure_column_aggregates_to_zero() {
    let spec = Compiler::builder(two_node_sdd())
        .with_measure("value", Aggregation::Sum)
        .with_measure("absent", Aggregation::Mean)
        .build()
        .compile()
        .unwrap();
    let rows = vec![flow("a", "b", 2.0)];
    let result = Executor::new(&spec).execute(&rows).unwrap();

    let link = find_link(&result, "a", "b").unwrap();
    assert_eq!(link.data["absent"], 0.0);
}

#[test]
fn test_quantitative_color_midpoint() {
    let spec = Compiler::builder(two_node_sdd())
        .with_link_color(LinkColor::quantitative(
            "value",
            (0.0, 100.0),
            ["#000000", "#ffffff"],
        ))
        .build()
        .compile()
        .unwrap();
    let rows = vec![flow("a", "b", 50.0)];
    let result = Executor::new(&spec).execute(&rows).unwrap();

    assert_eq!(find_link(&result, "a", "b").unwrap().color, "#7f7f7f");
}

#[test]
fn test_categorical_color_from_edge_type() {
    let sdd = two_node_sdd().with_flow_partition(Partition::simple("material", ["m", "n"]));
    let spec = Compiler::builder(sdd)
        .with_link_color(LinkColor::categorical_with_palette(
            "type",
            ["#111111", "#222222", "#333333"],
        ))
        .build()
        .compile()
        .unwrap();
    let rows = vec![
        with_attr(flow("a", "b", 1.0), "material", "m"),
        with_attr(flow("a", "b", 2.0), "material", "n"),
    ];
    let result = Executor::new(&spec).execute(&rows).unwrap();

    assert_eq!(result.links.len(), 2);
    let m = result.links.iter().find(|l| l.kind == "m").unwrap();
    let n = result.links.iter().find(|l| l.kind == "n").unwrap();
    assert_eq!(m.color, "#222222");
    assert_eq!(n.color, "#333333");
}

#[test]
fn test_unmatched_rows_drop_but_boundary_rows_attach() {
    let rows = vec![
        flow("a", "b", 1.0),
        flow("a", "out", 2.0),
        flow("in", "b", 3.0),
        flow("x", "y", 4.0),
    ];
    let result = weave(two_node_sdd(), &rows);

    assert_eq!(result.links.len(), 1);

    let a = find_node(&result, "a").unwrap();
    assert_eq!(a.to_elsewhere_links.len(), 1);
    assert_eq!(a.to_elsewhere_links[0].link_width, 2.0);

    let b = find_node(&result, "b").unwrap();
    assert_eq!(b.from_elsewhere_links.len(), 1);
    assert_eq!(b.from_elsewhere_links[0].link_width, 3.0);
}

#[test]
fn test_no_row_counted_twice() {
    let sdd = SankeyDefinition::new(
        vec![
            ("a", DefNode::from(ProcessGroup::new(["a1"]))),
            ("b", DefNode::from(ProcessGroup::new(["b1", "b2"]))),
        ],
        vec![Bundle::new("a", "b")],
        Ordering::simple(vec![vec!["a"], vec!["b"]]),
    );
    let rows = vec![
        with_attr(flow("a1", "b1", 3.0), "material", "m"),
        with_attr(flow("a1", "b2", 2.0), "material", "m"),
    ];
    let result = weave(sdd, &rows);

    // Count how many links (regular or boundary) claim each row.
    let mut claims = vec![0usize; rows.len()];
    let all_links = result.links.iter().chain(
        result
            .nodes
            .iter()
            .flat_map(|n| n.from_elsewhere_links.iter().chain(n.to_elsewhere_links.iter())),
    );
    for link in all_links {
        for &row in &link.original_flows {
            claims[row] += 1;
        }
    }
    assert_eq!(claims, vec![1, 1]);
}

#[test]
fn test_group_pruning_and_redundant_group_dropped() {
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
    let days = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];
    let rows: Vec<FlowRow> = days
        .iter()
        .map(|day| with_attr(flow("i1", "j1", 1.0), "day", *day))
        .collect();
    let result = weave(sdd, &rows);

    // Two populated buckets; the residual sub-node is pruned.
    let weekday = find_link(&result, "i", "j^weekday").unwrap();
    assert_eq!(weekday.link_width, 5.0);
    let weekend = find_link(&result, "i", "j^weekend").unwrap();
    assert_eq!(weekend.link_width, 2.0);
    assert!(find_node(&result, "j^_").is_none());

    // The partitioned group survives with only its used members; the
    // single-node group `i` is redundant and dropped.
    assert_eq!(result.groups.len(), 1);
    assert_eq!(result.groups[0].id, "j");
    assert_eq!(result.groups[0].nodes, vec!["j^weekday", "j^weekend"]);

    // Ordering keeps its structure, filtered to surviving nodes.
    assert_eq!(
        result.ordering,
        vec![
            vec![vec!["i".to_string()]],
            vec![vec!["j^weekday".to_string(), "j^weekend".to_string()]],
        ]
    );
}

#[test]
fn test_boundary_selection_residual_not_lost() {
    let rows = vec![
        with_attr(flow("s1", "x", 1.0), "material", "m1"),
        with_attr(flow("s1", "y", 1.0), "material", "m2"),
    ];
    let result = weave(boundary_selection_sdd(), &rows);

    // The selected material travels through the waypoint...
    let chain = find_link(&result, "src", "w").unwrap();
    assert_eq!(chain.link_width, 1.0);
    assert_eq!(chain.original_flows, vec![0]);

    let w = find_node(&result, "w").unwrap();
    assert_eq!(w.to_elsewhere_links.len(), 1);
    assert_eq!(w.to_elsewhere_links[0].original_flows, vec![0]);

    // ...and the rest leaves through the generic stub instead of vanishing.
    let src = find_node(&result, "src").unwrap();
    assert_eq!(src.to_elsewhere_links.len(), 1);
    assert_eq!(src.to_elsewhere_links[0].original_flows, vec![1]);
}

#[test]
fn test_empty_dataset_produces_empty_diagram() {
    let result = weave(two_node_sdd(), &[]);
    assert!(result.nodes.is_empty());
    assert!(result.links.is_empty());
    assert!(result.groups.is_empty());
    assert!(result.ordering.is_empty());
}

#[test]
fn test_out_of_range_edge_id_is_fatal() {
    let mut spec = Compiler::builder(two_node_sdd()).build().compile().unwrap();
    spec.routing_tree = Tree::leaf([99]);
    let rows = vec![flow("a", "b", 1.0)];
    assert!(matches!(
        Executor::new(&spec).execute(&rows),
        Err(ExecuteError::EdgeOutOfRange { id: 99, .. })
    ));
}

#[test]
fn test_executions_share_one_spec() {
    let spec = Compiler::builder(two_node_sdd()).build().compile().unwrap();

    let first = Executor::new(&spec)
        .execute(&[flow("a", "b", 1.0)])
        .unwrap();
    let second = Executor::new(&spec)
        .execute(&[flow("a", "b", 2.0), flow("a", "b", 3.0)])
        .unwrap();

    assert_eq!(first.links[0].link_width, 1.0);
    assert_eq!(second.links[0].link_width, 5.0);
}
