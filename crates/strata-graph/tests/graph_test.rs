use strata_graph::{
    EdgeLabelPlacement, Graph, GraphProperties, LayoutOptions, NodeKind, Point, PortSide, alg,
};

fn two_level_graph() -> (Graph, strata_graph::NodeId, strata_graph::NodeId) {
    let mut g = Graph::default();
    let root = g.root();
    let c = g.add_node(root, "c");
    let inner = g.nest(c);
    let b = g.add_node(inner, "b");
    (g, c, b)
}

#[test]
fn set_source_and_target_keep_port_lists_in_sync() {
    let mut g = Graph::default();
    let root = g.root();
    let a = g.add_node(root, "a");
    let b = g.add_node(root, "b");
    let pa = g.add_port(a, PortSide::East);
    let pb = g.add_port(b, PortSide::West);
    let pb2 = g.add_port(b, PortSide::North);

    let e = g.add_edge(pa, pb);
    assert_eq!(g.port(pa).outgoing, vec![e]);
    assert_eq!(g.port(pb).incoming, vec![e]);

    g.set_target(e, Some(pb2));
    assert!(g.port(pb).incoming.is_empty());
    assert_eq!(g.port(pb2).incoming, vec![e]);

    g.detach_edge(e);
    assert!(g.edge(e).is_detached());
    assert!(g.port(pa).outgoing.is_empty());
    assert!(g.port(pb2).incoming.is_empty());
}

#[test]
fn created_nodes_are_not_listed_until_inserted() {
    let mut g = Graph::default();
    let root = g.root();
    let a = g.add_node(root, "a");
    let d = g.create_node(root, "d");
    assert_eq!(g.nodes(root), &[a]);

    g.insert_nodes(root, [d, d, a]);
    assert_eq!(g.nodes(root), &[a, d]);
    assert_eq!(g.node(d).kind, NodeKind::Normal);
    assert_eq!(g.node_by_name("d"), Some(d));
}

#[test]
fn nested_graphs_inherit_options_and_are_reused() {
    let mut g = Graph::new(LayoutOptions {
        merge_hierarchy_edges: false,
        ..Default::default()
    });
    let root = g.root();
    let c = g.add_node(root, "c");
    let inner = g.nest(c);
    assert_eq!(g.nest(c), inner);
    assert_eq!(g.parent_node(inner), Some(c));
    assert!(!g.options(inner).merge_hierarchy_edges);
}

#[test]
fn is_descendant_walks_parent_links() {
    let (mut g, c, b) = two_level_graph();
    let inner = g.node(b).graph;
    let d = g.add_node(inner, "d");
    let deeper = g.nest(d);
    let e = g.add_node(deeper, "e");

    assert!(alg::is_descendant(&g, b, c));
    assert!(alg::is_descendant(&g, e, c));
    assert!(alg::is_descendant(&g, e, d));
    assert!(!alg::is_descendant(&g, c, c));
    assert!(!alg::is_descendant(&g, b, d));
}

#[test]
fn depth_below_counts_levels_and_rejects_foreign_graphs() {
    let (mut g, c, b) = two_level_graph();
    let root = g.root();
    let inner = g.node(b).graph;
    let other = g.add_node(root, "other");
    let other_inner = g.nest(other);

    assert_eq!(alg::depth_below(&g, root, root), Some(0));
    assert_eq!(alg::depth_below(&g, inner, root), Some(1));
    assert_eq!(alg::depth_below(&g, root, inner), None);
    assert_eq!(alg::depth_below(&g, other_inner, g.node(c).nested.unwrap()), None);
}

#[test]
fn levels_bottom_up_lists_children_first() {
    let (mut g, _c, b) = two_level_graph();
    let root = g.root();
    let inner = g.node(b).graph;
    let deeper = g.nest(b);

    assert_eq!(alg::levels_bottom_up(&g, root), vec![deeper, inner, root]);
}

#[test]
fn absolute_anchor_adds_node_port_and_anchor_offsets() {
    let mut g = Graph::default();
    let root = g.root();
    let a = g.add_node(root, "a");
    g.node_mut(a).position = Point::new(10.0, 20.0);
    let p = g.add_port(a, PortSide::East);
    g.port_mut(p).position = Point::new(30.0, 5.0);
    g.port_mut(p).anchor = Point::new(1.0, 2.0);

    assert_eq!(g.absolute_anchor(p), Point::new(41.0, 27.0));
}

#[test]
fn adding_edges_records_graph_properties() {
    let mut g = Graph::default();
    let root = g.root();
    let a = g.add_node(root, "a");
    let p1 = g.add_port(a, PortSide::North);
    let p2 = g.add_port(a, PortSide::North);
    let e = g.add_edge(p1, p2);
    g.add_edge(p1, p2);
    g.add_edge_label(e, "loop", Point::new(10.0, 4.0), EdgeLabelPlacement::Tail);

    let props = g.graph(root).properties;
    assert!(props.contains(GraphProperties::SELF_LOOPS));
    assert!(props.contains(GraphProperties::HYPEREDGES));
    assert!(props.contains(GraphProperties::END_LABELS));
    assert!(!props.contains(GraphProperties::EXTERNAL_PORTS));
    assert_eq!(g.self_loops(a).len(), 2);
}

#[test]
fn copy_edge_properties_clears_junction_points() {
    let mut g = Graph::default();
    let root = g.root();
    let a = g.add_node(root, "a");
    let p = g.add_port(a, PortSide::East);
    let q = g.add_port(a, PortSide::West);
    let e = g.add_edge(p, q);
    g.edge_mut(e).thickness = 3.5;
    g.edge_mut(e).junction_points = Some(vec![Point::ZERO]);

    let copy = g.create_edge();
    g.edge_mut(copy).junction_points = Some(vec![Point::new(1.0, 1.0)]);
    g.copy_edge_properties(e, copy);
    assert_eq!(g.edge(copy).thickness, 3.5);
    assert!(g.edge(copy).junction_points.is_none());
    assert!(g.edge(copy).bend_points.is_empty());
}

#[test]
fn node_spacing_prefers_individual_override() {
    let mut g = Graph::default();
    let root = g.root();
    let a = g.add_node(root, "a");
    assert_eq!(g.node_spacing(a), g.options(root).spacing);

    let mut custom = g.options(root).spacing;
    custom.edge_edge = 42.0;
    g.node_mut(a).spacing = Some(custom);
    assert_eq!(g.node_spacing(a).edge_edge, 42.0);
}

#[test]
fn duplicate_names_resolve_to_the_first_node() {
    let mut g = Graph::default();
    let root = g.root();
    let first = g.add_node(root, "n");
    let c = g.add_node(root, "c");
    let inner = g.nest(c);
    let second = g.add_node(inner, "n");

    assert_ne!(first, second);
    assert_eq!(g.node_by_name("n"), Some(first));
    assert_eq!(g.node(second).name, "n");
    assert_eq!(g.nodes(inner), &[second]);
}
