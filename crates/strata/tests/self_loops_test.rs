use strata::Error;
use strata::self_loops::{
    LabelAlignment, LabelManager, SelfLoopHolder, SelfLoopRouter, SelfLoopType, assign_routing_slots,
    determine_loop_routes, place_labels, route_node_self_loops, route_self_loops, slots::labels_overlap,
};
use strata_graph::{
    EdgeLabelPlacement, Graph, LabelData, LayoutOptions, NodeId, Point, PortId, PortSide,
    SelfLoopOrdering,
};

/// A 60x40 node at the origin with ports at the given sides and positions (relative to the node).
fn node_with_ports(g: &mut Graph, ports: &[(PortSide, f64, f64)]) -> (NodeId, Vec<PortId>) {
    let root = g.root();
    let n = g.add_node(root, format!("n{}", g.node_count()));
    g.node_mut(n).size = Point::new(60.0, 40.0);
    let ids = ports
        .iter()
        .map(|&(side, x, y)| {
            let p = g.add_port(n, side);
            g.port_mut(p).position = Point::new(x, y);
            p
        })
        .collect();
    (n, ids)
}

fn label(g: &mut Graph, e: strata_graph::EdgeId, w: f64, h: f64) {
    g.add_edge_label(e, "l", Point::new(w, h), EdgeLabelPlacement::Center);
}

fn routed_holder(g: &mut Graph, node: NodeId) -> SelfLoopHolder {
    let mut holder = SelfLoopHolder::build(g, node).unwrap().unwrap();
    determine_loop_routes(g, &mut holder).unwrap();
    place_labels(g, &mut holder, None);
    assign_routing_slots(g, &mut holder);
    holder
}

#[test]
fn classification_follows_occupied_sides() {
    use PortSide::*;
    assert_eq!(SelfLoopType::classify(&[North]), Some(SelfLoopType::OneSide));
    assert_eq!(SelfLoopType::classify(&[North, East]), Some(SelfLoopType::TwoSidesCorner));
    assert_eq!(SelfLoopType::classify(&[North, West]), Some(SelfLoopType::TwoSidesCorner));
    assert_eq!(SelfLoopType::classify(&[East, West]), Some(SelfLoopType::TwoSidesOpposing));
    assert_eq!(SelfLoopType::classify(&[North, East, South]), Some(SelfLoopType::ThreeSides));
    assert_eq!(
        SelfLoopType::classify(&[North, East, South, West]),
        Some(SelfLoopType::FourSides)
    );
    assert_eq!(SelfLoopType::classify(&[]), None);
}

#[test]
fn nodes_without_self_loops_have_no_holder() {
    let mut g = Graph::default();
    let (n, ports) = node_with_ports(&mut g, &[(PortSide::East, 60.0, 20.0)]);
    let (m, others) = node_with_ports(&mut g, &[(PortSide::West, 0.0, 20.0)]);
    g.add_edge(ports[0], others[0]);

    assert!(SelfLoopHolder::build(&g, n).unwrap().is_none());
    assert!(route_node_self_loops(&mut g, m, None).unwrap().is_none());
}

#[test]
fn loops_sharing_ports_form_one_hyper_loop() {
    let mut g = Graph::default();
    let (n, p) = node_with_ports(
        &mut g,
        &[
            (PortSide::North, 10.0, 0.0),
            (PortSide::North, 20.0, 0.0),
            (PortSide::North, 30.0, 0.0),
            (PortSide::South, 10.0, 40.0),
            (PortSide::South, 20.0, 40.0),
        ],
    );
    g.add_edge(p[0], p[1]);
    g.add_edge(p[2], p[1]);
    g.add_edge(p[3], p[4]);

    let holder = SelfLoopHolder::build(&g, n).unwrap().unwrap();
    assert_eq!(holder.loops.len(), 2);
    assert_eq!(holder.loops[0].ports, vec![p[0], p[1], p[2]]);
    assert_eq!(holder.loops[0].edges.len(), 2);
    assert_eq!(holder.loops[1].ports, vec![p[3], p[4]]);
    assert!(holder.loops.iter().all(|lp| lp.loop_type == SelfLoopType::OneSide));
}

#[test]
fn ports_without_side_are_rejected() {
    let mut g = Graph::default();
    let (n, p) = node_with_ports(
        &mut g,
        &[(PortSide::North, 10.0, 0.0), (PortSide::Undefined, 0.0, 0.0)],
    );
    g.add_edge(p[0], p[1]);

    match SelfLoopHolder::build(&g, n) {
        Err(Error::UndefinedPortSide { node, port }) => {
            assert_eq!(node, n);
            assert_eq!(port, p[1]);
        }
        other => panic!("expected an undefined port side, got {other:?}"),
    }
}

#[test]
fn four_sided_loop_leaves_the_busiest_gap_free() {
    let mut g = Graph::default();
    let (n, p) = node_with_ports(
        &mut g,
        &[
            (PortSide::North, 10.0, 0.0),
            (PortSide::North, 40.0, 0.0),
            (PortSide::East, 60.0, 20.0),
            (PortSide::South, 30.0, 40.0),
            (PortSide::West, 0.0, 20.0),
        ],
    );
    let (p0, x1, p1, p2, p3) = (p[0], p[1], p[2], p[3], p[4]);
    let (_, other) = node_with_ports(&mut g, &[(PortSide::South, 20.0, 40.0)]);
    g.add_edge(other[0], x1);
    g.add_edge(p0, p1);
    g.add_edge(p1, p2);
    g.add_edge(p2, p3);
    g.add_edge(p3, p0);

    let mut holder = SelfLoopHolder::build(&g, n).unwrap().unwrap();
    assert_eq!(holder.loops.len(), 1);
    assert_eq!(holder.loops[0].loop_type, SelfLoopType::FourSides);

    determine_loop_routes(&mut g, &mut holder).unwrap();
    let lp = &holder.loops[0];
    assert_eq!(lp.leftmost, p1);
    assert_eq!(lp.rightmost, p0);
    assert_eq!(
        lp.occupied_sides,
        vec![PortSide::East, PortSide::South, PortSide::West, PortSide::North]
    );
    assert_eq!(lp.ports, vec![p0, p1, p2, p3]);
}

#[test]
fn one_sided_loop_spans_its_outermost_ports() {
    let mut g = Graph::default();
    let (n, p) = node_with_ports(
        &mut g,
        &[
            (PortSide::North, 10.0, 0.0),
            (PortSide::North, 30.0, 0.0),
            (PortSide::North, 50.0, 0.0),
        ],
    );
    g.add_edge(p[1], p[0]);
    g.add_edge(p[2], p[1]);

    let holder = routed_holder(&mut g, n);
    let lp = &holder.loops[0];
    assert_eq!((lp.leftmost, lp.rightmost), (p[0], p[2]));
    assert_eq!(lp.occupied_sides, vec![PortSide::North]);
}

#[test]
fn corner_loop_runs_clockwise_across_the_corner() {
    let mut g = Graph::default();
    let (n, p) = node_with_ports(
        &mut g,
        &[(PortSide::North, 20.0, 0.0), (PortSide::West, 0.0, 10.0)],
    );
    g.add_edge(p[0], p[1]);

    let holder = routed_holder(&mut g, n);
    let lp = &holder.loops[0];
    assert_eq!(lp.loop_type, SelfLoopType::TwoSidesCorner);
    assert_eq!((lp.leftmost, lp.rightmost), (p[1], p[0]));
    assert_eq!(lp.occupied_sides, vec![PortSide::West, PortSide::North]);
}

#[test]
fn three_sided_loop_avoids_the_missing_side() {
    let mut g = Graph::default();
    let (n, p) = node_with_ports(
        &mut g,
        &[
            (PortSide::West, 0.0, 20.0),
            (PortSide::North, 30.0, 0.0),
            (PortSide::East, 60.0, 20.0),
        ],
    );
    g.add_edge(p[0], p[1]);
    g.add_edge(p[1], p[2]);

    let holder = routed_holder(&mut g, n);
    let lp = &holder.loops[0];
    assert_eq!(lp.loop_type, SelfLoopType::ThreeSides);
    assert_eq!((lp.leftmost, lp.rightmost), (p[0], p[2]));
    assert_eq!(
        lp.occupied_sides,
        vec![PortSide::West, PortSide::North, PortSide::East]
    );
}

#[test]
fn opposing_loop_goes_around_connected_ports() {
    let mut g = Graph::default();
    let (n, p) = node_with_ports(
        &mut g,
        &[
            (PortSide::North, 30.0, 0.0),
            (PortSide::East, 60.0, 20.0),
            (PortSide::South, 30.0, 40.0),
            (PortSide::West, 0.0, 20.0),
        ],
    );
    let (_, other) = node_with_ports(&mut g, &[(PortSide::West, 0.0, 20.0)]);
    g.add_edge(p[1], other[0]);
    g.add_edge(p[0], p[2]);

    let holder = routed_holder(&mut g, n);
    let lp = &holder.loops[0];
    assert_eq!(lp.loop_type, SelfLoopType::TwoSidesOpposing);
    assert_eq!((lp.leftmost, lp.rightmost), (p[2], p[0]));
    assert_eq!(
        lp.occupied_sides,
        vec![PortSide::South, PortSide::West, PortSide::North]
    );
}

#[test]
fn ports_of_other_self_loops_count_as_connected() {
    let mut g = Graph::default();
    let (n, p) = node_with_ports(
        &mut g,
        &[
            (PortSide::North, 30.0, 0.0),
            (PortSide::East, 60.0, 10.0),
            (PortSide::East, 60.0, 30.0),
            (PortSide::South, 30.0, 40.0),
            (PortSide::West, 0.0, 20.0),
        ],
    );
    let (_, other) = node_with_ports(&mut g, &[(PortSide::East, 60.0, 20.0)]);
    g.add_edge(other[0], p[4]);
    g.add_edge(p[1], p[2]);
    g.add_edge(p[0], p[3]);

    let holder = routed_holder(&mut g, n);
    assert_eq!(holder.loops.len(), 2);
    let lp = holder
        .loops
        .iter()
        .find(|lp| lp.ports.contains(&p[0]))
        .unwrap();
    assert_eq!(lp.loop_type, SelfLoopType::TwoSidesOpposing);

    // Passing both east ports costs more than passing the single west port.
    assert_eq!((lp.leftmost, lp.rightmost), (p[3], p[0]));
    assert_eq!(
        lp.occupied_sides,
        vec![PortSide::South, PortSide::West, PortSide::North]
    );
}

#[test]
fn nested_loops_get_increasing_slots_and_bend_points() {
    let mut g = Graph::default();
    let (n, p) = node_with_ports(
        &mut g,
        &[
            (PortSide::North, 10.0, 0.0),
            (PortSide::North, 20.0, 0.0),
            (PortSide::North, 30.0, 0.0),
            (PortSide::North, 40.0, 0.0),
        ],
    );
    g.node_mut(n).position = Point::new(100.0, 100.0);
    let outer = g.add_edge(p[0], p[3]);
    let inner = g.add_edge(p[1], p[2]);

    let holder = route_node_self_loops(&mut g, n, None).unwrap().unwrap();
    let slot_of = |port: PortId| {
        holder
            .loops
            .iter()
            .find(|lp| lp.ports.contains(&port))
            .map(|lp| lp.routing_slot(PortSide::North))
    };
    assert_eq!(slot_of(p[0]), Some(1));
    assert_eq!(slot_of(p[1]), Some(0));
    assert_eq!(holder.routing_slot_count(PortSide::North), 2);

    assert_eq!(
        g.edge(outer).bend_points,
        vec![Point::new(110.0, 80.0), Point::new(140.0, 80.0)]
    );
    assert_eq!(
        g.edge(inner).bend_points,
        vec![Point::new(120.0, 90.0), Point::new(130.0, 90.0)]
    );
    assert_eq!(g.node(n).margin.top, 20.0);
    assert_eq!(g.node(n).margin.bottom, 0.0);
}

#[test]
fn centered_label_sits_above_its_loop() {
    let mut g = Graph::default();
    let (n, p) = node_with_ports(
        &mut g,
        &[(PortSide::North, 10.0, 0.0), (PortSide::North, 50.0, 0.0)],
    );
    g.node_mut(n).position = Point::new(100.0, 100.0);
    let e = g.add_edge(p[0], p[1]);
    label(&mut g, e, 20.0, 8.0);

    let holder = route_node_self_loops(&mut g, n, None).unwrap().unwrap();
    let labels = holder.loops[0].labels.as_ref().unwrap();
    assert_eq!(labels.side, PortSide::North);
    assert_eq!(labels.alignment, LabelAlignment::Center);
    assert_eq!(labels.position, Point::new(20.0, -20.0));

    let l = g.edge(e).labels[0];
    assert_eq!(g.label(l).position, Point::new(120.0, 80.0));
    assert_eq!(g.node(n).margin.top, 20.0);
    assert_eq!(
        g.edge(e).bend_points,
        vec![Point::new(110.0, 90.0), Point::new(150.0, 90.0)]
    );
}

#[test]
fn overlapping_labels_end_up_in_different_slots() {
    let mut g = Graph::default();
    let (n, p) = node_with_ports(
        &mut g,
        &[
            (PortSide::North, 5.0, 0.0),
            (PortSide::North, 15.0, 0.0),
            (PortSide::North, 45.0, 0.0),
            (PortSide::North, 55.0, 0.0),
        ],
    );
    let e1 = g.add_edge(p[0], p[1]);
    let e2 = g.add_edge(p[2], p[3]);
    label(&mut g, e1, 30.0, 8.0);
    label(&mut g, e2, 30.0, 8.0);

    let holder = route_node_self_loops(&mut g, n, None).unwrap().unwrap();
    let (a, b) = (&holder.loops[0], &holder.loops[1]);
    assert!(labels_overlap(a, b));
    assert_ne!(a.routing_slot(PortSide::North), b.routing_slot(PortSide::North));

    let rect = |e| {
        let l = g.label(g.edge(e).labels[0]);
        (l.position, l.position + l.size)
    };
    let ((a0, a1), (b0, b1)) = (rect(e1), rect(e2));
    let disjoint = a1.y <= b0.y || b1.y <= a0.y || a1.x <= b0.x || b1.x <= a0.x;
    assert!(disjoint, "labels overlap: {a0:?}-{a1:?} and {b0:?}-{b1:?}");
}

#[test]
fn loops_over_distinct_ports_share_a_slot() {
    let mut g = Graph::default();
    let (n, p) = node_with_ports(
        &mut g,
        &[
            (PortSide::South, 5.0, 40.0),
            (PortSide::South, 15.0, 40.0),
            (PortSide::South, 45.0, 40.0),
            (PortSide::South, 55.0, 40.0),
        ],
    );
    g.add_edge(p[0], p[1]);
    g.add_edge(p[2], p[3]);

    let holder = route_node_self_loops(&mut g, n, None).unwrap().unwrap();
    assert!(holder
        .loops
        .iter()
        .all(|lp| lp.routing_slot(PortSide::South) == 0));
    assert_eq!(g.node(n).margin.bottom, 10.0);
}

#[test]
fn sequenced_ordering_aligns_paired_labels_apart() {
    let mut g = Graph::new(LayoutOptions {
        self_loop_ordering: SelfLoopOrdering::Sequenced,
        ..Default::default()
    });
    let (n, p) = node_with_ports(
        &mut g,
        &[
            (PortSide::North, 5.0, 0.0),
            (PortSide::North, 15.0, 0.0),
            (PortSide::North, 45.0, 0.0),
            (PortSide::North, 55.0, 0.0),
        ],
    );
    let e1 = g.add_edge(p[0], p[1]);
    let e2 = g.add_edge(p[2], p[3]);
    label(&mut g, e1, 12.0, 6.0);
    label(&mut g, e2, 12.0, 6.0);

    let mut holder = SelfLoopHolder::build(&g, n).unwrap().unwrap();
    determine_loop_routes(&mut g, &mut holder).unwrap();
    place_labels(&mut g, &mut holder, None);

    let first = holder.loops[0].labels.as_ref().unwrap();
    let second = holder.loops[1].labels.as_ref().unwrap();
    assert_eq!(first.alignment, LabelAlignment::Right);
    assert_eq!(first.reference_port, Some(p[1]));
    assert_eq!(first.position.x, 3.0);
    assert_eq!(second.alignment, LabelAlignment::Left);
    assert_eq!(second.reference_port, Some(p[2]));
    assert_eq!(second.position.x, 45.0);
    assert!(!labels_overlap(&holder.loops[0], &holder.loops[1]));
}

#[test]
fn east_side_labels_align_to_the_topmost_port() {
    let mut g = Graph::default();
    let (n, p) = node_with_ports(
        &mut g,
        &[(PortSide::East, 60.0, 30.0), (PortSide::East, 60.0, 10.0)],
    );
    let e = g.add_edge(p[0], p[1]);
    label(&mut g, e, 16.0, 6.0);

    let holder = route_node_self_loops(&mut g, n, None).unwrap().unwrap();
    let labels = holder.loops[0].labels.as_ref().unwrap();
    assert_eq!(labels.side, PortSide::East);
    assert_eq!(labels.alignment, LabelAlignment::Top);
    assert_eq!(labels.reference_port, Some(p[1]));
    // Slot 0 on the east side is at x = 70; the labels go past it.
    assert_eq!(labels.position, Point::new(72.0, 10.0));
    assert_eq!(g.node(n).margin.right, 28.0);
}

struct Wrap;

impl LabelManager for Wrap {
    fn manage_label(&self, label: &LabelData, target_width: f64) -> Point {
        if label.size.x <= target_width {
            return label.size;
        }
        let lines = (label.size.x / target_width).ceil();
        Point::new(target_width, label.size.y * lines)
    }
}

#[test]
fn label_manager_shrinks_wide_labels() {
    let mut g = Graph::default();
    let (n, p) = node_with_ports(
        &mut g,
        &[(PortSide::South, 10.0, 40.0), (PortSide::South, 50.0, 40.0)],
    );
    let e = g.add_edge(p[0], p[1]);
    label(&mut g, e, 150.0, 10.0);

    let holder = route_node_self_loops(&mut g, n, Some(&Wrap)).unwrap().unwrap();
    let labels = holder.loops[0].labels.as_ref().unwrap();
    assert_eq!(labels.size, Point::new(60.0, 30.0));
    assert_eq!(g.label(g.edge(e).labels[0]).size, Point::new(60.0, 30.0));
}

#[test]
fn polyline_router_cuts_corners() {
    let mut g = Graph::default();
    let (n, p) = node_with_ports(
        &mut g,
        &[(PortSide::North, 20.0, 0.0), (PortSide::West, 0.0, 10.0)],
    );
    let e = g.add_edge(p[0], p[1]);

    let mut holder = routed_holder(&mut g, n);
    SelfLoopRouter::Orthogonal.route(&mut g, &mut holder).unwrap();
    assert_eq!(
        g.edge(e).bend_points,
        vec![Point::new(20.0, -10.0), Point::new(-10.0, -10.0), Point::new(-10.0, 10.0)]
    );

    let mut holder = routed_holder(&mut g, n);
    g.node_mut(n).margin = Default::default();
    SelfLoopRouter::Polyline {
        corner_cut: Some(5.0),
    }
    .route(&mut g, &mut holder)
    .unwrap();
    assert_eq!(
        g.edge(e).bend_points,
        vec![
            Point::new(20.0, -5.0),
            Point::new(15.0, -10.0),
            Point::new(-5.0, -10.0),
            Point::new(-10.0, -5.0),
            Point::new(-10.0, 5.0),
            Point::new(-5.0, 10.0),
        ]
    );
}

#[test]
fn polyline_without_cut_matches_orthogonal() {
    let mut g = Graph::default();
    let (n, p) = node_with_ports(
        &mut g,
        &[(PortSide::East, 60.0, 10.0), (PortSide::South, 30.0, 40.0)],
    );
    let e = g.add_edge(p[0], p[1]);

    let mut holder = routed_holder(&mut g, n);
    SelfLoopRouter::Orthogonal.route(&mut g, &mut holder).unwrap();
    let orthogonal = g.edge(e).bend_points.clone();

    g.node_mut(n).margin = Default::default();
    let mut holder = routed_holder(&mut g, n);
    SelfLoopRouter::Polyline { corner_cut: None }
        .route(&mut g, &mut holder)
        .unwrap();
    assert_eq!(g.edge(e).bend_points, orthogonal);
}

#[test]
fn spline_router_emits_bezier_control_points() {
    let mut g = Graph::new(LayoutOptions {
        edge_routing: strata_graph::EdgeRouting::Splines,
        ..Default::default()
    });
    let (n, p) = node_with_ports(
        &mut g,
        &[(PortSide::North, 20.0, 0.0), (PortSide::West, 0.0, 10.0)],
    );
    let e = g.add_edge(p[0], p[1]);

    route_node_self_loops(&mut g, n, None).unwrap();
    // Source, two control points, target: three Bezier segments.
    let bends = &g.edge(e).bend_points;
    assert_eq!(bends.len(), 8);
    assert!(bends.iter().all(|b| b.x <= 20.0 && b.y <= 10.0));
    assert!(g.node(n).margin.left > 0.0);
    assert!(g.node(n).margin.top > 0.0);
}

#[test]
fn route_self_loops_visits_every_node_of_a_level() {
    let mut g = Graph::default();
    let root = g.root();
    let (a, pa) = node_with_ports(
        &mut g,
        &[(PortSide::North, 10.0, 0.0), (PortSide::North, 30.0, 0.0)],
    );
    let (b, pb) = node_with_ports(
        &mut g,
        &[(PortSide::South, 10.0, 40.0), (PortSide::South, 30.0, 40.0)],
    );
    let (_, pc) = node_with_ports(&mut g, &[(PortSide::West, 0.0, 10.0)]);
    g.add_edge(pa[0], pa[1]);
    g.add_edge(pb[0], pb[1]);
    g.add_edge(pa[1], pc[0]);

    assert_eq!(route_self_loops(&mut g, root, None).unwrap(), 2);
    assert!(g.node(a).margin.top > 0.0);
    assert!(g.node(b).margin.bottom > 0.0);
}
