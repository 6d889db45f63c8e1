//! Reassembles cross-hierarchy edges from their laid out segments.

use super::registry::CrossHierarchyMap;
use crate::coordinate_system::offset_between;
use crate::error::{Error, Result};
use crate::hyperedge::TOLERANCE;
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use strata_graph::alg::is_descendant;
use strata_graph::{EdgeId, Graph, GraphId, Point};
use tracing::{debug, trace};

/// Gives every original edge in `registry` one continuous route and detaches all dummy edges.
///
/// Dummy nodes and the ports they created on compound nodes stay where they are.
pub fn postprocess(g: &mut Graph, registry: &CrossHierarchyMap) -> Result<()> {
    let root = g.root();
    let add_unnecessary = g.options(root).add_unnecessary_bendpoints;
    let mut dummy_edges: IndexSet<EdgeId, FxBuildHasher> = IndexSet::default();

    for orig in registry.originals() {
        let segments = registry.sorted(g, root, orig)?;
        let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
            continue;
        };
        let source_port = first.actual_source(g)?;
        let target_port = last.actual_target(g)?;

        let source_node = g.port_node(source_port);
        let reference = if is_descendant(g, g.port_node(target_port), source_node) {
            g.node(source_node)
                .nested
                .unwrap_or(g.node(source_node).graph)
        } else {
            g.node(source_node).graph
        };

        let has_junctions = segments.iter().any(|s| {
            g.edge(s.edge)
                .junction_points
                .as_ref()
                .is_some_and(|j| !j.is_empty())
        });

        let mut route: Vec<Point> = Vec::new();
        let mut junctions: Vec<Point> = Vec::new();
        let mut last_point: Option<Point> = None;

        for segment in &segments {
            let offset = offset_between(g, segment.graph, reference);
            let edge = g.edge(segment.edge);
            let (Some(from), Some(to)) = (edge.source, edge.target) else {
                return Err(Error::DetachedEdge { edge: segment.edge });
            };
            let bends: Vec<Point> = edge.bend_points.iter().map(|&p| p + offset).collect();
            let source_point = g.absolute_anchor(from) + offset;
            let target_point = g.absolute_anchor(to) + offset;

            if let Some(previous) = last_point {
                let next = bends.first().copied().unwrap_or(target_point);
                let x_differs = (previous.x - next.x).abs() > TOLERANCE;
                let y_differs = (previous.y - next.y).abs() > TOLERANCE;
                let needs_bend = if add_unnecessary {
                    x_differs || y_differs
                } else {
                    x_differs && y_differs
                };
                if needs_bend {
                    route.push(source_point);
                }
            }
            last_point = Some(bends.last().copied().unwrap_or(source_point));
            route.extend(bends);

            if let Some(points) = &edge.junction_points {
                junctions.extend(points.iter().map(|&p| p + offset));
            }

            if segment.actual_target(g)? == target_port {
                let target_graph = g.port_graph(target_port);
                let target_offset = if target_graph != segment.graph {
                    offset_between(g, target_graph, reference)
                } else {
                    offset
                };
                g.edge_mut(orig).target_offset = Some(target_offset);
            }

            copy_labels_back(g, segment.edge, orig, reference)?;
            dummy_edges.insert(segment.edge);
            trace!(original = %orig, segment = %segment.edge, "appended segment route");
        }

        let e = g.edge_mut(orig);
        e.bend_points = route;
        e.junction_points = has_junctions.then_some(junctions);
        g.set_source(orig, Some(source_port));
        g.set_target(orig, Some(target_port));
    }

    let removed = dummy_edges.len();
    for edge in dummy_edges {
        g.detach_edge(edge);
    }
    debug!(
        edges = registry.len(),
        dummy_edges = removed,
        "reassembled cross-hierarchy edges"
    );
    Ok(())
}

/// Moves the labels that came from `orig` off the dummy edge, converting their positions into
/// the coordinate system of `reference`.
fn copy_labels_back(g: &mut Graph, dummy: EdgeId, orig: EdgeId, reference: GraphId) -> Result<()> {
    let source = g
        .edge(dummy)
        .source
        .ok_or(Error::DetachedEdge { edge: dummy })?;
    let offset = offset_between(g, g.port_graph(source), reference);

    let labels = std::mem::take(&mut g.edge_mut(dummy).labels);
    let (moving, staying): (Vec<_>, Vec<_>) = labels
        .into_iter()
        .partition(|&l| g.label(l).original_edge == Some(orig));
    for &label in &moving {
        g.label_mut(label).position += offset;
    }
    g.edge_mut(dummy).labels = staying;
    g.edge_mut(orig).labels.extend(moving);
    Ok(())
}
