//! Conversion between the local coordinate systems of nested graphs.
//!
//! Every hierarchy level has its own origin: the top-left corner of its parent node's content
//! area (parent position plus padding), shifted by the level's own offset. Points stored on
//! elements of a level are relative to that origin.

use strata_graph::{Graph, GraphId, Point};

/// Origin of `graph` expressed in the coordinate system of the top-level graph.
pub fn graph_origin(g: &Graph, graph: GraphId) -> Point {
    let mut origin = Point::ZERO;
    let mut current = graph;
    loop {
        let data = g.graph(current);
        origin += data.offset;
        let Some(parent) = data.parent_node else {
            break;
        };
        origin += Point::new(data.padding.left, data.padding.top);
        let node = g.node(parent);
        origin += node.position;
        current = node.graph;
    }
    origin
}

/// Adds to `offset` what converts a point relative to `from` into one relative to `to`.
///
/// Nothing happens when both graphs are the same.
pub fn change_coord_system(g: &Graph, offset: &mut Point, from: GraphId, to: GraphId) {
    if from == to {
        return;
    }
    *offset += graph_origin(g, from);
    *offset -= graph_origin(g, to);
}

/// Offset that converts points relative to `from` into points relative to `to`.
pub fn offset_between(g: &Graph, from: GraphId, to: GraphId) -> Point {
    let mut offset = Point::ZERO;
    change_coord_system(g, &mut offset, from, to);
    offset
}
