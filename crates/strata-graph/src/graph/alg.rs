//! Hierarchy queries over a [`Graph`].

use super::{Graph, GraphId, NodeId};

/// Whether `child` lies (transitively) inside the nested graph of `ancestor`.
///
/// A node is not its own descendant.
pub fn is_descendant(g: &Graph, child: NodeId, ancestor: NodeId) -> bool {
    let mut next = g.parent_node(g.node(child).graph);
    while let Some(current) = next {
        if current == ancestor {
            return true;
        }
        next = g.parent_node(g.node(current).graph);
    }
    false
}

/// Number of nesting levels between `graph` and `top`, or `None` if `top` is not an ancestor
/// of (or equal to) `graph`.
pub fn depth_below(g: &Graph, graph: GraphId, top: GraphId) -> Option<usize> {
    let mut current = graph;
    let mut depth = 0;
    while current != top {
        let parent = g.parent_node(current)?;
        current = g.node(parent).graph;
        depth += 1;
    }
    Some(depth)
}

/// All hierarchy levels below (and including) `root`, innermost first.
///
/// Every level appears after all levels nested inside its nodes, which is the order a bottom-up
/// layout has to process them in.
pub fn levels_bottom_up(g: &Graph, root: GraphId) -> Vec<GraphId> {
    fn visit(g: &Graph, graph: GraphId, out: &mut Vec<GraphId>) {
        for &n in g.nodes(graph) {
            if let Some(nested) = g.node(n).nested {
                visit(g, nested, out);
            }
        }
        out.push(graph);
    }

    let mut out = Vec::new();
    visit(g, root, &mut out);
    out
}
