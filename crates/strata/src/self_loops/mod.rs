//! Routing of edges that start and end at the same node.
//!
//! Runs once node positions are fixed. Per node: group the loops ([`holder`]), pick the way
//! around the node ([`director`]), place labels ([`labels`]), order the loops outwards
//! ([`slots`]) and compute the geometry ([`router`]).

pub mod director;
pub mod holder;
pub mod labels;
pub mod router;
pub mod slots;

pub use director::determine_loop_routes;
pub use holder::{LabelAlignment, LoopLabels, SelfHyperLoop, SelfLoopEdge, SelfLoopHolder, SelfLoopType};
pub use labels::{LabelManager, MIN_LABEL_WIDTH, place_labels};
pub use router::{RoutingDirection, SelfLoopRouter, SlotPositions};
pub use slots::assign_routing_slots;

use crate::error::Result;
use strata_graph::{Graph, GraphId, NodeId};
use tracing::debug;

/// Routes the self loops of every node in `graph`. Returns the number of nodes that had any.
pub fn route_self_loops(g: &mut Graph, graph: GraphId, manager: Option<&dyn LabelManager>) -> Result<usize> {
    let mut routed = 0;
    for node in g.nodes(graph).to_vec() {
        if route_node_self_loops(g, node, manager)?.is_some() {
            routed += 1;
        }
    }
    if routed > 0 {
        debug!(graph = %graph, nodes = routed, "routed self loops");
    }
    Ok(routed)
}

/// Routes the self loops of `node` and returns what was computed for them, or `None` if the node
/// has no self loops to route.
pub fn route_node_self_loops(
    g: &mut Graph,
    node: NodeId,
    manager: Option<&dyn LabelManager>,
) -> Result<Option<SelfLoopHolder>> {
    let Some(mut holder) = SelfLoopHolder::build(g, node)? else {
        return Ok(None);
    };
    determine_loop_routes(g, &mut holder)?;
    place_labels(g, &mut holder, manager);
    assign_routing_slots(g, &mut holder);

    let router = SelfLoopRouter::from_options(g.options(g.node(node).graph));
    router.route(g, &mut holder)?;
    Ok(Some(holder))
}
