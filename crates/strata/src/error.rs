use strata_graph::{EdgeId, GraphId, NodeId, PortId, PortSide};

/// Internal consistency violations detected while laying out a graph.
///
/// Each of these means an earlier phase broke an invariant the current phase relies on; the run
/// is aborted rather than producing a partial layout.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("edge {edge} connects two sibling external ports but no opposite external port was found")]
    MissingExternalPort { edge: EdgeId },

    #[error("graph {graph} is not nested below graph {top}")]
    NotAnAncestor { graph: GraphId, top: GraphId },

    #[error("self loop on node {node} uses port {port} whose side is undefined")]
    UndefinedPortSide { node: NodeId, port: PortId },

    #[error("self loop on node {node} occupies an unexpected side combination: {sides:?}")]
    UnexpectedLoopSides { node: NodeId, sides: Vec<PortSide> },

    #[error("edge {edge} is detached but was expected to be connected")]
    DetachedEdge { edge: EdgeId },
}

pub type Result<T> = std::result::Result<T, Error>;
