//! Compound graph model for the `strata` layout core.
//!
//! The model is deliberately small: nodes with ports, edges between ports, labels, and nested
//! graphs hanging off nodes. Everything the layout phases need to remember about an element is a
//! typed field on its record rather than an entry in a property map.

pub mod geom;
pub mod graph;

pub use geom::{Margin, Point, PortSide};
pub use graph::{
    Direction, EdgeData, EdgeId, EdgeLabelPlacement, EdgeRouting, Graph, GraphData, GraphId,
    GraphProperties, LabelData, LabelId, LayoutOptions, NodeData, NodeId, NodeKind, PortConstraints,
    PortData, PortId, PortLabelPlacement, SelfLoopOrdering, Spacing, alg,
};
