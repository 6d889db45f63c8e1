//! Storage records for the elements of a [`Graph`](super::Graph).
//!
//! Every record is plain data with public fields; structural links (port lists, edge endpoints)
//! should be changed through the `Graph` methods so that both sides stay consistent.

use super::ids::{EdgeId, GraphId, LabelId, NodeId, PortId};
use super::options::{GraphProperties, LayoutOptions, PortConstraints, PortLabelPlacement, Spacing};
use crate::geom::{Margin, Point, PortSide};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeKind {
    #[default]
    Normal,
    /// Stands for a port of the enclosing compound node, seen from inside.
    ExternalPort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeLabelPlacement {
    Head,
    Tail,
    #[default]
    Center,
}

#[derive(Debug, Clone)]
pub struct NodeData {
    pub graph: GraphId,
    pub name: String,
    pub kind: NodeKind,
    pub ports: Vec<PortId>,
    pub nested: Option<GraphId>,
    /// For external port dummies: the compound node port this dummy represents.
    pub origin: Option<PortId>,
    pub ext_port_side: PortSide,
    pub port_constraints: PortConstraints,
    pub port_label_placement: PortLabelPlacement,
    pub position: Point,
    pub size: Point,
    pub margin: Margin,
    /// Individual spacing override; the graph's spacing applies when unset.
    pub spacing: Option<Spacing>,
}

#[derive(Debug, Clone)]
pub struct PortData {
    pub node: NodeId,
    pub side: PortSide,
    /// Top-left corner, relative to the node.
    pub position: Point,
    pub size: Point,
    /// Attachment point, relative to the port position.
    pub anchor: Point,
    pub incoming: Vec<EdgeId>,
    pub outgoing: Vec<EdgeId>,
    pub labels: Vec<LabelId>,
    /// Scratch id, reassigned by phases that need a port order.
    pub id: usize,
    pub port_dummy: Option<NodeId>,
    pub inside_connections: bool,
}

impl PortData {
    pub fn degree(&self) -> usize {
        self.incoming.len() + self.outgoing.len()
    }

    /// Incoming minus outgoing edge count.
    pub fn net_flow(&self) -> isize {
        self.incoming.len() as isize - self.outgoing.len() as isize
    }
}

#[derive(Debug, Clone)]
pub struct EdgeData {
    pub source: Option<PortId>,
    pub target: Option<PortId>,
    pub bend_points: Vec<Point>,
    pub labels: Vec<LabelId>,
    pub junction_points: Option<Vec<Point>>,
    /// Offset of the true target's coordinate system, set when hierarchy edges are reassembled.
    pub target_offset: Option<Point>,
    pub thickness: f64,
    pub inside_self_loop: bool,
}

impl Default for EdgeData {
    fn default() -> Self {
        Self {
            source: None,
            target: None,
            bend_points: Vec::new(),
            labels: Vec::new(),
            junction_points: None,
            target_offset: None,
            thickness: 1.0,
            inside_self_loop: false,
        }
    }
}

impl EdgeData {
    pub fn is_detached(&self) -> bool {
        self.source.is_none() && self.target.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct LabelData {
    pub text: String,
    pub position: Point,
    pub size: Point,
    pub placement: EdgeLabelPlacement,
    pub original_edge: Option<EdgeId>,
}

#[derive(Debug, Clone)]
pub struct GraphData {
    pub parent_node: Option<NodeId>,
    pub nodes: Vec<NodeId>,
    pub properties: GraphProperties,
    pub options: LayoutOptions,
    pub padding: Margin,
    pub offset: Point,
}

impl GraphData {
    pub(in crate::graph) fn new(parent_node: Option<NodeId>, options: LayoutOptions) -> Self {
        Self {
            parent_node,
            nodes: Vec::new(),
            properties: GraphProperties::empty(),
            options,
            padding: Margin::default(),
            offset: Point::ZERO,
        }
    }
}
