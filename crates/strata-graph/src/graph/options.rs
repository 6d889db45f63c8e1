//! Layout configuration options.
//!
//! Options are attached per hierarchy level; nested graphs inherit a copy of their parent's
//! options when they are created. Everything here derives `serde` so callers can load a
//! configuration from JSON.

use crate::geom::PortSide;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    #[default]
    Right,
    Left,
    Down,
    Up,
}

impl Direction {
    /// Side on which edges enter a node for this layout direction.
    pub fn input_side(self) -> PortSide {
        match self {
            Direction::Right => PortSide::West,
            Direction::Left => PortSide::East,
            Direction::Down => PortSide::North,
            Direction::Up => PortSide::South,
        }
    }

    /// Side on which edges leave a node for this layout direction.
    pub fn output_side(self) -> PortSide {
        self.input_side().opposed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortConstraints {
    #[default]
    Free,
    FixedSide,
    FixedOrder,
    FixedPos,
}

impl PortConstraints {
    pub fn is_side_fixed(self) -> bool {
        self >= PortConstraints::FixedSide
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PortLabelPlacement {
    #[default]
    Outside,
    Inside,
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelfLoopOrdering {
    #[default]
    Stacked,
    Sequenced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeRouting {
    #[default]
    Orthogonal,
    Polyline,
    Splines,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spacing {
    pub edge_edge: f64,
    pub edge_label: f64,
    pub node_self_loop: f64,
    pub label_label: f64,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            edge_edge: 10.0,
            edge_label: 2.0,
            node_self_loop: 10.0,
            label_label: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub direction: Direction,
    /// Route cross-hierarchy edges that leave a level through the same port via one shared
    /// external port.
    pub merge_hierarchy_edges: bool,
    /// Insert a bend point between reassembled segments whenever they differ on either axis.
    pub add_unnecessary_bendpoints: bool,
    /// Default port label placement for nodes created in this graph.
    pub port_label_placement: PortLabelPlacement,
    pub self_loop_ordering: SelfLoopOrdering,
    pub edge_routing: EdgeRouting,
    /// Corner cut distance for polyline self loops. `None` keeps the orthogonal shape.
    pub polyline_corner_cut: Option<f64>,
    pub spacing: Spacing,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            direction: Direction::Right,
            merge_hierarchy_edges: true,
            add_unnecessary_bendpoints: false,
            port_label_placement: PortLabelPlacement::Outside,
            self_loop_ordering: SelfLoopOrdering::Stacked,
            edge_routing: EdgeRouting::Orthogonal,
            polyline_corner_cut: None,
            spacing: Spacing::default(),
        }
    }
}

/// Capabilities a hierarchy level has been found to need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct GraphProperties(u8);

impl GraphProperties {
    pub const EXTERNAL_PORTS: GraphProperties = GraphProperties(1);
    pub const NON_FREE_PORTS: GraphProperties = GraphProperties(1 << 1);
    pub const END_LABELS: GraphProperties = GraphProperties(1 << 2);
    pub const CENTER_LABELS: GraphProperties = GraphProperties(1 << 3);
    pub const SELF_LOOPS: GraphProperties = GraphProperties(1 << 4);
    pub const HYPEREDGES: GraphProperties = GraphProperties(1 << 5);

    pub const fn empty() -> Self {
        GraphProperties(0)
    }

    pub fn contains(self, other: GraphProperties) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: GraphProperties) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: GraphProperties) {
        self.0 &= !other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}
