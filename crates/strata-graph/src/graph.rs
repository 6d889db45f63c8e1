//! Compound graph container.
//!
//! A [`Graph`] owns every hierarchy level of one layout run. Levels, nodes, ports, edges and
//! labels live in flat arenas and refer to each other through typed ids, so nested graphs are
//! just further [`GraphId`]s whose `parent_node` points back into the node arena.
//!
//! Accessors index the arenas directly and panic on ids that this graph did not hand out.

pub mod alg;
mod entries;
mod ids;
mod options;

pub use entries::{
    EdgeData, EdgeLabelPlacement, GraphData, LabelData, NodeData, NodeKind, PortData,
};
pub use ids::{EdgeId, GraphId, LabelId, NodeId, PortId};
pub use options::{
    Direction, EdgeRouting, GraphProperties, LayoutOptions, PortConstraints, PortLabelPlacement,
    SelfLoopOrdering, Spacing,
};

use crate::geom::{Margin, Point, PortSide};
use rustc_hash::FxBuildHasher;

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

#[derive(Debug, Clone)]
pub struct Graph {
    graphs: Vec<GraphData>,
    nodes: Vec<NodeData>,
    ports: Vec<PortData>,
    edges: Vec<EdgeData>,
    labels: Vec<LabelData>,
    node_index: HashMap<String, NodeId>,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(LayoutOptions::default())
    }
}

impl Graph {
    /// Creates an empty graph whose top-level options are `options`.
    pub fn new(options: LayoutOptions) -> Self {
        Self {
            graphs: vec![GraphData::new(None, options)],
            nodes: Vec::new(),
            ports: Vec::new(),
            edges: Vec::new(),
            labels: Vec::new(),
            node_index: HashMap::default(),
        }
    }

    /// The top-level graph.
    pub fn root(&self) -> GraphId {
        GraphId(0)
    }

    // ---------------------------------------------------------------------------------------
    // Arena access

    pub fn graph(&self, id: GraphId) -> &GraphData {
        &self.graphs[id.0]
    }

    pub fn graph_mut(&mut self, id: GraphId) -> &mut GraphData {
        &mut self.graphs[id.0]
    }

    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.0]
    }

    pub fn port(&self, id: PortId) -> &PortData {
        &self.ports[id.0]
    }

    pub fn port_mut(&mut self, id: PortId) -> &mut PortData {
        &mut self.ports[id.0]
    }

    pub fn edge(&self, id: EdgeId) -> &EdgeData {
        &self.edges[id.0]
    }

    pub fn edge_mut(&mut self, id: EdgeId) -> &mut EdgeData {
        &mut self.edges[id.0]
    }

    pub fn label(&self, id: LabelId) -> &LabelData {
        &self.labels[id.0]
    }

    pub fn label_mut(&mut self, id: LabelId) -> &mut LabelData {
        &mut self.labels[id.0]
    }

    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn graph_ids(&self) -> impl Iterator<Item = GraphId> + '_ {
        (0..self.graphs.len()).map(GraphId)
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edges.len()).map(EdgeId)
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.node_index.get(name).copied()
    }

    // ---------------------------------------------------------------------------------------
    // Convenience lookups

    /// Nodes that are currently part of `graph`'s node list.
    pub fn nodes(&self, graph: GraphId) -> &[NodeId] {
        &self.graphs[graph.0].nodes
    }

    pub fn options(&self, graph: GraphId) -> &LayoutOptions {
        &self.graphs[graph.0].options
    }

    pub fn parent_node(&self, graph: GraphId) -> Option<NodeId> {
        self.graphs[graph.0].parent_node
    }

    /// The hierarchy level that contains `port`'s node.
    pub fn port_graph(&self, port: PortId) -> GraphId {
        self.nodes[self.ports[port.0].node.0].graph
    }

    pub fn port_node(&self, port: PortId) -> NodeId {
        self.ports[port.0].node
    }

    /// Spacing values in effect for `node`: its own override, else those of its graph.
    pub fn node_spacing(&self, node: NodeId) -> Spacing {
        let n = &self.nodes[node.0];
        n.spacing
            .unwrap_or_else(|| self.graphs[n.graph.0].options.spacing)
    }

    /// Anchor of `port` in the coordinate system of its node's graph.
    pub fn absolute_anchor(&self, port: PortId) -> Point {
        let p = &self.ports[port.0];
        self.nodes[p.node.0].position + p.position + p.anchor
    }

    /// Edges whose source and target port belong to the same node.
    pub fn self_loops(&self, node: NodeId) -> Vec<EdgeId> {
        let mut out = Vec::new();
        for &port in &self.nodes[node.0].ports {
            for &e in &self.ports[port.0].outgoing {
                let Some(target) = self.edges[e.0].target else {
                    continue;
                };
                if self.ports[target.0].node == node {
                    out.push(e);
                }
            }
        }
        out
    }

    // ---------------------------------------------------------------------------------------
    // Construction

    /// Adds a named node to `graph`'s node list.
    pub fn add_node(&mut self, graph: GraphId, name: impl Into<String>) -> NodeId {
        let id = self.create_node(graph, name);
        self.graphs[graph.0].nodes.push(id);
        id
    }

    /// Creates a node that belongs to `graph` but is not yet part of its node list.
    ///
    /// Use [`Graph::insert_nodes`] to splice it in once it is safe to grow the list. Names need
    /// not be unique; [`Graph::node_by_name`] resolves a name to the first node created with it.
    pub fn create_node(&mut self, graph: GraphId, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let name = name.into();
        let port_label_placement = self.graphs[graph.0].options.port_label_placement;
        self.nodes.push(NodeData {
            graph,
            name: name.clone(),
            kind: NodeKind::Normal,
            ports: Vec::new(),
            nested: None,
            origin: None,
            ext_port_side: PortSide::Undefined,
            port_constraints: PortConstraints::Free,
            port_label_placement,
            position: Point::ZERO,
            size: Point::ZERO,
            margin: Margin::default(),
            spacing: None,
        });
        self.node_index.entry(name).or_insert(id);
        id
    }

    /// Appends detached nodes to `graph`'s node list, skipping ones already listed.
    pub fn insert_nodes(&mut self, graph: GraphId, nodes: impl IntoIterator<Item = NodeId>) {
        for n in nodes {
            debug_assert_eq!(self.nodes[n.0].graph, graph);
            let list = &mut self.graphs[graph.0].nodes;
            if !list.contains(&n) {
                list.push(n);
            }
        }
    }

    /// Returns the nested graph of `node`, creating it (with a copy of the enclosing options)
    /// if the node does not have one yet.
    pub fn nest(&mut self, node: NodeId) -> GraphId {
        if let Some(nested) = self.nodes[node.0].nested {
            return nested;
        }
        let options = self.graphs[self.nodes[node.0].graph.0].options.clone();
        let id = GraphId(self.graphs.len());
        self.graphs.push(GraphData::new(Some(node), options));
        self.nodes[node.0].nested = Some(id);
        id
    }

    pub fn add_port(&mut self, node: NodeId, side: PortSide) -> PortId {
        let id = PortId(self.ports.len());
        self.ports.push(PortData {
            node,
            side,
            position: Point::ZERO,
            size: Point::ZERO,
            anchor: Point::ZERO,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            labels: Vec::new(),
            id: 0,
            port_dummy: None,
            inside_connections: false,
        });
        self.nodes[node.0].ports.push(id);
        id
    }

    pub fn add_edge(&mut self, source: PortId, target: PortId) -> EdgeId {
        let id = self.create_edge();
        self.set_source(id, Some(source));
        self.set_target(id, Some(target));

        let src_node = self.ports[source.0].node;
        let tgt_node = self.ports[target.0].node;
        if src_node == tgt_node {
            let g = self.nodes[src_node.0].graph;
            self.graphs[g.0].properties.insert(GraphProperties::SELF_LOOPS);
        }
        for port in [source, target] {
            if self.ports[port.0].degree() > 1 {
                let g = self.port_graph(port);
                self.graphs[g.0].properties.insert(GraphProperties::HYPEREDGES);
            }
        }
        id
    }

    /// Creates an edge without endpoints.
    pub fn create_edge(&mut self) -> EdgeId {
        let id = EdgeId(self.edges.len());
        self.edges.push(EdgeData::default());
        id
    }

    /// Moves the edge's source, keeping the ports' outgoing lists in sync.
    pub fn set_source(&mut self, edge: EdgeId, port: Option<PortId>) {
        if let Some(old) = self.edges[edge.0].source.take() {
            self.ports[old.0].outgoing.retain(|&e| e != edge);
        }
        if let Some(new) = port {
            self.ports[new.0].outgoing.push(edge);
        }
        self.edges[edge.0].source = port;
    }

    /// Moves the edge's target, keeping the ports' incoming lists in sync.
    pub fn set_target(&mut self, edge: EdgeId, port: Option<PortId>) {
        if let Some(old) = self.edges[edge.0].target.take() {
            self.ports[old.0].incoming.retain(|&e| e != edge);
        }
        if let Some(new) = port {
            self.ports[new.0].incoming.push(edge);
        }
        self.edges[edge.0].target = port;
    }

    /// Detaches the edge from both of its ports.
    pub fn detach_edge(&mut self, edge: EdgeId) {
        self.set_source(edge, None);
        self.set_target(edge, None);
    }

    /// Copies the layout-relevant attributes of `from` onto `to`. Routes and labels are not
    /// copied, and junction points are cleared.
    pub fn copy_edge_properties(&mut self, from: EdgeId, to: EdgeId) {
        let thickness = self.edges[from.0].thickness;
        let inside_self_loop = self.edges[from.0].inside_self_loop;
        let e = &mut self.edges[to.0];
        e.thickness = thickness;
        e.inside_self_loop = inside_self_loop;
        e.junction_points = None;
    }

    /// Creates a label that is not attached to anything.
    pub fn create_label(&mut self, text: impl Into<String>, size: Point) -> LabelId {
        let id = LabelId(self.labels.len());
        self.labels.push(LabelData {
            text: text.into(),
            size,
            ..Default::default()
        });
        id
    }

    pub fn add_edge_label(
        &mut self,
        edge: EdgeId,
        text: impl Into<String>,
        size: Point,
        placement: EdgeLabelPlacement,
    ) -> LabelId {
        let id = self.create_label(text, size);
        self.labels[id.0].placement = placement;
        self.edges[edge.0].labels.push(id);
        let g = self.edges[edge.0].source.map(|p| self.port_graph(p));
        if let Some(g) = g {
            let props = &mut self.graphs[g.0].properties;
            match placement {
                EdgeLabelPlacement::Center => props.insert(GraphProperties::CENTER_LABELS),
                EdgeLabelPlacement::Head | EdgeLabelPlacement::Tail => {
                    props.insert(GraphProperties::END_LABELS)
                }
            }
        }
        id
    }

    pub fn add_port_label(&mut self, port: PortId, text: impl Into<String>, size: Point) -> LabelId {
        let id = self.create_label(text, size);
        self.ports[port.0].labels.push(id);
        id
    }
}
