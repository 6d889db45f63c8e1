//! Splits cross-hierarchy edges into level-local segments.
//!
//! Levels are processed innermost first. Wherever an edge crosses the boundary of a compound node,
//! an external port dummy is placed inside the node's nested graph and a matching port on the
//! compound node itself, and the edge is replaced by one dummy edge per level. Afterwards every
//! level can be laid out on its own; [`super::postprocess`] stitches the pieces back together.

use super::registry::{CrossHierarchyEdge, CrossHierarchyMap, FlowDirection};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use strata_graph::alg::is_descendant;
use strata_graph::{
    EdgeId, EdgeLabelPlacement, Graph, GraphId, GraphProperties, NodeId, NodeKind, Point,
    PortConstraints, PortId, PortLabelPlacement, PortSide,
};
use tracing::{debug, trace};

/// Runs the preprocessing of `g` and returns the registry the postprocessor needs.
pub fn preprocess(g: &mut Graph) -> Result<CrossHierarchyMap> {
    Preprocessor::new(g).run()
}

/// Nodes created for a level while its node list is still being walked.
///
/// They only become part of the level once [`PendingNodes::commit`] splices them in.
#[derive(Debug)]
#[must_use = "pending nodes are lost unless committed"]
pub struct PendingNodes {
    graph: GraphId,
    nodes: Vec<NodeId>,
}

impl PendingNodes {
    pub fn new(graph: GraphId) -> Self {
        Self {
            graph,
            nodes: Vec::new(),
        }
    }

    pub fn push(&mut self, node: NodeId) {
        if !self.nodes.contains(&node) {
            self.nodes.push(node);
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn commit(self, g: &mut Graph) {
        g.insert_nodes(self.graph, self.nodes);
    }
}

/// A boundary crossing created while processing one level.
#[derive(Debug)]
struct ExternalPort {
    orig_edges: Vec<EdgeId>,
    new_edge: EdgeId,
    dummy_node: NodeId,
    /// The compound node port the dummy stands for, as seen from the enclosing level.
    outside_port: PortId,
    direction: FlowDirection,
    /// Whether the enclosing level still has to continue the edges.
    exported: bool,
}

/// Single-use preprocessing session over one graph.
pub struct Preprocessor<'g> {
    g: &'g mut Graph,
    registry: CrossHierarchyMap,
    /// Compound node port to the external port dummy representing it inside the node.
    dummy_nodes: IndexMap<PortId, NodeId, FxBuildHasher>,
}

impl<'g> Preprocessor<'g> {
    pub fn new(g: &'g mut Graph) -> Self {
        Self {
            g,
            registry: CrossHierarchyMap::new(),
            dummy_nodes: IndexMap::default(),
        }
    }

    pub fn run(mut self) -> Result<CrossHierarchyMap> {
        let root = self.g.root();
        let leftover = self.transform_level(root, None)?;
        debug_assert!(leftover.is_empty());

        self.move_labels_and_remove_original_edges()?;
        self.set_port_sides_from_dummies();

        debug!(
            edges = self.registry.len(),
            port_dummies = self.dummy_nodes.len(),
            "split cross-hierarchy edges"
        );
        Ok(self.registry)
    }

    /// Processes `graph` and everything below it, returning the external ports the enclosing
    /// level has to continue.
    fn transform_level(&mut self, graph: GraphId, parent: Option<NodeId>) -> Result<Vec<ExternalPort>> {
        let mut contained = Vec::new();
        for node in self.g.nodes(graph).to_vec() {
            let Some(nested) = self.g.node(node).nested else {
                continue;
            };
            contained.extend(self.transform_level(nested, Some(node))?);
            self.process_inside_self_loops(nested, node)?;
            if self
                .g
                .graph(nested)
                .properties
                .contains(GraphProperties::EXTERNAL_PORTS)
            {
                self.ensure_port_dummies(nested, node);
            }
        }

        let mut exported = Vec::new();
        self.process_inner_segments(graph, parent, &contained, &mut exported)?;
        if let Some(parent) = parent {
            self.process_outer_segments(graph, parent, &mut exported)?;
        }
        trace!(
            graph = %graph,
            contained = contained.len(),
            exported = exported.len(),
            "processed hierarchy level"
        );
        Ok(exported)
    }

    /// Gives every port of `node` a dummy inside `nested` and reserves room for its labels.
    fn ensure_port_dummies(&mut self, nested: GraphId, node: NodeId) {
        let constraints = self.g.node(node).port_constraints;
        let inside_labels = self.g.node(node).port_label_placement == PortLabelPlacement::Inside;
        let fixed_labels = self.g.node(node).port_label_placement == PortLabelPlacement::Fixed;
        let direction = self.g.options(nested).direction;

        for port in self.g.node(node).ports.clone() {
            let dummy = match self.dummy_nodes.get(&port) {
                Some(&dummy) => dummy,
                None => {
                    let p = self.g.port(port);
                    let (side, flow, size) = (p.side, -p.net_flow(), p.size);
                    let dummy = create_external_port_dummy(
                        self.g,
                        nested,
                        ExternalPortShape {
                            constraints,
                            side,
                            net_flow: flow,
                            port_size: size,
                            direction,
                        },
                    );
                    self.g.node_mut(dummy).origin = Some(port);
                    self.dummy_nodes.insert(port, dummy);
                    self.g.insert_nodes(nested, [dummy]);
                    dummy
                }
            };

            let Some(&dummy_port) = self.g.node(dummy).ports.first() else {
                continue;
            };
            let side = self.g.port(port).side;
            let port_size = self.g.port(port).size;
            for label in self.g.port(port).labels.clone() {
                let (position, size) = {
                    let l = self.g.label(label);
                    (l.position, l.size)
                };
                let mut reserved = size;
                if !inside_labels {
                    let inside_part = if fixed_labels {
                        inside_part(position, size, port_size, side)
                    } else {
                        0.0
                    };
                    if constraints == PortConstraints::Free
                        || matches!(side, PortSide::East | PortSide::West)
                    {
                        reserved.x = inside_part;
                    } else {
                        reserved.y = inside_part;
                    }
                }
                let text = self.g.label(label).text.clone();
                let copy = self.g.create_label(text, reserved);
                self.g.port_mut(dummy_port).labels.push(copy);
            }
        }
    }

    /// Edges routed inside their own compound node become a dummy edge between two port dummies.
    fn process_inside_self_loops(&mut self, nested: GraphId, node: NodeId) -> Result<()> {
        for port in self.g.node(node).ports.clone() {
            for edge in self.g.port(port).outgoing.clone() {
                let e = self.g.edge(edge);
                if !e.inside_self_loop {
                    continue;
                }
                let target = e.target.ok_or(Error::DetachedEdge { edge })?;
                if self.g.port_node(target) != node {
                    continue;
                }

                let source_dummy = self.port_dummy_for_self_loop(nested, port, -1);
                let target_dummy = self.port_dummy_for_self_loop(nested, target, 1);
                let (Some(&from), Some(&to)) = (
                    self.g.node(source_dummy).ports.first(),
                    self.g.node(target_dummy).ports.first(),
                ) else {
                    continue;
                };

                let dummy_edge = self.g.create_edge();
                self.g.copy_edge_properties(edge, dummy_edge);
                self.g.set_source(dummy_edge, Some(from));
                self.g.set_target(dummy_edge, Some(to));
                self.registry.insert(
                    edge,
                    CrossHierarchyEdge::new(dummy_edge, nested, FlowDirection::Output),
                );
                self.g
                    .graph_mut(nested)
                    .properties
                    .insert(GraphProperties::EXTERNAL_PORTS);
            }
        }
        Ok(())
    }

    fn port_dummy_for_self_loop(&mut self, nested: GraphId, port: PortId, net_flow: isize) -> NodeId {
        if let Some(&dummy) = self.dummy_nodes.get(&port) {
            return dummy;
        }
        let p = self.g.port(port);
        let shape = ExternalPortShape {
            constraints: PortConstraints::Free,
            side: p.side,
            net_flow,
            port_size: p.size,
            direction: self.g.options(nested).direction,
        };
        let dummy = create_external_port_dummy(self.g, nested, shape);
        self.g.node_mut(dummy).origin = Some(port);
        self.dummy_nodes.insert(port, dummy);
        self.g.insert_nodes(nested, [dummy]);
        dummy
    }

    /// Continues the edges of external ports exported by the children of `graph`.
    fn process_inner_segments(
        &mut self,
        graph: GraphId,
        parent: Option<NodeId>,
        contained: &[ExternalPort],
        exported: &mut Vec<ExternalPort>,
    ) -> Result<()> {
        let mut created: Vec<ExternalPort> = Vec::new();

        for (index, ext) in contained.iter().enumerate() {
            let mut current: Option<usize> = None;
            for &orig in &ext.orig_edges {
                let edge = self.g.edge(orig);
                match ext.direction {
                    FlowDirection::Output => {
                        let target = edge.target.ok_or(Error::DetachedEdge { edge: orig })?;
                        let target_node = self.g.port_node(target);
                        if self.g.node(target_node).graph == graph {
                            self.connect_child(graph, orig, ext.outside_port, target);
                        } else if parent.is_none_or(|p| is_descendant(self.g, target_node, p)) {
                            self.connect_siblings(graph, orig, index, contained)?;
                        } else {
                            let Some(parent) = parent else { continue };
                            let used = self.introduce_segment(
                                graph,
                                parent,
                                orig,
                                ext.outside_port,
                                FlowDirection::Output,
                                current,
                                &mut created,
                            )?;
                            if created[used].exported {
                                current = Some(used);
                            }
                        }
                    }
                    FlowDirection::Input => {
                        let source = edge.source.ok_or(Error::DetachedEdge { edge: orig })?;
                        let source_node = self.g.port_node(source);
                        if self.g.node(source_node).graph == graph {
                            self.connect_child(graph, orig, source, ext.outside_port);
                        } else if parent.is_none_or(|p| is_descendant(self.g, source_node, p)) {
                            // Joined from the output side of the same edge.
                        } else {
                            let Some(parent) = parent else { continue };
                            let used = self.introduce_segment(
                                graph,
                                parent,
                                orig,
                                ext.outside_port,
                                FlowDirection::Input,
                                current,
                                &mut created,
                            )?;
                            if created[used].exported {
                                current = Some(used);
                            }
                        }
                    }
                }
            }
        }

        self.commit_level(graph, created, exported);
        Ok(())
    }

    /// Continues the edges of `graph`'s direct children that leave `parent`.
    fn process_outer_segments(
        &mut self,
        graph: GraphId,
        parent: NodeId,
        exported: &mut Vec<ExternalPort>,
    ) -> Result<()> {
        let mut created: Vec<ExternalPort> = Vec::new();

        for child in self.g.nodes(graph).to_vec() {
            for port in self.g.node(child).ports.clone() {
                let mut current: Option<usize> = None;
                for out in self.g.port(port).outgoing.clone() {
                    let target = self
                        .g
                        .edge(out)
                        .target
                        .ok_or(Error::DetachedEdge { edge: out })?;
                    if is_descendant(self.g, self.g.port_node(target), parent) {
                        continue;
                    }
                    let used = self.introduce_segment(
                        graph,
                        parent,
                        out,
                        port,
                        FlowDirection::Output,
                        current,
                        &mut created,
                    )?;
                    if created[used].exported {
                        current = Some(used);
                    }
                }

                let mut current: Option<usize> = None;
                for inc in self.g.port(port).incoming.clone() {
                    let source = self
                        .g
                        .edge(inc)
                        .source
                        .ok_or(Error::DetachedEdge { edge: inc })?;
                    if is_descendant(self.g, self.g.port_node(source), parent) {
                        continue;
                    }
                    let used = self.introduce_segment(
                        graph,
                        parent,
                        inc,
                        port,
                        FlowDirection::Input,
                        current,
                        &mut created,
                    )?;
                    if created[used].exported {
                        current = Some(used);
                    }
                }
            }
        }

        self.commit_level(graph, created, exported);
        Ok(())
    }

    fn commit_level(&mut self, graph: GraphId, created: Vec<ExternalPort>, exported: &mut Vec<ExternalPort>) {
        let mut pending = PendingNodes::new(graph);
        for ext in &created {
            pending.push(ext.dummy_node);
        }
        pending.commit(self.g);
        exported.extend(created.into_iter().filter(|ext| ext.exported));
    }

    /// The edge reaches a direct child of `graph`: one dummy edge finishes this level.
    ///
    /// This is the level where the edge turns from climbing to descending, so the segment is
    /// registered as the last `Output` segment.
    fn connect_child(&mut self, graph: GraphId, orig: EdgeId, source: PortId, target: PortId) {
        let dummy_edge = self.g.create_edge();
        self.g.copy_edge_properties(orig, dummy_edge);
        self.g.set_source(dummy_edge, Some(source));
        self.g.set_target(dummy_edge, Some(target));
        self.registry.insert(
            orig,
            CrossHierarchyEdge::new(dummy_edge, graph, FlowDirection::Output),
        );
    }

    /// The edge runs between two children of `graph` that both exported a port for it.
    fn connect_siblings(
        &mut self,
        graph: GraphId,
        orig: EdgeId,
        index: usize,
        contained: &[ExternalPort],
    ) -> Result<()> {
        let source = &contained[index];
        let target = contained
            .iter()
            .enumerate()
            .find(|(i, ext)| {
                *i != index
                    && ext.direction == FlowDirection::Input
                    && ext.orig_edges.contains(&orig)
            })
            .map(|(_, ext)| ext)
            .ok_or(Error::MissingExternalPort { edge: orig })?;

        let dummy_edge = self.g.create_edge();
        self.g.copy_edge_properties(orig, dummy_edge);
        self.g.set_source(dummy_edge, Some(source.outside_port));
        self.g.set_target(dummy_edge, Some(target.outside_port));
        self.registry.insert(
            orig,
            CrossHierarchyEdge::new(dummy_edge, graph, FlowDirection::Output),
        );
        Ok(())
    }

    /// Routes `orig` across the boundary of `parent`, creating or reusing an external port.
    ///
    /// `opposite` is the port inside `graph` the dummy edge connects to. Returns the index of the
    /// external port used in `created`.
    #[allow(clippy::too_many_arguments)]
    fn introduce_segment(
        &mut self,
        graph: GraphId,
        parent: NodeId,
        orig: EdgeId,
        opposite: PortId,
        direction: FlowDirection,
        default: Option<usize>,
        created: &mut Vec<ExternalPort>,
    ) -> Result<usize> {
        let merge = self.g.options(graph).merge_hierarchy_edges;
        let edge = self.g.edge(orig);
        let parent_end = match direction {
            FlowDirection::Input => edge.source.filter(|&p| self.g.port_node(p) == parent),
            FlowDirection::Output => edge.target.filter(|&p| self.g.port_node(p) == parent),
        };

        let used = match default {
            Some(index) if merge && parent_end.is_none() => {
                let thickness = self.g.edge(orig).thickness;
                let ext = &mut created[index];
                ext.orig_edges.push(orig);
                let shared = self.g.edge_mut(ext.new_edge);
                shared.thickness = shared.thickness.max(thickness);
                index
            }
            _ => {
                let side = match parent_end {
                    Some(port) => self.g.port(port).side,
                    None if self.g.node(parent).port_constraints.is_side_fixed() => {
                        let layout = self.g.options(graph).direction;
                        match direction {
                            FlowDirection::Input => layout.input_side(),
                            FlowDirection::Output => layout.output_side(),
                        }
                    }
                    None => PortSide::Undefined,
                };
                let (dummy_node, outside_port) =
                    self.boundary_dummy(graph, parent, orig, direction, side)?;
                let Some(&dummy_port) = self.g.node(dummy_node).ports.first() else {
                    return Err(Error::MissingExternalPort { edge: orig });
                };

                let new_edge = self.g.create_edge();
                self.g.copy_edge_properties(orig, new_edge);
                let (from, to) = match direction {
                    FlowDirection::Input => (dummy_port, opposite),
                    FlowDirection::Output => (opposite, dummy_port),
                };
                self.g.set_source(new_edge, Some(from));
                self.g.set_target(new_edge, Some(to));

                created.push(ExternalPort {
                    orig_edges: vec![orig],
                    new_edge,
                    dummy_node,
                    outside_port,
                    direction,
                    exported: parent_end.is_none(),
                });
                created.len() - 1
            }
        };

        self.registry.insert(
            orig,
            CrossHierarchyEdge::new(created[used].new_edge, graph, direction),
        );
        Ok(used)
    }

    /// Finds or creates the external port dummy inside `graph` where `orig` crosses the border
    /// of `parent`. Returns the dummy and the port of `parent` it represents.
    fn boundary_dummy(
        &mut self,
        graph: GraphId,
        parent: NodeId,
        orig: EdgeId,
        direction: FlowDirection,
        side: PortSide,
    ) -> Result<(NodeId, PortId)> {
        let edge = self.g.edge(orig);
        let outside = match direction {
            FlowDirection::Input => edge.source,
            FlowDirection::Output => edge.target,
        }
        .ok_or(Error::DetachedEdge { edge: orig })?;
        let net_flow = match direction {
            FlowDirection::Input => -1,
            FlowDirection::Output => 1,
        };
        let constraints = self.g.node(parent).port_constraints;
        let layout = self.g.options(graph).direction;

        let (dummy, port) = if self.g.port_node(outside) == parent {
            let dummy = match self.dummy_nodes.get(&outside) {
                Some(&dummy) => dummy,
                None => {
                    let p = self.g.port(outside);
                    let (position, size) = (p.position, p.size);
                    let dummy = create_external_port_dummy(
                        self.g,
                        graph,
                        ExternalPortShape {
                            constraints,
                            side,
                            net_flow,
                            port_size: size,
                            direction: layout,
                        },
                    );
                    self.g.node_mut(dummy).position = position;
                    self.dummy_nodes.insert(outside, dummy);
                    dummy
                }
            };
            (dummy, outside)
        } else {
            let thickness = edge.thickness;
            let dummy = create_external_port_dummy(
                self.g,
                graph,
                ExternalPortShape {
                    constraints,
                    side,
                    net_flow,
                    port_size: Point::new(thickness, thickness),
                    direction: layout,
                },
            );
            let parent_layout = self.g.options(self.g.node(parent).graph).direction;
            let port_side = match direction {
                FlowDirection::Input => parent_layout.input_side(),
                FlowDirection::Output => parent_layout.output_side(),
            };
            let port = self.g.add_port(parent, port_side);
            self.g.port_mut(port).size = Point::new(thickness, thickness);
            self.dummy_nodes.insert(port, dummy);
            (dummy, port)
        };

        self.g.node_mut(dummy).origin = Some(port);
        self.g
            .graph_mut(graph)
            .properties
            .insert(GraphProperties::EXTERNAL_PORTS);
        Ok((dummy, port))
    }

    /// Moves the labels of every split edge onto one of its segments and takes the original
    /// edges out of the graph.
    fn move_labels_and_remove_original_edges(&mut self) -> Result<()> {
        let root = self.g.root();
        let originals: Vec<EdgeId> = self.registry.originals().collect();
        for orig in originals {
            let labels = std::mem::take(&mut self.g.edge_mut(orig).labels);
            if !labels.is_empty() {
                let segments = self.registry.sorted(self.g, root, orig)?;
                for label in labels {
                    let index = match self.g.label(label).placement {
                        EdgeLabelPlacement::Head => segments.len().saturating_sub(1),
                        EdgeLabelPlacement::Tail => 0,
                        EdgeLabelPlacement::Center => super::registry::shallowest_segment(&segments),
                    };
                    let Some(segment) = segments.get(index) else {
                        self.g.edge_mut(orig).labels.push(label);
                        continue;
                    };
                    self.g.edge_mut(segment.edge).labels.push(label);
                    self.g.label_mut(label).original_edge = Some(orig);

                    let source = self
                        .g
                        .edge(segment.edge)
                        .source
                        .ok_or(Error::DetachedEdge { edge: segment.edge })?;
                    let level = self.g.port_graph(source);
                    let props = &mut self.g.graph_mut(level).properties;
                    props.insert(GraphProperties::END_LABELS);
                    props.insert(GraphProperties::CENTER_LABELS);
                }
            }
            self.g.detach_edge(orig);
        }
        Ok(())
    }

    fn set_port_sides_from_dummies(&mut self) {
        for (&port, &dummy) in &self.dummy_nodes {
            self.g.node_mut(dummy).origin = Some(port);
            let side = self.g.node(dummy).ext_port_side;
            let p = self.g.port_mut(port);
            p.port_dummy = Some(dummy);
            p.inside_connections = true;
            p.side = side;

            let owner = self.g.port_node(port);
            self.g.node_mut(owner).port_constraints = PortConstraints::FixedSide;
            let level = self.g.node(owner).graph;
            self.g
                .graph_mut(level)
                .properties
                .insert(GraphProperties::NON_FREE_PORTS);
        }
    }
}

/// What an external port dummy has to look like.
#[derive(Debug, Clone, Copy)]
struct ExternalPortShape {
    constraints: PortConstraints,
    side: PortSide,
    /// Positive when more edges leave the level through the port than enter it.
    net_flow: isize,
    port_size: Point,
    direction: strata_graph::Direction,
}

/// Creates a detached external port dummy in `graph` with a single port facing the inside.
///
/// Unless the side is fixed, it is inferred from the layout direction and the net flow.
fn create_external_port_dummy(g: &mut Graph, graph: GraphId, shape: ExternalPortShape) -> NodeId {
    let inferred = || {
        if shape.net_flow > 0 {
            shape.direction.output_side()
        } else {
            shape.direction.input_side()
        }
    };
    let side = if shape.constraints.is_side_fixed() && shape.side.is_defined() {
        shape.side
    } else {
        inferred()
    };

    let name = format!("$ext{}", g.node_count());
    let node = g.create_node(graph, name);
    let port = g.add_port(node, side.opposed());

    let size = shape.port_size;
    let mut anchor = Point::new(size.x / 2.0, size.y / 2.0);
    let mut node_size = Point::ZERO;
    match side {
        PortSide::West | PortSide::East => {
            anchor.x = 0.0;
            node_size.y = size.y;
        }
        PortSide::North => {
            anchor.y = size.y;
            node_size.x = size.x;
        }
        PortSide::South | PortSide::Undefined => {
            anchor.y = 0.0;
            node_size.x = size.x;
        }
    }

    let n = g.node_mut(node);
    n.kind = NodeKind::ExternalPort;
    n.port_constraints = PortConstraints::FixedPos;
    n.ext_port_side = side;
    n.size = node_size;
    g.port_mut(port).position = anchor;
    node
}

/// The part of a fixed port label that reaches into the node past the port.
fn inside_part(label_position: Point, label_size: Point, port_size: Point, side: PortSide) -> f64 {
    let part = match side {
        PortSide::West => label_position.x + label_size.x - port_size.x,
        PortSide::East => -label_position.x,
        PortSide::North => label_position.y + label_size.y - port_size.y,
        PortSide::South => -label_position.y,
        PortSide::Undefined => 0.0,
    };
    part.max(0.0)
}
