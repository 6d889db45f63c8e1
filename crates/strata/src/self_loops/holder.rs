//! Self loops of one node, grouped into hyper loops.

use crate::error::{Error, Result};
use strata_graph::{EdgeId, Graph, LabelId, NodeId, Point, PortId, PortSide};

/// How the ports of a hyper loop are spread over the sides of its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelfLoopType {
    OneSide,
    /// Two adjacent sides.
    TwoSidesCorner,
    /// Two opposite sides.
    TwoSidesOpposing,
    ThreeSides,
    FourSides,
}

impl SelfLoopType {
    /// Classifies a set of distinct, defined sides.
    pub fn classify(sides: &[PortSide]) -> Option<Self> {
        match sides {
            [_] => Some(SelfLoopType::OneSide),
            [a, b] if a.opposed() == *b => Some(SelfLoopType::TwoSidesOpposing),
            [_, _] => Some(SelfLoopType::TwoSidesCorner),
            [_, _, _] => Some(SelfLoopType::ThreeSides),
            [_, _, _, _] => Some(SelfLoopType::FourSides),
            _ => None,
        }
    }
}

/// How a label group sits relative to its reference point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelAlignment {
    /// Below the reference port's anchor, on an east or west side.
    Top,
    /// Starts at the reference port's anchor.
    Left,
    #[default]
    Center,
    /// Ends at the reference port's anchor.
    Right,
}

/// The labels of all edges of a hyper loop, placed as one block.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopLabels {
    pub labels: Vec<LabelId>,
    pub size: Point,
    /// Top-left corner relative to the node.
    pub position: Point,
    pub side: PortSide,
    pub alignment: LabelAlignment,
    pub reference_port: Option<PortId>,
}

impl LoopLabels {
    /// Stacks `labels` vertically, `spacing` apart.
    pub fn stacked(g: &Graph, labels: Vec<LabelId>, spacing: f64) -> Self {
        let mut size = Point::ZERO;
        for (i, &label) in labels.iter().enumerate() {
            let s = g.label(label).size;
            size.x = size.x.max(s.x);
            size.y += s.y;
            if i > 0 {
                size.y += spacing;
            }
        }
        Self {
            labels,
            size,
            position: Point::ZERO,
            side: PortSide::Undefined,
            alignment: LabelAlignment::Center,
            reference_port: None,
        }
    }

    /// Recomputes the group size from the current label sizes.
    pub fn update_size(&mut self, g: &Graph, spacing: f64) {
        let labels = std::mem::take(&mut self.labels);
        self.size = Self::stacked(g, labels.clone(), spacing).size;
        self.labels = labels;
    }

    /// Positions the individual labels inside the group, translated by `origin`.
    pub fn apply_positions(&self, g: &mut Graph, origin: Point, spacing: f64) {
        let mut y = self.position.y;
        for &label in &self.labels {
            let size = g.label(label).size;
            let x = match self.alignment {
                LabelAlignment::Center => self.position.x + (self.size.x - size.x) / 2.0,
                LabelAlignment::Left | LabelAlignment::Top => self.position.x,
                LabelAlignment::Right => self.position.x + self.size.x - size.x,
            };
            g.label_mut(label).position = origin + Point::new(x, y);
            y += size.y + spacing;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfLoopEdge {
    pub edge: EdgeId,
    pub source: PortId,
    pub target: PortId,
}

/// Self loops that share ports and are therefore routed together.
#[derive(Debug, Clone)]
pub struct SelfHyperLoop {
    /// Participating ports. Sorted by port id once routes are determined.
    pub ports: Vec<PortId>,
    pub edges: Vec<SelfLoopEdge>,
    pub loop_type: SelfLoopType,
    /// Where the loop starts when walking clockwise around the node.
    pub leftmost: PortId,
    /// Where the loop ends when walking clockwise around the node.
    pub rightmost: PortId,
    /// Sides the loop runs along, clockwise from the leftmost port's side.
    pub occupied_sides: Vec<PortSide>,
    pub labels: Option<LoopLabels>,
    routing_slots: [usize; 4],
}

impl SelfHyperLoop {
    /// Distinct sides of the loop's ports in canonical order.
    pub fn sides(&self, g: &Graph) -> Vec<PortSide> {
        let mut sides: Vec<PortSide> = self.ports.iter().map(|&p| g.port(p).side).collect();
        sides.sort();
        sides.dedup();
        sides
    }

    pub fn ports_on<'a>(&'a self, g: &'a Graph, side: PortSide) -> impl Iterator<Item = PortId> + 'a {
        self.ports
            .iter()
            .copied()
            .filter(move |&p| g.port(p).side == side)
    }

    pub fn occupies(&self, side: PortSide) -> bool {
        self.occupied_sides.contains(&side)
    }

    pub fn routing_slot(&self, side: PortSide) -> usize {
        side.ordinal().map(|i| self.routing_slots[i]).unwrap_or(0)
    }

    pub fn set_routing_slot(&mut self, side: PortSide, slot: usize) {
        if let Some(i) = side.ordinal() {
            self.routing_slots[i] = slot;
        }
    }
}

/// Everything known about the self loops of one node.
#[derive(Debug, Clone)]
pub struct SelfLoopHolder {
    pub node: NodeId,
    pub loops: Vec<SelfHyperLoop>,
    routing_slot_count: [usize; 4],
}

impl SelfLoopHolder {
    /// Collects the self loops of `node` that are routed around it. Returns `None` if there are
    /// none.
    ///
    /// Loops are grouped by connected components over shared ports, in the order of their first
    /// port on the node.
    pub fn build(g: &Graph, node: NodeId) -> Result<Option<Self>> {
        let routed_inside = g.node(node).nested.is_some();
        let edges: Vec<SelfLoopEdge> = g
            .self_loops(node)
            .into_iter()
            .filter(|&e| !(routed_inside && g.edge(e).inside_self_loop))
            .filter_map(|e| {
                let data = g.edge(e);
                Some(SelfLoopEdge {
                    edge: e,
                    source: data.source?,
                    target: data.target?,
                })
            })
            .collect();
        if edges.is_empty() {
            return Ok(None);
        }

        let ports = &g.node(node).ports;
        let index_of = |p: PortId| ports.iter().position(|&q| q == p).unwrap_or(0);
        let mut components = UnionFind::new(ports.len());
        for e in &edges {
            components.union(index_of(e.source), index_of(e.target));
        }

        let mut loops: Vec<(usize, SelfHyperLoop)> = Vec::new();
        let spacing = g.node_spacing(node).label_label;
        for (i, &port) in ports.iter().enumerate() {
            let root = components.find(i);
            let members: Vec<SelfLoopEdge> = edges
                .iter()
                .copied()
                .filter(|e| index_of(e.source) == i || index_of(e.target) == i)
                .collect();
            if members.is_empty() {
                continue;
            }
            if !g.port(port).side.is_defined() {
                return Err(Error::UndefinedPortSide { node, port });
            }

            match loops.iter_mut().find(|(r, _)| *r == root) {
                Some((_, lp)) => {
                    lp.ports.push(port);
                    for e in members {
                        if !lp.edges.contains(&e) {
                            lp.edges.push(e);
                        }
                    }
                }
                None => loops.push((
                    root,
                    SelfHyperLoop {
                        ports: vec![port],
                        edges: members,
                        loop_type: SelfLoopType::OneSide,
                        leftmost: port,
                        rightmost: port,
                        occupied_sides: Vec::new(),
                        labels: None,
                        routing_slots: [0; 4],
                    },
                )),
            }
        }

        let mut loops: Vec<SelfHyperLoop> = loops.into_iter().map(|(_, lp)| lp).collect();
        for lp in &mut loops {
            let sides = lp.sides(g);
            lp.loop_type = SelfLoopType::classify(&sides)
                .ok_or_else(|| Error::UnexpectedLoopSides { node, sides })?;
            let labels: Vec<LabelId> = lp
                .edges
                .iter()
                .flat_map(|e| g.edge(e.edge).labels.iter().copied())
                .collect();
            if !labels.is_empty() {
                lp.labels = Some(LoopLabels::stacked(g, labels, spacing));
            }
        }

        Ok(Some(Self {
            node,
            loops,
            routing_slot_count: [0; 4],
        }))
    }

    /// Number of routing slots in use on `side`.
    pub fn routing_slot_count(&self, side: PortSide) -> usize {
        side.ordinal()
            .map(|i| self.routing_slot_count[i])
            .unwrap_or(0)
    }

    pub fn update_routing_slot_count(&mut self) {
        self.routing_slot_count = [0; 4];
        for lp in &self.loops {
            for &side in &lp.occupied_sides {
                if let Some(i) = side.ordinal() {
                    let count = &mut self.routing_slot_count[i];
                    *count = (*count).max(lp.routing_slot(side) + 1);
                }
            }
        }
    }
}

struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}
