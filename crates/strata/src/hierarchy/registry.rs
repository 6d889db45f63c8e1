//! Bookkeeping that ties original cross-hierarchy edges to the level-local edges replacing them.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use strata_graph::alg::depth_below;
use strata_graph::{EdgeId, Graph, GraphId, NodeKind, PortId};

/// Which way a segment runs relative to the nesting of its edge.
///
/// `Output` segments climb from the source towards the level where the edge turns around,
/// `Input` segments descend from there towards the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FlowDirection {
    Output,
    Input,
}

/// One level-local piece of a cross-hierarchy edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossHierarchyEdge {
    /// The dummy edge carrying this piece. Several segments may share one edge when merged.
    pub edge: EdgeId,
    /// The level `edge` lives in.
    pub graph: GraphId,
    pub direction: FlowDirection,
}

impl CrossHierarchyEdge {
    pub fn new(edge: EdgeId, graph: GraphId, direction: FlowDirection) -> Self {
        Self {
            edge,
            graph,
            direction,
        }
    }

    /// The port the segment really starts at: the compound node port an external port dummy
    /// stands for, else the dummy edge's own source.
    pub fn actual_source(&self, g: &Graph) -> Result<PortId> {
        let port = g
            .edge(self.edge)
            .source
            .ok_or(Error::DetachedEdge { edge: self.edge })?;
        Ok(resolve_dummy(g, port))
    }

    pub fn actual_target(&self, g: &Graph) -> Result<PortId> {
        let port = g
            .edge(self.edge)
            .target
            .ok_or(Error::DetachedEdge { edge: self.edge })?;
        Ok(resolve_dummy(g, port))
    }
}

fn resolve_dummy(g: &Graph, port: PortId) -> PortId {
    let node = g.node(g.port_node(port));
    match (node.kind, node.origin) {
        (NodeKind::ExternalPort, Some(origin)) => origin,
        _ => port,
    }
}

/// Original edge to the segments that replace it, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct CrossHierarchyMap {
    entries: IndexMap<EdgeId, Vec<CrossHierarchyEdge>, FxBuildHasher>,
}

impl CrossHierarchyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, original: EdgeId, segment: CrossHierarchyEdge) {
        self.entries.entry(original).or_default().push(segment);
    }

    /// Segments of `original` in the order they were registered.
    pub fn get(&self, original: EdgeId) -> &[CrossHierarchyEdge] {
        self.entries.get(&original).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, original: EdgeId) -> bool {
        self.entries.contains_key(&original)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn originals(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EdgeId, &[CrossHierarchyEdge])> + '_ {
        self.entries.iter().map(|(&e, segs)| (e, segs.as_slice()))
    }

    /// Segments of `original` ordered along the edge from source to target.
    ///
    /// `top` is the level all segment levels are measured against; usually the root.
    pub fn sorted(&self, g: &Graph, top: GraphId, original: EdgeId) -> Result<Vec<CrossHierarchyEdge>> {
        let mut segments = self.get(original).to_vec();
        sort_segments(g, top, &mut segments)?;
        Ok(segments)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Orders segments so that they form a path: all `Output` segments deepest level first, then all
/// `Input` segments shallowest level first. The sort is stable.
pub fn sort_segments(g: &Graph, top: GraphId, segments: &mut [CrossHierarchyEdge]) -> Result<()> {
    let mut keyed = Vec::with_capacity(segments.len());
    for seg in segments.iter() {
        let depth = depth_below(g, seg.graph, top).ok_or(Error::NotAnAncestor {
            graph: seg.graph,
            top,
        })? as i64;
        let key = match seg.direction {
            FlowDirection::Output => (0u8, -depth),
            FlowDirection::Input => (1u8, depth),
        };
        keyed.push((key, *seg));
    }
    keyed.sort_by_key(|(key, _)| *key);
    for (slot, (_, seg)) in segments.iter_mut().zip(keyed) {
        *slot = seg;
    }
    Ok(())
}

/// Index of the segment that should carry a centered label: the one right before the first
/// `Input` segment, the first one if the path starts with `Input`, else the last one.
pub fn shallowest_segment(segments: &[CrossHierarchyEdge]) -> usize {
    match segments
        .iter()
        .position(|s| s.direction == FlowDirection::Input)
    {
        Some(0) => 0,
        Some(i) => i - 1,
        None => segments.len().saturating_sub(1),
    }
}
