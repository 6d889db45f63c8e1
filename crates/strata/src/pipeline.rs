//! Layout entrypoints.
//!
//! A layout run cuts cross-hierarchy edges into per-level pieces, lets a [`FlatLayouter`] place
//! every level on its own (innermost first), stitches the pieces back together and finally routes
//! self loops around the positioned nodes.

use crate::error::Result;
use crate::hierarchy::{self, CrossHierarchyMap};
use crate::monitor::{NullMonitor, ProgressMonitor};
use crate::self_loops::{self, LabelManager};
use strata_graph::{Graph, GraphId, alg};
use tracing::debug;

/// Places the nodes of one hierarchy level and routes its edges.
///
/// The level is self-contained when this is called: no edge leaves it, and every level nested in
/// one of its nodes has already been laid out. Implementations set node positions (and the size of
/// compound nodes), port positions and edge bend points, all relative to the level itself.
pub trait FlatLayouter {
    fn layout_level(&mut self, g: &mut Graph, graph: GraphId) -> Result<()>;
}

impl<F> FlatLayouter for F
where
    F: FnMut(&mut Graph, GraphId) -> Result<()>,
{
    fn layout_level(&mut self, g: &mut Graph, graph: GraphId) -> Result<()> {
        self(g, graph)
    }
}

/// State of one layout run over a compound graph.
///
/// The cross-hierarchy registry lives here between preprocessing and postprocessing, so a session
/// is meant to lay out a single graph. The phases are public for callers that need to hook in
/// between them; [`LayoutSession::layout`] runs them all.
pub struct LayoutSession<'a, L, M = NullMonitor> {
    layouter: L,
    monitor: M,
    label_manager: Option<&'a dyn LabelManager>,
    registry: Option<CrossHierarchyMap>,
}

impl<L: FlatLayouter> LayoutSession<'_, L, NullMonitor> {
    pub fn new(layouter: L) -> Self {
        Self {
            layouter,
            monitor: NullMonitor,
            label_manager: None,
            registry: None,
        }
    }
}

impl<'a, L: FlatLayouter, M: ProgressMonitor> LayoutSession<'a, L, M> {
    pub fn with_monitor<N: ProgressMonitor>(self, monitor: N) -> LayoutSession<'a, L, N> {
        LayoutSession {
            layouter: self.layouter,
            monitor,
            label_manager: self.label_manager,
            registry: self.registry,
        }
    }

    pub fn with_label_manager(mut self, manager: &'a dyn LabelManager) -> Self {
        self.label_manager = Some(manager);
        self
    }

    /// The cross-hierarchy registry, present between [`Self::preprocess`] and
    /// [`Self::postprocess`].
    pub fn registry(&self) -> Option<&CrossHierarchyMap> {
        self.registry.as_ref()
    }

    pub fn monitor(&self) -> &M {
        &self.monitor
    }

    pub fn into_layouter(self) -> L {
        self.layouter
    }

    pub fn layout(&mut self, g: &mut Graph) -> Result<()> {
        self.preprocess(g)?;
        self.layout_levels(g)?;
        self.postprocess(g)?;
        self.route_self_loops(g)?;
        Ok(())
    }

    pub fn preprocess(&mut self, g: &mut Graph) -> Result<()> {
        self.monitor.begin("Compound graph preprocessing");
        let result = hierarchy::preprocess(g);
        self.monitor.done();
        self.registry = Some(result?);
        Ok(())
    }

    pub fn layout_levels(&mut self, g: &mut Graph) -> Result<()> {
        let levels = alg::levels_bottom_up(g, g.root());
        debug!(levels = levels.len(), "laying out hierarchy levels");
        for level in levels {
            self.monitor.begin("Flat layout");
            let result = self.layouter.layout_level(g, level);
            self.monitor.done();
            result?;
        }
        Ok(())
    }

    /// Reassembles cross-hierarchy edges and drops the registry. Does nothing if the graph was
    /// not preprocessed by this session.
    pub fn postprocess(&mut self, g: &mut Graph) -> Result<()> {
        let Some(mut registry) = self.registry.take() else {
            return Ok(());
        };
        self.monitor.begin("Compound graph postprocessing");
        let result = hierarchy::postprocess(g, &registry);
        self.monitor.done();
        registry.clear();
        result
    }

    pub fn route_self_loops(&mut self, g: &mut Graph) -> Result<()> {
        self.monitor.begin("Self loop routing");
        let mut result = Ok(0);
        for level in alg::levels_bottom_up(g, g.root()) {
            match self_loops::route_self_loops(g, level, self.label_manager) {
                Ok(n) => result = result.map(|total| total + n),
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        self.monitor.done();
        let nodes = result?;
        debug!(nodes, "self loop routing done");
        Ok(())
    }
}

/// Runs a complete layout of `g` with `layouter` and no progress reporting.
pub fn layout<L: FlatLayouter>(g: &mut Graph, layouter: L) -> Result<()> {
    LayoutSession::new(layouter).layout(g)
}
