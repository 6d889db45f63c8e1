//! Hierarchical layering core.
//!
//! Cuts edges that cross compound node boundaries into per-level pieces so that every hierarchy
//! level can be laid out as a flat graph, reassembles the pieces afterwards, and routes self
//! loops around their nodes.

pub use strata_graph as graph;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod coordinate_system;
pub mod error;
pub mod hierarchy;
pub mod hyperedge;
pub mod monitor;
pub mod pipeline;
pub mod self_loops;
pub mod spline;

pub use error::{Error, Result};
pub use hierarchy::{CrossHierarchyEdge, CrossHierarchyMap, FlowDirection, postprocess, preprocess};
pub use monitor::{NullMonitor, ProgressMonitor, TracingMonitor};
pub use pipeline::{FlatLayouter, LayoutSession, layout};
pub use self_loops::{LabelManager, SelfLoopRouter, route_self_loops};
