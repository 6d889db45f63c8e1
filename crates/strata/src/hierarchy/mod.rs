//! Cross-hierarchy edge handling.
//!
//! [`preprocess`] cuts every edge that crosses a compound node boundary into one dummy edge per
//! level, [`postprocess`] puts the routes of those pieces back together once the levels have been
//! laid out. The [`CrossHierarchyMap`] returned by the first is the only state shared between the
//! two.

pub mod postprocess;
pub mod preprocess;
pub mod registry;

pub use postprocess::postprocess;
pub use preprocess::{PendingNodes, Preprocessor, preprocess};
pub use registry::{CrossHierarchyEdge, CrossHierarchyMap, FlowDirection, shallowest_segment, sort_segments};
