//! Typed element ids.
//!
//! Every element of a [`Graph`](super::Graph) lives in an arena and is addressed by a small
//! copyable id. Ids are only meaningful for the graph that handed them out.

macro_rules! element_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Position of the element in its arena.
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Debug::fmt(self, f)
            }
        }
    };
}

element_id!(
    /// A node in some hierarchy level.
    NodeId,
    "n"
);
element_id!(
    /// A port owned by a node.
    PortId,
    "p"
);
element_id!(
    /// An edge between two ports.
    EdgeId,
    "e"
);
element_id!(
    /// A label attached to an edge or a port.
    LabelId,
    "l"
);
element_id!(
    /// One hierarchy level: the top-level graph or the nested graph of a node.
    GraphId,
    "g"
);
