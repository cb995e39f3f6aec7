//! The code knowledge graph: immutable snapshot, builder, and the
//! condensed projection used for hierarchical visualisation.

mod builder;
mod condenser;
mod snapshot;

pub use builder::build_snapshot;
pub use condenser::{
    condense, CondensedEdge, CondensedGraph, DirectoryNode, EntityNode, FileNode,
};
pub use snapshot::{EdgeRef, GraphSnapshot, GraphStats};
