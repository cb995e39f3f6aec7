//! Index-based graph algorithms for the Synapse knowledge graph.
//!
//! The engine crate interns entity IDs to dense `u32` indices and hands
//! edge lists / adjacency to these kernels. Keeping the algorithms free of
//! strings and I/O makes them trivially testable and fast.

mod algo;
mod errors;
mod traversal;

pub use algo::{
    betweenness_centrality, betweenness_centrality_sampled, find_cycles, find_sccs,
};
pub use errors::GraphError;
pub use traversal::{reverse_impact, ImpactNode, ImpactOptions, ImpactSet};
