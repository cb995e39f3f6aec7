//! Error types for graph algorithms.
//!
//! All algorithms validate their inputs and return `Result<T, GraphError>`
//! instead of silently ignoring invalid data.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// An edge references a node index >= the declared node count.
    #[error("edge references node {0} but graph has only {1} nodes")]
    NodeOutOfBounds(u32, u32),

    /// A parameter was out of range or otherwise unusable.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A traversal visited more nodes than its hard cap allows.
    #[error("traversal budget exceeded after visiting {0} nodes")]
    BudgetExceeded(usize),

    /// The caller's cancellation flag was raised mid-run.
    #[error("operation cancelled")]
    Cancelled,
}
