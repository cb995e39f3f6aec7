//! Error kinds for the analysis engine and query surface.
//!
//! Per-file and per-commit failures are recorded and contained by the
//! pipeline; query-time errors are returned to the caller unchanged as an
//! [`ErrorRecord`] with a stable code consumed by delivery layers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynapseError {
    /// Malformed governance rule file. Fatal for the governance engine
    /// only; callers fall back to defaults with a visible warning.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Filesystem or commit-store failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A single file failed to parse; the batch continues without it.
    #[error("partial parse of {file}: {reason}")]
    PartialParse { file: String, reason: String },

    /// Unknown entity or file requested at query time.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid caller input, e.g. an empty target.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The cancellation flag was raised; partial results are discarded.
    #[error("analysis cancelled")]
    Cancelled,

    /// A traversal hit its hard cap.
    #[error("traversal budget exceeded: {0}")]
    BudgetExceeded(String),
}

impl SynapseError {
    /// Stable identifier consumed by the TUI/web layer.
    pub fn code(&self) -> &'static str {
        match self {
            SynapseError::Config(_) => "config",
            SynapseError::Io(_) => "io",
            SynapseError::PartialParse { .. } => "partial_parse",
            SynapseError::NotFound(_) => "not_found",
            SynapseError::Validation(_) => "validation",
            SynapseError::Cancelled => "cancelled",
            SynapseError::BudgetExceeded(_) => "budget_exceeded",
        }
    }

    /// Extra detail for the error envelope, where one exists.
    fn detail(&self) -> Option<String> {
        match self {
            SynapseError::PartialParse { file, .. } => Some(file.clone()),
            _ => None,
        }
    }
}

impl From<synapse_graph::GraphError> for SynapseError {
    fn from(err: synapse_graph::GraphError) -> Self {
        match err {
            synapse_graph::GraphError::Cancelled => SynapseError::Cancelled,
            synapse_graph::GraphError::BudgetExceeded(n) => {
                SynapseError::BudgetExceeded(format!("visited {n} nodes"))
            }
            other => SynapseError::Validation(other.to_string()),
        }
    }
}

/// Wire form of an error: `{code, message, detail?}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorRecord {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<&SynapseError> for ErrorRecord {
    fn from(err: &SynapseError) -> Self {
        ErrorRecord {
            code: err.code().to_string(),
            message: err.to_string(),
            detail: err.detail(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SynapseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(SynapseError::NotFound("x".into()).code(), "not_found");
        assert_eq!(SynapseError::Validation("x".into()).code(), "validation");
        assert_eq!(SynapseError::Cancelled.code(), "cancelled");
        assert_eq!(
            SynapseError::PartialParse {
                file: "a.py".into(),
                reason: "syntax".into()
            }
            .code(),
            "partial_parse"
        );
    }

    #[test]
    fn test_error_record_round_trip() {
        let err = SynapseError::PartialParse {
            file: "pkg/mod.py".into(),
            reason: "timed out".into(),
        };
        let record = ErrorRecord::from(&err);
        assert_eq!(record.code, "partial_parse");
        assert_eq!(record.detail.as_deref(), Some("pkg/mod.py"));

        let json = serde_json::to_string(&record).unwrap();
        let back: ErrorRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_graph_error_conversion() {
        let err: SynapseError = synapse_graph::GraphError::Cancelled.into();
        assert_eq!(err.code(), "cancelled");
        let err: SynapseError = synapse_graph::GraphError::BudgetExceeded(9).into();
        assert_eq!(err.code(), "budget_exceeded");
    }
}
