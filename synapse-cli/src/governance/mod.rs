//! Architectural governance: layer classification, boundary rules, and
//! drift against a stored baseline.

mod drift;
mod rules;
mod validator;

pub use drift::{drift_report, load_baseline, save_baseline, DriftMetrics, DriftReport};
pub use rules::{
    ArchitectureRules, BoundaryRule, Layer, RuleAction, ViolationSeverity, CONFIG_RELATIVE_PATH,
};
pub use validator::{import_edges, validate_imports, GovernanceReport, ImportEdge, Violation};
