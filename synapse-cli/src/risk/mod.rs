//! Multi-factor risk scoring and blast-radius analysis.

mod engine;
mod factors;

pub use engine::{BlastRadius, NodeRisk, RiskEngine, RiskReport};
pub use factors::{RiskFactors, RISK_WEIGHTS};
