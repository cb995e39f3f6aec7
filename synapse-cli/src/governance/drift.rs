//! Architectural drift against a stored baseline.
//!
//! Drift is a bounded scalar over the signed differences between current
//! and baseline metrics:
//!
//! ```text
//! drift = clamp01(0.4*|dC| + 0.3*(violations_now - violations_then)/max(violations_then, 1)
//!                 + 0.3*|dCohesion|)
//! ```
//!
//! A baseline taken on the same snapshot yields `{0, []}`.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SynapseError};
use crate::governance::validator::GovernanceReport;

const COUPLING_WEIGHT: f64 = 0.4;
const VIOLATION_WEIGHT: f64 = 0.3;
const COHESION_WEIGHT: f64 = 0.3;

/// Metrics captured at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftMetrics {
    pub timestamp: DateTime<Utc>,
    pub coupling_score: f64,
    pub cohesion_score: f64,
    pub violation_count: usize,
    pub layer_balance: BTreeMap<String, f64>,
}

impl DriftMetrics {
    pub fn from_report(report: &GovernanceReport, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            coupling_score: report.coupling_score,
            cohesion_score: report.cohesion_score,
            violation_count: report.total_violations(),
            layer_balance: report.layer_balance.clone(),
        }
    }
}

/// Comparison of current metrics to a baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftReport {
    pub current: DriftMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<DriftMetrics>,
    pub drift_score: f64,
    pub recommendations: Vec<String>,
}

/// Compare current metrics against an optional baseline.
pub fn drift_report(current: DriftMetrics, baseline: Option<DriftMetrics>) -> DriftReport {
    let Some(baseline) = baseline else {
        return DriftReport {
            current,
            baseline: None,
            drift_score: 0.0,
            recommendations: vec![
                "No baseline found; save one to start tracking drift.".to_string()
            ],
        };
    };

    let coupling_delta = (current.coupling_score - baseline.coupling_score).abs();
    let violation_delta = (current.violation_count as f64 - baseline.violation_count as f64)
        / (baseline.violation_count.max(1) as f64);
    let cohesion_delta = (current.cohesion_score - baseline.cohesion_score).abs();

    let drift_score = (COUPLING_WEIGHT * coupling_delta
        + VIOLATION_WEIGHT * violation_delta
        + COHESION_WEIGHT * cohesion_delta)
        .clamp(0.0, 1.0);

    let mut recommendations = Vec::new();
    if drift_score > 0.0 {
        // Rubric keyed on the dominant drift dimension.
        let coupling_term = COUPLING_WEIGHT * coupling_delta;
        let violation_term = VIOLATION_WEIGHT * violation_delta.max(0.0);
        let cohesion_term = COHESION_WEIGHT * cohesion_delta;

        if violation_term >= coupling_term && violation_term >= cohesion_term {
            let new = current.violation_count.saturating_sub(baseline.violation_count);
            recommendations.push(format!(
                "{new} new boundary violations since the baseline; address them before they accumulate."
            ));
        } else if coupling_term >= cohesion_term {
            recommendations
                .push("Coupling has shifted noticeably; review new cross-layer imports.".into());
        } else {
            recommendations
                .push("Cohesion has shifted noticeably; check whether new code landed in the right layer.".into());
        }
        if current.violation_count > 5 {
            recommendations
                .push("Violation count is high; plan a boundary cleanup pass.".into());
        }
    }

    DriftReport {
        current,
        baseline: Some(baseline),
        drift_score,
        recommendations,
    }
}

/// Persist a baseline snapshot as JSON.
pub fn save_baseline(path: &Path, metrics: &DriftMetrics) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(metrics)
        .map_err(|e| SynapseError::Config(format!("serialise baseline: {e}")))?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Load a baseline snapshot from JSON.
pub fn load_baseline(path: &Path) -> Result<DriftMetrics> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        SynapseError::NotFound(format!("baseline {}: {e}", path.display()))
    })?;
    serde_json::from_str(&raw)
        .map_err(|e| SynapseError::Config(format!("baseline {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(coupling: f64, cohesion: f64, violations: usize) -> DriftMetrics {
        DriftMetrics {
            timestamp: Utc::now(),
            coupling_score: coupling,
            cohesion_score: cohesion,
            violation_count: violations,
            layer_balance: BTreeMap::new(),
        }
    }

    #[test]
    fn test_drift_against_same_snapshot_is_zero() {
        let current = metrics(0.3, 0.6, 2);
        let report = drift_report(current.clone(), Some(current));
        assert_eq!(report.drift_score, 0.0);
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_drift_formula_clamps_at_one() {
        // Baseline {0.2, 0.7, 0}; current {0.5, 0.55, 4}:
        // 0.4*0.3 + 0.3*(4/1) + 0.3*0.15 = 1.365 -> 1.0.
        let baseline = metrics(0.2, 0.7, 0);
        let current = metrics(0.5, 0.55, 4);
        let report = drift_report(current, Some(baseline));
        assert_eq!(report.drift_score, 1.0);
        assert!(!report.recommendations.is_empty());
    }

    #[test]
    fn test_drift_partial_values() {
        let baseline = metrics(0.2, 0.7, 4);
        let current = metrics(0.3, 0.6, 6);
        // 0.4*0.1 + 0.3*(2/4) + 0.3*0.1 = 0.04 + 0.15 + 0.03
        let report = drift_report(current, Some(baseline));
        assert!((report.drift_score - 0.22).abs() < 1e-9);
    }

    #[test]
    fn test_fewer_violations_reduce_drift() {
        let baseline = metrics(0.2, 0.7, 10);
        let current = metrics(0.2, 0.7, 0);
        // Negative violation term offsets nothing else; clamps at 0.
        let report = drift_report(current, Some(baseline));
        assert_eq!(report.drift_score, 0.0);
    }

    #[test]
    fn test_no_baseline() {
        let report = drift_report(metrics(0.1, 0.9, 0), None);
        assert_eq!(report.drift_score, 0.0);
        assert!(report.baseline.is_none());
        assert_eq!(report.recommendations.len(), 1);
    }

    #[test]
    fn test_baseline_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baselines/arch.json");
        let metrics = metrics(0.25, 0.6, 3);

        save_baseline(&path, &metrics).unwrap();
        let loaded = load_baseline(&path).unwrap();
        assert_eq!(loaded, metrics);
    }

    #[test]
    fn test_load_missing_baseline_is_not_found() {
        let err = load_baseline(Path::new("/nonexistent/baseline.json")).unwrap_err();
        assert_eq!(err.code(), "not_found");
    }

    #[test]
    fn test_violation_recommendation_dominates() {
        let baseline = metrics(0.2, 0.7, 1);
        let current = metrics(0.2, 0.7, 8);
        let report = drift_report(current, Some(baseline));
        assert!(report.recommendations[0].contains("7 new boundary violations"));
        assert!(report
            .recommendations
            .iter()
            .any(|r| r.contains("cleanup pass")));
    }
}
