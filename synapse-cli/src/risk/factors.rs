//! The six weighted risk factors.
//!
//! Every factor is normalised to [0, 1]; the risk score is the weighted
//! sum. Unknown signals default pessimistically: missing coverage reads as
//! fully uncovered, missing git history as a medium bus-factor risk.

use serde::{Deserialize, Serialize};

/// (name, weight) pairs; weights sum to 1.0.
pub const RISK_WEIGHTS: [(&str, f64); 6] = [
    ("complexity_risk", 0.25),
    ("centrality_risk", 0.20),
    ("test_coverage_risk", 0.20),
    ("dependency_risk", 0.15),
    ("change_frequency_risk", 0.10),
    ("bus_factor_risk", 0.10),
];

const CYCLOMATIC_SCALE: f64 = 15.0;
const COGNITIVE_SCALE: f64 = 20.0;
const DEGREE_SCALE: f64 = 20.0;
const CHANGE_FREQUENCY_SCALE: f64 = 30.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskFactors {
    pub complexity_risk: f64,
    pub centrality_risk: f64,
    pub test_coverage_risk: f64,
    pub dependency_risk: f64,
    pub change_frequency_risk: f64,
    pub bus_factor_risk: f64,
}

impl RiskFactors {
    /// Weighted sum in [0, 1].
    pub fn weighted_total(&self) -> f64 {
        self.as_pairs()
            .iter()
            .zip(RISK_WEIGHTS.iter())
            .map(|((_, value), (_, weight))| value * weight)
            .sum::<f64>()
            .min(1.0)
    }

    /// Factor with the highest raw value; ties keep table order.
    pub fn dominant(&self) -> (&'static str, f64) {
        self.as_pairs()
            .into_iter()
            .fold(("complexity_risk", f64::MIN), |best, (name, value)| {
                if value > best.1 {
                    (name, value)
                } else {
                    best
                }
            })
    }

    pub fn as_pairs(&self) -> [(&'static str, f64); 6] {
        [
            ("complexity_risk", self.complexity_risk),
            ("centrality_risk", self.centrality_risk),
            ("test_coverage_risk", self.test_coverage_risk),
            ("dependency_risk", self.dependency_risk),
            ("change_frequency_risk", self.change_frequency_risk),
            ("bus_factor_risk", self.bus_factor_risk),
        ]
    }
}

/// Equal-weight blend of scaled cyclomatic and cognitive complexity.
pub fn complexity_risk(cyclomatic: u32, cognitive: u32) -> f64 {
    0.5 * (cyclomatic as f64 / CYCLOMATIC_SCALE).min(1.0)
        + 0.5 * (cognitive as f64 / COGNITIVE_SCALE).min(1.0)
}

/// `1 - coverage`; unknown coverage is fully risky.
pub fn test_coverage_risk(coverage: Option<f64>) -> f64 {
    match coverage {
        Some(c) => (1.0 - c).clamp(0.0, 1.0),
        None => 1.0,
    }
}

pub fn dependency_risk(in_degree: usize, out_degree: usize) -> f64 {
    ((in_degree + out_degree) as f64 / DEGREE_SCALE).min(1.0)
}

pub fn change_frequency_risk(commits_last_90d: usize) -> f64 {
    (commits_last_90d as f64 / CHANGE_FREQUENCY_SCALE).min(1.0)
}

/// Bus-factor bands; `None` (no git signal) reads as medium risk.
pub fn bus_factor_risk(bus_factor: Option<usize>) -> f64 {
    match bus_factor {
        Some(n) if n <= 1 => 1.0,
        Some(2) => 0.6,
        Some(3) => 0.3,
        Some(_) => 0.0,
        None => 0.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = RISK_WEIGHTS.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_complexity_blend() {
        assert_eq!(complexity_risk(0, 0), 0.0);
        // Saturates at the scale points.
        assert!((complexity_risk(15, 20) - 1.0).abs() < 1e-9);
        assert!((complexity_risk(30, 40) - 1.0).abs() < 1e-9);
        // Half-scale on both axes.
        let half = complexity_risk(7, 10);
        assert!(half > 0.45 && half < 0.55);
    }

    #[test]
    fn test_test_coverage_risk() {
        assert_eq!(test_coverage_risk(None), 1.0);
        assert_eq!(test_coverage_risk(Some(1.0)), 0.0);
        assert!((test_coverage_risk(Some(0.25)) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_dependency_and_change_frequency_caps() {
        assert_eq!(dependency_risk(10, 10), 1.0);
        assert_eq!(dependency_risk(100, 0), 1.0);
        assert!((dependency_risk(5, 5) - 0.5).abs() < 1e-9);

        assert_eq!(change_frequency_risk(30), 1.0);
        assert!((change_frequency_risk(15) - 0.5).abs() < 1e-9);
        assert_eq!(change_frequency_risk(0), 0.0);
    }

    #[test]
    fn test_bus_factor_bands() {
        assert_eq!(bus_factor_risk(Some(0)), 1.0);
        assert_eq!(bus_factor_risk(Some(1)), 1.0);
        assert_eq!(bus_factor_risk(Some(2)), 0.6);
        assert_eq!(bus_factor_risk(Some(3)), 0.3);
        assert_eq!(bus_factor_risk(Some(4)), 0.0);
        assert_eq!(bus_factor_risk(None), 0.5);
    }

    #[test]
    fn test_weighted_total_and_dominant() {
        let factors = RiskFactors {
            complexity_risk: 1.0,
            centrality_risk: 1.0,
            test_coverage_risk: 1.0,
            dependency_risk: 1.0,
            change_frequency_risk: 1.0,
            bus_factor_risk: 1.0,
        };
        assert!((factors.weighted_total() - 1.0).abs() < 1e-9);

        let skewed = RiskFactors {
            test_coverage_risk: 0.9,
            complexity_risk: 0.4,
            ..Default::default()
        };
        assert_eq!(skewed.dominant().0, "test_coverage_risk");
        let expected = 0.9 * 0.20 + 0.4 * 0.25;
        assert!((skewed.weighted_total() - expected).abs() < 1e-9);
    }
}
