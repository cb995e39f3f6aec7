//! Import-edge validation against the boundary rules.
//!
//! Consumes the IMPORTS edges of the graph snapshot, classifies both ends
//! into layers, applies the first matching rule, and computes the coupling
//! / cohesion / balance metrics that feed drift detection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::governance::rules::{ArchitectureRules, RuleAction, ViolationSeverity};
use crate::graph::GraphSnapshot;
use crate::models::{EntityKind, RelationKind};

/// One import edge to validate: importing module, imported module, site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEdge {
    pub from_module: String,
    pub to_module: String,
    pub line: u32,
}

/// A detected boundary violation or warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub rule_name: String,
    pub from_module: String,
    pub to_module: String,
    pub from_layer: String,
    pub to_layer: String,
    pub severity: ViolationSeverity,
    pub file_path: String,
    pub line_number: u32,
    pub message: String,
}

/// Governance results for one snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GovernanceReport {
    pub violations: Vec<Violation>,
    pub warnings: Vec<Violation>,
    /// imports crossing layers / total imports.
    pub coupling_score: f64,
    /// imports within one layer / total imports.
    pub cohesion_score: f64,
    /// Layer name -> module count as a fraction of classified modules.
    pub layer_balance: BTreeMap<String, f64>,
    /// Layer name -> module count.
    pub module_counts: BTreeMap<String, usize>,
    pub total_imports: usize,
}

impl GovernanceReport {
    pub fn total_violations(&self) -> usize {
        self.violations.len()
    }

    pub fn total_warnings(&self) -> usize {
        self.warnings.len()
    }
}

/// Pull the IMPORTS edges between module nodes out of a snapshot.
pub fn import_edges(snapshot: &GraphSnapshot) -> Vec<ImportEdge> {
    snapshot
        .edges()
        .iter()
        .filter(|e| e.kind == RelationKind::Imports)
        .filter(|e| snapshot.node(e.source).kind() == EntityKind::Module)
        .map(|e| ImportEdge {
            from_module: snapshot.node(e.source).id.clone(),
            to_module: snapshot.node(e.target).id.clone(),
            line: e.line.unwrap_or(0),
        })
        .collect()
}

/// Validate import edges and compute the coupling metrics.
///
/// `module_paths` lists every module (file) in the snapshot, classified or
/// not, for the layer-balance metric.
pub fn validate_imports(
    rules: &ArchitectureRules,
    edges: &[ImportEdge],
    module_paths: &[String],
) -> GovernanceReport {
    let mut report = GovernanceReport {
        total_imports: edges.len(),
        ..Default::default()
    };

    let mut within_layer = 0usize;
    let mut across_layers = 0usize;

    for edge in edges {
        let from_layer = rules.classify(&edge.from_module);
        let to_layer = rules.classify(&edge.to_module);

        match (from_layer, to_layer) {
            (Some(from), Some(to)) if from == to => within_layer += 1,
            (Some(from), Some(to)) => {
                across_layers += 1;
                if let Some(rule) = rules.rule_for(from, to) {
                    let (severity, bucket) = match rule.action {
                        RuleAction::Allow => continue,
                        RuleAction::Warn => (ViolationSeverity::Warning, false),
                        RuleAction::Block => (ViolationSeverity::Error, true),
                    };
                    let violation = Violation {
                        rule_name: rule.name.clone(),
                        from_module: edge.from_module.clone(),
                        to_module: edge.to_module.clone(),
                        from_layer: from.to_string(),
                        to_layer: to.to_string(),
                        severity,
                        file_path: edge.from_module.clone(),
                        line_number: edge.line,
                        message: if rule.message.is_empty() {
                            format!("import from {from} to {to} violates {}", rule.name)
                        } else {
                            rule.message.clone()
                        },
                    };
                    if bucket {
                        report.violations.push(violation);
                    } else {
                        report.warnings.push(violation);
                    }
                }
            }
            // Unclassified ends are allowed; they count toward neither
            // coupling nor cohesion.
            _ => {}
        }
    }

    if !edges.is_empty() {
        report.coupling_score = across_layers as f64 / edges.len() as f64;
        report.cohesion_score = within_layer as f64 / edges.len() as f64;
    }

    let mut classified = 0usize;
    for path in module_paths {
        if let Some(layer) = rules.classify(path) {
            *report.module_counts.entry(layer.to_string()).or_default() += 1;
            classified += 1;
        }
    }
    if classified > 0 {
        for (layer, count) in &report.module_counts {
            report
                .layer_balance
                .insert(layer.clone(), *count as f64 / classified as f64);
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governance::rules::ArchitectureRules;

    fn edge(from: &str, to: &str) -> ImportEdge {
        ImportEdge {
            from_module: from.to_string(),
            to_module: to.to_string(),
            line: 1,
        }
    }

    #[test]
    fn test_block_rule_emits_error_violation() {
        let rules = ArchitectureRules::default();
        let edges = vec![edge("app/api/main.py", "app/data/models.py")];
        let report = validate_imports(&rules, &edges, &[]);

        assert_eq!(report.total_violations(), 1);
        assert_eq!(report.total_warnings(), 0);
        let violation = &report.violations[0];
        assert_eq!(violation.severity, ViolationSeverity::Error);
        assert_eq!(violation.from_layer, "api");
        assert_eq!(violation.to_layer, "data");
        assert_eq!(violation.rule_name, "api-must-not-touch-data");
        assert!(!violation.message.is_empty());
    }

    #[test]
    fn test_unmatched_cross_layer_import_is_allowed() {
        let rules = ArchitectureRules::default();
        let edges = vec![edge("app/service/x.py", "app/data/models.py")];
        let report = validate_imports(&rules, &edges, &[]);
        assert_eq!(report.total_violations(), 0);
        assert_eq!(report.total_warnings(), 0);
        assert!((report.coupling_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_warn_action_and_determinism() {
        let yaml = r#"
layers:
  api:
    patterns: ["**/api/**"]
  data:
    patterns: ["**/data/**"]
rules:
  - name: soft-boundary
    from: api
    to: data
    action: warn
    message: Prefer the service layer.
"#;
        let rules = ArchitectureRules::from_yaml(yaml).unwrap();
        let edges = vec![
            edge("x/api/a.py", "x/data/b.py"),
            edge("x/api/c.py", "x/data/d.py"),
        ];
        let first = validate_imports(&rules, &edges, &[]);
        let second = validate_imports(&rules, &edges, &[]);
        assert_eq!(first.warnings, second.warnings);
        assert_eq!(first.total_warnings(), 2);
        assert_eq!(first.total_violations(), 0);
    }

    #[test]
    fn test_coupling_and_cohesion_scores() {
        let rules = ArchitectureRules::default();
        let edges = vec![
            edge("x/api/a.py", "x/api/b.py"),
            edge("x/api/a.py", "x/data/c.py"),
            edge("x/unclassified.py", "x/api/a.py"),
            edge("x/api/a.py", "os"),
        ];
        let report = validate_imports(&rules, &edges, &[]);
        assert_eq!(report.total_imports, 4);
        assert!((report.coupling_score - 0.25).abs() < 1e-9);
        assert!((report.cohesion_score - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_layer_balance() {
        let rules = ArchitectureRules::default();
        let modules = vec![
            "x/api/a.py".to_string(),
            "x/api/b.py".to_string(),
            "x/data/c.py".to_string(),
            "x/stray.py".to_string(),
        ];
        let report = validate_imports(&rules, &[], &modules);
        assert_eq!(report.module_counts.get("api"), Some(&2));
        assert_eq!(report.module_counts.get("data"), Some(&1));
        assert!((report.layer_balance.get("api").unwrap() - 2.0 / 3.0).abs() < 1e-9);
    }
}
