//! Read-only query façade over an analysis snapshot.
//!
//! This is the surface the HTTP layer and any embedding consume. Every
//! query returns either a serialisable payload or a [`SynapseError`] whose
//! stable code the delivery layer forwards unchanged.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, SynapseError};
use crate::expertise::{ExpertRecommendation, Heatmap};
use crate::governance::{self, DriftMetrics, DriftReport, Violation};
use crate::models::{normalize_path, EntityKind, RiskLevel};
use crate::pipeline::AnalysisSnapshot;
use crate::risk::{BlastRadius, RiskEngine};

/// One node in the flat graph payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    pub kind: EntityKind,
    pub file: String,
    pub line: u32,
    pub complexity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphPayload {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusFactorSummary {
    pub analysis: BTreeMap<String, usize>,
    pub risk_areas: Vec<String>,
    pub warning_threshold: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceValidation {
    pub violations: Vec<Violation>,
    pub warnings: Vec<Violation>,
    pub total_violations: usize,
    pub total_warnings: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSummary {
    pub name: String,
    pub patterns: Vec<String>,
    pub module_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeGaps {
    pub knowledge_gaps: Vec<String>,
    pub total_gaps: usize,
}

/// Read-only façade; holds a reference to the immutable snapshot, so all
/// queries are lock-free.
pub struct QuerySurface<'a> {
    snapshot: &'a AnalysisSnapshot,
    config: &'a crate::config::AnalysisConfig,
}

impl<'a> QuerySurface<'a> {
    pub fn new(snapshot: &'a AnalysisSnapshot, config: &'a crate::config::AnalysisConfig) -> Self {
        Self { snapshot, config }
    }

    /// Raw nodes and edges for visualisation.
    pub fn get_graph(&self) -> GraphPayload {
        let graph = &self.snapshot.graph;
        let nodes = graph
            .nodes()
            .iter()
            .map(|entity| GraphNode {
                id: entity.id.clone(),
                name: entity.name.clone(),
                kind: entity.kind(),
                file: entity.location.file.clone(),
                line: entity.location.start_line,
                complexity: entity.complexity().cyclomatic,
            })
            .collect();
        let edges = graph
            .edges()
            .iter()
            .map(|edge| GraphEdge {
                source: graph.node(edge.source).id.clone(),
                target: graph.node(edge.target).id.clone(),
                kind: edge.kind.to_string(),
            })
            .collect();
        GraphPayload { nodes, edges }
    }

    /// The directory/file/entity hierarchy with rolled-up risk.
    pub fn get_condensed_graph(&self) -> &crate::graph::CondensedGraph {
        &self.snapshot.condensed
    }

    /// Blast radius for an entity; `ErrNotFound` when absent.
    pub fn blast_radius(&self, entity_id: &str, depth: Option<usize>) -> Result<BlastRadius> {
        let engine = RiskEngine::new(&self.snapshot.graph, self.config);
        engine.blast_radius(
            &self.snapshot.risk,
            entity_id,
            depth,
            &AtomicBool::new(false),
        )
    }

    /// Expert lookup for a file path.
    pub fn expert_for(&self, file_path: &str) -> Result<ExpertRecommendation> {
        if file_path.trim().is_empty() {
            return Err(SynapseError::Validation("empty file path".into()));
        }
        Ok(self.snapshot.expertise.expert_for(&normalize_path(file_path)))
    }

    pub fn heatmap(&self) -> Heatmap {
        self.snapshot.expertise.heatmap()
    }

    pub fn bus_factor_summary(&self) -> BusFactorSummary {
        let analysis = self.snapshot.expertise.bus_factor_analysis();
        let risk_areas = analysis
            .iter()
            .filter(|(_, &n)| n <= crate::expertise::BUS_FACTOR_WARNING_THRESHOLD)
            .map(|(module, _)| module.clone())
            .collect();
        BusFactorSummary {
            analysis,
            risk_areas,
            warning_threshold: crate::expertise::BUS_FACTOR_WARNING_THRESHOLD,
        }
    }

    pub fn knowledge_gaps(&self) -> KnowledgeGaps {
        let gaps = self.snapshot.expertise.knowledge_gaps();
        KnowledgeGaps {
            total_gaps: gaps.len(),
            knowledge_gaps: gaps,
        }
    }

    /// All files a developer has expertise on, best first.
    pub fn developer_expertise(&self, email: &str) -> Result<Vec<(String, f64)>> {
        if email.trim().is_empty() {
            return Err(SynapseError::Validation("empty developer email".into()));
        }
        Ok(self.snapshot.expertise.developer_expertise(&email.to_lowercase()))
    }

    pub fn governance_validate(&self) -> GovernanceValidation {
        let report = &self.snapshot.governance;
        GovernanceValidation {
            violations: report.violations.clone(),
            warnings: report.warnings.clone(),
            total_violations: report.total_violations(),
            total_warnings: report.total_warnings(),
        }
    }

    pub fn governance_layers(&self) -> Vec<LayerSummary> {
        self.snapshot
            .rules
            .layers
            .iter()
            .map(|layer| LayerSummary {
                name: layer.name.clone(),
                patterns: layer.patterns.clone(),
                module_count: self
                    .snapshot
                    .governance
                    .module_counts
                    .get(&layer.name)
                    .copied()
                    .unwrap_or(0),
            })
            .collect()
    }

    /// Drift against an optional baseline file.
    pub fn governance_drift(&self, baseline_path: Option<&Path>) -> Result<DriftReport> {
        let current = DriftMetrics::from_report(&self.snapshot.governance, Utc::now());
        let baseline = match baseline_path {
            Some(path) => Some(governance::load_baseline(path)?),
            None => None,
        };
        Ok(governance::drift_report(current, baseline))
    }

    /// Save the current metrics as the new baseline.
    pub fn governance_save_baseline(&self, path: &Path) -> Result<DriftMetrics> {
        let metrics = DriftMetrics::from_report(&self.snapshot.governance, Utc::now());
        governance::save_baseline(path, &metrics)?;
        Ok(metrics)
    }

    /// Node/edge counts and per-kind edge totals.
    pub fn graph_stats(&self) -> crate::graph::GraphStats {
        self.snapshot.graph.stats()
    }

    /// Bases and subclasses of a class entity.
    pub fn inheritance_tree(&self, class_id: &str) -> Result<(Vec<String>, Vec<String>)> {
        let index = self
            .snapshot
            .graph
            .node_index(class_id)
            .ok_or_else(|| SynapseError::NotFound(format!("entity {class_id}")))?;
        Ok(self.snapshot.graph.inheritance_tree(index))
    }

    /// Risk level for one entity, for delivery layers that show badges.
    pub fn risk_level(&self, entity_id: &str) -> Result<RiskLevel> {
        let index = self
            .snapshot
            .graph
            .node_index(entity_id)
            .ok_or_else(|| SynapseError::NotFound(format!("entity {entity_id}")))?;
        Ok(self.snapshot.risk.per_node[index as usize].level)
    }
}
