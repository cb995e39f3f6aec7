//! Risk scoring over the graph snapshot and blast-radius traversal.
//!
//! Centrality runs over the structural subgraph (CALLS, INHERITS,
//! IMPORTS). Past the configured node-count threshold it switches to a
//! deterministic stride sample of sources scaled by `N/sample_size`, which
//! is approximate. Percentile ranks break centrality ties by entity ID so
//! runs are reproducible.

use std::sync::atomic::AtomicBool;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::errors::{Result, SynapseError};
use crate::expertise::ExpertiseReport;
use crate::git::CommitLog;
use crate::graph::GraphSnapshot;
use crate::models::RiskLevel;
use crate::risk::factors::{
    self, RiskFactors,
};

/// Risk assessment for one node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NodeRisk {
    pub score: f64,
    pub level: RiskLevel,
    pub factors: RiskFactors,
}

/// Risk for every node in a snapshot, indexed alongside it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskReport {
    pub per_node: Vec<NodeRisk>,
    pub centrality: Vec<f64>,
    /// True when centrality came from a sampled source set.
    pub approximate_centrality: bool,
}

impl RiskReport {
    pub fn levels(&self) -> Vec<RiskLevel> {
        self.per_node.iter().map(|n| n.level).collect()
    }
}

/// Blast-radius result for one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlastRadius {
    pub target: String,
    pub direct_callers: usize,
    /// Affected entity IDs in deterministic discovery order.
    pub affected: Vec<String>,
    pub blast_radius_score: f64,
    pub risk_level: RiskLevel,
    pub risk_factors: RiskFactors,
    pub recommendations: Vec<String>,
    /// True when the frontier cap stopped discovery early.
    pub truncated: bool,
}

pub struct RiskEngine<'a> {
    snapshot: &'a GraphSnapshot,
    config: &'a AnalysisConfig,
}

impl<'a> RiskEngine<'a> {
    pub fn new(snapshot: &'a GraphSnapshot, config: &'a AnalysisConfig) -> Self {
        Self { snapshot, config }
    }

    /// Score every node. Git-derived factors use the commit log and
    /// expertise report when present and degrade to their documented
    /// defaults otherwise.
    pub fn compute(
        &self,
        commit_log: Option<&CommitLog>,
        expertise: Option<&ExpertiseReport>,
        now: DateTime<Utc>,
    ) -> Result<RiskReport> {
        let node_count = self.snapshot.node_count();
        let (centrality, approximate) = self.centrality()?;
        let percentiles = percentile_ranks(self.snapshot, &centrality);

        let mut per_node = Vec::with_capacity(node_count);
        for (idx, entity) in self.snapshot.nodes().iter().enumerate() {
            let metrics = entity.complexity();
            let (in_degree, out_degree) = self.snapshot.structural_degree(idx as u32);
            let file = &entity.location.file;

            let coverage = if file.is_empty() {
                None
            } else {
                self.config.coverage.get(file).copied()
            };
            let commits_90d = commit_log
                .map(|log| log.recent_commit_count(file, 90, now))
                .unwrap_or(0);
            let bus_factor = expertise.and_then(|report| {
                let scores = report.scores_for(file);
                (!scores.is_empty()).then(|| report.bus_factor(file))
            });

            let factors = RiskFactors {
                complexity_risk: factors::complexity_risk(metrics.cyclomatic, metrics.cognitive),
                centrality_risk: percentiles[idx],
                test_coverage_risk: factors::test_coverage_risk(coverage),
                dependency_risk: factors::dependency_risk(in_degree, out_degree),
                change_frequency_risk: factors::change_frequency_risk(commits_90d),
                bus_factor_risk: factors::bus_factor_risk(bus_factor),
            };
            let score = factors.weighted_total();
            per_node.push(NodeRisk {
                score,
                level: RiskLevel::from_score(score),
                factors,
            });
        }

        info!(
            "risk scored {} nodes ({} approximate centrality)",
            node_count,
            if approximate { "with" } else { "without" }
        );
        Ok(RiskReport {
            per_node,
            centrality,
            approximate_centrality: approximate,
        })
    }

    fn centrality(&self) -> Result<(Vec<f64>, bool)> {
        let node_count = self.snapshot.node_count();
        let edges = self.snapshot.structural_edges();

        if node_count > self.config.centrality_sample_threshold {
            // Deterministic stride sample; no RNG so runs reproduce.
            let sample_size = self.config.centrality_sample_size.min(node_count).max(1);
            let stride = node_count / sample_size;
            let sources: Vec<u32> = (0..sample_size).map(|i| (i * stride) as u32).collect();
            debug!(
                "centrality sampling {} of {} sources",
                sources.len(),
                node_count
            );
            let scores =
                synapse_graph::betweenness_centrality_sampled(&edges, node_count, &sources)?;
            Ok((scores, true))
        } else {
            let scores = synapse_graph::betweenness_centrality(&edges, node_count)?;
            Ok((scores, false))
        }
    }

    /// Blast radius for `entity_id`: BFS over reverse structural edges with
    /// impact weights, capped by depth/frontier, deterministic in
    /// edge-insertion order.
    pub fn blast_radius(
        &self,
        report: &RiskReport,
        entity_id: &str,
        depth: Option<usize>,
        cancelled: &AtomicBool,
    ) -> Result<BlastRadius> {
        if entity_id.trim().is_empty() {
            return Err(SynapseError::Validation("empty target entity".into()));
        }
        let index = self
            .snapshot
            .node_index(entity_id)
            .ok_or_else(|| SynapseError::NotFound(format!("entity {entity_id}")))?;

        let opts = synapse_graph::ImpactOptions {
            max_depth: depth.unwrap_or(self.config.blast_max_depth),
            max_frontier: self.config.blast_max_frontier,
            min_impact: self.config.blast_min_impact,
        };
        let reverse_adj = self.snapshot.structural_reverse_adjacency();
        let impact = synapse_graph::reverse_impact(&reverse_adj, index, &opts, cancelled)?;

        let affected: Vec<String> = impact
            .nodes
            .iter()
            .map(|n| self.snapshot.node(n.node).id.clone())
            .collect();

        let node_risk = &report.per_node[index as usize];
        // Aggregate risk blends the node's own risk with how wide the
        // impact set is.
        let reach = (affected.len() as f64 / 25.0).min(1.0);
        let score = (0.5 * node_risk.score + 0.5 * reach).clamp(0.0, 1.0);
        let level = RiskLevel::from_score(score);

        Ok(BlastRadius {
            target: entity_id.to_string(),
            direct_callers: impact.direct_count,
            affected,
            blast_radius_score: score,
            risk_level: level,
            risk_factors: node_risk.factors,
            recommendations: recommendations(level, &node_risk.factors),
            truncated: impact.truncated,
        })
    }
}

/// Percentile rank of each node's centrality, ties broken by entity ID.
fn percentile_ranks(snapshot: &GraphSnapshot, centrality: &[f64]) -> Vec<f64> {
    let n = centrality.len();
    if n <= 1 {
        return vec![0.0; n];
    }
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        centrality[a]
            .partial_cmp(&centrality[b])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| snapshot.node(a as u32).id.cmp(&snapshot.node(b as u32).id))
    });

    let mut ranks = vec![0.0; n];
    for (rank, &idx) in order.iter().enumerate() {
        ranks[idx] = rank as f64 / (n - 1) as f64;
    }
    ranks
}

/// Fixed recommendation rubric keyed on (level, dominant factor).
fn recommendations(level: RiskLevel, factors: &RiskFactors) -> Vec<String> {
    let mut out = Vec::new();
    let (dominant, value) = factors.dominant();

    if level >= RiskLevel::High || value >= 0.7 {
        let primary = match dominant {
            "test_coverage_risk" => "Add unit tests before modifying this code.",
            "complexity_risk" => "Refactor to reduce complexity before making changes.",
            "centrality_risk" => "This is a critical path node; changes will have wide impact.",
            "dependency_risk" => "Many entities depend on this; coordinate the change broadly.",
            "change_frequency_risk" => {
                "This code churns frequently; expect conflicts and regressions."
            }
            "bus_factor_risk" => "Knowledge is concentrated; involve the module expert.",
            _ => "Review this change carefully before merging.",
        };
        out.push(primary.to_string());
    }

    // Secondary flags for any other factor that is itself severe.
    for (name, value) in factors.as_pairs() {
        if name == dominant || value < 0.7 {
            continue;
        }
        let note = match name {
            "test_coverage_risk" => "Test coverage is low here.",
            "complexity_risk" => "Complexity is high here.",
            "centrality_risk" => "This node sits on many shortest paths.",
            "dependency_risk" => "Dependency fan-in/out is high.",
            "change_frequency_risk" => "Change frequency is high.",
            "bus_factor_risk" => "Bus factor is low.",
            _ => continue,
        };
        out.push(note.to_string());
    }

    if out.is_empty() {
        out.push("Risk level acceptable for standard development workflow.".to_string());
    }
    out
}
