//! Analysis pipeline
//!
//! Orchestrates the full batch run:
//! 1. Walk source files (sorted by path)
//! 2. Parse in parallel, containing per-file failures
//! 3. Resolve names and build the graph snapshot
//! 4. Mine git history and score expertise
//! 5. Score risk
//! 6. Validate governance rules
//! 7. Condense for visualisation
//!
//! Stages are barriers: each starts only after its inputs are complete.
//! Cancellation is a shared flag checked at file, commit, and BFS-node
//! granularity; on cancel the run aborts with `ErrCancelled` and partial
//! results are discarded.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::errors::{ErrorRecord, Result, SynapseError};
use crate::expertise::{self, ExpertiseReport};
use crate::git::{CommitLog, HistoryMiner};
use crate::governance::{self, ArchitectureRules, GovernanceReport};
use crate::graph::{build_snapshot, condense, CondensedGraph, GraphSnapshot};
use crate::models::EntityKind;
use crate::parsers;
use crate::resolver::Resolver;
use crate::risk::{RiskEngine, RiskReport};

/// Snapshot version counter; each run gets a fresh monotonic version.
static VERSION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Run statistics and contained failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub files_parsed: usize,
    pub partial_failures: Vec<ErrorRecord>,
    pub entities: usize,
    pub relationships: usize,
    pub commits_mined: usize,
    pub developers: usize,
    pub elapsed_ms: u128,
}

/// Everything one analysis run produces. Immutable once built; queries
/// read it lock-free.
#[derive(Debug)]
pub struct AnalysisSnapshot {
    pub graph: GraphSnapshot,
    pub risk: RiskReport,
    pub commit_log: Option<CommitLog>,
    pub expertise: ExpertiseReport,
    pub rules: ArchitectureRules,
    pub governance: GovernanceReport,
    pub condensed: CondensedGraph,
    pub summary: RunSummary,
    pub repo_root: PathBuf,
}

/// Batch analysis pipeline.
pub struct Pipeline {
    config: AnalysisConfig,
    cancelled: Arc<AtomicBool>,
    mine_git: bool,
}

impl Pipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
            mine_git: true,
        }
    }

    /// Skip git mining; risk falls back to its documented defaults.
    pub fn without_git(mut self) -> Self {
        self.mine_git = false;
        self
    }

    /// Shared cancellation flag; raise it from another thread to abort.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    fn check_deadline(&self, started: Instant) -> Result<()> {
        if self.config.deadline_secs > 0
            && started.elapsed() > Duration::from_secs(self.config.deadline_secs)
        {
            self.cancelled.store(true, Ordering::Relaxed);
        }
        if self.cancelled.load(Ordering::Relaxed) {
            return Err(SynapseError::Cancelled);
        }
        Ok(())
    }

    /// Run the full pipeline over a repository.
    pub fn run(&self, repo_root: &Path) -> Result<AnalysisSnapshot> {
        let started = Instant::now();
        let now = Utc::now();
        let mut summary = RunSummary::default();

        // Stage 1: discovery, sorted for run-to-run determinism.
        let files = parsers::walk_repository(repo_root, &self.config)
            .map_err(|e| SynapseError::Validation(e.to_string()))?;
        info!("discovered {} source files", files.len());
        self.check_deadline(started)?;

        // Stage 2: parallel parse; per-file failures are contained.
        let timeout = Duration::from_secs(self.config.parse_timeout_secs);
        let cancelled = &self.cancelled;
        let parsed: Vec<parsers::ParsedFile> = files
            .par_iter()
            .map(|path| {
                if cancelled.load(Ordering::Relaxed) {
                    return parsers::ParsedFile::partial(
                        path.to_string_lossy().to_string(),
                        "cancelled",
                    );
                }
                parsers::parse_file(repo_root, path, timeout)
            })
            .collect();
        self.check_deadline(started)?;

        summary.files_parsed = parsed.len();
        for file in &parsed {
            if let Some(reason) = &file.parse_error {
                summary.partial_failures.push(ErrorRecord::from(
                    &SynapseError::PartialParse {
                        file: file.path.clone(),
                        reason: reason.clone(),
                    },
                ));
            }
        }
        if !summary.partial_failures.is_empty() {
            warn!(
                "{} of {} files parsed partially",
                summary.partial_failures.len(),
                parsed.len()
            );
        }

        // Stage 3: resolution and graph build.
        let resolved = Resolver::new(&parsed).resolve();
        summary.entities = resolved.entities.len();
        summary.relationships = resolved.relationships.len();
        let version = VERSION_COUNTER.fetch_add(1, Ordering::Relaxed);
        let graph = build_snapshot(resolved, version);
        info!(
            "graph v{}: {} nodes, {} edges",
            version,
            graph.node_count(),
            graph.edge_count()
        );
        self.check_deadline(started)?;

        // Governance rules load early: the miner needs layer-entry globs.
        let rules = ArchitectureRules::load(repo_root);

        // Stage 4: git mining and expertise. A missing or unreadable
        // repository is contained, not fatal.
        let commit_log = if self.mine_git {
            match HistoryMiner::open(repo_root) {
                Ok(miner) => {
                    let layer_globs = rules.layer_entry_globs().ok();
                    match miner.mine_at(
                        self.config.history_window_days,
                        layer_globs.as_ref(),
                        &self.cancelled,
                        now,
                    ) {
                        Ok(log) => Some(log),
                        Err(SynapseError::Cancelled) => return Err(SynapseError::Cancelled),
                        Err(e) => {
                            warn!("git mining failed: {e}");
                            None
                        }
                    }
                }
                Err(e) => {
                    warn!("git history unavailable: {e}");
                    None
                }
            }
        } else {
            None
        };
        if let Some(log) = &commit_log {
            summary.commits_mined = log.commits.len();
            summary.developers = log.developers.len();
        }
        self.check_deadline(started)?;

        let expertise = match &commit_log {
            Some(log) => expertise::score_repository(log, &Default::default(), now),
            None => ExpertiseReport::default(),
        };

        // Stage 5: risk over the frozen graph.
        let engine = RiskEngine::new(&graph, &self.config);
        let risk = engine.compute(commit_log.as_ref(), Some(&expertise), now)?;
        self.check_deadline(started)?;

        // Stage 6: governance over the import edges.
        let module_paths: Vec<String> = graph
            .nodes()
            .iter()
            .filter(|n| n.kind() == EntityKind::Module)
            .map(|n| n.id.clone())
            .collect();
        let edges =
            governance::validate_imports(&rules, &governance::import_edges(&graph), &module_paths);

        // Stage 7: condensed projection.
        let condensed = condense(&graph, &risk.levels());

        summary.elapsed_ms = started.elapsed().as_millis();
        info!(
            "analysis complete in {}ms: {} entities, {} commits",
            summary.elapsed_ms, summary.entities, summary.commits_mined
        );

        Ok(AnalysisSnapshot {
            graph,
            risk,
            commit_log,
            expertise,
            rules,
            governance: edges,
            condensed,
            summary,
            repo_root: repo_root.to_path_buf(),
        })
    }
}
