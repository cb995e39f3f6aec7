//! Engine configuration and repository discovery.
//!
//! Governance layer rules have their own loader in `governance::rules`;
//! this module holds the analysis knobs shared across pipeline stages and
//! the repository-root discovery used by the CLI.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::errors::{Result, SynapseError};

/// Environment variable overriding repository-root discovery.
pub const REPO_ROOT_ENV: &str = "SYNAPSE_REPO_ROOT";

/// Tunable knobs for an analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Include globs for source files (empty = all supported files).
    pub include: Vec<String>,
    /// Exclude globs applied after includes.
    pub exclude: Vec<String>,
    /// Soft per-file parse timeout in seconds.
    pub parse_timeout_secs: u64,
    /// Overall pipeline deadline in seconds (0 = none).
    pub deadline_secs: u64,
    /// Above this node count, centrality switches to sampled sources.
    pub centrality_sample_threshold: usize,
    /// Number of sampled sources for approximate centrality.
    pub centrality_sample_size: usize,
    /// Commit-history cutoff window in days.
    pub history_window_days: i64,
    /// Blast-radius traversal depth limit.
    pub blast_max_depth: usize,
    /// Blast-radius frontier limit.
    pub blast_max_frontier: usize,
    /// Blast-radius minimum impact weight.
    pub blast_min_impact: f64,
    /// Optional external coverage signal, path -> covered fraction in [0,1].
    pub coverage: BTreeMap<String, f64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            include: vec![],
            exclude: vec![
                "**/.git/**".into(),
                "**/__pycache__/**".into(),
                "**/venv/**".into(),
                "**/.venv/**".into(),
                "**/node_modules/**".into(),
                "**/target/**".into(),
            ],
            parse_timeout_secs: 30,
            deadline_secs: 0,
            centrality_sample_threshold: 2_000,
            centrality_sample_size: 256,
            history_window_days: 365,
            blast_max_depth: 5,
            blast_max_frontier: 500,
            blast_min_impact: 0.1,
            coverage: BTreeMap::new(),
        }
    }
}

impl AnalysisConfig {
    /// Load an external coverage map (JSON object of path -> fraction).
    /// Missing or malformed files leave coverage unknown with a warning.
    pub fn with_coverage_file(mut self, path: &Path) -> Self {
        match load_coverage(path) {
            Ok(map) => self.coverage = map,
            Err(e) => warn!("ignoring coverage file {}: {}", path.display(), e),
        }
        self
    }
}

#[derive(Deserialize)]
struct CoverageFile(BTreeMap<String, f64>);

fn load_coverage(path: &Path) -> Result<BTreeMap<String, f64>> {
    let raw = std::fs::read_to_string(path)?;
    let parsed: CoverageFile = serde_json::from_str(&raw)
        .map_err(|e| SynapseError::Config(format!("coverage file: {e}")))?;
    let normalized = parsed
        .0
        .into_iter()
        .map(|(k, v)| (crate::models::normalize_path(&k), v.clamp(0.0, 1.0)))
        .collect();
    Ok(normalized)
}

/// Locate the repository root.
///
/// `SYNAPSE_REPO_ROOT` wins when set; otherwise walk upward from `start`
/// looking for a `.git` directory.
pub fn discover_repo_root(start: &Path) -> Result<PathBuf> {
    if let Ok(root) = std::env::var(REPO_ROOT_ENV) {
        let path = PathBuf::from(root);
        if path.is_dir() {
            return Ok(path);
        }
        return Err(SynapseError::Config(format!(
            "{REPO_ROOT_ENV} points to a missing directory: {}",
            path.display()
        )));
    }

    let mut current = start.canonicalize().map_err(SynapseError::Io)?;
    loop {
        if current.join(".git").is_dir() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(SynapseError::NotFound(format!(
                "no .git directory above {}",
                start.display()
            )));
        }
    }
}
