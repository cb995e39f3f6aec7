//! Commit-history extraction and classification using libgit2.
//!
//! Iterates the commit log in reverse-chronological order, gathers per-file
//! line stats, merges author identities by email, and classifies each
//! commit as bugfix / refactor / architectural / routine. Classification is
//! deterministic given commit metadata plus the diff.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use chrono::{DateTime, Duration, TimeZone, Utc};
use git2::{Delta, Repository, Sort};
use globset::GlobSet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{Result, SynapseError};
use crate::models::normalize_path;

fn bugfix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\b(fix|bug|issue|hotfix)\b").expect("valid regex"))
}

fn refactor_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(refactor|clean ?up|restructure|rename)\b").expect("valid regex")
    })
}

/// How many top-level modules a commit must touch to read as architectural.
const ARCHITECTURAL_MODULE_SPREAD: usize = 3;
/// Balanced add/delete threshold for the refactor shape heuristic.
const REFACTOR_BALANCE_TOLERANCE: f64 = 0.2;
const REFACTOR_MIN_LINES: usize = 50;

/// Deterministic classification of a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitClass {
    Bugfix,
    Refactor,
    Architectural,
    Routine,
}

/// Per-file line stats within one commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub lines_added: usize,
    pub lines_deleted: usize,
}

impl FileChange {
    pub fn total(&self) -> usize {
        self.lines_added + self.lines_deleted
    }
}

/// One mined commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    pub hash: String,
    pub author_name: String,
    /// Author identity; different names under one email merge.
    pub author_email: String,
    pub timestamp: DateTime<Utc>,
    /// First line of the commit message.
    pub message: String,
    pub classification: CommitClass,
    /// Normalised path -> line stats, sorted for determinism.
    pub files: BTreeMap<String, FileChange>,
}

impl CommitRecord {
    pub fn lines_added(&self) -> usize {
        self.files.values().map(|f| f.lines_added).sum()
    }

    pub fn lines_deleted(&self) -> usize {
        self.files.values().map(|f| f.lines_deleted).sum()
    }
}

/// Email-keyed developer profile derived from mined commits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeveloperProfile {
    pub email: String,
    /// All names observed under this email.
    pub names: BTreeSet<String>,
    pub total_commits: usize,
    pub first_activity: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
}

impl DeveloperProfile {
    /// Deterministic display name among those observed for this email.
    pub fn display_name(&self) -> &str {
        self.names.iter().next_back().map(String::as_str).unwrap_or(&self.email)
    }
}

/// Everything mined from the repository in one run. Append-only while
/// mining, then frozen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitLog {
    /// Reverse-chronological commit records.
    pub commits: Vec<CommitRecord>,
    pub developers: BTreeMap<String, DeveloperProfile>,
}

impl CommitLog {
    /// Commits touching `file`, newest first.
    pub fn commits_for_file<'a>(&'a self, file: &'a str) -> impl Iterator<Item = &'a CommitRecord> {
        self.commits.iter().filter(move |c| c.files.contains_key(file))
    }

    /// Commits touching `file` within the last `days` before `now`.
    pub fn recent_commit_count(&self, file: &str, days: i64, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::days(days);
        self.commits_for_file(file)
            .filter(|c| c.timestamp >= cutoff)
            .count()
    }
}

/// Mines a repository's commit history.
pub struct HistoryMiner {
    repo: Repository,
}

impl HistoryMiner {
    /// Open a repository at or above `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path).map_err(|e| {
            SynapseError::NotFound(format!("no git repository at {}: {e}", path.display()))
        })?;
        debug!("opened git repository at {:?}", repo.path());
        Ok(Self { repo })
    }

    pub fn is_git_repo(path: &Path) -> bool {
        Repository::discover(path).is_ok()
    }

    /// Mine the commit log.
    ///
    /// `window_days` bounds history (0 = unbounded). `layer_globs`, when
    /// present, feeds the architectural classification: a commit adding or
    /// removing files that match a layer-entry glob is architectural.
    /// Cancellation is checked per commit.
    pub fn mine(
        &self,
        window_days: i64,
        layer_globs: Option<&GlobSet>,
        cancelled: &AtomicBool,
    ) -> Result<CommitLog> {
        self.mine_at(window_days, layer_globs, cancelled, Utc::now())
    }

    /// Same as [`mine`](Self::mine) with an explicit clock, for tests.
    pub fn mine_at(
        &self,
        window_days: i64,
        layer_globs: Option<&GlobSet>,
        cancelled: &AtomicBool,
        now: DateTime<Utc>,
    ) -> Result<CommitLog> {
        let mut log = CommitLog::default();
        let cutoff = (window_days > 0).then(|| now - Duration::days(window_days));

        let mut revwalk = self
            .repo
            .revwalk()
            .map_err(|e| SynapseError::Config(format!("revwalk: {e}")))?;
        revwalk
            .set_sorting(Sort::TIME)
            .map_err(|e| SynapseError::Config(format!("revwalk sort: {e}")))?;
        if revwalk.push_head().is_err() {
            // Empty repository: nothing to mine.
            return Ok(log);
        }

        for oid in revwalk {
            if cancelled.load(Ordering::Relaxed) {
                return Err(SynapseError::Cancelled);
            }

            let oid = match oid {
                Ok(oid) => oid,
                Err(e) => {
                    warn!("skipping unreadable commit: {e}");
                    continue;
                }
            };
            let commit = match self.repo.find_commit(oid) {
                Ok(c) => c,
                Err(e) => {
                    warn!("skipping commit {oid}: {e}");
                    continue;
                }
            };

            let timestamp = Utc
                .timestamp_opt(commit.time().seconds(), 0)
                .single()
                .unwrap_or_else(|| Utc.timestamp_opt(0, 0).single().expect("epoch"));
            if let Some(cutoff) = cutoff {
                if timestamp < cutoff {
                    // Time-sorted walk: everything older follows.
                    break;
                }
            }

            match self.extract_record(&commit, timestamp, layer_globs) {
                Ok(record) => {
                    let profile = log
                        .developers
                        .entry(record.author_email.clone())
                        .or_insert_with(|| DeveloperProfile {
                            email: record.author_email.clone(),
                            ..Default::default()
                        });
                    profile.names.insert(record.author_name.clone());
                    profile.total_commits += 1;
                    profile.first_activity = Some(match profile.first_activity {
                        Some(first) => first.min(record.timestamp),
                        None => record.timestamp,
                    });
                    profile.last_activity = Some(match profile.last_activity {
                        Some(last) => last.max(record.timestamp),
                        None => record.timestamp,
                    });
                    log.commits.push(record);
                }
                Err(e) => warn!("skipping commit {oid}: {e}"),
            }
        }

        Ok(log)
    }

    fn extract_record(
        &self,
        commit: &git2::Commit,
        timestamp: DateTime<Utc>,
        layer_globs: Option<&GlobSet>,
    ) -> Result<CommitRecord> {
        let author = commit.author();
        let message = commit
            .message()
            .unwrap_or("")
            .lines()
            .next()
            .unwrap_or("")
            .to_string();

        let parent_tree = commit.parent(0).ok().map(|p| p.tree()).transpose().ok().flatten();
        let tree = commit
            .tree()
            .map_err(|e| SynapseError::Config(format!("commit tree: {e}")))?;
        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
            .map_err(|e| SynapseError::Config(format!("diff: {e}")))?;

        // Two passes over the diff: deltas first (file set, add/remove
        // status), then line stats. A single foreach would need both
        // callbacks borrowing the same map.
        let mut files: BTreeMap<String, FileChange> = BTreeMap::new();
        let mut touches_layer_entry = false;

        diff.foreach(
            &mut |delta, _| {
                if let Some(path) = delta.new_file().path().or_else(|| delta.old_file().path()) {
                    let normalized = normalize_path(&path.to_string_lossy());
                    files.entry(normalized.clone()).or_default();
                    if matches!(delta.status(), Delta::Added | Delta::Deleted) {
                        if let Some(globs) = layer_globs {
                            if globs.is_match(&normalized) {
                                touches_layer_entry = true;
                            }
                        }
                    }
                }
                true
            },
            None,
            None,
            None,
        )
        .map_err(|e| SynapseError::Config(format!("diff walk: {e}")))?;

        diff.foreach(
            &mut |_, _| true,
            None,
            None,
            Some(&mut |delta, _, line| {
                if let Some(path) = delta.new_file().path().or_else(|| delta.old_file().path()) {
                    let normalized = normalize_path(&path.to_string_lossy());
                    let entry = files.entry(normalized).or_default();
                    match line.origin() {
                        '+' => entry.lines_added += 1,
                        '-' => entry.lines_deleted += 1,
                        _ => {}
                    }
                }
                true
            }),
        )
        .map_err(|e| SynapseError::Config(format!("diff lines: {e}")))?;

        let classification = classify_commit(&message, &files, touches_layer_entry);

        Ok(CommitRecord {
            hash: commit.id().to_string(),
            author_name: author.name().unwrap_or("Unknown").to_string(),
            author_email: author.email().unwrap_or("unknown").to_lowercase(),
            timestamp,
            message,
            classification,
            files,
        })
    }
}

/// Classify a commit from its message and per-file stats. Checks run in
/// order: bugfix, refactor, architectural, routine.
pub fn classify_commit(
    message: &str,
    files: &BTreeMap<String, FileChange>,
    touches_layer_entry: bool,
) -> CommitClass {
    if bugfix_pattern().is_match(message) {
        return CommitClass::Bugfix;
    }

    if refactor_pattern().is_match(message) || has_refactor_shape(files) {
        return CommitClass::Refactor;
    }

    let top_level_modules: BTreeSet<&str> = files
        .keys()
        .map(|path| path.split('/').next().unwrap_or(path.as_str()))
        .collect();
    if top_level_modules.len() >= ARCHITECTURAL_MODULE_SPREAD || touches_layer_entry {
        return CommitClass::Architectural;
    }

    CommitClass::Routine
}

/// Balanced add/delete on a substantially changed file reads as a refactor
/// even without the keyword.
fn has_refactor_shape(files: &BTreeMap<String, FileChange>) -> bool {
    files.values().any(|change| {
        let total = change.total();
        if total < REFACTOR_MIN_LINES {
            return false;
        }
        let added = change.lines_added as f64;
        let deleted = change.lines_deleted as f64;
        let larger = added.max(deleted);
        larger > 0.0 && (added - deleted).abs() <= REFACTOR_BALANCE_TOLERANCE * larger
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn change(added: usize, deleted: usize) -> FileChange {
        FileChange {
            lines_added: added,
            lines_deleted: deleted,
        }
    }

    fn single(path: &str, added: usize, deleted: usize) -> BTreeMap<String, FileChange> {
        BTreeMap::from([(path.to_string(), change(added, deleted))])
    }

    #[test]
    fn test_bugfix_classification_wins() {
        let files = single("src/a.py", 100, 100);
        assert_eq!(
            classify_commit("Fix crash on empty input", &files, false),
            CommitClass::Bugfix
        );
        assert_eq!(
            classify_commit("HOTFIX: rollback", &files, false),
            CommitClass::Bugfix
        );
        // Word boundary: "prefix" must not match.
        assert_eq!(
            classify_commit("prefix the keys", &single("a.py", 1, 0), false),
            CommitClass::Routine
        );
    }

    #[test]
    fn test_refactor_by_keyword() {
        assert_eq!(
            classify_commit("Refactor parser internals", &single("a.py", 5, 1), false),
            CommitClass::Refactor
        );
        assert_eq!(
            classify_commit("clean up imports", &single("a.py", 2, 2), false),
            CommitClass::Refactor
        );
        assert_eq!(
            classify_commit("cleanup imports", &single("a.py", 2, 2), false),
            CommitClass::Refactor
        );
    }

    #[test]
    fn test_refactor_by_shape() {
        // 100 added / 95 deleted on one file: balanced within 20%.
        assert_eq!(
            classify_commit("improve things", &single("a.py", 100, 95), false),
            CommitClass::Refactor
        );
        // Below the 50-line bar the shape heuristic stays quiet.
        assert_eq!(
            classify_commit("improve things", &single("a.py", 20, 20), false),
            CommitClass::Routine
        );
        // Heavily additive changes are not refactors.
        assert_eq!(
            classify_commit("add feature", &single("a.py", 200, 10), false),
            CommitClass::Routine
        );
    }

    #[test]
    fn test_architectural_by_module_spread() {
        let files = BTreeMap::from([
            ("api/a.py".to_string(), change(5, 0)),
            ("service/b.py".to_string(), change(5, 0)),
            ("data/c.py".to_string(), change(5, 0)),
        ]);
        assert_eq!(
            classify_commit("wire together", &files, false),
            CommitClass::Architectural
        );
    }

    #[test]
    fn test_architectural_by_layer_entry() {
        assert_eq!(
            classify_commit("new module", &single("api/new.py", 10, 0), true),
            CommitClass::Architectural
        );
    }

    #[test]
    fn test_routine_fallback() {
        assert_eq!(
            classify_commit("update readme note", &single("a.py", 3, 1), false),
            CommitClass::Routine
        );
    }

    // Temp-repo helpers in the style of the git2 test suite.
    fn create_test_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = Repository::init(dir.path()).expect("init repo");
        {
            let mut config = repo.config().expect("config");
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }
        (dir, repo)
    }

    fn commit_file(
        repo: &Repository,
        workdir: &Path,
        file: &str,
        contents: &str,
        message: &str,
    ) {
        let file_path = workdir.join(file);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&file_path, contents).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(file)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = repo.signature().unwrap();

        let parent = repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap();
    }

    #[test]
    fn test_mine_orders_and_profiles() {
        let (dir, repo) = create_test_repo();
        commit_file(&repo, dir.path(), "a.py", "x = 1\n", "initial import");
        commit_file(&repo, dir.path(), "a.py", "x = 2\n", "fix wrong constant");

        let miner = HistoryMiner::open(dir.path()).unwrap();
        let log = miner
            .mine(365, None, &AtomicBool::new(false))
            .unwrap();

        assert_eq!(log.commits.len(), 2);
        // Reverse-chronological: the fix comes first.
        assert_eq!(log.commits[0].message, "fix wrong constant");
        assert_eq!(log.commits[0].classification, CommitClass::Bugfix);
        assert_eq!(log.commits[0].files.len(), 1);
        assert!(log.commits[0].files.contains_key("a.py"));

        let profile = log.developers.get("test@example.com").unwrap();
        assert_eq!(profile.total_commits, 2);
        assert!(profile.names.contains("Test User"));
        assert!(profile.first_activity.unwrap() <= profile.last_activity.unwrap());
    }

    #[test]
    fn test_mine_counts_lines() {
        let (dir, repo) = create_test_repo();
        commit_file(&repo, dir.path(), "a.py", "one\ntwo\nthree\n", "start");
        commit_file(&repo, dir.path(), "a.py", "one\nTWO\nthree\nfour\n", "edit");

        let miner = HistoryMiner::open(dir.path()).unwrap();
        let log = miner.mine(365, None, &AtomicBool::new(false)).unwrap();

        let edit = &log.commits[0];
        let stats = edit.files.get("a.py").unwrap();
        assert_eq!(stats.lines_added, 2);
        assert_eq!(stats.lines_deleted, 1);
    }

    #[test]
    fn test_mine_respects_cancellation() {
        let (dir, repo) = create_test_repo();
        commit_file(&repo, dir.path(), "a.py", "x = 1\n", "start");

        let miner = HistoryMiner::open(dir.path()).unwrap();
        let cancelled = AtomicBool::new(true);
        let result = miner.mine(365, None, &cancelled);
        assert!(matches!(result, Err(SynapseError::Cancelled)));
    }

    #[test]
    fn test_open_non_repo_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!HistoryMiner::is_git_repo(dir.path()));
        assert!(HistoryMiner::open(dir.path()).is_err());
    }

    #[test]
    fn test_recent_commit_count_window() {
        let now = Utc::now();
        let mut log = CommitLog::default();
        for (days_ago, msg) in [(10, "a"), (120, "b")] {
            log.commits.push(CommitRecord {
                hash: msg.to_string(),
                author_name: "T".into(),
                author_email: "t@example.com".into(),
                timestamp: now - Duration::days(days_ago),
                message: msg.into(),
                classification: CommitClass::Routine,
                files: BTreeMap::from([("a.py".to_string(), change(1, 0))]),
            });
        }
        assert_eq!(log.recent_commit_count("a.py", 90, now), 1);
        assert_eq!(log.recent_commit_count("a.py", 365, now), 2);
        assert_eq!(log.recent_commit_count("b.py", 90, now), 0);
    }
}
