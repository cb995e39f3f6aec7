//! The seven weighted expertise factors.
//!
//! Every factor is normalised to [0, 1]. Share factors (refactor depth,
//! architectural changes, bug fixes) are the developer's slice of the
//! *file's* activity of that class, so a developer's factor never drops
//! when their own commit set grows; recency decays with
//! `exp(-days_since_last_commit / 90)` when no new commits arrive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::git::{CommitClass, CommitRecord};

/// (name, weight) pairs; weights sum to 1.0.
pub const FACTOR_WEIGHTS: [(&str, f64); 7] = [
    ("commit_frequency", 0.15),
    ("lines_changed", 0.10),
    ("refactor_depth", 0.25),
    ("architectural_changes", 0.20),
    ("bug_fixes", 0.15),
    ("recency", 0.10),
    ("code_review_participation", 0.05),
];

/// Recency half-scale in days.
const RECENCY_DECAY_DAYS: f64 = 90.0;

/// Count/lines split inside the refactor-depth factor.
const REFACTOR_COUNT_SHARE: f64 = 0.4;
const REFACTOR_LINES_SHARE: f64 = 0.6;

/// Per-file activity totals across all developers, used to normalise the
/// per-developer factors.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FileActivity {
    pub total_commits: usize,
    pub total_lines: usize,
    pub refactor_commits: usize,
    pub refactor_lines: usize,
    pub architectural_commits: usize,
    pub bugfix_commits: usize,
}

impl FileActivity {
    /// Tally the activity on one file from its commit records.
    pub fn from_commits<'a>(
        file: &str,
        commits: impl Iterator<Item = &'a CommitRecord>,
    ) -> Self {
        let mut activity = FileActivity::default();
        for commit in commits {
            let Some(change) = commit.files.get(file) else {
                continue;
            };
            activity.total_commits += 1;
            activity.total_lines += change.total();
            match commit.classification {
                CommitClass::Refactor => {
                    activity.refactor_commits += 1;
                    activity.refactor_lines += change.total();
                }
                CommitClass::Architectural => activity.architectural_commits += 1,
                CommitClass::Bugfix => activity.bugfix_commits += 1,
                CommitClass::Routine => {}
            }
        }
        activity
    }
}

/// The seven factor values for one (developer, file) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorScores {
    pub commit_frequency: f64,
    pub lines_changed: f64,
    pub refactor_depth: f64,
    pub architectural_changes: f64,
    pub bug_fixes: f64,
    pub recency: f64,
    pub code_review_participation: f64,
}

impl FactorScores {
    /// Compute the factors for one developer's commits on a file.
    ///
    /// `dev_commits` must already be filtered to this developer and touch
    /// `file`. `review_signal` is the externally supplied review score, 0
    /// when unavailable.
    pub fn compute(
        file: &str,
        dev_commits: &[&CommitRecord],
        activity: &FileActivity,
        review_signal: f64,
        now: DateTime<Utc>,
    ) -> Self {
        let mut dev = FileActivity::default();
        let mut last_commit: Option<DateTime<Utc>> = None;
        for commit in dev_commits {
            let Some(change) = commit.files.get(file) else {
                continue;
            };
            dev.total_commits += 1;
            dev.total_lines += change.total();
            match commit.classification {
                CommitClass::Refactor => {
                    dev.refactor_commits += 1;
                    dev.refactor_lines += change.total();
                }
                CommitClass::Architectural => dev.architectural_commits += 1,
                CommitClass::Bugfix => dev.bugfix_commits += 1,
                CommitClass::Routine => {}
            }
            last_commit = Some(match last_commit {
                Some(latest) => latest.max(commit.timestamp),
                None => commit.timestamp,
            });
        }

        let share = |part: usize, whole: usize| -> f64 {
            if whole == 0 {
                0.0
            } else {
                (part as f64 / whole as f64).min(1.0)
            }
        };

        let refactor_depth = if activity.refactor_commits == 0 {
            0.0
        } else {
            REFACTOR_COUNT_SHARE * share(dev.refactor_commits, activity.refactor_commits)
                + REFACTOR_LINES_SHARE * share(dev.refactor_lines, activity.refactor_lines)
        };

        let recency = match last_commit {
            Some(last) => {
                let days = (now - last).num_seconds().max(0) as f64 / 86_400.0;
                (-days / RECENCY_DECAY_DAYS).exp().clamp(0.0, 1.0)
            }
            None => 0.0,
        };

        FactorScores {
            commit_frequency: share(dev.total_commits, activity.total_commits),
            lines_changed: share(dev.total_lines, activity.total_lines),
            refactor_depth,
            architectural_changes: share(dev.architectural_commits, activity.architectural_commits),
            bug_fixes: share(dev.bugfix_commits, activity.bugfix_commits),
            recency,
            code_review_participation: review_signal.clamp(0.0, 1.0),
        }
    }

    /// Weighted total in [0, 1].
    pub fn weighted_total(&self) -> f64 {
        let values = self.as_pairs();
        values
            .iter()
            .zip(FACTOR_WEIGHTS.iter())
            .map(|((_, value), (_, weight))| value * weight)
            .sum::<f64>()
            .min(1.0)
    }

    /// Factor with the highest raw value; ties keep table order.
    pub fn dominant(&self) -> (&'static str, f64) {
        self.as_pairs()
            .into_iter()
            .fold(("commit_frequency", f64::MIN), |best, (name, value)| {
                if value > best.1 {
                    (name, value)
                } else {
                    best
                }
            })
    }

    pub fn as_pairs(&self) -> [(&'static str, f64); 7] {
        [
            ("commit_frequency", self.commit_frequency),
            ("lines_changed", self.lines_changed),
            ("refactor_depth", self.refactor_depth),
            ("architectural_changes", self.architectural_changes),
            ("bug_fixes", self.bug_fixes),
            ("recency", self.recency),
            ("code_review_participation", self.code_review_participation),
        ]
    }
}
