//! Expertise scores, bus factor, knowledge gaps and the heatmap.
//!
//! Converts the mined commit log into per-(developer, file) scores, then
//! derives the file-level bus factor (smallest k whose top-k developers
//! cover half the summed score) and per-module aggregates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::expertise::factors::{FactorScores, FileActivity};
use crate::git::{CommitLog, CommitRecord};

/// Score below which a developer does not count as an expert.
const EXPERT_SCORE_THRESHOLD: f64 = 0.3;
/// Bus factor at or below this is flagged as a risk area.
pub const BUS_FACTOR_WARNING_THRESHOLD: usize = 2;
/// Commits needed for full confidence in a score.
const FULL_CONFIDENCE_COMMITS: f64 = 10.0;

/// Expertise of one developer on one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpertiseScore {
    pub developer_email: String,
    pub developer_name: String,
    pub file: String,
    pub factors: FactorScores,
    /// Weighted total in [0, 1].
    pub total: f64,
    /// min(1, commits/10).
    pub confidence: f64,
    pub commit_count: usize,
}

/// Expert lookup result for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpertRecommendation {
    pub target: String,
    /// `(name, email)` of the top developer, if any.
    pub primary_expert: Option<(String, String)>,
    pub score: Option<f64>,
    pub secondary_experts: Vec<(String, String, f64)>,
    pub bus_factor: usize,
    pub recommendation_text: String,
}

/// Aggregate expertise for one top-level module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleExpertise {
    pub bus_factor: usize,
    /// Developers with a score >= 0.3 on some file in the module.
    pub expert_count: usize,
    pub file_count: usize,
    pub has_knowledge_gap: bool,
}

/// Expertise distribution across the codebase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Heatmap {
    pub modules: BTreeMap<String, ModuleExpertise>,
    /// Modules with bus factor <= 2.
    pub risk_areas: Vec<String>,
    pub average_bus_factor: f64,
}

/// All expertise derived for one analysis run. Rebuilt with the commit log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpertiseReport {
    /// File -> scores sorted by total descending (ties by email).
    pub by_file: BTreeMap<String, Vec<ExpertiseScore>>,
}

impl ExpertiseReport {
    pub fn scores_for(&self, file: &str) -> &[ExpertiseScore] {
        self.by_file.get(file).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Smallest k such that the top-k developers cover >= 0.5 of the summed
    /// score on the file; 0 when the file has no scores.
    pub fn bus_factor(&self, file: &str) -> usize {
        bus_factor_of(self.scores_for(file))
    }

    /// A file has a knowledge gap when its bus factor is <= 1 or nobody
    /// reaches the expert threshold.
    pub fn has_knowledge_gap(&self, file: &str) -> bool {
        let scores = self.scores_for(file);
        if scores.is_empty() {
            return true;
        }
        let max = scores.first().map(|s| s.total).unwrap_or(0.0);
        self.bus_factor(file) <= 1 || max < EXPERT_SCORE_THRESHOLD
    }

    /// Files with a knowledge gap, sorted.
    pub fn knowledge_gaps(&self) -> Vec<String> {
        self.by_file
            .keys()
            .filter(|file| self.has_knowledge_gap(file))
            .cloned()
            .collect()
    }

    /// All files a developer has scores on, best first.
    pub fn developer_expertise(&self, email: &str) -> Vec<(String, f64)> {
        let mut areas: Vec<(String, f64)> = self
            .by_file
            .iter()
            .filter_map(|(file, scores)| {
                scores
                    .iter()
                    .find(|s| s.developer_email == email)
                    .map(|s| (file.clone(), s.total))
            })
            .collect();
        areas.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        areas
    }

    /// Expert recommendation for one file.
    pub fn expert_for(&self, file: &str) -> ExpertRecommendation {
        let scores = self.scores_for(file);
        let Some(primary) = scores.first() else {
            return ExpertRecommendation {
                target: file.to_string(),
                primary_expert: None,
                score: None,
                secondary_experts: vec![],
                bus_factor: 0,
                recommendation_text: format!("No commit history found for {file}"),
            };
        };

        let secondary = scores
            .iter()
            .skip(1)
            .take(3)
            .map(|s| (s.developer_name.clone(), s.developer_email.clone(), s.total))
            .collect();

        ExpertRecommendation {
            target: file.to_string(),
            primary_expert: Some((primary.developer_name.clone(), primary.developer_email.clone())),
            score: Some(primary.total),
            secondary_experts: secondary,
            bus_factor: self.bus_factor(file),
            recommendation_text: recommendation_text(primary),
        }
    }

    /// Per top-level module aggregates.
    pub fn heatmap(&self) -> Heatmap {
        let mut module_files: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for file in self.by_file.keys() {
            let module = file.split('/').next().unwrap_or(file).to_string();
            module_files.entry(module).or_default().push(file);
        }

        let mut heatmap = Heatmap::default();
        let mut bus_factor_sum = 0usize;

        for (module, files) in &module_files {
            // Aggregate per-developer scores across the module's files.
            let mut aggregated: BTreeMap<&str, f64> = BTreeMap::new();
            let mut experts: BTreeMap<&str, f64> = BTreeMap::new();
            let mut any_gap = false;
            for file in files {
                for score in self.scores_for(file) {
                    *aggregated.entry(&score.developer_email).or_default() += score.total;
                    let best = experts.entry(&score.developer_email).or_default();
                    *best = best.max(score.total);
                }
                if self.has_knowledge_gap(file) {
                    any_gap = true;
                }
            }

            let mut totals: Vec<f64> = aggregated.values().copied().collect();
            totals.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
            let bus_factor = bus_factor_of_totals(&totals);
            let expert_count = experts
                .values()
                .filter(|&&best| best >= EXPERT_SCORE_THRESHOLD)
                .count();

            bus_factor_sum += bus_factor;
            if bus_factor <= BUS_FACTOR_WARNING_THRESHOLD {
                heatmap.risk_areas.push(module.clone());
            }
            heatmap.modules.insert(
                module.clone(),
                ModuleExpertise {
                    bus_factor,
                    expert_count,
                    file_count: files.len(),
                    has_knowledge_gap: any_gap,
                },
            );
        }

        if !heatmap.modules.is_empty() {
            heatmap.average_bus_factor = bus_factor_sum as f64 / heatmap.modules.len() as f64;
        }
        heatmap
    }

    /// Module path -> bus factor, for the bus-factor summary query.
    pub fn bus_factor_analysis(&self) -> BTreeMap<String, usize> {
        self.heatmap()
            .modules
            .into_iter()
            .map(|(module, expertise)| (module, expertise.bus_factor))
            .collect()
    }
}

fn bus_factor_of(scores: &[ExpertiseScore]) -> usize {
    let totals: Vec<f64> = scores.iter().map(|s| s.total).collect();
    bus_factor_of_totals(&totals)
}

/// `totals` must be sorted descending.
fn bus_factor_of_totals(totals: &[f64]) -> usize {
    let sum: f64 = totals.iter().sum();
    if sum <= 0.0 {
        return 0;
    }
    let mut covered = 0.0;
    for (i, total) in totals.iter().enumerate() {
        covered += total;
        if covered >= 0.5 * sum {
            return i + 1;
        }
    }
    totals.len()
}

fn recommendation_text(score: &ExpertiseScore) -> String {
    let name = score
        .developer_name
        .split_whitespace()
        .next()
        .unwrap_or(&score.developer_name)
        .to_string();
    let factors = &score.factors;

    if factors.architectural_changes > 0.5 {
        format!("Ask {name}, they architected this module")
    } else if factors.refactor_depth > 0.5 {
        format!("Ask {name}, they deeply refactored this code")
    } else if factors.bug_fixes > 0.5 {
        format!("Ask {name}, they've fixed many bugs here")
    } else if factors.recency > 0.7 {
        format!("Ask {name}, they recently worked on this")
    } else if score.total > 0.6 {
        format!("Ask {name}, they're the primary expert on this code")
    } else {
        format!("Ask {name}, they're the most knowledgeable about this code")
    }
}

/// Score every (developer, file) pair observed in the commit log.
///
/// `review_signals` optionally maps (email, file) to an externally supplied
/// code-review participation value.
pub fn score_repository(
    log: &CommitLog,
    review_signals: &BTreeMap<(String, String), f64>,
    now: DateTime<Utc>,
) -> ExpertiseReport {
    // File -> developer -> commits, from the frozen log.
    let mut per_file: BTreeMap<&str, BTreeMap<&str, Vec<&CommitRecord>>> = BTreeMap::new();
    for commit in &log.commits {
        for file in commit.files.keys() {
            per_file
                .entry(file)
                .or_default()
                .entry(&commit.author_email)
                .or_default()
                .push(commit);
        }
    }

    let mut report = ExpertiseReport::default();
    for (file, by_developer) in per_file {
        let activity = FileActivity::from_commits(file, log.commits.iter());
        let mut scores: Vec<ExpertiseScore> = by_developer
            .into_iter()
            .map(|(email, commits)| {
                let review = review_signals
                    .get(&(email.to_string(), file.to_string()))
                    .copied()
                    .unwrap_or(0.0);
                let factors = FactorScores::compute(file, &commits, &activity, review, now);
                let name = log
                    .developers
                    .get(email)
                    .map(|d| d.display_name().to_string())
                    .unwrap_or_else(|| email.to_string());
                ExpertiseScore {
                    developer_email: email.to_string(),
                    developer_name: name,
                    file: file.to_string(),
                    factors,
                    total: factors.weighted_total(),
                    confidence: (commits.len() as f64 / FULL_CONFIDENCE_COMMITS).min(1.0),
                    commit_count: commits.len(),
                }
            })
            .collect();

        scores.sort_by(|a, b| {
            b.total
                .partial_cmp(&a.total)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.developer_email.cmp(&b.developer_email))
        });
        report.by_file.insert(file.to_string(), scores);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{CommitClass, DeveloperProfile, FileChange};
    use chrono::Duration;

    fn commit(
        email: &str,
        class: CommitClass,
        file: &str,
        lines: usize,
        days_ago: i64,
        now: DateTime<Utc>,
    ) -> CommitRecord {
        CommitRecord {
            hash: format!("{email}-{file}-{days_ago}"),
            author_name: email.split('@').next().unwrap().to_string(),
            author_email: email.to_string(),
            timestamp: now - Duration::days(days_ago),
            message: String::new(),
            classification: class,
            files: BTreeMap::from([(
                file.to_string(),
                FileChange {
                    lines_added: lines,
                    lines_deleted: 0,
                },
            )]),
        }
    }

    fn log_of(commits: Vec<CommitRecord>) -> CommitLog {
        let mut log = CommitLog {
            commits,
            developers: BTreeMap::new(),
        };
        for c in &log.commits {
            let profile = log
                .developers
                .entry(c.author_email.clone())
                .or_insert_with(|| DeveloperProfile {
                    email: c.author_email.clone(),
                    ..Default::default()
                });
            profile.names.insert(c.author_name.clone());
            profile.total_commits += 1;
        }
        log
    }

    fn fixed_score(email: &str, file: &str, total: f64) -> ExpertiseScore {
        ExpertiseScore {
            developer_email: email.to_string(),
            developer_name: email.split('@').next().unwrap().to_string(),
            file: file.to_string(),
            factors: FactorScores::default(),
            total,
            confidence: 1.0,
            commit_count: 10,
        }
    }

    fn report_with(file: &str, scores: Vec<ExpertiseScore>) -> ExpertiseReport {
        let mut sorted = scores;
        sorted.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap());
        ExpertiseReport {
            by_file: BTreeMap::from([(file.to_string(), sorted)]),
        }
    }

    #[test]
    fn test_bus_factor_definition() {
        // alice 0.8, bob 0.15, carol 0.05: alice alone covers >= 50%.
        let report = report_with(
            "f.py",
            vec![
                fixed_score("alice@x", "f.py", 0.8),
                fixed_score("bob@x", "f.py", 0.15),
                fixed_score("carol@x", "f.py", 0.05),
            ],
        );
        assert_eq!(report.bus_factor("f.py"), 1);
        assert!(report.has_knowledge_gap("f.py"));
    }

    #[test]
    fn test_bus_factor_boundary_property() {
        // Evenly spread scores need half the developers.
        let report = report_with(
            "f.py",
            (0..4)
                .map(|i| fixed_score(&format!("d{i}@x"), "f.py", 0.4))
                .collect(),
        );
        let k = report.bus_factor("f.py");
        let scores = report.scores_for("f.py");
        let sum: f64 = scores.iter().map(|s| s.total).sum();
        let top_k: f64 = scores.iter().take(k).map(|s| s.total).sum();
        let top_k_minus_1: f64 = scores.iter().take(k - 1).map(|s| s.total).sum();
        assert!(top_k >= 0.5 * sum);
        assert!(top_k_minus_1 < 0.5 * sum);
    }

    #[test]
    fn test_bus_factor_empty_file() {
        let report = ExpertiseReport::default();
        assert_eq!(report.bus_factor("missing.py"), 0);
        assert!(report.has_knowledge_gap("missing.py"));
    }

    #[test]
    fn test_score_repository_ranks_developers() {
        let now = Utc::now();
        let log = log_of(vec![
            commit("alice@x", CommitClass::Refactor, "f.py", 200, 5, now),
            commit("alice@x", CommitClass::Architectural, "f.py", 50, 4, now),
            commit("alice@x", CommitClass::Bugfix, "f.py", 30, 3, now),
            commit("bob@x", CommitClass::Routine, "f.py", 10, 2, now),
        ]);
        let report = score_repository(&log, &BTreeMap::new(), now);
        let scores = report.scores_for("f.py");
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].developer_email, "alice@x");
        assert!(scores[0].total > scores[1].total);
        assert!(scores[0].confidence > scores[1].confidence);
    }

    #[test]
    fn test_expertise_monotonic_under_new_refactors() {
        let now = Utc::now();
        // Five routine commits first.
        let mut commits: Vec<CommitRecord> = (0..5)
            .map(|i| commit("d@x", CommitClass::Routine, "f.py", 10, 30 - i, now))
            .collect();
        let before = score_repository(&log_of(commits.clone()), &BTreeMap::new(), now);
        let before_score = before.scores_for("f.py")[0].clone();
        assert_eq!(before_score.factors.refactor_depth, 0.0);

        // Then two 200/200-line refactor commits.
        for i in 0..2 {
            let mut c = commit("d@x", CommitClass::Refactor, "f.py", 200, 2 - i, now);
            c.files.get_mut("f.py").unwrap().lines_deleted = 200;
            commits.push(c);
        }
        let after = score_repository(&log_of(commits), &BTreeMap::new(), now);
        let after_score = &after.scores_for("f.py")[0];

        assert!(after_score.factors.refactor_depth > 0.0);
        assert!(after_score.total > before_score.total);
        assert!(after_score.factors.commit_frequency >= before_score.factors.commit_frequency);
    }

    #[test]
    fn test_expert_recommendation_texts() {
        let mut score = fixed_score("sarah@x", "f.py", 0.7);
        score.factors.architectural_changes = 0.8;
        let report = report_with("f.py", vec![score]);
        let rec = report.expert_for("f.py");
        assert_eq!(rec.recommendation_text, "Ask sarah, they architected this module");
        assert_eq!(rec.primary_expert.as_ref().unwrap().1, "sarah@x");

        let empty = ExpertiseReport::default();
        let rec = empty.expert_for("ghost.py");
        assert!(rec.primary_expert.is_none());
        assert_eq!(rec.bus_factor, 0);
    }

    #[test]
    fn test_heatmap_aggregates_by_top_level_module() {
        let report = ExpertiseReport {
            by_file: BTreeMap::from([
                (
                    "api/a.py".to_string(),
                    vec![fixed_score("alice@x", "api/a.py", 0.8)],
                ),
                (
                    "api/b.py".to_string(),
                    vec![
                        fixed_score("alice@x", "api/b.py", 0.5),
                        fixed_score("bob@x", "api/b.py", 0.45),
                    ],
                ),
                (
                    "data/c.py".to_string(),
                    vec![fixed_score("carol@x", "data/c.py", 0.2)],
                ),
            ]),
        };
        let heatmap = report.heatmap();

        let api = heatmap.modules.get("api").unwrap();
        assert_eq!(api.file_count, 2);
        assert_eq!(api.expert_count, 2);

        let data = heatmap.modules.get("data").unwrap();
        assert_eq!(data.expert_count, 0);
        assert!(data.has_knowledge_gap);

        assert!(heatmap.risk_areas.contains(&"data".to_string()));
        assert!(heatmap.average_bus_factor > 0.0);
    }

    #[test]
    fn test_developer_expertise_sorted() {
        let report = ExpertiseReport {
            by_file: BTreeMap::from([
                ("a.py".to_string(), vec![fixed_score("d@x", "a.py", 0.3)]),
                ("b.py".to_string(), vec![fixed_score("d@x", "b.py", 0.9)]),
            ]),
        };
        let areas = report.developer_expertise("d@x");
        assert_eq!(areas[0].0, "b.py");
        assert_eq!(areas[1].0, "a.py");
        assert!(report.developer_expertise("ghost@x").is_empty());
    }
}
