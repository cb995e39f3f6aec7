//! CLI command definitions and handlers.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;

use crate::config::{discover_repo_root, AnalysisConfig};
use crate::models::RiskLevel;
use crate::pipeline::{AnalysisSnapshot, Pipeline};
use crate::query::QuerySurface;

/// Synapse - living knowledge graph for source repositories
///
/// Analyses a repository into entities, relationships, risk scores,
/// expertise attribution and architectural-boundary compliance.
#[derive(Parser, Debug)]
#[command(name = "synapse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the repository (default: discovered from the working
    /// directory, or SYNAPSE_REPO_ROOT)
    #[arg(long, global = true)]
    pub repo: Option<PathBuf>,

    /// Skip git history mining
    #[arg(long, global = true)]
    pub no_git: bool,

    /// External coverage map (JSON object of path -> covered fraction)
    #[arg(long, global = true)]
    pub coverage_file: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full analysis and print a run summary
    Analyze,

    /// Print the raw graph (nodes and edges)
    Graph,

    /// Print the condensed directory/file/entity hierarchy
    Condensed,

    /// Blast radius for an entity ID, e.g. `pkg/mod.py:Class.method`
    BlastRadius {
        entity: String,
        /// Traversal depth limit
        #[arg(long)]
        depth: Option<usize>,
    },

    /// Recommend an expert for a file
    Expert { file: String },

    /// Expertise heatmap per top-level module
    Heatmap,

    /// Bus-factor analysis per module
    BusFactor,

    /// Files with knowledge gaps
    Gaps,

    /// Expertise areas of one developer
    Developer { email: String },

    /// Architectural governance
    #[command(subcommand)]
    Governance(GovernanceCommands),
}

#[derive(Subcommand, Debug)]
pub enum GovernanceCommands {
    /// Validate import edges against the boundary rules
    Validate,
    /// Show configured layers
    Layers,
    /// Drift against a baseline snapshot
    Drift {
        #[arg(long)]
        baseline: Option<PathBuf>,
    },
    /// Save current metrics as the baseline
    Baseline {
        #[arg(long, default_value = ".synapse/baseline.json")]
        output: PathBuf,
    },
}

fn risk_badge(level: RiskLevel) -> console::StyledObject<String> {
    let text = level.to_string();
    match level {
        RiskLevel::Low => style(text).green(),
        RiskLevel::Medium => style(text).yellow(),
        RiskLevel::High => style(text).red(),
        RiskLevel::Critical => style(text).red().bold(),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("cannot read working directory")?;
    let repo_root = match &cli.repo {
        Some(path) => path.clone(),
        None => discover_repo_root(&cwd).unwrap_or(cwd),
    };

    let mut config = AnalysisConfig::default();
    if let Some(coverage) = &cli.coverage_file {
        config = config.with_coverage_file(coverage);
    }

    let mut pipeline = Pipeline::new(config.clone());
    if cli.no_git {
        pipeline = pipeline.without_git();
    }
    let snapshot = pipeline
        .run(&repo_root)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    let surface = QuerySurface::new(&snapshot, &config);

    match &cli.command {
        Commands::Analyze => print_summary(&snapshot, cli.json)?,
        Commands::Graph => {
            let payload = surface.get_graph();
            if cli.json {
                print_json(&payload)?;
            } else {
                println!(
                    "{} nodes, {} edges",
                    payload.nodes.len(),
                    payload.edges.len()
                );
                for edge in &payload.edges {
                    println!("  {} -[{}]-> {}", edge.source, edge.kind, edge.target);
                }
            }
        }
        Commands::Condensed => print_json(surface.get_condensed_graph())?,
        Commands::BlastRadius { entity, depth } => {
            let blast = surface
                .blast_radius(entity, *depth)
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            if cli.json {
                print_json(&blast)?;
            } else {
                println!(
                    "{} {}  score {:.2}",
                    style(&blast.target).bold(),
                    risk_badge(blast.risk_level),
                    blast.blast_radius_score
                );
                println!(
                    "{} direct callers, {} affected",
                    blast.direct_callers,
                    blast.affected.len()
                );
                for id in &blast.affected {
                    println!("  {id}");
                }
                for rec in &blast.recommendations {
                    println!("{} {rec}", style("->").dim());
                }
            }
        }
        Commands::Expert { file } => {
            let rec = surface
                .expert_for(file)
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            if cli.json {
                print_json(&rec)?;
            } else {
                println!("{}", rec.recommendation_text);
                if let Some(score) = rec.score {
                    println!("score {score:.2}, bus factor {}", rec.bus_factor);
                }
            }
        }
        Commands::Heatmap => print_json(&surface.heatmap())?,
        Commands::BusFactor => {
            let summary = surface.bus_factor_summary();
            if cli.json {
                print_json(&summary)?;
            } else {
                for (module, factor) in &summary.analysis {
                    let marker = if *factor <= summary.warning_threshold {
                        style("!").red().to_string()
                    } else {
                        " ".to_string()
                    };
                    println!("{marker} {module}: {factor}");
                }
            }
        }
        Commands::Gaps => print_json(&surface.knowledge_gaps())?,
        Commands::Developer { email } => {
            let areas = surface
                .developer_expertise(email)
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            if cli.json {
                print_json(&areas)?;
            } else {
                for (file, score) in &areas {
                    println!("{score:.2}  {file}");
                }
            }
        }
        Commands::Governance(governance) => match governance {
            GovernanceCommands::Validate => {
                let validation = surface.governance_validate();
                if cli.json {
                    print_json(&validation)?;
                } else {
                    println!(
                        "{} violations, {} warnings",
                        validation.total_violations, validation.total_warnings
                    );
                    for v in validation.violations.iter().chain(&validation.warnings) {
                        println!(
                            "  [{}] {} -> {} ({} -> {}): {}",
                            v.rule_name, v.from_module, v.to_module, v.from_layer, v.to_layer,
                            v.message
                        );
                    }
                }
            }
            GovernanceCommands::Layers => print_json(&surface.governance_layers())?,
            GovernanceCommands::Drift { baseline } => {
                let report = surface
                    .governance_drift(baseline.as_deref())
                    .map_err(|e| anyhow::anyhow!("{e}"))?;
                if cli.json {
                    print_json(&report)?;
                } else {
                    println!("drift score {:.3}", report.drift_score);
                    for rec in &report.recommendations {
                        println!("  {rec}");
                    }
                }
            }
            GovernanceCommands::Baseline { output } => {
                let path = if output.is_absolute() {
                    output.clone()
                } else {
                    repo_root.join(output)
                };
                let metrics = surface
                    .governance_save_baseline(&path)
                    .map_err(|e| anyhow::anyhow!("{e}"))?;
                println!(
                    "baseline saved to {} (coupling {:.2}, {} violations)",
                    path.display(),
                    metrics.coupling_score,
                    metrics.violation_count
                );
            }
        },
    }

    Ok(())
}

fn print_summary(snapshot: &AnalysisSnapshot, json: bool) -> Result<()> {
    if json {
        return print_json(&snapshot.summary);
    }
    let summary = &snapshot.summary;
    println!(
        "{} {}",
        style("analyzed").green().bold(),
        snapshot.repo_root.display()
    );
    println!(
        "  {} files, {} entities, {} relationships",
        summary.files_parsed, summary.entities, summary.relationships
    );
    println!(
        "  {} commits from {} developers",
        summary.commits_mined, summary.developers
    );
    println!(
        "  governance: {} violations, {} warnings",
        snapshot.governance.total_violations(),
        snapshot.governance.total_warnings()
    );
    if !summary.partial_failures.is_empty() {
        println!(
            "  {} {} files parsed partially:",
            style("!").yellow(),
            summary.partial_failures.len()
        );
        for failure in &summary.partial_failures {
            println!("    {}", failure.message);
        }
    }
    println!("  done in {}ms", summary.elapsed_ms);
    Ok(())
}
