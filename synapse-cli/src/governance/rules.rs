//! Layer definitions and boundary rules.
//!
//! Layers are ordered lists of glob patterns; a module path belongs to the
//! first layer with a matching pattern (patterns sorted lexicographically
//! within a layer for determinism). Rules are an ordered list matched
//! first-wins, with `*` wildcards on either side; the default action is
//! allow.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::{Result, SynapseError};

/// Rule-file location relative to the repository root.
pub const CONFIG_RELATIVE_PATH: &str = ".synapse/architecture.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Warn,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// A named layer with its glob patterns.
#[derive(Debug, Clone)]
pub struct Layer {
    pub name: String,
    /// Lexicographically sorted patterns.
    pub patterns: Vec<String>,
    matcher: GlobSet,
}

impl Layer {
    pub fn new(name: impl Into<String>, patterns: Vec<String>) -> Result<Self> {
        let mut patterns = patterns;
        patterns.sort();
        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob = Glob::new(pattern)
                .map_err(|e| SynapseError::Config(format!("bad layer glob `{pattern}`: {e}")))?;
            builder.add(glob);
        }
        let matcher = builder
            .build()
            .map_err(|e| SynapseError::Config(format!("layer globset: {e}")))?;
        Ok(Self {
            name: name.into(),
            patterns,
            matcher,
        })
    }

    pub fn matches(&self, module_path: &str) -> bool {
        self.matcher.is_match(module_path)
    }
}

/// One ordered boundary rule; `*` matches any layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryRule {
    pub name: String,
    pub from_layer: String,
    pub to_layer: String,
    pub action: RuleAction,
    #[serde(default)]
    pub message: String,
}

impl BoundaryRule {
    fn matches(&self, from: &str, to: &str) -> bool {
        (self.from_layer == "*" || self.from_layer == from)
            && (self.to_layer == "*" || self.to_layer == to)
    }
}

/// The loaded governance configuration.
#[derive(Debug, Clone)]
pub struct ArchitectureRules {
    /// Layers in declaration order; first match wins.
    pub layers: Vec<Layer>,
    /// Rules in declaration order; first match wins.
    pub rules: Vec<BoundaryRule>,
}

impl Default for ArchitectureRules {
    /// Defaults when no config file exists: layers {api, service, data},
    /// rule `api -> data = block`.
    fn default() -> Self {
        let layers = vec![
            Layer::new("api", vec!["**/api/**".into()]).expect("default layer"),
            Layer::new("service", vec!["**/service/**".into(), "**/services/**".into()])
                .expect("default layer"),
            Layer::new("data", vec!["**/data/**".into(), "**/models/**".into()])
                .expect("default layer"),
        ];
        let rules = vec![BoundaryRule {
            name: "api-must-not-touch-data".into(),
            from_layer: "api".into(),
            to_layer: "data".into(),
            action: RuleAction::Block,
            message: "API layer must go through the service layer, not straight to data.".into(),
        }];
        Self { layers, rules }
    }
}

/// Raw YAML shape of `.synapse/architecture.yaml`.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    layers: serde_yaml::Mapping,
    #[serde(default)]
    rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
struct RawLayer {
    #[serde(default)]
    patterns: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    name: String,
    from: String,
    to: String,
    action: String,
    #[serde(default)]
    message: String,
}

impl ArchitectureRules {
    /// Parse a YAML rule document.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let parsed: RawConfig = serde_yaml::from_str(raw)
            .map_err(|e| SynapseError::Config(format!("architecture.yaml: {e}")))?;

        // serde_yaml's Mapping preserves declaration order, which defines
        // layer precedence.
        let mut layers = Vec::new();
        for (key, value) in parsed.layers {
            let name = key
                .as_str()
                .ok_or_else(|| SynapseError::Config("layer name must be a string".into()))?
                .to_string();
            let raw_layer: RawLayer = serde_yaml::from_value(value)
                .map_err(|e| SynapseError::Config(format!("layer `{name}`: {e}")))?;
            layers.push(Layer::new(name, raw_layer.patterns)?);
        }

        let mut rules = Vec::new();
        for raw_rule in parsed.rules {
            let action = match raw_rule.action.as_str() {
                "allow" => RuleAction::Allow,
                "warn" => RuleAction::Warn,
                "block" => RuleAction::Block,
                other => {
                    return Err(SynapseError::Config(format!(
                        "rule `{}`: unknown action `{other}`",
                        raw_rule.name
                    )))
                }
            };
            rules.push(BoundaryRule {
                name: raw_rule.name,
                from_layer: raw_rule.from,
                to_layer: raw_rule.to,
                action,
                message: raw_rule.message,
            });
        }

        Ok(Self { layers, rules })
    }

    /// Load from `<repo>/.synapse/architecture.yaml`.
    ///
    /// A missing file silently yields the defaults; a malformed one falls
    /// back to defaults with a visible warning (`ErrConfig` is fatal for
    /// the governance engine only).
    pub fn load(repo_root: &Path) -> Self {
        let path = repo_root.join(CONFIG_RELATIVE_PATH);
        if !path.exists() {
            return Self::default();
        }
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("unreadable {}: {e}; using default rules", path.display());
                return Self::default();
            }
        };
        match Self::from_yaml(&raw) {
            Ok(rules) => rules,
            Err(e) => {
                warn!("{e}; using default rules");
                Self::default()
            }
        }
    }

    /// First layer whose any pattern matches the module path.
    pub fn classify(&self, module_path: &str) -> Option<&str> {
        let normalized = crate::models::normalize_path(module_path);
        self.layers
            .iter()
            .find(|layer| layer.matches(&normalized))
            .map(|layer| layer.name.as_str())
    }

    /// First rule matching `(from, to)`; the default action is allow.
    pub fn rule_for(&self, from_layer: &str, to_layer: &str) -> Option<&BoundaryRule> {
        self.rules
            .iter()
            .find(|rule| rule.matches(from_layer, to_layer))
    }

    /// All glob patterns that mark layer entry points, for the git miner's
    /// architectural-commit classification.
    pub fn layer_entry_globs(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for layer in &self.layers {
            for pattern in &layer.patterns {
                let glob = Glob::new(pattern)
                    .map_err(|e| SynapseError::Config(format!("glob `{pattern}`: {e}")))?;
                builder.add(glob);
            }
        }
        builder
            .build()
            .map_err(|e| SynapseError::Config(format!("layer globset: {e}")))
    }
}
