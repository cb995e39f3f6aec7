//! Core data models for Synapse
//!
//! These models represent code entities and the typed relationships between
//! them. Entity kinds vary in attributes, so `EntityData` is a tagged
//! variant with one case per kind rather than an inheritance-style
//! hierarchy; relationships carry a single `kind` field keyed off a closed
//! enum.

use serde::{Deserialize, Serialize};

/// Normalise a path for use in entity IDs: POSIX separators, no leading
/// `./`, relative to the repository root.
pub fn normalize_path(path: &str) -> String {
    let mut normalized = path.replace('\\', "/");
    while let Some(stripped) = normalized.strip_prefix("./") {
        normalized = stripped.to_string();
    }
    normalized.trim_start_matches('/').to_string()
}

/// Stable entity ID: `<normalised_path>:<qualified_name>`.
pub fn entity_id(file: &str, qualified_name: &str) -> String {
    format!("{}:{}", normalize_path(file), qualified_name)
}

/// Kinds of code entities extracted from source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Function,
    Method,
    Class,
    Module,
    Import,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Function => write!(f, "function"),
            EntityKind::Method => write!(f, "method"),
            EntityKind::Class => write!(f, "class"),
            EntityKind::Module => write!(f, "module"),
            EntityKind::Import => write!(f, "import"),
        }
    }
}

/// Source location of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Normalised path relative to the repository root.
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
}

/// A function or method parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

/// Callable signature: parameters, return type, decorators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub decorators: Vec<String>,
    #[serde(default)]
    pub is_async: bool,
}

/// Complexity metrics for a callable body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Complexity {
    pub cyclomatic: u32,
    pub cognitive: u32,
}

/// Kind-specific entity attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntityData {
    Function {
        signature: Signature,
        complexity: Complexity,
    },
    Method {
        signature: Signature,
        complexity: Complexity,
        /// Qualified name of the owning class within the same file.
        owner_class: String,
    },
    Class {
        /// Base-class names as written in source (resolved separately).
        bases: Vec<String>,
        /// Method names in declaration order.
        methods: Vec<String>,
        decorators: Vec<String>,
    },
    Module {
        /// Number of import statements in the module.
        import_count: usize,
    },
    Import {
        module: String,
    },
}

/// A code entity: function, method, class, module, or import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Stable ID: `<normalised_path>:<qualified_name>`.
    pub id: String,
    /// Unqualified name (last segment of the qualified name).
    pub name: String,
    /// Nesting path inside the file, e.g. `Outer.Inner.method`.
    pub qualified_name: String,
    pub location: SourceLocation,
    #[serde(flatten)]
    pub data: EntityData,
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self.data {
            EntityData::Function { .. } => EntityKind::Function,
            EntityData::Method { .. } => EntityKind::Method,
            EntityData::Class { .. } => EntityKind::Class,
            EntityData::Module { .. } => EntityKind::Module,
            EntityData::Import { .. } => EntityKind::Import,
        }
    }

    /// Combined complexity metrics, zero for non-callables.
    pub fn complexity(&self) -> Complexity {
        match &self.data {
            EntityData::Function { complexity, .. } | EntityData::Method { complexity, .. } => {
                *complexity
            }
            _ => Complexity::default(),
        }
    }

    /// Owning class qualified name, methods only.
    pub fn owner_class(&self) -> Option<&str> {
        match &self.data {
            EntityData::Method { owner_class, .. } => Some(owner_class),
            _ => None,
        }
    }
}

/// Typed relationship kinds between entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    /// File/module contains a function or class; class contains a method.
    Contains,
    /// Module defines a constant or variable.
    Defines,
    Calls,
    /// Function creates an instance of a class.
    Instantiates,
    Inherits,
    /// Class implements a protocol or abstract base.
    Implements,
    /// Method overrides a parent-class method.
    Overrides,
    Imports,
    /// A specific name imported from a module.
    ImportsFrom,
    Decorates,
    /// Type used in an annotation.
    Uses,
    /// Function returns a specific type.
    Returns,
    Raises,
    /// Function catches an exception type.
    Catches,
}

impl RelationKind {
    /// Structural kinds drive centrality and blast-radius traversal.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            RelationKind::Calls | RelationKind::Inherits | RelationKind::Imports
        )
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RelationKind::Contains => "CONTAINS",
            RelationKind::Defines => "DEFINES",
            RelationKind::Calls => "CALLS",
            RelationKind::Instantiates => "INSTANTIATES",
            RelationKind::Inherits => "INHERITS",
            RelationKind::Implements => "IMPLEMENTS",
            RelationKind::Overrides => "OVERRIDES",
            RelationKind::Imports => "IMPORTS",
            RelationKind::ImportsFrom => "IMPORTS_FROM",
            RelationKind::Decorates => "DECORATES",
            RelationKind::Uses => "USES",
            RelationKind::Returns => "RETURNS",
            RelationKind::Raises => "RAISES",
            RelationKind::Catches => "CATCHES",
        };
        write!(f, "{s}")
    }
}

/// A directed edge between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: String,
    pub target: String,
    pub kind: RelationKind,
    /// Coupling strength used as the impact weight in traversals.
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

fn default_weight() -> f64 {
    1.0
}

impl Relationship {
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            weight: 1.0,
            line: None,
        }
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

/// Risk level buckets over a [0, 1] score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            RiskLevel::Critical
        } else if score >= 0.5 {
            RiskLevel::High
        } else if score >= 0.2 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(r"backend\ai\file.py"), "backend/ai/file.py");
        assert_eq!(normalize_path("./scripts/run.py"), "scripts/run.py");
        assert_eq!(normalize_path("a.py"), "a.py");
        assert_eq!(normalize_path("/a/b.py"), "a/b.py");
    }

    #[test]
    fn test_entity_id_normalizes() {
        assert_eq!(
            entity_id(r".\pkg\mod.py", "Outer.method"),
            "pkg/mod.py:Outer.method"
        );
    }

    #[test]
    fn test_entity_kind_and_complexity() {
        let entity = Entity {
            id: "a.py:foo".into(),
            name: "foo".into(),
            qualified_name: "foo".into(),
            location: SourceLocation {
                file: "a.py".into(),
                start_line: 1,
                end_line: 4,
            },
            data: EntityData::Function {
                signature: Signature::default(),
                complexity: Complexity {
                    cyclomatic: 3,
                    cognitive: 5,
                },
            },
        };
        assert_eq!(entity.kind(), EntityKind::Function);
        assert_eq!(entity.complexity().cyclomatic, 3);
        assert!(entity.owner_class().is_none());
    }

    #[test]
    fn test_entity_serde_round_trip() {
        let entity = Entity {
            id: "pkg/mod.py:Widget.render".into(),
            name: "render".into(),
            qualified_name: "Widget.render".into(),
            location: SourceLocation {
                file: "pkg/mod.py".into(),
                start_line: 10,
                end_line: 20,
            },
            data: EntityData::Method {
                signature: Signature {
                    parameters: vec![Parameter {
                        name: "self".into(),
                        ..Default::default()
                    }],
                    return_type: Some("str".into()),
                    decorators: vec!["cached".into()],
                    is_async: false,
                },
                complexity: Complexity {
                    cyclomatic: 2,
                    cognitive: 1,
                },
                owner_class: "Widget".into(),
            },
        };
        let json = serde_json::to_string(&entity).unwrap();
        assert!(json.contains(r#""kind":"method""#));
        let back: Entity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entity);
    }

    #[test]
    fn test_structural_kinds() {
        assert!(RelationKind::Calls.is_structural());
        assert!(RelationKind::Inherits.is_structural());
        assert!(RelationKind::Imports.is_structural());
        assert!(!RelationKind::Contains.is_structural());
        assert!(!RelationKind::Decorates.is_structural());
    }

    #[test]
    fn test_risk_level_thresholds() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.19), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.2), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.49), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.5), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.8), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(1.0), RiskLevel::Critical);
    }

    #[test]
    fn test_relation_kind_display() {
        assert_eq!(RelationKind::ImportsFrom.to_string(), "IMPORTS_FROM");
        assert_eq!(RelationKind::Calls.to_string(), "CALLS");
    }
}
