//! Source-file discovery and parsing.
//!
//! Walks the repository tree, filters with include/exclude globs, and
//! parses each supported file into a [`ParsedFile`]: entities, the import
//! table, and raw call sites. A parse failure on one file is contained as a
//! partial-parse record; downstream stages see the file as present but
//! entity-less.

pub mod python;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;
use walkdir::WalkDir;

use crate::config::AnalysisConfig;
use crate::models::{normalize_path, Entity};

/// Skip very large source files; pathological inputs can blow up parse
/// time and memory.
const MAX_PARSE_FILE_BYTES: u64 = 2 * 1024 * 1024;

/// A name brought in by `from module import name [as alias]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportedName {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl ImportedName {
    /// The name the import binds locally.
    pub fn local(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// One import statement in a file's import table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportRecord {
    /// Dotted module path as written, e.g. `os.path` or `utils.helper`.
    pub module: String,
    /// Names pulled in by `from module import a, b`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imported_names: Vec<ImportedName>,
    /// `import numpy as np` -> `np`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// `from module import *`.
    #[serde(default)]
    pub is_star: bool,
    /// `from . import x` style imports.
    #[serde(default)]
    pub is_relative: bool,
    pub line: u32,
}

/// A call site before resolution: who called, the textual callee, where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCall {
    /// Entity ID of the caller (module path for top-level calls).
    pub caller: String,
    /// Callee text as written, e.g. `bar` or `helper.fetch`.
    pub callee: String,
    pub line: u32,
}

/// A module-level constant, kept for resolution scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantRecord {
    pub name: String,
    pub line: u32,
}

/// Complete parse of one source file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedFile {
    /// Normalised path relative to the repository root.
    pub path: String,
    pub entities: Vec<Entity>,
    pub imports: Vec<ImportRecord>,
    pub raw_calls: Vec<RawCall>,
    /// `raise X(...)` sites, resolved like calls into RAISES edges.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub raw_raises: Vec<RawCall>,
    /// `except X:` sites, resolved like calls into CATCHES edges.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub raw_catches: Vec<RawCall>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constants: Vec<ConstantRecord>,
    /// Set when the file failed to parse; entities are empty then.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

impl ParsedFile {
    /// A placeholder for files that failed to parse.
    pub fn partial(path: String, reason: impl Into<String>) -> Self {
        ParsedFile {
            path,
            parse_error: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn is_partial(&self) -> bool {
        self.parse_error.is_some()
    }
}

/// Extensions handled by the supported grammar set.
pub fn supported_extensions() -> &'static [&'static str] {
    &["py", "pyi"]
}

fn build_globset(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("bad glob: {pattern}"))?);
    }
    Ok(Some(builder.build()?))
}

/// Walk the repository and return source files sorted by normalised path.
///
/// Sorting before parsing keeps run output deterministic regardless of
/// filesystem iteration order.
pub fn walk_repository(root: &Path, config: &AnalysisConfig) -> Result<Vec<PathBuf>> {
    let include = build_globset(&config.include)?;
    let exclude = build_globset(&config.exclude)?;

    let mut files: Vec<(String, PathBuf)> = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("skipping unreadable path: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let ext = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        if !supported_extensions().contains(&ext) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .to_string();
        let normalized = normalize_path(&relative);

        if let Some(ref include) = include {
            if !include.is_match(&normalized) {
                continue;
            }
        }
        if let Some(ref exclude) = exclude {
            if exclude.is_match(&normalized) {
                continue;
            }
        }
        files.push((normalized, entry.path().to_path_buf()));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

/// Parse one file, containing any failure as a partial-parse record.
pub fn parse_file(root: &Path, path: &Path, timeout: Duration) -> ParsedFile {
    let relative = path
        .strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .to_string();
    let normalized = normalize_path(&relative);

    if let Ok(meta) = std::fs::metadata(path) {
        if meta.len() > MAX_PARSE_FILE_BYTES {
            warn!(
                "skipping {} ({:.1}MB exceeds {}MB guardrail)",
                normalized,
                meta.len() as f64 / (1024.0 * 1024.0),
                MAX_PARSE_FILE_BYTES / (1024 * 1024),
            );
            return ParsedFile::partial(normalized, "file exceeds size guardrail");
        }
    }

    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => return ParsedFile::partial(normalized, format!("read failed: {e}")),
    };

    let started = Instant::now();
    let result = python::parse_source(&source, &normalized);
    let elapsed = started.elapsed();

    // Soft timeout: the parse ran to completion, but a file this slow is
    // reported as partial so the pipeline's timing contract holds.
    if !timeout.is_zero() && elapsed > timeout {
        warn!("parse of {} took {:?}, over the soft timeout", normalized, elapsed);
        return ParsedFile::partial(normalized, "parse exceeded soft timeout");
    }

    match result {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("partial parse of {}: {}", normalized, e);
            ParsedFile::partial(normalized, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("pkg")).unwrap();
        std::fs::write(dir.path().join("zeta.py"), "x = 1\n").unwrap();
        std::fs::write(dir.path().join("pkg/alpha.py"), "y = 2\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not source").unwrap();

        let config = AnalysisConfig::default();
        let files = walk_repository(dir.path(), &config).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| {
                normalize_path(&p.strip_prefix(dir.path()).unwrap().to_string_lossy())
            })
            .collect();
        assert_eq!(names, vec!["pkg/alpha.py", "zeta.py"]);
    }

    #[test]
    fn test_walk_honours_exclude_globs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("venv/lib")).unwrap();
        std::fs::write(dir.path().join("main.py"), "pass\n").unwrap();
        std::fs::write(dir.path().join("venv/lib/dep.py"), "pass\n").unwrap();

        let config = AnalysisConfig::default();
        let files = walk_repository(dir.path(), &config).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("main.py"));
    }

    #[test]
    fn test_walk_honours_include_globs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/a.py"), "pass\n").unwrap();
        std::fs::write(dir.path().join("b.py"), "pass\n").unwrap();

        let config = AnalysisConfig {
            include: vec!["src/**".into()],
            ..Default::default()
        };
        let files = walk_repository(dir.path(), &config).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("src/a.py"));
    }

    #[test]
    fn test_parse_file_contains_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("ghost.py");
        let parsed = parse_file(dir.path(), &missing, Duration::from_secs(30));
        assert!(parsed.is_partial());
        assert!(parsed.entities.is_empty());
        assert_eq!(parsed.path, "ghost.py");
    }
}
