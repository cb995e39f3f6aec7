//! Condensed graph projection: directory -> file -> entity hierarchy.
//!
//! The full graph is too dense for hierarchical visualisation, so this
//! projects it into directory and file nodes with rolled-up metrics. Risk
//! per file/directory is the maximum of its contents; complexity rolls up
//! by summation; entity degree counts structural edges only.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::graph::snapshot::GraphSnapshot;
use crate::models::{EntityKind, RiskLevel};

/// Directory key for a file: path prefix up to the last separator,
/// `"root"` for files at the repository root.
pub(crate) fn directory_key(file: &str) -> String {
    match file.rsplit_once('/') {
        Some((dir, _)) => dir.to_string(),
        None => "root".to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryNode {
    pub id: String,
    pub name: String,
    pub file_count: usize,
    pub entity_count: usize,
    pub total_complexity: u64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileNode {
    pub id: String,
    pub name: String,
    pub entity_count: usize,
    pub total_complexity: u64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityNode {
    pub id: String,
    pub name: String,
    pub kind: EntityKind,
    pub line: u32,
    pub complexity: u32,
    /// in_degree + out_degree in the structural subgraph.
    pub degree: usize,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CondensedEdge {
    pub source: String,
    pub target: String,
    /// Number of underlying edges collapsed into this one.
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CondensedGraph {
    pub directory_nodes: Vec<DirectoryNode>,
    pub directory_edges: Vec<CondensedEdge>,
    pub files_by_directory: BTreeMap<String, Vec<FileNode>>,
    pub file_edges: Vec<CondensedEdge>,
    pub entities_by_file: BTreeMap<String, Vec<EntityNode>>,
    pub entity_edges: Vec<CondensedEdge>,
}

/// True for the code entities that appear in the condensed hierarchy.
fn is_code_entity(kind: EntityKind) -> bool {
    matches!(
        kind,
        EntityKind::Function | EntityKind::Method | EntityKind::Class
    )
}

/// Project the snapshot into the directory/file/entity hierarchy.
///
/// `risk_levels` is indexed by node, as produced by the risk engine.
pub fn condense(snapshot: &GraphSnapshot, risk_levels: &[RiskLevel]) -> CondensedGraph {
    let mut out = CondensedGraph::default();

    let mut entity_files: BTreeMap<u32, String> = BTreeMap::new();
    for (idx, entity) in snapshot.nodes().iter().enumerate() {
        if !is_code_entity(entity.kind()) || entity.location.file.is_empty() {
            continue;
        }
        let idx = idx as u32;
        let file = entity.location.file.clone();
        let (in_degree, out_degree) = snapshot.structural_degree(idx);
        let level = risk_levels
            .get(idx as usize)
            .copied()
            .unwrap_or(RiskLevel::Low);

        out.entities_by_file
            .entry(file.clone())
            .or_default()
            .push(EntityNode {
                id: entity.id.clone(),
                name: entity.name.clone(),
                kind: entity.kind(),
                line: entity.location.start_line,
                complexity: entity.complexity().cyclomatic,
                degree: in_degree + out_degree,
                risk_level: level,
            });
        entity_files.insert(idx, file);
    }

    // File nodes roll up their entities; directories roll up their files.
    let mut dir_files: BTreeMap<String, Vec<FileNode>> = BTreeMap::new();
    for (file, entities) in &out.entities_by_file {
        let total_complexity: u64 = entities.iter().map(|e| e.complexity as u64).sum();
        let risk_level = entities
            .iter()
            .map(|e| e.risk_level)
            .max()
            .unwrap_or(RiskLevel::Low);
        let node = FileNode {
            id: file.clone(),
            name: file.rsplit('/').next().unwrap_or(file).to_string(),
            entity_count: entities.len(),
            total_complexity,
            risk_level,
        };
        dir_files.entry(directory_key(file)).or_default().push(node);
    }

    for (dir, files) in &dir_files {
        out.directory_nodes.push(DirectoryNode {
            id: dir.clone(),
            name: dir.rsplit('/').next().unwrap_or(dir).to_string(),
            file_count: files.len(),
            entity_count: files.iter().map(|f| f.entity_count).sum(),
            total_complexity: files.iter().map(|f| f.total_complexity).sum(),
            risk_level: files
                .iter()
                .map(|f| f.risk_level)
                .max()
                .unwrap_or(RiskLevel::Low),
        });
    }
    out.files_by_directory = dir_files;

    // Structural edges between code entities, collapsed upwards.
    let mut entity_edges: BTreeMap<(String, String), usize> = BTreeMap::new();
    let mut file_edges: BTreeMap<(String, String), usize> = BTreeMap::new();
    let mut dir_edges: BTreeMap<(String, String), usize> = BTreeMap::new();

    for edge in snapshot.edges() {
        if !edge.kind.is_structural() {
            continue;
        }
        let (Some(source_file), Some(target_file)) =
            (entity_files.get(&edge.source), entity_files.get(&edge.target))
        else {
            continue;
        };

        let source_id = snapshot.node(edge.source).id.clone();
        let target_id = snapshot.node(edge.target).id.clone();
        *entity_edges.entry((source_id, target_id)).or_default() += 1;

        if source_file != target_file {
            *file_edges
                .entry((source_file.clone(), target_file.clone()))
                .or_default() += 1;
        }
        let (source_dir, target_dir) = (directory_key(source_file), directory_key(target_file));
        if source_dir != target_dir {
            *dir_edges.entry((source_dir, target_dir)).or_default() += 1;
        }
    }

    let collapse = |map: BTreeMap<(String, String), usize>| -> Vec<CondensedEdge> {
        map.into_iter()
            .map(|((source, target), count)| CondensedEdge {
                source,
                target,
                count,
            })
            .collect()
    };
    out.entity_edges = collapse(entity_edges);
    out.file_edges = collapse(file_edges);
    out.directory_edges = collapse(dir_edges);

    out
}
