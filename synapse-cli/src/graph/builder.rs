//! Materialises resolved entities and relationships into a snapshot.
//!
//! Edges are deduplicated by `(source, target, kind)`; multiplicity is
//! preserved only per kind. Edges whose endpoints are unknown are dropped
//! rather than minting phantom nodes, which keeps the snapshot invariant
//! (every edge endpoint is a node) by construction.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::graph::snapshot::{EdgeRef, GraphSnapshot};
use crate::models::RelationKind;
use crate::resolver::ResolvedProject;

pub fn build_snapshot(resolved: ResolvedProject, version: u64) -> GraphSnapshot {
    let ResolvedProject {
        entities,
        relationships,
    } = resolved;

    let mut ids: FxHashMap<String, u32> = FxHashMap::default();
    for (idx, entity) in entities.iter().enumerate() {
        ids.insert(entity.id.clone(), idx as u32);
    }

    let mut seen: FxHashSet<(u32, u32, RelationKind)> = FxHashSet::default();
    let mut edges: Vec<EdgeRef> = Vec::with_capacity(relationships.len());

    for rel in relationships {
        let (Some(&source), Some(&target)) = (ids.get(&rel.source), ids.get(&rel.target)) else {
            debug!(
                "dropping {} edge with unknown endpoint: {} -> {}",
                rel.kind, rel.source, rel.target
            );
            continue;
        };
        if !seen.insert((source, target, rel.kind)) {
            continue;
        }
        edges.push(EdgeRef {
            source,
            target,
            kind: rel.kind,
            weight: rel.weight,
            line: rel.line,
        });
    }

    GraphSnapshot::new(version, entities, ids, edges)
}
