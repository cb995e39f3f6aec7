//! Immutable graph snapshot for one analysis run.
//!
//! The graph is cyclic (mutual recursion, circular imports), so it is held
//! as a `Vec<Entity>` with small integer indices and adjacency lists of
//! indices, never as a pointer graph. Entity string IDs map to indices
//! through a single interning table; everything downstream works on
//! indices. Once built, the snapshot is read-only and lock-free to share.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::models::{Entity, RelationKind};

/// A directed edge between node indices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeRef {
    pub source: u32,
    pub target: u32,
    pub kind: RelationKind,
    pub weight: f64,
    pub line: Option<u32>,
}

/// Aggregate statistics for a snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub edges_by_kind: BTreeMap<String, usize>,
}

#[derive(Debug, Clone)]
pub struct GraphSnapshot {
    /// Monotonic version number for this analysis run.
    version: u64,
    nodes: Vec<Entity>,
    ids: FxHashMap<String, u32>,
    edges: Vec<EdgeRef>,
    /// Outgoing edge indices per node, in edge-insertion order.
    forward: Vec<Vec<u32>>,
    /// Incoming edge indices per node, in edge-insertion order.
    reverse: Vec<Vec<u32>>,
}

impl GraphSnapshot {
    pub(crate) fn new(
        version: u64,
        nodes: Vec<Entity>,
        ids: FxHashMap<String, u32>,
        edges: Vec<EdgeRef>,
    ) -> Self {
        let mut forward = vec![Vec::new(); nodes.len()];
        let mut reverse = vec![Vec::new(); nodes.len()];
        for (idx, edge) in edges.iter().enumerate() {
            forward[edge.source as usize].push(idx as u32);
            reverse[edge.target as usize].push(idx as u32);
        }
        Self {
            version,
            nodes,
            ids,
            edges,
            forward,
            reverse,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[Entity] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeRef] {
        &self.edges
    }

    pub fn node(&self, index: u32) -> &Entity {
        &self.nodes[index as usize]
    }

    pub fn node_index(&self, id: &str) -> Option<u32> {
        self.ids.get(id).copied()
    }

    /// Outgoing edges of a node, in insertion order.
    pub fn outgoing(&self, index: u32) -> impl Iterator<Item = &EdgeRef> {
        self.forward[index as usize]
            .iter()
            .map(move |&e| &self.edges[e as usize])
    }

    /// Incoming edges of a node, in insertion order.
    pub fn incoming(&self, index: u32) -> impl Iterator<Item = &EdgeRef> {
        self.reverse[index as usize]
            .iter()
            .map(move |&e| &self.edges[e as usize])
    }

    /// Entities that call this one (CALLS predecessors).
    pub fn callers(&self, index: u32) -> Vec<u32> {
        self.incoming(index)
            .filter(|e| e.kind == RelationKind::Calls)
            .map(|e| e.source)
            .collect()
    }

    /// Entities this one calls (CALLS successors).
    pub fn callees(&self, index: u32) -> Vec<u32> {
        self.outgoing(index)
            .filter(|e| e.kind == RelationKind::Calls)
            .map(|e| e.target)
            .collect()
    }

    /// Structural edges (CALLS, INHERITS, IMPORTS) as index pairs.
    pub fn structural_edges(&self) -> Vec<(u32, u32)> {
        self.edges
            .iter()
            .filter(|e| e.kind.is_structural())
            .map(|e| (e.source, e.target))
            .collect()
    }

    /// Reverse adjacency over structural edges, `(source, weight)` pairs in
    /// edge-insertion order, for blast-radius traversal.
    pub fn structural_reverse_adjacency(&self) -> Vec<Vec<(u32, f64)>> {
        let mut adj = vec![Vec::new(); self.nodes.len()];
        for edge in &self.edges {
            if edge.kind.is_structural() {
                adj[edge.target as usize].push((edge.source, edge.weight));
            }
        }
        adj
    }

    /// `(in_degree, out_degree)` restricted to structural edges.
    pub fn structural_degree(&self, index: u32) -> (usize, usize) {
        let incoming = self
            .incoming(index)
            .filter(|e| e.kind.is_structural())
            .count();
        let outgoing = self
            .outgoing(index)
            .filter(|e| e.kind.is_structural())
            .count();
        (incoming, outgoing)
    }

    /// Cycles (SCCs of size >= 2) over structural edges, as entity IDs.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        let edges = self.structural_edges();
        match synapse_graph::find_cycles(&edges, self.nodes.len(), 2) {
            Ok(cycles) => cycles
                .into_iter()
                .map(|cycle| {
                    let mut ids: Vec<String> = cycle
                        .into_iter()
                        .map(|idx| self.nodes[idx as usize].id.clone())
                        .collect();
                    ids.sort();
                    ids
                })
                .collect(),
            Err(_) => vec![],
        }
    }

    /// Bases and subclasses of a class node.
    pub fn inheritance_tree(&self, index: u32) -> (Vec<String>, Vec<String>) {
        let bases = self
            .outgoing(index)
            .filter(|e| e.kind == RelationKind::Inherits || e.kind == RelationKind::Implements)
            .map(|e| self.nodes[e.target as usize].id.clone())
            .collect();
        let subclasses = self
            .incoming(index)
            .filter(|e| e.kind == RelationKind::Inherits || e.kind == RelationKind::Implements)
            .map(|e| self.nodes[e.source as usize].id.clone())
            .collect();
        (bases, subclasses)
    }

    pub fn stats(&self) -> GraphStats {
        let mut edges_by_kind: BTreeMap<String, usize> = BTreeMap::new();
        for edge in &self.edges {
            *edges_by_kind.entry(edge.kind.to_string()).or_default() += 1;
        }
        GraphStats {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            edges_by_kind,
        }
    }

    /// Content equality under canonical ordering, ignoring the version
    /// number. Re-parsing an unchanged repository must satisfy this.
    pub fn content_eq(&self, other: &GraphSnapshot) -> bool {
        if self.nodes.len() != other.nodes.len() || self.edges.len() != other.edges.len() {
            return false;
        }
        let ids = |g: &GraphSnapshot| -> Vec<String> {
            g.nodes.iter().map(|n| n.id.clone()).collect()
        };
        if ids(self) != ids(other) {
            return false;
        }
        let keys = |g: &GraphSnapshot| -> Vec<(String, String, RelationKind)> {
            g.edges
                .iter()
                .map(|e| {
                    (
                        g.nodes[e.source as usize].id.clone(),
                        g.nodes[e.target as usize].id.clone(),
                        e.kind,
                    )
                })
                .collect()
        };
        keys(self) == keys(other)
    }
}
