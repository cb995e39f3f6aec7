//! Centrality and component algorithms over index-based directed graphs.
//!
//! Nodes are dense `u32` indices; edges are `(source, target)` pairs. The
//! caller owns the mapping between entity IDs and indices, so these kernels
//! stay free of strings and I/O.
//!
//! Betweenness centrality runs one BFS per source node, in parallel with
//! rayon. For large graphs the caller can restrict the source set and scale
//! the result (see [`betweenness_centrality_sampled`]).

use petgraph::algo::tarjan_scc as petgraph_tarjan;
use petgraph::graph::DiGraph;
use rayon::prelude::*;
use std::collections::VecDeque;

use crate::errors::GraphError;

/// Validate that all edges reference valid node indices.
pub(crate) fn validate_edges(edges: &[(u32, u32)], num_nodes: u32) -> Result<(), GraphError> {
    for &(src, dst) in edges {
        if src >= num_nodes {
            return Err(GraphError::NodeOutOfBounds(src, num_nodes));
        }
        if dst >= num_nodes {
            return Err(GraphError::NodeOutOfBounds(dst, num_nodes));
        }
    }
    Ok(())
}

/// Brandes betweenness centrality for a directed graph.
///
/// Runs a BFS from every node and accumulates partial dependencies on the
/// back-propagation pass. Exact, O(V·E).
pub fn betweenness_centrality(
    edges: &[(u32, u32)],
    num_nodes: usize,
) -> Result<Vec<f64>, GraphError> {
    if num_nodes == 0 {
        return Ok(vec![]);
    }
    validate_edges(edges, num_nodes as u32)?;

    let sources: Vec<u32> = (0..num_nodes as u32).collect();
    accumulate_from_sources(edges, num_nodes, &sources, 1.0)
}

/// Approximate betweenness centrality from a subset of source nodes.
///
/// Partial dependencies from the `sources` BFS runs are scaled by
/// `num_nodes / sources.len()`. The result is an unbiased estimate when the
/// sources are a uniform sample; it is approximate, not exact.
pub fn betweenness_centrality_sampled(
    edges: &[(u32, u32)],
    num_nodes: usize,
    sources: &[u32],
) -> Result<Vec<f64>, GraphError> {
    if num_nodes == 0 {
        return Ok(vec![]);
    }
    if sources.is_empty() {
        return Err(GraphError::InvalidParameter(
            "sampled centrality requires at least one source".into(),
        ));
    }
    validate_edges(edges, num_nodes as u32)?;
    for &s in sources {
        if s as usize >= num_nodes {
            return Err(GraphError::NodeOutOfBounds(s, num_nodes as u32));
        }
    }

    let scale = num_nodes as f64 / sources.len() as f64;
    accumulate_from_sources(edges, num_nodes, sources, scale)
}

/// Shared single-source shortest-path accumulation (Brandes).
fn accumulate_from_sources(
    edges: &[(u32, u32)],
    num_nodes: usize,
    sources: &[u32],
    scale: f64,
) -> Result<Vec<f64>, GraphError> {
    // Build adjacency once; each parallel BFS only reads it.
    let mut adj: Vec<Vec<u32>> = vec![vec![]; num_nodes];
    for &(src, dst) in edges {
        adj[src as usize].push(dst);
    }

    let partial_scores: Vec<Vec<f64>> = sources
        .par_iter()
        .map(|&source| {
            let source = source as usize;
            let mut partial = vec![0.0; num_nodes];

            // Nodes in order of non-decreasing distance from the source.
            let mut stack: Vec<usize> = Vec::new();
            let mut predecessors: Vec<Vec<usize>> = vec![vec![]; num_nodes];
            let mut num_paths: Vec<f64> = vec![0.0; num_nodes];
            num_paths[source] = 1.0;
            let mut distance: Vec<i32> = vec![-1; num_nodes];
            distance[source] = 0;

            let mut queue = VecDeque::new();
            queue.push_back(source);

            while let Some(v) = queue.pop_front() {
                stack.push(v);
                for &w in &adj[v] {
                    let w = w as usize;
                    if distance[w] < 0 {
                        distance[w] = distance[v] + 1;
                        queue.push_back(w);
                    }
                    if distance[w] == distance[v] + 1 {
                        num_paths[w] += num_paths[v];
                        predecessors[w].push(v);
                    }
                }
            }

            // Back-propagate partial dependencies from the farthest nodes.
            let mut dependency = vec![0.0; num_nodes];
            while let Some(w) = stack.pop() {
                for &v in &predecessors[w] {
                    dependency[v] += (num_paths[v] / num_paths[w]) * (1.0 + dependency[w]);
                }
                if w != source {
                    partial[w] += dependency[w];
                }
            }

            partial
        })
        .collect();

    let mut betweenness = vec![0.0; num_nodes];
    for partial in partial_scores {
        for (i, score) in partial.into_iter().enumerate() {
            betweenness[i] += score * scale;
        }
    }

    Ok(betweenness)
}

/// Find all strongly connected components.
///
/// Components of size > 1 are cycles (mutual recursion, circular imports).
pub fn find_sccs(edges: &[(u32, u32)], num_nodes: usize) -> Result<Vec<Vec<u32>>, GraphError> {
    if num_nodes == 0 {
        return Ok(vec![]);
    }
    validate_edges(edges, num_nodes as u32)?;

    let mut graph: DiGraph<(), ()> = DiGraph::new();
    let node_indices: Vec<_> = (0..num_nodes).map(|_| graph.add_node(())).collect();
    for &(src, dst) in edges {
        graph.add_edge(node_indices[src as usize], node_indices[dst as usize], ());
    }

    let sccs = petgraph_tarjan(&graph);
    Ok(sccs
        .into_iter()
        .map(|scc| scc.into_iter().map(|idx| idx.index() as u32).collect())
        .collect())
}

/// Find only the components that form cycles (size >= `min_size`).
pub fn find_cycles(
    edges: &[(u32, u32)],
    num_nodes: usize,
    min_size: usize,
) -> Result<Vec<Vec<u32>>, GraphError> {
    Ok(find_sccs(edges, num_nodes)?
        .into_iter()
        .filter(|scc| scc.len() >= min_size)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_betweenness_empty_graph() {
        let result = betweenness_centrality(&[], 0).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_betweenness_chain() {
        // 0 -> 1 -> 2: node 1 sits on the only path from 0 to 2.
        let edges = [(0, 1), (1, 2)];
        let scores = betweenness_centrality(&edges, 3).unwrap();
        assert!(scores[1] > scores[0]);
        assert!(scores[1] > scores[2]);
        assert_eq!(scores[0], 0.0);
        assert_eq!(scores[2], 0.0);
    }

    #[test]
    fn test_betweenness_hub() {
        // Star through node 2: 0 -> 2 -> 1, 3 -> 2 -> 4.
        let edges = [(0, 2), (2, 1), (3, 2), (2, 4)];
        let scores = betweenness_centrality(&edges, 5).unwrap();
        let max = scores.iter().cloned().fold(f64::MIN, f64::max);
        assert_eq!(scores[2], max);
    }

    #[test]
    fn test_betweenness_node_out_of_bounds() {
        let result = betweenness_centrality(&[(0, 10)], 5);
        assert_eq!(result, Err(GraphError::NodeOutOfBounds(10, 5)));
    }

    #[test]
    fn test_sampled_matches_exact_when_all_sources() {
        let edges = [(0, 1), (1, 2), (2, 3), (0, 2)];
        let exact = betweenness_centrality(&edges, 4).unwrap();
        let sources: Vec<u32> = (0..4).collect();
        let sampled = betweenness_centrality_sampled(&edges, 4, &sources).unwrap();
        for (a, b) in exact.iter().zip(sampled.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_sampled_requires_sources() {
        let result = betweenness_centrality_sampled(&[(0, 1)], 2, &[]);
        assert!(matches!(result, Err(GraphError::InvalidParameter(_))));
    }

    #[test]
    fn test_sccs_cycle() {
        // 0 -> 1 -> 2 -> 0 is one cycle; 3 is a singleton.
        let edges = [(0, 1), (1, 2), (2, 0), (3, 0)];
        let cycles = find_cycles(&edges, 4, 2).unwrap();
        assert_eq!(cycles.len(), 1);
        let mut members = cycles[0].clone();
        members.sort_unstable();
        assert_eq!(members, vec![0, 1, 2]);
    }

    #[test]
    fn test_sccs_acyclic() {
        let edges = [(0, 1), (1, 2)];
        let cycles = find_cycles(&edges, 3, 2).unwrap();
        assert!(cycles.is_empty());
    }
}
