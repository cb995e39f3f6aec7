//! Bounded impact traversal over reverse adjacency.
//!
//! Walks the dependents of a node breadth-first, multiplying edge weights
//! along the discovery path so that impact attenuates with distance. The
//! traversal is deterministic: adjacency lists are visited in the order the
//! caller built them (edge-insertion order).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::GraphError;

/// Hard cap on visited nodes, well above any sensible `max_frontier`.
const VISIT_BUDGET: usize = 50_000;

/// Bounds for an impact traversal.
#[derive(Debug, Clone, Copy)]
pub struct ImpactOptions {
    /// Maximum BFS depth from the start node.
    pub max_depth: usize,
    /// Maximum number of discovered nodes; discovery stops once reached.
    pub max_frontier: usize,
    /// Nodes whose path impact falls below this are dropped and not expanded.
    pub min_impact: f64,
}

impl Default for ImpactOptions {
    fn default() -> Self {
        Self {
            max_depth: 5,
            max_frontier: 500,
            min_impact: 0.1,
        }
    }
}

/// One node discovered by an impact traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactNode {
    pub node: u32,
    /// BFS depth at which the node was first discovered.
    pub depth: usize,
    /// Product of edge weights along the discovery path.
    pub impact: f64,
}

/// Result of an impact traversal.
#[derive(Debug, Clone, Default)]
pub struct ImpactSet {
    /// Discovered nodes in BFS discovery order, excluding the start node.
    pub nodes: Vec<ImpactNode>,
    /// Number of depth-1 dependents (before impact filtering).
    pub direct_count: usize,
    /// True when `max_frontier` stopped discovery early.
    pub truncated: bool,
}

/// Traverse dependents of `start` over `reverse_adj`.
///
/// `reverse_adj[t]` lists `(source, weight)` pairs for every edge
/// `source -> t`, in edge-insertion order. The cancellation flag is checked
/// once per dequeued node; a raised flag aborts with [`GraphError::Cancelled`].
pub fn reverse_impact(
    reverse_adj: &[Vec<(u32, f64)>],
    start: u32,
    opts: &ImpactOptions,
    cancelled: &AtomicBool,
) -> Result<ImpactSet, GraphError> {
    let num_nodes = reverse_adj.len();
    if start as usize >= num_nodes {
        return Err(GraphError::NodeOutOfBounds(start, num_nodes as u32));
    }

    let mut result = ImpactSet::default();
    let mut seen = vec![false; num_nodes];
    seen[start as usize] = true;

    let mut queue: VecDeque<ImpactNode> = VecDeque::new();
    queue.push_back(ImpactNode {
        node: start,
        depth: 0,
        impact: 1.0,
    });

    let mut visited = 0usize;
    while let Some(current) = queue.pop_front() {
        if cancelled.load(Ordering::Relaxed) {
            return Err(GraphError::Cancelled);
        }
        visited += 1;
        if visited > VISIT_BUDGET {
            return Err(GraphError::BudgetExceeded(visited));
        }
        if current.depth >= opts.max_depth {
            continue;
        }

        for &(source, weight) in &reverse_adj[current.node as usize] {
            if seen[source as usize] {
                continue;
            }
            seen[source as usize] = true;

            if current.depth == 0 {
                result.direct_count += 1;
            }

            let impact = current.impact * weight;
            if impact < opts.min_impact {
                continue;
            }
            if result.nodes.len() >= opts.max_frontier {
                result.truncated = true;
                return Ok(result);
            }

            let discovered = ImpactNode {
                node: source,
                depth: current.depth + 1,
                impact,
            };
            result.nodes.push(discovered.clone());
            queue.push_back(discovered);
        }
    }

    Ok(result)
}
