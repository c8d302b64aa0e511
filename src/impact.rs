//! Change-impact traversal.
//!
//! Walks the reverse dependency graph breadth-first from every changed file
//! at once and records, for each module reached, the fewest hops it takes to
//! get there from any of them.

use crate::dependency_graph::DependencyGraph;
use crate::resolver::PathResolver;
use crate::reverse_index::ReverseGraph;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

pub const DEFAULT_MAX_DEPTH: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactEntry {
    pub file: String,
    pub depth: usize,
}

/// Modules reachable from `seed_files` through reverse edges, nearest first.
///
/// Seeds sit at depth 0 and are never part of the result. A module found at
/// `max_depth` is kept but not expanded. Equal depths are ordered by path.
pub fn impact_of<S: AsRef<str>>(
    seed_files: &[S],
    reverse: &ReverseGraph,
    graph: &DependencyGraph,
    max_depth: usize,
) -> Vec<ImpactEntry> {
    if graph.is_empty() || reverse.is_empty() {
        return Vec::new();
    }

    let resolver = PathResolver::new(graph);
    let mut visited: HashMap<String, usize> = HashMap::new();
    let mut queue: VecDeque<(String, usize)> = VecDeque::new();

    for file in seed_files {
        let node = resolver.resolve(file.as_ref());
        if visited.contains_key(&node) {
            continue;
        }
        visited.insert(node.clone(), 0);
        queue.push_back((node, 0));
    }

    while let Some((node, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        for dependent in reverse.dependents_of(&node) {
            if visited.contains_key(dependent) {
                continue;
            }
            visited.insert(dependent.to_string(), depth + 1);
            queue.push_back((dependent.to_string(), depth + 1));
        }
    }

    let mut impacted: Vec<ImpactEntry> = visited
        .into_iter()
        .filter(|&(_, depth)| depth > 0)
        .map(|(file, depth)| ImpactEntry { file, depth })
        .collect();
    impacted.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.file.cmp(&b.file)));

    debug!(
        "Impact traversal from {} seed(s) reached {} module(s)",
        seed_files.len(),
        impacted.len()
    );
    impacted
}
