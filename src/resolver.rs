use crate::dependency_graph::DependencyGraph;
use crate::paths::{normalize, strip_source_extension};
use std::collections::HashMap;

/// Maps changed-file paths onto graph module keys.
///
/// Matching order: exact key, then the same path with its source extension
/// ignored, then a suffix match on a path boundary (for graphs keyed with a
/// prefix the changed paths lack). Unmatched paths come back normalized.
pub struct PathResolver<'a> {
    graph: &'a DependencyGraph,
    /// Extension-stripped module path -> first module declared with it.
    stems: HashMap<&'a str, &'a str>,
}

impl<'a> PathResolver<'a> {
    pub fn new(graph: &'a DependencyGraph) -> Self {
        let mut stems = HashMap::new();
        for module in graph.modules() {
            stems
                .entry(strip_source_extension(&module.path))
                .or_insert(module.path.as_str());
        }
        Self { graph, stems }
    }

    pub fn resolve(&self, file: &str) -> String {
        self.find(file)
            .map(str::to_string)
            .unwrap_or_else(|| normalize(file))
    }

    /// The matching module key, if any.
    pub fn find(&self, file: &str) -> Option<&'a str> {
        let normalized = normalize(file);
        let candidate = normalized.strip_prefix("./").unwrap_or(&normalized);
        if candidate.is_empty() {
            return None;
        }

        if let Some(module) = self.graph.module(candidate) {
            return Some(module.path.as_str());
        }

        let stem = strip_source_extension(candidate);
        if let Some(&path) = self.stems.get(stem) {
            return Some(path);
        }

        self.find_by_suffix(candidate, stem)
    }

    fn find_by_suffix(&self, candidate: &str, stem: &str) -> Option<&'a str> {
        let ends_with_segment = |path: &str, suffix: &str| {
            path.strip_suffix(suffix)
                .map(|prefix| prefix.ends_with('/'))
                .unwrap_or(false)
        };

        self.graph
            .modules()
            .iter()
            .map(|m| m.path.as_str())
            .find(|path| {
                ends_with_segment(path, candidate)
                    || ends_with_segment(strip_source_extension(path), stem)
            })
    }
}
