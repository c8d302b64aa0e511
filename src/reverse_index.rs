use crate::dependency_graph::DependencyGraph;
use std::collections::{BTreeSet, HashMap};

/// Module path -> modules that declare a resolved dependency on it.
///
/// Derived from a [`DependencyGraph`] in one pass and never updated in place;
/// rebuild it when the graph changes.
#[derive(Debug, Clone, Default)]
pub struct ReverseGraph {
    dependents: HashMap<String, BTreeSet<String>>,
}

impl ReverseGraph {
    pub fn build(graph: &DependencyGraph) -> Self {
        let mut dependents: HashMap<String, BTreeSet<String>> = HashMap::new();

        for module in graph.modules() {
            for target in module.dependencies.iter().filter_map(|d| d.resolved.as_ref()) {
                dependents
                    .entry(target.clone())
                    .or_default()
                    .insert(module.path.clone());
            }
        }

        Self { dependents }
    }

    /// Direct dependents of `path`, in lexicographic order.
    pub fn dependents_of(&self, path: &str) -> impl Iterator<Item = &str> {
        self.dependents
            .get(path)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.dependents.contains_key(path)
    }

    /// Number of modules with at least one dependent.
    pub fn len(&self) -> usize {
        self.dependents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.dependents.values().map(BTreeSet::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(raw: &str) -> DependencyGraph {
        DependencyGraph::from_json(raw).unwrap()
    }

    #[test]
    fn test_inverts_resolved_edges() {
        let reverse = ReverseGraph::build(&graph(
            r#"{"modules":[
                {"source":"a.ts","dependencies":[{"resolved":"c.ts"}]},
                {"source":"b.ts","dependencies":[{"resolved":"c.ts"}]},
                {"source":"c.ts","dependencies":[]}
            ]}"#,
        ));
        assert_eq!(reverse.len(), 1);
        assert_eq!(reverse.dependents_of("c.ts").collect::<Vec<_>>(), vec!["a.ts", "b.ts"]);
        assert_eq!(reverse.dependents_of("a.ts").count(), 0);
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let reverse = ReverseGraph::build(&graph(
            r#"{"modules":[
                {"source":"a.ts","dependencies":[{"resolved":"b.ts"},{"resolved":"b.ts"}]}
            ]}"#,
        ));
        assert_eq!(reverse.edge_count(), 1);
    }

    #[test]
    fn test_unresolved_edges_are_skipped() {
        let reverse = ReverseGraph::build(&graph(
            r#"{"modules":[
                {"source":"a.ts","dependencies":[{},{"resolved":null},{"resolved":""}]}
            ]}"#,
        ));
        assert!(reverse.is_empty());
        assert_eq!(reverse.edge_count(), 0);
    }

    #[test]
    fn test_keys_and_values_come_from_resolved_edges() {
        let g = graph(
            r#"{"modules":[
                {"source":"src\\a.ts","dependencies":[{"resolved":"src\\b.ts"},{"module":"lodash"}]},
                {"source":"src/b.ts","dependencies":[]}
            ]}"#,
        );
        let reverse = ReverseGraph::build(&g);
        assert!(reverse.contains("src/b.ts"));
        assert!(!reverse.contains("lodash"));
        assert_eq!(reverse.dependents_of("src/b.ts").collect::<Vec<_>>(), vec!["src/a.ts"]);
    }
}
