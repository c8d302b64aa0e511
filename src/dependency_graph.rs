use crate::paths::normalize;
use petgraph::{algo::tarjan_scc, graph::NodeIndex, Directed, Graph};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Module graph as emitted by a dependency extractor. Only the fields the
/// engine reads are modelled; anything else in the document is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub modules: Vec<ModuleEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleEntry {
    pub source: String,
    #[serde(default)]
    pub dependencies: Vec<DependencyEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyEntry {
    /// Target module, or `None` for external packages and anything the
    /// extractor could not map onto a file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<String>,
}

/// Raw shape used while parsing, so a document without `modules` can be
/// told apart from one with an empty list.
#[derive(Deserialize)]
struct RawDocument {
    modules: Option<Vec<ModuleEntry>>,
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("dependency graph not found at {0}")]
    Missing(PathBuf),
    #[error("failed to read dependency graph {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed dependency graph: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("dependency graph has no `modules` field")]
    MissingModules,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub path: String,
    pub dependencies: Vec<Dependency>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub resolved: Option<String>,
}

impl Dependency {
    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }
}

pub type ModuleGraph = Graph<String, (), Directed>;

/// In-memory dependency graph. Paths are normalized once, here, so every
/// later comparison works on the canonical form.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    modules: Vec<Module>,
    module_index: HashMap<String, usize>,
    graph: ModuleGraph,
    node_map: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn from_document(document: GraphDocument) -> Self {
        let mut dependency_graph = Self::default();

        for entry in document.modules {
            let path = normalize(&entry.source);
            let dependencies = entry
                .dependencies
                .into_iter()
                .map(|d| Dependency {
                    resolved: d
                        .resolved
                        .as_deref()
                        .filter(|r| !r.is_empty())
                        .map(normalize),
                })
                .collect();

            // A module listed twice keeps its first declaration.
            if dependency_graph.module_index.contains_key(&path) {
                debug!("Duplicate module entry for {}, keeping the first", path);
                continue;
            }
            dependency_graph
                .module_index
                .insert(path.clone(), dependency_graph.modules.len());
            dependency_graph.modules.push(Module { path, dependencies });
        }

        dependency_graph.build_graph();
        dependency_graph
    }

    pub fn from_json(raw: &str) -> Result<Self, GraphError> {
        let raw: RawDocument = serde_json::from_str(raw)?;
        let modules = raw.modules.ok_or(GraphError::MissingModules)?;
        Ok(Self::from_document(GraphDocument { modules }))
    }

    pub fn read(path: &Path) -> Result<Self, GraphError> {
        if !path.exists() {
            return Err(GraphError::Missing(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| GraphError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Loads the graph, or `None` when it is absent or unusable. Callers
    /// degrade to an empty impact instead of failing.
    pub fn load(path: &Path) -> Option<Self> {
        match Self::read(path) {
            Ok(graph) => {
                debug!(
                    "Loaded dependency graph from {} ({} modules)",
                    path.display(),
                    graph.module_count()
                );
                Some(graph)
            }
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }

    fn build_graph(&mut self) {
        for module in &self.modules {
            Self::ensure_node(&mut self.graph, &mut self.node_map, &module.path);
        }

        for module in &self.modules {
            let from = self.node_map[&module.path];
            for target in module.dependencies.iter().filter_map(|d| d.resolved.as_ref()) {
                let to = Self::ensure_node(&mut self.graph, &mut self.node_map, target);
                if self.graph.find_edge(from, to).is_none() {
                    self.graph.add_edge(from, to, ());
                }
            }
        }
    }

    fn ensure_node(
        graph: &mut ModuleGraph,
        node_map: &mut HashMap<String, NodeIndex>,
        path: &str,
    ) -> NodeIndex {
        if let Some(&index) = node_map.get(path) {
            return index;
        }
        let index = graph.add_node(path.to_string());
        node_map.insert(path.to_string(), index);
        index
    }

    /// Modules in document order.
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, path: &str) -> Option<&Module> {
        self.module_index.get(path).map(|&i| &self.modules[i])
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn analyze_dependencies(&self) -> DependencyAnalysis {
        let resolved_edges = self.graph.edge_count();
        let unresolved_edges = self
            .modules
            .iter()
            .flat_map(|m| m.dependencies.iter())
            .filter(|d| !d.is_resolved())
            .count();

        let mut cycles: Vec<Vec<String>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || scc.iter().any(|&n| self.graph.find_edge(n, n).is_some())
            })
            .map(|scc| {
                let mut members: Vec<String> =
                    scc.into_iter().map(|n| self.graph[n].clone()).collect();
                members.sort();
                members
            })
            .collect();
        cycles.sort();

        let total_modules = self.modules.len();
        DependencyAnalysis {
            total_modules,
            total_nodes: self.graph.node_count(),
            resolved_edges,
            unresolved_edges,
            cycles,
            avg_degree: if total_modules > 0 {
                resolved_edges as f64 / total_modules as f64
            } else {
                0.0
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyAnalysis {
    pub total_modules: usize,
    /// Declared modules plus resolved targets that were never declared.
    pub total_nodes: usize,
    pub resolved_edges: usize,
    pub unresolved_edges: usize,
    pub cycles: Vec<Vec<String>>,
    pub avg_degree: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(raw: &str) -> DependencyGraph {
        DependencyGraph::from_json(raw).unwrap()
    }

    #[test]
    fn test_from_json_normalizes_paths() {
        let graph = doc(
            r#"{"modules":[{"source":"src\\a.ts","dependencies":[{"resolved":"src\\b.ts"}]}]}"#,
        );
        let module = graph.module("src/a.ts").unwrap();
        assert_eq!(module.dependencies[0].resolved.as_deref(), Some("src/b.ts"));
    }

    #[test]
    fn test_ignores_extra_fields() {
        let graph = doc(
            r#"{
                "modules": [
                    {
                        "source": "src/a.ts",
                        "valid": true,
                        "dependencies": [
                            {"module": "./b", "resolved": "src/b.ts", "dynamic": false},
                            {"module": "react", "couldNotResolve": false}
                        ]
                    },
                    {"source": "src/b.ts"}
                ],
                "summary": {"violations": []}
            }"#,
        );
        assert_eq!(graph.module_count(), 2);
        let a = graph.module("src/a.ts").unwrap();
        assert!(a.dependencies[0].is_resolved());
        assert!(!a.dependencies[1].is_resolved());
        assert!(graph.module("src/b.ts").unwrap().dependencies.is_empty());
    }

    #[test]
    fn test_missing_modules_is_an_error() {
        let err = DependencyGraph::from_json(r#"{"summary":{}}"#).unwrap_err();
        assert!(matches!(err, GraphError::MissingModules));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let err = DependencyGraph::from_json("{not json").unwrap_err();
        assert!(matches!(err, GraphError::Malformed(_)));
    }

    #[test]
    fn test_load_missing_file_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DependencyGraph::load(&dir.path().join("dep-graph.json")).is_none());
        assert!(matches!(
            DependencyGraph::read(&dir.path().join("dep-graph.json")),
            Err(GraphError::Missing(_))
        ));
    }

    #[test]
    fn test_load_malformed_file_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dep-graph.json");
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(DependencyGraph::load(&path).is_none());
    }

    #[test]
    fn test_duplicate_module_keeps_first() {
        let graph = doc(
            r#"{"modules":[
                {"source":"a.ts","dependencies":[{"resolved":"b.ts"}]},
                {"source":"a.ts","dependencies":[]}
            ]}"#,
        );
        assert_eq!(graph.module_count(), 1);
        assert_eq!(graph.module("a.ts").unwrap().dependencies.len(), 1);
    }

    #[test]
    fn test_analyze_counts_and_cycles() {
        let graph = doc(
            r#"{"modules":[
                {"source":"a.ts","dependencies":[{"resolved":"b.ts"},{"resolved":"b.ts"},{}]},
                {"source":"b.ts","dependencies":[{"resolved":"a.ts"}]},
                {"source":"c.ts","dependencies":[{"resolved":"lib/external.ts"}]}
            ]}"#,
        );
        let analysis = graph.analyze_dependencies();
        assert_eq!(analysis.total_modules, 3);
        assert_eq!(analysis.total_nodes, 4);
        assert_eq!(analysis.resolved_edges, 3);
        assert_eq!(analysis.unresolved_edges, 1);
        assert_eq!(analysis.cycles, vec![vec!["a.ts".to_string(), "b.ts".to_string()]]);
    }

    #[test]
    fn test_self_import_counts_as_cycle() {
        let graph = doc(r#"{"modules":[{"source":"a.ts","dependencies":[{"resolved":"a.ts"}]}]}"#);
        assert_eq!(graph.analyze_dependencies().cycles.len(), 1);
    }
}
