pub mod analyzer;
pub mod changes;
pub mod config;
pub mod dependency_graph;
pub mod exports;
pub mod file_discovery;
pub mod graph_extractor;
pub mod impact;
pub mod paths;
pub mod reporter;
pub mod resolver;
pub mod reverse_index;
pub mod tsconfig;

pub use analyzer::Analyzer;
pub use config::Config;
pub use dependency_graph::{DependencyGraph, GraphDocument, GraphError};
pub use exports::{ExportScanner, SymbolExtractor};
pub use graph_extractor::{GraphExtractor, ImportScanner};
pub use impact::{impact_of, ImpactEntry, DEFAULT_MAX_DEPTH};
pub use reporter::{ImpactReport, Reporter, DEFAULT_EXPORT_LIMIT};
pub use resolver::PathResolver;
pub use reverse_index::ReverseGraph;
pub use tsconfig::PathAliases;

pub type Result<T> = anyhow::Result<T>;
