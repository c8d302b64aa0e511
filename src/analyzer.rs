use crate::{
    config::Config,
    dependency_graph::{DependencyGraph, GraphDocument},
    exports::{ExportScanner, SymbolExtractor},
    graph_extractor::{GraphExtractor, ImportScanner},
    impact::impact_of,
    reporter::{ImpactReport, Reporter},
    reverse_index::ReverseGraph,
};
use crate::Result;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Runs one impact analysis: graph load, reverse index, traversal, exports.
pub struct Analyzer {
    config: Config,
    reporter: Reporter,
}

impl Analyzer {
    pub fn new(config: Config) -> Self {
        let reporter = Reporter::new(config.impact.export_limit);
        Self { config, reporter }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Impact report for `changed`. Never fails: a missing or broken graph
    /// gives a report with no impacted modules and no exports.
    pub fn analyze(&self, changed: Vec<String>, extractor: &dyn SymbolExtractor) -> ImpactReport {
        let graph_file = self.config.graph_file();
        let Some(graph) = DependencyGraph::load(&graph_file) else {
            info!("No usable dependency graph at {}, reporting no impact", graph_file.display());
            return ImpactReport::degenerate(changed);
        };
        self.analyze_with_graph(changed, &graph, extractor)
    }

    pub fn analyze_with_graph(
        &self,
        changed: Vec<String>,
        graph: &DependencyGraph,
        extractor: &dyn SymbolExtractor,
    ) -> ImpactReport {
        let analysis = graph.analyze_dependencies();
        info!(
            "Dependency graph: {} modules, {} resolved edges, {} unresolved, {} cycles",
            analysis.total_modules,
            analysis.resolved_edges,
            analysis.unresolved_edges,
            analysis.cycles.len()
        );
        for cycle in &analysis.cycles {
            debug!("Cycle: {}", cycle.join(" -> "));
        }

        let reverse = ReverseGraph::build(graph);
        debug!(
            "Reverse index: {} modules with dependents, {} edges",
            reverse.len(),
            reverse.edge_count()
        );

        let impacted = impact_of(changed.as_slice(), &reverse, graph, self.config.impact.max_depth);
        info!(
            "{} changed files impact {} modules (max depth {})",
            changed.len(),
            impacted.len(),
            self.config.impact.max_depth
        );

        self.reporter.assemble(changed, impacted, extractor)
    }

    /// Analyzes `changed` with exports read from the project tree and writes
    /// the report. Only a failed write is an error.
    pub fn run(&self, changed: Vec<String>) -> Result<(ImpactReport, PathBuf)> {
        let scanner = ExportScanner::new(&self.config.project_root)?;
        let report = self.analyze(changed, &scanner);

        let report_file = self.config.report_file();
        self.reporter.write_report(&report, &report_file)?;
        info!("Wrote {}", report_file.display());
        Ok((report, report_file))
    }

    /// Scans the configured source roots and writes the graph document.
    pub fn build_graph(&self) -> Result<(GraphDocument, PathBuf)> {
        let roots = self.config.existing_source_roots();
        info!(
            "Building dependency graph from {}",
            roots
                .iter()
                .map(|r| r.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let document = ImportScanner::new(self.config.clone())?.extract_graph(&roots)?;

        let graph_file = self.config.graph_file();
        if let Some(parent) = graph_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&graph_file, serde_json::to_string_pretty(&document)?)?;
        info!("Dependency graph written to {}", graph_file.display());
        Ok((document, graph_file))
    }
}
