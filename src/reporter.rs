use crate::exports::SymbolExtractor;
use crate::impact::ImpactEntry;
use crate::paths::normalize;
use crate::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::{fs, path::Path};
use tracing::{debug, warn};

pub const DEFAULT_EXPORT_LIMIT: usize = 50;

/// The artifact handed to the review step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactReport {
    pub changed: Vec<String>,
    /// Sorted by depth, nearest first.
    pub impacted: Vec<ImpactEntry>,
    pub exports: BTreeMap<String, Vec<String>>,
}

impl ImpactReport {
    /// Report for a run without a usable dependency graph.
    pub fn degenerate(changed: Vec<String>) -> Self {
        Self {
            changed,
            impacted: Vec::new(),
            exports: BTreeMap::new(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn print_summary(&self) {
        println!("📊 Impact Summary");
        println!("=================");
        println!("  Changed files: {}", self.changed.len());
        println!("  Impacted modules: {}", self.impacted.len());

        let mut by_depth: BTreeMap<usize, usize> = BTreeMap::new();
        for entry in &self.impacted {
            *by_depth.entry(entry.depth).or_insert(0) += 1;
        }
        for (depth, count) in by_depth {
            println!("    depth {}: {} modules", depth, count);
        }

        let symbols: usize = self.exports.values().map(Vec::len).sum();
        println!("  Exported symbols listed: {} across {} files", symbols, self.exports.len());
    }
}

pub struct Reporter {
    export_limit: usize,
}

impl Reporter {
    pub fn new(export_limit: usize) -> Self {
        Self { export_limit }
    }

    /// Combines the changed files, the impact list and the exports of the
    /// changed files plus the nearest `export_limit` impacted modules.
    pub fn assemble(
        &self,
        changed: Vec<String>,
        impacted: Vec<ImpactEntry>,
        extractor: &dyn SymbolExtractor,
    ) -> ImpactReport {
        let targets = self.export_targets(&changed, &impacted);
        debug!("Collecting exports for {} files", targets.len());

        let exports = targets
            .par_iter()
            .map(|path| {
                let symbols = match extractor.extract_exports(path) {
                    Ok(symbols) => symbols,
                    Err(e) => {
                        warn!("Export extraction failed for {}: {:#}", path, e);
                        Vec::new()
                    }
                };
                (path.clone(), symbols)
            })
            .collect::<BTreeMap<_, _>>();

        ImpactReport {
            changed,
            impacted,
            exports,
        }
    }

    fn export_targets(&self, changed: &[String], impacted: &[ImpactEntry]) -> Vec<String> {
        let mut seen = HashSet::new();
        changed
            .iter()
            .map(|c| normalize(c))
            .chain(impacted.iter().take(self.export_limit).map(|e| e.file.clone()))
            .filter(|path| seen.insert(path.clone()))
            .collect()
    }

    /// Writes the report as pretty JSON, creating parent directories.
    pub fn write_report(&self, report: &ImpactReport, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, report.to_json()?)?;
        Ok(())
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(DEFAULT_EXPORT_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeExtractor {
        symbols: HashMap<String, Vec<String>>,
        failing: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeExtractor {
        fn with(mut self, path: &str, symbols: &[&str]) -> Self {
            self.symbols
                .insert(path.to_string(), symbols.iter().map(|s| s.to_string()).collect());
            self
        }

        fn failing(mut self, path: &str) -> Self {
            self.failing.insert(path.to_string());
            self
        }
    }

    impl SymbolExtractor for FakeExtractor {
        fn extract_exports(&self, path: &str) -> Result<Vec<String>> {
            self.calls.lock().unwrap().push(path.to_string());
            if self.failing.contains(path) {
                return Err(anyhow!("parse error"));
            }
            Ok(self.symbols.get(path).cloned().unwrap_or_default())
        }
    }

    fn entry(file: &str, depth: usize) -> ImpactEntry {
        ImpactEntry {
            file: file.to_string(),
            depth,
        }
    }

    #[test]
    fn test_assemble_collects_changed_and_impacted_exports() {
        let extractor = FakeExtractor::default()
            .with("src/c.ts", &["c"])
            .with("src/b.ts", &["useB", "B"]);
        let report = Reporter::default().assemble(
            vec!["src/c.ts".to_string()],
            vec![entry("src/b.ts", 1), entry("src/a.ts", 2)],
            &extractor,
        );

        assert_eq!(report.changed, vec!["src/c.ts"]);
        assert_eq!(report.impacted.len(), 2);
        assert_eq!(report.exports["src/c.ts"], vec!["c"]);
        assert_eq!(report.exports["src/b.ts"], vec!["useB", "B"]);
        assert!(report.exports["src/a.ts"].is_empty());
    }

    #[test]
    fn test_export_limit_bounds_impacted_files() {
        let extractor = FakeExtractor::default();
        let impacted: Vec<ImpactEntry> = (0..10).map(|i| entry(&format!("m{}.ts", i), 1)).collect();
        let report = Reporter::new(3).assemble(vec!["seed.ts".to_string()], impacted, &extractor);

        assert_eq!(report.impacted.len(), 10);
        let keys: Vec<&str> = report.exports.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["m0.ts", "m1.ts", "m2.ts", "seed.ts"]);
    }

    #[test]
    fn test_failure_for_one_file_only_empties_that_file() {
        let extractor = FakeExtractor::default()
            .with("ok.ts", &["fine"])
            .failing("broken.ts");
        let report = Reporter::default().assemble(
            vec!["ok.ts".to_string(), "broken.ts".to_string()],
            Vec::new(),
            &extractor,
        );
        assert_eq!(report.exports["ok.ts"], vec!["fine"]);
        assert!(report.exports["broken.ts"].is_empty());
    }

    #[test]
    fn test_each_file_extracted_once() {
        let extractor = FakeExtractor::default();
        Reporter::default().assemble(
            vec!["a.ts".to_string(), "a.ts".to_string()],
            vec![entry("a.ts", 1), entry("b.ts", 1)],
            &extractor,
        );
        let mut calls = extractor.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, vec!["a.ts", "b.ts"]);
    }

    #[test]
    fn test_degenerate_report_shape() {
        let report = ImpactReport::degenerate(vec!["src/a.ts".to_string()]);
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "changed": ["src/a.ts"],
                "impacted": [],
                "exports": {}
            })
        );
    }

    #[test]
    fn test_report_json_shape() {
        let mut report = ImpactReport::degenerate(vec!["C".to_string()]);
        report.impacted = vec![entry("B", 1), entry("A", 2)];
        report.exports.insert("C".to_string(), vec!["foo".to_string()]);
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "changed": ["C"],
                "impacted": [{"file": "B", "depth": 1}, {"file": "A", "depth": 2}],
                "exports": {"C": ["foo"]}
            })
        );
    }

    #[test]
    fn test_write_report_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".github/ai/impact.json");
        let report = ImpactReport::degenerate(vec!["a.ts".to_string()]);
        Reporter::default().write_report(&report, &path).unwrap();

        let written: ImpactReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, report);
    }
}
