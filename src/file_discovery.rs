use crate::config::Config;
use crate::paths::{has_source_extension, normalize};
use ignore::WalkBuilder;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the project root, `/`-separated. Used as the module
    /// key in the emitted graph.
    pub module_path: String,
    pub size: u64,
}

/// Walks source roots collecting the files that go into the dependency graph.
pub struct FileDiscovery {
    config: Config,
    wildcard_patterns: Vec<Regex>,
}

impl FileDiscovery {
    pub fn new(config: Config) -> Self {
        let wildcard_patterns = config
            .ignore_patterns
            .iter()
            .filter(|p| p.contains('*') && !p.starts_with("*."))
            .filter_map(|p| Regex::new(&format!("^{}$", regex::escape(p).replace(r"\*", ".*"))).ok())
            .collect();

        Self {
            config,
            wildcard_patterns,
        }
    }

    pub fn discover_files(&self, roots: &[PathBuf]) -> crate::Result<Vec<SourceFile>> {
        let mut files = Vec::new();

        for root in roots {
            let walker = WalkBuilder::new(root)
                .standard_filters(true)
                .hidden(false)
                .git_ignore(true)
                .git_global(true)
                .git_exclude(true)
                .build();

            for result in walker {
                let entry = result?;
                let path = entry.path();

                if !path.is_file() || self.should_ignore_file(path) {
                    continue;
                }

                if let Some(file) = self.process_file(path)? {
                    files.push(file);
                }
            }
        }

        files.sort_by(|a, b| a.module_path.cmp(&b.module_path));
        files.dedup_by(|a, b| a.module_path == b.module_path);
        let total_bytes: u64 = files.iter().map(|f| f.size).sum();
        debug!("Discovered {} source files ({} bytes)", files.len(), total_bytes);
        Ok(files)
    }

    fn should_ignore_file(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.config.project_root).unwrap_or(path);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        for pattern in &self.config.ignore_patterns {
            if let Some(suffix) = pattern.strip_prefix('*') {
                if !suffix.contains('*') && suffix.starts_with('.') && file_name.ends_with(suffix) {
                    return true;
                }
            } else if !pattern.contains('*')
                && relative
                    .components()
                    .any(|c| c.as_os_str().to_string_lossy() == *pattern)
            {
                return true;
            }
        }

        self.wildcard_patterns.iter().any(|re| re.is_match(&file_name))
    }

    fn process_file(&self, path: &Path) -> crate::Result<Option<SourceFile>> {
        let module_path = self.module_path(path);
        if !has_source_extension(&module_path, &self.config.source_extensions) {
            return Ok(None);
        }

        let size = fs::metadata(path)?.len();
        if size > self.config.max_file_size as u64 {
            debug!("Skipping {} ({} bytes)", module_path, size);
            return Ok(None);
        }

        Ok(Some(SourceFile {
            path: path.to_path_buf(),
            module_path,
            size,
        }))
    }

    /// Module key for a file on disk: relative to the project root when
    /// possible, separators normalized.
    pub fn module_path(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.config.project_root).unwrap_or(path);
        let relative = relative.strip_prefix(".").unwrap_or(relative);
        normalize(&relative.to_string_lossy())
    }
}
