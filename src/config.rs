use crate::impact::DEFAULT_MAX_DEPTH;
use crate::reporter::DEFAULT_EXPORT_LIMIT;
use serde::{Deserialize, Serialize};
use std::{
    env,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Repository root; every other relative path is resolved against it.
    pub project_root: PathBuf,
    pub graph_path: PathBuf,
    pub report_path: PathBuf,
    pub source_roots: Vec<String>,
    pub source_extensions: Vec<String>,
    pub ignore_patterns: Vec<String>,
    pub max_file_size: usize,
    pub impact: ImpactConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactConfig {
    pub max_depth: usize,
    pub export_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            graph_path: PathBuf::from(".github/ai/dep-graph.json"),
            report_path: PathBuf::from(".github/ai/impact.json"),
            source_roots: vec![
                "src".to_string(),
                "app".to_string(),
                "server".to_string(),
            ],
            source_extensions: vec![
                "ts".to_string(),
                "tsx".to_string(),
                "js".to_string(),
                "jsx".to_string(),
            ],
            ignore_patterns: vec![
                "node_modules".to_string(),
                "dist".to_string(),
                "build".to_string(),
                "coverage".to_string(),
                ".github".to_string(),
                ".next".to_string(),
                "out".to_string(),
                "*.min.js".to_string(),
                "*.d.ts".to_string(),
            ],
            max_file_size: 1024 * 1024, // 1MB
            impact: ImpactConfig::default(),
        }
    }
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            export_limit: DEFAULT_EXPORT_LIMIT,
        }
    }
}

impl Config {
    /// Get the default config file path (~/.impact-examer.toml)
    pub fn default_config_path() -> crate::Result<PathBuf> {
        let home_dir = env::var("HOME")
            .or_else(|_| env::var("USERPROFILE"))
            .map_err(|_| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(PathBuf::from(home_dir).join(".impact-examer.toml"))
    }

    /// Load config from the default location, falling back to defaults if
    /// the file doesn't exist or the home directory is unknown.
    pub fn load() -> crate::Result<Self> {
        let config_path = match Self::default_config_path() {
            Ok(path) => path,
            Err(_) => return Ok(Self::default()),
        };

        if config_path.exists() {
            info!("Loading configuration from {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            info!("No config file found at {}, using defaults", config_path.display());
            Ok(Self::default())
        }
    }

    /// `from_file` when a path is given, `load` otherwise. A config that
    /// cannot be read or parsed is logged and replaced by the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let loaded = match path {
            Some(path) => Self::from_file(path),
            None => Self::load(),
        };
        loaded.unwrap_or_else(|e| {
            warn!("Ignoring unusable configuration, using defaults: {:#}", e);
            Self::default()
        })
    }

    /// Load config from a specific file path
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to a file
    pub fn to_file(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// `path` resolved against the project root, unless already absolute.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    pub fn graph_file(&self) -> PathBuf {
        self.resolve_path(&self.graph_path)
    }

    pub fn report_file(&self) -> PathBuf {
        self.resolve_path(&self.report_path)
    }

    /// Source roots that exist under the project root; the root itself when
    /// none do.
    pub fn existing_source_roots(&self) -> Vec<PathBuf> {
        let roots: Vec<PathBuf> = self
            .source_roots
            .iter()
            .map(|r| self.project_root.join(r))
            .filter(|p| p.is_dir())
            .collect();

        if roots.is_empty() {
            vec![self.project_root.clone()]
        } else {
            roots
        }
    }

    /// Create a config file with all available options documented
    pub fn create_documented_config() -> String {
        format!(r#"# Impact Examer Configuration File
# Controls how change impact is computed for a code review run

# Repository root; relative paths below are resolved against it
project_root = "."

# Dependency graph consumed by `impact-examer analyze`
# and written by `impact-examer graph`
graph_path = ".github/ai/dep-graph.json"

# Where the impact report is written
report_path = ".github/ai/impact.json"

# Directories scanned when building the dependency graph.
# Missing directories are skipped; if none exist the whole root is scanned.
source_roots = ["src", "app", "server"]

# Changed files outside these extensions are ignored
source_extensions = ["ts", "tsx", "js", "jsx"]

# Patterns to skip while building the dependency graph
ignore_patterns = [
    "node_modules",
    "dist",
    "build",
    "coverage",
    ".github",
    ".next",
    "out",
    "*.min.js",
    "*.d.ts"
]

# Maximum file size to scan (in bytes, default 1MB)
max_file_size = 1048576

[impact]
# Maximum dependency distance followed from a changed file
max_depth = {max_depth}

# How many impacted files get their exports listed in the report
export_limit = {export_limit}
"#,
            max_depth = DEFAULT_MAX_DEPTH,
            export_limit = DEFAULT_EXPORT_LIMIT,
        )
    }
}
