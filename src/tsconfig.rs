//! `compilerOptions.baseUrl` / `paths` from the project's tsconfig.json, so
//! aliased imports such as `@/lib/util` can be mapped onto files.

use crate::paths::normalize;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TsConfig {
    #[serde(default)]
    compiler_options: CompilerOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompilerOptions {
    base_url: Option<String>,
    #[serde(default)]
    paths: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AliasPattern {
    prefix: String,
    /// `None` for exact patterns without a `*`.
    suffix: Option<String>,
    targets: Vec<String>,
}

/// Path aliases, with every target expressed relative to the project root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathAliases {
    base_url: Option<String>,
    /// Longest prefix first; that is the pattern TypeScript picks.
    patterns: Vec<AliasPattern>,
}

impl PathAliases {
    /// Reads `tsconfig.json` under `root`. Absent or unparseable files give
    /// `None`; the graph then only resolves relative imports.
    pub fn load(root: &Path) -> Option<Self> {
        let path = root.join("tsconfig.json");
        if !path.is_file() {
            return None;
        }
        let parsed = std::fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|raw| Self::from_json(&raw));
        match parsed {
            Ok(aliases) => {
                debug!("Loaded {} path aliases from {}", aliases.patterns.len(), path.display());
                Some(aliases)
            }
            Err(e) => {
                warn!("Ignoring {}: {:#}", path.display(), e);
                None
            }
        }
    }

    /// Parses tsconfig content. Comments and trailing commas are accepted,
    /// as `tsc` accepts them.
    pub fn from_json(raw: &str) -> crate::Result<Self> {
        let config: TsConfig = match serde_json::from_str(raw) {
            Ok(config) => config,
            Err(_) => serde_json::from_str(&strip_jsonc(raw))?,
        };
        let options = config.compiler_options;

        // Without baseUrl, `paths` targets are relative to the tsconfig itself.
        let base_url = options.base_url.as_deref().map(join_root);
        let target_base = base_url.clone().unwrap_or_default();

        let mut patterns: Vec<AliasPattern> = options
            .paths
            .into_iter()
            .map(|(pattern, targets)| {
                let targets = targets.iter().map(|t| join_under(&target_base, t)).collect();
                match pattern.split_once('*') {
                    Some((prefix, suffix)) => AliasPattern {
                        prefix: prefix.to_string(),
                        suffix: Some(suffix.to_string()),
                        targets,
                    },
                    None => AliasPattern {
                        prefix: pattern,
                        suffix: None,
                        targets,
                    },
                }
            })
            .collect();
        patterns.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()).then_with(|| a.prefix.cmp(&b.prefix)));

        Ok(Self { base_url, patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.base_url.is_none() && self.patterns.is_empty()
    }

    /// Root-relative paths (without extension handling) a bare specifier may
    /// refer to, most specific first.
    pub fn candidates(&self, specifier: &str) -> Vec<String> {
        let mut candidates = Vec::new();

        for pattern in &self.patterns {
            let captured = match &pattern.suffix {
                None if specifier == pattern.prefix => Some(""),
                None => None,
                Some(suffix) => specifier
                    .strip_prefix(pattern.prefix.as_str())
                    .and_then(|rest| rest.strip_suffix(suffix.as_str())),
            };
            if let Some(captured) = captured {
                candidates.extend(pattern.targets.iter().map(|t| t.replacen('*', captured, 1)));
                break;
            }
        }

        if let Some(base_url) = &self.base_url {
            candidates.push(join_under(base_url, specifier));
        }

        candidates
    }
}

fn join_root(path: &str) -> String {
    join_under("", path)
}

/// `dir/path` with `.` segments removed and `..` applied.
fn join_under(dir: &str, path: &str) -> String {
    let mut parts: Vec<&str> = dir.split('/').filter(|p| !p.is_empty()).collect();
    let path = normalize(path);
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// Drops `//` and `/* */` comments outside strings, then trailing commas.
fn strip_jsonc(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let next = chars.peek().copied();
        match (c, next) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut previous = '\0';
                for next in chars.by_ref() {
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
            }
            _ => out.push(c),
        }
    }

    match Regex::new(r",(\s*[}\]])") {
        Ok(trailing_comma) => trailing_comma.replace_all(&out, "$1").into_owned(),
        Err(_) => out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_alias_without_base_url() {
        let aliases = PathAliases::from_json(r#"{"compilerOptions":{"paths":{"@/*":["src/*"]}}}"#).unwrap();
        assert_eq!(aliases.candidates("@/lib/util"), vec!["src/lib/util"]);
        assert!(aliases.candidates("react").is_empty());
    }

    #[test]
    fn test_base_url_and_longest_prefix() {
        let aliases = PathAliases::from_json(
            r#"{"compilerOptions":{
                "baseUrl": "./src",
                "paths": {
                    "@app/*": ["app/*"],
                    "@app/components/*": ["ui/components/*", "legacy/*"],
                    "config": ["config/index.ts"]
                }
            }}"#,
        )
        .unwrap();
        assert_eq!(
            aliases.candidates("@app/components/Button"),
            vec!["src/ui/components/Button", "src/legacy/Button", "src/@app/components/Button"]
        );
        assert_eq!(aliases.candidates("config"), vec!["src/config/index.ts", "src/config"]);
        assert_eq!(aliases.candidates("lib/util"), vec!["src/lib/util"]);
    }

    #[test]
    fn test_accepts_comments_and_trailing_commas() {
        let raw = r#"{
            // Next.js defaults
            "compilerOptions": {
                /* aliases */
                "paths": { "@/*": ["./src/*"], },
            },
        }"#;
        let aliases = PathAliases::from_json(raw).unwrap();
        assert_eq!(aliases.candidates("@/x"), vec!["src/x"]);
    }

    #[test]
    fn test_missing_tsconfig_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PathAliases::load(dir.path()).is_none());

        std::fs::write(dir.path().join("tsconfig.json"), "{ nope").unwrap();
        assert!(PathAliases::load(dir.path()).is_none());
    }

    #[test]
    fn test_no_compiler_options_is_empty() {
        assert!(PathAliases::from_json("{}").unwrap().is_empty());
    }
}
