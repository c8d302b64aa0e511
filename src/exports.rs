use crate::paths::{extension_of, normalize};
use crate::Result;
use regex::Regex;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// Source of exported symbol names for a file.
pub trait SymbolExtractor: Send + Sync {
    /// Exported names in declaration order. A file that does not exist has
    /// no exports; other failures are errors.
    fn extract_exports(&self, path: &str) -> Result<Vec<String>>;
}

/// Regex-based export scanner rooted at a project directory.
pub struct ExportScanner {
    root: PathBuf,
    language_patterns: HashMap<&'static str, LanguagePatterns>,
}

struct LanguagePatterns {
    /// Each pattern's named group `name` (or `list`, for brace lists) holds
    /// the exported identifier(s).
    export_patterns: Vec<Regex>,
    /// Opening line of a brace list that closes on a later line.
    wrapped_list_start: Option<Regex>,
    /// Explicit export declaration (`__all__`) matched against the whole
    /// file. When present it is the only source of names.
    declared_exports: Option<Regex>,
}

impl ExportScanner {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let mut language_patterns = HashMap::new();

        language_patterns.insert("javascript", LanguagePatterns {
            export_patterns: vec![
                Regex::new(r"^\s*export\s+(?:default\s+)?(?:async\s+)?function\s*\*?\s*(?P<name>[A-Za-z_$][\w$]*)")?,
                Regex::new(r"^\s*export\s+(?:default\s+)?(?:declare\s+)?(?:abstract\s+)?class\s+(?P<name>[A-Za-z_$][\w$]*)")?,
                Regex::new(r"^\s*export\s+(?:declare\s+)?(?:const\s+enum|const|let|var|enum|interface|type|namespace)\s+(?P<name>[A-Za-z_$][\w$]*)")?,
                Regex::new(r"^\s*export\s+(?:type\s+)?\{(?P<list>[^}]*)\}")?,
                Regex::new(r"^\s*export\s+\*\s+as\s+(?P<name>[A-Za-z_$][\w$]*)")?,
                Regex::new(r"^\s*export\s+(?P<name>default)\b")?,
                Regex::new(r"^\s*export\s*=\s*(?P<name>[A-Za-z_$][\w$]*)")?,
            ],
            wrapped_list_start: Some(Regex::new(r"^\s*export\s+(?:type\s+)?\{[^}]*$")?),
            declared_exports: None,
        });

        language_patterns.insert("rust", LanguagePatterns {
            export_patterns: vec![
                Regex::new(r"^\s*pub\s+(?:async\s+)?(?:unsafe\s+)?(?:fn|struct|enum|trait|mod|type|const|static)\s+(?P<name>\w+)")?,
            ],
            wrapped_list_start: None,
            declared_exports: None,
        });

        language_patterns.insert("python", LanguagePatterns {
            export_patterns: vec![
                Regex::new(r"^(?:async\s+)?def\s+(?P<name>[A-Za-z]\w*)")?,
                Regex::new(r"^class\s+(?P<name>[A-Za-z]\w*)")?,
            ],
            wrapped_list_start: None,
            declared_exports: Some(Regex::new(r"(?m)^__all__\s*=\s*[\[(](?P<list>[^\])]*)[\])]")?),
        });

        Ok(Self {
            root: root.into(),
            language_patterns,
        })
    }

    /// Exported names found in `content`, for a file with extension `ext`.
    pub fn scan_source(&self, content: &str, ext: &str) -> Vec<String> {
        let Some(patterns) = detect_language(ext).and_then(|l| self.language_patterns.get(l))
        else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut names = Vec::new();
        let mut push = |name: &str| {
            let name = name.trim();
            if !name.is_empty() && seen.insert(name.to_string()) {
                names.push(name.to_string());
            }
        };

        if let Some(list) = patterns
            .declared_exports
            .as_ref()
            .and_then(|re| re.captures(content))
            .and_then(|captures| captures.name("list"))
        {
            for item in parse_export_list(list.as_str()) {
                push(item.as_str());
            }
            return names;
        }

        for line in logical_lines(content, patterns.wrapped_list_start.as_ref()) {
            for pattern in &patterns.export_patterns {
                let Some(captures) = pattern.captures(&line) else {
                    continue;
                };
                if let Some(name) = captures.name("name") {
                    push(name.as_str());
                    // One declaration per line; later patterns would only
                    // match the same token again (e.g. `export default`).
                    break;
                }
                if let Some(list) = captures.name("list") {
                    for item in parse_export_list(list.as_str()) {
                        push(item.as_str());
                    }
                    break;
                }
            }
        }

        names
    }
}

impl SymbolExtractor for ExportScanner {
    fn extract_exports(&self, path: &str) -> Result<Vec<String>> {
        let normalized = normalize(path);
        let full_path = self.root.join(&normalized);
        if !full_path.is_file() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&full_path)?;
        let ext = extension_of(&normalized).unwrap_or_default();
        Ok(self.scan_source(&content, ext))
    }
}

fn detect_language(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "js" | "jsx" | "mjs" | "cjs" | "ts" | "tsx" | "mts" | "cts" => Some("javascript"),
        "rs" => Some("rust"),
        "py" => Some("python"),
        _ => None,
    }
}

/// Source lines, with a brace list spread over several lines joined into one.
fn logical_lines<'a>(content: &'a str, wrapped_list_start: Option<&Regex>) -> Vec<Cow<'a, str>> {
    let mut lines = Vec::new();
    let mut pending: Option<String> = None;

    for line in content.lines() {
        if let Some(mut joined) = pending.take() {
            joined.push(' ');
            joined.push_str(line.trim());
            if line.contains('}') {
                lines.push(Cow::Owned(joined));
            } else {
                pending = Some(joined);
            }
            continue;
        }
        if wrapped_list_start.is_some_and(|re| re.is_match(line)) {
            pending = Some(line.to_string());
            continue;
        }
        lines.push(Cow::Borrowed(line));
    }

    // Unterminated list at end of file.
    if let Some(joined) = pending {
        lines.push(Cow::Owned(joined));
    }
    lines
}

/// Names exposed by `a, b as c, type D, "e"` style lists.
fn parse_export_list(list: &str) -> Vec<String> {
    list.split(',')
        .filter_map(|item| {
            let item = item.trim();
            let item = item.strip_prefix("type ").unwrap_or(item);
            let exposed = match item.rsplit_once(" as ") {
                Some((_, alias)) => alias,
                None => item,
            };
            let exposed = exposed.trim().trim_matches(|c| c == '"' || c == '\'');
            if exposed.is_empty() {
                None
            } else {
                Some(exposed.to_string())
            }
        })
        .collect()
}
