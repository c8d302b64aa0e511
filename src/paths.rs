/// Extensions the resolver treats as interchangeable when matching a changed
/// file against a graph module.
pub const SOURCE_EXTENSIONS: [&str; 4] = ["tsx", "ts", "jsx", "js"];

/// Canonical form used for every path comparison: forward slashes only.
pub fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

/// Drops a trailing conventional source extension, if present.
pub fn strip_source_extension(path: &str) -> &str {
    for ext in SOURCE_EXTENSIONS {
        if let Some(stem) = path.strip_suffix(ext).and_then(|p| p.strip_suffix('.')) {
            if !stem.is_empty() && !stem.ends_with('/') {
                return stem;
            }
        }
    }
    path
}

pub fn extension_of(path: &str) -> Option<&str> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rfind('.') {
        Some(0) | None => None,
        Some(idx) => Some(&file_name[idx + 1..]),
    }
}

/// True when the path ends in one of `extensions` (compared case-insensitively).
pub fn has_source_extension(path: &str, extensions: &[String]) -> bool {
    extension_of(path)
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_separators() {
        assert_eq!(normalize(r"src\components\Button.tsx"), "src/components/Button.tsx");
        assert_eq!(normalize("src/lib/util.ts"), "src/lib/util.ts");
        assert_eq!(normalize(r"mixed/path\to\file.js"), "mixed/path/to/file.js");
    }

    #[test]
    fn test_strip_source_extension() {
        assert_eq!(strip_source_extension("src/y.ts"), "src/y");
        assert_eq!(strip_source_extension("src/x.tsx"), "src/x");
        assert_eq!(strip_source_extension("src/z.jsx"), "src/z");
        assert_eq!(strip_source_extension("src/w.js"), "src/w");
        // Only the trailing extension is removed.
        assert_eq!(strip_source_extension("src/a.test.ts"), "src/a.test");
        // Other extensions are kept.
        assert_eq!(strip_source_extension("styles/main.css"), "styles/main.css");
        assert_eq!(strip_source_extension("src/y"), "src/y");
        // A bare dotfile is not a stem.
        assert_eq!(strip_source_extension("src/.ts"), "src/.ts");
    }

    #[test]
    fn test_has_source_extension() {
        let exts = vec!["ts".to_string(), "tsx".to_string()];
        assert!(has_source_extension("src/a.ts", &exts));
        assert!(has_source_extension("src/A.TSX", &exts));
        assert!(!has_source_extension("src/a.js", &exts));
        assert!(!has_source_extension("Makefile", &exts));
        assert!(!has_source_extension("src/.ts", &exts));
    }
}
