use crate::paths::has_source_extension;
use crate::Result;
use anyhow::{bail, Context};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Files changed between two commits, limited to source files.
pub fn changed_files(root: &Path, base: &str, head: &str, extensions: &[String]) -> Result<Vec<String>> {
    let output = Command::new("git")
        .arg("diff")
        .arg("--name-only")
        .arg(base)
        .arg(head)
        .current_dir(root)
        .output()
        .context("failed to run git diff")?;

    if !output.status.success() {
        bail!(
            "git diff {} {} failed: {}",
            base,
            head,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let files = filter_source_files(&String::from_utf8_lossy(&output.stdout), extensions);
    debug!("{} changed source files between {} and {}", files.len(), base, head);
    Ok(files)
}

/// One path per line; blank lines and non-source files dropped.
pub fn filter_source_files(listing: &str, extensions: &[String]) -> Vec<String> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| has_source_extension(line, extensions))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_source_files() {
        let extensions: Vec<String> = ["ts", "tsx", "js", "jsx"].iter().map(|s| s.to_string()).collect();
        let listing = "src/a.ts\n\nREADME.md\n  src/b.tsx  \npackage.json\nlib/c.jsx\n";
        assert_eq!(
            filter_source_files(listing, &extensions),
            vec!["src/a.ts", "src/b.tsx", "lib/c.jsx"]
        );
    }

    #[test]
    fn test_changed_files_outside_repository_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(changed_files(dir.path(), "HEAD~1", "HEAD", &[]).is_err());
    }
}
