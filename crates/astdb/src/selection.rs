//! Resolves a [`QuerySelection`] into a concrete list of workspace-relative
//! files, the shared groundwork behind `parse --changed|--staged|--glob`
//! and `watch`'s persisted glob set.

use std::path::Path;
use std::process::Command;

use astdb_domain::error::{Error, Result};
use astdb_domain::value_objects::QuerySelection;
use globset::{Glob, GlobSetBuilder};

fn run_git(workspace: &Path, args: &[&str]) -> Result<Vec<String>> {
    let output = Command::new("git")
        .args(args)
        .current_dir(workspace)
        .output()
        .map_err(|e| Error::git(format!("failed to run git {args:?}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(Error::git(format!("git {args:?} failed: {stderr}"))
            .with_suggestion("confirm the workspace is a git checkout"));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| workspace.join(l).to_string_lossy().into_owned())
        .collect())
}

/// Files with uncommitted changes relative to `base` (`git diff --name-only
/// <base>`), run against `workspace`.
pub fn changed(workspace: &Path, base: &str) -> Result<Vec<String>> {
    run_git(workspace, &["diff", "--name-only", base])
}

/// Files staged in the VCS index (`git diff --cached --name-only`).
pub fn staged(workspace: &Path) -> Result<Vec<String>> {
    run_git(workspace, &["diff", "--cached", "--name-only"])
}

/// Files under `workspace` matching any of `patterns`, walking the tree
/// once and testing every entry against a combined [`globset::GlobSet`].
pub fn glob_match(workspace: &Path, patterns: &[String]) -> Result<Vec<String>> {
    if patterns.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| Error::glob(format!("invalid glob {pattern:?}: {e}")))?;
        builder.add(glob);
    }
    let set = builder
        .build()
        .map_err(|e| Error::glob(format!("failed to compile glob set: {e}")))?;

    let mut matches = Vec::new();
    for entry in walkdir::WalkDir::new(workspace).into_iter().filter_map(std::result::Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(workspace).unwrap_or(entry.path());
        if set.is_match(relative) {
            matches.push(entry.path().to_string_lossy().into_owned());
        }
    }
    matches.sort();
    Ok(matches)
}

/// Resolve `selection` into concrete files under `workspace`.
/// [`QuerySelection::Config`] resolves against `config_globs`, the glob
/// list persisted in the workspace's watch state.
pub fn resolve(selection: &QuerySelection, workspace: &Path, config_globs: &[String]) -> Result<Vec<String>> {
    match selection {
        QuerySelection::Changed { base } => changed(workspace, base),
        QuerySelection::Staged => staged(workspace),
        QuerySelection::Glob(pattern) => glob_match(workspace, std::slice::from_ref(pattern)),
        QuerySelection::Config => glob_match(workspace, config_globs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_match_finds_nested_files_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        std::fs::write(dir.path().join("src/a.rs"), "").unwrap();
        std::fs::write(dir.path().join("src/nested/b.rs"), "").unwrap();
        std::fs::write(dir.path().join("README.md"), "").unwrap();

        let matches = glob_match(dir.path(), &["**/*.rs".to_string()]).unwrap();
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn glob_match_with_no_patterns_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let matches = glob_match(dir.path(), &[]).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn invalid_glob_pattern_surfaces_as_glob_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = glob_match(dir.path(), &["[".to_string()]).unwrap_err();
        assert_eq!(err.kind, astdb_domain::error::ErrorKind::Glob);
    }

    #[test]
    fn git_command_outside_a_repo_surfaces_as_git_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = staged(dir.path()).unwrap_err();
        assert_eq!(err.kind, astdb_domain::error::ErrorKind::Git);
    }
}
