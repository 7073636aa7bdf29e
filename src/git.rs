//! Git integration for chunktrace.
//!
//! Provides safe wrappers around `git` CLI commands. This is the sole
//! interface to git: the rest of the crate works with the parsed
//! [`Revision`] values and raw snapshot content rather than invoking git
//! directly.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{ChunkTraceError, Result};

/// A single revision of a tracked file: the commit it was recorded at and
/// the commit's author timestamp (Unix seconds).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub commit: String,
    pub timestamp: u64,
}

/// Run a git command in the given directory and return its stdout.
///
/// Returns a [`ChunkTraceError::Git`] if the command fails or if git is
/// not installed.
fn run_git(args: &[&str], cwd: &Path) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .map_err(|e| ChunkTraceError::git(format!("failed to execute git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(ChunkTraceError::git(if stderr.is_empty() {
            format!("git exited with status {}", output.status)
        } else {
            stderr
        }));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Verify that the given path is inside a git repository.
pub fn verify_git_repo(root: &Path) -> Result<()> {
    run_git(&["rev-parse", "--git-dir"], root).map(|_| ())
}

/// List every commit that touched `path` (following renames), oldest
/// first, with each commit's author timestamp.
pub fn revisions(root: &Path, path: &Path) -> Result<Vec<Revision>> {
    verify_git_repo(root)?;

    let path_str = path.to_string_lossy();
    let raw = run_git(
        &[
            "log",
            "--follow",
            "--format=%H%x09%at",
            "--reverse",
            "--",
            path_str.as_ref(),
        ],
        root,
    )?;

    let mut out = Vec::new();
    for line in raw.lines().filter(|l| !l.is_empty()) {
        let (commit, ts) = line.split_once('\t').ok_or_else(|| {
            ChunkTraceError::git(format!("unexpected git log output: '{line}'"))
        })?;
        let timestamp: u64 = ts
            .trim()
            .parse()
            .map_err(|_| ChunkTraceError::git(format!("non-numeric timestamp: '{ts}'")))?;
        out.push(Revision {
            commit: commit.to_string(),
            timestamp,
        });
    }

    if out.is_empty() {
        return Err(ChunkTraceError::git(format!(
            "no history found for '{}' in {}",
            path.display(),
            root.display()
        )));
    }

    Ok(out)
}

/// Read the content of `path` as it existed at `commit`.
pub fn content_at(root: &Path, commit: &str, path: &Path) -> Result<String> {
    let path_str = path.to_string_lossy();
    run_git(&["show", &format!("{commit}:{path_str}")], root)
}

/// Resolve a relative-to-root path from whatever the user passed (which may
/// be relative to the current directory instead).
pub fn relativize(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.strip_prefix(root).map(Path::to_path_buf).unwrap_or_else(|_| path.to_path_buf())
    } else {
        path.to_path_buf()
    }
}
