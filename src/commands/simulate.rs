//! Handler for the `chunktrace simulate` command.
//!
//! Replays a file's git history through the ingestion pipeline of the core
//! engine (`chunk` -> `extract` -> `Diff::create` -> `merge`), one revision
//! at a time, printing per-revision progress and a final summary.

use std::path::PathBuf;

use colored::Colorize;
use tracing::info;

use crate::chunk;
use crate::commands::chunk::split_preserving_newlines;
use crate::diff::Diff;
use crate::error::Result;
use crate::git::{self, Revision};
use crate::hash::HashScheme;
use crate::line::LineSet;
use crate::output;

/// All inputs needed to run the simulate command.
#[derive(Debug)]
pub struct SimulateCommandOptions {
    pub repo: PathBuf,
    pub path: PathBuf,
    pub budget: Option<usize>,
    pub default_budget: usize,
    pub diff_file: Option<PathBuf>,
    pub scheme: HashScheme,
    pub quiet: bool,
}

/// Run the simulate command: drive the ingestion pipeline of the engine
/// across the entire recorded git history of `path` within `repo`.
pub fn run(options: SimulateCommandOptions) -> Result<()> {
    let budget = options.budget.unwrap_or(options.default_budget);
    let revisions = git::revisions(&options.repo, &options.path)?;
    info!(revisions = revisions.len(), "replaying history");

    let mut diff = Diff::empty();

    for (i, revision) in revisions.iter().enumerate() {
        let content = git::content_at(&options.repo, &revision.commit, &options.path)?;
        let lines = split_preserving_newlines(&content);
        let lineset = LineSet::from_lines(&lines, &options.scheme);
        let current = chunk::chunk(&lineset, &options.scheme);

        let (matched, unmatched) = diff.extract(&current, &options.scheme);
        let unmatched_split = unmatched.split(budget, &options.scheme);
        let fresh = Diff::create(&unmatched_split, revision.timestamp, &options.scheme);
        diff = diff.merge(&fresh, &options.scheme)?;

        if !options.quiet {
            print_progress(i, revision, matched.len(), unmatched_split.len());
        }
    }

    if let Some(diff_file) = &options.diff_file {
        output::write_diff_file(diff_file, &diff)?;
    }

    if !options.quiet {
        eprintln!(
            "{} {} revisions replayed, {} chunks in final chain",
            "simulate:".green().bold(),
            revisions.len(),
            diff.refs().len()
        );
    }

    Ok(())
}

fn print_progress(index: usize, revision: &Revision, matched: usize, unmatched: usize) {
    println!(
        "[{:>4}] {} matched={} unmatched={}",
        index,
        &revision.commit[..revision.commit.len().min(10)],
        matched,
        unmatched
    );
}
