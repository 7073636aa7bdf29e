//! Handler for the `chunktrace diff` command.
//!
//! Loads the accumulated diff from disk, chunks the file's current content,
//! extracts matched/unmatched chunks against it, prints `M`/`U` lines, and
//! persists the merged, reconstructed diff back to disk.

use std::path::PathBuf;

use colored::Colorize;
use tracing::{debug, info};

use crate::chunk;
use crate::commands::chunk::{now, read_file, split_preserving_newlines};
use crate::diff::{ChunkRef, Diff};
use crate::error::Result;
use crate::hash::HashScheme;
use crate::line::LineSet;
use crate::output;

/// All inputs needed to run the diff command.
#[derive(Debug)]
pub struct DiffCommandOptions {
    pub path: PathBuf,
    pub diff_file: PathBuf,
    pub budget: Option<usize>,
    pub default_budget: usize,
    pub timestamp: Option<u64>,
    pub scheme: HashScheme,
    pub json: bool,
    pub quiet: bool,
}

/// Run the diff command.
pub fn run(options: DiffCommandOptions) -> Result<()> {
    let timestamp = options.timestamp.unwrap_or_else(now);
    let budget = options.budget.unwrap_or(options.default_budget);

    let previous = output::read_diff_file(&options.diff_file, &options.scheme)?;
    debug!(refs = previous.refs().len(), "loaded prior diff");

    let content = read_file(&options.path)?;
    let lines = split_preserving_newlines(&content);
    let lineset = LineSet::from_lines(&lines, &options.scheme);
    let current = chunk::chunk(&lineset, &options.scheme);

    let (matched, unmatched) = previous.extract(&current, &options.scheme);
    let unmatched_split = unmatched.split(budget, &options.scheme);
    let fresh = Diff::create(&unmatched_split, timestamp, &options.scheme);

    let merged = previous.merge(&fresh, &options.scheme)?;

    let mut rendered: Vec<(ChunkRef, char, String)> = Vec::new();
    for c in &matched {
        let r = c.as_ref(&options.scheme);
        let description = format!(
            "{} {} {}",
            c.character_count(),
            c.lines.first().map(|l| l.index).unwrap_or(0),
            c.lines.last().map(|l| l.index).unwrap_or(0)
        );
        rendered.push((r, 'M', description));
    }
    for c in unmatched_split.iterate() {
        let r = ChunkRef {
            start: c.start.clone(),
            end: c.end.clone(),
            hash: c.chunk_hash(&options.scheme),
            timestamp,
        };
        let description = format!(
            "{} {} {}",
            c.character_count(),
            c.lines.first().map(|l| l.index).unwrap_or(0),
            c.lines.last().map(|l| l.index).unwrap_or(0)
        );
        rendered.push((r, 'U', description));
    }

    if options.json {
        println!("{}", output::format_json(&rendered)?);
    } else {
        for (r, flag, description) in &rendered {
            println!("{}", output::format_ref_line(r, *flag, description));
        }
    }

    output::write_diff_file(&options.diff_file, &merged)?;
    info!(
        matched = matched.len(),
        unmatched = unmatched_split.len(),
        "diff written"
    );

    if !options.quiet {
        eprintln!(
            "{} {} matched, {} new",
            "diff:".green().bold(),
            matched.len(),
            unmatched_split.len()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn scheme() -> HashScheme {
        HashScheme::default()
    }

    #[test]
    fn first_diff_has_no_matches() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "abc\ncde\n").unwrap();
        let diff_file = dir.path().join("a.diff");

        run(DiffCommandOptions {
            path: path.clone(),
            diff_file: diff_file.clone(),
            budget: Some(4000),
            default_budget: 4000,
            timestamp: Some(1),
            scheme: scheme(),
            json: false,
            quiet: true,
        })
        .unwrap();

        let saved = output::read_diff_file(&diff_file, &scheme()).unwrap();
        assert_eq!(saved.refs().len(), 2);
    }

    #[test]
    fn second_identical_diff_matches_everything() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "abc\ncde\n").unwrap();
        let diff_file = dir.path().join("a.diff");

        run(DiffCommandOptions {
            path: path.clone(),
            diff_file: diff_file.clone(),
            budget: Some(4000),
            default_budget: 4000,
            timestamp: Some(1),
            scheme: scheme(),
            json: false,
            quiet: true,
        })
        .unwrap();

        run(DiffCommandOptions {
            path: path.clone(),
            diff_file: diff_file.clone(),
            budget: Some(4000),
            default_budget: 4000,
            timestamp: Some(2),
            scheme: scheme(),
            json: false,
            quiet: true,
        })
        .unwrap();

        let saved = output::read_diff_file(&diff_file, &scheme()).unwrap();
        // Still just the two original chunks: nothing new was unmatched.
        assert_eq!(saved.refs().len(), 2);
        assert!(saved.refs().iter().all(|r| r.timestamp == 1));
    }
}
