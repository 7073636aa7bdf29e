//! Handler for the `chunktrace reconstruct` command.
//!
//! Loads and reconstructs the diff recorded at `<diff-file>`, then walks
//! the resulting chain against the current content of `<path>`, emitting a
//! full chunk for every ref the file still contains and a bare dangling
//! marker for every ref it no longer does.

use std::path::PathBuf;

use colored::Colorize;
use serde::Serialize;
use tracing::debug;

use crate::chunk;
use crate::commands::chunk::{read_file, split_preserving_newlines};
use crate::diff::Diff;
use crate::error::{ChunkTraceError, Result};
use crate::hash::HashScheme;
use crate::line::LineSet;
use crate::output;

/// All inputs needed to run the reconstruct command.
#[derive(Debug)]
pub struct ReconstructCommandOptions {
    pub path: PathBuf,
    pub diff_file: PathBuf,
    pub scheme: HashScheme,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Serialize)]
struct ReconstructEntryJson {
    id: String,
    located: bool,
    start: String,
    end: String,
    hash: String,
    timestamp: u64,
    description: Option<String>,
}

/// Run the reconstruct command.
pub fn run(options: ReconstructCommandOptions) -> Result<()> {
    let diff = output::read_diff_file(&options.diff_file, &options.scheme)?;
    let chain = diff.reconstruct(&options.scheme)?;
    debug!(refs = chain.len(), "reconstructed chain");

    let content = read_file(&options.path)?;
    let lines = split_preserving_newlines(&content);
    let lineset = LineSet::from_lines(&lines, &options.scheme);
    let current = chunk::chunk(&lineset, &options.scheme);

    let mut located_count = 0usize;
    let mut dangling_count = 0usize;
    let mut json_entries = Vec::new();

    for r in &chain {
        match current.find(r, &options.scheme) {
            Some(c) => {
                located_count += 1;
                let description = format!(
                    "{} {} {}",
                    c.character_count(),
                    c.lines.first().map(|l| l.index).unwrap_or(0),
                    c.lines.last().map(|l| l.index).unwrap_or(0)
                );
                if options.json {
                    json_entries.push(ReconstructEntryJson {
                        id: r.id(),
                        located: true,
                        start: r.start.clone(),
                        end: r.end.clone(),
                        hash: r.hash.clone(),
                        timestamp: r.timestamp,
                        description: Some(description.clone()),
                    });
                } else {
                    println!("{}", output::format_ref_line(r, 'U', &description));
                }
            }
            None => {
                dangling_count += 1;
                if options.json {
                    json_entries.push(ReconstructEntryJson {
                        id: r.id(),
                        located: false,
                        start: r.start.clone(),
                        end: r.end.clone(),
                        hash: r.hash.clone(),
                        timestamp: r.timestamp,
                        description: None,
                    });
                } else {
                    println!("{} {}", "dangling:".yellow().bold(), r.id());
                }
            }
        }
    }

    if options.json {
        let rendered = serde_json::to_string_pretty(&json_entries).map_err(|e| {
            ChunkTraceError::config_with_source("failed to serialize reconstruction as JSON", e)
        })?;
        println!("{rendered}");
    }

    if !options.quiet {
        eprintln!(
            "{} {} located, {} dangling",
            "reconstruct:".green().bold(),
            located_count,
            dangling_count
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::ChunkRef;
    use tempfile::tempdir;

    fn scheme() -> HashScheme {
        HashScheme::default()
    }

    #[test]
    fn reconstruct_locates_every_chunk_of_an_unchanged_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "abc\ncde\n").unwrap();
        let diff_file = dir.path().join("a.diff");

        crate::commands::diff::run(crate::commands::diff::DiffCommandOptions {
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

        run(ReconstructCommandOptions {
            path,
            diff_file,
            scheme: scheme(),
            json: false,
            quiet: true,
        })
        .unwrap();
    }

    #[test]
    fn reconstruct_fails_loudly_on_broken_chain() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, "abc\ncde\n").unwrap();
        let diff_file = dir.path().join("a.diff");

        let scheme = scheme();
        let dangling = ChunkRef {
            start: scheme.digest("nowhere"),
            end: scheme.last(),
            hash: scheme.digest("x"),
            timestamp: 1,
        };
        let diff = Diff::from_refs(vec![dangling]);
        output::write_diff_file(&diff_file, &diff).unwrap();

        let err = run(ReconstructCommandOptions {
            path,
            diff_file,
            scheme,
            json: false,
            quiet: true,
        })
        .unwrap_err();
        assert!(matches!(err, ChunkTraceError::BrokenChain { .. }));
    }
}
