//! Handler for the `chunktrace chunk` command.
//!
//! Reads a file's current content, chunks it, optionally splits to a
//! character budget, and prints one `U` line per chunk.

use std::path::{Path, PathBuf};

use colored::Colorize;
use tracing::debug;

use crate::chunk::{self, Chunk};
use crate::error::{ChunkTraceError, Result};
use crate::hash::HashScheme;
use crate::output;

/// All inputs needed to run the chunk command.
#[derive(Debug)]
pub struct ChunkCommandOptions {
    pub path: PathBuf,
    pub budget: Option<usize>,
    pub default_budget: usize,
    pub scheme: HashScheme,
    pub json: bool,
    pub quiet: bool,
}

/// Run the chunk command: chunk the file at its current content and print
/// one `U` line (or a JSON array) per emitted chunk.
pub fn run(options: ChunkCommandOptions) -> Result<()> {
    let content = read_file(&options.path)?;
    let lines = split_preserving_newlines(&content);
    let lineset = crate::line::LineSet::from_lines(&lines, &options.scheme);

    let budget = options.budget.unwrap_or(options.default_budget);
    let collection = chunk::chunk(&lineset, &options.scheme).split(budget, &options.scheme);

    debug!(chunks = collection.len(), "chunked file");

    let lines_out: Vec<(crate::diff::ChunkRef, char, String)> = collection
        .iterate()
        .map(|c| {
            let r = crate::diff::ChunkRef {
                start: c.start.clone(),
                end: c.end.clone(),
                hash: c.chunk_hash(&options.scheme),
                timestamp: now(),
            };
            (r, 'U', describe(c))
        })
        .collect();

    if options.json {
        println!("{}", output::format_json(&lines_out)?);
    } else {
        for (r, flag, description) in &lines_out {
            println!("{}", output::format_ref_line(r, *flag, description));
        }
        if !options.quiet {
            eprintln!(
                "{} {} chunks",
                "chunked:".green().bold(),
                collection.len()
            );
        }
    }

    Ok(())
}

fn describe(c: &Chunk) -> String {
    let first = c.lines.first().map(|l| l.index).unwrap_or(0);
    let last = c.lines.last().map(|l| l.index).unwrap_or(0);
    format!("{} {} {}", c.character_count(), first, last)
}

pub(crate) fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| ChunkTraceError::io(format!("reading file '{}'", path.display()), e))
}

/// Split text into lines, preserving each line's trailing newline. The
/// final segment keeps whatever (possibly absent) terminator it has.
pub(crate) fn split_preserving_newlines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for ch in content.chars() {
        current.push(ch);
        if ch == '\n' {
            lines.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

pub(crate) fn now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_preserving_trailing_newlines() {
        let lines = split_preserving_newlines("abc\ncde\n");
        assert_eq!(lines, vec!["abc\n".to_string(), "cde\n".to_string()]);
    }

    #[test]
    fn keeps_final_line_without_trailing_newline() {
        let lines = split_preserving_newlines("abc\ncde");
        assert_eq!(lines, vec!["abc\n".to_string(), "cde".to_string()]);
    }

    #[test]
    fn empty_content_yields_no_lines() {
        assert!(split_preserving_newlines("").is_empty());
    }
}
