//! Serialization of chunk references to and from the fixed-width diff-line
//! wire format, plus a JSON rendering for tooling consumption.

use std::path::Path;

use serde::Serialize;

use crate::diff::{ChunkRef, Diff};
use crate::error::{ChunkTraceError, Result};
use crate::hash::HashScheme;

/// Render one wire-format line: the fixed-width `ChunkRef.id()` header,
/// then a flag (`U` unmatched/new, `M` matched/unchanged), then a free-text
/// description.
pub fn format_ref_line(r: &ChunkRef, flag: char, description: &str) -> String {
    format!("{} {} {}", r.id(), flag, description)
}

/// Parse one wire-format line back into its `ChunkRef`, flag, and
/// description. Only the fixed-width header is load-bearing; flag and
/// description are informational and are returned as-is.
pub fn parse_ref_line(line: &str, scheme: &HashScheme) -> Result<(ChunkRef, char, String)> {
    let h = scheme.width();
    let header_len = 3 * h + 10;
    if line.len() < header_len {
        return Err(ChunkTraceError::input(format!(
            "line too short: expected at least {header_len} characters, got {}",
            line.len()
        )));
    }

    let header = &line[..header_len];
    let start = &header[0..h];
    let end = &header[h..2 * h];
    let hash = &header[2 * h..3 * h];
    let ts_str = &header[3 * h..3 * h + 10];

    for field in [start, end, hash] {
        if !field.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ChunkTraceError::input(format!(
                "non-hex digest field: '{field}'"
            )));
        }
    }
    let timestamp: u64 = ts_str
        .trim()
        .parse()
        .map_err(|_| ChunkTraceError::input(format!("non-numeric timestamp: '{ts_str}'")))?;

    let remainder = line[header_len..].trim_start();
    let mut parts = remainder.splitn(2, ' ');
    let flag = parts
        .next()
        .and_then(|s| s.chars().next())
        .ok_or_else(|| ChunkTraceError::input("missing flag field"))?;
    let description = parts.next().unwrap_or("").to_string();

    Ok((
        ChunkRef {
            start: start.to_string(),
            end: end.to_string(),
            hash: hash.to_string(),
            timestamp,
        },
        flag,
        description,
    ))
}

/// Read an accumulated diff from disk. A missing file is an empty diff —
/// the natural starting state for a file with no recorded history yet.
pub fn read_diff_file(path: &Path, scheme: &HashScheme) -> Result<Diff> {
    if !path.exists() {
        return Ok(Diff::empty());
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| ChunkTraceError::io(format!("reading diff file '{}'", path.display()), e))?;

    let mut refs = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (r, _flag, _description) = parse_ref_line(line, scheme)
            .map_err(|e| ChunkTraceError::input(format!("{e} (line {})", lineno + 1)))?;
        refs.push(r);
    }
    Ok(Diff::from_refs(refs))
}

/// Persist the full accumulated ref multiset to disk, one line per ref.
/// Every persisted ref is flagged `M`: by the time a diff is written back,
/// every ref in it is part of recorded history, not a fresh observation.
pub fn write_diff_file(path: &Path, diff: &Diff) -> Result<()> {
    let mut body = String::new();
    for r in diff.refs() {
        body.push_str(&format_ref_line(r, 'M', ""));
        body.push('\n');
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ChunkTraceError::io(format!("creating directory '{}'", parent.display()), e)
            })?;
        }
    }
    std::fs::write(path, body)
        .map_err(|e| ChunkTraceError::io(format!("writing diff file '{}'", path.display()), e))
}

#[derive(Debug, Serialize)]
struct ChunkLineJson {
    start: String,
    end: String,
    hash: String,
    timestamp: u64,
    flag: char,
    description: String,
}

/// Render a list of `(ref, flag, description)` triples as a JSON array,
/// for tooling that would rather not parse the fixed-width line format.
pub fn format_json(lines: &[(ChunkRef, char, String)]) -> Result<String> {
    let entries: Vec<ChunkLineJson> = lines
        .iter()
        .map(|(r, flag, description)| ChunkLineJson {
            start: r.start.clone(),
            end: r.end.clone(),
            hash: r.hash.clone(),
            timestamp: r.timestamp,
            flag: *flag,
            description: description.clone(),
        })
        .collect();
    serde_json::to_string_pretty(&entries).map_err(|e| {
        ChunkTraceError::config_with_source("failed to serialize chunk lines as JSON", e)
    })
}
