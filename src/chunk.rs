//! Chunking: segmenting a [`LineSet`] into boundary-chained [`Chunk`]s, and
//! the length-bounded balanced split that keeps chunks under a size budget.

use crate::diff::ChunkRef;
use crate::hash::HashScheme;
use crate::line::{Line, LineSet};

/// A contiguous run of lines bounded on both sides by either a file sentinel
/// or a unique line's hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub start: String,
    pub end: String,
    pub lines: LineSet,
    pub timestamp: Option<u64>,
}

impl Chunk {
    pub fn chunk_hash(&self, scheme: &HashScheme) -> String {
        self.lines.concat_hash(scheme)
    }

    pub fn character_count(&self) -> usize {
        self.lines.character_count()
    }

    /// The fixed-width reference for this chunk at its own timestamp.
    /// Panics if the chunk carries no timestamp; only timestamped chunks
    /// (those produced by [`crate::diff::Diff::create`]) have a reference.
    pub fn as_ref(&self, scheme: &HashScheme) -> ChunkRef {
        ChunkRef {
            start: self.start.clone(),
            end: self.end.clone(),
            hash: self.chunk_hash(scheme),
            timestamp: self.timestamp.expect("chunk has no timestamp"),
        }
    }
}

/// An ordered sequence of chunks, chained or fragmented.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkCollection {
    chunks: Vec<Chunk>,
}

impl ChunkCollection {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }

    pub fn iterate(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    pub fn into_chunks(self) -> Vec<Chunk> {
        self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Length-bounded balanced split. Maximal runs of boundary-adjacent
    /// chunks are independently merged (if they fit `max_chars`) or
    /// pivot-split in half, recursively.
    pub fn split(&self, max_chars: usize, scheme: &HashScheme) -> ChunkCollection {
        let mut result = Vec::new();
        let mut i = 0;
        while i < self.chunks.len() {
            let mut j = i;
            while j + 1 < self.chunks.len() && self.chunks[j].end == self.chunks[j + 1].start {
                j += 1;
            }
            result.extend(split_run(&self.chunks[i..=j], max_chars, scheme));
            i = j + 1;
        }
        ChunkCollection { chunks: result }
    }

    /// Locate a run of chunks matching `r`'s boundaries and whose merged
    /// content hash matches `r.hash`. Returns `None` on no match or on an
    /// ambiguous match (multiple candidate starts or ends).
    pub fn find(&self, r: &ChunkRef, scheme: &HashScheme) -> Option<Chunk> {
        self.find_range(r, scheme).map(|(_, _, chunk)| chunk)
    }

    fn find_range(&self, r: &ChunkRef, scheme: &HashScheme) -> Option<(usize, usize, Chunk)> {
        let start_candidates: Vec<usize> = self
            .chunks
            .iter()
            .enumerate()
            .filter(|(_, c)| c.start == r.start)
            .map(|(i, _)| i)
            .collect();
        if start_candidates.len() != 1 {
            return None;
        }
        let i = start_candidates[0];

        let mut j = i;
        let mut end_matches = Vec::new();
        loop {
            if self.chunks[j].end == r.end {
                end_matches.push(j);
            }
            if j + 1 < self.chunks.len() && self.chunks[j].end == self.chunks[j + 1].start {
                j += 1;
            } else {
                break;
            }
        }
        if end_matches.len() != 1 {
            return None;
        }
        let j = end_matches[0];

        let merged = merge_run(&self.chunks[i..=j], scheme);
        if merged.chunk_hash(scheme) != r.hash {
            return None;
        }
        let chunk = Chunk {
            start: r.start.clone(),
            end: r.end.clone(),
            lines: merged.lines,
            timestamp: Some(r.timestamp),
        };
        Some((i, j, chunk))
    }

    /// Split `refs` into the subset matched against this collection (as
    /// located chunks) and the remainder of this collection once matched
    /// runs are removed. Refs are tried in order; a later ref cannot match
    /// against a run already consumed by an earlier one.
    pub fn extract(&self, refs: &[ChunkRef], scheme: &HashScheme) -> (Vec<Chunk>, ChunkCollection) {
        let mut remainder = self.chunks.clone();
        let mut matched = Vec::new();

        for r in refs {
            let remaining = ChunkCollection {
                chunks: remainder.clone(),
            };
            if let Some((i, j, chunk)) = remaining.find_range(r, scheme) {
                matched.push(chunk);
                remainder.drain(i..=j);
            }
        }

        (matched, ChunkCollection { chunks: remainder })
    }
}

fn merge_run(run: &[Chunk], scheme: &HashScheme) -> Chunk {
    if run.len() == 1 {
        return run[0].clone();
    }
    let mut lines_vec: Vec<Line> = Vec::new();
    for c in run {
        lines_vec.extend(c.lines.lines().iter().cloned());
    }
    let _ = scheme;
    Chunk {
        start: run[0].start.clone(),
        end: run[run.len() - 1].end.clone(),
        lines: LineSet::from_parsed(lines_vec),
        timestamp: None,
    }
}

fn split_run(run: &[Chunk], max_chars: usize, scheme: &HashScheme) -> Vec<Chunk> {
    if run.len() <= 1 {
        return run.to_vec();
    }
    let total: usize = run.iter().map(|c| c.character_count()).sum();
    if total <= max_chars {
        return vec![merge_run(run, scheme)];
    }

    let half = total as f64 / 2.0;
    let mut running = 0usize;
    let mut pivot = run.len() - 1;
    for (i, c) in run.iter().enumerate() {
        running += c.character_count();
        if running as f64 >= half {
            pivot = i;
            break;
        }
    }
    if pivot >= run.len() - 1 {
        pivot = run.len() - 2;
    }

    let mut left = split_run(&run[..=pivot], max_chars, scheme);
    let right = split_run(&run[pivot + 1..], max_chars, scheme);
    left.extend(right);
    left
}

/// Segment a [`LineSet`] into a boundary-chained [`ChunkCollection`] at
/// every unique line. An empty line set yields an empty collection; a line
/// set with no unique lines yields a single chunk spanning the file
/// sentinels.
pub fn chunk(lineset: &LineSet, scheme: &HashScheme) -> ChunkCollection {
    let lines = lineset.lines();
    if lines.is_empty() {
        return ChunkCollection { chunks: Vec::new() };
    }

    let unique_indices: Vec<usize> = lineset.unique().lines().iter().map(|l| l.index).collect();
    let last_index = lines[lines.len() - 1].index;

    let mut chunks = Vec::new();
    let mut previous_boundary = scheme.first();
    let mut start_index = lines[0].index;

    for u_index in unique_indices {
        let u_line = lines.iter().find(|l| l.index == u_index).expect("unique index present");
        let end = if u_index == last_index {
            scheme.last()
        } else {
            u_line.hash.clone()
        };
        let chunk_lines = lineset.slice(start_index, u_index);
        chunks.push(Chunk {
            start: previous_boundary.clone(),
            end: end.clone(),
            lines: chunk_lines,
            timestamp: None,
        });
        previous_boundary = end;
        start_index = u_index + 1;
    }

    if start_index <= last_index {
        let chunk_lines = lineset.slice(start_index, last_index);
        chunks.push(Chunk {
            start: previous_boundary,
            end: scheme.last(),
            lines: chunk_lines,
            timestamp: None,
        });
    }

    ChunkCollection { chunks }
}
