//! Lines and ordered line sets.
//!
//! A [`LineSet`] is the unit the chunker segments: an ordered, indexed,
//! hashed view over a file's lines. Uniqueness of a line's hash within the
//! set is what makes it eligible as a chunk boundary.

use std::collections::HashMap;

use crate::hash::HashScheme;

/// A single line: its position in the originating snapshot, its text
/// (newline included, if present in the source), and its content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub index: usize,
    pub value: String,
    pub hash: String,
}

/// An ordered, contiguous sequence of [`Line`]s.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineSet {
    lines: Vec<Line>,
}

impl LineSet {
    /// Build a `LineSet` from raw line strings (newlines preserved by the
    /// caller), assigning each a zero-based index and a hash.
    pub fn from_lines(raw: &[String], scheme: &HashScheme) -> Self {
        let lines = raw
            .iter()
            .enumerate()
            .map(|(index, value)| Line {
                index,
                value: value.clone(),
                hash: scheme.digest(value),
            })
            .collect();
        Self { lines }
    }

    pub fn from_parsed(lines: Vec<Line>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn first(&self) -> Option<&Line> {
        self.lines.first()
    }

    pub fn last(&self) -> Option<&Line> {
        self.lines.last()
    }

    /// The sublist of lines whose hash appears exactly once in this set,
    /// in index order. These are the only eligible chunk boundaries.
    pub fn unique(&self) -> LineSet {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for line in &self.lines {
            *counts.entry(line.hash.as_str()).or_insert(0) += 1;
        }
        let unique = self
            .lines
            .iter()
            .filter(|l| counts.get(l.hash.as_str()) == Some(&1))
            .cloned()
            .collect();
        LineSet { lines: unique }
    }

    /// Hash of the concatenation of all line values, in index order.
    pub fn concat_hash(&self, scheme: &HashScheme) -> String {
        let concatenated: String = self.lines.iter().map(|l| l.value.as_str()).collect();
        scheme.digest(&concatenated)
    }

    pub fn character_count(&self) -> usize {
        self.lines.iter().map(|l| l.value.chars().count()).sum()
    }

    /// Slice of lines with index in `[start, end]` inclusive, by index value
    /// rather than vector position (the two coincide for a set built from
    /// one contiguous file, which is the only way `LineSet` is constructed).
    pub fn slice(&self, start_index: usize, end_index: usize) -> LineSet {
        let lines = self
            .lines
            .iter()
            .filter(|l| l.index >= start_index && l.index <= end_index)
            .cloned()
            .collect();
        LineSet { lines }
    }
}
