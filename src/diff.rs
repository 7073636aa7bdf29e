//! Diffs: the accumulated, timestamped set of chunk references for a file,
//! and the reconciliation that turns them into one coherent boundary chain.

use std::collections::{HashMap, HashSet};

use crate::chunk::{Chunk, ChunkCollection};
use crate::error::{ChunkTraceError, Result};
use crate::hash::HashScheme;

/// A pointer to a chunk: its boundaries, content hash, and the timestamp it
/// was recorded at. Four fixed-width fields; independent of chunk content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChunkRef {
    pub start: String,
    pub end: String,
    pub hash: String,
    pub timestamp: u64,
}

impl ChunkRef {
    /// The fixed-width identity used for wire serialization and chain
    /// lookups: the concatenation of start, end, hash, and a 10-digit
    /// zero-padded timestamp.
    pub fn id(&self) -> String {
        format!("{}{}{}{:010}", self.start, self.end, self.hash, self.timestamp)
    }
}

/// A multiset of chunk references accumulated across one or more revisions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    refs: Vec<ChunkRef>,
}

impl Diff {
    pub fn empty() -> Self {
        Self { refs: Vec::new() }
    }

    pub fn refs(&self) -> &[ChunkRef] {
        &self.refs
    }

    pub fn from_refs(refs: Vec<ChunkRef>) -> Self {
        Self { refs }
    }

    /// Stamp every chunk in `chunks` with `timestamp`, producing one ref
    /// per chunk.
    pub fn create(chunks: &ChunkCollection, timestamp: u64, scheme: &HashScheme) -> Self {
        let refs = chunks
            .iterate()
            .map(|c| ChunkRef {
                start: c.start.clone(),
                end: c.end.clone(),
                hash: c.chunk_hash(scheme),
                timestamp,
            })
            .collect();
        Self { refs }
    }

    /// Membership by full id equality.
    pub fn contains(&self, r: &ChunkRef) -> bool {
        self.refs.iter().any(|existing| existing.id() == r.id())
    }

    /// Concatenate this diff's refs with `other`'s, then validate that the
    /// result still reconstructs to a single coherent chain.
    pub fn merge(&self, other: &Diff, scheme: &HashScheme) -> Result<Diff> {
        let mut refs = self.refs.clone();
        refs.extend(other.refs.iter().cloned());
        let merged = Diff { refs };
        merged.reconstruct(scheme)?;
        Ok(merged)
    }

    /// Delegate to [`ChunkCollection::extract`] using this diff's refs.
    pub fn extract(&self, collection: &ChunkCollection, scheme: &HashScheme) -> (Vec<Chunk>, ChunkCollection) {
        collection.extract(&self.refs, scheme)
    }

    /// Reconcile the accumulated refs into a single chain from `FIRST` to
    /// `LAST`, preferring the latest timestamp when refs conflict on a
    /// boundary. Fails with [`ChunkTraceError::BrokenChain`] if no complete
    /// chain exists.
    pub fn reconstruct(&self, scheme: &HashScheme) -> Result<Vec<ChunkRef>> {
        let mut by_timestamp: HashMap<u64, Vec<&ChunkRef>> = HashMap::new();
        for r in &self.refs {
            by_timestamp.entry(r.timestamp).or_default().push(r);
        }
        let mut timestamps: Vec<u64> = by_timestamp.keys().copied().collect();
        timestamps.sort_unstable_by(|a, b| b.cmp(a));

        let mut accepted: HashMap<String, ChunkRef> = HashMap::new();
        let mut accepted_ends: HashSet<String> = HashSet::new();
        let mut rejected_starts: HashSet<String> = HashSet::new();
        let mut rejected_ends: HashSet<String> = HashSet::new();

        for ts in timestamps {
            for r in &by_timestamp[&ts] {
                let start_taken = accepted.contains_key(&r.start) || rejected_starts.contains(&r.start);
                let end_taken = accepted_ends.contains(&r.end) || rejected_ends.contains(&r.end);
                if start_taken || end_taken {
                    rejected_starts.insert(r.start.clone());
                    rejected_ends.insert(r.end.clone());
                    continue;
                }
                accepted_ends.insert(r.end.clone());
                accepted.insert(r.start.clone(), (*r).clone());
            }
        }

        let first = scheme.first();
        let last = scheme.last();
        let mut chain = Vec::new();
        let mut cursor = first;
        loop {
            let next = accepted
                .get(&cursor)
                .cloned()
                .ok_or_else(|| ChunkTraceError::broken_chain(cursor.clone()))?;
            let end = next.end.clone();
            chain.push(next);
            if end == last {
                break;
            }
            cursor = end;
        }
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::chunk as chunk_fn;
    use crate::line::LineSet;

    fn scheme() -> HashScheme {
        HashScheme::default()
    }

    fn lineset(values: &[&str]) -> LineSet {
        let raw: Vec<String> = values.iter().map(|s| s.to_string()).collect();
        LineSet::from_lines(&raw, &scheme())
    }

    #[test]
    fn ref_id_is_fixed_width_concatenation() {
        let scheme = scheme();
        let r = ChunkRef {
            start: scheme.first(),
            end: scheme.last(),
            hash: scheme.digest("abc"),
            timestamp: 7,
        };
        let id = r.id();
        assert_eq!(id.len(), scheme.width() * 3 + 10);
        assert!(id.ends_with("0000000007"));
    }

    #[test]
    fn create_stamps_all_chunks_with_timestamp() {
        let scheme = scheme();
        let set = lineset(&["abc\n", "cde\n"]);
        let collection = chunk_fn(&set, &scheme);
        let diff = Diff::create(&collection, 100, &scheme);
        assert!(diff.refs().iter().all(|r| r.timestamp == 100));
        assert_eq!(diff.refs().len(), 2);
    }

    #[test]
    fn reconstruct_unchanged_file_round_trips() {
        let scheme = scheme();
        let set = lineset(&["abc\n", "cde\n"]);
        let collection = chunk_fn(&set, &scheme);
        let diff = Diff::create(&collection, 1, &scheme);
        let chain = diff.reconstruct(&scheme).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].start, scheme.first());
        assert_eq!(chain.last().unwrap().end, scheme.last());
    }

    #[test]
    fn reconstruct_fails_on_missing_boundary() {
        let scheme = scheme();
        let r = ChunkRef {
            start: scheme.digest("dangling"),
            end: scheme.last(),
            hash: scheme.digest("x"),
            timestamp: 1,
        };
        let diff = Diff::from_refs(vec![r]);
        let err = diff.reconstruct(&scheme).unwrap_err();
        assert!(matches!(err, ChunkTraceError::BrokenChain { .. }));
    }

    #[test]
    fn latest_timestamp_wins_on_conflicting_start() {
        let scheme = scheme();
        let old = ChunkRef {
            start: scheme.first(),
            end: scheme.last(),
            hash: scheme.digest("old content"),
            timestamp: 1,
        };
        let new = ChunkRef {
            start: scheme.first(),
            end: scheme.last(),
            hash: scheme.digest("new content"),
            timestamp: 2,
        };
        let diff = Diff::from_refs(vec![old, new.clone()]);
        let chain = diff.reconstruct(&scheme).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0], new);
    }

    #[test]
    fn merge_validates_and_returns_full_ref_set() {
        let scheme = scheme();
        let set = lineset(&["abc\n", "cde\n"]);
        let collection = chunk_fn(&set, &scheme);
        let a = Diff::create(&collection, 1, &scheme);
        let b = Diff::empty();
        let merged = a.merge(&b, &scheme).unwrap();
        assert_eq!(merged.refs().len(), 2);
    }

    #[test]
    fn contains_checks_full_id_equality() {
        let scheme = scheme();
        let r = ChunkRef {
            start: scheme.first(),
            end: scheme.last(),
            hash: scheme.digest("x"),
            timestamp: 1,
        };
        let diff = Diff::from_refs(vec![r.clone()]);
        assert!(diff.contains(&r));
        let other = ChunkRef {
            timestamp: 2,
            ..r
        };
        assert!(!diff.contains(&other));
    }

    #[test]
    fn s5_interior_line_edit_produces_one_matched_one_unmatched() {
        let scheme = scheme();
        let before = lineset(&["abcdefghijkl\n", "a\n", "cdefgh\n"]);
        let after = lineset(&["abcdefghijkl\n", "b\n", "cdefgh\n"]);

        let before_chunks = chunk_fn(&before, &scheme).split(10, &scheme);
        let diff = Diff::create(&before_chunks, 1, &scheme);

        let after_chunks = chunk_fn(&after, &scheme);
        let (matched, unmatched) = diff.extract(&after_chunks, &scheme);

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].start, scheme.first());
        assert_eq!(matched[0].end, scheme.digest("abcdefghijkl\n"));

        let unmatched_refs: Vec<_> = unmatched.split(10, &scheme).into_chunks();
        assert_eq!(unmatched_refs.len(), 1);
        assert_eq!(unmatched_refs[0].start, scheme.digest("abcdefghijkl\n"));
        assert_eq!(unmatched_refs[0].end, scheme.last());
        assert_eq!(unmatched_refs[0].chunk_hash(&scheme), scheme.digest("b\ncdefgh\n"));
    }

    #[test]
    fn s6_boundary_line_edit_invalidates_both_chunks() {
        let scheme = scheme();
        let before = lineset(&["abcdefghijkl\n", "a\n", "cdefgh\n"]);
        let after = lineset(&["abcdefghijk-\n", "a\n", "cdefgh\n"]);

        let before_chunks = chunk_fn(&before, &scheme).split(10, &scheme);
        let diff = Diff::create(&before_chunks, 1, &scheme);

        let after_chunks = chunk_fn(&after, &scheme);
        let (matched, _unmatched) = diff.extract(&after_chunks, &scheme);
        assert!(matched.is_empty());
    }
}
