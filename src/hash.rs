//! Deterministic hashing for lines and chunks.

use sha1::{Digest, Sha1};

use crate::error::{ChunkTraceError, Result};

pub const MIN_HASH_LENGTH: usize = 8;
pub const MAX_HASH_LENGTH: usize = 40;
pub const DEFAULT_HASH_LENGTH: usize = 40;

/// A width-parameterized hashing scheme. `H` in chunk boundary arithmetic
/// always means "the first `width` hex characters of this scheme's digest".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashScheme {
    width: usize,
}

impl HashScheme {
    pub fn new(width: usize) -> Result<Self> {
        if !(MIN_HASH_LENGTH..=MAX_HASH_LENGTH).contains(&width) {
            return Err(ChunkTraceError::validation(
                "hash_length",
                format!("must be between {MIN_HASH_LENGTH} and {MAX_HASH_LENGTH}"),
            ));
        }
        Ok(Self { width })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Hash arbitrary text to this scheme's truncated hex digest.
    pub fn digest(&self, text: &str) -> String {
        let mut hasher = Sha1::new();
        hasher.update(text.as_bytes());
        let full = hex::encode(hasher.finalize());
        full[..self.width].to_string()
    }

    /// Synthetic boundary marking the start of a file: all zeros.
    pub fn first(&self) -> String {
        "0".repeat(self.width)
    }

    /// Synthetic boundary marking the end of a file: all `f`s.
    pub fn last(&self) -> String {
        "f".repeat(self.width)
    }
}

impl Default for HashScheme {
    fn default() -> Self {
        Self {
            width: DEFAULT_HASH_LENGTH,
        }
    }
}
