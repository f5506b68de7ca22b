//! Shard file names.
//!
//! A shard is named `<sequence>_<start>_<end>.sam`, or `<sequence>_<start>_<end>_<index>.sam`
//! when the region set is numbered. Parsing takes the text before the first `.sam`, drops a
//! processing suffix such as `.sorted` left by `process`, splits the rest on `_` and reads the
//! first three tokens. Dots in sequence names survive; a sequence name containing `_` cannot be
//! recovered from a file name.

use std::fmt;

/// Extension marker for shard files.
pub const SHARD_EXTENSION: &str = ".sam";

/// Suffixes `process` inserts before the extension, longest first.
const PROCESSED_SUFFIXES: [&str; 3] = [".sorted.markdup", ".sorted", ".markdup"];

/// The region a shard file covers, as encoded in its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardName {
    /// Sequence name
    pub sequence: String,
    /// Region start, 1-based inclusive
    pub start: u64,
    /// Region end, inclusive
    pub end: u64,
    /// Running shard index, when the region set is numbered
    pub index: Option<usize>,
}

impl ShardName {
    /// Re-derives the region from a shard file name.
    ///
    /// Returns `None` when the name lacks `.sam`, has fewer than three `_` tokens, or the
    /// coordinates are not `0 < start <= end`.
    ///
    /// ```
    /// use samshard_lib::region::ShardName;
    ///
    /// let name = ShardName::parse("chr2_1_5000.sam").unwrap();
    /// assert_eq!((name.sequence.as_str(), name.start, name.end), ("chr2", 1, 5000));
    ///
    /// let sorted = ShardName::parse("chr2_1_5000_17.sorted.sam").unwrap();
    /// assert_eq!(sorted.index, Some(17));
    /// assert!(ShardName::parse("chr2_0_10.sam").is_none());
    /// ```
    #[must_use]
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = &file_name[..file_name.find(SHARD_EXTENSION)?];
        let stem = PROCESSED_SUFFIXES.iter().find_map(|s| stem.strip_suffix(s)).unwrap_or(stem);
        let mut tokens = stem.split('_');
        let sequence = tokens.next().filter(|s| !s.is_empty())?;
        let start: u64 = tokens.next()?.parse().ok()?;
        let end: u64 = tokens.next()?.parse().ok()?;
        if start == 0 || start > end {
            return None;
        }
        let index = tokens.next().and_then(|t| t.parse().ok());
        Some(Self { sequence: sequence.to_string(), start, end, index })
    }
}

impl fmt::Display for ShardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.sequence, self.start, self.end)?;
        if let Some(index) = self.index {
            write!(f, "_{index}")?;
        }
        f.write_str(SHARD_EXTENSION)
    }
}
