//! Coordinate regions and the per-sequence region lists a run shards into.
//!
//! A [`RegionSet`] holds, for each sequence in reference order, an ascending list of
//! non-overlapping [`Region`]s. Sets come either from the [`planner`] (weight-balanced or
//! uniform) or from a region descriptor file ([`descriptor`]). Every region maps to exactly one
//! shard file named by [`naming::ShardName`].

pub mod descriptor;
pub mod histogram;
pub mod naming;
pub mod planner;

use ahash::AHashMap;

use crate::errors::{Result, ShardError};

pub use histogram::WeightHistogram;
pub use naming::ShardName;
pub use planner::{PartitionPlanner, PlannerConfig};

/// A closed, 1-based coordinate interval on one sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Region {
    /// First base, 1-based inclusive
    pub start: u64,
    /// Last base, inclusive
    pub end: u64,
}

impl Region {
    /// Creates a region; callers guarantee `1 <= start <= end`.
    #[must_use]
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start >= 1 && start <= end, "invalid region {start}-{end}");
        Self { start, end }
    }

    /// Returns true if `position` lies within the region.
    #[must_use]
    pub fn contains(&self, position: u64) -> bool {
        self.start <= position && position <= self.end
    }

    /// Number of bases covered.
    #[must_use]
    pub fn span(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// The regions of one sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRegions {
    /// Sequence name
    pub name: String,
    /// Sequence length (for descriptor-loaded sets, the largest region end)
    pub length: u64,
    /// Regions sorted by start, non-overlapping
    pub regions: Vec<Region>,
}

/// Per-sequence region lists in reference order.
#[derive(Debug, Clone, Default)]
pub struct RegionSet {
    sequences: Vec<SequenceRegions>,
    by_name: AHashMap<Vec<u8>, usize>,
    numbered: bool,
}

impl RegionSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sequence and its regions. Regions must already be sorted and disjoint.
    pub fn push(&mut self, name: impl Into<String>, length: u64, regions: Vec<Region>) {
        let name = name.into();
        self.by_name.insert(name.as_bytes().to_vec(), self.sequences.len());
        self.sequences.push(SequenceRegions { name, length, regions });
    }

    /// Marks the set so shard names carry a running shard index.
    #[must_use]
    pub fn with_numbered_shards(mut self) -> Self {
        self.numbered = true;
        self
    }

    /// True when shard names carry a shard index.
    #[must_use]
    pub fn is_numbered(&self) -> bool {
        self.numbered
    }

    /// Total number of regions over all sequences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sequences.iter().map(|s| s.regions.len()).sum()
    }

    /// True if no sequence has a region.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sequences in order.
    #[must_use]
    pub fn sequences(&self) -> &[SequenceRegions] {
        &self.sequences
    }

    /// Index of the sequence with this name.
    #[must_use]
    pub fn index_of(&self, name: &[u8]) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Regions of the sequence at `sequence`.
    #[must_use]
    pub fn regions(&self, sequence: usize) -> &[Region] {
        self.sequences.get(sequence).map_or(&[], |s| s.regions.as_slice())
    }

    /// Iterates `(sequence index, region index, region)` in reference order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &Region)> {
        self.sequences
            .iter()
            .enumerate()
            .flat_map(|(s, seq)| seq.regions.iter().enumerate().map(move |(r, region)| (s, r, region)))
    }

    /// Fails if the set holds more than `max` regions.
    pub fn check_limit(&self, max: usize) -> Result<()> {
        let count = self.len();
        if count > max {
            return Err(ShardError::TooManyRegions { count, max });
        }
        Ok(())
    }

    /// Running index of a region across the whole set.
    #[must_use]
    pub fn ordinal(&self, sequence: usize, region: usize) -> usize {
        self.sequences[..sequence].iter().map(|s| s.regions.len()).sum::<usize>() + region
    }

    /// File name of the shard for a region.
    #[must_use]
    pub fn shard_name(&self, sequence: usize, region: usize) -> ShardName {
        let seq = &self.sequences[sequence];
        let r = seq.regions[region];
        let index = self.numbered.then(|| self.ordinal(sequence, region));
        ShardName { sequence: seq.name.clone(), start: r.start, end: r.end, index }
    }

    /// True if the regions of every sequence tile `[1, length]` with no gap or overlap.
    #[must_use]
    pub fn covers_all(&self) -> bool {
        self.sequences.iter().all(|s| tiles(&s.regions, s.length))
    }
}

/// True if `regions` are contiguous from 1 through `length`.
#[must_use]
pub fn tiles(regions: &[Region], length: u64) -> bool {
    let mut next = 1;
    for r in regions {
        if r.start != next || r.end < r.start {
            return false;
        }
        next = r.end + 1;
    }
    next == length + 1
}
