//! Per-sequence weight histogram over fixed-size coordinate bins.
//!
//! The weight of a record is the number of bytes it will occupy in its shard (its line length
//! including the newline), so the sum over a region estimates that region's shard size.

use crate::reference::ReferenceCatalog;

/// Default bin width in bases.
pub const DEFAULT_BIN_SIZE: u64 = 1_000;

/// Accumulated record weight per coordinate bin, per catalogued sequence.
#[derive(Debug, Clone)]
pub struct WeightHistogram {
    bin_size: u64,
    lengths: Vec<u64>,
    bins: Vec<Vec<f64>>,
}

impl WeightHistogram {
    /// Creates an all-zero histogram with `ceil(length / bin_size)` bins per sequence.
    ///
    /// # Panics
    ///
    /// Panics if `bin_size` is zero.
    #[must_use]
    pub fn new(catalog: &ReferenceCatalog, bin_size: u64) -> Self {
        assert!(bin_size > 0, "bin size must be positive");
        let lengths: Vec<u64> = catalog.iter().map(|s| s.length).collect();
        let bins = lengths.iter().map(|&len| vec![0.0; len.div_ceil(bin_size) as usize]).collect();
        Self { bin_size, lengths, bins }
    }

    /// Creates a histogram from precomputed bins. Sequence lengths are given alongside.
    ///
    /// # Panics
    ///
    /// Panics if `bin_size` is zero or the two vectors differ in length.
    #[must_use]
    pub fn from_bins(bin_size: u64, lengths: Vec<u64>, bins: Vec<Vec<f64>>) -> Self {
        assert!(bin_size > 0, "bin size must be positive");
        assert_eq!(lengths.len(), bins.len(), "one bin vector per sequence");
        Self { bin_size, lengths, bins }
    }

    /// Adds `weight` to the bin holding 1-based `position` of `sequence`.
    ///
    /// Returns false, leaving the histogram untouched, if the position lies outside
    /// `[1, length]` or the sequence is unknown.
    pub fn add(&mut self, sequence: usize, position: u64, weight: f64) -> bool {
        let Some(&length) = self.lengths.get(sequence) else {
            return false;
        };
        if position == 0 || position > length {
            return false;
        }
        let bins = &mut self.bins[sequence];
        if bins.is_empty() {
            return false;
        }
        let bin = (((position - 1) / self.bin_size) as usize).min(bins.len() - 1);
        bins[bin] += weight;
        true
    }

    /// Bin width in bases.
    #[must_use]
    pub fn bin_size(&self) -> u64 {
        self.bin_size
    }

    /// Number of sequences.
    #[must_use]
    pub fn num_sequences(&self) -> usize {
        self.bins.len()
    }

    /// Bins of one sequence (empty for an unknown index).
    #[must_use]
    pub fn bins(&self, sequence: usize) -> &[f64] {
        self.bins.get(sequence).map_or(&[], Vec::as_slice)
    }

    /// Length of one sequence as recorded in the histogram.
    #[must_use]
    pub fn length(&self, sequence: usize) -> u64 {
        self.lengths.get(sequence).copied().unwrap_or(0)
    }

    /// Last coordinate covered by `bin` on a sequence of `length` bases.
    #[must_use]
    pub fn bin_end(&self, bin: usize, length: u64) -> u64 {
        ((bin as u64 + 1) * self.bin_size).min(length)
    }

    /// Total weight of one sequence.
    #[must_use]
    pub fn sequence_weight(&self, sequence: usize) -> f64 {
        self.bins(sequence).iter().sum()
    }

    /// Total weight over all sequences.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        (0..self.bins.len()).map(|s| self.sequence_weight(s)).sum()
    }
}
