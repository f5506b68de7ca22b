//! Partition planning: turning a catalog and a weight histogram into regions.
//!
//! The greedy planner walks each sequence's bins left to right and closes a region at the end
//! of the first bin that brings the accumulated weight to the target. A region therefore
//! overshoots by at most one bin, bins are never split, and whatever is left after the last
//! close becomes a final region running to the end of the sequence. Sequences are planned
//! independently so a region never spans two sequences.
//!
//! [`PartitionPlanner::plan_uniform`] is the coordinate-only alternative: equal-span slices of
//! the catalogued genome, cut at sequence ends.

use log::debug;

use super::{Region, RegionSet, WeightHistogram, histogram::DEFAULT_BIN_SIZE};
use crate::errors::{Result, ShardError};
use crate::reference::ReferenceCatalog;

/// Default target weight per region (64 MiB).
pub const DEFAULT_TARGET_BYTES: u64 = 64 * 1024 * 1024;

/// Default maximum number of regions a plan or descriptor may hold.
pub const DEFAULT_MAX_REGIONS: usize = 3_000;

/// Planner settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Bin width in bases
    pub bin_size: u64,
    /// Target weight (estimated bytes) per region
    pub target_bytes: u64,
    /// Hard cap on the number of regions
    pub max_regions: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            bin_size: DEFAULT_BIN_SIZE,
            target_bytes: DEFAULT_TARGET_BYTES,
            max_regions: DEFAULT_MAX_REGIONS,
        }
    }
}

impl PlannerConfig {
    /// Checks that every setting is positive.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("bin-size", self.bin_size),
            ("target-size", self.target_bytes),
            ("max-regions", self.max_regions as u64),
        ] {
            if value == 0 {
                return Err(ShardError::InvalidParameter {
                    parameter: name.to_string(),
                    reason: "must be greater than 0".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Plans regions over a reference catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartitionPlanner {
    config: PlannerConfig,
}

impl PartitionPlanner {
    /// Creates a planner, validating its configuration.
    pub fn new(config: PlannerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The planner's configuration.
    #[must_use]
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Greedy weight-balanced plan.
    ///
    /// `histogram` must have been built over `catalog`; sequences the histogram lacks are
    /// planned as a single whole-sequence region.
    ///
    /// # Errors
    ///
    /// Fails with [`ShardError::TooManyRegions`] if the plan exceeds the configured maximum.
    #[allow(clippy::cast_precision_loss)]
    pub fn plan(&self, catalog: &ReferenceCatalog, histogram: &WeightHistogram) -> Result<RegionSet> {
        let target = self.config.target_bytes as f64;
        let mut set = RegionSet::new();
        for (i, seq) in catalog.iter().enumerate() {
            let regions = plan_sequence(seq.length, histogram.bins(i), histogram.bin_size(), target);
            debug!("{}: {} regions over {} bp", seq.name, regions.len(), seq.length);
            set.push(seq.name.clone(), seq.length, regions);
        }
        set.check_limit(self.config.max_regions)?;
        Ok(set)
    }

    /// Uniform plan of about `count` equal-span regions over the whole catalog.
    ///
    /// The span is `ceil(total_length / count)`; each sequence is cut into consecutive slices
    /// of that span with a shorter last slice, so the result can hold a few more than `count`
    /// regions. Shard names from this plan carry a running index.
    ///
    /// # Errors
    ///
    /// Fails if `count` is zero or the plan exceeds the configured maximum.
    pub fn plan_uniform(&self, catalog: &ReferenceCatalog, count: usize) -> Result<RegionSet> {
        if count == 0 {
            return Err(ShardError::InvalidParameter {
                parameter: "uniform".to_string(),
                reason: "region count must be greater than 0".to_string(),
            });
        }
        let span = catalog.total_length().div_ceil(count as u64).max(1);
        let mut set = RegionSet::new();
        for seq in catalog.iter() {
            let mut regions = Vec::new();
            let mut start = 1;
            while start <= seq.length {
                let end = (start + span - 1).min(seq.length);
                regions.push(Region::new(start, end));
                start = end + 1;
            }
            set.push(seq.name.clone(), seq.length, regions);
        }
        set.check_limit(self.config.max_regions)?;
        Ok(set.with_numbered_shards())
    }
}

/// Greedy plan for a single sequence.
///
/// `bins[b]` covers coordinates `b * bin_size + 1 ..= min((b + 1) * bin_size, length)`. A
/// zero-length sequence has no regions.
///
/// ```
/// use samshard_lib::region::{Region, planner::plan_sequence};
///
/// let regions = plan_sequence(2500, &[800.0, 800.0, 800.0], 1000, 1500.0);
/// assert_eq!(regions, vec![Region::new(1, 2000), Region::new(2001, 2500)]);
/// ```
#[must_use]
pub fn plan_sequence(length: u64, bins: &[f64], bin_size: u64, target: f64) -> Vec<Region> {
    let mut regions = Vec::new();
    let mut start = 1u64;
    let mut acc = 0.0;

    for (b, &weight) in bins.iter().enumerate() {
        if start > length {
            break;
        }
        acc += weight;
        if acc >= target {
            let end = ((b as u64 + 1) * bin_size).min(length);
            regions.push(Region::new(start, end));
            start = end + 1;
            acc = 0.0;
        }
    }
    if start <= length {
        regions.push(Region::new(start, length));
    }
    regions
}
