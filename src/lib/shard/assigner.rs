//! Assigning indexed records to regions and writing one shard file per non-empty region.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::warn;
use rayon::prelude::*;

use super::remove_partial_output;
use crate::metrics::AssignmentMetrics;
use crate::progress::ProgressTracker;
use crate::reference::ReferenceCatalog;
use crate::region::{Region, RegionSet};
use crate::sam::{AlignmentIndex, AlignmentLine};

/// Finds the region containing `position` in a start-sorted, non-overlapping list.
///
/// ```
/// use samshard_lib::region::Region;
/// use samshard_lib::shard::find_region;
///
/// let regions = [Region::new(1, 100), Region::new(101, 250)];
/// assert_eq!(find_region(&regions, 101), Some(1));
/// assert_eq!(find_region(&regions, 251), None);
/// ```
#[must_use]
pub fn find_region(regions: &[Region], position: u64) -> Option<usize> {
    let idx = regions.partition_point(|r| r.start <= position);
    let candidate = idx.checked_sub(1)?;
    regions[candidate].contains(position).then_some(candidate)
}

/// Records assigned to one region.
#[derive(Debug, Clone)]
pub struct ShardLines {
    /// Index of the sequence in the region set
    pub sequence: usize,
    /// Index of the region within its sequence
    pub region: usize,
    /// Assigned records in input order
    pub lines: Vec<AlignmentLine>,
}

/// Result of assigning an index to a region set.
#[derive(Debug, Default)]
pub struct Assignment {
    /// Non-empty shards in region-set order
    pub shards: Vec<ShardLines>,
    /// Records assigned to some shard
    pub assigned: u64,
    /// Records on a sequence without regions
    pub unknown_sequence: u64,
    /// Records no region covers
    pub uncovered: u64,
}

/// Maps records to the regions of a [`RegionSet`].
pub struct ShardAssigner<'a> {
    regions: &'a RegionSet,
}

impl<'a> ShardAssigner<'a> {
    /// Creates an assigner over a region set.
    #[must_use]
    pub fn new(regions: &'a RegionSet) -> Self {
        Self { regions }
    }

    /// Region index covering `position` on region-set sequence `sequence`.
    #[must_use]
    pub fn locate(&self, sequence: usize, position: u64) -> Option<usize> {
        find_region(self.regions.regions(sequence), position)
    }

    /// Region-set sequence index and region index for a record by name.
    #[must_use]
    pub fn locate_by_name(&self, name: &[u8], position: u64) -> Option<(usize, usize)> {
        let sequence = self.regions.index_of(name)?;
        self.locate(sequence, position).map(|r| (sequence, r))
    }

    /// Assigns every indexed record. Order within a shard is input order.
    ///
    /// Index lines refer to `catalog` sequences; they are matched to region-set sequences by
    /// name, so a descriptor-loaded set works as well as a planned one.
    #[must_use]
    pub fn assign(&self, index: &AlignmentIndex, catalog: &ReferenceCatalog) -> Assignment {
        let mapping: Vec<Option<usize>> =
            catalog.iter().map(|s| self.regions.index_of(s.name.as_bytes())).collect();
        let mut buckets: Vec<Vec<Vec<AlignmentLine>>> =
            self.regions.sequences().iter().map(|s| vec![Vec::new(); s.regions.len()]).collect();
        let mut assignment = Assignment::default();

        for line in &index.lines {
            let Some(sequence) = mapping.get(line.sequence).copied().flatten() else {
                assignment.unknown_sequence += 1;
                continue;
            };
            match self.locate(sequence, line.position) {
                Some(region) => {
                    buckets[sequence][region].push(*line);
                    assignment.assigned += 1;
                }
                None => assignment.uncovered += 1,
            }
        }

        for (sequence, regions) in buckets.into_iter().enumerate() {
            for (region, lines) in regions.into_iter().enumerate() {
                if !lines.is_empty() {
                    assignment.shards.push(ShardLines { sequence, region, lines });
                }
            }
        }
        assignment
    }
}

/// Writes every non-empty shard of `assignment` into `out_dir`, in parallel.
///
/// Each file gets the header block once, then its records newline-terminated in input order.
/// A shard that cannot be written is logged and counted; the others are unaffected.
#[must_use]
pub fn write_shards(
    out_dir: &Path,
    regions: &RegionSet,
    header: &[u8],
    buf: &[u8],
    assignment: &Assignment,
) -> AssignmentMetrics {
    let progress = ProgressTracker::new("Wrote shards").with_interval(100);
    let results: Vec<bool> = assignment
        .shards
        .par_iter()
        .map(|shard| {
            let path = out_dir.join(regions.shard_name(shard.sequence, shard.region).to_string());
            let ok = match write_shard(&path, header, buf, &shard.lines) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Failed to write shard {}: {e}", path.display());
                    remove_partial_output(&path);
                    false
                }
            };
            progress.log_if_needed(1);
            ok
        })
        .collect();
    progress.log_final();

    let written = results.iter().filter(|ok| **ok).count() as u64;
    AssignmentMetrics {
        records_assigned: assignment.assigned,
        dropped_unknown_sequence: assignment.unknown_sequence,
        dropped_uncovered: assignment.uncovered,
        regions: regions.len() as u64,
        shards_written: written,
        shards_failed: results.len() as u64 - written,
        ..AssignmentMetrics::default()
    }
}

fn write_shard(path: &Path, header: &[u8], buf: &[u8], lines: &[AlignmentLine]) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(header)?;
    for line in lines {
        let bytes = line.bytes(buf);
        out.write_all(bytes)?;
        if bytes.last() != Some(&b'\n') {
            out.write_all(b"\n")?;
        }
    }
    out.flush()
}
