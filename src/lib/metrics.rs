//! Run-level counters and TSV metrics output.
//!
//! Each command accumulates one of these structs and can write it as a single-row TSV with
//! [`write_metrics`]. Column names are the snake_case field names.

use std::path::Path;

use anyhow::{Context, Result};
use fgoxide::io::DelimFile;
use serde::Serialize;

/// Counters for turning a record stream into shard files (`split` and `shard`).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentMetrics {
    /// `@` header lines replicated into every shard
    pub header_lines: u64,
    /// Non-header, non-blank lines read
    pub records_seen: u64,
    /// Records written into a shard
    pub records_assigned: u64,
    /// Records with too few fields or a non-numeric position
    pub dropped_unparsable: u64,
    /// Records whose reference name is not in the catalog or descriptor
    pub dropped_unknown_sequence: u64,
    /// Records whose position lies outside `[1, length]`
    pub dropped_out_of_range: u64,
    /// Records on a known sequence that no region covers
    pub dropped_uncovered: u64,
    /// Regions available for assignment
    pub regions: u64,
    /// Shard files written
    pub shards_written: u64,
    /// Shard files that could not be written
    pub shards_failed: u64,
}

impl AssignmentMetrics {
    /// Total number of records dropped for any reason.
    #[must_use]
    pub fn records_dropped(&self) -> u64 {
        self.dropped_unparsable
            + self.dropped_unknown_sequence
            + self.dropped_out_of_range
            + self.dropped_uncovered
    }

    /// Folds another set of counters into this one.
    pub fn merge(&mut self, other: &Self) {
        self.header_lines = self.header_lines.max(other.header_lines);
        self.records_seen += other.records_seen;
        self.records_assigned += other.records_assigned;
        self.dropped_unparsable += other.dropped_unparsable;
        self.dropped_unknown_sequence += other.dropped_unknown_sequence;
        self.dropped_out_of_range += other.dropped_out_of_range;
        self.dropped_uncovered += other.dropped_uncovered;
        self.regions += other.regions;
        self.shards_written += other.shards_written;
        self.shards_failed += other.shards_failed;
    }
}

/// Counters for a `process` run over a shard directory.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchMetrics {
    /// Shard files discovered
    pub shards_total: u64,
    /// Shards whose output was written
    pub shards_processed: u64,
    /// Shards that failed in the worker or on write
    pub shards_failed: u64,
    /// Shards rejected before submission for exceeding the size cap
    pub shards_skipped_oversize: u64,
    /// Shards whose duplicate marking overflowed and were written sorted only
    pub shards_fallback_sort_only: u64,
    /// Dispatch batches run
    pub batches: u64,
    /// Non-header lines seen by the workers
    pub records_seen: u64,
    /// Lines dropped by the workers as malformed
    pub records_dropped: u64,
    /// Lines kept but sorted first for lacking a readable RNAME or POS
    pub records_unsortable: u64,
    /// Records eligible for duplicate grouping
    pub records_examined: u64,
    /// Records newly marked as duplicates
    pub duplicates_marked: u64,
    /// Bytes read from shard files
    pub input_bytes: u64,
    /// Bytes written to output files
    pub output_bytes: u64,
}

impl DispatchMetrics {
    /// Folds another set of counters into this one.
    pub fn merge(&mut self, other: &Self) {
        self.shards_total += other.shards_total;
        self.shards_processed += other.shards_processed;
        self.shards_failed += other.shards_failed;
        self.shards_skipped_oversize += other.shards_skipped_oversize;
        self.shards_fallback_sort_only += other.shards_fallback_sort_only;
        self.batches += other.batches;
        self.records_seen += other.records_seen;
        self.records_dropped += other.records_dropped;
        self.records_unsortable += other.records_unsortable;
        self.records_examined += other.records_examined;
        self.duplicates_marked += other.duplicates_marked;
        self.input_bytes += other.input_bytes;
        self.output_bytes += other.output_bytes;
    }

    /// Fraction of examined records marked as duplicates.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duplicate_rate(&self) -> f64 {
        if self.records_examined == 0 {
            0.0
        } else {
            self.duplicates_marked as f64 / self.records_examined as f64
        }
    }
}

/// Summary of a `plan` run.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct PlanMetrics {
    /// Catalogued sequences
    pub sequences: u64,
    /// Regions planned
    pub regions: u64,
    /// Records that contributed weight
    pub records_weighted: u64,
    /// Records seen in the alignment input
    pub records_seen: u64,
    /// Sum of all bin weights
    pub total_weight: f64,
    /// Target weight per region
    pub target_bytes: u64,
}

/// Writes metrics rows to a TSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_metrics<P: AsRef<Path>, T: Serialize>(
    path: P,
    metrics: &[T],
    description: &str,
) -> Result<()> {
    let path = path.as_ref();
    DelimFile::default()
        .write_tsv(&path, metrics)
        .with_context(|| format!("Failed to write {description} metrics: {}", path.display()))
}
