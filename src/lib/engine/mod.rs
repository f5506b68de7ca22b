//! Per-shard transforms run by the dispatcher's workers.
//!
//! Both engines are pure functions from an input shard to a capacity-checked [`OutputBuffer`]:
//!
//! - [`sort::sort_records`] orders records by reference name, position and input offset;
//! - [`dedup::mark_duplicates`] sets the duplicate bit on all but the best record of each
//!   duplicate group.
//!
//! [`process_shard`] combines them according to a [`ProcessMode`]. In [`ProcessMode::All`] the
//! pipeline is `dedup(sort(input))`; if marking overflows the output buffer, the sorted buffer is
//! returned instead and the result is flagged as a fallback.
//!
//! A sort never grows a shard by more than the final newline, so the intermediate sorted buffer
//! is sized from the input rather than from the output capacity. Peak memory of an `All` task is
//! about `input × (2 + slack)`.

pub mod buffer;
pub mod dedup;
pub mod sort;

use std::fmt;

use clap::ValueEnum;

pub use buffer::OutputBuffer;
pub use dedup::{DedupStats, mark_duplicates};
pub use sort::{SortStats, sort_records};

use crate::errors::EngineError;
use crate::region::naming::SHARD_EXTENSION;

/// Default output slack over the input size.
pub const DEFAULT_SLACK_FACTOR: f64 = 1.05;

/// Widest FLAG text growth per line: one digit becomes five (`65535`).
const MAX_FLAG_GROWTH: usize = 4;

/// What a worker does to a shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ProcessMode {
    /// Coordinate sort only
    Sort,
    /// Duplicate marking only; the shard must already be sorted
    Markdup,
    /// Sort, then mark duplicates
    #[default]
    All,
}

impl ProcessMode {
    /// Suffix inserted before `.sam` in output file names.
    #[must_use]
    pub fn output_suffix(self) -> &'static str {
        match self {
            Self::Sort => "sorted",
            Self::Markdup => "markdup",
            Self::All => "sorted.markdup",
        }
    }

    /// Output file name for a shard called `input_name`.
    ///
    /// Only a trailing `.sam` is replaced, so distinct input names map to distinct outputs.
    ///
    /// ```
    /// use samshard_lib::engine::ProcessMode;
    ///
    /// assert_eq!(ProcessMode::All.output_file_name("chr1_1_1000.sam"), "chr1_1_1000.sorted.markdup.sam");
    /// assert_eq!(ProcessMode::Sort.output_file_name("chr2_1_10_3.sam"), "chr2_1_10_3.sorted.sam");
    /// ```
    #[must_use]
    pub fn output_file_name(self, input_name: &str) -> String {
        let base = input_name.strip_suffix(SHARD_EXTENSION).unwrap_or(input_name);
        format!("{base}.{}{SHARD_EXTENSION}", self.output_suffix())
    }
}

impl fmt::Display for ProcessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sort => "sort",
            Self::Markdup => "markdup",
            Self::All => "all",
        };
        f.write_str(name)
    }
}

/// Output buffer capacity for a shard of `input` bytes.
///
/// The larger of the slack-scaled input size and the worst case for FLAG rewriting, so a
/// buffer of this size cannot overflow on any input.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn output_capacity(input: &[u8], slack_factor: f64) -> usize {
    let scaled = (input.len() as f64 * slack_factor).ceil() as usize;
    let lines = memchr::memchr_iter(b'\n', input).count() + 1;
    scaled.max(input.len() + MAX_FLAG_GROWTH * lines + 1)
}

/// Counters from one shard task.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ShardStats {
    /// Non-header lines seen
    pub records: u64,
    /// Lines dropped as malformed
    pub dropped: u64,
    /// Lines the sort could not place by coordinate
    pub unsortable: u64,
    /// Records eligible for duplicate grouping
    pub examined: u64,
    /// Records marked as duplicates
    pub duplicates: u64,
}

impl From<SortStats> for ShardStats {
    fn from(stats: SortStats) -> Self {
        Self { records: stats.records, unsortable: stats.invalid, ..Self::default() }
    }
}

impl From<DedupStats> for ShardStats {
    fn from(stats: DedupStats) -> Self {
        Self {
            records: stats.records,
            dropped: stats.dropped,
            unsortable: 0,
            examined: stats.examined,
            duplicates: stats.duplicates,
        }
    }
}

/// Bytes a sort of `input` can produce: every line is copied and at most a final newline added.
fn sorted_capacity(input: &[u8]) -> usize {
    input.len() + 1
}

/// Result of a successful shard task.
#[derive(Debug)]
pub struct ShardOutput {
    /// Bytes to write to the shard's output file
    pub data: Vec<u8>,
    /// Counters
    pub stats: ShardStats,
    /// True if duplicate marking overflowed and `data` is the sorted shard
    pub fell_back: bool,
}

/// Runs `mode` over one shard with an output buffer of `capacity` bytes.
///
/// # Errors
///
/// [`EngineError::CapacityExceeded`] when the (final) output does not fit, and
/// [`EngineError::EmptyOutput`] when the shard produced no bytes.
pub fn process_shard(input: &[u8], mode: ProcessMode, capacity: usize) -> Result<ShardOutput, EngineError> {
    let output = match mode {
        ProcessMode::Sort => {
            let mut out = OutputBuffer::with_capacity(capacity);
            let stats = sort_records(input, &mut out)?;
            ShardOutput { data: out.into_inner(), stats: stats.into(), fell_back: false }
        }
        ProcessMode::Markdup => {
            let mut out = OutputBuffer::with_capacity(capacity);
            let stats = mark_duplicates(input, &mut out)?;
            ShardOutput { data: out.into_inner(), stats: stats.into(), fell_back: false }
        }
        ProcessMode::All => {
            let mut sorted = OutputBuffer::with_capacity(sorted_capacity(input).min(capacity));
            let sort_stats = sort_records(input, &mut sorted)?;
            let mut marked = OutputBuffer::with_capacity(capacity);
            match mark_duplicates(sorted.as_slice(), &mut marked) {
                Ok(stats) => {
                    let stats = ShardStats { unsortable: sort_stats.invalid, ..stats.into() };
                    ShardOutput { data: marked.into_inner(), stats, fell_back: false }
                }
                Err(EngineError::CapacityExceeded { .. }) => {
                    drop(marked);
                    ShardOutput { data: sorted.into_inner(), stats: sort_stats.into(), fell_back: true }
                }
                Err(e) => return Err(e),
            }
        }
    };

    if output.data.is_empty() {
        return Err(EngineError::EmptyOutput);
    }
    Ok(output)
}
