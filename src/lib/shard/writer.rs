//! Streaming assignment against a region descriptor.
//!
//! [`split_stream`] reads a SAM stream line by line and routes each record to the shard of its
//! covering region. Output is buffered per shard and appended to the shard file whenever a
//! buffer fills, so memory stays at one buffer per touched shard regardless of input size. A
//! shard file is created and given the header block on its first flush, which guarantees the
//! header is written exactly once and before any record.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};

use super::{ShardAssigner, remove_partial_output};
use crate::errors::Result;
use crate::logging::format_count;
use crate::metrics::AssignmentMetrics;
use crate::progress::ProgressTracker;
use crate::region::RegionSet;
use crate::sam::fields::{field, is_header_line, parse_position};

/// Default per-shard buffer size before a flush (512 KiB).
pub const DEFAULT_SHARD_BUFFER_BYTES: usize = 512 * 1024;

struct ShardSlot {
    path: PathBuf,
    buffer: Vec<u8>,
    created: bool,
    failed: bool,
}

/// Buffered, append-mode writers for every shard of a region set.
pub struct ShardWriterPool {
    header: Vec<u8>,
    slots: Vec<ShardSlot>,
    flush_threshold: usize,
}

impl ShardWriterPool {
    /// Creates a pool with one (lazily opened) shard per region, in region-set order.
    #[must_use]
    pub fn new(out_dir: &Path, regions: &RegionSet, flush_threshold: usize) -> Self {
        let slots = regions
            .iter()
            .map(|(s, r, _)| ShardSlot {
                path: out_dir.join(regions.shard_name(s, r).to_string()),
                buffer: Vec::new(),
                created: false,
                failed: false,
            })
            .collect();
        Self { header: Vec::new(), slots, flush_threshold: flush_threshold.max(1) }
    }

    /// Appends a header line. Must happen before the first flush.
    pub fn push_header(&mut self, line: &[u8]) {
        debug_assert!(self.slots.iter().all(|s| !s.created), "header after first flush");
        self.header.extend_from_slice(line);
        if line.last() != Some(&b'\n') {
            self.header.push(b'\n');
        }
    }

    /// Queues a record for shard `ordinal`. Returns false if that shard has already failed.
    pub fn push(&mut self, ordinal: usize, line: &[u8]) -> bool {
        let threshold = self.flush_threshold;
        let slot = &mut self.slots[ordinal];
        if slot.failed {
            return false;
        }
        slot.buffer.extend_from_slice(line);
        if line.last() != Some(&b'\n') {
            slot.buffer.push(b'\n');
        }
        if slot.buffer.len() >= threshold {
            Self::flush_slot(slot, &self.header);
        }
        !slot.failed
    }

    fn flush_slot(slot: &mut ShardSlot, header: &[u8]) {
        if slot.failed || slot.buffer.is_empty() {
            return;
        }
        let result = (|| -> std::io::Result<()> {
            let mut file = if slot.created {
                OpenOptions::new().append(true).open(&slot.path)?
            } else {
                let mut file = File::create(&slot.path)?;
                file.write_all(header)?;
                file
            };
            file.write_all(&slot.buffer)?;
            file.flush()
        })();
        match result {
            Ok(()) => slot.created = true,
            Err(e) => {
                warn!("Failed to write shard {}: {e}", slot.path.display());
                remove_partial_output(&slot.path);
                slot.failed = true;
            }
        }
        slot.buffer.clear();
        slot.buffer.shrink_to_fit();
    }

    /// Flushes every buffer and returns `(shards written, shards failed)`.
    pub fn finish(mut self) -> (u64, u64) {
        let header = std::mem::take(&mut self.header);
        for slot in &mut self.slots {
            Self::flush_slot(slot, &header);
        }
        let written = self.slots.iter().filter(|s| s.created && !s.failed).count() as u64;
        let failed = self.slots.iter().filter(|s| s.failed).count() as u64;
        (written, failed)
    }
}

/// Streams `reader` into shard files under `out_dir`, one per non-empty region of `regions`.
///
/// `@` lines before the first record form the header. Records that are unparsable, on a
/// sequence without regions, at `POS <= 0`, or not covered by any region are dropped and
/// counted.
///
/// # Errors
///
/// Fails only if reading the input fails; shard write failures are counted in the metrics.
pub fn split_stream<R: BufRead>(
    mut reader: R,
    regions: &RegionSet,
    out_dir: &Path,
    buffer_bytes: usize,
) -> Result<AssignmentMetrics> {
    let assigner = ShardAssigner::new(regions);
    let mut pool = ShardWriterPool::new(out_dir, regions, buffer_bytes);
    let mut metrics = AssignmentMetrics { regions: regions.len() as u64, ..Default::default() };
    let progress = ProgressTracker::new("Split records");
    let mut in_header = true;
    let mut late_header_lines = 0u64;
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        let content = trim_line(&line);
        if content.is_empty() {
            continue;
        }
        if is_header_line(content) {
            if in_header {
                metrics.header_lines += 1;
                pool.push_header(&line);
            } else {
                late_header_lines += 1;
            }
            continue;
        }
        in_header = false;
        metrics.records_seen += 1;
        progress.log_if_needed(1);

        let (Some(rname), Some(pos)) = (field(content, 2), field(content, 3).and_then(parse_position))
        else {
            metrics.dropped_unparsable += 1;
            continue;
        };
        let Some(sequence) = regions.index_of(rname) else {
            metrics.dropped_unknown_sequence += 1;
            continue;
        };
        let Some(position) = u64::try_from(pos).ok().filter(|p| *p > 0) else {
            metrics.dropped_out_of_range += 1;
            continue;
        };
        let Some(region) = assigner.locate(sequence, position) else {
            metrics.dropped_uncovered += 1;
            continue;
        };
        if pool.push(regions.ordinal(sequence, region), &line) {
            metrics.records_assigned += 1;
        }
    }
    progress.log_final();

    if late_header_lines > 0 {
        warn!("Ignored {} header lines found after the first record", format_count(late_header_lines));
    }
    let (written, failed) = pool.finish();
    metrics.shards_written = written;
    metrics.shards_failed = failed;
    info!("Wrote {} shards ({} failed)", format_count(written), format_count(failed));
    Ok(metrics)
}

fn trim_line(line: &[u8]) -> &[u8] {
    let body = line.strip_suffix(b"\n").unwrap_or(line);
    body.strip_suffix(b"\r").unwrap_or(body)
}
