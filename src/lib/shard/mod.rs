//! Materializing shards: one file per non-empty region.
//!
//! Two paths lead here. [`assigner`] works from an in-memory [`AlignmentIndex`](crate::sam::AlignmentIndex)
//! and writes all shards at once in parallel. [`writer`] streams a SAM file against a loaded
//! region descriptor with bounded per-shard buffers. Both write the header block exactly once at
//! the top of each shard, followed by that shard's records in input order.
//!
//! A shard whose write fails partway is removed again, so every file left in the output
//! directory is complete.

pub mod assigner;
pub mod writer;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::warn;

pub use assigner::{Assignment, ShardAssigner, ShardLines, find_region, write_shards};
pub use writer::{DEFAULT_SHARD_BUFFER_BYTES, ShardWriterPool, split_stream};

/// Deletes the partially written output at `path` after a failed write.
///
/// A missing file is not an error; any other removal failure is logged.
pub fn remove_partial_output(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => warn!("Removed incomplete output {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Cannot remove incomplete output {}: {e}", path.display()),
    }
}
