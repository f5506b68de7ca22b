//! Custom error types for samshard operations.
//!
//! [`ShardError`] covers the failures that stop a whole run (bad reference, malformed region
//! descriptor, too many regions, unusable output directory). Failures confined to a single
//! shard are reported through [`EngineError`] so a dispatch batch can keep going.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for samshard operations
pub type Result<T> = std::result::Result<T, ShardError>;

/// Error type for samshard operations that abort the run
#[derive(Error, Debug)]
pub enum ShardError {
    /// Invalid parameter value provided
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// File format error
    #[error("Invalid {file_type} file '{path}': {reason}")]
    InvalidFileFormat {
        /// Type of file (e.g., "FASTA", "SAM")
        file_type: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// None of the reference sequences survived allow-list filtering
    #[error("No usable sequences in reference '{path}' after allow-list filtering")]
    NoUsableSequences {
        /// Path to the reference
        path: String,
    },

    /// A line of a region descriptor could not be parsed
    #[error("Malformed region at line {line_number}: {reason}")]
    MalformedRegion {
        /// 1-based line number within the descriptor
        line_number: usize,
        /// Explanation of the problem
        reason: String,
    },

    /// Planning or loading produced more regions than allowed
    #[error("Region count {count} exceeds the configured maximum of {max}")]
    TooManyRegions {
        /// Number of regions produced
        count: usize,
        /// Configured maximum
        max: usize,
    },

    /// Output path exists but is not a directory
    #[error("Output path '{}' exists and is not a directory", path.display())]
    NotADirectory {
        /// The offending path
        path: PathBuf,
    },

    /// Underlying I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure of a single shard's sort or duplicate-marking task.
///
/// These never abort a run: the dispatcher logs them, skips the shard's output and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A write would have run past the end of the output buffer
    #[error("output buffer overflow: {needed} bytes needed, capacity is {capacity}")]
    CapacityExceeded {
        /// Bytes the buffer would have held after the write
        needed: usize,
        /// Fixed capacity of the buffer
        capacity: usize,
    },

    /// The task finished without producing any bytes
    #[error("worker produced an empty output")]
    EmptyOutput,
}
