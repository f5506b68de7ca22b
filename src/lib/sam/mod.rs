//! Minimal SAM text handling.
//!
//! Records are never parsed into owned structures. A shard is one byte buffer and everything
//! downstream works on line descriptors and field spans into it:
//!
//! - [`fields`] - line iteration, tab-field spans, integer parsing
//! - [`flags`] - FLAG bit constants
//! - [`index`] - the one-pass alignment index that feeds the weight histogram

pub mod fields;
pub mod flags;
pub mod index;

pub use fields::{Line, LineIter, is_header_line, lines};
pub use index::{AlignmentIndex, AlignmentLine, ScanCounts};
