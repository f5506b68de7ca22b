//! One-pass alignment index.
//!
//! [`AlignmentIndex::build`] walks an in-memory SAM buffer once. Header lines are collected
//! verbatim, every record on a catalogued sequence becomes an [`AlignmentLine`] (a reference
//! into the buffer, never a copy) and its byte weight is added to the [`WeightHistogram`].

use crate::reference::ReferenceCatalog;
use crate::region::WeightHistogram;

use super::fields::{field, is_header_line, lines, parse_position};

/// A record located in the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentLine {
    /// Offset of the line start in the buffer
    pub offset: usize,
    /// Line length including its `\n` when present
    pub len: usize,
    /// Catalog index of RNAME
    pub sequence: usize,
    /// POS, 1-based
    pub position: u64,
}

impl AlignmentLine {
    /// The line bytes within `buf`.
    #[must_use]
    pub fn bytes<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.offset..self.offset + self.len]
    }
}

/// Counters from an index scan.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanCounts {
    /// `@` header lines
    pub header_lines: u64,
    /// Non-header, non-blank lines
    pub records_seen: u64,
    /// Records indexed
    pub records_indexed: u64,
    /// Records lacking RNAME/POS or with a non-numeric POS
    pub unparsable: u64,
    /// Records whose RNAME is not catalogued
    pub unknown_sequence: u64,
    /// Records whose POS is outside `[1, length]`
    pub out_of_range: u64,
}

/// Header block and located records of a SAM buffer.
#[derive(Debug, Default)]
pub struct AlignmentIndex {
    /// Header lines, each newline-terminated, in input order
    pub header: Vec<u8>,
    /// Located records in input order
    pub lines: Vec<AlignmentLine>,
    /// Scan counters
    pub counts: ScanCounts,
}

impl AlignmentIndex {
    /// Scans `buf`, indexing records against `catalog` and weighting them into `histogram`.
    ///
    /// `histogram` must have been created over the same catalog.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn build(buf: &[u8], catalog: &ReferenceCatalog, histogram: &mut WeightHistogram) -> Self {
        let mut index = Self::default();

        for line in lines(buf) {
            let content = line.content();
            if content.is_empty() {
                continue;
            }
            if is_header_line(content) {
                index.counts.header_lines += 1;
                index.header.extend_from_slice(line.without_newline());
                index.header.push(b'\n');
                continue;
            }
            index.counts.records_seen += 1;

            let (Some(rname), Some(pos)) = (field(content, 2), field(content, 3).and_then(parse_position))
            else {
                index.counts.unparsable += 1;
                continue;
            };
            let Some(sequence) = catalog.index_of(rname) else {
                index.counts.unknown_sequence += 1;
                continue;
            };
            let Ok(position) = u64::try_from(pos) else {
                index.counts.out_of_range += 1;
                continue;
            };
            if !histogram.add(sequence, position, line.terminated_len() as f64) {
                index.counts.out_of_range += 1;
                continue;
            }

            index.counts.records_indexed += 1;
            index.lines.push(AlignmentLine { offset: line.offset, len: line.bytes.len(), sequence, position });
        }
        index
    }
}
