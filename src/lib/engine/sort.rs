//! Coordinate sort of a shard.
//!
//! Header lines are copied first, verbatim and in input order. Every other non-blank line gets
//! a `LineKey` borrowing its reference name straight from the input, the keys are sorted, and
//! the lines are copied out in key order. No record bytes move until the final copy, so the
//! output is a permutation of the input lines.
//!
//! Key order:
//! 1. lines whose RNAME or POS cannot be read come first, in input order;
//! 2. then by RNAME bytes, then POS as a signed integer, then input offset.
//!
//! The offset tie-break makes the order total, so sorting sorted output is a no-op.

use std::cmp::Ordering;

use super::buffer::OutputBuffer;
use crate::errors::EngineError;
use crate::sam::fields::{field, is_header_line, lines, parse_position};

/// Counters from sorting one shard.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SortStats {
    /// Header lines copied
    pub header_lines: u64,
    /// Non-header lines ordered
    pub records: u64,
    /// Of those, lines without a readable RNAME or POS
    pub invalid: u64,
}

/// Sort key of one line, borrowing from the shard buffer.
#[derive(Debug, Clone, Copy)]
struct LineKey<'a> {
    /// `None` for lines without a readable RNAME/POS
    coordinate: Option<(&'a [u8], i64)>,
    offset: usize,
    line: &'a [u8],
}

impl Ord for LineKey<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.coordinate, other.coordinate) {
            (None, None) => self.offset.cmp(&other.offset),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some((name_a, pos_a)), Some((name_b, pos_b))) => name_a
                .cmp(name_b)
                .then(pos_a.cmp(&pos_b))
                .then(self.offset.cmp(&other.offset)),
        }
    }
}

impl PartialOrd for LineKey<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for LineKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for LineKey<'_> {}

/// Sorts the records of `input` into `out`.
///
/// Every output line is newline-terminated and blank lines are dropped.
///
/// # Errors
///
/// Fails with [`EngineError::CapacityExceeded`] if `out` is too small.
pub fn sort_records(input: &[u8], out: &mut OutputBuffer) -> Result<SortStats, EngineError> {
    let mut stats = SortStats::default();
    let mut keys = Vec::new();

    for line in lines(input) {
        let content = line.content();
        if content.is_empty() {
            continue;
        }
        let body = line.without_newline();
        if is_header_line(content) {
            stats.header_lines += 1;
            out.append_line(body)?;
            continue;
        }

        let coordinate = match (field(content, 2), field(content, 3).and_then(parse_position)) {
            (Some(name), Some(pos)) => Some((name, pos)),
            _ => {
                stats.invalid += 1;
                None
            }
        };
        keys.push(LineKey { coordinate, offset: line.offset, line: body });
    }

    stats.records = keys.len() as u64;
    keys.sort_unstable();
    for key in &keys {
        out.append_line(key.line)?;
    }
    Ok(stats)
}
