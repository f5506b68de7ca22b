//! Sort-based duplicate marking of a coordinate-sorted shard.
//!
//! Each record is reduced once to a [`CompactRecord`]. Records with the UNMAPPED, SECONDARY or
//! SUPPLEMENTARY bit are left out of grouping. The rest are ordered by [`DuplicateKey`] (ties
//! kept in input order), each run of equal keys is a duplicate group, and every record in a
//! group except the highest-scoring one gets the duplicate bit. The score is the sum of base
//! qualities capped at 15.
//!
//! Output keeps input order: header lines first, then each retained record with its FLAG field
//! re-rendered in place. Everything else on the line is copied byte for byte. Because the new
//! FLAG text can be longer than the old one, every line goes through the capacity-checked
//! [`OutputBuffer`].

use std::ops::Range;

use ahash::AHashMap;

use super::buffer::OutputBuffer;
use crate::errors::EngineError;
use crate::sam::fields::{field_spans, is_header_line, lines, parse_flag, parse_position};
use crate::sam::flags::{DUPLICATE, EXCLUDED_FROM_DEDUP, orientation};

/// Fields a record needs for duplicate marking (QNAME through QUAL).
const REQUIRED_FIELDS: usize = 11;

const FLAG_FIELD: usize = 1;
const RNAME_FIELD: usize = 2;
const POS_FIELD: usize = 3;
const RNEXT_FIELD: usize = 6;
const PNEXT_FIELD: usize = 7;
const QUAL_FIELD: usize = 10;

/// Per-base quality cap used in the record score.
const MAX_SCORED_QUALITY: i32 = 15;

/// Sequence id of `*` (no reference).
pub const UNMAPPED_ID: i32 = -1;

//////////////////////////////////////////////////////////////////////////////
// Records and keys
//////////////////////////////////////////////////////////////////////////////

/// Identity of a duplicate group: equal keys mean duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DuplicateKey {
    /// Id of RNAME within the shard
    pub sequence_id: i32,
    /// POS
    pub position: i64,
    /// Id of RNEXT within the shard (`=` resolves to `sequence_id`)
    pub mate_sequence_id: i32,
    /// PNEXT
    pub mate_position: i64,
    /// Two-bit strand orientation, see [`orientation`]
    pub orientation: u8,
}

/// Everything duplicate marking needs from one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactRecord {
    /// Offset of the line in the input
    pub line_offset: usize,
    /// Line length without its terminator
    pub line_length: usize,
    /// Start of the FLAG text within the line
    pub flag_offset: usize,
    /// Length of the FLAG text
    pub flag_length: usize,
    /// Parsed FLAG
    pub flag: u16,
    /// Grouping key
    pub key: DuplicateKey,
    /// Capped quality sum
    pub quality_score: u16,
    /// Marked by this pass
    pub is_duplicate: bool,
}

impl CompactRecord {
    /// True if the record takes part in grouping.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.flag & EXCLUDED_FROM_DEDUP == 0
    }
}

/// Shard-local mapping from reference names to small integer ids.
///
/// Ids are handed out in order of first appearance and stay fixed for the shard's lifetime.
#[derive(Debug, Default)]
pub struct NameTable<'a> {
    ids: AHashMap<&'a [u8], i32>,
}

impl<'a> NameTable<'a> {
    /// Id for `name`, assigning a new one on first sight. `*` is [`UNMAPPED_ID`].
    pub fn resolve(&mut self, name: &'a [u8]) -> i32 {
        if name == b"*" {
            return UNMAPPED_ID;
        }
        let next = self.ids.len() as i32;
        *self.ids.entry(name).or_insert(next)
    }

    /// Number of distinct names seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True if no name has been seen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Sum of `min(q - 33, 15)` over the positive base qualities, saturating at `u16::MAX`.
///
/// An absent quality string (`*`) scores zero.
///
/// ```
/// use samshard_lib::engine::dedup::quality_score;
///
/// assert_eq!(quality_score(b"*"), 0);
/// assert_eq!(quality_score(b"!+5I"), 10 + 15 + 15);
/// ```
#[must_use]
pub fn quality_score(qual: &[u8]) -> u16 {
    if qual == b"*" {
        return 0;
    }
    let total = qual
        .iter()
        .map(|&c| i32::from(c) - 33)
        .filter(|&q| q > 0)
        .map(|q| q.min(MAX_SCORED_QUALITY) as u32)
        .fold(0u32, u32::saturating_add);
    u16::try_from(total).unwrap_or(u16::MAX)
}

/// Decimal text of `flag`, written right-aligned into `buf`.
fn flag_digits(flag: u16, buf: &mut [u8; 5]) -> &[u8] {
    let mut n = flag;
    let mut start = buf.len();
    loop {
        start -= 1;
        buf[start] = b'0' + (n % 10) as u8;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    &buf[start..]
}

/// Builds a [`CompactRecord`] for a line, or `None` if a required field is missing or unreadable.
fn compact<'a>(
    content: &'a [u8],
    offset: usize,
    line_length: usize,
    names: &mut NameTable<'a>,
) -> Option<CompactRecord> {
    let mut spans: [Range<usize>; REQUIRED_FIELDS] = Default::default();
    if field_spans(content, &mut spans) < REQUIRED_FIELDS {
        return None;
    }
    let flag = parse_flag(&content[spans[FLAG_FIELD].clone()])?;
    let position = parse_position(&content[spans[POS_FIELD].clone()])?;
    let mate_position = parse_position(&content[spans[PNEXT_FIELD].clone()])?;
    let sequence_id = names.resolve(&content[spans[RNAME_FIELD].clone()]);
    let mate_sequence_id = match &content[spans[RNEXT_FIELD].clone()] {
        b"=" => sequence_id,
        other => names.resolve(other),
    };
    let score = quality_score(&content[spans[QUAL_FIELD].clone()]);

    Some(CompactRecord {
        line_offset: offset,
        line_length,
        flag_offset: spans[FLAG_FIELD].start,
        flag_length: spans[FLAG_FIELD].len(),
        flag,
        key: DuplicateKey {
            sequence_id,
            position,
            mate_sequence_id,
            mate_position,
            orientation: orientation(flag),
        },
        quality_score: score,
        is_duplicate: false,
    })
}

//////////////////////////////////////////////////////////////////////////////
// Duplicate marking
//////////////////////////////////////////////////////////////////////////////

/// Counters from duplicate marking of one shard.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DedupStats {
    /// Header lines copied
    pub header_lines: u64,
    /// Non-header lines seen
    pub records: u64,
    /// Lines dropped for missing or unreadable fields
    pub dropped: u64,
    /// Records that took part in grouping
    pub examined: u64,
    /// Duplicate groups with more than one member
    pub groups: u64,
    /// Records marked as duplicates
    pub duplicates: u64,
}

/// Marks duplicates among `records` in place and returns `(groups, duplicates)`.
///
/// `records` must be in shard order; that order breaks score ties.
pub fn mark_groups(records: &mut [CompactRecord]) -> (u64, u64) {
    let mut order: Vec<(DuplicateKey, usize)> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_eligible())
        .map(|(i, r)| (r.key, i))
        .collect();
    order.sort_unstable();

    let mut groups = 0;
    let mut duplicates = 0;
    for group in order.chunk_by(|a, b| a.0 == b.0) {
        if group.len() < 2 {
            continue;
        }
        groups += 1;
        let mut best = group[0].1;
        for &(_, i) in &group[1..] {
            if records[i].quality_score > records[best].quality_score {
                best = i;
            }
        }
        for &(_, i) in group {
            if i != best {
                records[i].is_duplicate = true;
                duplicates += 1;
            }
        }
    }
    (groups, duplicates)
}

/// Marks duplicates in a coordinate-sorted shard, writing the result to `out`.
///
/// # Errors
///
/// Fails with [`EngineError::CapacityExceeded`] if a rewritten line does not fit in `out`.
/// Nothing past the failing line is written, and callers should discard the partial output.
pub fn mark_duplicates(input: &[u8], out: &mut OutputBuffer) -> Result<DedupStats, EngineError> {
    let mut stats = DedupStats::default();
    let mut names = NameTable::default();
    let mut records = Vec::new();

    for line in lines(input) {
        let content = line.content();
        if content.is_empty() {
            continue;
        }
        if is_header_line(content) {
            stats.header_lines += 1;
            out.append_line(line.without_newline())?;
            continue;
        }
        stats.records += 1;
        match compact(content, line.offset, line.without_newline().len(), &mut names) {
            Some(record) => records.push(record),
            None => stats.dropped += 1,
        }
    }

    stats.examined = records.iter().filter(|r| r.is_eligible()).count() as u64;
    (stats.groups, stats.duplicates) = mark_groups(&mut records);

    let mut digits = [0u8; 5];
    for record in &records {
        let line = &input[record.line_offset..record.line_offset + record.line_length];
        let flag = if record.is_duplicate { record.flag | DUPLICATE } else { record.flag };

        let flag_end = record.flag_offset + record.flag_length;
        out.append_all(&[
            &line[..record.flag_offset],
            flag_digits(flag, &mut digits),
            &line[flag_end..],
            b"\n",
        ])?;
    }
    Ok(stats)
}
