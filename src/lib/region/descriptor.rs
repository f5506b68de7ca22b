//! Region descriptor files.
//!
//! One region per line as whitespace-separated `sequence start end`. Blank lines and lines
//! starting with `#` are skipped; extra columns are ignored. Regions are grouped by sequence in
//! order of first appearance and sorted by start within a sequence. Any malformed line fails
//! the whole load.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use ahash::AHashMap;

use super::{Region, RegionSet};
use crate::errors::{Result, ShardError};

struct Entry {
    region: Region,
    line_number: usize,
}

/// Reads a region descriptor from a file.
///
/// # Errors
///
/// Fails on I/O errors, malformed lines, overlapping regions, or more than `max_regions` regions.
pub fn read_regions<P: AsRef<Path>>(path: P, max_regions: usize) -> Result<RegionSet> {
    let file = File::open(path.as_ref())?;
    parse_regions(BufReader::new(file), max_regions)
}

/// Parses a region descriptor.
///
/// ```
/// use samshard_lib::region::descriptor::parse_regions;
///
/// let text = "# sequence start end\nchr1 1001 2000\nchr1 1 1000\n\nchr2\t1\t500\n";
/// let set = parse_regions(text.as_bytes(), 3000).unwrap();
/// assert_eq!(set.len(), 3);
/// assert_eq!(set.regions(0)[0].start, 1);
/// ```
///
/// # Errors
///
/// See [`read_regions`].
pub fn parse_regions<R: BufRead>(reader: R, max_regions: usize) -> Result<RegionSet> {
    let mut order: Vec<String> = Vec::new();
    let mut grouped: AHashMap<String, Vec<Entry>> = AHashMap::new();
    let mut count = 0usize;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_number = i + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut tokens = trimmed.split_whitespace();
        let (Some(name), Some(start), Some(end)) = (tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(malformed(line_number, "expected 'sequence start end'"));
        };
        let start = parse_coordinate(start, line_number)?;
        let end = parse_coordinate(end, line_number)?;
        if start <= 0 || start > end {
            return Err(malformed(
                line_number,
                &format!("invalid coordinates {start}-{end} (need 0 < start <= end)"),
            ));
        }

        count += 1;
        if count > max_regions {
            return Err(ShardError::TooManyRegions { count, max: max_regions });
        }

        let entries = grouped.entry(name.to_string()).or_insert_with(|| {
            order.push(name.to_string());
            Vec::new()
        });
        entries.push(Entry { region: Region::new(start as u64, end as u64), line_number });
    }

    let mut set = RegionSet::new();
    for name in order {
        let mut entries = grouped.remove(&name).unwrap_or_default();
        entries.sort_by_key(|e| e.region);
        for pair in entries.windows(2) {
            if pair[1].region.start <= pair[0].region.end {
                return Err(malformed(
                    pair[1].line_number.max(pair[0].line_number),
                    &format!(
                        "region {name}:{}-{} overlaps {name}:{}-{}",
                        pair[1].region.start, pair[1].region.end, pair[0].region.start, pair[0].region.end
                    ),
                ));
            }
        }
        let length = entries.last().map_or(0, |e| e.region.end);
        set.push(name, length, entries.into_iter().map(|e| e.region).collect());
    }
    Ok(set)
}

/// Writes a region set as a descriptor, one tab-separated line per region.
///
/// # Errors
///
/// Fails on I/O errors.
pub fn write_regions<P: AsRef<Path>>(path: P, regions: &RegionSet) -> Result<()> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);
    format_regions(&mut out, regions)?;
    out.flush()?;
    Ok(())
}

/// Formats a region set as descriptor text into any writer.
///
/// # Errors
///
/// Fails on I/O errors.
pub fn format_regions<W: Write>(out: &mut W, regions: &RegionSet) -> Result<()> {
    writeln!(out, "#sequence\tstart\tend")?;
    for seq in regions.sequences() {
        for r in &seq.regions {
            writeln!(out, "{}\t{}\t{}", seq.name, r.start, r.end)?;
        }
    }
    Ok(())
}

fn parse_coordinate(token: &str, line_number: usize) -> Result<i64> {
    token.parse().map_err(|_| malformed(line_number, &format!("'{token}' is not an integer")))
}

fn malformed(line_number: usize, reason: &str) -> ShardError {
    ShardError::MalformedRegion { line_number, reason: reason.to_string() }
}
