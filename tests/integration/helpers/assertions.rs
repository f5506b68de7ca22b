//! Custom assertion helpers for integration tests.
//!
//! These helpers read SAM text files produced by the binary and check record properties.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

/// Header lines of a SAM file.
pub fn header_lines(path: &Path) -> Vec<String> {
    read_lines(path).into_iter().filter(|l| l.starts_with('@')).collect()
}

/// Non-header lines of a SAM file.
pub fn record_lines(path: &Path) -> Vec<String> {
    read_lines(path).into_iter().filter(|l| !l.starts_with('@')).collect()
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()))
        .lines()
        .map(str::to_string)
        .collect()
}

/// Tab field `index` (0-based) of a record line.
pub fn field(line: &str, index: usize) -> &str {
    line.split('\t').nth(index).unwrap_or_else(|| panic!("Missing field {index} in {line:?}"))
}

/// FLAG of a record line.
pub fn flag_of(line: &str) -> u16 {
    field(line, 1).parse().expect("FLAG should be numeric")
}

/// Finds the record named `name`.
pub fn find_record<'a>(lines: &'a [String], name: &str) -> &'a str {
    lines
        .iter()
        .find(|l| field(l, 0) == name)
        .unwrap_or_else(|| panic!("Record {name} not found"))
}

/// Asserts that records are ordered by reference name bytes, then position.
pub fn assert_coordinate_sorted(lines: &[String]) {
    let keys: Vec<(&str, i64)> =
        lines.iter().map(|l| (field(l, 2), field(l, 3).parse().expect("POS"))).collect();
    for pair in keys.windows(2) {
        assert!(pair[0] <= pair[1], "Records out of order: {:?} before {:?}", pair[0], pair[1]);
    }
}

/// Asserts that the record named `name` has the duplicate bit set or unset.
pub fn assert_duplicate(lines: &[String], name: &str, expected: bool) {
    let flag = flag_of(find_record(lines, name));
    assert_eq!(flag & 0x400 != 0, expected, "Unexpected duplicate state for {name} (FLAG {flag})");
}

/// Sorted file names in a directory.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("Failed to list {}: {e}", dir.display()))
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
