//! Utilities for generating test SAM and reference data.

#![allow(dead_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Builds SAM text line by line.
#[derive(Debug, Default)]
pub struct SamBuilder {
    header: String,
    records: String,
}

impl SamBuilder {
    /// Starts a SAM file with an `@HD` line.
    pub fn new() -> Self {
        Self { header: "@HD\tVN:1.6\tSO:unsorted\n".to_string(), records: String::new() }
    }

    /// Adds an `@SQ` line.
    pub fn sequence(mut self, name: &str, length: u64) -> Self {
        writeln!(self.header, "@SQ\tSN:{name}\tLN:{length}").unwrap();
        self
    }

    /// Adds a full 11-field record with a four-base read.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        mut self,
        name: &str,
        flag: u16,
        rname: &str,
        pos: i64,
        rnext: &str,
        pnext: i64,
        qual: &str,
    ) -> Self {
        writeln!(self.records, "{name}\t{flag}\t{rname}\t{pos}\t60\t4M\t{rnext}\t{pnext}\t0\tACGT\t{qual}")
            .unwrap();
        self
    }

    /// Adds an unpaired forward record with a high-quality read.
    pub fn read(self, name: &str, rname: &str, pos: i64) -> Self {
        self.record(name, 0, rname, pos, "*", 0, "IIII")
    }

    /// Adds a raw line verbatim.
    pub fn raw(mut self, line: &str) -> Self {
        self.records.push_str(line);
        self.records.push('\n');
        self
    }

    /// The header block alone.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// The full SAM text.
    pub fn build(&self) -> String {
        format!("{}{}", self.header, self.records)
    }

    /// Writes the SAM text to `path`.
    pub fn write(&self, path: &Path) {
        fs::write(path, self.build()).expect("Failed to write SAM file");
    }
}

/// Writes a FASTA with one `ACGT`-repeat sequence per entry, wrapped at 60 bases.
pub fn write_fasta(path: &Path, sequences: &[(&str, usize)]) {
    let mut text = String::new();
    for (name, length) in sequences {
        writeln!(text, ">{name} test sequence").unwrap();
        let bases: String = "ACGT".chars().cycle().take(*length).collect();
        for chunk in bases.as_bytes().chunks(60) {
            text.push_str(std::str::from_utf8(chunk).unwrap());
            text.push('\n');
        }
    }
    fs::write(path, text).expect("Failed to write FASTA file");
}

/// Writes a FASTA index for sequences as laid out by [`write_fasta`].
pub fn write_fai(path: &Path, sequences: &[(&str, usize)]) {
    let mut text = String::new();
    let mut offset = 0usize;
    for (name, length) in sequences {
        offset += format!(">{name} test sequence\n").len();
        writeln!(text, "{name}\t{length}\t{offset}\t60\t61").unwrap();
        offset += length + length.div_ceil(60);
    }
    fs::write(path, text).expect("Failed to write FAI file");
}

/// Writes a region descriptor from `(sequence, start, end)` triples.
pub fn write_descriptor(path: &Path, regions: &[(&str, u64, u64)]) {
    let mut text = String::from("# sequence start end\n");
    for (name, start, end) in regions {
        writeln!(text, "{name} {start} {end}").unwrap();
    }
    fs::write(path, text).expect("Failed to write region descriptor");
}
