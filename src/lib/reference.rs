//! Reference sequence catalog.
//!
//! A [`ReferenceCatalog`] is the ordered list of reference sequences a run shards over: their
//! names and lengths, filtered through an [`AllowList`]. Only names and lengths are needed, so a
//! FASTA index (`.fai`) next to the FASTA is preferred over scanning the sequence data.
//!
//! The catalog order is the reference order and is what region descriptors and shard listings
//! follow. Each sequence is addressed by a dense index used by the histogram, planner and
//! assigner.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ahash::{AHashMap, AHashSet};
use anyhow::{Context, Result};
use bstr::ByteSlice;
use log::debug;
use noodles::fasta::fai;

use crate::errors::ShardError;

/// A named reference sequence and its length in bases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceInfo {
    /// Sequence name as it appears in the reference and in RNAME
    pub name: String,
    /// Length in bases
    pub length: u64,
}

impl SequenceInfo {
    /// Creates a new sequence entry.
    #[must_use]
    pub fn new(name: impl Into<String>, length: u64) -> Self {
        Self { name: name.into(), length }
    }
}

/// Which reference sequences to keep.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AllowList {
    /// `chr1`..`chr22`, `chrX` and `chrY`
    #[default]
    StandardHuman,
    /// Every sequence in the reference
    All,
    /// An explicit set of names
    Names(AHashSet<String>),
}

impl AllowList {
    /// Returns true if `name` should be kept.
    #[must_use]
    pub fn allows(&self, name: &str) -> bool {
        match self {
            AllowList::StandardHuman => is_standard_human(name),
            AllowList::All => true,
            AllowList::Names(names) => names.contains(name),
        }
    }
}

fn is_standard_human(name: &str) -> bool {
    match name.strip_prefix("chr") {
        Some("X" | "Y") => true,
        Some(n) if !n.starts_with('0') => n.parse::<u8>().is_ok_and(|n| (1..=22).contains(&n)),
        _ => false,
    }
}

impl FromStr for AllowList {
    type Err = String;

    /// Parses `standard`, `all`, or a comma-separated list of names.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "standard" => Ok(AllowList::StandardHuman),
            "all" => Ok(AllowList::All),
            other => {
                let names: AHashSet<String> = other
                    .split(',')
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
                    .collect();
                if names.is_empty() {
                    return Err(format!("Empty allow-list: '{s}'"));
                }
                Ok(AllowList::Names(names))
            }
        }
    }
}

impl fmt::Display for AllowList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllowList::StandardHuman => write!(f, "standard (chr1-chr22, chrX, chrY)"),
            AllowList::All => write!(f, "all"),
            AllowList::Names(names) => write!(f, "{} named sequences", names.len()),
        }
    }
}

/// Ordered, allow-list-filtered set of reference sequences.
#[derive(Debug, Clone)]
pub struct ReferenceCatalog {
    sequences: Vec<SequenceInfo>,
    by_name: AHashMap<Vec<u8>, usize>,
}

impl ReferenceCatalog {
    /// Loads a catalog from a FASTA file, using a sibling `.fai` index when one exists.
    ///
    /// # Errors
    ///
    /// Fails if the reference cannot be read, contains a duplicate name, or no sequence
    /// survives the allow-list.
    pub fn from_path<P: AsRef<Path>>(path: P, allow: &AllowList) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ShardError::InvalidFileFormat {
                file_type: "Reference".to_string(),
                path: path.display().to_string(),
                reason: "File does not exist".to_string(),
            }
            .into());
        }

        if path.extension().is_some_and(|ext| ext == "fai") {
            return Self::from_fai(path, allow);
        }
        if let Some(fai_path) = find_fai_path(path) {
            debug!("Using FAI index for sequence lengths: {}", fai_path.display());
            return Self::from_fai(&fai_path, allow);
        }
        debug!("No FAI index found, scanning FASTA: {}", path.display());
        Self::from_fasta(path, allow)
    }

    /// Loads a catalog by scanning every record of a FASTA file.
    ///
    /// # Errors
    ///
    /// See [`ReferenceCatalog::from_path`].
    pub fn from_fasta<P: AsRef<Path>>(path: P, allow: &AllowList) -> Result<Self> {
        use noodles::fasta;

        let path = path.as_ref();
        let mut reader = fasta::io::reader::Builder
            .build_from_path(path)
            .with_context(|| format!("Failed to open reference FASTA: {}", path.display()))?;

        let mut entries = Vec::new();
        for result in reader.records() {
            let record = result
                .with_context(|| format!("Failed to read reference FASTA: {}", path.display()))?;
            let name = record.name().to_str_lossy().into_owned();
            entries.push(SequenceInfo::new(name, record.sequence().len() as u64));
        }
        Self::from_sequences(entries, allow, path)
    }

    /// Loads a catalog from a FASTA index.
    ///
    /// # Errors
    ///
    /// See [`ReferenceCatalog::from_path`].
    pub fn from_fai<P: AsRef<Path>>(path: P, allow: &AllowList) -> Result<Self> {
        let path = path.as_ref();
        let index = fai::fs::read(path)
            .with_context(|| format!("Failed to read FAI index: {}", path.display()))?;
        let records: &[fai::Record] = index.as_ref();
        let entries = records.iter().map(|record| {
            SequenceInfo::new(String::from_utf8_lossy(record.name().as_ref()), record.length())
        });
        Self::from_sequences(entries, allow, path)
    }

    /// Builds a catalog from sequences in reference order.
    ///
    /// `source` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Fails on a duplicate name or when nothing survives the allow-list.
    pub fn from_sequences<I>(sequences: I, allow: &AllowList, source: &Path) -> Result<Self>
    where
        I: IntoIterator<Item = SequenceInfo>,
    {
        let mut kept = Vec::new();
        let mut by_name = AHashMap::new();
        let mut seen = AHashSet::new();
        let mut total = 0usize;

        for info in sequences {
            total += 1;
            if !seen.insert(info.name.clone()) {
                return Err(ShardError::InvalidFileFormat {
                    file_type: "Reference".to_string(),
                    path: source.display().to_string(),
                    reason: format!("duplicate sequence name '{}'", info.name),
                }
                .into());
            }
            if allow.allows(&info.name) {
                by_name.insert(info.name.as_bytes().to_vec(), kept.len());
                kept.push(info);
            }
        }

        if kept.is_empty() {
            return Err(ShardError::NoUsableSequences { path: source.display().to_string() }.into());
        }
        debug!("Kept {} of {} reference sequences", kept.len(), total);
        Ok(Self { sequences: kept, by_name })
    }

    /// Number of catalogued sequences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// Always false for a successfully built catalog.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Sequence at a catalog index.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&SequenceInfo> {
        self.sequences.get(index)
    }

    /// Catalog index of the sequence with this name.
    #[must_use]
    pub fn index_of(&self, name: &[u8]) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Sum of all catalogued sequence lengths.
    #[must_use]
    pub fn total_length(&self) -> u64 {
        self.sequences.iter().map(|s| s.length).sum()
    }

    /// Sequences in reference order.
    pub fn iter(&self) -> impl Iterator<Item = &SequenceInfo> {
        self.sequences.iter()
    }

    /// Sequences as a slice.
    #[must_use]
    pub fn sequences(&self) -> &[SequenceInfo] {
        &self.sequences
    }
}

/// Find a FAI index for a FASTA file (`ref.fai` beside `ref.fa`, or `ref.fa.fai`).
fn find_fai_path(fasta_path: &Path) -> Option<PathBuf> {
    let appended = PathBuf::from(format!("{}.fai", fasta_path.display()));
    if appended.is_file() {
        return Some(appended);
    }
    let replaced = fasta_path.with_extension("fai");
    replaced.is_file().then_some(replaced)
}
