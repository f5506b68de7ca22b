//! Common CLI options shared across commands.
//!
//! This module provides shared argument structures that can be composed into
//! command structs using `#[command(flatten)]`, plus the load-and-plan step shared by
//! `plan` and `shard`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use log::info;
use serde::Serialize;

use samshard_lib::logging::{OperationTimer, format_bytes, format_count};
use samshard_lib::metrics::{PlanMetrics, write_metrics};
use samshard_lib::reference::{AllowList, ReferenceCatalog};
use samshard_lib::region::planner::{DEFAULT_MAX_REGIONS, DEFAULT_TARGET_BYTES};
use samshard_lib::region::{PartitionPlanner, PlannerConfig, RegionSet, WeightHistogram};
use samshard_lib::sam::AlignmentIndex;
use samshard_lib::validation::{parse_byte_size, validate_file_exists};

/// Reference catalog options.
#[derive(Debug, Clone, Args)]
pub struct ReferenceOptions {
    /// Reference FASTA (a sibling `.fai` is used when present) or FASTA index
    #[arg(short = 'r', long = "reference")]
    pub reference: PathBuf,

    /// Sequences to keep: `standard` (chr1-chr22, chrX, chrY), `all`, or comma-separated names
    #[arg(long = "allow-list", default_value = "standard")]
    pub allow_list: AllowList,
}

impl ReferenceOptions {
    /// Loads the allow-listed reference catalog.
    pub fn load(&self) -> Result<ReferenceCatalog> {
        validate_file_exists(&self.reference, "Reference")?;
        let catalog = ReferenceCatalog::from_path(&self.reference, &self.allow_list)?;
        info!(
            "Loaded {} reference sequences ({} bases) from {}",
            format_count(catalog.len() as u64),
            format_count(catalog.total_length()),
            self.reference.display()
        );
        Ok(catalog)
    }
}

/// Partition planner options.
#[derive(Debug, Clone, Args)]
pub struct PlannerOptions {
    /// Histogram bin width in bases
    #[arg(long = "bin-size", default_value_t = samshard_lib::region::histogram::DEFAULT_BIN_SIZE)]
    pub bin_size: u64,

    /// Target shard size in bytes (accepts K, M and G suffixes)
    #[arg(long = "target-size", value_parser = parse_byte_size, default_value_t = DEFAULT_TARGET_BYTES)]
    pub target_size: u64,

    /// Maximum number of regions; planning more is an error
    #[arg(long = "max-regions", default_value_t = DEFAULT_MAX_REGIONS)]
    pub max_regions: usize,

    /// Ignore alignment weights and cut the reference into about N equal-span regions
    #[arg(long = "uniform")]
    pub uniform: Option<usize>,
}

impl PlannerOptions {
    /// Planner configuration from these options.
    #[must_use]
    pub fn config(&self) -> PlannerConfig {
        PlannerConfig {
            bin_size: self.bin_size,
            target_bytes: self.target_size,
            max_regions: self.max_regions,
        }
    }
}

/// Options for writing run metrics to a file.
#[derive(Debug, Clone, Default, Args)]
pub struct MetricsOptions {
    /// Optional output TSV for run metrics
    #[arg(long = "metrics")]
    pub metrics: Option<PathBuf>,
}

impl MetricsOptions {
    /// Writes `row` if a metrics path was given.
    pub fn write<T: Serialize>(&self, row: &T, description: &str) -> Result<()> {
        if let Some(path) = &self.metrics {
            write_metrics(path, std::slice::from_ref(row), description)?;
            info!("Wrote {description} metrics to {}", path.display());
        }
        Ok(())
    }
}

/// An alignment file read into memory, indexed and planned.
pub struct PlannedInput {
    /// Allow-listed reference sequences
    pub catalog: ReferenceCatalog,
    /// Raw SAM bytes
    pub sam: Vec<u8>,
    /// Header block and located records of `sam`
    pub index: AlignmentIndex,
    /// Planned regions
    pub regions: RegionSet,
    /// Planning summary
    pub metrics: PlanMetrics,
}

/// Reads `input`, weights its records and plans regions over the reference.
pub fn load_and_plan(
    input: &Path,
    reference: &ReferenceOptions,
    planner_options: &PlannerOptions,
) -> Result<PlannedInput> {
    validate_file_exists(input, "Input SAM")?;
    let planner = PartitionPlanner::new(planner_options.config())?;
    let catalog = reference.load()?;

    let sam = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    info!("Read {} from {}", format_bytes(sam.len() as u64), input.display());

    let timer = OperationTimer::new("Indexing alignments", "records");
    let mut histogram = WeightHistogram::new(&catalog, planner.config().bin_size);
    let index = AlignmentIndex::build(&sam, &catalog, &mut histogram);
    timer.log_completion(index.counts.records_seen);

    let regions = match planner_options.uniform {
        Some(count) => {
            info!("Planning {count} uniform regions");
            planner.plan_uniform(&catalog, count)?
        }
        None => {
            info!("Planning regions with target size {}", format_bytes(planner.config().target_bytes));
            planner.plan(&catalog, &histogram)?
        }
    };

    let metrics = PlanMetrics {
        sequences: catalog.len() as u64,
        regions: regions.len() as u64,
        records_weighted: index.counts.records_indexed,
        records_seen: index.counts.records_seen,
        total_weight: histogram.total_weight(),
        target_bytes: planner.config().target_bytes,
    };
    Ok(PlannedInput { catalog, sam, index, regions, metrics })
}

/// Logs the summary block of a planning run.
pub fn log_plan_summary(metrics: &PlanMetrics) {
    info!("=== Summary ===");
    info!("  Sequences: {}", format_count(metrics.sequences));
    info!("  Records seen: {}", format_count(metrics.records_seen));
    info!("  Records weighted: {}", format_count(metrics.records_weighted));
    info!("  Total weight: {}", format_bytes(metrics.total_weight as u64));
    info!("  Regions: {}", format_count(metrics.regions));
}
