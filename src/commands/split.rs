//! Stream a SAM file into shard files according to an existing region descriptor.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use samshard_lib::logging::{OperationTimer, format_bytes, log_assignment_summary};
use samshard_lib::region::descriptor::read_regions;
use samshard_lib::region::planner::DEFAULT_MAX_REGIONS;
use samshard_lib::shard::{DEFAULT_SHARD_BUFFER_BYTES, split_stream};
use samshard_lib::validation::{parse_byte_size, prepare_output_dir, validate_file_exists};

use crate::commands::command::Command;
use crate::commands::common::MetricsOptions;

/// Read buffer for the input stream.
const INPUT_BUFFER_BYTES: usize = 4 * 1024 * 1024;

/// Split a SAM stream into region shards.
#[derive(Debug, Parser)]
#[command(
    name = "split",
    about = "\x1b[38;5;30m[SHARDING]\x1b[0m       \x1b[36mStream a SAM file into shards from a region descriptor\x1b[0m",
    long_about = r#"
Stream a SAM file into one shard file per region of a region descriptor.

The input is read line by line. Header lines before the first record are copied once to the top
of every shard. Each record goes to the shard whose region contains its reference name and
position, in input order. Records that cannot be parsed, sit on a sequence without regions, have
a position of zero or below, or fall outside every region are dropped and counted.

Shards are named `<sequence>_<start>_<end>.sam` and only created for regions that receive at
least one record.

Example usage:
  samshard split -i input.sam -R regions.txt -o shards/
  samshard split -i input.sam -R regions.txt -o shards/ --buffer-size 1M
"#
)]
pub struct Split {
    /// Input SAM file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Region descriptor (`sequence start end` per line)
    #[arg(short = 'R', long = "regions")]
    pub regions: PathBuf,

    /// Output directory for shard files
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    /// Per-shard buffer flushed to disk when full (accepts K, M and G suffixes)
    #[arg(long = "buffer-size", value_parser = parse_byte_size, default_value_t = DEFAULT_SHARD_BUFFER_BYTES as u64)]
    pub buffer_size: u64,

    /// Maximum number of regions the descriptor may hold
    #[arg(long = "max-regions", default_value_t = DEFAULT_MAX_REGIONS)]
    pub max_regions: usize,

    /// Metrics output
    #[command(flatten)]
    pub metrics: MetricsOptions,
}

impl Command for Split {
    fn execute(&self, _command_line: &str) -> Result<()> {
        validate_file_exists(&self.input, "Input SAM")?;
        validate_file_exists(&self.regions, "Region descriptor")?;

        let regions = read_regions(&self.regions, self.max_regions)?;
        prepare_output_dir(&self.output)?;

        info!("Input: {}", self.input.display());
        info!("Regions: {} from {}", regions.len(), self.regions.display());
        info!("Output: {}", self.output.display());
        info!("Shard buffer size: {}", format_bytes(self.buffer_size));

        let timer = OperationTimer::new("Splitting records", "records");
        let file = File::open(&self.input)
            .with_context(|| format!("Failed to open input SAM: {}", self.input.display()))?;
        let reader = BufReader::with_capacity(INPUT_BUFFER_BYTES, file);
        let metrics = split_stream(reader, &regions, &self.output, self.buffer_size as usize)?;

        log_assignment_summary(&metrics);
        self.metrics.write(&metrics, "split")?;
        timer.log_completion(metrics.records_seen);
        Ok(())
    }
}
