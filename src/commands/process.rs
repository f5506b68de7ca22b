//! Sort and duplicate-mark every shard of a directory on a fixed-width worker pool.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use samshard_lib::dispatch::{
    DEFAULT_MAX_SHARD_BYTES, DEFAULT_WIDTH, DispatchConfig, WorkerPoolDispatcher, discover_shards,
    log_dispatch_config,
};
use samshard_lib::engine::{DEFAULT_SLACK_FACTOR, ProcessMode};
use samshard_lib::logging::{OperationTimer, log_dispatch_summary};
use samshard_lib::validation::{parse_byte_size, prepare_output_dir, validate_dir_exists};

use crate::commands::command::Command;
use crate::commands::common::MetricsOptions;

/// Process a directory of shard files.
#[derive(Debug, Parser)]
#[command(
    name = "process",
    about = "\x1b[38;5;72m[PROCESSING]\x1b[0m     \x1b[36mSort and mark duplicates in every shard of a directory\x1b[0m",
    long_about = r#"
Sort and/or mark duplicates in every shard file of a directory.

Every file whose name contains `.sam` is processed, in name order, in batches of `--width`
shards. A batch is read fully into memory, processed in parallel, and written out before the
next batch starts, so peak memory is bounded by width x max shard size x (1 + slack factor).

Modes:
  sort     coordinate sort; output `<shard>.sorted.sam`
  markdup  mark duplicates in an already sorted shard; output `<shard>.markdup.sam`
  all      sort then mark duplicates; output `<shard>.sorted.markdup.sam`

A shard that fails (empty output, buffer overflow, unwritable output) is reported and skipped
without affecting the rest of its batch. Shards over `--max-shard-size` are skipped with a
warning. In `all` mode a shard whose duplicate marking overflows is written sorted only.

Example usage:
  samshard process -i shards/ -o processed/
  samshard process -i shards/ -o sorted/ --mode sort --width 16 --threads 8
"#
)]
pub struct Process {
    /// Directory of shard files
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Output directory
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    /// Processing mode
    #[arg(short = 'm', long = "mode", value_enum, default_value_t = ProcessMode::All)]
    pub mode: ProcessMode,

    /// Shards per batch
    #[arg(short = 'w', long = "width", default_value_t = DEFAULT_WIDTH)]
    pub width: usize,

    /// Worker threads (default: the smaller of width and available cores)
    #[arg(short = 't', long = "threads")]
    pub threads: Option<usize>,

    /// Output buffer size relative to the input shard (must be above 1)
    #[arg(long = "slack-factor", default_value_t = DEFAULT_SLACK_FACTOR)]
    pub slack_factor: f64,

    /// Largest shard to process (accepts K, M and G suffixes)
    #[arg(long = "max-shard-size", value_parser = parse_byte_size, default_value_t = DEFAULT_MAX_SHARD_BYTES)]
    pub max_shard_size: u64,

    /// Metrics output
    #[command(flatten)]
    pub metrics: MetricsOptions,
}

impl Process {
    fn dispatch_config(&self) -> DispatchConfig {
        let config = DispatchConfig::default()
            .with_mode(self.mode)
            .with_width(self.width)
            .with_slack_factor(self.slack_factor)
            .with_max_shard_bytes(self.max_shard_size);
        match self.threads {
            Some(threads) => config.with_threads(threads),
            None => config,
        }
    }
}

impl Command for Process {
    fn execute(&self, _command_line: &str) -> Result<()> {
        validate_dir_exists(&self.input, "Shard directory")?;
        let dispatcher = WorkerPoolDispatcher::new(self.dispatch_config())?;
        prepare_output_dir(&self.output)?;

        let shards = discover_shards(&self.input)?;
        info!("Input: {}", self.input.display());
        info!("Output: {}", self.output.display());
        log_dispatch_config(dispatcher.config(), shards.len());
        if shards.is_empty() {
            warn!("No shard files found in {}", self.input.display());
        }

        let timer = OperationTimer::new("Processing shards", "shards");
        let metrics = dispatcher.run(&shards, &self.output);

        log_dispatch_summary(&metrics);
        self.metrics.write(&metrics, "process")?;
        timer.log_completion(metrics.shards_processed);
        Ok(())
    }
}
