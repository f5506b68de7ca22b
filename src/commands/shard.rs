//! Plan regions and write shard files from an in-memory alignment index in one pass.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;
use samshard_lib::logging::{OperationTimer, log_assignment_summary};
use samshard_lib::metrics::AssignmentMetrics;
use samshard_lib::region::descriptor::write_regions;
use samshard_lib::shard::{ShardAssigner, write_shards};
use samshard_lib::validation::prepare_output_dir;

use crate::commands::command::Command;
use crate::commands::common::{
    MetricsOptions, PlannerOptions, ReferenceOptions, load_and_plan, log_plan_summary,
};

/// Plan regions and shard a SAM file.
#[derive(Debug, Parser)]
#[command(
    name = "shard",
    about = "\x1b[38;5;30m[SHARDING]\x1b[0m       \x1b[36mPlan regions and write shard files in one pass\x1b[0m",
    long_about = r#"
Plan balanced regions for a SAM file and write one shard file per non-empty region.

The whole input is read into memory and indexed once; the same index drives planning and
assignment. Shard files are written in parallel. Each starts with the full header block
followed by its records in input order.

Example usage:
  samshard shard -r ref.fa -i input.sam -o shards/
  samshard shard -r ref.fa -i input.sam -o shards/ --target-size 16M --regions-out regions.txt
"#
)]
pub struct Shard {
    /// Input SAM file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Output directory for shard files
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

    /// Also write the planned regions to this descriptor file
    #[arg(long = "regions-out")]
    pub regions_out: Option<PathBuf>,

    /// Reference options
    #[command(flatten)]
    pub reference: ReferenceOptions,

    /// Planner options
    #[command(flatten)]
    pub planner: PlannerOptions,

    /// Metrics output
    #[command(flatten)]
    pub metrics: MetricsOptions,
}

impl Command for Shard {
    fn execute(&self, _command_line: &str) -> Result<()> {
        info!("Input: {}", self.input.display());
        info!("Output: {}", self.output.display());
        info!("Allow-list: {}", self.reference.allow_list);

        let planned = load_and_plan(&self.input, &self.reference, &self.planner)?;
        log_plan_summary(&planned.metrics);
        prepare_output_dir(&self.output)?;
        if let Some(path) = &self.regions_out {
            write_regions(path, &planned.regions)?;
            info!("Wrote regions to {}", path.display());
        }

        let timer = OperationTimer::new("Writing shards", "shards");
        let assignment = ShardAssigner::new(&planned.regions).assign(&planned.index, &planned.catalog);
        let written =
            write_shards(&self.output, &planned.regions, &planned.index.header, &planned.sam, &assignment);

        let counts = planned.index.counts;
        let mut metrics = AssignmentMetrics {
            header_lines: counts.header_lines,
            records_seen: counts.records_seen,
            dropped_unparsable: counts.unparsable,
            dropped_unknown_sequence: counts.unknown_sequence,
            dropped_out_of_range: counts.out_of_range,
            ..AssignmentMetrics::default()
        };
        metrics.merge(&written);

        log_assignment_summary(&metrics);
        self.metrics.write(&metrics, "shard")?;
        timer.log_completion(metrics.shards_written);
        Ok(())
    }
}
