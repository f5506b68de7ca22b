//! Plan weight-balanced regions for an alignment file and write them as a region descriptor.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;
use samshard_lib::logging::OperationTimer;
use samshard_lib::region::descriptor::write_regions;

use crate::commands::command::Command;
use crate::commands::common::{
    MetricsOptions, PlannerOptions, ReferenceOptions, load_and_plan, log_plan_summary,
};

/// Plan shard regions from alignment weights.
#[derive(Debug, Parser)]
#[command(
    name = "plan",
    about = "\x1b[38;5;30m[PLANNING]\x1b[0m       \x1b[36mPlan balanced shard regions and write a region descriptor\x1b[0m",
    long_about = r#"
Plan balanced, chromosome-bounded shard regions for a SAM file.

Each record is weighted by its line length and binned by position. Bins are then walked left to
right on every sequence, closing a region once the accumulated weight reaches the target size.
Regions never cross a sequence boundary, never split a bin, and together cover every base of
every allow-listed sequence.

The output descriptor has one `sequence start end` line per region and can be passed to
`samshard split`.

Example usage:
  samshard plan -r ref.fa -i input.sam -o regions.txt --target-size 64M
  samshard plan -r ref.fa.fai -i input.sam -o regions.txt --allow-list all --uniform 200
"#
)]
pub struct Plan {
    /// Input SAM file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Output region descriptor
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,

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

impl Command for Plan {
    fn execute(&self, _command_line: &str) -> Result<()> {
        let timer = OperationTimer::new("Planning regions", "regions");
        info!("Input: {}", self.input.display());
        info!("Output: {}", self.output.display());
        info!("Allow-list: {}", self.reference.allow_list);

        let planned = load_and_plan(&self.input, &self.reference, &self.planner)?;
        write_regions(&self.output, &planned.regions)?;
        info!("Wrote {} regions to {}", planned.regions.len(), self.output.display());

        log_plan_summary(&planned.metrics);
        self.metrics.write(&planned.metrics, "plan")?;
        timer.log_completion(planned.regions.len() as u64);
        Ok(())
    }
}
