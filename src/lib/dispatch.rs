//! Batched, fixed-width processing of shard files.
//!
//! The [`WorkerPoolDispatcher`] takes shard files `width` at a time. For each batch it:
//!
//! 1. reads every shard fully into its own input buffer, skipping shards over the size cap;
//! 2. runs all tasks as one parallel invocation on a dedicated rayon pool and waits for all of
//!    them (the batch barrier);
//! 3. validates and writes each task's output, releasing both buffers as soon as that shard is
//!    done.
//!
//! The next batch starts only after the previous one is fully written, so peak memory is
//! bounded by `width × max_shard_bytes × (2 + slack_factor)` whatever the corpus size (the
//! extra input-sized term is the intermediate sorted buffer of the `all` mode).
//!
//! Each task is isolated: an engine error, an empty result or a panic marks that shard as
//! failed and leaves its siblings untouched. Failures are logged and counted, never returned.

use std::any::Any;
use std::fs;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use parking_lot::Mutex;
use rayon::prelude::*;
use thiserror::Error;

use crate::engine::{DEFAULT_SLACK_FACTOR, ProcessMode, ShardOutput, output_capacity, process_shard};
use crate::errors::{EngineError, Result, ShardError};
use crate::logging::{format_bytes, format_count};
use crate::metrics::DispatchMetrics;
use crate::progress::ProgressTracker;
use crate::region::naming::SHARD_EXTENSION;
use crate::shard::remove_partial_output;
use crate::validation::{validate_positive, validate_slack_factor};

/// Default number of shards per batch.
pub const DEFAULT_WIDTH: usize = 64;

/// Default largest shard accepted for processing (100 MiB).
pub const DEFAULT_MAX_SHARD_BYTES: u64 = 100 * 1024 * 1024;

/// Settings for a [`WorkerPoolDispatcher`].
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchConfig {
    /// Shards per batch
    pub width: usize,
    /// Worker threads; `None` means `min(width, available cores)`
    pub threads: Option<usize>,
    /// Output buffer size relative to the input
    pub slack_factor: f64,
    /// Shards larger than this are skipped
    pub max_shard_bytes: u64,
    /// Transform applied to each shard
    pub mode: ProcessMode,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            threads: None,
            slack_factor: DEFAULT_SLACK_FACTOR,
            max_shard_bytes: DEFAULT_MAX_SHARD_BYTES,
            mode: ProcessMode::default(),
        }
    }
}

impl DispatchConfig {
    /// Sets the batch width.
    #[must_use]
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Sets the worker thread count.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Sets the output slack factor.
    #[must_use]
    pub fn with_slack_factor(mut self, slack_factor: f64) -> Self {
        self.slack_factor = slack_factor;
        self
    }

    /// Sets the per-shard size cap.
    #[must_use]
    pub fn with_max_shard_bytes(mut self, max_shard_bytes: u64) -> Self {
        self.max_shard_bytes = max_shard_bytes;
        self
    }

    /// Sets the processing mode.
    #[must_use]
    pub fn with_mode(mut self, mode: ProcessMode) -> Self {
        self.mode = mode;
        self
    }

    /// Worker threads to start.
    #[must_use]
    pub fn effective_threads(&self) -> usize {
        self.threads.unwrap_or_else(|| {
            let cores = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
            self.width.min(cores).max(1)
        })
    }

    /// Checks every setting.
    ///
    /// # Errors
    ///
    /// Returns [`ShardError::InvalidParameter`] for a zero width, thread count or size cap, or a
    /// slack factor that is not above one.
    pub fn validate(&self) -> Result<()> {
        validate_positive(self.width as u64, "width")?;
        if let Some(threads) = self.threads {
            validate_positive(threads as u64, "threads")?;
        }
        validate_positive(self.max_shard_bytes, "max-shard-size")?;
        validate_slack_factor(self.slack_factor)
    }
}

/// Lists the shard files in `dir`: regular files whose name ends in `.sam`, sorted by name.
///
/// # Errors
///
/// Fails if the directory cannot be read.
pub fn discover_shards<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        let is_shard = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(SHARD_EXTENSION));
        if is_shard && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// One shard loaded for a batch.
#[derive(Debug)]
struct ShardTask {
    input_path: PathBuf,
    output_path: PathBuf,
    input: Vec<u8>,
    capacity: usize,
}

#[derive(Debug, Error)]
enum TaskError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("worker panicked: {0}")]
    Panicked(String),
}

/// Runs `task` and converts a panic into a [`TaskError`].
fn run_isolated<F>(task: F) -> std::result::Result<ShardOutput, TaskError>
where
    F: FnOnce() -> std::result::Result<ShardOutput, EngineError>,
{
    match catch_unwind(AssertUnwindSafe(task)) {
        Ok(result) => result.map_err(TaskError::from),
        Err(payload) => Err(TaskError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Processes shard files in sequential, fixed-width batches on a worker pool.
pub struct WorkerPoolDispatcher {
    config: DispatchConfig,
    pool: rayon::ThreadPool,
    /// Serializes batch submission when several threads share one dispatcher
    submit_lock: Mutex<()>,
}

impl WorkerPoolDispatcher {
    /// Validates `config` and starts the worker pool.
    ///
    /// # Errors
    ///
    /// Fails on an invalid configuration or if the thread pool cannot be built.
    pub fn new(config: DispatchConfig) -> Result<Self> {
        config.validate()?;
        let threads = config.effective_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("samshard-worker-{i}"))
            .build()
            .map_err(|e| ShardError::InvalidParameter {
                parameter: "threads".to_string(),
                reason: format!("cannot start {threads} worker threads: {e}"),
            })?;
        Ok(Self { config, pool, submit_lock: Mutex::new(()) })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Processes every path in `shards`, writing outputs into `out_dir`.
    ///
    /// Never fails as a whole: unreadable, oversized, failed or unwritable shards are logged
    /// and counted in the returned metrics.
    pub fn run(&self, shards: &[PathBuf], out_dir: &Path) -> DispatchMetrics {
        let mut metrics = DispatchMetrics { shards_total: shards.len() as u64, ..Default::default() };
        let progress = ProgressTracker::new("Finished shards").with_interval(self.config.width as u64);

        for (batch_number, chunk) in shards.chunks(self.config.width).enumerate() {
            let tasks: Vec<ShardTask> =
                chunk.iter().filter_map(|path| self.load(path, out_dir, &mut metrics)).collect();
            if tasks.is_empty() {
                progress.log_if_needed(chunk.len() as u64);
                continue;
            }

            debug!("Submitting batch {} with {} shards", batch_number + 1, tasks.len());
            let results = self.submit_batch(&tasks);
            metrics.batches += 1;

            for (task, result) in tasks.into_iter().zip(results) {
                Self::complete(task, result, &mut metrics);
            }
            progress.log_if_needed(chunk.len() as u64);
        }
        progress.log_final();
        metrics
    }

    /// Reads one shard into memory, or returns `None` if it is skipped.
    fn load(&self, path: &Path, out_dir: &Path, metrics: &mut DispatchMetrics) -> Option<ShardTask> {
        let size = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!("Cannot stat shard {}: {e}", path.display());
                metrics.shards_failed += 1;
                return None;
            }
        };
        if size > self.config.max_shard_bytes {
            warn!(
                "Skipping shard {}: {} exceeds the {} limit",
                path.display(),
                format_bytes(size),
                format_bytes(self.config.max_shard_bytes)
            );
            metrics.shards_skipped_oversize += 1;
            return None;
        }

        let input = match fs::read(path) {
            Ok(input) => input,
            Err(e) => {
                warn!("Cannot read shard {}: {e}", path.display());
                metrics.shards_failed += 1;
                return None;
            }
        };
        metrics.input_bytes += input.len() as u64;

        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        let output_path = out_dir.join(self.config.mode.output_file_name(&name));
        let capacity = output_capacity(&input, self.config.slack_factor);
        Some(ShardTask { input_path: path.to_path_buf(), output_path, input, capacity })
    }

    /// Runs every task of a batch and waits for all of them.
    fn submit_batch(&self, tasks: &[ShardTask]) -> Vec<std::result::Result<ShardOutput, TaskError>> {
        let _guard = self.submit_lock.lock();
        let mode = self.config.mode;
        self.pool.install(|| {
            tasks
                .par_iter()
                .map(|task| run_isolated(|| process_shard(&task.input, mode, task.capacity)))
                .collect()
        })
    }

    /// Validates and writes one task's result, then drops its buffers.
    fn complete(
        task: ShardTask,
        result: std::result::Result<ShardOutput, TaskError>,
        metrics: &mut DispatchMetrics,
    ) {
        let ShardTask { input_path, output_path, input, capacity } = task;
        drop(input);

        let output = match result {
            Ok(output) if output.data.len() <= capacity => output,
            Ok(output) => {
                warn!(
                    "Shard {} reported {} output bytes for a {capacity}-byte buffer",
                    input_path.display(),
                    output.data.len()
                );
                metrics.shards_failed += 1;
                return;
            }
            Err(e) => {
                warn!("Shard {} failed: {e}", input_path.display());
                metrics.shards_failed += 1;
                return;
            }
        };

        metrics.records_seen += output.stats.records;
        metrics.records_dropped += output.stats.dropped;
        metrics.records_unsortable += output.stats.unsortable;
        metrics.records_examined += output.stats.examined;
        metrics.duplicates_marked += output.stats.duplicates;
        if output.fell_back {
            warn!(
                "Duplicate marking overflowed for {}; writing sorted output only",
                input_path.display()
            );
            metrics.shards_fallback_sort_only += 1;
        }

        match fs::write(&output_path, &output.data) {
            Ok(()) => {
                metrics.shards_processed += 1;
                metrics.output_bytes += output.data.len() as u64;
            }
            Err(e) => {
                warn!("Failed to write {}: {e}", output_path.display());
                remove_partial_output(&output_path);
                metrics.shards_failed += 1;
            }
        }
    }
}

/// Logs a dispatcher's configuration at the start of a run.
pub fn log_dispatch_config(config: &DispatchConfig, shards: usize) {
    info!("Mode: {}", config.mode);
    info!("Shards: {}", format_count(shards as u64));
    info!("Batch width: {}, worker threads: {}", config.width, config.effective_threads());
    info!(
        "Slack factor: {}, max shard size: {}",
        config.slack_factor,
        format_bytes(config.max_shard_bytes)
    );
}
