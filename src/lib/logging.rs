//! Formatting helpers and summary logging.
//!
//! Every command ends with a `=== Summary ===` block built from the helpers here, so counts,
//! sizes and timings read the same across `plan`, `split`, `shard` and `process`.

use std::time::{Duration, Instant};

use log::info;

use crate::metrics::{AssignmentMetrics, DispatchMetrics};

/// Formats an integer count with thousands separators.
///
/// # Examples
///
/// ```
/// use samshard_lib::logging::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(1234567), "1,234,567");
/// ```
#[must_use]
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Formats a byte count using binary units (`B`, `KiB`, `MiB`, `GiB`).
///
/// # Examples
///
/// ```
/// use samshard_lib::logging::format_bytes;
///
/// assert_eq!(format_bytes(512), "512 B");
/// assert_eq!(format_bytes(64 * 1024 * 1024), "64.0 MiB");
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Formats a fraction (0.0-1.0) as a percentage with the given number of decimals.
///
/// ```
/// use samshard_lib::logging::format_percent;
///
/// assert_eq!(format_percent(0.9543, 2), "95.43%");
/// ```
#[must_use]
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.decimals$}%", value * 100.0)
}

/// Formats a duration as `45s`, `2m 15s` or `1h 30m`.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        if secs == 0 && duration.as_millis() > 0 {
            return format!("{}ms", duration.as_millis());
        }
        format!("{secs}s")
    } else if secs < 3600 {
        let (mins, rem) = (secs / 60, secs % 60);
        if rem == 0 { format!("{mins}m") } else { format!("{mins}m {rem}s") }
    } else {
        let (hours, mins) = (secs / 3600, (secs % 3600) / 60);
        if mins == 0 { format!("{hours}h") } else { format!("{hours}h {mins}m") }
    }
}

/// Formats a throughput as `<count> <unit>/s`, dropping to `/min` for slow rates.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_rate(count: u64, duration: Duration, unit: &str) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        return format!("{} {unit}/s", format_count(count));
    }
    let rate = count as f64 / secs;
    if rate >= 1.0 {
        format!("{} {unit}/s", format_count(rate as u64))
    } else {
        format!("{:.1} {unit}/min", count as f64 / (secs / 60.0))
    }
}

/// Logs the summary block for a sharding run (`split` or `shard`).
pub fn log_assignment_summary(metrics: &AssignmentMetrics) {
    info!("=== Summary ===");
    info!("  Header lines: {}", format_count(metrics.header_lines));
    info!("  Records seen: {}", format_count(metrics.records_seen));
    info!("  Records assigned: {}", format_count(metrics.records_assigned));
    info!("  Records dropped: {}", format_count(metrics.records_dropped()));
    if metrics.records_dropped() > 0 {
        info!("    unparsable: {}", format_count(metrics.dropped_unparsable));
        info!("    unknown sequence: {}", format_count(metrics.dropped_unknown_sequence));
        info!("    position out of range: {}", format_count(metrics.dropped_out_of_range));
        info!("    no covering region: {}", format_count(metrics.dropped_uncovered));
    }
    info!("  Regions: {}", format_count(metrics.regions));
    info!("  Shards written: {}", format_count(metrics.shards_written));
    info!("  Shards failed: {}", format_count(metrics.shards_failed));
}

/// Logs the summary block for a `process` run.
#[allow(clippy::cast_precision_loss)]
pub fn log_dispatch_summary(metrics: &DispatchMetrics) {
    info!("=== Summary ===");
    info!("  Shards found: {}", format_count(metrics.shards_total));
    info!("  Shards processed: {}", format_count(metrics.shards_processed));
    info!("  Shards failed: {}", format_count(metrics.shards_failed));
    info!("  Shards skipped (oversize): {}", format_count(metrics.shards_skipped_oversize));
    if metrics.shards_fallback_sort_only > 0 {
        info!("  Shards written sort-only: {}", format_count(metrics.shards_fallback_sort_only));
    }
    info!("  Batches: {}", format_count(metrics.batches));
    info!("  Records seen: {}", format_count(metrics.records_seen));
    info!("  Records dropped: {}", format_count(metrics.records_dropped));
    if metrics.records_unsortable > 0 {
        info!("  Records without coordinates: {}", format_count(metrics.records_unsortable));
    }
    if metrics.duplicates_marked > 0 || metrics.records_examined > 0 {
        info!("  Duplicates marked: {}", format_count(metrics.duplicates_marked));
        if metrics.records_examined > 0 {
            let rate = metrics.duplicates_marked as f64 / metrics.records_examined as f64;
            info!("  Duplicate rate: {}", format_percent(rate, 2));
        }
    }
    info!(
        "  Bytes in/out: {} / {}",
        format_bytes(metrics.input_bytes),
        format_bytes(metrics.output_bytes)
    );
}

/// Operation timing and summary helper.
///
/// ```no_run
/// use samshard_lib::logging::OperationTimer;
///
/// let timer = OperationTimer::new("Scanning alignments", "records");
/// // ... do work ...
/// timer.log_completion(10_000);
/// ```
pub struct OperationTimer {
    operation: String,
    unit: String,
    start_time: Instant,
}

impl OperationTimer {
    /// Creates a new timer and logs the start of the operation.
    #[must_use]
    pub fn new(operation: &str, unit: &str) -> Self {
        info!("{operation} ...");
        Self { operation: operation.to_string(), unit: unit.to_string(), start_time: Instant::now() }
    }

    /// Time since the timer was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Logs the completion with item count and rate.
    pub fn log_completion(&self, count: u64) {
        let duration = self.elapsed();
        info!(
            "{} completed: {} {} in {} ({})",
            self.operation,
            format_count(count),
            self.unit,
            format_duration(duration),
            format_rate(count, duration, &self.unit)
        );
    }
}
