//! Interval-based progress logging.
//!
//! A [`ProgressTracker`] keeps an atomic count and logs a line each time the count crosses a
//! multiple of its interval. It is shared by reference across rayon workers when shard files are
//! written in parallel.

use std::sync::atomic::{AtomicU64, Ordering};

use log::info;

use crate::logging::format_count;

/// Thread-safe progress tracker for logging at regular intervals.
///
/// ```
/// use samshard_lib::progress::ProgressTracker;
///
/// let tracker = ProgressTracker::new("Scanned records").with_interval(100);
/// for _ in 0..250 {
///     tracker.log_if_needed(1); // logs at 100 and 200
/// }
/// tracker.log_final(); // logs "Scanned records 250 (complete)"
/// assert_eq!(tracker.count(), 250);
/// ```
pub struct ProgressTracker {
    interval: u64,
    message: String,
    count: AtomicU64,
}

impl ProgressTracker {
    /// Creates a tracker with the given message prefix and an interval of 1,000,000.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { interval: 1_000_000, message: message.into(), count: AtomicU64::new(0) }
    }

    /// Sets the logging interval. Zero is treated as one.
    #[must_use]
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval.max(1);
        self
    }

    /// Adds to the count and logs each interval boundary crossed.
    ///
    /// Returns `true` if the count now sits exactly on an interval boundary.
    pub fn log_if_needed(&self, additional: u64) -> bool {
        if additional == 0 {
            let count = self.count.load(Ordering::Relaxed);
            return count > 0 && count % self.interval == 0;
        }

        let prev = self.count.fetch_add(additional, Ordering::Relaxed);
        let now = prev + additional;
        for step in (prev / self.interval + 1)..=(now / self.interval) {
            info!("{} {}", self.message, format_count(step * self.interval));
        }
        now % self.interval == 0
    }

    /// Logs the final count unless the last boundary already reported it.
    pub fn log_final(&self) {
        if !self.log_if_needed(0) {
            let count = self.count();
            if count > 0 {
                info!("{} {} (complete)", self.message, format_count(count));
            }
        }
    }

    /// Current count.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}
