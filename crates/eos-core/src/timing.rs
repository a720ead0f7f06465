//! Lightweight performance timing utilities.
//!
//! Timing is off unless enabled programmatically or via the `EOS_TIMING`
//! environment variable.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Enable performance timing globally.
pub fn enable_timing() {
    ENABLED.store(true, Ordering::Relaxed);
}

/// Disable performance timing globally.
pub fn disable_timing() {
    ENABLED.store(false, Ordering::Relaxed);
}

/// Check if timing is enabled.
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed) || std::env::var("EOS_TIMING").is_ok()
}

/// A simple timer that measures elapsed time.
pub struct Timer {
    start: Instant,
    enabled: bool,
}

impl Timer {
    /// Create and start a new timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            enabled: is_enabled(),
        }
    }

    /// Stop the timer and return elapsed time in seconds.
    /// If timing is disabled, returns None.
    pub fn stop(self) -> Option<f64> {
        if self.enabled {
            Some(self.start.elapsed().as_secs_f64())
        } else {
            None
        }
    }

    /// Stop the timer and add the elapsed time to an accumulator.
    pub fn stop_into(self, acc: &AccumulatingTimer) -> Option<f64> {
        let elapsed = self.stop();
        if let Some(seconds) = elapsed {
            acc.record(seconds);
        }
        elapsed
    }
}

/// Accumulating timer for tracking total time across multiple calls.
pub struct AccumulatingTimer {
    total_ns: AtomicU64,
    count: AtomicU64,
}

impl Default for AccumulatingTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl AccumulatingTimer {
    /// Create a new accumulating timer.
    pub const fn new() -> Self {
        Self {
            total_ns: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Record a timing measurement.
    pub fn record(&self, duration_s: f64) {
        let nanos = (duration_s * 1e9) as u64;
        self.total_ns.fetch_add(nanos, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total time spent (in seconds).
    pub fn total_seconds(&self) -> f64 {
        self.total_ns.load(Ordering::Relaxed) as f64 / 1e9
    }

    /// Get number of calls.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Get average time per call (in seconds).
    pub fn average_seconds(&self) -> f64 {
        let count = self.count();
        if count > 0 {
            self.total_seconds() / count as f64
        } else {
            0.0
        }
    }

    /// Reset the timer.
    pub fn reset(&self) {
        self.total_ns.store(0, Ordering::Relaxed);
        self.count.store(0, Ordering::Relaxed);
    }
}

/// Block conversion timers.
pub mod conversion_timing {
    use super::AccumulatingTimer;

    /// Time spent in conserved-to-primitive block conversions
    pub static CONS_TO_PRIM: AccumulatingTimer = AccumulatingTimer::new();
    /// Time spent in primitive-to-conserved block conversions
    pub static PRIM_TO_CONS: AccumulatingTimer = AccumulatingTimer::new();

    /// Reset all conversion timers.
    pub fn reset_all() {
        CONS_TO_PRIM.reset();
        PRIM_TO_CONS.reset();
    }

    /// Format a summary line per timer that has recorded calls.
    pub fn summary() -> Vec<String> {
        [
            ("cons_to_prim", &CONS_TO_PRIM),
            ("prim_to_cons", &PRIM_TO_CONS),
        ]
        .into_iter()
        .filter(|(_, timer)| timer.count() > 0)
        .map(|(label, timer)| {
            format!(
                "{label}: {} calls, {:.3}s total, {:.4}ms avg",
                timer.count(),
                timer.total_seconds(),
                timer.average_seconds() * 1000.0
            )
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulating_timer_averages() {
        let timer = AccumulatingTimer::new();
        assert_eq!(timer.average_seconds(), 0.0);
        timer.record(0.5);
        timer.record(1.5);
        assert_eq!(timer.count(), 2);
        assert!((timer.total_seconds() - 2.0).abs() < 1e-6);
        assert!((timer.average_seconds() - 1.0).abs() < 1e-6);
        timer.reset();
        assert_eq!(timer.count(), 0);
    }

    #[test]
    fn enabled_timer_reports_elapsed() {
        enable_timing();
        let acc = AccumulatingTimer::new();
        let elapsed = Timer::start().stop_into(&acc);
        assert!(elapsed.is_some());
        assert_eq!(acc.count(), 1);
        disable_timing();
    }
}
