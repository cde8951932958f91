//! Lock-free generation metrics and end-of-run reporting
//!
//! Every register task records into the same `Metrics` through an `Arc`.
//! All atomics use Relaxed ordering; these are statistical counters only and
//! are never used for coordination.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Lines-per-receipt bucket boundaries
/// Buckets: ≤1, ≤2, ≤3, ≤4, ≤5, ≤6, ≤8, ≤10, ≤15, ≤20, >20
const BASKET_BOUNDS: [u64; 10] = [1, 2, 3, 4, 5, 6, 8, 10, 15, 20];
const NUM_BUCKETS: usize = 11;

/// Upper bound reported for each bucket (last bucket uses 2x the previous bound)
const BASKET_UPPER_BOUNDS: [u64; NUM_BUCKETS] = [1, 2, 3, 4, 5, 6, 8, 10, 15, 20, 40];

/// Compute bucket index for a basket size using binary search
#[inline]
fn bucket_index(lines: u64) -> usize {
    BASKET_BOUNDS.partition_point(|&bound| bound < lines)
}

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Load all bucket values
#[inline]
fn load_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    let mut result = [0u64; NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.load(Ordering::Relaxed);
    }
    result
}

/// Compute percentile from histogram buckets
/// Returns the upper bound of the bucket containing the percentile
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    let target = ((total as f64 * percentile).ceil() as u64).max(1);
    let mut cumulative = 0u64;

    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BASKET_UPPER_BOUNDS[i];
        }
    }
    BASKET_UPPER_BOUNDS[NUM_BUCKETS - 1]
}

pub struct Metrics {
    started_at: Instant,
    receipts_total: AtomicU64,
    lines_total: AtomicU64,
    units_total: AtomicU64,
    max_lines_per_receipt: AtomicU64,
    basket_buckets: [AtomicU64; NUM_BUCKETS],
    registers_completed: AtomicU64,
    stores_completed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            receipts_total: AtomicU64::new(0),
            lines_total: AtomicU64::new(0),
            units_total: AtomicU64::new(0),
            max_lines_per_receipt: AtomicU64::new(0),
            basket_buckets: Default::default(),
            registers_completed: AtomicU64::new(0),
            stores_completed: AtomicU64::new(0),
        }
    }

    /// Record one generated receipt
    #[inline]
    pub fn record_receipt(&self, lines: u64, units: u64) {
        self.receipts_total.fetch_add(1, Ordering::Relaxed);
        self.lines_total.fetch_add(lines, Ordering::Relaxed);
        self.units_total.fetch_add(units, Ordering::Relaxed);
        self.basket_buckets[bucket_index(lines)].fetch_add(1, Ordering::Relaxed);
        update_atomic_max(&self.max_lines_per_receipt, lines);
    }

    pub fn record_register_completed(&self) {
        self.registers_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_completed(&self) {
        self.stores_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn receipts_total(&self) -> u64 {
        self.receipts_total.load(Ordering::Relaxed)
    }

    pub fn lines_total(&self) -> u64 {
        self.lines_total.load(Ordering::Relaxed)
    }

    pub fn registers_completed(&self) -> u64 {
        self.registers_completed.load(Ordering::Relaxed)
    }

    pub fn stores_completed(&self) -> u64 {
        self.stores_completed.load(Ordering::Relaxed)
    }

    /// Snapshot all counters
    pub fn report(&self) -> MetricsSummary {
        let receipts_total = self.receipts_total();
        let lines_total = self.lines_total();
        let buckets = load_buckets(&self.basket_buckets);
        let elapsed_secs = self.started_at.elapsed().as_secs_f64();

        MetricsSummary {
            receipts_total,
            lines_total,
            units_total: self.units_total.load(Ordering::Relaxed),
            avg_lines_per_receipt: if receipts_total > 0 {
                lines_total as f64 / receipts_total as f64
            } else {
                0.0
            },
            max_lines_per_receipt: self.max_lines_per_receipt.load(Ordering::Relaxed),
            lines_p50: percentile_from_buckets(&buckets, 0.50),
            lines_p95: percentile_from_buckets(&buckets, 0.95),
            basket_buckets: buckets,
            registers_completed: self.registers_completed(),
            stores_completed: self.stores_completed(),
            elapsed_secs,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct MetricsSummary {
    pub receipts_total: u64,
    pub lines_total: u64,
    pub units_total: u64,
    pub avg_lines_per_receipt: f64,
    pub max_lines_per_receipt: u64,
    /// Lines-per-receipt histogram
    /// Bounds: ≤1, ≤2, ≤3, ≤4, ≤5, ≤6, ≤8, ≤10, ≤15, ≤20, >20
    pub basket_buckets: [u64; NUM_BUCKETS],
    pub lines_p50: u64,
    pub lines_p95: u64,
    pub registers_completed: u64,
    pub stores_completed: u64,
    pub elapsed_secs: f64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            receipts = %self.receipts_total,
            lines = %self.lines_total,
            units = %self.units_total,
            avg_lines = format!("{:.2}", self.avg_lines_per_receipt),
            max_lines = %self.max_lines_per_receipt,
            lines_p50 = %self.lines_p50,
            lines_p95 = %self.lines_p95,
            registers = %self.registers_completed,
            stores = %self.stores_completed,
            elapsed_secs = format!("{:.2}", self.elapsed_secs),
            "generation_metrics"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = Metrics::new();
        assert_eq!(metrics.receipts_total(), 0);
        assert_eq!(metrics.report().lines_p50, 0);
    }

    #[test]
    fn test_record_receipt() {
        let metrics = Metrics::new();
        metrics.record_receipt(1, 3);
        metrics.record_receipt(4, 4);
        metrics.record_receipt(25, 30);

        let summary = metrics.report();
        assert_eq!(summary.receipts_total, 3);
        assert_eq!(summary.lines_total, 30);
        assert_eq!(summary.units_total, 37);
        assert_eq!(summary.max_lines_per_receipt, 25);
        assert_eq!(summary.basket_buckets[0], 1);
        assert_eq!(summary.basket_buckets[3], 1);
        assert_eq!(summary.basket_buckets[NUM_BUCKETS - 1], 1);
        assert!((summary.avg_lines_per_receipt - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_bucket_index() {
        assert_eq!(bucket_index(1), 0);
        assert_eq!(bucket_index(2), 1);
        assert_eq!(bucket_index(7), 6);
        assert_eq!(bucket_index(20), 9);
        assert_eq!(bucket_index(21), 10);
    }

    #[test]
    fn test_percentiles() {
        let metrics = Metrics::new();
        for _ in 0..90 {
            metrics.record_receipt(1, 1);
        }
        for _ in 0..10 {
            metrics.record_receipt(9, 9);
        }
        let summary = metrics.report();
        assert_eq!(summary.lines_p50, 1);
        assert_eq!(summary.lines_p95, 10);
    }

    #[test]
    fn test_completion_counters() {
        let metrics = Metrics::new();
        metrics.record_register_completed();
        metrics.record_register_completed();
        metrics.record_store_completed();
        assert_eq!(metrics.registers_completed(), 2);
        assert_eq!(metrics.stores_completed(), 1);
    }
}
