//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path operations to avoid contending with the
//! per-attraction locks. All counter updates are lock-free; `report` is the
//! only operation that resets anything (via atomic swap). Scrapes go through
//! `snapshot` and `latency_histogram`, which only read.
//!
//! NOTE: All atomics use Relaxed ordering intentionally. These are statistical
//! counters only and must never drive admission decisions.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

/// Admission decision latency bucket boundaries (microseconds)
/// Buckets: ≤1, ≤2, ≤5, ≤10, ≤25, ≤50, ≤100, ≤250, ≤500, ≤1000, >1000
const BUCKET_BOUNDS: [u64; 10] = [1, 2, 5, 10, 25, 50, 100, 250, 500, 1000];
const NUM_BUCKETS: usize = 11;

/// Compute bucket index for a latency value using binary search
#[inline]
fn bucket_index(latency_us: u64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < latency_us)
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

/// Swap all buckets to zero and return their values
#[inline]
fn swap_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    let mut result = [0u64; NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.swap(0, Ordering::Relaxed);
    }
    result
}

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

    let target = (total as f64 * percentile) as u64;
    let mut cumulative = 0u64;

    // Last bucket reports 2x the previous bound
    const BUCKET_UPPER_BOUNDS: [u64; NUM_BUCKETS] = [1, 2, 5, 10, 25, 50, 100, 250, 500, 1000, 2000];

    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BUCKET_UPPER_BOUNDS[i];
        }
    }
    BUCKET_UPPER_BOUNDS[NUM_BUCKETS - 1]
}

/// Lock-free metrics collector
pub struct Metrics {
    /// Check-in requests decided (monotonic)
    check_ins_total: AtomicU64,
    /// Check-ins that reserved a slot (monotonic)
    admitted_total: AtomicU64,
    /// Check-ins rejected because the attraction was full (monotonic)
    rejected_full_total: AtomicU64,
    /// Check-ins rejected because of an open incident (monotonic)
    rejected_incident_total: AtomicU64,
    /// Check-outs processed (monotonic)
    check_outs_total: AtomicU64,
    /// Check-outs that found the attraction already empty (monotonic)
    releases_noop_total: AtomicU64,
    incidents_declared_total: AtomicU64,
    incidents_resolved_total: AtomicU64,
    /// Sum of all points awarded (monotonic)
    points_awarded_total: AtomicU64,
    score_increments_total: AtomicU64,
    ranking_snapshots_total: AtomicU64,
    /// Requests failed with an invalid-input error (monotonic)
    invalid_requests_total: AtomicU64,
    /// Decisions since last report (reset on report)
    decisions_since_report: AtomicU64,
    /// Sum of decision latencies in microseconds (reset on report)
    latency_sum_us: AtomicU64,
    /// Max decision latency in microseconds (reset on report)
    latency_max_us: AtomicU64,
    /// Decision latency histogram buckets (reset on report)
    latency_buckets: [AtomicU64; NUM_BUCKETS],
    /// Cumulative latency histogram for Prometheus (monotonic)
    latency_buckets_total: [AtomicU64; NUM_BUCKETS],
    latency_sum_total_us: AtomicU64,
    last_report_time: Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            check_ins_total: AtomicU64::new(0),
            admitted_total: AtomicU64::new(0),
            rejected_full_total: AtomicU64::new(0),
            rejected_incident_total: AtomicU64::new(0),
            check_outs_total: AtomicU64::new(0),
            releases_noop_total: AtomicU64::new(0),
            incidents_declared_total: AtomicU64::new(0),
            incidents_resolved_total: AtomicU64::new(0),
            points_awarded_total: AtomicU64::new(0),
            score_increments_total: AtomicU64::new(0),
            ranking_snapshots_total: AtomicU64::new(0),
            invalid_requests_total: AtomicU64::new(0),
            decisions_since_report: AtomicU64::new(0),
            latency_sum_us: AtomicU64::new(0),
            latency_max_us: AtomicU64::new(0),
            latency_buckets: Default::default(),
            latency_buckets_total: Default::default(),
            latency_sum_total_us: AtomicU64::new(0),
            last_report_time: Mutex::new(Instant::now()),
        }
    }

    /// Record an admission decision latency (lock-free)
    #[inline]
    pub fn record_decision_latency(&self, latency_us: u64) {
        self.decisions_since_report.fetch_add(1, Ordering::Relaxed);
        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        let bucket = bucket_index(latency_us);
        self.latency_buckets[bucket].fetch_add(1, Ordering::Relaxed);
        self.latency_buckets_total[bucket].fetch_add(1, Ordering::Relaxed);
        self.latency_sum_total_us.fetch_add(latency_us, Ordering::Relaxed);
        update_atomic_max(&self.latency_max_us, latency_us);
    }

    #[inline]
    pub fn record_admitted(&self) {
        self.check_ins_total.fetch_add(1, Ordering::Relaxed);
        self.admitted_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rejected_full(&self) {
        self.check_ins_total.fetch_add(1, Ordering::Relaxed);
        self.rejected_full_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rejected_incident(&self) {
        self.check_ins_total.fetch_add(1, Ordering::Relaxed);
        self.rejected_incident_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a check-out; `released` is false for a clamped no-op
    #[inline]
    pub fn record_check_out(&self, released: bool) {
        self.check_outs_total.fetch_add(1, Ordering::Relaxed);
        if !released {
            self.releases_noop_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_incident_declared(&self) {
        self.incidents_declared_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_incident_resolved(&self) {
        self.incidents_resolved_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_points(&self, points: u64) {
        self.score_increments_total.fetch_add(1, Ordering::Relaxed);
        self.points_awarded_total.fetch_add(points, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_ranking_snapshot(&self) {
        self.ranking_snapshots_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_invalid_request(&self) {
        self.invalid_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn check_ins_total(&self) -> u64 {
        self.check_ins_total.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn admitted_total(&self) -> u64 {
        self.admitted_total.load(Ordering::Relaxed)
    }

    /// Calculate and return metrics summary, then reset periodic counters
    ///
    /// This is the only method that resets counters. It uses atomic swap
    /// to get a consistent snapshot while allowing concurrent updates.
    pub fn report(&self) -> MetricsSummary {
        let decisions = self.decisions_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.latency_sum_us.swap(0, Ordering::Relaxed);
        let latency_max = self.latency_max_us.swap(0, Ordering::Relaxed);
        let lat_buckets = swap_buckets(&self.latency_buckets);

        let elapsed = {
            let mut last = self.last_report_time.lock();
            let elapsed = last.elapsed();
            *last = Instant::now();
            elapsed
        };

        self.summarize(decisions, latency_sum, latency_max, lat_buckets, elapsed)
    }

    /// Same view as `report` for the current window, without resetting it
    pub fn snapshot(&self) -> MetricsSummary {
        let decisions = self.decisions_since_report.load(Ordering::Relaxed);
        let latency_sum = self.latency_sum_us.load(Ordering::Relaxed);
        let latency_max = self.latency_max_us.load(Ordering::Relaxed);
        let lat_buckets = load_buckets(&self.latency_buckets);
        let elapsed = self.last_report_time.lock().elapsed();

        self.summarize(decisions, latency_sum, latency_max, lat_buckets, elapsed)
    }

    /// Decision latency since startup, never reset
    pub fn latency_histogram(&self) -> LatencyHistogram {
        LatencyHistogram {
            buckets: load_buckets(&self.latency_buckets_total),
            sum_us: self.latency_sum_total_us.load(Ordering::Relaxed),
        }
    }

    fn summarize(
        &self,
        decisions: u64,
        latency_sum: u64,
        latency_max: u64,
        lat_buckets: [u64; NUM_BUCKETS],
        elapsed: Duration,
    ) -> MetricsSummary {
        let decisions_per_sec = if elapsed.as_secs_f64() > 0.0 {
            decisions as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        let avg_latency = if decisions > 0 { latency_sum / decisions } else { 0 };

        MetricsSummary {
            check_ins_total: self.check_ins_total.load(Ordering::Relaxed),
            admitted_total: self.admitted_total.load(Ordering::Relaxed),
            rejected_full_total: self.rejected_full_total.load(Ordering::Relaxed),
            rejected_incident_total: self.rejected_incident_total.load(Ordering::Relaxed),
            check_outs_total: self.check_outs_total.load(Ordering::Relaxed),
            releases_noop_total: self.releases_noop_total.load(Ordering::Relaxed),
            incidents_declared_total: self.incidents_declared_total.load(Ordering::Relaxed),
            incidents_resolved_total: self.incidents_resolved_total.load(Ordering::Relaxed),
            points_awarded_total: self.points_awarded_total.load(Ordering::Relaxed),
            score_increments_total: self.score_increments_total.load(Ordering::Relaxed),
            ranking_snapshots_total: self.ranking_snapshots_total.load(Ordering::Relaxed),
            invalid_requests_total: self.invalid_requests_total.load(Ordering::Relaxed),
            decisions_per_sec,
            avg_decision_latency_us: avg_latency,
            max_decision_latency_us: latency_max,
            lat_buckets,
            lat_p50_us: percentile_from_buckets(&lat_buckets, 0.50),
            lat_p95_us: percentile_from_buckets(&lat_buckets, 0.95),
            lat_p99_us: percentile_from_buckets(&lat_buckets, 0.99),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of histogram buckets (exported for Prometheus formatting)
pub const METRICS_NUM_BUCKETS: usize = NUM_BUCKETS;

/// Exported bucket bounds for Prometheus formatting
pub const METRICS_BUCKET_BOUNDS: [u64; 10] = BUCKET_BOUNDS;

/// Cumulative decision latency histogram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyHistogram {
    pub buckets: [u64; NUM_BUCKETS],
    pub sum_us: u64,
}

impl LatencyHistogram {
    pub fn count(&self) -> u64 {
        self.buckets.iter().sum()
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub check_ins_total: u64,
    pub admitted_total: u64,
    pub rejected_full_total: u64,
    pub rejected_incident_total: u64,
    pub check_outs_total: u64,
    pub releases_noop_total: u64,
    pub incidents_declared_total: u64,
    pub incidents_resolved_total: u64,
    pub points_awarded_total: u64,
    pub score_increments_total: u64,
    pub ranking_snapshots_total: u64,
    pub invalid_requests_total: u64,
    pub decisions_per_sec: f64,
    pub avg_decision_latency_us: u64,
    pub max_decision_latency_us: u64,
    /// Decision latency histogram buckets
    /// Bounds: ≤1, ≤2, ≤5, ≤10, ≤25, ≤50, ≤100, ≤250, ≤500, ≤1000, >1000 µs
    pub lat_buckets: [u64; NUM_BUCKETS],
    pub lat_p50_us: u64,
    pub lat_p95_us: u64,
    pub lat_p99_us: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            check_ins_total = %self.check_ins_total,
            admitted_total = %self.admitted_total,
            rejected_full = %self.rejected_full_total,
            rejected_incident = %self.rejected_incident_total,
            check_outs_total = %self.check_outs_total,
            decisions_per_sec = format!("{:.1}", self.decisions_per_sec),
            avg_latency_us = %self.avg_decision_latency_us,
            max_latency_us = %self.max_decision_latency_us,
            p99_us = %self.lat_p99_us,
            points_awarded = %self.points_awarded_total,
            "metrics"
        );
    }
}
