//! Internal metrics collection.
//!
//! Collects metrics in-memory, lock-free, and exposes periodic snapshots
//! over the status HTTP surface and structured log lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) -> u64 {
        self.0.swap(0, Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 10s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 10000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for (i, &bound) in Self::BUCKET_BOUNDS.iter().enumerate() {
            if ms <= bound {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        // Value exceeds all buckets, add to last
        self.buckets[10].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns bucket counts.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the indexing engine.
#[derive(Debug, Default)]
pub struct Metrics {
    // Per-round fetch/index counters
    pub records_fetched: Counter,
    pub records_indexed: Counter,
    pub records_skipped: Counter,

    // Broker-side
    pub broker_reconnect_attempts: Counter,
    pub broker_commit_errors: Counter,

    // Sink-side
    pub bulk_submissions: Counter,
    pub bulk_errors: Counter,
    pub sink_data_errors: Counter,

    // Latency histograms
    pub fetch_latency_ms: Histogram,
    pub post_latency_ms: Histogram,
    pub round_latency_ms: Histogram,

    // Gauges
    pub active_partitions: Gauge,
    pub consumer_lag: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub records_fetched: u64,
    pub records_indexed: u64,
    pub records_skipped: u64,
    pub broker_reconnect_attempts: u64,
    pub broker_commit_errors: u64,
    pub bulk_submissions: u64,
    pub bulk_errors: u64,
    pub sink_data_errors: u64,
    pub fetch_latency_mean_ms: f64,
    pub post_latency_mean_ms: f64,
    pub round_latency_mean_ms: f64,
    pub active_partitions: u64,
    pub consumer_lag: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            records_fetched: self.records_fetched.get(),
            records_indexed: self.records_indexed.get(),
            records_skipped: self.records_skipped.get(),
            broker_reconnect_attempts: self.broker_reconnect_attempts.get(),
            broker_commit_errors: self.broker_commit_errors.get(),
            bulk_submissions: self.bulk_submissions.get(),
            bulk_errors: self.bulk_errors.get(),
            sink_data_errors: self.sink_data_errors.get(),
            fetch_latency_mean_ms: self.fetch_latency_ms.mean(),
            post_latency_mean_ms: self.post_latency_ms.mean(),
            round_latency_mean_ms: self.round_latency_ms.mean(),
            active_partitions: self.active_partitions.get(),
            consumer_lag: self.consumer_lag.get(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
