//! Per-driver export statistics
//!
//! Written by a single driver loop, read by the agent collector.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use super::model::Bucket;

/// Upper bounds (seconds) of the cycle duration histogram
pub const CYCLE_DURATION_BUCKETS_SECS: [f64; 8] = [0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

#[derive(Debug, Default)]
struct DurationHistogram {
    counts: [u64; CYCLE_DURATION_BUCKETS_SECS.len()],
    count: u64,
    sum_secs: f64,
}

/// Counters updated by a driver loop
#[derive(Debug, Default)]
pub struct DriverStats {
    cycles: AtomicU64,
    failed_cycles: AtomicU64,
    records_sent: AtomicU64,
    chunks_sent: AtomicU64,
    consecutive_failures: AtomicU64,
    durations: Mutex<DurationHistogram>,
}

/// Point-in-time copy of [`DriverStats`]
#[derive(Debug, Clone, PartialEq)]
pub struct DriverStatsSnapshot {
    pub cycles: u64,
    pub failed_cycles: u64,
    pub records_sent: u64,
    pub chunks_sent: u64,
    pub consecutive_failures: u64,
    pub duration_count: u64,
    pub duration_sum_secs: f64,
    /// Cumulative buckets, ending with `+Inf`
    pub duration_buckets: Vec<Bucket>,
}

impl DriverStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// A chunk was accepted by the backend
    pub fn record_chunk(&self, records: usize) {
        self.chunks_sent.fetch_add(1, Ordering::Relaxed);
        self.records_sent
            .fetch_add(records as u64, Ordering::Relaxed);
    }

    /// Cycle finished without error. Returns the failure streak it ended.
    pub fn record_success(&self) -> u64 {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.swap(0, Ordering::Relaxed)
    }

    /// Cycle ended early. Returns the current failure streak.
    pub fn record_failure(&self) -> u64 {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.failed_cycles.fetch_add(1, Ordering::Relaxed);
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn observe_cycle(&self, elapsed: Duration) {
        let secs = elapsed.as_secs_f64();
        let mut hist = self.durations.lock();
        if let Some(idx) = CYCLE_DURATION_BUCKETS_SECS
            .iter()
            .position(|bound| secs <= *bound)
        {
            hist.counts[idx] += 1;
        }
        hist.count += 1;
        hist.sum_secs += secs;
    }

    pub fn snapshot(&self) -> DriverStatsSnapshot {
        let hist = self.durations.lock();
        let mut cumulative = 0u64;
        let mut duration_buckets: Vec<Bucket> = CYCLE_DURATION_BUCKETS_SECS
            .iter()
            .zip(hist.counts.iter())
            .map(|(bound, count)| {
                cumulative += count;
                Bucket {
                    upper_bound: *bound,
                    cumulative_count: cumulative,
                }
            })
            .collect();
        duration_buckets.push(Bucket {
            upper_bound: f64::INFINITY,
            cumulative_count: hist.count,
        });

        DriverStatsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            failed_cycles: self.failed_cycles.load(Ordering::Relaxed),
            records_sent: self.records_sent.load(Ordering::Relaxed),
            chunks_sent: self.chunks_sent.load(Ordering::Relaxed),
            consecutive_failures: self.consecutive_failures.load(Ordering::Relaxed),
            duration_count: hist.count,
            duration_sum_secs: hist.sum_secs,
            duration_buckets,
        }
    }
}
