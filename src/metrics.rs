//! Run statistics for the status report
//!
//! Tracks fetch latency percentiles and fetch/post outcome counters. The loop
//! is single-threaded, so this is plain owned state rather than shared locks.

use std::collections::VecDeque;
use std::time::Duration;

/// Maximum number of fetch samples to keep for percentiles
const MAX_SAMPLES: usize = 100;

/// Snapshot of the counters
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    /// 50th percentile fetch latency in milliseconds
    pub fetch_p50_ms: f64,
    /// 99th percentile fetch latency in milliseconds
    pub fetch_p99_ms: f64,
    /// Fetch success rate (0.0 to 1.0)
    pub fetch_success_rate: f64,
    pub fetches: u64,
    pub failed_fetches: u64,
    pub posts: u64,
    pub failed_posts: u64,
    pub render_failures: u64,
}

#[derive(Debug, Clone)]
struct LatencySample {
    duration_ms: f64,
    success: bool,
}

/// Collects counters over the life of the process
#[derive(Debug, Default)]
pub struct RunStats {
    samples: VecDeque<LatencySample>,
    fetches: u64,
    failed_fetches: u64,
    posts: u64,
    failed_posts: u64,
    render_failures: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one fetch with its duration and outcome
    pub fn record_fetch(&mut self, duration: Duration, success: bool) {
        self.fetches += 1;
        if !success {
            self.failed_fetches += 1;
        }

        if self.samples.len() >= MAX_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back(LatencySample {
            duration_ms: duration.as_secs_f64() * 1000.0,
            success,
        });
    }

    pub fn record_post(&mut self, success: bool) {
        if success {
            self.posts += 1;
        } else {
            self.failed_posts += 1;
        }
    }

    pub fn record_render_failure(&mut self) {
        self.render_failures += 1;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        // Only successful fetches count towards latency
        let mut latencies: Vec<f64> = self
            .samples
            .iter()
            .filter(|s| s.success)
            .map(|s| s.duration_ms)
            .collect();
        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let fetch_success_rate = if self.fetches > 0 {
            (self.fetches - self.failed_fetches) as f64 / self.fetches as f64
        } else {
            1.0
        };

        StatsSnapshot {
            fetch_p50_ms: percentile(&latencies, 50.0),
            fetch_p99_ms: percentile(&latencies, 99.0),
            fetch_success_rate,
            fetches: self.fetches,
            failed_fetches: self.failed_fetches,
            posts: self.posts,
            failed_posts: self.failed_posts,
            render_failures: self.render_failures,
        }
    }
}

/// Calculate percentile from sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let idx = (p / 100.0 * (sorted_values.len() - 1) as f64).round() as usize;
    sorted_values[idx.min(sorted_values.len() - 1)]
}
