//! Rolling performance statistics
//!
//! The window of recent samples lives behind a `parking_lot::Mutex`;
//! lifetime totals are atomics so `record` never waits on `report`.
//! Every rate and count in a report is derived from the window alone.
//! Every sample is mirrored to the `metrics` facade for Prometheus.

use lead_intel_config::{MonitorSettings, PipelineSettings};
use lead_intel_core::Stage;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone)]
struct Sample {
    latency_ms: f64,
    cache_hit: bool,
    /// The request was answered through at least one degraded stage
    degraded: bool,
    model: String,
}

/// Snapshot of the monitor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub p95_ms: f64,
    pub mean_ms: f64,
    pub cache_hit_rate: f64,
    pub error_rate: f64,
    pub per_model_counts: BTreeMap<String, u64>,
    pub sample_count: usize,
    pub total_requests: u64,
    pub healthy: bool,
}

#[derive(Debug)]
pub struct PerformanceMonitor {
    window: Mutex<VecDeque<Sample>>,
    window_size: usize,
    p95_target_ms: f64,
    cache_hit_floor: f64,
    total_requests: AtomicU64,
    cache_hits: AtomicU64,
    errors: AtomicU64,
}

impl PerformanceMonitor {
    pub fn new(window_size: usize, p95_target_ms: f64, cache_hit_floor: f64) -> Self {
        Self {
            window: Mutex::new(VecDeque::with_capacity(window_size.clamp(1, 4096))),
            window_size: window_size.max(1),
            p95_target_ms,
            cache_hit_floor,
            total_requests: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    pub fn from_settings(monitor: &MonitorSettings, pipeline: &PipelineSettings) -> Self {
        Self::new(
            monitor.window_size,
            pipeline.p95_target_ms,
            monitor.cache_hit_floor,
        )
    }

    /// Record one answered request; `degraded` marks a request that went
    /// through any fallback
    pub fn record(&self, latency_ms: f64, cache_hit: bool, model: &str, degraded: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if cache_hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        }

        {
            let mut window = self.window.lock();
            if window.len() == self.window_size {
                window.pop_front();
            }
            window.push_back(Sample {
                latency_ms,
                cache_hit,
                degraded,
                model: model.to_string(),
            });
        }

        metrics::histogram!("lead_intel_inference_latency_ms").record(latency_ms);
        metrics::counter!("lead_intel_requests_total", "model" => model.to_string()).increment(1);
        if cache_hit {
            metrics::counter!("lead_intel_cache_hits_total").increment(1);
        }
    }

    /// Count a degraded or failed stage. Feeds the lifetime counter and the
    /// exporter; the windowed error rate comes from `record`.
    pub fn record_error(&self, stage: Stage) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("lead_intel_errors_total", "stage" => stage.as_str()).increment(1);
    }

    pub fn report(&self) -> PerformanceReport {
        let mut latencies = Vec::new();
        let mut hits = 0usize;
        let mut degraded = 0usize;
        let mut per_model_counts: BTreeMap<String, u64> = BTreeMap::new();
        {
            let window = self.window.lock();
            latencies.reserve(window.len());
            for sample in window.iter() {
                latencies.push(sample.latency_ms);
                hits += usize::from(sample.cache_hit);
                degraded += usize::from(sample.degraded);
                *per_model_counts.entry(sample.model.clone()).or_insert(0) += 1;
            }
        }

        let total_requests = self.total_requests.load(Ordering::Relaxed);
        let sample_count = latencies.len();

        if sample_count == 0 {
            return PerformanceReport {
                p95_ms: 0.0,
                mean_ms: 0.0,
                cache_hit_rate: 0.0,
                error_rate: 0.0,
                per_model_counts,
                sample_count,
                total_requests,
                healthy: true,
            };
        }

        latencies.sort_by(f64::total_cmp);
        let p95_ms = nearest_rank(&latencies, 0.95);
        let mean_ms = latencies.iter().sum::<f64>() / sample_count as f64;
        let cache_hit_rate = hits as f64 / sample_count as f64;
        let error_rate = degraded as f64 / sample_count as f64;

        PerformanceReport {
            p95_ms,
            mean_ms,
            cache_hit_rate,
            error_rate,
            per_model_counts,
            sample_count,
            total_requests,
            healthy: p95_ms < self.p95_target_ms && cache_hit_rate > self.cache_hit_floor,
        }
    }

    pub fn lifetime_cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn lifetime_errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

/// Nearest-rank percentile over sorted values
fn nearest_rank(sorted: &[f64], percentile: f64) -> f64 {
    let rank = (percentile * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_window_is_healthy() {
        let monitor = PerformanceMonitor::new(10, 100.0, 0.05);
        let report = monitor.report();
        assert!(report.healthy);
        assert_eq!(report.sample_count, 0);
        assert_eq!(report.p95_ms, 0.0);
    }

    #[test]
    fn test_nearest_rank_p95() {
        let monitor = PerformanceMonitor::new(1000, 100.0, 0.05);
        for i in 1..=100 {
            monitor.record(i as f64, i % 2 == 0, "base-v2.1", false);
        }
        let report = monitor.report();
        assert_eq!(report.p95_ms, 95.0);
        assert_eq!(report.mean_ms, 50.5);
        assert_eq!(report.cache_hit_rate, 0.5);
        assert_eq!(report.per_model_counts.get("base-v2.1"), Some(&100));
        assert!(report.healthy);
    }

    #[test]
    fn test_window_is_bounded() {
        let monitor = PerformanceMonitor::new(5, 100.0, 0.05);
        for _ in 0..10 {
            monitor.record(500.0, true, "m", false);
        }
        for _ in 0..5 {
            monitor.record(1.0, true, "m", false);
        }
        let report = monitor.report();
        assert_eq!(report.sample_count, 5);
        assert_eq!(report.total_requests, 15);
        assert_eq!(report.p95_ms, 1.0);
    }

    #[test]
    fn test_unhealthy_conditions() {
        let slow = PerformanceMonitor::new(10, 100.0, 0.05);
        slow.record(150.0, true, "m", false);
        assert!(!slow.report().healthy);

        let cold = PerformanceMonitor::new(10, 100.0, 0.05);
        cold.record(5.0, false, "m", false);
        assert!(!cold.report().healthy);
    }

    #[test]
    fn test_error_rate() {
        let monitor = PerformanceMonitor::new(10, 100.0, 0.05);
        for _ in 0..3 {
            monitor.record(1.0, false, "m", false);
        }
        monitor.record_error(Stage::Routing);
        monitor.record(1.0, false, "m", true);
        assert_eq!(monitor.report().error_rate, 0.25);
        assert_eq!(monitor.lifetime_errors(), 1);
    }

    #[test]
    fn test_rates_and_counts_follow_window() {
        let monitor = PerformanceMonitor::new(5, 100.0, 0.05);
        for _ in 0..5 {
            monitor.record_error(Stage::Extraction);
            monitor.record(1.0, false, "base-v2.1+fallback", true);
        }
        assert_eq!(monitor.report().error_rate, 1.0);

        for _ in 0..20 {
            monitor.record(1.0, true, "base-v2.1", false);
        }
        let report = monitor.report();
        assert_eq!(report.sample_count, 5);
        assert_eq!(report.total_requests, 25);
        assert_eq!(report.error_rate, 0.0);
        assert_eq!(report.per_model_counts.len(), 1);
        assert_eq!(report.per_model_counts.get("base-v2.1"), Some(&5));
        assert_eq!(monitor.lifetime_errors(), 5);
    }
}
