// Metrics module - Prometheus-compatible metrics tracking
// Provides counters and gauges for observability

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Latency accumulator for one route (microseconds)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatencySummary {
    pub sum_us: u64,
    pub count: u64,
}

/// Metrics struct tracks counters for Prometheus export
/// Thread-safe via atomic operations and mutexes
#[derive(Default)]
pub struct Metrics {
    // Request counters
    request_count: AtomicU64,

    // Status code counters (e.g., 200, 404, 502)
    status_counts: Mutex<BTreeMap<u16, u64>>,

    // Per-route request and byte counters
    route_counts: Mutex<BTreeMap<String, u64>>,
    route_bytes: Mutex<BTreeMap<String, u64>>,

    // Per-route processing latency
    route_latencies: Mutex<BTreeMap<String, LatencySummary>>,

    // Pipeline failures by stage (decode, crop, scale, ...)
    stage_failures: Mutex<BTreeMap<String, u64>>,

    // Request failures by error kind (source, dimension, ...)
    error_counts: Mutex<BTreeMap<String, u64>>,

    // Responses that returned the source bytes unchanged
    passthrough_count: AtomicU64,

    // In-flight requests gauge
    active_requests: AtomicU64,

    // Concurrency limiting metrics
    concurrency_limit_rejections: AtomicU64,
}

fn increment<K: Ord>(map: &Mutex<BTreeMap<K, u64>>, key: K, by: u64) {
    if let Ok(mut counts) = map.lock() {
        *counts.entry(key).or_insert(0) += by;
    }
}

fn read<K, Q>(map: &Mutex<BTreeMap<K, u64>>, key: &Q) -> u64
where
    K: Ord + Borrow<Q>,
    Q: Ord + ?Sized,
{
    map.lock()
        .ok()
        .and_then(|counts| counts.get(key).copied())
        .unwrap_or(0)
}

impl Metrics {
    /// Create a new Metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the total request count
    pub fn increment_request_count(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment counter for a specific HTTP status code
    pub fn increment_status_count(&self, status_code: u16) {
        increment(&self.status_counts, status_code, 1);
    }

    /// Count a request served by `route` and the bytes it returned
    pub fn record_route_response(&self, route: &str, bytes: u64) {
        increment(&self.route_counts, route.to_string(), 1);
        increment(&self.route_bytes, route.to_string(), bytes);
    }

    /// Record fetch plus transform time for a route
    pub fn record_route_latency(&self, route: &str, elapsed: Duration) {
        if let Ok(mut latencies) = self.route_latencies.lock() {
            let entry = latencies.entry(route.to_string()).or_default();
            entry.sum_us += elapsed.as_micros() as u64;
            entry.count += 1;
        }
    }

    pub fn increment_stage_failure(&self, stage: &str) {
        increment(&self.stage_failures, stage.to_string(), 1);
    }

    pub fn increment_error(&self, kind: &str) {
        increment(&self.error_counts, kind.to_string(), 1);
    }

    pub fn increment_passthrough(&self) {
        self.passthrough_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_active_requests(&self) {
        self.active_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decrement_active_requests(&self) {
        // Saturate at zero
        let _ = self
            .active_requests
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| v.checked_sub(1));
    }

    /// Increment counter for requests rejected by the concurrency limit
    pub fn increment_concurrency_limit_rejection(&self) {
        self.concurrency_limit_rejections
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn get_status_count(&self, status_code: u16) -> u64 {
        read(&self.status_counts, &status_code)
    }

    pub fn get_route_count(&self, route: &str) -> u64 {
        read(&self.route_counts, route)
    }

    pub fn get_route_bytes(&self, route: &str) -> u64 {
        read(&self.route_bytes, route)
    }

    pub fn get_route_latency(&self, route: &str) -> LatencySummary {
        self.route_latencies
            .lock()
            .ok()
            .and_then(|latencies| latencies.get(route).copied())
            .unwrap_or_default()
    }

    pub fn get_stage_failure_count(&self, stage: &str) -> u64 {
        read(&self.stage_failures, stage)
    }

    pub fn get_error_count(&self, kind: &str) -> u64 {
        read(&self.error_counts, kind)
    }

    pub fn get_passthrough_count(&self) -> u64 {
        self.passthrough_count.load(Ordering::Relaxed)
    }

    pub fn get_active_requests(&self) -> u64 {
        self.active_requests.load(Ordering::Relaxed)
    }

    pub fn get_concurrency_limit_rejections(&self) -> u64 {
        self.concurrency_limit_rejections.load(Ordering::Relaxed)
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();

        // Request metrics
        output.push_str("# HELP http_requests_total Total number of HTTP requests received\n");
        output.push_str("# TYPE http_requests_total counter\n");
        output.push_str(&format!(
            "http_requests_total {}\n",
            self.request_count.load(Ordering::Relaxed)
        ));

        // Status code metrics
        output.push_str("\n# HELP http_requests_by_status_total HTTP requests by status code\n");
        output.push_str("# TYPE http_requests_by_status_total counter\n");
        if let Ok(counts) = self.status_counts.lock() {
            for (status, count) in counts.iter() {
                output.push_str(&format!(
                    "http_requests_by_status_total{{status=\"{}\"}} {}\n",
                    status, count
                ));
            }
        }

        // Route metrics
        output.push_str("\n# HELP image_requests_by_route_total Image responses by route\n");
        output.push_str("# TYPE image_requests_by_route_total counter\n");
        if let Ok(counts) = self.route_counts.lock() {
            for (route, count) in counts.iter() {
                output.push_str(&format!(
                    "image_requests_by_route_total{{route=\"{}\"}} {}\n",
                    route, count
                ));
            }
        }

        output.push_str("\n# HELP image_bytes_by_route_total Image bytes served by route\n");
        output.push_str("# TYPE image_bytes_by_route_total counter\n");
        if let Ok(bytes) = self.route_bytes.lock() {
            for (route, total) in bytes.iter() {
                output.push_str(&format!(
                    "image_bytes_by_route_total{{route=\"{}\"}} {}\n",
                    route, total
                ));
            }
        }

        output.push_str(
            "\n# HELP image_processing_duration_seconds Fetch and transform time by route\n",
        );
        output.push_str("# TYPE image_processing_duration_seconds summary\n");
        if let Ok(latencies) = self.route_latencies.lock() {
            for (route, summary) in latencies.iter() {
                output.push_str(&format!(
                    "image_processing_duration_seconds_sum{{route=\"{}\"}} {:.6}\n",
                    route,
                    summary.sum_us as f64 / 1_000_000.0
                ));
                output.push_str(&format!(
                    "image_processing_duration_seconds_count{{route=\"{}\"}} {}\n",
                    route, summary.count
                ));
            }
        }

        // Failure metrics
        output.push_str("\n# HELP image_stage_failures_total Pipeline failures by stage\n");
        output.push_str("# TYPE image_stage_failures_total counter\n");
        if let Ok(failures) = self.stage_failures.lock() {
            for (stage, count) in failures.iter() {
                output.push_str(&format!(
                    "image_stage_failures_total{{stage=\"{}\"}} {}\n",
                    stage, count
                ));
            }
        }

        output.push_str("\n# HELP request_errors_total Failed requests by error kind\n");
        output.push_str("# TYPE request_errors_total counter\n");
        if let Ok(errors) = self.error_counts.lock() {
            for (kind, count) in errors.iter() {
                output.push_str(&format!(
                    "request_errors_total{{kind=\"{}\"}} {}\n",
                    kind, count
                ));
            }
        }

        output.push_str(
            "\n# HELP image_passthrough_total Responses returning the original bytes\n",
        );
        output.push_str("# TYPE image_passthrough_total counter\n");
        output.push_str(&format!(
            "image_passthrough_total {}\n",
            self.passthrough_count.load(Ordering::Relaxed)
        ));

        // System metrics
        output.push_str("\n# HELP active_requests Requests currently being processed\n");
        output.push_str("# TYPE active_requests gauge\n");
        output.push_str(&format!(
            "active_requests {}\n",
            self.active_requests.load(Ordering::Relaxed)
        ));

        output.push_str(
            "\n# HELP concurrency_limit_rejections_total Requests rejected at the concurrency limit\n",
        );
        output.push_str("# TYPE concurrency_limit_rejections_total counter\n");
        output.push_str(&format!(
            "concurrency_limit_rejections_total {}\n",
            self.concurrency_limit_rejections.load(Ordering::Relaxed)
        ));

        output
    }
}
