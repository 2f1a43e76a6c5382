//! Metrics collection and exposition.
//!
//! # Metrics
//! - `health_requests_total` (counter): requests by method, route, status
//! - `health_request_duration_seconds` (histogram): latency distribution
//! - `health_probe_duration_seconds` (histogram): per-service probe latency
//! - `health_probe_status` (gauge): 1=connected, 0=anything else
//! - `health_overall_status` (gauge): 1=healthy, 0=degraded
//! - `not_found_hits_total` (counter): unknown URLs recorded
//! - `not_found_dropped_total` (counter): hits not tracked because the log was full
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::{Duration, Instant};
use metrics::Label;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::health::report::{OverallStatus, ServiceStatus};

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = vec![
        Label::new("method", method.to_string()),
        Label::new("route", route.to_string()),
        Label::new("status", status.to_string()),
    ];
    metrics::counter!("health_requests_total", labels.clone()).increment(1);
    metrics::histogram!("health_request_duration_seconds", labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_probe(service: &str, status: ServiceStatus, latency: Duration) {
    let service = service.to_string();
    metrics::histogram!(
        "health_probe_duration_seconds",
        "service" => service.clone(),
        "status" => status.as_str()
    )
    .record(latency.as_secs_f64());
    let up = if status == ServiceStatus::Connected { 1.0 } else { 0.0 };
    metrics::gauge!("health_probe_status", "service" => service).set(up);
}

pub fn record_overall_status(status: OverallStatus) {
    let healthy = if status == OverallStatus::Healthy { 1.0 } else { 0.0 };
    metrics::gauge!("health_overall_status").set(healthy);
}

pub fn record_not_found(tracked_entries: usize, tracked: bool) {
    metrics::counter!("not_found_hits_total").increment(1);
    if !tracked {
        metrics::counter!("not_found_dropped_total").increment(1);
    }
    metrics::gauge!("not_found_tracked_entries").set(tracked_entries as f64);
}
