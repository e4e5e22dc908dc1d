//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_forward_total` (counter): forwarded calls by entry path and outcome
//! - `relay_forward_duration_seconds` (histogram): forward latency by entry path
//! - `relay_subscription_events_total` (counter): subscribe/unsubscribe calls
//! - `relay_subscriptions_active` (gauge): current registry size
//!
//! Recording is a no-op until a recorder is installed.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one forwarded call.
///
/// `path` is the entry point ("delivery" or "proxy"), `outcome` one of
/// "success", "upstream_error" or "transport_error".
pub fn record_forward(path: &'static str, outcome: &'static str, start: Instant) {
    metrics::counter!("relay_forward_total", "path" => path, "outcome" => outcome).increment(1);
    metrics::histogram!("relay_forward_duration_seconds", "path" => path)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_subscription_event(event: &'static str) {
    metrics::counter!("relay_subscription_events_total", "event" => event).increment(1);
}

pub fn record_active_subscriptions(count: usize) {
    metrics::gauge!("relay_subscriptions_active").set(count as f64);
}
