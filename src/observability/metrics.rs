//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, auth outcomes, forwards)
//! - Expose a Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `dispatch_requests_total` (counter): requests by route and status
//! - `dispatch_auth_total` (counter): auth attempts by method, outcome
//! - `dispatch_upstream_forward_total` (counter): upstream forwards by
//!   endpoint and outcome
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic increments)
//! - Failure to start the exporter degrades to a log line; it never
//!   blocks the gateway itself

use std::net::SocketAddr;

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(address: SocketAddr) {
    match PrometheusBuilder::new()
        .with_http_listener(address)
        .install()
    {
        Ok(()) => tracing::info!(address = %address, "Metrics exporter listening"),
        Err(error) => tracing::error!(error = %error, "Failed to start metrics exporter"),
    }

    describe_counter!(
        "dispatch_requests_total",
        "Total dispatch requests handled, by route and status"
    );
    describe_counter!(
        "dispatch_auth_total",
        "Authentication attempts, by method and outcome"
    );
    describe_counter!(
        "dispatch_upstream_forward_total",
        "Upstream forwards, by endpoint and outcome"
    );
}

/// Count one handled dispatch request.
pub fn record_dispatch_request(route: &'static str, status: u16) {
    counter!(
        "dispatch_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
}

/// Count one authentication attempt.
pub fn record_auth_attempt(method: &'static str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!(
        "dispatch_auth_total",
        "method" => method,
        "outcome" => outcome
    )
    .increment(1);
}

/// Count one upstream forward attempt.
pub fn record_upstream_forward(endpoint: &'static str, success: bool) {
    let outcome = if success { "ok" } else { "error" };
    counter!(
        "dispatch_upstream_forward_total",
        "endpoint" => endpoint,
        "outcome" => outcome
    )
    .increment(1);
}
