//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pantry_requests_total` (counter): inbound requests by method, route, status
//! - `pantry_request_duration_seconds` (histogram): inbound latency
//! - `pantry_upstream_calls_total` (counter): outbound calls by service, operation, outcome
//! - `pantry_upstream_duration_seconds` (histogram): outbound latency
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::error::Service;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one inbound request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("pantry_requests_total", &labels).increment(1);
    metrics::histogram!("pantry_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record one outbound call to an external service.
pub fn record_upstream(service: Service, operation: &'static str, success: bool, start: Instant) {
    let outcome = if success { "ok" } else { "error" };
    let labels = [
        ("service", service.label()),
        ("operation", operation),
        ("outcome", outcome),
    ];
    metrics::counter!("pantry_upstream_calls_total", &labels).increment(1);
    metrics::histogram!("pantry_upstream_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Middleware recording every inbound request against its matched route.
///
/// For streaming responses the latency covers time to headers only.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    record_request(&method, response.status().as_u16(), &route, start);
    response
}
