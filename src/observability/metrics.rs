//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): relay calls by method, outcome
//! - `relay_request_duration_seconds` (histogram): latency by outcome
//! - `relay_upstream_responses_total` (counter): upstream status codes seen
//! - `relay_faults_total` (counter): panics trapped by the fault boundary
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use ::metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

/// Record one finished relay call.
pub fn record_request(method: &str, outcome: &'static str, start: Instant) {
    counter!("relay_requests_total", "method" => method.to_string(), "outcome" => outcome)
        .increment(1);
    histogram!("relay_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_status(status: u16) {
    counter!("relay_upstream_responses_total", "status" => status.to_string()).increment(1);
}

pub fn record_fault() {
    counter!("relay_faults_total").increment(1);
}
