//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_requests_total` (counter): inbound HTTP requests by status
//! - `bridge_request_duration_seconds` (histogram): inbound request latency
//! - `bridge_commands_total` (counter): commands by name and outcome
//! - `bridge_correlation_seconds` (histogram): time spent awaiting replies
//! - `bridge_clients_connected` (gauge): registered client connections

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const REQUESTS_TOTAL: &str = "bridge_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "bridge_request_duration_seconds";
pub const COMMANDS_TOTAL: &str = "bridge_commands_total";
pub const CORRELATION_SECONDS: &str = "bridge_correlation_seconds";
pub const CLIENTS_CONNECTED: &str = "bridge_clients_connected";

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(status: u16, latency: Duration) {
    metrics::counter!(REQUESTS_TOTAL, "status" => status.to_string()).increment(1);
    metrics::histogram!(REQUEST_DURATION_SECONDS).record(latency.as_secs_f64());
}

pub fn record_command(command: &'static str, outcome: &'static str) {
    metrics::counter!(COMMANDS_TOTAL, "command" => command, "outcome" => outcome).increment(1);
}

pub fn record_correlation(command: &'static str, outcome: &'static str, start: Instant) {
    record_command(command, outcome);
    metrics::histogram!(CORRELATION_SECONDS, "command" => command)
        .record(start.elapsed().as_secs_f64());
}

pub fn set_clients_connected(count: usize) {
    metrics::gauge!(CLIENTS_CONNECTED).set(count as f64);
}
