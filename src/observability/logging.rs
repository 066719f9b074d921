//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Build the per-request span and completion log line
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - One `info` line per request: status, latency, action, request ID

use std::time::Duration;

use axum::http::{Request, Response};
use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;
use crate::http::request::RequestIdExt;
use crate::observability::metrics;

/// Span field recording the AnkiConnect action of a POST.
pub const ANKI_ACTION_FIELD: &str = "anki_action";

/// Install the global subscriber.
pub fn init(config: &ObservabilityConfig) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(&config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn default_directives(level: &str) -> String {
    format!("anki_bridge={level},tower_http={level}")
}

/// Span wrapping one inbound HTTP request.
pub fn make_request_span<B>(request: &Request<B>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request.request_id(),
        anki_action = tracing::field::Empty,
    )
}

/// Completion hook: one log line and the request metrics.
pub fn on_response<B>(response: &Response<B>, latency: Duration, _span: &Span) {
    let status = response.status().as_u16();
    tracing::info!(
        status,
        latency_ms = latency.as_millis() as u64,
        "Request completed"
    );
    metrics::record_request(status, latency);
}

/// Tag the current request span with the AnkiConnect action being proxied.
pub fn record_anki_action(action: &str) {
    Span::current().record(ANKI_ACTION_FIELD, action);
}
