//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Check the upstream URL is something the HTTP client can reach
//! - Check timeouts are consistent with each other
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::BridgeConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.port must not be 0")]
    ZeroPort,

    #[error("listener.host must not be empty")]
    EmptyHost,

    #[error("upstream.url '{url}' is invalid: {reason}")]
    UpstreamUrl { url: String, reason: String },

    #[error("upstream.timeout_secs must be greater than 0")]
    ZeroUpstreamTimeout,

    #[error("correlation.reply_timeout_ms must be greater than 0")]
    ZeroReplyTimeout,

    #[error(
        "timeouts.request_secs ({request_secs}s) must exceed correlation.reply_timeout_ms ({reply_timeout_ms}ms)"
    )]
    RequestTimeoutTooShort {
        request_secs: u64,
        reply_timeout_ms: u64,
    },

    #[error("limits.max_body_bytes must be greater than 0")]
    ZeroBodyLimit,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }
    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }

    if let Err(reason) = check_upstream_url(&config.upstream.url) {
        errors.push(ValidationError::UpstreamUrl {
            url: config.upstream.url.clone(),
            reason,
        });
    }
    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::ZeroUpstreamTimeout);
    }

    let reply_timeout_ms = config.correlation.reply_timeout_ms;
    if reply_timeout_ms == 0 {
        errors.push(ValidationError::ZeroReplyTimeout);
    }
    if config.timeouts.request_secs.saturating_mul(1000) <= reply_timeout_ms {
        errors.push(ValidationError::RequestTimeoutTooShort {
            request_secs: config.timeouts.request_secs,
            reply_timeout_ms,
        });
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// The forwarding client speaks plain HTTP only.
fn check_upstream_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if url.scheme() != "http" {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(())
}
