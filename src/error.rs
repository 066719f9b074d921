//! Error types shared by the bridge and its HTTP surface.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::bridge::protocol::MessageId;

/// Errors that can occur while bridging a request.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A command could not be encoded for the wire.
    #[error("failed to serialize command: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The inbound HTTP body did not have the expected shape.
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    /// AnkiConnect could not be reached.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    /// AnkiConnect did not answer in time.
    #[error("upstream did not respond within {0:?}")]
    UpstreamTimeout(Duration),

    #[error("invalid upstream URL '{url}': {reason}")]
    InvalidUpstreamUrl { url: String, reason: String },

    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    /// Two outstanding waits would share one correlation ID.
    #[error("message ID {0} already has an outstanding waiter")]
    DuplicateMessageId(MessageId),
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

impl BridgeError {
    pub fn status(&self) -> StatusCode {
        match self {
            BridgeError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            BridgeError::Upstream(_) => StatusCode::BAD_GATEWAY,
            BridgeError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            BridgeError::MalformedBody("missing action".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            BridgeError::UpstreamTimeout(Duration::from_secs(3)).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            BridgeError::DuplicateMessageId(MessageId::from("x")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_display() {
        let err = BridgeError::InvalidUpstreamUrl {
            url: "ftp://anki".into(),
            reason: "unsupported scheme".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid upstream URL 'ftp://anki': unsupported scheme"
        );
    }
}
