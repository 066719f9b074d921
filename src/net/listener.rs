//! TCP listener binding.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug)]
pub enum ListenerError {
    /// The configured host/port is not a socket address.
    Address(String),
    /// Failed to bind to address.
    Bind(SocketAddr, std::io::Error),
}

impl std::fmt::Display for ListenerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerError::Address(addr) => write!(f, "Invalid listen address: {}", addr),
            ListenerError::Bind(addr, e) => write!(f, "Failed to bind {}: {}", addr, e),
        }
    }
}

impl std::error::Error for ListenerError {}

/// Bind the configured listen address.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, ListenerError> {
    let raw = config.bind_address();
    let addr: SocketAddr = raw.parse().map_err(|_| ListenerError::Address(raw.clone()))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ListenerError::Bind(addr, e))?;

    tracing::info!(address = %addr, "Listener bound");
    Ok(listener)
}
