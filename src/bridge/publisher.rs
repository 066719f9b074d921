//! Broadcast of commands to every connected client.

use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::mpsc::error::TrySendError;

use crate::bridge::protocol::Command;
use crate::bridge::registry::ConnectionRegistry;
use crate::error::BridgeError;

/// Serializes a command once and queues it on every registered client.
#[derive(Debug, Clone)]
pub struct Publisher {
    registry: Arc<ConnectionRegistry>,
}

impl Publisher {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Broadcast `command`, returning how many clients it was queued for.
    ///
    /// Only a serialization failure is an error. A client whose queue is
    /// full misses this frame. A client whose writer has already exited is
    /// skipped; its read loop will deregister it.
    pub fn publish(&self, command: &Command) -> Result<usize, BridgeError> {
        let text = serde_json::to_string(command).map_err(BridgeError::Serialize)?;
        let frame = Message::Text(text.into());

        let mut delivered = 0;
        self.registry.for_each(|client| match client.send(frame.clone()) {
            Ok(()) => delivered += 1,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(
                    connection_id = %client.id(),
                    remote_addr = %client.remote_addr(),
                    message_id = %command.id(),
                    "Client queue full, dropping command"
                );
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(
                    connection_id = %client.id(),
                    remote_addr = %client.remote_addr(),
                    message_id = %command.id(),
                    "Skipping client with closed writer"
                );
            }
        });

        tracing::debug!(
            command = %command.name(),
            message_id = %command.id(),
            delivered,
            "Command published"
        );
        Ok(delivered)
    }
}
