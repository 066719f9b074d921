//! Publish-and-await correlation of commands with client replies.
//!
//! # Flow
//! ```text
//! register waiter(id) → publish(command) → race { reply(id), deadline }
//!                                              │          │
//!                                        Matched(reply)  TimedOut
//! ```
//!
//! # Design Decisions
//! - The waiter is registered before publishing so a fast client cannot
//!   reply into an empty map
//! - Publishing to zero clients resolves immediately instead of waiting out
//!   the deadline
//! - Timeout is the only cancellation; dropping the future also releases
//!   the waiter

use std::time::{Duration, Instant};

use crate::bridge::collector::ReplyCollector;
use crate::bridge::protocol::{Command, Reply};
use crate::bridge::publisher::Publisher;
use crate::error::BridgeError;
use crate::observability::metrics;

/// Result of one publish-and-await round.
#[derive(Debug, Clone, PartialEq)]
pub enum Correlation {
    /// A client replied with the command's ID before the deadline.
    Matched(Reply),
    /// The deadline elapsed first.
    TimedOut,
    /// No client was connected to receive the command.
    NoClients,
    /// The command could not be serialized or registered.
    PublishFailed,
}

impl Correlation {
    pub fn is_found(&self) -> bool {
        matches!(self, Correlation::Matched(_))
    }

    pub fn into_reply(self) -> Option<Reply> {
        match self {
            Correlation::Matched(reply) => Some(reply),
            _ => None,
        }
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            Correlation::Matched(_) => "matched",
            Correlation::TimedOut => "timed_out",
            Correlation::NoClients => "no_clients",
            Correlation::PublishFailed => "publish_failed",
        }
    }
}

/// Correlates broadcast commands with the replies they trigger.
#[derive(Debug, Clone)]
pub struct CorrelationEngine {
    publisher: Publisher,
    collector: ReplyCollector,
    reply_timeout: Duration,
}

impl CorrelationEngine {
    pub fn new(publisher: Publisher, collector: ReplyCollector, reply_timeout: Duration) -> Self {
        Self {
            publisher,
            collector,
            reply_timeout,
        }
    }

    pub fn collector(&self) -> &ReplyCollector {
        &self.collector
    }

    /// Broadcast without waiting for any reply.
    pub fn notify(&self, command: &Command) -> Result<usize, BridgeError> {
        let delivered = self.publisher.publish(command)?;
        metrics::record_command(command.name().as_str(), "notified");
        Ok(delivered)
    }

    /// Publish and wait the configured reply timeout.
    pub async fn request(&self, command: &Command) -> Correlation {
        self.publish_and_await(command, self.reply_timeout).await
    }

    /// Publish `command` and wait up to `timeout` for the reply carrying its ID.
    pub async fn publish_and_await(&self, command: &Command, timeout: Duration) -> Correlation {
        let start = Instant::now();
        let correlation = self.correlate(command, timeout).await;

        tracing::debug!(
            command = %command.name(),
            message_id = %command.id(),
            outcome = correlation.outcome(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Correlation finished"
        );
        metrics::record_correlation(command.name().as_str(), correlation.outcome(), start);
        correlation
    }

    async fn correlate(&self, command: &Command, timeout: Duration) -> Correlation {
        let mut waiter = match self.collector.register(command.id().clone()) {
            Ok(waiter) => waiter,
            Err(e) => {
                tracing::error!(message_id = %command.id(), error = %e, "Failed to register waiter");
                return Correlation::PublishFailed;
            }
        };

        match self.publisher.publish(command) {
            Ok(0) => return Correlation::NoClients,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(message_id = %command.id(), error = %e, "Failed to publish command");
                return Correlation::PublishFailed;
            }
        }

        match tokio::time::timeout(timeout, waiter.recv()).await {
            Ok(Some(reply)) => Correlation::Matched(reply),
            // The entry vanished without a reply; nothing will resolve it now.
            Ok(None) => Correlation::TimedOut,
            Err(_) => {
                tracing::debug!(
                    message_id = %command.id(),
                    timeout_ms = timeout.as_millis() as u64,
                    "Timed out waiting for client reply"
                );
                Correlation::TimedOut
            }
        }
    }
}
