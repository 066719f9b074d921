//! Shared inbound path for client replies.
//!
//! # Responsibilities
//! - Hold one completion handle per outstanding correlation, keyed by message ID
//! - Hand each reply to the waiter registered under its ID, at most once
//! - Drop replies nobody is waiting for
//!
//! # Design Decisions
//! - A keyed map instead of a shared queue: a reply for X can never be
//!   consumed by the waiter for Y, however many waits are outstanding
//! - The map has its own sharded locking, disjoint from the registry lock
//! - A waiter removes its own entry when dropped, so a timed-out or
//!   cancelled wait leaves nothing behind for a late reply to hit

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::oneshot;

use crate::bridge::protocol::{MessageId, Reply};
use crate::error::BridgeError;

/// Dispatches replies from every client connection to their waiters.
#[derive(Debug, Clone, Default)]
pub struct ReplyCollector {
    waiters: Arc<DashMap<MessageId, oneshot::Sender<Reply>>>,
}

impl ReplyCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in the reply carrying `id`.
    pub fn register(&self, id: MessageId) -> Result<Waiter, BridgeError> {
        let (tx, rx) = oneshot::channel();
        match self.waiters.entry(id.clone()) {
            Entry::Occupied(_) => Err(BridgeError::DuplicateMessageId(id)),
            Entry::Vacant(slot) => {
                slot.insert(tx);
                Ok(Waiter {
                    id,
                    rx,
                    waiters: Arc::clone(&self.waiters),
                })
            }
        }
    }

    /// Deliver a reply. Returns `false` if no waiter wanted it.
    pub fn collect(&self, reply: Reply) -> bool {
        let Some((_, waiter)) = self.waiters.remove(&reply.id) else {
            tracing::debug!(message_id = %reply.id, "Dropping unmatched reply");
            return false;
        };

        let id = reply.id.clone();
        match waiter.send(reply) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!(message_id = %id, "Waiter gave up before reply arrived");
                false
            }
        }
    }

    /// Number of correlations currently waiting for a reply.
    pub fn pending(&self) -> usize {
        self.waiters.len()
    }
}

/// One outstanding wait for a reply.
#[derive(Debug)]
pub struct Waiter {
    id: MessageId,
    rx: oneshot::Receiver<Reply>,
    waiters: Arc<DashMap<MessageId, oneshot::Sender<Reply>>>,
}

impl Waiter {
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    /// Resolve once the matching reply is collected.
    ///
    /// Returns `None` if the entry was discarded without a reply.
    pub async fn recv(&mut self) -> Option<Reply> {
        (&mut self.rx).await.ok()
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        // IDs are never reused, so this can only remove our own entry.
        self.waiters.remove(&self.id);
    }
}
