//! Registry of connected clients.
//!
//! # Responsibilities
//! - Track the live set of client connections
//! - Generate unique connection IDs for tracing
//! - Serialize add/remove against broadcast iteration
//! - Deregister a connection when its handler exits, even on panic
//!
//! # Design Decisions
//! - One mutex guards membership; the publisher iterates while holding it,
//!   so a broadcast sees a connection fully or not at all
//! - Sending to a connection only enqueues on its writer task, so the
//!   critical section never awaits
//! - Removal is idempotent
//! - Outbound queues are bounded; a stalled client loses frames instead of
//!   growing memory without limit

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::ws::Message;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::observability::metrics;

/// Frames queued per client before further broadcasts to it are dropped.
pub const OUTBOUND_CAPACITY: usize = 32;

/// Relaxed ordering is enough: IDs only need to be unique.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Handle to one connected client.
///
/// Frames pushed through the handle are written to the socket by the
/// connection's writer task.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    id: ConnectionId,
    remote_addr: SocketAddr,
    outbound: mpsc::Sender<Message>,
}

impl ClientHandle {
    pub fn new(remote_addr: SocketAddr, outbound: mpsc::Sender<Message>) -> Self {
        Self {
            id: ConnectionId::new(),
            remote_addr,
            outbound,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Queue a frame for this client without waiting.
    ///
    /// Fails when the queue is full or the writer task has exited.
    pub fn send(&self, message: Message) -> Result<(), TrySendError<Message>> {
        self.outbound.try_send(message)
    }
}

/// The set of currently connected clients.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, ClientHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConnectionId, ClientHandle>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.connections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a client to the broadcast set.
    pub fn add(&self, handle: ClientHandle) {
        let mut connections = self.lock();
        tracing::info!(
            connection_id = %handle.id,
            remote_addr = %handle.remote_addr,
            "Client connected"
        );
        connections.insert(handle.id, handle);
        metrics::set_clients_connected(connections.len());
    }

    /// Remove a client. Returns `false` if it was not registered.
    pub fn remove(&self, id: ConnectionId) -> bool {
        let mut connections = self.lock();
        match connections.remove(&id) {
            Some(handle) => {
                tracing::info!(
                    connection_id = %id,
                    remote_addr = %handle.remote_addr,
                    "Client disconnected"
                );
                metrics::set_clients_connected(connections.len());
                true
            }
            None => false,
        }
    }

    /// Add a client and return a guard that removes it when dropped.
    pub fn register(self: &Arc<Self>, handle: ClientHandle) -> Registration {
        let id = handle.id;
        self.add(handle);
        Registration {
            id,
            registry: Arc::clone(self),
        }
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// IDs of the connections registered right now.
    pub fn snapshot(&self) -> Vec<ConnectionId> {
        self.lock().keys().copied().collect()
    }

    /// Visit every registered client while holding the membership lock.
    ///
    /// `f` must not block: add/remove wait for it to finish.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&ClientHandle),
    {
        let connections = self.lock();
        for handle in connections.values() {
            f(handle);
        }
    }
}

/// Keeps a client registered for as long as it is held.
#[derive(Debug)]
pub struct Registration {
    id: ConnectionId,
    registry: Arc<ConnectionRegistry>,
}

impl Registration {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> (ClientHandle, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let addr: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        (ClientHandle::new(addr, tx), rx)
    }

    #[test]
    fn full_queue_rejects_without_blocking() {
        let (tx, mut rx) = mpsc::channel(1);
        let handle = ClientHandle::new("127.0.0.1:40000".parse().unwrap(), tx);

        handle.send(Message::Text("first".into())).unwrap();
        assert!(matches!(
            handle.send(Message::Text("second".into())),
            Err(TrySendError::Full(_))
        ));

        assert!(rx.try_recv().is_ok());
        assert!(handle.send(Message::Text("third".into())).is_ok());
    }

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn add_and_remove() {
        let registry = ConnectionRegistry::new();
        assert!(registry.is_empty());

        let (a, _rx_a) = client();
        let (b, _rx_b) = client();
        let (a_id, b_id) = (a.id(), b.id());
        registry.add(a);
        registry.add(b);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(a_id));

        assert!(registry.remove(a_id));
        assert!(!registry.contains(a_id));
        assert_eq!(registry.snapshot(), vec![b_id]);
    }

    #[test]
    fn remove_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (a, _rx) = client();
        let id = a.id();
        registry.add(a);

        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn registration_guard_deregisters_on_drop() {
        let registry = Arc::new(ConnectionRegistry::new());
        let (a, _rx) = client();

        let registration = registry.register(a);
        let id = registration.id();
        assert!(registry.contains(id));

        // Explicit removal before the guard drops must not trip the guard.
        assert!(registry.remove(id));
        drop(registration);
        assert!(registry.is_empty());
    }

    #[test]
    fn concurrent_membership_changes_never_tear() {
        let registry = Arc::new(ConnectionRegistry::new());
        let mut workers = Vec::new();

        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            workers.push(std::thread::spawn(move || {
                for _ in 0..200 {
                    let (handle, _rx) = client();
                    let registration = registry.register(handle);
                    registry.for_each(|h| {
                        assert!(h.id().as_u64() > 0);
                    });
                    drop(registration);
                }
            }));
        }

        for worker in workers {
            worker.join().unwrap();
        }
        assert!(registry.is_empty());
    }
}
