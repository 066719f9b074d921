//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() or Ctrl+C → stop accepting → drain HTTP connections → exit
//! ```
//!
//! # Design Decisions
//! - Client sockets are not drained; clients reconnect on their own
//! - Only the initial bind is fatal

pub mod shutdown;

pub use shutdown::Shutdown;
