//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerConfig (host, port)
//!     → listener.rs (bind; failure is fatal to the process)
//!     → Hand off to HTTP layer
//! ```

pub mod listener;

pub use listener::{bind, ListenerError};
