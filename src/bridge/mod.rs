//! Client bridge subsystem: the request/response correlation core.
//!
//! # Data Flow
//! ```text
//! Router builds Command
//!     → correlation.rs (register waiter, race reply vs deadline)
//!     → publisher.rs (serialize once, queue on every client)
//!     → registry.rs (live client set, one lock)
//!     → clients reply over their sockets
//!     → collector.rs (dispatch reply to waiter by message ID)
//!     → Correlation result back to the router
//! ```
//!
//! # Design Decisions
//! - Registry and waiter map are locked independently
//! - Every outstanding wait completes exactly once: matched or timed out
//! - Message IDs are UUID v4 and never reused

pub mod collector;
pub mod correlation;
pub mod protocol;
pub mod publisher;
pub mod registry;

pub use collector::{ReplyCollector, Waiter};
pub use correlation::{Correlation, CorrelationEngine};
pub use protocol::{Command, CommandName, Inbound, MessageId, MineMode, PostMineAction, Reply, SubtitleFile};
pub use publisher::Publisher;
pub use registry::{ClientHandle, ConnectionId, ConnectionRegistry, Registration};
