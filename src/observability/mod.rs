//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, request spans)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID and AnkiConnect action are span fields on every request
//! - Message ID is a field on every correlation event
//! - Metrics are cheap no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
