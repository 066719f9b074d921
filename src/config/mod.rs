//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (PORT, ANKI_CONNECT_URL, POST_MINE_ACTION)
//!     → validation.rs (semantic checks)
//!     → BridgeConfig (validated, immutable)
//!     → handed to HttpServer at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults so the bridge runs with no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load, load_config, ConfigError};
pub use schema::BridgeConfig;
pub use schema::CorrelationConfig;
pub use schema::ListenerConfig;
pub use schema::MiningConfig;
pub use schema::ObservabilityConfig;
pub use schema::UpstreamConfig;
