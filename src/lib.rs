//! AnkiConnect ⇄ asbplayer bridge library.

pub mod bridge;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::schema::BridgeConfig;
pub use error::{BridgeError, BridgeResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
