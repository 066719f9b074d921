//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, route table)
//!     → request.rs (request ID)
//!     → GET /ws            → websocket.rs (client registration, reply intake)
//!     → GET|POST|OPTIONS / → anki.rs (passthrough or client correlation)
//!     → POST /asbplayer/*  → asbplayer.rs (client acknowledgement required)
//!     → upstream.rs (forward to AnkiConnect, relay response)
//! ```

pub mod anki;
pub mod asbplayer;
pub mod request;
pub mod server;
pub mod status;
pub mod upstream;
pub mod websocket;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
pub use upstream::{propagate_headers, Upstream};
