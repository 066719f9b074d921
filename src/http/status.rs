//! Diagnostics route.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::http::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct BridgeStatus {
    pub version: String,
    pub clients: usize,
    pub pending_replies: usize,
    pub post_mine_action: u8,
}

/// GET /bridge/status
pub async fn get_status(State(state): State<AppState>) -> Json<BridgeStatus> {
    Json(BridgeStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        clients: state.registry.len(),
        pending_replies: state.engine.collector().pending(),
        post_mine_action: state.post_mine_action.into(),
    })
}
