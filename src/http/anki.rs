//! AnkiConnect-facing routes.
//!
//! # Responsibilities
//! - Relay `GET /`, `POST /` and `OPTIONS /` to AnkiConnect
//! - Intercept `addNote` and involve connected clients per the post-mine mode
//!
//! # Policy
//! ```text
//! action != addNote or no clients   → forward
//! PassthroughAfter                  → forward, then notify clients (no wait)
//! AwaitClient                       → ask clients; published=true → 200 -1
//!                                                  anything else  → forward
//! ```

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::bridge::protocol::{Command, MineMode};
use crate::error::BridgeError;
use crate::http::server::AppState;
use crate::observability::logging;

/// Action intercepted for client notification.
pub const ADD_NOTE: &str = "addNote";

/// Returned instead of a note ID when a client created the note itself.
pub const PUBLISHED_SENTINEL: i64 = -1;

/// The envelope of every AnkiConnect call.
#[derive(Debug, Deserialize)]
pub struct AnkiConnectRequest {
    pub action: String,
    #[serde(default)]
    pub params: Value,
}

impl AnkiConnectRequest {
    /// `params.note.fields` of an `addNote` call.
    pub fn note_fields(&self) -> Result<Value, BridgeError> {
        match self.params.pointer("/note/fields") {
            Some(fields @ Value::Object(_)) => Ok(fields.clone()),
            Some(_) => Err(BridgeError::MalformedBody(
                "params.note.fields must be an object".to_string(),
            )),
            None => Err(BridgeError::MalformedBody(
                "addNote requires params.note.fields".to_string(),
            )),
        }
    }
}

/// GET / and any other pure passthrough that keeps its body.
pub async fn passthrough(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.upstream.forward(method, &headers, body).await.into_response()
}

/// OPTIONS / (CORS preflight), forwarded with an empty body.
pub async fn preflight(State(state): State<AppState>, headers: HeaderMap) -> Response {
    state
        .upstream
        .forward(Method::OPTIONS, &headers, Bytes::new())
        .await
        .into_response()
}

/// POST /
pub async fn handle_post(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request: AnkiConnectRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => return BridgeError::MalformedBody(e.to_string()).into_response(),
    };
    logging::record_anki_action(&request.action);

    if request.action != ADD_NOTE || state.registry.is_empty() {
        return forward_post(&state, &headers, body).await;
    }

    let fields = match request.note_fields() {
        Ok(fields) => fields,
        Err(e) => return e.into_response(),
    };
    let command = Command::mine_subtitle(fields, state.post_mine_action);

    match state.post_mine_action.mode() {
        MineMode::PassthroughAfter => {
            let response = forward_post(&state, &headers, body).await;
            if let Err(e) = state.engine.notify(&command) {
                tracing::warn!(message_id = %command.id(), error = %e, "Failed to notify clients");
            }
            response
        }
        MineMode::AwaitClient => {
            let correlation = state.engine.request(&command).await;
            match correlation.into_reply() {
                Some(reply) if reply.published() => {
                    tracing::info!(message_id = %command.id(), "Note created by client");
                    (StatusCode::OK, Json(PUBLISHED_SENTINEL)).into_response()
                }
                _ => forward_post(&state, &headers, body).await,
            }
        }
    }
}

async fn forward_post(state: &AppState, headers: &HeaderMap, body: Bytes) -> Response {
    state
        .upstream
        .forward(Method::POST, headers, body)
        .await
        .into_response()
}
