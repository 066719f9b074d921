//! asbplayer control routes.
//!
//! Both routes require a client acknowledgement: the reply body is
//! discarded, only its arrival matters.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{de::DeserializeOwned, Deserialize};

use crate::bridge::protocol::{Command, SubtitleFile};
use crate::error::BridgeError;
use crate::http::server::AppState;

#[derive(Debug, Deserialize)]
pub struct LoadSubtitlesRequest {
    pub files: Vec<SubtitleFile>,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    pub timestamp: f64,
}

/// POST /asbplayer/load-subtitles
pub async fn load_subtitles(State(state): State<AppState>, body: Bytes) -> Response {
    match parse::<LoadSubtitlesRequest>(&body) {
        Ok(request) => acknowledged(&state, Command::load_subtitles(&request.files)).await,
        Err(e) => e.into_response(),
    }
}

/// POST /asbplayer/seek
pub async fn seek(State(state): State<AppState>, body: Bytes) -> Response {
    match parse::<SeekRequest>(&body) {
        Ok(request) => acknowledged(&state, Command::seek_timestamp(request.timestamp)).await,
        Err(e) => e.into_response(),
    }
}

// Callers do not always send a JSON content type, so the body is parsed
// directly rather than through the `Json` extractor.
fn parse<T: DeserializeOwned>(body: &[u8]) -> Result<T, BridgeError> {
    serde_json::from_slice(body).map_err(|e| BridgeError::MalformedBody(e.to_string()))
}

async fn acknowledged(state: &AppState, command: Command) -> Response {
    let correlation = state.engine.request(&command).await;
    if correlation.is_found() {
        StatusCode::OK.into_response()
    } else {
        tracing::warn!(
            command = %command.name(),
            message_id = %command.id(),
            outcome = correlation.outcome(),
            "No client acknowledged command"
        );
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}
