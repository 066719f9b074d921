//! Wire types exchanged with connected asbplayer clients.
//!
//! # Wire Format
//! ```text
//! server → client   {"command": "mine-subtitle", "messageId": "<uuid>", "body": {...}}
//! client → server   {"command": "response",      "messageId": "<uuid>", "body": {...}}
//! client → server   PING        (literal text, not JSON)
//! server → client   PONG
//! ```
//!
//! # Design Decisions
//! - Message IDs are UUID v4, generated fresh per command and never reused
//! - Bodies are opaque JSON; only the router looks inside them
//! - Liveness probes are recognized before any JSON parsing

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// Liveness probe sent by clients.
pub const PING: &str = "PING";

/// Liveness acknowledgement sent back to the probing client.
pub const PONG: &str = "PONG";

/// Correlation identifier carried by a command and echoed by its reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generate a new globally-unique message ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Operations a command can ask clients to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandName {
    /// A note is being created; clients may handle it themselves.
    MineSubtitle,
    /// Load subtitle files into the player.
    LoadSubtitles,
    /// Move playback to a timestamp.
    SeekTimestamp,
}

impl CommandName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::MineSubtitle => "mine-subtitle",
            CommandName::LoadSubtitles => "load-subtitles",
            CommandName::SeekTimestamp => "seek-timestamp",
        }
    }
}

impl std::fmt::Display for CommandName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound instruction broadcast to every connected client.
///
/// Immutable once constructed; the ID is generated by the constructor.
#[derive(Debug, Clone, Serialize)]
pub struct Command {
    #[serde(rename = "command")]
    name: CommandName,
    #[serde(rename = "messageId")]
    id: MessageId,
    body: Value,
}

impl Command {
    /// Build a command with a freshly generated message ID.
    pub fn new(name: CommandName, body: Value) -> Self {
        Self {
            name,
            id: MessageId::generate(),
            body,
        }
    }

    /// Ask clients to mine a subtitle into a note with the given fields.
    pub fn mine_subtitle(fields: Value, post_mine_action: PostMineAction) -> Self {
        Self::new(
            CommandName::MineSubtitle,
            json!({
                "fields": fields,
                "postMineAction": u8::from(post_mine_action),
            }),
        )
    }

    pub fn load_subtitles(files: &[SubtitleFile]) -> Self {
        Self::new(CommandName::LoadSubtitles, json!({ "files": files }))
    }

    pub fn seek_timestamp(timestamp: f64) -> Self {
        Self::new(CommandName::SeekTimestamp, json!({ "timestamp": timestamp }))
    }

    pub fn name(&self) -> CommandName {
        self.name
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn body(&self) -> &Value {
        &self.body
    }
}

/// An inbound message from a client, correlated to a command by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    /// Echo of the triggering command's name. Informational only.
    #[serde(rename = "command", default)]
    pub command_name: String,
    #[serde(rename = "messageId")]
    pub id: MessageId,
    #[serde(default)]
    pub body: Value,
}

impl Reply {
    /// Whether the client reports having completed the note creation itself.
    pub fn published(&self) -> bool {
        self.body
            .get("published")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// A text frame received from a client.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Ping,
    Reply(Reply),
}

impl Inbound {
    /// Classify a text frame. Anything other than a liveness probe must be a reply.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        if text == PING {
            return Ok(Inbound::Ping);
        }
        serde_json::from_str(text).map(Inbound::Reply)
    }
}

/// A subtitle file as posted by callers and forwarded to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleFile {
    pub name: String,
    pub base64: String,
}

/// What a client should do after mining a subtitle.
///
/// The numeric value is forwarded to clients verbatim in the
/// `mine-subtitle` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PostMineAction {
    None,
    ShowAnkiDialog,
    #[default]
    UpdateLastCard,
    ExportCard,
}

/// How the create-note request is sequenced relative to client notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MineMode {
    /// Forward to AnkiConnect first, then notify clients without waiting.
    PassthroughAfter,
    /// Wait for a client to acknowledge before deciding whether to forward.
    AwaitClient,
}

impl PostMineAction {
    pub fn mode(&self) -> MineMode {
        match self {
            PostMineAction::UpdateLastCard => MineMode::PassthroughAfter,
            _ => MineMode::AwaitClient,
        }
    }
}

impl From<PostMineAction> for u8 {
    fn from(action: PostMineAction) -> Self {
        match action {
            PostMineAction::None => 0,
            PostMineAction::ShowAnkiDialog => 1,
            PostMineAction::UpdateLastCard => 2,
            PostMineAction::ExportCard => 3,
        }
    }
}

impl TryFrom<u8> for PostMineAction {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PostMineAction::None),
            1 => Ok(PostMineAction::ShowAnkiDialog),
            2 => Ok(PostMineAction::UpdateLastCard),
            3 => Ok(PostMineAction::ExportCard),
            other => Err(format!("unknown post-mine action {}", other)),
        }
    }
}

impl std::str::FromStr for PostMineAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s
            .trim()
            .parse()
            .map_err(|e| format!("invalid post-mine action '{}': {}", s, e))?;
        PostMineAction::try_from(value)
    }
}
