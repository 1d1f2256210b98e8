use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::app::world::Facing;

/// One row of the `players` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct PlayerRow {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) x: f32,
    pub(crate) y: f32,
    #[serde(default)]
    pub(crate) facing: Facing,
    #[serde(default)]
    pub(crate) is_typing: bool,
    #[serde(default)]
    pub(crate) command_animation: Option<String>,
    /// Epoch milliseconds of the owner's last push.
    #[serde(default)]
    pub(crate) last_seen_at: i64,
}

/// One row of the `chat` table as listed back.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct ChatRow {
    pub(crate) player_id: String,
    #[serde(default)]
    pub(crate) name: String,
    pub(crate) message: String,
    pub(crate) created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct NewChatMessage {
    pub(crate) player_id: String,
    pub(crate) name: String,
    pub(crate) message: String,
}

#[derive(Debug, Error)]
pub(crate) enum BackendError {
    #[error("invalid backend url: {0}")]
    Url(#[from] url::ParseError),
    #[error("backend transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("backend response is not json: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// The four table operations the client needs, plus best-effort deregistration.
#[async_trait]
pub(crate) trait Backend: Send + Sync {
    async fn upsert_player(&self, row: &PlayerRow) -> Result<(), BackendError>;
    async fn list_other_players(
        &self,
        exclude_id: &str,
        live_since_ms: i64,
    ) -> Result<Vec<PlayerRow>, BackendError>;
    async fn insert_chat_message(&self, message: &NewChatMessage) -> Result<(), BackendError>;
    /// Ascending by creation time, strictly after `since` when given.
    async fn list_chat_messages_since(
        &self,
        since: Option<&str>,
    ) -> Result<Vec<ChatRow>, BackendError>;
    async fn delete_player(&self, id: &str) -> Result<(), BackendError>;
}

pub(crate) trait Clock: Send + Sync {
    fn now_epoch_ms(&self) -> i64;
}

pub(crate) struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_ms(&self) -> i64 {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Decodes a listing row by row. A `null` body is empty; rows that fail are logged and skipped.
pub(crate) fn parse_rows<T: DeserializeOwned>(table: &'static str, body: Value) -> Vec<T> {
    let items = match body {
        Value::Null => return Vec::new(),
        Value::Array(items) => items,
        other => {
            warn!(table, kind = value_kind(&other), "backend_listing_not_array");
            return Vec::new();
        }
    };

    let mut rows = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_path_to_error::deserialize::<_, T>(item) {
            Ok(row) => rows.push(row),
            Err(error) => {
                let path = error.path().to_string();
                warn!(
                    table,
                    index,
                    path = %path,
                    error = %error.into_inner(),
                    "backend_row_skipped"
                );
            }
        }
    }
    rows
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_body_is_an_empty_listing() {
        assert!(parse_rows::<PlayerRow>("players", Value::Null).is_empty());
        assert!(parse_rows::<PlayerRow>("players", json!({"error": "x"})).is_empty());
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let body = json!([
            {"id": "a", "name": "Ann", "x": 10, "y": 20, "facing": "LEFT", "is_typing": true,
             "command_animation": "sit", "last_seen_at": 1000},
            {"id": "b", "name": "Bo", "x": "oops", "y": 0},
            {"id": "c", "name": "Cy", "x": 1.5, "y": 2.5, "command_animation": null}
        ]);
        let rows = parse_rows::<PlayerRow>("players", body);
        let ids: Vec<&str> = rows.iter().map(|row| row.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(rows[0].facing, Facing::Left);
        assert_eq!(rows[0].command_animation.as_deref(), Some("sit"));
        assert_eq!(rows[1].facing, Facing::Right);
        assert!(!rows[1].is_typing);
    }

    #[test]
    fn player_row_serializes_wire_names() {
        let row = PlayerRow {
            id: "me".into(),
            name: "Me".into(),
            x: 300.0,
            y: 301.0,
            facing: Facing::Right,
            is_typing: false,
            command_animation: None,
            last_seen_at: 42,
        };
        let value = serde_json::to_value(&row).expect("json");
        assert_eq!(value["facing"], json!("RIGHT"));
        assert_eq!(value["command_animation"], Value::Null);
        assert_eq!(value["last_seen_at"], json!(42));
    }

    #[test]
    fn chat_rows_require_message_and_timestamp() {
        let body = json!([
            {"player_id": "a", "name": "Ann", "message": "hi", "created_at": "2024-01-01T00:00:00Z"},
            {"player_id": "b", "message": "no time"}
        ]);
        let rows = parse_rows::<ChatRow>("chat", body);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].message, "hi");
    }
}
