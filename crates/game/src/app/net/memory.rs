use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::backend::{Backend, BackendError, ChatRow, Clock, NewChatMessage, PlayerRow};

pub(crate) struct FixedClock(pub(crate) i64);

impl Clock for FixedClock {
    fn now_epoch_ms(&self) -> i64 {
        self.0
    }
}

#[derive(Clone, Copy, Default)]
pub(crate) struct FailureFlags {
    pub(crate) upsert: bool,
    pub(crate) list_players: bool,
    pub(crate) insert_chat: bool,
    pub(crate) list_chat: bool,
    pub(crate) delete: bool,
}

#[derive(Default)]
pub(crate) struct MemoryTables {
    pub(crate) players: BTreeMap<String, PlayerRow>,
    pub(crate) chat: Vec<ChatRow>,
    pub(crate) deleted: Vec<String>,
    pub(crate) upserts: usize,
    /// Player listings that have read the table so far.
    pub(crate) listings: usize,
    /// Latency added after an upcoming player listing reads the table, consumed front to back.
    pub(crate) listing_delays: VecDeque<Duration>,
}

/// In-memory tables that record every call, for driving the sync layer in tests.
#[derive(Clone, Default)]
pub(crate) struct RecordingBackend {
    tables: Arc<Mutex<MemoryTables>>,
    failures: FailureFlags,
}

impl RecordingBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_failures(mut self, failures: FailureFlags) -> Self {
        self.failures = failures;
        self
    }

    pub(crate) fn tables(&self) -> std::sync::MutexGuard<'_, MemoryTables> {
        self.tables.lock().expect("tables mutex poisoned")
    }

    pub(crate) fn insert_test_player(&self, row: PlayerRow) {
        self.tables().players.insert(row.id.clone(), row);
    }

    pub(crate) fn insert_test_chat(&self, player_id: &str, message: &str) {
        let mut tables = self.tables();
        let row = ChatRow {
            player_id: player_id.to_string(),
            name: player_id.to_string(),
            message: message.to_string(),
            created_at: format!("{:010}", tables.chat.len() + 1),
        };
        tables.chat.push(row);
    }

    fn fail(operation: &str) -> BackendError {
        BackendError::Unavailable(format!("{operation} failed"))
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    async fn upsert_player(&self, row: &PlayerRow) -> Result<(), BackendError> {
        if self.failures.upsert {
            return Err(Self::fail("upsert"));
        }
        let mut tables = self.tables();
        tables.upserts += 1;
        tables.players.insert(row.id.clone(), row.clone());
        Ok(())
    }

    async fn list_other_players(
        &self,
        exclude_id: &str,
        live_since_ms: i64,
    ) -> Result<Vec<PlayerRow>, BackendError> {
        if self.failures.list_players {
            return Err(Self::fail("list players"));
        }
        let (rows, delay) = {
            let mut tables = self.tables();
            tables.listings += 1;
            let rows: Vec<PlayerRow> = tables
                .players
                .values()
                .filter(|row| row.id != exclude_id && row.last_seen_at > live_since_ms)
                .cloned()
                .collect();
            (rows, tables.listing_delays.pop_front())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(rows)
    }

    async fn insert_chat_message(&self, message: &NewChatMessage) -> Result<(), BackendError> {
        if self.failures.insert_chat {
            return Err(Self::fail("insert chat"));
        }
        self.insert_test_chat(&message.player_id, &message.message);
        Ok(())
    }

    async fn list_chat_messages_since(
        &self,
        since: Option<&str>,
    ) -> Result<Vec<ChatRow>, BackendError> {
        if self.failures.list_chat {
            return Err(Self::fail("list chat"));
        }
        let tables = self.tables();
        Ok(tables
            .chat
            .iter()
            .filter(|row| since.map_or(true, |since| row.created_at.as_str() > since))
            .cloned()
            .collect())
    }

    async fn delete_player(&self, id: &str) -> Result<(), BackendError> {
        if self.failures.delete {
            return Err(Self::fail("delete"));
        }
        let mut tables = self.tables();
        tables.players.remove(id);
        tables.deleted.push(id.to_string());
        Ok(())
    }
}
