use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use super::backend::{Backend, ChatRow, Clock, NewChatMessage, PlayerRow};

pub(crate) const PUSH_INTERVAL: Duration = Duration::from_millis(200);
pub(crate) const CHAT_POLL_INTERVAL: Duration = Duration::from_millis(200);
pub(crate) const LIVENESS_WINDOW_MS: i64 = 10_000;
const NET_WORKER_THREADS: usize = 2;

/// Results handed to the simulation, already past the staleness checks this layer owns.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NetCompletion {
    Roster { sequence: u64, rows: Vec<PlayerRow> },
    Chat { rows: Vec<ChatRow> },
}

#[derive(Debug)]
enum Envelope {
    Roster { sequence: u64, rows: Vec<PlayerRow> },
    Chat { sequence: u64, rows: Vec<ChatRow> },
}

/// Lets an action through at most once per interval. The first call always passes.
#[derive(Debug, Clone)]
pub(crate) struct IntervalGate {
    interval: Duration,
    last: Option<Instant>,
}

impl IntervalGate {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub(crate) fn ready(&mut self, now: Instant) -> bool {
        let due = self
            .last
            .map_or(true, |last| now.saturating_duration_since(last) >= self.interval);
        if due {
            self.last = Some(now);
        }
        due
    }
}

#[derive(Debug, Default)]
struct ChatCursor {
    seeded: bool,
    high_water: Option<String>,
    last_sequence: Option<u64>,
}

impl ChatCursor {
    /// Rows not yet shown, or `None` when the poll is stale. The first poll only
    /// records where history ends so old messages are not replayed on join.
    fn accept(&mut self, sequence: u64, rows: Vec<ChatRow>) -> Option<Vec<ChatRow>> {
        if self.last_sequence.is_some_and(|last| sequence <= last) {
            debug!(sequence, "chat_poll_stale");
            return None;
        }
        self.last_sequence = Some(sequence);

        let fresh: Vec<ChatRow> = rows
            .into_iter()
            .filter(|row| {
                self.high_water
                    .as_deref()
                    .map_or(true, |high| row.created_at.as_str() > high)
            })
            .collect();
        if let Some(last) = fresh.last() {
            self.high_water = Some(last.created_at.clone());
        }
        if !self.seeded {
            self.seeded = true;
            debug!(skipped = fresh.len(), "chat_history_seeded");
            return None;
        }
        (!fresh.is_empty()).then_some(fresh)
    }
}

/// Issues backend requests on its own runtime and queues their results for the tick.
pub(crate) struct NetSync {
    runtime: Runtime,
    backend: Arc<dyn Backend>,
    clock: Arc<dyn Clock>,
    local_id: String,
    tx: UnboundedSender<Envelope>,
    rx: UnboundedReceiver<Envelope>,
    push_gate: IntervalGate,
    chat_gate: IntervalGate,
    next_sequence: u64,
    chat: ChatCursor,
}

impl NetSync {
    pub(crate) fn new(
        backend: Arc<dyn Backend>,
        clock: Arc<dyn Clock>,
        local_id: String,
    ) -> std::io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(NET_WORKER_THREADS)
            .thread_name("plaza-net")
            .enable_all()
            .build()?;
        let (tx, rx) = mpsc::unbounded_channel();
        Ok(Self {
            runtime,
            backend,
            clock,
            local_id,
            tx,
            rx,
            push_gate: IntervalGate::new(PUSH_INTERVAL),
            chat_gate: IntervalGate::new(CHAT_POLL_INTERVAL),
            next_sequence: 0,
            chat: ChatCursor::default(),
        })
    }

    fn issue_sequence(&mut self) -> u64 {
        self.next_sequence += 1;
        self.next_sequence
    }

    /// Upserts the local row and lists the others, if the push interval has elapsed.
    /// Returns the request's sequence number when one was issued.
    pub(crate) fn maybe_push(
        &mut self,
        now: Instant,
        local_row: impl FnOnce(i64) -> PlayerRow,
    ) -> Option<u64> {
        if !self.push_gate.ready(now) {
            return None;
        }
        let sequence = self.issue_sequence();
        let now_ms = self.clock.now_epoch_ms();
        let row = local_row(now_ms);
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        let exclude_id = self.local_id.clone();

        self.runtime.spawn(async move {
            if let Err(error) = backend.upsert_player(&row).await {
                warn!(sequence, error = %error, "backend_upsert_failed");
            }
            match backend
                .list_other_players(&exclude_id, now_ms - LIVENESS_WINDOW_MS)
                .await
            {
                Ok(rows) => {
                    let _ = tx.send(Envelope::Roster { sequence, rows });
                }
                Err(error) => warn!(sequence, error = %error, "backend_list_players_failed"),
            }
        });
        Some(sequence)
    }

    pub(crate) fn maybe_poll_chat(&mut self, now: Instant) -> Option<u64> {
        if !self.chat_gate.ready(now) {
            return None;
        }
        let sequence = self.issue_sequence();
        let since = self.chat.high_water.clone();
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();

        self.runtime.spawn(async move {
            match backend.list_chat_messages_since(since.as_deref()).await {
                Ok(rows) => {
                    let _ = tx.send(Envelope::Chat { sequence, rows });
                }
                Err(error) => warn!(sequence, error = %error, "backend_list_chat_failed"),
            }
        });
        Some(sequence)
    }

    pub(crate) fn send_chat(&self, name: &str, message: String) {
        let backend = Arc::clone(&self.backend);
        let message = NewChatMessage {
            player_id: self.local_id.clone(),
            name: name.to_string(),
            message,
        };
        self.runtime.spawn(async move {
            if let Err(error) = backend.insert_chat_message(&message).await {
                warn!(error = %error, "backend_chat_insert_failed");
            }
        });
    }

    /// Everything that finished since the last call, in arrival order.
    pub(crate) fn drain(&mut self) -> Vec<NetCompletion> {
        let mut completions = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(envelope) => completions.extend(self.admit(envelope)),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        completions
    }

    fn admit(&mut self, envelope: Envelope) -> Option<NetCompletion> {
        match envelope {
            Envelope::Roster { sequence, rows } => Some(NetCompletion::Roster { sequence, rows }),
            Envelope::Chat { sequence, rows } => self
                .chat
                .accept(sequence, rows)
                .map(|rows| NetCompletion::Chat { rows }),
        }
    }

    /// Removes the local row, giving up after `timeout`.
    pub(crate) fn deregister(&self, timeout: Duration) {
        let backend = Arc::clone(&self.backend);
        let id = self.local_id.clone();
        let outcome = self
            .runtime
            .block_on(async move { tokio::time::timeout(timeout, backend.delete_player(&id)).await });
        match outcome {
            Ok(Ok(())) => info!(player_id = %self.local_id, "player_deregistered"),
            Ok(Err(error)) => warn!(error = %error, "backend_delete_failed"),
            Err(_) => warn!(timeout_ms = timeout.as_millis() as u64, "backend_delete_timed_out"),
        }
    }

    /// Blocks until `envelopes` results arrived or one wait times out.
    #[cfg(test)]
    pub(crate) fn wait_for(&mut self, envelopes: usize, timeout: Duration) -> Vec<NetCompletion> {
        let mut completions = Vec::new();
        for _ in 0..envelopes {
            let rx = &mut self.rx;
            let received = self
                .runtime
                .block_on(async { tokio::time::timeout(timeout, rx.recv()).await });
            match received {
                Ok(Some(envelope)) => completions.extend(self.admit(envelope)),
                _ => break,
            }
        }
        completions
    }
}
