use plaza_engine::{InputLatch, InputSnapshot, Vec2};
use tracing::{debug, info};

use super::clips::AVATAR_SHEET;
use super::command::SlashCommand;
use super::intents::{classify_key, ChatDraft, Intent};
use super::local::LocalPlayer;
use super::remote::{Roster, RosterEntry, SnapshotOutcome};
use super::zone::PortalZone;
use crate::app::net::{ChatRow, NetCompletion, PlayerRow};

/// Everything one tick reads and writes. Owned by the world scene and passed to each step.
#[derive(Debug)]
pub(crate) struct SimulationContext {
    pub(crate) local: LocalPlayer,
    pub(crate) roster: Roster,
    pub(crate) zone: PortalZone,
    pub(crate) latch: InputLatch,
    pub(crate) draft: ChatDraft,
    pub(crate) elapsed_seconds: f32,
}

/// Side effects a tick asks the caller to perform.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct TickOutput {
    pub(crate) quit_requested: bool,
    pub(crate) outgoing_chat: Vec<String>,
}

impl SimulationContext {
    pub(crate) fn new(local: LocalPlayer) -> Self {
        Self {
            local,
            roster: Roster::default(),
            zone: PortalZone::default(),
            latch: InputLatch::default(),
            draft: ChatDraft::default(),
            elapsed_seconds: 0.0,
        }
    }

    pub(crate) fn avatar_size() -> Vec2 {
        Vec2::new(
            AVATAR_SHEET.frame_width as f32,
            AVATAR_SHEET.frame_height as f32,
        )
    }

    pub(crate) fn tick(&mut self, dt_seconds: f32, input: &InputSnapshot) -> TickOutput {
        let mut output = TickOutput {
            quit_requested: input.quit_requested(),
            ..TickOutput::default()
        };
        if input.focus_lost() {
            self.latch.clear();
        }
        for key in input.keys() {
            if let Some(intent) = classify_key(key, self.draft.is_typing()) {
                self.handle_intent(intent, &mut output);
            }
        }

        self.local
            .step(self.latch.held(), self.draft.is_typing(), dt_seconds);
        self.roster.step(dt_seconds);

        let positions = std::iter::once(self.local.position)
            .chain(self.roster.iter().map(|player| player.position));
        self.zone
            .evaluate(positions, Self::avatar_size(), dt_seconds);

        self.elapsed_seconds += dt_seconds;
        output
    }

    fn handle_intent(&mut self, intent: Intent, output: &mut TickOutput) {
        match intent {
            Intent::PressDirection(direction) => {
                self.latch.press_direction(direction);
            }
            Intent::ReleaseDirection(direction) => {
                self.latch.release_direction(direction);
            }
            Intent::BeginTyping => {
                self.draft.begin();
                self.local.chat.set_typing_status(true);
            }
            Intent::Append(text) => {
                self.draft.append(&text);
                self.local.chat.set_draft(self.draft.buffer());
            }
            Intent::Backspace => {
                self.draft.backspace();
                self.local.chat.set_draft(self.draft.buffer());
            }
            Intent::CancelTyping => {
                self.draft.cancel();
                self.local.chat.set_typing_status(false);
            }
            Intent::Submit => {
                let line = self.draft.submit();
                self.local.chat.set_typing_status(false);
                let Some(line) = line else {
                    return;
                };
                match SlashCommand::parse(&line) {
                    Some(command) => {
                        info!(command = ?command, "slash_command");
                        self.local.issue(command);
                    }
                    None => {
                        self.local.chat.set_message(&line);
                        output.outgoing_chat.push(line);
                    }
                }
            }
            Intent::Quit => output.quit_requested = true,
        }
    }

    /// Own row as it should be stored remotely, stamped with `now_ms`.
    pub(crate) fn local_row(&self, now_ms: i64) -> PlayerRow {
        PlayerRow {
            id: self.local.id.clone(),
            name: self.local.name.clone(),
            x: self.local.position.x.round(),
            y: self.local.position.y.round(),
            facing: self.local.facing,
            is_typing: self.draft.is_typing(),
            command_animation: self
                .local
                .command_state()
                .wire_name()
                .map(ToString::to_string),
            last_seen_at: now_ms,
        }
    }

    pub(crate) fn apply_completion(&mut self, completion: NetCompletion) {
        match completion {
            NetCompletion::Roster { sequence, rows } => {
                let entries = rows
                    .into_iter()
                    .filter(|row| row.id != self.local.id)
                    .map(RosterEntry::from)
                    .collect();
                match self.roster.apply_snapshot(sequence, entries) {
                    SnapshotOutcome::Applied { added, removed } if added > 0 || removed > 0 => {
                        info!(players = self.roster.len(), added, removed, "roster_changed");
                    }
                    SnapshotOutcome::Applied { .. } => {}
                    SnapshotOutcome::Stale {
                        sequence,
                        last_applied,
                    } => debug!(sequence, last_applied, "roster_snapshot_stale"),
                }
            }
            NetCompletion::Chat { rows } => {
                for row in rows {
                    self.apply_chat_row(&row);
                }
            }
        }
    }

    fn apply_chat_row(&mut self, row: &ChatRow) {
        if row.player_id == self.local.id {
            if !self.draft.is_typing() {
                self.local.chat.set_message(&row.message);
            }
            return;
        }
        match self.roster.get_mut(&row.player_id) {
            Some(player) => player.chat.set_message(&row.message),
            None => debug!(player_id = %row.player_id, "chat_from_unknown_player"),
        }
    }
}
