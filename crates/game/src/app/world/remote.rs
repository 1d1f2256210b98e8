use std::collections::HashMap;

use plaza_engine::{AnimationPlayer, Vec2};
use tracing::{debug, info};

use super::chat::ChatBubble;
use super::clips::{select_clip, ClipId};
use super::command::CommandState;
use super::model::Facing;
use crate::app::net::PlayerRow;

pub(crate) const INTERPOLATION_FACTOR: f32 = 0.1;
pub(crate) const FACING_DEADBAND_PX: f32 = 0.1;
pub(crate) const WALK_DEADBAND_PX: f32 = 0.5;

/// One player as reported by the backend, already validated.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RosterEntry {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) position: Vec2,
    pub(crate) facing: Facing,
    pub(crate) typing: bool,
    pub(crate) command: CommandState,
}

impl From<PlayerRow> for RosterEntry {
    fn from(row: PlayerRow) -> Self {
        Self {
            position: Vec2::new(row.x, row.y),
            facing: row.facing,
            typing: row.is_typing,
            command: CommandState::from_wire(row.command_animation.as_deref()),
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RemotePlayer {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) position: Vec2,
    pub(crate) destination: Vec2,
    pub(crate) facing: Facing,
    pub(crate) command: CommandState,
    pub(crate) chat: ChatBubble,
    animation: AnimationPlayer<ClipId>,
    walking: bool,
}

impl RemotePlayer {
    fn spawn(entry: RosterEntry) -> Self {
        let mut player = Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            position: entry.position,
            destination: entry.position,
            facing: entry.facing,
            command: entry.command,
            chat: ChatBubble::default(),
            animation: AnimationPlayer::new(ClipId::StandRight),
            walking: false,
        };
        player.merge(entry);
        player
    }

    /// Overwrites the target only; `position` keeps easing from where it is.
    fn merge(&mut self, entry: RosterEntry) {
        self.name = entry.name;
        self.destination = entry.position;
        self.facing = entry.facing;
        self.command = entry.command;
        self.chat.set_typing_status(entry.typing);
        self.animation
            .play(select_clip(self.command, self.walking, self.facing));
    }

    #[cfg(test)]
    pub(crate) fn is_walking(&self) -> bool {
        self.walking
    }

    #[cfg(test)]
    pub(crate) fn clip(&self) -> ClipId {
        self.animation.active()
    }

    pub(crate) fn frame(&self) -> u16 {
        self.animation.frame(self.animation.active().clip())
    }

    pub(crate) fn step(&mut self, dt_seconds: f32) {
        let delta = self.destination - self.position;
        self.position += delta * INTERPOLATION_FACTOR;
        if delta.x.abs() > FACING_DEADBAND_PX {
            self.facing = if delta.x < 0.0 {
                Facing::Left
            } else {
                Facing::Right
            };
        }
        self.walking = delta.x.abs() > WALK_DEADBAND_PX || delta.y.abs() > WALK_DEADBAND_PX;

        self.animation
            .play(select_clip(self.command, self.walking, self.facing));
        self.animation
            .step(dt_seconds, self.animation.active().clip());
        self.chat.step(dt_seconds);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SnapshotOutcome {
    Applied { added: usize, removed: usize },
    Stale { sequence: u64, last_applied: u64 },
}

/// Every other player currently shown, in snapshot order.
#[derive(Debug, Default)]
pub(crate) struct Roster {
    players: Vec<RemotePlayer>,
    last_sequence: Option<u64>,
}

impl Roster {
    pub(crate) fn len(&self) -> usize {
        self.players.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &RemotePlayer> {
        self.players.iter()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, id: &str) -> Option<&RemotePlayer> {
        self.players.iter().find(|player| player.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut RemotePlayer> {
        self.players.iter_mut().find(|player| player.id == id)
    }

    /// Replaces the roster with `entries` unless a newer snapshot was already applied.
    pub(crate) fn apply_snapshot(
        &mut self,
        sequence: u64,
        entries: Vec<RosterEntry>,
    ) -> SnapshotOutcome {
        if let Some(last_applied) = self.last_sequence {
            if sequence <= last_applied {
                return SnapshotOutcome::Stale {
                    sequence,
                    last_applied,
                };
            }
        }
        self.last_sequence = Some(sequence);

        let mut previous: HashMap<String, RemotePlayer> = self
            .players
            .drain(..)
            .map(|player| (player.id.clone(), player))
            .collect();
        let mut added = 0;
        for entry in entries {
            if let Some(existing) = self.players.iter_mut().find(|p| p.id == entry.id) {
                existing.merge(entry);
                continue;
            }
            let player = match previous.remove(&entry.id) {
                Some(mut existing) => {
                    existing.merge(entry);
                    existing
                }
                None => {
                    added += 1;
                    info!(player_id = %entry.id, name = %entry.name, "remote_player_joined");
                    RemotePlayer::spawn(entry)
                }
            };
            self.players.push(player);
        }
        let removed = previous.len();
        for id in previous.keys() {
            info!(player_id = %id, "remote_player_left");
        }
        debug!(
            sequence,
            players = self.players.len(),
            added,
            removed,
            "roster_snapshot_applied"
        );
        SnapshotOutcome::Applied { added, removed }
    }

    pub(crate) fn step(&mut self, dt_seconds: f32) {
        for player in &mut self.players {
            player.step(dt_seconds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn entry(id: &str, x: f32, y: f32) -> RosterEntry {
        RosterEntry {
            id: id.to_string(),
            name: format!("name-{id}"),
            position: Vec2::new(x, y),
            facing: Facing::Right,
            typing: false,
            command: CommandState::Idle,
        }
    }

    fn ids(roster: &Roster) -> Vec<&str> {
        roster.iter().map(|player| player.id.as_str()).collect()
    }

    #[test]
    fn new_players_start_at_their_destination() {
        let mut roster = Roster::default();
        roster.apply_snapshot(1, vec![entry("a", 10.0, 20.0)]);
        let player = roster.get("a").expect("player");
        assert_eq!(player.position, player.destination);
        assert_eq!(player.position, Vec2::new(10.0, 20.0));
    }

    #[test]
    fn roster_ids_match_latest_snapshot() {
        let mut roster = Roster::default();
        roster.apply_snapshot(1, vec![entry("a", 0.0, 0.0), entry("b", 0.0, 0.0)]);
        let outcome = roster.apply_snapshot(2, vec![entry("b", 5.0, 0.0), entry("c", 0.0, 0.0)]);
        assert_eq!(outcome, SnapshotOutcome::Applied { added: 1, removed: 1 });
        assert_eq!(ids(&roster), vec!["b", "c"]);
    }

    #[test]
    fn existing_player_keeps_position_and_eases_toward_destination() {
        let mut roster = Roster::default();
        roster.apply_snapshot(1, vec![entry("a", 0.0, 0.0)]);
        roster.apply_snapshot(2, vec![entry("a", 100.0, 0.0)]);
        assert_eq!(roster.get("a").expect("a").position, Vec2::ZERO);

        roster.step(DT);
        let player = roster.get("a").expect("a");
        assert!((player.position.x - 10.0).abs() < 1e-4);
        assert!(player.is_walking());
        assert_eq!(player.clip(), ClipId::WalkRight);

        for _ in 0..9 {
            roster.step(DT);
        }
        let remaining = 100.0 - roster.get("a").expect("a").position.x;
        assert!((remaining - 100.0 * 0.9_f32.powi(10)).abs() < 1e-3);
    }

    #[test]
    fn facing_follows_motion_beyond_deadband() {
        let mut roster = Roster::default();
        roster.apply_snapshot(1, vec![entry("a", 50.0, 0.0)]);
        roster.apply_snapshot(2, vec![entry("a", 10.0, 0.0)]);
        roster.step(DT);
        assert_eq!(roster.get("a").expect("a").facing, Facing::Left);
    }

    #[test]
    fn tiny_drift_does_not_walk() {
        let mut roster = Roster::default();
        roster.apply_snapshot(1, vec![entry("a", 0.0, 0.0)]);
        roster.apply_snapshot(2, vec![entry("a", 0.4, 0.4)]);
        roster.step(DT);
        assert!(!roster.get("a").expect("a").is_walking());
    }

    #[test]
    fn stale_snapshot_is_discarded() {
        let mut roster = Roster::default();
        roster.apply_snapshot(5, vec![entry("new", 0.0, 0.0)]);
        let outcome = roster.apply_snapshot(4, vec![entry("old", 0.0, 0.0)]);
        assert_eq!(
            outcome,
            SnapshotOutcome::Stale {
                sequence: 4,
                last_applied: 5
            }
        );
        assert_eq!(ids(&roster), vec!["new"]);
    }

    #[test]
    fn typing_and_command_mirror_the_row() {
        let mut roster = Roster::default();
        let mut sitting = entry("a", 0.0, 0.0);
        sitting.typing = true;
        sitting.command = CommandState::SitLoop;
        roster.apply_snapshot(1, vec![sitting]);
        let player = roster.get("a").expect("a");
        assert!(player.chat.is_typing());
        assert_eq!(player.clip(), ClipId::SitLoop);
    }

    #[test]
    fn duplicate_ids_collapse_into_one_player() {
        let mut roster = Roster::default();
        roster.apply_snapshot(1, vec![entry("a", 0.0, 0.0), entry("a", 9.0, 0.0)]);
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.get("a").expect("a").destination, Vec2::new(9.0, 0.0));
    }
}
