//! Transient command poses (sit, cry, dance) and the single table that moves between them.

use tracing::debug;

const TRANSITION_SECONDS: f32 = 0.8;
const EMOTE_SECONDS: f32 = 1.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub(crate) enum CommandState {
    #[default]
    Idle,
    Sit,
    SitLoop,
    SitToStand,
    Cry,
    Dance,
}

impl CommandState {
    /// How long the state runs before it advances on its own. `None` means it persists.
    pub(crate) fn duration_seconds(self) -> Option<f32> {
        match self {
            CommandState::Sit | CommandState::SitToStand => Some(TRANSITION_SECONDS),
            CommandState::Cry | CommandState::Dance => Some(EMOTE_SECONDS),
            CommandState::Idle | CommandState::SitLoop => None,
        }
    }

    /// Sitting poses swallow movement input; Cry and Dance are cancelled by it instead.
    pub(crate) fn blocks_movement(self) -> bool {
        matches!(
            self,
            CommandState::Sit | CommandState::SitLoop | CommandState::SitToStand
        )
    }

    pub(crate) fn wire_name(self) -> Option<&'static str> {
        match self {
            CommandState::Idle => None,
            CommandState::Sit => Some("sit"),
            CommandState::SitLoop => Some("sitLoop"),
            CommandState::SitToStand => Some("sitToStand"),
            CommandState::Cry => Some("cry"),
            CommandState::Dance => Some("dance"),
        }
    }

    /// Unknown names fall back to `Idle` so a newer peer never breaks the roster.
    pub(crate) fn from_wire(name: Option<&str>) -> CommandState {
        match name {
            None => CommandState::Idle,
            Some("sit") => CommandState::Sit,
            Some("sitLoop") => CommandState::SitLoop,
            Some("sitToStand") => CommandState::SitToStand,
            Some("cry") => CommandState::Cry,
            Some("dance") => CommandState::Dance,
            Some(other) => {
                debug!(command = other, "unknown_remote_command");
                CommandState::Idle
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlashCommand {
    Cry,
    Dance,
    Sit,
    Stand,
}

impl SlashCommand {
    /// Recognizes a whole submitted line such as `/sit`, ignoring case and surrounding spaces.
    pub(crate) fn parse(line: &str) -> Option<SlashCommand> {
        match line.trim().to_ascii_lowercase().as_str() {
            "/cry" => Some(SlashCommand::Cry),
            "/dance" => Some(SlashCommand::Dance),
            "/sit" => Some(SlashCommand::Sit),
            "/stand" => Some(SlashCommand::Stand),
            _ => None,
        }
    }

    fn target(self) -> CommandState {
        match self {
            SlashCommand::Cry => CommandState::Cry,
            SlashCommand::Dance => CommandState::Dance,
            SlashCommand::Sit => CommandState::Sit,
            SlashCommand::Stand => CommandState::SitToStand,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommandEvent {
    Issued(SlashCommand),
    /// A movement key is held while movement is swallowed.
    MovementHeld,
    /// The avatar actually moved this tick.
    Moved,
    Expired,
}

pub(crate) fn transition(state: CommandState, event: CommandEvent) -> Option<CommandState> {
    use CommandEvent::*;
    use CommandState::*;

    match (state, event) {
        (_, Issued(command)) => Some(command.target()),
        (SitLoop, MovementHeld) => Some(SitToStand),
        (Cry | Dance, Moved) => Some(Idle),
        (Sit, Expired) => Some(SitLoop),
        (SitToStand | Cry | Dance, Expired) => Some(Idle),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct CommandMachine {
    state: CommandState,
    elapsed_seconds: f32,
}

impl CommandMachine {
    pub(crate) fn state(&self) -> CommandState {
        self.state
    }

    #[cfg(test)]
    pub(crate) fn elapsed_seconds(&self) -> f32 {
        self.elapsed_seconds
    }

    /// Applies `event` through the table. Any transition restarts the elapsed time.
    pub(crate) fn apply(&mut self, event: CommandEvent) -> bool {
        let Some(next) = transition(self.state, event) else {
            return false;
        };
        debug!(from = ?self.state, to = ?next, event = ?event, "command_transition");
        self.state = next;
        self.elapsed_seconds = 0.0;
        true
    }

    pub(crate) fn advance(&mut self, dt_seconds: f32) {
        let Some(duration) = self.state.duration_seconds() else {
            return;
        };
        self.elapsed_seconds += dt_seconds;
        if self.elapsed_seconds >= duration {
            self.apply(CommandEvent::Expired);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn run_ticks(machine: &mut CommandMachine, ticks: usize) {
        for _ in 0..ticks {
            machine.advance(DT);
        }
    }

    #[test]
    fn slash_commands_parse_case_insensitively() {
        assert_eq!(SlashCommand::parse("/SIT"), Some(SlashCommand::Sit));
        assert_eq!(SlashCommand::parse(" /Dance "), Some(SlashCommand::Dance));
        assert_eq!(SlashCommand::parse("/stand"), Some(SlashCommand::Stand));
        assert_eq!(SlashCommand::parse("/cry now"), None);
        assert_eq!(SlashCommand::parse("hello"), None);
    }

    #[test]
    fn issued_command_replaces_any_state() {
        for state in [
            CommandState::Idle,
            CommandState::SitLoop,
            CommandState::Cry,
            CommandState::SitToStand,
        ] {
            assert_eq!(
                transition(state, CommandEvent::Issued(SlashCommand::Dance)),
                Some(CommandState::Dance)
            );
        }
    }

    #[test]
    fn sit_settles_into_loop_after_800ms() {
        let mut machine = CommandMachine::default();
        machine.apply(CommandEvent::Issued(SlashCommand::Sit));
        run_ticks(&mut machine, 47);
        assert_eq!(machine.state(), CommandState::Sit);
        run_ticks(&mut machine, 3);
        assert_eq!(machine.state(), CommandState::SitLoop);
        assert_eq!(machine.elapsed_seconds(), 0.0);
    }

    #[test]
    fn sit_loop_only_leaves_through_movement() {
        let mut machine = CommandMachine::default();
        machine.apply(CommandEvent::Issued(SlashCommand::Sit));
        run_ticks(&mut machine, 60 * 10);
        assert_eq!(machine.state(), CommandState::SitLoop);
        assert!(!machine.apply(CommandEvent::Moved));
        assert!(machine.apply(CommandEvent::MovementHeld));
        assert_eq!(machine.state(), CommandState::SitToStand);
        run_ticks(&mut machine, 50);
        assert_eq!(machine.state(), CommandState::Idle);
    }

    #[test]
    fn emotes_cancel_on_movement_and_expire_on_their_own() {
        let mut machine = CommandMachine::default();
        machine.apply(CommandEvent::Issued(SlashCommand::Cry));
        assert!(machine.apply(CommandEvent::Moved));
        assert_eq!(machine.state(), CommandState::Idle);

        machine.apply(CommandEvent::Issued(SlashCommand::Dance));
        run_ticks(&mut machine, 95);
        assert_eq!(machine.state(), CommandState::Dance);
        run_ticks(&mut machine, 2);
        assert_eq!(machine.state(), CommandState::Idle);
    }

    #[test]
    fn idle_ignores_movement_and_expiry() {
        let mut machine = CommandMachine::default();
        assert!(!machine.apply(CommandEvent::Moved));
        assert!(!machine.apply(CommandEvent::MovementHeld));
        run_ticks(&mut machine, 200);
        assert_eq!(machine.state(), CommandState::Idle);
        assert_eq!(machine.elapsed_seconds(), 0.0);
    }

    #[test]
    fn wire_names_map_both_ways() {
        for state in [
            CommandState::Idle,
            CommandState::Sit,
            CommandState::SitLoop,
            CommandState::SitToStand,
            CommandState::Cry,
            CommandState::Dance,
        ] {
            assert_eq!(CommandState::from_wire(state.wire_name()), state);
        }
        assert_eq!(CommandState::from_wire(Some("wave")), CommandState::Idle);
    }
}
