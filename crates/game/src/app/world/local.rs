use plaza_engine::{AnimationPlayer, Direction, Vec2};

use super::chat::ChatBubble;
use super::clips::{select_clip, ClipId};
use super::command::{CommandEvent, CommandMachine, CommandState, SlashCommand};
use super::model::Facing;

pub(crate) const SPEED_PX_PER_TICK: f32 = 2.0;

/// The avatar driven by this client's keyboard.
#[derive(Debug, Clone)]
pub(crate) struct LocalPlayer {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) position: Vec2,
    pub(crate) facing: Facing,
    pub(crate) chat: ChatBubble,
    command: CommandMachine,
    animation: AnimationPlayer<ClipId>,
    moving: bool,
}

impl LocalPlayer {
    pub(crate) fn new(id: String, name: String, position: Vec2) -> Self {
        Self {
            id,
            name,
            position,
            facing: Facing::Right,
            chat: ChatBubble::default(),
            command: CommandMachine::default(),
            animation: AnimationPlayer::new(ClipId::StandRight),
            moving: false,
        }
    }

    pub(crate) fn command_state(&self) -> CommandState {
        self.command.state()
    }

    #[cfg(test)]
    pub(crate) fn command_elapsed_seconds(&self) -> f32 {
        self.command.elapsed_seconds()
    }

    #[cfg(test)]
    pub(crate) fn clip(&self) -> ClipId {
        self.animation.active()
    }

    pub(crate) fn frame(&self) -> u16 {
        self.animation.frame(self.animation.active().clip())
    }

    pub(crate) fn issue(&mut self, command: SlashCommand) {
        self.command.apply(CommandEvent::Issued(command));
        self.sync_clip();
    }

    /// One simulation tick. Movement is per tick; `dt_seconds` only drives timers.
    pub(crate) fn step(&mut self, held: &[Direction], typing: bool, dt_seconds: f32) {
        let mut movement = Vec2::ZERO;
        if !typing {
            let state = self.command.state();
            if state == CommandState::SitLoop && !held.is_empty() {
                self.command.apply(CommandEvent::MovementHeld);
            } else if !state.blocks_movement() {
                movement = movement_vector(held, SPEED_PX_PER_TICK);
            }
        }

        self.moving = !movement.is_zero();
        if self.moving {
            self.command.apply(CommandEvent::Moved);
            self.position += movement;
            if movement.x < 0.0 {
                self.facing = Facing::Left;
            } else if movement.x > 0.0 {
                self.facing = Facing::Right;
            }
        }

        self.command.advance(dt_seconds);
        self.sync_clip();
        self.animation.step(dt_seconds, self.animation.active().clip());
        self.chat.step(dt_seconds);
    }

    fn sync_clip(&mut self) {
        self.animation
            .play(select_clip(self.command.state(), self.moving, self.facing));
    }
}

/// Sum of held directions scaled to `speed`; diagonals keep the axial magnitude.
pub(crate) fn movement_vector(held: &[Direction], speed: f32) -> Vec2 {
    let mut movement = Vec2::ZERO;
    for direction in held {
        match direction {
            Direction::Up => movement.y -= speed,
            Direction::Down => movement.y += speed,
            Direction::Left => movement.x -= speed,
            Direction::Right => movement.x += speed,
        }
    }
    if movement.x != 0.0 && movement.y != 0.0 {
        movement = movement * std::f32::consts::FRAC_1_SQRT_2;
    }
    movement
}
