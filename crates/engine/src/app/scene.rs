use std::ops::{Add, AddAssign, Mul, Sub};

use super::draw_list::SceneFrame;
use super::input::KeyInput;
use super::rendering::Viewport;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Top-left corner of the visible world region, in world pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Camera2D {
    pub position: Vec2,
}

impl Camera2D {
    /// Centers `target` in the viewport, kept inside `world_size` when the world is larger.
    pub fn follow(&mut self, target: Vec2, viewport: Viewport, world_size: Vec2) {
        let half_w = viewport.width as f32 * 0.5;
        let half_h = viewport.height as f32 * 0.5;
        self.position = Vec2::new(
            clamp_axis(target.x - half_w, world_size.x - viewport.width as f32),
            clamp_axis(target.y - half_h, world_size.y - viewport.height as f32),
        );
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        world - self.position
    }
}

fn clamp_axis(value: f32, max: f32) -> f32 {
    if max <= 0.0 {
        return 0.0;
    }
    value.clamp(0.0, max)
}

/// Key transitions and window signals delivered to one tick.
#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    focus_lost: bool,
    keys: Vec<KeyInput>,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(quit_requested: bool, focus_lost: bool, keys: Vec<KeyInput>) -> Self {
        Self {
            quit_requested,
            focus_lost,
            keys,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn focus_lost(&self) -> bool {
        self.focus_lost
    }

    pub fn keys(&self) -> &[KeyInput] {
        &self.keys
    }

    pub fn with_key(mut self, key: KeyInput) -> Self {
        self.keys.push(key);
        self
    }

    pub fn with_keys(mut self, keys: impl IntoIterator<Item = KeyInput>) -> Self {
        self.keys.extend(keys);
        self
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }

    pub fn with_focus_lost(mut self, focus_lost: bool) -> Self {
        self.focus_lost = focus_lost;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

pub trait Scene {
    fn load(&mut self);
    fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand;
    fn compose(&mut self, frame: &mut SceneFrame);
    fn unload(&mut self);
    fn debug_title(&self) -> Option<String> {
        None
    }
}
