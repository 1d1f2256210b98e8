mod animation;
mod draw_list;
mod frame_clock;
mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

pub use animation::{AnimationClip, AnimationPlayer, ClipError, Keyframe};
pub use draw_list::{BackgroundLayer, ChatBubbleView, Drawable, SceneFrame, SpriteFrame, ZoneOverlay};
pub use frame_clock::{FrameClock, StepPlan};
pub use input::{Direction, InputLatch, KeyInput, KeyState};
pub use loop_runner::{run_app, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{centered_draw_position, Renderer, Viewport};
pub use scene::{Camera2D, InputSnapshot, Scene, SceneCommand, Vec2};
