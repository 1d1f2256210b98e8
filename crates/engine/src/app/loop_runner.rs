use std::env;
use std::mem;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{debug, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use super::draw_list::SceneFrame;
use super::frame_clock::{normalize_non_zero_duration, FrameClock};
use super::input::KeyInput;
use super::metrics::MetricsAccumulator;
use super::{InputSnapshot, Renderer, Scene, SceneCommand, Viewport};

pub const SLOW_FRAME_ENV_VAR: &str = "PLAZA_SLOW_FRAME_MS";

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub simulated_slow_frame_ms: u64,
    /// Upper bound on presented frames per second. `None` or zero renders uncapped.
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Plaza".to_string(),
            window_width: 1080,
            window_height: 720,
            canvas_width: 720,
            canvas_height: 480,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            simulated_slow_frame_ms: 0,
            max_render_fps: None,
        }
    }
}

impl LoopConfig {
    pub fn canvas(&self) -> Viewport {
        Viewport {
            width: self.canvas_width.max(1),
            height: self.canvas_height.max(1),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Runs `scene` until the window closes or the scene asks to quit.
/// Ticks run at a fixed rate, followed by one render per frame.
pub fn run_app(
    config: LoopConfig,
    asset_root: PathBuf,
    mut scene: Box<dyn Scene>,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .with_min_inner_size(LogicalSize::new(
                config.canvas_width.max(1) as f64 / 2.0,
                config.canvas_height.max(1) as f64 / 2.0,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let window_for_loop = Arc::clone(&window);
    let mut renderer =
        Renderer::new(window, asset_root, config.canvas()).map_err(AppError::CreateRenderer)?;

    let mut clock = FrameClock::new(
        config.target_tps,
        config.max_frame_delta,
        config.max_ticks_per_frame,
    );
    let fixed_dt_seconds = clock.fixed_dt_seconds();
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let slow_frame_delay = resolve_slow_frame_delay(config.simulated_slow_frame_ms);
    let render_budget = render_frame_budget(config.max_render_fps);
    info!(
        target_tps = config.target_tps.max(1),
        max_frame_delta_ms = config.max_frame_delta.as_millis() as u64,
        max_ticks_per_frame = clock.max_ticks_per_frame(),
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        slow_frame_delay_ms = slow_frame_delay.as_millis() as u64,
        render_budget_us = render_budget.map_or(0, |budget| budget.as_micros() as u64),
        canvas_width = renderer.viewport().width,
        canvas_height = renderer.viewport().height,
        "loop_config"
    );

    scene.load();
    let mut input_collector = InputCollector::default();
    let mut scene_frame = SceneFrame::default();
    let started_at = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval, started_at);
    let mut last_present_instant = started_at;
    let mut last_applied_title: Option<String> = None;
    clock.start(started_at);
    event_loop.set_control_flow(ControlFlow::Poll);

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window_for_loop.id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        input_collector.mark_quit_requested();
                        info!(reason = "window_close", "shutdown_requested");
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::Focused(false) => {
                        input_collector.mark_focus_lost();
                    }
                    WindowEvent::Occluded(occluded) => {
                        let changed = if occluded {
                            clock.stop()
                        } else {
                            let now = Instant::now();
                            metrics_accumulator.reset(now);
                            clock.start(now)
                        };
                        if changed {
                            debug!(running = clock.is_running(), "frame_clock_toggled");
                            window_target.set_control_flow(if clock.is_running() {
                                ControlFlow::Poll
                            } else {
                                ControlFlow::Wait
                            });
                        }
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        input_collector.handle_keyboard_input(&event);
                    }
                    WindowEvent::RedrawRequested => {
                        if slow_frame_delay > Duration::ZERO {
                            // Explicit debug perturbation only; this is not the FPS cap.
                            thread::sleep(slow_frame_delay);
                        }
                        let now = Instant::now();
                        let step_plan = clock.advance(now);
                        for _ in 0..step_plan.ticks_to_run {
                            let input_snapshot = input_collector.snapshot_for_tick();
                            metrics_accumulator.record_tick();
                            if scene.update(fixed_dt_seconds, &input_snapshot) == SceneCommand::Quit
                            {
                                info!(reason = "scene_quit", "shutdown_requested");
                                clock.stop();
                                window_target.exit();
                                break;
                            }
                        }
                        if step_plan.backlog_dropped() {
                            metrics_accumulator.record_clamp();
                            warn!(
                                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                                max_ticks_per_frame = clock.max_ticks_per_frame(),
                                "sim_clamp_triggered"
                            );
                        }

                        let since_present =
                            Instant::now().saturating_duration_since(last_present_instant);
                        let pause = pacing_sleep(since_present, render_budget);
                        if !pause.is_zero() {
                            thread::sleep(pause);
                        }

                        scene_frame.clear();
                        scene.compose(&mut scene_frame);
                        if let Err(error) = renderer.render_frame(&scene_frame) {
                            warn!(error = %error, "renderer_draw_failed");
                            window_target.exit();
                        }
                        last_present_instant = Instant::now();

                        let next_title = scene.debug_title();
                        if next_title != last_applied_title {
                            window_for_loop
                                .set_title(next_title.as_deref().unwrap_or(&config.window_title));
                            last_applied_title = next_title;
                        }

                        metrics_accumulator.record_frame(step_plan.raw_frame_dt);
                        if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                            info!(
                                fps = snapshot.fps,
                                tps = snapshot.tps,
                                frame_time_ms = snapshot.frame_time_ms,
                                clamped_frames = snapshot.clamped_frames,
                                "loop_metrics"
                            );
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                if clock.is_running() {
                    renderer.request_redraw();
                }
            }
            Event::LoopExiting => {
                scene.unload();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Buffers key transitions between ticks; each buffered event reaches exactly one tick.
#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    focus_lost: bool,
    pending_keys: Vec<KeyInput>,
}

impl InputCollector {
    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn mark_focus_lost(&mut self) {
        self.focus_lost = true;
    }

    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        self.push_key(KeyInput::from_key_event(key_event));
    }

    fn push_key(&mut self, key: KeyInput) {
        self.pending_keys.push(key);
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        InputSnapshot::new(
            self.quit_requested,
            mem::take(&mut self.focus_lost),
            mem::take(&mut self.pending_keys),
        )
    }
}

fn render_frame_budget(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps
        .filter(|fps| *fps > 0)
        .map(|fps| Duration::from_secs(1) / fps)
}

/// Time left in this frame's budget since the previous present.
fn pacing_sleep(since_present: Duration, budget: Option<Duration>) -> Duration {
    budget.map_or(Duration::ZERO, |budget| budget.saturating_sub(since_present))
}

fn resolve_slow_frame_delay(config_slow_frame_ms: u64) -> Duration {
    match env::var(SLOW_FRAME_ENV_VAR) {
        Ok(value) => match value.parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                warn!(
                    env_var = SLOW_FRAME_ENV_VAR,
                    value = value.as_str(),
                    "invalid slow-frame env var value; falling back to config"
                );
                Duration::from_millis(config_slow_frame_ms)
            }
        },
        Err(env::VarError::NotPresent) => Duration::from_millis(config_slow_frame_ms),
        Err(err) => {
            warn!(
                env_var = SLOW_FRAME_ENV_VAR,
                error = %err,
                "unable to read slow-frame env var; falling back to config"
            );
            Duration::from_millis(config_slow_frame_ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use winit::keyboard::KeyCode;

    use super::*;

    #[test]
    fn buffered_keys_reach_exactly_one_tick() {
        let mut input = InputCollector::default();
        input.push_key(KeyInput::pressed(KeyCode::Enter));
        input.push_key(KeyInput::typed(KeyCode::KeyH, "h"));
        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();
        assert_eq!(first.keys().len(), 2);
        assert!(first.keys()[0].is_key(KeyCode::Enter));
        assert!(second.keys().is_empty());
    }

    #[test]
    fn focus_loss_is_edge_triggered_and_quit_is_sticky() {
        let mut input = InputCollector::default();
        input.mark_focus_lost();
        input.mark_quit_requested();
        let first = input.snapshot_for_tick();
        let second = input.snapshot_for_tick();
        assert!(first.focus_lost());
        assert!(!second.focus_lost());
        assert!(first.quit_requested());
        assert!(second.quit_requested());
    }

    #[test]
    fn default_config_matches_canvas_and_tick_rate() {
        let config = LoopConfig::default();
        assert_eq!(
            config.canvas(),
            Viewport {
                width: 720,
                height: 480
            }
        );
        assert_eq!(config.target_tps, 60);
        assert_eq!(config.max_ticks_per_frame, 5);
    }

    #[test]
    fn zero_or_missing_cap_renders_uncapped() {
        assert_eq!(render_frame_budget(None), None);
        assert_eq!(render_frame_budget(Some(0)), None);
        assert_eq!(pacing_sleep(Duration::ZERO, None), Duration::ZERO);
    }

    #[test]
    fn capped_frames_sleep_off_the_rest_of_the_budget() {
        let budget = render_frame_budget(Some(50));
        assert_eq!(budget, Some(Duration::from_millis(20)));
        assert_eq!(
            pacing_sleep(Duration::from_millis(5), budget),
            Duration::from_millis(15)
        );
        assert_eq!(pacing_sleep(Duration::from_millis(30), budget), Duration::ZERO);
    }
}
