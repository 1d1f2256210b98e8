use std::time::{Duration, Instant};

/// Outcome of one render callback: how many fixed ticks to run and what was thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    pub ticks_to_run: u32,
    pub dropped_backlog: Duration,
    pub raw_frame_dt: Duration,
    pub frame_clamped: bool,
}

impl StepPlan {
    const IDLE: StepPlan = StepPlan {
        ticks_to_run: 0,
        dropped_backlog: Duration::ZERO,
        raw_frame_dt: Duration::ZERO,
        frame_clamped: false,
    };

    pub fn backlog_dropped(&self) -> bool {
        self.dropped_backlog > Duration::ZERO
    }
}

/// Fixed-timestep accumulator fed by variable-rate render callbacks.
///
/// The clock is stopped until `start` is called. While stopped, `advance`
/// emits no ticks and the wall time that passes is never replayed.
#[derive(Debug, Clone)]
pub struct FrameClock {
    fixed_dt: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    accumulator: Duration,
    last_frame_instant: Option<Instant>,
}

impl FrameClock {
    pub fn new(target_tps: u32, max_frame_delta: Duration, max_ticks_per_frame: u32) -> Self {
        let target_tps = target_tps.max(1);
        Self {
            fixed_dt: Duration::from_secs_f64(1.0 / target_tps as f64),
            max_frame_delta: normalize_non_zero_duration(
                max_frame_delta,
                Duration::from_millis(250),
            ),
            max_ticks_per_frame: max_ticks_per_frame.max(1),
            accumulator: Duration::ZERO,
            last_frame_instant: None,
        }
    }

    pub fn fixed_dt(&self) -> Duration {
        self.fixed_dt
    }

    pub fn fixed_dt_seconds(&self) -> f32 {
        self.fixed_dt.as_secs_f32()
    }

    pub fn max_ticks_per_frame(&self) -> u32 {
        self.max_ticks_per_frame
    }

    pub fn is_running(&self) -> bool {
        self.last_frame_instant.is_some()
    }

    /// Arms the clock at `now`. Returns false when it was already running.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.is_running() {
            return false;
        }
        self.last_frame_instant = Some(now);
        self.accumulator = Duration::ZERO;
        true
    }

    /// Disarms the clock. Returns false when it was already stopped.
    pub fn stop(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.last_frame_instant = None;
        self.accumulator = Duration::ZERO;
        true
    }

    pub fn advance(&mut self, now: Instant) -> StepPlan {
        let Some(last_frame_instant) = self.last_frame_instant else {
            return StepPlan::IDLE;
        };
        let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
        self.last_frame_instant = Some(now);

        let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, self.max_frame_delta);
        self.accumulator = self.accumulator.saturating_add(clamped_frame_dt);
        let steps = plan_sim_steps(self.accumulator, self.fixed_dt, self.max_ticks_per_frame);
        self.accumulator = steps.remaining_accumulator;

        StepPlan {
            ticks_to_run: steps.ticks_to_run,
            dropped_backlog: steps.dropped_backlog,
            raw_frame_dt,
            frame_clamped: clamped_frame_dt < raw_frame_dt,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SimSteps {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(mut accumulator: Duration, fixed_dt: Duration, max_ticks_per_frame: u32) -> SimSteps {
    let mut ticks_to_run = 0u32;
    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    // Whatever still covers a full tick after the cap is backlog, not carry.
    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::take(&mut accumulator)
    } else {
        Duration::ZERO
    };

    SimSteps {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

pub(crate) fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
