use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub time_seconds: f32,
    pub frame: u16,
}

impl Keyframe {
    pub const fn new(time_seconds: f32, frame: u16) -> Self {
        Self {
            time_seconds,
            frame,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClipError {
    #[error("clip has no keyframes")]
    Empty,
    #[error("clip duration must be finite and positive, got {duration_seconds}")]
    InvalidDuration { duration_seconds: f32 },
    #[error("first keyframe must start at 0, got {time_seconds}")]
    FirstKeyframeNotAtZero { time_seconds: f32 },
    #[error("keyframe {index} goes backwards in time")]
    DecreasingOffset { index: usize },
    #[error("keyframe {index} starts after the clip ends")]
    OffsetBeyondDuration { index: usize },
}

/// Immutable time-indexed frame pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationClip {
    pub duration_seconds: f32,
    pub keyframes: &'static [Keyframe],
    pub looping: bool,
}

impl AnimationClip {
    pub const fn new(duration_seconds: f32, keyframes: &'static [Keyframe], looping: bool) -> Self {
        Self {
            duration_seconds,
            keyframes,
            looping,
        }
    }

    pub fn validate(&self) -> Result<(), ClipError> {
        if !self.duration_seconds.is_finite() || self.duration_seconds <= 0.0 {
            return Err(ClipError::InvalidDuration {
                duration_seconds: self.duration_seconds,
            });
        }
        let Some(first) = self.keyframes.first() else {
            return Err(ClipError::Empty);
        };
        if first.time_seconds != 0.0 {
            return Err(ClipError::FirstKeyframeNotAtZero {
                time_seconds: first.time_seconds,
            });
        }
        for (index, pair) in self.keyframes.windows(2).enumerate() {
            if pair[1].time_seconds < pair[0].time_seconds {
                return Err(ClipError::DecreasingOffset { index: index + 1 });
            }
        }
        for (index, keyframe) in self.keyframes.iter().enumerate() {
            if keyframe.time_seconds > self.duration_seconds {
                return Err(ClipError::OffsetBeyondDuration { index });
            }
        }
        Ok(())
    }

    /// Elapsed time after `dt`: wrapped for looping clips, clamped otherwise.
    pub fn advance(&self, elapsed_seconds: f32, dt_seconds: f32) -> f32 {
        let next = elapsed_seconds + dt_seconds.max(0.0);
        if self.duration_seconds <= 0.0 {
            return 0.0;
        }
        if self.looping {
            next.rem_euclid(self.duration_seconds)
        } else {
            next.min(self.duration_seconds)
        }
    }

    /// Frame of the last keyframe whose offset is at or before `elapsed`.
    pub fn frame_at(&self, elapsed_seconds: f32) -> u16 {
        self.keyframes
            .iter()
            .take_while(|keyframe| keyframe.time_seconds <= elapsed_seconds)
            .last()
            .or(self.keyframes.first())
            .map(|keyframe| keyframe.frame)
            .unwrap_or(0)
    }

    pub fn is_finished(&self, elapsed_seconds: f32) -> bool {
        !self.looping && elapsed_seconds >= self.duration_seconds
    }
}

/// Active clip key plus elapsed time for one entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationPlayer<K> {
    active: K,
    elapsed_seconds: f32,
}

impl<K: Copy + PartialEq> AnimationPlayer<K> {
    pub fn new(initial: K) -> Self {
        Self {
            active: initial,
            elapsed_seconds: 0.0,
        }
    }

    pub fn active(&self) -> K {
        self.active
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed_seconds
    }

    /// Switches to `key` from 0. Replaying the active clip keeps its phase.
    pub fn play(&mut self, key: K) -> bool {
        if self.active == key {
            return false;
        }
        self.active = key;
        self.elapsed_seconds = 0.0;
        true
    }

    pub fn step(&mut self, dt_seconds: f32, clip: &AnimationClip) {
        self.elapsed_seconds = clip.advance(self.elapsed_seconds, dt_seconds);
    }

    pub fn frame(&self, clip: &AnimationClip) -> u16 {
        clip.frame_at(self.elapsed_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOUR_FRAMES: [Keyframe; 4] = [
        Keyframe::new(0.0, 8),
        Keyframe::new(0.1, 9),
        Keyframe::new(0.2, 10),
        Keyframe::new(0.3, 11),
    ];
    const LOOP: AnimationClip = AnimationClip::new(0.4, &FOUR_FRAMES, true);
    const ONE_SHOT: AnimationClip = AnimationClip::new(0.4, &FOUR_FRAMES, false);

    const LATE_START: [Keyframe; 1] = [Keyframe::new(0.1, 0)];
    const BACKWARDS: [Keyframe; 2] = [Keyframe::new(0.0, 0), Keyframe::new(-0.1, 1)];

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn valid_clip_passes_validation() {
        assert_eq!(LOOP.validate(), Ok(()));
    }

    #[test]
    fn malformed_clips_are_rejected() {
        assert_eq!(
            AnimationClip::new(1.0, &[], true).validate(),
            Err(ClipError::Empty)
        );
        assert!(matches!(
            AnimationClip::new(1.0, &LATE_START, true).validate(),
            Err(ClipError::FirstKeyframeNotAtZero { .. })
        ));
        assert_eq!(
            AnimationClip::new(1.0, &BACKWARDS, true).validate(),
            Err(ClipError::DecreasingOffset { index: 1 })
        );
        assert!(matches!(
            AnimationClip::new(0.0, &FOUR_FRAMES, true).validate(),
            Err(ClipError::InvalidDuration { .. })
        ));
        assert_eq!(
            AnimationClip::new(0.25, &FOUR_FRAMES, true).validate(),
            Err(ClipError::OffsetBeyondDuration { index: 3 })
        );
    }

    #[test]
    fn frame_lookup_uses_last_keyframe_at_or_before_elapsed() {
        assert_eq!(LOOP.frame_at(0.0), 8);
        assert_eq!(LOOP.frame_at(0.15), 9);
        assert_eq!(LOOP.frame_at(0.39), 11);
    }

    #[test]
    fn looping_clip_wraps_and_one_shot_clamps() {
        assert!(approx_eq(LOOP.advance(0.35, 0.1), 0.05));
        assert!(approx_eq(ONE_SHOT.advance(0.35, 0.1), 0.4));
        assert!(ONE_SHOT.is_finished(0.4));
        assert!(!LOOP.is_finished(0.4));
    }

    #[test]
    fn play_same_key_is_no_op_and_new_key_restarts() {
        let mut player = AnimationPlayer::new("walk");
        player.step(0.25, &LOOP);
        assert!(!player.play("walk"));
        assert!(approx_eq(player.elapsed_seconds(), 0.25));
        assert_eq!(player.frame(&LOOP), 10);

        assert!(player.play("stand"));
        assert_eq!(player.active(), "stand");
        assert_eq!(player.elapsed_seconds(), 0.0);
    }
}
