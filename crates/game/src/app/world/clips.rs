use plaza_engine::{AnimationClip, Keyframe, SpriteSheet};

use super::command::CommandState;
use super::model::Facing;

pub(crate) const AVATAR_SHEET: SpriteSheet = SpriteSheet {
    key: "avatar",
    frame_width: 64,
    frame_height: 64,
    columns: 7,
    rows: 11,
};
pub(crate) const SHADOW_SHEET: SpriteSheet = SpriteSheet::single("avatar_shadow", 64, 64);
pub(crate) const WATER_SHEET: SpriteSheet = SpriteSheet::single("world/water", 720, 480);
pub(crate) const ISLAND_SHEET: SpriteSheet = SpriteSheet::single("world/island", 720, 480);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ClipId {
    StandRight,
    StandLeft,
    WalkRight,
    WalkLeft,
    Sit,
    SitLoop,
    SitToStand,
    Cry,
    Dance,
}

impl ClipId {
    #[cfg(test)]
    pub(crate) const ALL: [ClipId; 9] = [
        ClipId::StandRight,
        ClipId::StandLeft,
        ClipId::WalkRight,
        ClipId::WalkLeft,
        ClipId::Sit,
        ClipId::SitLoop,
        ClipId::SitToStand,
        ClipId::Cry,
        ClipId::Dance,
    ];

    pub(crate) fn clip(self) -> &'static AnimationClip {
        match self {
            // Left variants reuse the right-facing frames; mirroring happens at draw time.
            ClipId::StandRight | ClipId::StandLeft => &STAND,
            ClipId::WalkRight | ClipId::WalkLeft => &WALK,
            ClipId::Sit => &SIT,
            ClipId::SitLoop => &SIT_LOOP,
            ClipId::SitToStand => &SIT_TO_STAND,
            ClipId::Cry => &CRY,
            ClipId::Dance => &DANCE,
        }
    }

    #[cfg(test)]
    pub(crate) fn name(self) -> &'static str {
        match self {
            ClipId::StandRight => "standRight",
            ClipId::StandLeft => "standLeft",
            ClipId::WalkRight => "walkRight",
            ClipId::WalkLeft => "walkLeft",
            ClipId::Sit => "sit",
            ClipId::SitLoop => "sitLoop",
            ClipId::SitToStand => "sitToStand",
            ClipId::Cry => "cry",
            ClipId::Dance => "dance",
        }
    }
}

/// Clip for an avatar given its command, whether it moved this tick, and facing.
pub(crate) fn select_clip(command: CommandState, moving: bool, facing: Facing) -> ClipId {
    match command {
        CommandState::Sit => ClipId::Sit,
        CommandState::SitLoop => ClipId::SitLoop,
        CommandState::SitToStand => ClipId::SitToStand,
        CommandState::Cry => ClipId::Cry,
        CommandState::Dance => ClipId::Dance,
        CommandState::Idle => match (moving, facing) {
            (true, Facing::Right) => ClipId::WalkRight,
            (true, Facing::Left) => ClipId::WalkLeft,
            (false, Facing::Right) => ClipId::StandRight,
            (false, Facing::Left) => ClipId::StandLeft,
        },
    }
}

const STAND_FRAMES: [Keyframe; 8] = [
    Keyframe::new(0.0, 0),
    Keyframe::new(0.2, 1),
    Keyframe::new(0.4, 2),
    Keyframe::new(0.6, 3),
    Keyframe::new(0.8, 4),
    Keyframe::new(1.0, 5),
    Keyframe::new(1.2, 6),
    Keyframe::new(1.4, 7),
];
const WALK_FRAMES: [Keyframe; 4] = [
    Keyframe::new(0.0, 8),
    Keyframe::new(0.1, 9),
    Keyframe::new(0.2, 10),
    Keyframe::new(0.3, 11),
];
const SIT_FRAMES: [Keyframe; 4] = [
    Keyframe::new(0.0, 14),
    Keyframe::new(0.2, 15),
    Keyframe::new(0.4, 16),
    Keyframe::new(0.6, 17),
];
const SIT_LOOP_FRAMES: [Keyframe; 4] = [
    Keyframe::new(0.0, 18),
    Keyframe::new(0.2, 19),
    Keyframe::new(0.4, 20),
    Keyframe::new(0.6, 21),
];
const SIT_TO_STAND_FRAMES: [Keyframe; 4] = [
    Keyframe::new(0.0, 17),
    Keyframe::new(0.2, 16),
    Keyframe::new(0.4, 15),
    Keyframe::new(0.6, 14),
];
const CRY_FRAMES: [Keyframe; 8] = [
    Keyframe::new(0.0, 28),
    Keyframe::new(0.2, 29),
    Keyframe::new(0.4, 30),
    Keyframe::new(0.6, 31),
    Keyframe::new(0.8, 32),
    Keyframe::new(1.0, 33),
    Keyframe::new(1.2, 34),
    Keyframe::new(1.4, 35),
];
const DANCE_FRAMES: [Keyframe; 8] = [
    Keyframe::new(0.0, 42),
    Keyframe::new(0.2, 43),
    Keyframe::new(0.4, 44),
    Keyframe::new(0.6, 45),
    Keyframe::new(0.8, 46),
    Keyframe::new(1.0, 47),
    Keyframe::new(1.2, 48),
    Keyframe::new(1.4, 49),
];

const STAND: AnimationClip = AnimationClip::new(1.6, &STAND_FRAMES, true);
const WALK: AnimationClip = AnimationClip::new(0.4, &WALK_FRAMES, true);
const SIT: AnimationClip = AnimationClip::new(0.8, &SIT_FRAMES, false);
const SIT_LOOP: AnimationClip = AnimationClip::new(0.8, &SIT_LOOP_FRAMES, true);
const SIT_TO_STAND: AnimationClip = AnimationClip::new(0.8, &SIT_TO_STAND_FRAMES, false);
const CRY: AnimationClip = AnimationClip::new(1.6, &CRY_FRAMES, false);
const DANCE: AnimationClip = AnimationClip::new(1.6, &DANCE_FRAMES, false);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_clip_is_valid_and_fits_the_avatar_sheet() {
        for id in ClipId::ALL {
            let clip = id.clip();
            assert_eq!(clip.validate(), Ok(()), "clip={}", id.name());
            for keyframe in clip.keyframes {
                assert!(
                    AVATAR_SHEET.frame_origin(keyframe.frame).is_some(),
                    "clip={} frame={}",
                    id.name(),
                    keyframe.frame
                );
            }
        }
    }

    #[test]
    fn command_clip_durations_match_command_timing() {
        for state in [
            CommandState::Sit,
            CommandState::SitToStand,
            CommandState::Cry,
            CommandState::Dance,
        ] {
            let clip = select_clip(state, false, Facing::Right).clip();
            assert_eq!(Some(clip.duration_seconds), state.duration_seconds());
            assert!(!clip.looping);
        }
        assert!(select_clip(CommandState::SitLoop, false, Facing::Left).clip().looping);
    }

    #[test]
    fn idle_clip_follows_motion_and_facing() {
        assert_eq!(select_clip(CommandState::Idle, true, Facing::Right), ClipId::WalkRight);
        assert_eq!(select_clip(CommandState::Idle, true, Facing::Left), ClipId::WalkLeft);
        assert_eq!(select_clip(CommandState::Idle, false, Facing::Left), ClipId::StandLeft);
        assert_eq!(select_clip(CommandState::Cry, true, Facing::Left), ClipId::Cry);
    }

    #[test]
    fn stand_frames_step_every_200ms() {
        let clip = ClipId::StandRight.clip();
        assert_eq!(clip.frame_at(0.0), 0);
        assert_eq!(clip.frame_at(0.25), 1);
        assert_eq!(clip.frame_at(1.59), 7);
    }
}
