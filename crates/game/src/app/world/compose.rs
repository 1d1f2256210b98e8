use plaza_engine::{
    centered_draw_position, BackgroundLayer, Camera2D, ChatBubbleView, Drawable, SceneFrame,
    SpriteFrame, Vec2, ZoneOverlay,
};

use super::clips::{AVATAR_SHEET, ISLAND_SHEET, SHADOW_SHEET, WATER_SHEET};
use super::context::SimulationContext;
use super::model::Facing;

/// Pose of one avatar as the composer needs it.
pub(crate) struct AvatarPose<'a> {
    pub(crate) position: Vec2,
    pub(crate) frame: u16,
    pub(crate) facing: Facing,
    pub(crate) name: &'a str,
    pub(crate) chat: Option<ChatBubbleView>,
}

pub(crate) fn avatar_drawable(pose: AvatarPose<'_>, camera: &Camera2D) -> Drawable {
    let frame_size = SimulationContext::avatar_size();
    Drawable {
        depth_y: pose.position.y,
        draw_position: centered_draw_position(pose.position, camera, frame_size),
        sprite: SpriteFrame {
            sheet: AVATAR_SHEET,
            frame: pose.frame,
        },
        shadow: Some(SpriteFrame {
            sheet: SHADOW_SHEET,
            frame: 0,
        }),
        mirrored: pose.facing.is_left(),
        name: pose.name.to_string(),
        chat: pose.chat,
    }
}

/// Stable, so avatars on the same row keep their insertion order.
pub(crate) fn sort_by_depth(drawables: &mut [Drawable]) {
    drawables.sort_by(|a, b| a.depth_y.total_cmp(&b.depth_y));
}

/// Rebuilds `frame` from the current simulation state.
pub(crate) fn compose_world(context: &SimulationContext, camera: &Camera2D, frame: &mut SceneFrame) {
    frame.clear();
    let origin = camera.world_to_screen(Vec2::ZERO);
    frame.backgrounds.push(BackgroundLayer {
        sheet: WATER_SHEET,
        screen_position: origin,
    });
    frame.backgrounds.push(BackgroundLayer {
        sheet: ISLAND_SHEET,
        screen_position: origin,
    });

    let zone = &context.zone;
    frame.zone = Some(ZoneOverlay {
        screen_position: camera.world_to_screen(zone.origin),
        size: zone.size,
        ready_count: zone.occupants(),
        capacity: zone.capacity,
        countdown_seconds: zone.countdown_seconds(),
    });

    let elapsed = context.elapsed_seconds;
    let local = &context.local;
    frame.drawables.push(avatar_drawable(
        AvatarPose {
            position: local.position,
            frame: local.frame(),
            facing: local.facing,
            name: &local.name,
            chat: local.chat.view(elapsed),
        },
        camera,
    ));
    for player in context.roster.iter() {
        frame.drawables.push(avatar_drawable(
            AvatarPose {
                position: player.position,
                frame: player.frame(),
                facing: player.facing,
                name: &player.name,
                chat: player.chat.view(elapsed),
            },
            camera,
        ));
    }
    sort_by_depth(&mut frame.drawables);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drawable_at(y: f32, name: &str) -> Drawable {
        avatar_drawable(
            AvatarPose {
                position: Vec2::new(100.0, y),
                frame: 0,
                facing: Facing::Right,
                name,
                chat: None,
            },
            &Camera2D::default(),
        )
    }

    #[test]
    fn drawables_sort_by_world_y_and_keep_ties_stable() {
        let mut drawables = vec![
            drawable_at(200.0, "c"),
            drawable_at(50.0, "a"),
            drawable_at(200.0, "d"),
            drawable_at(120.0, "b"),
        ];
        sort_by_depth(&mut drawables);
        let names: Vec<&str> = drawables.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn avatar_is_centered_and_mirrored_when_facing_left() {
        let drawable = avatar_drawable(
            AvatarPose {
                position: Vec2::new(300.0, 300.0),
                frame: 9,
                facing: Facing::Left,
                name: "Ann",
                chat: None,
            },
            &Camera2D::default(),
        );
        assert_eq!(drawable.draw_position, Vec2::new(268.0, 268.0));
        assert!(drawable.mirrored);
        assert_eq!(drawable.sprite.frame, 9);
        assert_eq!(drawable.depth_y, 300.0);
    }
}
