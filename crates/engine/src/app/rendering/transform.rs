use crate::app::{Camera2D, Vec2};

/// Size of the software frame buffer in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Top-left screen position of a frame of `frame_size` centered on `world`.
pub fn centered_draw_position(world: Vec2, camera: &Camera2D, frame_size: Vec2) -> Vec2 {
    let screen = camera.world_to_screen(world);
    Vec2::new(screen.x - frame_size.x * 0.5, screen.y - frame_size.y * 0.5)
}

pub(crate) fn snap_to_pixel(position: Vec2) -> (i32, i32) {
    (position.x.round() as i32, position.y.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_is_centered_on_world_position() {
        let camera = Camera2D::default();
        let draw = centered_draw_position(Vec2::new(300.0, 300.0), &camera, Vec2::new(64.0, 64.0));
        assert_eq!(draw, Vec2::new(268.0, 268.0));
    }

    #[test]
    fn camera_offset_shifts_draw_position() {
        let camera = Camera2D {
            position: Vec2::new(10.0, -5.0),
        };
        let draw = centered_draw_position(Vec2::new(42.0, 27.0), &camera, Vec2::new(8.0, 4.0));
        assert_eq!(draw, Vec2::new(28.0, 30.0));
    }

    #[test]
    fn snapping_rounds_half_away_from_zero() {
        assert_eq!(snap_to_pixel(Vec2::new(1.5, -1.5)), (2, -2));
        assert_eq!(snap_to_pixel(Vec2::new(2.4, 0.49)), (2, 0));
    }
}
