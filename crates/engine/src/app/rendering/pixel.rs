//! Clipped RGBA8 primitives over a row-major frame buffer.

pub(crate) struct LoadedSprite {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) rgba: Vec<u8>,
}

impl LoadedSprite {
    fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let bytes = self.rgba.get(offset..offset + 4)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

/// Source region of a sheet image plus its destination.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameBlit {
    pub(crate) src_x: u32,
    pub(crate) src_y: u32,
    pub(crate) frame_width: u32,
    pub(crate) frame_height: u32,
    pub(crate) left: i32,
    pub(crate) top: i32,
    pub(crate) mirrored: bool,
}

/// Destination column for source column `src_col` of a frame drawn at `left`.
/// Mirroring flips about the frame's own center, derived from `left` every call.
pub(crate) fn destination_column(left: i32, frame_width: u32, src_col: u32, mirrored: bool) -> i32 {
    if mirrored {
        left + frame_width as i32 - 1 - src_col as i32
    } else {
        left + src_col as i32
    }
}

pub(crate) fn write_pixel_rgba_clipped(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    color: [u8; 4],
) {
    if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
        return;
    }
    let Some(pixel_offset) = (y as usize)
        .checked_mul(width as usize)
        .and_then(|row| row.checked_add(x as usize))
    else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(dst) = frame.get_mut(byte_offset..byte_offset + 4) else {
        return;
    };
    match color[3] {
        0 => {}
        255 => dst.copy_from_slice(&color),
        alpha => {
            let alpha = u16::from(alpha);
            for channel in 0..3 {
                let src = u16::from(color[channel]);
                let old = u16::from(dst[channel]);
                dst[channel] = ((src * alpha + old * (255 - alpha)) / 255) as u8;
            }
            dst[3] = 255;
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn fill_rect_clipped(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    color: [u8; 4],
) {
    let start_x = x.max(0);
    let start_y = y.max(0);
    let end_x = x.saturating_add(rect_width).min(width as i32);
    let end_y = y.saturating_add(rect_height).min(height as i32);
    for py in start_y..end_y {
        for px in start_x..end_x {
            write_pixel_rgba_clipped(frame, width, height, px, py, color);
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn rect_outline_clipped(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    rect_width: i32,
    rect_height: i32,
    thickness: i32,
    color: [u8; 4],
) {
    if rect_width <= 0 || rect_height <= 0 || thickness <= 0 {
        return;
    }
    let t = thickness.min(rect_width).min(rect_height);
    fill_rect_clipped(frame, width, height, x, y, rect_width, t, color);
    fill_rect_clipped(frame, width, height, x, y + rect_height - t, rect_width, t, color);
    fill_rect_clipped(frame, width, height, x, y + t, t, rect_height - 2 * t, color);
    fill_rect_clipped(
        frame,
        width,
        height,
        x + rect_width - t,
        y + t,
        t,
        rect_height - 2 * t,
        color,
    );
}

pub(crate) fn blit_frame(
    frame: &mut [u8],
    width: u32,
    height: u32,
    sprite: &LoadedSprite,
    blit: FrameBlit,
) {
    for sy in 0..blit.frame_height {
        let dst_y = blit.top + sy as i32;
        if dst_y < 0 || dst_y >= height as i32 {
            continue;
        }
        for sx in 0..blit.frame_width {
            let Some(color) = sprite.pixel(blit.src_x + sx, blit.src_y + sy) else {
                continue;
            };
            let dst_x = destination_column(blit.left, blit.frame_width, sx, blit.mirrored);
            write_pixel_rgba_clipped(frame, width, height, dst_x, dst_y, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(frame: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * width + x) * 4) as usize;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    // 2x1 sprite: red on the left, green on the right.
    fn two_pixel_sprite() -> LoadedSprite {
        LoadedSprite {
            width: 2,
            height: 1,
            rgba: vec![255, 0, 0, 255, 0, 255, 0, 255],
        }
    }

    fn blit_at(left: i32, mirrored: bool) -> FrameBlit {
        FrameBlit {
            src_x: 0,
            src_y: 0,
            frame_width: 2,
            frame_height: 1,
            left,
            top: 0,
            mirrored,
        }
    }

    #[test]
    fn mirrored_columns_flip_about_frame_center() {
        assert_eq!(destination_column(10, 64, 0, true), 73);
        assert_eq!(destination_column(10, 64, 63, true), 10);
        assert_eq!(destination_column(10, 64, 5, false), 15);
    }

    #[test]
    fn mirroring_follows_the_current_draw_position() {
        let sprite = two_pixel_sprite();
        let mut frame = vec![0u8; 6 * 4];
        blit_frame(&mut frame, 6, 1, &sprite, blit_at(0, true));
        assert_eq!(read(&frame, 6, 0, 0), [0, 255, 0, 255]);
        assert_eq!(read(&frame, 6, 1, 0), [255, 0, 0, 255]);

        let mut moved = vec![0u8; 6 * 4];
        blit_frame(&mut moved, 6, 1, &sprite, blit_at(3, true));
        assert_eq!(read(&moved, 6, 3, 0), [0, 255, 0, 255]);
        assert_eq!(read(&moved, 6, 4, 0), [255, 0, 0, 255]);
        assert_eq!(read(&moved, 6, 0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn blit_clips_partially_offscreen_frames() {
        let sprite = two_pixel_sprite();
        let mut frame = vec![0u8; 2 * 4];
        blit_frame(&mut frame, 2, 1, &sprite, blit_at(-1, false));
        assert_eq!(read(&frame, 2, 0, 0), [0, 255, 0, 255]);
        assert_eq!(read(&frame, 2, 1, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn translucent_color_blends_over_existing_pixel() {
        let mut frame = vec![0, 0, 0, 255];
        write_pixel_rgba_clipped(&mut frame, 1, 1, 0, 0, [255, 255, 255, 51]);
        assert_eq!(read(&frame, 1, 0, 0), [51, 51, 51, 255]);
    }

    #[test]
    fn outline_leaves_interior_untouched() {
        let mut frame = vec![0u8; 5 * 5 * 4];
        rect_outline_clipped(&mut frame, 5, 5, 0, 0, 5, 5, 1, [9, 9, 9, 255]);
        assert_eq!(read(&frame, 5, 0, 0), [9, 9, 9, 255]);
        assert_eq!(read(&frame, 5, 4, 2), [9, 9, 9, 255]);
        assert_eq!(read(&frame, 5, 2, 2), [0, 0, 0, 0]);
    }

    #[test]
    fn fill_rect_outside_frame_is_safe() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        fill_rect_clipped(&mut frame, 4, 4, -10, -10, 5, 5, [1, 1, 1, 255]);
        fill_rect_clipped(&mut frame, 4, 4, 3, 3, i32::MAX, i32::MAX, [1, 1, 1, 255]);
        assert_eq!(read(&frame, 4, 3, 3), [1, 1, 1, 255]);
        assert_eq!(read(&frame, 4, 0, 0), [0, 0, 0, 0]);
    }
}
