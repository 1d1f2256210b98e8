use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture, TextureError};
use tracing::warn;
use winit::window::Window;

use crate::app::draw_list::{ChatBubbleView, Drawable, SceneFrame, SpriteFrame, ZoneOverlay};
use crate::sprite_sheet::validate_sprite_key;

use super::pixel::{blit_frame, fill_rect_clipped, rect_outline_clipped, FrameBlit, LoadedSprite};
use super::text::{draw_text_clipped, draw_text_outlined, text_width_px, wrap_words, TextScale};
use super::transform::snap_to_pixel;
use super::Viewport;

const CLEAR_COLOR: [u8; 4] = [38, 94, 148, 255];
const PLACEHOLDER_COLOR: [u8; 4] = [220, 220, 240, 255];
const TEXT_WHITE: [u8; 4] = [255, 255, 255, 255];
const TEXT_BLACK: [u8; 4] = [0, 0, 0, 255];
const ZONE_FILL_COLOR: [u8; 4] = [100, 150, 255, 128];
const ZONE_STROKE_COLOR: [u8; 4] = [0x4A, 0x90, 0xE2, 255];
const ZONE_STROKE_PX: i32 = 4;
const ZONE_TIMER_COLOR: [u8; 4] = [0xFF, 0xDD, 0x55, 255];
const HUD_GREEN: [u8; 4] = [0x6E, 0xE7, 0xB7, 255];
const HUD_AMBER: [u8; 4] = [0xFB, 0xBF, 0x24, 255];
const HUD_RED: [u8; 4] = [0xF8, 0x71, 0x71, 255];
const HUD_MARGIN_PX: i32 = 10;
const HUD_TIMER_GAP_PX: i32 = 30;

const NAME_SCALE: TextScale = TextScale::new(1);
const NAME_BASELINE_OFFSET_PX: i32 = 8;
const BUBBLE_SCALE: TextScale = TextScale::new(2);
const BUBBLE_PADDING_X: i32 = 8;
const BUBBLE_PADDING_Y: i32 = 4;
const BUBBLE_LINE_HEIGHT: i32 = 12;
const BUBBLE_OVERLAP_PX: i32 = 3;
const READY_SCALE: TextScale = TextScale::new(3);
const TIMER_SCALE: TextScale = TextScale::new(4);

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    asset_root: PathBuf,
    sprite_cache: HashMap<String, Option<LoadedSprite>>,
    warned_sprite_keys: HashSet<String>,
}

impl Renderer {
    /// The frame buffer stays at `canvas` size; the surface follows the window.
    pub fn new(window: Arc<Window>, asset_root: PathBuf, canvas: Viewport) -> Result<Self, Error> {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width, size.height, Arc::clone(&window));
        let pixels = Pixels::new(canvas.width, canvas.height, surface)?;
        Ok(Self {
            window,
            pixels,
            viewport: canvas,
            asset_root,
            sprite_cache: HashMap::new(),
            warned_sprite_keys: HashSet::new(),
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), TextureError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels.resize_surface(width, height)
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    pub fn render_frame(&mut self, scene: &SceneFrame) -> Result<(), Error> {
        let Viewport { width, height } = self.viewport;
        let mut sprites = SpriteSource {
            cache: &mut self.sprite_cache,
            warned: &mut self.warned_sprite_keys,
            asset_root: &self.asset_root,
        };
        let frame = self.pixels.frame_mut();
        for pixel in frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&CLEAR_COLOR);
        }

        for layer in &scene.backgrounds {
            let (left, top) = snap_to_pixel(layer.screen_position);
            let sprite_frame = SpriteFrame {
                sheet: layer.sheet,
                frame: 0,
            };
            draw_sprite_frame(frame, width, height, &mut sprites, sprite_frame, left, top, false, false);
        }

        if let Some(zone) = &scene.zone {
            draw_zone_area(frame, width, height, zone);
        }

        for drawable in &scene.drawables {
            draw_entity(frame, width, height, &mut sprites, drawable);
        }

        if let Some(zone) = &scene.zone {
            draw_ready_hud(frame, width, height, zone);
        }

        self.pixels.render()
    }
}

struct SpriteSource<'a> {
    cache: &'a mut HashMap<String, Option<LoadedSprite>>,
    warned: &'a mut HashSet<String>,
    asset_root: &'a Path,
}

impl SpriteSource<'_> {
    fn get(&mut self, key: &str) -> Option<&LoadedSprite> {
        if !self.cache.contains_key(key) {
            let loaded = match resolve_sprite_image_path(self.asset_root, key) {
                Ok(path) => load_sprite_rgba(&path)
                    .map_err(|reason| warn_sprite_once(self.warned, key, Some(&path), &reason))
                    .ok(),
                Err(reason) => {
                    warn_sprite_once(self.warned, key, None, &reason);
                    None
                }
            };
            self.cache.insert(key.to_string(), loaded);
        }
        self.cache.get(key).and_then(Option::as_ref)
    }
}

fn draw_entity(
    frame: &mut [u8],
    width: u32,
    height: u32,
    sprites: &mut SpriteSource<'_>,
    drawable: &Drawable,
) {
    let (left, top) = snap_to_pixel(drawable.draw_position);
    if let Some(shadow) = drawable.shadow {
        draw_sprite_frame(frame, width, height, sprites, shadow, left, top, false, false);
    }
    draw_sprite_frame(
        frame,
        width,
        height,
        sprites,
        drawable.sprite,
        left,
        top,
        drawable.mirrored,
        true,
    );

    let center_x = left + drawable.sprite.sheet.frame_width as i32 / 2;
    let name_top = top + NAME_BASELINE_OFFSET_PX - NAME_SCALE.line_height();
    let name_width = text_width_px(&drawable.name, NAME_SCALE);
    draw_text_outlined(
        frame,
        width,
        height,
        center_x - name_width / 2,
        name_top,
        &drawable.name,
        NAME_SCALE,
        TEXT_WHITE,
        TEXT_BLACK,
    );

    if let Some(chat) = &drawable.chat {
        draw_chat_bubble(frame, width, height, center_x, name_top, chat);
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_sprite_frame(
    frame: &mut [u8],
    width: u32,
    height: u32,
    sprites: &mut SpriteSource<'_>,
    sprite_frame: SpriteFrame,
    left: i32,
    top: i32,
    mirrored: bool,
    placeholder_on_missing: bool,
) {
    let sheet = sprite_frame.sheet;
    let origin = sheet.frame_origin(sprite_frame.frame);
    let loaded = sprites.get(sheet.key);
    match (loaded, origin) {
        (Some(sprite), Some((src_x, src_y))) => blit_frame(
            frame,
            width,
            height,
            sprite,
            FrameBlit {
                src_x,
                src_y,
                frame_width: sheet.frame_width,
                frame_height: sheet.frame_height,
                left,
                top,
                mirrored,
            },
        ),
        (sprite, origin) => {
            let sheet_loaded = sprite.is_some();
            if sheet_loaded && origin.is_none() {
                let warn_key = format!("{}#{}", sheet.key, sprite_frame.frame);
                warn_sprite_once(sprites.warned, &warn_key, None, "frame_out_of_range");
            }
            if placeholder_on_missing {
                let w = sheet.frame_width as i32;
                let h = sheet.frame_height as i32;
                fill_rect_clipped(
                    frame,
                    width,
                    height,
                    left + w * 3 / 8,
                    top + h * 3 / 8,
                    w / 4,
                    h / 4,
                    PLACEHOLDER_COLOR,
                );
            }
        }
    }
}

fn draw_chat_bubble(
    frame: &mut [u8],
    width: u32,
    height: u32,
    center_x: i32,
    name_top: i32,
    chat: &ChatBubbleView,
) {
    if chat.text.is_empty() && chat.typing_dots.is_none() {
        return;
    }
    let mut text = chat.text.clone();
    if let Some(dots) = chat.typing_dots {
        text.push_str(&".".repeat(dots));
    }
    let lines = wrap_words(&text, chat.max_width_px as i32, BUBBLE_SCALE);
    let text_width = lines
        .iter()
        .map(|line| text_width_px(line, BUBBLE_SCALE))
        .max()
        .unwrap_or(0);

    let bubble_width = text_width + BUBBLE_PADDING_X * 2;
    let bubble_height = lines.len() as i32 * BUBBLE_LINE_HEIGHT + BUBBLE_PADDING_Y * 2;
    let bx = center_x - bubble_width / 2;
    let by = name_top - bubble_height + BUBBLE_OVERLAP_PX;

    fill_rect_clipped(frame, width, height, bx, by, bubble_width, bubble_height, TEXT_WHITE);
    rect_outline_clipped(frame, width, height, bx, by, bubble_width, bubble_height, 1, TEXT_BLACK);
    for (index, line) in lines.iter().enumerate() {
        draw_text_clipped(
            frame,
            width,
            height,
            bx + BUBBLE_PADDING_X,
            by + BUBBLE_PADDING_Y + index as i32 * BUBBLE_LINE_HEIGHT,
            line,
            BUBBLE_SCALE,
            TEXT_BLACK,
        );
    }
}

fn draw_zone_area(frame: &mut [u8], width: u32, height: u32, zone: &ZoneOverlay) {
    let (x, y) = snap_to_pixel(zone.screen_position);
    let w = zone.size.x.round() as i32;
    let h = zone.size.y.round() as i32;
    fill_rect_clipped(frame, width, height, x, y, w, h, ZONE_FILL_COLOR);
    let half_stroke = ZONE_STROKE_PX / 2;
    rect_outline_clipped(
        frame,
        width,
        height,
        x - half_stroke,
        y - half_stroke,
        w + ZONE_STROKE_PX,
        h + ZONE_STROKE_PX,
        ZONE_STROKE_PX,
        ZONE_STROKE_COLOR,
    );

    let center_x = x + w / 2;
    let center_y = y + h / 2;
    let ready = format!("READY: {}/{}", zone.ready_count, zone.capacity);
    let ready_color = if zone.ready_count == zone.capacity {
        HUD_RED
    } else {
        TEXT_WHITE
    };
    draw_text_centered(frame, width, height, center_x, center_y, &ready, READY_SCALE, ready_color);

    if zone.ready_count > 0 {
        let timer = format_countdown(zone.countdown_seconds);
        draw_text_centered(
            frame,
            width,
            height,
            center_x,
            center_y + HUD_TIMER_GAP_PX,
            &timer,
            TIMER_SCALE,
            ZONE_TIMER_COLOR,
        );
    }
}

fn draw_ready_hud(frame: &mut [u8], width: u32, height: u32, zone: &ZoneOverlay) {
    if zone.ready_count == 0 {
        return;
    }
    let right = width as i32 - HUD_MARGIN_PX;
    let count_text = format!("Ready: {}/{}", zone.ready_count, zone.capacity);
    let count_x = right - text_width_px(&count_text, READY_SCALE);
    draw_text_outlined(
        frame,
        width,
        height,
        count_x,
        HUD_MARGIN_PX,
        &count_text,
        READY_SCALE,
        ready_count_color(zone.ready_count, zone.capacity),
        TEXT_BLACK,
    );

    let timer_text = format_countdown(zone.countdown_seconds);
    let timer_x = right - text_width_px(&timer_text, TIMER_SCALE);
    draw_text_outlined(
        frame,
        width,
        height,
        timer_x,
        HUD_MARGIN_PX + HUD_TIMER_GAP_PX,
        &timer_text,
        TIMER_SCALE,
        countdown_color(zone.countdown_seconds),
        TEXT_BLACK,
    );
}

#[allow(clippy::too_many_arguments)]
fn draw_text_centered(
    frame: &mut [u8],
    width: u32,
    height: u32,
    center_x: i32,
    center_y: i32,
    text: &str,
    scale: TextScale,
    color: [u8; 4],
) {
    let x = center_x - text_width_px(text, scale) / 2;
    let y = center_y - scale.line_height() / 2;
    draw_text_outlined(frame, width, height, x, y, text, scale, color, TEXT_BLACK);
}

fn format_countdown(seconds: f32) -> String {
    format!("{:.1}", seconds.max(0.0))
}

fn ready_count_color(count: u32, capacity: u32) -> [u8; 4] {
    if count >= capacity {
        HUD_RED
    } else if count.saturating_mul(2) >= capacity {
        HUD_AMBER
    } else {
        HUD_GREEN
    }
}

fn countdown_color(seconds: f32) -> [u8; 4] {
    if seconds > 10.0 {
        HUD_GREEN
    } else if seconds > 5.0 {
        HUD_AMBER
    } else {
        HUD_RED
    }
}

fn resolve_sprite_image_path(asset_root: &Path, key: &str) -> Result<PathBuf, String> {
    validate_sprite_key(key).map_err(|error| format!("invalid_key:{error}"))?;
    Ok(asset_root.join("sprites").join(format!("{key}.png")))
}

fn load_sprite_rgba(path: &Path) -> Result<LoadedSprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_sprite_once(
    warned_keys: &mut HashSet<String>,
    key: &str,
    resolved_path: Option<&Path>,
    reason: &str,
) {
    if !warned_keys.insert(key.to_string()) {
        return;
    }
    let path_display = resolved_path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unresolved>".to_string());
    warn!(
        sprite_key = key,
        path = %path_display,
        reason,
        "renderer_sprite_unavailable_using_placeholder"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Vec2;
    use crate::sprite_sheet::SpriteSheet;
    use tempfile::TempDir;

    const SHEET: SpriteSheet = SpriteSheet {
        key: "avatar",
        frame_width: 4,
        frame_height: 4,
        columns: 2,
        rows: 1,
    };

    fn blank(width: u32, height: u32) -> Vec<u8> {
        vec![0u8; (width * height * 4) as usize]
    }

    fn lit_pixels(frame: &[u8]) -> usize {
        frame.chunks_exact(4).filter(|px| px[3] != 0).count()
    }

    #[test]
    fn sprite_path_resolution_and_missing_asset_fallback_behavior() {
        let temp = TempDir::new().expect("temp");
        let asset_root = temp.path();

        assert!(resolve_sprite_image_path(asset_root, r"bad\key").is_err());
        let valid_path = resolve_sprite_image_path(asset_root, "avatar").expect("path");
        assert_eq!(valid_path, asset_root.join("sprites").join("avatar.png"));
        assert!(load_sprite_rgba(&valid_path).is_err());
    }

    #[test]
    fn missing_sprite_is_cached_warned_once_and_drawn_as_placeholder() {
        let temp = TempDir::new().expect("temp");
        let mut cache = HashMap::new();
        let mut warned = HashSet::new();
        let mut sprites = SpriteSource {
            cache: &mut cache,
            warned: &mut warned,
            asset_root: temp.path(),
        };
        let mut frame = blank(16, 16);
        let sprite_frame = SpriteFrame {
            sheet: SHEET,
            frame: 0,
        };
        draw_sprite_frame(&mut frame, 16, 16, &mut sprites, sprite_frame, 2, 2, false, true);
        draw_sprite_frame(&mut frame, 16, 16, &mut sprites, sprite_frame, 8, 8, true, true);

        assert_eq!(warned.len(), 1);
        assert!(cache.get("avatar").is_some_and(Option::is_none));
        assert!(lit_pixels(&frame) > 0);
    }

    #[test]
    fn loaded_sheet_blits_requested_frame() {
        let mut cache = HashMap::new();
        // 8x4 sheet: left frame red, right frame blue.
        let mut rgba = Vec::new();
        for _y in 0..4 {
            for x in 0..8 {
                let px: [u8; 4] = if x < 4 { [255, 0, 0, 255] } else { [0, 0, 255, 255] };
                rgba.extend_from_slice(&px);
            }
        }
        cache.insert(
            "avatar".to_string(),
            Some(LoadedSprite {
                width: 8,
                height: 4,
                rgba,
            }),
        );
        let mut warned = HashSet::new();
        let temp = TempDir::new().expect("temp");
        let mut sprites = SpriteSource {
            cache: &mut cache,
            warned: &mut warned,
            asset_root: temp.path(),
        };
        let mut frame = blank(4, 4);
        let second = SpriteFrame {
            sheet: SHEET,
            frame: 1,
        };
        draw_sprite_frame(&mut frame, 4, 4, &mut sprites, second, 0, 0, false, true);
        assert_eq!(&frame[0..4], &[0, 0, 255, 255]);

        let out_of_range = SpriteFrame {
            sheet: SHEET,
            frame: 9,
        };
        draw_sprite_frame(&mut frame, 4, 4, &mut sprites, out_of_range, 0, 0, false, false);
        assert!(warned.contains("avatar#9"));
    }

    #[test]
    fn empty_idle_bubble_draws_nothing() {
        let mut frame = blank(64, 64);
        let chat = ChatBubbleView {
            text: String::new(),
            typing_dots: None,
            max_width_px: 150,
        };
        draw_chat_bubble(&mut frame, 64, 64, 32, 40, &chat);
        assert_eq!(lit_pixels(&frame), 0);
    }

    #[test]
    fn typing_bubble_draws_even_without_text() {
        let mut frame = blank(64, 64);
        let chat = ChatBubbleView {
            text: String::new(),
            typing_dots: Some(2),
            max_width_px: 150,
        };
        draw_chat_bubble(&mut frame, 64, 64, 32, 40, &chat);
        assert!(lit_pixels(&frame) > 0);
    }

    #[test]
    fn hud_colors_follow_thresholds() {
        assert_eq!(ready_count_color(20, 20), HUD_RED);
        assert_eq!(ready_count_color(10, 20), HUD_AMBER);
        assert_eq!(ready_count_color(9, 20), HUD_GREEN);
        assert_eq!(countdown_color(10.5), HUD_GREEN);
        assert_eq!(countdown_color(10.0), HUD_AMBER);
        assert_eq!(countdown_color(5.0), HUD_RED);
    }

    #[test]
    fn countdown_formats_one_decimal_and_floors_at_zero() {
        assert_eq!(format_countdown(19.96), "20.0");
        assert_eq!(format_countdown(-1.0), "0.0");
    }

    #[test]
    fn empty_zone_skips_corner_hud() {
        let mut frame = blank(200, 100);
        let zone = ZoneOverlay {
            screen_position: Vec2::new(0.0, 0.0),
            size: Vec2::new(10.0, 10.0),
            ready_count: 0,
            capacity: 20,
            countdown_seconds: 20.0,
        };
        draw_ready_hud(&mut frame, 200, 100, &zone);
        assert_eq!(lit_pixels(&frame), 0);
    }
}
