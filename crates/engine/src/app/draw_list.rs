use crate::sprite_sheet::SpriteSheet;

use super::scene::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteFrame {
    pub sheet: SpriteSheet,
    pub frame: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatBubbleView {
    pub text: String,
    /// Number of trailing dots while the owner is typing.
    pub typing_dots: Option<usize>,
    pub max_width_px: u32,
}

/// One entity ready to draw. Positions are screen pixels of the frame's top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawable {
    pub depth_y: f32,
    pub draw_position: Vec2,
    pub sprite: SpriteFrame,
    pub shadow: Option<SpriteFrame>,
    pub mirrored: bool,
    pub name: String,
    pub chat: Option<ChatBubbleView>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundLayer {
    pub sheet: SpriteSheet,
    pub screen_position: Vec2,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneOverlay {
    pub screen_position: Vec2,
    pub size: Vec2,
    pub ready_count: u32,
    pub capacity: u32,
    pub countdown_seconds: f32,
}

/// Everything the renderer needs for one frame, in draw order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneFrame {
    pub backgrounds: Vec<BackgroundLayer>,
    pub zone: Option<ZoneOverlay>,
    pub drawables: Vec<Drawable>,
}

impl SceneFrame {
    pub fn clear(&mut self) {
        self.backgrounds.clear();
        self.zone = None;
        self.drawables.clear();
    }
}
