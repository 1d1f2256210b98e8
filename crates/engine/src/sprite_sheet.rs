use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteKeyError {
    #[error("sprite key must not be empty")]
    Empty,
    #[error("sprite key must not start with '/'")]
    LeadingSlash,
    #[error("sprite key must not contain '\\\\'")]
    Backslash,
    #[error("sprite key must not contain '..'")]
    ParentTraversal,
    #[error("sprite key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Keys are relative paths under `assets/sprites`, lowercase, no traversal.
pub(crate) fn validate_sprite_key(key: &str) -> Result<(), SpriteKeyError> {
    if key.is_empty() {
        return Err(SpriteKeyError::Empty);
    }
    if key.starts_with('/') {
        return Err(SpriteKeyError::LeadingSlash);
    }
    if key.contains('\\') {
        return Err(SpriteKeyError::Backslash);
    }
    if key.contains("..") {
        return Err(SpriteKeyError::ParentTraversal);
    }
    match key
        .chars()
        .find(|ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-')))
    {
        Some(character) => Err(SpriteKeyError::InvalidCharacter { character }),
        None => Ok(()),
    }
}

/// Grid layout of a sprite sheet image: equally sized frames, row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteSheet {
    pub key: &'static str,
    pub frame_width: u32,
    pub frame_height: u32,
    pub columns: u32,
    pub rows: u32,
}

impl SpriteSheet {
    pub const fn single(key: &'static str, width: u32, height: u32) -> Self {
        Self {
            key,
            frame_width: width,
            frame_height: height,
            columns: 1,
            rows: 1,
        }
    }

    pub const fn frame_count(&self) -> u32 {
        self.columns * self.rows
    }

    /// Pixel origin of `frame` inside the sheet image, or `None` past the last frame.
    pub fn frame_origin(&self, frame: u16) -> Option<(u32, u32)> {
        let frame = u32::from(frame);
        if self.columns == 0 || frame >= self.frame_count() {
            return None;
        }
        let column = frame % self.columns;
        let row = frame / self.columns;
        Some((column * self.frame_width, row * self.frame_height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AVATAR: SpriteSheet = SpriteSheet {
        key: "avatar",
        frame_width: 64,
        frame_height: 64,
        columns: 7,
        rows: 11,
    };

    #[test]
    fn accepts_valid_keys() {
        for key in ["avatar", "world/water", "shadow-1_a"] {
            assert!(validate_sprite_key(key).is_ok(), "key={key}");
        }
    }

    #[test]
    fn rejects_invalid_keys() {
        for key in ["", "/a", "..", "a/../b", r"a\b", "A", "a.b"] {
            assert!(validate_sprite_key(key).is_err(), "key={key}");
        }
    }

    #[test]
    fn frame_origin_walks_rows_left_to_right() {
        assert_eq!(AVATAR.frame_origin(0), Some((0, 0)));
        assert_eq!(AVATAR.frame_origin(6), Some((384, 0)));
        assert_eq!(AVATAR.frame_origin(8), Some((64, 64)));
        assert_eq!(AVATAR.frame_origin(76), Some((384, 640)));
    }

    #[test]
    fn frame_origin_rejects_out_of_range_frames() {
        assert_eq!(AVATAR.frame_count(), 77);
        assert_eq!(AVATAR.frame_origin(77), None);
    }
}
