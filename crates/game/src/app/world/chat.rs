use plaza_engine::ChatBubbleView;

pub(crate) const MAX_MESSAGE_CHARS: usize = 50;
pub(crate) const DISPLAY_SECONDS: f32 = 5.0;
pub(crate) const BUBBLE_MAX_WIDTH_PX: u32 = 150;
const TYPING_DOT_PERIOD_SECONDS: f32 = 0.5;
const TYPING_DOT_CYCLE: usize = 4;

/// Speech bubble above one avatar: either a typing indicator or a message that expires.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ChatBubble {
    message: String,
    typing: bool,
    timer_seconds: f32,
}

impl ChatBubble {
    pub(crate) fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn is_typing(&self) -> bool {
        self.typing
    }

    #[cfg(test)]
    pub(crate) fn timer_seconds(&self) -> f32 {
        self.timer_seconds
    }

    /// Starting to type hides whatever message was showing, and stopping drops
    /// the unsent draft.
    pub(crate) fn set_typing_status(&mut self, typing: bool) {
        if typing == self.typing {
            return;
        }
        self.typing = typing;
        self.clear_message();
    }

    /// Mirrors the line being typed. Ignored unless typing; the timer stays at zero.
    pub(crate) fn set_draft(&mut self, draft: &str) {
        if !self.typing {
            return;
        }
        self.message = truncate_chars(draft, MAX_MESSAGE_CHARS).to_string();
        self.timer_seconds = 0.0;
    }

    /// Shows `message` from a fresh timer and ends typing. Repeating the current
    /// message changes nothing.
    pub(crate) fn set_message(&mut self, message: &str) {
        let message = truncate_chars(message, MAX_MESSAGE_CHARS);
        if message == self.message {
            return;
        }
        self.message = message.to_string();
        self.timer_seconds = 0.0;
        self.typing = false;
    }

    pub(crate) fn clear_message(&mut self) {
        self.message.clear();
        self.timer_seconds = 0.0;
    }

    pub(crate) fn step(&mut self, dt_seconds: f32) {
        if self.typing || self.message.is_empty() {
            return;
        }
        self.timer_seconds += dt_seconds;
        if self.timer_seconds >= DISPLAY_SECONDS {
            self.clear_message();
        }
    }

    /// What the bubble shows this frame, or `None` when there is nothing to draw.
    /// `typing_elapsed_seconds` drives the dot animation.
    pub(crate) fn view(&self, typing_elapsed_seconds: f32) -> Option<ChatBubbleView> {
        if self.typing {
            return Some(ChatBubbleView {
                text: self.message.clone(),
                typing_dots: Some(typing_dots(typing_elapsed_seconds)),
                max_width_px: BUBBLE_MAX_WIDTH_PX,
            });
        }
        if self.message.is_empty() {
            return None;
        }
        Some(ChatBubbleView {
            text: self.message.clone(),
            typing_dots: None,
            max_width_px: BUBBLE_MAX_WIDTH_PX,
        })
    }
}

pub(crate) fn typing_dots(elapsed_seconds: f32) -> usize {
    let phase = (elapsed_seconds.max(0.0) / TYPING_DOT_PERIOD_SECONDS).floor() as usize;
    phase % TYPING_DOT_CYCLE
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
