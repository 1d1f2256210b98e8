//! Turns raw key transitions into world intents and owns the chat draft being typed.

use plaza_engine::{Direction, KeyCode, KeyInput};

use super::chat::MAX_MESSAGE_CHARS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Intent {
    PressDirection(Direction),
    ReleaseDirection(Direction),
    BeginTyping,
    Submit,
    CancelTyping,
    Append(String),
    Backspace,
    Quit,
}

/// Routes one key transition given whether the draft is open. Key releases always
/// reach the latch so a direction held across Enter is not stuck afterwards.
pub(crate) fn classify_key(key: &KeyInput, typing: bool) -> Option<Intent> {
    let code = key.code?;
    if !key.is_pressed() {
        return Direction::from_key_code(code).map(Intent::ReleaseDirection);
    }

    match code {
        KeyCode::Enter | KeyCode::NumpadEnter if typing => Some(Intent::Submit),
        KeyCode::Enter | KeyCode::NumpadEnter => Some(Intent::BeginTyping),
        KeyCode::Escape if typing => Some(Intent::CancelTyping),
        KeyCode::Escape => Some(Intent::Quit),
        KeyCode::Backspace if typing => Some(Intent::Backspace),
        _ if typing => printable_text(key).map(Intent::Append),
        _ => Direction::from_key_code(code).map(Intent::PressDirection),
    }
}

fn printable_text(key: &KeyInput) -> Option<String> {
    let text: String = key
        .text
        .as_deref()?
        .chars()
        .filter(|ch| !ch.is_control())
        .collect();
    (!text.is_empty()).then_some(text)
}

/// The line being composed. While open, movement is suspended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ChatDraft {
    buffer: String,
    typing: bool,
}

impl ChatDraft {
    pub(crate) fn is_typing(&self) -> bool {
        self.typing
    }

    pub(crate) fn buffer(&self) -> &str {
        &self.buffer
    }

    pub(crate) fn begin(&mut self) {
        self.typing = true;
        self.buffer.clear();
    }

    pub(crate) fn cancel(&mut self) {
        self.typing = false;
        self.buffer.clear();
    }

    pub(crate) fn append(&mut self, text: &str) {
        for ch in text.chars() {
            if self.buffer.chars().count() >= MAX_MESSAGE_CHARS {
                break;
            }
            self.buffer.push(ch);
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.buffer.pop();
    }

    /// Closes the draft and hands back its line, or `None` when nothing was typed.
    pub(crate) fn submit(&mut self) -> Option<String> {
        self.typing = false;
        let line = std::mem::take(&mut self.buffer);
        (!line.is_empty()).then_some(line)
    }
}
