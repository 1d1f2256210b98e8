use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Arrows and WASD. Anything else is not a movement key.
    pub fn from_key_code(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::ArrowUp | KeyCode::KeyW => Some(Direction::Up),
            KeyCode::ArrowDown | KeyCode::KeyS => Some(Direction::Down),
            KeyCode::ArrowLeft | KeyCode::KeyA => Some(Direction::Left),
            KeyCode::ArrowRight | KeyCode::KeyD => Some(Direction::Right),
            _ => None,
        }
    }
}

/// Currently held movement directions, most recent first, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputLatch {
    held: Vec<Direction>,
}

impl InputLatch {
    pub fn press(&mut self, code: KeyCode) -> bool {
        Direction::from_key_code(code)
            .map(|direction| self.press_direction(direction))
            .unwrap_or(false)
    }

    pub fn release(&mut self, code: KeyCode) -> bool {
        Direction::from_key_code(code)
            .map(|direction| self.release_direction(direction))
            .unwrap_or(false)
    }

    pub fn press_direction(&mut self, direction: Direction) -> bool {
        if self.held.contains(&direction) {
            return false;
        }
        self.held.insert(0, direction);
        true
    }

    pub fn release_direction(&mut self, direction: Direction) -> bool {
        let before = self.held.len();
        self.held.retain(|held| *held != direction);
        self.held.len() != before
    }

    pub fn held(&self) -> &[Direction] {
        &self.held
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        self.held.contains(&direction)
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// One keyboard transition captured between ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    pub code: Option<KeyCode>,
    pub state: KeyState,
    pub text: Option<String>,
    pub repeat: bool,
}

impl KeyInput {
    pub fn pressed(code: KeyCode) -> Self {
        Self {
            code: Some(code),
            state: KeyState::Pressed,
            text: None,
            repeat: false,
        }
    }

    pub fn released(code: KeyCode) -> Self {
        Self {
            code: Some(code),
            state: KeyState::Released,
            text: None,
            repeat: false,
        }
    }

    pub fn typed(code: KeyCode, text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::pressed(code)
        }
    }

    pub fn with_repeat(mut self) -> Self {
        self.repeat = true;
        self
    }

    pub fn is_pressed(&self) -> bool {
        self.state == KeyState::Pressed
    }

    pub fn is_key(&self, code: KeyCode) -> bool {
        self.code == Some(code)
    }

    pub(crate) fn from_key_event(event: &KeyEvent) -> Self {
        let code = match event.physical_key {
            PhysicalKey::Code(code) => Some(code),
            PhysicalKey::Unidentified(_) => None,
        };
        let state = match event.state {
            ElementState::Pressed => KeyState::Pressed,
            ElementState::Released => KeyState::Released,
        };
        Self {
            code,
            state,
            text: event.text.as_ref().map(|text| text.to_string()),
            repeat: event.repeat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wasd_and_arrow_keys_map_to_directions() {
        assert_eq!(Direction::from_key_code(KeyCode::KeyW), Some(Direction::Up));
        assert_eq!(Direction::from_key_code(KeyCode::ArrowLeft), Some(Direction::Left));
        assert_eq!(Direction::from_key_code(KeyCode::KeyD), Some(Direction::Right));
        assert_eq!(Direction::from_key_code(KeyCode::ArrowDown), Some(Direction::Down));
        assert_eq!(Direction::from_key_code(KeyCode::Enter), None);
    }

    #[test]
    fn press_inserts_at_front_without_duplicates() {
        let mut latch = InputLatch::default();
        assert!(latch.press(KeyCode::ArrowRight));
        assert!(latch.press(KeyCode::KeyW));
        assert!(!latch.press(KeyCode::KeyD));
        assert_eq!(latch.held(), &[Direction::Up, Direction::Right]);
    }

    #[test]
    fn release_removes_direction() {
        let mut latch = InputLatch::default();
        latch.press(KeyCode::KeyA);
        latch.press(KeyCode::KeyS);
        assert!(latch.release(KeyCode::ArrowLeft));
        assert!(!latch.release(KeyCode::ArrowLeft));
        assert_eq!(latch.held(), &[Direction::Down]);
    }

    #[test]
    fn unmapped_keys_are_no_ops() {
        let mut latch = InputLatch::default();
        assert!(!latch.press(KeyCode::Space));
        assert!(!latch.release(KeyCode::Escape));
        assert!(latch.is_empty());
    }

    #[test]
    fn typed_key_carries_text_and_press_state() {
        let key = KeyInput::typed(KeyCode::KeyH, "h");
        assert!(key.is_pressed());
        assert!(key.is_key(KeyCode::KeyH));
        assert_eq!(key.text.as_deref(), Some("h"));
        assert!(!KeyInput::released(KeyCode::KeyH).is_pressed());
    }
}
