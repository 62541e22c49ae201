use std::collections::HashSet;

use maya_math::Vec2;

use super::types::{ButtonState, InputEvent, Key, Modifiers, MouseButton};

/// Read-only view of input used by gameplay code such as cameras.
pub trait InputProvider {
    fn is_key_down(&self, key: Key) -> bool;

    /// True only during the frame the key went down.
    fn is_key_pressed(&self, key: Key) -> bool;

    fn is_key_released(&self, key: Key) -> bool;

    fn is_button_down(&self, button: MouseButton) -> bool;

    /// Last absolute cursor position in logical pixels.
    fn mouse_position(&self) -> Vec2;

    /// Scroll accumulated this frame.
    fn scroll_delta(&self) -> Vec2;

    /// True during the frame that delivers the first cursor position after
    /// focus was regained or the cursor re-entered the window. Consumers that
    /// derive deltas from [`mouse_position`](Self::mouse_position) should
    /// discard their previous sample.
    fn cursor_reacquired(&self) -> bool {
        false
    }
}

/// Input state for a single window.
///
/// Holds "is down" information plus the transitions of the current frame.
/// Call [`update`](Self::update) once the frame has been consumed.
#[derive(Debug, Default)]
pub struct InputState {
    pub modifiers: Modifiers,
    pub focused: bool,

    /// Whether the cursor is inside the window.
    pub cursor_inside: bool,

    mouse_position: Vec2,
    scroll: Vec2,

    /// Focus came back; the next cursor sample is a re-acquisition.
    reacquire_pending: bool,
    cursor_reacquired: bool,

    keys_down: HashSet<Key>,
    keys_pressed: HashSet<Key>,
    keys_released: HashSet<Key>,

    buttons_down: HashSet<MouseButton>,
    buttons_pressed: HashSet<MouseButton>,
    buttons_released: HashSet<MouseButton>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_event(&mut self, ev: InputEvent) {
        match ev {
            InputEvent::Key { key, state, .. } => match state {
                ButtonState::Pressed => {
                    if self.keys_down.insert(key) {
                        self.keys_pressed.insert(key);
                    }
                }
                ButtonState::Released => {
                    if self.keys_down.remove(&key) {
                        self.keys_released.insert(key);
                    }
                }
            },

            InputEvent::CursorMoved { x, y } => {
                if self.reacquire_pending || !self.cursor_inside {
                    self.cursor_reacquired = true;
                    self.reacquire_pending = false;
                }
                self.mouse_position = Vec2::new(x, y);
                self.cursor_inside = true;
            }

            InputEvent::CursorLeft => {
                self.cursor_inside = false;
            }

            InputEvent::MouseButton { button, state } => match state {
                ButtonState::Pressed => {
                    if self.buttons_down.insert(button) {
                        self.buttons_pressed.insert(button);
                    }
                }
                ButtonState::Released => {
                    if self.buttons_down.remove(&button) {
                        self.buttons_released.insert(button);
                    }
                }
            },

            InputEvent::Scroll { dx, dy } => {
                self.scroll += Vec2::new(dx, dy);
            }

            InputEvent::ModifiersChanged(m) => {
                self.modifiers = m;
            }

            InputEvent::Focused(f) => {
                self.focused = f;
                if f {
                    self.reacquire_pending = true;
                } else {
                    // Releases are not delivered while unfocused.
                    self.keys_released.extend(self.keys_down.drain());
                    self.buttons_released.extend(self.buttons_down.drain());
                }
            }
        }
    }

    /// Clears the per-frame transitions and scroll.
    pub fn update(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.buttons_pressed.clear();
        self.buttons_released.clear();
        self.scroll = Vec2::ZERO;
        self.cursor_reacquired = false;
    }

    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }

    pub fn is_button_released(&self, button: MouseButton) -> bool {
        self.buttons_released.contains(&button)
    }
}

impl InputProvider for InputState {
    fn is_key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    fn is_key_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    fn is_key_released(&self, key: Key) -> bool {
        self.keys_released.contains(&key)
    }

    fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    fn scroll_delta(&self) -> Vec2 {
        self.scroll
    }

    fn cursor_reacquired(&self) -> bool {
        self.cursor_reacquired
    }
}
