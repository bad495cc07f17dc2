//! Input snapshot filled by the host from window events.
//!
//! Buttons move `Idle → Pressed → Held → Released → Idle`; `Pressed` and `Released` last
//! exactly one frame. Call [`Input::end_frame`] after the backend consumed the snapshot.
//! A key pressed and released within one frame still reports the press for that frame.

use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ButtonState {
    #[default]
    Idle,
    Pressed,
    Held,
    Released,
}

impl ButtonState {
    pub fn is_down(self) -> bool {
        matches!(self, Self::Pressed | Self::Held)
    }

    fn on_event(self, pressed: bool) -> Self {
        match (pressed, self) {
            (true, Self::Pressed | Self::Held) => Self::Held,
            (true, _) => Self::Pressed,
            (false, Self::Pressed | Self::Held) => Self::Released,
            (false, other) => other,
        }
    }

    fn advance(self) -> Self {
        match self {
            Self::Pressed => Self::Held,
            Self::Released => Self::Idle,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Space,
    LeftShift,
    O,
    F,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Default)]
pub struct Input {
    keys: HashMap<Key, ButtonState>,
    pressed_keys: HashSet<Key>,
    buttons: HashMap<MouseButton, ButtonState>,
    cursor: Option<(f32, f32)>,
    mouse_delta: (f32, f32),
    scroll: f32,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_event(&mut self, key: Key, pressed: bool) {
        let state = self.keys.entry(key).or_default();
        *state = state.on_event(pressed);
        if *state == ButtonState::Pressed {
            self.pressed_keys.insert(key);
        }
    }

    pub fn button_event(&mut self, button: MouseButton, pressed: bool) {
        let state = self.buttons.entry(button).or_default();
        *state = state.on_event(pressed);
    }

    /// Absolute cursor position in window pixels; the delta accumulates from the previous position.
    pub fn cursor_moved(&mut self, x: f32, y: f32) {
        if let Some((px, py)) = self.cursor {
            self.mouse_delta.0 += x - px;
            self.mouse_delta.1 += y - py;
        }
        self.cursor = Some((x, y));
    }

    /// Scroll in lines; positive scrolls away from the user.
    pub fn scroll_event(&mut self, lines: f32) {
        self.scroll += lines;
    }

    pub fn key(&self, key: Key) -> ButtonState {
        self.keys.get(&key).copied().unwrap_or_default()
    }

    pub fn button(&self, button: MouseButton) -> ButtonState {
        self.buttons.get(&button).copied().unwrap_or_default()
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.key(key).is_down()
    }

    /// True only on the frame the key went down.
    pub fn was_key_pressed(&self, key: Key) -> bool {
        self.pressed_keys.contains(&key)
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.button(button).is_down()
    }

    pub fn cursor(&self) -> Option<(f32, f32)> {
        self.cursor
    }

    pub fn mouse_delta(&self) -> (f32, f32) {
        self.mouse_delta
    }

    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    pub fn end_frame(&mut self) {
        for state in self.keys.values_mut() {
            *state = state.advance();
        }
        self.pressed_keys.clear();
        for state in self.buttons.values_mut() {
            *state = state.advance();
        }
        self.mouse_delta = (0.0, 0.0);
        self.scroll = 0.0;
    }
}
