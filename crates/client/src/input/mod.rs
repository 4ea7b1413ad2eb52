// Keyboard input: held-key set and axis sampling
use std::collections::HashSet;

use glam::Vec2;

const UP_KEYS: [&str; 2] = ["w", "arrowup"];
const DOWN_KEYS: [&str; 2] = ["s", "arrowdown"];
const LEFT_KEYS: [&str; 2] = ["a", "arrowleft"];
const RIGHT_KEYS: [&str; 2] = ["d", "arrowright"];

/// True for keys that steer the player, in any letter case.
pub fn is_movement_key(key: &str) -> bool {
    let key = key.to_lowercase();
    [UP_KEYS, DOWN_KEYS, LEFT_KEYS, RIGHT_KEYS]
        .iter()
        .any(|group| group.contains(&key.as_str()))
}

/// Signed per-axis signal derived from the held keys. Each component is
/// in {-1, 0, 1}; screen y grows downward, so "up" is -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Axis {
    pub x: i8,
    pub y: i8,
}

impl Axis {
    pub const IDLE: Axis = Axis { x: 0, y: 0 };

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.x == 0 && self.y == 0
    }

    /// Unit-length direction, or zero when idle.
    pub fn direction(&self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32).normalize_or_zero()
    }
}

/// Keys currently held down, stored lowercased.
///
/// This is a level signal: sampling never clears it, only key-up (or
/// losing window focus) does.
#[derive(Debug, Default)]
pub struct InputState {
    keys_down: HashSet<String>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_key_down(&mut self, key: &str) {
        self.keys_down.insert(key.to_lowercase());
    }

    pub fn on_key_up(&mut self, key: &str) {
        self.keys_down.remove(&key.to_lowercase());
    }

    /// Key-up is never delivered to an unfocused page, so drop everything.
    pub fn release_all(&mut self) {
        self.keys_down.clear();
    }

    fn any_held(&self, keys: &[&str]) -> bool {
        keys.iter().any(|k| self.keys_down.contains(*k))
    }

    /// Sample the current axis signal. Opposing keys on one axis cancel.
    pub fn axis(&self) -> Axis {
        let x = i8::from(self.any_held(&RIGHT_KEYS)) - i8::from(self.any_held(&LEFT_KEYS));
        let y = i8::from(self.any_held(&DOWN_KEYS)) - i8::from(self.any_held(&UP_KEYS));
        Axis { x, y }
    }
}
