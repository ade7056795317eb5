use std::collections::HashSet;

use glam::Vec2;

/// Keys the demos react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Up,
    Down,
    Left,
    Right,
    Escape,
    F1,
    F2,
}

/// Per-frame camera input. Only the sign of each component matters.
///
/// `dis.x` moves along the view direction, `dis.y` strafes right;
/// `look.x` pitches up, `look.y` turns right.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MoveInput {
    pub dis: Vec2,
    pub look: Vec2,
}

impl MoveInput {
    pub fn is_idle(&self) -> bool {
        self.dis == Vec2::ZERO && self.look == Vec2::ZERO
    }
}

/// A discrete action produced by a key press.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Leave the render loop.
    Quit,
    /// Show or hide the debug overlay.
    ToggleOverlay,
    /// Enable or disable the shadow pass.
    ToggleShadows,
    /// Held movement keys for this frame.
    Move(MoveInput),
}

/// Set of keys currently held down.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press; returns the action bound to it, if any.
    pub fn press(&mut self, key: Key) -> Option<Action> {
        let repeat = !self.held.insert(key);
        if repeat {
            return None;
        }
        let action = match key {
            Key::Escape => Action::Quit,
            Key::F1 => Action::ToggleOverlay,
            Key::F2 => Action::ToggleShadows,
            _ => return None,
        };
        tracing::debug!(?key, ?action, "key action");
        Some(action)
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Movement for this frame. Opposite keys cancel.
    pub fn move_input(&self) -> MoveInput {
        MoveInput {
            dis: Vec2::new(
                self.axis(Key::W, Key::S),
                self.axis(Key::D, Key::A),
            ),
            look: Vec2::new(
                self.axis(Key::Up, Key::Down),
                self.axis(Key::Right, Key::Left),
            ),
        }
    }

    /// Continuous movement as an action, `None` when no movement key is held.
    pub fn poll_move(&self) -> Option<Action> {
        let input = self.move_input();
        (!input.is_idle()).then_some(Action::Move(input))
    }

    fn axis(&self, positive: Key, negative: Key) -> f32 {
        let mut v = 0.0;
        if self.is_held(positive) {
            v += 1.0;
        }
        if self.is_held(negative) {
            v -= 1.0;
        }
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_without_keys() {
        assert!(InputState::new().move_input().is_idle());
    }

    #[test]
    fn wasd_maps_to_dis() {
        let mut input = InputState::new();
        input.press(Key::W);
        input.press(Key::A);
        assert_eq!(input.move_input().dis, Vec2::new(1.0, -1.0));
    }

    #[test]
    fn arrows_map_to_look() {
        let mut input = InputState::new();
        input.press(Key::Down);
        input.press(Key::Right);
        assert_eq!(input.move_input().look, Vec2::new(-1.0, 1.0));
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut input = InputState::new();
        input.press(Key::W);
        input.press(Key::S);
        assert_eq!(input.move_input().dis.x, 0.0);
    }

    #[test]
    fn release_stops_movement() {
        let mut input = InputState::new();
        input.press(Key::D);
        input.release(Key::D);
        assert!(input.move_input().is_idle());
    }

    #[test]
    fn escape_quits() {
        let mut input = InputState::new();
        assert_eq!(input.press(Key::Escape), Some(Action::Quit));
    }

    #[test]
    fn held_key_does_not_repeat_action() {
        let mut input = InputState::new();
        assert_eq!(input.press(Key::F1), Some(Action::ToggleOverlay));
        assert_eq!(input.press(Key::F1), None);
        input.release(Key::F1);
        assert_eq!(input.press(Key::F1), Some(Action::ToggleOverlay));
    }

    #[test]
    fn poll_move_reports_held_keys() {
        let mut input = InputState::new();
        assert_eq!(input.poll_move(), None);
        input.press(Key::Left);
        let Some(Action::Move(m)) = input.poll_move() else {
            panic!("expected a move action");
        };
        assert_eq!(m.look, Vec2::new(0.0, -1.0));
    }

    #[test]
    fn movement_keys_have_no_action() {
        let mut input = InputState::new();
        assert_eq!(input.press(Key::W), None);
        assert_eq!(input.press(Key::F2), Some(Action::ToggleShadows));
    }
}
