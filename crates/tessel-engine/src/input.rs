//! Frame input: discrete events plus the held state they imply.
//!
//! The host translates its window-system events into [`InputEvent`]s. The
//! driver folds each frame's events into an [`InputSnapshot`] and hands both
//! to the systems as a read-only [`FrameInput`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tessel_ecs::component::Vec2;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Keys the engine knows by name. Anything else arrives as `Other(code)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Key {
    A,
    D,
    Left,
    Right,
    Space,
    Escape,
    Other(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// A single input event delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    MouseButtonDown(MouseButton),
    MouseButtonUp(MouseButton),
    /// New pointer position in display coordinates.
    MouseMotion(Vec2),
    /// The user asked to close the application.
    Quit,
}

impl InputEvent {
    /// `true` for events that end the host loop.
    pub fn is_quit(&self) -> bool {
        matches!(self, InputEvent::Quit | InputEvent::KeyDown(Key::Escape))
    }
}

// ---------------------------------------------------------------------------
// InputSnapshot
// ---------------------------------------------------------------------------

/// Held keys and buttons plus the last known pointer position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    mouse_position: Vec2,
    buttons: BTreeSet<MouseButton>,
    keys: BTreeSet<Key>,
}

impl InputSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the snapshot.
    pub fn apply(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::KeyDown(key) => {
                self.keys.insert(key);
            }
            InputEvent::KeyUp(key) => {
                self.keys.remove(&key);
            }
            InputEvent::MouseButtonDown(button) => {
                self.buttons.insert(button);
            }
            InputEvent::MouseButtonUp(button) => {
                self.buttons.remove(&button);
            }
            InputEvent::MouseMotion(position) => self.mouse_position = position,
            InputEvent::Quit => {}
        }
    }

    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    pub fn is_key_down(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }
}

// ---------------------------------------------------------------------------
// FrameInput
// ---------------------------------------------------------------------------

/// Everything systems may read about the user's input for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    /// Events received since the previous frame, in arrival order.
    pub events: Vec<InputEvent>,
    /// Held state after applying `events`.
    pub snapshot: InputSnapshot,
}

impl FrameInput {
    /// Build the input for a frame from the previous snapshot and this
    /// frame's events.
    pub fn from_events(mut snapshot: InputSnapshot, events: Vec<InputEvent>) -> Self {
        for event in &events {
            snapshot.apply(event);
        }
        Self { events, snapshot }
    }

    pub fn key_pressed(&self, key: Key) -> bool {
        self.events.contains(&InputEvent::KeyDown(key))
    }

    pub fn key_released(&self, key: Key) -> bool {
        self.events.contains(&InputEvent::KeyUp(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_tracks_held_state() {
        let mut snapshot = InputSnapshot::new();
        snapshot.apply(&InputEvent::KeyDown(Key::A));
        snapshot.apply(&InputEvent::MouseButtonDown(MouseButton::Left));
        snapshot.apply(&InputEvent::MouseMotion(Vec2::new(10.0, 20.0)));
        assert!(snapshot.is_key_down(Key::A));
        assert!(snapshot.is_button_down(MouseButton::Left));
        assert_eq!(snapshot.mouse_position(), Vec2::new(10.0, 20.0));

        snapshot.apply(&InputEvent::KeyUp(Key::A));
        snapshot.apply(&InputEvent::MouseButtonUp(MouseButton::Left));
        assert!(!snapshot.is_key_down(Key::A));
        assert!(!snapshot.is_button_down(MouseButton::Left));
    }

    #[test]
    fn frame_input_keeps_events_and_folds_them() {
        let input = FrameInput::from_events(
            InputSnapshot::new(),
            vec![InputEvent::KeyDown(Key::D), InputEvent::KeyUp(Key::A)],
        );
        assert!(input.key_pressed(Key::D));
        assert!(input.key_released(Key::A));
        assert!(!input.key_pressed(Key::A));
        assert!(input.snapshot.is_key_down(Key::D));
    }

    #[test]
    fn escape_and_quit_end_the_loop() {
        assert!(InputEvent::Quit.is_quit());
        assert!(InputEvent::KeyDown(Key::Escape).is_quit());
        assert!(!InputEvent::KeyUp(Key::Escape).is_quit());
    }
}
