//! Logical per-frame input for the player controller.

use bevy::prelude::*;

/// Input state for one frame.
///
/// `look` is in look-axis units: positive x turns right, positive y looks up.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInput {
    pub quit: bool,
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub look: Vec2,
}

impl FrameInput {
    /// True if any directional action is held.
    pub fn is_walking(&self) -> bool {
        self.forward || self.back || self.left || self.right
    }

    /// Resolve bindings against the keyboard and convert raw mouse motion.
    ///
    /// Screen-space mouse y grows downward, so it is inverted.
    pub fn from_devices(
        keys: &ButtonInput<KeyCode>,
        bindings: &KeyBindings,
        mouse_delta: Vec2,
        axis_scale: f32,
    ) -> Self {
        Self {
            quit: keys.any_pressed(bindings.quit.iter().copied()),
            forward: keys.any_pressed(bindings.forward.iter().copied()),
            back: keys.any_pressed(bindings.back.iter().copied()),
            left: keys.any_pressed(bindings.left.iter().copied()),
            right: keys.any_pressed(bindings.right.iter().copied()),
            look: Vec2::new(mouse_delta.x, -mouse_delta.y) * axis_scale,
        }
    }
}

/// Physical keys bound to each logical action.
#[derive(Resource, Clone, Debug)]
pub struct KeyBindings {
    pub quit: Vec<KeyCode>,
    pub forward: Vec<KeyCode>,
    pub back: Vec<KeyCode>,
    pub left: Vec<KeyCode>,
    pub right: Vec<KeyCode>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: vec![KeyCode::Escape],
            forward: vec![KeyCode::KeyW, KeyCode::ArrowUp],
            back: vec![KeyCode::KeyS, KeyCode::ArrowDown],
            left: vec![KeyCode::KeyA, KeyCode::ArrowLeft],
            right: vec![KeyCode::KeyD, KeyCode::ArrowRight],
        }
    }
}
