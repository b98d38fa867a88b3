use crate::geometry::Vec3;

use super::input::InputAction;
use super::scene::InputSnapshot;

/// The movement gate: a locked checkpoint suppresses all translation.
pub fn filter_movement_delta(intent: Vec3, locked: bool) -> Vec3 {
    if locked {
        Vec3::ZERO
    } else {
        intent
    }
}

/// Unit-length horizontal direction from held movement keys, relative to
/// `yaw`. Opposing keys cancel.
pub fn movement_intent(input: &InputSnapshot, yaw: f32) -> Vec3 {
    let forward = Vec3::new(-yaw.sin(), 0.0, -yaw.cos());
    let right = Vec3::new(-forward.z, 0.0, forward.x);

    let mut direction = Vec3::ZERO;
    if input.is_down(InputAction::MoveForward) {
        direction += forward;
    }
    if input.is_down(InputAction::MoveBack) {
        direction = direction - forward;
    }
    if input.is_down(InputAction::MoveRight) {
        direction += right;
    }
    if input.is_down(InputAction::MoveLeft) {
        direction = direction - right;
    }
    direction.normalized_or_zero()
}

/// +1 turns left (counter-clockwise seen from above), -1 turns right.
pub fn turn_intent(input: &InputSnapshot) -> f32 {
    let mut turn = 0.0;
    if input.is_down(InputAction::TurnLeft) {
        turn += 1.0;
    }
    if input.is_down(InputAction::TurnRight) {
        turn -= 1.0;
    }
    turn
}
