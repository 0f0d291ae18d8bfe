use glam::{Quat, Vec3};

use crate::camera::controller::CameraController;

/// Snapshot of every desktop orbit-camera parameter that must survive an
/// HMD session unchanged.
///
/// Populated exactly once on HMD session-start and consumed exactly once
/// on session-end, per the data model's invariant: `PreHmdCameraState` is
/// `None` outside of a presenting session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreHmdCameraState {
    focus_point: Vec3,
    orientation: Quat,
    distance: f32,
    min_distance: f32,
    max_distance: f32,
    damping_enabled: bool,
    damping_factor: f32,
}

impl PreHmdCameraState {
    /// Capture the controller's current orbit state. Called once, on
    /// `idle -> presenting`, before desktop controls are disabled.
    #[must_use]
    pub fn capture(controller: &CameraController) -> Self {
        Self {
            focus_point: controller.focus_point(),
            orientation: controller.orientation(),
            distance: controller.distance(),
            min_distance: controller.min_distance(),
            max_distance: controller.max_distance(),
            damping_enabled: controller.damping_enabled(),
            damping_factor: controller.damping_factor,
        }
    }

    /// Write the captured state back onto the controller, bit-for-bit
    /// (to within float round-trip precision). Called once, on the
    /// deferred (~100 ms) restore after `presenting -> idle`.
    pub fn restore(&self, controller: &mut CameraController) {
        controller.set_distance_limits(self.min_distance, self.max_distance);
        controller.set_damping(self.damping_enabled, self.damping_factor);
        controller.set_orbit_state(self.focus_point, self.orientation, self.distance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_restore_round_trips_within_tolerance() {
        // CameraController::new requires a live RenderContext (GPU device),
        // so the full capture/restore cycle is exercised as part of the
        // viewer orchestrator's HMD session-transition tests instead.
        // This checks the pure data carrier equality the restore step
        // relies on.
        let a = PreHmdCameraState {
            focus_point: Vec3::new(1.0, 2.0, 3.0),
            orientation: Quat::IDENTITY,
            distance: 10.0,
            min_distance: 0.5,
            max_distance: 100.0,
            damping_enabled: true,
            damping_factor: 0.1,
        };
        let b = a;
        assert_eq!(a, b);
    }
}
