//! Platform-agnostic WebXR input abstraction (spec §9: "mixed coroutine
//! / callback / event patterns ... unify around the single cooperative
//! task queue").
//!
//! [`XrBackend`] is the seam between this crate's locomotion/teleport
//! math and the actual `web-sys` WebXR bindings (behind the `webxr`
//! feature); [`NullXrBackend`] lets the coordinator, its locomotion
//! ramping, and its teleport-arc construction run and be unit-tested
//! outside a browser.

use glam::Vec3;

/// Which hand a controller or hand-tracking source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Left,
    Right,
}

/// Sampled state of one standard-gamepad tracked controller for a
/// single tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSample {
    /// Controller grip position in world space.
    pub position: Vec3,
    /// Controller forward direction (aim ray), world space, normalized.
    pub forward: Vec3,
    /// Thumbstick axes, `(x, y)`, read from `axes[2]`/`axes[3]` per the
    /// standard WebXR gamepad mapping (spec §4.1 step 1).
    pub stick: (f32, f32),
    /// Button 1 (grip/squeeze) pressed.
    pub grip_pressed: bool,
    /// Button 4 pressed this tick (X on left, A on right).
    pub button4_pressed: bool,
    /// Button 5 pressed this tick (Y on left, B on right).
    pub button5_pressed: bool,
    /// Trigger (button 0) pressed this tick.
    pub trigger_pressed: bool,
}

/// Sampled hand-joint tracking state, used as a gamepad fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandJointSample {
    pub wrist: Vec3,
    pub thumb_tip: Vec3,
    pub index_tip: Vec3,
    /// The four non-thumb fingertip positions, for fist detection.
    pub other_finger_tips: [Vec3; 4],
}

/// Per-hand input for one tick: either a standard gamepad controller, a
/// hand-joint tracking source (fallback), or nothing (disconnected).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HandInput {
    Controller(ControllerSample),
    Hand(HandJointSample),
    None,
}

/// Source abstraction for per-tick XR input sampling. A real
/// implementation reads `XRFrame`/`Gamepad` state through `web-sys`;
/// [`NullXrBackend`] returns `HandInput::None` for both hands, useful
/// for exercising the coordinator's state machine without a session.
pub trait XrBackend {
    /// Whether a presenting session currently exists.
    fn is_presenting(&self) -> bool;
    /// Sample the current tick's input for `hand`.
    fn sample(&self, hand: Hand) -> HandInput;
}

/// No-op backend: never presenting, no controllers. Used by the native
/// preview binary and by tests that only exercise pure locomotion math.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullXrBackend;

impl XrBackend for NullXrBackend {
    fn is_presenting(&self) -> bool {
        false
    }

    fn sample(&self, _hand: Hand) -> HandInput {
        HandInput::None
    }
}
