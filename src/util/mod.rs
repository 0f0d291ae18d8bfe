//! Shared utilities used across the camera, particle, and VR subsystems.

/// Deferred (delayed) task queue, for the session-end restore races.
pub mod deferred;
/// Easing curves for animation interpolation (camera focus transitions).
pub mod easing;
/// Per-frame timing, FPS smoothing, and soft frame-rate capping.
pub mod frame_timing;
/// Small numeric helpers: angle wrapping, deadzone, exponential smoothing.
pub mod math;
