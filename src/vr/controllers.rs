//! Per-tick controller/hand-joint sampling, resolved down to the signals
//! locomotion and teleport actually consume (spec §4.1 steps 1-2).

use glam::Vec3;

use crate::util::math::deadzone;

use super::xr_backend::{ControllerSample, HandInput, HandJointSample};

/// Pinch distance (thumb tip to index tip) below which a hand is
/// considered "pinching" — the hand-tracking fallback for the trigger.
pub const PINCH_THRESHOLD_M: f32 = 0.025;
/// Average fingertip distance from the wrist below which a hand is
/// considered "fisted" — the hand-tracking fallback for grip.
pub const FIST_THRESHOLD_M: f32 = 0.045;
/// Stick deadzone radius applied before any turning/movement math.
pub const STICK_DEADZONE: f32 = 0.15;

/// Resolved signals for one hand on one tick, independent of whether
/// they came from a standard gamepad or hand-joint tracking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedHand {
    /// World-space controller/wrist position.
    pub position: Vec3,
    /// World-space forward (aim) direction.
    pub forward: Vec3,
    /// Movement/turn stick axes, deadzone-applied.
    pub stick: (f32, f32),
    /// Grip held (controller) or fist detected (hand tracking).
    pub grip_pressed: bool,
    /// Trigger held (controller) or pinch detected (hand tracking).
    pub primary_pressed: bool,
    /// Button 4 pressed for the first tick since it was last released.
    pub button4_rising: bool,
    /// Button 5 pressed for the first tick since it was last released.
    pub button5_rising: bool,
    /// Whether this hand has any live input source this tick.
    pub connected: bool,
}

impl ResolvedHand {
    fn disconnected() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            stick: (0.0, 0.0),
            grip_pressed: false,
            primary_pressed: false,
            button4_rising: false,
            button5_rising: false,
            connected: false,
        }
    }
}

/// Tracks previous-tick button state per hand so mode-toggle buttons
/// (4/5) fire on rising edge only, plus previous-frame pinch/fist state
/// for the hand-tracking fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerTracker {
    prev_button4: bool,
    prev_button5: bool,
}

impl ControllerTracker {
    /// Create a tracker with no recorded prior button state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve one hand's input for this tick, applying the stick
    /// deadzone and (for hand tracking) pinch/fist thresholds, and
    /// computing button-4/5 rising edges against the previous tick.
    pub fn resolve(&mut self, input: HandInput) -> ResolvedHand {
        let (button4_now, button5_now, mut resolved) = match input {
            HandInput::Controller(c) => (c.button4_pressed, c.button5_pressed, from_controller(c)),
            HandInput::Hand(h) => (false, false, from_hand(h)),
            HandInput::None => (false, false, ResolvedHand::disconnected()),
        };

        resolved.button4_rising = button4_now && !self.prev_button4;
        resolved.button5_rising = button5_now && !self.prev_button5;
        self.prev_button4 = button4_now;
        self.prev_button5 = button5_now;
        resolved
    }
}

fn from_controller(c: ControllerSample) -> ResolvedHand {
    let (sx, sy) = c.stick;
    ResolvedHand {
        position: c.position,
        forward: c.forward,
        stick: (deadzone(sx, STICK_DEADZONE), deadzone(sy, STICK_DEADZONE)),
        grip_pressed: c.grip_pressed,
        primary_pressed: c.trigger_pressed,
        button4_rising: false,
        button5_rising: false,
        connected: true,
    }
}

fn from_hand(h: HandJointSample) -> ResolvedHand {
    let pinch_distance = h.thumb_tip.distance(h.index_tip);
    let mean_tip_distance = h
        .other_finger_tips
        .iter()
        .map(|tip| tip.distance(h.wrist))
        .sum::<f32>()
        / h.other_finger_tips.len() as f32;

    ResolvedHand {
        position: h.wrist,
        forward: Vec3::NEG_Z,
        stick: (0.0, 0.0),
        grip_pressed: mean_tip_distance < FIST_THRESHOLD_M,
        primary_pressed: pinch_distance < PINCH_THRESHOLD_M,
        button4_rising: false,
        button5_rising: false,
        connected: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(stick: (f32, f32), grip: bool, b4: bool, b5: bool) -> HandInput {
        HandInput::Controller(ControllerSample {
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            stick,
            grip_pressed: grip,
            button4_pressed: b4,
            button5_pressed: b5,
            trigger_pressed: false,
        })
    }

    #[test]
    fn stick_within_deadzone_resolves_to_zero() {
        let mut tracker = ControllerTracker::new();
        let resolved = tracker.resolve(controller((0.1, -0.1), false, false, false));
        assert_eq!(resolved.stick, (0.0, 0.0));
    }

    #[test]
    fn stick_outside_deadzone_passes_through() {
        let mut tracker = ControllerTracker::new();
        let resolved = tracker.resolve(controller((0.9, 0.0), false, false, false));
        assert!(resolved.stick.0 > 0.8);
    }

    #[test]
    fn button4_only_rises_on_the_first_pressed_tick() {
        let mut tracker = ControllerTracker::new();
        let first = tracker.resolve(controller((0.0, 0.0), false, true, false));
        let second = tracker.resolve(controller((0.0, 0.0), false, true, false));
        assert!(first.button4_rising);
        assert!(!second.button4_rising);
    }

    #[test]
    fn pinch_below_threshold_resolves_as_primary_pressed() {
        let mut tracker = ControllerTracker::new();
        let hand = HandInput::Hand(HandJointSample {
            wrist: Vec3::ZERO,
            thumb_tip: Vec3::new(0.01, 0.0, 0.0),
            index_tip: Vec3::new(0.02, 0.0, 0.0),
            other_finger_tips: [Vec3::new(0.0, 0.2, 0.0); 4],
        });
        let resolved = tracker.resolve(hand);
        assert!(resolved.primary_pressed);
        assert!(!resolved.grip_pressed);
    }

    #[test]
    fn curled_fingers_below_fist_threshold_resolve_as_grip_pressed() {
        let mut tracker = ControllerTracker::new();
        let hand = HandInput::Hand(HandJointSample {
            wrist: Vec3::ZERO,
            thumb_tip: Vec3::new(0.2, 0.0, 0.0),
            index_tip: Vec3::new(0.2, 0.1, 0.0),
            other_finger_tips: [Vec3::new(0.02, 0.0, 0.0); 4],
        });
        let resolved = tracker.resolve(hand);
        assert!(resolved.grip_pressed);
    }

    #[test]
    fn disconnected_hand_reports_not_connected() {
        let mut tracker = ControllerTracker::new();
        let resolved = tracker.resolve(HandInput::None);
        assert!(!resolved.connected);
    }
}
