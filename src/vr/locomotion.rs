//! Smooth locomotion: ramped movement/turning/vertical flight, plus
//! periodic drift correction on the accumulated yaw (spec §4.1 steps
//! 3-6).

use glam::{Quat, Vec3};

use crate::util::math::{deadzone, exp_smooth, ramp_toward, wrap_angle};

use super::comfort::{ComfortSettings, TurningMode};
use super::controllers::ResolvedHand;

/// Base horizontal movement speed, meters/second, before boost.
pub const MOVE_SPEED: f32 = 1.5;
/// Vertical flight speed, meters/second, before boost.
pub const FLY_SPEED: f32 = 1.0;
/// Speed multiplier applied while the left grip is held.
pub const SPEED_MULTIPLIER: f32 = 3.0;
/// Rate at which `current_speed` ramps toward `target_speed`, units/s.
pub const SPEED_RAMP_RATE: f32 = 3.0;
/// Rate at which `current_boost` ramps toward `target_boost`, units/s.
pub const BOOST_RAMP_RATE: f32 = 6.0;
/// Smooth-turn base rate, radians/second, before reduced-motion halving.
pub const TURN_SPEED: f32 = 1.2;
/// Smoothing factor applied to the turn stick before integrating yaw.
pub const TURN_SMOOTHING: f32 = 0.1;
/// Deadzone applied to the turn stick before smoothing, so residual
/// stick noise below this magnitude never produces a yaw delta.
pub const TURN_DEADZONE: f32 = 0.15;
/// Turn integration is clamped to this tick length so a long frame
/// doesn't produce an oversized single-tick rotation.
const MAX_TURN_DT: f32 = 1.0 / 30.0;
/// Stick-x magnitude above which a snap-turn fires.
pub const SNAP_TURN_THRESHOLD: f32 = 0.7;
/// Snap-turn cooldown, milliseconds.
pub const SNAP_TURN_COOLDOWN_MS: u64 = 500;
/// Deadzone applied to the vertical-flight stick axis.
pub const VERTICAL_DEADZONE: f32 = 0.1;
/// Vertical-flight multiplier while the turn hand's grip is held.
pub const VERTICAL_BOOST_MULTIPLIER: f32 = 3.0;
/// Movement-magnitude threshold that flips `is_moving` and fires the
/// movement-start/stop events.
pub const MOVEMENT_THRESHOLD: f32 = 0.05;
/// Drift correction runs once every this many ticks.
pub const DRIFT_CORRECTION_INTERVAL_TICKS: u32 = 60;
/// Below this magnitude, `last_turn_input` is treated as "at rest" and
/// excluded from drift correction.
const LAST_TURN_INPUT_QUIET: f32 = 0.01;

/// Which locomotion-threshold edge was crossed this tick, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementEdge {
    /// Movement magnitude just crossed above [`MOVEMENT_THRESHOLD`].
    Started,
    /// Movement magnitude just crossed below [`MOVEMENT_THRESHOLD`].
    Stopped,
}

/// Continuous locomotion state, ramped rather than snapped so motion
/// starts/stops smoothly (comfort: avoids instant-start/stop vection).
#[derive(Debug, Clone, Copy)]
pub struct LocomotionState {
    /// Whether horizontal+vertical movement exceeds [`MOVEMENT_THRESHOLD`].
    pub is_moving: bool,
    /// Current ramped movement speed, meters/second.
    pub current_speed: f32,
    /// Speed the current tick's input is ramping toward.
    pub target_speed: f32,
    /// Current ramped boost multiplier, `[0, 1]`.
    pub current_boost: f32,
    /// Boost the current tick's grip input is ramping toward.
    pub target_boost: f32,
    /// Raw turn-stick X axis from the most recent tick.
    pub last_turn_input: f32,
    smoothed_turn_stick: f32,
    snap_cooldown_remaining_ms: u64,
    ticks_since_drift_check: u32,
}

impl Default for LocomotionState {
    fn default() -> Self {
        Self {
            is_moving: false,
            current_speed: 0.0,
            target_speed: 0.0,
            current_boost: 0.0,
            target_boost: 0.0,
            last_turn_input: 0.0,
            smoothed_turn_stick: 0.0,
            snap_cooldown_remaining_ms: 0,
            ticks_since_drift_check: 0,
        }
    }
}

/// Output of one locomotion tick: the rig translation (world space) and
/// yaw delta (radians) to apply, plus any threshold-crossing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocomotionOutput {
    /// World-space translation to apply to the rig this tick.
    pub translation: Vec3,
    /// Yaw rotation, in radians, to apply to the rig this tick.
    pub yaw_delta: f32,
    /// A movement-threshold edge, if one was crossed this tick.
    pub movement_edge: Option<MovementEdge>,
    /// Whether a snap-turn fired this tick.
    pub snap_turned: bool,
}

impl LocomotionState {
    /// Create a state with zero speed, boost, and accumulated turn.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance smooth locomotion by one tick. `rig_forward`/`rig_right`
    /// are the rig's current horizontal basis vectors (Y component
    /// zeroed, normalized) used to project the movement stick into
    /// world space. `vertical_enabled` gates the right-hand vertical
    /// flight axis, so callers in teleport mode can suppress it while
    /// the arc is active (the same axis then adjusts the floor offset
    /// instead; spec §4.1 steps 3-4).
    #[must_use]
    pub fn tick(
        &mut self,
        dt: f32,
        dt_ms: u64,
        move_hand: ResolvedHand,
        turn_hand: ResolvedHand,
        rig_forward: Vec3,
        rig_right: Vec3,
        comfort: &ComfortSettings,
        vertical_enabled: bool,
    ) -> LocomotionOutput {
        let comfort_speed = comfort.effective_comfort_speed();
        let (mx, my) = move_hand.stick;

        self.target_boost = if move_hand.grip_pressed { 1.0 } else { 0.0 };
        self.current_boost = ramp_toward(self.current_boost, self.target_boost, BOOST_RAMP_RATE, dt);
        let boost_multiplier = 1.0 + self.current_boost * (SPEED_MULTIPLIER - 1.0);

        let horizontal_magnitude = (mx * mx + my * my).sqrt().min(1.0);
        self.target_speed = horizontal_magnitude * MOVE_SPEED * boost_multiplier * comfort_speed;
        self.current_speed = ramp_toward(self.current_speed, self.target_speed, SPEED_RAMP_RATE, dt);

        let horizontal = if horizontal_magnitude > 0.0 {
            (rig_forward * -my + rig_right * mx).normalize_or_zero()
        } else {
            Vec3::ZERO
        };
        let mut translation = horizontal * self.current_speed * dt;

        let (tx, ty) = turn_hand.stick;
        if vertical_enabled {
            let vertical_input = deadzone(ty, VERTICAL_DEADZONE);
            let vertical_multiplier = if turn_hand.grip_pressed { VERTICAL_BOOST_MULTIPLIER } else { 1.0 };
            translation.y += -vertical_input * FLY_SPEED * vertical_multiplier * comfort_speed * dt;
        }

        let was_moving = self.is_moving;
        let moving_now = translation.length() / dt.max(1e-6) > MOVEMENT_THRESHOLD;
        self.is_moving = moving_now;
        let movement_edge = match (was_moving, moving_now) {
            (false, true) => Some(MovementEdge::Started),
            (true, false) => Some(MovementEdge::Stopped),
            _ => None,
        };

        self.last_turn_input = tx;
        let mut yaw_delta = 0.0;
        let mut snap_turned = false;

        self.snap_cooldown_remaining_ms = self.snap_cooldown_remaining_ms.saturating_sub(dt_ms);

        match comfort.turning_mode {
            TurningMode::Smooth => {
                let gated_tx = deadzone(tx, TURN_DEADZONE);
                self.smoothed_turn_stick = exp_smooth(self.smoothed_turn_stick, gated_tx, TURN_SMOOTHING);
                let turn_speed = if comfort.reduced_motion { TURN_SPEED * 0.5 } else { TURN_SPEED };
                yaw_delta = -self.smoothed_turn_stick * turn_speed * dt.min(MAX_TURN_DT);
            }
            TurningMode::Snap => {
                if self.snap_cooldown_remaining_ms == 0 && tx.abs() > SNAP_TURN_THRESHOLD {
                    let direction = if tx > 0.0 { -1.0 } else { 1.0 };
                    yaw_delta = direction * comfort.snap_turn_angle_degrees.to_radians();
                    self.snap_cooldown_remaining_ms = SNAP_TURN_COOLDOWN_MS;
                    snap_turned = true;
                }
            }
        }

        self.ticks_since_drift_check += 1;
        if self.ticks_since_drift_check >= DRIFT_CORRECTION_INTERVAL_TICKS {
            self.ticks_since_drift_check = 0;
            if self.last_turn_input.abs() < LAST_TURN_INPUT_QUIET {
                yaw_delta = 0.0;
            }
        }

        LocomotionOutput { translation, yaw_delta: wrap_angle(yaw_delta), movement_edge, snap_turned }
    }
}

/// Build a yaw-only rotation quaternion from an accumulated angle.
#[must_use]
pub fn yaw_rotation(yaw: f32) -> Quat {
    Quat::from_rotation_y(yaw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vr::comfort::ComfortSettings;

    fn hand(stick: (f32, f32), grip: bool) -> ResolvedHand {
        ResolvedHand {
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            stick,
            grip_pressed: grip,
            primary_pressed: false,
            button4_rising: false,
            button5_rising: false,
            connected: true,
        }
    }

    #[test]
    fn speed_ramps_up_rather_than_snapping() {
        let mut state = LocomotionState::new();
        let comfort = ComfortSettings::free();
        let out = state.tick(0.1, 100, hand((0.0, 1.0), false), hand((0.0, 0.0), false), Vec3::NEG_Z, Vec3::X, &comfort, true);
        assert!(out.translation.length() > 0.0);
        assert!(state.current_speed < MOVE_SPEED);
    }

    #[test]
    fn grip_boost_increases_target_speed() {
        let mut no_boost = LocomotionState::new();
        let mut boosted = LocomotionState::new();
        let comfort = ComfortSettings::free();
        for _ in 0..20 {
            no_boost.tick(0.1, 100, hand((0.0, 1.0), false), hand((0.0, 0.0), false), Vec3::NEG_Z, Vec3::X, &comfort, true);
            boosted.tick(0.1, 100, hand((0.0, 1.0), true), hand((0.0, 0.0), false), Vec3::NEG_Z, Vec3::X, &comfort, true);
        }
        assert!(boosted.current_speed > no_boost.current_speed);
    }

    #[test]
    fn movement_started_edge_fires_once_crossing_threshold() {
        let mut state = LocomotionState::new();
        let comfort = ComfortSettings::free();
        let first = state.tick(0.1, 100, hand((0.0, 1.0), false), hand((0.0, 0.0), false), Vec3::NEG_Z, Vec3::X, &comfort, true);
        assert_eq!(first.movement_edge, Some(MovementEdge::Started));
        let second = state.tick(0.1, 100, hand((0.0, 1.0), false), hand((0.0, 0.0), false), Vec3::NEG_Z, Vec3::X, &comfort, true);
        assert_eq!(second.movement_edge, None);
    }

    #[test]
    fn reduced_motion_halves_smooth_turn_rate() {
        let mut free = LocomotionState::new();
        let mut reduced = LocomotionState::new();
        let mut comfort = ComfortSettings::free();
        let free_out = free.tick(0.1, 100, hand((0.0, 0.0), false), hand((1.0, 0.0), false), Vec3::NEG_Z, Vec3::X, &comfort, true);
        comfort.reduced_motion = true;
        let reduced_out = reduced.tick(0.1, 100, hand((0.0, 0.0), false), hand((1.0, 0.0), false), Vec3::NEG_Z, Vec3::X, &comfort, true);
        assert!(reduced_out.yaw_delta.abs() < free_out.yaw_delta.abs());
    }

    #[test]
    fn smooth_turn_deadzone_suppresses_sub_threshold_stick() {
        let mut state = LocomotionState::new();
        let comfort = ComfortSettings::free();
        let out = state.tick(0.1, 100, hand((0.0, 0.0), false), hand((0.1, 0.0), false), Vec3::NEG_Z, Vec3::X, &comfort, true);
        assert_eq!(out.yaw_delta, 0.0);
    }

    #[test]
    fn snap_turn_only_fires_once_per_cooldown() {
        let mut state = LocomotionState::new();
        let comfort = ComfortSettings::comfort();
        let first = state.tick(0.1, 100, hand((0.0, 0.0), false), hand((1.0, 0.0), false), Vec3::NEG_Z, Vec3::X, &comfort, true);
        let second = state.tick(0.1, 100, hand((0.0, 0.0), false), hand((1.0, 0.0), false), Vec3::NEG_Z, Vec3::X, &comfort, true);
        assert!(first.snap_turned);
        assert!(!second.snap_turned);
    }

    #[test]
    fn snap_turn_requires_the_higher_threshold() {
        let mut state = LocomotionState::new();
        let comfort = ComfortSettings::comfort();
        let out = state.tick(0.1, 100, hand((0.0, 0.0), false), hand((0.6, 0.0), false), Vec3::NEG_Z, Vec3::X, &comfort, true);
        assert!(!out.snap_turned);
    }

    #[test]
    fn snap_turn_unlocks_after_cooldown_elapses() {
        let mut state = LocomotionState::new();
        let comfort = ComfortSettings::comfort();
        state.tick(0.1, 100, hand((0.0, 0.0), false), hand((1.0, 0.0), false), Vec3::NEG_Z, Vec3::X, &comfort, true);
        for _ in 0..4 {
            state.tick(0.1, 100, hand((0.0, 0.0), false), hand((1.0, 0.0), false), Vec3::NEG_Z, Vec3::X, &comfort, true);
        }
        let after_cooldown = state.tick(0.1, 100, hand((0.0, 0.0), false), hand((1.0, 0.0), false), Vec3::NEG_Z, Vec3::X, &comfort, true);
        assert!(after_cooldown.snap_turned);
    }

    #[test]
    fn drift_correction_zeroes_yaw_when_turn_input_is_quiet() {
        let mut state = LocomotionState::new();
        let comfort = ComfortSettings::free();
        let mut last = LocomotionOutput::default();
        for _ in 0..DRIFT_CORRECTION_INTERVAL_TICKS {
            last = state.tick(0.1, 100, hand((0.0, 0.0), false), hand((0.0, 0.0), false), Vec3::NEG_Z, Vec3::X, &comfort, true);
        }
        assert_eq!(last.yaw_delta, 0.0);
    }

    #[test]
    fn vertical_flight_follows_right_stick_y_continuously() {
        let mut state = LocomotionState::new();
        let comfort = ComfortSettings::free();
        let out = state.tick(0.1, 100, hand((0.0, 0.0), false), hand((0.0, -0.5), false), Vec3::NEG_Z, Vec3::X, &comfort, true);
        assert!(out.translation.y > 0.0);
    }

    #[test]
    fn vertical_flight_deadzone_suppresses_small_stick() {
        let mut state = LocomotionState::new();
        let comfort = ComfortSettings::free();
        let out = state.tick(0.1, 100, hand((0.0, 0.0), false), hand((0.0, -0.05), false), Vec3::NEG_Z, Vec3::X, &comfort, true);
        assert_eq!(out.translation.y, 0.0);
    }

    #[test]
    fn vertical_flight_grip_boosts_climb_rate() {
        let mut slow = LocomotionState::new();
        let mut boosted = LocomotionState::new();
        let comfort = ComfortSettings::free();
        let slow_out = slow.tick(0.1, 100, hand((0.0, 0.0), false), hand((0.0, -0.5), false), Vec3::NEG_Z, Vec3::X, &comfort, true);
        let boosted_out = boosted.tick(0.1, 100, hand((0.0, 0.0), false), hand((0.0, -0.5), true), Vec3::NEG_Z, Vec3::X, &comfort, true);
        assert!(boosted_out.translation.y > slow_out.translation.y);
    }

    #[test]
    fn vertical_flight_disabled_while_teleport_arc_is_active() {
        let mut state = LocomotionState::new();
        let comfort = ComfortSettings::free();
        let out = state.tick(0.1, 100, hand((0.0, 0.0), false), hand((0.0, -0.5), false), Vec3::NEG_Z, Vec3::X, &comfort, false);
        assert_eq!(out.translation.y, 0.0);
    }
}
