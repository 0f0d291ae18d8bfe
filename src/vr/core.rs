//! VR session coordinator (C8): session lifecycle state machine,
//! per-frame locomotion/teleport integration, and the desktop-camera
//! preservation handoff (spec §4.1, §4.3).

use glam::Vec3;
use web_time::Instant;

use crate::camera::controller::CameraController;
use crate::camera::preservation::PreHmdCameraState;
use crate::event_bus::EventBus;
use crate::measurement::ghost_sphere::GhostSphereState;
use crate::util::deferred::DeferredQueue;

use super::audio::{AudioSink, LocomotionAudio};
use super::comfort::{ComfortSettings, ComfortTransition, LocomotionMode};
use super::controllers::{ControllerTracker, ResolvedHand};
use super::locomotion::{yaw_rotation, LocomotionState};
use super::teleport::{self, AimState};
use super::xr_backend::{Hand, HandInput, XrBackend};

/// Milliseconds after session-end before the preserved desktop camera
/// state is restored (spec §4.3: long enough for the renderer's own
/// session-end handling to settle first).
pub const CAMERA_RESTORE_DELAY_MS: u64 = 100;
/// Milliseconds after restore before the desktop pose is reapplied a
/// second time, covering a late resize/layout pass that can otherwise
/// clobber it.
pub const DESKTOP_POSE_REAPPLY_DELAY_MS: u64 = 50;

/// Session lifecycle states (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session requested or active.
    Idle,
    /// A session request has been issued and is awaiting grant/denial.
    Pending,
    /// A session is active and driving locomotion/teleport.
    Presenting,
    /// A session is ending; deferred camera restore is pending.
    Exiting,
}

#[derive(Debug, Clone, Copy)]
enum DeferredAction {
    RestoreDesktopCamera,
    ReapplyDesktopPose,
}

/// The rig's accumulated world transform: position plus yaw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigPose {
    /// World-space rig position.
    pub position: Vec3,
    /// Accumulated yaw, radians.
    pub yaw: f32,
    /// Teleport floor-offset adjustment, meters.
    pub floor_offset: f32,
}

impl Default for RigPose {
    fn default() -> Self {
        Self { position: Vec3::ZERO, yaw: 0.0, floor_offset: teleport::POST_TELEPORT_FLOOR_OFFSET_M }
    }
}

/// Owns VR session lifecycle, locomotion, teleport, and comfort state,
/// and drives the desktop-camera preservation handoff around it.
pub struct VrCoordinator {
    state: SessionState,
    comfort: ComfortSettings,
    rig: RigPose,
    preserved_camera: Option<PreHmdCameraState>,
    deferred: DeferredQueue<DeferredAction>,
    desktop_controls_enabled: bool,

    left_tracker: ControllerTracker,
    right_tracker: ControllerTracker,
    locomotion: LocomotionState,
    left_aim: AimState,
    /// Running peak of the left-stick magnitude since aiming began,
    /// feeding the sub-linear aim-distance curve (spec §4.1 step 2).
    aim_max_magnitude: f32,
    /// Floor intersection computed on the most recent aiming tick,
    /// resolved on release.
    pending_teleport: Option<Vec3>,
    left_ghost: GhostSphereState,
    right_ghost: GhostSphereState,
    audio: LocomotionAudio,
}

impl Default for VrCoordinator {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            comfort: ComfortSettings::free(),
            rig: RigPose::default(),
            preserved_camera: None,
            deferred: DeferredQueue::new(),
            desktop_controls_enabled: true,
            left_tracker: ControllerTracker::new(),
            right_tracker: ControllerTracker::new(),
            locomotion: LocomotionState::new(),
            left_aim: AimState::Idle,
            aim_max_magnitude: 0.0,
            pending_teleport: None,
            left_ghost: GhostSphereState::new(),
            right_ghost: GhostSphereState::new(),
            audio: LocomotionAudio::new(),
        }
    }
}

impl VrCoordinator {
    /// Create a coordinator in [`SessionState::Idle`] with `free` comfort.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Shorthand for `state() == SessionState::Presenting`.
    #[must_use]
    pub fn is_presenting(&self) -> bool {
        self.state == SessionState::Presenting
    }

    /// Whether the orchestrator should currently route mouse/keyboard
    /// input to the desktop camera controller.
    #[must_use]
    pub fn desktop_controls_enabled(&self) -> bool {
        self.desktop_controls_enabled
    }

    /// Current comfort settings.
    #[must_use]
    pub fn comfort(&self) -> ComfortSettings {
        self.comfort
    }

    /// Current rig pose.
    #[must_use]
    pub fn rig_pose(&self) -> RigPose {
        self.rig
    }

    /// A session request has been issued; present only resolves this on
    /// success via [`VrCoordinator::begin_session`].
    pub fn request_session(&mut self) {
        if self.state == SessionState::Idle {
            self.state = SessionState::Pending;
        }
    }

    /// The browser granted the session. Captures the desktop camera
    /// state, disables desktop controls, applies the loaded model's
    /// HMD initial pose (if one is configured), and starts ambience
    /// audio, in that order (spec §4.1/§4.3 exact ordering).
    pub fn begin_session(
        &mut self,
        camera: &CameraController,
        initial_pose: Option<Vec3>,
        audio_sink: &mut dyn AudioSink,
        events: &mut EventBus,
    ) {
        if self.state != SessionState::Pending && self.state != SessionState::Idle {
            return;
        }
        self.preserved_camera = Some(PreHmdCameraState::capture(camera));
        self.desktop_controls_enabled = false;
        self.state = SessionState::Presenting;
        self.rig = RigPose::default();
        if let Some(pose) = initial_pose {
            self.rig.position = pose;
        }
        self.audio.set_presenting(true, audio_sink);
        events.emit("vr-session-start", Box::new(()));
    }

    /// A session request failed or was rejected.
    pub fn session_request_failed(&mut self) {
        if self.state == SessionState::Pending {
            self.state = SessionState::Idle;
        }
    }

    /// The session is ending (user removed the headset, or called
    /// `XRSession.end()`). Schedules the deferred camera-restore
    /// sequence and re-enables desktop controls immediately.
    pub fn end_session(&mut self, audio_sink: &mut dyn AudioSink, events: &mut EventBus, now: Instant) {
        if self.state != SessionState::Presenting {
            return;
        }
        self.state = SessionState::Exiting;
        self.audio.set_presenting(false, audio_sink);
        self.deferred.schedule(CAMERA_RESTORE_DELAY_MS, DeferredAction::RestoreDesktopCamera, now);
        events.emit("vr-session-end", Box::new(()));
    }

    /// Drain deferred actions due at `now`, restoring the desktop camera
    /// and re-enabling controls, then scheduling the follow-up pose
    /// reapply.
    pub fn drain_deferred(&mut self, camera: &mut CameraController, now: Instant) {
        for action in self.deferred.drain_due(now) {
            match action {
                DeferredAction::RestoreDesktopCamera => {
                    if let Some(preserved) = self.preserved_camera.take() {
                        preserved.restore(camera);
                    }
                    self.desktop_controls_enabled = true;
                    self.state = SessionState::Idle;
                    self.deferred.schedule(DESKTOP_POSE_REAPPLY_DELAY_MS, DeferredAction::ReapplyDesktopPose, now);
                }
                DeferredAction::ReapplyDesktopPose => {
                    if let Some(preserved) = self.preserved_camera {
                        preserved.restore(camera);
                    }
                }
            }
        }
    }

    /// Apply new comfort settings, resetting in-flight teleport aiming
    /// if the locomotion mode changed and notifying the host.
    pub fn set_comfort(&mut self, comfort: ComfortSettings, events: &mut EventBus) {
        let transition = ComfortTransition::diff(&self.comfort, &comfort);
        self.comfort = comfort;
        if transition.locomotion_mode_changed {
            self.left_aim = AimState::Idle;
            self.aim_max_magnitude = 0.0;
            self.pending_teleport = None;
            events.emit("vr-locomotion-mode-changed", Box::new(comfort.locomotion_mode));
        }
    }

    /// Per-frame update: sample both hands, advance locomotion or
    /// teleport aiming depending on the comfort mode, integrate the rig
    /// pose, and drive audio. Returns the translation/yaw applied this
    /// tick so the caller can move the actual XR reference space.
    pub fn tick(
        &mut self,
        dt: f32,
        dt_ms: u64,
        backend: &dyn XrBackend,
        audio_sink: &mut dyn AudioSink,
        events: &mut EventBus,
    ) {
        if self.state != SessionState::Presenting {
            return;
        }

        let left = self.left_tracker.resolve(backend.sample(Hand::Left));
        let right = self.right_tracker.resolve(backend.sample(Hand::Right));

        if left.button4_rising || right.button4_rising {
            let next = match self.comfort.locomotion_mode {
                LocomotionMode::Smooth => ComfortSettings { locomotion_mode: LocomotionMode::Teleport, ..self.comfort },
                LocomotionMode::Teleport => ComfortSettings { locomotion_mode: LocomotionMode::Smooth, ..self.comfort },
            };
            self.set_comfort(next, events);
        }

        match self.comfort.locomotion_mode {
            LocomotionMode::Smooth => {
                let forward = forward_from_yaw(self.rig.yaw);
                let right_axis = Vec3::new(forward.z, 0.0, -forward.x);
                let out = self.locomotion.tick(dt, dt_ms, left, right, forward, right_axis, &self.comfort, true);
                self.rig.position += out.translation;
                self.rig.yaw += out.yaw_delta;

                let speed_fraction = (self.locomotion.current_speed / super::locomotion::MOVE_SPEED).clamp(0.0, 1.0);
                self.audio.update(speed_fraction, self.locomotion.current_boost, audio_sink);

                if let Some(edge) = out.movement_edge {
                    let name = match edge {
                        super::locomotion::MovementEdge::Started => "vr-movement-start",
                        super::locomotion::MovementEdge::Stopped => "vr-movement-stop",
                    };
                    events.emit(name, Box::new(()));
                }
                if out.snap_turned {
                    events.emit("vr-snap-turn", Box::new(()));
                }
            }
            LocomotionMode::Teleport => {
                let (lx, ly) = left.stick;
                let aim_magnitude = (lx * lx + ly * ly).sqrt().min(1.0);
                let prior_aim = self.left_aim;
                let next_aim = teleport::next_aim_state(prior_aim, aim_magnitude);

                if next_aim == AimState::Aiming {
                    self.aim_max_magnitude = self.aim_max_magnitude.max(aim_magnitude);
                    let normalized = (self.aim_max_magnitude / teleport::AIM_THRESHOLD).min(1.0);
                    let distance = teleport::distance_for_input(normalized);
                    let arc = teleport::build_arc(left.position, left.forward, distance);
                    let floor_y = self.rig.position.y + self.rig.floor_offset;
                    self.pending_teleport = teleport::find_floor_intersection(&arc, left.position, floor_y);

                    let (_rx, ry) = right.stick;
                    self.adjust_floor_offset(-ry * teleport::FLOOR_OFFSET_RATE_M_PER_S * dt);
                }

                if teleport::just_released(prior_aim, next_aim) {
                    if let Some(target_xz) = self.pending_teleport {
                        if teleport::is_valid_release_distance(left.position, target_xz) {
                            let target = Vec3::new(target_xz.x, self.rig.position.y, target_xz.z);
                            self.apply_teleport(target, events);
                        }
                    }
                    self.aim_max_magnitude = 0.0;
                    self.pending_teleport = None;
                }

                self.left_aim = next_aim;

                // The left stick drives aim, not translation, while in
                // teleport mode.
                let no_move_hand = ResolvedHand { stick: (0.0, 0.0), ..left };
                let vertical_enabled = next_aim != AimState::Aiming;
                let forward = forward_from_yaw(self.rig.yaw);
                let right_axis = Vec3::new(forward.z, 0.0, -forward.x);
                let out = self.locomotion.tick(
                    dt,
                    dt_ms,
                    no_move_hand,
                    right,
                    forward,
                    right_axis,
                    &self.comfort,
                    vertical_enabled,
                );
                self.rig.position += out.translation;
                self.rig.yaw += out.yaw_delta;
                if out.snap_turned {
                    events.emit("vr-snap-turn", Box::new(()));
                }
            }
        }

        if !left.connected {
            self.left_ghost.detach();
        }
        if !right.connected {
            self.right_ghost.detach();
        }
    }

    /// Apply a validated teleport target to the rig (XZ only, preserving
    /// the rig's current Y) and reset the floor offset to its
    /// post-teleport resting value.
    pub fn apply_teleport(&mut self, target: Vec3, events: &mut EventBus) {
        self.rig.position.x = target.x;
        self.rig.position.z = target.z;
        self.rig.floor_offset = teleport::POST_TELEPORT_FLOOR_OFFSET_M;
        events.emit("vr-teleported", Box::new(self.rig.position));
    }

    /// Nudge the floor offset by `delta`, clamped to the allowed band.
    pub fn adjust_floor_offset(&mut self, delta: f32) {
        self.rig.floor_offset = teleport::clamp_floor_offset(self.rig.floor_offset + delta);
    }

    /// Left-hand ghost-sphere attachment state, for the orchestrator to
    /// drive per-tick attach/corruption checks.
    #[must_use]
    pub fn left_ghost_mut(&mut self) -> &mut GhostSphereState {
        &mut self.left_ghost
    }

    /// Right-hand ghost-sphere attachment state.
    #[must_use]
    pub fn right_ghost_mut(&mut self) -> &mut GhostSphereState {
        &mut self.right_ghost
    }
}

fn forward_from_yaw(yaw: f32) -> Vec3 {
    yaw_rotation(yaw) * Vec3::NEG_Z
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vr::xr_backend::NullXrBackend;

    #[derive(Default)]
    struct SilentSink;
    impl AudioSink for SilentSink {
        fn start(&mut self, _: &str) {}
        fn stop(&mut self, _: &str) {}
        fn set_level(&mut self, _: &str, _: f32) {}
    }

    #[test]
    fn session_request_moves_idle_to_pending() {
        let mut coordinator = VrCoordinator::new();
        coordinator.request_session();
        assert_eq!(coordinator.state(), SessionState::Pending);
    }

    #[test]
    fn failed_request_returns_to_idle() {
        let mut coordinator = VrCoordinator::new();
        coordinator.request_session();
        coordinator.session_request_failed();
        assert_eq!(coordinator.state(), SessionState::Idle);
    }

    #[test]
    fn tick_is_a_no_op_outside_a_presenting_session() {
        let mut coordinator = VrCoordinator::new();
        let mut events = EventBus::new();
        let mut sink = SilentSink;
        coordinator.tick(0.1, 100, &NullXrBackend, &mut sink, &mut events);
        assert_eq!(coordinator.rig_pose(), RigPose::default());
    }

    #[test]
    fn ending_session_transitions_through_exiting_to_idle_after_deferred_restore() {
        let mut coordinator = VrCoordinator::new();
        coordinator.state = SessionState::Presenting;
        let mut events = EventBus::new();
        let mut sink = SilentSink;
        let t0 = Instant::now();
        coordinator.end_session(&mut sink, &mut events, t0);
        assert_eq!(coordinator.state(), SessionState::Exiting);
        assert!(!coordinator.desktop_controls_enabled());
    }

    #[test]
    fn apply_teleport_resets_floor_offset_to_resting_value() {
        let mut coordinator = VrCoordinator::new();
        let mut events = EventBus::new();
        coordinator.rig.floor_offset = 5.0;
        coordinator.apply_teleport(Vec3::new(1.0, 0.0, 2.0), &mut events);
        assert_eq!(coordinator.rig_pose().floor_offset, teleport::POST_TELEPORT_FLOOR_OFFSET_M);
    }

    #[test]
    fn floor_offset_adjustment_is_clamped() {
        let mut coordinator = VrCoordinator::new();
        coordinator.adjust_floor_offset(-100.0);
        assert_eq!(coordinator.rig_pose().floor_offset, teleport::MIN_FLOOR_OFFSET_M);
    }

    use crate::vr::xr_backend::ControllerSample;
    use std::cell::RefCell;

    fn controller_sample(stick: (f32, f32), forward: Vec3) -> ControllerSample {
        ControllerSample {
            position: Vec3::ZERO,
            forward,
            stick,
            grip_pressed: false,
            button4_pressed: false,
            button5_pressed: false,
            trigger_pressed: false,
        }
    }

    struct ScriptedBackend {
        left: RefCell<ControllerSample>,
        right: RefCell<ControllerSample>,
    }

    impl XrBackend for ScriptedBackend {
        fn is_presenting(&self) -> bool {
            true
        }
        fn sample(&self, hand: Hand) -> HandInput {
            match hand {
                Hand::Left => HandInput::Controller(*self.left.borrow()),
                Hand::Right => HandInput::Controller(*self.right.borrow()),
            }
        }
    }

    #[test]
    fn teleport_release_moves_rig_xz_only_preserving_y() {
        let mut coordinator = VrCoordinator::new();
        coordinator.state = SessionState::Presenting;
        coordinator.comfort.locomotion_mode = LocomotionMode::Teleport;
        coordinator.rig.position = Vec3::new(0.0, 1.6, 0.0);
        let mut events = EventBus::new();
        let mut sink = SilentSink;

        let backend = ScriptedBackend {
            left: RefCell::new(controller_sample((0.0, 1.0), Vec3::NEG_Z)),
            right: RefCell::new(controller_sample((0.0, 0.0), Vec3::NEG_Z)),
        };

        for _ in 0..5 {
            coordinator.tick(0.1, 100, &backend, &mut sink, &mut events);
        }
        assert_eq!(coordinator.left_aim, AimState::Aiming);

        backend.left.borrow_mut().stick = (0.0, 0.0);
        coordinator.tick(0.1, 100, &backend, &mut sink, &mut events);

        assert_eq!(coordinator.left_aim, AimState::Idle);
        assert_eq!(coordinator.rig_pose().position.y, 1.6);
        assert_ne!(coordinator.rig_pose().position, Vec3::new(0.0, 1.6, 0.0));
        assert_eq!(coordinator.rig_pose().floor_offset, teleport::POST_TELEPORT_FLOOR_OFFSET_M);
    }

    #[test]
    fn right_stick_y_adjusts_floor_offset_while_aiming() {
        let mut coordinator = VrCoordinator::new();
        coordinator.state = SessionState::Presenting;
        coordinator.comfort.locomotion_mode = LocomotionMode::Teleport;
        let initial_offset = coordinator.rig_pose().floor_offset;
        let mut events = EventBus::new();
        let mut sink = SilentSink;

        let backend = ScriptedBackend {
            left: RefCell::new(controller_sample((0.0, 1.0), Vec3::NEG_Z)),
            right: RefCell::new(controller_sample((0.0, 1.0), Vec3::NEG_Z)),
        };

        coordinator.tick(0.1, 100, &backend, &mut sink, &mut events);
        assert_ne!(coordinator.rig_pose().floor_offset, initial_offset);
    }

    #[test]
    fn snap_turn_still_fires_while_teleport_aim_is_active() {
        let mut coordinator = VrCoordinator::new();
        coordinator.state = SessionState::Presenting;
        coordinator.comfort.locomotion_mode = LocomotionMode::Teleport;
        coordinator.comfort.turning_mode = crate::vr::comfort::TurningMode::Snap;
        let mut events = EventBus::new();
        let mut sink = SilentSink;

        let backend = ScriptedBackend {
            left: RefCell::new(controller_sample((0.0, 1.0), Vec3::NEG_Z)),
            right: RefCell::new(controller_sample((1.0, 0.0), Vec3::NEG_Z)),
        };

        let yaw_before = coordinator.rig_pose().yaw;
        coordinator.tick(0.1, 100, &backend, &mut sink, &mut events);
        assert_ne!(coordinator.rig_pose().yaw, yaw_before);
    }
}
