//! Ghost-sphere parenting and corruption recovery (spec §4.2 "Ghost-
//! sphere robustness").
//!
//! A ghost sphere previews where a measurement point will land on
//! trigger release; it is parented to its controller at a fixed local
//! offset so it always reads as "glued to the controller tip" rather
//! than a world-space object that merely follows it. The HMD session
//! lifecycle can relinquish and re-acquire controllers (e.g. a system
//! browser overlay steals focus), which has been observed to leave a
//! re-attached child's local transform corrupted — this module
//! specifies the canonical transform and the per-tick check that resets
//! it.

use glam::Vec3;

use crate::scene::SceneNodeId;

/// Canonical local offset of a ghost sphere from its parenting
/// controller (spec §4.2): 5 cm directly in front of the controller
/// tip, zero local rotation.
pub const GHOST_LOCAL_OFFSET: Vec3 = Vec3::new(0.0, 0.0, -0.05);

/// A local-position magnitude beyond this indicates parenting
/// corruption (the child drifted into some other local frame) and must
/// be reset to the canonical offset.
const CORRUPTION_THRESHOLD_M: f32 = 1.0;

/// Bounded retry policy for (re)attaching a ghost sphere to its
/// controller: up to 40 attempts at 250 ms intervals before giving up
/// with a warning (spec §4.1/§9 "ad-hoc lifecycle bootstraps"
/// re-specified as an explicit bounded retry).
pub const MAX_ATTACH_ATTEMPTS: u32 = 40;
/// Interval between attach attempts, in milliseconds.
pub const ATTACH_RETRY_INTERVAL_MS: u64 = 250;

/// Per-hand ghost-sphere attachment state.
#[derive(Debug, Clone, Copy, Default)]
pub struct GhostSphereState {
    sphere: Option<SceneNodeId>,
    attempts: u32,
    exhausted: bool,
}

impl GhostSphereState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sphere(&self) -> Option<SceneNodeId> {
        self.sphere
    }

    /// Whether the retry budget has been exhausted (a warning should
    /// already have been surfaced when this first became `true`).
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Controller connected with no sphere currently attached: attempt
    /// to attach, consuming one retry. Returns `true` if this call
    /// performed the attach (caller parents `sphere` at
    /// [`GHOST_LOCAL_OFFSET`] with zero rotation) — `false` means
    /// either already attached or the retry budget is exhausted.
    pub fn try_attach(&mut self, sphere: SceneNodeId) -> bool {
        if self.sphere.is_some() || self.exhausted {
            return false;
        }
        self.attempts += 1;
        if self.attempts > MAX_ATTACH_ATTEMPTS {
            self.exhausted = true;
            return false;
        }
        self.sphere = Some(sphere);
        true
    }

    /// Controller disconnected: release the sphere handle (the caller
    /// is responsible for removing/hiding the scene node) so a
    /// reconnect starts a fresh attach cycle.
    pub fn detach(&mut self) {
        self.sphere = None;
        self.attempts = 0;
        self.exhausted = false;
    }

    /// Per-tick corruption check: given the sphere's current local
    /// position, returns `true` if it exceeds the corruption threshold
    /// and must be reset to [`GHOST_LOCAL_OFFSET`] by the caller.
    #[must_use]
    pub fn is_corrupted(local_position: Vec3) -> bool {
        local_position.length() > CORRUPTION_THRESHOLD_M
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;
    use crate::scene::{ObjectRole, Scene, SceneNode};

    #[test]
    fn corruption_threshold_matches_spec() {
        assert!(!GhostSphereState::is_corrupted(Vec3::new(0.0, 0.0, -0.05)));
        assert!(GhostSphereState::is_corrupted(Vec3::new(0.0, 1.5, 0.0)));
    }

    #[test]
    fn first_attach_succeeds_and_subsequent_attach_is_a_no_op() {
        let mut scene = Scene::new(&SceneConfig::default());
        let sphere = scene.insert(SceneNode::new(ObjectRole::MeasurementHelper));
        let mut state = GhostSphereState::new();
        assert!(state.try_attach(sphere));
        assert_eq!(state.sphere(), Some(sphere));
        assert!(!state.try_attach(sphere));
    }

    #[test]
    fn attach_exhausts_after_40_attempts() {
        let mut scene = Scene::new(&SceneConfig::default());
        let mut state = GhostSphereState::new();
        for _ in 0..MAX_ATTACH_ATTEMPTS {
            state.detach();
            let sphere = scene.insert(SceneNode::new(ObjectRole::MeasurementHelper));
            state.try_attach(sphere);
        }
        state.detach();
        let sphere = scene.insert(SceneNode::new(ObjectRole::MeasurementHelper));
        assert!(!state.try_attach(sphere));
        assert!(state.is_exhausted());
    }

    #[test]
    fn detach_resets_attempt_counter() {
        let mut scene = Scene::new(&SceneConfig::default());
        let sphere = scene.insert(SceneNode::new(ObjectRole::MeasurementHelper));
        let mut state = GhostSphereState::new();
        state.try_attach(sphere);
        state.detach();
        assert!(state.sphere().is_none());
        let sphere2 = scene.insert(SceneNode::new(ObjectRole::MeasurementHelper));
        assert!(state.try_attach(sphere2));
    }
}
