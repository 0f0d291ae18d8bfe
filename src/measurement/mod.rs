//! Measurement subsystem (C7): a unified two-point FIFO measurement,
//! shared across the desktop and HMD modalities.
//!
//! The subsystem owns exactly the scene nodes it creates (point
//! spheres, the connecting line, the label sprite) and nothing else —
//! raycasting against the loaded model, and the ghost-sphere parenting
//! that keeps the HMD preview marker glued to a controller, are split
//! into sibling modules so this one stays focused on the FIFO and its
//! visibility invariants (spec §4.2).

/// Controller-parented preview marker and its corruption-recovery state
/// machine (spec §4.2 "Ghost-sphere robustness").
pub mod ghost_sphere;
/// Label text/font-scale/world-position formulas, behind a
/// host-rendered `LabelRenderer` trait.
pub mod label;
/// Ray-triangle intersection against loaded model geometry, and the
/// desktop pointer gesture (click / drag / double-click) classifier.
pub mod raycast;

use std::collections::VecDeque;

use glam::Vec3;
use web_time::Instant;

use crate::scene::{ObjectRole, Scene, SceneNode, SceneNodeId};

pub use label::{LabelRenderer, MeasurementLabel};

/// 200 ms debounce window for HMD trigger-release placement (spec
/// §4.2 HMD path).
const HMD_PLACEMENT_DEBOUNCE_MS: u64 = 200;

/// Which modality produced a measurement point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Placed via controller trigger-release in an HMD session.
    Hmd,
    /// Placed via a desktop pointer click/raycast.
    Desktop,
}

/// A single placed measurement point.
#[derive(Debug, Clone, Copy)]
pub struct MeasurementPoint {
    /// World-space position.
    pub position: Vec3,
    /// Scene handle for this point's visible sphere marker.
    pub sphere: SceneNodeId,
    /// Which modality placed it.
    pub source: Source,
}

/// Owns the FIFO of up to two measurement points and the derived
/// line/label scene nodes.
///
/// Invariant: `points.len()` is always 0, 1, or 2; `line` is `Some` iff
/// `points.len() == 2`.
pub struct MeasurementSubsystem {
    points: VecDeque<MeasurementPoint>,
    line: Option<SceneNodeId>,
    label: Option<SceneNodeId>,

    enabled: bool,
    hmd_presenting: bool,
    /// `showMeasurementLabels` from config: whether labels are shown in
    /// pure desktop mode (HMD always shows them regardless).
    pub show_labels_desktop: bool,

    last_hmd_placement: Option<Instant>,
}

impl MeasurementSubsystem {
    /// Create a disabled subsystem with no points. The embedding host
    /// (or façade, from config) calls [`Self::set_enabled`] to turn it
    /// on.
    #[must_use]
    pub fn new(show_labels_desktop: bool) -> Self {
        Self {
            points: VecDeque::with_capacity(2),
            line: None,
            label: None,
            enabled: false,
            hmd_presenting: false,
            show_labels_desktop,
            last_hmd_placement: None,
        }
    }

    /// Enable or disable the subsystem. Disabling clears all points
    /// atomically (spec: "toggling off in either mode's UI" clears).
    pub fn set_enabled(&mut self, enabled: bool, scene: &mut Scene) {
        if self.enabled && !enabled {
            self.clear(scene);
        }
        self.enabled = enabled;
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Inform the subsystem of HMD presentation state, which affects
    /// label visibility (always shown while presenting).
    pub fn set_hmd_presenting(&mut self, presenting: bool) {
        self.hmd_presenting = presenting;
    }

    /// Number of currently placed points (0, 1, or 2).
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// The two line endpoints, if a line currently exists.
    #[must_use]
    pub fn line_endpoints(&self) -> Option<(Vec3, Vec3)> {
        if self.points.len() == 2 {
            Some((self.points[0].position, self.points[1].position))
        } else {
            None
        }
    }

    /// Whether the label sprite should be visible right now (spec:
    /// visible iff two points exist AND (presenting OR
    /// `show_labels_desktop`)).
    #[must_use]
    pub fn label_visible(&self) -> bool {
        self.points.len() == 2 && (self.hmd_presenting || self.show_labels_desktop)
    }

    /// Distance between the two points, if both exist.
    #[must_use]
    pub fn distance(&self) -> Option<f32> {
        self.line_endpoints().map(|(a, b)| a.distance(b))
    }

    /// Place a point from the desktop raycast path. No debounce — the
    /// caller (pointer gesture classifier) already rejects accidental
    /// drags and double-clicks before calling this.
    pub fn place_desktop(&mut self, scene: &mut Scene, position: Vec3) {
        self.place(scene, position, Source::Desktop);
    }

    /// Place a point from the HMD trigger-release path. Debounced at
    /// 200 ms to reject duplicate placements from a single trigger
    /// event (spec §4.2 HMD path). Returns `true` if the point was
    /// actually placed.
    pub fn place_hmd(&mut self, scene: &mut Scene, position: Vec3, now: Instant) -> bool {
        if let Some(last) = self.last_hmd_placement {
            if now.duration_since(last).as_millis() < u128::from(HMD_PLACEMENT_DEBOUNCE_MS) {
                return false;
            }
        }
        self.last_hmd_placement = Some(now);
        self.place(scene, position, Source::Hmd);
        true
    }

    /// Shared placement logic: push the point, evict the oldest FIFO
    /// entry if a third arrives, then rebuild the derived line/label.
    fn place(&mut self, scene: &mut Scene, position: Vec3, source: Source) {
        if self.points.len() >= 2 {
            if let Some(evicted) = self.points.pop_front() {
                scene.remove(evicted.sphere);
            }
        }

        let sphere = scene.insert(SceneNode::new(ObjectRole::MeasurementHelper));
        self.points.push_back(MeasurementPoint {
            position,
            sphere,
            source,
        });

        self.rebuild_derived(scene);
    }

    /// Atomically remove every point, the line, and the label.
    pub fn clear(&mut self, scene: &mut Scene) {
        for point in self.points.drain(..) {
            scene.remove(point.sphere);
        }
        if let Some(line) = self.line.take() {
            scene.remove(line);
        }
        if let Some(label) = self.label.take() {
            scene.remove(label);
        }
        self.last_hmd_placement = None;
    }

    fn rebuild_derived(&mut self, scene: &mut Scene) {
        if let Some(line) = self.line.take() {
            scene.remove(line);
        }
        if let Some(label) = self.label.take() {
            scene.remove(label);
        }

        if self.points.len() == 2 {
            self.line = Some(scene.insert(SceneNode::new(ObjectRole::MeasurementHelper)));
            self.label = Some(scene.insert(SceneNode::new(ObjectRole::MeasurementHelper)));
        }
    }

    /// The current measurement label (text, font scale, world
    /// position), if two points exist. `None` otherwise, including
    /// when the label is present-but-hidden (desktop, labels off) —
    /// callers check [`Self::label_visible`] separately since the
    /// label node itself still exists, just invisible.
    #[must_use]
    pub fn current_label(&self) -> Option<MeasurementLabel> {
        let (a, b) = self.line_endpoints()?;
        Some(MeasurementLabel::for_segment(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SceneConfig;

    fn scene() -> Scene {
        Scene::new(&SceneConfig::default())
    }

    #[test]
    fn placing_a_third_point_evicts_the_oldest() {
        let mut scene = scene();
        let mut m = MeasurementSubsystem::new(true);
        m.set_enabled(true, &mut scene);

        m.place_desktop(&mut scene, Vec3::new(0.0, 0.0, 0.0));
        m.place_desktop(&mut scene, Vec3::new(3.0, 0.0, 4.0));
        m.place_desktop(&mut scene, Vec3::new(3.0, 4.0, 4.0));

        assert_eq!(m.point_count(), 2);
        let (a, b) = m.line_endpoints().unwrap();
        assert_eq!(a, Vec3::new(3.0, 0.0, 4.0));
        assert_eq!(b, Vec3::new(3.0, 4.0, 4.0));
    }

    #[test]
    fn worked_example_distance_is_5_meters() {
        let mut scene = scene();
        let mut m = MeasurementSubsystem::new(true);
        m.set_enabled(true, &mut scene);
        m.place_desktop(&mut scene, Vec3::new(3.0, 0.0, 4.0));
        m.place_desktop(&mut scene, Vec3::new(3.0, 4.0, 4.0));
        assert_eq!(m.distance(), Some(4.0));

        // Re-derive the worked A, B, C triplet.
        let mut scene2 = scene();
        let mut m2 = MeasurementSubsystem::new(true);
        m2.set_enabled(true, &mut scene2);
        m2.place_desktop(&mut scene2, Vec3::new(0.0, 0.0, 0.0));
        m2.place_desktop(&mut scene2, Vec3::new(3.0, 0.0, 4.0));
        m2.place_desktop(&mut scene2, Vec3::new(3.0, 4.0, 4.0));
        let label = m2.current_label().unwrap();
        assert_eq!(label.text, "5.00m");
    }

    #[test]
    fn line_exists_iff_two_points() {
        let mut scene = scene();
        let mut m = MeasurementSubsystem::new(true);
        m.set_enabled(true, &mut scene);
        assert!(m.line_endpoints().is_none());
        m.place_desktop(&mut scene, Vec3::ZERO);
        assert!(m.line_endpoints().is_none());
        m.place_desktop(&mut scene, Vec3::X);
        assert!(m.line_endpoints().is_some());
    }

    #[test]
    fn label_hidden_in_desktop_mode_by_default() {
        let mut scene = scene();
        let mut m = MeasurementSubsystem::new(false);
        m.set_enabled(true, &mut scene);
        m.place_desktop(&mut scene, Vec3::ZERO);
        m.place_desktop(&mut scene, Vec3::X);
        assert!(!m.label_visible());
    }

    #[test]
    fn label_always_visible_while_hmd_presenting() {
        let mut scene = scene();
        let mut m = MeasurementSubsystem::new(false);
        m.set_enabled(true, &mut scene);
        m.set_hmd_presenting(true);
        m.place_desktop(&mut scene, Vec3::ZERO);
        m.place_desktop(&mut scene, Vec3::X);
        assert!(m.label_visible());
    }

    #[test]
    fn clear_removes_points_line_and_label_atomically() {
        let mut scene = scene();
        let mut m = MeasurementSubsystem::new(true);
        m.set_enabled(true, &mut scene);
        m.place_desktop(&mut scene, Vec3::ZERO);
        m.place_desktop(&mut scene, Vec3::X);
        assert_eq!(m.point_count(), 2);

        m.clear(&mut scene);
        assert_eq!(m.point_count(), 0);
        assert!(m.line_endpoints().is_none());
        assert!(m.current_label().is_none());
    }

    #[test]
    fn disabling_clears_existing_points() {
        let mut scene = scene();
        let mut m = MeasurementSubsystem::new(true);
        m.set_enabled(true, &mut scene);
        m.place_desktop(&mut scene, Vec3::ZERO);
        m.set_enabled(false, &mut scene);
        assert_eq!(m.point_count(), 0);
    }

    #[test]
    fn hmd_debounce_rejects_rapid_duplicate_placement() {
        let mut scene = scene();
        let mut m = MeasurementSubsystem::new(true);
        m.set_enabled(true, &mut scene);
        let t0 = Instant::now();
        assert!(m.place_hmd(&mut scene, Vec3::ZERO, t0));
        assert!(!m.place_hmd(&mut scene, Vec3::X, t0));
        assert_eq!(m.point_count(), 1);
    }
}
