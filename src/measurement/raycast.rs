//! Ray-triangle intersection against the loaded model's geometry, and
//! the desktop pointer gesture classifier (drag-threshold + double-click
//! detection) that decides whether a click places a measurement point
//! or instead triggers a camera focus animation (spec §4.2 desktop
//! path, §8 boundary scenario 6).

use glam::{Mat4, Vec3};
use web_time::Instant;

use crate::model::ModelEntry;

/// Pixels of pointer movement between down/up beyond which a click is
/// treated as a drag and rejected (spec §4.2).
const DRAG_THRESHOLD_PX: f32 = 5.0;
/// Double-click window (spec §4.2 states 300 ms; §8's worked example
/// uses 200 ms, a stricter sub-case of the same threshold). Public so
/// the orchestrator can schedule the matching deferred-confirm delay
/// for a [`PointerAction::PendingClick`].
pub const DOUBLE_CLICK_MS: u64 = 300;

/// A world-space ray, for raycasting against model geometry.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Ray origin in world space.
    pub origin: Vec3,
    /// Normalized ray direction in world space.
    pub direction: Vec3,
}

/// A successful ray/model intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// World-space intersection point.
    pub point: Vec3,
    /// Distance from the ray origin to the intersection.
    pub distance: f32,
}

/// Möller–Trumbore ray-triangle intersection in a common local space.
/// Returns the hit distance along the ray, if any, for `t > 0`.
fn ray_triangle(origin: Vec3, dir: Vec3, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    const EPSILON: f32 = 1e-6;
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = dir.cross(edge2);
    let a = edge1.dot(h);
    if a.abs() < EPSILON {
        return None;
    }
    let f = 1.0 / a;
    let s = origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = f * dir.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = f * edge2.dot(q);
    (t > EPSILON).then_some(t)
}

/// Cast `ray` against `model`'s triangles (interpreted in the model
/// root's local space, transformed by `model_transform`), returning the
/// nearest valid intersection.
///
/// This is the "raycast target set — meshes from the currently loaded
/// model only" surface from spec §4.2: helper geometry never enters
/// this function because it isn't part of `ModelEntry` at all — the
/// scene's [`crate::scene::ObjectRole`] exclusion only needs to guard
/// against the model node itself, which is the only raycastable role.
#[must_use]
pub fn cast_ray_against_model(ray: &Ray, model: &ModelEntry, model_transform: Mat4) -> Option<RayHit> {
    let inverse = model_transform.inverse();
    let local_origin = inverse.transform_point3(ray.origin);
    let local_dir = inverse.transform_vector3(ray.direction).normalize();

    let mut nearest: Option<f32> = None;
    for primitive in &model.primitives {
        let tris = primitive.indices.chunks_exact(3);
        for tri in tris {
            let (Some(a), Some(b), Some(c)) = (
                primitive.vertices.get(tri[0] as usize),
                primitive.vertices.get(tri[1] as usize),
                primitive.vertices.get(tri[2] as usize),
            ) else {
                continue;
            };
            if let Some(t) = ray_triangle(local_origin, local_dir, a.position, b.position, c.position) {
                if nearest.is_none_or(|n| t < n) {
                    nearest = Some(t);
                }
            }
        }
    }

    nearest.map(|t| {
        let local_point = local_origin + local_dir * t;
        let world_point = model_transform.transform_point3(local_point);
        RayHit {
            point: world_point,
            distance: ray.origin.distance(world_point),
        }
    })
}

/// Outcome of a desktop pointer-up event, as classified by
/// [`PointerGesture`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerAction {
    /// Pointer moved more than the drag threshold between down and up;
    /// not a click at all.
    Drag,
    /// This click landed within the double-click window of the
    /// previous one: resolves as a focus-animation trigger, and
    /// cancels whatever single click was pending.
    DoubleClick,
    /// Provisionally a single click. The caller should defer the
    /// actual placement by [`DOUBLE_CLICK_MS`] and then call
    /// [`PointerGesture::confirm_pending`] with the returned token —
    /// if a second click arrived in the meantime it will have already
    /// been resolved as [`PointerAction::DoubleClick`] and the token
    /// will no longer confirm.
    PendingClick {
        /// Opaque token identifying this specific pending click.
        token: u64,
    },
}

/// Tracks pointer-down position (for drag rejection) and the timing of
/// the last resolved click (for double-click detection).
#[derive(Debug, Default)]
pub struct PointerGesture {
    down_pos: Option<(f32, f32)>,
    last_click: Option<(Instant, (f32, f32))>,
    pending_token: Option<u64>,
    next_token: u64,
}

impl PointerGesture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pointer-down position.
    pub fn on_pointer_down(&mut self, pos: (f32, f32)) {
        self.down_pos = Some(pos);
    }

    /// Classify a pointer-up event at `pos`/`now` against the recorded
    /// pointer-down position and the last resolved click.
    pub fn on_pointer_up(&mut self, pos: (f32, f32), now: Instant) -> PointerAction {
        let moved = self.down_pos.map_or(0.0, |down| distance(down, pos));
        self.down_pos = None;
        if moved > DRAG_THRESHOLD_PX {
            return PointerAction::Drag;
        }

        if let Some((last_time, last_pos)) = self.last_click {
            if now.duration_since(last_time).as_millis() < u128::from(DOUBLE_CLICK_MS)
                && distance(last_pos, pos) <= DRAG_THRESHOLD_PX
            {
                self.last_click = None;
                self.pending_token = None;
                return PointerAction::DoubleClick;
            }
        }

        self.last_click = Some((now, pos));
        let token = self.next_token;
        self.next_token += 1;
        self.pending_token = Some(token);
        PointerAction::PendingClick { token }
    }

    /// Confirm a previously returned `token` after the double-click
    /// window has elapsed. Returns `true` if the pending click was not
    /// superseded by a later double-click and should now be placed.
    pub fn confirm_pending(&mut self, token: u64) -> bool {
        if self.pending_token == Some(token) {
            self.pending_token = None;
            true
        } else {
            false
        }
    }
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MeshPrimitive, Vertex};

    fn unit_triangle_model() -> ModelEntry {
        let prim = MeshPrimitive {
            vertices: vec![
                Vertex { position: Vec3::new(-1.0, 0.0, -1.0) },
                Vertex { position: Vec3::new(1.0, 0.0, -1.0) },
                Vertex { position: Vec3::new(0.0, 0.0, 1.0) },
            ],
            indices: vec![0, 1, 2],
        };
        // A single flat triangle is already centered at its own centroid.
        ModelEntry::from_raw(vec![prim], "tri.glb".into()).unwrap()
    }

    #[test]
    fn straight_down_ray_hits_the_flat_triangle() {
        let model = unit_triangle_model();
        let ray = Ray {
            origin: Vec3::new(0.0, 5.0, 0.0),
            direction: Vec3::new(0.0, -1.0, 0.0),
        };
        let hit = cast_ray_against_model(&ray, &model, Mat4::IDENTITY);
        assert!(hit.is_some());
    }

    #[test]
    fn ray_missing_the_triangle_returns_none() {
        let model = unit_triangle_model();
        let ray = Ray {
            origin: Vec3::new(100.0, 5.0, 100.0),
            direction: Vec3::new(0.0, -1.0, 0.0),
        };
        assert!(cast_ray_against_model(&ray, &model, Mat4::IDENTITY).is_none());
    }

    #[test]
    fn drag_beyond_threshold_is_not_a_click() {
        let mut g = PointerGesture::new();
        g.on_pointer_down((0.0, 0.0));
        let action = g.on_pointer_up((10.0, 0.0), Instant::now());
        assert_eq!(action, PointerAction::Drag);
    }

    #[test]
    fn small_movement_within_threshold_is_still_a_click() {
        let mut g = PointerGesture::new();
        g.on_pointer_down((0.0, 0.0));
        let action = g.on_pointer_up((3.0, 0.0), Instant::now());
        assert!(matches!(action, PointerAction::PendingClick { .. }));
    }

    #[test]
    fn second_click_within_window_resolves_as_double_click() {
        let mut g = PointerGesture::new();
        g.on_pointer_down((0.0, 0.0));
        let t0 = Instant::now();
        let first = g.on_pointer_up((0.0, 0.0), t0);
        let PointerAction::PendingClick { token } = first else {
            unreachable!("expected pending click");
        };

        g.on_pointer_down((0.0, 0.0));
        let second = g.on_pointer_up((0.0, 0.0), t0);
        assert_eq!(second, PointerAction::DoubleClick);

        // The first click's deferred confirmation must not fire now.
        assert!(!g.confirm_pending(token));
    }

    #[test]
    fn confirm_pending_succeeds_when_not_superseded() {
        let mut g = PointerGesture::new();
        g.on_pointer_down((0.0, 0.0));
        let action = g.on_pointer_up((0.0, 0.0), Instant::now());
        let PointerAction::PendingClick { token } = action else {
            unreachable!("expected pending click");
        };
        assert!(g.confirm_pending(token));
        // Second confirmation of the same token is not valid (already consumed).
        assert!(!g.confirm_pending(token));
    }
}
