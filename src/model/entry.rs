use glam::Vec3;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self {
            min: first,
            max: first,
        };
        for p in iter {
            bbox.min = bbox.min.min(p);
            bbox.max = bbox.max.max(p);
        }
        Some(bbox)
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn volume(&self) -> f32 {
        let e = self.extent();
        (e.x * e.y * e.z).max(0.0)
    }

    /// Bounding radius (distance from center to the farthest corner),
    /// used by the camera's fog falloff and the particle engine's
    /// initial fit.
    #[must_use]
    pub fn bounding_radius(&self) -> f32 {
        self.extent().length() * 0.5
    }

    /// This box scaled by `factor` around its own center, used by the
    /// particle engine's "expand the model bounds by 2.5" rule.
    #[must_use]
    pub fn expanded(&self, factor: f32) -> Self {
        let center = self.center();
        let half_extent = self.extent() * 0.5 * factor;
        Self {
            min: center - half_extent,
            max: center + half_extent,
        }
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.min += offset;
        self.max += offset;
    }
}

/// A single vertex position and its triangle-list index, the minimum a
/// mesh needs for centering, bounding-box computation, and raycasting.
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Vec3,
}

/// One triangle mesh primitive within a loaded model.
#[derive(Debug, Clone)]
pub struct MeshPrimitive {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// A loaded, centered model: the root subgraph's geometry plus the
/// bookkeeping the data model requires (bounding box, center offset,
/// source URL).
///
/// Invariant: after construction, the root's center equals the world
/// origin, and `bounding_box` reflects the centered positions.
#[derive(Debug, Clone)]
pub struct ModelEntry {
    pub primitives: Vec<MeshPrimitive>,
    /// Bounding box of the centered geometry.
    pub bounding_box: BoundingBox,
    /// Translation that was applied to center the model at the origin
    /// (i.e. the negated original centroid).
    pub center_offset: Vec3,
    /// URL or path the model was fetched from.
    pub source_url: String,
}

impl ModelEntry {
    /// Build a centered `ModelEntry` from raw (uncentered) primitives.
    /// Returns `None` if the model has no vertices at all.
    #[must_use]
    pub fn from_raw(
        mut primitives: Vec<MeshPrimitive>,
        source_url: String,
    ) -> Option<Self> {
        let all_points = primitives
            .iter()
            .flat_map(|p| p.vertices.iter().map(|v| v.position));
        let raw_bbox = BoundingBox::from_points(all_points)?;
        let centroid = raw_bbox.center();

        for primitive in &mut primitives {
            for vertex in &mut primitive.vertices {
                vertex.position -= centroid;
            }
        }

        let centered_points = primitives
            .iter()
            .flat_map(|p| p.vertices.iter().map(|v| v.position));
        // Recomputed after centering, per the invariant: bounding box
        // must reflect centered positions, not a naive translation of
        // the raw box (float round-trip through subtraction differs).
        let bounding_box = BoundingBox::from_points(centered_points)?;

        Some(Self {
            primitives,
            bounding_box,
            center_offset: -centroid,
            source_url,
        })
    }

    /// All centered vertex positions across every primitive, for camera
    /// fitting and bounding-sphere computation.
    pub fn all_positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.primitives
            .iter()
            .flat_map(|p| p.vertices.iter().map(|v| v.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_primitive(min: Vec3, max: Vec3) -> MeshPrimitive {
        let vertices = vec![
            Vertex { position: Vec3::new(min.x, min.y, min.z) },
            Vertex { position: Vec3::new(max.x, min.y, min.z) },
            Vertex { position: Vec3::new(max.x, max.y, min.z) },
            Vertex { position: Vec3::new(min.x, max.y, min.z) },
            Vertex { position: Vec3::new(min.x, min.y, max.z) },
            Vertex { position: Vec3::new(max.x, min.y, max.z) },
            Vertex { position: Vec3::new(max.x, max.y, max.z) },
            Vertex { position: Vec3::new(min.x, max.y, max.z) },
        ];
        MeshPrimitive { vertices, indices: vec![] }
    }

    #[test]
    fn from_raw_centers_the_model_at_the_origin() {
        let prim = cube_primitive(Vec3::new(10.0, 10.0, 10.0), Vec3::new(14.0, 14.0, 14.0));
        let entry = ModelEntry::from_raw(vec![prim], "wreck.glb".into()).unwrap();
        assert_eq!(entry.bounding_box.center(), Vec3::ZERO);
        assert_eq!(entry.center_offset, Vec3::new(-12.0, -12.0, -12.0));
    }

    #[test]
    fn from_raw_with_no_vertices_returns_none() {
        let prim = MeshPrimitive { vertices: vec![], indices: vec![] };
        assert!(ModelEntry::from_raw(vec![prim], "empty.glb".into()).is_none());
    }

    #[test]
    fn expanded_bbox_preserves_center() {
        let bbox = BoundingBox {
            min: Vec3::new(-1.0, -1.0, -1.0),
            max: Vec3::new(1.0, 1.0, 1.0),
        };
        let expanded = bbox.expanded(2.5);
        assert_eq!(expanded.center(), bbox.center());
        assert_eq!(expanded.extent(), bbox.extent() * 2.5);
    }

    #[test]
    fn volume_of_unit_cube_is_one() {
        let bbox = BoundingBox {
            min: Vec3::ZERO,
            max: Vec3::ONE,
        };
        assert_eq!(bbox.volume(), 1.0);
    }
}
