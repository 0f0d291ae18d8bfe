//! Scene holder (C3): the 3D world graph, background color, and fog
//! parameters.
//!
//! Nodes are addressed by [`SceneNodeId`], a generation-checked handle
//! (index + generation counter), so a stale handle into a freed slot is
//! detected rather than silently aliasing whatever was reallocated into
//! that slot. This matters for the measurement subsystem and VR helper
//! spheres, both of which hold onto node handles across several ticks.

use glam::{Mat4, Vec3};

use crate::config::SceneConfig;

/// Role a node plays, used by the measurement raycast predicate to
/// exclude helper geometry (spheres, lines, labels) from hit-testing
/// against the loaded model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectRole {
    /// Part of the loaded photogrammetry mesh; a valid raycast target.
    Model,
    /// Measurement helper geometry (point sphere, line, label sprite, or
    /// VR ghost sphere); always excluded from raycasting.
    MeasurementHelper,
    /// Particle field point cloud; never raycast against.
    Particles,
}

impl ObjectRole {
    /// Single predicate for helper-object detection (spec §9's
    /// "dynamic dispatch across helper-object detection" note).
    #[must_use]
    pub fn is_raycast_excluded(self) -> bool {
        !matches!(self, Self::Model)
    }
}

/// Generation-checked handle into the scene's node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneNodeId {
    index: u32,
    generation: u32,
}

struct Slot {
    generation: u32,
    node: Option<SceneNode>,
}

/// A single scene-graph node: a local transform and a role tag.
/// Geometry/material ownership lives with the creating subsystem (model
/// loader, measurement, particle engine); the scene only tracks
/// transform and visibility for rendering and raycast exclusion.
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// Local transform relative to `parent` (or world space if `parent`
    /// is `None`).
    pub transform: Mat4,
    /// What kind of thing this node is, for raycast-exclusion purposes.
    pub role: ObjectRole,
    /// Whether the node is currently rendered / raycastable.
    pub visible: bool,
    /// Parent node, if this node's transform is relative to another.
    pub parent: Option<SceneNodeId>,
}

impl SceneNode {
    #[must_use]
    pub fn new(role: ObjectRole) -> Self {
        Self {
            transform: Mat4::IDENTITY,
            role,
            visible: true,
            parent: None,
        }
    }
}

/// Owns the flat node arena, background color, and fog parameters.
///
/// `generation` is bumped on every structural or visibility mutation so
/// the renderer (or a test) can cheaply detect "did anything change
/// since I last looked" without walking the arena.
pub struct Scene {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    generation: u64,

    /// Background clear color, linear RGB in `[0, 1]`.
    pub background_color: [f32; 3],
    /// Whether depth fog is enabled.
    pub fog_enabled: bool,

    /// The currently loaded model's root node, if any.
    model_root: Option<SceneNodeId>,
}

impl Scene {
    #[must_use]
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            generation: 0,
            background_color: config.background_color,
            fog_enabled: config.fog_enabled,
            model_root: None,
        }
    }

    /// Monotonically increasing version, bumped on every mutation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.generation
    }

    fn touch(&mut self) {
        self.generation += 1;
    }

    /// Insert a new node, returning its handle.
    pub fn insert(&mut self, node: SceneNode) -> SceneNodeId {
        self.touch();
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            SceneNodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            SceneNodeId {
                index,
                generation: 0,
            }
        }
    }

    /// Remove a node by handle. Returns `true` if it was present (a
    /// stale or already-removed handle returns `false` rather than
    /// panicking, so disposal stays idempotent per the orchestrator's
    /// "calling dispose twice must not throw" requirement).
    pub fn remove(&mut self, id: SceneNodeId) -> bool {
        let Some(slot) = self.slots.get_mut(id.index as usize) else {
            return false;
        };
        if slot.generation != id.generation || slot.node.is_none() {
            return false;
        }
        slot.node = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
        self.touch();
        true
    }

    #[must_use]
    pub fn get(&self, id: SceneNodeId) -> Option<&SceneNode> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn get_mut(&mut self, id: SceneNodeId) -> Option<&mut SceneNode> {
        self.touch();
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// True if `id` still refers to a live node (not freed, not stale).
    #[must_use]
    pub fn is_live(&self, id: SceneNodeId) -> bool {
        self.get(id).is_some()
    }

    /// World-space position of a node, computed via its parent chain.
    /// Bounded to 64 hops as a cycle guard — the scene graph is a tree
    /// in practice, but a corrupted parent chain should not hang.
    #[must_use]
    pub fn world_position(&self, id: SceneNodeId) -> Option<Vec3> {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(id);
        let mut hops = 0;
        while let Some(node_id) = current {
            let node = self.get(node_id)?;
            matrix = node.transform * matrix;
            current = node.parent;
            hops += 1;
            if hops > 64 {
                return None;
            }
        }
        Some(matrix.transform_point3(Vec3::ZERO))
    }

    pub fn set_model_root(&mut self, id: Option<SceneNodeId>) {
        self.model_root = id;
        self.touch();
    }

    #[must_use]
    pub fn model_root(&self) -> Option<SceneNodeId> {
        self.model_root
    }

    /// Every live node whose role is not excluded from raycasting
    /// (currently just [`ObjectRole::Model`]).
    pub fn raycast_targets(&self) -> impl Iterator<Item = (SceneNodeId, &SceneNode)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let node = slot.node.as_ref()?;
            if node.role.is_raycast_excluded() || !node.visible {
                return None;
            }
            Some((
                SceneNodeId {
                    index: u32::try_from(index).unwrap_or(u32::MAX),
                    generation: slot.generation,
                },
                node,
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> Scene {
        Scene::new(&SceneConfig::default())
    }

    #[test]
    fn insert_then_remove_frees_the_slot_for_reuse() {
        let mut s = scene();
        let a = s.insert(SceneNode::new(ObjectRole::Model));
        assert!(s.remove(a));
        let b = s.insert(SceneNode::new(ObjectRole::Model));
        assert_eq!(a.index, b.index);
        assert_ne!(a.generation, b.generation);
    }

    #[test]
    fn stale_handle_after_removal_is_not_live() {
        let mut s = scene();
        let a = s.insert(SceneNode::new(ObjectRole::Model));
        s.remove(a);
        assert!(!s.is_live(a));
        assert!(s.get(a).is_none());
    }

    #[test]
    fn remove_is_idempotent() {
        let mut s = scene();
        let a = s.insert(SceneNode::new(ObjectRole::Model));
        assert!(s.remove(a));
        assert!(!s.remove(a));
    }

    #[test]
    fn stale_handle_does_not_alias_reallocated_slot() {
        let mut s = scene();
        let a = s.insert(SceneNode::new(ObjectRole::Model));
        s.remove(a);
        let b = s.insert(SceneNode::new(ObjectRole::MeasurementHelper));
        // `a` is stale even though it shares an index with `b`.
        assert!(s.get(a).is_none());
        assert_eq!(s.get(b).unwrap().role, ObjectRole::MeasurementHelper);
    }

    #[test]
    fn raycast_targets_exclude_measurement_helpers() {
        let mut s = scene();
        s.insert(SceneNode::new(ObjectRole::Model));
        s.insert(SceneNode::new(ObjectRole::MeasurementHelper));
        s.insert(SceneNode::new(ObjectRole::Particles));
        let targets: Vec<_> = s.raycast_targets().collect();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].1.role, ObjectRole::Model);
    }

    #[test]
    fn version_increments_on_mutation() {
        let mut s = scene();
        let v0 = s.version();
        s.insert(SceneNode::new(ObjectRole::Model));
        assert!(s.version() > v0);
    }

    #[test]
    fn world_position_composes_parent_chain() {
        let mut s = scene();
        let parent = s.insert(SceneNode::new(ObjectRole::Model));
        s.get_mut(parent).unwrap().transform = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));

        let mut child = SceneNode::new(ObjectRole::MeasurementHelper);
        child.transform = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0));
        child.parent = Some(parent);
        let child_id = s.insert(child);

        assert_eq!(s.world_position(child_id), Some(Vec3::new(1.0, 2.0, 0.0)));
    }
}
