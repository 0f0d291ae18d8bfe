use std::collections::BTreeMap;

use glam::Vec3;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One entry in the `models` registry: where to fetch a wreck model from
/// and how to label it in a host-provided model picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelRegistryEntry {
    /// Fetch URL for the glTF binary.
    pub url: String,
    /// Display name shown to the embedding host.
    pub name: String,
    /// Optional photogrammetry/survey credit line.
    #[serde(default)]
    pub credit: Option<String>,
    /// Optional per-modality initial camera/rig positions, keyed by
    /// modality name (`"desktop"` / `"hmd"`).
    #[serde(default)]
    pub initial_positions: BTreeMap<String, [f32; 3]>,
}

impl ModelRegistryEntry {
    /// The initial position for `modality`, if one was configured.
    #[must_use]
    pub fn initial_position(&self, modality: &str) -> Option<Vec3> {
        self.initial_positions
            .get(modality)
            .map(|p| Vec3::from_array(*p))
    }
}

/// Ordered registry of known models. Iteration order is significant: the
/// first entry is the default selection when `autoLoadFirst` is set and
/// no `initialModel` override is given.
///
/// A plain `Vec` of `(key, entry)` pairs is used instead of a `HashMap`
/// so insertion order survives a TOML/JSON round-trip, matching the
/// spec's "iteration order significant for default selection" clause.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ModelRegistry(Vec<(String, ModelRegistryEntry)>);

impl ModelRegistry {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ModelRegistryEntry> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// The first registered entry, used as the default load target.
    #[must_use]
    pub fn first(&self) -> Option<(&str, &ModelRegistryEntry)> {
        self.0.first().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelRegistryEntry)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: ModelRegistryEntry) {
        let key = key.into();
        if let Some(existing) = self.0.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = entry;
        } else {
            self.0.push((key, entry));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_reflects_insertion_order() {
        let mut reg = ModelRegistry::default();
        reg.insert(
            "uboat",
            ModelRegistryEntry {
                url: "uboat.glb".into(),
                name: "U-Boat".into(),
                credit: None,
                initial_positions: BTreeMap::new(),
            },
        );
        reg.insert(
            "schooner",
            ModelRegistryEntry {
                url: "schooner.glb".into(),
                name: "Schooner".into(),
                credit: None,
                initial_positions: BTreeMap::new(),
            },
        );
        assert_eq!(reg.first().map(|(k, _)| k), Some("uboat"));
    }

    #[test]
    fn insert_with_existing_key_replaces_entry() {
        let mut reg = ModelRegistry::default();
        reg.insert(
            "uboat",
            ModelRegistryEntry {
                url: "uboat.glb".into(),
                name: "U-Boat".into(),
                credit: None,
                initial_positions: BTreeMap::new(),
            },
        );
        reg.insert(
            "uboat",
            ModelRegistryEntry {
                url: "uboat-v2.glb".into(),
                name: "U-Boat v2".into(),
                credit: None,
                initial_positions: BTreeMap::new(),
            },
        );
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("uboat").unwrap().url, "uboat-v2.glb");
    }
}
