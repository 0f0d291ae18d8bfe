//! Config validator (C2): a nested, fully-defaulted configuration tree.
//!
//! Nested `#[serde(default)]` structs give TOML/JSON load and
//! `schemars` JSON Schema generation for this crate's fully-validated
//! `Config` tree: out-of-range enum values and wrong-shaped fields
//! silently substitute defaults rather than failing the whole parse,
//! and the result is always a fully-populated tree; there is
//! no notion of a "missing" config.

mod features;
mod models;
mod scene;
mod theme;

use std::path::Path;

pub use features::FeatureFlags;
pub use models::{ModelRegistry, ModelRegistryEntry};
pub use scene::{CameraConfig, DesktopCameraConfig, SceneConfig};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
pub use theme::MeasurementTheme;

use crate::error::ViewerError;

/// Top-level, fully-defaulted configuration tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// Registered models, keyed by model-key.
    pub models: ModelRegistry,
    /// Whether the first registered model loads automatically.
    pub auto_load_first: bool,
    /// Overrides the default (first-registered) model to load.
    pub initial_model: Option<String>,
    /// Feature enablement flags.
    pub features: FeatureFlags,
    /// Measurement line/label theme; out-of-range values fall back to
    /// [`MeasurementTheme::default`].
    #[serde(deserialize_with = "theme::deserialize_lenient")]
    pub measurement_theme: MeasurementTheme,
    /// Whether measurement labels are shown in desktop mode (always
    /// shown in HMD mode regardless of this flag).
    pub show_measurement_labels: bool,
    /// Scene background/fog parameters.
    pub scene: SceneConfig,
    /// Camera projection and desktop-control parameters.
    pub camera: CameraConfig,
    /// Directory the HMD audio samples (`dpv`, `dpvhigh`, `vrambience`)
    /// are loaded from. `None` disables HMD audio regardless of
    /// `features.hmd_audio`.
    pub hmd_audio_dir: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            models: ModelRegistry::default(),
            auto_load_first: true,
            initial_model: None,
            features: FeatureFlags::default(),
            measurement_theme: MeasurementTheme::default(),
            show_measurement_labels: false,
            scene: SceneConfig::default(),
            camera: CameraConfig::default(),
            hmd_audio_dir: None,
        }
    }
}

impl Config {
    /// Generate a JSON Schema describing the full config tree, for an
    /// embedding host that wants to validate its own config object
    /// client-side before handing it to the façade.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }

    /// Parse a config from a TOML string, falling back to defaults for
    /// any missing or lenient-validated field.
    pub fn from_toml(content: &str) -> Result<Self, ViewerError> {
        toml::from_str(content).map_err(|e| ViewerError::Config(e.to_string()))
    }

    /// Parse a config from a JSON string (the natural shape for a
    /// browser embedder handing the façade a serialized JS object).
    pub fn from_json(content: &str) -> Result<Self, ViewerError> {
        serde_json::from_str(content).map_err(|e| ViewerError::Config(e.to_string()))
    }

    /// Load a config from a TOML or JSON file, selected by extension.
    pub fn load(path: &Path) -> Result<Self, ViewerError> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_toml(&content),
        }
    }

    /// Resolve which registered model key should load automatically, if
    /// any, honoring `initial_model` before falling back to the
    /// first-registered entry when `auto_load_first` is set.
    #[must_use]
    pub fn resolve_initial_model(&self) -> Option<&str> {
        if let Some(key) = &self.initial_model {
            if self.models.get(key).is_some() {
                return Some(key.as_str());
            }
        }
        if self.auto_load_first {
            return self.models.first().map(|(k, _)| k);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_round_trips_through_toml() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed = Config::from_toml(&toml_str).unwrap();
        assert_eq!(cfg, parsed);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
auto_load_first = false
"#;
        let cfg = Config::from_toml(toml_str).unwrap();
        assert!(!cfg.auto_load_first);
        assert_eq!(cfg.scene.background_color, SceneConfig::default().background_color);
        assert_eq!(cfg.camera.fov_degrees, 45.0);
    }

    #[test]
    fn measurement_theme_out_of_range_value_falls_back_to_default() {
        let json = r#"{"measurement_theme": "chartreuse"}"#;
        let cfg = Config::from_json(json).unwrap();
        assert_eq!(cfg.measurement_theme, MeasurementTheme::default());
    }

    #[test]
    fn resolve_initial_model_prefers_explicit_override() {
        let mut cfg = Config::default();
        cfg.models.insert(
            "a",
            ModelRegistryEntry {
                url: "a.glb".into(),
                name: "A".into(),
                credit: None,
                initial_positions: Default::default(),
            },
        );
        cfg.models.insert(
            "b",
            ModelRegistryEntry {
                url: "b.glb".into(),
                name: "B".into(),
                credit: None,
                initial_positions: Default::default(),
            },
        );
        cfg.initial_model = Some("b".to_owned());
        assert_eq!(cfg.resolve_initial_model(), Some("b"));
    }

    #[test]
    fn resolve_initial_model_falls_back_to_first_when_override_is_unknown() {
        let mut cfg = Config::default();
        cfg.models.insert(
            "a",
            ModelRegistryEntry {
                url: "a.glb".into(),
                name: "A".into(),
                credit: None,
                initial_positions: Default::default(),
            },
        );
        cfg.initial_model = Some("missing".to_owned());
        assert_eq!(cfg.resolve_initial_model(), Some("a"));
    }

    #[test]
    fn resolve_initial_model_none_when_auto_load_disabled_and_no_override() {
        let mut cfg = Config::default();
        cfg.auto_load_first = false;
        cfg.models.insert(
            "a",
            ModelRegistryEntry {
                url: "a.glb".into(),
                name: "A".into(),
                credit: None,
                initial_positions: Default::default(),
            },
        );
        assert_eq!(cfg.resolve_initial_model(), None);
    }
}
