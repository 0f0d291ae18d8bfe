use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Scene-level config: background color and fog parameters the scene
/// holder (C3) is initialized with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SceneConfig {
    /// Background clear color, linear RGB in `[0, 1]`.
    pub background_color: [f32; 3],
    /// Whether depth fog is enabled at all.
    pub fog_enabled: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            // Deep-water teal, for the "dive" atmosphere.
            background_color: [0.01, 0.05, 0.08],
            fog_enabled: true,
        }
    }
}

/// Desktop orbit-camera specific limits (distinct from the projection
/// parameters shared with HMD mode).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DesktopCameraConfig {
    /// Orbit damping factor in `[0, 1)`; 0 disables damping.
    pub damping_factor: f32,
    /// Minimum allowed orbit distance from the focus point.
    pub min_distance: f32,
    /// Maximum allowed orbit distance from the focus point.
    pub max_distance: f32,
}

impl Default for DesktopCameraConfig {
    fn default() -> Self {
        Self {
            damping_factor: 0.1,
            min_distance: 0.5,
            max_distance: 1000.0,
        }
    }
}

/// Camera projection and desktop-control parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view, in degrees.
    pub fov_degrees: f32,
    /// Near clipping plane distance.
    pub near: f32,
    /// Far clipping plane distance.
    pub far: f32,
    /// Initial desktop camera eye position.
    pub initial_position: [f32; 3],
    /// Desktop-only orbit control limits.
    pub desktop: DesktopCameraConfig,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near: 0.1,
            far: 10_000.0,
            initial_position: [0.0, 0.0, 50.0],
            desktop: DesktopCameraConfig::default(),
        }
    }
}
