use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Top-level feature enablement flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FeatureFlags {
    /// Whether the WebXR HMD session button/mode is offered at all.
    pub hmd: bool,
    /// Whether HMD ambience/locomotion audio is enabled.
    pub hmd_audio: bool,
    /// Whether the measurement subsystem is enabled.
    pub measurement: bool,
    /// Whether the marine-snow particle "dive" mode is enabled.
    pub dive_system: bool,
    /// Whether the fullscreen toggle is offered.
    pub fullscreen: bool,
    /// Whether the VR comfort-mode glyph/indicator is shown.
    pub comfort_glyph: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            hmd: true,
            hmd_audio: true,
            measurement: true,
            dive_system: true,
            fullscreen: true,
            comfort_glyph: true,
        }
    }
}
