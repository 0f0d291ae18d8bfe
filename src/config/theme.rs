use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// Measurement line/label color theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementTheme {
    /// Dark line/label rendering, for bright scenes.
    Dark,
    /// Light line/label rendering, for dark scenes.
    Light,
}

impl Default for MeasurementTheme {
    fn default() -> Self {
        Self::Dark
    }
}

/// Deserialize a `MeasurementTheme`, substituting the default for any
/// value outside the recognized `{dark, light}` set rather than failing
/// the whole config parse (spec §7 item 6).
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<MeasurementTheme, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer).unwrap_or(serde_json::Value::Null);
    Ok(match raw.as_str() {
        Some("dark") => MeasurementTheme::Dark,
        Some("light") => MeasurementTheme::Light,
        _ => MeasurementTheme::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_dark() {
        assert_eq!(MeasurementTheme::default(), MeasurementTheme::Dark);
    }
}
