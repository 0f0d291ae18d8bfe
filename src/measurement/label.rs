//! Measurement label text/scale/position formulas (spec §4.2 "Label
//! design").
//!
//! Canvas rendering of the rounded-rect background and DPI-aware text
//! layout is a DOM concern delegated to the host (spec §1's "DOM UI
//! construction... out of scope"); this module computes everything
//! upstream of that — the text, the continuous font-scale curve, and
//! the sprite's world position — and hands it to a [`LabelRenderer`]
//! the embedding host implements.

use glam::Vec3;

/// Computed label content and placement for the current two-point
/// measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementLabel {
    /// Rendered text, e.g. `"5.00m"`.
    pub text: String,
    /// Continuous font-scale multiplier (spec's piecewise `s(d)` curve).
    pub font_scale: f32,
    /// World-space sprite position: the segment midpoint, raised along
    /// world Y.
    pub world_position: Vec3,
}

impl MeasurementLabel {
    /// Derive the label for a segment between `a` and `b`.
    #[must_use]
    pub fn for_segment(a: Vec3, b: Vec3) -> Self {
        let distance = a.distance(b);
        let midpoint = (a + b) * 0.5;
        let lift = (0.03 * distance).clamp(0.05, 0.2);
        Self {
            text: format!("{distance:.2}m"),
            font_scale: font_scale_for_distance(distance),
            world_position: midpoint + Vec3::new(0.0, lift, 0.0),
        }
    }
}

/// Continuous piecewise font-scale curve (spec §4.2):
/// - `d <= 2`:      `s = 0.4 + 0.15 d`
/// - `2 < d <= 4`:  `s = 0.7 + 0.1 (d - 2)`
/// - `d > 4`:       `s = 0.9 + 0.5 min((d - 4) / 16, 1)`
#[must_use]
pub fn font_scale_for_distance(d: f32) -> f32 {
    if d <= 2.0 {
        0.4 + 0.15 * d
    } else if d <= 4.0 {
        0.7 + 0.1 * (d - 2.0)
    } else {
        0.9 + 0.5 * ((d - 4.0) / 16.0).min(1.0)
    }
}

/// Host-implemented canvas label renderer: given the computed label,
/// draw (or update) a high-DPI sprite with a rounded-rect background
/// and the label text, and return nothing the core needs to track —
/// the sprite's *scene* representation (a `SceneNodeId`) is already
/// owned by [`crate::measurement::MeasurementSubsystem`].
pub trait LabelRenderer {
    /// Render (or re-render) the sprite texture for `label`.
    fn render(&mut self, label: &MeasurementLabel);
    /// Show or hide the sprite without re-rendering its texture.
    fn set_visible(&mut self, visible: bool);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn font_scale_continuous_at_2m_boundary() {
        let just_under = font_scale_for_distance(2.0);
        let just_over = font_scale_for_distance(2.000_001);
        assert_relative_eq!(just_under, just_over, epsilon = 1e-4);
    }

    #[test]
    fn font_scale_continuous_at_4m_boundary() {
        let just_under = font_scale_for_distance(4.0);
        let just_over = font_scale_for_distance(4.000_001);
        assert_relative_eq!(just_under, just_over, epsilon = 1e-4);
    }

    #[test]
    fn font_scale_saturates_past_20m() {
        let at_20 = font_scale_for_distance(20.0);
        let at_100 = font_scale_for_distance(100.0);
        assert_relative_eq!(at_20, at_100, epsilon = 1e-6);
        assert_relative_eq!(at_20, 1.4, epsilon = 1e-6);
    }

    #[test]
    fn label_text_has_two_decimal_precision() {
        let label = MeasurementLabel::for_segment(Vec3::ZERO, Vec3::new(3.0, 0.0, 4.0));
        assert_eq!(label.text, "5.00m");
    }

    #[test]
    fn label_lift_is_clamped_to_5_to_20_cm() {
        let near = MeasurementLabel::for_segment(Vec3::ZERO, Vec3::new(0.1, 0.0, 0.0));
        assert_relative_eq!(near.world_position.y, 0.05, epsilon = 1e-6);

        let far = MeasurementLabel::for_segment(Vec3::ZERO, Vec3::new(50.0, 0.0, 0.0));
        assert_relative_eq!(far.world_position.y, 0.2, epsilon = 1e-6);
    }

    #[test]
    fn label_position_is_segment_midpoint_plus_lift() {
        let label = MeasurementLabel::for_segment(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(label.world_position.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(label.world_position.z, 0.0, epsilon = 1e-6);
    }
}
