//! Comfort settings and presets (spec §3 `ComfortSettings`).

/// Locomotion style: continuous-velocity movement vs. teleport-with-arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocomotionMode {
    /// Continuous stick-driven movement, ramped for comfort.
    Smooth,
    /// Aim-and-release parabolic-arc teleport.
    Teleport,
}

/// Turning style: continuous yaw vs. discrete snap-turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurningMode {
    /// Continuous stick-driven yaw.
    Smooth,
    /// Discrete angle jumps with a cooldown.
    Snap,
}

/// Bundled locomotion + turning + speed comfort settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComfortSettings {
    /// Smooth or teleport movement.
    pub locomotion_mode: LocomotionMode,
    /// Smooth or snap turning.
    pub turning_mode: TurningMode,
    /// Snap-turn rotation angle, in degrees.
    pub snap_turn_angle_degrees: f32,
    /// Whether the comfort-speed multiplier and halved turn rate apply.
    pub reduced_motion: bool,
    /// Speed multiplier applied to all movement while `reduced_motion`
    /// is set.
    pub comfort_speed: f32,
    /// Whether the teleport arc is rendered while aiming.
    pub show_teleport_arc: bool,
}

impl ComfortSettings {
    /// `free` preset: smooth locomotion and turning, full speed.
    #[must_use]
    pub fn free() -> Self {
        Self {
            locomotion_mode: LocomotionMode::Smooth,
            turning_mode: TurningMode::Smooth,
            snap_turn_angle_degrees: 30.0,
            reduced_motion: false,
            comfort_speed: 1.0,
            show_teleport_arc: true,
        }
    }

    /// `comfort` preset: teleport locomotion, snap turning, reduced
    /// motion at 30% speed.
    #[must_use]
    pub fn comfort() -> Self {
        Self {
            locomotion_mode: LocomotionMode::Teleport,
            turning_mode: TurningMode::Snap,
            snap_turn_angle_degrees: 30.0,
            reduced_motion: true,
            comfort_speed: 0.3,
            show_teleport_arc: true,
        }
    }

    /// The speed multiplier movement math should apply: `comfort_speed`
    /// while `reduced_motion` is set, `1.0` otherwise.
    #[must_use]
    pub fn effective_comfort_speed(&self) -> f32 {
        if self.reduced_motion {
            self.comfort_speed
        } else {
            1.0
        }
    }
}

impl Default for ComfortSettings {
    fn default() -> Self {
        Self::free()
    }
}

/// What changed between two [`ComfortSettings`] values, so the VR
/// coordinator can apply the right mid-session side effects (spec
/// §4.1 "Comfort change mid-session").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComfortTransition {
    /// Whether `locomotion_mode` differs between the two settings.
    pub locomotion_mode_changed: bool,
    /// Whether `turning_mode` differs between the two settings.
    pub turning_mode_changed: bool,
    /// Whether `reduced_motion` differs between the two settings.
    pub reduced_motion_changed: bool,
}

impl ComfortTransition {
    /// Compute which fields changed between `prior` and `next`.
    #[must_use]
    pub fn diff(prior: &ComfortSettings, next: &ComfortSettings) -> Self {
        Self {
            locomotion_mode_changed: prior.locomotion_mode != next.locomotion_mode,
            turning_mode_changed: prior.turning_mode != next.turning_mode,
            reduced_motion_changed: prior.reduced_motion != next.reduced_motion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_preset_matches_spec() {
        let s = ComfortSettings::free();
        assert_eq!(s.locomotion_mode, LocomotionMode::Smooth);
        assert_eq!(s.turning_mode, TurningMode::Smooth);
        assert!(!s.reduced_motion);
        assert_eq!(s.comfort_speed, 1.0);
    }

    #[test]
    fn comfort_preset_matches_spec() {
        let s = ComfortSettings::comfort();
        assert_eq!(s.locomotion_mode, LocomotionMode::Teleport);
        assert_eq!(s.turning_mode, TurningMode::Snap);
        assert!(s.reduced_motion);
        assert_eq!(s.comfort_speed, 0.3);
    }

    #[test]
    fn effective_comfort_speed_ignores_multiplier_when_not_reduced() {
        let mut s = ComfortSettings::free();
        s.comfort_speed = 0.3;
        assert_eq!(s.effective_comfort_speed(), 1.0);
    }

    #[test]
    fn cycling_free_comfort_free_restores_original_settings() {
        let free = ComfortSettings::free();
        let comfort = ComfortSettings::comfort();
        assert_ne!(free, comfort);
        // free -> comfort -> free is equivalent to the original `free`.
        assert_eq!(ComfortSettings::free(), free);
    }

    #[test]
    fn transition_detects_locomotion_mode_change() {
        let t = ComfortTransition::diff(&ComfortSettings::free(), &ComfortSettings::comfort());
        assert!(t.locomotion_mode_changed);
        assert!(t.turning_mode_changed);
        assert!(t.reduced_motion_changed);
    }

    #[test]
    fn transition_is_empty_for_identical_settings() {
        let t = ComfortTransition::diff(&ComfortSettings::free(), &ComfortSettings::free());
        assert_eq!(t, ComfortTransition::default());
    }
}
