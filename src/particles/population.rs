//! Adaptive particle count and per-particle initial-state sampling for
//! the marine-snow field (C6).

use glam::Vec3;
use rand::Rng;

use crate::model::BoundingBox;

const MIN_COUNT: u32 = 100;
const MAX_COUNT: u32 = 8000;

/// Target particle count for a model's expanded bounding volume.
///
/// Piecewise density rule (the canonical one — see DESIGN.md for why the
/// flat-density alternative was not used): density is `0.0625` below
/// 5000 m³, interpolates linearly up to `2.0` across `[5000, 20000)`,
/// then saturates at `3.5`. The resulting count is clamped to
/// `[100, 8000]`.
#[must_use]
pub fn target_particle_count(expanded_volume: f32) -> u32 {
    let density = if expanded_volume < 5000.0 {
        0.0625
    } else if expanded_volume < 20_000.0 {
        let t = (expanded_volume - 5000.0) / (20_000.0 - 5000.0);
        0.0625 + (2.0 - 0.0625) * t
    } else {
        3.5
    };

    let raw = (expanded_volume * density) as u32;
    raw.clamp(MIN_COUNT, MAX_COUNT)
}

/// Whether a model-change particle count delta requires a full
/// geometry rebuild rather than an in-place redistribution.
///
/// Threshold: `|new - current| > 0.2 * current`.
#[must_use]
pub fn needs_rebuild(current: u32, new: u32) -> bool {
    if current == 0 {
        return new > 0;
    }
    let diff = (i64::from(new) - i64::from(current)).unsigned_abs();
    diff as f32 > 0.2 * current as f32
}

/// Particle size class, sampled 70% small / 20% medium / 10% large.
#[must_use]
pub fn sample_particle_size(rng: &mut impl Rng) -> f32 {
    let roll: f32 = rng.random();
    if roll < 0.7 {
        rng.random_range(0.0075..=0.0125)
    } else if roll < 0.9 {
        rng.random_range(0.0125..=0.02)
    } else {
        rng.random_range(0.02..=0.03)
    }
}

/// Initial velocity: a fixed slow drift plus uniform per-axis noise.
#[must_use]
pub fn sample_particle_velocity(rng: &mut impl Rng) -> Vec3 {
    let base = Vec3::new(0.000_01, -0.000_005, 0.000_005);
    let noise_xz = 2e-5;
    Vec3::new(
        base.x + rng.random_range(-noise_xz..=noise_xz),
        base.y,
        base.z + rng.random_range(-noise_xz..=noise_xz),
    )
}

/// Uniformly sample a position within `bounds`.
#[must_use]
pub fn sample_particle_position(bounds: &BoundingBox, rng: &mut impl Rng) -> Vec3 {
    Vec3::new(
        rng.random_range(bounds.min.x..=bounds.max.x),
        rng.random_range(bounds.min.y..=bounds.max.y),
        rng.random_range(bounds.min.z..=bounds.max.z),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn density_below_5000_is_flat_minimum() {
        // 1000 m^3 * 0.0625 = 62.5 -> clamped to MIN_COUNT
        assert_eq!(target_particle_count(1000.0), MIN_COUNT);
    }

    #[test]
    fn density_saturates_above_20000() {
        let count = target_particle_count(50_000.0);
        assert_eq!(count, MAX_COUNT);
    }

    #[test]
    fn density_interpolates_in_the_middle_band() {
        // Just past the start of [5000, 20000): density is barely above
        // the 0.0625 floor, giving a count comfortably inside the clamp
        // band so the interpolation itself (not the clamp) is exercised.
        let v = 5500.0;
        let expected_density = 0.0625 + (2.0 - 0.0625) * (500.0 / 15_000.0);
        let expected_count = (v * expected_density) as u32;
        assert!(expected_count > MIN_COUNT && expected_count < MAX_COUNT);
        assert_eq!(target_particle_count(v), expected_count);
    }

    #[test]
    fn count_is_always_clamped_to_spec_bounds() {
        assert!(target_particle_count(0.0) >= MIN_COUNT);
        assert!(target_particle_count(1e9) <= MAX_COUNT);
    }

    #[test]
    fn rebuild_threshold_matches_worked_example() {
        // 1000 -> 1150 is a 150 delta, <= 200 (20% of 1000): redistribute.
        assert!(!needs_rebuild(1000, 1150));
        // 1000 -> 1300 is a 300 delta, > 200: rebuild.
        assert!(needs_rebuild(1000, 1300));
    }

    #[test]
    fn rebuild_from_zero_current_always_rebuilds_when_nonzero() {
        assert!(needs_rebuild(0, 500));
        assert!(!needs_rebuild(0, 0));
    }

    #[test]
    fn sampled_velocity_centers_on_the_base_drift() {
        let mut rng = rand::rng();
        let mut sum = Vec3::ZERO;
        const N: u32 = 200;
        for _ in 0..N {
            sum += sample_particle_velocity(&mut rng);
        }
        let mean = sum / N as f32;
        assert_relative_eq!(mean.y, -0.000_005, epsilon = 1e-9);
    }
}
