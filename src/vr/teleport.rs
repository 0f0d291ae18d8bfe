//! Teleport locomotion: aim/release thresholds, parabolic arc sampling,
//! and floor-intersection search (spec §4.1 "Teleport mode").

use glam::Vec3;

/// Stick magnitude above which the teleport arc begins rendering.
pub const AIM_THRESHOLD: f32 = 0.7;
/// Stick magnitude below which, once aiming, a release is confirmed.
pub const RELEASE_THRESHOLD: f32 = 0.3;
/// Rate the virtual teleport floor raises/lowers under right-stick input
/// while aiming, meters/second.
pub const FLOOR_OFFSET_RATE_M_PER_S: f32 = 4.0;
/// Gravity used for the arc's parabola, m/s^2.
pub const GRAVITY: f32 = 9.8;
/// Arc sample count.
pub const ARC_SAMPLES: usize = 40;
/// Minimum valid teleport distance, meters.
pub const MIN_TELEPORT_DISTANCE_M: f32 = 3.0;
/// Maximum valid teleport distance, meters.
pub const MAX_TELEPORT_DISTANCE_M: f32 = 30.0;
/// Minimum floor-offset clamp, meters.
pub const MIN_FLOOR_OFFSET_M: f32 = -10.0;
/// Maximum floor-offset clamp, meters.
pub const MAX_FLOOR_OFFSET_M: f32 = 10.0;
/// Floor offset reset after a successful teleport.
pub const POST_TELEPORT_FLOOR_OFFSET_M: f32 = -1.6;
/// How long a stale arc-intersection cache remains valid without
/// revalidation, milliseconds.
pub const ARC_REVALIDATION_THROTTLE_MS: u64 = 10_000;
/// Minimum vertical launch speed fraction of total speed.
const MIN_VERTICAL_FRACTION: f32 = 0.3;

/// Aim/release state machine for one hand's teleport gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AimState {
    /// Stick magnitude below [`AIM_THRESHOLD`]; no arc shown.
    #[default]
    Idle,
    /// Stick magnitude at or above [`AIM_THRESHOLD`]; arc visible and tracking.
    Aiming,
}

/// Advance the aim/release state machine by one tick given the current
/// stick magnitude, applying hysteresis between [`AIM_THRESHOLD`] and
/// [`RELEASE_THRESHOLD`] so a trembling stick near one threshold doesn't
/// flicker the arc on and off.
#[must_use]
pub fn next_aim_state(current: AimState, magnitude: f32) -> AimState {
    match current {
        AimState::Idle if magnitude >= AIM_THRESHOLD => AimState::Aiming,
        AimState::Aiming if magnitude <= RELEASE_THRESHOLD => AimState::Idle,
        other => other,
    }
}

/// Whether `prior -> next` is the aiming-to-idle edge that should
/// resolve a teleport (the trigger was released after aiming).
#[must_use]
pub fn just_released(prior: AimState, next: AimState) -> bool {
    prior == AimState::Aiming && next == AimState::Idle
}

/// Map a normalized `[0, 1]` stick/trigger deflection to a teleport
/// target distance along the aim ray, using a sub-linear curve so small
/// deflections reach nearby ground precisely.
#[must_use]
pub fn distance_for_input(normalized: f32) -> f32 {
    let n = normalized.clamp(0.0, 1.0);
    3.0 + 27.0 * n.powf(0.7)
}

/// One sampled point along the parabolic arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcPoint {
    /// World-space position of this sample.
    pub position: Vec3,
    /// Seconds since launch this sample represents.
    pub time: f32,
}

/// Build the parabolic arc for a teleport aimed from `origin` along
/// `forward` (unit vector) targeting ground `distance` meters away.
#[must_use]
pub fn build_arc(origin: Vec3, forward: Vec3, distance: f32) -> Vec<ArcPoint> {
    let speed = (distance * GRAVITY / 2.0).sqrt();
    let horizontal = Vec3::new(forward.x, 0.0, forward.z).normalize_or_zero();
    let vertical_speed = (forward.y.max(0.0) * speed).max(MIN_VERTICAL_FRACTION * speed);
    let velocity = horizontal * speed + Vec3::Y * vertical_speed;

    let duration = (2.2 * (vertical_speed / GRAVITY)).max(1.5);
    (0..ARC_SAMPLES)
        .map(|i| {
            let t = duration * i as f32 / (ARC_SAMPLES - 1) as f32;
            let position = origin + velocity * t - Vec3::Y * (0.5 * GRAVITY * t * t);
            ArcPoint { position, time: t }
        })
        .collect()
}

/// Find where the arc crosses `floor_y`, searching only samples after
/// the apex and at least 0.1s into the flight (so the controller's own
/// launch point near `floor_y` doesn't false-positive), interpolating
/// linearly between the bracketing samples. Falls back to the last
/// sample in the second half of the arc if no crossing is found, and
/// caps the result at [`MAX_TELEPORT_DISTANCE_M`] from `origin`.
#[must_use]
pub fn find_floor_intersection(arc: &[ArcPoint], origin: Vec3, floor_y: f32) -> Option<Vec3> {
    if arc.len() < 2 {
        return None;
    }
    let apex_index = arc
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.position.y.total_cmp(&b.1.position.y))
        .map(|(i, _)| i)?;

    let search_start = apex_index.max(1);
    for i in search_start..arc.len() - 1 {
        let a = arc[i];
        let b = arc[i + 1];
        if a.time < 0.1 {
            continue;
        }
        if (a.position.y - floor_y) * (b.position.y - floor_y) <= 0.0 {
            let span = a.position.y - b.position.y;
            let t = if span.abs() > f32::EPSILON { (a.position.y - floor_y) / span } else { 0.0 };
            let point = a.position.lerp(b.position, t.clamp(0.0, 1.0));
            return Some(clamp_to_max_distance(origin, point));
        }
    }

    let fallback = arc[(arc.len() * 3 / 4).min(arc.len() - 1)];
    Some(clamp_to_max_distance(origin, fallback.position))
}

fn clamp_to_max_distance(origin: Vec3, point: Vec3) -> Vec3 {
    let offset = point - origin;
    let distance = offset.length();
    if distance > MAX_TELEPORT_DISTANCE_M {
        origin + offset.normalize_or_zero() * MAX_TELEPORT_DISTANCE_M
    } else {
        point
    }
}

/// Validate a candidate teleport target against the allowed distance
/// band.
#[must_use]
pub fn is_valid_release_distance(origin: Vec3, target: Vec3) -> bool {
    let d = origin.distance(target);
    (MIN_TELEPORT_DISTANCE_M..=MAX_TELEPORT_DISTANCE_M).contains(&d)
}

/// Clamp a floor-offset adjustment to the allowed band.
#[must_use]
pub fn clamp_floor_offset(offset: f32) -> f32 {
    offset.clamp(MIN_FLOOR_OFFSET_M, MAX_FLOOR_OFFSET_M)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aiming_starts_once_trigger_crosses_aim_threshold() {
        assert_eq!(next_aim_state(AimState::Idle, 0.8), AimState::Aiming);
        assert_eq!(next_aim_state(AimState::Idle, 0.5), AimState::Idle);
    }

    #[test]
    fn release_requires_dropping_below_release_threshold() {
        assert_eq!(next_aim_state(AimState::Aiming, 0.5), AimState::Aiming);
        assert_eq!(next_aim_state(AimState::Aiming, 0.1), AimState::Idle);
    }

    #[test]
    fn just_released_detects_the_aiming_to_idle_edge() {
        assert!(just_released(AimState::Aiming, AimState::Idle));
        assert!(!just_released(AimState::Idle, AimState::Idle));
    }

    #[test]
    fn distance_curve_is_sublinear_and_bounded() {
        assert_eq!(distance_for_input(0.0), 3.0);
        assert_eq!(distance_for_input(1.0), 30.0);
        let half = distance_for_input(0.5);
        assert!(half > 3.0 && half < 30.0);
        // sub-linear: distance at 0.5 input is more than half of the range
        assert!(half - 3.0 > 0.5 * (30.0 - 3.0) * 0.5);
    }

    #[test]
    fn arc_has_expected_sample_count_and_starts_at_origin() {
        let origin = Vec3::new(0.0, 1.6, 0.0);
        let arc = build_arc(origin, Vec3::NEG_Z, 10.0);
        assert_eq!(arc.len(), ARC_SAMPLES);
        assert_eq!(arc[0].position, origin);
    }

    #[test]
    fn floor_intersection_lands_near_target_distance() {
        let origin = Vec3::new(0.0, 1.6, 0.0);
        let distance = 10.0;
        let arc = build_arc(origin, Vec3::NEG_Z, distance);
        let hit = find_floor_intersection(&arc, origin, 0.0).unwrap();
        let traveled = origin.distance(Vec3::new(hit.x, origin.y, hit.z));
        assert!(traveled > 5.0 && traveled < 15.0);
    }

    #[test]
    fn floor_intersection_is_capped_at_max_distance() {
        let origin = Vec3::ZERO;
        let far_point = Vec3::new(100.0, 0.0, 0.0);
        let clamped = clamp_to_max_distance(origin, far_point);
        assert!((clamped.length() - MAX_TELEPORT_DISTANCE_M).abs() < 1e-3);
    }

    #[test]
    fn release_distance_validation_matches_spec_band() {
        let origin = Vec3::ZERO;
        assert!(is_valid_release_distance(origin, Vec3::new(10.0, 0.0, 0.0)));
        assert!(!is_valid_release_distance(origin, Vec3::new(1.0, 0.0, 0.0)));
        assert!(!is_valid_release_distance(origin, Vec3::new(40.0, 0.0, 0.0)));
    }

    #[test]
    fn floor_offset_clamps_to_band() {
        assert_eq!(clamp_floor_offset(-20.0), MIN_FLOOR_OFFSET_M);
        assert_eq!(clamp_floor_offset(20.0), MAX_FLOOR_OFFSET_M);
        assert_eq!(clamp_floor_offset(2.0), 2.0);
    }
}
