//! Conversions between angular directions on the viewing sphere and 3D points.
//!
//! All angles are degrees. Yaw is measured clockwise (seen from above) from the
//! forward axis `-Z`, so yaw 90 points at `+X`. Pitch is positive up.

use super::Vec3;

/// Pitch is clamped to this magnitude (straight up / straight down).
pub const PITCH_LIMIT_DEG: f64 = 90.0;

/// A direction on the viewing sphere.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Direction {
    pub yaw: f64,
    pub pitch: f64,
}

impl Direction {
    pub fn new(yaw: f64, pitch: f64) -> Self {
        Self { yaw, pitch }
    }

    /// Yaw folded into (-180, 180], pitch clamped to [-90, 90].
    pub fn normalized(self) -> Self {
        Self {
            yaw: normalize_angle(self.yaw),
            pitch: clamp_pitch(self.pitch),
        }
    }

    pub fn is_finite(self) -> bool {
        self.yaw.is_finite() && self.pitch.is_finite()
    }
}

/// Spherical coordinates of a 3D point.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Spherical {
    pub yaw: f64,
    pub pitch: f64,
    pub radius: f64,
}

impl Spherical {
    pub fn direction(self) -> Direction {
        Direction::new(self.yaw, self.pitch)
    }
}

/// Folds any angle into (-180, 180].
///
/// Non-finite input is returned unchanged; callers that accept user input are
/// expected to reject it before normalizing.
pub fn normalize_angle(deg: f64) -> f64 {
    if !deg.is_finite() || (deg > -180.0 && deg <= 180.0) {
        return deg;
    }
    let wrapped = (deg + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 { 180.0 } else { wrapped }
}

pub fn clamp_pitch(deg: f64) -> f64 {
    deg.clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG)
}

/// Signed shortest angular difference `to - from`, in (-180, 180].
pub fn angle_delta(from: f64, to: f64) -> f64 {
    normalize_angle(to - from)
}

/// Direction + distance to a point in viewer space. Total for any real input.
pub fn to_cartesian(yaw_deg: f64, pitch_deg: f64, radius: f64) -> Vec3 {
    let yaw = yaw_deg.to_radians();
    let pitch = pitch_deg.to_radians();
    let cos_pitch = pitch.cos();

    Vec3::new(
        radius * cos_pitch * yaw.sin(),
        radius * pitch.sin(),
        -radius * cos_pitch * yaw.cos(),
    )
}

/// Inverse of [`to_cartesian`]. Returns `None` at the origin, where the
/// direction is undefined.
pub fn to_spherical(point: Vec3) -> Option<Spherical> {
    let radius = point.length();
    if radius == 0.0 || !radius.is_finite() {
        return None;
    }

    let pitch = (point.y / radius).clamp(-1.0, 1.0).asin().to_degrees();
    let yaw = normalize_angle(point.x.atan2(-point.z).to_degrees());

    Some(Spherical { yaw, pitch, radius })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn forward_is_negative_z() {
        let p = to_cartesian(0.0, 0.0, 1.0);
        assert_close(p.x, 0.0, 1e-12);
        assert_close(p.y, 0.0, 1e-12);
        assert_close(p.z, -1.0, 1e-12);
    }

    #[test]
    fn yaw_is_clockwise_from_above() {
        let right = to_cartesian(90.0, 0.0, 2.0);
        assert_close(right.x, 2.0, 1e-12);
        assert_close(right.z, 0.0, 1e-12);

        let up = to_cartesian(37.0, 90.0, 1.0);
        assert_close(up.y, 1.0, 1e-12);
    }

    #[test]
    fn origin_has_no_direction() {
        assert!(to_spherical(Vec3::ZERO).is_none());
    }

    #[test]
    fn pole_recovers_pitch() {
        let s = to_spherical(to_cartesian(12.0, -90.0, 5.0)).unwrap();
        assert_close(s.pitch, -90.0, 1e-9);
        assert_close(s.radius, 5.0, 1e-9);
    }

    #[test]
    fn normalize_angle_examples() {
        assert_eq!(normalize_angle(180.0), 180.0);
        assert_eq!(normalize_angle(-180.0), 180.0);
        assert_eq!(normalize_angle(540.0), 180.0);
        assert_close(normalize_angle(190.0), -170.0, 1e-12);
        assert_close(normalize_angle(-725.0), -5.0, 1e-12);
        assert_eq!(normalize_angle(0.0), 0.0);
        assert!(normalize_angle(f64::NAN).is_nan());
    }

    #[test]
    fn angle_delta_takes_short_way() {
        assert_close(angle_delta(170.0, -170.0), 20.0, 1e-12);
        assert_close(angle_delta(-170.0, 170.0), -20.0, 1e-12);
    }

    proptest! {
        #[test]
        fn cartesian_round_trip(
            yaw in -179.999f64..=180.0,
            pitch in -89.9f64..=89.9,
            radius in 0.001f64..1.0e6,
        ) {
            let s = to_spherical(to_cartesian(yaw, pitch, radius)).unwrap();
            prop_assert!(angle_delta(yaw, s.yaw).abs() < 1e-9);
            prop_assert!((pitch - s.pitch).abs() < 1e-9);
            prop_assert!((radius - s.radius).abs() <= radius * 1e-12);
        }

        #[test]
        fn normalize_angle_is_idempotent(a in -1.0e9f64..1.0e9) {
            let once = normalize_angle(a);
            prop_assert_eq!(normalize_angle(once), once);
            prop_assert!(once > -180.0 && once <= 180.0);
        }
    }
}
