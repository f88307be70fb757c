//! Mapping between normalized screen positions and world directions.
//!
//! The visible window is treated as a flat angular rectangle: a screen offset
//! maps linearly to an angular offset. This is a small-angle approximation of
//! the real perspective projection and drifts towards the edges of wide fields
//! of view. It is precise enough for hotspot placement.

use super::spherical::{Direction, angle_delta, clamp_pitch, normalize_angle};

/// Horizontal and vertical angular extent of the view, degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FieldOfView {
    pub horizontal: f64,
    pub vertical: f64,
}

impl FieldOfView {
    pub fn new(horizontal: f64, vertical: f64) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }
}

impl Default for FieldOfView {
    fn default() -> Self {
        Self::new(120.0, 90.0)
    }
}

/// Normalized view position: (0, 0) top-left, (1, 1) bottom-right.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewPoint {
    pub x: f64,
    pub y: f64,
}

impl ViewPoint {
    pub const CENTER: Self = Self { x: 0.5, y: 0.5 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Pixel position for a viewport of `width` x `height`.
    pub fn to_pixels(self, width: f64, height: f64) -> (f64, f64) {
        (self.x * width, self.y * height)
    }
}

/// How far beyond each edge of the window, as a fraction of the FOV, a
/// direction still counts as visible.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VisibilityMargin(pub f64);

impl Default for VisibilityMargin {
    fn default() -> Self {
        Self(0.2)
    }
}

impl VisibilityMargin {
    fn contains(self, v: f64) -> bool {
        v >= -self.0 && v <= 1.0 + self.0
    }
}

/// Absolute direction under a normalized view position.
pub fn view_to_direction(view: ViewPoint, camera: Direction, fov: FieldOfView) -> Direction {
    let yaw = camera.yaw + (view.x - 0.5) * fov.horizontal;
    // Screen y grows downward, pitch grows upward.
    let pitch = camera.pitch - (view.y - 0.5) * fov.vertical;
    Direction::new(normalize_angle(yaw), clamp_pitch(pitch))
}

/// Normalized view position of `direction`, or `None` when it lies outside
/// the window extended by `margin`.
///
/// The yaw offset is taken the short way around, so a hotspot at yaw -175
/// seen from a camera at yaw 175 sits just right of center.
pub fn direction_to_view(
    direction: Direction,
    camera: Direction,
    fov: FieldOfView,
    margin: VisibilityMargin,
) -> Option<ViewPoint> {
    if fov.horizontal <= 0.0 || fov.vertical <= 0.0 {
        return None;
    }
    let x = 0.5 + angle_delta(camera.yaw, direction.yaw) / fov.horizontal;
    let y = 0.5 + (camera.pitch - direction.pitch) / fov.vertical;

    (margin.contains(x) && margin.contains(y)).then(|| ViewPoint::new(x, y))
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
    fn center_click_hits_camera_direction() {
        let d = view_to_direction(
            ViewPoint::CENTER,
            Direction::new(0.0, 0.0),
            FieldOfView::default(),
        );
        assert_close(d.yaw, 0.0, 1e-12);
        assert_close(d.pitch, 0.0, 1e-12);
    }

    #[test]
    fn right_edge_is_half_the_horizontal_fov() {
        let d = view_to_direction(
            ViewPoint::new(1.0, 0.5),
            Direction::new(0.0, 0.0),
            FieldOfView::default(),
        );
        assert_close(d.yaw, 60.0, 1e-12);
        assert_close(d.pitch, 0.0, 1e-12);
    }

    #[test]
    fn top_of_screen_looks_up() {
        let d = view_to_direction(
            ViewPoint::new(0.5, 0.0),
            Direction::new(0.0, 10.0),
            FieldOfView::default(),
        );
        assert_close(d.pitch, 55.0, 1e-12);
    }

    #[test]
    fn click_wraps_across_the_seam() {
        let d = view_to_direction(
            ViewPoint::new(1.0, 0.5),
            Direction::new(170.0, 0.0),
            FieldOfView::default(),
        );
        assert_close(d.yaw, -130.0, 1e-9);
    }

    #[test]
    fn direction_behind_camera_is_hidden() {
        let v = direction_to_view(
            Direction::new(180.0, 0.0),
            Direction::new(0.0, 0.0),
            FieldOfView::default(),
            VisibilityMargin::default(),
        );
        assert!(v.is_none());
    }

    #[test]
    fn margin_keeps_near_edge_directions() {
        let camera = Direction::new(0.0, 0.0);
        let fov = FieldOfView::default();
        // 20 % of 120 beyond the right edge is yaw 84.
        let inside = direction_to_view(Direction::new(83.0, 0.0), camera, fov, Default::default());
        let outside = direction_to_view(Direction::new(85.0, 0.0), camera, fov, Default::default());
        assert!(inside.is_some());
        assert!(outside.is_none());

        let strict = direction_to_view(Direction::new(65.0, 0.0), camera, fov, VisibilityMargin(0.0));
        assert!(strict.is_none());
    }

    #[test]
    fn seam_direction_is_visible() {
        let v = direction_to_view(
            Direction::new(-175.0, 0.0),
            Direction::new(175.0, 0.0),
            FieldOfView::default(),
            VisibilityMargin::default(),
        )
        .unwrap();
        assert_close(v.x, 0.5 + 10.0 / 120.0, 1e-9);
    }

    proptest! {
        #[test]
        fn view_mapping_is_an_approximate_inverse(
            x in 0.001f64..0.999,
            y in 0.001f64..0.999,
            cam_yaw in -179.0f64..180.0,
            cam_pitch in -40.0f64..40.0,
            h_fov in 30.0f64..120.0,
            v_fov in 30.0f64..90.0,
        ) {
            let camera = Direction::new(cam_yaw, cam_pitch);
            let fov = FieldOfView::new(h_fov, v_fov);
            let dir = view_to_direction(ViewPoint::new(x, y), camera, fov);
            let back = direction_to_view(dir, camera, fov, VisibilityMargin::default()).unwrap();
            prop_assert!((back.x - x).abs() < 1e-9);
            prop_assert!((back.y - y).abs() < 1e-9);
        }
    }
}
