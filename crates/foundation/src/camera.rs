//! Yaw/pitch camera looking out from the center of a panorama sphere.
//!
//! The camera has no inertia or zoom state; it is a direction plus a fixed
//! field of view, panned by pointer drags.

use crate::math::{
    Direction, FieldOfView, Vec2, ViewPoint, VisibilityMargin, clamp_pitch, direction_to_view,
    normalize_angle, view_to_direction,
};

/// Degrees of yaw per horizontal pixel of drag.
pub const DEFAULT_YAW_SENSITIVITY: f64 = 0.2;

/// Degrees of pitch per vertical pixel of drag.
pub const DEFAULT_PITCH_SENSITIVITY: f64 = 0.2;

/// Drag-to-rotation factors, degrees per pixel.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DragSensitivity {
    pub yaw: f64,
    pub pitch: f64,
}

impl Default for DragSensitivity {
    fn default() -> Self {
        Self {
            yaw: DEFAULT_YAW_SENSITIVITY,
            pitch: DEFAULT_PITCH_SENSITIVITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewCamera {
    /// Current look direction. Yaw is kept normalized, pitch clamped.
    direction: Direction,
    pub fov: FieldOfView,
}

impl Default for ViewCamera {
    fn default() -> Self {
        Self {
            direction: Direction::default(),
            fov: FieldOfView::default(),
        }
    }
}

impl ViewCamera {
    pub fn new(fov: FieldOfView) -> Self {
        Self {
            direction: Direction::default(),
            fov,
        }
    }

    pub fn looking_at(direction: Direction, fov: FieldOfView) -> Self {
        let mut camera = Self::new(fov);
        camera.set_direction(direction);
        camera
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn yaw(&self) -> f64 {
        self.direction.yaw
    }

    pub fn pitch(&self) -> f64 {
        self.direction.pitch
    }

    /// Point the camera at `direction`. Non-finite components are ignored.
    pub fn set_direction(&mut self, direction: Direction) {
        if direction.yaw.is_finite() {
            self.direction.yaw = normalize_angle(direction.yaw);
        }
        if direction.pitch.is_finite() {
            self.direction.pitch = clamp_pitch(direction.pitch);
        }
    }

    /// Apply a pointer drag of `delta` pixels.
    ///
    /// Dragging right turns the view left (the panorama follows the pointer),
    /// dragging down tilts the view up.
    pub fn pan_by_pixels(&mut self, delta: Vec2, sensitivity: DragSensitivity) {
        if !delta.is_finite() {
            return;
        }
        self.set_direction(Direction::new(
            self.direction.yaw - delta.x * sensitivity.yaw,
            self.direction.pitch + delta.y * sensitivity.pitch,
        ));
    }

    /// World direction under a normalized view position.
    pub fn view_to_direction(&self, view: ViewPoint) -> Direction {
        view_to_direction(view, self.direction, self.fov)
    }

    /// Normalized view position of `direction`, if inside the margin.
    pub fn direction_to_view(
        &self,
        direction: Direction,
        margin: VisibilityMargin,
    ) -> Option<ViewPoint> {
        direction_to_view(direction, self.direction, self.fov, margin)
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.fov);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn drag_pans_opposite_horizontally() {
        let mut camera = ViewCamera::default();
        camera.pan_by_pixels(Vec2::new(50.0, 0.0), DragSensitivity::default());
        assert_close(camera.yaw(), -10.0, 1e-12);

        camera.pan_by_pixels(Vec2::new(0.0, 25.0), DragSensitivity::default());
        assert_close(camera.pitch(), 5.0, 1e-12);
    }

    #[test]
    fn pitch_clamps_and_yaw_wraps() {
        let mut camera = ViewCamera::looking_at(Direction::new(-175.0, 80.0), FieldOfView::default());
        camera.pan_by_pixels(Vec2::new(50.0, 500.0), DragSensitivity::default());
        assert_close(camera.yaw(), 175.0, 1e-9);
        assert_eq!(camera.pitch(), 90.0);
    }

    #[test]
    fn non_finite_drag_is_ignored() {
        let mut camera = ViewCamera::looking_at(Direction::new(30.0, 10.0), FieldOfView::default());
        camera.pan_by_pixels(Vec2::new(f64::NAN, 1.0), DragSensitivity::default());
        assert_eq!(camera.direction(), Direction::new(30.0, 10.0));
    }

    #[test]
    fn reset_keeps_field_of_view() {
        let fov = FieldOfView::new(90.0, 60.0);
        let mut camera = ViewCamera::looking_at(Direction::new(45.0, -20.0), fov);
        camera.reset();
        assert_eq!(camera.direction(), Direction::default());
        assert_eq!(camera.fov, fov);
    }
}
