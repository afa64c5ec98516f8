//! Viewer state: position, orientation, projection, and the screen-space
//! error metric.

use std::cell::Cell;
use std::fmt;

use glam::{DVec3, Mat4, Vec3};

/// The camera that drives view-dependent selection.
///
/// The position is kept in double precision so large worlds can be addressed
/// without jitter. Direction and up vectors are single-precision unit vectors.
#[derive(Clone, Debug)]
pub struct Camera {
    position: DVec3,
    direction: Vec3,
    up: Vec3,
    near: f32,
    far: f32,
    /// Viewport height / width.
    aspect: f32,
    /// Half of the horizontal field of view, in radians.
    half_fov: f32,
    viewport_width: u32,
    /// `viewport_width / (2 tan(half_fov))`; `None` until next use after a
    /// viewport or FOV change.
    error_factor: Cell<Option<f32>>,
}

impl Camera {
    /// A camera at the origin looking down `-Z` with `+Y` up.
    ///
    /// # Panics
    ///
    /// Panics if either viewport dimension is zero.
    #[must_use]
    pub fn new(viewport_width: u32, viewport_height: u32, fov_degrees: f32) -> Self {
        let mut camera = Self {
            position: DVec3::ZERO,
            direction: Vec3::NEG_Z,
            up: Vec3::Y,
            near: 1.0,
            far: 10_000.0,
            aspect: 1.0,
            half_fov: 0.0,
            viewport_width: 1,
            error_factor: Cell::new(None),
        };
        camera.set_viewport(viewport_width, viewport_height);
        camera.set_fov(fov_degrees);
        camera
    }

    #[must_use]
    pub fn position(&self) -> DVec3 {
        self.position
    }

    #[must_use]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.up
    }

    /// Unit vector to the right of the view direction. When the direction
    /// is parallel to `up`, north (-Z) stands in for it.
    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.direction
            .cross(self.up)
            .try_normalize()
            .or_else(|| self.direction.cross(Vec3::NEG_Z).try_normalize())
            .unwrap_or(Vec3::X)
    }

    /// Up vector orthogonal to the view direction.
    #[must_use]
    pub fn view_up(&self) -> Vec3 {
        self.right().cross(self.direction)
    }

    #[must_use]
    pub fn near(&self) -> f32 {
        self.near
    }

    #[must_use]
    pub fn far(&self) -> f32 {
        self.far
    }

    /// Aspect ratio as height / width.
    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    #[must_use]
    pub fn half_fov(&self) -> f32 {
        self.half_fov
    }

    /// Horizontal field of view in radians.
    #[must_use]
    pub fn fov_radians(&self) -> f32 {
        2.0 * self.half_fov
    }

    /// Horizontal field of view in degrees.
    #[must_use]
    pub fn fov(&self) -> f32 {
        self.fov_radians().to_degrees()
    }

    #[must_use]
    pub fn viewport_width(&self) -> u32 {
        self.viewport_width
    }

    /// Express `p` relative to the camera, keeping world orientation and
    /// scale. The result is small enough to narrow to `f32` for rendering.
    #[must_use]
    pub fn translate(&self, p: DVec3) -> DVec3 {
        p - self.position
    }

    /// View matrix for a camera placed at the origin (pair with
    /// [`Camera::translate`]).
    #[must_use]
    pub fn view_transform(&self) -> Mat4 {
        Mat4::look_to_rh(Vec3::ZERO, self.direction, self.view_up())
    }

    /// Perspective projection matching the horizontal field of view.
    #[must_use]
    pub fn proj_transform(&self) -> Mat4 {
        let fov_y = 2.0 * (self.aspect * self.half_fov.tan()).atan();
        Mat4::perspective_rh(fov_y, 1.0 / self.aspect, self.near, self.far)
    }

    /// Resize the viewport. Changes the aspect ratio but not the field of view.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        assert!(width > 0 && height > 0, "viewport must be non-empty");
        self.aspect = height as f32 / width as f32;
        self.viewport_width = width;
        self.error_factor.set(None);
    }

    /// Set the horizontal field of view in degrees.
    pub fn set_fov(&mut self, degrees: f32) {
        self.half_fov = (0.5 * degrees).to_radians();
        self.error_factor.set(None);
    }

    /// # Panics
    ///
    /// Panics unless `0 < near < far`.
    pub fn set_near_far(&mut self, near: f32, far: f32) {
        assert!(0.0 < near && near < far, "invalid clip range {near}..{far}");
        self.near = near;
        self.far = far;
    }

    /// Move without changing the heading.
    pub fn move_to(&mut self, position: DVec3) {
        self.position = position;
    }

    /// Move to `position` and face `at`, keeping the up vector.
    pub fn look_from(&mut self, position: DVec3, at: DVec3) {
        self.position = position;
        self.direction = (at - position).normalize().as_vec3();
    }

    /// Move to `position`, face `at`, and replace the up vector.
    pub fn look_from_with_up(&mut self, position: DVec3, at: DVec3, up: DVec3) {
        self.look_from(position, at);
        self.up = up.normalize().as_vec3();
    }

    /// Turn to face `direction`.
    pub fn look(&mut self, direction: Vec3) {
        self.direction = direction.normalize();
    }

    pub fn look_with_up(&mut self, direction: Vec3, up: Vec3) {
        self.direction = direction.normalize();
        self.up = up.normalize();
    }

    /// Pixels per unit of `error / distance`, recomputed on first use after
    /// the viewport or field of view changes.
    #[must_use]
    pub fn error_factor(&self) -> f32 {
        if let Some(factor) = self.error_factor.get() {
            return factor;
        }
        let factor = self.viewport_width as f32 / (2.0 * self.half_fov.tan());
        self.error_factor.set(Some(factor));
        factor
    }

    /// Projected size in pixels of a world-space error `err` seen at
    /// distance `dist`.
    #[must_use]
    pub fn screen_error(&self, dist: f32, err: f32) -> f32 {
        self.error_factor() * (err / dist)
    }
}

impl fmt::Display for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Camera {{")?;
        writeln!(f, "  position  = {}", self.position)?;
        writeln!(f, "  direction = {}", self.direction)?;
        writeln!(f, "  up        = {}", self.up)?;
        writeln!(f, "  near      = {}", self.near)?;
        writeln!(f, "  far       = {}", self.far)?;
        writeln!(f, "  aspect    = {}", self.aspect)?;
        writeln!(f, "  fov       = {}", self.fov())?;
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// A 90° horizontal FOV over 1000 pixels gives an error factor of 500.
    #[test]
    fn test_screen_error_scenario() {
        let camera = Camera::new(1000, 750, 90.0);
        assert!((camera.error_factor() - 500.0).abs() < 1e-3);
        assert!((camera.screen_error(100.0, 1.0) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_error_factor_invalidated_by_setters() {
        let mut camera = Camera::new(1000, 1000, 90.0);
        let before = camera.error_factor();
        camera.set_viewport(2000, 1000);
        assert!((camera.error_factor() - 2.0 * before).abs() < 1e-2);
        camera.set_fov(60.0);
        let expected = 2000.0 / (2.0 * 30f32.to_radians().tan());
        assert!((camera.error_factor() - expected).abs() < 1e-2);
    }

    #[test]
    fn test_viewport_sets_aspect() {
        let mut camera = Camera::new(1280, 720, 60.0);
        assert!((camera.aspect() - 0.5625).abs() < 1e-6);
        assert!((camera.fov() - 60.0).abs() < 1e-4);
        camera.set_viewport(100, 200);
        assert_eq!(camera.aspect(), 2.0);
        assert_eq!(camera.viewport_width(), 100);
    }

    #[test]
    fn test_look_from_normalizes_direction() {
        let mut camera = Camera::new(100, 100, 60.0);
        camera.look_from(DVec3::new(0.0, 10.0, 0.0), DVec3::new(10.0, 10.0, 0.0));
        assert_eq!(camera.direction(), Vec3::X);
        assert_eq!(camera.right(), Vec3::Z);
        assert_eq!(camera.translate(DVec3::new(1.0, 11.0, 2.0)), DVec3::new(1.0, 1.0, 2.0));
    }

    #[test]
    #[should_panic(expected = "invalid clip range")]
    fn test_near_far_must_be_ordered() {
        let mut camera = Camera::new(100, 100, 60.0);
        camera.set_near_far(10.0, 5.0);
    }

    /// A point on the view axis projects to the center of clip space.
    #[test]
    fn test_projection_centers_view_axis() {
        let mut camera = Camera::new(100, 100, 90.0);
        camera.set_near_far(1.0, 100.0);
        let clip = camera.proj_transform() * camera.view_transform() * glam::Vec4::new(0.0, 0.0, -10.0, 1.0);
        assert!(clip.x.abs() < 1e-5 && clip.y.abs() < 1e-5);
        assert!(clip.w > 0.0);
    }

    /// Looking straight down keeps a finite basis with north at the top.
    #[test]
    fn test_vertical_view_has_finite_basis() {
        let mut camera = Camera::new(100, 100, 90.0);
        camera.look(Vec3::NEG_Y);
        assert_eq!(camera.right(), Vec3::X);
        assert_eq!(camera.view_up(), Vec3::NEG_Z);
        assert!(camera.view_transform().is_finite());

        camera.look(Vec3::Y);
        assert!(camera.right().is_finite());
        assert!((camera.right().length() - 1.0).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn test_screen_error_decreases_with_distance(
            dist in 1.0f32..1.0e5,
            grow in 0.01f32..10.0,
            err in 0.01f32..100.0,
        ) {
            let camera = Camera::new(1280, 720, 60.0);
            prop_assert!(camera.screen_error(dist, err) > camera.screen_error(dist * (1.0 + grow), err));
        }

        #[test]
        fn test_screen_error_increases_with_error(
            dist in 1.0f32..1.0e5,
            err in 0.01f32..100.0,
            grow in 0.01f32..10.0,
        ) {
            let camera = Camera::new(1280, 720, 60.0);
            prop_assert!(camera.screen_error(dist, err * (1.0 + grow)) > camera.screen_error(dist, err));
        }

        #[test]
        fn test_screen_error_increases_with_viewport(
            width in 64u32..4096,
            extra in 16u32..4096,
            dist in 1.0f32..1.0e4,
        ) {
            let narrow = Camera::new(width, 720, 60.0);
            let wide = Camera::new(width + extra, 720, 60.0);
            prop_assert!(wide.screen_error(dist, 1.0) > narrow.screen_error(dist, 1.0));
        }
    }
}
