//! World-space view frustum and hierarchical box classification.

use glam::DVec3;

use crate::{Aabb, Camera, Outcode, Plane};

/// Plane indices into [`Frustum::planes`].
pub const LEFT: usize = 0;
pub const RIGHT: usize = 1;
pub const BOTTOM: usize = 2;
pub const TOP: usize = 3;
pub const NEAR: usize = 4;
pub const FAR: usize = 5;

/// Six inward-facing planes bounding the visible volume, in double-precision
/// world space.
#[derive(Clone, Debug, PartialEq)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Derive the frustum from the camera's position, orientation, field of
    /// view, aspect ratio and clip distances.
    #[must_use]
    pub fn from_camera(camera: &Camera) -> Self {
        let pos = camera.position();
        let forward = camera.direction().as_dvec3().normalize();
        let right = camera.right().as_dvec3().normalize();
        let up = right.cross(forward);

        let tan_h = f64::from(camera.half_fov()).tan();
        let tan_v = f64::from(camera.aspect()) * tan_h;
        let side = |normal: DVec3| Plane::from_point_normal(pos, normal);

        let near_point = pos + forward * f64::from(camera.near());
        let far_point = pos + forward * f64::from(camera.far());

        Self {
            planes: [
                side(tan_h * forward + right),
                side(tan_h * forward - right),
                side(tan_v * forward + up),
                side(tan_v * forward - up),
                Plane::from_point_normal(near_point, forward),
                Plane::from_point_normal(far_point, -forward),
            ],
        }
    }

    /// True if `p` is inside (or on) all six planes.
    #[must_use]
    pub fn contains_point(&self, p: DVec3) -> bool {
        self.planes.iter().all(|plane| plane.distance_to_point(p) >= 0.0)
    }

    /// Classify `bbox` given the outcode of an enclosing box.
    ///
    /// Planes already cleared in `parent` are not re-examined, which is only
    /// sound when `bbox` lies inside the box `parent` was computed for. Pass
    /// [`Outcode::ROOT`] for a box with no tested ancestor.
    #[must_use]
    pub fn intersect_box(&self, bbox: &Aabb, parent: Outcode) -> Outcode {
        debug_assert!(!parent.is_culled(), "intersect_box called with a culled parent");
        let mut code = parent;
        if code.is_inside() {
            return code;
        }

        let corners = bbox.corners();
        for (i, plane) in self.planes.iter().enumerate() {
            if !code.is_active(i) {
                continue;
            }
            let inside = corners
                .iter()
                .filter(|&&c| plane.distance_to_point(c) >= 0.0)
                .count();
            match inside {
                0 => return Outcode::CULLED,
                8 => {
                    code.clear_plane(i);
                    if code.is_inside() {
                        return code;
                    }
                }
                _ => {}
            }
        }
        code
    }
}
