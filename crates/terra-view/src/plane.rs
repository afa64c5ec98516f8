use glam::DVec3;

/// An oriented plane `dot(normal, p) + d = 0`; the half-space with a
/// non-negative distance is "inside".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    /// Unit normal pointing into the inside half-space.
    pub normal: DVec3,
    pub d: f64,
}

impl Plane {
    /// Plane with the given normal (normalized here) passing through `point`.
    #[must_use]
    pub fn from_point_normal(point: DVec3, normal: DVec3) -> Self {
        let normal = normal.normalize();
        Self {
            normal,
            d: -normal.dot(point),
        }
    }

    /// Signed distance from `p` to the plane, positive on the inside.
    #[must_use]
    pub fn distance_to_point(&self, p: DVec3) -> f64 {
        self.normal.dot(p) + self.d
    }

    /// The same plane facing the other way.
    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            d: -self.d,
        }
    }
}
