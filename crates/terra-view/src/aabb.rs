use glam::DVec3;

/// Axis-aligned bounding box in double-precision world space.
///
/// Invariant: `min <= max` on every axis. [`Aabb::new`] sorts its corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    /// Create a box from two opposite corners in any order.
    #[must_use]
    pub fn new(a: DVec3, b: DVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    #[must_use]
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Full size along each axis.
    #[must_use]
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Corner `i` of the box: bit 0 selects max X, bit 1 max Y, bit 2 max Z.
    #[must_use]
    pub fn corner(&self, i: usize) -> DVec3 {
        DVec3::new(
            if i & 1 == 0 { self.min.x } else { self.max.x },
            if i & 2 == 0 { self.min.y } else { self.max.y },
            if i & 4 == 0 { self.min.z } else { self.max.z },
        )
    }

    #[must_use]
    pub fn corners(&self) -> [DVec3; 8] {
        std::array::from_fn(|i| self.corner(i))
    }

    /// True if `p` lies inside or on the boundary.
    #[must_use]
    pub fn contains_point(&self, p: DVec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// True if `other` is entirely inside this box.
    #[must_use]
    pub fn contains(&self, other: &Aabb) -> bool {
        other.min.cmpge(self.min).all() && other.max.cmple(self.max).all()
    }

    /// Smallest box enclosing both.
    #[must_use]
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Point of the box nearest to `p`; `p` itself when inside.
    #[must_use]
    pub fn closest_point(&self, p: DVec3) -> DVec3 {
        p.clamp(self.min, self.max)
    }

    /// Euclidean distance from `p` to the box, zero when inside.
    #[must_use]
    pub fn distance_to(&self, p: DVec3) -> f64 {
        self.closest_point(p).distance(p)
    }
}
