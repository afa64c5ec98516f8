use std::fmt;

/// Incremental frustum-culling state handed from a bounding volume to its
/// children.
///
/// Bit `i` is set while plane `i` has not yet been shown to contain the
/// whole volume. A cleared bit stays cleared for every nested volume.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Outcode {
    culled: bool,
    mask: u8,
}

impl Outcode {
    /// Nothing is known yet: all six planes must be tested.
    pub const ROOT: Self = Self {
        culled: false,
        mask: Self::ALL_PLANES,
    };

    /// The volume lies entirely outside some plane.
    pub const CULLED: Self = Self {
        culled: true,
        mask: 0,
    };

    /// The volume lies inside every plane.
    pub const INSIDE: Self = Self {
        culled: false,
        mask: 0,
    };

    const ALL_PLANES: u8 = 0x3f;

    #[must_use]
    pub fn is_culled(self) -> bool {
        self.culled
    }

    /// True when no plane remains to be tested.
    #[must_use]
    pub fn is_inside(self) -> bool {
        !self.culled && self.mask == 0
    }

    /// True if plane `plane` still needs testing.
    #[must_use]
    pub fn is_active(self, plane: usize) -> bool {
        self.mask & (1 << plane) != 0
    }

    #[must_use]
    pub fn mask(self) -> u8 {
        self.mask
    }

    pub(crate) fn clear_plane(&mut self, plane: usize) {
        self.mask &= !(1 << plane);
    }
}

impl Default for Outcode {
    fn default() -> Self {
        Self::ROOT
    }
}

impl fmt::Debug for Outcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.culled {
            write!(f, "Outcode(culled)")
        } else {
            write!(f, "Outcode({:06b})", self.mask)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_has_all_planes_active() {
        let code = Outcode::default();
        assert_eq!(code, Outcode::ROOT);
        assert!((0..6).all(|i| code.is_active(i)));
        assert!(!code.is_inside());
        assert!(!code.is_culled());
    }

    #[test]
    fn test_clearing_every_plane_is_inside() {
        let mut code = Outcode::ROOT;
        for i in 0..6 {
            code.clear_plane(i);
        }
        assert_eq!(code, Outcode::INSIDE);
        assert!(!Outcode::CULLED.is_inside());
        assert_eq!(format!("{:?}", Outcode::ROOT), "Outcode(111111)");
    }
}
