//! Scripted camera path for the headless driver.

use glam::DVec3;
use terra_terrain::MapInfo;

/// Straight-line flight from one point to another over a fixed number of
/// frames, looking ahead and down along the track.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Flight {
    start: DVec3,
    end: DVec3,
    frames: u32,
    look_ahead: f64,
    ground: f64,
}

impl Flight {
    /// # Panics
    ///
    /// Panics if `start` and `end` coincide horizontally.
    #[must_use]
    pub fn new(start: DVec3, end: DVec3, frames: u32, ground: f64) -> Self {
        let track = DVec3::new(end.x - start.x, 0.0, end.z - start.z);
        assert!(track.length() > 0.0, "flight needs horizontal travel");
        let altitude = (start.y - ground).abs().max(1.0);
        Self {
            start,
            end,
            frames,
            look_ahead: 2.0 * altitude,
            ground,
        }
    }

    /// NW to SE diagonal across the whole map, cruising at a tenth of the
    /// map's width above its highest point.
    #[must_use]
    pub fn across(info: &MapInfo, frames: u32) -> Self {
        let west = info.west();
        let east = info.east();
        let north = info.north();
        let south = info.south();
        let altitude = f64::from(info.max_elevation) + 0.1 * (east - west);
        let inset = 0.05 * (east - west).min(south - north);
        Self::new(
            DVec3::new(west + inset, altitude, north + inset),
            DVec3::new(east - inset, altitude, south - inset),
            frames,
            f64::from(info.min_elevation),
        )
    }

    #[must_use]
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Camera position and look-at target for `frame`.
    #[must_use]
    pub fn pose(&self, frame: u32) -> (DVec3, DVec3) {
        let t = if self.frames > 1 {
            f64::from(frame.min(self.frames - 1)) / f64::from(self.frames - 1)
        } else {
            0.0
        };
        let position = self.start.lerp(self.end, t);
        let heading = DVec3::new(self.end.x - self.start.x, 0.0, self.end.z - self.start.z)
            .normalize();
        let mut target = position + heading * self.look_ahead;
        target.y = self.ground;
        (position, target)
    }
}
