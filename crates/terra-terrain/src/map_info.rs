//! Map-level metadata supplied by the scene description.

use glam::DVec3;

use crate::TerrainError;

/// Smallest supported cell width, in `h_scale` units.
pub const MIN_CELL_SIZE: u32 = 1 << 8;
/// Largest supported cell width, in `h_scale` units.
pub const MAX_CELL_SIZE: u32 = 1 << 14;

/// Description of a heightfield map.
///
/// World coordinates put the map's NW corner at the origin, with X growing to
/// the east and Z to the south. Rows of cells increase southward and columns
/// eastward.
#[derive(Clone, Debug, PartialEq)]
pub struct MapInfo {
    pub name: String,
    /// Meters per horizontal grid unit.
    pub h_scale: f32,
    /// Meters per vertical unit of a quantized elevation.
    pub v_scale: f32,
    /// Elevation that a quantized `0` maps to.
    pub base_elevation: f32,
    pub min_elevation: f32,
    pub max_elevation: f32,
    /// Cell width in `h_scale` units; `cell_size + 1` vertices across.
    pub cell_size: u32,
    pub n_rows: u32,
    pub n_cols: u32,
    pub has_color_map: bool,
    pub has_normal_map: bool,
    /// Texture rows run south to north on disk.
    pub flip_textures: bool,
}

impl MapInfo {
    /// Check the metadata for internal consistency.
    ///
    /// # Errors
    ///
    /// [`TerrainError::InvalidMap`] when the cell size is not a power of two
    /// in `MIN_CELL_SIZE..=MAX_CELL_SIZE`, the grid is empty, a scale is not
    /// positive, or the elevation range is inverted.
    pub fn validate(&self) -> Result<(), TerrainError> {
        let reason = if !self.cell_size.is_power_of_two()
            || !(MIN_CELL_SIZE..=MAX_CELL_SIZE).contains(&self.cell_size)
        {
            format!(
                "cell size {} must be a power of two in {MIN_CELL_SIZE}..={MAX_CELL_SIZE}",
                self.cell_size
            )
        } else if self.n_rows == 0 || self.n_cols == 0 {
            format!("empty grid {}x{}", self.n_rows, self.n_cols)
        } else if !(self.h_scale > 0.0 && self.v_scale > 0.0) {
            format!("scales must be positive (h {}, v {})", self.h_scale, self.v_scale)
        } else if self.min_elevation > self.max_elevation {
            format!(
                "min elevation {} above max elevation {}",
                self.min_elevation, self.max_elevation
            )
        } else {
            return Ok(());
        };
        Err(TerrainError::InvalidMap {
            name: self.name.clone(),
            reason,
        })
    }

    /// Map width (east/west) in `h_scale` units.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.n_cols * self.cell_size
    }

    /// Map height (north/south) in `h_scale` units.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.n_rows * self.cell_size
    }

    /// Z coordinate of the north edge.
    #[must_use]
    pub fn north(&self) -> f64 {
        0.0
    }

    /// X coordinate of the east edge.
    #[must_use]
    pub fn east(&self) -> f64 {
        f64::from(self.h_scale) * f64::from(self.width())
    }

    /// Z coordinate of the south edge.
    #[must_use]
    pub fn south(&self) -> f64 {
        f64::from(self.h_scale) * f64::from(self.height())
    }

    /// X coordinate of the west edge.
    #[must_use]
    pub fn west(&self) -> f64 {
        0.0
    }

    /// Size of one cell in world units, with a zero Y component.
    #[must_use]
    pub fn cell_world_size(&self) -> DVec3 {
        let w = self.cell_extent();
        DVec3::new(w, 0.0, w)
    }

    /// NW corner of cell `(row, col)` in world coordinates, Y = 0.
    ///
    /// # Panics
    ///
    /// Panics if the cell is outside the grid.
    #[must_use]
    pub fn nw_cell_corner(&self, row: u32, col: u32) -> DVec3 {
        assert!(
            row < self.n_rows && col < self.n_cols,
            "cell ({row}, {col}) outside {}x{} grid",
            self.n_rows,
            self.n_cols
        );
        let w = self.cell_extent();
        DVec3::new(w * f64::from(col), 0.0, w * f64::from(row))
    }

    /// Grid coordinates of the cell containing world position `(x, _, z)`.
    #[must_use]
    pub fn cell_coords_at(&self, x: f64, z: f64) -> Option<(u32, u32)> {
        if x < 0.0 || z < 0.0 {
            return None;
        }
        let w = self.cell_extent();
        let (row, col) = ((z / w) as u32, (x / w) as u32);
        (row < self.n_rows && col < self.n_cols).then_some((row, col))
    }

    /// World elevation of a quantized height value.
    #[must_use]
    pub fn elevation(&self, y: i16) -> f64 {
        f64::from(self.base_elevation + self.v_scale * f32::from(y))
    }

    fn cell_extent(&self) -> f64 {
        f64::from(self.h_scale) * f64::from(self.cell_size)
    }
}
