use std::path::{Path, PathBuf};

use crate::{Cell, MapInfo, TerrainError};

/// A heightfield map: a row-major grid of cells sharing one [`MapInfo`].
///
/// Cell data lives under `<map dir>/<row>_<col>/`.
#[derive(Debug)]
pub struct Map {
    info: MapInfo,
    dir: PathBuf,
    cells: Vec<Cell>,
}

impl Map {
    /// Describe a map rooted at `dir`. No cell data is read yet.
    ///
    /// # Errors
    ///
    /// [`TerrainError::InvalidMap`] if `info` fails validation.
    pub fn new(dir: impl Into<PathBuf>, info: MapInfo) -> Result<Self, TerrainError> {
        info.validate()?;
        let dir = dir.into();
        let cells = (0..info.n_rows)
            .flat_map(|row| (0..info.n_cols).map(move |col| (row, col)))
            .map(|(row, col)| Cell::new(row, col, dir.join(Self::cell_dir_name(row, col))))
            .collect();
        tracing::info!(
            name = %info.name,
            rows = info.n_rows,
            cols = info.n_cols,
            cell_size = info.cell_size,
            "Map described"
        );
        Ok(Self { info, dir, cells })
    }

    /// Directory name of cell `(row, col)` relative to the map directory.
    #[must_use]
    pub fn cell_dir_name(row: u32, col: u32) -> String {
        format!("{row}_{col}")
    }

    #[must_use]
    pub fn info(&self) -> &MapInfo {
        &self.info
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load every cell.
    ///
    /// # Errors
    ///
    /// The first cell failure, see [`Cell::load`].
    pub fn load_all(&mut self) -> Result<(), TerrainError> {
        let info = &self.info;
        for cell in &mut self.cells {
            cell.load(info)?;
        }
        Ok(())
    }

    /// Load one cell if needed and return it.
    ///
    /// # Errors
    ///
    /// [`TerrainError::NoSuchCell`] outside the grid, otherwise see
    /// [`Cell::load`].
    pub fn load_cell(&mut self, row: u32, col: u32) -> Result<&mut Cell, TerrainError> {
        let idx = self
            .cell_index(row, col)
            .ok_or(TerrainError::NoSuchCell { row, col })?;
        let cell = &mut self.cells[idx];
        cell.load(&self.info)?;
        Ok(cell)
    }

    #[must_use]
    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cell_index(row, col).map(|i| &self.cells[i])
    }

    pub fn cell_mut(&mut self, row: u32, col: u32) -> Option<&mut Cell> {
        self.cell_index(row, col).map(|i| &mut self.cells[i])
    }

    /// The cell containing world position `(x, _, z)`.
    #[must_use]
    pub fn cell_at(&self, x: f64, z: f64) -> Option<&Cell> {
        let (row, col) = self.info.cell_coords_at(x, z)?;
        self.cell(row, col)
    }

    /// All cells in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    fn cell_index(&self, row: u32, col: u32) -> Option<usize> {
        (row < self.info.n_rows && col < self.info.n_cols)
            .then(|| (row * self.info.n_cols + col) as usize)
    }
}
