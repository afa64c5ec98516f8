//! The terrain mesh hierarchy: a map made of a grid of cells, each cell a
//! complete quadtree of mesh tiles loaded from its `hf.cell` container.

mod cell;
mod error;
mod map;
mod map_info;
mod tile;

pub use cell::{Cell, CellTextures};
pub use error::TerrainError;
pub use map::Map;
pub use map_info::{MAX_CELL_SIZE, MIN_CELL_SIZE, MapInfo};
pub use tile::Tile;

/// File name of a cell's mesh container.
pub const MESH_FILE: &str = "hf.cell";
/// File name of a cell's color texture container.
pub const COLOR_MAP_FILE: &str = "color.tqt";
/// File name of a cell's normal-map texture container.
pub const NORMAL_MAP_FILE: &str = "norm.tqt";
