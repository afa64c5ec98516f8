//! Map cells and the loading of their tile hierarchy.

use std::path::{Path, PathBuf};

use glam::DVec3;
use terra_quadtree::{full_size, nw_child, parent};
use terra_store::{MeshStore, TextureStore};
use terra_view::Aabb;

use crate::{COLOR_MAP_FILE, MESH_FILE, MapInfo, NORMAL_MAP_FILE, TerrainError, Tile};

/// Texture quadtrees opened for a cell. Either map may be absent.
#[derive(Debug, Default)]
pub struct CellTextures {
    pub color: Option<TextureStore>,
    pub normal: Option<TextureStore>,
}

/// One square cell of the map grid, owning a complete quadtree of tiles.
#[derive(Debug)]
pub struct Cell {
    row: u32,
    col: u32,
    dir: PathBuf,
    depth: u32,
    tiles: Vec<Tile>,
    textures: CellTextures,
}

impl Cell {
    /// An unloaded cell whose data files live in `dir`.
    #[must_use]
    pub fn new(row: u32, col: u32, dir: impl Into<PathBuf>) -> Self {
        Self {
            row,
            col,
            dir: dir.into(),
            depth: 0,
            tiles: Vec::new(),
            textures: CellTextures::default(),
        }
    }

    #[must_use]
    pub fn row(&self) -> u32 {
        self.row
    }

    #[must_use]
    pub fn col(&self) -> u32 {
        self.col
    }

    /// Number of LODs; 0 until loaded.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        !self.tiles.is_empty()
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of one of this cell's data files.
    #[must_use]
    pub fn datafile(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// # Panics
    ///
    /// Panics if the cell is not loaded or `id` is out of range.
    #[must_use]
    pub fn tile(&self, id: u32) -> &Tile {
        assert!(self.is_loaded(), "cell ({}, {}) not loaded", self.row, self.col);
        &self.tiles[id as usize]
    }

    /// The coarsest tile, covering the whole cell.
    #[must_use]
    pub fn root(&self) -> &Tile {
        self.tile(0)
    }

    /// All tiles in hierarchical-id order.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// The children of `tile`, empty for a leaf.
    pub fn children(&self, tile: &Tile) -> impl Iterator<Item = &Tile> {
        tile.child_ids()
            .into_iter()
            .flatten()
            .map(|id| &self.tiles[id as usize])
    }

    #[must_use]
    pub fn textures(&self) -> &CellTextures {
        &self.textures
    }

    /// Hand the opened texture stores to their new owner (usually a
    /// resource cache).
    pub fn take_textures(&mut self) -> CellTextures {
        std::mem::take(&mut self.textures)
    }

    /// Load the tile hierarchy and open the declared texture maps. Does
    /// nothing if already loaded.
    ///
    /// Node records that fail to decode leave their tile without a chunk;
    /// the whole load only fails when the mesh container itself cannot be
    /// opened or does not match the map.
    ///
    /// # Errors
    ///
    /// [`TerrainError::Store`] if `hf.cell` cannot be opened,
    /// [`TerrainError::CellSizeMismatch`] if it was built for another width.
    pub fn load(&mut self, info: &MapInfo) -> Result<(), TerrainError> {
        if self.is_loaded() {
            return Ok(());
        }

        let path = self.datafile(MESH_FILE);
        let mut store = MeshStore::open(&path).map_err(|source| TerrainError::Store {
            path: path.clone(),
            source,
        })?;
        if store.tile_size() != info.cell_size {
            return Err(TerrainError::CellSizeMismatch {
                row: self.row,
                col: self.col,
                expected: info.cell_size,
                found: store.tile_size(),
            });
        }

        let depth = store.depth();
        let mut tiles = Vec::with_capacity(full_size(depth) as usize);
        init_tiles(&mut tiles, info.cell_size, depth);

        let cell_nw = info.nw_cell_corner(self.row, self.col);
        let h = f64::from(info.h_scale);
        let mut failed = 0usize;
        for tile in &mut tiles {
            let nw = cell_nw + DVec3::new(h * f64::from(tile.nw_col), 0.0, h * f64::from(tile.nw_row));
            let w = h * f64::from(tile.width);
            let (lo, hi) = match store.load_index(tile.id) {
                Ok(chunk) => {
                    let range = (info.elevation(chunk.min_y), info.elevation(chunk.max_y));
                    tile.chunk = Some(chunk);
                    range
                }
                Err(err) => {
                    tracing::warn!(
                        cell = %path.display(),
                        tile = tile.id,
                        error = %err,
                        "Mesh chunk unavailable"
                    );
                    failed += 1;
                    (f64::from(info.min_elevation), f64::from(info.max_elevation))
                }
            };
            tile.bbox = Aabb::new(
                DVec3::new(nw.x, lo, nw.z),
                DVec3::new(nw.x + w, hi, nw.z + w),
            );
        }

        // Coarse chunks may sit inside their refinements; widen so every
        // child box nests in its parent.
        for id in (1..tiles.len()).rev() {
            let child = tiles[id].bbox;
            let p = parent(id as u32) as usize;
            tiles[p].bbox = tiles[p].bbox.union(&child);
        }

        tracing::debug!(
            row = self.row,
            col = self.col,
            depth,
            tiles = tiles.len(),
            failed,
            "Loaded cell"
        );

        self.depth = depth;
        self.tiles = tiles;
        self.textures = self.open_textures(info);
        Ok(())
    }

    fn open_textures(&self, info: &MapInfo) -> CellTextures {
        let color = info
            .has_color_map
            .then(|| self.open_texture(COLOR_MAP_FILE, true, info.flip_textures))
            .flatten();
        let normal = info
            .has_normal_map
            .then(|| self.open_texture(NORMAL_MAP_FILE, false, info.flip_textures))
            .flatten();
        if let (Some(c), Some(n)) = (&color, &normal)
            && c.depth() != n.depth()
        {
            tracing::warn!(
                row = self.row,
                col = self.col,
                color_depth = c.depth(),
                normal_depth = n.depth(),
                "Color and normal maps have different depths"
            );
        }
        CellTextures { color, normal }
    }

    fn open_texture(&self, file: &str, srgb: bool, flip: bool) -> Option<TextureStore> {
        let path = self.datafile(file);
        if !TextureStore::is_valid_file(&path) {
            tracing::warn!(path = %path.display(), "Declared texture map missing or invalid");
            return None;
        }
        match TextureStore::open(&path) {
            Ok(store) => Some(store.with_srgb(srgb).with_flip(flip)),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Failed to open texture map");
                None
            }
        }
    }

    /// Indented printout of the tile tree, one line per tile, depth first.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        if self.is_loaded() {
            self.dump_tile(0, &mut out);
        }
        out
    }

    fn dump_tile(&self, id: u32, out: &mut String) {
        let tile = &self.tiles[id as usize];
        tile.dump_line(out);
        if let Some(kids) = tile.child_ids() {
            for kid in kids {
                self.dump_tile(kid, out);
            }
        }
    }
}

/// Fill `tiles` with the identity fields of a `depth`-level quadtree.
fn init_tiles(tiles: &mut Vec<Tile>, cell_size: u32, depth: u32) {
    let n = full_size(depth) as usize;
    tiles.clear();
    tiles.resize_with(n, || Tile {
        id: 0,
        lod: 0,
        nw_row: 0,
        nw_col: 0,
        width: cell_size,
        leaf: depth == 1,
        chunk: None,
        bbox: Aabb::new(DVec3::ZERO, DVec3::ZERO),
    });
    init_tile(tiles, cell_size, depth, 0, 0, 0, 0);
}

fn init_tile(tiles: &mut [Tile], cell_size: u32, depth: u32, id: u32, row: u32, col: u32, lod: u32) {
    let leaf = lod + 1 >= depth;
    let tile = &mut tiles[id as usize];
    tile.id = id;
    tile.lod = lod;
    tile.nw_row = row;
    tile.nw_col = col;
    tile.width = cell_size >> lod;
    tile.leaf = leaf;
    if leaf {
        return;
    }
    let half = cell_size >> (lod + 1);
    let offsets = [(0, 0), (0, half), (half, half), (half, 0)];
    let kid = nw_child(id);
    for (i, (dr, dc)) in offsets.into_iter().enumerate() {
        init_tile(tiles, cell_size, depth, kid + i as u32, row + dr, col + dc, lod + 1);
    }
}
