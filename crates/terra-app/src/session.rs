//! Per-frame streaming: frontier selection plus texture residency.

use rustc_hash::{FxHashMap, FxHashSet};
use terra_cache::{CacheStats, ResourceCache, TextureHandle, TextureUploader, TreeId};
use terra_config::{CameraConfig, Config, MapConfig};
use terra_lod::{Frontier, FrontierSelector, SelectionStats};
use terra_terrain::{Map, MapInfo};
use terra_view::{Camera, Frustum};

use crate::AppError;

/// Map metadata described by the `map` config section.
#[must_use]
pub fn map_info(config: &MapConfig) -> MapInfo {
    MapInfo {
        name: config.name.clone(),
        h_scale: config.h_scale,
        v_scale: config.v_scale,
        base_elevation: config.base_elevation,
        min_elevation: config.min_elevation,
        max_elevation: config.max_elevation,
        cell_size: config.cell_size,
        n_rows: config.n_rows,
        n_cols: config.n_cols,
        has_color_map: config.color_map,
        has_normal_map: config.normal_map,
        flip_textures: config.flip_textures,
    }
}

#[must_use]
pub fn camera_from_config(config: &CameraConfig) -> Camera {
    let mut camera = Camera::new(config.viewport_width, config.viewport_height, config.fov_degrees);
    camera.set_near_far(config.near, config.far);
    camera
}

/// Texture trees a cell handed to the cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellTrees {
    pub color: Option<TreeId>,
    pub normal: Option<TreeId>,
}

impl CellTrees {
    fn iter(self) -> impl Iterator<Item = TreeId> {
        [self.color, self.normal].into_iter().flatten()
    }
}

/// What one call to [`StreamingSession::frame`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// 1-based frame number.
    pub frame: u64,
    pub selection: SelectionStats,
    /// Tiles on the frontier.
    pub frontier: usize,
    /// Distinct textures the frontier needs.
    pub textures: usize,
    /// Textures made active this frame.
    pub activated: usize,
    /// Textures that were already active from the previous frame.
    pub retained: usize,
    /// Textures that left the frontier and were released.
    pub released: usize,
    /// Needed textures that could not be loaded.
    pub failed: usize,
    pub cache: CacheStats,
}

/// Drives one map through the frame loop: each frame selects the frontier
/// for the current camera, activates the color and normal textures the
/// frontier tiles need, and releases textures no longer on it.
pub struct StreamingSession<U: TextureUploader> {
    map: Map,
    camera: Camera,
    selector: FrontierSelector,
    cache: ResourceCache<U>,
    trees: FxHashMap<(u32, u32), CellTrees>,
    /// Handles whose load failed; not retried.
    failed: FxHashSet<TextureHandle>,
    frontier: Frontier,
    frame: u64,
}

impl<U: TextureUploader> StreamingSession<U> {
    /// Open the configured map, load every cell, and build the camera,
    /// selector and cache from the config.
    ///
    /// # Errors
    ///
    /// [`AppError::Terrain`] if the map metadata is invalid or a cell's mesh
    /// container cannot be opened.
    pub fn open(config: &Config, uploader: U) -> Result<Self, AppError> {
        let mut map = Map::new(&config.map.path, map_info(&config.map))?;
        map.load_all()?;
        let cache = ResourceCache::with_soft_limit(uploader, config.streaming.cache_soft_limit)
            .with_mipmaps(config.streaming.mipmaps);
        Ok(Self::new(
            map,
            camera_from_config(&config.camera),
            FrontierSelector::new(config.streaming.pixel_tolerance),
            cache,
        ))
    }

    /// Take over `map`, moving the texture stores of its loaded cells into
    /// `cache`. Cells loaded later contribute no textures.
    pub fn new(
        mut map: Map,
        camera: Camera,
        selector: FrontierSelector,
        mut cache: ResourceCache<U>,
    ) -> Self {
        let mut trees = FxHashMap::default();
        for cell in map.cells_mut().iter_mut().filter(|cell| cell.is_loaded()) {
            let textures = cell.take_textures();
            let entry = CellTrees {
                color: textures.color.map(|store| cache.register_tree(store)),
                normal: textures.normal.map(|store| cache.register_tree(store)),
            };
            trees.insert((cell.row(), cell.col()), entry);
        }

        tracing::info!(
            map = %map.info().name,
            rows = map.info().n_rows,
            cols = map.info().n_cols,
            soft_limit = cache.soft_limit(),
            tolerance = selector.pixel_tolerance(),
            "Streaming session started"
        );

        Self {
            map,
            camera,
            selector,
            cache,
            trees,
            failed: FxHashSet::default(),
            frontier: Frontier::default(),
            frame: 0,
        }
    }

    /// Stream one frame from the current camera.
    pub fn frame(&mut self) -> FrameReport {
        self.frame += 1;
        self.cache.new_frame();

        let frustum = Frustum::from_camera(&self.camera);
        let frontier = self.selector.select(&self.map, &self.camera, &frustum);
        let mut report = FrameReport {
            frame: self.frame,
            selection: frontier.stats,
            frontier: frontier.len(),
            ..FrameReport::default()
        };

        let mut wanted = FxHashSet::default();
        for node in &frontier.nodes {
            let Some(trees) = self.trees.get(&node.cell) else {
                continue;
            };
            let Some(cell) = self.map.cell(node.cell.0, node.cell.1) else {
                continue;
            };
            let tile = cell.tile(node.tile_id);
            for tree in trees.iter() {
                let quad = tile.texture_node(self.cache.tree(tree).depth());
                let handle = self.cache.make(tree, quad.level, quad.row, quad.col);
                if self.failed.contains(&handle) {
                    report.failed += 1;
                    continue;
                }
                if !wanted.insert(handle) {
                    continue;
                }
                if self.cache.is_active(handle) {
                    report.retained += 1;
                    continue;
                }
                match self.cache.activate(handle) {
                    Ok(()) => report.activated += 1,
                    Err(err) => {
                        tracing::warn!(
                            cell = ?node.cell,
                            tile = node.tile_id,
                            texture = %quad,
                            error = %err,
                            "Texture unavailable"
                        );
                        wanted.remove(&handle);
                        self.failed.insert(handle);
                        report.failed += 1;
                    }
                }
            }
        }

        let stale: Vec<TextureHandle> = self
            .cache
            .active_handles()
            .iter()
            .copied()
            .filter(|handle| !wanted.contains(handle))
            .collect();
        for handle in stale {
            self.cache.release(handle);
            report.released += 1;
        }

        report.textures = wanted.len();
        report.cache = self.cache.stats();
        self.frontier = frontier;
        report
    }

    #[must_use]
    pub fn map(&self) -> &Map {
        &self.map
    }

    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn set_pixel_tolerance(&mut self, pixel_tolerance: f32) {
        self.selector.set_pixel_tolerance(pixel_tolerance);
    }

    #[must_use]
    pub fn cache(&self) -> &ResourceCache<U> {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ResourceCache<U> {
        &mut self.cache
    }

    /// Frontier selected by the most recent frame.
    #[must_use]
    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    /// Texture trees registered for cell `(row, col)`.
    #[must_use]
    pub fn cell_trees(&self, row: u32, col: u32) -> Option<CellTrees> {
        self.trees.get(&(row, col)).copied()
    }

    /// Frames streamed so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_map_info_from_config() {
        let config = MapConfig {
            path: PathBuf::from("/maps/a"),
            name: "a".into(),
            cell_size: 512,
            n_rows: 3,
            color_map: false,
            ..MapConfig::default()
        };
        let info = map_info(&config);
        assert_eq!(info.name, "a");
        assert_eq!(info.cell_size, 512);
        assert_eq!(info.n_rows, 3);
        assert!(!info.has_color_map);
        assert!(info.has_normal_map);
        assert!(!info.flip_textures);
    }

    #[test]
    fn test_camera_from_config() {
        let config = CameraConfig {
            fov_degrees: 90.0,
            near: 2.0,
            far: 500.0,
            viewport_width: 800,
            viewport_height: 600,
        };
        let camera = camera_from_config(&config);
        assert_eq!(camera.viewport_width(), 800);
        assert_eq!(camera.near(), 2.0);
        assert_eq!(camera.far(), 500.0);
        assert!((camera.fov() - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_cell_trees_iter_skips_missing() {
        let trees = CellTrees {
            color: None,
            normal: None,
        };
        assert_eq!(trees.iter().count(), 0);
    }

    /// Opening a map whose cells have no mesh containers fails.
    #[test]
    fn test_open_missing_map() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.map.path = dir.path().join("nowhere");
        config.map.cell_size = 256;
        let result = StreamingSession::open(&config, terra_cache::HostUploader::new());
        assert!(matches!(result, Err(AppError::Terrain(_))));
    }
}
