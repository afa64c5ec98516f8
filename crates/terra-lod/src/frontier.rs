//! Frontier selection over a map's tile quadtrees.

use terra_terrain::{Cell, Map, Tile};
use terra_view::{Aabb, Camera, Frustum, Outcode};

/// Screen-space error, in pixels, tolerated when none is configured.
pub const DEFAULT_PIXEL_TOLERANCE: f32 = 2.0;

/// A tile chosen for rendering this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrontierNode {
    /// Grid `(row, col)` of the containing cell.
    pub cell: (u32, u32),
    pub tile_id: u32,
    pub lod: u32,
    pub nw_row: u32,
    pub nw_col: u32,
    pub bbox: Aabb,
    /// Camera to nearest point of `bbox`, at least the near distance.
    pub distance: f64,
    /// Projected error of the tile's chunk at `distance`, in pixels.
    pub screen_error: f32,
    /// Frustum classification of `bbox`; never culled.
    pub outcode: Outcode,
}

/// Counters gathered during one selection pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionStats {
    pub visited: usize,
    pub culled: usize,
    pub selected: usize,
    /// Tiles skipped because their mesh chunk failed to load.
    pub unavailable: usize,
}

/// The selected frontier for one frame.
#[derive(Clone, Debug, Default)]
pub struct Frontier {
    pub nodes: Vec<FrontierNode>,
    pub stats: SelectionStats,
}

impl Frontier {
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Walks tile quadtrees top-down, culling against the frustum and refining
/// until a tile's screen-space error is within tolerance or it is a leaf.
#[derive(Clone, Copy, Debug)]
pub struct FrontierSelector {
    pixel_tolerance: f32,
}

impl Default for FrontierSelector {
    fn default() -> Self {
        Self::new(DEFAULT_PIXEL_TOLERANCE)
    }
}

struct View<'a> {
    camera: &'a Camera,
    frustum: &'a Frustum,
}

impl FrontierSelector {
    #[must_use]
    pub fn new(pixel_tolerance: f32) -> Self {
        Self { pixel_tolerance }
    }

    #[must_use]
    pub fn pixel_tolerance(&self) -> f32 {
        self.pixel_tolerance
    }

    pub fn set_pixel_tolerance(&mut self, pixel_tolerance: f32) {
        self.pixel_tolerance = pixel_tolerance;
    }

    /// Select the frontier over every loaded cell of `map`.
    #[must_use]
    pub fn select(&self, map: &Map, camera: &Camera, frustum: &Frustum) -> Frontier {
        let mut frontier = Frontier::default();
        for cell in map.cells().iter().filter(|c| c.is_loaded()) {
            self.select_cell(cell, camera, frustum, &mut frontier);
        }
        tracing::trace!(
            selected = frontier.stats.selected,
            visited = frontier.stats.visited,
            culled = frontier.stats.culled,
            "Frontier selected"
        );
        frontier
    }

    /// Append the frontier of one loaded cell to `frontier`.
    pub fn select_cell(
        &self,
        cell: &Cell,
        camera: &Camera,
        frustum: &Frustum,
        frontier: &mut Frontier,
    ) {
        let view = View { camera, frustum };
        self.visit(&view, cell, cell.root(), Outcode::ROOT, frontier);
    }

    fn visit(&self, view: &View<'_>, cell: &Cell, tile: &Tile, parent: Outcode, out: &mut Frontier) {
        out.stats.visited += 1;
        let outcode = view.frustum.intersect_box(tile.bbox(), parent);
        if outcode.is_culled() {
            out.stats.culled += 1;
            return;
        }

        let Some(chunk) = tile.chunk() else {
            out.stats.unavailable += 1;
            for child in cell.children(tile) {
                self.visit(view, cell, child, outcode, out);
            }
            return;
        };

        let distance = tile
            .bbox()
            .distance_to(view.camera.position())
            .max(f64::from(view.camera.near()));
        let screen_error = view.camera.screen_error(distance as f32, chunk.max_error);

        if screen_error <= self.pixel_tolerance || tile.is_leaf() {
            out.stats.selected += 1;
            out.nodes.push(FrontierNode {
                cell: (cell.row(), cell.col()),
                tile_id: tile.id(),
                lod: tile.lod(),
                nw_row: tile.nw_row(),
                nw_col: tile.nw_col(),
                bbox: *tile.bbox(),
                distance,
                screen_error,
                outcode,
            });
            return;
        }

        for child in cell.children(tile) {
            self.visit(view, cell, child, outcode, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use glam::{DVec3, Vec3};
    use terra_quadtree::{full_size, parent};
    use terra_store::{ContainerWriter, HfVertex, MESH_VERSION, MeshChunk};
    use terra_terrain::{MESH_FILE, MapInfo};

    use super::*;

    const DEPTH: u32 = 3;

    fn info() -> MapInfo {
        MapInfo {
            name: "flat".into(),
            h_scale: 1.0,
            v_scale: 1.0,
            base_elevation: 0.0,
            min_elevation: 0.0,
            max_elevation: 10.0,
            cell_size: 256,
            n_rows: 1,
            n_cols: 1,
            has_color_map: false,
            has_normal_map: false,
            flip_textures: false,
        }
    }

    /// Error halves with each finer level: 32, 16, 8.
    fn chunk(lod: u32) -> MeshChunk {
        MeshChunk {
            max_error: (32 >> lod) as f32,
            min_y: 0,
            max_y: 10,
            vertices: vec![HfVertex::new(0, 0, 0, 0)],
            indices: vec![0, 0, 0],
        }
    }

    fn lod_of(id: u32) -> u32 {
        let mut lod = 0;
        let mut id = id;
        while id != 0 {
            id = parent(id);
            lod += 1;
        }
        lod
    }

    fn map_with(dir: &Path, truncate_last: bool) -> Map {
        let cell_dir = dir.join(Map::cell_dir_name(0, 0));
        fs::create_dir_all(&cell_dir).unwrap();
        let path = cell_dir.join(MESH_FILE);
        let mut writer =
            ContainerWriter::<MeshChunk>::create(&path, MESH_VERSION, DEPTH, 256).unwrap();
        for id in 0..full_size(DEPTH) {
            writer.write_node(id, &chunk(lod_of(id))).unwrap();
        }
        writer.finish().unwrap();
        if truncate_last {
            let file = fs::OpenOptions::new().write(true).open(&path).unwrap();
            let len = file.metadata().unwrap().len();
            file.set_len(len - 2).unwrap();
        }
        let mut map = Map::new(dir, info()).unwrap();
        map.load_all().unwrap();
        map
    }

    /// 1000 pixels wide, 90° FOV (error factor 500), 1000 units above the
    /// cell center looking straight down.
    fn overhead_camera() -> Camera {
        let mut camera = Camera::new(1000, 1000, 90.0);
        camera.set_near_far(1.0, 10_000.0);
        camera.look_from_with_up(
            DVec3::new(128.0, 1000.0, 128.0),
            DVec3::new(128.0, 0.0, 128.0),
            DVec3::NEG_Z,
        );
        camera
    }

    fn select(map: &Map, camera: &Camera, tolerance: f32) -> Frontier {
        FrontierSelector::new(tolerance).select(map, camera, &Frustum::from_camera(camera))
    }

    /// The frontier covers the cell exactly once: no selected tile has a
    /// selected ancestor and the selected areas add up to the cell.
    fn assert_tiles_cell(frontier: &Frontier) {
        let ids: Vec<u32> = frontier.nodes.iter().map(|n| n.tile_id).collect();
        for &id in &ids {
            let mut a = id;
            while a != 0 {
                a = parent(a);
                assert!(!ids.contains(&a), "tile {id} overlaps selected ancestor {a}");
            }
        }
        let area: u64 = frontier
            .nodes
            .iter()
            .map(|n| u64::from(256u32 >> n.lod).pow(2))
            .sum();
        assert_eq!(area, 256 * 256);
    }

    #[test]
    fn test_loose_tolerance_selects_root() {
        let dir = tempfile::tempdir().unwrap();
        let map = map_with(dir.path(), false);
        let frontier = select(&map, &overhead_camera(), 20.0);
        assert_eq!(frontier.len(), 1);
        let root = frontier.nodes[0];
        assert_eq!((root.tile_id, root.lod, root.cell), (0, 0, (0, 0)));
        assert!((root.distance - 990.0).abs() < 1e-9);
        assert!((root.screen_error - 500.0 * 32.0 / 990.0).abs() < 1e-3);
        assert!(root.outcode.is_inside());
    }

    /// The root projects to about 16 pixels; at a 10 pixel tolerance its
    /// children (about 8 pixels) are chosen.
    #[test]
    fn test_refines_until_within_tolerance() {
        let dir = tempfile::tempdir().unwrap();
        let map = map_with(dir.path(), false);
        let frontier = select(&map, &overhead_camera(), 10.0);
        assert_eq!(frontier.len(), 4);
        assert!(frontier.nodes.iter().all(|n| n.lod == 1 && n.screen_error <= 10.0));
        assert_tiles_cell(&frontier);
    }

    #[test]
    fn test_zero_tolerance_selects_leaves() {
        let dir = tempfile::tempdir().unwrap();
        let map = map_with(dir.path(), false);
        let frontier = select(&map, &overhead_camera(), 0.0);
        assert_eq!(frontier.len(), 16);
        assert_eq!(frontier.stats.visited, 21);
        assert_tiles_cell(&frontier);
    }

    /// From an oblique viewpoint off the NW corner, the near quadrant is
    /// refined to leaves while the far quadrant stays at LOD 1.
    #[test]
    fn test_near_tiles_are_finer() {
        let dir = tempfile::tempdir().unwrap();
        let map = map_with(dir.path(), false);
        let mut camera = Camera::new(1000, 1000, 90.0);
        camera.set_near_far(1.0, 10_000.0);
        camera.look_from(DVec3::new(-200.0, 150.0, -200.0), DVec3::new(128.0, 0.0, 128.0));
        let frontier = select(&map, &camera, 20.0);

        let containing = |x: f64, z: f64| {
            frontier
                .nodes
                .iter()
                .find(|n| n.bbox.contains_point(DVec3::new(x, 5.0, z)))
                .unwrap()
        };
        assert_eq!(containing(20.0, 20.0).lod, 2);
        assert_eq!(containing(250.0, 250.0).lod, 1);
        assert_tiles_cell(&frontier);
    }

    #[test]
    fn test_camera_facing_away_selects_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let map = map_with(dir.path(), false);
        let mut camera = overhead_camera();
        camera.look_with_up(Vec3::Y, Vec3::Z);
        let frontier = select(&map, &camera, 0.0);
        assert!(frontier.is_empty());
        assert_eq!(frontier.stats.culled, 1);
    }

    /// A tile with no chunk is skipped; being a leaf, nothing replaces it.
    #[test]
    fn test_unavailable_leaf_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let map = map_with(dir.path(), true);
        let frontier = select(&map, &overhead_camera(), 0.0);
        assert_eq!(frontier.stats.unavailable, 1);
        assert_eq!(frontier.len(), 15);
        assert!(frontier.nodes.iter().all(|n| n.tile_id != full_size(DEPTH) - 1));
    }

    #[test]
    fn test_unloaded_cells_are_ignored() {
        let map = Map::new("unused", info()).unwrap();
        assert!(select(&map, &overhead_camera(), 0.0).is_empty());
    }
}
