use std::fs;
use std::path::Path;

use glam::DVec3;
use rustc_hash::FxHashSet;
use terra_app::StreamingSession;
use terra_cache::{HostUploader, ResourceCache};
use terra_lod::FrontierSelector;
use terra_quadtree::{NodeId, full_size, node_coords, node_index};
use terra_store::{
    ContainerWriter, HfVertex, MESH_VERSION, MeshChunk, TEXTURE_VERSION_RAW, TextureTile,
};
use terra_terrain::{COLOR_MAP_FILE, MESH_FILE, Map, MapInfo, NORMAL_MAP_FILE};
use terra_view::Camera;

const CELL_SIZE: u32 = 256;
const MESH_DEPTH: u32 = 3;
const TEXTURE_SIZE: u32 = 8;

fn write_mesh(path: &Path) {
    let mut writer =
        ContainerWriter::<MeshChunk>::create(path, MESH_VERSION, MESH_DEPTH, CELL_SIZE).unwrap();
    for id in 0..full_size(MESH_DEPTH) {
        let (lod, _, _) = node_coords(id);
        let chunk = MeshChunk {
            max_error: 64.0 / (1u32 << lod) as f32,
            min_y: 0,
            max_y: 50,
            vertices: vec![HfVertex::new(0, 0, 0, 0)],
            indices: vec![0, 0, 0],
        };
        writer.write_node(id, &chunk).unwrap();
    }
    writer.finish().unwrap();
}

fn write_texture(path: &Path, depth: u32) {
    let mut writer = ContainerWriter::<TextureTile>::create(
        path,
        TEXTURE_VERSION_RAW,
        depth,
        TEXTURE_SIZE,
    )
    .unwrap();
    for level in 0..depth {
        for row in 0..1 << level {
            for col in 0..1 << level {
                let node = NodeId::new(level, row, col);
                let tile = TextureTile::solid(node, TEXTURE_SIZE, [level as u8, 0, 0, 255]);
                writer.write_node(node_index(level, row, col), &tile).unwrap();
            }
        }
    }
    writer.finish().unwrap();
}

struct Layout {
    color_depth: Option<u32>,
    normal_depth: Option<u32>,
    declare_normal: bool,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            color_depth: Some(2),
            normal_depth: Some(MESH_DEPTH),
            declare_normal: true,
        }
    }
}

fn info(layout: &Layout) -> MapInfo {
    MapInfo {
        name: "synthetic".into(),
        h_scale: 1.0,
        v_scale: 1.0,
        base_elevation: 0.0,
        min_elevation: 0.0,
        max_elevation: 100.0,
        cell_size: CELL_SIZE,
        n_rows: 1,
        n_cols: 2,
        has_color_map: layout.color_depth.is_some(),
        has_normal_map: layout.declare_normal,
        flip_textures: false,
    }
}

/// Write a one-row, two-column map spanning x 0..512, z 0..256.
fn write_map(root: &Path, layout: &Layout) {
    for col in 0..2 {
        let dir = root.join(Map::cell_dir_name(0, col));
        fs::create_dir_all(&dir).unwrap();
        write_mesh(&dir.join(MESH_FILE));
        if let Some(depth) = layout.color_depth {
            write_texture(&dir.join(COLOR_MAP_FILE), depth);
        }
        if let Some(depth) = layout.normal_depth {
            write_texture(&dir.join(NORMAL_MAP_FILE), depth);
        }
    }
}

fn open_session(
    root: &Path,
    layout: &Layout,
    tolerance: f32,
    soft_limit: usize,
) -> StreamingSession<HostUploader> {
    let mut map = Map::new(root, info(layout)).unwrap();
    map.load_all().unwrap();
    let camera = Camera::new(1280, 720, 90.0);
    let cache = ResourceCache::with_soft_limit(HostUploader::new(), soft_limit);
    let mut session =
        StreamingSession::new(map, camera, FrontierSelector::new(tolerance), cache);
    look_at_map(&mut session);
    session
}

fn session(
    root: &Path,
    layout: &Layout,
    tolerance: f32,
    soft_limit: usize,
) -> StreamingSession<HostUploader> {
    write_map(root, layout);
    open_session(root, layout, tolerance, soft_limit)
}

fn look_at_map(session: &mut StreamingSession<HostUploader>) {
    session.camera_mut().look_from(
        DVec3::new(256.0, 600.0, 900.0),
        DVec3::new(256.0, 0.0, 128.0),
    );
}

fn look_away(session: &mut StreamingSession<HostUploader>) {
    session.camera_mut().look_from(
        DVec3::new(256.0, 600.0, 900.0),
        DVec3::new(256.0, 600.0, 2000.0),
    );
}

/// Coarse tolerance selects each cell root, needing one texture per tree.
#[test]
fn test_roots_activate_one_texture_per_tree() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(dir.path(), &Layout::default(), 1e6, 1024);

    let report = session.frame();
    assert_eq!(report.frame, 1);
    assert_eq!(report.frontier, 2);
    assert_eq!(report.textures, 4);
    assert_eq!(report.activated, 4);
    assert_eq!(report.released, 0);
    assert_eq!(session.cache().active_count(), 4);
    assert_eq!(session.cache().uploader().uploads(), 4);

    let trees = session.cell_trees(0, 1).unwrap();
    assert!(trees.color.is_some() && trees.normal.is_some());
}

/// An unchanged view keeps its textures active without reloading them.
#[test]
fn test_steady_view_retains_textures() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(dir.path(), &Layout::default(), 1e6, 1024);
    session.frame();

    let report = session.frame();
    assert_eq!(report.activated, 0);
    assert_eq!(report.retained, 4);
    assert_eq!(report.released, 0);
    assert_eq!(report.cache.loads, 4);
}

#[test]
fn test_looking_away_releases_everything() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(dir.path(), &Layout::default(), 1e6, 1024);
    session.frame();

    look_away(&mut session);
    let report = session.frame();
    assert_eq!(report.frontier, 0);
    assert_eq!(report.released, 4);
    assert_eq!(session.cache().active_count(), 0);
    assert_eq!(session.cache().inactive_count(), 4);
}

/// Released textures beyond the soft limit are evicted oldest first and
/// reloaded when the view returns.
#[test]
fn test_soft_limit_evicts_released_textures() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(dir.path(), &Layout::default(), 1e6, 2);

    session.frame();
    // Active textures are never evicted, even over the limit.
    assert_eq!(session.cache().resident_count(), 4);

    look_away(&mut session);
    let report = session.frame();
    assert_eq!(report.released, 4);
    assert_eq!(session.cache().resident_count(), 2);
    assert_eq!(report.cache.evictions, 2);

    look_at_map(&mut session);
    let report = session.frame();
    assert_eq!(report.activated, 4);
    assert_eq!(session.cache().active_count(), 4);
    // The two evicted textures are reloaded.
    assert!(report.cache.loads >= 6);
}

/// Every active texture covers some frontier tile, and every frontier tile
/// has its textures active.
#[test]
fn test_active_textures_match_frontier() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = session(dir.path(), &Layout::default(), 0.0, 1024);

    let report = session.frame();
    assert!(report.frontier > 2, "expected refinement, got {report:?}");

    let mut expected = FxHashSet::default();
    for node in &session.frontier().nodes {
        let (row, col) = node.cell;
        let tile = session.map().cell(row, col).unwrap().tile(node.tile_id);
        let trees = session.cell_trees(row, col).unwrap();
        for tree in [trees.color, trees.normal].into_iter().flatten() {
            let depth = session.cache().tree(tree).depth();
            expected.insert((tree, tile.texture_node(depth)));
        }
    }

    assert_eq!(report.textures, expected.len());
    assert_eq!(session.cache().active_count(), expected.len());
    for &handle in session.cache().active_handles() {
        let key = session.cache().key(handle);
        assert!(expected.contains(&(key.tree, key.node)));
    }
}

/// A declared normal map that is missing on disk is treated as absent.
#[test]
fn test_missing_normal_map_streams_color_only() {
    let dir = tempfile::tempdir().unwrap();
    let layout = Layout {
        normal_depth: None,
        ..Layout::default()
    };
    let mut session = session(dir.path(), &layout, 1e6, 1024);

    assert!(session.cell_trees(0, 0).unwrap().normal.is_none());
    let report = session.frame();
    assert_eq!(report.activated, 2);
    assert_eq!(report.failed, 0);
}

/// A texture whose record cannot be read is reported once per use and not
/// reloaded on later frames.
#[test]
fn test_unreadable_texture_is_not_retried() {
    let dir = tempfile::tempdir().unwrap();
    let layout = Layout {
        color_depth: Some(1),
        ..Layout::default()
    };
    write_map(dir.path(), &layout);
    for col in 0..2 {
        let path = dir.path().join(Map::cell_dir_name(0, col)).join(COLOR_MAP_FILE);
        let len = fs::metadata(&path).unwrap().len();
        let file = fs::OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(len - 100).unwrap();
    }
    let mut session = open_session(dir.path(), &layout, 1e6, 1024);

    let report = session.frame();
    assert_eq!(report.failed, 2);
    assert_eq!(report.activated, 2);

    let report = session.frame();
    assert_eq!(report.failed, 2);
    assert_eq!(report.activated, 0);
    assert_eq!(report.retained, 2);
    assert_eq!(report.cache.failed_loads, 2);
}
