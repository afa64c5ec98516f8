use std::fmt::Write as _;

use terra_quadtree::{NodeId, nw_child};
use terra_store::MeshChunk;
use terra_view::Aabb;

/// A node of a cell's LOD quadtree.
///
/// Tiles live in a flat arena indexed by their hierarchical id; parent and
/// child links are computed from the id, never stored.
#[derive(Clone, Debug)]
pub struct Tile {
    pub(crate) id: u32,
    pub(crate) lod: u32,
    pub(crate) nw_row: u32,
    pub(crate) nw_col: u32,
    pub(crate) width: u32,
    pub(crate) leaf: bool,
    pub(crate) chunk: Option<MeshChunk>,
    pub(crate) bbox: Aabb,
}

impl Tile {
    /// Hierarchical id: the tile's index in the mesh quadtree arena.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Level of detail, 0 being the coarsest.
    #[must_use]
    pub fn lod(&self) -> u32 {
        self.lod
    }

    /// Row of the tile's NW vertex within its cell.
    #[must_use]
    pub fn nw_row(&self) -> u32 {
        self.nw_row
    }

    /// Column of the tile's NW vertex within its cell.
    #[must_use]
    pub fn nw_col(&self) -> u32 {
        self.nw_col
    }

    /// Width in `h_scale` units; `width() + 1` vertices across.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Mesh data, or `None` when the node record could not be loaded.
    #[must_use]
    pub fn chunk(&self) -> Option<&MeshChunk> {
        self.chunk.as_ref()
    }

    /// World-space bounds, always enclosing every descendant's bounds.
    #[must_use]
    pub fn bbox(&self) -> &Aabb {
        &self.bbox
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    #[must_use]
    pub fn num_children(&self) -> usize {
        if self.leaf { 0 } else { 4 }
    }

    /// Ids of the four children in NW, NE, SE, SW order.
    #[must_use]
    pub fn child_ids(&self) -> Option<[u32; 4]> {
        if self.leaf {
            return None;
        }
        let nw = nw_child(self.id);
        Some([nw, nw + 1, nw + 2, nw + 3])
    }

    /// The texture quad covering this tile in a texture tree of `tqt_depth`
    /// levels. Tiles finer than the texture tree map to the deepest ancestor
    /// quad that contains them.
    #[must_use]
    pub fn texture_node(&self, tqt_depth: u32) -> NodeId {
        debug_assert!(tqt_depth > 0);
        let row = self.nw_row / self.width;
        let col = self.nw_col / self.width;
        let level = self.lod.min(tqt_depth - 1);
        let shift = self.lod - level;
        NodeId::new(level, row >> shift, col >> shift)
    }

    pub(crate) fn dump_line(&self, out: &mut String) {
        let indent = "  ".repeat(self.lod as usize);
        let _ = match &self.chunk {
            Some(chunk) => writeln!(
                out,
                "{indent}[{:4}] lod {} at ({}, {}) err {:.3} verts {} tris {}",
                self.id,
                self.lod,
                self.nw_row,
                self.nw_col,
                chunk.max_error,
                chunk.vertex_count(),
                chunk.index_count() / 3
            ),
            None => writeln!(
                out,
                "{indent}[{:4}] lod {} at ({}, {}) unavailable",
                self.id, self.lod, self.nw_row, self.nw_col
            ),
        };
    }
}
