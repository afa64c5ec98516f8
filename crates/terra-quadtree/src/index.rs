//! Breadth-first index arithmetic for a complete quadtree.
//!
//! Two level-by-level numberings share the same range `[0, full_size(depth))`:
//!
//! - hierarchical ids, where the four children of node `id` occupy
//!   `4 * id + 1 ..= 4 * id + 4` in clockwise order from the north-west
//!   quadrant ([`parent`], [`nw_child`] and friends);
//! - level-major indices, where nodes of one level are laid out row by row
//!   ([`node_index`], [`node_coords`]).
//!
//! Both place the root at 0 and every level after all coarser levels. All
//! functions here are total over `u32`; staying inside the tree is the
//! caller's contract.

/// Total number of nodes in all levels above `depth`, i.e. the node count of a
/// complete tree with `depth` levels: `(4^depth - 1) / 3`.
///
/// Valid for `depth <= 16`.
#[inline]
#[must_use]
pub fn full_size(depth: u32) -> u32 {
    // (4^d - 1) has bit pattern 11..11; every other bit of it is (4^d - 1) / 3.
    (((1u64 << (depth << 1)) - 1) & 0x5555_5555_5555_5555) as u32
}

/// Number of nodes on `level` (`4^level`). Valid for `level < 16`.
#[inline]
#[must_use]
pub fn num_nodes_at(level: u32) -> u32 {
    1 << (level << 1)
}

/// Parent of `id`. The root is its own parent.
#[inline]
#[must_use]
pub fn parent(id: u32) -> u32 {
    if id > 0 { (id - 1) >> 2 } else { 0 }
}

/// Position of `id` among its siblings (0 = NW, 1 = NE, 2 = SE, 3 = SW).
/// The root reports 0.
#[inline]
#[must_use]
pub fn child_index(id: u32) -> u32 {
    if id > 0 { (id - 1) & 0x3 } else { 0 }
}

/// First (north-west) child of `id`.
#[inline]
#[must_use]
pub fn nw_child(id: u32) -> u32 {
    (id << 2) + 1
}

/// Second (north-east) child of `id`.
#[inline]
#[must_use]
pub fn ne_child(id: u32) -> u32 {
    (id << 2) + 2
}

/// Third (south-east) child of `id`.
#[inline]
#[must_use]
pub fn se_child(id: u32) -> u32 {
    (id << 2) + 3
}

/// Fourth (south-west) child of `id`.
#[inline]
#[must_use]
pub fn sw_child(id: u32) -> u32 {
    (id << 2) + 4
}

/// The north-west sibling of `id` (first child of its parent). The root is its
/// own sibling.
#[inline]
#[must_use]
pub fn nw_sibling(id: u32) -> u32 {
    if id == 0 { 0 } else { ((id - 1) & !0x3) + 1 }
}

/// Level-major index of the node at `(level, row, col)`.
#[inline]
#[must_use]
pub fn node_index(level: u32, row: u32, col: u32) -> u32 {
    debug_assert!(row < (1 << level), "row {row} out of range for level {level}");
    debug_assert!(col < (1 << level), "col {col} out of range for level {level}");
    full_size(level) + (row << level) + col
}

/// Inverse of [`node_index`]: recover `(level, row, col)` from a level-major index.
#[must_use]
pub fn node_coords(id: u32) -> (u32, u32, u32) {
    let mut level = 0;
    while full_size(level + 1) <= id {
        level += 1;
    }
    let offset = id - full_size(level);
    (level, offset >> level, offset & ((1 << level) - 1))
}
