//! Structured node addresses for quadtree nodes.

use crate::index;

/// The four quadrants of a quadtree node, in clockwise order from the
/// north-west corner. Discriminants match breadth-first child offsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Quadrant {
    NW = 0,
    NE = 1,
    SE = 2,
    SW = 3,
}

impl Quadrant {
    /// All quadrants in child order.
    pub const ALL: [Quadrant; 4] = [Quadrant::NW, Quadrant::NE, Quadrant::SE, Quadrant::SW];

    /// Quadrant for a child index in `0..4`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= 4`.
    #[must_use]
    pub fn from_index(index: u32) -> Self {
        match index {
            0 => Quadrant::NW,
            1 => Quadrant::NE,
            2 => Quadrant::SE,
            3 => Quadrant::SW,
            _ => panic!("quadrant index {index} out of range"),
        }
    }

    /// `(row, col)` offset of this quadrant inside a parent whose children are
    /// `half` units wide. Rows grow to the south, columns to the east.
    #[must_use]
    pub fn offset(self, half: u32) -> (u32, u32) {
        match self {
            Quadrant::NW => (0, 0),
            Quadrant::NE => (0, half),
            Quadrant::SE => (half, half),
            Quadrant::SW => (half, 0),
        }
    }
}

/// A node address `(level, row, col)` with `row, col < 2^level`.
///
/// Row 0 is the northern edge and column 0 the western edge of the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    /// Depth of the node (root = 0).
    pub level: u32,
    /// Row within the level.
    pub row: u32,
    /// Column within the level.
    pub col: u32,
}

impl NodeId {
    /// The root node.
    pub const ROOT: NodeId = NodeId {
        level: 0,
        row: 0,
        col: 0,
    };

    /// Construct a node address.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is outside the level's grid.
    #[must_use]
    pub fn new(level: u32, row: u32, col: u32) -> Self {
        let size = 1u32 << level;
        assert!(row < size, "row={row} out of range for level {level} (max {size})");
        assert!(col < size, "col={col} out of range for level {level} (max {size})");
        Self { level, row, col }
    }

    /// Level-major array index of this node (see [`index::node_index`]).
    #[must_use]
    pub fn index(&self) -> u32 {
        index::node_index(self.level, self.row, self.col)
    }

    /// Address of the node with level-major index `id`.
    #[must_use]
    pub fn from_index(id: u32) -> Self {
        let (level, row, col) = index::node_coords(id);
        Self { level, row, col }
    }

    /// The parent one level up, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        if self.level == 0 {
            return None;
        }
        Some(NodeId {
            level: self.level - 1,
            row: self.row >> 1,
            col: self.col >> 1,
        })
    }

    /// The four children one level down, in [`Quadrant::ALL`] order.
    #[must_use]
    pub fn children(&self) -> [NodeId; 4] {
        let level = self.level + 1;
        let row = self.row << 1;
        let col = self.col << 1;
        Quadrant::ALL.map(|q| {
            let (dr, dc) = q.offset(1);
            NodeId {
                level,
                row: row + dr,
                col: col + dc,
            }
        })
    }

    /// The ancestor at `level` (or `self` if `level >= self.level`).
    #[must_use]
    pub fn ancestor_at(&self, level: u32) -> NodeId {
        if level >= self.level {
            return *self;
        }
        let shift = self.level - level;
        NodeId {
            level,
            row: self.row >> shift,
            col: self.col >> shift,
        }
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(level={}, row={}, col={})", self.level, self.row, self.col)
    }
}
