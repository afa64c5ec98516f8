//! Addressing arithmetic for complete quadtrees stored in breadth-first array order.

mod index;
mod node_id;

pub use index::{
    child_index, full_size, ne_child, node_coords, node_index, num_nodes_at, nw_child,
    nw_sibling, parent, se_child, sw_child,
};
pub use node_id::{NodeId, Quadrant};
