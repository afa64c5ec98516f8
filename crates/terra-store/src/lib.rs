//! Disk-backed quadtree containers for terrain mesh chunks and texture tiles.
//!
//! Both container kinds share one layout: a fixed little-endian header, a table
//! of contents with one `u64` byte offset per quadtree node, and the node
//! records the offsets point at. [`TileStore`] serves on-demand decoding of a
//! single node; [`ContainerWriter`] produces containers.

mod error;
mod header;
mod mesh;
mod record;
mod store;
mod texture;
mod writer;

pub use error::StoreError;
pub use header::StoreHeader;
pub use mesh::{HfVertex, MAX_MESH_DEPTH, MAX_MESH_TILE_SIZE, MESH_MAGIC, MESH_VERSION, MeshChunk};
pub use record::NodeRecord;
pub use store::TileStore;
pub use texture::{
    MAX_TEXTURE_DEPTH, MAX_TEXTURE_TILE_SIZE, TEXTURE_MAGIC, TEXTURE_VERSION_PNG, TEXTURE_VERSION_RAW, TextureTile,
};
pub use writer::ContainerWriter;

/// Store of terrain mesh chunks (an `hf.cell` file).
pub type MeshStore = TileStore<MeshChunk>;

/// Store of texture tiles (a `.tqt` file).
pub type TextureStore = TileStore<TextureTile>;
