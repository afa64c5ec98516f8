//! Bounded cache of GPU-resident textures addressed by texture-quadtree node.
//!
//! Handles are created once per `(tree, level, row, col)` identity and stay
//! valid for the cache's lifetime. A handle is *unloaded*, *inactive*
//! (resident but unused this frame) or *active*. When the number of resident
//! textures exceeds the soft limit, the least recently activated inactive
//! textures are freed and their handles revert to unloaded.

mod cache;
mod error;
mod handle;
mod uploader;
mod wgpu_uploader;

pub use cache::{CacheStats, ResourceCache};
pub use error::{CacheError, UploadError};
pub use handle::{EntryState, TextureHandle, TextureKey, TreeId};
pub use uploader::{HostTexture, HostUploader, TextureUploader, UploadRequest, mip_chain};
pub use wgpu_uploader::{GpuTexture, WgpuUploader};

/// Soft limit on resident textures used when none is configured.
pub const DEFAULT_SOFT_LIMIT: usize = 1024;
