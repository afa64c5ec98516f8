use terra_quadtree::NodeId;
use terra_store::StoreError;

use crate::TreeId;

/// Failure to turn a decoded tile into a resident texture.
#[derive(Debug, thiserror::Error)]
#[error("upload of texture tile {node} failed: {reason}")]
pub struct UploadError {
    pub node: NodeId,
    pub reason: String,
}

/// Errors from activating a texture handle. Both leave the handle unloaded,
/// so a later activation retries.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to load texture tile {node} from tree {tree:?}: {source}")]
    Load {
        tree: TreeId,
        node: NodeId,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Upload(#[from] UploadError),
}
