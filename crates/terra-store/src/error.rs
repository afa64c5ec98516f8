//! Store error types.

use terra_quadtree::NodeId;

/// Errors raised while opening a container or decoding one of its nodes.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The header is not one this build understands (magic, version, depth, or
    /// tile size).
    #[error("invalid {kind} container: {reason}")]
    Format {
        /// Container kind (`"mesh"` or `"texture"`).
        kind: &'static str,
        /// What was wrong with the header.
        reason: String,
    },

    /// A read or seek on the underlying file failed, including short reads.
    #[error("I/O error reading {context}: {source}")]
    Io {
        /// What was being read when the failure happened.
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// A decoded texture tile disagrees with the store's declared tile size or
    /// pixel layout.
    #[error(
        "tile {node} decoded as {width}x{height} with {channels} channels, expected {expected}x{expected} RGBA"
    )]
    SizeMismatch {
        node: NodeId,
        width: u32,
        height: u32,
        channels: u8,
        expected: u32,
    },

    /// The requested node index has no TOC entry.
    #[error("node index {index} outside tree of {len} nodes")]
    NodeOutOfRange { index: u32, len: usize },

    /// The requested `(level, row, col)` is not inside the tree.
    #[error("node (level={level}, row={row}, col={col}) outside tree of depth {depth}")]
    InvalidNode {
        level: u32,
        row: u32,
        col: u32,
        depth: u32,
    },

    /// An encoded image payload could not be decoded or encoded.
    #[error("image codec failure for tile {node}: {source}")]
    Image {
        node: NodeId,
        #[source]
        source: image::ImageError,
    },
}

impl StoreError {
    /// Build a closure mapping an I/O error into [`StoreError::Io`] with context.
    pub(crate) fn io(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> StoreError {
        let context = context.into();
        move |source| StoreError::Io { context, source }
    }

    /// True for header-level failures that make the whole container unusable.
    #[must_use]
    pub fn is_format(&self) -> bool {
        matches!(self, StoreError::Format { .. })
    }
}
