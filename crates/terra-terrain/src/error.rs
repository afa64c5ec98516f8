use std::path::PathBuf;

use terra_store::StoreError;

/// Errors raised while describing or loading a map.
#[derive(Debug, thiserror::Error)]
pub enum TerrainError {
    /// The map metadata is inconsistent.
    #[error("invalid map {name:?}: {reason}")]
    InvalidMap { name: String, reason: String },

    /// A cell's mesh container could not be opened.
    #[error("failed to open cell mesh {path}: {source}")]
    Store {
        path: PathBuf,
        #[source]
        source: StoreError,
    },

    /// A cell's mesh container was built for a different cell width.
    #[error("cell ({row}, {col}) has width {found}, map declares {expected}")]
    CellSizeMismatch {
        row: u32,
        col: u32,
        expected: u32,
        found: u32,
    },

    /// The requested cell is outside the map grid.
    #[error("no cell at ({row}, {col})")]
    NoSuchCell { row: u32, col: u32 },
}
