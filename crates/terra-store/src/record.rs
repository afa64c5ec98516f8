//! The per-container-kind record codec.

use std::io::{BufRead, Seek, Write};

use crate::{StoreError, StoreHeader};

/// A node payload type stored in a quadtree container.
///
/// Each implementation fixes the header constants that identify its container
/// kind and knows how to decode (and encode) one node record.
pub trait NodeRecord: Sized {
    /// Short name used in error messages and logs.
    const KIND: &'static str;
    /// Magic number expected in the header.
    const MAGIC: u32;
    /// Format versions this build can read.
    const VERSIONS: &'static [u32];
    /// Largest tree depth accepted.
    const MAX_DEPTH: u32;
    /// Largest header tile size accepted.
    const MAX_TILE_SIZE: u32;

    /// Decode the record at the reader's current position. `index` is the TOC
    /// slot the record was reached through.
    fn read_record<R: BufRead + Seek>(
        reader: &mut R,
        header: &StoreHeader,
        index: u32,
    ) -> Result<Self, StoreError>;

    /// Encode this record in the layout selected by `header.version`.
    fn write_record<W: Write>(&self, writer: &mut W, header: &StoreHeader)
    -> Result<(), StoreError>;

    /// Mirror the record north to south. Records without rows ignore this.
    fn flip_rows(&mut self) {}

    /// Check a header against this record kind's constants.
    fn validate_header(header: &StoreHeader) -> Result<(), StoreError> {
        let format = |reason: String| StoreError::Format {
            kind: Self::KIND,
            reason,
        };
        if header.magic != Self::MAGIC {
            return Err(format(format!(
                "bad magic number {:#010x} (expected {:#010x})",
                header.magic,
                Self::MAGIC
            )));
        }
        if !Self::VERSIONS.contains(&header.version) {
            return Err(format(format!("unsupported version {}", header.version)));
        }
        if header.depth == 0 || header.depth > Self::MAX_DEPTH {
            return Err(format(format!(
                "unsupported depth {} (expected 1..={})",
                header.depth,
                Self::MAX_DEPTH
            )));
        }
        if !header.tile_size.is_power_of_two() {
            return Err(format(format!(
                "tile size {} is not a power of two",
                header.tile_size
            )));
        }
        if header.tile_size > Self::MAX_TILE_SIZE {
            return Err(format(format!(
                "tile size {} exceeds {}",
                header.tile_size,
                Self::MAX_TILE_SIZE
            )));
        }
        Ok(())
    }
}
