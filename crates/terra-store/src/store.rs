//! Read-only access to a quadtree container on disk.

use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use terra_quadtree::{full_size, node_index};

use crate::header::read_u64;
use crate::{NodeRecord, StoreError, StoreHeader, TextureTile};

/// An open container whose node records decode to `T`.
///
/// Opening reads and validates the header and the whole table of contents;
/// node records are only read when requested.
#[derive(Debug)]
pub struct TileStore<T: NodeRecord> {
    path: PathBuf,
    header: StoreHeader,
    toc: Vec<u64>,
    source: BufReader<File>,
    srgb: bool,
    flip: bool,
    _record: PhantomData<fn() -> T>,
}

impl<T: NodeRecord> TileStore<T> {
    /// Open `path`, validating its header and reading its table of contents.
    ///
    /// # Errors
    ///
    /// [`StoreError::Io`] if the file cannot be opened or is shorter than its
    /// header plus TOC, [`StoreError::Format`] if the header is not a
    /// supported `T` container.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(StoreError::io(path.display().to_string()))?;
        let mut source = BufReader::new(file);

        let header = StoreHeader::read(&mut source)
            .map_err(StoreError::io(format!("header of {}", path.display())))?;
        T::validate_header(&header)?;

        let count = header.node_count();
        let mut toc = Vec::with_capacity(count);
        for i in 0..count {
            let offset = read_u64(&mut source)
                .map_err(StoreError::io(format!("TOC entry {i} of {}", path.display())))?;
            toc.push(offset);
        }

        tracing::debug!(
            path = %path.display(),
            kind = T::KIND,
            version = header.version,
            depth = header.depth,
            tile_size = header.tile_size,
            "Opened container"
        );

        Ok(Self {
            path,
            header,
            toc,
            source,
            srgb: false,
            flip: false,
            _record: PhantomData,
        })
    }

    /// True if `path` opens as a valid `T` container. Never errors.
    #[must_use]
    pub fn is_valid_file(path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        let Ok(file) = File::open(path) else {
            return false;
        };
        let mut reader = BufReader::new(file);
        let Ok(header) = StoreHeader::read(&mut reader) else {
            return false;
        };
        if T::validate_header(&header).is_err() {
            return false;
        }
        let toc_end = StoreHeader::SIZE + 8 * header.node_count() as u64;
        reader
            .get_ref()
            .metadata()
            .is_ok_and(|meta| meta.len() >= toc_end)
    }

    /// Decode the node at grid position `(row, col)` of `level`, using the
    /// level-major numbering.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidNode`] for a position outside the tree, otherwise
    /// whatever [`TileStore::load_index`] returns.
    pub fn load_node(&mut self, level: u32, row: u32, col: u32) -> Result<T, StoreError> {
        let depth = self.header.depth;
        if level >= depth || row >= (1 << level) || col >= (1 << level) {
            return Err(StoreError::InvalidNode {
                level,
                row,
                col,
                depth,
            });
        }
        self.load_index(node_index(level, row, col))
    }

    /// Decode the record referenced by TOC slot `index`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NodeOutOfRange`] if `index` has no TOC entry, and
    /// [`StoreError::Io`] (or a record-specific error) if the record cannot
    /// be read.
    pub fn load_index(&mut self, index: u32) -> Result<T, StoreError> {
        let offset = self.offset(index)?;
        self.source
            .seek(SeekFrom::Start(offset))
            .map_err(StoreError::io(format!(
                "{} record {index} at offset {offset}",
                T::KIND
            )))?;
        let mut record = T::read_record(&mut self.source, &self.header, index)?;
        if self.flip {
            record.flip_rows();
        }
        Ok(record)
    }

    /// Byte offset of TOC slot `index`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NodeOutOfRange`] if `index` has no TOC entry.
    pub fn offset(&self, index: u32) -> Result<u64, StoreError> {
        self.toc
            .get(index as usize)
            .copied()
            .ok_or(StoreError::NodeOutOfRange {
                index,
                len: self.toc.len(),
            })
    }

    /// Mark the store's payload as sRGB-encoded color (as opposed to linear
    /// data such as normals).
    #[must_use]
    pub fn with_srgb(mut self, srgb: bool) -> Self {
        self.srgb = srgb;
        self
    }

    #[must_use]
    pub fn is_srgb(&self) -> bool {
        self.srgb
    }

    #[must_use]
    pub fn header(&self) -> &StoreHeader {
        &self.header
    }

    /// Number of levels in the tree.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.header.depth
    }

    #[must_use]
    pub fn tile_size(&self) -> u32 {
        self.header.tile_size
    }

    #[must_use]
    pub fn version(&self) -> u32 {
        self.header.version
    }

    /// Number of TOC entries; always `full_size(depth)`.
    #[must_use]
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.toc.len(), full_size(self.header.depth) as usize);
        self.toc.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.toc.is_empty()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TileStore<TextureTile> {
    /// Flip every loaded tile so its south row comes first.
    #[must_use]
    pub fn with_flip(mut self, flip: bool) -> Self {
        self.flip = flip;
        self
    }

    #[must_use]
    pub fn is_flipped(&self) -> bool {
        self.flip
    }
}
