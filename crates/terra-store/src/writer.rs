//! Container production, used by tooling and tests.

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::{NodeRecord, StoreError, StoreHeader};

/// Streams node records into a new container file.
///
/// The header and a zeroed TOC are written on [`create`](Self::create);
/// records are appended in call order and the TOC is patched on
/// [`finish`](Self::finish).
pub struct ContainerWriter<T: NodeRecord> {
    path: PathBuf,
    header: StoreHeader,
    toc: Vec<Option<u64>>,
    sink: BufWriter<File>,
    _record: PhantomData<fn(&T)>,
}

impl<T: NodeRecord> ContainerWriter<T> {
    /// Create (or truncate) `path` as a `T` container.
    ///
    /// # Errors
    ///
    /// [`StoreError::Format`] if the header parameters are not valid for `T`,
    /// [`StoreError::Io`] if the file cannot be written.
    pub fn create(
        path: impl AsRef<Path>,
        version: u32,
        depth: u32,
        tile_size: u32,
    ) -> Result<Self, StoreError> {
        let header = StoreHeader {
            magic: T::MAGIC,
            version,
            depth,
            tile_size,
        };
        T::validate_header(&header)?;

        let path = path.as_ref().to_path_buf();
        let context = path.display().to_string();
        let file = File::create(&path).map_err(StoreError::io(context.clone()))?;
        let mut sink = BufWriter::new(file);
        header.write(&mut sink).map_err(StoreError::io(context.clone()))?;
        let count = header.node_count();
        for _ in 0..count {
            sink.write_all(&0u64.to_le_bytes())
                .map_err(StoreError::io(context.clone()))?;
        }

        Ok(Self {
            path,
            header,
            toc: vec![None; count],
            sink,
            _record: PhantomData,
        })
    }

    /// Append `record` and point TOC slot `index` at it.
    ///
    /// # Errors
    ///
    /// [`StoreError::NodeOutOfRange`] for an index outside the tree, or any
    /// encoding failure from the record.
    pub fn write_node(&mut self, index: u32, record: &T) -> Result<(), StoreError> {
        let len = self.toc.len();
        let slot = self
            .toc
            .get_mut(index as usize)
            .ok_or(StoreError::NodeOutOfRange { index, len })?;
        let offset = self
            .sink
            .stream_position()
            .map_err(StoreError::io(self.path.display().to_string()))?;
        *slot = Some(offset);
        record.write_record(&mut self.sink, &self.header)
    }

    /// Patch the TOC and flush. Slots never written keep offset 0.
    ///
    /// # Errors
    ///
    /// [`StoreError::Io`] if seeking or flushing fails.
    pub fn finish(mut self) -> Result<PathBuf, StoreError> {
        let context = self.path.display().to_string();
        let missing = self.toc.iter().filter(|slot| slot.is_none()).count();
        if missing > 0 {
            tracing::warn!(path = %context, missing, "Container finished with unwritten nodes");
        }

        self.sink
            .seek(SeekFrom::Start(StoreHeader::SIZE))
            .map_err(StoreError::io(context.clone()))?;
        for offset in &self.toc {
            self.sink
                .write_all(&offset.unwrap_or(0).to_le_bytes())
                .map_err(StoreError::io(context.clone()))?;
        }
        self.sink.flush().map_err(StoreError::io(context))?;
        Ok(self.path)
    }
}

#[cfg(test)]
mod tests {
    use terra_quadtree::{NodeId, full_size};

    use super::*;
    use crate::{TEXTURE_VERSION_PNG, TEXTURE_VERSION_RAW, TextureStore, TextureTile};

    #[test]
    fn test_written_texture_container_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("color.tqt");
        let mut writer =
            ContainerWriter::<TextureTile>::create(&path, TEXTURE_VERSION_PNG, 3, 8).unwrap();
        for index in (0..full_size(3)).rev() {
            let node = NodeId::from_index(index);
            writer
                .write_node(index, &TextureTile::solid(node, 8, [index as u8, 0, 0, 255]))
                .unwrap();
        }
        writer.finish().unwrap();

        let mut store = TextureStore::open(&path).unwrap();
        assert_eq!(store.len(), 21);
        let tile = store.load_node(2, 3, 1).unwrap();
        let expected = NodeId::new(2, 3, 1).index() as u8;
        assert_eq!(tile.pixel(5, 5), [expected, 0, 0, 255]);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.tqt");
        assert!(
            ContainerWriter::<TextureTile>::create(&path, TEXTURE_VERSION_RAW, 0, 8)
                .is_err()
        );
        assert!(
            ContainerWriter::<TextureTile>::create(&path, TEXTURE_VERSION_RAW, 2, 6)
                .is_err()
        );
    }

    #[test]
    fn test_slot_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.tqt");
        let mut writer =
            ContainerWriter::<TextureTile>::create(&path, TEXTURE_VERSION_RAW, 1, 2).unwrap();
        let tile = TextureTile::solid(NodeId::ROOT, 2, [0; 4]);
        assert!(matches!(
            writer.write_node(1, &tile),
            Err(StoreError::NodeOutOfRange { index: 1, len: 1 })
        ));
    }

    /// A tile whose size disagrees with the header is refused at write time.
    #[test]
    fn test_wrong_tile_size_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.tqt");
        let mut writer =
            ContainerWriter::<TextureTile>::create(&path, TEXTURE_VERSION_RAW, 1, 4).unwrap();
        let tile = TextureTile::solid(NodeId::ROOT, 2, [0; 4]);
        assert!(matches!(
            writer.write_node(0, &tile),
            Err(StoreError::SizeMismatch { .. })
        ));
    }
}
