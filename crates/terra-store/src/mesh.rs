//! Mesh-chunk records.
//!
//! | Field | Type |
//! |-------|------|
//! | max error | `f32` |
//! | vertex count | `u32` |
//! | index count | `u32` |
//! | min Y | `i16` |
//! | max Y | `i16` |
//! | vertices | `nVerts × 4 × i16` (x, y, z, morph delta) |
//! | indices | `nIndices × u16` |

use std::io::{BufRead, Read, Seek, Write};

use crate::header::{read_f32, read_i16, read_u32};
use crate::{NodeRecord, StoreError, StoreHeader};

/// `'cell'` as a 32-bit character constant.
pub const MESH_MAGIC: u32 = 0x6365_6C6C;

/// Current mesh container version.
pub const MESH_VERSION: u32 = 1;

/// Maximum number of LODs in a mesh container.
pub const MAX_MESH_DEPTH: u32 = 9;

/// Largest cell width, in `h_scale` units, of a mesh container.
pub const MAX_MESH_TILE_SIZE: u32 = 1 << 14;

/// Largest vertex count addressable by 16-bit indices.
const MAX_VERTICES: u32 = 1 << 16;

/// Largest index count of one chunk: a triangle list over a full
/// 16-bit vertex grid.
const MAX_INDICES: u32 = 6 * MAX_VERTICES;

/// A packed, quantized heightfield vertex.
///
/// `x`/`z` are offsets from the cell's north-west corner in horizontal-scale
/// units; `y` is the elevation above the base in vertical-scale units and
/// `morph_delta` the offset of the morph target relative to `y`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct HfVertex {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    pub morph_delta: i16,
}

impl HfVertex {
    /// Size of one encoded vertex in bytes.
    pub const SIZE: usize = 8;

    #[must_use]
    pub fn new(x: i16, y: i16, z: i16, morph_delta: i16) -> Self {
        Self {
            x,
            y,
            z,
            morph_delta,
        }
    }
}

/// Geometry for one node of the LOD quadtree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshChunk {
    /// Worst-case geometric error (world units) this chunk introduces relative
    /// to the full-resolution surface.
    pub max_error: f32,
    /// Minimum active elevation of the chunk, in vertical-scale units.
    pub min_y: i16,
    /// Maximum active elevation of the chunk, in vertical-scale units.
    pub max_y: i16,
    pub vertices: Vec<HfVertex>,
    /// Triangle-list indices into `vertices`.
    pub indices: Vec<u16>,
}

impl MeshChunk {
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Vertex data as raw bytes, ready for a vertex buffer upload.
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index data as raw bytes, ready for an index buffer upload.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Approximate host memory held by this chunk.
    #[must_use]
    pub fn byte_size(&self) -> usize {
        self.vertex_bytes().len() + self.index_bytes().len()
    }
}

impl NodeRecord for MeshChunk {
    const KIND: &'static str = "mesh";
    const MAGIC: u32 = MESH_MAGIC;
    const VERSIONS: &'static [u32] = &[MESH_VERSION];
    const MAX_DEPTH: u32 = MAX_MESH_DEPTH;
    const MAX_TILE_SIZE: u32 = MAX_MESH_TILE_SIZE;

    fn read_record<R: BufRead + Seek>(
        reader: &mut R,
        _header: &StoreHeader,
        index: u32,
    ) -> Result<Self, StoreError> {
        let ctx = |what: &str| format!("{what} of mesh chunk {index}");

        let max_error = read_f32(reader).map_err(StoreError::io(ctx("header")))?;
        let n_verts = read_u32(reader).map_err(StoreError::io(ctx("header")))?;
        let n_indices = read_u32(reader).map_err(StoreError::io(ctx("header")))?;
        let min_y = read_i16(reader).map_err(StoreError::io(ctx("header")))?;
        let max_y = read_i16(reader).map_err(StoreError::io(ctx("header")))?;

        if n_verts > MAX_VERTICES {
            return Err(StoreError::Format {
                kind: Self::KIND,
                reason: format!("chunk {index} has {n_verts} vertices (limit {MAX_VERTICES})"),
            });
        }
        if n_indices > MAX_INDICES {
            return Err(StoreError::Format {
                kind: Self::KIND,
                reason: format!("chunk {index} has {n_indices} indices (limit {MAX_INDICES})"),
            });
        }

        let mut raw = vec![0u8; n_verts as usize * HfVertex::SIZE];
        reader
            .read_exact(&mut raw)
            .map_err(StoreError::io(ctx("vertex data")))?;
        let vertices = raw
            .chunks_exact(HfVertex::SIZE)
            .map(|v| {
                HfVertex::new(
                    i16::from_le_bytes([v[0], v[1]]),
                    i16::from_le_bytes([v[2], v[3]]),
                    i16::from_le_bytes([v[4], v[5]]),
                    i16::from_le_bytes([v[6], v[7]]),
                )
            })
            .collect();

        let mut raw = vec![0u8; n_indices as usize * 2];
        reader
            .read_exact(&mut raw)
            .map_err(StoreError::io(ctx("index data")))?;
        let indices = raw
            .chunks_exact(2)
            .map(|i| u16::from_le_bytes([i[0], i[1]]))
            .collect();

        Ok(Self {
            max_error,
            min_y,
            max_y,
            vertices,
            indices,
        })
    }

    fn write_record<W: Write>(
        &self,
        writer: &mut W,
        _header: &StoreHeader,
    ) -> Result<(), StoreError> {
        let mut buf = Vec::with_capacity(16 + self.byte_size());
        buf.extend_from_slice(&self.max_error.to_le_bytes());
        buf.extend_from_slice(&(self.vertices.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(self.indices.len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.min_y.to_le_bytes());
        buf.extend_from_slice(&self.max_y.to_le_bytes());
        for v in &self.vertices {
            for c in [v.x, v.y, v.z, v.morph_delta] {
                buf.extend_from_slice(&c.to_le_bytes());
            }
        }
        for i in &self.indices {
            buf.extend_from_slice(&i.to_le_bytes());
        }
        writer
            .write_all(&buf)
            .map_err(StoreError::io("mesh chunk record"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn header() -> StoreHeader {
        StoreHeader {
            magic: MESH_MAGIC,
            version: MESH_VERSION,
            depth: 1,
            tile_size: 256,
        }
    }

    fn sample_chunk() -> MeshChunk {
        MeshChunk {
            max_error: 0.75,
            min_y: -12,
            max_y: 340,
            vertices: vec![
                HfVertex::new(0, 10, 0, 0),
                HfVertex::new(256, 20, 0, -3),
                HfVertex::new(0, 30, 256, 4),
            ],
            indices: vec![0, 2, 1],
        }
    }

    #[test]
    fn test_record_layout() {
        let mut bytes = Vec::new();
        sample_chunk().write_record(&mut bytes, &header()).unwrap();
        // 16 byte record header + 3 vertices + 3 indices
        assert_eq!(bytes.len(), 16 + 3 * 8 + 3 * 2);
        assert_eq!(&bytes[4..8], &3u32.to_le_bytes());
        assert_eq!(&bytes[12..14], &(-12i16).to_le_bytes());
        // second vertex x coordinate
        assert_eq!(&bytes[24..26], &256i16.to_le_bytes());
    }

    #[test]
    fn test_decode_matches_encoded_chunk() {
        let chunk = sample_chunk();
        let mut bytes = Vec::new();
        chunk.write_record(&mut bytes, &header()).unwrap();
        let decoded = MeshChunk::read_record(&mut Cursor::new(bytes), &header(), 0).unwrap();
        assert_eq!(decoded, chunk);
    }

    #[test]
    fn test_short_index_data_is_io_error() {
        let mut bytes = Vec::new();
        sample_chunk().write_record(&mut bytes, &header()).unwrap();
        bytes.truncate(bytes.len() - 1);
        let err = MeshChunk::read_record(&mut Cursor::new(bytes), &header(), 7).unwrap_err();
        match err {
            StoreError::Io { context, .. } => assert!(context.contains("index data of mesh chunk 7")),
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[test]
    fn test_oversized_vertex_count_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1.0f32.to_le_bytes());
        bytes.extend_from_slice(&(MAX_VERTICES + 1).to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 4]);
        let err = MeshChunk::read_record(&mut Cursor::new(bytes), &header(), 0).unwrap_err();
        assert!(err.is_format());
    }

    /// An index count past the limit is rejected before any allocation.
    #[test]
    fn test_oversized_index_count_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&1.0f32.to_le_bytes());
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 4]);
        let err = MeshChunk::read_record(&mut Cursor::new(bytes), &header(), 0).unwrap_err();
        match err {
            StoreError::Format { reason, .. } => assert!(reason.contains("indices")),
            other => panic!("expected Format, got {other:?}"),
        }
    }

    #[test]
    fn test_oversized_tile_size_rejected() {
        let header = StoreHeader {
            tile_size: MAX_MESH_TILE_SIZE << 1,
            ..header()
        };
        assert!(MeshChunk::validate_header(&header).unwrap_err().is_format());
    }

    #[test]
    fn test_vertex_bytes_are_packed() {
        let chunk = sample_chunk();
        assert_eq!(chunk.vertex_bytes().len(), 24);
        assert_eq!(chunk.index_bytes().len(), 6);
        assert_eq!(std::mem::size_of::<HfVertex>(), HfVertex::SIZE);
    }
}
