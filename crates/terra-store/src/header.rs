//! Container header shared by mesh and texture stores.
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | Magic number (`u32`, little-endian) |
//! | 4 | 4 | Format version (`u32`) |
//! | 8 | 4 | Tree depth (`u32`, number of levels) |
//! | 12 | 4 | Tile size (`u32`; cell width for meshes, pixel width for textures) |
//! | 16 | 8×N | TOC: `N = full_size(depth)` byte offsets (`u64`) |

use std::io::{self, Read, Write};

/// The fixed-size header at the start of every container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreHeader {
    pub magic: u32,
    pub version: u32,
    pub depth: u32,
    pub tile_size: u32,
}

impl StoreHeader {
    /// Encoded size of the header in bytes.
    pub const SIZE: u64 = 16;

    /// Read a header. Short input surfaces as [`io::ErrorKind::UnexpectedEof`].
    pub fn read<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Self {
            magic: read_u32(reader)?,
            version: read_u32(reader)?,
            depth: read_u32(reader)?,
            tile_size: read_u32(reader)?,
        })
    }

    /// Write the header in its on-disk layout.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.magic.to_le_bytes())?;
        writer.write_all(&self.version.to_le_bytes())?;
        writer.write_all(&self.depth.to_le_bytes())?;
        writer.write_all(&self.tile_size.to_le_bytes())
    }

    /// Number of TOC entries that follow the header.
    #[must_use]
    pub fn node_count(&self) -> usize {
        terra_quadtree::full_size(self.depth) as usize
    }
}

pub(crate) fn read_u16<R: Read>(reader: &mut R) -> io::Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

pub(crate) fn read_i16<R: Read>(reader: &mut R) -> io::Result<i16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(i16::from_le_bytes(buf))
}

pub(crate) fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub(crate) fn read_f32<R: Read>(reader: &mut R) -> io::Result<f32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

pub(crate) fn read_u64<R: Read>(reader: &mut R) -> io::Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout_is_little_endian() {
        let header = StoreHeader {
            magic: 0x0054_5154,
            version: 1,
            depth: 2,
            tile_size: 256,
        };
        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();
        assert_eq!(bytes.len() as u64, StoreHeader::SIZE);
        assert_eq!(&bytes[0..4], b"TQT\0");
        assert_eq!(&bytes[12..16], &256u32.to_le_bytes());

        let parsed = StoreHeader::read(&mut bytes.as_slice()).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.node_count(), 5);
    }

    #[test]
    fn test_truncated_header_is_eof() {
        let err = StoreHeader::read(&mut [0u8; 10].as_slice()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
