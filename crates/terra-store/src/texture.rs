//! Texture-tile records.
//!
//! Version 1 containers store each tile as a raw block of
//! `tile_size × tile_size` RGBA8 pixels in row-major order, north row first.
//! Version 2 containers store each tile as a PNG stream, which must decode to
//! a `tile_size × tile_size` image with four channels.

use std::io::{BufRead, Cursor, Read, Seek, Write};

use image::{ImageFormat, ImageReader};
use terra_quadtree::NodeId;

use crate::{NodeRecord, StoreError, StoreHeader};

/// `"TQT\0"` in little-endian order.
pub const TEXTURE_MAGIC: u32 = 0x0054_5154;

/// Version whose records are raw RGBA pixel blocks.
pub const TEXTURE_VERSION_RAW: u32 = 1;

/// Version whose records are PNG-encoded images.
pub const TEXTURE_VERSION_PNG: u32 = 2;

/// Maximum depth of a texture quadtree.
pub const MAX_TEXTURE_DEPTH: u32 = 16;

/// Largest tile width and height, in pixels.
pub const MAX_TEXTURE_TILE_SIZE: u32 = 1 << 12;

/// Bytes per pixel of the fixed RGBA layout.
const CHANNELS: usize = 4;

/// A square RGBA8 pixel block at one node of a texture quadtree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureTile {
    /// Quadtree node this tile was loaded from.
    pub node: NodeId,
    /// Width and height in pixels.
    pub size: u32,
    /// `size * size * 4` bytes of RGBA data.
    pub pixels: Vec<u8>,
}

impl TextureTile {
    /// Wrap a pixel buffer.
    ///
    /// # Panics
    ///
    /// Panics if `pixels` is not exactly `size * size * 4` bytes.
    #[must_use]
    pub fn new(node: NodeId, size: u32, pixels: Vec<u8>) -> Self {
        assert_eq!(
            Some(pixels.len()),
            Self::byte_len(size),
            "pixel buffer does not match a {size}x{size} RGBA tile"
        );
        Self { node, size, pixels }
    }

    /// A tile filled with a single color.
    #[must_use]
    pub fn solid(node: NodeId, size: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba.repeat(size as usize * size as usize);
        Self { node, size, pixels }
    }

    /// Encoded byte length of a `size × size` tile, `None` on overflow.
    #[must_use]
    pub fn byte_len(size: u32) -> Option<usize> {
        (size as usize)
            .checked_mul(size as usize)?
            .checked_mul(CHANNELS)
    }

    /// Bytes per pixel row.
    #[must_use]
    pub fn bytes_per_row(&self) -> u32 {
        self.size * CHANNELS as u32
    }

    /// RGBA value at `(x, y)`; `y = 0` is the north row.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.size as usize + x as usize) * CHANNELS;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Mirror the rows so the south row comes first (bottom-up APIs).
    pub fn flip_vertical(&mut self) {
        let row = self.bytes_per_row() as usize;
        let rows = self.size as usize;
        for y in 0..rows / 2 {
            let (top, bottom) = self.pixels.split_at_mut((rows - 1 - y) * row);
            top[y * row..(y + 1) * row].swap_with_slice(&mut bottom[..row]);
        }
    }

    fn size_mismatch(node: NodeId, width: u32, height: u32, channels: u8, expected: u32) -> StoreError {
        StoreError::SizeMismatch {
            node,
            width,
            height,
            channels,
            expected,
        }
    }
}

impl NodeRecord for TextureTile {
    const KIND: &'static str = "texture";
    const MAGIC: u32 = TEXTURE_MAGIC;
    const VERSIONS: &'static [u32] = &[TEXTURE_VERSION_RAW, TEXTURE_VERSION_PNG];
    const MAX_DEPTH: u32 = MAX_TEXTURE_DEPTH;
    const MAX_TILE_SIZE: u32 = MAX_TEXTURE_TILE_SIZE;

    fn read_record<R: BufRead + Seek>(
        reader: &mut R,
        header: &StoreHeader,
        index: u32,
    ) -> Result<Self, StoreError> {
        let node = NodeId::from_index(index);
        let size = header.tile_size;

        if header.version == TEXTURE_VERSION_RAW {
            let len = Self::byte_len(size).ok_or_else(|| StoreError::Format {
                kind: Self::KIND,
                reason: format!("tile size {size} overflows a pixel buffer"),
            })?;
            let mut pixels = vec![0u8; len];
            reader
                .read_exact(&mut pixels)
                .map_err(StoreError::io(format!("pixels of texture tile {node}")))?;
            return Ok(Self { node, size, pixels });
        }

        let image = ImageReader::with_format(reader, ImageFormat::Png)
            .decode()
            .map_err(|source| StoreError::Image { node, source })?;
        let channels = image.color().channel_count();
        if image.width() != size || image.height() != size || channels as usize != CHANNELS {
            return Err(Self::size_mismatch(
                node,
                image.width(),
                image.height(),
                channels,
                size,
            ));
        }
        Ok(Self {
            node,
            size,
            pixels: image.into_rgba8().into_raw(),
        })
    }

    fn flip_rows(&mut self) {
        self.flip_vertical();
    }

    fn write_record<W: Write>(
        &self,
        writer: &mut W,
        header: &StoreHeader,
    ) -> Result<(), StoreError> {
        if self.size != header.tile_size {
            return Err(Self::size_mismatch(
                self.node,
                self.size,
                self.size,
                CHANNELS as u8,
                header.tile_size,
            ));
        }
        let context = format!("texture tile {}", self.node);
        if header.version == TEXTURE_VERSION_RAW {
            return writer
                .write_all(&self.pixels)
                .map_err(StoreError::io(context));
        }

        let image = image::RgbaImage::from_raw(self.size, self.size, self.pixels.clone())
            .ok_or_else(|| {
                Self::size_mismatch(self.node, self.size, self.size, CHANNELS as u8, self.size)
            })?;
        let mut encoded = Cursor::new(Vec::new());
        image
            .write_to(&mut encoded, ImageFormat::Png)
            .map_err(|source| StoreError::Image {
                node: self.node,
                source,
            })?;
        writer
            .write_all(encoded.get_ref())
            .map_err(StoreError::io(context))
    }
}
