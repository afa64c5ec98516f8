//! The seam between the cache and whatever holds resident textures.

use image::RgbaImage;
use image::imageops::{self, FilterType};
use terra_quadtree::NodeId;
use terra_store::TextureTile;

use crate::UploadError;

/// Per-upload options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UploadRequest {
    /// Pixels are sRGB color rather than linear data.
    pub srgb: bool,
    /// Build a full mip chain.
    pub mipmaps: bool,
}

/// Turns decoded tiles into resident resources.
pub trait TextureUploader {
    /// What the cache hands out for an active handle.
    type Resource;

    /// Make `tile` resident.
    ///
    /// # Errors
    ///
    /// [`UploadError`] if the backend cannot hold the tile.
    fn upload(
        &mut self,
        tile: &TextureTile,
        request: UploadRequest,
    ) -> Result<Self::Resource, UploadError>;

    /// Resident bytes held by `resource`.
    fn resident_bytes(resource: &Self::Resource) -> usize;
}

/// Full mip chain of `tile`, level 0 first, down to 1×1. Each level is a
/// triangle-filtered downsample of the previous one.
///
/// # Errors
///
/// [`UploadError`] if the tile's pixel buffer does not match its size.
pub fn mip_chain(tile: &TextureTile) -> Result<Vec<RgbaImage>, UploadError> {
    let base = RgbaImage::from_raw(tile.size, tile.size, tile.pixels.clone()).ok_or_else(|| {
        UploadError {
            node: tile.node,
            reason: format!("pixel buffer does not hold a {0}x{0} RGBA image", tile.size),
        }
    })?;
    let mut levels = vec![base];
    let mut size = tile.size;
    while size > 1 {
        size /= 2;
        let prev = &levels[levels.len() - 1];
        let next = imageops::resize(prev, size, size, FilterType::Triangle);
        levels.push(next);
    }
    Ok(levels)
}

/// A tile kept in host memory.
#[derive(Clone, Debug, PartialEq)]
pub struct HostTexture {
    pub node: NodeId,
    pub size: u32,
    pub srgb: bool,
    /// Pixel data per mip level, level 0 first.
    pub levels: Vec<Vec<u8>>,
}

/// Keeps "resident" textures in host memory. Used without a GPU device, by
/// the headless driver and in tests.
#[derive(Debug, Default)]
pub struct HostUploader {
    uploads: usize,
}

impl HostUploader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of uploads performed so far.
    #[must_use]
    pub fn uploads(&self) -> usize {
        self.uploads
    }
}

impl TextureUploader for HostUploader {
    type Resource = HostTexture;

    fn upload(
        &mut self,
        tile: &TextureTile,
        request: UploadRequest,
    ) -> Result<HostTexture, UploadError> {
        let levels = if request.mipmaps {
            mip_chain(tile)?.into_iter().map(RgbaImage::into_raw).collect()
        } else {
            vec![tile.pixels.clone()]
        };
        self.uploads += 1;
        Ok(HostTexture {
            node: tile.node,
            size: tile.size,
            srgb: request.srgb,
            levels,
        })
    }

    fn resident_bytes(resource: &HostTexture) -> usize {
        resource.levels.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mip_chain_halves_to_one_pixel() {
        let tile = TextureTile::solid(NodeId::ROOT, 8, [200, 100, 50, 255]);
        let chain = mip_chain(&tile).unwrap();
        let sizes: Vec<u32> = chain.iter().map(RgbaImage::width).collect();
        assert_eq!(sizes, vec![8, 4, 2, 1]);
        assert_eq!(chain[3].get_pixel(0, 0).0, [200, 100, 50, 255]);
    }

    #[test]
    fn test_host_upload_counts_bytes() {
        let mut uploader = HostUploader::new();
        let tile = TextureTile::solid(NodeId::new(1, 1, 0), 4, [1, 1, 1, 1]);

        let flat = uploader.upload(&tile, UploadRequest::default()).unwrap();
        assert_eq!(HostUploader::resident_bytes(&flat), 64);

        let request = UploadRequest {
            srgb: true,
            mipmaps: true,
        };
        let mipped = uploader.upload(&tile, request).unwrap();
        assert!(mipped.srgb);
        assert_eq!(HostUploader::resident_bytes(&mipped), 64 + 16 + 4);
        assert_eq!(uploader.uploads(), 2);
    }
}
