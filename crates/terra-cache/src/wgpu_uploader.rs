//! GPU residency through `wgpu`.

use terra_store::TextureTile;

use crate::{TextureUploader, UploadError, UploadRequest, mip_chain};

/// A resident tile: texture, full view and its sampler.
#[derive(Debug)]
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub format: wgpu::TextureFormat,
    pub mip_level_count: u32,
    bytes: usize,
}

/// Uploads tiles as sampled 2D textures on a `wgpu` device.
pub struct WgpuUploader {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl WgpuUploader {
    #[must_use]
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self { device, queue }
    }

    fn write_level(&self, texture: &wgpu::Texture, level: u32, size: u32, data: &[u8]) {
        let extent = wgpu::Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        };
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: level,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * size),
                rows_per_image: None,
            },
            extent,
        );
    }
}

impl TextureUploader for WgpuUploader {
    type Resource = GpuTexture;

    fn upload(
        &mut self,
        tile: &TextureTile,
        request: UploadRequest,
    ) -> Result<GpuTexture, UploadError> {
        let max = self.device.limits().max_texture_dimension_2d;
        if tile.size > max {
            return Err(UploadError {
                node: tile.node,
                reason: format!("tile size {} exceeds device limit {max}", tile.size),
            });
        }

        let format = if request.srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };
        let levels = if request.mipmaps {
            mip_chain(tile)?
                .into_iter()
                .map(image::RgbaImage::into_raw)
                .collect()
        } else {
            vec![tile.pixels.clone()]
        };
        let mip_level_count = levels.len() as u32;
        let label = format!("tile-{}", tile.node);

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&label),
            size: wgpu::Extent3d {
                width: tile.size,
                height: tile.size,
                depth_or_array_layers: 1,
            },
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let mut size = tile.size;
        for (level, data) in levels.iter().enumerate() {
            self.write_level(&texture, level as u32, size, data);
            size = (size / 2).max(1);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });

        Ok(GpuTexture {
            texture,
            view,
            sampler,
            format,
            mip_level_count,
            bytes: levels.iter().map(Vec::len).sum(),
        })
    }

    fn resident_bytes(resource: &GpuTexture) -> usize {
        resource.bytes
    }
}

#[cfg(test)]
mod tests {
    use terra_quadtree::NodeId;

    use super::*;

    /// Returns `None` if no GPU is available.
    fn test_device() -> Option<(wgpu::Device, wgpu::Queue)> {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });
            let adapter = instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::default(),
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .ok()?;
            adapter
                .request_device(&wgpu::DeviceDescriptor::default())
                .await
                .ok()
        })
    }

    #[test]
    fn test_flat_srgb_upload() {
        let Some((device, queue)) = test_device() else {
            return;
        };
        let mut uploader = WgpuUploader::new(device, queue);
        let tile = TextureTile::solid(NodeId::new(1, 0, 1), 8, [200, 100, 50, 255]);

        let tex = uploader
            .upload(&tile, UploadRequest { srgb: true, mipmaps: false })
            .unwrap();
        assert_eq!(tex.format, wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(tex.mip_level_count, 1);
        assert_eq!(tex.texture.mip_level_count(), 1);
        assert_eq!(tex.texture.width(), 8);
        assert_eq!(WgpuUploader::resident_bytes(&tex), 8 * 8 * 4);
    }

    /// Linear data with mipmaps gets a full chain down to 1x1.
    #[test]
    fn test_mipmapped_linear_upload() {
        let Some((device, queue)) = test_device() else {
            return;
        };
        let mut uploader = WgpuUploader::new(device, queue);
        let tile = TextureTile::solid(NodeId::ROOT, 8, [128, 128, 255, 255]);

        let tex = uploader
            .upload(&tile, UploadRequest { srgb: false, mipmaps: true })
            .unwrap();
        assert_eq!(tex.format, wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(tex.texture.format(), wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(tex.mip_level_count, 4);
        assert_eq!(tex.texture.mip_level_count(), 4);
        assert_eq!(WgpuUploader::resident_bytes(&tex), 256 + 64 + 16 + 4);
    }
}
