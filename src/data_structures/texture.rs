//! GPU textures and sampling parameters.
//!
//! This module provides [`Texture`], a wrapper around WGPU texture resources, and
//! [`TextureSettings`], the wrap / filter / repeat / offset parameters that are
//! attached to an image when it finishes loading. Until then materials sample a
//! 1×1 white placeholder built with [`Texture::placeholder`].

use anyhow::*;
use image::{DynamicImage, GenericImageView, imageops::FilterType};

/// Index of a texture slot in the scene's texture table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

/// Behaviour of texture coordinates outside `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Wrapping {
    #[default]
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

impl From<Wrapping> for wgpu::AddressMode {
    fn from(wrap: Wrapping) -> Self {
        match wrap {
            Wrapping::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            Wrapping::Repeat => wgpu::AddressMode::Repeat,
            Wrapping::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
        }
    }
}

/// Magnification filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MagFilter {
    Nearest,
    #[default]
    Linear,
}

/// Minification filter, optionally blending between mip levels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MinFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapNearest,
    #[default]
    LinearMipmapLinear,
}

impl MinFilter {
    pub fn uses_mipmaps(self) -> bool {
        !matches!(self, MinFilter::Nearest | MinFilter::Linear)
    }

    fn filter(self) -> wgpu::FilterMode {
        match self {
            MinFilter::Nearest | MinFilter::NearestMipmapNearest | MinFilter::NearestMipmapLinear => {
                wgpu::FilterMode::Nearest
            }
            _ => wgpu::FilterMode::Linear,
        }
    }

    fn mipmap_filter(self) -> wgpu::FilterMode {
        match self {
            MinFilter::NearestMipmapLinear | MinFilter::LinearMipmapLinear => {
                wgpu::FilterMode::Linear
            }
            _ => wgpu::FilterMode::Nearest,
        }
    }
}

impl From<MagFilter> for wgpu::FilterMode {
    fn from(filter: MagFilter) -> Self {
        match filter {
            MagFilter::Nearest => wgpu::FilterMode::Nearest,
            MagFilter::Linear => wgpu::FilterMode::Linear,
        }
    }
}

/// Sampling and UV transform parameters of an image texture.
///
/// The defaults clamp on both axes, use linear magnification with trilinear
/// minification, no UV transform and flip the image so that `v = 0` addresses
/// the bottom row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureSettings {
    pub wrap_s: Wrapping,
    pub wrap_t: Wrapping,
    pub mag_filter: MagFilter,
    pub min_filter: MinFilter,
    pub repeat: [f32; 2],
    pub offset: [f32; 2],
    pub flip_y: bool,
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            wrap_s: Wrapping::ClampToEdge,
            wrap_t: Wrapping::ClampToEdge,
            mag_filter: MagFilter::Linear,
            min_filter: MinFilter::LinearMipmapLinear,
            repeat: [1.0, 1.0],
            offset: [0.0, 0.0],
            flip_y: true,
        }
    }
}

impl TextureSettings {
    /// `uv * repeat + offset`, packed as `[repeat.x, repeat.y, offset.x, offset.y]`.
    pub fn uv_transform(&self) -> [f32; 4] {
        [self.repeat[0], self.repeat[1], self.offset[0], self.offset[1]]
    }

    pub fn transform_uv(&self, uv: [f32; 2]) -> [f32; 2] {
        [
            uv[0] * self.repeat[0] + self.offset[0],
            uv[1] * self.repeat[1] + self.offset[1],
        ]
    }

    pub fn sampler_descriptor(&self) -> wgpu::SamplerDescriptor<'static> {
        wgpu::SamplerDescriptor {
            label: Some("texture sampler"),
            address_mode_u: self.wrap_s.into(),
            address_mode_v: self.wrap_t.into(),
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: self.mag_filter.into(),
            min_filter: self.min_filter.filter(),
            mipmap_filter: self.min_filter.mipmap_filter(),
            ..Default::default()
        }
    }
}

/// Number of mip levels of a full chain down to 1×1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// A GPU texture with a view and optional sampler.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
    pub settings: TextureSettings,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Depth attachment for the main pass, sized like the surface.
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            sampler: None,
            settings: TextureSettings::default(),
        }
    }

    /// A 1×1 opaque white texture. Sampling it leaves the material colour as is.
    pub fn placeholder(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        settings: TextureSettings,
    ) -> Self {
        let img = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            1,
            1,
            image::Rgba([255, 255, 255, 255]),
        ));
        Self::from_image(device, queue, &img, Some("placeholder texture"), settings)
    }

    /// Decodes image file contents (PNG, JPEG, ...) and uploads them.
    pub fn from_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        label: &str,
        settings: TextureSettings,
    ) -> Result<Self> {
        let img = image::load_from_memory(bytes)
            .with_context(|| format!("could not decode image {label}"))?;
        Ok(Self::from_image(device, queue, &img, Some(label), settings))
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &DynamicImage,
        label: Option<&str>,
        settings: TextureSettings,
    ) -> Self {
        let img = if settings.flip_y {
            img.flipv()
        } else {
            img.clone()
        };
        let (width, height) = img.dimensions();
        let mip_level_count = if settings.min_filter.uses_mipmaps() {
            mip_level_count(width, height)
        } else {
            1
        };

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let mut level_image = img.to_rgba8();
        for mip_level in 0..mip_level_count {
            let (level_width, level_height) = level_image.dimensions();
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level,
                    origin: wgpu::Origin3d::ZERO,
                },
                &level_image,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * level_width),
                    rows_per_image: Some(level_height),
                },
                wgpu::Extent3d {
                    width: level_width,
                    height: level_height,
                    depth_or_array_layers: 1,
                },
            );
            if mip_level + 1 < mip_level_count {
                level_image = image::imageops::resize(
                    &level_image,
                    (level_width / 2).max(1),
                    (level_height / 2).max(1),
                    FilterType::Triangle,
                );
            }
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(device.create_sampler(&settings.sampler_descriptor()));

        Self {
            texture,
            view,
            sampler,
            settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_mip_chain_length() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(256, 256), 9);
        assert_eq!(mip_level_count(300, 20), 9);
    }

    #[test]
    fn uv_transform_scales_then_offsets() {
        let settings = TextureSettings {
            repeat: [8.0, 5.0],
            offset: [0.0, -1.5],
            ..Default::default()
        };
        assert_eq!(settings.transform_uv([0.5, 0.5]), [4.0, 1.0]);
        assert_eq!(settings.uv_transform(), [8.0, 5.0, 0.0, -1.5]);
    }

    #[test]
    fn linear_mipmap_nearest_blends_within_a_level() {
        let settings = TextureSettings {
            min_filter: MinFilter::LinearMipmapNearest,
            ..Default::default()
        };
        let desc = settings.sampler_descriptor();
        assert_eq!(desc.min_filter, wgpu::FilterMode::Linear);
        assert_eq!(desc.mipmap_filter, wgpu::FilterMode::Nearest);
        assert!(settings.min_filter.uses_mipmaps());
        assert!(!MinFilter::Nearest.uses_mipmaps());
    }
}
