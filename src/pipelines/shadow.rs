//! Shadow maps for the point and spot light.
//!
//! Both lights render scene depth into one layer each of a `Depth32Float`
//! array texture. The main pass samples that array with a comparison sampler
//! and a small PCF kernel whose width is [`ShadowSettings::radius`] texels.

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{instance::InstanceRaw, model::{ModelVertex, Vertex}},
    pipelines::light::LightRig,
};

pub const SHADOW_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Layer of the point light in the shadow map array.
pub const POINT_LAYER: u32 = 0;
/// Layer of the spot light in the shadow map array.
pub const SPOT_LAYER: u32 = 1;
const LAYERS: u32 = 2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowSettings {
    /// Width and height of each shadow map layer.
    pub map_size: u32,
    /// Blur radius of the PCF filter in texels.
    pub radius: f32,
    /// Added to the fragment's light-space depth before the comparison.
    pub bias: f32,
    /// Half extent of the point light's orthographic shadow box.
    pub ortho_half_extent: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            map_size: 2048,
            radius: 10.0,
            bias: -0.003,
            ortho_half_extent: 15.0,
            near: 0.5,
            far: 500.0,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct ShadowUniform {
    light_view_proj: [[f32; 4]; 4],
}

pub struct ShadowResources {
    pub texture: wgpu::Texture,
    /// All layers, bound in the main pass.
    pub array_view: wgpu::TextureView,
    /// One render target per light.
    pub layer_views: [wgpu::TextureView; LAYERS as usize],
    pub sampler: wgpu::Sampler,
    light_buffers: [wgpu::Buffer; LAYERS as usize],
    pub light_bind_groups: [wgpu::BindGroup; LAYERS as usize],
    pub pipeline: wgpu::RenderPipeline,
    /// Which layers get rendered at all.
    pub enabled: [bool; LAYERS as usize],
}

impl ShadowResources {
    pub fn new(device: &wgpu::Device, rig: &LightRig) -> Self {
        let size = rig.shadow.map_size.max(1);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Shadow Map"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: LAYERS,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SHADOW_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let array_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Shadow Map Array"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });
        let layer_views = [POINT_LAYER, SPOT_LAYER].map(|layer| {
            texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some("Shadow Map Layer"),
                dimension: Some(wgpu::TextureViewDimension::D2),
                base_array_layer: layer,
                array_layer_count: Some(1),
                ..Default::default()
            })
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("shadow_bind_group_layout"),
        });
        let matrices = [rig.point_view_proj(), rig.spot_view_proj()];
        let light_buffers = matrices.map(|matrix| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Shadow Light Buffer"),
                contents: bytemuck::cast_slice(&[ShadowUniform {
                    light_view_proj: matrix.into(),
                }]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        });
        let light_bind_groups = [&light_buffers[0], &light_buffers[1]].map(|buffer| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
                label: Some("shadow_bind_group"),
            })
        });
        let pipeline = mk_shadow_pipeline(device, &bind_group_layout);

        Self {
            texture,
            array_view,
            layer_views,
            sampler,
            light_buffers,
            light_bind_groups,
            pipeline,
            enabled: [rig.point.cast_shadow, rig.spot.cast_shadow],
        }
    }

    pub fn write_light_matrices(&mut self, queue: &wgpu::Queue, rig: &LightRig) {
        let matrices = [rig.point_view_proj(), rig.spot_view_proj()];
        for (buffer, matrix) in self.light_buffers.iter().zip(matrices) {
            queue.write_buffer(
                buffer,
                0,
                bytemuck::cast_slice(&[ShadowUniform {
                    light_view_proj: matrix.into(),
                }]),
            );
        }
        self.enabled = [rig.point.cast_shadow, rig.spot.cast_shadow];
    }
}

/// Depth-only pipeline; both faces are drawn so open geometry still casts.
fn mk_shadow_pipeline(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Shadow Pipeline Layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Shadow Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shadow.wgsl").into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Shadow Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[ModelVertex::desc(), InstanceRaw::desc()],
            compilation_options: Default::default(),
        },
        fragment: None,
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: SHADOW_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}
