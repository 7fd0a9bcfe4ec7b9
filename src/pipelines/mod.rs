//! Render pipelines: the lit scene pipelines and the shadow depth pass.

use crate::data_structures::material::MaterialDesc;

pub mod basic;
pub mod light;
pub mod shadow;
pub mod transparent;

/// The four main-pass variants, chosen per material by blending and sidedness.
#[derive(Debug)]
pub struct Pipelines {
    pub opaque: wgpu::RenderPipeline,
    pub opaque_double: wgpu::RenderPipeline,
    pub transparent: wgpu::RenderPipeline,
    pub transparent_double: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        light_bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let layout = basic::mk_scene_pipeline_layout(
            device,
            camera_bind_group_layout,
            light_bind_group_layout,
        );
        let back = Some(wgpu::Face::Back);
        Self {
            opaque: basic::mk_basic_pipeline(device, config, &layout, back),
            opaque_double: basic::mk_basic_pipeline(device, config, &layout, None),
            transparent: transparent::mk_transparent_pipeline(device, config, &layout, back),
            transparent_double: transparent::mk_transparent_pipeline(device, config, &layout, None),
        }
    }

    pub fn for_material(&self, material: &MaterialDesc) -> &wgpu::RenderPipeline {
        match (material.transparent, material.is_double_sided()) {
            (false, false) => &self.opaque,
            (false, true) => &self.opaque_double,
            (true, false) => &self.transparent,
            (true, true) => &self.transparent_double,
        }
    }
}
