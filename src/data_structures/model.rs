//! GPU-side meshes, materials and the uploaded scene model.
//!
//! [`Model`] owns everything a [`Scene`](crate::data_structures::scene::Scene)
//! needs on the GPU: one vertex/index buffer pair per geometry, one uniform +
//! bind group per material, the texture table and the instanced
//! [`MeshBatch`]es. The CPU scene stays the source of truth for transforms;
//! [`Model::write_instances`] copies the latest world transforms every frame.

use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        batch::{self, MeshBatch},
        geometry::Geometry,
        material::{MaterialDesc, MaterialId},
        scene::Scene,
        scene_graph::SceneGraph,
        texture::{Texture, TextureId, TextureSettings},
    },
    render::{Instanced, Render},
    resources::texture::material_layout,
};

/// Vertex layout abstraction shared by mesh vertices and instance data.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Uploaded geometry with its material groups.
#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub groups: Vec<(Range<u32>, usize)>,
}

impl Mesh {
    pub fn from_geometry(device: &wgpu::Device, geometry: &Geometry) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", geometry.name)),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", geometry.name)),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            name: geometry.name.clone(),
            vertex_buffer,
            index_buffer,
            num_elements: geometry.indices.len() as u32,
            groups: geometry.draw_groups(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    base_color: [f32; 4],
    uv_transform: [f32; 4],
    metalness: f32,
    roughness: f32,
    flat_shading: u32,
    has_map: u32,
}

impl MaterialUniform {
    pub fn new(desc: &MaterialDesc, settings: &TextureSettings) -> Self {
        Self {
            base_color: desc.color.into(),
            uv_transform: settings.uv_transform(),
            metalness: desc.metalness,
            roughness: desc.roughness,
            flat_shading: desc.flat_shading as u32,
            has_map: desc.map.is_some() as u32,
        }
    }
}

/// Material uniform and its bind group (texture, sampler, uniform).
#[derive(Debug)]
pub struct Material {
    pub desc: MaterialDesc,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        desc: MaterialDesc,
        texture: &Texture,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let uniform = MaterialUniform::new(&desc, &texture.settings);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Material Buffer", desc.name)),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = mk_material_bind_group(device, &desc.name, texture, &buffer, layout);
        Self {
            desc,
            buffer,
            bind_group,
        }
    }

    /// Points the material at a newly loaded texture.
    pub fn set_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture: &Texture,
        layout: &wgpu::BindGroupLayout,
    ) {
        let uniform = MaterialUniform::new(&self.desc, &texture.settings);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[uniform]));
        self.bind_group =
            mk_material_bind_group(device, &self.desc.name, texture, &self.buffer, layout);
    }
}

fn mk_material_bind_group(
    device: &wgpu::Device,
    name: &str,
    texture: &Texture,
    buffer: &wgpu::Buffer,
    layout: &wgpu::BindGroupLayout,
) -> wgpu::BindGroup {
    let fallback;
    let sampler = match &texture.sampler {
        Some(sampler) => sampler,
        None => {
            fallback = device.create_sampler(&texture.settings.sampler_descriptor());
            &fallback
        }
    };
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: buffer.as_entire_binding(),
            },
        ],
        label: Some(name),
    })
}

/// Everything of a [`Scene`] that lives on the GPU.
pub struct Model {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,
    pub batches: Vec<MeshBatch>,
    layout: wgpu::BindGroupLayout,
}

impl Model {
    /// Uploads geometry, materials and instance buffers. Texture slots start
    /// out as white placeholders carrying their requested settings.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene) -> Self {
        let layout = material_layout(device);
        let textures: Vec<Texture> = scene
            .textures
            .iter()
            .map(|request| Texture::placeholder(device, queue, request.settings))
            .collect();
        let white = Texture::placeholder(device, queue, TextureSettings::default());
        let materials = scene
            .materials
            .iter()
            .map(|desc| {
                let texture = desc
                    .map
                    .and_then(|TextureId(id)| textures.get(id))
                    .unwrap_or(&white);
                Material::new(device, desc.clone(), texture, &layout)
            })
            .collect();
        let meshes = scene
            .geometries
            .iter()
            .map(|geometry| Mesh::from_geometry(device, geometry))
            .collect();
        let batches = batch::plan_batches(&scene.graph)
            .into_iter()
            .map(|plan| MeshBatch::new(device, plan, &scene.graph))
            .collect();
        log::info!(
            "uploaded {} meshes, {} materials, {} textures",
            scene.geometries.len(),
            scene.materials.len(),
            scene.textures.len()
        );
        Self {
            meshes,
            materials,
            textures,
            batches,
            layout,
        }
    }

    pub fn write_instances(&self, queue: &wgpu::Queue, graph: &SceneGraph) {
        self.batches
            .iter()
            .for_each(|batch| batch.write_instances(queue, graph));
    }

    /// Replaces a placeholder with a loaded texture and rebinds its materials.
    pub fn install_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        id: TextureId,
        texture: Texture,
    ) {
        let Some(slot) = self.textures.get_mut(id.0) else {
            log::warn!("texture slot {} does not exist", id.0);
            return;
        };
        *slot = texture;
        let texture = &self.textures[id.0];
        for material in self
            .materials
            .iter_mut()
            .filter(|material| material.desc.map == Some(id))
        {
            material.set_texture(device, queue, texture, &self.layout);
        }
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0)
    }

    /// One instanced draw per batch and material group, split by blending.
    pub fn render(&self) -> Render<'_> {
        let mut opaque = Vec::new();
        let mut transparent = Vec::new();
        for batch in &self.batches {
            let Some(mesh) = self.meshes.get(batch.geometry.0) else {
                log::warn!("batch references missing geometry {}", batch.geometry.0);
                continue;
            };
            for (indices, material_index) in &mesh.groups {
                let Some(material) = batch
                    .materials
                    .get(*material_index)
                    .and_then(|id| self.material(*id))
                else {
                    continue;
                };
                let instanced = Instanced {
                    instance: &batch.instance_buffer,
                    mesh,
                    material,
                    indices: indices.clone(),
                    amount: batch.nodes.len(),
                    cast_shadow: batch.cast_shadow,
                };
                if material.desc.transparent {
                    transparent.push(instanced);
                } else {
                    opaque.push(instanced);
                }
            }
        }
        Render::Composed(vec![
            Render::Defaults(opaque),
            Render::Transparents(transparent),
        ])
    }
}

pub trait DrawModel<'a> {
    fn draw_mesh_group_instanced(
        &mut self,
        mesh: &'a Mesh,
        material: &'a Material,
        indices: Range<u32>,
        instances: Range<u32>,
        camera_bind_group: &'a wgpu::BindGroup,
        light_bind_group: &'a wgpu::BindGroup,
    );
}

impl<'a, 'b> DrawModel<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh_group_instanced(
        &mut self,
        mesh: &'b Mesh,
        material: &'b Material,
        indices: Range<u32>,
        instances: Range<u32>,
        camera_bind_group: &'b wgpu::BindGroup,
        light_bind_group: &'b wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, &material.bind_group, &[]);
        self.set_bind_group(1, camera_bind_group, &[]);
        self.set_bind_group(2, light_bind_group, &[]);
        self.draw_indexed(indices, 0, instances);
    }
}

pub trait DrawShadow<'a> {
    fn draw_mesh_depth_instanced(
        &mut self,
        mesh: &'a Mesh,
        indices: Range<u32>,
        instances: Range<u32>,
        shadow_bind_group: &'a wgpu::BindGroup,
    );
}

impl<'a, 'b> DrawShadow<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh_depth_instanced(
        &mut self,
        mesh: &'b Mesh,
        indices: Range<u32>,
        instances: Range<u32>,
        shadow_bind_group: &'b wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, shadow_bind_group, &[]);
        self.draw_indexed(indices, 0, instances);
    }
}
