use cgmath::{Deg, EuclideanSpace, InnerSpace, Matrix4, Point3, Rad};
use wgpu::util::DeviceExt;

use crate::{
    data_structures::material::Color,
    pipelines::shadow::{ShadowResources, ShadowSettings},
};

/// Sky/ground ambient term blended by the surface normal's Y component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HemisphereLight {
    pub sky: Color,
    pub ground: Color,
    pub intensity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Point3<f32>,
    pub cast_shadow: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    /// Half-angle of the cone.
    pub angle: Rad<f32>,
    /// Fraction of the cone that fades out towards the edge.
    pub penumbra: f32,
    pub cast_shadow: bool,
}

/// All lights of a scene plus shadow quality settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightRig {
    pub hemisphere: HemisphereLight,
    pub point: PointLight,
    pub spot: SpotLight,
    pub shadow: ShadowSettings,
}

impl Default for LightRig {
    fn default() -> Self {
        Self {
            hemisphere: HemisphereLight {
                sky: Color::WHITE,
                ground: Color::WHITE,
                intensity: 1.0,
            },
            point: PointLight {
                color: Color::WHITE,
                intensity: 0.0,
                position: Point3::new(0.0, 1.0, 0.0),
                cast_shadow: false,
            },
            spot: SpotLight {
                color: Color::WHITE,
                intensity: 0.0,
                position: Point3::new(0.0, 1.0, 0.0),
                target: Point3::origin(),
                angle: Deg(30.0).into(),
                penumbra: 0.0,
                cast_shadow: false,
            },
            shadow: ShadowSettings::default(),
        }
    }
}

impl LightRig {
    /// Light-space view-projection of the point light's orthographic shadow box.
    pub fn point_view_proj(&self) -> Matrix4<f32> {
        let s = &self.shadow;
        crate::camera::OPENGL_TO_WGPU_MATRIX
            * cgmath::ortho(
                -s.ortho_half_extent,
                s.ortho_half_extent,
                -s.ortho_half_extent,
                s.ortho_half_extent,
                s.near,
                s.far,
            )
            * look_at(self.point.position, Point3::origin())
    }

    /// Light-space view-projection of the spot light; the frustum covers the cone.
    pub fn spot_view_proj(&self) -> Matrix4<f32> {
        let s = &self.shadow;
        let fovy = Rad((self.spot.angle.0 * 2.0).min(std::f32::consts::PI - 0.01));
        crate::camera::OPENGL_TO_WGPU_MATRIX
            * cgmath::perspective(fovy, 1.0, s.near, s.far)
            * look_at(self.spot.position, self.spot.target)
    }

    pub fn to_uniform(&self) -> LightUniform {
        let spot_direction = (self.spot.target - self.spot.position).normalize();
        let outer = self.spot.angle.0;
        let inner = outer * (1.0 - self.spot.penumbra.clamp(0.0, 1.0));
        LightUniform {
            sky_color: self.hemisphere.sky.scaled(self.hemisphere.intensity),
            ground_color: self.hemisphere.ground.scaled(self.hemisphere.intensity),
            point_position: self.point.position.to_homogeneous().into(),
            point_color: self.point.color.scaled(self.point.intensity),
            spot_position: self.spot.position.to_homogeneous().into(),
            spot_direction: spot_direction.extend(0.0).into(),
            spot_color: self.spot.color.scaled(self.spot.intensity),
            // smoothstep needs distinct edges, even without penumbra
            spot_cone: [outer.cos(), inner.cos().max(outer.cos() + 1e-4), 0.0, 0.0],
            shadow_params: [
                self.shadow.bias,
                self.shadow.radius / self.shadow.map_size.max(1) as f32,
                self.point.cast_shadow as u32 as f32,
                self.spot.cast_shadow as u32 as f32,
            ],
            point_view_proj: self.point_view_proj().into(),
            spot_view_proj: self.spot_view_proj().into(),
        }
    }
}

/// `look_at_rh` that tolerates a light looking straight down.
fn look_at(eye: Point3<f32>, target: Point3<f32>) -> Matrix4<f32> {
    let direction = (target - eye).normalize();
    let up = if direction.y.abs() > 0.999 {
        cgmath::Vector3::unit_z()
    } else {
        cgmath::Vector3::unit_y()
    };
    Matrix4::look_at_rh(eye, target, up)
}

pub struct LightResources {
    pub rig: LightRig,
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub shadow: ShadowResources,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, rig: LightRig) -> Self {
        let uniform = rig.to_uniform();
        let buffer = mk_buffer(device, uniform);
        let shadow = ShadowResources::new(device, &rig);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer, &shadow);
        Self {
            rig,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
            shadow,
        }
    }

    /// Replaces the rig; the shadow map is rebuilt when its resolution changes.
    pub fn set_rig(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, rig: LightRig) {
        if rig.shadow.map_size != self.rig.shadow.map_size {
            self.shadow = ShadowResources::new(device, &rig);
            self.bind_group =
                mk_bind_group(device, &self.bind_group_layout, &self.buffer, &self.shadow);
        }
        self.rig = rig;
        self.uniform = rig.to_uniform();
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
        self.shadow.write_light_matrices(queue, &rig);
    }
}

impl std::fmt::Debug for LightResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightResources").field("rig", &self.rig).finish()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    sky_color: [f32; 4],
    ground_color: [f32; 4],
    // w is unused; every field is padded to 16 bytes for uniform layout rules
    point_position: [f32; 4],
    point_color: [f32; 4],
    spot_position: [f32; 4],
    spot_direction: [f32; 4],
    spot_color: [f32; 4],
    spot_cone: [f32; 4],
    shadow_params: [f32; 4],
    point_view_proj: [[f32; 4]; 4],
    spot_view_proj: [[f32; 4]; 4],
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

/// Light uniform, shadow map array and its comparison sampler.
pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    sample_type: wgpu::TextureSampleType::Depth,
                    view_dimension: wgpu::TextureViewDimension::D2Array,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
        ],
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
    shadow: &ShadowResources,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: light_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&shadow.array_view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&shadow.sampler),
            },
        ],
        label: Some("light_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::{Transform, Vector4};

    fn rig() -> LightRig {
        let mut rig = LightRig::default();
        rig.point.position = Point3::new(0.0, 15.0, 35.0);
        rig.spot.position = Point3::new(0.0, 30.0, 8.0);
        rig.spot.penumbra = 0.2;
        rig
    }

    #[test]
    fn light_target_projects_to_shadow_map_centre() {
        let rig = rig();
        for view_proj in [rig.point_view_proj(), rig.spot_view_proj()] {
            let clip = view_proj * Vector4::new(0.0, 0.0, 0.0, 1.0);
            assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-4);
            assert_relative_eq!(clip.y / clip.w, 0.0, epsilon = 1e-4);
            let depth = clip.z / clip.w;
            assert!((0.0..=1.0).contains(&depth));
        }
    }

    #[test]
    fn orthographic_box_edge_maps_to_clip_edge() {
        let rig = rig();
        let view = look_at(rig.point.position, Point3::origin());
        let right = view.inverse_transform_vector(cgmath::Vector3::unit_x()).unwrap();
        let edge = Point3::origin() + right * rig.shadow.ortho_half_extent;
        let clip = rig.point_view_proj() * edge.to_homogeneous();
        assert_relative_eq!((clip.x / clip.w).abs(), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn penumbra_narrows_the_inner_cone() {
        let uniform = rig().to_uniform();
        let [outer, inner, _, _] = uniform.spot_cone;
        assert!(inner > outer);
        assert_relative_eq!(outer, Deg(30.0f32).0.to_radians().cos(), epsilon = 1e-6);
    }
}
