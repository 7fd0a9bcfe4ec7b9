//! Render composition and pipeline batching.
//!
//! Flows describe what they want drawn as a [`Render`] tree. The engine
//! flattens the tree into opaque and transparent lists with
//! [`Render::set_pipelines`], draws the opaque list first and blends the
//! transparent list on top. Each [`Instanced`] entry is one material group of
//! one mesh drawn for every instance in its buffer.

use std::ops::Range;

use wgpu::RenderPass;

use crate::{
    context::Context,
    data_structures::model::{DrawModel, DrawShadow, Material, Mesh},
};

/// One instanced draw: a material group of a mesh with its instance buffer.
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub mesh: &'a Mesh,
    pub material: &'a Material,
    pub indices: Range<u32>,
    pub amount: usize,
    pub cast_shadow: bool,
}

impl<'a> Instanced<'a> {
    fn instances(&self) -> Range<u32> {
        0..self.amount as u32
    }
}

/// Specifies how scene objects should be rendered.
///
/// - `None` renders nothing
/// - `Default` / `Defaults` render opaque instanced objects
/// - `Transparent` / `Transparents` render alpha blended instanced objects
/// - `Composed` recursively renders a composition of renders
pub enum Render<'a> {
    None,
    Default(Instanced<'a>),
    Defaults(Vec<Instanced<'a>>),
    Transparent(Instanced<'a>),
    Transparents(Vec<Instanced<'a>>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    pub(crate) fn set_pipelines(self, basics: &mut Vec<Instanced<'a>>, trans: &mut Vec<Instanced<'a>>) {
        match self {
            Render::Default(instanced) => basics.push(instanced),
            Render::Defaults(mut vec) => basics.append(&mut vec),
            Render::Transparent(instanced) => trans.push(instanced),
            Render::Transparents(mut vec) => trans.append(&mut vec),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(basics, trans)),
            Render::None => (),
        }
    }
}

/// Draws opaque then transparent batches with the pipeline each material needs.
pub(crate) fn draw_scene<'a>(
    ctx: &'a Context,
    render_pass: &mut RenderPass<'a>,
    basics: &[Instanced<'a>],
    trans: &[Instanced<'a>],
) {
    for instanced in basics.iter().chain(trans.iter()) {
        render_pass.set_pipeline(ctx.pipelines.for_material(&instanced.material.desc));
        render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
        render_pass.draw_mesh_group_instanced(
            instanced.mesh,
            instanced.material,
            instanced.indices.clone(),
            instanced.instances(),
            &ctx.camera.bind_group,
            &ctx.lights.bind_group,
        );
    }
}

/// Draws every shadow casting batch into the depth target of one light.
pub(crate) fn draw_shadow_casters<'a>(
    render_pass: &mut RenderPass<'a>,
    shadow_bind_group: &'a wgpu::BindGroup,
    instanced: &[Instanced<'a>],
) {
    for instanced in instanced.iter().filter(|instanced| instanced.cast_shadow) {
        render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
        render_pass.draw_mesh_depth_instanced(
            instanced.mesh,
            instanced.indices.clone(),
            instanced.instances(),
            shadow_bind_group,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_composition_batches_nothing() {
        let render = Render::Composed(vec![
            Render::None,
            Render::Defaults(Vec::new()),
            Render::Composed(vec![Render::Transparents(Vec::new())]),
        ]);
        let (mut basics, mut trans) = (Vec::new(), Vec::new());
        render.set_pipelines(&mut basics, &mut trans);
        assert!(basics.is_empty());
        assert!(trans.is_empty());
    }
}
