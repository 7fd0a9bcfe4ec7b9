//! The carousel scene as a [`GraphicsFlow`].
//!
//! [`builder`] assembles the scene once, [`animator`] turns the carousel and
//! bobs the horses every frame. Textures load in the background, arrive in
//! any order and replace white placeholders while the carousel is running.

pub mod animator;
pub mod assets;
pub mod builder;
pub mod horse;

use instant::Duration;
use winit::event::{DeviceEvent, WindowEvent};

use crate::{
    context::{Context, InitContext},
    data_structures::{model::Model, scene::Scene, texture::Texture, texture::TextureId},
    error::CarouselError,
    flow::{self, EventFuture, FlowConstructor, GraphicsFlow, Out},
    render::Render,
    resources,
};

use animator::{Animator, Clock};
use builder::{BuiltScene, CarouselNodes, SceneBuilder};

#[derive(Debug)]
pub enum CarouselEvent {
    TextureLoaded {
        id: TextureId,
        result: Result<Texture, CarouselError>,
    },
}

pub struct CarouselFlow {
    scene: Scene,
    nodes: CarouselNodes,
    model: Model,
    animator: Animator,
    clock: Clock,
}

impl CarouselFlow {
    pub fn new(ctx: &InitContext, built: BuiltScene) -> Self {
        let BuiltScene { scene, nodes } = built;
        log::info!(
            "carousel scene has {} nodes, {} geometries, {} materials",
            scene.graph.len(),
            scene.geometries.len(),
            scene.materials.len()
        );
        let model = Model::new(&ctx.device, &ctx.queue, &scene);
        Self {
            scene,
            nodes,
            model,
            animator: Animator::new(nodes),
            clock: Clock::default(),
        }
    }

    pub fn nodes(&self) -> &CarouselNodes {
        &self.nodes
    }

    /// One future per texture request; each resolves on its own.
    fn texture_loads(&self, ctx: &Context) -> Vec<EventFuture<CarouselEvent>> {
        self.scene
            .textures
            .iter()
            .enumerate()
            .map(|(id, request)| {
                let request = request.clone();
                let device = ctx.device.clone();
                let queue = ctx.queue.clone();
                Box::new(async move {
                    let result = resources::load_texture(&request, &device, &queue).await;
                    CarouselEvent::TextureLoaded {
                        id: TextureId(id),
                        result,
                    }
                }) as EventFuture<CarouselEvent>
            })
            .collect()
    }
}

impl GraphicsFlow<(), CarouselEvent> for CarouselFlow {
    fn on_init(&mut self, ctx: &mut Context, _: &mut ()) -> Out<(), CarouselEvent> {
        ctx.set_camera(&self.scene.camera);
        ctx.set_lights(self.scene.lights);
        log::info!("requesting {} textures", self.scene.textures.len());
        self.clock.start();
        Out::FutEvent(self.texture_loads(ctx))
    }

    fn on_update(&mut self, ctx: &Context, _: &mut (), _: Duration) -> Out<(), CarouselEvent> {
        let t = self.clock.elapsed();
        if let Err(err) = self.animator.apply(&mut self.scene.graph, t) {
            log::error!("could not animate the carousel: {err}");
        }
        self.scene.graph.update_world_transforms();
        self.model.write_instances(&ctx.queue, &self.scene.graph);
        Out::Empty
    }

    fn on_device_events(&mut self, _: &Context, _: &mut (), _: &DeviceEvent) -> Out<(), CarouselEvent> {
        Out::Empty
    }

    fn on_window_events(&mut self, _: &Context, _: &mut (), _: &WindowEvent) -> Out<(), CarouselEvent> {
        Out::Empty
    }

    fn on_custom_events(
        &mut self,
        ctx: &Context,
        _: &mut (),
        event: CarouselEvent,
    ) -> Option<CarouselEvent> {
        match event {
            CarouselEvent::TextureLoaded { id, result: Ok(texture) } => {
                log::info!("texture {} loaded", id.0);
                self.model.install_texture(&ctx.device, &ctx.queue, id, texture);
            }
            CarouselEvent::TextureLoaded { result: Err(err), .. } => {
                log::warn!("{:#}, keeping the placeholder", anyhow::Error::from(err));
            }
        }
        None
    }

    fn on_render(&self) -> Render<'_> {
        self.model.render()
    }
}

/// Builds the carousel and runs it until the window is closed.
pub fn run() -> anyhow::Result<()> {
    let built = SceneBuilder::new().build()?;
    let carousel: FlowConstructor<(), CarouselEvent> = Box::new(move |ctx| {
        Box::pin(async move {
            Box::new(CarouselFlow::new(&ctx, built)) as Box<dyn GraphicsFlow<_, _>>
        })
    });
    flow::run(vec![carousel])
}
