//! Flow control and application event loop.
//!
//! A "flow" is a scene that handles input, updates its state and says what to
//! draw each frame. The engine owns the window and GPU [`Context`], forwards
//! events to all flows and renders what they return.
//!
//! # User-facing types
//!
//! - [`GraphicsFlow<S, E>`] is the trait for scenes that handle events and rendering
//! - [`Out<S, E>`] is the output type for async work and context configuration
//!
//! # Lifecycle
//!
//! Each redraw:
//! 1. Apply orbit controls to the camera
//! 2. Call `on_update` on all flows
//! 3. Collect every flow's [`Render`]
//! 4. Render the shadow maps, then the lit scene
//! 5. Present the frame and request the next redraw

use std::{fmt::Debug, iter, pin::Pin, sync::Arc};

use instant::{Duration, Instant};
use wgpu::WasmNotSend;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    context::{Context, InitContext},
    render::{self, Instanced, Render},
    viewport::Viewport,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

///
/// This is the Output Type for every lifecycle hook where the flow can hand
/// async work to the engine, handled according to the platform you're running on.
///
/// `Out::FutEvent` runs every future on its own, without blocking the frame
/// loop; each event is handed back through `on_custom_events` once its future
/// completes.
///
/// `Out::FutFn` resolves futures of state mutations that are applied directly.
///
/// `Out::Configure` can be used to modify the Context, for instance to set the
/// camera, lights or the clear colour.
///
/// `Empty` is the default output used when no eventing/futures need to be handled.
///
pub enum Out<S, E> {
    FutEvent(Vec<EventFuture<E>>),
    FutFn(Vec<Box<dyn Future<Output = Box<dyn FnOnce(&mut S)>>>>),
    Configure(Box<dyn FnOnce(&mut Context)>),
    Empty,
}

/// A future resolving to a custom event. Natively it runs on the runtime's
/// worker threads, so it has to be `Send`.
#[cfg(not(target_arch = "wasm32"))]
pub type EventFuture<E> = Box<dyn Future<Output = E> + Send>;
#[cfg(target_arch = "wasm32")]
pub type EventFuture<E> = Box<dyn Future<Output = E>>;

impl<S, E> Default for Out<S, E> {
    fn default() -> Self {
        Self::Empty
    }
}

/// Trait for implementing a renderable scene.
///
/// # Lifecycle
///
/// 1. `on_init()` is called once when the flow is created; configure the context here
/// 2. `on_window_events()` and `on_device_events()` are called for each winit input event
/// 3. `on_update()` is called every frame
/// 4. `on_custom_events()` is called for events produced by `Out::FutEvent`
/// 5. `on_render()` is called each frame and specifies how to render `self`
pub trait GraphicsFlow<S, E> {
    /// Initialize the flow and configure the context.
    fn on_init(&mut self, ctx: &mut Context, state: &mut S) -> Out<S, E>;

    /// Update state every frame; `dt` is the time since the previous frame.
    fn on_update(&mut self, ctx: &Context, state: &mut S, dt: Duration) -> Out<S, E>;

    /// Handle raw device events.
    fn on_device_events(&mut self, ctx: &Context, state: &mut S, event: &DeviceEvent) -> Out<S, E>;

    /// Handle window events (keyboard, mouse, resizing, etc.).
    fn on_window_events(&mut self, ctx: &Context, state: &mut S, event: &WindowEvent) -> Out<S, E>;

    /// Handle custom application events.
    ///
    /// Returns the event if it was not consumed, allowing it to be passed to
    /// the next flow. Returning `None` means the event was consumed.
    fn on_custom_events(&mut self, ctx: &Context, state: &mut S, event: E) -> Option<E>;

    /// Return renderable objects for this flow.
    fn on_render(&self) -> Render<'_>;
}

impl<State, Event> Debug for dyn GraphicsFlow<State, Event> + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GraphicsFlow")
    }
}

/// A flow constructor takes an [`InitContext`] and asynchronously returns a
/// boxed [`GraphicsFlow`], so flows can upload resources before the first frame.
pub type FlowConstructor<S, E> =
    Box<dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = Box<dyn GraphicsFlow<S, E>>>>>>;

/// Application state bundle: GPU context, app state, and surface status.
#[derive(Debug)]
pub struct AppState<State: 'static> {
    pub(crate) ctx: Context,
    state: State,
    is_surface_configured: bool,
}

impl<State: Default> AppState<State> {
    async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;
        Ok(Self {
            ctx,
            state: State::default(),
            is_surface_configured: false,
        })
    }

    /// Resizes to the window's current inner size.
    fn resize(&mut self) {
        let scale_factor = self.ctx.window.scale_factor();
        let logical = self.ctx.window.inner_size().to_logical::<f64>(scale_factor);
        self.ctx
            .resize(Viewport::from_container(logical.width, logical.height, scale_factor));
        self.is_surface_configured = true;
    }

    fn render<Event>(
        &mut self,
        graphics_flows: &[Box<dyn GraphicsFlow<State, Event>>],
    ) -> Result<(), wgpu::SurfaceError> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let ctx = &self.ctx;
        let mut basics: Vec<Instanced> = Vec::new();
        let mut trans: Vec<Instanced> = Vec::new();
        graphics_flows
            .iter()
            .for_each(|flow| flow.on_render().set_pipelines(&mut basics, &mut trans));
        basics.retain(|instanced| has_instances(instanced));
        trans.retain(|instanced| has_instances(instanced));

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let shadow = &ctx.lights.shadow;
        for (layer, target) in shadow.layer_views.iter().enumerate() {
            if !shadow.enabled[layer] {
                continue;
            }
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: target,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            shadow_pass.set_pipeline(&shadow.pipeline);
            render::draw_shadow_casters(&mut shadow_pass, &shadow.light_bind_groups[layer], &basics);
            render::draw_shadow_casters(&mut shadow_pass, &shadow.light_bind_groups[layer], &trans);
        }

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render::draw_scene(ctx, &mut render_pass, &basics, &trans);
        }

        ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn has_instances(instanced: &Instanced) -> bool {
    if instanced.amount == 0 || instanced.instance.size() == 0 {
        log::warn!("skipping a draw of {} with zero instances", instanced.mesh.name);
        return false;
    }
    true
}

/// Native background work: the runtime flow futures run on and the channel
/// their events come back through.
#[cfg(not(target_arch = "wasm32"))]
struct Background<Event> {
    runtime: tokio::runtime::Runtime,
    events: tokio::sync::mpsc::UnboundedSender<Event>,
    received: tokio::sync::mpsc::UnboundedReceiver<Event>,
}

#[cfg(not(target_arch = "wasm32"))]
impl<Event: Send + 'static> Background<Event> {
    fn new() -> anyhow::Result<Self> {
        let (events, received) = tokio::sync::mpsc::unbounded_channel();
        Ok(Self {
            runtime: tokio::runtime::Runtime::new()?,
            events,
            received,
        })
    }

    /// Runs `future` on a worker thread; its event is delivered between frames.
    fn spawn(&self, future: EventFuture<Event>) {
        let events = self.events.clone();
        self.runtime.spawn(async move {
            let event = Pin::from(future).await;
            if events.send(event).is_err() {
                log::error!("event loop closed before an event was delivered");
            }
        });
    }
}

pub struct App<State: 'static, Event: 'static> {
    #[cfg(not(target_arch = "wasm32"))]
    background: Background<Event>,
    proxy: winit::event_loop::EventLoopProxy<FlowEvent<State, Event>>,
    state: Option<AppState<State>>,
    // Fully initialized flows once they are ready.
    graphics_flows: Vec<Box<dyn GraphicsFlow<State, Event>>>,
    // Taken once the window exists.
    constructors: Option<Vec<FlowConstructor<State, Event>>>,
    last_time: Instant,
}

impl<State, Event> App<State, Event>
where
    State: 'static + Default,
    Event: 'static + WasmNotSend,
{
    fn new(
        event_loop: &EventLoop<FlowEvent<State, Event>>,
        constructors: Vec<FlowConstructor<State, Event>>,
    ) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            background: Background::new()?,
            proxy,
            state: None,
            graphics_flows: Vec::new(),
            constructors: Some(constructors),
            last_time: Instant::now(),
        })
    }

    /// Runs `on_init` of every flow and applies their outputs.
    fn init_flows(&mut self) {
        let Some(app_state) = self.state.as_mut() else {
            return;
        };
        app_state.resize();
        self.graphics_flows.iter_mut().for_each(|flow| {
            let events = flow.on_init(&mut app_state.ctx, &mut app_state.state);
            handle_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &self.background,
                &mut app_state.state,
                &mut app_state.ctx,
                self.proxy.clone(),
                events,
            );
        });
        app_state.ctx.window.request_redraw();
    }
}

pub(crate) enum FlowEvent<State: 'static, Event: 'static> {
    #[allow(dead_code)]
    Initialized {
        state: AppState<State>,
        flows: Vec<Box<dyn GraphicsFlow<State, Event>>>,
    },
    #[allow(dead_code)]
    Mut(Box<dyn FnOnce(&mut State)>),
    #[allow(dead_code)]
    Custom(Event),
    #[allow(dead_code)]
    Exit,
}

impl<State, Event> Debug for FlowEvent<State, Event> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized { state: _, flows } => {
                f.debug_struct("Initialized").field("flows", flows).finish()
            }
            Self::Mut(_) => f.write_str("Mut(|&mut State| -> {...})"),
            Self::Custom(_) => f.write_str("Custom(E)"),
            Self::Exit => f.write_str("Exit"),
        }
    }
}

impl<State: 'static + Default, Event: 'static + WasmNotSend> ApplicationHandler<FlowEvent<State, Event>>
    for App<State, Event>
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(constructors) = self.constructors.take() else {
            // Already initialized; winit resumes again after a suspend.
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("Carousel");

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;
            window_attributes = window_attributes.with_append(false);
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("could not create a window: {}", e);
                event_loop.exit();
                return;
            }
        };

        #[cfg(target_arch = "wasm32")]
        attach_canvas(&window);

        let init_future = async move {
            let app_state = AppState::new(window).await?;
            let flow_futures: Vec<_> = constructors
                .into_iter()
                // Device and Queue are Arcs internally, this only clones the handles
                .map(|constructor| constructor((&app_state.ctx).into()))
                .collect();
            let flows: Vec<_> = futures::future::join_all(flow_futures).await;
            anyhow::Ok((app_state, flows))
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.background.runtime.block_on(init_future) {
                Ok((app_state, flows)) => {
                    self.state = Some(app_state);
                    self.graphics_flows = flows;
                    self.init_flows();
                }
                Err(e) => {
                    log::error!("initialization failed: {:#}", e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match init_future.await {
                    Ok((state, flows)) => {
                        if proxy
                            .send_event(FlowEvent::Initialized { state, flows })
                            .is_err()
                        {
                            log::error!("event loop closed before initialization finished");
                        }
                    }
                    Err(e) => {
                        log::error!("initialization failed: {:#}", e);
                        let _ = proxy.send_event(FlowEvent::Exit);
                    }
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent<State, Event>) {
        match event {
            FlowEvent::Initialized { state, flows } => {
                // This is the message from our wasm `spawn_local`
                self.state = Some(state);
                self.graphics_flows = flows;
                self.init_flows();
            }
            FlowEvent::Custom(custom_event) => {
                if let Some(state) = &mut self.state {
                    dispatch_custom_event(&mut self.graphics_flows, state, custom_event);
                }
            }
            FlowEvent::Mut(fn_once) => {
                if let Some(state) = &mut self.state {
                    fn_once(&mut state.state);
                }
            }
            FlowEvent::Exit => {
                event_loop.exit();
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        self.graphics_flows.iter_mut().for_each(|f| {
            let events = f.on_device_events(&state.ctx, &mut state.state, &event);
            handle_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &self.background,
                &mut state.state,
                &mut state.ctx,
                self.proxy.clone(),
                events,
            );
        });
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.ctx.camera.controller.handle_window_events(&event);

        self.graphics_flows.iter_mut().for_each(|f| {
            let events = f.on_window_events(&state.ctx, &mut state.state, &event);
            handle_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &self.background,
                &mut state.state,
                &mut state.ctx,
                self.proxy.clone(),
                events,
            );
        });

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => state.resize(),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                #[cfg(not(target_arch = "wasm32"))]
                while let Ok(event) = self.background.received.try_recv() {
                    dispatch_custom_event(&mut self.graphics_flows, state, event);
                }

                state.ctx.update_camera();
                self.graphics_flows.iter_mut().for_each(|f| {
                    let events = f.on_update(&state.ctx, &mut state.state, dt);
                    handle_flow_output(
                        #[cfg(not(target_arch = "wasm32"))]
                        &self.background,
                        &mut state.state,
                        &mut state.ctx,
                        self.proxy.clone(),
                        events,
                    );
                });

                match state.render(&self.graphics_flows) {
                    Ok(_) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => state.resize(),
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Appends the window's canvas to `#container`, or to `<body>` without one.
#[cfg(target_arch = "wasm32")]
fn attach_canvas(window: &Window) {
    use winit::platform::web::WindowExtWebSys;

    let Some(canvas) = window.canvas() else {
        log::error!("window has no canvas");
        return;
    };
    let _ = canvas.set_attribute("style", "width: 100%; height: 100%; display: block;");
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        log::error!("no document to attach the canvas to");
        return;
    };
    let parent: Option<web_sys::Element> = document
        .get_element_by_id("container")
        .or_else(|| document.body().map(Into::into));
    match parent {
        Some(parent) => {
            if parent.append_child(&canvas).is_err() {
                log::error!("could not append the canvas");
            }
        }
        None => log::error!("no #container element and no body"),
    }
}

/// Hands every custom event to the flows in order until one consumes it.
fn dispatch_custom_event<State, Event>(
    flows: &mut [Box<dyn GraphicsFlow<State, Event>>],
    state: &mut AppState<State>,
    event: Event,
) {
    let result = flows.iter_mut().fold(Some(event), |event, flow| {
        flow.on_custom_events(&state.ctx, &mut state.state, event?)
    });
    if result.is_some() {
        log::warn!("custom event was not consumed by any flow");
    }
}

fn handle_flow_output<State, Event: 'static + WasmNotSend>(
    #[cfg(not(target_arch = "wasm32"))] background: &Background<Event>,
    state: &mut State,
    ctx: &mut Context,
    proxy: winit::event_loop::EventLoopProxy<FlowEvent<State, Event>>,
    out: Out<State, Event>,
) {
    match out {
        // Each event future is awaited on its own, events arrive in completion order
        Out::FutEvent(futures) => {
            #[cfg(not(target_arch = "wasm32"))]
            futures
                .into_iter()
                .for_each(|future| background.spawn(future));

            #[cfg(target_arch = "wasm32")]
            for future in futures {
                let proxy = proxy.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    let event = Pin::from(future).await;
                    if proxy.send_event(FlowEvent::Custom(event)).is_err() {
                        log::error!("event loop closed before an event was delivered");
                    }
                });
            }
        }
        // Mutate the state if the arch supports blocking, send an event otherwise
        Out::FutFn(futures) => {
            let mutations: Vec<Pin<Box<dyn Future<Output = Box<dyn FnOnce(&mut State)>>>>> =
                futures.into_iter().map(Pin::from).collect();
            let fut = async move { futures::future::join_all(mutations).await };
            #[cfg(not(target_arch = "wasm32"))]
            {
                let _ = &proxy;
                let resolved: Vec<Box<dyn FnOnce(&mut State)>> = background.runtime.block_on(fut);
                resolved.into_iter().for_each(|mutation| mutation(state));
            }

            #[cfg(target_arch = "wasm32")]
            {
                let _ = state;
                wasm_bindgen_futures::spawn_local(async move {
                    let resolved = fut.await;
                    for mutation in resolved {
                        if proxy.send_event(FlowEvent::Mut(mutation)).is_err() {
                            log::error!("event loop closed before all mutations were applied");
                            break;
                        }
                    }
                });
            }
        }
        Out::Configure(f) => f(ctx),
        Out::Empty => (),
    }
}

/// Initializes logging and runs the event loop until the window closes.
pub fn run<State: 'static + Default, Event: 'static + WasmNotSend>(
    constructors: Vec<FlowConstructor<State, Event>>,
) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            eprintln!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<FlowEvent<State, Event>> = EventLoop::with_user_event().build()?;
    let mut app: App<State, Event> = App::new(&event_loop, constructors)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    #[test]
    fn event_futures_complete_in_the_background() {
        let mut background = Background::<u32>::new().unwrap();
        let spawned = std::time::Instant::now();
        background.spawn(Box::new(async {
            tokio::time::sleep(StdDuration::from_millis(200)).await;
            1
        }));
        background.spawn(Box::new(async { 2 }));
        assert!(spawned.elapsed() < StdDuration::from_millis(200));

        assert_eq!(background.received.blocking_recv(), Some(2));
        assert_eq!(background.received.blocking_recv(), Some(1));
    }
}
