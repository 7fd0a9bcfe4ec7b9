//! carousel
//!
//! A decorative 3D carousel rendered with `wgpu`, natively and in the browser.
//! The scene is a small instancing renderer plus one flow that builds and
//! animates the carousel.
//!
//! High-level modules
//! - `camera`: perspective camera, orbit controls and the camera uniform
//! - `carousel`: scene construction, animation and the carousel flow
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: scene graph, geometry, materials and GPU models
//! - `flow`: flow lifecycle and the application event loop
//! - `pipelines`: opaque, transparent and shadow pipelines plus the light rig
//! - `resources`: asset loading for textures
//! - `render`: render composition for efficient pipeline reuse
//! - `viewport`: display size bookkeeping for resizes
//!

pub mod camera;
pub mod carousel;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod viewport;

pub use carousel::run;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    run().map_err(|err| JsValue::from_str(&format!("{err:#}")))
}
