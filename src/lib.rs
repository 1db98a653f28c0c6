//! scene-ngin
//!
//! A small forward renderer for scenes described in plain text. Scenes are
//! parsed into a typed entity store, primitives and grids are expanded into
//! drawable models, and every frame draws opaque models, then transparent
//! models sorted back to front, then the skybox.
//!
//! High-level modules
//! - `config`: engine settings and asset layout
//! - `context`: window surface plus wgpu device and queue
//! - `controls`: camera and model controllers driven by input
//! - `data_structures`: components, meshes, textures and the scene store
//! - `device`: the `RenderDevice` seam and its wgpu implementation
//! - `engine`: scene loading and the per-frame update/render sequence
//! - `flow`: the winit application loop
//! - `render`: uniform caching and the frame draw protocol
//! - `resources`: asset managers, scene parsing and scene resolution
//!

pub mod config;
pub mod context;
pub mod controls;
pub mod data_structures;
pub mod device;
pub mod engine;
pub mod errors;
pub mod flow;
pub mod input;
pub mod logging;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod timer;
pub mod window;

pub use config::EngineConfig;
pub use engine::Engine;
pub use flow::run;
