//! Engine data structures.
//!
//! - `components` holds the scene records: models, lights, cameras, primitives, grids, textures
//! - `mesh` is the CPU-side vertex and index data
//! - `scene` is the typed entity store with its system hook
//! - `texture` contains decoded images and the GPU texture wrapper
//! - `transform` places entities in the world

pub mod components;
pub mod mesh;
pub mod scene;
pub mod texture;
pub mod transform;
