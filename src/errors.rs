//! Error taxonomy of the engine.
//!
//! Setup failures stop the engine before the run loop starts, load failures
//! abort one scene load, draw failures skip one model for one frame and store
//! errors report lookup misses or duplicate insertions.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors raised while creating the window, the GPU context or the
/// shader program.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("could not create the window: {0}")]
    Window(String),
    #[error("no suitable graphics adapter: {0}")]
    Adapter(String),
    #[error("could not create the graphics device: {0}")]
    Device(String),
    #[error("could not create or configure the surface: {0}")]
    Surface(String),
    #[error("could not read shader source {path:?}: {reason}")]
    ShaderIo { path: PathBuf, reason: String },
    #[error("shader program '{name}' failed to compile: {reason}")]
    ShaderCompile { name: String, reason: String },
    #[error("program id {0} is not a valid program")]
    InvalidProgram(u32),
    #[error("required uniform '{name}' is not declared by the shader")]
    MissingUniform { name: String },
    #[error("no program named '{0}' was created")]
    ProgramNotFound(String),
}

/// Errors that abort a scene load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("scene file line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("mesh '{name}' could not be built: {reason}")]
    Mesh { name: String, reason: String },
    #[error("texture '{name}' could not be built: {reason}")]
    Texture { name: String, reason: String },
    #[error("texture connection '{connection}' targets slot {slot} which is out of range")]
    SlotOutOfRange { slot: usize, connection: String },
    #[error("texture connection '{connection}' targets unknown model '{model}'")]
    ModelNotFound { model: String, connection: String },
    #[error("texture connection '{connection}' references unknown texture '{texture}'")]
    TextureNotFound { texture: String, connection: String },
    #[error("'{name}' has no transform component")]
    MissingTransform { name: String },
    #[error("primitive '{name}' could not be built: {reason}")]
    Primitive { name: String, reason: String },
    #[error("grid '{name}' could not be built: {reason}")]
    Grid { name: String, reason: String },
    #[error("no shader program is active, initialize the engine first")]
    NoProgram,
}

/// A single model could not be drawn this frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DrawError {
    #[error("mesh '{0}' is not loaded")]
    MissingMesh(String),
    #[error("texture '{0}' is not loaded")]
    MissingTexture(String),
    #[error("device rejected the draw: {0}")]
    Device(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("an object of type {type_name} named '{name}' already exists")]
    DuplicateName { type_name: &'static str, name: String },
    #[error("entity {entity} already has a component of type {type_name}")]
    DuplicateComponent { type_name: &'static str, entity: u32 },
    #[error("index {index} is out of range for {type_name} (count {count})")]
    IndexOutOfRange {
        type_name: &'static str,
        index: usize,
        count: usize,
    },
    #[error("no {type_name} named '{name}'")]
    NotFound { type_name: &'static str, name: String },
}

/// Failures reported by a [`crate::device::RenderDevice`] backend.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("shader '{label}' failed to compile: {reason}")]
    Compile { label: String, reason: String },
    #[error("{kind} handle {id} is not known to the device")]
    InvalidHandle { kind: &'static str, id: u32 },
    #[error("upload of '{label}' failed: {reason}")]
    Upload { label: String, reason: String },
    #[error("could not present the frame: {0}")]
    Present(String),
}
