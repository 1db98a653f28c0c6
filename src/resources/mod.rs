//! Loading of meshes, textures, shaders and scene files from the asset tree,
//! and the resolution of declarative scene records into drawable models.

use std::path::Path;

use crate::errors::LoadError;

pub mod geometry;
pub mod loader;
pub mod mesh;
pub mod scene_file;
pub mod shader;
pub mod texture;

pub async fn load_string(path: &Path) -> Result<String, LoadError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
}

pub async fn load_binary(path: &Path) -> Result<Vec<u8>, LoadError> {
    tokio::fs::read(path).await.map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Milliseconds since `start`, for the start/finish debug logs of load steps.
pub(crate) fn elapsed_ms(start: instant::Instant) -> f32 {
    start.elapsed().as_secs_f32() * 1000.0
}
