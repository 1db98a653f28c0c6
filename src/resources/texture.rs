use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use super::load_binary;
use crate::{
    data_structures::texture::{TextureImage, TextureKind},
    device::{RenderDevice, TextureHandle},
    errors::LoadError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureRecord {
    pub handle: TextureHandle,
    pub kind: TextureKind,
}

/// Owns every uploaded texture, keyed by the scene's texture name.
#[derive(Debug)]
pub struct TextureManager {
    base: PathBuf,
    textures: FxHashMap<String, TextureRecord>,
}

impl TextureManager {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            textures: FxHashMap::default(),
        }
    }

    pub fn get_texture(&self, name: &str) -> Option<&TextureRecord> {
        self.textures.get(name)
    }

    /// Device id of the texture, zero when it is not loaded.
    pub fn texture_id(&self, name: &str) -> u32 {
        self.textures.get(name).map_or(0, |t| t.handle.0)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.textures.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub async fn add_texture<D: RenderDevice>(
        &mut self,
        device: &mut D,
        name: &str,
        path: &str,
    ) -> Result<(), LoadError> {
        if self.contains(name) {
            return Ok(());
        }
        let image = self.decode(name, path).await?;
        self.upload(device, name, &image)
    }

    /// Loads six faces, ordered +X, -X, +Y, -Y, +Z, -Z, into one cube map.
    pub async fn add_cube_texture<D: RenderDevice>(
        &mut self,
        device: &mut D,
        name: &str,
        paths: &[String; 6],
    ) -> Result<(), LoadError> {
        if self.contains(name) {
            return Ok(());
        }
        let faces = futures::future::try_join_all(paths.iter().map(|p| self.decode(name, p))).await?;
        let image = TextureImage::cube(faces).map_err(|e| LoadError::Texture {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        self.upload(device, name, &image)
    }

    async fn decode(&self, name: &str, path: &str) -> Result<TextureImage, LoadError> {
        let full_path = self.base.join(path);
        let bytes = load_binary(&full_path).await?;
        let hint = Path::new(path).extension().and_then(|e| e.to_str());
        TextureImage::from_bytes(&bytes, hint).map_err(|e| LoadError::Texture {
            name: name.to_string(),
            reason: format!("{}: {}", path, e),
        })
    }

    fn upload<D: RenderDevice>(
        &mut self,
        device: &mut D,
        name: &str,
        image: &TextureImage,
    ) -> Result<(), LoadError> {
        let handle = device
            .upload_texture(name, image)
            .map_err(|e| LoadError::Texture {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        self.textures.insert(
            name.to_string(),
            TextureRecord {
                handle,
                kind: image.kind,
            },
        );
        Ok(())
    }
}
