//! Engine configuration.

use std::path::{Path, PathBuf};

/// Environment variable that overrides [`EngineConfig::asset_path`].
pub const ASSETS_ENV: &str = "SCENE_NGIN_ASSETS";

/// Copy of the crate's `assets/` made at build time.
pub const BUNDLED_ASSETS: &str = env!("SCENE_NGIN_BUNDLED_ASSETS");

/// Number of light slots declared by the bundled shader.
pub const SHADER_MAX_LIGHTS: usize = 16;

/// Scene loaded when an empty scene name is requested.
pub const EMPTY_SCENE: &str = "EmptyScene";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub asset_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub scene: String,
    pub max_lights: usize,
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub clear_colour: wgpu::Color,
    pub vsync: bool,
    /// Upper bound for one frame's delta time in seconds.
    pub max_delta: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            asset_path: PathBuf::from("./assets"),
            width: 1280,
            height: 720,
            title: "scene-ngin".to_string(),
            scene: "Default".to_string(),
            max_lights: SHADER_MAX_LIGHTS,
            vertex_shader: "vertex_shader.wgsl".to_string(),
            fragment_shader: "fragment_shader.wgsl".to_string(),
            clear_colour: wgpu::Color {
                r: 0.1,
                g: 0.1,
                b: 0.12,
                a: 1.0,
            },
            vsync: true,
            max_delta: 0.1,
        }
    }
}

impl EngineConfig {
    /// Defaults, with the asset root taken from `SCENE_NGIN_ASSETS` when set.
    /// Without the variable, `./assets` is used if present, else the copy
    /// bundled at build time.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        match std::env::var(ASSETS_ENV) {
            Ok(path) if !path.is_empty() => config.asset_path = PathBuf::from(path),
            _ if !config.asset_path.exists() => {
                log::debug!("no ./assets directory, using bundled assets");
                config.asset_path = PathBuf::from(BUNDLED_ASSETS);
            }
            _ => {}
        }
        config
    }

    pub fn with_asset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.asset_path = path.into();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_scene(mut self, scene: impl Into<String>) -> Self {
        self.scene = scene.into();
        self
    }

    /// Clamped to the number of light slots the shader declares.
    pub fn with_max_lights(mut self, max_lights: usize) -> Self {
        if max_lights > SHADER_MAX_LIGHTS {
            log::warn!(
                "max_lights {} exceeds the shader's {} slots, clamping",
                max_lights,
                SHADER_MAX_LIGHTS
            );
        }
        self.max_lights = max_lights.min(SHADER_MAX_LIGHTS);
        self
    }

    pub fn with_shaders(mut self, vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        self.vertex_shader = vertex.into();
        self.fragment_shader = fragment.into();
        self
    }

    pub fn with_clear_colour(mut self, colour: wgpu::Color) -> Self {
        self.clear_colour = colour;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn with_max_delta(mut self, max_delta: f32) -> Self {
        self.max_delta = max_delta;
        self
    }

    pub fn shaders_dir(&self) -> PathBuf {
        self.asset_path.join("shaders")
    }

    pub fn models_dir(&self) -> PathBuf {
        self.asset_path.join("models")
    }

    pub fn textures_dir(&self) -> PathBuf {
        self.asset_path.join("textures")
    }

    pub fn scenes_dir(&self) -> PathBuf {
        self.asset_path.join("scenes")
    }

    /// Path of the scene file for `name`; an empty name maps to the empty scene.
    pub fn scene_path(&self, name: &str) -> PathBuf {
        let name = if name.is_empty() { EMPTY_SCENE } else { name };
        let file = if Path::new(name).extension().is_some() {
            name.to_string()
        } else {
            format!("{name}.txt")
        };
        self.scenes_dir().join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_scene_name_falls_back_to_empty_scene() {
        let config = EngineConfig::default().with_asset_path("/tmp/assets");
        assert_eq!(
            config.scene_path(""),
            PathBuf::from("/tmp/assets/scenes/EmptyScene.txt")
        );
        assert_eq!(
            config.scene_path("Lights.scene"),
            PathBuf::from("/tmp/assets/scenes/Lights.scene")
        );
    }

    #[test]
    fn max_lights_never_exceeds_shader_slots() {
        let config = EngineConfig::default().with_max_lights(64);
        assert_eq!(config.max_lights, SHADER_MAX_LIGHTS);
    }
}
