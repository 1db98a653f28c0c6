//! Per-frame draw protocol.
//!
//! [`Renderer`] owns the table of uniform locations resolved when a program is
//! set, the per-slot light locations, and the frame sequence:
//!
//! 1. clear colour and depth
//! 2. push camera uniforms
//! 3. push light uniforms
//! 4. draw opaque models in store order
//! 5. sort transparent models back to front and draw them
//! 6. draw the model named `skybox` with front-face culling and depth writes off
//!
//! A model whose mesh or texture is missing is logged and skipped; the rest of
//! the frame still renders. A missing active camera skips the whole frame.

use cgmath::{InnerSpace, Matrix4, Vector3, Vector4};

use crate::{
    data_structures::{
        components::{Camera, Light, Model, NUM_TEXTURES, SKYBOX_NAME},
        scene::{Entity, Scene},
        texture::TextureKind,
        transform::TransformComponent,
    },
    device::{
        CullFace, ProgramId, RenderDevice, SKYBOX_TEXTURE_UNIT, TextureHandle, UniformLocation,
        UniformValue,
    },
    errors::{DrawError, SetupError, StoreError},
    resources::{mesh::MeshManager, texture::TextureManager},
};

/// Sampler uniforms of the four 2D texture slots, bound to units 0..3.
pub const TEXTURE_SAMPLERS: [&str; NUM_TEXTURES] = [
    "textSampler2D_00",
    "textSampler2D_01",
    "textSampler2D_02",
    "textSampler2D_03",
];

/// Uniform locations the renderer writes every frame.
#[derive(Debug, Clone, Copy)]
pub struct UniformLocations {
    pub eye: UniformLocation,
    pub model: UniformLocation,
    pub view: UniformLocation,
    pub projection: UniformLocation,
    pub model_inverse_transpose: UniformLocation,
    pub colour_mode: UniformLocation,
    pub has_vertex_colour: UniformLocation,
    pub colour_override: UniformLocation,
    pub specular: UniformLocation,
    pub y_min_max: UniformLocation,
    pub seed: UniformLocation,
    pub lighted: UniformLocation,
    pub use_textures: UniformLocation,
    pub tex_mix_ratios: UniformLocation,
    pub is_skybox: UniformLocation,
    pub skybox_texture: UniformLocation,
    pub light_count: UniformLocation,
    pub ambient_light: UniformLocation,
}

impl UniformLocations {
    fn resolve<D: RenderDevice>(device: &D, program: ProgramId) -> Result<Self, SetupError> {
        let require = |name: &str| {
            device.uniform_location(program, name).ok_or_else(|| {
                log::error!("program {} has no uniform '{}'", program.0, name);
                SetupError::MissingUniform {
                    name: name.to_string(),
                }
            })
        };
        Ok(Self {
            eye: require("eyePos")?,
            model: require("mModel")?,
            view: require("mView")?,
            projection: require("mProj")?,
            model_inverse_transpose: require("mModel_InverseTranspose")?,
            colour_mode: require("colourMode")?,
            has_vertex_colour: require("hasVertexColour")?,
            colour_override: require("colourOverride")?,
            specular: require("vertSpecular")?,
            y_min_max: require("yMin_yMax")?,
            seed: require("seed")?,
            lighted: require("bLighted")?,
            use_textures: require("bUseTextures")?,
            tex_mix_ratios: require("texMixRatios")?,
            is_skybox: require("bIsSkybox")?,
            skybox_texture: require("skyboxCubeTexture")?,
            light_count: require("lightCount")?,
            ambient_light: require("ambientLight")?,
        })
    }
}

/// Locations of one `theLights[i]` slot. Fields the shader optimised away stay `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LightLocations {
    pub position: Option<UniformLocation>,
    pub diffuse: Option<UniformLocation>,
    pub attenuation: Option<UniformLocation>,
    pub direction: Option<UniformLocation>,
    pub param1: Option<UniformLocation>,
    pub param2: Option<UniformLocation>,
}

/// What one call to [`Renderer::render_frame`] drew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub opaque: usize,
    pub transparent: usize,
    pub skybox: usize,
    pub skipped: usize,
}

/// Deterministic colour-ish triple for a model name: bytes are summed
/// round-robin into r, g and b, then each sum is scaled by 1/255 and
/// wrapped into `[0, 1)`.
pub fn seed_from_name(name: &str) -> Vector3<f32> {
    let mut sums = [0.0f32; 3];
    for (i, byte) in name.bytes().enumerate() {
        sums[i % 3] += byte as f32;
    }
    let wrap = |sum: f32| (sum / 255.0) % 1.0;
    Vector3::new(wrap(sums[0]), wrap(sums[1]), wrap(sums[2]))
}

/// Orders `items` farthest-from-`eye` first. Equal distances keep their
/// input order.
pub fn sort_transparent<T>(
    items: &mut [T],
    eye: Vector3<f32>,
    position: impl Fn(&T) -> Vector3<f32>,
) {
    let dist_sq = |item: &T| (position(item) - eye).magnitude2();
    items.sort_by(|a, b| dist_sq(b).total_cmp(&dist_sq(a)));
}

/// Light uniforms are four-component vectors; this packs one light the way
/// the shader unpacks it.
pub fn pack_light(light: &Light) -> [Vector4<f32>; 6] {
    [
        light.position.extend(1.0),
        light.diffuse,
        light.attenuation,
        light.direction.extend(1.0),
        Vector4::new(
            light.kind as i32 as f32,
            light.param1.x,
            light.param1.y,
            0.0,
        ),
        Vector4::new(if light.enabled { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0),
    ]
}

#[derive(Debug, Default)]
pub struct Renderer {
    program: Option<ProgramId>,
    locations: Option<UniformLocations>,
    lights: Vec<LightLocations>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn program(&self) -> Option<ProgramId> {
        self.program
    }

    pub fn locations(&self) -> Option<&UniformLocations> {
        self.locations.as_ref()
    }

    /// Number of light slots currently cached.
    pub fn max_lights(&self) -> usize {
        self.lights.len()
    }

    /// Activates `program` and resolves every uniform the frame needs.
    ///
    /// Fails on an invalid program or if any required uniform is absent; on
    /// failure the renderer keeps no program and draws nothing.
    pub fn set_program<D: RenderDevice>(
        &mut self,
        device: &mut D,
        program: ProgramId,
    ) -> Result<(), SetupError> {
        self.program = None;
        self.locations = None;
        self.lights.clear();

        if !program.is_valid() {
            log::error!("cannot set program 0");
            return Err(SetupError::InvalidProgram(program.0));
        }
        device.use_program(program).map_err(|e| {
            log::error!("failed to use program {}: {}", program.0, e);
            SetupError::InvalidProgram(program.0)
        })?;

        for (unit, name) in TEXTURE_SAMPLERS.iter().enumerate() {
            if let Some(location) = device.uniform_location(program, name) {
                device.set_uniform(location, UniformValue::Int(unit as i32));
            }
        }

        let locations = UniformLocations::resolve(device, program)?;
        device.set_uniform(
            locations.skybox_texture,
            UniformValue::Int(SKYBOX_TEXTURE_UNIT as i32),
        );
        device.set_uniform(
            locations.ambient_light,
            UniformValue::vec4(Vector4::new(1.0, 1.0, 1.0, 1.0)),
        );

        self.program = Some(program);
        self.locations = Some(locations);
        log::debug!("program {} set and uniforms located", program.0);
        Ok(())
    }

    /// Resolves `theLights[i].*` for `max_lights` slots. Zero or less clears the cache.
    pub fn cache_light_uniform_locations<D: RenderDevice>(&mut self, device: &D, max_lights: i32) {
        self.lights.clear();
        if max_lights <= 0 {
            return;
        }
        let Some(program) = self.program else {
            log::warn!("caching light uniforms without a program, all slots stay empty");
            self.lights = vec![LightLocations::default(); max_lights as usize];
            return;
        };
        self.lights = (0..max_lights)
            .map(|i| {
                let field = |name: &str| {
                    device.uniform_location(program, &format!("theLights[{}].{}", i, name))
                };
                LightLocations {
                    position: field("position"),
                    diffuse: field("diffuse"),
                    attenuation: field("attenuation"),
                    direction: field("direction"),
                    param1: field("param1"),
                    param2: field("param2"),
                }
            })
            .collect();
    }

    /// Packs `lights` into the cached slots in order. Lights beyond the cache
    /// are dropped; slots beyond the live lights get `param2` zeroed so they
    /// read as disabled. `lightCount` receives the full light count.
    pub fn update_light_uniforms<'a, D: RenderDevice>(
        &self,
        device: &mut D,
        lights: impl IntoIterator<Item = &'a Light>,
    ) {
        let mut count = 0usize;
        for (i, light) in lights.into_iter().enumerate() {
            count += 1;
            let Some(slot) = self.lights.get(i) else {
                continue;
            };
            let packed = pack_light(light);
            let fields = [
                slot.position,
                slot.diffuse,
                slot.attenuation,
                slot.direction,
                slot.param1,
                slot.param2,
            ];
            for (location, value) in fields.into_iter().zip(packed) {
                if let Some(location) = location {
                    device.set_uniform(location, UniformValue::vec4(value));
                }
            }
        }

        for slot in self.lights.iter().skip(count) {
            if let Some(location) = slot.param2 {
                device.set_uniform(location, UniformValue::Vec4([0.0; 4]));
            }
        }

        if let Some(locations) = &self.locations {
            device.set_uniform(locations.light_count, UniformValue::Int(count as i32));
        }
    }

    pub fn update_camera_uniforms<D: RenderDevice>(
        &self,
        device: &mut D,
        eye: Vector3<f32>,
        view: Matrix4<f32>,
        projection: Matrix4<f32>,
    ) {
        let Some(locations) = &self.locations else {
            return;
        };
        device.set_uniform(locations.eye, UniformValue::vec3(eye));
        device.set_uniform(locations.view, UniformValue::mat4(view));
        device.set_uniform(locations.projection, UniformValue::mat4(projection));
    }

    /// Runs one frame against the camera at `camera_index`.
    pub fn render_frame<D: RenderDevice>(
        &self,
        device: &mut D,
        scene: &mut Scene,
        meshes: &MeshManager,
        textures: &TextureManager,
        camera_index: usize,
        aspect: f32,
    ) -> Result<FrameStats, StoreError> {
        device.clear();

        let camera: Camera = match scene.get_object_by_index::<Camera>(camera_index) {
            Ok((_, camera)) => camera.clone(),
            Err(e) => {
                log::error!("no active camera, skipping frame: {}", e);
                return Err(e);
            }
        };
        let mut stats = FrameStats::default();
        if self.locations.is_none() {
            log::error!("no program set, nothing to draw");
            return Ok(stats);
        }

        let eye = camera.position;
        self.update_camera_uniforms(device, eye, camera.view(), camera.projection(aspect));
        self.update_light_uniforms(device, scene.objects::<Light>().map(|(_, _, light)| light));

        let mut transparent: Vec<(Entity, &str, &Model, TransformComponent)> = Vec::new();
        for (entity, name, model) in scene.objects::<Model>() {
            if name == SKYBOX_NAME {
                continue;
            }
            let transform = scene
                .get_component::<TransformComponent>(entity)
                .copied()
                .unwrap_or_default();
            if model.is_transparent() {
                transparent.push((entity, name, model, transform));
                continue;
            }
            match self.draw_model(device, meshes, textures, name, model, &transform) {
                Ok(true) => stats.opaque += 1,
                Ok(false) => {}
                Err(e) => {
                    log::error!("skipping model '{}': {}", name, e);
                    stats.skipped += 1;
                }
            }
        }

        sort_transparent(&mut transparent, eye, |(_, _, _, t)| t.position);
        for (_, name, model, transform) in &transparent {
            match self.draw_model(device, meshes, textures, name, model, transform) {
                Ok(true) => stats.transparent += 1,
                Ok(false) => {}
                Err(e) => {
                    log::error!("skipping model '{}': {}", name, e);
                    stats.skipped += 1;
                }
            }
        }

        match self.draw_skybox(device, scene, meshes, textures, eye) {
            Ok(true) => stats.skybox += 1,
            Ok(false) => {}
            Err(e) => {
                log::error!("skipping skybox: {}", e);
                stats.skipped += 1;
            }
        }
        Ok(stats)
    }

    /// Draws the `skybox` model centred on `eye`. Culling and depth writes are
    /// restored to their previous values afterwards. Returns whether a
    /// skybox was drawn.
    pub fn draw_skybox<D: RenderDevice>(
        &self,
        device: &mut D,
        scene: &mut Scene,
        meshes: &MeshManager,
        textures: &TextureManager,
        eye: Vector3<f32>,
    ) -> Result<bool, DrawError> {
        let Some(locations) = &self.locations else {
            return Ok(false);
        };
        let Some(entity) = scene.entity_by_name::<Model>(SKYBOX_NAME) else {
            return Ok(false);
        };
        let transform = match scene.get_component_mut::<TransformComponent>(entity) {
            Some(transform) => {
                transform.position = eye;
                *transform
            }
            None => TransformComponent::at(eye),
        };
        let Some(model) = scene.get_object_by_name::<Model>(SKYBOX_NAME) else {
            return Ok(false);
        };

        let previous_cull = device.cull_face();
        let previous_depth_write = device.depth_write();

        device.set_uniform(locations.is_skybox, UniformValue::bool(true));
        device.set_cull_face(CullFace::Front);
        device.set_depth_write(false);

        let result = self.draw_model(device, meshes, textures, SKYBOX_NAME, model, &transform);

        device.set_cull_face(previous_cull);
        device.set_depth_write(previous_depth_write);
        device.set_uniform(locations.is_skybox, UniformValue::bool(false));

        result
    }

    /// Pushes the per-model uniforms and issues the draw. Invisible models
    /// return `Ok(false)` without touching the device.
    pub fn draw_model<D: RenderDevice>(
        &self,
        device: &mut D,
        meshes: &MeshManager,
        textures: &TextureManager,
        name: &str,
        model: &Model,
        transform: &TransformComponent,
    ) -> Result<bool, DrawError> {
        let Some(locations) = &self.locations else {
            return Ok(false);
        };
        if !model.visible {
            return Ok(false);
        }
        let mesh = meshes
            .get_mesh(&model.mesh)
            .ok_or_else(|| DrawError::MissingMesh(model.mesh.clone()))?;

        let mut bindings: Vec<(u32, TextureHandle)> = Vec::new();
        if model.use_textures {
            for (slot, texture_name) in model.texture_names.iter().enumerate() {
                if texture_name.is_empty() {
                    continue;
                }
                let texture = textures
                    .get_texture(texture_name)
                    .ok_or_else(|| DrawError::MissingTexture(texture_name.clone()))?;
                let unit = match texture.kind {
                    TextureKind::D2 => slot as u32,
                    TextureKind::Cube => SKYBOX_TEXTURE_UNIT,
                };
                bindings.push((unit, texture.handle));
            }
        }

        device.set_uniform(locations.model, UniformValue::mat4(transform.to_matrix()));
        device.set_uniform(
            locations.model_inverse_transpose,
            UniformValue::mat4(transform.normal_matrix()),
        );
        device.set_uniform(locations.specular, UniformValue::vec4(model.specular));
        device.set_uniform(
            locations.colour_mode,
            UniformValue::Int(model.colour_mode as i32),
        );
        device.set_uniform(locations.colour_override, UniformValue::vec4(model.colour));
        device.set_uniform(
            locations.has_vertex_colour,
            UniformValue::bool(mesh.has_colours),
        );
        device.set_uniform(
            locations.y_min_max,
            UniformValue::Vec2([mesh.min_y, mesh.max_y]),
        );
        device.set_uniform(locations.seed, UniformValue::vec3(seed_from_name(name)));
        device.set_uniform(locations.use_textures, UniformValue::bool(model.use_textures));
        if model.use_textures {
            device.set_uniform(locations.tex_mix_ratios, UniformValue::Vec4(model.texture_mix));
            for (unit, handle) in bindings {
                device.bind_texture(unit, handle);
            }
        }
        device.set_uniform(locations.lighted, UniformValue::bool(model.lighted));

        let transparent = model.is_transparent();
        let previous_depth_write = device.depth_write();
        if transparent {
            device.set_depth_write(false);
        }
        let drawn = device.draw_indexed(mesh.handle);
        if transparent {
            device.set_depth_write(previous_depth_write);
        }
        drawn.map_err(|e| DrawError::Device(e.to_string()))?;
        Ok(true)
    }
}
