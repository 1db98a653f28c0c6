//! The engine ties the scene store, the asset managers and the renderer to a
//! [`RenderDevice`].
//!
//! ```text
//! initialize() -> load_scene(name) -> frame(window) -> frame(window) -> ...
//! ```

use winit::keyboard::KeyCode;

use crate::{
    config::EngineConfig,
    controls::{
        CameraController, CameraFovSystem, CameraLookSystem, CameraMoveSystem, ModelController,
        ModelMoveSystem,
    },
    data_structures::{
        components::{Camera, Light, Model},
        scene::{Scene, SystemContext},
    },
    device::RenderDevice,
    errors::{DeviceError, LoadError, SetupError},
    input::InputManager,
    render::{FrameStats, Renderer},
    resources::{
        elapsed_ms, load_string,
        loader::{
            load_meshes, load_textures, process_grids, process_primitives,
            process_texture_connections,
        },
        mesh::MeshManager,
        scene_file::parse_scene,
        shader::ShaderManager,
        texture::TextureManager,
    },
    timer::Timer,
    window::WindowControl,
};

/// Name the scene shader program is registered under.
pub const MAIN_PROGRAM: &str = "main";

pub struct Engine<D: RenderDevice> {
    device: D,
    config: EngineConfig,
    scene: Scene,
    renderer: Renderer,
    meshes: MeshManager,
    textures: TextureManager,
    shaders: ShaderManager,
    input: InputManager,
    timer: Timer,
    camera_controller: CameraController,
    model_controller: ModelController,
}

impl<D: RenderDevice> Engine<D> {
    pub fn new(device: D, config: EngineConfig) -> Self {
        Self {
            meshes: MeshManager::new(config.models_dir()),
            textures: TextureManager::new(config.textures_dir()),
            shaders: ShaderManager::new(config.shaders_dir()),
            timer: Timer::new(config.max_delta),
            device,
            config,
            scene: Scene::new(),
            renderer: Renderer::new(),
            input: InputManager::new(),
            camera_controller: CameraController::default(),
            model_controller: ModelController::default(),
        }
    }

    /// Compiles the scene program, resolves its uniforms and caches the light slots.
    pub async fn initialize(&mut self) -> Result<(), SetupError> {
        let start = instant::Instant::now();
        log::debug!("initializing engine");

        let program = self
            .shaders
            .create_program_from_paths(
                &mut self.device,
                MAIN_PROGRAM,
                &self.config.vertex_shader,
                &self.config.fragment_shader,
            )
            .await
            .inspect_err(|e| log::error!("failed to create shader program: {}", e))?;
        self.renderer.set_program(&mut self.device, program)?;
        self.renderer
            .cache_light_uniform_locations(&self.device, self.config.max_lights as i32);

        log::debug!("engine initialized in {:.2} ms", elapsed_ms(start));
        Ok(())
    }

    /// Loads `<scenes>/<name>.txt` into a fresh scene. The current scene is
    /// only replaced if every step succeeds.
    pub async fn load_scene(&mut self, name: &str) -> Result<(), LoadError> {
        if self.renderer.program().is_none() {
            return Err(LoadError::NoProgram);
        }
        let start = instant::Instant::now();
        let path = self.config.scene_path(name);
        log::debug!("loading scene {}", path.display());

        let text = load_string(&path).await?;
        let mut scene = Scene::new();
        parse_scene(&text)
            .and_then(|file| file.populate(&mut scene))
            .inspect_err(|e| log::error!("failed to parse scene '{}': {}", name, e))?;

        load_meshes(&scene, &mut self.meshes, &mut self.device).await?;
        load_textures(&scene, &mut self.textures, &mut self.device).await?;
        process_primitives(&mut scene, &mut self.meshes, &mut self.device)?;
        process_grids(&mut scene, &mut self.meshes, &mut self.device)?;
        process_texture_connections(&mut scene)?;

        scene.register_system(Box::new(CameraMoveSystem::default()));
        scene.register_system(Box::new(CameraLookSystem::default()));
        scene.register_system(Box::new(CameraFovSystem));
        scene.register_system(Box::new(ModelMoveSystem::default()));

        self.scene = scene;
        self.camera_controller = CameraController::default();
        self.model_controller = ModelController::default();
        log::info!(
            "scene '{}' loaded: {} cameras, {} lights, {} models in {:.2} ms",
            name,
            self.scene.object_count::<Camera>(),
            self.scene.object_count::<Light>(),
            self.scene.object_count::<Model>(),
            elapsed_ms(start)
        );
        Ok(())
    }

    /// Applies this frame's key presses: engine bindings, then camera and
    /// model selection.
    pub fn handle_key_events<W: WindowControl>(&mut self, window: &mut W) {
        for event in self.input.consume_key_events() {
            if !event.pressed {
                continue;
            }
            match event.key {
                KeyCode::Escape => window.request_close(),
                KeyCode::KeyP => self.toggle_wireframe(),
                KeyCode::KeyC => self.toggle_cursor_lock(window),
                _ => {}
            }
            let cameras = self.scene.object_count::<Camera>();
            self.camera_controller.handle_key(&event, cameras);
            let models = self.scene.object_count::<Model>();
            self.model_controller.handle_key(&event, models);
        }
    }

    /// Handles input and runs the scene systems for a step of `dt` seconds.
    pub fn advance<W: WindowControl>(&mut self, window: &mut W, dt: f32) {
        self.handle_key_events(window);
        let ctx = SystemContext {
            dt,
            input: &self.input,
            active_camera: self.camera_controller.current,
            active_model: self.model_controller.current,
        };
        self.scene.update_systems(&ctx);
    }

    /// Renders the scene without presenting. `None` means no active camera
    /// exists: the target is still cleared but nothing is drawn.
    pub fn render(&mut self, aspect: f32) -> Option<FrameStats> {
        self.renderer
            .render_frame(
                &mut self.device,
                &mut self.scene,
                &self.meshes,
                &self.textures,
                self.camera_controller.current,
                aspect,
            )
            .ok()
    }

    /// One iteration of the main loop: tick, update, render, present.
    /// Without an active camera the cleared frame is still presented and
    /// `Ok(None)` is returned.
    pub fn frame<W: WindowControl>(
        &mut self,
        window: &mut W,
    ) -> Result<Option<FrameStats>, DeviceError> {
        let dt = self.timer.tick();
        self.advance(window, dt);
        let stats = self.render(window.aspect());
        let presented = self.device.present();
        self.input.end_frame();
        presented.map(|_| stats)
    }

    pub fn toggle_wireframe(&mut self) {
        let enabled = !self.device.wireframe();
        self.device.set_wireframe(enabled);
        log::info!("wireframe {}", if enabled { "on" } else { "off" });
    }

    pub fn toggle_cursor_lock<W: WindowControl>(&mut self, window: &mut W) {
        let locked = window.switch_cursor_lock();
        self.input.set_cursor_locked(locked);
    }

    pub fn active_camera(&self) -> Option<&Camera> {
        self.scene
            .get_object_by_index::<Camera>(self.camera_controller.current)
            .ok()
            .map(|(_, camera)| camera)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn meshes(&self) -> &MeshManager {
        &self.meshes
    }

    pub fn textures(&self) -> &TextureManager {
        &self.textures
    }

    pub fn input_mut(&mut self) -> &mut InputManager {
        &mut self.input
    }

    pub fn camera_controller(&self) -> CameraController {
        self.camera_controller
    }

    pub fn model_controller(&self) -> ModelController {
        self.model_controller
    }
}
