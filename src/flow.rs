//! The winit application loop.
//!
//! [`run`] opens the window, builds the wgpu backend, initializes the engine
//! and loads the configured scene, then drives one engine frame per redraw
//! until the window asks to close.

use std::sync::Arc;

use anyhow::anyhow;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    config::EngineConfig,
    context::Context,
    device::WgpuDevice,
    engine::Engine,
    errors::SetupError,
    logging::{LoggingConfig, init_logging},
    window::{WindowControl, WindowManager},
};

struct AppState {
    engine: Engine<WgpuDevice>,
    window: WindowManager,
    shown: bool,
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    config: EngineConfig,
    state: Option<AppState>,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: EngineConfig) -> anyhow::Result<Self> {
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            async_runtime,
            config,
            state: None,
            error: None,
        })
    }

    fn start(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<AppState> {
        let window_attributes = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height))
            .with_visible(false);
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .map_err(|e| SetupError::Window(e.to_string()))?,
        );

        let ctx = pollster::block_on(Context::new(window.clone(), self.config.vsync))?;
        let device = WgpuDevice::new(ctx, self.config.clear_colour);
        let mut engine = Engine::new(device, self.config.clone());

        self.async_runtime.block_on(async {
            engine.initialize().await?;
            engine.load_scene(&self.config.scene).await?;
            Ok::<_, anyhow::Error>(())
        })?;

        Ok(AppState {
            engine,
            window: WindowManager::new(window),
            shown: false,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(state) => {
                state.window.request_redraw();
                self.state = Some(state);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let Some(state) = &mut self.state {
            state.engine.input_mut().handle_device_event(&event);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = &mut self.state else {
            return;
        };
        state.engine.input_mut().handle_window_event(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state
                .engine
                .device_mut()
                .resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                if !state.shown {
                    state.window.switch_visibility();
                    state.shown = true;
                }
                if let Err(e) = state.engine.frame(&mut state.window) {
                    log::error!("unable to present frame: {}", e);
                }
                if state.window.should_close() {
                    event_loop.exit();
                } else {
                    state.window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Runs the engine until the window closes. Setup and scene load failures
/// are returned after the event loop exits.
pub fn run(config: EngineConfig) -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config)?;
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(anyhow!("engine stopped: {:#}", e)),
        None => Ok(()),
    }
}
