use std::sync::Arc;

use winit::window::{CursorGrabMode, Window};

/// What the engine needs from a window.
pub trait WindowControl {
    fn request_close(&mut self);

    fn should_close(&self) -> bool;

    /// Toggles cursor lock and returns the new state.
    fn switch_cursor_lock(&mut self) -> bool;

    fn switch_visibility(&mut self);

    fn aspect(&self) -> f32;
}

#[derive(Debug)]
pub struct WindowManager {
    window: Arc<Window>,
    close_requested: bool,
    cursor_locked: bool,
}

impl WindowManager {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            close_requested: false,
            cursor_locked: false,
        }
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    pub fn cursor_locked(&self) -> bool {
        self.cursor_locked
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

impl WindowControl for WindowManager {
    fn request_close(&mut self) {
        log::debug!("close requested");
        self.close_requested = true;
    }

    fn should_close(&self) -> bool {
        self.close_requested
    }

    fn switch_cursor_lock(&mut self) -> bool {
        let lock = !self.cursor_locked;
        let result = if lock {
            // not every platform supports Locked, Confined is the closest fallback
            self.window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined))
        } else {
            self.window.set_cursor_grab(CursorGrabMode::None)
        };
        match result {
            Ok(()) => {
                self.window.set_cursor_visible(!lock);
                self.cursor_locked = lock;
            }
            Err(e) => log::warn!("could not change cursor grab: {}", e),
        }
        self.cursor_locked
    }

    fn switch_visibility(&mut self) {
        let visible = self.window.is_visible().unwrap_or(false);
        self.window.set_visible(!visible);
    }

    fn aspect(&self) -> f32 {
        let size = self.window.inner_size();
        if size.height == 0 {
            1.0
        } else {
            size.width as f32 / size.height as f32
        }
    }
}
