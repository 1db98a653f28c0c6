//! Frame-scoped keyboard, mouse and scroll state fed from winit events.
//!
//! Discrete key presses are queued as [`KeyEvent`]s and handed out once via
//! [`InputManager::consume_key_events`]. Whatever is still queued when
//! [`InputManager::end_frame`] runs is dropped.

use cgmath::Vector2;
use rustc_hash::FxHashSet;
use winit::{
    event::{DeviceEvent, ElementState, MouseScrollDelta, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub pressed: bool,
    /// Whether a shift key was held when the event arrived.
    pub shift: bool,
}

#[derive(Debug, Clone)]
pub struct InputManager {
    held: FxHashSet<KeyCode>,
    events: Vec<KeyEvent>,
    mouse_delta: Vector2<f32>,
    scroll: Vector2<f32>,
    cursor_locked: bool,
}

impl Default for InputManager {
    fn default() -> Self {
        Self {
            held: FxHashSet::default(),
            events: Vec::new(),
            mouse_delta: Vector2::new(0.0, 0.0),
            scroll: Vector2::new(0.0, 0.0),
            cursor_locked: false,
        }
    }
}

impl InputManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    self.handle_key(key, event.state, event.repeat);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => self.handle_scroll(*delta),
            WindowEvent::Focused(false) => self.held.clear(),
            _ => {}
        }
    }

    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            self.mouse_delta += Vector2::new(*dx as f32, *dy as f32);
        }
    }

    /// Records a key transition. Auto-repeats update nothing.
    pub fn handle_key(&mut self, key: KeyCode, state: ElementState, repeat: bool) {
        if repeat {
            return;
        }
        let pressed = state.is_pressed();
        if pressed {
            self.held.insert(key);
        } else {
            self.held.remove(&key);
        }
        self.events.push(KeyEvent {
            key,
            pressed,
            shift: self.shift_held(),
        });
    }

    pub fn handle_scroll(&mut self, delta: MouseScrollDelta) {
        match delta {
            MouseScrollDelta::LineDelta(x, y) => self.scroll += Vector2::new(x, y),
            // pixel deltas from touchpads are much larger than line steps
            MouseScrollDelta::PixelDelta(pos) => {
                self.scroll += Vector2::new(pos.x as f32, pos.y as f32) * 0.1
            }
        }
    }

    pub fn is_held(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    pub fn shift_held(&self) -> bool {
        self.is_held(KeyCode::ShiftLeft) || self.is_held(KeyCode::ShiftRight)
    }

    /// Mirrors the window's cursor lock so systems can gate mouse look on it.
    pub fn set_cursor_locked(&mut self, locked: bool) {
        self.cursor_locked = locked;
    }

    pub fn cursor_locked(&self) -> bool {
        self.cursor_locked
    }

    pub fn mouse_delta(&self) -> Vector2<f32> {
        self.mouse_delta
    }

    /// Scroll accumulated this frame, without consuming it.
    pub fn scroll(&self) -> Vector2<f32> {
        self.scroll
    }

    pub fn consume_key_events(&mut self) -> Vec<KeyEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn consume_scroll(&mut self) -> Vector2<f32> {
        std::mem::replace(&mut self.scroll, Vector2::new(0.0, 0.0))
    }

    /// Drops unconsumed events and resets per-frame deltas. Held keys persist.
    pub fn end_frame(&mut self) {
        if !self.events.is_empty() {
            log::trace!("dropping {} unconsumed key events", self.events.len());
        }
        self.events.clear();
        self.mouse_delta = Vector2::new(0.0, 0.0);
        self.scroll = Vector2::new(0.0, 0.0);
    }
}
