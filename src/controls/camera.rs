use cgmath::{InnerSpace, Vector3};
use winit::keyboard::KeyCode;

use crate::{
    data_structures::{
        components::Camera,
        scene::{Scene, System, SystemContext},
    },
    input::KeyEvent,
};

const DIGIT_KEYS: [KeyCode; 10] = [
    KeyCode::Digit0,
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
];

/// Tracks which camera, by insertion index, is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraController {
    pub current: usize,
}

impl CameraController {
    /// Switches to camera `index` if it exists. An out-of-range index is
    /// logged and the current camera stays active.
    pub fn select(&mut self, index: usize, camera_count: usize) -> bool {
        if index >= camera_count {
            log::error!(
                "camera {} does not exist ({} cameras), keeping camera {}",
                index,
                camera_count,
                self.current
            );
            return false;
        }
        self.current = index;
        log::debug!("camera {} active", index);
        true
    }

    /// Digit keys 0-9 select the camera with that index.
    pub fn handle_key(&mut self, event: &KeyEvent, camera_count: usize) -> bool {
        if !event.pressed {
            return false;
        }
        match DIGIT_KEYS.iter().position(|key| *key == event.key) {
            Some(index) => self.select(index, camera_count),
            None => false,
        }
    }
}

fn active_camera<'a>(scene: &'a mut Scene, ctx: &SystemContext<'_>) -> Option<&'a mut Camera> {
    scene
        .get_object_by_index_mut::<Camera>(ctx.active_camera)
        .ok()
        .map(|(_, camera)| camera)
}

/// WASD moves along the view plane, Space and Ctrl move vertically, Shift sprints.
#[derive(Debug, Clone)]
pub struct CameraMoveSystem {
    pub sprint_factor: f32,
}

impl Default for CameraMoveSystem {
    fn default() -> Self {
        Self { sprint_factor: 3.0 }
    }
}

impl System for CameraMoveSystem {
    fn name(&self) -> &'static str {
        "camera_move"
    }

    fn update(&mut self, scene: &mut Scene, ctx: &SystemContext<'_>) {
        let Some(camera) = active_camera(scene, ctx) else {
            return;
        };
        let input = ctx.input;
        let axis = |positive: KeyCode, negative: KeyCode| {
            input.is_held(positive) as i32 as f32 - input.is_held(negative) as i32 as f32
        };
        let forward = axis(KeyCode::KeyW, KeyCode::KeyS);
        let strafe = axis(KeyCode::KeyD, KeyCode::KeyA);
        let rise = axis(KeyCode::Space, KeyCode::ControlLeft);
        if forward == 0.0 && strafe == 0.0 && rise == 0.0 {
            return;
        }

        let up = Vector3::unit_y();
        let front = camera.front.normalize();
        let right = front.cross(up);
        let right = if right.magnitude2() > f32::EPSILON {
            right.normalize()
        } else {
            Vector3::new(0.0, 0.0, 0.0)
        };
        let mut speed = camera.speed * ctx.dt;
        if input.shift_held() {
            speed *= self.sprint_factor;
        }
        camera.position += (front * forward + right * strafe + up * rise) * speed;
    }
}

/// Mouse motion turns the camera while the cursor is locked.
#[derive(Debug, Clone)]
pub struct CameraLookSystem {
    /// Degrees per pixel of mouse motion.
    pub sensitivity: f32,
}

impl Default for CameraLookSystem {
    fn default() -> Self {
        Self { sensitivity: 0.1 }
    }
}

impl System for CameraLookSystem {
    fn name(&self) -> &'static str {
        "camera_look"
    }

    fn update(&mut self, scene: &mut Scene, ctx: &SystemContext<'_>) {
        if !ctx.input.cursor_locked() {
            return;
        }
        let delta = ctx.input.mouse_delta();
        if delta.x == 0.0 && delta.y == 0.0 {
            return;
        }
        let Some(camera) = active_camera(scene, ctx) else {
            return;
        };
        camera.yaw += delta.x * self.sensitivity;
        camera.pitch = (camera.pitch - delta.y * self.sensitivity)
            .clamp(-Camera::MAX_PITCH, Camera::MAX_PITCH);
        camera.update_front();
    }
}

/// Scrolling zooms: each step changes the fov by two degrees.
#[derive(Debug, Clone, Default)]
pub struct CameraFovSystem;

impl System for CameraFovSystem {
    fn name(&self) -> &'static str {
        "camera_fov"
    }

    fn update(&mut self, scene: &mut Scene, ctx: &SystemContext<'_>) {
        let scroll = ctx.input.scroll().y;
        if scroll == 0.0 {
            return;
        }
        if let Some(camera) = active_camera(scene, ctx) {
            camera.adjust_fov(-2.0 * scroll);
        }
    }
}
