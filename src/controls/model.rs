use cgmath::Vector3;
use winit::keyboard::KeyCode;

use crate::{
    data_structures::{
        components::Model,
        scene::{Scene, System, SystemContext},
        transform::TransformComponent,
    },
    input::KeyEvent,
};

/// Tracks which model, by insertion index, the move keys act on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelController {
    pub current: usize,
}

impl ModelController {
    /// `N` steps back through the models, `Shift+N` forward. Both wrap.
    pub fn handle_key(&mut self, event: &KeyEvent, model_count: usize) -> bool {
        if !event.pressed || event.key != KeyCode::KeyN || model_count == 0 {
            return false;
        }
        let current = self.current.min(model_count - 1);
        self.current = if event.shift {
            (current + 1) % model_count
        } else {
            (current + model_count - 1) % model_count
        };
        log::debug!("model {} active", self.current);
        true
    }
}

/// Arrow keys move the active model in the XZ plane, PageUp/PageDown along Y.
#[derive(Debug, Clone)]
pub struct ModelMoveSystem {
    /// Units per second.
    pub speed: f32,
}

impl Default for ModelMoveSystem {
    fn default() -> Self {
        Self { speed: 2.0 }
    }
}

impl System for ModelMoveSystem {
    fn name(&self) -> &'static str {
        "model_move"
    }

    fn update(&mut self, scene: &mut Scene, ctx: &SystemContext<'_>) {
        let input = ctx.input;
        let axis = |positive: KeyCode, negative: KeyCode| {
            input.is_held(positive) as i32 as f32 - input.is_held(negative) as i32 as f32
        };
        let direction = Vector3::new(
            axis(KeyCode::ArrowRight, KeyCode::ArrowLeft),
            axis(KeyCode::PageUp, KeyCode::PageDown),
            axis(KeyCode::ArrowDown, KeyCode::ArrowUp),
        );
        if direction == Vector3::new(0.0, 0.0, 0.0) {
            return;
        }
        let Ok((entity, _)) = scene.get_object_by_index::<Model>(ctx.active_model) else {
            return;
        };
        if let Some(transform) = scene.get_component_mut::<TransformComponent>(entity) {
            transform.position += direction * self.speed * ctx.dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::InputManager;
    use winit::event::ElementState;

    fn n(shift: bool) -> KeyEvent {
        KeyEvent {
            key: KeyCode::KeyN,
            pressed: true,
            shift,
        }
    }

    #[test]
    fn n_cycles_with_wrap() {
        let mut controller = ModelController::default();
        assert!(controller.handle_key(&n(false), 3));
        assert_eq!(controller.current, 2);
        assert!(controller.handle_key(&n(true), 3));
        assert!(controller.handle_key(&n(true), 3));
        assert_eq!(controller.current, 1);
        assert!(!controller.handle_key(&n(true), 0));
    }

    #[test]
    fn arrows_move_the_active_model() {
        let mut scene = Scene::new();
        for name in ["a", "b"] {
            let entity = scene.add_object(name, Model::with_mesh("m")).unwrap();
            scene
                .add_component(entity, TransformComponent::default())
                .unwrap();
        }
        let mut input = InputManager::new();
        input.handle_key(KeyCode::ArrowRight, ElementState::Pressed, false);
        let ctx = SystemContext {
            dt: 0.5,
            input: &input,
            active_camera: 0,
            active_model: 1,
        };
        ModelMoveSystem::default().update(&mut scene, &ctx);

        let moved = scene.entity_by_name::<Model>("b").unwrap();
        let still = scene.entity_by_name::<Model>("a").unwrap();
        let moved = scene.get_component::<TransformComponent>(moved).unwrap();
        let still = scene.get_component::<TransformComponent>(still).unwrap();
        assert_eq!(moved.position, Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(still.position, Vector3::new(0.0, 0.0, 0.0));
    }
}
