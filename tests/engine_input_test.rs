use crate::common::test_utils::{NullWindow, RecordingDevice, TestAssets};
use scene_ngin::{
    Engine,
    data_structures::components::{Camera, Model},
    device::RenderDevice,
};
use winit::{
    event::{ElementState, MouseScrollDelta},
    keyboard::KeyCode,
};

mod common;

const SCENE: &str = "\
camera front
    position 0 0 5
end

camera top
    position 0 10 0
    front 0 -1 -0.01
end

primitive a
    type cube
end

primitive b
    type square
    position 2 0 0
end

primitive c
    type triangle
    position -2 0 0
end
";

async fn loaded_engine(assets: &TestAssets) -> Engine<RecordingDevice> {
    assets.write_scene("Controls", SCENE);
    let mut engine = Engine::new(RecordingDevice::new(), assets.config());
    engine.initialize().await.unwrap();
    engine.load_scene("Controls").await.unwrap();
    engine
}

fn tap(engine: &mut Engine<RecordingDevice>, key: KeyCode) {
    engine.input_mut().handle_key(key, ElementState::Pressed, false);
    engine.input_mut().handle_key(key, ElementState::Released, false);
}

#[tokio::test]
async fn escape_requests_close() {
    let assets = TestAssets::new("escape");
    let mut engine = loaded_engine(&assets).await;
    let mut window = NullWindow::default();

    tap(&mut engine, KeyCode::Escape);
    engine.advance(&mut window, 0.0);

    assert!(window.close_requested);
}

#[tokio::test]
async fn p_toggles_wireframe() {
    let assets = TestAssets::new("wire");
    let mut engine = loaded_engine(&assets).await;
    let mut window = NullWindow::default();

    tap(&mut engine, KeyCode::KeyP);
    engine.advance(&mut window, 0.0);
    assert!(engine.device().wireframe());

    tap(&mut engine, KeyCode::KeyP);
    engine.advance(&mut window, 0.0);
    assert!(!engine.device().wireframe());
}

#[tokio::test]
async fn c_toggles_cursor_lock_for_mouse_look() {
    let assets = TestAssets::new("cursor");
    let mut engine = loaded_engine(&assets).await;
    let mut window = NullWindow::default();

    tap(&mut engine, KeyCode::KeyC);
    engine.advance(&mut window, 0.0);

    assert!(window.cursor_locked);
    assert!(engine.input_mut().cursor_locked());
}

#[tokio::test]
async fn n_cycles_models_with_wrap() {
    let assets = TestAssets::new("cycle");
    let mut engine = loaded_engine(&assets).await;
    let mut window = NullWindow::default();
    assert_eq!(engine.scene().object_count::<Model>(), 3);

    tap(&mut engine, KeyCode::KeyN);
    engine.advance(&mut window, 0.0);
    assert_eq!(engine.model_controller().current, 2);

    engine
        .input_mut()
        .handle_key(KeyCode::ShiftLeft, ElementState::Pressed, false);
    tap(&mut engine, KeyCode::KeyN);
    engine.advance(&mut window, 0.0);
    assert_eq!(engine.model_controller().current, 0);
}

#[tokio::test]
async fn digits_select_existing_cameras_only() {
    let assets = TestAssets::new("digits");
    let mut engine = loaded_engine(&assets).await;
    let mut window = NullWindow::default();

    tap(&mut engine, KeyCode::Digit1);
    engine.advance(&mut window, 0.0);
    assert_eq!(engine.camera_controller().current, 1);
    assert_eq!(engine.active_camera().unwrap().position.y, 10.0);

    tap(&mut engine, KeyCode::Digit7);
    engine.advance(&mut window, 0.0);
    assert_eq!(engine.camera_controller().current, 1);
}

#[tokio::test]
async fn scrolling_zooms_the_active_camera() {
    let assets = TestAssets::new("zoom");
    let mut engine = loaded_engine(&assets).await;
    let mut window = NullWindow::default();
    let before = engine.active_camera().unwrap().fov;

    engine
        .input_mut()
        .handle_scroll(MouseScrollDelta::LineDelta(0.0, 2.0));
    engine.advance(&mut window, 0.016);

    let after = engine.active_camera().unwrap().fov;
    assert_eq!(after, before - 4.0);

    engine
        .input_mut()
        .handle_scroll(MouseScrollDelta::LineDelta(0.0, -500.0));
    engine.advance(&mut window, 0.016);
    assert_eq!(engine.active_camera().unwrap().fov, Camera::MAX_FOV);
}

#[tokio::test]
async fn held_arrow_moves_the_active_model() {
    let assets = TestAssets::new("arrows");
    let mut engine = loaded_engine(&assets).await;
    let mut window = NullWindow::default();

    engine
        .input_mut()
        .handle_key(KeyCode::ArrowRight, ElementState::Pressed, false);
    engine.advance(&mut window, 0.5);

    let scene = engine.scene();
    let entity = scene.entity_by_name::<Model>("a").unwrap();
    let transform = scene
        .get_component::<scene_ngin::data_structures::transform::TransformComponent>(entity)
        .unwrap();
    assert!(transform.position.x > 0.0);
}
