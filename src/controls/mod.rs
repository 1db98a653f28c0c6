//! Input-driven controllers for the active camera and the active model.

pub mod camera;
pub mod model;

pub use camera::{CameraController, CameraFovSystem, CameraLookSystem, CameraMoveSystem};
pub use model::{ModelController, ModelMoveSystem};
