//! Scene components.
//!
//! Models, lights and cameras are named objects in the [`Scene`](super::scene::Scene).
//! Primitives and grids are declarative records that resource loading expands
//! into concrete models; texture data and texture connections describe which
//! images end up in which model texture slot.

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Vector2, Vector3, Vector4, perspective};

/// Number of 2D texture slots a model can blend.
pub const NUM_TEXTURES: usize = 4;

/// Reserved model name for the background cube.
pub const SKYBOX_NAME: &str = "skybox";

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// How the fragment shader picks a model's base colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColourMode {
    #[default]
    Solid = 0,
    VertexColour = 1,
    Random = 2,
    Height = 3,
}

impl ColourMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "solid" | "0" => Some(Self::Solid),
            "vertex" | "vertex_colour" | "1" => Some(Self::VertexColour),
            "random" | "2" => Some(Self::Random),
            "height" | "3" => Some(Self::Height),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// Name of the mesh in the mesh manager: an OBJ path or a generated mesh name.
    pub mesh: String,
    pub texture_names: [String; NUM_TEXTURES],
    pub texture_mix: [f32; NUM_TEXTURES],
    pub use_textures: bool,
    pub colour: Vector4<f32>,
    pub colour_mode: ColourMode,
    pub lighted: bool,
    pub visible: bool,
    pub specular: Vector4<f32>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            mesh: String::new(),
            texture_names: Default::default(),
            texture_mix: [0.0; NUM_TEXTURES],
            use_textures: false,
            colour: Vector4::new(1.0, 1.0, 1.0, 1.0),
            colour_mode: ColourMode::Solid,
            lighted: true,
            visible: true,
            specular: Vector4::new(1.0, 1.0, 1.0, 16.0),
        }
    }
}

impl Model {
    pub fn with_mesh(mesh: impl Into<String>) -> Self {
        Self {
            mesh: mesh.into(),
            ..Default::default()
        }
    }

    /// Alpha below one defers the model to the sorted transparent pass.
    pub fn is_transparent(&self) -> bool {
        self.colour.w < 1.0
    }

    /// Binds `texture` into `slot`. The mix ratio is clamped to `[0, 1]`.
    /// An empty name or a ratio that is not positive (NaN included) clears the slot instead.
    pub fn set_texture(&mut self, slot: usize, texture: &str, mix: f32) {
        if slot >= NUM_TEXTURES {
            return;
        }
        if texture.is_empty() || mix.is_nan() || mix <= 0.0 {
            self.clear_texture(slot);
            return;
        }
        self.texture_names[slot] = texture.to_string();
        self.texture_mix[slot] = mix.clamp(0.0, 1.0);
        self.use_textures = true;
    }

    pub fn clear_texture(&mut self, slot: usize) {
        if slot >= NUM_TEXTURES {
            return;
        }
        self.texture_names[slot].clear();
        self.texture_mix[slot] = 0.0;
        self.use_textures = self.texture_names.iter().any(|name| !name.is_empty());
    }

    pub fn clear_textures(&mut self) {
        for slot in 0..NUM_TEXTURES {
            self.clear_texture(slot);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightType {
    #[default]
    Point = 0,
    Spot = 1,
    Directional = 2,
}

impl LightType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "point" | "0" => Some(Self::Point),
            "spot" | "1" => Some(Self::Spot),
            "directional" | "2" => Some(Self::Directional),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub position: Vector3<f32>,
    pub diffuse: Vector4<f32>,
    /// Constant, linear, quadratic and cutoff distance.
    pub attenuation: Vector4<f32>,
    pub direction: Vector3<f32>,
    pub kind: LightType,
    /// Inner and outer spot angles in degrees.
    pub param1: Vector2<f32>,
    pub param2: Vector2<f32>,
    pub enabled: bool,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            diffuse: Vector4::new(1.0, 1.0, 1.0, 1.0),
            attenuation: Vector4::new(1.0, 0.01, 0.001, 1000.0),
            direction: Vector3::new(0.0, -1.0, 0.0),
            kind: LightType::Point,
            param1: Vector2::new(0.0, 0.0),
            param2: Vector2::new(0.0, 0.0),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vector3<f32>,
    pub front: Vector3<f32>,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub speed: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 5.0),
            front: Vector3::new(0.0, 0.0, -1.0),
            fov: 60.0,
            near_plane: 0.1,
            far_plane: 1000.0,
            yaw: -90.0,
            pitch: 0.0,
            speed: 5.0,
        }
    }
}

impl Camera {
    pub const MIN_FOV: f32 = 1.0;
    pub const MAX_FOV: f32 = 120.0;
    pub const MAX_PITCH: f32 = 89.0;

    pub fn view(&self) -> Matrix4<f32> {
        let eye = Point3::new(self.position.x, self.position.y, self.position.z);
        Matrix4::look_to_rh(eye, self.front, Vector3::unit_y())
    }

    pub fn projection(&self, aspect: f32) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX
            * perspective(Deg(self.fov), aspect, self.near_plane, self.far_plane)
    }

    /// Recomputes `front` from yaw and pitch.
    pub fn update_front(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.front = Vector3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos())
            .normalize();
    }

    /// Derives yaw and pitch from `front`, used after a scene sets the look vector directly.
    pub fn sync_angles(&mut self) {
        if self.front.magnitude2() == 0.0 {
            self.front = Vector3::new(0.0, 0.0, -1.0);
        }
        let front = self.front.normalize();
        self.front = front;
        self.pitch = front
            .y
            .clamp(-1.0, 1.0)
            .asin()
            .to_degrees()
            .clamp(-Self::MAX_PITCH, Self::MAX_PITCH);
        self.yaw = front.z.atan2(front.x).to_degrees();
        self.update_front();
    }

    pub fn adjust_fov(&mut self, delta: f32) {
        self.fov = (self.fov + delta).clamp(Self::MIN_FOV, Self::MAX_FOV);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveType {
    Triangle,
    Square,
    #[default]
    Cube,
}

impl PrimitiveType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "triangle" => Some(Self::Triangle),
            "square" => Some(Self::Square),
            "cube" => Some(Self::Cube),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub kind: PrimitiveType,
    pub size: Vector3<f32>,
}

impl Default for Primitive {
    fn default() -> Self {
        Self {
            kind: PrimitiveType::Cube,
            size: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridType {
    #[default]
    Square,
    Cube,
}

impl GridType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "square" => Some(Self::Square),
            "cube" => Some(Self::Cube),
            _ => None,
        }
    }

    pub fn shared_mesh_name(self, grid_name: &str) -> String {
        match self {
            Self::Square => format!("{grid_name}_sharedSquare"),
            Self::Cube => format!("{grid_name}_sharedCube"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub kind: GridType,
    pub count: i32,
    pub spacing: f32,
    pub size: Vector3<f32>,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            kind: GridType::Square,
            count: 0,
            spacing: 1.0,
            size: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Grid {
    /// Tiles per row: `ceil(sqrt(count))`, zero for an empty grid.
    pub fn side(&self) -> i32 {
        if self.count <= 0 {
            0
        } else {
            (self.count as f32).sqrt().ceil() as i32
        }
    }

    /// Local offset of instance `index`.
    pub fn instance_position(&self, index: i32) -> Vector3<f32> {
        let side = self.side();
        let (row, col) = if side > 0 {
            (index / side, index % side)
        } else {
            (0, 0)
        };
        let (row, col) = (row as f32, col as f32);
        match self.kind {
            GridType::Square => Vector3::new(self.spacing * col, self.spacing * row, 0.0),
            GridType::Cube => Vector3::new(self.spacing * col, 0.0, self.spacing * row),
        }
    }

    pub fn instance_name(grid_name: &str, index: i32) -> String {
        format!("{grid_name}_instance_{index}")
    }
}

/// A named texture source: one face for 2D, six for a cube map
/// ordered +X, -X, +Y, -Y, +Z, -Z.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextureData {
    pub is_cube: bool,
    pub faces: Vec<String>,
}

impl TextureData {
    pub const CUBE_FACES: usize = 6;
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureConnection {
    pub model: String,
    pub texture: String,
    pub slot: usize,
    pub mix: f32,
}

impl Default for TextureConnection {
    fn default() -> Self {
        Self {
            model: String::new(),
            texture: String::new(),
            slot: 0,
            mix: 1.0,
        }
    }
}

/// Colour attached to a primitive or grid entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColourComponent {
    pub colour: Vector4<f32>,
    pub mode: ColourMode,
}

impl Default for ColourComponent {
    fn default() -> Self {
        Self {
            colour: Vector4::new(1.0, 1.0, 1.0, 1.0),
            mode: ColourMode::Solid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn use_textures_tracks_non_empty_slots() {
        let mut model = Model::with_mesh("cube");
        model.set_texture(0, "stone", 0.5);
        model.set_texture(2, "moss", 0.25);
        assert!(model.use_textures);

        model.clear_texture(0);
        assert!(model.use_textures);

        model.set_texture(2, "moss", 0.0);
        assert!(!model.use_textures);
        assert!(model.texture_names.iter().all(String::is_empty));
    }

    #[test]
    fn mix_is_clamped_on_write() {
        let mut model = Model::default();
        model.set_texture(1, "stone", 3.5);
        assert_eq!(model.texture_mix[1], 1.0);
        model.set_texture(1, "stone", 0.4);
        assert_eq!(model.texture_mix[1], 0.4);
    }

    #[test]
    fn nan_mix_clears_the_slot() {
        let mut model = Model::default();
        model.set_texture(0, "wood", f32::NAN);
        assert!(model.texture_names[0].is_empty());
        assert_eq!(model.texture_mix[0], 0.0);
        assert!(!model.use_textures);

        model.set_texture(2, "stone", 0.5);
        model.set_texture(2, "stone", f32::NAN);
        assert!(model.texture_names[2].is_empty());
        assert!(!model.use_textures);
    }

    #[test]
    fn straight_up_front_is_held_below_the_pitch_limit() {
        let mut camera = Camera {
            front: Vector3::new(0.0, 1.0, 0.0),
            ..Default::default()
        };
        camera.sync_angles();
        assert!(camera.pitch <= Camera::MAX_PITCH);
        let front = camera.front;
        assert!(front.x.is_finite() && front.y.is_finite() && front.z.is_finite());
        assert!(camera.front.cross(Vector3::unit_y()).magnitude2() > 0.0);

        camera.front = Vector3::new(0.0, -3.0, 0.0);
        camera.sync_angles();
        assert!(camera.pitch >= -Camera::MAX_PITCH);
        assert!((camera.front.magnitude() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn grid_side_rounds_up() {
        let grid = Grid {
            count: 10,
            ..Default::default()
        };
        assert_eq!(grid.side(), 4);
        let empty = Grid {
            count: -3,
            ..Default::default()
        };
        assert_eq!(empty.side(), 0);
    }

    #[test]
    fn cube_grids_tile_in_the_xz_plane() {
        let grid = Grid {
            kind: GridType::Cube,
            count: 4,
            spacing: 3.0,
            ..Default::default()
        };
        assert_eq!(grid.instance_position(3), Vector3::new(3.0, 0.0, 3.0));
        assert_eq!(grid.kind.shared_mesh_name("floor"), "floor_sharedCube");
    }

    #[test]
    fn fov_stays_in_range() {
        let mut camera = Camera::default();
        camera.adjust_fov(500.0);
        assert_eq!(camera.fov, Camera::MAX_FOV);
        camera.adjust_fov(-500.0);
        assert_eq!(camera.fov, Camera::MIN_FOV);
    }

    #[test]
    fn front_and_angles_agree() {
        let mut camera = Camera {
            yaw: 0.0,
            pitch: 0.0,
            ..Default::default()
        };
        camera.update_front();
        assert!((camera.front.x - 1.0).abs() < 1e-5);
        camera.front = Vector3::new(0.0, 0.0, -2.0);
        camera.sync_angles();
        assert!((camera.yaw + 90.0).abs() < 1e-3);
        assert!(camera.pitch.abs() < 1e-3);
    }
}
