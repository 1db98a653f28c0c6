#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU32, Ordering},
};

use rustc_hash::FxHashMap;
use scene_ngin::{
    config::EngineConfig,
    data_structures::{
        mesh::MeshData,
        texture::{TextureImage, TextureKind},
    },
    device::{
        CullFace, MeshHandle, ProgramId, ProgramLayout, RenderDevice, TEXTURE_UNITS,
        TextureHandle, UniformLocation, UniformValue,
    },
    errors::DeviceError,
    window::WindowControl,
};

/// The shader sources shipped with the crate, concatenated the way the
/// shader manager does it.
pub fn default_shader_source() -> String {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/shaders");
    let mut source = String::new();
    for file in ["vertex_shader.wgsl", "fragment_shader.wgsl"] {
        let text = std::fs::read_to_string(dir.join(file)).expect("shader asset is readable");
        source.push_str(&text);
        source.push('\n');
    }
    source
}

/// State captured at the moment of a draw call.
#[derive(Debug, Clone)]
pub struct DrawRecord {
    pub mesh: MeshHandle,
    pub label: String,
    pub cull: CullFace,
    pub depth_write: bool,
    pub uniforms: FxHashMap<String, UniformValue>,
    pub units: [Option<TextureHandle>; TEXTURE_UNITS],
}

impl DrawRecord {
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).copied()
    }
}

struct RecordedProgram {
    label: String,
    layout: ProgramLayout,
}

/// A [`RenderDevice`] that reflects real WGSL but only records what the
/// renderer asks of it.
pub(crate) struct RecordingDevice {
    programs: Vec<RecordedProgram>,
    meshes: Vec<String>,
    textures: Vec<(String, TextureKind)>,
    active: Option<ProgramId>,
    values: FxHashMap<String, UniformValue>,
    units: [Option<TextureHandle>; TEXTURE_UNITS],
    cull: CullFace,
    depth_write: bool,
    wireframe: bool,
    pub draws: Vec<DrawRecord>,
    /// Uniform writes that did not match the active program's layout.
    pub rejected: Vec<String>,
    pub clears: u32,
    pub presents: u32,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self {
            programs: Vec::new(),
            meshes: Vec::new(),
            textures: Vec::new(),
            active: None,
            values: FxHashMap::default(),
            units: [None; TEXTURE_UNITS],
            cull: CullFace::Back,
            depth_write: true,
            wireframe: false,
            draws: Vec::new(),
            rejected: Vec::new(),
            clears: 0,
            presents: 0,
        }
    }

    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.values.get(name).copied()
    }

    pub fn bound(&self, unit: usize) -> Option<TextureHandle> {
        self.units.get(unit).copied().flatten()
    }

    pub fn mesh_uploads(&self) -> usize {
        self.meshes.len()
    }

    pub fn texture_uploads(&self) -> usize {
        self.textures.len()
    }

    pub fn texture_kind(&self, handle: TextureHandle) -> Option<TextureKind> {
        self.textures
            .get((handle.0 as usize).checked_sub(1)?)
            .map(|(_, kind)| *kind)
    }

    pub fn draws_of(&self, label: &str) -> Vec<&DrawRecord> {
        self.draws.iter().filter(|d| d.label == label).collect()
    }

    pub fn drawn_labels(&self) -> Vec<&str> {
        self.draws.iter().map(|d| d.label.as_str()).collect()
    }

    pub fn program_label(&self, program: ProgramId) -> Option<&str> {
        self.layout_entry(program).map(|p| p.label.as_str())
    }

    pub fn reset_records(&mut self) {
        self.draws.clear();
        self.rejected.clear();
        self.clears = 0;
        self.presents = 0;
    }

    fn layout_entry(&self, program: ProgramId) -> Option<&RecordedProgram> {
        self.programs.get((program.0 as usize).checked_sub(1)?)
    }
}

impl RenderDevice for RecordingDevice {
    fn create_program(&mut self, label: &str, source: &str) -> Result<ProgramId, DeviceError> {
        let layout = ProgramLayout::from_wgsl(source).map_err(|reason| DeviceError::Compile {
            label: label.to_string(),
            reason,
        })?;
        self.programs.push(RecordedProgram {
            label: label.to_string(),
            layout,
        });
        Ok(ProgramId(self.programs.len() as u32))
    }

    fn use_program(&mut self, program: ProgramId) -> Result<(), DeviceError> {
        if self.layout_entry(program).is_none() {
            return Err(DeviceError::InvalidHandle {
                kind: "program",
                id: program.0,
            });
        }
        if self.active != Some(program) {
            self.values.clear();
        }
        self.active = Some(program);
        Ok(())
    }

    fn active_program(&self) -> Option<ProgramId> {
        self.active
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let index = self.layout_entry(program)?.layout.location(name)?;
        Some(UniformLocation { program, index })
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        if self.active != Some(location.program) {
            self.rejected
                .push(format!("{:?} written while another program is active", location));
            return;
        }
        let Some(info) = self
            .layout_entry(location.program)
            .and_then(|p| p.layout.get(location.index))
        else {
            self.rejected.push(format!("unknown location {:?}", location));
            return;
        };
        if !value.fits(info.kind) {
            self.rejected
                .push(format!("{} ({:?}) cannot hold {:?}", info.name, info.kind, value));
            return;
        }
        let name = info.name.clone();
        self.values.insert(name, value);
    }

    fn upload_mesh(&mut self, label: &str, mesh: &MeshData) -> Result<MeshHandle, DeviceError> {
        mesh.validate().map_err(|reason| DeviceError::Upload {
            label: label.to_string(),
            reason,
        })?;
        self.meshes.push(label.to_string());
        Ok(MeshHandle(self.meshes.len() as u32))
    }

    fn upload_texture(
        &mut self,
        label: &str,
        image: &TextureImage,
    ) -> Result<TextureHandle, DeviceError> {
        self.textures.push((label.to_string(), image.kind));
        Ok(TextureHandle(self.textures.len() as u32))
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        if let Some(slot) = self.units.get_mut(unit as usize) {
            *slot = Some(texture);
        }
    }

    fn set_cull_face(&mut self, face: CullFace) {
        self.cull = face;
    }

    fn cull_face(&self) -> CullFace {
        self.cull
    }

    fn set_depth_write(&mut self, enabled: bool) {
        self.depth_write = enabled;
    }

    fn depth_write(&self) -> bool {
        self.depth_write
    }

    fn set_wireframe(&mut self, enabled: bool) {
        self.wireframe = enabled;
    }

    fn wireframe(&self) -> bool {
        self.wireframe
    }

    fn clear(&mut self) {
        self.clears += 1;
    }

    fn draw_indexed(&mut self, mesh: MeshHandle) -> Result<(), DeviceError> {
        let label = self
            .meshes
            .get((mesh.0 as usize).wrapping_sub(1))
            .cloned()
            .ok_or(DeviceError::InvalidHandle {
                kind: "mesh",
                id: mesh.0,
            })?;
        self.draws.push(DrawRecord {
            mesh,
            label,
            cull: self.cull,
            depth_write: self.depth_write,
            uniforms: self.values.clone(),
            units: self.units,
        });
        Ok(())
    }

    fn present(&mut self) -> Result<(), DeviceError> {
        self.presents += 1;
        Ok(())
    }
}

/// A window that never opens.
#[derive(Debug, Default)]
pub(crate) struct NullWindow {
    pub close_requested: bool,
    pub cursor_locked: bool,
    pub visible: bool,
}

impl WindowControl for NullWindow {
    fn request_close(&mut self) {
        self.close_requested = true;
    }

    fn should_close(&self) -> bool {
        self.close_requested
    }

    fn switch_cursor_lock(&mut self) -> bool {
        self.cursor_locked = !self.cursor_locked;
        self.cursor_locked
    }

    fn switch_visibility(&mut self) {
        self.visible = !self.visible;
    }

    fn aspect(&self) -> f32 {
        16.0 / 9.0
    }
}

static NEXT_TREE: AtomicU32 = AtomicU32::new(0);

/// A throwaway asset root with the crate's shaders and a few stock files.
/// The directory is removed on drop.
pub(crate) struct TestAssets {
    root: PathBuf,
}

impl TestAssets {
    pub fn new(tag: &str) -> Self {
        let root = std::env::temp_dir().join(format!(
            "scene-ngin-{}-{}-{}",
            tag,
            std::process::id(),
            NEXT_TREE.fetch_add(1, Ordering::SeqCst)
        ));
        let _ = std::fs::remove_dir_all(&root);
        for dir in ["shaders", "models", "textures", "scenes"] {
            std::fs::create_dir_all(root.join(dir)).expect("temp asset dir is writable");
        }
        let shaders = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/shaders");
        for file in ["vertex_shader.wgsl", "fragment_shader.wgsl"] {
            std::fs::copy(shaders.join(file), root.join("shaders").join(file))
                .expect("shader asset is copyable");
        }
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> EngineConfig {
        EngineConfig::default().with_asset_path(self.root.clone())
    }

    pub fn write_scene(&self, name: &str, text: &str) -> &Self {
        std::fs::write(self.root.join("scenes").join(format!("{name}.txt")), text)
            .expect("scene file is writable");
        self
    }

    pub fn write_shader(&self, file: &str, text: &str) -> &Self {
        std::fs::write(self.root.join("shaders").join(file), text)
            .expect("shader file is writable");
        self
    }

    /// A unit cube with normals and texture coordinates.
    pub fn write_cube_obj(&self, file: &str) -> &Self {
        let obj = "\
v -0.5 -0.5 0.5
v 0.5 -0.5 0.5
v 0.5 0.5 0.5
v -0.5 0.5 0.5
v -0.5 -0.5 -0.5
v 0.5 -0.5 -0.5
v 0.5 0.5 -0.5
v -0.5 0.5 -0.5
vt 0 0
vt 1 0
vt 1 1
vt 0 1
vn 0 0 1
vn 0 0 -1
vn 1 0 0
vn -1 0 0
vn 0 1 0
vn 0 -1 0
f 1/1/1 2/2/1 3/3/1
f 1/1/1 3/3/1 4/4/1
f 6/1/2 5/2/2 8/3/2
f 6/1/2 8/3/2 7/4/2
f 2/1/3 6/2/3 7/3/3
f 2/1/3 7/3/3 3/4/3
f 5/1/4 1/2/4 4/3/4
f 5/1/4 4/3/4 8/4/4
f 4/1/5 3/2/5 7/3/5
f 4/1/5 7/3/5 8/4/5
f 5/1/6 6/2/6 2/3/6
f 5/1/6 2/3/6 1/4/6
";
        std::fs::write(self.root.join("models").join(file), obj).expect("obj is writable");
        self
    }

    /// A small solid PNG.
    pub fn write_png(&self, file: &str, rgba: [u8; 4]) -> &Self {
        image::RgbaImage::from_pixel(4, 4, image::Rgba(rgba))
            .save(self.root.join("textures").join(file))
            .expect("png is writable");
        self
    }

    /// Six faces named `<prefix>_px.png` through `<prefix>_nz.png`.
    pub fn write_cube_faces(&self, prefix: &str) -> [String; 6] {
        let faces = ["px", "nx", "py", "ny", "pz", "nz"].map(|f| format!("{prefix}_{f}.png"));
        for (i, face) in faces.iter().enumerate() {
            self.write_png(face, [40 * i as u8, 100, 200, 255]);
        }
        faces
    }
}

impl Drop for TestAssets {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

pub fn assert_vec3(value: Option<UniformValue>, expected: [f32; 3]) {
    match value {
        Some(UniformValue::Vec3(v)) => {
            for (a, b) in v.iter().zip(expected) {
                assert!((a - b).abs() < 1e-5, "{:?} != {:?}", v, expected);
            }
        }
        other => panic!("expected a vec3 uniform, got {:?}", other),
    }
}
