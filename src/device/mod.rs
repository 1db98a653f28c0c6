//! The GPU context as the renderer sees it.
//!
//! [`RenderDevice`] is an immediate-mode surface: programs with named uniform
//! locations, texture units, raster state and indexed draws. The renderer
//! only talks to this trait, so frames can be recorded and inspected without
//! a GPU. [`WgpuDevice`] is the real backend.

mod reflect;
mod wgpu_device;

pub use reflect::{ProgramLayout, UniformInfo, UniformKind};
pub use wgpu_device::WgpuDevice;

use crate::{
    data_structures::{mesh::MeshData, texture::TextureImage},
    errors::DeviceError,
};

/// Units 0..NUM_TEXTURES feed the 2D samplers.
pub const TEXTURE_UNITS: usize = 5;
/// Unit reserved for the skybox cube map.
pub const SKYBOX_TEXTURE_UNIT: u32 = 4;

/// A linked shader program. Zero is never handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

impl ProgramId {
    pub const INVALID: ProgramId = ProgramId(0);

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// A resolved uniform of one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation {
    pub program: ProgramId,
    pub index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([[f32; 4]; 4]),
}

impl UniformValue {
    pub fn mat4(m: cgmath::Matrix4<f32>) -> Self {
        Self::Mat4(m.into())
    }

    pub fn vec3(v: cgmath::Vector3<f32>) -> Self {
        Self::Vec3(v.into())
    }

    pub fn vec4(v: cgmath::Vector4<f32>) -> Self {
        Self::Vec4(v.into())
    }

    pub fn bool(value: bool) -> Self {
        Self::Int(value as i32)
    }

    /// Whether the value can be stored in a uniform of `kind`.
    pub fn fits(&self, kind: UniformKind) -> bool {
        matches!(
            (self, kind),
            (Self::Int(_), UniformKind::Int)
                | (Self::Int(_), UniformKind::UInt)
                | (Self::Int(_), UniformKind::Texture2D { .. })
                | (Self::Int(_), UniformKind::TextureCube { .. })
                | (Self::Float(_), UniformKind::Float)
                | (Self::Vec2(_), UniformKind::Vec2)
                | (Self::Vec3(_), UniformKind::Vec3)
                | (Self::Vec4(_), UniformKind::Vec4)
                | (Self::Mat4(_), UniformKind::Mat4)
        )
    }

    /// Little-endian bytes as laid out in a uniform block.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Int(v) => bytemuck::bytes_of(v).to_vec(),
            Self::Float(v) => bytemuck::bytes_of(v).to_vec(),
            Self::Vec2(v) => bytemuck::cast_slice(v).to_vec(),
            Self::Vec3(v) => bytemuck::cast_slice(v).to_vec(),
            Self::Vec4(v) => bytemuck::cast_slice(v).to_vec(),
            Self::Mat4(v) => bytemuck::cast_slice(v).to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullFace {
    #[default]
    Back,
    Front,
}

pub trait RenderDevice {
    /// Compiles a WGSL module holding both `vs_main` and `fs_main`.
    fn create_program(&mut self, label: &str, source: &str) -> Result<ProgramId, DeviceError>;

    fn use_program(&mut self, program: ProgramId) -> Result<(), DeviceError>;

    fn active_program(&self) -> Option<ProgramId>;

    /// Looks up a uniform by its flattened name, e.g. `mModel` or `theLights[2].diffuse`.
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// Writes a uniform of the active program. An `Int` written to a texture
    /// location selects the texture unit that feeds it.
    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue);

    fn upload_mesh(&mut self, label: &str, mesh: &MeshData) -> Result<MeshHandle, DeviceError>;

    fn upload_texture(
        &mut self,
        label: &str,
        image: &TextureImage,
    ) -> Result<TextureHandle, DeviceError>;

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle);

    fn set_cull_face(&mut self, face: CullFace);

    fn cull_face(&self) -> CullFace;

    fn set_depth_write(&mut self, enabled: bool);

    fn depth_write(&self) -> bool;

    fn set_wireframe(&mut self, enabled: bool);

    fn wireframe(&self) -> bool;

    /// Clears colour and depth at the start of a frame.
    fn clear(&mut self);

    fn draw_indexed(&mut self, mesh: MeshHandle) -> Result<(), DeviceError>;

    fn present(&mut self) -> Result<(), DeviceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ints_select_texture_units() {
        let value = UniformValue::Int(4);
        assert!(value.fits(UniformKind::TextureCube { binding: 4 }));
        assert!(!UniformValue::Float(1.0).fits(UniformKind::Int));
        assert_eq!(UniformValue::bool(true), UniformValue::Int(1));
    }

    #[test]
    fn matrices_serialize_column_major() {
        let m = cgmath::Matrix4::from_translation(cgmath::Vector3::new(1.0, 2.0, 3.0));
        let bytes = UniformValue::mat4(m).to_bytes();
        assert_eq!(bytes.len(), 64);
        let floats: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(&floats[12..15], &[1.0, 2.0, 3.0]);
    }
}
