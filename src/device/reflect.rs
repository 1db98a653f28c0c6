//! Uniform reflection for WGSL programs.
//!
//! The members of the program's `var<uniform>` block become named uniforms
//! with byte offsets; nested structs and fixed-size arrays are flattened to
//! GLSL-style names such as `theLights[3].position`. Texture globals become
//! sampler uniforms that remember their binding slot.

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Int,
    UInt,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    Texture2D { binding: u32 },
    TextureCube { binding: u32 },
}

impl UniformKind {
    /// Bytes occupied inside the uniform block; zero for textures.
    pub fn size(self) -> u32 {
        match self {
            Self::Int | Self::UInt | Self::Float => 4,
            Self::Vec2 => 8,
            Self::Vec3 => 12,
            Self::Vec4 => 16,
            Self::Mat4 => 64,
            Self::Texture2D { .. } | Self::TextureCube { .. } => 0,
        }
    }

    pub fn is_texture(self) -> bool {
        matches!(self, Self::Texture2D { .. } | Self::TextureCube { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniformInfo {
    pub name: String,
    pub offset: u32,
    pub kind: UniformKind,
}

#[derive(Debug, Clone, Default)]
pub struct ProgramLayout {
    /// Size of the uniform block in bytes, zero if the program has none.
    pub block_size: u32,
    uniforms: Vec<UniformInfo>,
    by_name: FxHashMap<String, u32>,
}

impl ProgramLayout {
    /// Parses and validates `source`, then collects its uniforms.
    pub fn from_wgsl(source: &str) -> Result<Self, String> {
        let module = naga::front::wgsl::parse_str(source).map_err(|e| e.emit_to_string(source))?;
        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| e.emit_to_string(source))?;
        Self::from_module(&module)
    }

    fn from_module(module: &naga::Module) -> Result<Self, String> {
        let mut layout = Self::default();
        let mut seen_block = false;

        for (_, var) in module.global_variables.iter() {
            match var.space {
                naga::AddressSpace::Uniform => {
                    if seen_block {
                        return Err("only one uniform block per program is supported".to_string());
                    }
                    seen_block = true;
                    if let naga::TypeInner::Struct { span, .. } = module.types[var.ty].inner {
                        layout.block_size = span;
                    }
                    let mut out = Vec::new();
                    flatten(module, var.ty, String::new(), 0, &mut out);
                    for info in out {
                        layout.push(info);
                    }
                }
                naga::AddressSpace::Handle => {
                    let (Some(name), Some(binding)) = (&var.name, &var.binding) else {
                        continue;
                    };
                    if let naga::TypeInner::Image { dim, arrayed, .. } = module.types[var.ty].inner {
                        let kind = match (dim, arrayed) {
                            (naga::ImageDimension::D2, false) => UniformKind::Texture2D {
                                binding: binding.binding,
                            },
                            (naga::ImageDimension::Cube, false) => UniformKind::TextureCube {
                                binding: binding.binding,
                            },
                            _ => continue,
                        };
                        layout.push(UniformInfo {
                            name: name.clone(),
                            offset: 0,
                            kind,
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(layout)
    }

    fn push(&mut self, info: UniformInfo) {
        let index = self.uniforms.len() as u32;
        self.by_name.insert(info.name.clone(), index);
        self.uniforms.push(info);
    }

    pub fn location(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, index: u32) -> Option<&UniformInfo> {
        self.uniforms.get(index as usize)
    }

    pub fn uniforms(&self) -> &[UniformInfo] {
        &self.uniforms
    }
}

fn flatten(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    name: String,
    offset: u32,
    out: &mut Vec<UniformInfo>,
) {
    use naga::{ScalarKind, TypeInner, VectorSize};

    let leaf = |kind| UniformInfo {
        name: name.clone(),
        offset,
        kind,
    };
    match &module.types[ty].inner {
        TypeInner::Scalar(scalar) => match scalar.kind {
            ScalarKind::Sint => out.push(leaf(UniformKind::Int)),
            ScalarKind::Uint => out.push(leaf(UniformKind::UInt)),
            ScalarKind::Float => out.push(leaf(UniformKind::Float)),
            _ => {}
        },
        TypeInner::Vector { size, scalar } if scalar.kind == ScalarKind::Float => {
            let kind = match size {
                VectorSize::Bi => UniformKind::Vec2,
                VectorSize::Tri => UniformKind::Vec3,
                VectorSize::Quad => UniformKind::Vec4,
            };
            out.push(leaf(kind));
        }
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            ..
        } => out.push(leaf(UniformKind::Mat4)),
        TypeInner::Struct { members, .. } => {
            for member in members {
                let Some(member_name) = &member.name else {
                    continue;
                };
                let full = if name.is_empty() {
                    member_name.clone()
                } else {
                    format!("{name}.{member_name}")
                };
                flatten(module, member.ty, full, offset + member.offset, out);
            }
        }
        TypeInner::Array {
            base,
            size: naga::ArraySize::Constant(count),
            stride,
        } => {
            for i in 0..count.get() {
                flatten(module, *base, format!("{name}[{i}]"), offset + i * stride, out);
            }
        }
        _ => {}
    }
}
