//! CPU-side mesh data as it is handed to the device.

/// Interleaved vertex layout shared by every mesh and the forward shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub colour: [f32; 4],
    pub tex_coords: [f32; 2],
}

impl MeshVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x4,
        3 => Float32x2,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    /// True when the source provided per-vertex colours.
    pub has_colours: bool,
}

impl MeshData {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>, has_colours: bool) -> Self {
        Self {
            vertices,
            indices,
            has_colours,
        }
    }

    /// Lowest and highest vertex y, `(0, 0)` for an empty mesh.
    pub fn y_extent(&self) -> (f32, f32) {
        let mut vertices = self.vertices.iter();
        let Some(first) = vertices.next() else {
            return (0.0, 0.0);
        };
        vertices.fold((first.position[1], first.position[1]), |(min, max), v| {
            (min.min(v.position[1]), max.max(v.position[1]))
        })
    }

    /// Checks that the mesh can be drawn as an indexed triangle list.
    pub fn validate(&self) -> Result<(), String> {
        if self.vertices.is_empty() {
            return Err("mesh has no vertices".to_string());
        }
        if self.indices.is_empty() || self.indices.len() % 3 != 0 {
            return Err(format!(
                "index count {} is not a non-empty multiple of three",
                self.indices.len()
            ));
        }
        let count = self.vertices.len() as u32;
        if let Some(bad) = self.indices.iter().find(|&&i| i >= count) {
            return Err(format!("index {bad} exceeds vertex count {count}"));
        }
        Ok(())
    }
}
