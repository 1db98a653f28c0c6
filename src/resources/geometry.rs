//! Generated meshes for primitives and grids.
//!
//! `size` is the full extent along each axis; meshes are centred on the
//! origin and carry the given colour in every vertex.

use cgmath::{Vector3, Vector4};

use crate::data_structures::mesh::{MeshData, MeshVertex};

fn vertex(position: [f32; 3], normal: [f32; 3], colour: [f32; 4], uv: [f32; 2]) -> MeshVertex {
    MeshVertex {
        position,
        normal,
        colour,
        tex_coords: uv,
    }
}

pub fn triangle(size: Vector3<f32>, colour: Vector4<f32>) -> MeshData {
    let (hx, hy) = (size.x * 0.5, size.y * 0.5);
    let colour: [f32; 4] = colour.into();
    let normal = [0.0, 0.0, 1.0];
    let vertices = vec![
        vertex([-hx, -hy, 0.0], normal, colour, [0.0, 1.0]),
        vertex([hx, -hy, 0.0], normal, colour, [1.0, 1.0]),
        vertex([0.0, hy, 0.0], normal, colour, [0.5, 0.0]),
    ];
    MeshData::new(vertices, vec![0, 1, 2], true)
}

/// A quad in the XY plane facing +Z.
pub fn square(size: Vector3<f32>, colour: Vector4<f32>) -> MeshData {
    let (hx, hy) = (size.x * 0.5, size.y * 0.5);
    let colour: [f32; 4] = colour.into();
    let normal = [0.0, 0.0, 1.0];
    let vertices = vec![
        vertex([-hx, -hy, 0.0], normal, colour, [0.0, 1.0]),
        vertex([hx, -hy, 0.0], normal, colour, [1.0, 1.0]),
        vertex([hx, hy, 0.0], normal, colour, [1.0, 0.0]),
        vertex([-hx, hy, 0.0], normal, colour, [0.0, 0.0]),
    ];
    MeshData::new(vertices, vec![0, 1, 2, 0, 2, 3], true)
}

/// An axis-aligned box with outward normals and one UV square per face.
pub fn cube(size: Vector3<f32>, colour: Vector4<f32>) -> MeshData {
    let h = size * 0.5;
    let colour: [f32; 4] = colour.into();
    // normal, then the four corners counter-clockwise seen from outside
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        (
            [1.0, 0.0, 0.0],
            [[h.x, -h.y, h.z], [h.x, -h.y, -h.z], [h.x, h.y, -h.z], [h.x, h.y, h.z]],
        ),
        (
            [-1.0, 0.0, 0.0],
            [[-h.x, -h.y, -h.z], [-h.x, -h.y, h.z], [-h.x, h.y, h.z], [-h.x, h.y, -h.z]],
        ),
        (
            [0.0, 1.0, 0.0],
            [[-h.x, h.y, h.z], [h.x, h.y, h.z], [h.x, h.y, -h.z], [-h.x, h.y, -h.z]],
        ),
        (
            [0.0, -1.0, 0.0],
            [[-h.x, -h.y, -h.z], [h.x, -h.y, -h.z], [h.x, -h.y, h.z], [-h.x, -h.y, h.z]],
        ),
        (
            [0.0, 0.0, 1.0],
            [[-h.x, -h.y, h.z], [h.x, -h.y, h.z], [h.x, h.y, h.z], [-h.x, h.y, h.z]],
        ),
        (
            [0.0, 0.0, -1.0],
            [[h.x, -h.y, -h.z], [-h.x, -h.y, -h.z], [-h.x, h.y, -h.z], [h.x, h.y, -h.z]],
        ),
    ];
    let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, corners) in faces {
        let base = vertices.len() as u32;
        for (corner, uv) in corners.into_iter().zip(uvs) {
            vertices.push(vertex(corner, normal, colour, uv));
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    MeshData::new(vertices, indices, true)
}
