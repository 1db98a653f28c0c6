use std::{
    io::{BufReader, Cursor},
    path::{Path, PathBuf},
};

use cgmath::{Vector3, Vector4};
use rustc_hash::FxHashMap;

use super::{geometry, load_string};
use crate::{
    data_structures::mesh::{MeshData, MeshVertex},
    device::{MeshHandle, RenderDevice},
    errors::LoadError,
};

/// A mesh that lives on the device, plus what the renderer needs to know
/// about it without touching vertex data again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshRecord {
    pub handle: MeshHandle,
    pub index_count: u32,
    pub has_colours: bool,
    pub min_y: f32,
    pub max_y: f32,
}

/// Owns every uploaded mesh, keyed by OBJ path or generated name.
#[derive(Debug)]
pub struct MeshManager {
    base: PathBuf,
    meshes: FxHashMap<String, MeshRecord>,
}

impl MeshManager {
    /// `base` is the directory OBJ paths are resolved against.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            meshes: FxHashMap::default(),
        }
    }

    pub fn get_mesh(&self, name: &str) -> Option<&MeshRecord> {
        self.meshes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.meshes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Loads an OBJ file and uploads it under `path`. Loading a path that is
    /// already present succeeds without doing anything.
    pub async fn load_and_add_mesh<D: RenderDevice>(
        &mut self,
        device: &mut D,
        path: &str,
    ) -> Result<(), LoadError> {
        if self.contains(path) {
            return Ok(());
        }
        let full_path = self.base.join(path);
        let mesh = load_obj(&full_path).await.map_err(|e| match e {
            LoadError::Mesh { reason, .. } => LoadError::Mesh {
                name: path.to_string(),
                reason,
            },
            other => other,
        })?;
        self.add_mesh(device, path, &mesh)
    }

    /// Uploads `mesh` under `name`; a name that is already taken is left as is.
    pub fn add_mesh<D: RenderDevice>(
        &mut self,
        device: &mut D,
        name: &str,
        mesh: &MeshData,
    ) -> Result<(), LoadError> {
        if self.contains(name) {
            log::debug!("mesh '{}' already loaded", name);
            return Ok(());
        }
        let handle = device
            .upload_mesh(name, mesh)
            .map_err(|e| LoadError::Mesh {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        let (min_y, max_y) = mesh.y_extent();
        self.meshes.insert(
            name.to_string(),
            MeshRecord {
                handle,
                index_count: mesh.indices.len() as u32,
                has_colours: mesh.has_colours,
                min_y,
                max_y,
            },
        );
        Ok(())
    }

    pub fn create_triangle<D: RenderDevice>(
        &mut self,
        device: &mut D,
        name: &str,
        size: Vector3<f32>,
        colour: Vector4<f32>,
    ) -> Result<(), LoadError> {
        self.add_mesh(device, name, &geometry::triangle(size, colour))
    }

    pub fn create_square<D: RenderDevice>(
        &mut self,
        device: &mut D,
        name: &str,
        size: Vector3<f32>,
        colour: Vector4<f32>,
    ) -> Result<(), LoadError> {
        self.add_mesh(device, name, &geometry::square(size, colour))
    }

    pub fn create_cube<D: RenderDevice>(
        &mut self,
        device: &mut D,
        name: &str,
        size: Vector3<f32>,
        colour: Vector4<f32>,
    ) -> Result<(), LoadError> {
        self.add_mesh(device, name, &geometry::cube(size, colour))
    }
}

/// Reads an OBJ file and merges all of its objects into one mesh.
pub async fn load_obj(path: &Path) -> Result<MeshData, LoadError> {
    let obj_text = load_string(path).await?;
    let mesh_error = |reason: String| LoadError::Mesh {
        name: path.display().to_string(),
        reason,
    };
    let obj_cursor = Cursor::new(obj_text);
    let mut obj_reader = BufReader::new(obj_cursor);
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

    let (models, _materials) = tobj::load_obj_buf_async(
        &mut obj_reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        |p| {
            let mtl_path = dir.join(p);
            async move {
                // materials are not used, a missing .mtl is not an error
                match load_string(&mtl_path).await {
                    Ok(mat_text) => tobj::load_mtl_buf(&mut BufReader::new(Cursor::new(mat_text))),
                    Err(_) => Err(tobj::LoadError::OpenFileFailed),
                }
            }
        },
    )
    .await
    .map_err(|e| mesh_error(e.to_string()))?;

    let mesh = obj_to_mesh(&models);
    mesh.validate().map_err(mesh_error)?;
    Ok(mesh)
}

fn obj_to_mesh(models: &[tobj::Model]) -> MeshData {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let mut has_colours = !models.is_empty();

    for m in models {
        let mesh = &m.mesh;
        let base = vertices.len() as u32;
        let colours = !mesh.vertex_color.is_empty();
        has_colours &= colours;
        vertices.extend((0..mesh.positions.len() / 3).map(|i| MeshVertex {
            position: [
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            ],
            normal: [
                mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
            ],
            colour: if colours {
                [
                    mesh.vertex_color.get(i * 3).map_or(1.0, |f| *f),
                    mesh.vertex_color.get(i * 3 + 1).map_or(1.0, |f| *f),
                    mesh.vertex_color.get(i * 3 + 2).map_or(1.0, |f| *f),
                    1.0,
                ]
            } else {
                [1.0; 4]
            },
            tex_coords: [
                mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                1.0 - mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
            ],
        }));
        indices.extend(mesh.indices.iter().map(|i| i + base));
    }

    MeshData::new(vertices, indices, has_colours)
}
