//! Turns the declarative records of a freshly parsed scene into drawable
//! models backed by uploaded meshes and textures.
//!
//! The steps run in this order during a scene load: [`load_meshes`],
//! [`load_textures`], [`process_primitives`], [`process_grids`],
//! [`process_texture_connections`].

use super::{elapsed_ms, mesh::MeshManager, texture::TextureManager};
use crate::{
    data_structures::{
        components::{
            ColourComponent, Grid, GridType, Model, Primitive, PrimitiveType, TextureConnection,
            TextureData, NUM_TEXTURES,
        },
        scene::{Entity, Scene},
        transform::TransformComponent,
    },
    device::RenderDevice,
    errors::LoadError,
};

fn colour_of(scene: &Scene, entity: Entity) -> ColourComponent {
    scene
        .get_component::<ColourComponent>(entity)
        .copied()
        .unwrap_or_default()
}

fn transform_of(scene: &Scene, entity: Entity, name: &str) -> Result<TransformComponent, LoadError> {
    scene
        .get_component::<TransformComponent>(entity)
        .copied()
        .ok_or_else(|| LoadError::MissingTransform {
            name: name.to_string(),
        })
}

/// Uploads every distinct mesh path referenced by a model.
pub async fn load_meshes<D: RenderDevice>(
    scene: &Scene,
    meshes: &mut MeshManager,
    device: &mut D,
) -> Result<(), LoadError> {
    let start = instant::Instant::now();
    log::debug!("loading meshes");

    let mut paths: Vec<&str> = Vec::new();
    for (_, _, model) in scene.objects::<Model>() {
        if !paths.contains(&model.mesh.as_str()) {
            paths.push(&model.mesh);
        }
    }
    for path in paths {
        meshes.load_and_add_mesh(device, path).await.inspect_err(|e| {
            log::error!("failed to load mesh '{}': {}", path, e);
        })?;
    }

    log::debug!(
        "loaded meshes ({} total) in {:.2} ms",
        meshes.len(),
        elapsed_ms(start)
    );
    Ok(())
}

/// Uploads every `TextureData` as a 2D texture or a cube map.
pub async fn load_textures<D: RenderDevice>(
    scene: &Scene,
    textures: &mut TextureManager,
    device: &mut D,
) -> Result<(), LoadError> {
    let start = instant::Instant::now();
    log::debug!("loading textures");

    for (_, name, data) in scene.objects::<TextureData>() {
        let result = if data.is_cube {
            match <&[String; TextureData::CUBE_FACES]>::try_from(data.faces.as_slice()) {
                Ok(faces) => textures.add_cube_texture(device, name, faces).await,
                Err(_) => Err(LoadError::Texture {
                    name: name.to_string(),
                    reason: format!("cube map needs 6 faces, got {}", data.faces.len()),
                }),
            }
        } else {
            match data.faces.first() {
                Some(face) => textures.add_texture(device, name, face).await,
                None => Err(LoadError::Texture {
                    name: name.to_string(),
                    reason: "no face given".to_string(),
                }),
            }
        };
        result.inspect_err(|e| log::error!("failed to load texture '{}': {}", name, e))?;
    }

    log::debug!(
        "loaded textures ({} total) in {:.2} ms",
        textures.len(),
        elapsed_ms(start)
    );
    Ok(())
}

/// Builds a mesh per primitive, stored under the primitive's name, and
/// attaches a model of the same name to the primitive's entity.
pub fn process_primitives<D: RenderDevice>(
    scene: &mut Scene,
    meshes: &mut MeshManager,
    device: &mut D,
) -> Result<(), LoadError> {
    let start = instant::Instant::now();
    log::debug!("processing primitives");

    let primitives: Vec<(Entity, String, Primitive)> = scene
        .objects::<Primitive>()
        .map(|(entity, name, primitive)| (entity, name.to_string(), primitive.clone()))
        .collect();

    for (entity, name, primitive) in primitives {
        transform_of(scene, entity, &name)
            .inspect_err(|_| log::error!("primitive '{}' has no transform", name))?;
        let colour = colour_of(scene, entity);

        let built = match primitive.kind {
            PrimitiveType::Triangle => {
                meshes.create_triangle(device, &name, primitive.size, colour.colour)
            }
            PrimitiveType::Square => meshes.create_square(device, &name, primitive.size, colour.colour),
            PrimitiveType::Cube => meshes.create_cube(device, &name, primitive.size, colour.colour),
        };
        built.map_err(|e| {
            log::error!("failed to build mesh for primitive '{}': {}", name, e);
            LoadError::Primitive {
                name: name.clone(),
                reason: e.to_string(),
            }
        })?;
        if meshes.get_mesh(&name).is_none() {
            log::error!("mesh for primitive '{}' vanished after creation", name);
            return Err(LoadError::Primitive {
                name,
                reason: "mesh missing after creation".to_string(),
            });
        }

        let model = Model {
            colour: colour.colour,
            colour_mode: colour.mode,
            ..Model::with_mesh(name.as_str())
        };
        scene.insert_object(entity, &name, model)?;
    }

    log::debug!("processed primitives in {:.2} ms", elapsed_ms(start));
    Ok(())
}

/// Builds one shared mesh per grid and fans the grid out into
/// `<grid>_instance_<i>` models laid out by [`Grid::instance_position`].
pub fn process_grids<D: RenderDevice>(
    scene: &mut Scene,
    meshes: &mut MeshManager,
    device: &mut D,
) -> Result<(), LoadError> {
    let start = instant::Instant::now();
    log::debug!("processing grids");

    let grids: Vec<(Entity, String, Grid)> = scene
        .objects::<Grid>()
        .map(|(entity, name, grid)| (entity, name.to_string(), grid.clone()))
        .collect();

    for (entity, name, grid) in grids {
        let transform = transform_of(scene, entity, &name)
            .inspect_err(|_| log::error!("grid '{}' has no transform", name))?;
        let colour = colour_of(scene, entity);
        let mesh_name = grid.kind.shared_mesh_name(&name);

        let built = match grid.kind {
            GridType::Square => meshes.create_square(device, &mesh_name, grid.size, colour.colour),
            GridType::Cube => meshes.create_cube(device, &mesh_name, grid.size, colour.colour),
        };
        built.map_err(|e| {
            log::error!("failed to build shared mesh for grid '{}': {}", name, e);
            LoadError::Grid {
                name: name.clone(),
                reason: e.to_string(),
            }
        })?;

        for index in 0..grid.count.max(0) {
            let model = Model {
                colour: colour.colour,
                colour_mode: colour.mode,
                ..Model::with_mesh(mesh_name.as_str())
            };
            let instance = scene.add_object(&Grid::instance_name(&name, index), model)?;
            scene.add_component(
                instance,
                TransformComponent {
                    position: grid.instance_position(index),
                    ..transform
                },
            )?;
        }
        log::debug!("grid '{}' expanded into {} instances", name, grid.count.max(0));
    }

    log::debug!("processed grids in {:.2} ms", elapsed_ms(start));
    Ok(())
}

/// Applies every texture connection to its model, in insertion order.
pub fn process_texture_connections(scene: &mut Scene) -> Result<(), LoadError> {
    let start = instant::Instant::now();
    log::debug!("processing texture connections");

    let connections: Vec<(String, TextureConnection)> = scene
        .objects::<TextureConnection>()
        .map(|(_, name, connection)| (name.to_string(), connection.clone()))
        .collect();

    for (name, connection) in connections {
        if connection.slot >= NUM_TEXTURES {
            log::error!(
                "connection '{}' targets slot {} (only {} slots)",
                name,
                connection.slot,
                NUM_TEXTURES
            );
            return Err(LoadError::SlotOutOfRange {
                slot: connection.slot,
                connection: name,
            });
        }
        if !scene.contains_object::<Model>(&connection.model) {
            log::error!(
                "connection '{}' names unknown model '{}'",
                name,
                connection.model
            );
            return Err(LoadError::ModelNotFound {
                model: connection.model,
                connection: name,
            });
        }
        let unbind = connection.texture.is_empty()
            || connection.mix.is_nan()
            || connection.mix <= 0.0;
        if !unbind && !scene.contains_object::<TextureData>(&connection.texture) {
            log::error!(
                "connection '{}' names unknown texture '{}'",
                name,
                connection.texture
            );
            return Err(LoadError::TextureNotFound {
                texture: connection.texture,
                connection: name,
            });
        }
        let Some(model) = scene.get_object_by_name_mut::<Model>(&connection.model) else {
            continue;
        };
        if unbind {
            model.clear_texture(connection.slot);
        } else {
            model.set_texture(connection.slot, &connection.texture, connection.mix);
        }
    }

    log::debug!("processed texture connections in {:.2} ms", elapsed_ms(start));
    Ok(())
}
