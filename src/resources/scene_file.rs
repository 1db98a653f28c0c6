//! Text scene format.
//!
//! ```text
//! # comment
//! camera main
//!     position 0 2 8
//!     front 0 0 -1
//!     fov 60
//! end
//!
//! primitive crate
//!     type cube
//!     size 1
//!     colour 0.8 0.3 0.2 1
//! end
//!
//! texture sky cube
//!     faces px.png nx.png py.png ny.png pz.png nz.png
//! end
//! ```
//!
//! Kinds are `camera`, `light`, `model`, `primitive`, `grid`, `texture` and
//! `connect`. Each block holds one `key values...` pair per line and closes
//! with `end`.

use cgmath::{Vector2, Vector3, Vector4};

use crate::{
    data_structures::{
        components::{
            Camera, ColourComponent, ColourMode, Grid, GridType, Light, LightType, Model,
            Primitive, PrimitiveType, TextureConnection, TextureData,
        },
        scene::Scene,
        transform::TransformComponent,
    },
    errors::{LoadError, StoreError},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Camera(Camera),
    Light(Light),
    Model {
        model: Model,
        transform: TransformComponent,
    },
    Primitive {
        primitive: Primitive,
        transform: TransformComponent,
        colour: Option<ColourComponent>,
    },
    Grid {
        grid: Grid,
        transform: TransformComponent,
        colour: Option<ColourComponent>,
    },
    Texture(TextureData),
    Connection(TextureConnection),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub line: usize,
    pub name: String,
    pub record: Record,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneFile {
    pub blocks: Vec<Block>,
}

impl SceneFile {
    /// Inserts every block into `scene` in file order.
    pub fn populate(self, scene: &mut Scene) -> Result<(), LoadError> {
        for Block { line, name, record } in self.blocks {
            let duplicate = |e: StoreError| match e {
                StoreError::DuplicateName { type_name, .. } => LoadError::Parse {
                    line,
                    message: format!("duplicate {} name '{}'", type_name, name),
                },
                other => LoadError::Store(other),
            };
            match record {
                Record::Camera(camera) => {
                    scene.add_object(&name, camera).map_err(duplicate)?;
                }
                Record::Light(light) => {
                    scene.add_object(&name, light).map_err(duplicate)?;
                }
                Record::Model { model, transform } => {
                    let entity = scene.add_object(&name, model).map_err(duplicate)?;
                    scene.add_component(entity, transform)?;
                }
                Record::Primitive {
                    primitive,
                    transform,
                    colour,
                } => {
                    let entity = scene.add_object(&name, primitive).map_err(duplicate)?;
                    scene.add_component(entity, transform)?;
                    if let Some(colour) = colour {
                        scene.add_component(entity, colour)?;
                    }
                }
                Record::Grid {
                    grid,
                    transform,
                    colour,
                } => {
                    let entity = scene.add_object(&name, grid).map_err(duplicate)?;
                    scene.add_component(entity, transform)?;
                    if let Some(colour) = colour {
                        scene.add_component(entity, colour)?;
                    }
                }
                Record::Texture(data) => {
                    scene.add_object(&name, data).map_err(duplicate)?;
                }
                Record::Connection(connection) => {
                    scene.add_object(&name, connection).map_err(duplicate)?;
                }
            }
        }
        Ok(())
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> LoadError {
    LoadError::Parse {
        line,
        message: message.into(),
    }
}

struct Field<'a> {
    line: usize,
    key: &'a str,
    values: Vec<&'a str>,
}

impl Field<'_> {
    fn error(&self, message: impl std::fmt::Display) -> LoadError {
        parse_error(self.line, format!("'{}': {}", self.key, message))
    }

    fn float_list(&self) -> Result<Vec<f32>, LoadError> {
        self.values
            .iter()
            .map(|v| match v.parse::<f32>() {
                Ok(value) if value.is_finite() => Ok(value),
                Ok(_) => Err(self.error(format!("'{}' is not a finite number", v))),
                Err(_) => Err(self.error(format!("'{}' is not a number", v))),
            })
            .collect()
    }

    fn floats<const N: usize>(&self) -> Result<[f32; N], LoadError> {
        let values = self.float_list()?;
        values
            .try_into()
            .map_err(|v: Vec<f32>| self.error(format!("expected {} numbers, got {}", N, v.len())))
    }

    fn float(&self) -> Result<f32, LoadError> {
        let [value] = self.floats::<1>()?;
        Ok(value)
    }

    fn int(&self) -> Result<i64, LoadError> {
        let value = self.single()?;
        value
            .parse::<i64>()
            .map_err(|_| self.error(format!("'{}' is not an integer", value)))
    }

    fn vec2(&self) -> Result<Vector2<f32>, LoadError> {
        Ok(self.floats::<2>()?.into())
    }

    fn vec3(&self) -> Result<Vector3<f32>, LoadError> {
        Ok(self.floats::<3>()?.into())
    }

    /// Three numbers, or one that is used for every axis.
    fn extent(&self) -> Result<Vector3<f32>, LoadError> {
        match self.float_list()?.as_slice() {
            [s] => Ok(Vector3::new(*s, *s, *s)),
            [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
            other => Err(self.error(format!("expected 1 or 3 numbers, got {}", other.len()))),
        }
    }

    /// Four numbers, or three with alpha 1.
    fn rgba(&self) -> Result<Vector4<f32>, LoadError> {
        match self.float_list()?.as_slice() {
            [r, g, b] => Ok(Vector4::new(*r, *g, *b, 1.0)),
            [r, g, b, a] => Ok(Vector4::new(*r, *g, *b, *a)),
            other => Err(self.error(format!("expected 3 or 4 numbers, got {}", other.len()))),
        }
    }

    fn vec4(&self) -> Result<Vector4<f32>, LoadError> {
        Ok(self.floats::<4>()?.into())
    }

    fn boolean(&self) -> Result<bool, LoadError> {
        match self.single()?.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            other => Err(self.error(format!("'{}' is not a boolean", other))),
        }
    }

    fn single(&self) -> Result<&str, LoadError> {
        match self.values.as_slice() {
            [value] => Ok(value),
            other => Err(self.error(format!("expected one value, got {}", other.len()))),
        }
    }

    fn unknown(&self, kind: &str) -> LoadError {
        parse_error(self.line, format!("unknown key '{}' in {} block", self.key, kind))
    }
}

fn apply_transform(transform: &mut TransformComponent, field: &Field) -> Result<bool, LoadError> {
    match field.key {
        "position" => transform.position = field.vec3()?,
        "rotation" => transform.rotation = field.vec3()?,
        "scale" => transform.scale = field.extent()?,
        _ => return Ok(false),
    }
    Ok(true)
}

fn apply_colour(colour: &mut Option<ColourComponent>, field: &Field) -> Result<bool, LoadError> {
    match field.key {
        "colour" => colour.get_or_insert_with(Default::default).colour = field.rgba()?,
        "colour_mode" => {
            let mode = ColourMode::parse(field.single()?)
                .ok_or_else(|| field.error("unknown colour mode"))?;
            colour.get_or_insert_with(Default::default).mode = mode;
        }
        _ => return Ok(false),
    }
    Ok(true)
}

fn apply_camera(camera: &mut Camera, field: &Field) -> Result<(), LoadError> {
    match field.key {
        "position" => camera.position = field.vec3()?,
        "front" => camera.front = field.vec3()?,
        "fov" => camera.fov = field.float()?,
        "near" => camera.near_plane = field.float()?,
        "far" => camera.far_plane = field.float()?,
        "speed" => camera.speed = field.float()?,
        _ => return Err(field.unknown("camera")),
    }
    Ok(())
}

fn apply_light(light: &mut Light, field: &Field) -> Result<(), LoadError> {
    match field.key {
        "position" => light.position = field.vec3()?,
        "diffuse" => light.diffuse = field.rgba()?,
        "attenuation" => light.attenuation = field.vec4()?,
        "direction" => light.direction = field.vec3()?,
        "type" => {
            light.kind =
                LightType::parse(field.single()?).ok_or_else(|| field.error("unknown light type"))?
        }
        "param1" => light.param1 = field.vec2()?,
        "param2" => light.param2 = field.vec2()?,
        "enabled" => light.enabled = field.boolean()?,
        _ => return Err(field.unknown("light")),
    }
    Ok(())
}

fn apply_model(
    model: &mut Model,
    transform: &mut TransformComponent,
    field: &Field,
) -> Result<(), LoadError> {
    if apply_transform(transform, field)? {
        return Ok(());
    }
    match field.key {
        "mesh" => model.mesh = field.single()?.to_string(),
        "colour" => model.colour = field.rgba()?,
        "colour_mode" => {
            model.colour_mode = ColourMode::parse(field.single()?)
                .ok_or_else(|| field.error("unknown colour mode"))?
        }
        "lighted" => model.lighted = field.boolean()?,
        "visible" => model.visible = field.boolean()?,
        "specular" => model.specular = field.vec4()?,
        _ => return Err(field.unknown("model")),
    }
    Ok(())
}

fn apply_primitive(
    primitive: &mut Primitive,
    transform: &mut TransformComponent,
    colour: &mut Option<ColourComponent>,
    field: &Field,
) -> Result<(), LoadError> {
    if apply_transform(transform, field)? || apply_colour(colour, field)? {
        return Ok(());
    }
    match field.key {
        "type" => {
            primitive.kind = PrimitiveType::parse(field.single()?)
                .ok_or_else(|| field.error("unknown primitive type"))?
        }
        "size" => primitive.size = field.extent()?,
        _ => return Err(field.unknown("primitive")),
    }
    Ok(())
}

fn apply_grid(
    grid: &mut Grid,
    transform: &mut TransformComponent,
    colour: &mut Option<ColourComponent>,
    field: &Field,
) -> Result<(), LoadError> {
    if apply_transform(transform, field)? || apply_colour(colour, field)? {
        return Ok(());
    }
    match field.key {
        "type" => {
            grid.kind =
                GridType::parse(field.single()?).ok_or_else(|| field.error("unknown grid type"))?
        }
        "count" => {
            grid.count = i32::try_from(field.int()?).map_err(|_| field.error("count overflows"))?
        }
        "spacing" => grid.spacing = field.float()?,
        "size" => grid.size = field.extent()?,
        _ => return Err(field.unknown("grid")),
    }
    Ok(())
}

fn apply_texture(data: &mut TextureData, field: &Field) -> Result<(), LoadError> {
    match field.key {
        "face" => data.faces.push(field.single()?.to_string()),
        "faces" => data.faces.extend(field.values.iter().map(|v| v.to_string())),
        _ => return Err(field.unknown("texture")),
    }
    Ok(())
}

fn apply_connection(connection: &mut TextureConnection, field: &Field) -> Result<(), LoadError> {
    match field.key {
        "model" => connection.model = field.single()?.to_string(),
        "texture" => {
            // no value or "-" unbinds the slot
            connection.texture = match field.values.as_slice() {
                [] | ["-"] => String::new(),
                [name] => name.to_string(),
                other => return Err(field.error(format!("expected one value, got {}", other.len()))),
            }
        }
        "slot" => {
            connection.slot =
                usize::try_from(field.int()?).map_err(|_| field.error("slot must not be negative"))?
        }
        "mix" => connection.mix = field.float()?,
        _ => return Err(field.unknown("connect")),
    }
    Ok(())
}

enum Pending {
    Camera(Camera),
    Light(Light),
    Model(Model, TransformComponent),
    Primitive(Primitive, TransformComponent, Option<ColourComponent>),
    Grid(Grid, TransformComponent, Option<ColourComponent>),
    Texture(TextureData),
    Connection(TextureConnection),
}

impl Pending {
    fn open(kind: &str, flags: &[&str], line: usize) -> Result<Self, LoadError> {
        if kind != "texture" && !flags.is_empty() {
            return Err(parse_error(line, format!("{} blocks take no flags", kind)));
        }
        Ok(match kind {
            "camera" => Self::Camera(Camera::default()),
            "light" => Self::Light(Light::default()),
            "model" => Self::Model(Model::default(), TransformComponent::default()),
            "primitive" => Self::Primitive(Primitive::default(), TransformComponent::default(), None),
            "grid" => Self::Grid(Grid::default(), TransformComponent::default(), None),
            "texture" => match flags {
                [] => Self::Texture(TextureData::default()),
                ["cube"] => Self::Texture(TextureData {
                    is_cube: true,
                    faces: Vec::new(),
                }),
                _ => return Err(parse_error(line, "texture blocks only accept the 'cube' flag")),
            },
            "connect" => Self::Connection(TextureConnection::default()),
            other => return Err(parse_error(line, format!("unknown block kind '{}'", other))),
        })
    }

    fn apply(&mut self, field: &Field) -> Result<(), LoadError> {
        match self {
            Self::Camera(camera) => apply_camera(camera, field),
            Self::Light(light) => apply_light(light, field),
            Self::Model(model, transform) => apply_model(model, transform, field),
            Self::Primitive(primitive, transform, colour) => {
                apply_primitive(primitive, transform, colour, field)
            }
            Self::Grid(grid, transform, colour) => apply_grid(grid, transform, colour, field),
            Self::Texture(data) => apply_texture(data, field),
            Self::Connection(connection) => apply_connection(connection, field),
        }
    }

    fn close(self, name: &str, line: usize) -> Result<Record, LoadError> {
        Ok(match self {
            Self::Camera(mut camera) => {
                camera.sync_angles();
                Record::Camera(camera)
            }
            Self::Light(light) => Record::Light(light),
            Self::Model(model, transform) => {
                if model.mesh.is_empty() {
                    return Err(parse_error(line, format!("model '{}' has no mesh", name)));
                }
                Record::Model { model, transform }
            }
            Self::Primitive(primitive, transform, colour) => Record::Primitive {
                primitive,
                transform,
                colour,
            },
            Self::Grid(grid, transform, colour) => Record::Grid {
                grid,
                transform,
                colour,
            },
            Self::Texture(data) => {
                let expected = if data.is_cube { TextureData::CUBE_FACES } else { 1 };
                if data.faces.len() != expected {
                    return Err(parse_error(
                        line,
                        format!(
                            "texture '{}' needs {} face(s), got {}",
                            name,
                            expected,
                            data.faces.len()
                        ),
                    ));
                }
                Record::Texture(data)
            }
            Self::Connection(connection) => {
                if connection.model.is_empty() {
                    return Err(parse_error(line, format!("connection '{}' names no model", name)));
                }
                Record::Connection(connection)
            }
        })
    }
}

/// Parses scene text into blocks. The first malformed line aborts parsing.
pub fn parse_scene(text: &str) -> Result<SceneFile, LoadError> {
    let mut blocks = Vec::new();
    let mut open: Option<(usize, String, Pending)> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        let mut words = content.split_whitespace();
        let Some(head) = words.next() else {
            continue;
        };
        let rest: Vec<&str> = words.collect();

        match open.take() {
            None => {
                let [name, flags @ ..] = rest.as_slice() else {
                    return Err(parse_error(line, format!("'{}' block needs a name", head)));
                };
                let pending = Pending::open(head, flags, line)?;
                open = Some((line, name.to_string(), pending));
            }
            Some((start, name, pending)) if head == "end" => {
                if !rest.is_empty() {
                    return Err(parse_error(line, "'end' takes no values"));
                }
                let record = pending.close(&name, start)?;
                blocks.push(Block {
                    line: start,
                    name,
                    record,
                });
            }
            Some((start, name, mut pending)) => {
                pending.apply(&Field {
                    line,
                    key: head,
                    values: rest,
                })?;
                open = Some((start, name, pending));
            }
        }
    }

    if let Some((start, name, _)) = open {
        return Err(parse_error(start, format!("block '{}' is missing 'end'", name)));
    }
    Ok(SceneFile { blocks })
}
