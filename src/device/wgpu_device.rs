use std::{iter, num::NonZeroU64};

use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use super::{
    CullFace, MeshHandle, ProgramId, ProgramLayout, RenderDevice, TEXTURE_UNITS, TextureHandle,
    UniformKind, UniformLocation, UniformValue,
};
use crate::{
    context::Context,
    data_structures::{
        mesh::MeshData,
        texture::{Texture, TextureImage, TextureKind, create_default_sampler},
    },
    errors::DeviceError,
    pipelines::forward::{PipelineKey, mk_forward_pipeline, texture_layout, uniform_layout},
};

/// Dynamic uniform offsets must be multiples of this.
const UNIFORM_ALIGNMENT: usize = 256;
const MIN_BLOCK_SIZE: usize = 16;
const CUBE_BINDING: usize = 4;

struct ProgramRecord {
    label: String,
    layout: ProgramLayout,
    module: wgpu::ShaderModule,
    staging: Vec<u8>,
    /// Texture unit feeding each texture binding.
    units: [u32; TEXTURE_UNITS],
}

impl ProgramRecord {
    fn slice_size(&self) -> usize {
        (self.layout.block_size as usize).max(MIN_BLOCK_SIZE)
    }
}

struct MeshRecord {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct DrawCall {
    program: ProgramId,
    mesh: MeshHandle,
    key: PipelineKey,
    uniform_offset: u32,
    /// Texture id per binding, zero selects the default texture.
    textures: [u32; TEXTURE_UNITS],
}

/// [`RenderDevice`] backed by wgpu.
///
/// Uniform writes and state changes go into CPU-side staging. Every
/// `draw_indexed` snapshots the active program's uniform block and raster
/// state; `present` uploads all snapshots into one buffer and replays the
/// draws into a single render pass.
pub struct WgpuDevice {
    ctx: Context,
    clear_colour: wgpu::Color,
    programs: Vec<ProgramRecord>,
    meshes: Vec<MeshRecord>,
    textures: Vec<Texture>,
    active: Option<ProgramId>,
    units: [Option<TextureHandle>; TEXTURE_UNITS],
    cull: CullFace,
    depth_write: bool,
    wireframe: bool,
    frame_uniforms: Vec<u8>,
    draws: Vec<DrawCall>,
    uniform_buffer: wgpu::Buffer,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    uniform_groups: FxHashMap<ProgramId, wgpu::BindGroup>,
    texture_groups: FxHashMap<[u32; TEXTURE_UNITS], wgpu::BindGroup>,
    pipelines: FxHashMap<(ProgramId, PipelineKey), wgpu::RenderPipeline>,
    sampler: wgpu::Sampler,
    default_2d: Texture,
    default_cube: Texture,
}

impl WgpuDevice {
    pub fn new(ctx: Context, clear_colour: wgpu::Color) -> Self {
        let device = &ctx.device;
        let uniform_layout = uniform_layout(device);
        let texture_layout = texture_layout(device);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Forward Pipeline Layout"),
            bind_group_layouts: &[Some(&uniform_layout), Some(&texture_layout)],
            immediate_size: 0,
        });
        let uniform_buffer = Self::create_uniform_buffer(device, 64 * UNIFORM_ALIGNMENT as u64);
        let sampler = create_default_sampler(device);
        let default_2d = Texture::from_texture_image(
            device,
            &ctx.queue,
            &TextureImage::solid([255, 255, 255, 255], TextureKind::D2),
            Some("default 2d texture"),
        );
        let default_cube = Texture::from_texture_image(
            device,
            &ctx.queue,
            &TextureImage::solid([0, 0, 0, 255], TextureKind::Cube),
            Some("default cube texture"),
        );

        Self {
            ctx,
            clear_colour,
            programs: Vec::new(),
            meshes: Vec::new(),
            textures: Vec::new(),
            active: None,
            units: [None; TEXTURE_UNITS],
            cull: CullFace::Back,
            depth_write: true,
            wireframe: false,
            frame_uniforms: Vec::new(),
            draws: Vec::new(),
            uniform_buffer,
            uniform_layout,
            texture_layout,
            pipeline_layout,
            uniform_groups: FxHashMap::default(),
            texture_groups: FxHashMap::default(),
            pipelines: FxHashMap::default(),
            sampler,
            default_2d,
            default_cube,
        }
    }

    fn create_uniform_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniform Buffer"),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.ctx.resize(width, height);
    }

    pub fn set_clear_colour(&mut self, colour: wgpu::Color) {
        self.clear_colour = colour;
    }

    fn program(&self, id: ProgramId) -> Option<&ProgramRecord> {
        id.0.checked_sub(1)
            .and_then(|index| self.programs.get(index as usize))
    }

    fn program_mut(&mut self, id: ProgramId) -> Option<&mut ProgramRecord> {
        id.0.checked_sub(1)
            .and_then(|index| self.programs.get_mut(index as usize))
    }

    fn texture(&self, id: u32) -> Option<&Texture> {
        id.checked_sub(1)
            .and_then(|index| self.textures.get(index as usize))
    }

    fn reset_frame(&mut self) {
        self.draws.clear();
        self.frame_uniforms.clear();
    }

    fn ensure_uniform_capacity(&mut self) {
        let needed = self.frame_uniforms.len() as u64;
        if needed <= self.uniform_buffer.size() {
            return;
        }
        let size = needed.next_power_of_two();
        log::debug!("growing frame uniform buffer to {} bytes", size);
        self.uniform_buffer = Self::create_uniform_buffer(&self.ctx.device, size);
        self.uniform_groups.clear();
    }

    fn prepare_bind_groups(&mut self, draws: &[DrawCall]) {
        for draw in draws {
            if !self.uniform_groups.contains_key(&draw.program) {
                let Some(program) = self.program(draw.program) else {
                    continue;
                };
                let group = self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("{} uniforms", program.label)),
                    layout: &self.uniform_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: &self.uniform_buffer,
                            offset: 0,
                            size: NonZeroU64::new(program.slice_size() as u64),
                        }),
                    }],
                });
                self.uniform_groups.insert(draw.program, group);
            }

            if !self.texture_groups.contains_key(&draw.textures) {
                let views: Vec<&wgpu::TextureView> = draw
                    .textures
                    .iter()
                    .enumerate()
                    .map(|(binding, &id)| {
                        let wanted = if binding == CUBE_BINDING {
                            TextureKind::Cube
                        } else {
                            TextureKind::D2
                        };
                        match self.texture(id) {
                            Some(texture) if texture.kind == wanted => &texture.view,
                            Some(_) => {
                                log::warn!(
                                    "texture {} bound to binding {} has the wrong dimension",
                                    id,
                                    binding
                                );
                                self.default_view(wanted)
                            }
                            None => self.default_view(wanted),
                        }
                    })
                    .collect();
                let mut entries: Vec<wgpu::BindGroupEntry> = views
                    .iter()
                    .enumerate()
                    .map(|(binding, view)| wgpu::BindGroupEntry {
                        binding: binding as u32,
                        resource: wgpu::BindingResource::TextureView(view),
                    })
                    .collect();
                entries.push(wgpu::BindGroupEntry {
                    binding: TEXTURE_UNITS as u32,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                });
                let group = self.ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("texture units"),
                    layout: &self.texture_layout,
                    entries: &entries,
                });
                self.texture_groups.insert(draw.textures, group);
            }

            let pipeline_key = (draw.program, draw.key);
            if !self.pipelines.contains_key(&pipeline_key) {
                let Some(program) = self.program(draw.program) else {
                    continue;
                };
                log::debug!("building pipeline for '{}' with {:?}", program.label, draw.key);
                let pipeline = mk_forward_pipeline(
                    &self.ctx.device,
                    &self.pipeline_layout,
                    self.ctx.config.format,
                    &program.module,
                    draw.key,
                );
                self.pipelines.insert(pipeline_key, pipeline);
            }
        }
    }

    fn default_view(&self, kind: TextureKind) -> &wgpu::TextureView {
        match kind {
            TextureKind::D2 => &self.default_2d.view,
            TextureKind::Cube => &self.default_cube.view,
        }
    }
}

impl RenderDevice for WgpuDevice {
    fn create_program(&mut self, label: &str, source: &str) -> Result<ProgramId, DeviceError> {
        let layout = ProgramLayout::from_wgsl(source).map_err(|reason| DeviceError::Compile {
            label: label.to_string(),
            reason,
        })?;
        let module = self
            .ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.to_string().into()),
            });
        let staging = vec![0; (layout.block_size as usize).max(MIN_BLOCK_SIZE)];
        let mut units = [0; TEXTURE_UNITS];
        for (binding, unit) in units.iter_mut().enumerate() {
            *unit = binding as u32;
        }
        self.programs.push(ProgramRecord {
            label: label.to_string(),
            layout,
            module,
            staging,
            units,
        });
        Ok(ProgramId(self.programs.len() as u32))
    }

    fn use_program(&mut self, program: ProgramId) -> Result<(), DeviceError> {
        if self.program(program).is_none() {
            return Err(DeviceError::InvalidHandle {
                kind: "program",
                id: program.0,
            });
        }
        self.active = Some(program);
        Ok(())
    }

    fn active_program(&self) -> Option<ProgramId> {
        self.active
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let index = self.program(program)?.layout.location(name)?;
        Some(UniformLocation { program, index })
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        if self.active != Some(location.program) {
            log::warn!(
                "uniform write for program {} while program {:?} is active",
                location.program.0,
                self.active.map(|p| p.0)
            );
            return;
        }
        let Some(program) = self.program_mut(location.program) else {
            return;
        };
        let Some(info) = program.layout.get(location.index).cloned() else {
            return;
        };
        if !value.fits(info.kind) {
            log::warn!("{:?} does not fit uniform '{}' ({:?})", value, info.name, info.kind);
            return;
        }
        match (info.kind, value) {
            (
                UniformKind::Texture2D { binding } | UniformKind::TextureCube { binding },
                UniformValue::Int(unit),
            ) => {
                let (binding, unit) = (binding as usize, unit as u32);
                if binding < TEXTURE_UNITS && (unit as usize) < TEXTURE_UNITS {
                    program.units[binding] = unit;
                } else {
                    log::warn!("texture unit {} for '{}' is out of range", unit, info.name);
                }
            }
            _ => {
                let bytes = value.to_bytes();
                let start = info.offset as usize;
                let end = start + bytes.len();
                if let Some(slot) = program.staging.get_mut(start..end) {
                    slot.copy_from_slice(&bytes);
                }
            }
        }
    }

    fn upload_mesh(&mut self, label: &str, mesh: &MeshData) -> Result<MeshHandle, DeviceError> {
        mesh.validate().map_err(|reason| DeviceError::Upload {
            label: label.to_string(),
            reason,
        })?;
        let vertex_buffer = self
            .ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Vertex Buffer", label)),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Index Buffer", label)),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        self.meshes.push(MeshRecord {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        });
        Ok(MeshHandle(self.meshes.len() as u32))
    }

    fn upload_texture(
        &mut self,
        label: &str,
        image: &TextureImage,
    ) -> Result<TextureHandle, DeviceError> {
        let expected = image.width as usize * image.height as usize * 4;
        let layers = match image.kind {
            TextureKind::D2 => 1,
            TextureKind::Cube => 6,
        };
        if image.width == 0
            || image.height == 0
            || image.faces.len() != layers
            || image.faces.iter().any(|face| face.len() != expected)
        {
            return Err(DeviceError::Upload {
                label: label.to_string(),
                reason: format!(
                    "expected {} face(s) of {}x{} RGBA8 pixels",
                    layers, image.width, image.height
                ),
            });
        }
        let texture =
            Texture::from_texture_image(&self.ctx.device, &self.ctx.queue, image, Some(label));
        self.textures.push(texture);
        Ok(TextureHandle(self.textures.len() as u32))
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureHandle) {
        match self.units.get_mut(unit as usize) {
            Some(slot) => *slot = Some(texture),
            None => log::warn!("texture unit {} is out of range", unit),
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
        if enabled && !self.ctx.wireframe_supported {
            log::warn!("wireframe requested but the adapter cannot draw polygon lines");
        }
        self.wireframe = enabled;
    }

    fn wireframe(&self) -> bool {
        self.wireframe
    }

    fn clear(&mut self) {
        self.reset_frame();
    }

    fn draw_indexed(&mut self, mesh: MeshHandle) -> Result<(), DeviceError> {
        let program_id = self.active.ok_or(DeviceError::InvalidHandle {
            kind: "program",
            id: 0,
        })?;
        if mesh.0 == 0 || mesh.0 as usize > self.meshes.len() {
            return Err(DeviceError::InvalidHandle {
                kind: "mesh",
                id: mesh.0,
            });
        }
        let key = PipelineKey {
            cull: self.cull,
            depth_write: self.depth_write,
            wireframe: self.wireframe && self.ctx.wireframe_supported,
        };
        let units = self.units;
        let program = self.program(program_id).ok_or(DeviceError::InvalidHandle {
            kind: "program",
            id: program_id.0,
        })?;

        let mut textures = [0; TEXTURE_UNITS];
        for info in program.layout.uniforms() {
            if let UniformKind::Texture2D { binding } | UniformKind::TextureCube { binding } =
                info.kind
            {
                let binding = binding as usize;
                if binding < TEXTURE_UNITS {
                    let unit = program.units[binding] as usize;
                    textures[binding] = units[unit].map_or(0, |t| t.0);
                }
            }
        }

        let offset = self.frame_uniforms.len().next_multiple_of(UNIFORM_ALIGNMENT);
        let snapshot_len = program.slice_size();
        let mut snapshot = program.staging.clone();
        snapshot.resize(snapshot_len, 0);
        self.frame_uniforms.resize(offset, 0);
        self.frame_uniforms.extend_from_slice(&snapshot);

        self.draws.push(DrawCall {
            program: program_id,
            mesh,
            key,
            uniform_offset: offset as u32,
            textures,
        });
        Ok(())
    }

    fn present(&mut self) -> Result<(), DeviceError> {
        if !self.ctx.is_surface_configured() {
            self.reset_frame();
            return Ok(());
        }

        let output = match self.ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(output)
            | wgpu::CurrentSurfaceTexture::Suboptimal(output) => output,
            wgpu::CurrentSurfaceTexture::Lost | wgpu::CurrentSurfaceTexture::Outdated => {
                let (width, height) = (self.ctx.config.width, self.ctx.config.height);
                self.ctx.resize(width, height);
                self.reset_frame();
                return Ok(());
            }
            wgpu::CurrentSurfaceTexture::Timeout => {
                log::warn!("surface timed out, skipping frame");
                self.reset_frame();
                return Ok(());
            }
            e => {
                self.reset_frame();
                return Err(DeviceError::Present(format!("{e:?}")));
            }
        };

        let draws = std::mem::take(&mut self.draws);
        let padded = self.frame_uniforms.len().next_multiple_of(4);
        self.frame_uniforms.resize(padded, 0);
        self.ensure_uniform_capacity();
        if !self.frame_uniforms.is_empty() {
            self.ctx
                .queue
                .write_buffer(&self.uniform_buffer, 0, &self.frame_uniforms);
        }
        self.prepare_bind_groups(&draws);

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Forward Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            for draw in &draws {
                let (Some(pipeline), Some(uniforms), Some(textures), Some(mesh)) = (
                    self.pipelines.get(&(draw.program, draw.key)),
                    self.uniform_groups.get(&draw.program),
                    self.texture_groups.get(&draw.textures),
                    draw.mesh
                        .0
                        .checked_sub(1)
                        .and_then(|i| self.meshes.get(i as usize)),
                ) else {
                    continue;
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, uniforms, &[draw.uniform_offset]);
                render_pass.set_bind_group(1, textures, &[]);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        self.frame_uniforms.clear();
        Ok(())
    }
}
