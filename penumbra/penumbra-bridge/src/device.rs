//! wgpu device. Programs, vertex arrays and render state are resolved into render pipelines
//! lazily, keyed by everything the pipeline bakes in; bind groups are built per draw from
//! the reflected program layout.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroU64;
use std::sync::{Arc, Mutex};

use penumbra_rhi::{
    check_framebuffer, reflect_program, BlendFactor, BlendState, BufferDescriptor, BufferId, BufferUsage, ClearColor,
    ColorWrites, Command, CommandList, CompareOp, CompiledProgram, CullMode, DebugMessage, DebugSeverity, DebugSource,
    DebugType, DeviceLimits, FramebufferDescriptor, FramebufferId, FramebufferStatus, GpuDevice, LoadOp,
    PassDescriptor, PipelineState, ProgramDescriptor, ProgramId, ProgramLayout, RenderTargetRef, RhiError,
    StencilFaceState, StencilOp, StencilState, TextureDescriptor, TextureFormat, TextureId, TextureInfo,
    TextureSampleKind, TextureUsage, VertexArrayDescriptor, VertexArrayId, VertexAttribute, FRAGMENT_ENTRY_POINT,
    VERTEX_ENTRY_POINT,
};

/// Format of the depth-stencil attachment paired with the default target.
const DEFAULT_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;
/// Format of the default target when no surface view was supplied.
const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

struct GpuBuffer {
    buffer: wgpu::Buffer,
    size: u64,
    label: String,
}

struct GpuTexture {
    texture: wgpu::Texture,
    /// Full view used as a render attachment.
    attachment: wgpu::TextureView,
    /// Depth-only for depth-stencil formats.
    sampled: wgpu::TextureView,
    info: TextureInfo,
}

struct GpuProgram {
    name: String,
    module: wgpu::ShaderModule,
    layout: ProgramLayout,
    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
}

struct GpuVertexArray {
    vertex_buffer: BufferId,
    vertex_offset: u64,
    index_buffer: BufferId,
    stride: u32,
    attributes: Vec<VertexAttribute>,
}

struct GpuFramebuffer {
    colors: Vec<TextureId>,
    depth_stencil: Option<TextureId>,
}

struct DefaultTarget {
    /// Kept alive for offscreen targets; surface textures belong to the surface.
    _texture: Option<wgpu::Texture>,
    view: wgpu::TextureView,
    format: wgpu::TextureFormat,
    size: (u32, u32),
}

struct DepthTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: (u32, u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramId,
    stride: u32,
    attributes: Vec<VertexAttribute>,
    state: PipelineState,
    colors: Vec<wgpu::TextureFormat>,
    depth: Option<wgpu::TextureFormat>,
}

/// Per-pass binding state accumulated from the command stream.
#[derive(Default)]
struct Bindings {
    state: PipelineState,
    program: Option<ProgramId>,
    vertex_array: Option<VertexArrayId>,
    uniforms: BTreeMap<u32, (BufferId, u64, u64)>,
    textures: BTreeMap<u32, TextureId>,
}

pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    limits: DeviceLimits,
    buffers: Vec<GpuBuffer>,
    textures: Vec<Option<GpuTexture>>,
    programs: Vec<GpuProgram>,
    vertex_arrays: Vec<GpuVertexArray>,
    framebuffers: Vec<Option<GpuFramebuffer>>,
    pipelines: Vec<wgpu::RenderPipeline>,
    pipeline_index: HashMap<PipelineKey, usize>,
    sampler: wgpu::Sampler,
    surface_target: Option<DefaultTarget>,
    offscreen_target: Option<DefaultTarget>,
    default_depth: Option<DepthTarget>,
    errors: Arc<Mutex<Vec<DebugMessage>>>,
}

impl WgpuDevice {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        device.on_uncaptured_error(Box::new(move |error: wgpu::Error| {
            let kind = match &error {
                wgpu::Error::Validation { .. } => DebugType::Error,
                _ => DebugType::Other,
            };
            let message = DebugMessage {
                source: DebugSource::Api,
                kind,
                severity: DebugSeverity::High,
                message: error.to_string(),
            };
            if let Ok(mut queue) = sink.lock() {
                queue.push(message);
            }
        }));

        let wgpu_limits = device.limits();
        let limits = DeviceLimits {
            max_uniform_block_size: wgpu_limits.max_uniform_buffer_binding_size,
            uniform_offset_alignment: wgpu_limits.min_uniform_buffer_offset_alignment,
        };
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("penumbra_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        log::info!(
            "wgpu device: max uniform block {} bytes, offset alignment {}",
            limits.max_uniform_block_size,
            limits.uniform_offset_alignment
        );

        Self {
            device,
            queue,
            limits,
            buffers: Vec::new(),
            textures: Vec::new(),
            programs: Vec::new(),
            vertex_arrays: Vec::new(),
            framebuffers: Vec::new(),
            pipelines: Vec::new(),
            pipeline_index: HashMap::new(),
            sampler,
            surface_target: None,
            offscreen_target: None,
            default_depth: None,
            errors,
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Render default-target passes into `view` until [`WgpuDevice::release_surface_target`].
    pub fn set_surface_target(&mut self, view: wgpu::TextureView, format: wgpu::TextureFormat, width: u32, height: u32) {
        self.surface_target = Some(DefaultTarget {
            _texture: None,
            view,
            format,
            size: (width, height),
        });
    }

    /// Drop the surface view so the surface texture can be presented.
    pub fn release_surface_target(&mut self) {
        self.surface_target = None;
    }

    fn buffer(&self, id: BufferId) -> Result<&GpuBuffer, RhiError> {
        self.buffers.get(id.index()).ok_or(RhiError::UnknownHandle {
            kind: "buffer",
            index: id.0,
        })
    }

    fn texture(&self, id: TextureId) -> Result<&GpuTexture, RhiError> {
        self.textures
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(RhiError::UnknownHandle {
                kind: "texture",
                index: id.0,
            })
    }

    fn program(&self, id: ProgramId) -> Result<&GpuProgram, RhiError> {
        self.programs.get(id.index()).ok_or(RhiError::UnknownHandle {
            kind: "program",
            index: id.0,
        })
    }

    fn vertex_array(&self, id: VertexArrayId) -> Result<&GpuVertexArray, RhiError> {
        self.vertex_arrays.get(id.index()).ok_or(RhiError::UnknownHandle {
            kind: "vertex array",
            index: id.0,
        })
    }

    fn framebuffer(&self, id: FramebufferId) -> Result<&GpuFramebuffer, RhiError> {
        self.framebuffers
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(RhiError::UnknownHandle {
                kind: "framebuffer",
                index: id.0,
            })
    }

    fn texture_info(&self, id: TextureId) -> Option<TextureInfo> {
        self.textures.get(id.index()).and_then(Option::as_ref).map(|t| t.info)
    }

    /// Make sure a default target and its depth-stencil exist. Without a surface view the
    /// default target is an offscreen texture sized by the pass viewport.
    fn prepare_default_target(&mut self, viewport: Option<(u32, u32)>) -> Result<(), RhiError> {
        let size = match (&self.surface_target, viewport) {
            (Some(target), _) => target.size,
            (None, Some(size)) => size,
            (None, None) => match &self.offscreen_target {
                Some(target) => target.size,
                None => return Err(RhiError::InvalidCommand("default-target pass without a viewport".into())),
            },
        };
        if size.0 == 0 || size.1 == 0 {
            return Err(RhiError::InvalidCommand(format!("default target size {}x{}", size.0, size.1)));
        }

        if self.surface_target.is_none() && self.offscreen_target.as_ref().map(|t| t.size) != Some(size) {
            let texture = self.create_attachment("penumbra_offscreen", OFFSCREEN_FORMAT, size);
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            log::debug!("offscreen default target {}x{}", size.0, size.1);
            self.offscreen_target = Some(DefaultTarget {
                _texture: Some(texture),
                view,
                format: OFFSCREEN_FORMAT,
                size,
            });
        }
        if self.default_depth.as_ref().map(|d| d.size) != Some(size) {
            let texture = self.create_attachment("penumbra_default_depth", DEFAULT_DEPTH_FORMAT, size);
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            self.default_depth = Some(DepthTarget {
                _texture: texture,
                view,
                size,
            });
        }
        Ok(())
    }

    fn create_attachment(&self, label: &str, format: wgpu::TextureFormat, (width, height): (u32, u32)) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }

    fn default_target(&self) -> Result<(&DefaultTarget, &DepthTarget), RhiError> {
        let target = self
            .surface_target
            .as_ref()
            .or(self.offscreen_target.as_ref())
            .ok_or_else(|| RhiError::InvalidCommand("no default target".into()))?;
        let depth = self
            .default_depth
            .as_ref()
            .ok_or_else(|| RhiError::InvalidCommand("no default depth target".into()))?;
        Ok((target, depth))
    }

    /// Color formats and depth format of a pass target.
    fn target_formats(
        &self,
        target: RenderTargetRef,
    ) -> Result<(Vec<wgpu::TextureFormat>, Option<wgpu::TextureFormat>), RhiError> {
        match target {
            RenderTargetRef::Default => {
                let (color, _) = self.default_target()?;
                Ok((vec![color.format], Some(DEFAULT_DEPTH_FORMAT)))
            }
            RenderTargetRef::Framebuffer(id) => {
                let framebuffer = self.framebuffer(id)?;
                let colors = framebuffer
                    .colors
                    .iter()
                    .map(|t| self.texture(*t).map(|t| texture_format(t.info.format)))
                    .collect::<Result<Vec<_>, _>>()?;
                let depth = match framebuffer.depth_stencil {
                    Some(t) => Some(texture_format(self.texture(t)?.info.format)),
                    None => None,
                };
                Ok((colors, depth))
            }
        }
    }

    fn begin_pass<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
        desc: &PassDescriptor,
    ) -> Result<wgpu::RenderPass<'e>, RhiError> {
        let (color_views, depth_view): (Vec<&wgpu::TextureView>, Option<(&wgpu::TextureView, bool)>) = match desc.target {
            RenderTargetRef::Default => {
                let (color, depth) = self.default_target()?;
                (vec![&color.view], Some((&depth.view, true)))
            }
            RenderTargetRef::Framebuffer(id) => {
                let status = self.framebuffer_status(id);
                if !status.is_complete() {
                    return Err(RhiError::InvalidCommand(format!(
                        "pass '{}' targets an incomplete framebuffer: {}",
                        desc.label,
                        status.reason_code()
                    )));
                }
                let framebuffer = self.framebuffer(id)?;
                let colors = framebuffer
                    .colors
                    .iter()
                    .map(|t| self.texture(*t).map(|t| &t.attachment))
                    .collect::<Result<Vec<_>, _>>()?;
                let depth = match framebuffer.depth_stencil {
                    Some(t) => {
                        let texture = self.texture(t)?;
                        Some((&texture.attachment, texture.info.format.has_stencil()))
                    }
                    None => None,
                };
                (colors, depth)
            }
        };

        let color_ops = wgpu::Operations {
            load: match desc.color_load {
                LoadOp::Load => wgpu::LoadOp::Load,
                LoadOp::Clear(color) => wgpu::LoadOp::Clear(clear_color(color)),
            },
            store: wgpu::StoreOp::Store,
        };
        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment<'_>>> = color_views
            .into_iter()
            .map(|view| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: color_ops,
                })
            })
            .collect();
        let depth_stencil_attachment = depth_view.map(|(view, has_stencil)| wgpu::RenderPassDepthStencilAttachment {
            view,
            depth_ops: Some(wgpu::Operations {
                load: match desc.depth_load {
                    LoadOp::Load => wgpu::LoadOp::Load,
                    LoadOp::Clear(depth) => wgpu::LoadOp::Clear(depth),
                },
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: has_stencil.then_some(wgpu::Operations {
                load: match desc.stencil_load {
                    LoadOp::Load => wgpu::LoadOp::Load,
                    LoadOp::Clear(stencil) => wgpu::LoadOp::Clear(stencil),
                },
                store: wgpu::StoreOp::Store,
            }),
        });

        Ok(encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(desc.label),
            color_attachments: &color_attachments,
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
        }))
    }

    fn encode_pass(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        desc: &PassDescriptor,
        body: &[Command],
    ) -> Result<(), RhiError> {
        if desc.target == RenderTargetRef::Default {
            let viewport = body.iter().find_map(|c| match c {
                Command::SetViewport { width, height } => Some((*width, *height)),
                _ => None,
            });
            self.prepare_default_target(viewport)?;
        }
        let formats = self.target_formats(desc.target)?;
        let mut pass = self.begin_pass(encoder, desc)?;

        let mut bindings = Bindings::default();
        for command in body {
            match command {
                Command::SetViewport { width, height } => {
                    pass.set_viewport(0.0, 0.0, *width as f32, *height as f32, 0.0, 1.0);
                }
                Command::SetState(state) => bindings.state = *state,
                Command::UseProgram(program) => bindings.program = Some(*program),
                Command::BindUniformRange {
                    binding,
                    buffer,
                    offset,
                    size,
                } => {
                    bindings.uniforms.insert(*binding, (*buffer, *offset, *size));
                }
                Command::BindTexture { unit, texture } => {
                    bindings.textures.insert(*unit, *texture);
                }
                Command::BindVertexArray(vertex_array) => bindings.vertex_array = Some(*vertex_array),
                Command::DrawIndexed {
                    index_count,
                    first_index,
                } => self.encode_draw(&mut pass, &bindings, &formats, *index_count, *first_index)?,
                Command::BeginPass(_) | Command::EndPass => {
                    return Err(RhiError::InvalidCommand(format!("nested pass inside '{}'", desc.label)));
                }
            }
        }
        Ok(())
    }

    fn encode_draw(
        &mut self,
        pass: &mut wgpu::RenderPass<'_>,
        bindings: &Bindings,
        (colors, depth): &(Vec<wgpu::TextureFormat>, Option<wgpu::TextureFormat>),
        index_count: u32,
        first_index: u32,
    ) -> Result<(), RhiError> {
        let (program_id, vertex_array_id) = match (bindings.program, bindings.vertex_array) {
            (Some(p), Some(v)) => (p, v),
            _ => return Err(RhiError::InvalidCommand("draw without a program and vertex array".into())),
        };
        let vertex_array = self.vertex_array(vertex_array_id)?;
        let key = PipelineKey {
            program: program_id,
            stride: vertex_array.stride,
            attributes: vertex_array.attributes.clone(),
            state: bindings.state,
            colors: colors.clone(),
            depth: *depth,
        };
        let pipeline = self.pipeline(key)?;

        let vertex_array = self.vertex_array(vertex_array_id)?;
        let program = self.program(program_id)?;
        let mut uniform_entries = Vec::with_capacity(program.layout.uniform_bindings.len());
        for &binding in &program.layout.uniform_bindings {
            let (buffer, offset, size) = bindings.uniforms.get(&binding).copied().ok_or_else(|| {
                RhiError::InvalidCommand(format!("program '{}' reads uniform binding {binding}, none bound", program.name))
            })?;
            uniform_entries.push(wgpu::BindGroupEntry {
                binding,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &self.buffer(buffer)?.buffer,
                    offset,
                    size: NonZeroU64::new(size),
                }),
            });
        }
        let mut texture_entries = Vec::with_capacity(program.layout.textures.len() * 2);
        for texture in &program.layout.textures {
            let id = bindings.textures.get(&texture.unit).copied().ok_or_else(|| {
                RhiError::InvalidCommand(format!("program '{}' reads texture unit {}, none bound", program.name, texture.unit))
            })?;
            texture_entries.push(wgpu::BindGroupEntry {
                binding: 2 * texture.unit,
                resource: wgpu::BindingResource::TextureView(&self.texture(id)?.sampled),
            });
            if texture.sampled {
                texture_entries.push(wgpu::BindGroupEntry {
                    binding: 2 * texture.unit + 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                });
            }
        }
        let uniform_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("penumbra_uniforms"),
            layout: &program.uniform_layout,
            entries: &uniform_entries,
        });
        let texture_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("penumbra_textures"),
            layout: &program.texture_layout,
            entries: &texture_entries,
        });

        let vertex_buffer = self.buffer(vertex_array.vertex_buffer)?;
        let index_buffer = self.buffer(vertex_array.index_buffer)?;
        pass.set_pipeline(&self.pipelines[pipeline]);
        pass.set_bind_group(0, &uniform_group, &[]);
        pass.set_bind_group(1, &texture_group, &[]);
        pass.set_vertex_buffer(0, vertex_buffer.buffer.slice(vertex_array.vertex_offset..));
        pass.set_index_buffer(index_buffer.buffer.slice(..), wgpu::IndexFormat::Uint32);
        if let Some(stencil) = bindings.state.stencil {
            pass.set_stencil_reference(stencil.reference);
        }
        pass.draw_indexed(first_index..first_index + index_count, 0, 0..1);
        Ok(())
    }

    /// Index of the pipeline for `key`, created on first use.
    fn pipeline(&mut self, key: PipelineKey) -> Result<usize, RhiError> {
        if let Some(&index) = self.pipeline_index.get(&key) {
            return Ok(index);
        }
        let pipeline = self.create_pipeline(&key)?;
        let index = self.pipelines.len();
        self.pipelines.push(pipeline);
        self.pipeline_index.insert(key, index);
        Ok(index)
    }

    fn create_pipeline(&self, key: &PipelineKey) -> Result<wgpu::RenderPipeline, RhiError> {
        let program = self.program(key.program)?;
        let attributes = key
            .attributes
            .iter()
            .map(|a| {
                Ok(wgpu::VertexAttribute {
                    format: vertex_format(a.components)?,
                    offset: u64::from(a.offset),
                    shader_location: a.location,
                })
            })
            .collect::<Result<Vec<_>, RhiError>>()?;

        let state = &key.state;
        let depth_stencil = key.depth.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: state.depth.write,
            depth_compare: compare_function(state.depth.compare),
            stencil: match state.stencil {
                Some(stencil) if format.has_stencil_aspect() => stencil_state(&stencil),
                _ => wgpu::StencilState::default(),
            },
            bias: wgpu::DepthBiasState::default(),
        });
        let targets: Vec<Option<wgpu::ColorTargetState>> = key
            .colors
            .iter()
            .map(|&format| {
                Some(wgpu::ColorTargetState {
                    format,
                    blend: state.blend.map(blend_state),
                    write_mask: color_writes(state.color_writes),
                })
            })
            .collect();

        log::debug!("render pipeline for program '{}' ({} targets)", program.name, targets.len());
        Ok(self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&program.name),
            layout: Some(&program.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &program.module,
                entry_point: Some(VERTEX_ENTRY_POINT),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: u64::from(key.stride),
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &program.module,
                entry_point: Some(FRAGMENT_ENTRY_POINT),
                targets: &targets,
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: match state.cull {
                    CullMode::None => None,
                    CullMode::Back => Some(wgpu::Face::Back),
                    CullMode::Front => Some(wgpu::Face::Front),
                },
                ..Default::default()
            },
            depth_stencil,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        }))
    }
}

impl GpuDevice for WgpuDevice {
    fn limits(&self) -> DeviceLimits {
        self.limits
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor<'_>, contents: Option<&[u8]>) -> Result<BufferId, RhiError> {
        if desc.size == 0 {
            return Err(RhiError::InvalidDescriptor("buffer size 0".into()));
        }
        let mut usage = wgpu::BufferUsages::COPY_DST;
        for (flag, wgpu_flag) in [
            (BufferUsage::VERTEX, wgpu::BufferUsages::VERTEX),
            (BufferUsage::INDEX, wgpu::BufferUsages::INDEX),
            (BufferUsage::UNIFORM, wgpu::BufferUsages::UNIFORM),
        ] {
            if desc.usage.contains(flag) {
                usage |= wgpu_flag;
            }
        }
        let size = desc.size.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: desc.label,
            size,
            usage,
            mapped_at_creation: false,
        });
        let id = BufferId(self.buffers.len() as u32);
        self.buffers.push(GpuBuffer {
            buffer,
            size,
            label: desc.label.unwrap_or("buffer").to_string(),
        });
        if let Some(contents) = contents {
            self.write_buffer(id, 0, contents)?;
        }
        Ok(id)
    }

    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) -> Result<(), RhiError> {
        let target = self.buffer(buffer)?;
        if offset + data.len() as u64 > target.size {
            return Err(RhiError::OutOfBounds {
                offset,
                len: data.len() as u64,
                size: target.size,
            });
        }
        if offset % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(RhiError::InvalidCommand(format!(
                "write to '{}' at unaligned offset {offset}",
                target.label
            )));
        }
        if data.is_empty() {
            return Ok(());
        }
        let padded_len = (data.len() as u64).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT) as usize;
        if padded_len == data.len() {
            self.queue.write_buffer(&target.buffer, offset, data);
        } else {
            let mut padded = data.to_vec();
            padded.resize(padded_len, 0);
            self.queue.write_buffer(&target.buffer, offset, &padded);
        }
        Ok(())
    }

    fn create_texture(&mut self, desc: &TextureDescriptor<'_>, pixels: Option<&[u8]>) -> Result<TextureId, RhiError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(RhiError::InvalidDescriptor(format!("texture size {}x{}", desc.width, desc.height)));
        }
        let format = texture_format(desc.format);
        let mut usage = wgpu::TextureUsages::empty();
        for (flag, wgpu_flag) in [
            (TextureUsage::COPY_DST, wgpu::TextureUsages::COPY_DST),
            (TextureUsage::TEXTURE_BINDING, wgpu::TextureUsages::TEXTURE_BINDING),
            (TextureUsage::RENDER_ATTACHMENT, wgpu::TextureUsages::RENDER_ATTACHMENT),
        ] {
            if desc.usage.contains(flag) {
                usage |= wgpu_flag;
            }
        }
        if pixels.is_some() {
            usage |= wgpu::TextureUsages::COPY_DST;
        }
        let size = wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: desc.label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });

        if let Some(pixels) = pixels {
            let bytes_per_pixel = desc.format.upload_bytes_per_pixel().ok_or_else(|| {
                RhiError::InvalidDescriptor(format!("{:?} textures cannot be uploaded", desc.format))
            })?;
            let expected = desc.width as usize * desc.height as usize * bytes_per_pixel as usize;
            if pixels.len() != expected {
                return Err(RhiError::InvalidDescriptor(format!(
                    "texture upload of {} bytes, expected {expected}",
                    pixels.len()
                )));
            }
            self.queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                pixels,
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(desc.width * bytes_per_pixel),
                    rows_per_image: Some(desc.height),
                },
                size,
            );
        }

        let attachment = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampled = texture.create_view(&wgpu::TextureViewDescriptor {
            aspect: if desc.format.is_depth() {
                wgpu::TextureAspect::DepthOnly
            } else {
                wgpu::TextureAspect::All
            },
            ..Default::default()
        });
        let id = TextureId(self.textures.len() as u32);
        self.textures.push(Some(GpuTexture {
            texture,
            attachment,
            sampled,
            info: TextureInfo::from(desc),
        }));
        Ok(id)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        if let Some(gpu) = self.textures.get_mut(texture.index()).and_then(Option::take) {
            gpu.texture.destroy();
        }
    }

    fn create_program(&mut self, desc: &ProgramDescriptor<'_>) -> Result<CompiledProgram, RhiError> {
        let layout = reflect_program(desc.name, desc.source)?;

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.name),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(desc.source)),
        });
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            log::error!("program '{}' rejected by the device", desc.name);
            return Err(RhiError::ShaderCompilation {
                name: desc.name.to_string(),
                diagnostic: error.to_string(),
            });
        }

        let visibility = wgpu::ShaderStages::VERTEX_FRAGMENT;
        let uniform_entries: Vec<wgpu::BindGroupLayoutEntry> = layout
            .uniform_bindings
            .iter()
            .map(|&binding| wgpu::BindGroupLayoutEntry {
                binding,
                visibility,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            })
            .collect();
        let mut texture_entries = Vec::with_capacity(layout.textures.len() * 2);
        for texture in &layout.textures {
            texture_entries.push(wgpu::BindGroupLayoutEntry {
                binding: 2 * texture.unit,
                visibility,
                ty: wgpu::BindingType::Texture {
                    sample_type: match texture.kind {
                        TextureSampleKind::Float => wgpu::TextureSampleType::Float {
                            filterable: texture.sampled,
                        },
                        TextureSampleKind::Depth => wgpu::TextureSampleType::Depth,
                    },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
            if texture.sampled {
                texture_entries.push(wgpu::BindGroupLayoutEntry {
                    binding: 2 * texture.unit + 1,
                    visibility,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                });
            }
        }

        let uniform_layout = self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("penumbra_uniform_layout"),
            entries: &uniform_entries,
        });
        let texture_layout = self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("penumbra_texture_layout"),
            entries: &texture_entries,
        });
        let pipeline_layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(desc.name),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let id = ProgramId(self.programs.len() as u32);
        self.programs.push(GpuProgram {
            name: desc.name.to_string(),
            module,
            layout: layout.clone(),
            uniform_layout,
            texture_layout,
            pipeline_layout,
        });
        Ok(CompiledProgram { id, layout })
    }

    fn create_vertex_array(&mut self, desc: &VertexArrayDescriptor<'_>) -> Result<VertexArrayId, RhiError> {
        self.buffer(desc.vertex_buffer)?;
        self.buffer(desc.index_buffer)?;
        if desc.stride == 0 {
            return Err(RhiError::InvalidDescriptor("vertex stride 0".into()));
        }
        for attribute in desc.attributes {
            vertex_format(attribute.components)?;
        }
        let id = VertexArrayId(self.vertex_arrays.len() as u32);
        self.vertex_arrays.push(GpuVertexArray {
            vertex_buffer: desc.vertex_buffer,
            vertex_offset: desc.vertex_offset,
            index_buffer: desc.index_buffer,
            stride: desc.stride,
            attributes: desc.attributes.to_vec(),
        });
        Ok(id)
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDescriptor<'_>) -> Result<FramebufferId, RhiError> {
        let id = FramebufferId(self.framebuffers.len() as u32);
        self.framebuffers.push(Some(GpuFramebuffer {
            colors: desc.color_attachments.to_vec(),
            depth_stencil: desc.depth_stencil,
        }));
        Ok(id)
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId) {
        if let Some(slot) = self.framebuffers.get_mut(framebuffer.index()) {
            *slot = None;
        }
    }

    fn framebuffer_status(&self, framebuffer: FramebufferId) -> FramebufferStatus {
        let Ok(framebuffer) = self.framebuffer(framebuffer) else {
            return FramebufferStatus::MissingAttachment;
        };
        let colors: Vec<Option<TextureInfo>> = framebuffer.colors.iter().map(|t| self.texture_info(*t)).collect();
        let depth = framebuffer.depth_stencil.map(|t| self.texture_info(t));
        check_framebuffer(&colors, depth)
    }

    fn submit(&mut self, commands: &CommandList) -> Result<(), RhiError> {
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("penumbra_frame"),
        });
        let list = commands.commands();
        let mut start = 0;
        while start < list.len() {
            let Command::BeginPass(desc) = &list[start] else {
                return Err(RhiError::InvalidCommand(format!("{:?} outside of a pass", list[start])));
            };
            let end = list[start..]
                .iter()
                .position(|c| matches!(c, Command::EndPass))
                .map(|p| start + p)
                .ok_or_else(|| RhiError::InvalidCommand(format!("pass '{}' is never ended", desc.label)))?;
            self.encode_pass(&mut encoder, desc, &list[start + 1..end])?;
            start = end + 1;
        }
        self.queue.submit(Some(encoder.finish()));
        Ok(())
    }

    fn drain_debug_messages(&mut self) -> Vec<DebugMessage> {
        self.errors
            .lock()
            .map(|mut queue| std::mem::take(&mut *queue))
            .unwrap_or_default()
    }
}

fn texture_format(format: TextureFormat) -> wgpu::TextureFormat {
    match format {
        TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
        TextureFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        TextureFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        TextureFormat::Depth32Float => wgpu::TextureFormat::Depth32Float,
        TextureFormat::Depth24PlusStencil8 => wgpu::TextureFormat::Depth24PlusStencil8,
    }
}

fn vertex_format(components: u32) -> Result<wgpu::VertexFormat, RhiError> {
    match components {
        1 => Ok(wgpu::VertexFormat::Float32),
        2 => Ok(wgpu::VertexFormat::Float32x2),
        3 => Ok(wgpu::VertexFormat::Float32x3),
        4 => Ok(wgpu::VertexFormat::Float32x4),
        n => Err(RhiError::InvalidDescriptor(format!("vertex attribute with {n} components"))),
    }
}

fn clear_color(color: ClearColor) -> wgpu::Color {
    wgpu::Color {
        r: f64::from(color.r),
        g: f64::from(color.g),
        b: f64::from(color.b),
        a: f64::from(color.a),
    }
}

fn compare_function(op: CompareOp) -> wgpu::CompareFunction {
    match op {
        CompareOp::Never => wgpu::CompareFunction::Never,
        CompareOp::Less => wgpu::CompareFunction::Less,
        CompareOp::Equal => wgpu::CompareFunction::Equal,
        CompareOp::LessOrEqual => wgpu::CompareFunction::LessEqual,
        CompareOp::Greater => wgpu::CompareFunction::Greater,
        CompareOp::NotEqual => wgpu::CompareFunction::NotEqual,
        CompareOp::GreaterOrEqual => wgpu::CompareFunction::GreaterEqual,
        CompareOp::Always => wgpu::CompareFunction::Always,
    }
}

fn stencil_operation(op: StencilOp) -> wgpu::StencilOperation {
    match op {
        StencilOp::Keep => wgpu::StencilOperation::Keep,
        StencilOp::Zero => wgpu::StencilOperation::Zero,
        StencilOp::Replace => wgpu::StencilOperation::Replace,
        StencilOp::IncrementWrap => wgpu::StencilOperation::IncrementWrap,
        StencilOp::DecrementWrap => wgpu::StencilOperation::DecrementWrap,
    }
}

fn stencil_face(face: &StencilFaceState) -> wgpu::StencilFaceState {
    wgpu::StencilFaceState {
        compare: compare_function(face.compare),
        fail_op: stencil_operation(face.fail_op),
        depth_fail_op: stencil_operation(face.depth_fail_op),
        pass_op: stencil_operation(face.pass_op),
    }
}

fn stencil_state(stencil: &StencilState) -> wgpu::StencilState {
    wgpu::StencilState {
        front: stencil_face(&stencil.front),
        back: stencil_face(&stencil.back),
        read_mask: stencil.read_mask,
        write_mask: stencil.write_mask,
    }
}

fn blend_factor(factor: BlendFactor) -> wgpu::BlendFactor {
    match factor {
        BlendFactor::Zero => wgpu::BlendFactor::Zero,
        BlendFactor::One => wgpu::BlendFactor::One,
        BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
    }
}

fn blend_state(blend: BlendState) -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: blend_factor(blend.src),
        dst_factor: blend_factor(blend.dst),
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

fn color_writes(writes: ColorWrites) -> wgpu::ColorWrites {
    let mut mask = wgpu::ColorWrites::empty();
    for (flag, wgpu_flag) in [
        (ColorWrites::RED, wgpu::ColorWrites::RED),
        (ColorWrites::GREEN, wgpu::ColorWrites::GREEN),
        (ColorWrites::BLUE, wgpu::ColorWrites::BLUE),
        (ColorWrites::ALPHA, wgpu::ColorWrites::ALPHA),
    ] {
        if writes.contains(flag) {
            mask |= wgpu_flag;
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;
    use penumbra_rhi::DepthState;

    #[test]
    fn stencil_masks_and_ops_carry_over() {
        let face = StencilFaceState {
            compare: CompareOp::Always,
            fail_op: StencilOp::Keep,
            depth_fail_op: StencilOp::IncrementWrap,
            pass_op: StencilOp::Keep,
        };
        let state = stencil_state(&StencilState {
            front: StencilFaceState::IGNORE,
            back: face,
            read_mask: 0xFF,
            write_mask: 0x0F,
            reference: 0,
        });
        assert_eq!(state.back.depth_fail_op, wgpu::StencilOperation::IncrementWrap);
        assert_eq!(state.front.compare, wgpu::CompareFunction::Always);
        assert_eq!(state.write_mask, 0x0F);
    }

    #[test]
    fn additive_blend_is_one_one() {
        let blend = blend_state(BlendState::ADDITIVE);
        assert_eq!(blend.color.src_factor, wgpu::BlendFactor::One);
        assert_eq!(blend.alpha.dst_factor, wgpu::BlendFactor::One);
    }

    #[test]
    fn empty_color_writes_disable_every_channel() {
        assert_eq!(color_writes(ColorWrites::empty()), wgpu::ColorWrites::empty());
        assert_eq!(color_writes(ColorWrites::ALL), wgpu::ColorWrites::ALL);
    }

    #[test]
    fn pipeline_keys_distinguish_render_state() {
        let key = |state: PipelineState| PipelineKey {
            program: ProgramId(0),
            stride: 32,
            attributes: Vec::new(),
            state,
            colors: vec![wgpu::TextureFormat::Rgba16Float],
            depth: Some(DEFAULT_DEPTH_FORMAT),
        };
        let read_only = PipelineState {
            depth: DepthState::LESS_READ_ONLY,
            ..PipelineState::default()
        };
        assert_ne!(key(PipelineState::default()), key(read_only));
        assert_eq!(key(read_only), key(read_only));
    }

    #[test]
    fn only_float_vertex_formats_up_to_four_components() {
        assert_eq!(vertex_format(3).unwrap(), wgpu::VertexFormat::Float32x3);
        assert!(vertex_format(5).is_err());
    }
}
