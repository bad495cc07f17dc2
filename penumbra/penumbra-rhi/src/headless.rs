//! Headless device: keeps resources in memory and records submitted command lists.
//! Buffer contents are retained so callers can inspect exactly what was uploaded, and
//! every submission is validated the way a real backend would reject it.

use crate::{
    check_framebuffer, BufferDescriptor, BufferId, BufferUsage, Command, CommandList, CompiledProgram, DebugMessage,
    DeviceLimits, FramebufferDescriptor, FramebufferId, FramebufferStatus, GpuDevice, ProgramDescriptor, ProgramId,
    ProgramLayout, RenderTargetRef, RhiError, TextureDescriptor, TextureId, TextureInfo, VertexArrayDescriptor,
    VertexArrayId, VertexAttribute,
};

#[derive(Debug, Clone)]
pub struct RecordedBuffer {
    pub label: String,
    pub usage: BufferUsage,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct RecordedTexture {
    pub label: String,
    pub info: TextureInfo,
}

#[derive(Debug, Clone)]
pub struct RecordedProgram {
    pub name: String,
    pub layout: ProgramLayout,
}

#[derive(Debug, Clone)]
pub struct RecordedVertexArray {
    pub label: String,
    pub vertex_buffer: BufferId,
    pub vertex_offset: u64,
    pub index_buffer: BufferId,
    pub stride: u32,
    pub attributes: Vec<VertexAttribute>,
}

#[derive(Debug, Clone)]
pub struct RecordedFramebuffer {
    pub label: String,
    pub color_attachments: Vec<TextureId>,
    pub depth_stencil: Option<TextureId>,
    pub status: FramebufferStatus,
}

#[derive(Debug, Default)]
pub struct RecordingDevice {
    limits: DeviceLimits,
    buffers: Vec<RecordedBuffer>,
    textures: Vec<Option<RecordedTexture>>,
    programs: Vec<RecordedProgram>,
    vertex_arrays: Vec<RecordedVertexArray>,
    framebuffers: Vec<Option<RecordedFramebuffer>>,
    submissions: Vec<CommandList>,
    pending_messages: Vec<DebugMessage>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: DeviceLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    pub fn buffer(&self, id: BufferId) -> Option<&RecordedBuffer> {
        self.buffers.get(id.index())
    }

    pub fn buffer_data(&self, id: BufferId) -> Option<&[u8]> {
        self.buffer(id).map(|b| b.data.as_slice())
    }

    pub fn texture(&self, id: TextureId) -> Option<&RecordedTexture> {
        self.textures.get(id.index()).and_then(Option::as_ref)
    }

    /// Live textures (destroyed ones excluded).
    pub fn texture_count(&self) -> usize {
        self.textures.iter().filter(|t| t.is_some()).count()
    }

    pub fn program(&self, id: ProgramId) -> Option<&RecordedProgram> {
        self.programs.get(id.index())
    }

    pub fn vertex_array(&self, id: VertexArrayId) -> Option<&RecordedVertexArray> {
        self.vertex_arrays.get(id.index())
    }

    pub fn vertex_array_count(&self) -> usize {
        self.vertex_arrays.len()
    }

    pub fn framebuffer(&self, id: FramebufferId) -> Option<&RecordedFramebuffer> {
        self.framebuffers.get(id.index()).and_then(Option::as_ref)
    }

    /// Live framebuffers (destroyed ones excluded).
    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.iter().filter(|f| f.is_some()).count()
    }

    pub fn submissions(&self) -> &[CommandList] {
        &self.submissions
    }

    pub fn last_submission(&self) -> Option<&CommandList> {
        self.submissions.last()
    }

    /// Queue a message as if the driver had reported it.
    pub fn push_debug_message(&mut self, message: DebugMessage) {
        self.pending_messages.push(message);
    }

    fn texture_info(&self, id: TextureId) -> Option<TextureInfo> {
        self.texture(id).map(|t| t.info)
    }

    fn check_buffer(&self, id: BufferId) -> Result<&RecordedBuffer, RhiError> {
        self.buffer(id).ok_or(RhiError::UnknownHandle {
            kind: "buffer",
            index: id.0,
        })
    }

    fn validate(&self, list: &CommandList) -> Result<(), RhiError> {
        let mut in_pass = false;
        let mut program: Option<ProgramId> = None;
        let mut vertex_array: Option<VertexArrayId> = None;

        for command in list.commands() {
            match command {
                Command::BeginPass(desc) => {
                    if in_pass {
                        return Err(RhiError::InvalidCommand(format!("pass '{}' begun inside another pass", desc.label)));
                    }
                    if let RenderTargetRef::Framebuffer(fb) = desc.target {
                        let status = self.framebuffer_status(fb);
                        if !status.is_complete() {
                            return Err(RhiError::InvalidCommand(format!(
                                "pass '{}' targets framebuffer {}: {}",
                                desc.label,
                                fb.0,
                                status.reason_code()
                            )));
                        }
                    }
                    in_pass = true;
                    program = None;
                    vertex_array = None;
                }
                Command::EndPass => {
                    if !in_pass {
                        return Err(RhiError::InvalidCommand("end of pass without a pass".into()));
                    }
                    in_pass = false;
                }
                Command::UseProgram(id) => {
                    if self.program(*id).is_none() {
                        return Err(RhiError::UnknownHandle {
                            kind: "program",
                            index: id.0,
                        });
                    }
                    program = Some(*id);
                }
                Command::BindVertexArray(id) => {
                    if self.vertex_array(*id).is_none() {
                        return Err(RhiError::UnknownHandle {
                            kind: "vertex array",
                            index: id.0,
                        });
                    }
                    vertex_array = Some(*id);
                }
                Command::BindTexture { texture, .. } => {
                    if self.texture(*texture).is_none() {
                        return Err(RhiError::UnknownHandle {
                            kind: "texture",
                            index: texture.0,
                        });
                    }
                }
                Command::BindUniformRange {
                    binding,
                    buffer,
                    offset,
                    size,
                } => {
                    let recorded = self.check_buffer(*buffer)?;
                    if !recorded.usage.contains(BufferUsage::UNIFORM) {
                        return Err(RhiError::InvalidCommand(format!("buffer '{}' is not a uniform buffer", recorded.label)));
                    }
                    if offset % u64::from(self.limits.uniform_offset_alignment) != 0 {
                        return Err(RhiError::InvalidCommand(format!(
                            "uniform binding {binding}: offset {offset} is not a multiple of {}",
                            self.limits.uniform_offset_alignment
                        )));
                    }
                    if *size == 0 || *size > u64::from(self.limits.max_uniform_block_size) {
                        return Err(RhiError::InvalidCommand(format!("uniform binding {binding}: invalid size {size}")));
                    }
                    if offset + size > recorded.data.len() as u64 {
                        return Err(RhiError::OutOfBounds {
                            offset: *offset,
                            len: *size,
                            size: recorded.data.len() as u64,
                        });
                    }
                }
                Command::DrawIndexed { .. } => {
                    if !in_pass {
                        return Err(RhiError::InvalidCommand("draw outside of a pass".into()));
                    }
                    if program.is_none() || vertex_array.is_none() {
                        return Err(RhiError::InvalidCommand("draw without a program and vertex array".into()));
                    }
                }
                Command::SetViewport { .. } | Command::SetState(_) => {}
            }
        }
        if in_pass {
            return Err(RhiError::InvalidCommand("command list ends inside a pass".into()));
        }
        Ok(())
    }
}

impl GpuDevice for RecordingDevice {
    fn limits(&self) -> DeviceLimits {
        self.limits
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor<'_>, contents: Option<&[u8]>) -> Result<BufferId, RhiError> {
        let mut data = vec![0u8; desc.size as usize];
        if let Some(contents) = contents {
            if contents.len() > data.len() {
                return Err(RhiError::OutOfBounds {
                    offset: 0,
                    len: contents.len() as u64,
                    size: desc.size,
                });
            }
            data[..contents.len()].copy_from_slice(contents);
        }
        let id = BufferId(self.buffers.len() as u32);
        self.buffers.push(RecordedBuffer {
            label: desc.label.unwrap_or("buffer").to_string(),
            usage: desc.usage,
            data,
        });
        Ok(id)
    }

    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) -> Result<(), RhiError> {
        let recorded = self.buffers.get_mut(buffer.index()).ok_or(RhiError::UnknownHandle {
            kind: "buffer",
            index: buffer.0,
        })?;
        let size = recorded.data.len() as u64;
        let end = offset + data.len() as u64;
        if end > size {
            return Err(RhiError::OutOfBounds {
                offset,
                len: data.len() as u64,
                size,
            });
        }
        recorded.data[offset as usize..end as usize].copy_from_slice(data);
        Ok(())
    }

    fn create_texture(&mut self, desc: &TextureDescriptor<'_>, pixels: Option<&[u8]>) -> Result<TextureId, RhiError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(RhiError::InvalidDescriptor("texture with zero extent".into()));
        }
        if let Some(pixels) = pixels {
            let bpp = desc.format.upload_bytes_per_pixel().ok_or_else(|| {
                RhiError::InvalidDescriptor(format!("{:?} does not accept CPU uploads", desc.format))
            })?;
            let expected = desc.width as usize * desc.height as usize * bpp as usize;
            if pixels.len() != expected {
                return Err(RhiError::InvalidDescriptor(format!(
                    "texture upload has {} bytes, expected {expected}",
                    pixels.len()
                )));
            }
        }
        let id = TextureId(self.textures.len() as u32);
        self.textures.push(Some(RecordedTexture {
            label: desc.label.unwrap_or("texture").to_string(),
            info: TextureInfo::from(desc),
        }));
        Ok(id)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        if let Some(slot) = self.textures.get_mut(texture.index()) {
            *slot = None;
        }
    }

    fn create_program(&mut self, desc: &ProgramDescriptor<'_>) -> Result<CompiledProgram, RhiError> {
        let layout = crate::reflect_program(desc.name, desc.source)?;
        let id = ProgramId(self.programs.len() as u32);
        self.programs.push(RecordedProgram {
            name: desc.name.to_string(),
            layout: layout.clone(),
        });
        Ok(CompiledProgram { id, layout })
    }

    fn create_vertex_array(&mut self, desc: &VertexArrayDescriptor<'_>) -> Result<VertexArrayId, RhiError> {
        self.check_buffer(desc.vertex_buffer)?;
        self.check_buffer(desc.index_buffer)?;
        for attr in desc.attributes {
            if attr.components == 0 || attr.components > 4 || attr.offset + attr.byte_size() > desc.stride {
                return Err(RhiError::InvalidDescriptor(format!(
                    "attribute at location {} does not fit a {}-byte vertex",
                    attr.location, desc.stride
                )));
            }
        }
        let id = VertexArrayId(self.vertex_arrays.len() as u32);
        self.vertex_arrays.push(RecordedVertexArray {
            label: desc.label.unwrap_or("vertex array").to_string(),
            vertex_buffer: desc.vertex_buffer,
            vertex_offset: desc.vertex_offset,
            index_buffer: desc.index_buffer,
            stride: desc.stride,
            attributes: desc.attributes.to_vec(),
        });
        Ok(id)
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDescriptor<'_>) -> Result<FramebufferId, RhiError> {
        let colors: Vec<Option<TextureInfo>> = desc.color_attachments.iter().map(|t| self.texture_info(*t)).collect();
        let depth = desc.depth_stencil.map(|t| self.texture_info(t));
        let status = check_framebuffer(&colors, depth);
        let id = FramebufferId(self.framebuffers.len() as u32);
        self.framebuffers.push(Some(RecordedFramebuffer {
            label: desc.label.unwrap_or("framebuffer").to_string(),
            color_attachments: desc.color_attachments.to_vec(),
            depth_stencil: desc.depth_stencil,
            status,
        }));
        Ok(id)
    }

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId) {
        if let Some(slot) = self.framebuffers.get_mut(framebuffer.index()) {
            *slot = None;
        }
    }

    fn framebuffer_status(&self, framebuffer: FramebufferId) -> FramebufferStatus {
        let Some(fb) = self.framebuffer(framebuffer) else {
            return FramebufferStatus::MissingAttachment;
        };
        // Attachments may have been destroyed since creation.
        let colors: Vec<Option<TextureInfo>> = fb.color_attachments.iter().map(|t| self.texture_info(*t)).collect();
        let depth = fb.depth_stencil.map(|t| self.texture_info(t));
        check_framebuffer(&colors, depth)
    }

    fn submit(&mut self, commands: &CommandList) -> Result<(), RhiError> {
        self.validate(commands)?;
        log::trace!(
            "recorded submission: {} commands, {} draws",
            commands.len(),
            commands.draw_count()
        );
        self.submissions.push(commands.clone());
        Ok(())
    }

    fn drain_debug_messages(&mut self) -> Vec<DebugMessage> {
        std::mem::take(&mut self.pending_messages)
    }
}
