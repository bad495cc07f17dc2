//! Penumbra RHI: backend-agnostic rendering hardware interface.
//! Defines GPU handles, resource descriptors, render state and the command list that the
//! renderer records each frame; backends implement [`GpuDevice`].

mod command;
mod debug;
mod error;
mod framebuffer;
pub mod headless;
mod reflect;
mod state;

pub use command::{ClearColor, Command, CommandList, LoadOp, PassDescriptor, PassSummary, RenderTargetRef};
pub use debug::{DebugMessage, DebugSeverity, DebugSource, DebugType};
pub use error::RhiError;
pub use framebuffer::{check_framebuffer, FramebufferStatus, MAX_COLOR_ATTACHMENTS};
pub use reflect::{
    reflect_program, ProgramLayout, TextureBinding, TextureSampleKind, VertexInput, FRAGMENT_ENTRY_POINT,
    TEXTURE_GROUP, UNIFORM_GROUP, VERTEX_ENTRY_POINT,
};
pub use state::{
    BlendFactor, BlendState, ColorWrites, CompareOp, CullMode, DepthState, PipelineState, StencilFaceState,
    StencilOp, StencilState,
};

macro_rules! gpu_handle {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub u32);

            impl $name {
                pub fn index(self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

gpu_handle!(
    /// GPU buffer owned by a device.
    BufferId,
    /// GPU texture owned by a device.
    TextureId,
    /// Linked shader program (vertex + fragment entry points).
    ProgramId,
    /// Vertex layout binding a vertex/index buffer pair to attribute locations.
    VertexArrayId,
    /// Set of render attachments drawn into together.
    FramebufferId,
);

/// Device limits queried once at setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceLimits {
    /// Largest range that may be bound to a single uniform binding.
    pub max_uniform_block_size: u32,
    /// Uniform range offsets must be a multiple of this.
    pub uniform_offset_alignment: u32,
}

impl Default for DeviceLimits {
    fn default() -> Self {
        Self {
            max_uniform_block_size: 65536,
            uniform_offset_alignment: 256,
        }
    }
}

bitflags::bitflags! {
    /// Buffer usage flags; combine for buffers used in multiple ways.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const VERTEX = 1 << 0;
        const INDEX = 1 << 1;
        const UNIFORM = 1 << 2;
        const COPY_DST = 1 << 3;
    }
}

#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    pub label: Option<&'a str>,
    pub size: u64,
    pub usage: BufferUsage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Rgba16Float,
    Depth32Float,
    Depth24PlusStencil8,
}

impl TextureFormat {
    pub fn is_depth(self) -> bool {
        matches!(self, Self::Depth32Float | Self::Depth24PlusStencil8)
    }

    pub fn has_stencil(self) -> bool {
        matches!(self, Self::Depth24PlusStencil8)
    }

    /// Bytes per texel for formats that accept CPU uploads.
    pub fn upload_bytes_per_pixel(self) -> Option<u32> {
        match self {
            Self::Rgba8Unorm | Self::Rgba8UnormSrgb => Some(4),
            Self::Rgba16Float => Some(8),
            Self::Depth32Float | Self::Depth24PlusStencil8 => None,
        }
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        const COPY_DST = 1 << 0;
        const TEXTURE_BINDING = 1 << 1;
        const RENDER_ATTACHMENT = 1 << 2;
    }
}

#[derive(Debug, Clone)]
pub struct TextureDescriptor<'a> {
    pub label: Option<&'a str>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
}

/// What a device remembers about a texture; used for framebuffer validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
}

impl From<&TextureDescriptor<'_>> for TextureInfo {
    fn from(desc: &TextureDescriptor<'_>) -> Self {
        Self {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            usage: desc.usage,
        }
    }
}

/// WGSL program source. Must define `vs_main` and `fs_main`.
#[derive(Debug, Clone)]
pub struct ProgramDescriptor<'a> {
    pub name: &'a str,
    pub source: &'a str,
}

/// A program after compilation, with the layout reflected from its source.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProgram {
    pub id: ProgramId,
    pub layout: ProgramLayout,
}

/// One float attribute inside an interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub location: u32,
    /// Number of f32 components (1..=4).
    pub components: u32,
    /// Byte offset from the start of the vertex.
    pub offset: u32,
}

impl VertexAttribute {
    pub fn byte_size(&self) -> u32 {
        self.components * 4
    }
}

#[derive(Debug, Clone)]
pub struct VertexArrayDescriptor<'a> {
    pub label: Option<&'a str>,
    pub vertex_buffer: BufferId,
    /// Byte offset of the first vertex inside `vertex_buffer`.
    pub vertex_offset: u64,
    /// u32 indices.
    pub index_buffer: BufferId,
    pub stride: u32,
    pub attributes: &'a [VertexAttribute],
}

#[derive(Debug, Clone)]
pub struct FramebufferDescriptor<'a> {
    pub label: Option<&'a str>,
    pub color_attachments: &'a [TextureId],
    pub depth_stencil: Option<TextureId>,
}

/// The device trait backends implement. All calls happen on the frame-loop thread.
pub trait GpuDevice {
    fn limits(&self) -> DeviceLimits;

    /// Create a buffer, optionally initialised with `contents` (which may be shorter than `size`).
    fn create_buffer(&mut self, desc: &BufferDescriptor<'_>, contents: Option<&[u8]>) -> Result<BufferId, RhiError>;

    fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) -> Result<(), RhiError>;

    /// Create a 2D texture; `pixels` holds tightly packed rows when given.
    fn create_texture(&mut self, desc: &TextureDescriptor<'_>, pixels: Option<&[u8]>) -> Result<TextureId, RhiError>;

    fn destroy_texture(&mut self, texture: TextureId);

    /// Compile a WGSL program. Failure carries the full compiler diagnostic.
    fn create_program(&mut self, desc: &ProgramDescriptor<'_>) -> Result<CompiledProgram, RhiError>;

    fn create_vertex_array(&mut self, desc: &VertexArrayDescriptor<'_>) -> Result<VertexArrayId, RhiError>;

    /// Create a framebuffer. Creation succeeds even when incomplete; query [`GpuDevice::framebuffer_status`].
    fn create_framebuffer(&mut self, desc: &FramebufferDescriptor<'_>) -> Result<FramebufferId, RhiError>;

    fn destroy_framebuffer(&mut self, framebuffer: FramebufferId);

    fn framebuffer_status(&self, framebuffer: FramebufferId) -> FramebufferStatus;

    /// Execute a recorded command list.
    fn submit(&mut self, commands: &CommandList) -> Result<(), RhiError>;

    /// Messages emitted by the driver/validation layer since the last call.
    fn drain_debug_messages(&mut self) -> Vec<DebugMessage> {
        Vec::new()
    }
}
