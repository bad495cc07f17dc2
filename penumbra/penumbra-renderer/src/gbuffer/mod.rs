//! G-buffer targets: position, normal, diffuse, a shared depth-stencil and the lit result.
//!
//! Two framebuffers share the depth-stencil texture: the geometry framebuffer (three color
//! targets) and the lighting framebuffer (final color only).

use penumbra_rhi::{
    ClearColor, FramebufferDescriptor, FramebufferId, GpuDevice, PassDescriptor, PipelineState, RenderTargetRef,
    TextureDescriptor, TextureFormat, TextureId, TextureUsage,
};
use render_api::RenderTarget;

use crate::deferred::DeferredStage;
use crate::error::RendererError;
use crate::frame::FrameContext;

pub const POSITION_FORMAT: TextureFormat = TextureFormat::Rgba16Float;
pub const NORMAL_FORMAT: TextureFormat = TextureFormat::Rgba16Float;
pub const DIFFUSE_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;
pub const DEPTH_STENCIL_FORMAT: TextureFormat = TextureFormat::Depth24PlusStencil8;
pub const FINAL_FORMAT: TextureFormat = TextureFormat::Rgba16Float;

pub const GEOMETRY_FRAMEBUFFER: &str = "gbuffer";
pub const LIGHTING_FRAMEBUFFER: &str = "lighting";

#[derive(Debug)]
pub struct GBuffer {
    width: u32,
    height: u32,
    pub position: TextureId,
    pub normal: TextureId,
    pub diffuse: TextureId,
    pub depth_stencil: TextureId,
    pub final_color: TextureId,
    pub geometry: FramebufferId,
    pub lighting: FramebufferId,
}

impl GBuffer {
    /// Create every target and both framebuffers. On failure, whatever was already created
    /// is destroyed before the error is returned.
    pub fn new(device: &mut dyn GpuDevice, width: u32, height: u32) -> Result<Self, RendererError> {
        if width == 0 || height == 0 {
            return Err(RendererError::InvalidViewport { width, height });
        }
        let mut created = Created::default();
        match Self::build(device, width, height, &mut created) {
            Ok(gbuffer) => {
                log::info!("g-buffer {width}x{height} created");
                Ok(gbuffer)
            }
            Err(e) => {
                log::warn!(
                    "g-buffer {width}x{height} failed, releasing {} textures and {} framebuffers",
                    created.textures.len(),
                    created.framebuffers.len()
                );
                created.release(device);
                Err(e)
            }
        }
    }

    fn build(device: &mut dyn GpuDevice, width: u32, height: u32, created: &mut Created) -> Result<Self, RendererError> {
        let mut make_rt = |label: &str, format: TextureFormat| -> Result<TextureId, RendererError> {
            let texture = device.create_texture(
                &TextureDescriptor {
                    label: Some(label),
                    width,
                    height,
                    format,
                    usage: TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
                },
                None,
            )?;
            created.textures.push(texture);
            Ok(texture)
        };
        let position = make_rt("gbuffer_position", POSITION_FORMAT)?;
        let normal = make_rt("gbuffer_normal", NORMAL_FORMAT)?;
        let diffuse = make_rt("gbuffer_diffuse", DIFFUSE_FORMAT)?;
        let depth_stencil = make_rt("gbuffer_depth_stencil", DEPTH_STENCIL_FORMAT)?;
        let final_color = make_rt("lighting_final", FINAL_FORMAT)?;

        let geometry = device.create_framebuffer(&FramebufferDescriptor {
            label: Some(GEOMETRY_FRAMEBUFFER),
            color_attachments: &[position, normal, diffuse],
            depth_stencil: Some(depth_stencil),
        })?;
        created.framebuffers.push(geometry);
        let lighting = device.create_framebuffer(&FramebufferDescriptor {
            label: Some(LIGHTING_FRAMEBUFFER),
            color_attachments: &[final_color],
            depth_stencil: Some(depth_stencil),
        })?;
        created.framebuffers.push(lighting);

        check_complete(device, geometry, GEOMETRY_FRAMEBUFFER)?;
        check_complete(device, lighting, LIGHTING_FRAMEBUFFER)?;
        Ok(Self {
            width,
            height,
            position,
            normal,
            diffuse,
            depth_stencil,
            final_color,
            geometry,
            lighting,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Recreate every target at the new size. A no-op when the size is unchanged.
    pub fn resize(&mut self, device: &mut dyn GpuDevice, width: u32, height: u32) -> Result<(), RendererError> {
        if (width, height) == (self.width, self.height) {
            return Ok(());
        }
        let resized = Self::new(device, width, height)?;
        self.destroy(device);
        *self = resized;
        Ok(())
    }

    /// Texture shown for `target` by the composite pass.
    pub fn texture(&self, target: RenderTarget) -> TextureId {
        match target {
            RenderTarget::Position => self.position,
            RenderTarget::Normals => self.normal,
            RenderTarget::Diffuse => self.diffuse,
            RenderTarget::Depth => self.depth_stencil,
            RenderTarget::Final => self.final_color,
        }
    }

    pub fn destroy(&self, device: &mut dyn GpuDevice) {
        device.destroy_framebuffer(self.geometry);
        device.destroy_framebuffer(self.lighting);
        for texture in [self.position, self.normal, self.diffuse, self.depth_stencil, self.final_color] {
            device.destroy_texture(texture);
        }
    }
}

/// Resources created so far by [`GBuffer::new`].
#[derive(Default)]
struct Created {
    textures: Vec<TextureId>,
    framebuffers: Vec<FramebufferId>,
}

impl Created {
    fn release(self, device: &mut dyn GpuDevice) {
        for framebuffer in self.framebuffers {
            device.destroy_framebuffer(framebuffer);
        }
        for texture in self.textures {
            device.destroy_texture(texture);
        }
    }
}

/// Geometry pass: clear the G-buffer and draw every entity with its own program.
/// Alpha 0 in the position target marks pixels no geometry covered.
pub fn record_geometry(ctx: &mut FrameContext<'_>, gbuffer: &GBuffer) -> Result<(), RendererError> {
    ctx.begin_pass(PassDescriptor::clear(
        DeferredStage::Geometry.label(),
        RenderTargetRef::Framebuffer(gbuffer.geometry),
        ClearColor::TRANSPARENT,
    ));
    ctx.commands.set_state(PipelineState::default());
    let scene = ctx.scene;
    for entity in &scene.entities {
        ctx.draw_entity(entity, entity.program)?;
    }
    ctx.end_pass();
    Ok(())
}

/// Fatal setup error when `framebuffer` is not complete; the reason code is logged.
pub fn check_complete(device: &dyn GpuDevice, framebuffer: FramebufferId, label: &'static str) -> Result<(), RendererError> {
    let status = device.framebuffer_status(framebuffer);
    if status.is_complete() {
        return Ok(());
    }
    log::error!("framebuffer '{label}' incomplete: {}", status.reason_code());
    Err(RendererError::FramebufferIncomplete {
        label,
        reason: status.reason_code(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use penumbra_rhi::headless::RecordingDevice;
    use penumbra_rhi::{
        BufferDescriptor, BufferId, CommandList, CompiledProgram, DeviceLimits, FramebufferStatus, ProgramDescriptor,
        RhiError, VertexArrayDescriptor, VertexArrayId,
    };

    /// Recording device that runs out of textures after `textures_left` creations and can
    /// report every framebuffer as incomplete.
    struct FlakyDevice {
        inner: RecordingDevice,
        textures_left: usize,
        incomplete: bool,
    }

    impl FlakyDevice {
        fn new(textures_left: usize, incomplete: bool) -> Self {
            Self {
                inner: RecordingDevice::new(),
                textures_left,
                incomplete,
            }
        }
    }

    impl GpuDevice for FlakyDevice {
        fn limits(&self) -> DeviceLimits {
            self.inner.limits()
        }

        fn create_buffer(&mut self, desc: &BufferDescriptor<'_>, contents: Option<&[u8]>) -> Result<BufferId, RhiError> {
            self.inner.create_buffer(desc, contents)
        }

        fn write_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) -> Result<(), RhiError> {
            self.inner.write_buffer(buffer, offset, data)
        }

        fn create_texture(&mut self, desc: &TextureDescriptor<'_>, pixels: Option<&[u8]>) -> Result<TextureId, RhiError> {
            if self.textures_left == 0 {
                return Err(RhiError::InvalidDescriptor("out of texture memory".into()));
            }
            self.textures_left -= 1;
            self.inner.create_texture(desc, pixels)
        }

        fn destroy_texture(&mut self, texture: TextureId) {
            self.inner.destroy_texture(texture)
        }

        fn create_program(&mut self, desc: &ProgramDescriptor<'_>) -> Result<CompiledProgram, RhiError> {
            self.inner.create_program(desc)
        }

        fn create_vertex_array(&mut self, desc: &VertexArrayDescriptor<'_>) -> Result<VertexArrayId, RhiError> {
            self.inner.create_vertex_array(desc)
        }

        fn create_framebuffer(&mut self, desc: &FramebufferDescriptor<'_>) -> Result<FramebufferId, RhiError> {
            self.inner.create_framebuffer(desc)
        }

        fn destroy_framebuffer(&mut self, framebuffer: FramebufferId) {
            self.inner.destroy_framebuffer(framebuffer)
        }

        fn framebuffer_status(&self, framebuffer: FramebufferId) -> FramebufferStatus {
            if self.incomplete {
                FramebufferStatus::IncompleteAttachment
            } else {
                self.inner.framebuffer_status(framebuffer)
            }
        }

        fn submit(&mut self, commands: &CommandList) -> Result<(), RhiError> {
            self.inner.submit(commands)
        }
    }

    #[test]
    fn framebuffers_share_the_depth_stencil() {
        let mut device = RecordingDevice::new();
        let gbuffer = GBuffer::new(&mut device, 320, 240).unwrap();
        let geometry = device.framebuffer(gbuffer.geometry).unwrap();
        let lighting = device.framebuffer(gbuffer.lighting).unwrap();
        assert_eq!(geometry.color_attachments.len(), 3);
        assert_eq!(lighting.color_attachments, vec![gbuffer.final_color]);
        assert_eq!(geometry.depth_stencil, lighting.depth_stencil);
        assert_eq!(
            device.texture(gbuffer.depth_stencil).unwrap().info.format,
            TextureFormat::Depth24PlusStencil8
        );
        assert_eq!(gbuffer.texture(RenderTarget::Depth), gbuffer.depth_stencil);
    }

    #[test]
    fn resize_replaces_targets() {
        let mut device = RecordingDevice::new();
        let mut gbuffer = GBuffer::new(&mut device, 320, 240).unwrap();
        let old_position = gbuffer.position;
        gbuffer.resize(&mut device, 640, 480).unwrap();
        assert_eq!(gbuffer.size(), (640, 480));
        assert!(device.texture(old_position).is_none());
        assert_eq!(device.texture(gbuffer.position).unwrap().info.width, 640);
        assert_eq!(device.texture_count(), 5);
        assert!(device.framebuffer_status(gbuffer.geometry).is_complete());
    }

    #[test]
    fn zero_size_is_rejected() {
        let mut device = RecordingDevice::new();
        assert!(matches!(
            GBuffer::new(&mut device, 0, 240),
            Err(RendererError::InvalidViewport { width: 0, height: 240 })
        ));
    }

    #[test]
    fn incomplete_framebuffer_reports_its_reason() {
        let mut device = RecordingDevice::new();
        let gbuffer = GBuffer::new(&mut device, 64, 64).unwrap();
        device.destroy_texture(gbuffer.normal);
        let err = check_complete(&device, gbuffer.geometry, GEOMETRY_FRAMEBUFFER).unwrap_err();
        match err {
            RendererError::FramebufferIncomplete { label, reason } => {
                assert_eq!(label, "gbuffer");
                assert!(reason.starts_with("FRAMEBUFFER_INCOMPLETE"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn failed_texture_creation_releases_earlier_targets() {
        let mut device = FlakyDevice::new(3, false);
        let err = GBuffer::new(&mut device, 320, 240).unwrap_err();
        assert!(matches!(err, RendererError::Device(RhiError::InvalidDescriptor(_))));
        assert_eq!(device.inner.texture_count(), 0);
        assert_eq!(device.inner.framebuffer_count(), 0);
    }

    #[test]
    fn incomplete_framebuffer_releases_every_target() {
        let mut device = FlakyDevice::new(usize::MAX, true);
        let err = GBuffer::new(&mut device, 320, 240).unwrap_err();
        assert!(matches!(err, RendererError::FramebufferIncomplete { label: "gbuffer", .. }));
        assert_eq!(device.inner.texture_count(), 0);
        assert_eq!(device.inner.framebuffer_count(), 0);
    }

    #[test]
    fn failed_resize_keeps_the_current_targets() {
        let mut device = FlakyDevice::new(5, false);
        let mut gbuffer = GBuffer::new(&mut device, 320, 240).unwrap();
        assert!(gbuffer.resize(&mut device, 640, 480).is_err());
        assert_eq!(gbuffer.size(), (320, 240));
        assert_eq!(device.inner.texture_count(), 5);
        assert_eq!(device.inner.framebuffer_count(), 2);
        assert!(device.inner.texture(gbuffer.position).is_some());
    }
}
