//! Deferred pipeline: geometry into the G-buffer, stenciled point-light volumes and a
//! directional pass into the lighting target, then a composite to the default target.

use penumbra_rhi::{ClearColor, GpuDevice};
use render_api::RenderTarget;

use crate::config::ToneMapping;
use crate::error::RendererError;
use crate::frame::FrameContext;
use crate::gbuffer::{self, GBuffer};
use crate::light_pass;
use crate::present;

/// Label of the pass that clears the lighting target when the scene has no lights.
pub const LIGHT_CLEAR_LABEL: &str = "light_clear";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeferredStage {
    Geometry,
    Stencil,
    PointLight,
    DirectionalLight,
    Composite,
}

impl DeferredStage {
    /// Pass label, also shown in debug captures.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Geometry => "geometry",
            Self::Stencil => "stencil",
            Self::PointLight => "point_light",
            Self::DirectionalLight => "directional_light",
            Self::Composite => "composite",
        }
    }
}

pub struct DeferredPipeline {
    gbuffer: GBuffer,
}

impl DeferredPipeline {
    pub fn new(device: &mut dyn GpuDevice, width: u32, height: u32) -> Result<Self, RendererError> {
        Ok(Self {
            gbuffer: GBuffer::new(device, width, height)?,
        })
    }

    pub fn gbuffer(&self) -> &GBuffer {
        &self.gbuffer
    }

    pub fn resize(&mut self, device: &mut dyn GpuDevice, width: u32, height: u32) -> Result<(), RendererError> {
        self.gbuffer.resize(device, width, height)
    }

    /// Record one deferred frame. Lighting always runs so every target stays current.
    pub fn record(
        &self,
        ctx: &mut FrameContext<'_>,
        target: RenderTarget,
        tone_mapping: ToneMapping,
        clear_color: ClearColor,
    ) -> Result<(), RendererError> {
        gbuffer::record_geometry(ctx, &self.gbuffer)?;
        light_pass::record_lighting(ctx, &self.gbuffer)?;
        present::record_composite(ctx, &self.gbuffer, target, tone_mapping, clear_color)
    }

    pub fn destroy(&self, device: &mut dyn GpuDevice) {
        self.gbuffer.destroy(device);
    }
}
