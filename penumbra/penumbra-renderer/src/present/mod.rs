//! Composite pass: copies the selected G-buffer attachment to the default target.

use penumbra_rhi::{ClearColor, CullMode, DepthState, PassDescriptor, PipelineState, RenderTargetRef};
use render_api::RenderTarget;

use crate::config::ToneMapping;
use crate::deferred::DeferredStage;
use crate::error::RendererError;
use crate::frame::FrameContext;
use crate::gbuffer::GBuffer;
use crate::registry::ProgramIdx;
use crate::shaders::BuiltinPrograms;

pub const SOURCE_UNIT: u32 = 0;

pub fn composite_state() -> PipelineState {
    PipelineState {
        depth: DepthState::DISABLED,
        cull: CullMode::None,
        ..PipelineState::default()
    }
}

/// Depth is linearised for display; the lit result is tone mapped unless disabled.
pub fn composite_program(programs: &BuiltinPrograms, target: RenderTarget, tone_mapping: ToneMapping) -> ProgramIdx {
    match (target, tone_mapping) {
        (RenderTarget::Depth, _) => programs.composite_depth,
        (RenderTarget::Final, ToneMapping::Reinhard) => programs.composite_tonemap,
        _ => programs.composite,
    }
}

pub fn record_composite(
    ctx: &mut FrameContext<'_>,
    gbuffer: &GBuffer,
    target: RenderTarget,
    tone_mapping: ToneMapping,
    clear_color: ClearColor,
) -> Result<(), RendererError> {
    ctx.begin_pass(PassDescriptor::clear(
        DeferredStage::Composite.label(),
        RenderTargetRef::Default,
        clear_color,
    ));
    ctx.commands.set_state(composite_state());
    let program = composite_program(ctx.programs, target, tone_mapping);
    ctx.use_program(program)?;
    ctx.commands.bind_texture(SOURCE_UNIT, gbuffer.texture(target));
    let quad = ctx.primitives.quad;
    ctx.draw_submesh(quad, 0, program)?;
    ctx.end_pass();
    Ok(())
}
