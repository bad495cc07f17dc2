//! Forward pipeline: every entity lit by every light in one alpha-blended pass.

use penumbra_rhi::{BlendState, ClearColor, PassDescriptor, PipelineState, RenderTargetRef};

use crate::error::RendererError;
use crate::frame::FrameContext;

pub const FORWARD_PASS: &str = "forward";

pub fn forward_state() -> PipelineState {
    PipelineState {
        blend: Some(BlendState::ALPHA),
        ..PipelineState::default()
    }
}

pub fn record_forward(ctx: &mut FrameContext<'_>, clear_color: ClearColor) -> Result<(), RendererError> {
    ctx.begin_pass(PassDescriptor::clear(FORWARD_PASS, RenderTargetRef::Default, clear_color));
    ctx.commands.set_state(forward_state());
    let program = ctx.programs.forward;
    let scene = ctx.scene;
    for entity in &scene.entities {
        ctx.draw_entity(entity, program)?;
    }
    ctx.end_pass();
    Ok(())
}
