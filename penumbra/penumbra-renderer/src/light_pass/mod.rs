//! Lighting passes into the lighting framebuffer.
//!
//! Each point light takes two passes. The stencil pass draws its sphere with depth test on and
//! color writes off: back faces behind scene geometry increment, front faces behind it
//! decrement, so only pixels whose surface lies inside the volume end with a non-zero stencil.
//! The light pass then draws the sphere's back faces with additive blending wherever the
//! stencil is non-zero. Directional lights share one full-screen pass.

use penumbra_rhi::{
    BlendState, ClearColor, ColorWrites, CompareOp, CullMode, DepthState, LoadOp, PassDescriptor, PipelineState,
    RenderTargetRef, StencilFaceState, StencilOp, StencilState,
};

use crate::deferred::{DeferredStage, LIGHT_CLEAR_LABEL};
use crate::error::RendererError;
use crate::frame::FrameContext;
use crate::gbuffer::GBuffer;
use crate::scene::Light;

pub const POSITION_UNIT: u32 = 0;
pub const NORMAL_UNIT: u32 = 1;
pub const DIFFUSE_UNIT: u32 = 2;

pub fn stencil_state() -> PipelineState {
    let face = |depth_fail_op| StencilFaceState {
        compare: CompareOp::Always,
        fail_op: StencilOp::Keep,
        depth_fail_op,
        pass_op: StencilOp::Keep,
    };
    PipelineState {
        depth: DepthState::LESS_READ_ONLY,
        stencil: Some(StencilState {
            front: face(StencilOp::DecrementWrap),
            back: face(StencilOp::IncrementWrap),
            read_mask: 0xFF,
            write_mask: 0xFF,
            reference: 0,
        }),
        blend: None,
        cull: CullMode::None,
        color_writes: ColorWrites::empty(),
    }
}

pub fn point_light_state() -> PipelineState {
    let face = StencilFaceState {
        compare: CompareOp::NotEqual,
        ..StencilFaceState::IGNORE
    };
    PipelineState {
        depth: DepthState::DISABLED,
        stencil: Some(StencilState {
            front: face,
            back: face,
            read_mask: 0xFF,
            write_mask: 0,
            reference: 0,
        }),
        blend: Some(BlendState::ADDITIVE),
        cull: CullMode::Front,
        color_writes: ColorWrites::ALL,
    }
}

pub fn directional_state() -> PipelineState {
    PipelineState {
        depth: DepthState::DISABLED,
        stencil: None,
        blend: Some(BlendState::ADDITIVE),
        cull: CullMode::None,
        color_writes: ColorWrites::ALL,
    }
}

/// Light the scene into `gbuffer.final_color`. The first pass clears it to black; with no
/// lights at all a clear-only pass still runs so the composite never reads stale color.
pub fn record_lighting(ctx: &mut FrameContext<'_>, gbuffer: &GBuffer) -> Result<(), RendererError> {
    let target = RenderTargetRef::Framebuffer(gbuffer.lighting);
    let scene = ctx.scene;
    let mut cleared = false;

    for (_, light) in scene.point_lights() {
        if light.radius() <= 0.0 {
            log::trace!("point light at {} has no volume, skipped", light.position);
            continue;
        }
        record_stencil(ctx, target, light, !cleared)?;
        cleared = true;
        record_point_light(ctx, gbuffer, target, light)?;
    }

    if scene.has_directional_light() {
        record_directional(ctx, gbuffer, target, !cleared)?;
        cleared = true;
    }

    if !cleared {
        ctx.begin_pass(PassDescriptor {
            color_load: LoadOp::Clear(ClearColor::BLACK),
            ..PassDescriptor::load(LIGHT_CLEAR_LABEL, target)
        });
        ctx.end_pass();
    }
    Ok(())
}

fn color_load(first: bool) -> LoadOp<ClearColor> {
    if first {
        LoadOp::Clear(ClearColor::BLACK)
    } else {
        LoadOp::Load
    }
}

fn record_stencil(ctx: &mut FrameContext<'_>, target: RenderTargetRef, light: &Light, first: bool) -> Result<(), RendererError> {
    ctx.begin_pass(PassDescriptor {
        label: DeferredStage::Stencil.label(),
        target,
        color_load: color_load(first),
        depth_load: LoadOp::Load,
        stencil_load: LoadOp::Clear(0),
    });
    ctx.commands.set_state(stencil_state());
    let program = ctx.programs.light_volume;
    ctx.use_program(program)?;
    ctx.bind_light_volume(light)?;
    let sphere = ctx.primitives.sphere;
    ctx.draw_submesh(sphere, 0, program)?;
    ctx.end_pass();
    Ok(())
}

fn bind_gbuffer(ctx: &mut FrameContext<'_>, gbuffer: &GBuffer) {
    ctx.commands.bind_texture(POSITION_UNIT, gbuffer.position);
    ctx.commands.bind_texture(NORMAL_UNIT, gbuffer.normal);
    ctx.commands.bind_texture(DIFFUSE_UNIT, gbuffer.diffuse);
}

fn record_point_light(
    ctx: &mut FrameContext<'_>,
    gbuffer: &GBuffer,
    target: RenderTargetRef,
    light: &Light,
) -> Result<(), RendererError> {
    ctx.begin_pass(PassDescriptor::load(DeferredStage::PointLight.label(), target));
    ctx.commands.set_state(point_light_state());
    let program = ctx.programs.deferred_point;
    ctx.use_program(program)?;
    ctx.bind_global()?;
    ctx.bind_light_volume(light)?;
    bind_gbuffer(ctx, gbuffer);
    let sphere = ctx.primitives.sphere;
    ctx.draw_submesh(sphere, 0, program)?;
    ctx.end_pass();
    Ok(())
}

fn record_directional(
    ctx: &mut FrameContext<'_>,
    gbuffer: &GBuffer,
    target: RenderTargetRef,
    first: bool,
) -> Result<(), RendererError> {
    ctx.begin_pass(PassDescriptor {
        color_load: color_load(first),
        ..PassDescriptor::load(DeferredStage::DirectionalLight.label(), target)
    });
    ctx.commands.set_state(directional_state());
    let program = ctx.programs.deferred_directional;
    ctx.use_program(program)?;
    ctx.bind_global()?;
    bind_gbuffer(ctx, gbuffer);
    let quad = ctx.primitives.quad;
    ctx.draw_submesh(quad, 0, program)?;
    ctx.end_pass();
    Ok(())
}
