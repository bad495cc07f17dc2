use glam::{Mat4, Vec3};
use penumbra_renderer::registry::VertexBufferLayout;
use penumbra_renderer::{
    demo, Entity, Light, ModelIdx, Renderer, RendererConfig, RendererError, SubmeshData, VertexBindingError,
};
use penumbra_rhi::headless::RecordingDevice;
use penumbra_rhi::{ClearColor, Command, CommandList, LoadOp, PassDescriptor, RenderTargetRef};
use render_api::{FrameInfo, Input, Key, RenderMode, RenderTarget};

const SIZE: (u32, u32) = (320, 240);

fn frame() -> FrameInfo {
    FrameInfo {
        viewport_size: SIZE,
        delta_seconds: 1.0 / 60.0,
    }
}

fn renderer(device: &mut RecordingDevice) -> Renderer {
    let _ = env_logger::builder().is_test(true).try_init();
    Renderer::new(device, RendererConfig::default(), SIZE.0, SIZE.1).unwrap()
}

fn add_cubes(renderer: &mut Renderer, count: usize) {
    let cube = renderer.primitives().cube;
    let program = renderer.programs().gbuffer;
    for i in 0..count {
        let world = Mat4::from_translation(Vec3::new(i as f32 * 3.0, 0.0, 0.0));
        renderer.scene_mut().add_entity(Entity::new(world, cube, program));
    }
}

fn draw_frame(renderer: &mut Renderer, device: &mut RecordingDevice) -> CommandList {
    renderer.update(device, &Input::new(), &frame()).unwrap();
    renderer.render(device).unwrap();
    device.last_submission().unwrap().clone()
}

fn trace(list: &CommandList) -> Vec<(&'static str, usize)> {
    list.passes().into_iter().map(|p| (p.label, p.draws)).collect()
}

fn pass_descriptors(list: &CommandList) -> Vec<PassDescriptor> {
    list.commands()
        .iter()
        .filter_map(|c| match c {
            Command::BeginPass(desc) => Some(desc.clone()),
            _ => None,
        })
        .collect()
}

/// Commands recorded between the `n`th BeginPass and its EndPass.
fn pass_commands(list: &CommandList, n: usize) -> Vec<Command> {
    let start = list
        .commands()
        .iter()
        .enumerate()
        .filter(|(_, c)| matches!(c, Command::BeginPass(_)))
        .nth(n)
        .map(|(i, _)| i)
        .unwrap();
    list.commands()[start..]
        .iter()
        .take_while(|c| !matches!(c, Command::EndPass))
        .cloned()
        .collect()
}

#[test]
fn point_light_frame_runs_every_deferred_stage() {
    let mut device = RecordingDevice::new();
    let mut renderer = renderer(&mut device);
    add_cubes(&mut renderer, 2);
    renderer.scene_mut().add_light(Light::point(Vec3::ONE, Vec3::new(0.0, 2.0, 0.0)));

    let list = draw_frame(&mut renderer, &mut device);
    assert_eq!(
        trace(&list),
        vec![("geometry", 2), ("stencil", 1), ("point_light", 1), ("composite", 1)]
    );

    let passes = pass_descriptors(&list);
    let gbuffer = renderer.gbuffer();
    assert_eq!(passes[0].target, RenderTargetRef::Framebuffer(gbuffer.geometry));
    assert_eq!(passes[0].color_load, LoadOp::Clear(ClearColor::TRANSPARENT));
    assert_eq!(passes[1].target, RenderTargetRef::Framebuffer(gbuffer.lighting));
    assert_eq!(passes[1].color_load, LoadOp::Clear(ClearColor::BLACK));
    assert_eq!(passes[1].depth_load, LoadOp::Load);
    assert_eq!(passes[1].stencil_load, LoadOp::Clear(0));
    assert_eq!(passes[2].color_load, LoadOp::Load);
    assert_eq!(passes[2].stencil_load, LoadOp::Load);
    assert_eq!(passes[3].target, RenderTargetRef::Default);
}

#[test]
fn directional_light_adds_a_pass_before_composite() {
    let mut device = RecordingDevice::new();
    let mut renderer = renderer(&mut device);
    add_cubes(&mut renderer, 2);
    renderer.scene_mut().add_light(Light::point(Vec3::ONE, Vec3::new(0.0, 2.0, 0.0)));
    renderer.scene_mut().add_light(Light::directional(Vec3::ONE, Vec3::NEG_Y));

    let list = draw_frame(&mut renderer, &mut device);
    assert_eq!(
        trace(&list),
        vec![
            ("geometry", 2),
            ("stencil", 1),
            ("point_light", 1),
            ("directional_light", 1),
            ("composite", 1)
        ]
    );
    // The point light cleared the target, so the directional pass accumulates.
    assert_eq!(pass_descriptors(&list)[3].color_load, LoadOp::Load);
}

#[test]
fn each_point_light_gets_its_own_stencil_pass() {
    let mut device = RecordingDevice::new();
    let mut renderer = renderer(&mut device);
    add_cubes(&mut renderer, 1);
    for x in [-2.0, 0.0, 2.0] {
        renderer.scene_mut().add_light(Light::point(Vec3::ONE, Vec3::new(x, 1.0, 0.0)));
    }

    let list = draw_frame(&mut renderer, &mut device);
    let labels: Vec<_> = trace(&list).into_iter().map(|(label, _)| label).collect();
    assert_eq!(
        labels,
        vec![
            "geometry",
            "stencil",
            "point_light",
            "stencil",
            "point_light",
            "stencil",
            "point_light",
            "composite"
        ]
    );
    let volume_buffer = renderer.packer().light_volume_buffer().handle();
    let offsets: Vec<u64> = list
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::BindUniformRange {
                binding: 1,
                buffer,
                offset,
                ..
            } if *buffer == volume_buffer => Some(*offset),
            _ => None,
        })
        .collect();
    // Stencil and light pass of each light bind the same block.
    assert_eq!(offsets, vec![0, 0, 256, 256, 512, 512]);
}

#[test]
fn directional_only_scene_clears_in_the_directional_pass() {
    let mut device = RecordingDevice::new();
    let mut renderer = renderer(&mut device);
    add_cubes(&mut renderer, 1);
    renderer.scene_mut().add_light(Light::directional(Vec3::ONE, Vec3::NEG_Y));

    let list = draw_frame(&mut renderer, &mut device);
    assert_eq!(trace(&list), vec![("geometry", 1), ("directional_light", 1), ("composite", 1)]);
    assert_eq!(pass_descriptors(&list)[1].color_load, LoadOp::Clear(ClearColor::BLACK));
}

#[test]
fn scene_without_lights_still_clears_the_lighting_target() {
    let mut device = RecordingDevice::new();
    let mut renderer = renderer(&mut device);
    add_cubes(&mut renderer, 2);

    let list = draw_frame(&mut renderer, &mut device);
    assert_eq!(trace(&list), vec![("geometry", 2), ("light_clear", 0), ("composite", 1)]);
    let clear = &pass_descriptors(&list)[1];
    assert_eq!(clear.color_load, LoadOp::Clear(ClearColor::BLACK));
    assert_eq!(clear.depth_load, LoadOp::Load);
}

#[test]
fn forward_mode_draws_every_entity_in_one_pass() {
    let mut device = RecordingDevice::new();
    let config = RendererConfig {
        mode: RenderMode::Forward,
        ..RendererConfig::default()
    };
    let mut renderer = Renderer::new(&mut device, config, SIZE.0, SIZE.1).unwrap();
    add_cubes(&mut renderer, 3);
    renderer.scene_mut().add_light(Light::point(Vec3::ONE, Vec3::ZERO));

    let list = draw_frame(&mut renderer, &mut device);
    assert_eq!(trace(&list), vec![("forward", 3)]);
    let forward = renderer.registry().program(renderer.programs().forward).unwrap().handle;
    assert!(pass_commands(&list, 0).contains(&Command::UseProgram(forward)));
}

#[test]
fn f_key_toggles_the_pipeline_and_digits_pick_the_target() {
    let mut device = RecordingDevice::new();
    let mut renderer = renderer(&mut device);
    add_cubes(&mut renderer, 1);

    let mut input = Input::new();
    input.key_event(Key::F, true);
    renderer.update(&mut device, &input, &frame()).unwrap();
    assert_eq!(renderer.mode(), RenderMode::Forward);

    input.end_frame();
    input.key_event(Key::F, false);
    input.key_event(Key::Digit4, true);
    renderer.update(&mut device, &input, &frame()).unwrap();
    assert_eq!(renderer.mode(), RenderMode::Forward);
    assert_eq!(renderer.target(), RenderTarget::Depth);
}

#[test]
fn depth_target_uses_the_depth_composite_program() {
    let mut device = RecordingDevice::new();
    let mut renderer = renderer(&mut device);
    add_cubes(&mut renderer, 1);
    renderer.set_target(RenderTarget::Depth);

    let list = draw_frame(&mut renderer, &mut device);
    let composite = pass_commands(&list, 2);
    let program = renderer.registry().program(renderer.programs().composite_depth).unwrap().handle;
    assert!(composite.contains(&Command::UseProgram(program)));
    assert!(composite.contains(&Command::BindTexture {
        unit: 0,
        texture: renderer.gbuffer().depth_stencil
    }));
}

#[test]
fn final_target_is_tone_mapped_by_default() {
    let mut device = RecordingDevice::new();
    let mut renderer = renderer(&mut device);
    add_cubes(&mut renderer, 1);

    let list = draw_frame(&mut renderer, &mut device);
    let composite = pass_commands(&list, 2);
    let program = renderer.registry().program(renderer.programs().composite_tonemap).unwrap().handle;
    assert!(composite.contains(&Command::UseProgram(program)));
}

#[test]
fn position_only_geometry_never_binds_to_the_gbuffer_program() {
    let mut device = RecordingDevice::new();
    let mut renderer = renderer(&mut device);
    let material = renderer.default_material();
    let data = SubmeshData {
        layout: VertexBufferLayout::position_only(),
        vertices: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        indices: vec![0, 1, 2],
    };
    let registry = renderer.registry_mut();
    let mesh = registry.add_mesh(&mut device, "triangle", &[data]).unwrap();
    let model = registry.add_model(mesh, vec![material]).unwrap();
    let program = renderer.programs().gbuffer;
    renderer
        .scene_mut()
        .add_entity(Entity::new(Mat4::IDENTITY, model, program));

    renderer.update(&mut device, &Input::new(), &frame()).unwrap();
    let vertex_arrays = device.vertex_array_count();
    for _ in 0..2 {
        let err = renderer.render(&mut device).unwrap_err();
        assert!(matches!(
            err,
            RendererError::VertexBinding(VertexBindingError::MissingAttribute { location: 1, .. })
        ));
    }
    assert_eq!(device.vertex_array_count(), vertex_arrays);
    assert!(device.submissions().is_empty());
}

#[test]
fn vertex_arrays_are_created_once_per_program() {
    let mut device = RecordingDevice::new();
    let mut renderer = renderer(&mut device);
    add_cubes(&mut renderer, 2);
    renderer.scene_mut().add_light(Light::point(Vec3::ONE, Vec3::ZERO));

    draw_frame(&mut renderer, &mut device);
    let after_first = device.vertex_array_count();
    draw_frame(&mut renderer, &mut device);
    assert_eq!(device.vertex_array_count(), after_first);
}

#[test]
fn viewport_change_resizes_the_gbuffer() {
    let mut device = RecordingDevice::new();
    let mut renderer = renderer(&mut device);
    add_cubes(&mut renderer, 1);
    let frame = FrameInfo {
        viewport_size: (640, 480),
        delta_seconds: 0.0,
    };
    renderer.update(&mut device, &Input::new(), &frame).unwrap();
    assert_eq!(renderer.gbuffer().size(), (640, 480));
    assert_eq!(renderer.viewport(), (640, 480));
    renderer.render(&mut device).unwrap();
    assert!(device
        .last_submission()
        .unwrap()
        .commands()
        .contains(&Command::SetViewport { width: 640, height: 480 }));
}

#[test]
fn demo_scene_renders_with_the_cube_fallback() {
    let mut device = RecordingDevice::new();
    let mut renderer = renderer(&mut device);
    demo::build_demo_scene(&mut renderer, &mut device, Some("does/not/exist.obj".as_ref())).unwrap();
    assert_eq!(renderer.scene().entities.len(), 5);

    let list = draw_frame(&mut renderer, &mut device);
    let passes = trace(&list);
    assert_eq!(passes[0], ("geometry", 5));
    assert_eq!(passes.iter().filter(|(label, _)| *label == "stencil").count(), 4);
    assert_eq!(passes[passes.len() - 2], ("directional_light", 1));
    assert_eq!(passes[passes.len() - 1], ("composite", 1));
}

#[test]
fn cube_and_ground_quad_render_to_the_final_target() {
    let mut device = RecordingDevice::new();
    let mut renderer = renderer(&mut device);
    let primitives = *renderer.primitives();
    let program = renderer.programs().gbuffer;
    let ground = Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)) * Mat4::from_rotation_x(-90f32.to_radians());
    renderer.scene_mut().add_entity(Entity::new(Mat4::IDENTITY, primitives.cube, program));
    renderer.scene_mut().add_entity(Entity::new(ground, primitives.quad, program));
    renderer.scene_mut().add_light(Light::point(Vec3::ONE, Vec3::new(0.0, 2.0, 0.0)));
    assert_eq!(renderer.target(), RenderTarget::Final);

    let list = draw_frame(&mut renderer, &mut device);
    assert_eq!(
        trace(&list),
        vec![("geometry", 2), ("stencil", 1), ("point_light", 1), ("composite", 1)]
    );

    let quad_mesh = renderer.registry().model(primitives.quad).unwrap().mesh;
    let quad = &renderer.registry().mesh(quad_mesh).unwrap().submeshes[0];
    let geometry = pass_commands(&list, 0);
    let draws: Vec<_> = geometry
        .iter()
        .filter_map(|c| match c {
            Command::DrawIndexed { index_count, .. } => Some(*index_count),
            _ => None,
        })
        .collect();
    assert_eq!(draws, vec![36, quad.index_count]);
    assert_eq!(quad.index_count, 6);
    assert_eq!(
        pass_commands(&list, 3).last(),
        Some(&Command::DrawIndexed { index_count: 6, first_index: 0 })
    );
}

#[test]
fn entity_with_an_unknown_model_fails_the_frame() {
    let mut device = RecordingDevice::new();
    let mut renderer = renderer(&mut device);
    let program = renderer.programs().gbuffer;
    renderer
        .scene_mut()
        .add_entity(Entity::new(Mat4::IDENTITY, ModelIdx(99), program));

    renderer.update(&mut device, &Input::new(), &frame()).unwrap();
    let err = renderer.render(&mut device).unwrap_err();
    assert!(matches!(
        err,
        RendererError::VertexBinding(VertexBindingError::UnknownHandle { kind: "model", index: 99 })
    ));
    assert!(device.submissions().is_empty());
}
