//! The showcase scene: three copies of a model, a ground quad, a sphere, a handful of
//! colored point lights and one directional light.

use std::path::Path;

use glam::Vec3;
use penumbra_rhi::GpuDevice;

use crate::error::RendererError;
use crate::registry::ModelIdx;
use crate::scene::{transform, Entity, Light};
use crate::Renderer;

pub const MODEL_POSITIONS: [Vec3; 3] = [Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 3.0), Vec3::new(-5.0, 0.0, 0.0)];
pub const FLOOR_POSITION: Vec3 = Vec3::new(0.0, -5.0, 0.0);
pub const FLOOR_SCALE: Vec3 = Vec3::new(100.0, 1.0, 100.0);
/// Slightly short of -90° so the floor tilts towards the camera.
pub const FLOOR_TILT_DEGREES: f32 = -88.0;
pub const SPHERE_POSITION: Vec3 = Vec3::new(-5.0, 5.0, 0.0);

/// (color, position) of the demo point lights.
pub const POINT_LIGHTS: [(Vec3, Vec3); 4] = [
    (Vec3::new(2.0, 0.3, 0.3), Vec3::new(5.0, 2.0, -2.0)),
    (Vec3::new(0.3, 2.0, 0.3), Vec3::new(0.0, 2.0, 5.0)),
    (Vec3::new(0.3, 0.3, 2.0), Vec3::new(-5.0, 2.0, -2.0)),
    (Vec3::new(1.0, 1.0, 1.0), Vec3::new(-5.0, 7.0, -1.5)),
];
pub const SUN_COLOR: Vec3 = Vec3::new(0.3, 0.3, 0.28);
pub const SUN_DIRECTION: Vec3 = Vec3::new(0.4, -1.0, 0.3);

/// Populate the renderer's scene. `model_path` is an OBJ file; without one, or when it fails
/// to load, the built-in cube stands in.
pub fn build_demo_scene(
    renderer: &mut Renderer,
    device: &mut dyn GpuDevice,
    model_path: Option<&Path>,
) -> Result<(), RendererError> {
    let primitives = *renderer.primitives();
    let model = match model_path {
        Some(path) => match renderer.load_model(device, path) {
            Ok(model) => model,
            Err(e) => {
                log::warn!("{e}; using the cube instead");
                primitives.cube
            }
        },
        None => primitives.cube,
    };
    let program = renderer.programs().gbuffer;

    let scene = renderer.scene_mut();
    let place = |position: Vec3, scale: Vec3, axis: Vec3, degrees: f32, model: ModelIdx| {
        Entity::new(transform(position, scale, axis, degrees), model, program)
    };
    for position in MODEL_POSITIONS {
        scene.add_entity(place(position, Vec3::ONE, Vec3::Y, 180.0, model));
    }
    scene.add_entity(place(FLOOR_POSITION, FLOOR_SCALE, Vec3::X, FLOOR_TILT_DEGREES, primitives.quad));
    scene.add_entity(place(SPHERE_POSITION, Vec3::ONE, Vec3::Y, 0.0, primitives.sphere));

    for (color, position) in POINT_LIGHTS {
        scene.add_light(Light::point(color, position));
    }
    scene.add_light(Light::directional(SUN_COLOR, SUN_DIRECTION));
    log::info!(
        "demo scene: {} entities, {} lights",
        scene.entities.len(),
        scene.lights.len()
    );
    Ok(())
}
