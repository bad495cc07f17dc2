//! Frame parameter packer: writes the global block, one block per entity and one light-volume
//! block per point light, recording the ranges the draws bind.
//!
//! Entity buffer: `[global block][align][entity 0][align][entity 1]...`
//! Light-volume buffer: `[align][point light a][align][point light b]...`

use glam::{Mat4, Vec3};
use penumbra_rhi::GpuDevice;

use crate::camera::Camera;
use crate::cbuffer::{ConstantBuffer, UniformRange};
use crate::config::RendererConfig;
use crate::error::RendererError;
use crate::scene::{LightKind, Scene};

pub const MAX_LIGHTS: usize = 32;
/// `kind: u32, color: vec3, direction: vec3, position: vec3`, each vec3 on its own 16-byte row.
pub const LIGHT_SIZE: u32 = 64;
/// `camera_position: vec3, light_count: u32, lights: array<Light, MAX_LIGHTS>`.
pub const GLOBAL_PARAMS_SIZE: u32 = 16 + LIGHT_SIZE * MAX_LIGHTS as u32;
/// `world, world_view, world_view_projection`.
pub const LOCAL_PARAMS_SIZE: u32 = 3 * 64;
/// `world_view_projection: mat4, light_index: u32`, padded to 16.
pub const LIGHT_VOLUME_PARAMS_SIZE: u32 = 80;

/// Camera matrices for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameView {
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
}

impl FrameView {
    pub fn from_camera(camera: &Camera, aspect: f32) -> Self {
        Self {
            view: camera.view_matrix(),
            projection: camera.projection_matrix(aspect),
            camera_position: camera.position,
        }
    }
}

pub struct ParameterPacker {
    entity_params: ConstantBuffer,
    light_volume_params: ConstantBuffer,
    alignment: u32,
}

impl ParameterPacker {
    pub fn new(device: &mut dyn GpuDevice, config: &RendererConfig) -> Result<Self, RendererError> {
        let limits = device.limits();
        let entity_capacity = config.entity_buffer_capacity.unwrap_or(limits.max_uniform_block_size);
        let volume_capacity = config
            .light_volume_buffer_capacity
            .unwrap_or(limits.max_uniform_block_size);
        Ok(Self {
            entity_params: ConstantBuffer::new(device, "entity_params", entity_capacity)?,
            light_volume_params: ConstantBuffer::new(device, "light_volume_params", volume_capacity)?,
            alignment: limits.uniform_offset_alignment,
        })
    }

    pub fn entity_buffer(&self) -> &ConstantBuffer {
        &self.entity_params
    }

    pub fn light_volume_buffer(&self) -> &ConstantBuffer {
        &self.light_volume_params
    }

    /// Rewrite both buffers from offset 0 and upload them. Every range in `scene` is replaced.
    pub fn pack(&mut self, device: &mut dyn GpuDevice, scene: &mut Scene, view: &FrameView) -> Result<(), RendererError> {
        if scene.lights.len() > MAX_LIGHTS {
            return Err(RendererError::TooManyLights {
                count: scene.lights.len(),
                max: MAX_LIGHTS,
            });
        }
        let view_projection = view.projection * view.view;

        self.entity_params.reset();
        let mut mapped = self.entity_params.map();

        let global_offset = mapped.head();
        mapped.push_vec3(view.camera_position)?;
        mapped.push_u32(scene.lights.len() as u32)?;
        for light in &scene.lights {
            mapped.align_head(16)?;
            mapped.push_u32(light.kind.tag())?;
            mapped.push_vec3(light.color())?;
            mapped.push_vec3(light.direction)?;
            mapped.push_vec3(light.position)?;
        }
        mapped.pad_to(global_offset + GLOBAL_PARAMS_SIZE)?;
        scene.global_params = UniformRange {
            offset: global_offset,
            size: GLOBAL_PARAMS_SIZE,
        };

        for entity in &mut scene.entities {
            let offset = mapped.align_head(self.alignment)?;
            let world = *entity.world();
            mapped.push_mat4(&world)?;
            mapped.push_mat4(&(view.view * world))?;
            mapped.push_mat4(&(view_projection * world))?;
            entity.params = UniformRange {
                offset,
                size: LOCAL_PARAMS_SIZE,
            };
        }
        mapped.finish(device)?;

        self.light_volume_params.reset();
        let mut mapped = self.light_volume_params.map();
        for (index, light) in scene.lights.iter_mut().enumerate() {
            if light.kind != LightKind::Point {
                light.volume_params = UniformRange::default();
                continue;
            }
            let offset = mapped.align_head(self.alignment)?;
            mapped.push_mat4(&(view_projection * light.volume_world()))?;
            mapped.push_u32(index as u32)?;
            mapped.pad_to(offset + LIGHT_VOLUME_PARAMS_SIZE)?;
            light.volume_params = UniformRange {
                offset,
                size: LIGHT_VOLUME_PARAMS_SIZE,
            };
        }
        mapped.finish(device)?;

        log::trace!(
            "packed {} entities ({} bytes), {} light volumes ({} bytes)",
            scene.entities.len(),
            self.entity_params.head(),
            scene.point_lights().count(),
            self.light_volume_params.head()
        );
        Ok(())
    }
}
