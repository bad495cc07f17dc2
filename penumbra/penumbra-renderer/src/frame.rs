//! Per-frame recording context shared by the deferred and forward pipelines.

use penumbra_rhi::{CommandList, GpuDevice, PassDescriptor, TextureId};

use crate::cbuffer::{ConstantBuffer, UniformRange};
use crate::error::RendererError;
use crate::packer::ParameterPacker;
use crate::registry::{ModelIdx, ProgramIdx, Registry};
use crate::scene::{Entity, Light, Scene};
use crate::shaders::BuiltinPrograms;

pub const GLOBAL_BINDING: u32 = 0;
/// Entity block in the geometry/forward programs, light-volume block in the light programs.
pub const LOCAL_BINDING: u32 = 1;
pub const ALBEDO_UNIT: u32 = 0;

/// Built-in primitive models, each with the default white material.
#[derive(Debug, Clone, Copy)]
pub struct Primitives {
    pub sphere: ModelIdx,
    pub quad: ModelIdx,
    pub cube: ModelIdx,
}

pub struct FrameContext<'a> {
    pub device: &'a mut dyn GpuDevice,
    pub registry: &'a mut Registry,
    pub commands: &'a mut CommandList,
    pub scene: &'a Scene,
    pub params: &'a ParameterPacker,
    pub programs: &'a BuiltinPrograms,
    pub primitives: &'a Primitives,
    /// Bound wherever a material has no albedo texture.
    pub white_texture: TextureId,
    pub viewport: (u32, u32),
}

impl FrameContext<'_> {
    /// Begin a pass and cover the whole viewport.
    pub fn begin_pass(&mut self, desc: PassDescriptor) {
        self.commands.begin_pass(desc);
        self.commands.set_viewport(self.viewport.0, self.viewport.1);
    }

    pub fn end_pass(&mut self) {
        self.commands.end_pass();
    }

    pub fn use_program(&mut self, program: ProgramIdx) -> Result<(), RendererError> {
        let handle = self.registry.program(program)?.handle;
        self.commands.use_program(handle);
        Ok(())
    }

    pub fn bind_global(&mut self) -> Result<(), RendererError> {
        let params = self.params;
        self.bind_range(GLOBAL_BINDING, params.entity_buffer(), self.scene.global_params)
    }

    pub fn bind_entity(&mut self, entity: &Entity) -> Result<(), RendererError> {
        let params = self.params;
        self.bind_range(LOCAL_BINDING, params.entity_buffer(), entity.params)
    }

    pub fn bind_light_volume(&mut self, light: &Light) -> Result<(), RendererError> {
        let params = self.params;
        self.bind_range(LOCAL_BINDING, params.light_volume_buffer(), light.volume_params)
    }

    fn bind_range(&mut self, binding: u32, buffer: &ConstantBuffer, range: UniformRange) -> Result<(), RendererError> {
        let (handle, range) = buffer.binding(range)?;
        self.commands
            .bind_uniform_range(binding, handle, u64::from(range.offset), u64::from(range.size));
        Ok(())
    }

    /// Bind the vertex array of `submesh` for `program` and draw it.
    pub fn draw_submesh(&mut self, model: ModelIdx, submesh: usize, program: ProgramIdx) -> Result<(), RendererError> {
        let mesh = self.registry.model(model)?.mesh;
        let vao = self.registry.find_vao(self.device, mesh, submesh, program)?;
        let sub = &self.registry.mesh(mesh)?.submeshes[submesh];
        let (index_count, first_index) = (sub.index_count, sub.first_index());
        self.commands.bind_vertex_array(vao);
        self.commands.draw_indexed(index_count, first_index);
        Ok(())
    }

    /// Draw every submesh of an entity's model with `program`: global and entity blocks bound,
    /// each submesh's albedo at unit 0.
    pub fn draw_entity(&mut self, entity: &Entity, program: ProgramIdx) -> Result<(), RendererError> {
        self.use_program(program)?;
        self.bind_global()?;
        self.bind_entity(entity)?;
        let materials = self.registry.model(entity.model)?.materials.clone();
        for (submesh, material) in materials.into_iter().enumerate() {
            let albedo = match self.registry.material(material)?.albedo_texture {
                Some(texture) => self.registry.texture(texture)?.handle,
                None => self.white_texture,
            };
            self.commands.bind_texture(ALBEDO_UNIT, albedo);
            self.draw_submesh(entity.model, submesh, program)?;
        }
        Ok(())
    }
}
