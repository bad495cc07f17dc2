//! Penumbra renderer: G-buffer + stenciled point-light volumes + directional pass + composite,
//! and a forward alternative, recorded as command lists over any [`GpuDevice`].

pub mod assets;
pub mod camera;
pub mod cbuffer;
pub mod config;
pub mod debug_output;
pub mod deferred;
pub mod demo;
pub mod error;
pub mod forward;
pub mod frame;
pub mod gbuffer;
pub mod light;
pub mod light_pass;
pub mod packer;
pub mod present;
pub mod primitives;
pub mod registry;
pub mod scene;
pub mod shaders;

use std::path::Path;

use penumbra_rhi::{CommandList, GpuDevice, TextureId};
use render_api::{FrameInfo, Input, Key, RenderMode, RenderTarget};

pub use camera::Camera;
pub use cbuffer::{ConstantBuffer, MappedBuffer, UniformRange};
pub use config::{RendererConfig, ToneMapping};
pub use deferred::{DeferredPipeline, DeferredStage};
pub use error::{AssetError, ConstantBufferError, RendererError, VertexBindingError};
pub use frame::{FrameContext, Primitives};
pub use gbuffer::GBuffer;
pub use packer::{FrameView, ParameterPacker};
pub use registry::{Material, MaterialIdx, MeshIdx, ModelIdx, ProgramIdx, Registry, SubmeshData, TextureIdx};
pub use scene::{Entity, Light, LightKind, Scene};
pub use shaders::BuiltinPrograms;

/// Keys `1`–`5` select the composite target.
const TARGET_KEYS: [(Key, RenderTarget); 5] = [
    (Key::Digit1, RenderTarget::Position),
    (Key::Digit2, RenderTarget::Diffuse),
    (Key::Digit3, RenderTarget::Normals),
    (Key::Digit4, RenderTarget::Depth),
    (Key::Digit5, RenderTarget::Final),
];

/// Everything one frame needs: resources, scene, camera, packed parameters and both pipelines.
/// The device is passed into every call that touches the GPU.
pub struct Renderer {
    config: RendererConfig,
    registry: Registry,
    scene: Scene,
    camera: Camera,
    packer: ParameterPacker,
    programs: BuiltinPrograms,
    primitives: Primitives,
    default_material: MaterialIdx,
    white_texture: TextureId,
    deferred: DeferredPipeline,
    mode: RenderMode,
    target: RenderTarget,
    viewport: (u32, u32),
}

impl Renderer {
    pub fn new(device: &mut dyn GpuDevice, config: RendererConfig, width: u32, height: u32) -> Result<Self, RendererError> {
        let mut registry = Registry::new(config.vao_cache_limit);
        let programs = BuiltinPrograms::register(&mut registry, device)?;

        let white = registry.solid_texture(device, "white", [255; 4])?;
        let white_texture = registry.texture(white)?.handle;
        let default_material = registry.add_material(Material::new("default").with_albedo_texture(white));

        let mut primitive = |label: &str, data: SubmeshData| -> Result<ModelIdx, RendererError> {
            let mesh = registry.add_mesh(device, label, &[data])?;
            Ok(registry.add_model(mesh, vec![default_material])?)
        };
        let primitives = Primitives {
            sphere: primitive("sphere", primitives::sphere())?,
            quad: primitive("quad", primitives::quad())?,
            cube: primitive("cube", primitives::cube())?,
        };

        let packer = ParameterPacker::new(device, &config)?;
        let deferred = DeferredPipeline::new(device, width, height)?;
        let camera = Camera::new(config.camera_position, camera::DEFAULT_YAW, camera::DEFAULT_PITCH);
        log::info!(
            "renderer ready: {width}x{height}, mode {:?}, target {}",
            config.mode,
            config.target.name()
        );

        Ok(Self {
            mode: config.mode,
            target: config.target,
            config,
            registry,
            scene: Scene::new(),
            camera,
            packer,
            programs,
            primitives,
            default_material,
            white_texture,
            deferred,
            viewport: (width, height),
        })
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn programs(&self) -> &BuiltinPrograms {
        &self.programs
    }

    pub fn primitives(&self) -> &Primitives {
        &self.primitives
    }

    /// White material shared by the primitive models.
    pub fn default_material(&self) -> MaterialIdx {
        self.default_material
    }

    pub fn packer(&self) -> &ParameterPacker {
        &self.packer
    }

    pub fn gbuffer(&self) -> &GBuffer {
        self.deferred.gbuffer()
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: RenderMode) {
        self.mode = mode;
    }

    pub fn target(&self) -> RenderTarget {
        self.target
    }

    pub fn set_target(&mut self, target: RenderTarget) {
        self.target = target;
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn load_model(&mut self, device: &mut dyn GpuDevice, path: impl AsRef<Path>) -> Result<ModelIdx, RendererError> {
        assets::load_model(&mut self.registry, device, path)
    }

    /// Recreate the G-buffer at the new size.
    pub fn resize(&mut self, device: &mut dyn GpuDevice, width: u32, height: u32) -> Result<(), RendererError> {
        self.deferred.resize(device, width, height)?;
        self.viewport = (width, height);
        log::debug!("viewport resized to {width}x{height}");
        Ok(())
    }

    /// Update phase: mode/target keys, resize, camera, then parameter packing.
    pub fn update(&mut self, device: &mut dyn GpuDevice, input: &Input, frame: &FrameInfo) -> Result<(), RendererError> {
        if input.was_key_pressed(Key::F) {
            self.mode = self.mode.toggled();
            log::info!("render mode: {:?}", self.mode);
        }
        if let Some(&(_, target)) = TARGET_KEYS.iter().find(|(key, _)| input.was_key_pressed(*key)) {
            self.target = target;
            log::info!("render target: {}", target.name());
        }

        let (width, height) = frame.viewport_size;
        if width > 0 && height > 0 && (width, height) != self.viewport {
            self.resize(device, width, height)?;
        }
        self.camera.apply_input(input, frame);
        self.pack(device)
    }

    /// Write this frame's global, entity and light-volume blocks.
    pub fn pack(&mut self, device: &mut dyn GpuDevice) -> Result<(), RendererError> {
        let (width, height) = self.viewport;
        let view = FrameView::from_camera(&self.camera, width as f32 / height as f32);
        self.packer.pack(device, &mut self.scene, &view)
    }

    /// Record the frame for the current mode without submitting it.
    pub fn record(&mut self, device: &mut dyn GpuDevice) -> Result<CommandList, RendererError> {
        let mut commands = CommandList::new();
        let mut ctx = FrameContext {
            device,
            registry: &mut self.registry,
            commands: &mut commands,
            scene: &self.scene,
            params: &self.packer,
            programs: &self.programs,
            primitives: &self.primitives,
            white_texture: self.white_texture,
            viewport: self.viewport,
        };
        match self.mode {
            RenderMode::Deferred => {
                self.deferred
                    .record(&mut ctx, self.target, self.config.tone_mapping, self.config.clear_color)?
            }
            RenderMode::Forward => forward::record_forward(&mut ctx, self.config.clear_color)?,
        }
        Ok(commands)
    }

    /// Record, submit and drain the device's debug messages.
    pub fn render(&mut self, device: &mut dyn GpuDevice) -> Result<(), RendererError> {
        let commands = self.record(device)?;
        log::trace!("submitting {} commands, {} draws", commands.len(), commands.draw_count());
        device.submit(&commands)?;
        debug_output::drain(device);
        Ok(())
    }
}
