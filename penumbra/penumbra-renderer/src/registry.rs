//! GPU resource registry: textures, materials, meshes, models and programs held in arenas and
//! addressed by stable indices, plus the per-submesh vertex array cache.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use glam::Vec3;
use penumbra_rhi::{
    BufferDescriptor, BufferId, BufferUsage, GpuDevice, ProgramDescriptor, ProgramId, ProgramLayout, RhiError,
    TextureDescriptor, TextureFormat, TextureId, TextureUsage, VertexArrayDescriptor, VertexArrayId,
    VertexAttribute,
};

use crate::assets;
use crate::error::{AssetError, RendererError, VertexBindingError};

macro_rules! arena_index {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub u32);

            impl $name {
                pub fn index(self) -> usize {
                    self.0 as usize
                }
            }
        )*
    };
}

arena_index!(TextureIdx, MaterialIdx, MeshIdx, ModelIdx, ProgramIdx);

pub const WHITE_TEXTURE: &str = "builtin:white";

#[derive(Debug, Clone)]
pub struct Texture {
    pub handle: TextureId,
    /// Source path, or `builtin:<name>` for generated textures.
    pub path: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub albedo: Vec3,
    pub emissive: Vec3,
    pub smoothness: f32,
    pub albedo_texture: Option<TextureIdx>,
    pub emissive_texture: Option<TextureIdx>,
    pub specular_texture: Option<TextureIdx>,
    pub normal_texture: Option<TextureIdx>,
    pub bump_texture: Option<TextureIdx>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            albedo: Vec3::ONE,
            emissive: Vec3::ZERO,
            smoothness: 0.0,
            albedo_texture: None,
            emissive_texture: None,
            specular_texture: None,
            normal_texture: None,
            bump_texture: None,
        }
    }

    pub fn with_albedo_texture(mut self, texture: TextureIdx) -> Self {
        self.albedo_texture = Some(texture);
        self
    }
}

/// Interleaved float vertex layout of a submesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexBufferLayout {
    pub attributes: Vec<VertexAttribute>,
    pub stride: u32,
}

impl VertexBufferLayout {
    /// position (location 0), normal (1), uv (2); stride 32.
    pub fn position_normal_uv() -> Self {
        Self {
            attributes: vec![
                VertexAttribute {
                    location: 0,
                    components: 3,
                    offset: 0,
                },
                VertexAttribute {
                    location: 1,
                    components: 3,
                    offset: 12,
                },
                VertexAttribute {
                    location: 2,
                    components: 2,
                    offset: 24,
                },
            ],
            stride: 32,
        }
    }

    pub fn position_only() -> Self {
        Self {
            attributes: vec![VertexAttribute {
                location: 0,
                components: 3,
                offset: 0,
            }],
            stride: 12,
        }
    }
}

/// CPU-side geometry for one submesh, before packing into the mesh buffers.
#[derive(Debug, Clone)]
pub struct SubmeshData {
    pub layout: VertexBufferLayout,
    pub vertices: Vec<f32>,
    /// Indices relative to this submesh's first vertex.
    pub indices: Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct Submesh {
    pub layout: VertexBufferLayout,
    /// Byte offset of the first vertex in the mesh vertex buffer.
    pub vertex_offset: u64,
    /// Byte offset of the first index in the mesh index buffer.
    pub index_offset: u64,
    pub index_count: u32,
    vaos: Vec<(ProgramId, VertexArrayId)>,
}

impl Submesh {
    pub fn first_index(&self) -> u32 {
        (self.index_offset / 4) as u32
    }

    pub fn cached_vertex_arrays(&self) -> usize {
        self.vaos.len()
    }
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub label: String,
    pub submeshes: Vec<Submesh>,
    pub vertex_buffer: BufferId,
    pub index_buffer: BufferId,
}

#[derive(Debug, Clone)]
pub struct Model {
    pub mesh: MeshIdx,
    /// One per submesh, in submesh order.
    pub materials: Vec<MaterialIdx>,
}

#[derive(Debug, Clone)]
pub struct Program {
    pub handle: ProgramId,
    pub name: String,
    pub path: Option<PathBuf>,
    pub layout: ProgramLayout,
    /// Source file timestamp, kept for hot reload.
    pub last_modified: Option<SystemTime>,
}

#[derive(Debug)]
pub struct Registry {
    textures: Vec<Texture>,
    materials: Vec<Material>,
    meshes: Vec<Mesh>,
    models: Vec<Model>,
    programs: Vec<Program>,
    vao_cache_limit: usize,
}

fn lookup<'a, T>(items: &'a [T], kind: &'static str, index: u32) -> Result<&'a T, VertexBindingError> {
    items
        .get(index as usize)
        .ok_or(VertexBindingError::UnknownHandle { kind, index })
}

impl Registry {
    pub fn new(vao_cache_limit: usize) -> Self {
        Self {
            textures: Vec::new(),
            materials: Vec::new(),
            meshes: Vec::new(),
            models: Vec::new(),
            programs: Vec::new(),
            vao_cache_limit,
        }
    }

    pub fn texture(&self, idx: TextureIdx) -> Result<&Texture, VertexBindingError> {
        lookup(&self.textures, "texture", idx.0)
    }

    pub fn textures(&self) -> &[Texture] {
        &self.textures
    }

    pub fn material(&self, idx: MaterialIdx) -> Result<&Material, VertexBindingError> {
        lookup(&self.materials, "material", idx.0)
    }

    pub fn mesh(&self, idx: MeshIdx) -> Result<&Mesh, VertexBindingError> {
        lookup(&self.meshes, "mesh", idx.0)
    }

    pub fn model(&self, idx: ModelIdx) -> Result<&Model, VertexBindingError> {
        lookup(&self.models, "model", idx.0)
    }

    pub fn program(&self, idx: ProgramIdx) -> Result<&Program, VertexBindingError> {
        lookup(&self.programs, "program", idx.0)
    }

    pub fn find_texture(&self, path: &str) -> Option<TextureIdx> {
        self.textures
            .iter()
            .position(|t| t.path == path)
            .map(|i| TextureIdx(i as u32))
    }

    /// Load-or-reuse: a path already registered returns its existing index without touching the device.
    pub fn load_texture_2d(&mut self, device: &mut dyn GpuDevice, path: impl AsRef<Path>) -> Result<TextureIdx, AssetError> {
        let path = path.as_ref();
        let key = path.to_string_lossy().into_owned();
        if let Some(existing) = self.find_texture(&key) {
            return Ok(existing);
        }
        let image = assets::decode_rgba8(path)?;
        self.create_texture(device, key, image.width, image.height, &image.pixels)
    }

    /// Register RGBA8 pixels under `path`, reusing an existing texture with the same path.
    pub fn add_texture_rgba8(
        &mut self,
        device: &mut dyn GpuDevice,
        path: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<TextureIdx, AssetError> {
        if let Some(existing) = self.find_texture(path) {
            return Ok(existing);
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(AssetError::PixelCount {
                path: path.to_string(),
                len: pixels.len(),
                expected,
            });
        }
        self.create_texture(device, path.to_string(), width, height, pixels)
    }

    /// 1×1 texture registered as `builtin:<name>`.
    pub fn solid_texture(&mut self, device: &mut dyn GpuDevice, name: &str, rgba: [u8; 4]) -> Result<TextureIdx, AssetError> {
        self.add_texture_rgba8(device, &format!("builtin:{name}"), 1, 1, &rgba)
    }

    fn create_texture(
        &mut self,
        device: &mut dyn GpuDevice,
        path: String,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<TextureIdx, AssetError> {
        let handle = device.create_texture(
            &TextureDescriptor {
                label: Some(&path),
                width,
                height,
                format: TextureFormat::Rgba8UnormSrgb,
                usage: TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
            },
            Some(pixels),
        )?;
        log::debug!("texture '{path}' {width}x{height}");
        let idx = TextureIdx(self.textures.len() as u32);
        self.textures.push(Texture {
            handle,
            path,
            width,
            height,
        });
        Ok(idx)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialIdx {
        let idx = MaterialIdx(self.materials.len() as u32);
        self.materials.push(material);
        idx
    }

    /// Pack all submeshes into one vertex buffer and one index buffer.
    pub fn add_mesh(
        &mut self,
        device: &mut dyn GpuDevice,
        label: &str,
        submeshes: &[SubmeshData],
    ) -> Result<MeshIdx, RendererError> {
        if submeshes.is_empty() {
            return Err(RendererError::EmptyMesh {
                label: label.to_string(),
            });
        }
        let mut vertex_bytes: Vec<u8> = Vec::new();
        let mut index_bytes: Vec<u8> = Vec::new();
        let mut packed = Vec::with_capacity(submeshes.len());
        for data in submeshes {
            let vertex_offset = vertex_bytes.len() as u64;
            let index_offset = index_bytes.len() as u64;
            vertex_bytes.extend_from_slice(bytemuck::cast_slice(&data.vertices));
            index_bytes.extend_from_slice(bytemuck::cast_slice(&data.indices));
            packed.push(Submesh {
                layout: data.layout.clone(),
                vertex_offset,
                index_offset,
                index_count: data.indices.len() as u32,
                vaos: Vec::new(),
            });
        }

        let vertex_label = format!("{label}_vertices");
        let vertex_buffer = device.create_buffer(
            &BufferDescriptor {
                label: Some(&vertex_label),
                size: vertex_bytes.len() as u64,
                usage: BufferUsage::VERTEX | BufferUsage::COPY_DST,
            },
            Some(&vertex_bytes),
        )?;
        let index_label = format!("{label}_indices");
        let index_buffer = device.create_buffer(
            &BufferDescriptor {
                label: Some(&index_label),
                size: index_bytes.len() as u64,
                usage: BufferUsage::INDEX | BufferUsage::COPY_DST,
            },
            Some(&index_bytes),
        )?;
        log::debug!(
            "mesh '{label}': {} submeshes, {} vertex bytes, {} index bytes",
            packed.len(),
            vertex_bytes.len(),
            index_bytes.len()
        );

        let idx = MeshIdx(self.meshes.len() as u32);
        self.meshes.push(Mesh {
            label: label.to_string(),
            submeshes: packed,
            vertex_buffer,
            index_buffer,
        });
        Ok(idx)
    }

    pub fn add_model(&mut self, mesh: MeshIdx, materials: Vec<MaterialIdx>) -> Result<ModelIdx, RendererError> {
        let submeshes = self.mesh(mesh)?.submeshes.len();
        if materials.len() != submeshes {
            return Err(AssetError::MaterialCount {
                materials: materials.len(),
                submeshes,
            }
            .into());
        }
        if let Some(unknown) = materials.iter().find(|m| m.index() >= self.materials.len()) {
            return Err(VertexBindingError::UnknownHandle {
                kind: "material",
                index: unknown.0,
            }
            .into());
        }
        let idx = ModelIdx(self.models.len() as u32);
        self.models.push(Model { mesh, materials });
        Ok(idx)
    }

    /// Compile and reflect a WGSL program from memory.
    pub fn add_program_source(
        &mut self,
        device: &mut dyn GpuDevice,
        name: &str,
        source: &str,
        path: Option<&Path>,
    ) -> Result<ProgramIdx, RhiError> {
        let compiled = device.create_program(&ProgramDescriptor { name, source }).map_err(|e| {
            log::error!("program '{name}' failed to compile: {e}");
            e
        })?;
        let last_modified = path.and_then(|p| std::fs::metadata(p).and_then(|m| m.modified()).ok());
        log::debug!(
            "program '{name}': {} inputs, uniforms {:?}, {} textures",
            compiled.layout.vertex_inputs.len(),
            compiled.layout.uniform_bindings,
            compiled.layout.textures.len()
        );
        let idx = ProgramIdx(self.programs.len() as u32);
        self.programs.push(Program {
            handle: compiled.id,
            name: name.to_string(),
            path: path.map(Path::to_path_buf),
            layout: compiled.layout,
            last_modified,
        });
        Ok(idx)
    }

    /// Read WGSL from disk and register it under `name`.
    pub fn load_program(&mut self, device: &mut dyn GpuDevice, path: impl AsRef<Path>, name: &str) -> Result<ProgramIdx, RendererError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.add_program_source(device, name, &source, Some(path))?)
    }

    /// Vertex array binding `program`'s inputs to `submesh` of `mesh`, created on first use and cached.
    /// Every program input must be provided by the submesh layout (matched by location).
    pub fn find_vao(
        &mut self,
        device: &mut dyn GpuDevice,
        mesh: MeshIdx,
        submesh: usize,
        program: ProgramIdx,
    ) -> Result<VertexArrayId, VertexBindingError> {
        let program = self.programs.get(program.index()).ok_or(VertexBindingError::UnknownHandle {
            kind: "program",
            index: program.0,
        })?;
        let mesh_entry = self.meshes.get_mut(mesh.index()).ok_or(VertexBindingError::UnknownHandle {
            kind: "mesh",
            index: mesh.0,
        })?;
        let (vertex_buffer, index_buffer) = (mesh_entry.vertex_buffer, mesh_entry.index_buffer);
        let mesh_label = mesh_entry.label.clone();
        let sub = mesh_entry
            .submeshes
            .get_mut(submesh)
            .ok_or(VertexBindingError::UnknownHandle {
                kind: "submesh",
                index: submesh as u32,
            })?;

        if let Some((_, vao)) = sub.vaos.iter().find(|(p, _)| *p == program.handle) {
            return Ok(*vao);
        }
        if sub.vaos.len() >= self.vao_cache_limit {
            return Err(VertexBindingError::CacheFull {
                mesh: mesh.0,
                submesh,
                limit: self.vao_cache_limit,
            });
        }

        let mut attributes = Vec::with_capacity(program.layout.vertex_inputs.len());
        for input in &program.layout.vertex_inputs {
            let attribute = sub
                .layout
                .attributes
                .iter()
                .find(|a| a.location == input.location)
                .ok_or_else(|| VertexBindingError::MissingAttribute {
                    mesh: mesh.0,
                    submesh,
                    program: program.name.clone(),
                    location: input.location,
                })?;
            attributes.push(*attribute);
        }

        let label = format!("{mesh_label}[{submesh}]/{}", program.name);
        let vao = device.create_vertex_array(&VertexArrayDescriptor {
            label: Some(&label),
            vertex_buffer,
            vertex_offset: sub.vertex_offset,
            index_buffer,
            stride: sub.layout.stride,
            attributes: &attributes,
        })?;
        sub.vaos.push((program.handle, vao));
        log::debug!("vertex array {label} created");
        Ok(vao)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use penumbra_rhi::headless::RecordingDevice;

    const LIT: &str = r#"
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

@vertex
fn vs_main(vertex: VertexInput) -> @builtin(position) vec4<f32> {
    return vec4<f32>(vertex.position + vertex.normal * 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
"#;

    const UNLIT: &str = r#"
@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(0.0, 0.0, 0.0, 1.0);
}
"#;

    fn triangle(layout: VertexBufferLayout) -> SubmeshData {
        let floats_per_vertex = (layout.stride / 4) as usize;
        SubmeshData {
            layout,
            vertices: vec![0.0; floats_per_vertex * 3],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn texture_load_is_deduplicated_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.png");
        image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 255, 255]))
            .save(&path)
            .unwrap();

        let mut device = RecordingDevice::new();
        let mut registry = Registry::new(4);
        let first = registry.load_texture_2d(&mut device, &path).unwrap();
        let second = registry.load_texture_2d(&mut device, &path).unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.textures().len(), 1);
        assert_eq!(device.texture_count(), 1);
        assert_eq!((registry.texture(first).unwrap().width, registry.texture(first).unwrap().height), (2, 2));
    }

    #[test]
    fn missing_texture_is_an_error() {
        let mut device = RecordingDevice::new();
        let mut registry = Registry::new(4);
        let err = registry.load_texture_2d(&mut device, "does/not/exist.png").unwrap_err();
        assert!(matches!(err, AssetError::Image { .. } | AssetError::Io { .. }));
        assert!(registry.textures().is_empty());
    }

    #[test]
    fn builtin_textures_follow_the_same_rule() {
        let mut device = RecordingDevice::new();
        let mut registry = Registry::new(4);
        let a = registry.solid_texture(&mut device, "white", [255; 4]).unwrap();
        let b = registry.solid_texture(&mut device, "white", [255; 4]).unwrap();
        assert_eq!(a, b);
        assert_eq!(registry.find_texture(WHITE_TEXTURE), Some(a));
        assert_eq!(device.texture_count(), 1);
    }

    #[test]
    fn submeshes_share_packed_buffers() {
        let mut device = RecordingDevice::new();
        let mut registry = Registry::new(4);
        let mesh = registry
            .add_mesh(
                &mut device,
                "pair",
                &[
                    triangle(VertexBufferLayout::position_normal_uv()),
                    triangle(VertexBufferLayout::position_only()),
                ],
            )
            .unwrap();
        let mesh = registry.mesh(mesh).unwrap();
        assert_eq!(mesh.submeshes[0].vertex_offset, 0);
        assert_eq!(mesh.submeshes[1].vertex_offset, 96);
        assert_eq!(mesh.submeshes[1].index_offset, 12);
        assert_eq!(mesh.submeshes[1].first_index(), 3);
        assert_eq!(device.buffer_data(mesh.vertex_buffer).unwrap().len(), 96 + 36);
    }

    #[test]
    fn vao_cache_returns_same_binding_per_program() {
        let mut device = RecordingDevice::new();
        let mut registry = Registry::new(4);
        let mesh = registry
            .add_mesh(&mut device, "tri", &[triangle(VertexBufferLayout::position_normal_uv())])
            .unwrap();
        let lit = registry.add_program_source(&mut device, "lit", LIT, None).unwrap();
        let unlit = registry.add_program_source(&mut device, "unlit", UNLIT, None).unwrap();

        let a = registry.find_vao(&mut device, mesh, 0, lit).unwrap();
        let b = registry.find_vao(&mut device, mesh, 0, lit).unwrap();
        assert_eq!(a, b);
        assert_eq!(device.vertex_array_count(), 1);

        let c = registry.find_vao(&mut device, mesh, 0, unlit).unwrap();
        assert_ne!(a, c);
        assert_eq!(registry.mesh(mesh).unwrap().submeshes[0].cached_vertex_arrays(), 2);

        let vao = device.vertex_array(a).unwrap();
        assert_eq!(vao.attributes.len(), 2);
        assert_eq!(vao.attributes[1].offset, 12);
        assert_eq!(vao.stride, 32);
    }

    #[test]
    fn vao_uses_the_submesh_vertex_offset() {
        let mut device = RecordingDevice::new();
        let mut registry = Registry::new(4);
        let mesh = registry
            .add_mesh(
                &mut device,
                "pair",
                &[
                    triangle(VertexBufferLayout::position_only()),
                    triangle(VertexBufferLayout::position_normal_uv()),
                ],
            )
            .unwrap();
        let lit = registry.add_program_source(&mut device, "lit", LIT, None).unwrap();
        let vao = registry.find_vao(&mut device, mesh, 1, lit).unwrap();
        assert_eq!(device.vertex_array(vao).unwrap().vertex_offset, 36);
    }

    #[test]
    fn missing_attribute_fails_every_time() {
        let mut device = RecordingDevice::new();
        let mut registry = Registry::new(4);
        let mesh = registry
            .add_mesh(&mut device, "positions", &[triangle(VertexBufferLayout::position_only())])
            .unwrap();
        let lit = registry.add_program_source(&mut device, "lit", LIT, None).unwrap();
        for _ in 0..2 {
            let err = registry.find_vao(&mut device, mesh, 0, lit).unwrap_err();
            assert!(matches!(err, VertexBindingError::MissingAttribute { location: 1, .. }));
        }
        assert_eq!(device.vertex_array_count(), 0);
        assert_eq!(registry.mesh(mesh).unwrap().submeshes[0].cached_vertex_arrays(), 0);
    }

    #[test]
    fn vao_cache_limit_is_enforced() {
        let mut device = RecordingDevice::new();
        let mut registry = Registry::new(1);
        let mesh = registry
            .add_mesh(&mut device, "tri", &[triangle(VertexBufferLayout::position_normal_uv())])
            .unwrap();
        let lit = registry.add_program_source(&mut device, "lit", LIT, None).unwrap();
        let unlit = registry.add_program_source(&mut device, "unlit", UNLIT, None).unwrap();
        registry.find_vao(&mut device, mesh, 0, lit).unwrap();
        assert!(matches!(
            registry.find_vao(&mut device, mesh, 0, unlit),
            Err(VertexBindingError::CacheFull { limit: 1, .. })
        ));
        // Cached pairs still resolve.
        assert!(registry.find_vao(&mut device, mesh, 0, lit).is_ok());
    }

    #[test]
    fn program_load_records_path_and_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unlit.wgsl");
        std::fs::write(&path, UNLIT).unwrap();
        let mut device = RecordingDevice::new();
        let mut registry = Registry::new(4);
        let idx = registry.load_program(&mut device, &path, "unlit").unwrap();
        let program = registry.program(idx).unwrap();
        assert_eq!(program.name, "unlit");
        assert_eq!(program.path.as_deref(), Some(path.as_path()));
        assert!(program.last_modified.is_some());
        assert_eq!(program.layout.vertex_inputs.len(), 1);
    }

    #[test]
    fn model_requires_one_material_per_submesh() {
        let mut device = RecordingDevice::new();
        let mut registry = Registry::new(4);
        let mesh = registry
            .add_mesh(&mut device, "tri", &[triangle(VertexBufferLayout::position_only())])
            .unwrap();
        assert!(registry.add_model(mesh, Vec::new()).is_err());
        let material = registry.add_material(Material::new("plain"));
        assert!(registry.add_model(mesh, vec![material]).is_ok());
    }

    #[test]
    fn unknown_handles_are_errors() {
        let mut device = RecordingDevice::new();
        let mut registry = Registry::new(4);
        assert!(matches!(
            registry.model(ModelIdx(99)),
            Err(VertexBindingError::UnknownHandle { kind: "model", index: 99 })
        ));
        assert!(registry.mesh(MeshIdx(0)).is_err());
        assert!(registry.texture(TextureIdx(3)).is_err());
        assert!(registry.program(ProgramIdx(1)).is_err());

        assert!(matches!(
            registry.add_model(MeshIdx(7), Vec::new()),
            Err(RendererError::VertexBinding(VertexBindingError::UnknownHandle { kind: "mesh", .. }))
        ));
        let mesh = registry
            .add_mesh(&mut device, "tri", &[triangle(VertexBufferLayout::position_only())])
            .unwrap();
        assert!(matches!(
            registry.add_model(mesh, vec![MaterialIdx(5)]),
            Err(RendererError::VertexBinding(VertexBindingError::UnknownHandle { kind: "material", index: 5 }))
        ));
    }
}
