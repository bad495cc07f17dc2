//! Asset import: images through `image`, OBJ/MTL models through `tobj`.

use std::path::Path;

use glam::Vec3;
use penumbra_rhi::GpuDevice;

use crate::error::{AssetError, RendererError};
use crate::registry::{Material, MaterialIdx, ModelIdx, Registry, SubmeshData, TextureIdx, VertexBufferLayout};

pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows, top row first.
    pub pixels: Vec<u8>,
}

pub fn decode_rgba8(path: &Path) -> Result<DecodedImage, AssetError> {
    let image = image::open(path).map_err(|source| AssetError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

/// Import an OBJ file: one submesh per object, one material per submesh. Texture paths in the
/// MTL file are resolved relative to the OBJ directory; a texture that fails to load is skipped
/// with a warning and the material falls back to its flat color.
pub fn load_model(registry: &mut Registry, device: &mut dyn GpuDevice, path: impl AsRef<Path>) -> Result<ModelIdx, RendererError> {
    let path = path.as_ref();
    let (models, materials) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS).map_err(|source| AssetError::Model {
        path: path.to_path_buf(),
        source,
    })?;
    let materials = materials.unwrap_or_else(|e| {
        log::warn!("model '{}': no materials ({e})", path.display());
        Vec::new()
    });
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut imported = Vec::with_capacity(materials.len());
    for mtl in &materials {
        imported.push(import_material(registry, device, dir, mtl));
    }

    let mut submeshes = Vec::new();
    let mut submesh_materials = Vec::new();
    let mut fallback: Option<MaterialIdx> = None;
    for model in &models {
        if model.mesh.indices.is_empty() {
            continue;
        }
        submeshes.push(interleave(&model.mesh));
        let material = match model.mesh.material_id.and_then(|id| imported.get(id).copied()) {
            Some(material) => material,
            None => *fallback.get_or_insert_with(|| registry.add_material(Material::new("default"))),
        };
        submesh_materials.push(material);
    }
    if submeshes.is_empty() {
        return Err(AssetError::EmptyModel(path.to_path_buf()).into());
    }

    let label = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    let mesh = registry.add_mesh(device, &label, &submeshes)?;
    let model = registry.add_model(mesh, submesh_materials)?;
    log::info!(
        "model '{}': {} submeshes, {} materials",
        path.display(),
        submeshes.len(),
        materials.len()
    );
    Ok(model)
}

fn import_material(registry: &mut Registry, device: &mut dyn GpuDevice, dir: &Path, mtl: &tobj::Material) -> MaterialIdx {
    let mut material = Material::new(mtl.name.clone());
    if let Some(diffuse) = mtl.diffuse {
        material.albedo = Vec3::from_array(diffuse);
    }
    if let Some(emissive) = mtl.unknown_param.get("Ke").and_then(|s| parse_vec3(s)) {
        material.emissive = emissive;
    }
    // MTL shininess runs 0..=1000.
    material.smoothness = mtl.shininess.map(|ns| (ns / 1000.0).clamp(0.0, 1.0)).unwrap_or(0.0);

    let mut texture = |name: Option<&str>| -> Option<TextureIdx> {
        let name = name?;
        let path = dir.join(name);
        match registry.load_texture_2d(device, &path) {
            Ok(idx) => Some(idx),
            Err(e) => {
                log::warn!("material '{}': {e}", mtl.name);
                None
            }
        }
    };
    material.albedo_texture = texture(mtl.diffuse_texture.as_deref());
    material.specular_texture = texture(mtl.specular_texture.as_deref());
    material.normal_texture = texture(mtl.normal_texture.as_deref());
    material.emissive_texture = texture(mtl.unknown_param.get("map_Ke").map(String::as_str));
    material.bump_texture = texture(mtl.unknown_param.get("bump").map(String::as_str));

    // Untextured colored materials get a solid texture so the albedo reaches the shaders.
    if material.albedo_texture.is_none() && material.albedo != Vec3::ONE {
        let rgba = color_to_rgba8(material.albedo);
        let name = format!("albedo_{:02x}{:02x}{:02x}", rgba[0], rgba[1], rgba[2]);
        match registry.solid_texture(device, &name, rgba) {
            Ok(idx) => material.albedo_texture = Some(idx),
            Err(e) => log::warn!("material '{}': {e}", mtl.name),
        }
    }
    registry.add_material(material)
}

fn interleave(mesh: &tobj::Mesh) -> SubmeshData {
    let vertex_count = mesh.positions.len() / 3;
    let mut vertices = Vec::with_capacity(vertex_count * 8);
    for i in 0..vertex_count {
        vertices.extend_from_slice(&mesh.positions[i * 3..i * 3 + 3]);
        match mesh.normals.get(i * 3..i * 3 + 3) {
            Some(n) => vertices.extend_from_slice(n),
            None => vertices.extend_from_slice(&[0.0, 1.0, 0.0]),
        }
        match mesh.texcoords.get(i * 2..i * 2 + 2) {
            // OBJ texture space has its origin at the bottom left.
            Some(uv) => vertices.extend_from_slice(&[uv[0], 1.0 - uv[1]]),
            None => vertices.extend_from_slice(&[0.0, 0.0]),
        }
    }
    SubmeshData {
        layout: VertexBufferLayout::position_normal_uv(),
        vertices,
        indices: mesh.indices.clone(),
    }
}

fn parse_vec3(s: &str) -> Option<Vec3> {
    let mut parts = s.split_whitespace().map(str::parse::<f32>);
    let x = parts.next()?.ok()?;
    let y = parts.next()?.ok()?;
    let z = parts.next()?.ok()?;
    Some(Vec3::new(x, y, z))
}

fn color_to_rgba8(color: Vec3) -> [u8; 4] {
    let c = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    [c.x as u8, c.y as u8, c.z as u8, 255]
}

#[cfg(test)]
mod tests {
    use super::*;
    use penumbra_rhi::headless::RecordingDevice;

    const TWO_OBJECTS: &str = "\
mtllib scene.mtl
o first
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 0 1
vt 0 0
vt 1 0
vt 0 1
usemtl red
f 1/1/1 2/2/1 3/3/1
o second
v 0 0 1
v 1 0 1
v 0 1 1
usemtl textured
f 4/1/1 5/2/1 6/3/1
";

    const MATERIALS: &str = "\
newmtl red
Kd 1.0 0.0 0.0
Ns 250
newmtl textured
Kd 1.0 1.0 1.0
map_Kd checker.png
";

    #[test]
    fn obj_import_builds_one_submesh_and_material_per_object() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("scene.obj"), TWO_OBJECTS).unwrap();
        std::fs::write(dir.path().join("scene.mtl"), MATERIALS).unwrap();
        image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]))
            .save(dir.path().join("checker.png"))
            .unwrap();

        let mut device = RecordingDevice::new();
        let mut registry = Registry::new(8);
        let model = load_model(&mut registry, &mut device, dir.path().join("scene.obj")).unwrap();

        let model = registry.model(model).unwrap().clone();
        let mesh = registry.mesh(model.mesh).unwrap();
        assert_eq!(mesh.submeshes.len(), 2);
        assert_eq!(model.materials.len(), 2);
        assert_eq!(mesh.submeshes[0].index_count, 3);
        assert_eq!(mesh.submeshes[1].vertex_offset, 3 * 32);

        let red = registry.material(model.materials[0]).unwrap();
        assert_eq!(red.name, "red");
        assert_eq!(red.albedo, Vec3::new(1.0, 0.0, 0.0));
        assert!((red.smoothness - 0.25).abs() < 1e-6);
        let solid = red.albedo_texture.expect("solid albedo texture");
        assert_eq!(registry.texture(solid).unwrap().path, "builtin:albedo_ff0000");

        let textured = registry.material(model.materials[1]).unwrap();
        let albedo = textured.albedo_texture.expect("albedo texture");
        assert_eq!(registry.texture(albedo).unwrap().width, 4);
    }

    #[test]
    fn missing_model_is_an_asset_error() {
        let mut device = RecordingDevice::new();
        let mut registry = Registry::new(8);
        let err = load_model(&mut registry, &mut device, "missing/model.obj").unwrap_err();
        assert!(matches!(err, RendererError::Asset(AssetError::Model { .. })));
    }

    #[test]
    fn emissive_parsing() {
        assert_eq!(parse_vec3("0.5 1 0"), Some(Vec3::new(0.5, 1.0, 0.0)));
        assert_eq!(parse_vec3("0.5 x"), None);
        assert_eq!(color_to_rgba8(Vec3::new(2.0, 0.5, -1.0)), [255, 128, 0, 255]);
    }
}
