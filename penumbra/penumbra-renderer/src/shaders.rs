//! Built-in WGSL programs, embedded at compile time.
//!
//! Binding layout shared by all of them: group 0 holds uniforms (binding 0 the global block,
//! binding 1 the entity or light-volume block), group 1 holds textures (unit `u` at binding
//! `2u`, its sampler at `2u + 1`).

use penumbra_rhi::{GpuDevice, RhiError};

use crate::registry::{ProgramIdx, Registry};

/// Geometry pass: writes position, normal and albedo into the G-buffer.
pub const GBUFFER_WGSL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/gbuffer.wgsl"));

/// Position-only light sphere for the stencil pass.
pub const LIGHT_VOLUME_WGSL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/light_volume.wgsl"));

/// One point light shaded inside its volume.
pub const DEFERRED_POINT_WGSL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/deferred_point.wgsl"));

/// All directional lights on a full-screen quad.
pub const DEFERRED_DIRECTIONAL_WGSL: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/deferred_directional.wgsl"));

pub const COMPOSITE_WGSL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/composite.wgsl"));

pub const COMPOSITE_TONEMAP_WGSL: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/composite_tonemap.wgsl"));

pub const COMPOSITE_DEPTH_WGSL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/composite_depth.wgsl"));

/// Textured mesh lit by every light, alpha blended.
pub const FORWARD_WGSL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/forward.wgsl"));

/// Name and source of every built-in program.
pub const BUILTIN_PROGRAMS: [(&str, &str); 8] = [
    ("gbuffer", GBUFFER_WGSL),
    ("light_volume", LIGHT_VOLUME_WGSL),
    ("deferred_point", DEFERRED_POINT_WGSL),
    ("deferred_directional", DEFERRED_DIRECTIONAL_WGSL),
    ("composite", COMPOSITE_WGSL),
    ("composite_tonemap", COMPOSITE_TONEMAP_WGSL),
    ("composite_depth", COMPOSITE_DEPTH_WGSL),
    ("forward", FORWARD_WGSL),
];

/// Registry indices of the built-in programs.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinPrograms {
    pub gbuffer: ProgramIdx,
    pub light_volume: ProgramIdx,
    pub deferred_point: ProgramIdx,
    pub deferred_directional: ProgramIdx,
    pub composite: ProgramIdx,
    pub composite_tonemap: ProgramIdx,
    pub composite_depth: ProgramIdx,
    pub forward: ProgramIdx,
}

impl BuiltinPrograms {
    /// Compile every built-in program. The first failure aborts setup.
    pub fn register(registry: &mut Registry, device: &mut dyn GpuDevice) -> Result<Self, RhiError> {
        let [gbuffer, light_volume, deferred_point, deferred_directional, composite, composite_tonemap, composite_depth, forward] =
            BUILTIN_PROGRAMS;
        let mut add = |(name, source): (&str, &str)| registry.add_program_source(device, name, source, None);
        Ok(Self {
            gbuffer: add(gbuffer)?,
            light_volume: add(light_volume)?,
            deferred_point: add(deferred_point)?,
            deferred_directional: add(deferred_directional)?,
            composite: add(composite)?,
            composite_tonemap: add(composite_tonemap)?,
            composite_depth: add(composite_depth)?,
            forward: add(forward)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use penumbra_rhi::{reflect_program, TextureSampleKind, VertexInput};

    #[test]
    fn every_builtin_program_validates() {
        for (name, source) in BUILTIN_PROGRAMS {
            if let Err(e) = reflect_program(name, source) {
                panic!("{e}");
            }
        }
    }

    #[test]
    fn stencil_program_needs_positions_only() {
        let layout = reflect_program("light_volume", LIGHT_VOLUME_WGSL).unwrap();
        assert_eq!(layout.vertex_inputs, vec![VertexInput { location: 0, components: 3 }]);
        assert_eq!(layout.uniform_bindings, vec![1]);
        assert!(layout.textures.is_empty());
    }

    #[test]
    fn point_light_reads_three_gbuffer_units() {
        let layout = reflect_program("deferred_point", DEFERRED_POINT_WGSL).unwrap();
        assert_eq!(layout.uniform_bindings, vec![0, 1]);
        let units: Vec<u32> = layout.textures.iter().map(|t| t.unit).collect();
        assert_eq!(units, vec![0, 1, 2]);
        assert!(layout.textures.iter().all(|t| !t.sampled));
    }

    #[test]
    fn depth_composite_takes_a_depth_texture() {
        let layout = reflect_program("composite_depth", COMPOSITE_DEPTH_WGSL).unwrap();
        assert_eq!(layout.texture(0).map(|t| t.kind), Some(TextureSampleKind::Depth));
    }

    #[test]
    fn geometry_and_forward_share_the_mesh_layout() {
        let gbuffer = reflect_program("gbuffer", GBUFFER_WGSL).unwrap();
        let forward = reflect_program("forward", FORWARD_WGSL).unwrap();
        assert_eq!(gbuffer.vertex_inputs, forward.vertex_inputs);
        assert_eq!(gbuffer.vertex_inputs.len(), 3);
        assert_eq!(gbuffer.uniform_bindings, vec![1]);
        assert_eq!(forward.uniform_bindings, vec![0, 1]);
        assert!(forward.texture(0).is_some_and(|t| t.sampled));
    }
}
