//! WGSL reflection: vertex inputs, uniform bindings and texture units a program uses.
//!
//! Binding conventions: uniforms live in group 0 (`@binding(n)` is the uniform binding
//! index); textures live in group 1, texture unit `u` at `@binding(2u)` with its optional
//! sampler at `@binding(2u + 1)`.

use naga::{AddressSpace, Binding, ImageClass, Module, ShaderStage, TypeInner};

use crate::RhiError;

pub const VERTEX_ENTRY_POINT: &str = "vs_main";
pub const FRAGMENT_ENTRY_POINT: &str = "fs_main";
pub const UNIFORM_GROUP: u32 = 0;
pub const TEXTURE_GROUP: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexInput {
    pub location: u32,
    pub components: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSampleKind {
    Float,
    Depth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureBinding {
    pub unit: u32,
    pub kind: TextureSampleKind,
    /// A sampler is declared next to the texture.
    pub sampled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramLayout {
    /// Sorted by location.
    pub vertex_inputs: Vec<VertexInput>,
    /// Sorted uniform binding indices.
    pub uniform_bindings: Vec<u32>,
    /// Sorted by unit.
    pub textures: Vec<TextureBinding>,
}

impl ProgramLayout {
    pub fn uses_uniform(&self, binding: u32) -> bool {
        self.uniform_bindings.contains(&binding)
    }

    pub fn texture(&self, unit: u32) -> Option<&TextureBinding> {
        self.textures.iter().find(|t| t.unit == unit)
    }
}

/// Parse, validate and reflect a WGSL program. Errors carry the full diagnostic text.
pub fn reflect_program(name: &str, source: &str) -> Result<ProgramLayout, RhiError> {
    let fail = |diagnostic: String| RhiError::ShaderCompilation {
        name: name.to_string(),
        diagnostic,
    };

    let module = naga::front::wgsl::parse_str(source).map_err(|e| fail(e.emit_to_string(source)))?;
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::default(),
        naga::valid::Capabilities::default(),
    )
    .validate(&module)
    .map_err(|e| fail(format!("{e:?}")))?;

    let vertex = module
        .entry_points
        .iter()
        .find(|ep| ep.name == VERTEX_ENTRY_POINT && ep.stage == ShaderStage::Vertex)
        .ok_or_else(|| fail(format!("missing @vertex entry point `{VERTEX_ENTRY_POINT}`")))?;
    if !module
        .entry_points
        .iter()
        .any(|ep| ep.name == FRAGMENT_ENTRY_POINT && ep.stage == ShaderStage::Fragment)
    {
        return Err(fail(format!("missing @fragment entry point `{FRAGMENT_ENTRY_POINT}`")));
    }

    let mut layout = ProgramLayout::default();
    for arg in &vertex.function.arguments {
        collect_inputs(&module, arg.ty, arg.binding.as_ref(), &mut layout.vertex_inputs);
    }
    layout.vertex_inputs.sort_by_key(|i| i.location);

    let mut samplers = Vec::new();
    for (_, var) in module.global_variables.iter() {
        let Some(rb) = &var.binding else { continue };
        let var_name = var.name.as_deref().unwrap_or("<unnamed>");
        match var.space {
            AddressSpace::Uniform => {
                if rb.group != UNIFORM_GROUP {
                    return Err(fail(format!(
                        "uniform `{var_name}` is in group {}, expected group {UNIFORM_GROUP}",
                        rb.group
                    )));
                }
                layout.uniform_bindings.push(rb.binding);
            }
            AddressSpace::Handle => {
                if rb.group != TEXTURE_GROUP {
                    return Err(fail(format!(
                        "resource `{var_name}` is in group {}, expected group {TEXTURE_GROUP}",
                        rb.group
                    )));
                }
                match &module.types[var.ty].inner {
                    TypeInner::Image { class, .. } => {
                        if rb.binding % 2 != 0 {
                            return Err(fail(format!("texture `{var_name}` must use an even binding")));
                        }
                        let kind = match class {
                            ImageClass::Depth { .. } => TextureSampleKind::Depth,
                            ImageClass::Sampled { .. } => TextureSampleKind::Float,
                            ImageClass::Storage { .. } => {
                                return Err(fail(format!("storage texture `{var_name}` is not supported")));
                            }
                        };
                        layout.textures.push(TextureBinding {
                            unit: rb.binding / 2,
                            kind,
                            sampled: false,
                        });
                    }
                    TypeInner::Sampler { .. } => {
                        if rb.binding % 2 != 1 {
                            return Err(fail(format!("sampler `{var_name}` must use an odd binding")));
                        }
                        samplers.push(rb.binding / 2);
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    for unit in samplers {
        match layout.textures.iter_mut().find(|t| t.unit == unit) {
            Some(texture) => texture.sampled = true,
            None => return Err(fail(format!("sampler for texture unit {unit} has no texture"))),
        }
    }
    layout.uniform_bindings.sort_unstable();
    layout.uniform_bindings.dedup();
    layout.textures.sort_by_key(|t| t.unit);
    Ok(layout)
}

fn collect_inputs(module: &Module, ty: naga::Handle<naga::Type>, binding: Option<&Binding>, out: &mut Vec<VertexInput>) {
    let inner = &module.types[ty].inner;
    match binding {
        Some(Binding::Location { location, .. }) => out.push(VertexInput {
            location: *location,
            components: component_count(inner),
        }),
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = inner {
                for member in members {
                    collect_inputs(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

fn component_count(inner: &TypeInner) -> u32 {
    match inner {
        TypeInner::Scalar(_) => 1,
        TypeInner::Vector { size, .. } => *size as u32,
        _ => 0,
    }
}
