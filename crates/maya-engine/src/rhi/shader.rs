//! WGSL front-end shared by every backend.
//!
//! Shaders are parsed and validated with `naga` before any backend sees them,
//! so malformed source is reported as a [`DeviceError::Shader`] instead of a
//! backend-side validation failure.
//!
//! Binding convention:
//! - `@group(0) @binding(N)`: uniform buffer bound to uniform slot `N`
//! - `@group(1) @binding(2N)`: `texture_2d<f32>` bound to texture slot `N`
//! - `@group(1) @binding(2N + 1)`: its `sampler`
//!
//! Entry points must be named `vs_main` and `fs_main`.
//!
//! Stage interfaces are checked the way wgpu checks them at pipeline
//! creation: vertex inputs against [`Vertex::ATTRS`], fragment inputs against
//! the vertex outputs, and a single `f32` color output at location 0.

use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::commands::{MAX_TEXTURE_SLOTS, MAX_UNIFORM_SLOTS};
use super::error::DeviceError;
use super::vertex::Vertex;

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

pub const UNIFORM_GROUP: u32 = 0;
pub const TEXTURE_GROUP: u32 = 1;

/// A uniform block read by a pipeline.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformBinding {
    pub slot: u32,
    /// Size of the WGSL type in bytes.
    pub size: usize,
}

/// Resource interface of a compiled shader.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ShaderInfo {
    /// Sorted by slot.
    pub uniforms: Vec<UniformBinding>,
    /// Texture slots, sorted.
    pub textures: Vec<u32>,
}

impl ShaderInfo {
    pub fn uses_bind_groups(&self) -> bool {
        !self.uniforms.is_empty() || !self.textures.is_empty()
    }

    pub fn uniform_size(&self, slot: u32) -> Option<usize> {
        self.uniforms.iter().find(|u| u.slot == slot).map(|u| u.size)
    }
}

/// Parses, validates and reflects a WGSL program.
pub fn compile(source: &str) -> Result<ShaderInfo, DeviceError> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| DeviceError::Shader(e.emit_to_string(source)))?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| DeviceError::Shader(e.into_inner().to_string()))?;

    let vertex = find_entry(&module, VERTEX_ENTRY, naga::ShaderStage::Vertex)?;
    let fragment = find_entry(&module, FRAGMENT_ENTRY, naga::ShaderStage::Fragment)?;
    check_vertex_inputs(&module, vertex)?;
    check_stage_link(&module, vertex, fragment)?;
    check_fragment_outputs(&module, fragment)?;

    reflect_bindings(&module)
}

fn find_entry<'m>(
    module: &'m naga::Module,
    name: &str,
    stage: naga::ShaderStage,
) -> Result<&'m naga::EntryPoint, DeviceError> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.name == name && ep.stage == stage)
        .ok_or_else(|| DeviceError::Shader(format!("missing {stage:?} entry point `{name}`")))
}

/// A user-defined `@location` in a stage interface.
struct Located<'m> {
    location: u32,
    binding: &'m naga::Binding,
    inner: &'m naga::TypeInner,
}

/// Collects `@location` bindings, flattening struct members.
fn collect_located<'m>(
    module: &'m naga::Module,
    binding: Option<&'m naga::Binding>,
    ty: naga::Handle<naga::Type>,
    out: &mut Vec<Located<'m>>,
) {
    let inner = &module.types[ty].inner;
    match binding {
        Some(binding) => {
            if let naga::Binding::Location { location, .. } = *binding {
                out.push(Located {
                    location,
                    binding,
                    inner,
                });
            }
        }
        None => {
            if let naga::TypeInner::Struct { members, .. } = inner {
                for member in members {
                    collect_located(module, member.binding.as_ref(), member.ty, out);
                }
            }
        }
    }
}

fn inputs<'m>(module: &'m naga::Module, ep: &'m naga::EntryPoint) -> Vec<Located<'m>> {
    let mut out = Vec::new();
    for arg in &ep.function.arguments {
        collect_located(module, arg.binding.as_ref(), arg.ty, &mut out);
    }
    out
}

fn outputs<'m>(module: &'m naga::Module, ep: &'m naga::EntryPoint) -> Vec<Located<'m>> {
    let mut out = Vec::new();
    if let Some(result) = &ep.function.result {
        collect_located(module, result.binding.as_ref(), result.ty, &mut out);
    }
    out
}

/// `(kind, width, components)` of a scalar or vector type.
fn numeric_shape(inner: &naga::TypeInner) -> Option<(naga::ScalarKind, u8, u32)> {
    match *inner {
        naga::TypeInner::Scalar(s) => Some((s.kind, s.width, 1)),
        naga::TypeInner::Vector { size, scalar } => Some((scalar.kind, scalar.width, size as u32)),
        _ => None,
    }
}

fn is_f32(shape: Option<(naga::ScalarKind, u8, u32)>) -> bool {
    matches!(shape, Some((naga::ScalarKind::Float, 4, _)))
}

/// Components the vertex layout feeds to `location`. Every attribute is an
/// `f32` vector, so this is the format size over four.
fn attribute_components(location: u32) -> Option<u32> {
    Vertex::ATTRS
        .iter()
        .find(|attr| attr.shader_location == location)
        .map(|attr| (attr.format.size() / 4) as u32)
}

fn check_vertex_inputs(module: &naga::Module, ep: &naga::EntryPoint) -> Result<(), DeviceError> {
    for input in inputs(module, ep) {
        let location = input.location;
        let Some(provided) = attribute_components(location) else {
            return Err(DeviceError::Shader(format!(
                "vertex input @location({location}) is not provided by the vertex layout"
            )));
        };
        let shape = numeric_shape(input.inner);
        if !is_f32(shape) || shape.is_some_and(|(_, _, n)| n > provided) {
            return Err(DeviceError::Shader(format!(
                "vertex input @location({location}) must be f32 or vecN<f32> with at most \
                 {provided} components"
            )));
        }
    }
    Ok(())
}

/// Interpolation with WGSL's defaults filled in.
fn interpolation(binding: &naga::Binding) -> Option<(naga::Interpolation, naga::Sampling)> {
    match *binding {
        naga::Binding::Location {
            interpolation,
            sampling,
            ..
        } => Some((
            interpolation.unwrap_or(naga::Interpolation::Perspective),
            sampling.unwrap_or(naga::Sampling::Center),
        )),
        _ => None,
    }
}

/// Every fragment input must be written by the vertex stage with a matching
/// type and interpolation.
fn check_stage_link(
    module: &naga::Module,
    vertex: &naga::EntryPoint,
    fragment: &naga::EntryPoint,
) -> Result<(), DeviceError> {
    let written = outputs(module, vertex);
    for input in inputs(module, fragment) {
        let location = input.location;
        let Some(output) = written.iter().find(|o| o.location == location) else {
            return Err(DeviceError::Shader(format!(
                "fragment input @location({location}) is not written by `{VERTEX_ENTRY}`"
            )));
        };
        if numeric_shape(input.inner) != numeric_shape(output.inner) {
            return Err(DeviceError::Shader(format!(
                "fragment input @location({location}) does not match the type `{VERTEX_ENTRY}` \
                 writes"
            )));
        }
        if interpolation(input.binding) != interpolation(output.binding) {
            return Err(DeviceError::Shader(format!(
                "fragment input @location({location}) is interpolated differently in each stage"
            )));
        }
    }
    Ok(())
}

/// The pipeline has one float color target at location 0.
fn check_fragment_outputs(module: &naga::Module, ep: &naga::EntryPoint) -> Result<(), DeviceError> {
    let written = outputs(module, ep);
    for output in &written {
        if output.location != 0 {
            return Err(DeviceError::Shader(format!(
                "fragment output @location({}) has no color target",
                output.location
            )));
        }
        if !is_f32(numeric_shape(output.inner)) {
            return Err(DeviceError::Shader(
                "fragment output @location(0) must be f32 or vecN<f32>".to_string(),
            ));
        }
    }
    if written.is_empty() {
        return Err(DeviceError::Shader(format!(
            "`{FRAGMENT_ENTRY}` must write a color to @location(0)"
        )));
    }
    Ok(())
}

fn reflect_bindings(module: &naga::Module) -> Result<ShaderInfo, DeviceError> {
    let mut info = ShaderInfo::default();
    let mut samplers = Vec::new();

    for (_, var) in module.global_variables.iter() {
        let Some(rb) = &var.binding else { continue };
        let inner = &module.types[var.ty].inner;
        let label = var.name.as_deref().unwrap_or("<unnamed>");

        match rb.group {
            UNIFORM_GROUP => {
                if var.space != naga::AddressSpace::Uniform {
                    return Err(DeviceError::Shader(format!(
                        "`{label}`: group {UNIFORM_GROUP} only holds uniform buffers"
                    )));
                }
                if rb.binding >= MAX_UNIFORM_SLOTS {
                    return Err(DeviceError::Shader(format!(
                        "`{label}`: uniform binding {} exceeds {MAX_UNIFORM_SLOTS} slots",
                        rb.binding
                    )));
                }
                info.uniforms.push(UniformBinding {
                    slot: rb.binding,
                    size: inner.size(module.to_ctx()) as usize,
                });
            }
            TEXTURE_GROUP => {
                let slot = rb.binding / 2;
                if slot >= MAX_TEXTURE_SLOTS {
                    return Err(DeviceError::Shader(format!(
                        "`{label}`: texture binding {} exceeds {MAX_TEXTURE_SLOTS} slots",
                        rb.binding
                    )));
                }
                let want_texture = rb.binding % 2 == 0;
                match inner {
                    naga::TypeInner::Image {
                        dim: naga::ImageDimension::D2,
                        arrayed: false,
                        class:
                            naga::ImageClass::Sampled {
                                kind: naga::ScalarKind::Float,
                                multi: false,
                            },
                    } if want_texture => info.textures.push(slot),
                    naga::TypeInner::Sampler { comparison: false } if !want_texture => {
                        samplers.push(slot)
                    }
                    _ => {
                        let expected = if want_texture { "texture_2d<f32>" } else { "sampler" };
                        return Err(DeviceError::Shader(format!(
                            "`{label}`: binding {} in group {TEXTURE_GROUP} must be a {expected}",
                            rb.binding
                        )));
                    }
                }
            }
            other => {
                return Err(DeviceError::Shader(format!(
                    "`{label}`: bind group {other} is not supported"
                )));
            }
        }
    }

    info.uniforms.sort_by_key(|u| u.slot);
    info.textures.sort_unstable();
    samplers.sort_unstable();
    if info.textures != samplers {
        return Err(DeviceError::Shader(
            "every texture slot needs both its texture and its sampler".to_string(),
        ));
    }

    Ok(info)
}
