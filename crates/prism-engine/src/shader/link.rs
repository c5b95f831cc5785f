//! WGSL compilation and program linking on top of `naga`.
//!
//! Compile = parse + validate one stage. Link = apply attribute bindings to
//! the vertex stage, revalidate, and check the vertex/fragment interface and
//! shared uniforms. The linked stages are re-emitted as WGSL for the backend.

use super::{AttributeBinding, AttributeInfo, BuildError, LinkedProgram, ShaderStage, StageSource, UniformInfo};

pub(crate) struct CompiledStage {
    stage: ShaderStage,
    module: naga::Module,
    info: naga::valid::ModuleInfo,
    entry_index: usize,
}

impl CompiledStage {
    fn entry(&self) -> &naga::EntryPoint {
        &self.module.entry_points[self.entry_index]
    }
}

/// Inter-stage value or vertex input with a `@location`.
#[derive(Debug, Clone)]
struct Varying {
    name: Option<String>,
    location: u32,
    inner: naga::TypeInner,
}

fn validator() -> naga::valid::Validator {
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
}

pub(crate) fn compile(stage: ShaderStage, source: &str) -> Result<CompiledStage, BuildError> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| BuildError::compile(stage, e.emit_to_string(source)))?;

    let info = validator()
        .validate(&module)
        .map_err(|e| BuildError::compile(stage, e.emit_to_string(source)))?;

    let entry_index = module
        .entry_points
        .iter()
        .position(|ep| ep.stage == stage.to_naga())
        .ok_or_else(|| BuildError::compile(stage, format!("no @{stage} entry point")))?;

    Ok(CompiledStage { stage, module, info, entry_index })
}

pub(crate) fn link(
    mut vertex: CompiledStage,
    fragment: CompiledStage,
    bindings: &[AttributeBinding],
) -> Result<LinkedProgram, BuildError> {
    if !bindings.is_empty() {
        bind_attributes(&mut vertex, bindings)?;

        let inputs = entry_inputs(&vertex.module, vertex.entry());
        for (i, a) in inputs.iter().enumerate() {
            if let Some(b) = inputs[..i].iter().find(|b| b.location == a.location) {
                return Err(BuildError::link(format!(
                    "vertex inputs `{}` and `{}` are both bound to location {}",
                    b.name.as_deref().unwrap_or("<unnamed>"),
                    a.name.as_deref().unwrap_or("<unnamed>"),
                    a.location
                )));
            }
        }

        vertex.info = validator().validate(&vertex.module).map_err(|e| {
            BuildError::link(format!("vertex stage rejected the attribute bindings: {e}"))
        })?;
    }

    let outputs = entry_outputs(&vertex.module, vertex.entry());
    for input in entry_inputs(&fragment.module, fragment.entry()) {
        let name = input.name.as_deref().unwrap_or("<unnamed>");
        match outputs.iter().find(|o| o.location == input.location) {
            None => {
                return Err(BuildError::link(format!(
                    "fragment input `{name}` at location {} is not written by the vertex stage",
                    input.location
                )));
            }
            Some(output) if output.inner != input.inner => {
                return Err(BuildError::link(format!(
                    "fragment input `{name}` at location {} does not match the vertex output type",
                    input.location
                )));
            }
            Some(_) => {}
        }
    }

    let uniforms = collect_uniforms([&vertex.module, &fragment.module])?;

    let attributes = entry_inputs(&vertex.module, vertex.entry())
        .into_iter()
        .filter_map(|v| {
            Some(AttributeInfo {
                name: v.name?,
                location: v.location,
                components: components(&v.inner),
            })
        })
        .collect();

    Ok(LinkedProgram {
        vertex: emit(&vertex)?,
        fragment: emit(&fragment)?,
        attributes,
        uniforms,
    })
}

/// Rewrites the `@location` of named vertex inputs, like `glBindAttribLocation`
/// before `glLinkProgram`. Names that match no input are ignored.
fn bind_attributes(vertex: &mut CompiledStage, bindings: &[AttributeBinding]) -> Result<(), BuildError> {
    let inputs = entry_inputs(&vertex.module, vertex.entry());
    let ep = &mut vertex.module.entry_points[vertex.entry_index];

    for b in bindings {
        let arg = ep
            .function
            .arguments
            .iter_mut()
            .find(|a| a.name.as_deref() == Some(b.name.as_str()));

        if let Some(arg) = arg {
            match arg.binding.as_mut() {
                Some(naga::Binding::Location { location, .. }) => {
                    *location = b.index;
                    continue;
                }
                Some(naga::Binding::BuiltIn(_)) => {
                    return Err(BuildError::link(format!(
                        "`{}` is a built-in input and cannot be bound",
                        b.name
                    )));
                }
                // Struct-typed argument; look at its members below.
                None => {}
            }
        }

        match inputs.iter().find(|v| v.name.as_deref() == Some(b.name.as_str())) {
            Some(v) if v.location == b.index => {}
            Some(_) => {
                return Err(BuildError::link(format!(
                    "`{}` is declared inside an input struct; its location cannot be rebound",
                    b.name
                )));
            }
            None => log::debug!("attribute binding `{}` matches no vertex input; ignored", b.name),
        }
    }

    Ok(())
}

fn entry_inputs(module: &naga::Module, ep: &naga::EntryPoint) -> Vec<Varying> {
    let mut out = Vec::new();
    for arg in &ep.function.arguments {
        collect_varyings(module, arg.name.as_deref(), arg.ty, arg.binding.as_ref(), &mut out);
    }
    out
}

fn entry_outputs(module: &naga::Module, ep: &naga::EntryPoint) -> Vec<Varying> {
    let mut out = Vec::new();
    if let Some(result) = &ep.function.result {
        collect_varyings(module, None, result.ty, result.binding.as_ref(), &mut out);
    }
    out
}

fn collect_varyings(
    module: &naga::Module,
    name: Option<&str>,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut Vec<Varying>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => out.push(Varying {
            name: name.map(str::to_owned),
            location: *location,
            inner: module.types[ty].inner.clone(),
        }),
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for m in members {
                    collect_varyings(module, m.name.as_deref(), m.ty, m.binding.as_ref(), out);
                }
            }
        }
    }
}

fn components(inner: &naga::TypeInner) -> u8 {
    match inner {
        naga::TypeInner::Scalar(_) => 1,
        naga::TypeInner::Vector { size, .. } => *size as u8,
        _ => 0,
    }
}

fn collect_uniforms(stages: [&naga::Module; 2]) -> Result<Vec<UniformInfo>, BuildError> {
    let mut out: Vec<UniformInfo> = Vec::new();
    let mut types: Vec<naga::TypeInner> = Vec::new();

    for module in stages {
        for (_, var) in module.global_variables.iter() {
            if var.space != naga::AddressSpace::Uniform {
                continue;
            }
            let (Some(name), Some(rb)) = (var.name.as_deref(), var.binding.as_ref()) else {
                continue;
            };
            let inner = &module.types[var.ty].inner;

            if let Some(i) = out.iter().position(|u| u.name == name) {
                let same = out[i].group == rb.group && out[i].binding == rb.binding && types[i] == *inner;
                if !same {
                    return Err(BuildError::link(format!(
                        "uniform `{name}` is declared differently in the vertex and fragment stages"
                    )));
                }
                continue;
            }

            if let Some(other) = out.iter().find(|u| u.group == rb.group && u.binding == rb.binding) {
                return Err(BuildError::link(format!(
                    "uniforms `{}` and `{name}` share @group({}) @binding({})",
                    other.name, rb.group, rb.binding
                )));
            }

            out.push(UniformInfo {
                name: name.to_owned(),
                group: rb.group,
                binding: rb.binding,
                size: inner.size(module.to_ctx()),
            });
            types.push(inner.clone());
        }
    }

    Ok(out)
}

fn emit(stage: &CompiledStage) -> Result<StageSource, BuildError> {
    let wgsl = naga::back::wgsl::write_string(
        &stage.module,
        &stage.info,
        naga::back::wgsl::WriterFlags::empty(),
    )
    .map_err(|e| BuildError::link(format!("{} stage could not be emitted: {e}", stage.stage)))?;

    Ok(StageSource {
        wgsl,
        entry_point: stage.entry().name.clone(),
    })
}
