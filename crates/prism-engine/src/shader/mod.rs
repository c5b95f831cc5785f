//! Shader program construction.
//!
//! [`ShaderProgramBuilder`] compiles a vertex/fragment WGSL pair, binds
//! attribute locations before linking, links the stages, resolves the names
//! the caller depends on and installs the program as current in a
//! [`RenderContext`].

mod error;
mod link;
mod sources;

pub use error::{BuildError, ShaderStage};
pub use sources::{
    COLOR_ATTRIBUTE, COLOR_ATTRIBUTE_INDEX, COLOR_FRAGMENT_SHADER, MVP_UNIFORM,
    POSITION_ATTRIBUTE, POSITION_ATTRIBUTE_INDEX, PYRAMID_VERTEX_SHADER, TRIANGLE_VERTEX_SHADER,
};

use crate::render::{AttributeLocation, ProgramId, RenderContext, UniformLocation};

/// Requested location for a named vertex input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeBinding {
    pub index: u32,
    pub name: String,
}

/// One linked stage, re-emitted as WGSL.
#[derive(Debug, Clone)]
pub struct StageSource {
    wgsl: String,
    entry_point: String,
}

impl StageSource {
    pub fn wgsl(&self) -> &str {
        &self.wgsl
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    pub name: String,
    pub location: u32,
    /// Scalar count of the input (1 for scalars, 2..=4 for vectors).
    pub components: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformInfo {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    /// Size in bytes.
    pub size: u32,
}

/// Program whose stages compiled and linked, ready to hand to a context.
#[derive(Debug, Clone)]
pub struct LinkedProgram {
    vertex: StageSource,
    fragment: StageSource,
    attributes: Vec<AttributeInfo>,
    uniforms: Vec<UniformInfo>,
}

impl LinkedProgram {
    pub fn vertex(&self) -> &StageSource {
        &self.vertex
    }

    pub fn fragment(&self) -> &StageSource {
        &self.fragment
    }

    /// Vertex inputs after attribute bindings were applied.
    pub fn attributes(&self) -> &[AttributeInfo] {
        &self.attributes
    }

    /// Uniforms of both stages; a [`UniformLocation`] indexes this slice.
    pub fn uniforms(&self) -> &[UniformInfo] {
        &self.uniforms
    }

    pub fn attribute_location(&self, name: &str) -> Option<AttributeLocation> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| AttributeLocation(a.location))
    }

    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms
            .iter()
            .position(|u| u.name == name)
            .map(|i| UniformLocation(i as u32))
    }
}

/// Builds a program inside a [`RenderContext`].
///
/// Every bound attribute and every required uniform must resolve after
/// linking, otherwise the build fails with [`BuildError::MissingHandle`] and
/// nothing is registered with the context.
#[derive(Debug, Clone)]
pub struct ShaderProgramBuilder<'a> {
    label: &'a str,
    vertex_source: &'a str,
    fragment_source: &'a str,
    bindings: Vec<AttributeBinding>,
    required_uniforms: Vec<&'a str>,
}

impl<'a> ShaderProgramBuilder<'a> {
    pub fn new(vertex_source: &'a str, fragment_source: &'a str) -> Self {
        Self {
            label: "program",
            vertex_source,
            fragment_source,
            bindings: Vec::new(),
            required_uniforms: Vec::new(),
        }
    }

    /// Name used in logs and GPU object labels.
    pub fn label(mut self, label: &'a str) -> Self {
        self.label = label;
        self
    }

    /// Binds vertex input `name` to `index`; applied before linking.
    pub fn bind_attribute(mut self, index: u32, name: &str) -> Self {
        self.bindings.push(AttributeBinding { index, name: name.to_owned() });
        self
    }

    pub fn require_uniform(mut self, name: &'a str) -> Self {
        self.required_uniforms.push(name);
        self
    }

    pub fn build<C: RenderContext + ?Sized>(self, ctx: &mut C) -> Result<ProgramHandle, BuildError> {
        let vertex = link::compile(ShaderStage::Vertex, self.vertex_source)?;
        let fragment = link::compile(ShaderStage::Fragment, self.fragment_source)?;
        let program = link::link(vertex, fragment, &self.bindings)?;

        for b in &self.bindings {
            program
                .attribute_location(&b.name)
                .ok_or_else(|| BuildError::missing(&b.name))?;
        }
        for name in &self.required_uniforms {
            program
                .uniform_location(name)
                .ok_or_else(|| BuildError::missing(*name))?;
        }

        let id = ctx.create_program(&program)?;
        ctx.use_program(id);

        log::debug!(
            "{}: program linked ({} attributes, {} uniforms)",
            self.label,
            program.attributes.len(),
            program.uniforms.len()
        );

        Ok(ProgramHandle { id, program })
    }
}

/// Linked program registered with a context, plus its resolved names.
#[derive(Debug, Clone)]
pub struct ProgramHandle {
    id: ProgramId,
    program: LinkedProgram,
}

impl ProgramHandle {
    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn program(&self) -> &LinkedProgram {
        &self.program
    }

    pub fn attribute(&self, name: &str) -> Option<AttributeLocation> {
        self.program.attribute_location(name)
    }

    pub fn uniform(&self, name: &str) -> Option<UniformLocation> {
        self.program.uniform_location(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessContext;

    fn interleaved(vertex: &'static str) -> ShaderProgramBuilder<'static> {
        ShaderProgramBuilder::new(vertex, COLOR_FRAGMENT_SHADER)
            .bind_attribute(POSITION_ATTRIBUTE_INDEX, POSITION_ATTRIBUTE)
            .bind_attribute(COLOR_ATTRIBUTE_INDEX, COLOR_ATTRIBUTE)
    }

    // ── successful builds ─────────────────────────────────────────────────

    #[test]
    fn triangle_program_resolves_bound_attributes() {
        let mut ctx = HeadlessContext::new();
        let handle = interleaved(TRIANGLE_VERTEX_SHADER).build(&mut ctx).unwrap();

        assert_eq!(handle.attribute(POSITION_ATTRIBUTE), Some(AttributeLocation(0)));
        assert_eq!(handle.attribute(COLOR_ATTRIBUTE), Some(AttributeLocation(1)));
        assert!(handle.program().uniforms().is_empty());
    }

    #[test]
    fn pyramid_program_resolves_all_three_handles() {
        let mut ctx = HeadlessContext::new();
        let handle = interleaved(PYRAMID_VERTEX_SHADER)
            .require_uniform(MVP_UNIFORM)
            .build(&mut ctx)
            .unwrap();

        assert_eq!(handle.attribute(POSITION_ATTRIBUTE), Some(AttributeLocation(0)));
        assert_eq!(handle.attribute(COLOR_ATTRIBUTE), Some(AttributeLocation(1)));
        assert_eq!(handle.uniform(MVP_UNIFORM), Some(UniformLocation(0)));

        let mvp = &handle.program().uniforms()[0];
        assert_eq!((mvp.group, mvp.binding, mvp.size), (0, 0, 64));
    }

    #[test]
    fn build_installs_program_as_current() {
        let mut ctx = HeadlessContext::new();
        let handle = interleaved(TRIANGLE_VERTEX_SHADER).build(&mut ctx).unwrap();
        assert_eq!(ctx.current_program(), Some(handle.id()));
        assert_eq!(ctx.program_count(), 1);
    }

    #[test]
    fn bindings_override_declared_locations() {
        const SHUFFLED: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(@location(5) a_color: vec4<f32>, @location(3) a_position: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.position = vec4<f32>(a_position, 1.0);
    out.color = a_color;
    return out;
}
"#;
        let mut ctx = HeadlessContext::new();
        let handle = interleaved(SHUFFLED).build(&mut ctx).unwrap();

        assert_eq!(handle.attribute(POSITION_ATTRIBUTE), Some(AttributeLocation(0)));
        assert_eq!(handle.attribute(COLOR_ATTRIBUTE), Some(AttributeLocation(1)));

        let position = handle
            .program()
            .attributes()
            .iter()
            .find(|a| a.name == POSITION_ATTRIBUTE)
            .unwrap();
        assert_eq!(position.components, 3);
    }

    // ── compile errors ────────────────────────────────────────────────────

    #[test]
    fn vertex_syntax_error_reports_vertex_stage() {
        let mut ctx = HeadlessContext::new();
        let err = interleaved("@vertex fn vs_main( -> {").build(&mut ctx).unwrap_err();
        assert!(matches!(err, BuildError::ShaderCompile { stage: ShaderStage::Vertex, .. }));
        assert_eq!(ctx.program_count(), 0);
    }

    #[test]
    fn fragment_syntax_error_reports_fragment_stage() {
        let mut ctx = HeadlessContext::new();
        let err = ShaderProgramBuilder::new(TRIANGLE_VERTEX_SHADER, "@fragment fn fs_main() -> f32 {")
            .build(&mut ctx)
            .unwrap_err();
        assert!(matches!(err, BuildError::ShaderCompile { stage: ShaderStage::Fragment, .. }));
    }

    #[test]
    fn source_without_matching_entry_point_fails_to_compile() {
        let mut ctx = HeadlessContext::new();
        let err = ShaderProgramBuilder::new(COLOR_FRAGMENT_SHADER, COLOR_FRAGMENT_SHADER)
            .build(&mut ctx)
            .unwrap_err();
        assert!(matches!(err, BuildError::ShaderCompile { stage: ShaderStage::Vertex, .. }));
    }

    // ── link errors ───────────────────────────────────────────────────────

    #[test]
    fn colliding_bindings_fail_to_link() {
        let mut ctx = HeadlessContext::new();
        let err = ShaderProgramBuilder::new(TRIANGLE_VERTEX_SHADER, COLOR_FRAGMENT_SHADER)
            .bind_attribute(0, POSITION_ATTRIBUTE)
            .bind_attribute(0, COLOR_ATTRIBUTE)
            .build(&mut ctx)
            .unwrap_err();
        assert!(matches!(err, BuildError::ProgramLink { .. }));
    }

    #[test]
    fn unwritten_fragment_input_fails_to_link() {
        const NEEDS_UV: &str = r#"
@fragment
fn fs_main(@location(0) color: vec4<f32>, @location(1) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return color * uv.x;
}
"#;
        let mut ctx = HeadlessContext::new();
        let err = ShaderProgramBuilder::new(TRIANGLE_VERTEX_SHADER, NEEDS_UV)
            .build(&mut ctx)
            .unwrap_err();
        assert!(matches!(err, BuildError::ProgramLink { .. }), "{err}");
    }

    #[test]
    fn mismatched_varying_type_fails_to_link() {
        const VEC3_COLOR: &str = r#"
@fragment
fn fs_main(@location(0) color: vec3<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(color, 1.0);
}
"#;
        let mut ctx = HeadlessContext::new();
        let err = ShaderProgramBuilder::new(TRIANGLE_VERTEX_SHADER, VEC3_COLOR)
            .build(&mut ctx)
            .unwrap_err();
        assert!(matches!(err, BuildError::ProgramLink { .. }));
    }

    #[test]
    fn binding_a_builtin_input_fails_to_link() {
        const BUILTIN_INPUT: &str = r#"
@vertex
fn vs_main(@builtin(vertex_index) vid: u32, @location(0) a_color: vec4<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(f32(vid), 0.0, 0.0, 1.0) + a_color * 0.0;
}
"#;
        const CONSTANT: &str = r#"
@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0);
}
"#;
        let mut ctx = HeadlessContext::new();
        let err = ShaderProgramBuilder::new(BUILTIN_INPUT, CONSTANT)
            .bind_attribute(0, "vid")
            .build(&mut ctx)
            .unwrap_err();
        assert!(matches!(err, BuildError::ProgramLink { .. }));
    }

    // ── missing handles ───────────────────────────────────────────────────

    #[test]
    fn unknown_uniform_is_a_missing_handle() {
        let mut ctx = HeadlessContext::new();
        let err = interleaved(PYRAMID_VERTEX_SHADER)
            .require_uniform("model")
            .build(&mut ctx)
            .unwrap_err();
        assert_eq!(err, BuildError::MissingHandle { name: "model".into() });
        assert_eq!(ctx.program_count(), 0);
    }

    #[test]
    fn mvp_is_missing_from_the_triangle_program() {
        let mut ctx = HeadlessContext::new();
        let err = interleaved(TRIANGLE_VERTEX_SHADER)
            .require_uniform(MVP_UNIFORM)
            .build(&mut ctx)
            .unwrap_err();
        assert_eq!(err, BuildError::MissingHandle { name: MVP_UNIFORM.into() });
    }

    #[test]
    fn unknown_attribute_binding_is_a_missing_handle() {
        let mut ctx = HeadlessContext::new();
        let err = interleaved(TRIANGLE_VERTEX_SHADER)
            .bind_attribute(2, "a_normal")
            .build(&mut ctx)
            .unwrap_err();
        assert_eq!(err, BuildError::MissingHandle { name: "a_normal".into() });
    }

    #[test]
    fn errors_render_readable_messages() {
        let err = BuildError::MissingHandle { name: "mvp".into() };
        assert_eq!(err.to_string(), "`mvp` could not be found in the linked program");

        let err = BuildError::ShaderCompile { stage: ShaderStage::Fragment, message: "boom".into() };
        assert_eq!(err.to_string(), "fragment shader failed to compile: boom");
    }
}
