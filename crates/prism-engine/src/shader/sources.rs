//! Embedded WGSL sources and the names the renderers bind against.
//!
//! Vertex shaders work in GL clip space and remap depth from `[-w, w]` to the
//! `[0, w]` range wgpu rasterizes.

/// Vertex input fed from the position sub-range of the interleaved buffer.
pub const POSITION_ATTRIBUTE: &str = "a_position";
pub const POSITION_ATTRIBUTE_INDEX: u32 = 0;

/// Vertex input fed from the color sub-range of the interleaved buffer.
pub const COLOR_ATTRIBUTE: &str = "a_color";
pub const COLOR_ATTRIBUTE_INDEX: u32 = 1;

/// Combined model-view-projection matrix.
pub const MVP_UNIFORM: &str = "mvp";

/// Passes positions through unchanged.
pub const TRIANGLE_VERTEX_SHADER: &str = r#"
struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(@location(0) a_position: vec3<f32>, @location(1) a_color: vec4<f32>) -> VertexOutput {
    var out: VertexOutput;
    let clip = vec4<f32>(a_position, 1.0);
    out.position = vec4<f32>(clip.xy, (clip.z + clip.w) * 0.5, clip.w);
    out.color = a_color;
    return out;
}
"#;

pub const PYRAMID_VERTEX_SHADER: &str = r#"
@group(0) @binding(0)
var<uniform> mvp: mat4x4<f32>;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(@location(0) a_position: vec3<f32>, @location(1) a_color: vec4<f32>) -> VertexOutput {
    var out: VertexOutput;
    let clip = mvp * vec4<f32>(a_position, 1.0);
    out.position = vec4<f32>(clip.xy, (clip.z + clip.w) * 0.5, clip.w);
    out.color = a_color;
    return out;
}
"#;

/// Outputs the interpolated vertex color.
pub const COLOR_FRAGMENT_SHADER: &str = r#"
@fragment
fn fs_main(@location(0) color: vec4<f32>) -> @location(0) vec4<f32> {
    return color;
}
"#;
