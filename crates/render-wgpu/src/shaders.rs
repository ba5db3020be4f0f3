/// WGSL shader for the grid floor. Lines fade into the clear color with
/// distance from the camera so the grid edge is not visible.
pub const GRID_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    eye: vec4<f32>,
    fog: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct GridVertex {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
};

struct GridOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) world_position: vec3<f32>,
};

@vertex
fn vs_grid(vertex: GridVertex) -> GridOutput {
    var out: GridOutput;
    out.clip_position = uniforms.view_proj * vec4<f32>(vertex.position, 1.0);
    out.color = vertex.color;
    out.world_position = vertex.position;
    return out;
}

@fragment
fn fs_grid(in: GridOutput) -> @location(0) vec4<f32> {
    let distance = length(in.world_position - uniforms.eye.xyz);
    // fog.w holds the distance at which lines are fully faded
    let fade = clamp(distance / uniforms.fog.w, 0.0, 1.0);
    return vec4<f32>(mix(in.color.rgb, uniforms.fog.rgb, fade), 1.0);
}
"#;
