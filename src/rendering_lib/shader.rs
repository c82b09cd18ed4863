// src/rendering_lib/shader.rs

pub const WGSL_SHADER_SOURCE: &str = r#"
struct DrawUniforms {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    color: vec4<f32>,
    // x: shading mode (0 = normal, 1 = flat colour, 2 = textured sprite), y: opacity
    params: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> draw: DrawUniforms;

@group(1) @binding(0)
var t_diffuse: texture_2d<f32>;
@group(1) @binding(1)
var s_diffuse: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
}

@vertex
fn vs_main(model: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world = draw.model * vec4<f32>(model.position, 1.0);
    out.clip_position = draw.view_proj * world;
    out.normal = normalize((draw.model * vec4<f32>(model.normal, 0.0)).xyz);
    out.uv = model.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    // Sampled unconditionally; textureSample needs uniform control flow.
    let texel = textureSample(t_diffuse, s_diffuse, in.uv);
    var rgba = vec4<f32>(draw.color.rgb, draw.params.y);
    if (draw.params.x < 0.5) {
        rgba = vec4<f32>(normalize(in.normal) * 0.5 + vec3<f32>(0.5, 0.5, 0.5), draw.params.y);
    } else if (draw.params.x > 1.5) {
        rgba = vec4<f32>(draw.color.rgb * texel.rgb, draw.params.y * texel.a);
    }
    return rgba;
}
"#;
