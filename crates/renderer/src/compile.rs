use std::borrow::Cow;

use anyhow::{anyhow, Result};
use wgpu::naga::ShaderStage;

/// Fragment programs available to materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ShaderKind {
    Basic,
    Standard,
    AccretionDisk,
    Lensing,
    Points,
}

impl ShaderKind {
    pub(crate) const ALL: [ShaderKind; 5] = [
        ShaderKind::Basic,
        ShaderKind::Standard,
        ShaderKind::AccretionDisk,
        ShaderKind::Lensing,
        ShaderKind::Points,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            ShaderKind::Basic => "basic",
            ShaderKind::Standard => "standard",
            ShaderKind::AccretionDisk => "accretion disk",
            ShaderKind::Lensing => "lensing",
            ShaderKind::Points => "points",
        }
    }

    fn body(self) -> &'static str {
        match self {
            ShaderKind::Basic => BASIC_FRAGMENT,
            ShaderKind::Standard => STANDARD_FRAGMENT,
            ShaderKind::AccretionDisk => DISK_FRAGMENT,
            ShaderKind::Lensing => LENSING_FRAGMENT,
            ShaderKind::Points => POINTS_FRAGMENT,
        }
    }

    fn vertex_body(self) -> &'static str {
        match self {
            ShaderKind::Points => POINTS_VERTEX,
            _ => MESH_VERTEX,
        }
    }
}

pub(crate) fn vertex_source(kind: ShaderKind) -> String {
    format!("#version 450\n{UNIFORM_BLOCKS}\n{}", kind.vertex_body())
}

pub(crate) fn fragment_source(kind: ShaderKind) -> String {
    format!(
        "#version 450\n{UNIFORM_BLOCKS}\n{TONE_MAPPING}\n{}",
        kind.body()
    )
}

pub(crate) fn compile_vertex_shader(
    device: &wgpu::Device,
    kind: ShaderKind,
) -> Result<wgpu::ShaderModule> {
    compile(device, kind, ShaderStage::Vertex, vertex_source(kind))
}

pub(crate) fn compile_fragment_shader(
    device: &wgpu::Device,
    kind: ShaderKind,
) -> Result<wgpu::ShaderModule> {
    compile(device, kind, ShaderStage::Fragment, fragment_source(kind))
}

fn compile(
    device: &wgpu::Device,
    kind: ShaderKind,
    stage: ShaderStage,
    source: String,
) -> Result<wgpu::ShaderModule> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(kind.label()),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(source),
            stage,
            defines: &[],
        },
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(anyhow!(
            "failed to compile {} {:?} shader: {err}",
            kind.label(),
            stage
        )),
        None => Ok(module),
    }
}

/// Uniform blocks shared by every stage.
///
/// Layouts must match `FrameUniforms` and `NodeUniforms` in `gpu/uniforms.rs`.
/// The `#define`s expose the material parameters under the names the shaders
/// were authored with.
const UNIFORM_BLOCKS: &str = r"
layout(std140, set = 0, binding = 0) uniform FrameBlock {
    mat4 view_proj;
    vec4 camera_position;
    vec4 time_exposure;
    vec4 ambient;
    vec4 light_positions[4];
    vec4 light_colors[4];
} frame;

layout(std140, set = 1, binding = 0) uniform NodeBlock {
    mat4 model;
    vec4 color;
    vec4 emissive;
    vec4 inner_color;
    vec4 mid_color;
    vec4 outer_color;
    vec4 shape;
    vec4 motion;
} node;

#define time frame.time_exposure.x
#define exposure frame.time_exposure.y
#define innerColor node.inner_color.rgb
#define outerColor node.outer_color.rgb
#define radius node.shape.z
#define thickness node.shape.w
";

/// Narkowicz ACES fit; `time_exposure.z` switches it off.
const TONE_MAPPING: &str = r"
vec3 tone_map(vec3 color) {
    vec3 x = color * exposure;
    if (frame.time_exposure.z < 0.5) {
        return x;
    }
    vec3 mapped = (x * (2.51 * x + vec3(0.03))) / (x * (2.43 * x + vec3(0.59)) + vec3(0.14));
    return clamp(mapped, vec3(0.0), vec3(1.0));
}

float doppler(vec2 p, float strength) {
    float theta = atan(p.y, p.x);
    return 1.0 + strength * cos(theta - time * 0.3);
}
";

const MESH_VERTEX: &str = r"
layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_normal;
layout(location = 2) in vec2 a_uv;

layout(location = 0) out vec2 v_uv;
layout(location = 1) out vec3 v_local;
layout(location = 2) out vec3 v_world;
layout(location = 3) out vec3 v_normal;

void main() {
    vec4 world = node.model * vec4(a_position, 1.0);
    v_uv = a_uv;
    v_local = a_position;
    v_world = world.xyz;
    v_normal = (node.model * vec4(a_normal, 0.0)).xyz;
    gl_Position = frame.view_proj * world;
}
";

const POINTS_VERTEX: &str = r"
layout(location = 0) in vec3 a_position;

void main() {
    gl_Position = frame.view_proj * node.model * vec4(a_position, 1.0);
}
";

const BASIC_FRAGMENT: &str = r"
layout(location = 0) out vec4 out_color;

void main() {
    out_color = vec4(tone_map(node.color.rgb), node.color.a);
}
";

const POINTS_FRAGMENT: &str = BASIC_FRAGMENT;

const STANDARD_FRAGMENT: &str = r"
layout(location = 2) in vec3 v_world;
layout(location = 3) in vec3 v_normal;

layout(location = 0) out vec4 out_color;

void main() {
    vec3 n = normalize(v_normal);
    if (!gl_FrontFacing) {
        n = -n;
    }
    vec3 lit = frame.ambient.rgb;
    int count = int(frame.time_exposure.w);
    for (int i = 0; i < 4; i++) {
        if (i < count) {
            vec3 to_light = frame.light_positions[i].xyz - v_world;
            float dist = max(length(to_light), 0.0001);
            float ndl = max(dot(n, to_light / dist), 0.0);
            lit += frame.light_colors[i].rgb * ndl;
        }
    }
    vec3 color = node.color.rgb * lit + node.emissive.rgb;
    out_color = vec4(tone_map(color), node.color.a);
}
";

const DISK_FRAGMENT: &str = r"
layout(location = 0) in vec2 v_uv;
layout(location = 1) in vec3 v_local;

layout(location = 0) out vec4 out_color;

void main() {
    float inner_radius = node.shape.x;
    float outer_radius = node.shape.y;
    float r = clamp((length(v_local.xy) - inner_radius) / max(outer_radius - inner_radius, 0.0001), 0.0, 1.0);

    vec3 color;
    if (node.mid_color.w > 0.5) {
        if (r < 0.5) {
            color = mix(innerColor, node.mid_color.rgb, vec3(r * 2.0));
        } else {
            color = mix(node.mid_color.rgb, outerColor, vec3((r - 0.5) * 2.0));
        }
    } else {
        color = mix(innerColor, outerColor, vec3(r));
    }

    float intensity = 1.0 - r * node.motion.w;
    float glow = 0.5 + 0.5 * sin(time * node.motion.x + v_uv.x * node.motion.y);
    float shift = doppler(v_local.xy, node.motion.z);
    out_color = vec4(tone_map(color * intensity * glow * shift), node.color.a);
}
";

const LENSING_FRAGMENT: &str = r"
layout(location = 1) in vec3 v_local;

layout(location = 0) out vec4 out_color;

void main() {
    float d = (length(v_local.xy) - radius) / max(thickness * 0.5, 0.0001);
    float band = max(1.0 - d * d, 0.0);
    float shift = doppler(v_local.xy, node.motion.z);
    out_color = vec4(tone_map(node.color.rgb * band * shift), node.color.a * band);
}
";

#[cfg(test)]
mod tests {
    use wgpu::naga;

    use super::*;

    fn parse(source: &str, stage: ShaderStage) -> naga::Module {
        let mut frontend = naga::front::glsl::Frontend::default();
        frontend
            .parse(&naga::front::glsl::Options::from(stage), source)
            .unwrap_or_else(|err| panic!("GLSL failed to parse: {err:?}\n{source}"))
    }

    #[test]
    fn every_shader_parses_and_validates() {
        for kind in ShaderKind::ALL {
            for (stage, source) in [
                (ShaderStage::Vertex, vertex_source(kind)),
                (ShaderStage::Fragment, fragment_source(kind)),
            ] {
                let module = parse(&source, stage);
                naga::valid::Validator::new(
                    naga::valid::ValidationFlags::all(),
                    naga::valid::Capabilities::all(),
                )
                .validate(&module)
                .unwrap_or_else(|err| panic!("{} {stage:?} shader invalid: {err:?}", kind.label()));
            }
        }
    }

    #[test]
    fn disk_shader_uses_material_uniforms() {
        let source = fragment_source(ShaderKind::AccretionDisk);
        for name in ["innerColor", "outerColor", "time", "tone_map", "doppler"] {
            assert!(source.contains(name), "missing {name}");
        }
    }

    #[test]
    fn lensing_shader_reads_radius_and_thickness() {
        let source = fragment_source(ShaderKind::Lensing);
        assert!(source.contains("#define radius node.shape.z"));
        assert!(source.contains("(length(v_local.xy) - radius)"));
        assert!(source.contains("thickness * 0.5"));
    }
}
