/// Lit forward pass: Phong lighting from one directional light, point
/// lights and spot lights, with the shadow caster attenuated by the
/// shadow map.
pub const LIT_SHADER: &str = r#"
const MAX_POINT_LIGHTS: u32 = 8u;
const MAX_SPOT_LIGHTS: u32 = 4u;
const SHININESS: f32 = 32.0;

struct Frame {
    view_proj: mat4x4<f32>,
    light_space: mat4x4<f32>,
    camera_pos: vec4<f32>,
    // x: shadows on, y: depth bias, z: caster spot index (-1 = directional)
    params: vec4<f32>,
};

struct Directional {
    direction: vec4<f32>,
    ambient: vec4<f32>,
    diffuse: vec4<f32>,
    specular: vec4<f32>,
};

struct Point {
    position: vec4<f32>,
    color: vec4<f32>,
};

struct Spot {
    position: vec4<f32>,
    direction: vec4<f32>,
    color: vec4<f32>,
};

struct Lights {
    directional: Directional,
    counts: vec4<u32>,
    points: array<Point, 8>,
    spots: array<Spot, 4>,
};

@group(0) @binding(0) var<uniform> frame: Frame;
@group(0) @binding(1) var<uniform> lights: Lights;
@group(0) @binding(2) var shadow_map: texture_depth_2d;
@group(0) @binding(3) var shadow_sampler: sampler_comparison;

@group(1) @binding(0) var diffuse_tex: texture_2d<f32>;
@group(1) @binding(1) var diffuse_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
    @location(7) normal_0: vec4<f32>,
    @location(8) normal_1: vec4<f32>,
    @location(9) normal_2: vec4<f32>,
    @location(10) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) color: vec4<f32>,
    @location(4) light_pos: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let normal_matrix = mat3x3<f32>(
        instance.normal_0.xyz,
        instance.normal_1.xyz,
        instance.normal_2.xyz,
    );
    let world = model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = frame.view_proj * world;
    out.world_pos = world.xyz;
    out.normal = normal_matrix * vertex.normal;
    out.uv = vertex.uv;
    out.color = instance.color;
    out.light_pos = frame.light_space * world;
    return out;
}

fn shadow_factor(light_pos: vec4<f32>) -> f32 {
    if frame.params.x < 0.5 || light_pos.w <= 0.0 {
        return 1.0;
    }
    let proj = light_pos.xyz / light_pos.w;
    let uv = vec2<f32>(proj.x * 0.5 + 0.5, proj.y * -0.5 + 0.5);
    if proj.z > 1.0 || any(uv < vec2<f32>(0.0)) || any(uv > vec2<f32>(1.0)) {
        return 1.0;
    }
    return textureSampleCompareLevel(shadow_map, shadow_sampler, uv, proj.z - frame.params.y);
}

fn attenuation(dist: f32) -> f32 {
    return 1.0 / (1.0 + 0.09 * dist + 0.032 * dist * dist);
}

// Diffuse plus specular for a unit light direction `l`.
fn phong(n: vec3<f32>, v: vec3<f32>, l: vec3<f32>, base: vec3<f32>, light: vec3<f32>) -> vec3<f32> {
    let diff = max(dot(n, l), 0.0);
    let r = reflect(-l, n);
    let spec = pow(max(dot(v, r), 0.0), SHININESS);
    return light * (diff * base + spec * 0.5);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let tex = textureSample(diffuse_tex, diffuse_sampler, in.uv);
    let base = tex.rgb * in.color.rgb;
    let n = normalize(in.normal);
    let v = normalize(frame.camera_pos.xyz - in.world_pos);
    let shadow = shadow_factor(in.light_pos);
    let caster = i32(frame.params.z);

    var result = vec3<f32>(0.0);

    let d = lights.directional;
    if d.direction.w > 0.5 {
        let l = normalize(-d.direction.xyz);
        result += d.ambient.rgb * d.ambient.w * base;
        let diff = max(dot(n, l), 0.0);
        let spec = pow(max(dot(v, reflect(-l, n)), 0.0), SHININESS);
        var lit = d.diffuse.rgb * d.diffuse.w * diff * base + d.specular.rgb * d.specular.w * spec * 0.5;
        if caster < 0 {
            lit *= shadow;
        }
        result += lit;
    }

    let point_count = min(lights.counts.x, MAX_POINT_LIGHTS);
    for (var i = 0u; i < point_count; i += 1u) {
        let p = lights.points[i];
        let to_light = p.position.xyz - in.world_pos;
        let l = normalize(to_light);
        result += phong(n, v, l, base, p.color.rgb * p.color.w) * attenuation(length(to_light));
    }

    let spot_count = min(lights.counts.y, MAX_SPOT_LIGHTS);
    for (var i = 0u; i < spot_count; i += 1u) {
        let s = lights.spots[i];
        let to_light = s.position.xyz - in.world_pos;
        let l = normalize(to_light);
        let theta = dot(l, normalize(-s.direction.xyz));
        let inner = s.position.w;
        let outer = s.direction.w;
        let cone = clamp((theta - outer) / max(inner - outer, 1e-4), 0.0, 1.0);
        var lit = phong(n, v, l, base, s.color.rgb * s.color.w) * cone * attenuation(length(to_light));
        if i32(i) == caster {
            lit *= shadow;
        }
        result += lit;
    }

    return vec4<f32>(result, tex.a * in.color.a);
}
"#;

/// Depth-only pass from the shadow caster.
pub const SHADOW_SHADER: &str = r#"
struct Frame {
    view_proj: mat4x4<f32>,
    light_space: mat4x4<f32>,
    camera_pos: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0) var<uniform> frame: Frame;

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
};

@vertex
fn vs_shadow(@location(0) position: vec3<f32>, instance: InstanceInput) -> @builtin(position) vec4<f32> {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    return frame.light_space * model * vec4<f32>(position, 1.0);
}
"#;

/// Menger sponge ray-marcher writing into a storage texture, textured
/// with the wall image.
pub const SPONGE_SHADER: &str = r#"
struct Params {
    // x: time, y: width, z: height
    params: vec4<f32>,
};

@group(0) @binding(0) var<uniform> u: Params;
@group(0) @binding(1) var wall_tex: texture_2d<f32>;
@group(0) @binding(2) var wall_sampler: sampler;
@group(0) @binding(3) var out_tex: texture_storage_2d<rgba8unorm, write>;

const MAX_STEPS: i32 = 96;
const MAX_DIST: f32 = 20.0;
const HIT_EPS: f32 = 0.001;

fn mod_pos(x: vec3<f32>, y: f32) -> vec3<f32> {
    return x - y * floor(x / y);
}

fn sd_box(p: vec3<f32>, b: vec3<f32>) -> f32 {
    let q = abs(p) - b;
    return length(max(q, vec3<f32>(0.0))) + min(max(q.x, max(q.y, q.z)), 0.0);
}

fn sponge(p: vec3<f32>) -> f32 {
    var d = sd_box(p, vec3<f32>(1.0));
    var s = 1.0;
    for (var m = 0; m < 4; m += 1) {
        let a = mod_pos(p * s, 2.0) - 1.0;
        s *= 3.0;
        let r = abs(1.0 - 3.0 * abs(a));
        let da = max(r.x, r.y);
        let db = max(r.y, r.z);
        let dc = max(r.z, r.x);
        let c = (min(da, min(db, dc)) - 1.0) / s;
        d = max(d, c);
    }
    return d;
}

fn normal_at(p: vec3<f32>) -> vec3<f32> {
    let e = vec2<f32>(0.0005, 0.0);
    return normalize(vec3<f32>(
        sponge(p + e.xyy) - sponge(p - e.xyy),
        sponge(p + e.yxy) - sponge(p - e.yxy),
        sponge(p + e.yyx) - sponge(p - e.yyx),
    ));
}

fn triplanar(p: vec3<f32>, n: vec3<f32>) -> vec3<f32> {
    let w = abs(n) / (abs(n.x) + abs(n.y) + abs(n.z));
    let x = textureSampleLevel(wall_tex, wall_sampler, p.yz * 0.5 + 0.5, 0.0).rgb;
    let y = textureSampleLevel(wall_tex, wall_sampler, p.zx * 0.5 + 0.5, 0.0).rgb;
    let z = textureSampleLevel(wall_tex, wall_sampler, p.xy * 0.5 + 0.5, 0.0).rgb;
    return x * w.x + y * w.y + z * w.z;
}

@compute @workgroup_size(8, 8)
fn cs_main(@builtin(global_invocation_id) id: vec3<u32>) {
    let dims = textureDimensions(out_tex);
    if id.x >= dims.x || id.y >= dims.y {
        return;
    }
    let time = u.params.x;
    let res = vec2<f32>(u.params.y, u.params.z);
    var p = (vec2<f32>(id.xy) + 0.5 - 0.5 * res) / res.y;
    p.y = -p.y;

    let angle = time * 0.3;
    let ro = vec3<f32>(3.2 * cos(angle), 1.6 + 0.4 * sin(time * 0.2), 3.2 * sin(angle));
    let forward = normalize(-ro);
    let right = normalize(cross(forward, vec3<f32>(0.0, 1.0, 0.0)));
    let up = cross(right, forward);
    let rd = normalize(forward * 1.6 + right * p.x + up * p.y);

    var t = 0.0;
    var hit = false;
    for (var i = 0; i < MAX_STEPS; i += 1) {
        let d = sponge(ro + rd * t);
        if d < HIT_EPS {
            hit = true;
            break;
        }
        t += d;
        if t > MAX_DIST {
            break;
        }
    }

    var col = mix(vec3<f32>(0.08, 0.08, 0.12), vec3<f32>(0.25, 0.3, 0.4), p.y * 0.5 + 0.5);
    if hit {
        let pos = ro + rd * t;
        let n = normal_at(pos);
        let l = normalize(vec3<f32>(0.6, 0.8, 0.4));
        let diff = max(dot(n, l), 0.0);
        let fog = exp(-0.08 * t);
        col = mix(col, triplanar(pos, n) * (0.2 + 0.8 * diff), fog);
    }
    textureStore(out_tex, vec2<i32>(id.xy), vec4<f32>(col, 1.0));
}
"#;

/// Fullscreen triangle sampling one texture.
pub const BLIT_SHADER: &str = r#"
@group(0) @binding(0) var src_tex: texture_2d<f32>;
@group(0) @binding(1) var src_sampler: sampler;

struct BlitOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_blit(@builtin(vertex_index) index: u32) -> BlitOutput {
    let x = f32((index << 1u) & 2u);
    let y = f32(index & 2u);
    var out: BlitOutput;
    out.clip_position = vec4<f32>(x * 2.0 - 1.0, 1.0 - y * 2.0, 0.0, 1.0);
    out.uv = vec2<f32>(x, y);
    return out;
}

@fragment
fn fs_blit(in: BlitOutput) -> @location(0) vec4<f32> {
    return textureSample(src_tex, src_sampler, in.uv);
}
"#;
