//! WGSL utility functions shared by the shaders.
//!
//! # Available Functions
//!
//! ## Noise
//! - `simplex4(v: vec4<f32>) -> f32` - 4D simplex noise, roughly in [-1, 1]
//!
//! ## Easing
//! - `smooth_ramp(edge0: f32, edge1: f32, x: f32) -> f32` - `smoothstep` that
//!   returns a hard step instead of dividing by zero when `edge0 >= edge1`
//!
//! The host-side twin of `simplex4` lives in [`crate::noise`].

/// WGSL code for 4D simplex noise.
pub const NOISE_WGSL: &str = r#"
// Simplex noise helpers
fn mod289_1(x: f32) -> f32 {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn mod289_4(x: vec4<f32>) -> vec4<f32> {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

fn permute1(x: f32) -> f32 {
    return mod289_1(((x * 34.0) + 1.0) * x);
}

fn permute4(x: vec4<f32>) -> vec4<f32> {
    return mod289_4(((x * 34.0) + 1.0) * x);
}

fn taylor_inv_sqrt1(r: f32) -> f32 {
    return 1.79284291400159 - 0.85373472095314 * r;
}

fn taylor_inv_sqrt4(r: vec4<f32>) -> vec4<f32> {
    return 1.79284291400159 - 0.85373472095314 * r;
}

fn grad4(j: f32, ip: vec4<f32>) -> vec4<f32> {
    let ones = vec4<f32>(1.0, 1.0, 1.0, -1.0);
    let pxyz = floor(fract(vec3<f32>(j) * ip.xyz) * 7.0) * ip.z - 1.0;
    let p = vec4<f32>(pxyz, 1.5 - dot(abs(pxyz), ones.xyz));
    let s = select(vec4<f32>(0.0), vec4<f32>(1.0), p < vec4<f32>(0.0));
    return vec4<f32>(p.xyz + (s.xyz * 2.0 - 1.0) * s.www, p.w);
}

// 4D Simplex noise
fn simplex4(v: vec4<f32>) -> f32 {
    let C = vec4<f32>(
        0.138196601125011,
        0.276393202250021,
        0.414589803375032,
        -0.447213595499958
    );
    let F4 = 0.309016994374947451;

    // First corner
    var i = floor(v + dot(v, vec4<f32>(F4)));
    let x0 = v - i + dot(i, C.xxxx);

    // Rank ordering of the other corners
    let isX = step(x0.yzw, x0.xxx);
    let isYZ = step(x0.zww, x0.yyz);
    var i0 = vec4<f32>(isX.x + isX.y + isX.z, 1.0 - isX);
    i0.y += isYZ.x + isYZ.y;
    i0.z += 1.0 - isYZ.x;
    i0.w += 1.0 - isYZ.y;
    i0.z += isYZ.z;
    i0.w += 1.0 - isYZ.z;

    let i3 = clamp(i0, vec4<f32>(0.0), vec4<f32>(1.0));
    let i2 = clamp(i0 - 1.0, vec4<f32>(0.0), vec4<f32>(1.0));
    let i1 = clamp(i0 - 2.0, vec4<f32>(0.0), vec4<f32>(1.0));

    let x1 = x0 - i1 + C.xxxx;
    let x2 = x0 - i2 + C.yyyy;
    let x3 = x0 - i3 + C.zzzz;
    let x4 = x0 + C.wwww;

    // Permutations
    i = mod289_4(i);
    let j0 = permute1(permute1(permute1(permute1(i.w) + i.z) + i.y) + i.x);
    let j1 = permute4(permute4(permute4(permute4(
          i.w + vec4<f32>(i1.w, i2.w, i3.w, 1.0))
        + i.z + vec4<f32>(i1.z, i2.z, i3.z, 1.0))
        + i.y + vec4<f32>(i1.y, i2.y, i3.y, 1.0))
        + i.x + vec4<f32>(i1.x, i2.x, i3.x, 1.0));

    // Gradients
    let ip = vec4<f32>(1.0 / 294.0, 1.0 / 49.0, 1.0 / 7.0, 0.0);
    var p0 = grad4(j0, ip);
    var p1 = grad4(j1.x, ip);
    var p2 = grad4(j1.y, ip);
    var p3 = grad4(j1.z, ip);
    var p4 = grad4(j1.w, ip);

    let norm = taylor_inv_sqrt4(vec4<f32>(dot(p0, p0), dot(p1, p1), dot(p2, p2), dot(p3, p3)));
    p0 *= norm.x;
    p1 *= norm.y;
    p2 *= norm.z;
    p3 *= norm.w;
    p4 *= taylor_inv_sqrt1(dot(p4, p4));

    // Mix contributions from the five corners
    var m0 = max(0.6 - vec3<f32>(dot(x0, x0), dot(x1, x1), dot(x2, x2)), vec3<f32>(0.0));
    var m1 = max(0.6 - vec2<f32>(dot(x3, x3), dot(x4, x4)), vec2<f32>(0.0));
    m0 = m0 * m0;
    m1 = m1 * m1;
    return 49.0 * (dot(m0 * m0, vec3<f32>(dot(p0, x0), dot(p1, x1), dot(p2, x2)))
        + dot(m1 * m1, vec2<f32>(dot(p3, x3), dot(p4, x4))));
}
"#;

/// WGSL code for easing helpers.
pub const EASING_WGSL: &str = r#"
fn smooth_ramp(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = clamp((x - edge0) / max(edge1 - edge0, 1e-6), 0.0, 1.0);
    return t * t * (3.0 - 2.0 * t);
}
"#;

/// Get all utility functions combined.
pub fn all_utils_wgsl() -> String {
    format!("// Utility functions\n{}\n{}\n", NOISE_WGSL, EASING_WGSL)
}

/// Host-side twin of the WGSL `smooth_ramp`.
#[inline]
pub fn smooth_ramp(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0).max(1e-6)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
