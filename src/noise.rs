//! 4D simplex noise on the host.
//!
//! Same algorithm and constants as `simplex4` in
//! [`shader_utils::NOISE_WGSL`](crate::shader_utils::NOISE_WGSL), so the CPU
//! reference step follows the compute shader up to float rounding.
//! Output lies roughly in `[-1, 1]`.

use glam::{Vec3, Vec4, Vec4Swizzles};

const F4: f32 = 0.309_016_994_374_947_45;
const G4: f32 = 0.138_196_601_125_011;

#[inline]
fn mod289(x: f32) -> f32 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

#[inline]
fn mod289_4(x: Vec4) -> Vec4 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

#[inline]
fn permute(x: f32) -> f32 {
    mod289((x * 34.0 + 1.0) * x)
}

#[inline]
fn permute4(x: Vec4) -> Vec4 {
    mod289_4((x * 34.0 + Vec4::ONE) * x)
}

#[inline]
fn taylor_inv_sqrt(r: f32) -> f32 {
    1.792_842_9 - 0.853_734_7 * r
}

/// `1.0` where `edge <= x`, else `0.0`.
#[inline]
fn step(edge: f32, x: f32) -> f32 {
    if x < edge {
        0.0
    } else {
        1.0
    }
}

fn grad4(j: f32, ip: Vec4) -> Vec4 {
    let scaled = Vec3::splat(j) * ip.xyz();
    let fract = scaled - scaled.floor();
    let xyz = (fract * 7.0).floor() * ip.z - Vec3::ONE;
    let w = 1.5 - xyz.abs().dot(Vec3::ONE);

    let s = |c: f32| if c < 0.0 { 1.0 } else { 0.0 };
    let sw = s(w);
    let signs = Vec3::new(s(xyz.x), s(xyz.y), s(xyz.z)) * 2.0 - Vec3::ONE;
    (xyz + signs * sw).extend(w)
}

/// 4D simplex noise.
pub fn simplex4(v: Vec4) -> f32 {
    let c = Vec4::new(G4, 2.0 * G4, 3.0 * G4, -1.0 + 4.0 * G4);

    // Skew to find the simplex cell and the first corner offset
    let mut i = (v + Vec4::splat(v.dot(Vec4::splat(F4)))).floor();
    let x0 = v - i + Vec4::splat(i.dot(Vec4::splat(c.x)));

    // Rank the components of x0 to order the simplex corners
    let is_x = Vec3::new(step(x0.y, x0.x), step(x0.z, x0.x), step(x0.w, x0.x));
    let is_yz = Vec3::new(step(x0.z, x0.y), step(x0.w, x0.y), step(x0.w, x0.z));
    let mut i0 = Vec4::new(is_x.x + is_x.y + is_x.z, 1.0 - is_x.x, 1.0 - is_x.y, 1.0 - is_x.z);
    i0.y += is_yz.x + is_yz.y;
    i0.z += 1.0 - is_yz.x;
    i0.w += 1.0 - is_yz.y;
    i0.z += is_yz.z;
    i0.w += 1.0 - is_yz.z;

    let i3 = i0.clamp(Vec4::ZERO, Vec4::ONE);
    let i2 = (i0 - Vec4::ONE).clamp(Vec4::ZERO, Vec4::ONE);
    let i1 = (i0 - Vec4::splat(2.0)).clamp(Vec4::ZERO, Vec4::ONE);

    let x1 = x0 - i1 + Vec4::splat(c.x);
    let x2 = x0 - i2 + Vec4::splat(c.y);
    let x3 = x0 - i3 + Vec4::splat(c.z);
    let x4 = x0 + Vec4::splat(c.w);

    i = mod289_4(i);
    let j0 = permute(permute(permute(permute(i.w) + i.z) + i.y) + i.x);
    let j1 = permute4(
        permute4(
            permute4(
                permute4(Vec4::splat(i.w) + Vec4::new(i1.w, i2.w, i3.w, 1.0))
                    + Vec4::splat(i.z)
                    + Vec4::new(i1.z, i2.z, i3.z, 1.0),
            ) + Vec4::splat(i.y)
                + Vec4::new(i1.y, i2.y, i3.y, 1.0),
        ) + Vec4::splat(i.x)
            + Vec4::new(i1.x, i2.x, i3.x, 1.0),
    );

    let ip = Vec4::new(1.0 / 294.0, 1.0 / 49.0, 1.0 / 7.0, 0.0);
    let corners = [
        (grad4(j0, ip), x0),
        (grad4(j1.x, ip), x1),
        (grad4(j1.y, ip), x2),
        (grad4(j1.z, ip), x3),
        (grad4(j1.w, ip), x4),
    ];

    let sum: f32 = corners
        .iter()
        .map(|(g, x)| {
            let g = *g * taylor_inv_sqrt(g.dot(*g));
            let m = (0.6 - x.dot(*x)).max(0.0);
            let m2 = m * m;
            m2 * m2 * g.dot(*x)
        })
        .sum();

    49.0 * sum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simplex4_is_deterministic() {
        let p = Vec4::new(0.3, -1.2, 2.5, 0.7);
        assert_eq!(simplex4(p).to_bits(), simplex4(p).to_bits());
    }

    #[test]
    fn test_simplex4_range() {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for i in 0..2000 {
            let t = i as f32 * 0.173;
            let v = simplex4(Vec4::new(t.sin() * 5.0, t * 0.31, (t * 1.7).cos() * 3.0, t * 0.05));
            assert!(v.is_finite());
            min = min.min(v);
            max = max.max(v);
        }
        assert!(min >= -1.1 && max <= 1.1, "range [{}, {}]", min, max);
        // The field actually varies
        assert!(max - min > 0.5);
    }

    #[test]
    fn test_simplex4_is_continuous() {
        let p = Vec4::new(1.1, 2.2, 3.3, 4.4);
        let q = p + Vec4::splat(1e-4);
        assert!((simplex4(p) - simplex4(q)).abs() < 1e-2);
    }
}
