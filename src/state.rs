//! State texture encoding.
//!
//! Particle state lives in a square RGBA32F texture, one texel per particle,
//! row-major: particle `i` sits at texel `(i % size, i / size)`. The texture
//! side is the smallest `size` with `size * size >= count`, so at most
//! `2 * size - 2` texels at the tail are padding and stay zero.
//!
//! | Channel | Meaning |
//! |---------|---------|
//! | `r` | x |
//! | `g` | y |
//! | `b` | z |
//! | `a` | life-cycle phase `w` |

use glam::{UVec2, Vec2, Vec4};

use crate::source::ParticleSet;

/// Bytes per RGBA32F texel.
pub const TEXEL_BYTES: u32 = 16;

/// Smallest `size` such that `size * size >= count`.
pub fn texture_size(count: usize) -> u32 {
    if count == 0 {
        return 0;
    }
    let mut size = (count as f64).sqrt() as u64;
    // f64 sqrt can be off by one for large counts; correct in both directions
    while size * size < count as u64 {
        size += 1;
    }
    while size > 1 && (size - 1) * (size - 1) >= count as u64 {
        size -= 1;
    }
    size as u32
}

/// Texel coordinate holding particle `i`.
#[inline]
pub fn texel_of(i: u32, size: u32) -> UVec2 {
    UVec2::new(i % size, i / size)
}

/// UV at the centre of the texel holding particle `i`.
#[inline]
pub fn particle_uv(i: u32, size: u32) -> Vec2 {
    let texel = texel_of(i, size);
    (texel.as_vec2() + Vec2::splat(0.5)) / size as f32
}

/// Particle index addressed by a texel-centre UV.
#[inline]
pub fn index_of_uv(uv: Vec2, size: u32) -> u32 {
    let texel = (uv * size as f32).floor().as_uvec2();
    texel.y * size + texel.x
}

/// UVs for every particle, in particle order.
pub fn particle_uvs(count: usize, size: u32) -> Vec<Vec2> {
    (0..count as u32).map(|i| particle_uv(i, size)).collect()
}

/// Host-side copy of one state texture.
#[derive(Debug, Clone, PartialEq)]
pub struct StateTexture {
    size: u32,
    count: usize,
    texels: Vec<Vec4>,
}

impl StateTexture {
    /// Zero-filled texture large enough for `count` particles.
    pub fn zeroed(count: usize) -> Self {
        let size = texture_size(count);
        Self {
            size,
            count,
            texels: vec![Vec4::ZERO; (size * size) as usize],
        }
    }

    /// Encode a particle set: `xyz` from positions, `w` from the phase or 0.
    pub fn encode(set: &ParticleSet) -> Self {
        let mut texture = Self::zeroed(set.count());
        let phase = set.phase();
        for (i, position) in set.positions().iter().enumerate() {
            let w = phase.map_or(0.0, |p| p[i]);
            texture.texels[i] = position.extend(w);
        }
        texture
    }

    /// Texture side in texels.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of live (non-padding) texels.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// All texels including padding, row-major.
    pub fn texels(&self) -> &[Vec4] {
        &self.texels
    }

    pub fn texels_mut(&mut self) -> &mut [Vec4] {
        &mut self.texels
    }

    /// State of particle `i`.
    #[inline]
    pub fn get(&self, i: usize) -> Vec4 {
        self.texels[i]
    }

    /// Raw RGBA32F bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }

    /// Row pitch of [`as_bytes`](Self::as_bytes).
    #[inline]
    pub fn bytes_per_row(&self) -> u32 {
        self.size * TEXEL_BYTES
    }

    /// Texture extent for wgpu.
    pub fn extent(&self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.size,
            height: self.size,
            depth_or_array_layers: 1,
        }
    }
}
