//! GPU-facing uniform blocks and per-instance data.
//!
//! Layouts mirror the WGSL structs in `src/shaders/` byte for byte; the
//! tests below pin the sizes so a field change on one side shows up.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3};

/// Uniforms read by the flow-field compute pass.
///
/// ```wgsl
/// struct SimulationUniforms {
///     time: f32,
///     delta_time: f32,
///     flow_field_influence: f32,
///     flow_field_strength: f32,
///     flow_field_frequency: f32,
///     size: u32,
///     count: u32,
///     _pad: u32,
/// };
/// ```
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SimulationUniforms {
    pub time: f32,
    pub delta_time: f32,
    pub flow_field_influence: f32,
    pub flow_field_strength: f32,
    pub flow_field_frequency: f32,
    /// State texture side in texels.
    pub size: u32,
    /// Live particle count; texels at or past it are skipped.
    pub count: u32,
    pub _pad: u32,
}

impl SimulationUniforms {
    /// Uniforms for a texture of side `size` holding `count` particles,
    /// with the time fields zeroed.
    pub fn new(size: u32, count: u32) -> Self {
        Self {
            time: 0.0,
            delta_time: 0.0,
            flow_field_influence: 0.5,
            flow_field_strength: 2.0,
            flow_field_frequency: 0.5,
            size,
            count,
            _pad: 0,
        }
    }
}

/// Uniforms shared by the particle and debug-plane render passes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct RenderUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    /// Viewport size in physical pixels.
    pub resolution: [f32; 2],
    pub point_size: f32,
    pub _pad: f32,
}

impl RenderUniforms {
    pub fn new(view: Mat4, proj: Mat4, resolution: Vec2, point_size: f32) -> Self {
        Self {
            view_proj: (proj * view).to_cols_array_2d(),
            view: view.to_cols_array_2d(),
            resolution: resolution.to_array(),
            point_size,
            _pad: 0.0,
        }
    }
}

/// Static per-particle vertex data, one entry per instance.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    /// Texel-centre UV into the state texture.
    pub uv: [f32; 2],
    /// Random sprite size factor in `[0, 1)`.
    pub size: f32,
    /// Linear RGB colour.
    pub color: [f32; 3],
}

impl ParticleInstance {
    pub fn new(uv: Vec2, size: f32, color: Vec3) -> Self {
        Self {
            uv: uv.to_array(),
            size,
            color: color.to_array(),
        }
    }

    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32, 2 => Float32x3];

    /// Instance-rate vertex buffer layout.
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ParticleInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}
