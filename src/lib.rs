//! # gpgpu-flow
//!
//! GPU flow-field particles. Particle state lives in a pair of RGBA32F
//! textures (`xyz` = position, `w` = life-cycle phase); a compute pass reads
//! one and writes the other every frame, and an instanced sprite pass draws
//! particles by sampling the freshly written texture.
//!
//! ## Quick Start
//!
//! ```ignore
//! use gpgpu_flow::prelude::*;
//!
//! fn main() -> Result<(), SimulationError> {
//!     Simulation::new()
//!         .with_source(ParticleSource::sphere())
//!         .with_controls(Controls {
//!             flow_field_strength: 3.0,
//!             ..Default::default()
//!         })
//!         .run()
//! }
//! ```
//!
//! ## Pipeline
//!
//! | Stage | Type |
//! |-------|------|
//! | Particle source (sphere or glTF) | [`ParticleSource`], [`ParticleSet`] |
//! | State texture encoding | [`StateTexture`] |
//! | Ping-pong slots | [`PingPong`], [`Slot`] |
//! | Flow-field step | [`SimulationStage`] (GPU: [`GpuSimulation`], host: [`CpuSimulation`]) |
//! | Sprite rendering | [`StateConsumer`] |
//! | Per-frame ordering | [`FrameDriver`] |
//! | Tweakables | [`Controls`] |
//!
//! The host-side [`CpuSimulation`] runs the same per-texel transform as the
//! compute shader. It never drives the window; it exists for tests and
//! benchmarks.

pub mod controls;
pub mod error;
pub mod flow;
pub mod frame;
pub mod gpu;
pub mod noise;
pub mod pingpong;
pub mod shader;
pub mod shader_utils;
mod simulation;
pub mod source;
pub mod state;
pub mod time;
pub mod uniforms;
pub mod viewport;

pub use glam::{Vec2, Vec3, Vec4};

pub use controls::Controls;
pub use error::{FrameError, GpuError, SimulationError, SourceError};
pub use flow::CpuSimulation;
pub use frame::{FrameDriver, SimulationStage, StateConsumer, TickReport};
pub use gpu::GpuSimulation;
pub use pingpong::{PingPong, Slot};
pub use simulation::Simulation;
pub use source::{ParticleSet, ParticleSource};
pub use state::StateTexture;
pub use uniforms::SimulationUniforms;
pub use viewport::Viewport;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use gpgpu_flow::prelude::*;
/// ```
pub mod prelude {
    pub use crate::controls::Controls;
    pub use crate::error::SimulationError;
    pub use crate::simulation::Simulation;
    pub use crate::source::{ParticleSet, ParticleSource};
    pub use crate::time::Time;
    pub use crate::{Vec2, Vec3, Vec4};
    #[cfg(feature = "egui")]
    pub use egui;
}
