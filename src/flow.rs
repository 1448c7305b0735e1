//! Host-side flow-field step.
//!
//! [`step_texel`] is the per-texel transform of `shaders/flow_field.wgsl`
//! written against [`crate::noise`]. [`CpuSimulation`] runs it over a
//! ping-pong pair of [`StateTexture`]s. The render loop never uses it; it
//! exists so the stepping laws (determinism, zero strength) can be checked
//! and benchmarked without a GPU.

use glam::{Vec3, Vec4, Vec4Swizzles};

use crate::frame::SimulationStage;
use crate::noise::simplex4;
use crate::pingpong::{PingPong, Slot};
use crate::shader_utils::smooth_ramp;
use crate::state::StateTexture;
use crate::uniforms::SimulationUniforms;

/// Factor applied to elapsed time before it enters the noise.
pub const TIME_SCALE: f32 = 0.2;
/// Spatial frequency of the per-particle strength noise.
pub const BASE_FREQUENCY: f32 = 0.2;
/// Phase advance per second; a full life cycle lasts `1 / LIFE_RATE` s.
pub const LIFE_RATE: f32 = 0.3;

/// Advance one particle by one step.
///
/// `previous` is the particle's last state, `base` its source position.
pub fn step_texel(previous: Vec4, base: Vec4, uniforms: &SimulationUniforms) -> Vec4 {
    let time = uniforms.time * TIME_SCALE;

    if previous.w >= 1.0 {
        let w = previous.w - previous.w.floor();
        return base.xyz().extend(w);
    }

    let strength = simplex4((base.xyz() * BASE_FREQUENCY).extend(time + 1.0));
    let influence = (uniforms.flow_field_influence - 0.5) * -2.0;
    let strength = smooth_ramp(influence, 1.0, strength);

    let p = previous.xyz() * uniforms.flow_field_frequency;
    let flow = Vec3::new(
        simplex4((p + Vec3::splat(0.0)).extend(time)),
        simplex4((p + Vec3::splat(1.0)).extend(time)),
        simplex4((p + Vec3::splat(2.0)).extend(time)),
    )
    .normalize_or_zero();

    let displacement = flow * uniforms.delta_time * strength * uniforms.flow_field_strength;
    (previous.xyz() + displacement).extend(previous.w + uniforms.delta_time * LIFE_RATE)
}

/// Flow-field simulation over host-side textures.
#[derive(Debug, Clone)]
pub struct CpuSimulation {
    base: StateTexture,
    state: PingPong<StateTexture>,
    uniforms: SimulationUniforms,
}

impl CpuSimulation {
    /// Start from `initial`, which also serves as the respawn base.
    pub fn new(initial: StateTexture) -> Self {
        let uniforms = SimulationUniforms::new(initial.size(), initial.count() as u32);
        let scratch = StateTexture::zeroed(initial.count());
        Self {
            base: initial.clone(),
            state: PingPong::new(initial, scratch),
            uniforms,
        }
    }

    /// Latest state.
    pub fn state(&self) -> &StateTexture {
        self.state.front()
    }

    pub fn uniforms(&self) -> &SimulationUniforms {
        &self.uniforms
    }
}

impl SimulationStage for CpuSimulation {
    fn step(&mut self) {
        let count = self.base.count();
        let uniforms = self.uniforms;
        let base = self.base.texels();
        let (previous, next) = self.state.split();

        let next = next.texels_mut();
        for (i, out) in next.iter_mut().enumerate() {
            *out = if i < count {
                step_texel(previous.get(i), base[i], &uniforms)
            } else {
                Vec4::ZERO
            };
        }
        self.state.swap();
    }

    fn current(&self) -> Slot {
        self.state.current()
    }

    fn steps(&self) -> u64 {
        self.state.steps()
    }

    fn write_uniforms(&mut self, uniforms: &SimulationUniforms) {
        self.uniforms = *uniforms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{icosphere, ParticleSet};

    fn uniforms(strength: f32, delta: f32) -> SimulationUniforms {
        SimulationUniforms {
            time: 1.5,
            delta_time: delta,
            flow_field_strength: strength,
            ..SimulationUniforms::new(0, 0)
        }
    }

    #[test]
    fn test_zero_strength_keeps_position() {
        let prev = Vec4::new(1.0, -2.0, 0.5, 0.4);
        let next = step_texel(prev, prev, &uniforms(0.0, 0.016));
        assert_eq!(next.xyz(), prev.xyz());
        assert!((next.w - (0.4 + 0.016 * LIFE_RATE)).abs() < 1e-6);
    }

    #[test]
    fn test_step_moves_with_strength() {
        let prev = Vec4::new(1.0, -2.0, 0.5, 0.4);
        let u = SimulationUniforms {
            flow_field_influence: 1.0,
            ..uniforms(5.0, 0.1)
        };
        let next = step_texel(prev, prev, &u);
        assert_ne!(next.xyz(), prev.xyz());
        // Normalised flow bounds the displacement
        assert!((next.xyz() - prev.xyz()).length() <= 5.0 * 0.1 + 1e-5);
    }

    #[test]
    fn test_expired_particle_respawns_at_base() {
        let prev = Vec4::new(9.0, 9.0, 9.0, 1.25);
        let base = Vec4::new(1.0, 2.0, 3.0, 0.0);
        let next = step_texel(prev, base, &uniforms(2.0, 0.016));
        assert_eq!(next, Vec4::new(1.0, 2.0, 3.0, 0.25));
    }

    #[test]
    fn test_zero_influence_freezes_flow() {
        let prev = Vec4::new(0.3, 0.2, 0.1, 0.5);
        let u = SimulationUniforms {
            flow_field_influence: 0.0,
            ..uniforms(10.0, 0.1)
        };
        let next = step_texel(prev, prev, &u);
        assert_eq!(next.xyz(), prev.xyz());
    }

    #[test]
    fn test_cpu_simulation_swaps_and_counts() {
        let set = ParticleSet::from_positions(icosphere(3.0, 1)).with_random_phase(5);
        let mut sim = CpuSimulation::new(StateTexture::encode(&set));
        assert_eq!(sim.current(), Slot::A);

        sim.step();
        assert_eq!(sim.current(), Slot::B);
        assert_eq!(sim.steps(), 1);

        sim.step();
        assert_eq!(sim.current(), Slot::A);
        assert_eq!(sim.steps(), 2);
    }

    #[test]
    fn test_cpu_simulation_leaves_padding_zero() {
        let set = ParticleSet::from_positions(icosphere(3.0, 1));
        let mut sim = CpuSimulation::new(StateTexture::encode(&set));
        sim.write_uniforms(&uniforms(4.0, 0.05));
        sim.step();

        let state = sim.state();
        assert_eq!(state.count(), 42);
        assert_eq!(state.size(), 7);
        assert!(state.texels()[42..].iter().all(|t| *t == Vec4::ZERO));
    }
}
