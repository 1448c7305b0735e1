//! End-to-end checks of the host-side pipeline: source -> state texture ->
//! ping-pong stepping -> frame ordering. Nothing here needs a GPU.

use gpgpu_flow::error::FrameError;
use gpgpu_flow::source::{icosphere, ParticleSet, ParticleSource};
use gpgpu_flow::state::{index_of_uv, particle_uv, particle_uvs, texture_size, StateTexture};
use gpgpu_flow::viewport::Viewport;
use gpgpu_flow::{Controls, CpuSimulation, FrameDriver, SimulationStage, Slot, StateConsumer, Vec2, Vec4};
use glam::Vec4Swizzles;

fn sphere_state(seed: u64) -> StateTexture {
    let set = ParticleSource::sphere().load().unwrap().with_random_phase(seed);
    StateTexture::encode(&set)
}

// ============================================================================
// Source and encoding
// ============================================================================

#[test]
fn test_default_sphere_fills_51_texture() {
    let state = sphere_state(0);
    assert_eq!(state.count(), 2562);
    assert_eq!(state.size(), 51);
    assert_eq!(state.texels().len(), 51 * 51);
    assert_eq!(state.as_bytes().len(), 51 * 51 * 16);
}

#[test]
fn test_uv_round_trip_for_every_particle() {
    let state = sphere_state(0);
    let uvs = particle_uvs(state.count(), state.size());
    for (i, uv) in uvs.iter().enumerate() {
        assert_eq!(index_of_uv(*uv, state.size()), i as u32);
    }
}

#[test]
fn test_uv_round_trip_non_square_counts() {
    for count in [1usize, 2, 3, 5, 17, 1000, 4097] {
        let size = texture_size(count);
        for i in 0..count as u32 {
            assert_eq!(index_of_uv(particle_uv(i, size), size), i);
        }
    }
}

#[test]
fn test_encoder_is_idempotent() {
    let a = sphere_state(11);
    let b = sphere_state(11);
    assert_eq!(a.as_bytes(), b.as_bytes());
}

// ============================================================================
// Stepping
// ============================================================================

fn simulation(strength: f32, delta: f32) -> CpuSimulation {
    let mut sim = CpuSimulation::new(sphere_state(3));
    let controls = Controls {
        flow_field_strength: strength,
        ..Default::default()
    };
    let state = sim.state();
    let uniforms = controls.simulation_uniforms(2.0, delta, state.size(), state.count() as u32);
    sim.write_uniforms(&uniforms);
    sim
}

#[test]
fn test_step_is_deterministic() {
    let mut a = simulation(2.0, 1.0 / 60.0);
    let mut b = simulation(2.0, 1.0 / 60.0);
    for _ in 0..10 {
        a.step();
        b.step();
    }
    assert_eq!(a.state().as_bytes(), b.state().as_bytes());
}

#[test]
fn test_zero_strength_is_static() {
    let initial = sphere_state(3);
    let mut sim = simulation(0.0, 0.1);

    // Long enough for every particle to cross w = 1 at least once
    for _ in 0..40 {
        sim.step();
        let state = sim.state();
        for i in 0..state.count() {
            assert_eq!(state.get(i).xyz(), initial.get(i).xyz(), "particle {} moved", i);
        }
    }
}

#[test]
fn test_flow_moves_particles() {
    let initial = sphere_state(3);
    let mut sim = simulation(2.0, 1.0 / 60.0);
    sim.step();

    let moved = (0..initial.count())
        .filter(|&i| sim.state().get(i).xyz() != initial.get(i).xyz())
        .count();
    assert!(moved > 0);
}

#[test]
fn test_phase_stays_in_unit_range() {
    let mut sim = simulation(2.0, 0.05);
    for _ in 0..100 {
        sim.step();
    }
    let state = sim.state();
    for i in 0..state.count() {
        let w = state.get(i).w;
        assert!((0.0..1.0 + 0.05 * 0.3).contains(&w), "phase {} out of range", w);
    }
}

#[test]
fn test_padding_texels_stay_zero() {
    let set = ParticleSet::from_positions(icosphere(3.0, 2)).with_random_phase(1);
    let mut sim = CpuSimulation::new(StateTexture::encode(&set));
    for _ in 0..3 {
        sim.step();
    }
    let state = sim.state();
    assert!(state.texels()[state.count()..].iter().all(|t| *t == Vec4::ZERO));
}

// ============================================================================
// Frame ordering
// ============================================================================

#[derive(Default)]
struct RecordingRenderer {
    bound: Vec<Slot>,
}

impl StateConsumer for RecordingRenderer {
    fn bind_state(&mut self, slot: Slot) {
        self.bound.push(slot);
    }

    fn draw(&mut self) -> Result<(), FrameError> {
        Ok(())
    }
}

#[test]
fn test_renderer_reads_same_tick_output() {
    let mut sim = CpuSimulation::new(sphere_state(0));
    let mut driver = FrameDriver::new(*sim.uniforms());
    let mut renderer = RecordingRenderer::default();

    for _ in 0..6 {
        let report = driver.tick(&mut sim, &mut renderer, |_, _| {}).unwrap();
        assert_eq!(report.slot, sim.current());
    }
    assert_eq!(
        renderer.bound,
        vec![Slot::B, Slot::A, Slot::B, Slot::A, Slot::B, Slot::A]
    );
    assert_eq!(sim.steps(), 6);
}

// ============================================================================
// Resize
// ============================================================================

#[test]
fn test_resize_recomputes_resolution() {
    let mut viewport = Viewport::new(1920.0, 1080.0, 2.0);
    assert_eq!(viewport.resolution(), Vec2::new(3840.0, 2160.0));

    let resolution = viewport.resize(800.0, 600.0, 2.0);
    assert_eq!(resolution, Vec2::new(1600.0, 1200.0));
    assert!((viewport.aspect() - 800.0 / 600.0).abs() < 1e-6);
}

#[test]
fn test_pixel_ratio_is_capped() {
    let viewport = Viewport::new(800.0, 600.0, 3.0);
    assert_eq!(viewport.pixel_ratio, 2.0);
    assert_eq!(viewport.resolution(), Vec2::new(1600.0, 1200.0));
}
