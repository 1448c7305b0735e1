//! Per-tick orchestration of simulation and rendering.
//!
//! A tick runs, in order: clock update, camera hook, `steps_per_tick`
//! simulation steps, binding of the freshly written state, draw, and the
//! uniform write for the next tick. The renderer therefore always shows the
//! state produced in the same tick.

use crate::error::FrameError;
use crate::pingpong::Slot;
use crate::time::Time;
use crate::uniforms::SimulationUniforms;

/// Something that advances the particle state one step at a time.
pub trait SimulationStage {
    /// Run one step: read the current slot, write the other, swap.
    fn step(&mut self);

    /// Slot holding the latest state.
    fn current(&self) -> Slot;

    /// Steps run since construction.
    fn steps(&self) -> u64;

    /// Uniforms used by subsequent steps.
    fn write_uniforms(&mut self, uniforms: &SimulationUniforms);
}

/// Something that draws a state slot.
pub trait StateConsumer {
    /// Select the slot the next `draw` reads.
    fn bind_state(&mut self, slot: Slot);

    fn draw(&mut self) -> Result<(), FrameError>;
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Slot bound for drawing.
    pub slot: Slot,
    /// Stage step count after the tick.
    pub steps: u64,
    pub elapsed: f32,
    pub delta: f32,
}

/// Drives a [`SimulationStage`] and a [`StateConsumer`] once per frame.
#[derive(Debug)]
pub struct FrameDriver {
    time: Time,
    uniforms: SimulationUniforms,
    steps_per_tick: u32,
}

impl FrameDriver {
    pub fn new(uniforms: SimulationUniforms) -> Self {
        Self {
            time: Time::new(),
            uniforms,
            steps_per_tick: 1,
        }
    }

    /// Number of steps per tick. Zero freezes the simulation while drawing
    /// continues.
    pub fn with_steps_per_tick(mut self, steps: u32) -> Self {
        self.steps_per_tick = steps;
        self
    }

    pub fn steps_per_tick(&self) -> u32 {
        self.steps_per_tick
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    pub fn time_mut(&mut self) -> &mut Time {
        &mut self.time
    }

    /// Uniform block written at the end of the last tick.
    pub fn uniforms(&self) -> &SimulationUniforms {
        &self.uniforms
    }

    pub fn uniforms_mut(&mut self) -> &mut SimulationUniforms {
        &mut self.uniforms
    }

    /// Run one tick.
    ///
    /// `camera` runs after the clock update and before the simulation
    /// steps; it receives the renderer and the tick's delta.
    ///
    /// A failed draw is returned after the uniforms have been written, so
    /// the simulation keeps its clock even when a frame is dropped.
    pub fn tick<S, R, F>(&mut self, stage: &mut S, renderer: &mut R, camera: F) -> Result<TickReport, FrameError>
    where
        S: SimulationStage + ?Sized,
        R: StateConsumer + ?Sized,
        F: FnOnce(&mut R, f32),
    {
        let (elapsed, delta) = self.time.update();

        camera(renderer, delta);

        for _ in 0..self.steps_per_tick {
            stage.step();
        }

        let slot = stage.current();
        renderer.bind_state(slot);
        let drawn = renderer.draw();

        self.uniforms.time = elapsed;
        self.uniforms.delta_time = delta;
        stage.write_uniforms(&self.uniforms);

        drawn?;

        Ok(TickReport {
            slot,
            steps: stage.steps(),
            elapsed,
            delta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::CpuSimulation;
    use crate::source::{icosphere, ParticleSet};
    use crate::state::StateTexture;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct LoggingStage {
        inner: CpuSimulation,
        log: Log,
    }

    impl SimulationStage for LoggingStage {
        fn step(&mut self) {
            self.inner.step();
            self.log.borrow_mut().push(format!("step->{:?}", self.inner.current()));
        }

        fn current(&self) -> Slot {
            self.inner.current()
        }

        fn steps(&self) -> u64 {
            self.inner.steps()
        }

        fn write_uniforms(&mut self, uniforms: &SimulationUniforms) {
            self.inner.write_uniforms(uniforms);
            self.log.borrow_mut().push("uniforms".to_string());
        }
    }

    struct MockRenderer {
        bound: Option<Slot>,
        draws: u32,
        fail: bool,
        log: Log,
    }

    impl StateConsumer for MockRenderer {
        fn bind_state(&mut self, slot: Slot) {
            self.bound = Some(slot);
            self.log.borrow_mut().push(format!("bind {:?}", slot));
        }

        fn draw(&mut self) -> Result<(), FrameError> {
            self.draws += 1;
            self.log.borrow_mut().push("draw".to_string());
            if self.fail {
                Err(FrameError::Surface(wgpu::SurfaceError::Outdated))
            } else {
                Ok(())
            }
        }
    }

    fn setup() -> (LoggingStage, MockRenderer, Log) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let set = ParticleSet::from_positions(icosphere(1.0, 0)).with_random_phase(1);
        let stage = LoggingStage {
            inner: CpuSimulation::new(StateTexture::encode(&set)),
            log: log.clone(),
        };
        let renderer = MockRenderer {
            bound: None,
            draws: 0,
            fail: false,
            log: log.clone(),
        };
        (stage, renderer, log)
    }

    fn driver(stage: &LoggingStage) -> FrameDriver {
        FrameDriver::new(*stage.inner.uniforms())
    }

    #[test]
    fn test_tick_order() {
        let (mut stage, mut renderer, log) = setup();
        let mut driver = driver(&stage);

        let camera_log = log.clone();
        driver
            .tick(&mut stage, &mut renderer, |_, _| camera_log.borrow_mut().push("camera".to_string()))
            .unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["camera", "step->B", "bind B", "draw", "uniforms"]
        );
    }

    #[test]
    fn test_bound_slot_is_same_tick_output() {
        let (mut stage, mut renderer, _log) = setup();
        let mut driver = driver(&stage);

        for tick in 1..=5u64 {
            let report = driver.tick(&mut stage, &mut renderer, |_, _| {}).unwrap();
            assert_eq!(report.slot, stage.current());
            assert_eq!(renderer.bound, Some(stage.current()));
            assert_eq!(report.steps, tick);
        }
        assert_eq!(renderer.draws, 5);
    }

    #[test]
    fn test_first_tick_delta_is_zero() {
        let (mut stage, mut renderer, _log) = setup();
        let mut driver = driver(&stage);

        let mut seen = None;
        let report = driver
            .tick(&mut stage, &mut renderer, |_, dt| seen = Some(dt))
            .unwrap();
        assert_eq!(seen, Some(0.0));
        assert_eq!(report.delta, 0.0);
        assert_eq!(stage.inner.uniforms().delta_time, 0.0);
    }

    #[test]
    fn test_steps_per_tick() {
        let (mut stage, mut renderer, _log) = setup();
        let mut driver = driver(&stage).with_steps_per_tick(2);

        let report = driver.tick(&mut stage, &mut renderer, |_, _| {}).unwrap();
        assert_eq!(report.steps, 2);
        assert_eq!(report.slot, Slot::A);
        assert_eq!(renderer.bound, Some(Slot::A));
    }

    #[test]
    fn test_draw_error_still_writes_uniforms() {
        let (mut stage, mut renderer, log) = setup();
        renderer.fail = true;
        let mut driver = driver(&stage);

        assert!(driver.tick(&mut stage, &mut renderer, |_, _| {}).is_err());
        assert_eq!(log.borrow().last().map(String::as_str), Some("uniforms"));
    }
}
