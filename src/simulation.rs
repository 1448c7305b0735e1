//! Simulation builder and runner

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::controls::Controls;
use crate::error::{FrameError, SimulationError, SourceError};
use crate::frame::FrameDriver;
use crate::gpu::{initial_uniforms, GpuSimulation, GpuState};
use crate::source::{ParticleSet, ParticleSource};
use crate::state::StateTexture;

/// A flow-field particle simulation builder.
///
/// Use method chaining to configure, then call `.run()` to start.
///
/// ```ignore
/// use gpgpu_flow::prelude::*;
///
/// Simulation::new()
///     .with_source(ParticleSource::model("static/model.glb"))
///     .with_controls(Controls { flow_field_strength: 4.0, ..Default::default() })
///     .run()?;
/// ```
#[derive(Debug, Clone)]
pub struct Simulation {
    source: ParticleSource,
    controls: Controls,
    seed: u64,
    random_phase: bool,
    steps_per_tick: u32,
    title: String,
    window_size: (u32, u32),
}

impl Simulation {
    /// Create a new simulation with default settings: the procedural
    /// sphere, default controls, random phase, one step per tick.
    pub fn new() -> Self {
        Self {
            source: ParticleSource::default(),
            controls: Controls::default(),
            seed: 0,
            random_phase: true,
            steps_per_tick: 1,
            title: "GPGPU Flow Field".to_string(),
            window_size: (1280, 720),
        }
    }

    /// Set where the initial particle positions come from.
    pub fn with_source(mut self, source: ParticleSource) -> Self {
        self.source = source;
        self
    }

    /// Set the initial control values.
    pub fn with_controls(mut self, controls: Controls) -> Self {
        self.controls = controls;
        self
    }

    /// Seed for the life-cycle phase and sprite sizes.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Start every particle at a random point of its life cycle. When
    /// disabled all particles start at phase 0.
    pub fn with_random_phase(mut self, enabled: bool) -> Self {
        self.random_phase = enabled;
        self
    }

    /// Simulation steps per rendered frame.
    pub fn with_steps_per_tick(mut self, steps: u32) -> Self {
        self.steps_per_tick = steps;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Initial window size in logical pixels.
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    /// Load the source and encode the initial state texture.
    pub fn prepare(&self) -> Result<(ParticleSet, StateTexture), SourceError> {
        let mut set = self.source.load()?;
        if self.random_phase {
            set = set.with_random_phase(self.seed);
        }
        let state = StateTexture::encode(&set);
        log::info!(
            "{} particles in a {}x{} state texture",
            state.count(),
            state.size(),
            state.size()
        );
        Ok((set, state))
    }

    /// Run the simulation. This blocks until the window is closed.
    pub fn run(self) -> Result<(), SimulationError> {
        let (set, state) = self.prepare()?;

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self, set, state);
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything that exists once the window and device are up.
struct Running {
    gpu: GpuState,
    simulation: GpuSimulation,
    driver: FrameDriver,
}

struct App {
    config: Simulation,
    set: ParticleSet,
    state: StateTexture,
    controls: Controls,
    window: Option<Arc<Window>>,
    running: Option<Running>,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    /// Startup failure, reported by `Simulation::run` once the loop exits.
    error: Option<SimulationError>,
}

impl App {
    fn new(config: Simulation, set: ParticleSet, state: StateTexture) -> Self {
        Self {
            controls: config.controls,
            config,
            set,
            state,
            window: None,
            running: None,
            mouse_pressed: false,
            last_mouse_pos: None,
            error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<(), SimulationError> {
        let (width, height) = self.config.window_size;
        let window_attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(width, height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        self.window = Some(window.clone());

        let (gpu, simulation) = pollster::block_on(GpuState::new(
            window.clone(),
            &self.set,
            &self.state,
            self.controls,
            self.config.seed,
        ))?;

        let driver = FrameDriver::new(initial_uniforms(&self.state, &self.controls))
            .with_steps_per_tick(self.config.steps_per_tick);

        self.running = Some(Running {
            gpu,
            simulation,
            driver,
        });
        window.request_redraw();
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(running) = &mut self.running else {
            return;
        };

        #[cfg(feature = "egui")]
        if running.gpu.run_ui(&mut self.controls) {
            log::debug!("controls changed: {:?}", self.controls);
            running.gpu.apply_controls(&self.controls);
            self.controls.apply(running.driver.uniforms_mut());
        }

        let result = running
            .driver
            .tick(&mut running.simulation, &mut running.gpu, |gpu, dt| {
                gpu.update_camera(dt)
            });

        match result {
            Ok(_) => {}
            Err(FrameError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                running.gpu.reconfigure()
            }
            Err(FrameError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                log::error!("GPU out of memory, exiting");
                event_loop.exit();
            }
            Err(e) => log::warn!("frame dropped: {}", e),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.start(event_loop) {
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        #[cfg(feature = "egui")]
        let consumed = match &mut self.running {
            Some(running) => running.gpu.on_window_event(&event),
            None => false,
        };
        #[cfg(not(feature = "egui"))]
        let consumed = false;

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let (Some(running), Some(window)) = (&mut self.running, &self.window) {
                    running.gpu.resize(physical_size, window.scale_factor());
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let (Some(running), Some(window)) = (&mut self.running, &self.window) {
                    running.gpu.resize(window.inner_size(), scale_factor);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Space),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } if !consumed => {
                if let Some(running) = &mut self.running {
                    let time = running.driver.time_mut();
                    time.toggle_pause();
                    log::info!("simulation {}", if time.is_paused() { "paused" } else { "resumed" });
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed && !consumed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        let dx = position.x - last_x;
                        let dy = position.y - last_y;

                        if let Some(running) = &mut self.running {
                            running.gpu.camera.orbit(dx as f32, dy as f32);
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } if !consumed => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                if let Some(running) = &mut self.running {
                    running.gpu.camera.zoom(scroll);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ParticleSource;

    #[test]
    fn test_prepare_default_sphere() {
        let (set, state) = Simulation::new().prepare().unwrap();
        assert_eq!(set.count(), 2562);
        assert_eq!(state.size(), 51);
        assert!(set.phase().is_some());
    }

    #[test]
    fn test_prepare_without_phase() {
        let sim = Simulation::new()
            .with_source(ParticleSource::Sphere {
                radius: 1.0,
                subdivisions: 1,
            })
            .with_random_phase(false);
        let (_, state) = sim.prepare().unwrap();
        assert!(state.texels()[..state.count()].iter().all(|t| t.w == 0.0));
    }

    #[test]
    fn test_prepare_is_seeded() {
        let sim = Simulation::new().with_seed(99);
        let (_, a) = sim.prepare().unwrap();
        let (_, b) = sim.prepare().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_prepare_missing_model_fails() {
        let sim = Simulation::new().with_source(ParticleSource::model("does/not/exist.glb"));
        assert!(matches!(sim.prepare(), Err(SourceError::Gltf { .. })));
    }
}
