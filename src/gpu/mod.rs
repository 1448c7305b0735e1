//! GPU side: device setup, the compute stage and the render passes.

pub mod camera;
pub mod compute;
pub mod debug_plane;
#[cfg(feature = "egui")]
pub mod egui_integration;
pub mod particles;
pub mod scene;

use std::sync::Arc;

use winit::dpi::PhysicalSize;
use winit::window::Window;

pub use camera::Camera;
pub use compute::{GpuSimulation, STATE_FORMAT};
pub use debug_plane::DebugPlane;
pub use particles::{particle_instances, ParticleRenderer, StateBindings, DEPTH_FORMAT};
pub use scene::{create_depth_texture, Scene};

use crate::controls::Controls;
use crate::error::{FrameError, GpuError};
use crate::frame::StateConsumer;
use crate::pingpong::Slot;
use crate::source::ParticleSet;
use crate::state::StateTexture;
use crate::uniforms::{RenderUniforms, SimulationUniforms};
use crate::viewport::Viewport;

#[cfg(feature = "egui")]
use egui_integration::{EguiFrameOutput, EguiIntegration};

/// Window surface plus every render resource.
///
/// The compute stage is returned separately from [`GpuState::new`] so the
/// frame driver can hold the two sides independently.
pub struct GpuState {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pub config: wgpu::SurfaceConfiguration,
    depth_texture: wgpu::TextureView,
    scene: Scene,
    pub camera: Camera,
    viewport: Viewport,
    controls: Controls,
    #[cfg(feature = "egui")]
    egui: EguiIntegration,
    #[cfg(feature = "egui")]
    egui_output: Option<EguiFrameOutput>,
}

impl GpuState {
    /// Bring up the device, upload `state` and build every pipeline.
    pub async fn new(
        window: Arc<Window>,
        set: &ParticleSet,
        state: &StateTexture,
        controls: Controls,
        seed: u64,
    ) -> Result<(Self, GpuSimulation), GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        log::info!("using adapter {:?}", adapter.get_info().name);

        let storage = adapter.get_texture_format_features(STATE_FORMAT);
        if !storage
            .allowed_usages
            .contains(wgpu::TextureUsages::STORAGE_BINDING)
        {
            return Err(GpuError::NoFloatStorage);
        }

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;
        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::UnsupportedSurface)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .ok_or(GpuError::UnsupportedSurface)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = create_depth_texture(&device, config.width, config.height);

        let simulation_uniforms = initial_uniforms(state, &controls);
        let simulation = GpuSimulation::new(device.clone(), queue.clone(), state, &simulation_uniforms);

        let viewport = Viewport::from_physical(size, window.scale_factor());
        let camera = Camera::new();
        let render_uniforms = RenderUniforms::new(
            camera.view_matrix(),
            camera.projection(viewport.aspect()),
            viewport.resolution(),
            controls.point_size,
        );
        let instances = particle_instances(set, state.size(), seed);
        let scene = Scene::new(&device, config.format, &simulation, render_uniforms, &instances);

        #[cfg(feature = "egui")]
        let egui = EguiIntegration::new(&device, config.format, &window);

        let gpu = Self {
            window,
            surface,
            device,
            queue,
            config,
            depth_texture,
            scene,
            camera,
            viewport,
            controls,
            #[cfg(feature = "egui")]
            egui,
            #[cfg(feature = "egui")]
            egui_output: None,
        };

        Ok((gpu, simulation))
    }

    /// React to a window resize or scale-factor change.
    ///
    /// Only the surface, depth buffer, camera aspect and resolution uniform
    /// change; particle state is untouched.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>, scale_factor: f64) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = create_depth_texture(&self.device, self.config.width, self.config.height);

            self.viewport = Viewport::from_physical(new_size, scale_factor);
            self.scene.bindings.set_resolution(self.viewport.resolution());
            log::debug!(
                "resized to {}x{} (resolution {:?})",
                new_size.width,
                new_size.height,
                self.viewport.resolution()
            );
        }
    }

    /// Reconfigure the surface at its current size after `Lost`/`Outdated`.
    pub fn reconfigure(&mut self) {
        let size = PhysicalSize::new(self.config.width, self.config.height);
        self.resize(size, self.window.scale_factor());
    }

    /// Take the render-side values from `controls`.
    pub fn apply_controls(&mut self, controls: &Controls) {
        self.controls = *controls;
        self.scene.bindings.set_point_size(controls.point_size);
    }

    /// Advance the camera damping and refresh the view matrices.
    pub fn update_camera(&mut self, dt: f32) {
        self.camera.update(dt);
        self.scene.bindings.set_camera(
            self.camera.view_matrix(),
            self.camera.projection(self.viewport.aspect()),
        );
    }

    /// Run the control panel for this frame. Returns true if a value
    /// changed.
    #[cfg(feature = "egui")]
    pub fn run_ui(&mut self, controls: &mut Controls) -> bool {
        let mut changed = false;
        let output = self.egui.run(&self.window, |ctx| changed |= controls.ui(ctx));
        self.egui_output = Some(output);
        changed
    }

    /// Forward a window event to egui. Returns true if egui consumed it.
    #[cfg(feature = "egui")]
    pub fn on_window_event(&mut self, event: &winit::event::WindowEvent) -> bool {
        self.egui.on_window_event(&self.window, event)
    }

    pub fn render(&mut self) -> Result<(), FrameError> {
        self.scene.bindings.flush(&self.queue);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.scene.encode(
            &mut encoder,
            &view,
            &self.depth_texture,
            self.controls.clear_color_for(self.config.format),
            self.controls.show_debug_plane,
        );

        #[cfg(feature = "egui")]
        let egui_output = self.egui_output.take();
        #[cfg(feature = "egui")]
        if let Some(ref out) = egui_output {
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [self.config.width, self.config.height],
                pixels_per_point: out.pixels_per_point,
            };
            self.egui
                .painter
                .prepare(&self.device, &self.queue, &mut encoder, out, &screen_descriptor);
            self.egui.painter.paint(&mut encoder, &view, out, &screen_descriptor);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        #[cfg(feature = "egui")]
        if let Some(ref out) = egui_output {
            self.egui.painter.cleanup(out);
        }

        Ok(())
    }
}

impl StateConsumer for GpuState {
    fn bind_state(&mut self, slot: Slot) {
        self.scene.bindings.bind_state(slot);
    }

    fn draw(&mut self) -> Result<(), FrameError> {
        self.render()
    }
}

/// Initial simulation uniforms for `state` under `controls`.
pub fn initial_uniforms(state: &StateTexture, controls: &Controls) -> SimulationUniforms {
    controls.simulation_uniforms(0.0, 0.0, state.size(), state.count() as u32)
}
