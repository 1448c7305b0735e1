//! The scene pass: sprites and the optional debug plane over a cleared target.

use super::compute::GpuSimulation;
use super::debug_plane::DebugPlane;
use super::particles::{ParticleRenderer, StateBindings, DEPTH_FORMAT};
use crate::uniforms::{ParticleInstance, RenderUniforms};

/// Render resources that read the state textures of one [`GpuSimulation`].
pub struct Scene {
    pub bindings: StateBindings,
    particles: ParticleRenderer,
    debug_plane: DebugPlane,
}

impl Scene {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        simulation: &GpuSimulation,
        uniforms: RenderUniforms,
        instances: &[ParticleInstance],
    ) -> Self {
        let bindings = StateBindings::new(device, simulation.views(), uniforms);
        let particles = ParticleRenderer::new(device, format, &bindings, instances);
        let debug_plane = DebugPlane::new(device, format, &bindings);

        Self {
            bindings,
            particles,
            debug_plane,
        }
    }

    /// Record the scene pass into `encoder`.
    ///
    /// Uniforms are not uploaded here; call [`StateBindings::flush`] first.
    pub fn encode(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        color: &wgpu::TextureView,
        depth: &wgpu::TextureView,
        clear: wgpu::Color,
        show_debug_plane: bool,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        self.particles.draw(&mut pass, &self.bindings);
        if show_debug_plane {
            self.debug_plane.draw(&mut pass, &self.bindings);
        }
    }
}

/// Depth buffer matching a `width` x `height` colour target.
pub fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
