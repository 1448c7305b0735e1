//! Quad that shows the raw state texture beside the particles.

use crate::shader::DEBUG_PLANE_SOURCE;

use super::particles::{depth_state, StateBindings};

pub struct DebugPlane {
    pipeline: wgpu::RenderPipeline,
}

impl DebugPlane {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, bindings: &StateBindings) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Debug Plane Shader"),
            source: wgpu::ShaderSource::Wgsl(DEBUG_PLANE_SOURCE.into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Debug Plane Pipeline Layout"),
            bind_group_layouts: &[&bindings.layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Debug Plane Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(depth_state()),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self { pipeline }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, bindings: &StateBindings) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bindings.bind_group(), &[]);
        pass.draw(0..6, 0..1);
    }
}
