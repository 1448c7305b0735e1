//! Instanced point-sprite renderer.
//!
//! Every particle is a camera-facing quad of 6 vertices. The instance buffer
//! only carries static data (state UV, size factor, colour); positions come
//! from the state texture in the vertex stage.

use glam::{Mat4, Vec2};
use wgpu::util::DeviceExt;

use crate::pingpong::Slot;
use crate::shader::PARTICLES_SOURCE;
use crate::source::ParticleSet;
use crate::state::particle_uv;
use crate::uniforms::{ParticleInstance, RenderUniforms};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Build one instance per particle of `set` for a state texture of side `size`.
pub fn particle_instances(set: &ParticleSet, size: u32, seed: u64) -> Vec<ParticleInstance> {
    let sizes = set.sprite_sizes(seed);
    (0..set.count())
        .map(|i| ParticleInstance::new(particle_uv(i as u32, size), sizes[i], set.color_or_tint(i)))
        .collect()
}

/// Render state shared by the particle and debug-plane pipelines: one
/// uniform buffer and a bind group per ping-pong slot.
pub struct StateBindings {
    pub layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    uniforms: RenderUniforms,
    bind_groups: [wgpu::BindGroup; 2],
    bound: Slot,
}

impl StateBindings {
    pub fn new(device: &wgpu::Device, views: [&wgpu::TextureView; 2], uniforms: RenderUniforms) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Render Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        // RGBA32F is not filterable without an extra feature
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("State Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("State Render Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                },
            ],
        });

        let bind_group = |view: &wgpu::TextureView| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("State Render Bind Group"),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&sampler),
                    },
                ],
            })
        };
        let bind_groups = [bind_group(views[0]), bind_group(views[1])];

        Self {
            layout,
            uniform_buffer,
            uniforms,
            bind_groups,
            bound: Slot::A,
        }
    }

    pub fn bind_state(&mut self, slot: Slot) {
        self.bound = slot;
    }

    /// Bind group for the bound slot.
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_groups[self.bound.index()]
    }

    pub fn uniforms(&self) -> &RenderUniforms {
        &self.uniforms
    }

    pub fn set_camera(&mut self, view: Mat4, proj: Mat4) {
        self.uniforms.view_proj = (proj * view).to_cols_array_2d();
        self.uniforms.view = view.to_cols_array_2d();
    }

    pub fn set_resolution(&mut self, resolution: Vec2) {
        self.uniforms.resolution = resolution.to_array();
    }

    pub fn set_point_size(&mut self, point_size: f32) {
        self.uniforms.point_size = point_size;
    }

    /// Upload the uniform block.
    pub fn flush(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));
    }
}

/// Pipeline and instance data for the particle sprites.
pub struct ParticleRenderer {
    pipeline: wgpu::RenderPipeline,
    instance_buffer: wgpu::Buffer,
    count: u32,
}

impl ParticleRenderer {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        bindings: &StateBindings,
        instances: &[ParticleInstance],
    ) -> Self {
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Particle Instance Buffer"),
            contents: bytemuck::cast_slice(instances),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Particle Shader"),
            source: wgpu::ShaderSource::Wgsl(PARTICLES_SOURCE.into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Particle Pipeline Layout"),
            bind_group_layouts: &[&bindings.layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Particle Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[ParticleInstance::layout()],
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

        Self {
            pipeline,
            instance_buffer,
            count: instances.len() as u32,
        }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, bindings: &StateBindings) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bindings.bind_group(), &[]);
        pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
        pass.draw(0..6, 0..self.count);
    }
}

/// Depth test shared by the particle and debug-plane pipelines.
pub(crate) fn depth_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}
