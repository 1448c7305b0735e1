//! Flow-field compute stage.
//!
//! Two RGBA32F textures form the ping-pong pair and a third holds the
//! immutable source positions. Each step dispatches one 8x8-workgroup pass
//! that reads the current slot and writes the other.

use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::error::GpuError;
use crate::frame::SimulationStage;
use crate::pingpong::{PingPong, Slot};
use crate::shader::{flow_field_shader, FLOW_FIELD_WORKGROUP};
use crate::state::{StateTexture, TEXEL_BYTES};
use crate::uniforms::SimulationUniforms;

pub const STATE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// One side of the ping-pong pair.
pub struct StateSlot {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl StateSlot {
    fn new(device: &wgpu::Device, queue: &wgpu::Queue, state: &StateTexture, label: &str) -> Self {
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: state.extent(),
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: STATE_FORMAT,
                usage: wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::STORAGE_BINDING
                    | wgpu::TextureUsages::COPY_DST
                    | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            state.as_bytes(),
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// GPU flow-field simulation.
pub struct GpuSimulation {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    slots: PingPong<StateSlot>,
    /// Source positions; respawned particles return here.
    _base: StateSlot,
    uniform_buffer: wgpu::Buffer,
    pipeline: wgpu::ComputePipeline,
    /// `bind_groups[i]` reads slot `i` and writes the other.
    bind_groups: [wgpu::BindGroup; 2],
    size: u32,
    count: usize,
}

impl GpuSimulation {
    /// Upload `initial` into both slots and the base texture.
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        initial: &StateTexture,
        uniforms: &SimulationUniforms,
    ) -> Self {
        let slots = PingPong::new(
            StateSlot::new(&device, &queue, initial, "State Texture A"),
            StateSlot::new(&device, &queue, initial, "State Texture B"),
        );
        let base = StateSlot::new(&device, &queue, initial, "Base State Texture");

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Simulation Uniform Buffer"),
            contents: bytemuck::bytes_of(uniforms),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let read_texture = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Flow Field Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                read_texture(1),
                read_texture(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: STATE_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
            ],
        });

        let bind_group = |read: Slot| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Flow Field Bind Group"),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&base.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&slots.get(read).view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(&slots.get(read.other()).view),
                    },
                ],
            })
        };
        let bind_groups = [bind_group(Slot::A), bind_group(Slot::B)];

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Flow Field Shader"),
            source: wgpu::ShaderSource::Wgsl(flow_field_shader().into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Flow Field Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Flow Field Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        log::debug!(
            "flow field stage ready: {} particles in a {}x{} state texture",
            initial.count(),
            initial.size(),
            initial.size()
        );

        Self {
            device,
            queue,
            slots,
            _base: base,
            uniform_buffer,
            pipeline,
            bind_groups,
            size: initial.size(),
            count: initial.count(),
        }
    }

    /// Texture view of `slot`.
    pub fn view(&self, slot: Slot) -> &wgpu::TextureView {
        &self.slots.get(slot).view
    }

    /// Views of both slots, indexed by [`Slot::index`].
    pub fn views(&self) -> [&wgpu::TextureView; 2] {
        [self.view(Slot::A), self.view(Slot::B)]
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Workgroups per dimension for one dispatch.
    pub fn workgroups(&self) -> u32 {
        self.size.div_ceil(FLOW_FIELD_WORKGROUP)
    }

    /// Copy the current slot back to the host.
    ///
    /// Blocks until every submitted step has finished.
    pub fn read_state(&self) -> Result<StateTexture, GpuError> {
        let row_bytes = self.size * TEXEL_BYTES;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_row_bytes = row_bytes.div_ceil(align) * align;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("State Readback Buffer"),
            size: (padded_row_bytes * self.size) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("State Readback Encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.slots.front().texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row_bytes),
                    rows_per_image: Some(self.size),
                },
            },
            wgpu::Extent3d {
                width: self.size,
                height: self.size,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv().map_err(|_| GpuError::ReadbackAborted)??;

        let mut state = StateTexture::zeroed(self.count);
        {
            let data = slice.get_mapped_range();
            let texels = state.texels_mut();
            for (row, bytes) in data.chunks_exact(padded_row_bytes as usize).enumerate() {
                let start = row * self.size as usize;
                let dst: &mut [u8] = bytemuck::cast_slice_mut(&mut texels[start..start + self.size as usize]);
                dst.copy_from_slice(&bytes[..row_bytes as usize]);
            }
        }
        staging.unmap();

        Ok(state)
    }
}

impl SimulationStage for GpuSimulation {
    fn step(&mut self) {
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Flow Field Encoder"),
        });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Flow Field Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.bind_groups[self.slots.current().index()], &[]);
            let groups = self.workgroups();
            pass.dispatch_workgroups(groups, groups, 1);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        self.slots.swap();
    }

    fn current(&self) -> Slot {
        self.slots.current()
    }

    fn steps(&self) -> u64 {
        self.slots.steps()
    }

    fn write_uniforms(&mut self, uniforms: &SimulationUniforms) {
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }
}
