//! The integration kernel seam.
//!
//! The stepper only knows this narrow capability: hand over the per-tick
//! parameters and the four buffer bindings, dispatch over a 1-D grid of
//! thread-groups. The production implementation wraps the WGSL compute
//! pipeline; tests substitute host-side kernels.

use crate::simulation::buffers::FrameBuffers;
use crate::simulation::types::IntegrateParams;

pub(crate) trait IntegrateKernel {
    type Buffer;

    /// Enqueues one integration pass over `group_count` thread-groups,
    /// reading from the read bindings and writing the write bindings.
    /// Non-blocking: completion ordering is the execution queue's concern.
    fn dispatch(
        &mut self,
        params: &IntegrateParams,
        frame: FrameBuffers<'_, Self::Buffer>,
        group_count: u32,
    );
}

/// Damped, softened gravitational integrator running on the GPU.
pub(crate) struct BodyIntegrator {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params_buffer: wgpu::Buffer,
}

impl BodyIntegrator {
    pub(crate) fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Integrate Bodies Shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("../shaders/integrate_bodies.wgsl").into(),
            ),
        });

        let storage_entry = |binding: u32, read_only: bool| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Integrate Bind Group Layout"),
            entries: &[
                // params
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
                // read_pos, read_vel
                storage_entry(1, true),
                storage_entry(2, true),
                // write_pos, write_vel
                storage_entry(3, false),
                storage_entry(4, false),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Integrate Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Integrate Bodies Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader_module,
            entry_point: Some("integrate_bodies"),
            compilation_options: Default::default(),
            cache: None,
        });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Integrate Params Buffer"),
            size: std::mem::size_of::<IntegrateParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            device: device.clone(),
            queue: queue.clone(),
            pipeline,
            bind_group_layout,
            params_buffer,
        }
    }
}

impl IntegrateKernel for BodyIntegrator {
    type Buffer = wgpu::Buffer;

    fn dispatch(
        &mut self,
        params: &IntegrateParams,
        frame: FrameBuffers<'_, wgpu::Buffer>,
        group_count: u32,
    ) {
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(params));

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Integrate Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: frame.read_pos.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: frame.read_vel.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: frame.write_pos.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: frame.write_vel.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Integrate Command Encoder"),
            });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Integrate Compute Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.pipeline);
            compute_pass.set_bind_group(0, &bind_group, &[]);
            compute_pass.dispatch_workgroups(group_count, 1, 1);
        }

        self.queue.submit([encoder.finish()]);
    }
}
