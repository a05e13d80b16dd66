use std::mem::size_of;
use progressive_common::accumulation::blend_weight;
use wgpu::{BindGroupDescriptor, BindGroupLayout, BindGroupLayoutDescriptor, BufferUsages, ComputePipeline, Device, Queue, ShaderStages};
use crate::gpu_buffer::GPUBuffer;
use crate::render_target::GPUTexture;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GPUCompositeParameters {
    weight: f32,
    sample: u32,
    _buffer: [u32; 2],
}

impl GPUCompositeParameters {
    pub fn new(sample: u32) -> Self {
        Self { weight: blend_weight(sample), sample, _buffer: [0; 2] }
    }
}

// blends the raw kernel output into the converged running average
pub struct CompositeKernel {
    bind_group_layout: BindGroupLayout,
    parameters_buffer: GPUBuffer,
    pipeline: ComputePipeline,
}

impl CompositeKernel {
    pub fn new(device: &Device) -> Self {
        let shader = device.create_shader_module(
            wgpu::include_wgsl!("../shaders/composite.wgsl"));

        let parameters_buffer = GPUBuffer::new(device,
                                               BufferUsages::UNIFORM,
                                               1,
                                               size_of::<GPUCompositeParameters>(),
                                               Some("composite parameters buffer"));

        let bind_group_layout = device.create_bind_group_layout(
            &BindGroupLayoutDescriptor {
                label: Some("composite bind group layout"),
                entries: &[
                    GPUTexture::sampled_layout(0, ShaderStages::COMPUTE),
                    GPUTexture::storage_layout(1, wgpu::StorageTextureAccess::ReadWrite),
                    parameters_buffer.layout(ShaderStages::COMPUTE, 2, true),
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(
            &wgpu::PipelineLayoutDescriptor {
                label: Some("composite kernel pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            }
        );

        let pipeline = device.create_compute_pipeline(
            &wgpu::ComputePipelineDescriptor {
                label: Some("composite kernel pipeline"),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: "main",
                compilation_options: Default::default(),
                cache: None,
            }
        );

        Self {
            bind_group_layout,
            parameters_buffer,
            pipeline,
        }
    }

    pub fn run(&self,
               device: &Device,
               queue: &Queue,
               raw: &GPUTexture,
               converged: &GPUTexture,
               sample: u32,
               workgroups: (u32, u32)) {
        let parameters = GPUCompositeParameters::new(sample);
        self.parameters_buffer.queue_for_gpu(queue, bytemuck::cast_slice(&[parameters]));

        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("composite bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(raw.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(converged.view()),
                },
                self.parameters_buffer.binding(2),
            ],
        });

        let mut encoder = device.create_command_encoder(
            &wgpu::CommandEncoderDescriptor {
                label: Some("composite kernel encoder"),
            });

        {
            let mut composite_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("composite pass"),
                timestamp_writes: None,
            });
            composite_pass.set_pipeline(&self.pipeline);
            composite_pass.set_bind_group(0, &bind_group, &[]);
            composite_pass.dispatch_workgroups(workgroups.0, workgroups.1, 1);
        }
        queue.submit(Some(encoder.finish()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_block_is_16_bytes() {
        assert_eq!(size_of::<GPUCompositeParameters>(), 16);
    }

    #[test]
    fn first_sample_replaces() {
        assert_eq!(GPUCompositeParameters::new(0).weight, 1.0);
        assert_eq!(GPUCompositeParameters::new(4).weight, 0.2);
    }
}
