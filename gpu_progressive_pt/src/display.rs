use std::mem::size_of;
use progressive_common::accumulation::blend_weight;
use wgpu::{BindGroupDescriptor, BindGroupLayout, BindGroupLayoutDescriptor, BufferUsages, Device, Queue, RenderPipeline, ShaderStages, TextureFormat, TextureView};
use crate::gpu_buffer::GPUBuffer;
use crate::render_target::GPUTexture;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct GPUDisplayParameters {
    weight: f32,
    _buffer: [f32; 3],
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DisplayMode {
    // overwrite the surface with the image
    Copy,
    // alpha-blend the image over the previous surface contents with 1 / (sample + 1)
    Accumulate(u32),
}

pub struct DisplayKernel {
    bind_group_layout: BindGroupLayout,
    parameters_buffer: GPUBuffer,
    copy_pipeline: RenderPipeline,
    accumulate_pipeline: RenderPipeline,
}

impl DisplayKernel {
    pub fn new(device: &Device, surface_format: TextureFormat) -> Self {
        let shader = device.create_shader_module(
            wgpu::include_wgsl!("../shaders/display.wgsl"));

        let parameters_buffer = GPUBuffer::new(device,
                                               BufferUsages::UNIFORM,
                                               1,
                                               size_of::<GPUDisplayParameters>(),
                                               Some("display parameters buffer"));

        let bind_group_layout = device.create_bind_group_layout(
            &BindGroupLayoutDescriptor {
                label: Some("display bind group layout"),
                entries: &[
                    GPUTexture::sampled_layout(0, ShaderStages::FRAGMENT),
                    parameters_buffer.layout(ShaderStages::FRAGMENT, 1, true),
                ],
            }
        );

        let pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("display pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipeline = |label, entry_point, blend| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs",
                    compilation_options: Default::default(),
                    buffers: &[],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point,
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: surface_format,
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState {
                    count: 1,
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
                cache: None,
            })
        };

        let copy_pipeline = pipeline("display copy pipeline", "fs", wgpu::BlendState::REPLACE);
        let accumulate_pipeline = pipeline("display accumulate pipeline", "fs_accumulate",
                                           wgpu::BlendState::ALPHA_BLENDING);

        Self {
            bind_group_layout,
            parameters_buffer,
            copy_pipeline,
            accumulate_pipeline,
        }
    }

    pub fn run(&self, device: &Device, queue: &Queue, image: &GPUTexture, target: &TextureView, mode: DisplayMode) {
        let (pipeline, weight, load) = match mode {
            DisplayMode::Copy => (&self.copy_pipeline, 1.0, wgpu::LoadOp::Clear(wgpu::Color::BLACK)),
            DisplayMode::Accumulate(sample) => (&self.accumulate_pipeline, blend_weight(sample), wgpu::LoadOp::Load),
        };
        let parameters = GPUDisplayParameters { weight, _buffer: [0.0; 3] };
        self.parameters_buffer.queue_for_gpu(queue, bytemuck::cast_slice(&[parameters]));

        let bind_group = device.create_bind_group(
            &BindGroupDescriptor {
                label: Some("display bind group"),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(image.view()),
                    },
                    self.parameters_buffer.binding(1),
                ],
            }
        );

        let mut encoder = device.create_command_encoder(
            &wgpu::CommandEncoderDescriptor {
                label: Some("display kernel encoder"),
            });

        {
            let mut display_pass = encoder.begin_render_pass(
                &wgpu::RenderPassDescriptor {
                    label: Some("display render pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });
            display_pass.set_pipeline(pipeline);
            display_pass.set_bind_group(0, &bind_group, &[]);
            display_pass.draw(0..6, 0..1);
        }
        queue.submit(Some(encoder.finish()));
    }
}
