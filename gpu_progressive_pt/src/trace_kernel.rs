use progressive_common::error::{RenderError, Result};
use progressive_common::parameters::{KernelStrides, PrimitiveLayout};
use wgpu::{BindGroupDescriptor, BindGroupLayout, BindGroupLayoutDescriptor, ComputePipeline, Device, Queue, ShaderStages};
use crate::gpu_buffer::GPUBuffer;
use crate::render_target::GPUTexture;
use crate::skybox::Skybox;

pub const TRACE_ENTRY_POINT: &str = "trace";

const TRACE_COMMON: &str = include_str!("../shaders/trace_common.wgsl");
const SPHERES_INLINE: &str = include_str!("../shaders/spheres_inline.wgsl");
const SPHERES_INDEXED: &str = include_str!("../shaders/spheres_indexed.wgsl");

fn layout_source(layout: PrimitiveLayout) -> &'static str {
    match layout {
        PrimitiveLayout::InlineMaterial => SPHERES_INLINE,
        PrimitiveLayout::IndexedMaterial => SPHERES_INDEXED,
    }
}

// full kernel: the layout file first, then the shared tracer
pub fn kernel_source(layout: PrimitiveLayout) -> String {
    [layout_source(layout), "\n", TRACE_COMMON].concat()
}

// reads `const NAME: u32 = 14u;` out of WGSL source
fn declared_words(source: &str, name: &str) -> Option<usize> {
    let prefix = format!("const {name}: u32 =");
    source
        .lines()
        .find_map(|line| line.trim().strip_prefix(prefix.as_str()))
        .and_then(|rest| rest.trim().trim_end_matches(';').trim_end_matches('u').parse().ok())
}

// record strides as the compiled kernel indexes them
pub fn kernel_strides(layout: PrimitiveLayout) -> KernelStrides {
    let source = layout_source(layout);
    KernelStrides {
        sphere: declared_words(source, "SPHERE_WORDS").unwrap_or(0) * 4,
        material: declared_words(source, "MATERIAL_WORDS").map(|words| words * 4),
    }
}

pub struct TraceKernel {
    layout: PrimitiveLayout,
    strides: KernelStrides,
    frame_bind_group_layout: BindGroupLayout,
    scene_bind_group_layout: BindGroupLayout,
    pipeline: ComputePipeline,
}

impl TraceKernel {
    pub fn new(device: &Device, layout: PrimitiveLayout) -> Result<Self> {
        let source = kernel_source(layout);
        if !source.contains(&format!("fn {TRACE_ENTRY_POINT}(")) {
            return Err(RenderError::MissingEntryPoint(TRACE_ENTRY_POINT.to_string()));
        }

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("trace kernel"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        // group 0 is per frame: output target, skybox and parameters
        let frame_bind_group_layout = device.create_bind_group_layout(
            &BindGroupLayoutDescriptor {
                label: Some("trace frame bind group layout"),
                entries: &[
                    GPUTexture::storage_layout(0, wgpu::StorageTextureAccess::WriteOnly),
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 3,
                        visibility: ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        // group 1 is the scene, one or two storage buffers depending on layout
        let storage = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let scene_entries = match layout {
            PrimitiveLayout::InlineMaterial => vec![storage(0)],
            PrimitiveLayout::IndexedMaterial => vec![storage(0), storage(1)],
        };
        let scene_bind_group_layout = device.create_bind_group_layout(
            &BindGroupLayoutDescriptor {
                label: Some("trace scene bind group layout"),
                entries: &scene_entries,
            });

        let pipeline_layout = device.create_pipeline_layout(
            &wgpu::PipelineLayoutDescriptor {
                label: Some("trace kernel pipeline layout"),
                bind_group_layouts: &[
                    &frame_bind_group_layout,
                    &scene_bind_group_layout,
                ],
                push_constant_ranges: &[],
            }
        );

        let pipeline = device.create_compute_pipeline(
            &wgpu::ComputePipelineDescriptor {
                label: Some("trace kernel pipeline"),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: TRACE_ENTRY_POINT,
                compilation_options: Default::default(),
                cache: None,
            }
        );

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::MissingEntryPoint(format!("{TRACE_ENTRY_POINT}: {error}")));
        }

        Ok(Self {
            layout,
            strides: kernel_strides(layout),
            frame_bind_group_layout,
            scene_bind_group_layout,
            pipeline,
        })
    }

    pub fn strides(&self) -> KernelStrides {
        self.strides
    }

    // bind groups are rebuilt per dispatch since targets and scene buffers
    // can be recreated between any two frames
    #[allow(clippy::too_many_arguments)]
    pub fn run(&self,
               device: &Device,
               queue: &Queue,
               output: &GPUTexture,
               skybox: &Skybox,
               parameters: &GPUBuffer,
               spheres: &GPUBuffer,
               materials: Option<&GPUBuffer>,
               workgroups: (u32, u32)) -> Result<()> {
        let frame_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("trace frame bind group"),
            layout: &self.frame_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(output.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(skybox.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(skybox.sampler()),
                },
                parameters.binding(3),
            ],
        });

        let scene_entries = match (self.layout, materials) {
            (PrimitiveLayout::InlineMaterial, _) => vec![spheres.binding(0)],
            (PrimitiveLayout::IndexedMaterial, Some(materials)) => vec![spheres.binding(0), materials.binding(1)],
            (PrimitiveLayout::IndexedMaterial, None) => {
                return Err(RenderError::allocation("material buffer", "indexed layout dispatched without one"));
            }
        };
        let scene_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("trace scene bind group"),
            layout: &self.scene_bind_group_layout,
            entries: &scene_entries,
        });

        let mut encoder = device.create_command_encoder(
            &wgpu::CommandEncoderDescriptor {
                label: Some("trace kernel encoder"),
            });

        {
            let mut trace_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("trace pass"),
                timestamp_writes: None,
            });
            trace_pass.set_pipeline(&self.pipeline);
            trace_pass.set_bind_group(0, &frame_bind_group, &[]);
            trace_pass.set_bind_group(1, &scene_bind_group, &[]);
            trace_pass.dispatch_workgroups(workgroups.0, workgroups.1, 1);
        }
        queue.submit(Some(encoder.finish()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use progressive_common::gpu_structs::{GPUIndexedSphere, GPUMaterial, GPUSphere};

    #[test]
    fn strides_match_packed_records() {
        assert_eq!(kernel_strides(PrimitiveLayout::InlineMaterial),
                   KernelStrides { sphere: GPUSphere::STRIDE, material: None });
        assert_eq!(kernel_strides(PrimitiveLayout::IndexedMaterial),
                   KernelStrides { sphere: GPUIndexedSphere::STRIDE, material: Some(GPUMaterial::STRIDE) });
        for layout in [PrimitiveLayout::InlineMaterial, PrimitiveLayout::IndexedMaterial] {
            assert_eq!(kernel_strides(layout), layout.kernel_strides());
        }
    }

    #[test]
    fn parses_word_constants() {
        let source = "// header\nconst SPHERE_WORDS: u32 = 14u;\n  const MATERIAL_WORDS: u32 = 10u;\n";
        assert_eq!(declared_words(source, "SPHERE_WORDS"), Some(14));
        assert_eq!(declared_words(source, "MATERIAL_WORDS"), Some(10));
        assert_eq!(declared_words(source, "OTHER_WORDS"), None);
    }

    #[test]
    fn both_layouts_carry_entry_point_and_loader() {
        for layout in [PrimitiveLayout::InlineMaterial, PrimitiveLayout::IndexedMaterial] {
            let source = kernel_source(layout);
            assert!(source.contains(&format!("fn {TRACE_ENTRY_POINT}(")));
            assert!(source.contains("fn load_sphere("));
        }
        assert!(kernel_source(PrimitiveLayout::IndexedMaterial).contains("@binding(1) var<storage, read> materials"));
        assert!(!kernel_source(PrimitiveLayout::InlineMaterial).contains("materials"));
    }
}
