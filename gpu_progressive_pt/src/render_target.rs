use progressive_common::error::{RenderError, Result};
use progressive_common::parameters::ViewportSize;
use wgpu::{BindGroupLayoutEntry, BindingType, Device, ShaderStages, StorageTextureAccess, TextureFormat, TextureView};

// float-precision, linear 2D image the kernels read and write
pub struct GPUTexture {
    texture: wgpu::Texture,
    view: TextureView,
    size: ViewportSize,
}

impl GPUTexture {
    pub const FORMAT: TextureFormat = TextureFormat::Rgba32Float;

    pub fn new(device: &Device, label: &str, size: ViewportSize) -> Result<Self> {
        let max = device.limits().max_texture_dimension_2d;
        if size.width > max || size.height > max {
            return Err(RenderError::allocation(label,
                format!("{}x{} exceeds the device limit of {max}", size.width, size.height)));
        }

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let validation = pollster::block_on(device.pop_error_scope());
        let out_of_memory = pollster::block_on(device.pop_error_scope());
        if let Some(error) = out_of_memory.or(validation) {
            texture.destroy();
            return Err(RenderError::allocation(label, error.to_string()));
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(Self { texture, view, size })
    }

    pub fn view(&self) -> &TextureView {
        &self.view
    }

    pub fn size(&self) -> ViewportSize {
        self.size
    }

    pub fn destroy(self) {
        self.texture.destroy();
    }

    pub fn storage_layout(binding: u32, access: StorageTextureAccess) -> BindGroupLayoutEntry {
        BindGroupLayoutEntry {
            binding,
            visibility: ShaderStages::COMPUTE,
            ty: BindingType::StorageTexture {
                access,
                format: Self::FORMAT,
                view_dimension: wgpu::TextureViewDimension::D2,
            },
            count: None,
        }
    }

    // Rgba32Float is not filterable, readers use textureLoad
    pub fn sampled_layout(binding: u32, visibility: ShaderStages) -> BindGroupLayoutEntry {
        BindGroupLayoutEntry {
            binding,
            visibility,
            ty: BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
            },
            count: None,
        }
    }
}
