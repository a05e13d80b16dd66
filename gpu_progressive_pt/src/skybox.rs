use glam::Vec3;
use wgpu::{Device, Queue, Sampler, TextureView};

// equirectangular environment the kernel falls back to when a ray escapes
pub struct Skybox {
    view: TextureView,
    sampler: Sampler,
}

impl Skybox {
    pub const WIDTH: u32 = 512;
    pub const HEIGHT: u32 = 256;

    pub fn new(device: &Device, queue: &Queue) -> Self {
        let size = wgpu::Extent3d {
            width: Self::WIDTH,
            height: Self::HEIGHT,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("skybox texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let pixels = sky_pixels(Self::WIDTH, Self::HEIGHT);
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(pixels.as_slice()),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * Self::WIDTH),
                rows_per_image: Some(Self::HEIGHT),
            },
            size,
        );

        // the kernel maps directions to negative coordinates, repeat wraps them
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("skybox sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            sampler,
        }
    }

    pub fn view(&self) -> &TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }
}

// row v of the texture is looked up for directions with y = -cos(pi * v),
// so the last rows are the zenith and the first ones the ground
pub fn sky_pixels(width: u32, height: u32) -> Vec<[u8; 4]> {
    let horizon = Vec3::new(0.9, 0.95, 1.0);
    let zenith = Vec3::new(0.3, 0.5, 0.9);
    let ground = Vec3::new(0.35, 0.3, 0.25);

    let mut pixels = Vec::with_capacity((width * height) as usize);
    for row in 0..height {
        let v = (row as f32 + 0.5) / height as f32;
        let y = -(std::f32::consts::PI * v).cos();
        let color = if y >= 0.0 {
            horizon.lerp(zenith, y.sqrt())
        } else {
            ground * (1.0 + 0.5 * y)
        };
        let texel = to_rgba8(color);
        pixels.extend(std::iter::repeat(texel).take(width as usize));
    }
    pixels
}

fn to_rgba8(color: Vec3) -> [u8; 4] {
    let c = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    [c.x as u8, c.y as u8, c.z as u8, 255]
}
