use std::sync::Arc;
use log::info;
use progressive_common::error::{RenderError, Result};
use progressive_common::parameters::ViewportSize;
use winit::window::Window;

pub struct WgpuState<'a> {
    surface: wgpu::Surface<'a>,
    surface_config: wgpu::SurfaceConfiguration,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl<'a> WgpuState<'a> {
    pub fn new(window: Arc<Window>, storage_read_write: bool) -> Result<WgpuState<'a>> {
        pollster::block_on(WgpuState::new_async(window, storage_read_write))
    }

    async fn new_async(window: Arc<Window>, storage_read_write: bool) -> Result<WgpuState<'a>> {
        let size = {
            let viewport = window.inner_size();
            (viewport.width.max(1), viewport.height.max(1))
        };

        let instance = wgpu::Instance::new(
            wgpu::InstanceDescriptor {
                backends: wgpu::Backends::PRIMARY,
                ..Default::default()
            }
        );

        let surface = instance.create_surface(Arc::clone(&window))
            .map_err(|e| RenderError::UnsupportedDevice(format!("failed to create surface: {e}")))?;

        let adapter = instance.request_adapter(
            &wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            }
        ).await.ok_or_else(|| RenderError::UnsupportedDevice("no suitable adapter".to_string()))?;
        info!("using adapter {:?}", adapter.get_info().name);

        // the converged target is read and written by the same composite pass
        let mut required_features = wgpu::Features::empty();
        if storage_read_write {
            let flags = adapter.get_texture_format_features(wgpu::TextureFormat::Rgba32Float).flags;
            if !flags.contains(wgpu::TextureFormatFeatureFlags::STORAGE_READ_WRITE) {
                return Err(RenderError::UnsupportedDevice(
                    "adapter cannot read and write Rgba32Float storage textures".to_string()));
            }
            required_features |= wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;
        }

        let (device, queue) = adapter.request_device(
            &wgpu::DeviceDescriptor {
                required_features,
                required_limits: wgpu::Limits {
                    max_storage_buffer_binding_size: 1024_u32 << 20,
                    max_buffer_size: 1024_u64 << 20,
                    ..Default::default()
                },
                label: None,
                memory_hints: Default::default(),
            },
            None,
        ).await.map_err(|e| RenderError::UnsupportedDevice(format!("failed to create device: {e}")))?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities.formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| RenderError::UnsupportedDevice("surface has no formats".to_string()))?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.0,
            height: size.1,
            present_mode: surface_capabilities.present_modes[0],
            alpha_mode: surface_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 1,
        };
        surface.configure(&device, &surface_config);

        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
    pub fn surface(&self) -> &wgpu::Surface {
        &self.surface
    }

    pub fn resize(&mut self, new_size: ViewportSize) {
        // a minimized window reports 0x0, which the surface refuses
        if new_size.is_empty() {
            return;
        }
        self.surface_config.width = new_size.width;
        self.surface_config.height = new_size.height;
        self.surface.configure(&self.device, &self.surface_config);
    }

    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.surface_config);
    }
}
