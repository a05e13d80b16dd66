use std::mem::size_of;
use std::sync::Arc;
use log::{debug, info, warn};
use progressive_common::device::{KernelBindings, RenderDevice};
use progressive_common::error::{RenderError, Result};
use progressive_common::gpu_structs::{GPUKernelParameters, KernelParameters};
use progressive_common::parameters::{AccumulationConfig, KernelStrides, ViewportSize, TILE_SIZE};
use wgpu::BufferUsages;
use winit::window::Window;
use crate::composite_kernel::CompositeKernel;
use crate::display::{DisplayKernel, DisplayMode};
use crate::gpu_buffer::GPUBuffer;
use crate::render_target::GPUTexture;
use crate::skybox::Skybox;
use crate::trace_kernel::TraceKernel;
use crate::wgpu_state::WgpuState;

// RenderDevice on top of wgpu: one trace dispatch, one composite and one
// display pass per frame, each submitted on its own
pub struct WgpuRenderDevice<'a> {
    wgpu_state: WgpuState<'a>,
    trace_kernel: TraceKernel,
    composite_kernel: Option<CompositeKernel>,
    display_kernel: DisplayKernel,
    skybox: Skybox,
    parameters_buffer: GPUBuffer,
    // surface texture drawn by the single target composite, shown by present
    pending_frame: Option<wgpu::SurfaceTexture>,
}

impl<'a> WgpuRenderDevice<'a> {
    pub fn new(window: Arc<Window>, config: &AccumulationConfig) -> Result<Self> {
        let separate_converged = config.maintain_separate_converged_buffer;
        let wgpu_state = WgpuState::new(window, separate_converged)?;
        let device = wgpu_state.device();

        let trace_kernel = TraceKernel::new(device, config.primitive_layout)?;
        let composite_kernel = separate_converged.then(|| CompositeKernel::new(device));
        if !separate_converged {
            warn!("blending samples straight into the surface, only exact if the swapchain keeps its contents");
        }
        let display_kernel = DisplayKernel::new(device, wgpu_state.surface_format());
        let skybox = Skybox::new(device, wgpu_state.queue());
        let parameters_buffer = GPUBuffer::new(device,
                                               BufferUsages::UNIFORM,
                                               1,
                                               size_of::<GPUKernelParameters>(),
                                               Some("kernel parameters buffer"));
        info!("render device ready ({:?}, max bounces {:?})", config.primitive_layout, config.max_bounces);

        Ok(Self {
            wgpu_state,
            trace_kernel,
            composite_kernel,
            display_kernel,
            skybox,
            parameters_buffer,
            pending_frame: None,
        })
    }

    pub fn resize(&mut self, size: ViewportSize) {
        // a frame acquired at the old size must not be presented
        self.pending_frame = None;
        self.wgpu_state.resize(size);
    }

    fn acquire_frame(&self) -> Result<wgpu::SurfaceTexture> {
        match self.wgpu_state.surface().get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.wgpu_state.reconfigure();
                self.wgpu_state.surface()
                    .get_current_texture()
                    .map_err(|e| RenderError::Presentation(e.to_string()))
            }
            Err(e) => Err(RenderError::Presentation(e.to_string())),
        }
    }

    fn present_image(&self, image: &GPUTexture, mode: DisplayMode) -> Result<wgpu::SurfaceTexture> {
        let frame = self.acquire_frame()?;
        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.display_kernel.run(self.wgpu_state.device(), self.wgpu_state.queue(), image, &view, mode);
        Ok(frame)
    }
}

impl<'a> RenderDevice for WgpuRenderDevice<'a> {
    type Texture = GPUTexture;
    type Buffer = GPUBuffer;

    fn create_target(&mut self, label: &str, size: ViewportSize) -> Result<GPUTexture> {
        GPUTexture::new(self.wgpu_state.device(), label, size)
    }

    fn release_target(&mut self, target: GPUTexture) {
        target.destroy();
    }

    fn create_structured_buffer(&mut self, label: &str, count: usize, stride: usize) -> Result<GPUBuffer> {
        let device = self.wgpu_state.device();
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let buffer = GPUBuffer::new(device, BufferUsages::STORAGE, count, stride, Some(label));
        let validation = pollster::block_on(device.pop_error_scope());
        let out_of_memory = pollster::block_on(device.pop_error_scope());
        match out_of_memory.or(validation) {
            Some(error) => {
                buffer.destroy();
                Err(RenderError::allocation(label, error.to_string()))
            }
            None => {
                debug!("{label}: {} records of {} bytes, {} bytes total",
                       buffer.count(), buffer.stride(), buffer.size());
                Ok(buffer)
            }
        }
    }

    fn release_buffer(&mut self, buffer: GPUBuffer) {
        buffer.destroy();
    }

    fn upload(&mut self, buffer: &GPUBuffer, data: &[u8]) {
        buffer.queue_for_gpu(self.wgpu_state.queue(), data);
    }

    fn wait_idle(&mut self) {
        self.wgpu_state.device().poll(wgpu::Maintain::Wait);
    }

    fn kernel_strides(&self) -> KernelStrides {
        self.trace_kernel.strides()
    }

    fn dispatch(&mut self,
                params: &KernelParameters,
                bindings: KernelBindings<'_, Self>,
                workgroups: (u32, u32)) -> Result<()> {
        let gpu_params = GPUKernelParameters::get_gpu_kernel_params(params);
        self.parameters_buffer.queue_for_gpu(self.wgpu_state.queue(), bytemuck::cast_slice(&[gpu_params]));

        self.trace_kernel.run(self.wgpu_state.device(),
                              self.wgpu_state.queue(),
                              bindings.output,
                              &self.skybox,
                              &self.parameters_buffer,
                              bindings.spheres,
                              bindings.materials,
                              workgroups)
    }

    fn composite(&mut self, raw: &GPUTexture, converged: Option<&GPUTexture>, sample: u32) -> Result<()> {
        match (converged, &self.composite_kernel) {
            (Some(converged), Some(kernel)) => {
                kernel.run(self.wgpu_state.device(),
                           self.wgpu_state.queue(),
                           raw,
                           converged,
                           sample,
                           converged.size().workgroups(TILE_SIZE));
                Ok(())
            }
            (None, _) => {
                let frame = self.present_image(raw, DisplayMode::Accumulate(sample))?;
                self.pending_frame = Some(frame);
                Ok(())
            }
            (Some(_), None) => Err(RenderError::UnsupportedDevice(
                "converged target given to a device built without the composite kernel".to_string())),
        }
    }

    fn present(&mut self, converged: Option<&GPUTexture>) -> Result<()> {
        let frame = match converged {
            Some(converged) => self.present_image(converged, DisplayMode::Copy)?,
            None => self.pending_frame
                .take()
                .ok_or_else(|| RenderError::Presentation("nothing was composited this frame".to_string()))?,
        };
        frame.present();
        Ok(())
    }
}
