use crate::error::Result;
use crate::gpu_structs::KernelParameters;
use crate::parameters::{KernelStrides, ViewportSize};

// the resources one trace dispatch reads and writes, borrowed for that call only
pub struct KernelBindings<'a, D: RenderDevice + ?Sized> {
    pub output: &'a D::Texture,
    pub spheres: &'a D::Buffer,
    pub materials: Option<&'a D::Buffer>,
}

// Everything the accumulation controller needs from the GPU.
//
// Handles are owned by whoever created them and are given back through the
// matching `release_*` call. Callers must `wait_idle` before releasing
// anything a submitted dispatch may still read.
pub trait RenderDevice {
    type Texture;
    type Buffer;

    // float-precision, linear, GPU-writable 2D target
    fn create_target(&mut self, label: &str, size: ViewportSize) -> Result<Self::Texture>;
    fn release_target(&mut self, target: Self::Texture);

    fn create_structured_buffer(&mut self, label: &str, count: usize, stride: usize)
        -> Result<Self::Buffer>;
    fn release_buffer(&mut self, buffer: Self::Buffer);
    fn upload(&mut self, buffer: &Self::Buffer, data: &[u8]);

    // blocks until every submitted command has completed
    fn wait_idle(&mut self);

    // record strides the compiled kernel expects
    fn kernel_strides(&self) -> KernelStrides;

    fn dispatch(&mut self,
                params: &KernelParameters,
                bindings: KernelBindings<'_, Self>,
                workgroups: (u32, u32)) -> Result<()>;

    // blend `raw` into the running average with weight 1 / (sample + 1);
    // with no converged target the blend goes straight into the surface
    fn composite(&mut self, raw: &Self::Texture, converged: Option<&Self::Texture>, sample: u32)
        -> Result<()>;

    fn present(&mut self, converged: Option<&Self::Texture>) -> Result<()>;
}
