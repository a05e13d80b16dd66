use glam::Vec3;
use crate::camera::{Camera, Lens};
use crate::gpu_structs::{GPUIndexedSphere, GPUMaterial, GPUSphere};

// edge of the square thread tile the trace kernel is compiled with
pub const TILE_SIZE: u32 = 8;
// bounce limit the kernel falls back to when none is bound
pub const DEFAULT_MAX_BOUNCES: u32 = 8;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }

    pub fn workgroups(&self, tile: u32) -> (u32, u32) {
        (self.width.div_ceil(tile), self.height.div_ceil(tile))
    }
}

impl From<(u32, u32)> for ViewportSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveLayout {
    // one 56-byte record per sphere with the material fields inline
    InlineMaterial,
    // 20-byte sphere records indexing a separate table of 40-byte materials
    IndexedMaterial,
}

impl PrimitiveLayout {
    pub fn sphere_stride(&self) -> usize {
        match self {
            PrimitiveLayout::InlineMaterial => GPUSphere::STRIDE,
            PrimitiveLayout::IndexedMaterial => GPUIndexedSphere::STRIDE,
        }
    }

    pub fn material_stride(&self) -> Option<usize> {
        match self {
            PrimitiveLayout::InlineMaterial => None,
            PrimitiveLayout::IndexedMaterial => Some(GPUMaterial::STRIDE),
        }
    }

    pub fn kernel_strides(&self) -> KernelStrides {
        KernelStrides { sphere: self.sphere_stride(), material: self.material_stride() }
    }
}

// record strides a compiled kernel reads its scene buffers with
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KernelStrides {
    pub sphere: usize,
    pub material: Option<usize>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AccumulationConfig {
    // keep a float running-average target between the kernel output and the
    // presented surface; when false the raw sample is blended straight into the
    // surface, which is only exact if the surface keeps its previous contents
    pub maintain_separate_converged_buffer: bool,
    pub max_bounces: Option<u32>,
    pub primitive_layout: PrimitiveLayout,
    // fixes the pixel-offset and seed streams, mostly for tests
    pub rng_seed: Option<u64>,
}

impl Default for AccumulationConfig {
    fn default() -> Self {
        Self {
            maintain_separate_converged_buffer: true,
            max_bounces: Some(DEFAULT_MAX_BOUNCES),
            primitive_layout: PrimitiveLayout::InlineMaterial,
            rng_seed: None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self { direction: Vec3::new(-0.3, -1.0, 0.4).normalize(), intensity: 1.0 }
    }
}

// everything the application starts from
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderParameters {
    pub accumulation: AccumulationConfig,
    pub viewport_size: ViewportSize,
    pub camera: Camera,
    pub lens: Lens,
    pub light: DirectionalLight,
    pub speed: f32,
    pub sensitivity: f32,
}

impl RenderParameters {
    pub fn new(camera: Camera, lens: Lens, viewport_size: impl Into<ViewportSize>) -> Self {
        Self {
            accumulation: AccumulationConfig::default(),
            viewport_size: viewport_size.into(),
            camera,
            lens,
            light: DirectionalLight::default(),
            speed: 4.0,
            sensitivity: 1.0,
        }
    }

    pub fn with_accumulation(mut self, accumulation: AccumulationConfig) -> Self {
        self.accumulation = accumulation;
        self
    }
}
