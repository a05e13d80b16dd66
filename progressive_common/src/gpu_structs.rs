use glam::{Mat4, Vec3};
use crate::material::Material;
use crate::sphere::ResolvedSphere;

// every record below is tightly packed f32/u32 data with 4-byte alignment,
// the kernel reads them as flat word arrays so the strides must match exactly

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GPUSphere {
    position: [f32; 3],
    radius: f32,
    albedo: [f32; 3],
    specular: [f32; 3],
    smoothness: f32,
    emission: [f32; 3],
}

impl GPUSphere {
    pub const STRIDE: usize = 56;

    pub fn pack(sphere: &ResolvedSphere) -> Self {
        let m = &sphere.material;
        Self {
            position: sphere.position.to_array(),
            radius: sphere.radius,
            albedo: m.albedo.to_array(),
            specular: m.specular.to_array(),
            smoothness: m.smoothness,
            emission: m.emission.to_array(),
        }
    }

    pub fn unpack(&self) -> ResolvedSphere {
        ResolvedSphere {
            position: Vec3::from_array(self.position),
            radius: self.radius,
            material: Material {
                albedo: Vec3::from_array(self.albedo),
                specular: Vec3::from_array(self.specular),
                smoothness: self.smoothness,
                emission: Vec3::from_array(self.emission),
            },
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GPUIndexedSphere {
    position: [f32; 3],
    radius: f32,
    material_idx: u32,
}

impl GPUIndexedSphere {
    pub const STRIDE: usize = 20;

    pub fn new(position: Vec3, radius: f32, material_idx: u32) -> Self {
        Self { position: position.to_array(), radius, material_idx }
    }

    pub fn position(&self) -> Vec3 { Vec3::from_array(self.position) }
    pub fn radius(&self) -> f32 { self.radius }
    pub fn material_idx(&self) -> u32 { self.material_idx }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GPUMaterial {
    albedo: [f32; 3],
    specular: [f32; 3],
    smoothness: f32,
    emission: [f32; 3],
}

impl GPUMaterial {
    pub const STRIDE: usize = 40;

    pub fn pack(material: &Material) -> Self {
        Self {
            albedo: material.albedo.to_array(),
            specular: material.specular.to_array(),
            smoothness: material.smoothness,
            emission: material.emission.to_array(),
        }
    }

    pub fn unpack(&self) -> Material {
        Material {
            albedo: Vec3::from_array(self.albedo),
            specular: Vec3::from_array(self.specular),
            smoothness: self.smoothness,
            emission: Vec3::from_array(self.emission),
        }
    }
}

// uniform block, std140-compatible: matrices first, then 16-byte rows
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GPUKernelParameters {
    camera_to_world: [[f32; 4]; 4],
    camera_inverse_projection: [[f32; 4]; 4],
    directional_light: [f32; 4],
    pixel_offset: [f32; 2],
    seed: f32,
    max_bounces: u32,
    resolution: [u32; 2],
    num_spheres: u32,
    _buffer: u32,
}

impl GPUKernelParameters {
    pub fn get_gpu_kernel_params(params: &KernelParameters) -> Self {
        Self {
            camera_to_world: params.camera_to_world.to_cols_array_2d(),
            camera_inverse_projection: params.camera_inverse_projection.to_cols_array_2d(),
            directional_light: params.directional_light.extend(params.light_intensity).to_array(),
            pixel_offset: params.pixel_offset,
            seed: params.seed,
            // 0 tells the kernel to use its built-in bounce limit
            max_bounces: params.max_bounces.unwrap_or(0),
            resolution: params.resolution,
            num_spheres: params.num_spheres,
            _buffer: 0,
        }
    }

    pub fn num_spheres(&self) -> u32 { self.num_spheres }
    pub fn max_bounces(&self) -> u32 { self.max_bounces }
    pub fn seed(&self) -> f32 { self.seed }
}

// host-side view of everything bound to the trace kernel for one dispatch
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct KernelParameters {
    pub camera_to_world: Mat4,
    pub camera_inverse_projection: Mat4,
    pub pixel_offset: [f32; 2],
    pub directional_light: Vec3,
    pub light_intensity: f32,
    pub seed: f32,
    pub max_bounces: Option<u32>,
    pub resolution: [u32; 2],
    pub num_spheres: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn record_strides() {
        assert_eq!(size_of::<GPUSphere>(), GPUSphere::STRIDE);
        assert_eq!(size_of::<GPUIndexedSphere>(), GPUIndexedSphere::STRIDE);
        assert_eq!(size_of::<GPUMaterial>(), GPUMaterial::STRIDE);
        assert_eq!(size_of::<GPUKernelParameters>() % 16, 0);
        assert_eq!(size_of::<GPUKernelParameters>(), 176);
    }

    #[test]
    fn sphere_record_field_order() {
        let sphere = ResolvedSphere {
            position: Vec3::new(1.0, 2.0, 3.0),
            radius: 4.0,
            material: Material {
                albedo: Vec3::new(5.0, 6.0, 7.0),
                specular: Vec3::new(8.0, 9.0, 10.0),
                smoothness: 11.0,
                emission: Vec3::new(12.0, 13.0, 14.0),
            },
        };
        let packed = GPUSphere::pack(&sphere);
        let words: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&packed));
        let expected: Vec<f32> = (1..=14).map(|i| i as f32).collect();
        assert_eq!(words, expected.as_slice());
    }

    #[test]
    fn default_bounces_encode_as_zero() {
        let params = KernelParameters {
            camera_to_world: Mat4::IDENTITY,
            camera_inverse_projection: Mat4::IDENTITY,
            pixel_offset: [0.25, 0.75],
            directional_light: Vec3::NEG_Y,
            light_intensity: 1.5,
            seed: 0.5,
            max_bounces: None,
            resolution: [640, 480],
            num_spheres: 0,
        };
        let gpu = GPUKernelParameters::get_gpu_kernel_params(&params);
        assert_eq!(gpu.max_bounces(), 0);
        assert_eq!(gpu.directional_light, [0.0, -1.0, 0.0, 1.5]);

        let gpu = GPUKernelParameters::get_gpu_kernel_params(
            &KernelParameters { max_bounces: Some(3), ..params });
        assert_eq!(gpu.max_bounces(), 3);
    }
}
