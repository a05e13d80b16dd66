pub mod accumulation;
pub mod camera;
pub mod change_detector;
pub mod device;
pub mod error;
pub mod frame_buffer;
pub mod gpu_structs;
pub mod material;
pub mod parameters;
pub mod projection_matrix;
pub mod scene;
pub mod scene_buffer;
pub mod sphere;
pub mod util_funcs;

#[cfg(test)]
mod test_device;
