mod app;
mod camera_controller;
mod composite_kernel;
mod display;
mod frames_per_second;
mod gpu_buffer;
mod gpu_device;
mod render_target;
mod skybox;
mod trace_kernel;
mod wgpu_state;

use glam::Vec3;
use winit::error::EventLoopError;
use winit::event_loop::{ControlFlow, EventLoop};
use progressive_common::camera::{Camera, Lens};
use progressive_common::parameters::{AccumulationConfig, PrimitiveLayout, RenderParameters};
use progressive_common::scene::{RandomSceneParameters, Scene};

use crate::app::App;

fn main() -> Result<(), EventLoopError> {
    env_logger::init();

    // usage: gpu_progressive_pt [random] [indexed] [single-target]
    let args: Vec<String> = std::env::args().skip(1).collect();
    let has = |flag: &str| args.iter().any(|a| a == flag);

    let (scene, camera) = if has("random") {
        (Scene::random(&RandomSceneParameters::default()),
         Camera::new(Vec3::new(0.0, 40.0, -160.0), Vec3::ZERO))
    } else {
        (Scene::four_spheres(), Camera::demo_camera())
    };

    let accumulation = AccumulationConfig {
        maintain_separate_converged_buffer: !has("single-target"),
        primitive_layout: if has("indexed") {
            PrimitiveLayout::IndexedMaterial
        } else {
            PrimitiveLayout::InlineMaterial
        },
        ..Default::default()
    };

    let screen_size = (1920, 1080);
    let render_parameters = RenderParameters::new(camera, Lens::default(), screen_size)
        .with_accumulation(accumulation);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(scene, render_parameters);
    event_loop.run_app(&mut app)
}
