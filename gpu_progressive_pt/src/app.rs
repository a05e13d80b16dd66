use std::sync::Arc;
use std::time::{Duration, Instant};
use log::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};
use progressive_common::accumulation::{AccumulationController, FrameContext};
use progressive_common::error::Result;
use progressive_common::parameters::{RenderParameters, ViewportSize};
use progressive_common::scene::Scene;
use crate::camera_controller::{CameraController, CAMERA_TRANSFORM, LIGHT_TRANSFORM};
use crate::frames_per_second::FramesPerSecond;
use crate::gpu_device::WgpuRenderDevice;

const STATUS_INTERVAL: Duration = Duration::from_secs(2);

pub struct App {
    // dropped before the window so the controller can still fence the device
    controller: Option<AccumulationController<WgpuRenderDevice<'static>>>,
    window: Option<Arc<Window>>,
    scene: Scene,
    render_parameters: RenderParameters,
    camera_controller: CameraController,
    last_render_time: Instant,
    last_status: Instant,
    frames_per_second: FramesPerSecond,
}

impl App {
    pub fn new(scene: Scene, render_parameters: RenderParameters) -> Self {
        let camera_controller = CameraController::new(render_parameters.camera,
                                                      render_parameters.lens,
                                                      render_parameters.light,
                                                      render_parameters.speed,
                                                      render_parameters.sensitivity,
                                                      render_parameters.viewport_size);
        Self {
            controller: None,
            window: None,
            scene,
            render_parameters,
            camera_controller,
            last_render_time: Instant::now(),
            last_status: Instant::now(),
            frames_per_second: FramesPerSecond::new(),
        }
    }

    fn start(&mut self, window: Arc<Window>) -> Result<()> {
        let config = self.render_parameters.accumulation;
        let device = WgpuRenderDevice::new(window, &config)?;
        let mut controller = AccumulationController::new(device, config);
        controller.initialize(&self.camera_controller, &[CAMERA_TRANSFORM, LIGHT_TRANSFORM])?;
        self.controller = Some(controller);
        Ok(())
    }

    fn stop(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(controller) = self.controller.as_mut() {
            controller.shutdown();
        }
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop, viewport: ViewportSize) {
        let now = Instant::now();
        let dt = now - self.last_render_time;
        self.last_render_time = now;
        self.frames_per_second.update(dt);
        self.camera_controller.update_camera(dt.as_secs_f32());

        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        let ctx = FrameContext {
            viewport,
            poses: &self.camera_controller,
            scene: &self.scene,
            light: self.camera_controller.directional_light(),
        };

        match controller.render_frame(&ctx) {
            Ok(Some(report)) => {
                if report.reset.is_some() || report.scene_reallocated {
                    info!("{:?}", report);
                }
            }
            Ok(None) => {}
            Err(e) if e.is_configuration() => {
                error!("{e}");
                self.stop(event_loop);
                return;
            }
            Err(e) => warn!("frame dropped: {e}"),
        }

        if now - self.last_status >= STATUS_INTERVAL {
            self.last_status = now;
            if let Some(controller) = self.controller.as_ref() {
                info!("{:.1} fps, {} samples", self.frames_per_second.get_avg_fps(), controller.sample_count());
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let size = self.render_parameters.viewport_size;
        let win_attr = Window::default_attributes()
            .with_inner_size(winit::dpi::PhysicalSize::new(size.width, size.height))
            .with_title("GPU progressive path tracer");
        let window = match event_loop.create_window(win_attr) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        if let Err(e) = self.start(window) {
            error!("failed to start renderer: {e}");
            self.stop(event_loop);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop,
                    window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };
        if window.id() != window_id { return; }

        match event {
            WindowEvent::CloseRequested | WindowEvent::KeyboardInput {
                event: KeyEvent {
                    state: ElementState::Pressed,
                    physical_key: PhysicalKey::Code(KeyCode::Escape),
                    ..
                },
                ..
            } => {
                self.stop(event_loop);
            }

            WindowEvent::KeyboardInput {
                event: KeyEvent {
                    state,
                    physical_key: PhysicalKey::Code(key),
                    ..
                },
                ..
            } => {
                self.camera_controller.process_keyboard(key, state);
            }

            WindowEvent::Resized(new_size) => {
                let viewport = ViewportSize::new(new_size.width, new_size.height);
                if let Some(controller) = self.controller.as_mut() {
                    controller.device_mut().resize(viewport);
                }
                self.camera_controller.set_viewport(viewport);
            }

            WindowEvent::RedrawRequested => {
                let size = window.inner_size();
                self.redraw(event_loop, ViewportSize::new(size.width, size.height));
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }
}
