use glam::Quat;
use progressive_common::camera::{Camera, CameraPose, Lens};
use progressive_common::change_detector::{PoseSource, Transform, TransformId};
use progressive_common::parameters::{DirectionalLight, ViewportSize};
use winit::event::ElementState;
use winit::keyboard::KeyCode;

pub const CAMERA_TRANSFORM: TransformId = TransformId(0);
pub const LIGHT_TRANSFORM: TransformId = TransformId(1);

// Keyboard driven fly camera plus the directional light it looks at.
// Held keys set amounts; update_camera integrates them over the frame time.
pub struct CameraController {
    camera: Camera,
    lens: Lens,
    light: Transform,
    light_intensity: f32,
    aspect: f32,
    amount_forward: f32,
    amount_backward: f32,
    amount_right: f32,
    amount_left: f32,
    amount_up: f32,
    amount_down: f32,
    rotate_up: f32,
    rotate_down: f32,
    rotate_left: f32,
    rotate_right: f32,
    widen: f32,
    narrow: f32,
    swing_left: f32,
    swing_right: f32,
    boost: bool,
    speed: f32,
    sensitivity: f32,
}

impl CameraController {
    // degrees of field of view per second while = or - is held
    const FOV_RATE: f32 = 20.0;

    pub fn new(camera: Camera, lens: Lens, light: DirectionalLight,
               speed: f32, sensitivity: f32, viewport: ViewportSize) -> Self {
        Self {
            camera,
            lens,
            light: Transform::from_rotation(Quat::from_rotation_arc(glam::Vec3::NEG_Z, light.direction.normalize())),
            light_intensity: light.intensity,
            aspect: viewport.aspect_ratio(),
            amount_forward: 0.0,
            amount_backward: 0.0,
            amount_right: 0.0,
            amount_left: 0.0,
            amount_up: 0.0,
            amount_down: 0.0,
            rotate_up: 0.0,
            rotate_down: 0.0,
            rotate_left: 0.0,
            rotate_right: 0.0,
            widen: 0.0,
            narrow: 0.0,
            swing_left: 0.0,
            swing_right: 0.0,
            boost: false,
            speed,
            sensitivity,
        }
    }

    pub fn set_viewport(&mut self, viewport: ViewportSize) {
        if !viewport.is_empty() {
            self.aspect = viewport.aspect_ratio();
        }
    }

    pub fn directional_light(&self) -> DirectionalLight {
        DirectionalLight {
            direction: self.light.forward(),
            intensity: self.light_intensity,
        }
    }

    // returns true when the key drives the camera or light
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) -> bool {
        let amount = if state == ElementState::Pressed { 1.0 } else { 0.0 };
        match key {
            KeyCode::KeyW => self.amount_forward = amount,
            KeyCode::KeyS => self.amount_backward = amount,
            KeyCode::KeyD => self.amount_right = amount,
            KeyCode::KeyA => self.amount_left = amount,
            KeyCode::Space => self.amount_up = amount,
            KeyCode::ControlLeft => self.amount_down = amount,
            KeyCode::KeyI => self.rotate_up = amount,
            KeyCode::KeyK => self.rotate_down = amount,
            KeyCode::KeyJ => self.rotate_left = amount,
            KeyCode::KeyL => self.rotate_right = amount,
            KeyCode::Equal => self.widen = amount,
            KeyCode::Minus => self.narrow = amount,
            KeyCode::KeyU => self.swing_left = amount,
            KeyCode::KeyO => self.swing_right = amount,
            KeyCode::ShiftLeft => self.boost = state == ElementState::Pressed,
            _ => return false,
        }
        true
    }

    pub fn update_camera(&mut self, dt: f32) {
        let speed = if self.boost { 2.0 * self.speed } else { self.speed };

        let forward = self.camera.forward();
        let right = self.camera.right();
        self.camera.position += forward * (self.amount_forward - self.amount_backward) * speed * dt;
        self.camera.position += right * (self.amount_right - self.amount_left) * speed * dt;
        self.camera.position.y += (self.amount_up - self.amount_down) * speed * dt;

        let d_yaw = (self.rotate_left - self.rotate_right) * self.sensitivity * dt;
        let d_pitch = (self.rotate_up - self.rotate_down) * self.sensitivity * dt;
        if d_yaw != 0.0 || d_pitch != 0.0 {
            self.camera.rotate(d_yaw, d_pitch);
        }

        let d_fov = (self.widen - self.narrow) * Self::FOV_RATE * dt;
        if d_fov != 0.0 {
            self.lens.set_vfov(self.lens.vfov_deg() + d_fov);
        }

        let swing = (self.swing_left - self.swing_right) * self.sensitivity * dt;
        if swing != 0.0 {
            self.light.rotation = (Quat::from_rotation_y(swing) * self.light.rotation).normalize();
        }
    }
}

impl PoseSource for CameraController {
    fn camera_pose(&self) -> CameraPose {
        self.camera.pose(&self.lens, self.aspect)
    }

    fn transform(&self, id: TransformId) -> Option<Transform> {
        match id {
            CAMERA_TRANSFORM => Some(Transform {
                position: self.camera.position,
                rotation: self.camera.orientation(),
                ..Default::default()
            }),
            LIGHT_TRANSFORM => Some(self.light),
            _ => None,
        }
    }
}
