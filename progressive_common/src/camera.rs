use glam::{EulerRot, Mat4, Quat, Vec3};
use crate::projection_matrix::ProjectionMatrix;

// right-handed world, camera looks down its local -z axis
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub pitch: f32,
    pub yaw: f32
}

impl Camera {
    const SAFE_FRAC_PI_2: f32 = std::f32::consts::FRAC_PI_2 - 0.001;

    pub fn new(look_from: Vec3, look_at: Vec3) -> Self {
        let position = look_from;
        let forwards = (look_at - position).normalize();

        let pitch = forwards.y.asin();
        let yaw = (-forwards.x).atan2(-forwards.z);

        Self {
            position,
            pitch,
            yaw
        }
    }

    pub fn demo_camera() -> Self {
        let look_at = Vec3::new(3.0, 1.0, 0.0);
        let look_from = Vec3::new(-8.0, 4.0, -2.0);
        Self::new(look_from, look_at)
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.orientation() * Vec3::X
    }

    pub fn rotate(&mut self, d_yaw: f32, d_pitch: f32) {
        self.yaw += d_yaw;
        self.pitch = (self.pitch + d_pitch).clamp(-Self::SAFE_FRAC_PI_2, Self::SAFE_FRAC_PI_2);
    }

    pub fn pose(&self, lens: &Lens, aspect: f32) -> CameraPose {
        CameraPose {
            position: self.position,
            orientation: self.orientation(),
            vfov_rad: lens.vfov_rad,
            z_near: lens.z_near,
            z_far: lens.z_far,
            aspect,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Lens {
    pub vfov_rad: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Lens {
    pub fn new(vfov_deg: f32, z_near: f32, z_far: f32) -> Self {
        Self { vfov_rad: vfov_deg.to_radians(), z_near, z_far }
    }

    pub fn set_vfov(&mut self, vfov_deg: f32) {
        self.vfov_rad = vfov_deg.clamp(1.0, 179.0).to_radians();
    }

    pub fn vfov_deg(&self) -> f32 { self.vfov_rad.to_degrees() }
}

impl Default for Lens {
    fn default() -> Self {
        Self::new(60.0, 0.3, 1000.0)
    }
}

// value snapshot of everything about the camera that shapes primary rays;
// compared frame to frame by value
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub orientation: Quat,
    pub vfov_rad: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub aspect: f32,
}

impl CameraPose {
    pub fn camera_to_world(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }

    pub fn inverse_projection(&self) -> Mat4 {
        ProjectionMatrix::new(self.vfov_rad, self.aspect, self.z_near, self.z_far).p_inv()
    }
}
