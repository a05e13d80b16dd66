use glam::Mat4;

pub struct ProjectionMatrix {
    vfov_rad: f32,
    aspect_ratio: f32,
    z_near: f32,
    z_far: f32
}

impl ProjectionMatrix {
    pub fn new(vfov_rad: f32, aspect_ratio: f32,
               z_near: f32, z_far: f32) -> Self {

        Self {
            vfov_rad,
            aspect_ratio,
            z_near,
            z_far
        }

    }

    // right-handed, clip depth in 0..1, same convention as wgpu
    pub fn p(&self) -> Mat4 {
        Mat4::perspective_rh(self.vfov_rad, self.aspect_ratio, self.z_near, self.z_far)
    }

    // the kernel un-projects ndc (x, y, 0, 1) through this and divides by w
    // to get a point on the near plane in camera space
    pub fn p_inv(&self) -> Mat4 {
        self.p().inverse()
    }
}
