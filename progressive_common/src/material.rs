use glam::Vec3;

// surface response as the kernel understands it:
// albedo drives the diffuse lobe, specular the mirror lobe,
// smoothness sharpens the specular lobe and emission is added unconditionally
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Material {
    pub albedo: Vec3,
    pub specular: Vec3,
    pub smoothness: f32,
    pub emission: Vec3,
}

impl Default for Material {
    fn default() -> Self {
        Self::diffuse(Vec3::splat(0.8))
    }
}

impl Material {
    // dielectric-like base reflectance for non-metals
    pub const DIELECTRIC_SPECULAR: f32 = 0.04;

    pub fn diffuse(albedo: Vec3) -> Self {
        Self {
            albedo,
            specular: Vec3::splat(Self::DIELECTRIC_SPECULAR),
            smoothness: 0.0,
            emission: Vec3::ZERO,
        }
    }

    pub fn metal(specular: Vec3, smoothness: f32) -> Self {
        Self {
            albedo: Vec3::ZERO,
            specular,
            smoothness: smoothness.clamp(0.0, 1.0),
            emission: Vec3::ZERO,
        }
    }

    pub fn emissive(albedo: Vec3, emission: Vec3) -> Self {
        Self { emission, ..Self::diffuse(albedo) }
    }

    pub fn is_emissive(&self) -> bool {
        self.emission.max_element() > 0.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MaterialRef {
    Inline(Material),
    Shared(u32),
}

impl From<Material> for MaterialRef {
    fn from(material: Material) -> Self {
        MaterialRef::Inline(material)
    }
}
