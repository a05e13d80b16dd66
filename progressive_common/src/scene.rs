use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;
use crate::error::Result;
use crate::material::Material;
use crate::sphere::{ResolvedSphere, Sphere};
use crate::util_funcs::{random_f32, random_hsv_color, random_in_unit_disk, random_range_f32};

#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub spheres: Vec<Sphere>,
    pub materials: Vec<Material>,
}

#[derive(Copy, Clone, Debug)]
pub struct RandomSceneParameters {
    pub sphere_radius: Vec2,
    pub spheres_max: u32,
    pub placement_radius: f32,
    pub seed: u64,
}

impl Default for RandomSceneParameters {
    fn default() -> Self {
        Self {
            sphere_radius: Vec2::new(3.0, 8.0),
            spheres_max: 100,
            placement_radius: 100.0,
            seed: 1235446,
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    // four balls in a row along z: a white diffuse ball, a small bright light,
    // a rough metal ball and a mirror
    pub fn four_spheres() -> Self {
        let spheres = vec![
            Sphere::new(Vec3::new(3.0, 1.0, -3.0), 1.0,
                        Material::diffuse(Vec3::splat(0.8))),
            Sphere::new(Vec3::new(3.0, 5.0, 0.0), 0.5,
                        Material { emission: Vec3::splat(10.0), ..Material::metal(Vec3::splat(0.8), 0.0) }),
            Sphere::new(Vec3::new(3.0, 1.0, 0.0), 1.0,
                        Material::metal(Vec3::splat(0.8), 0.5)),
            Sphere::new(Vec3::new(3.0, 1.0, 3.0), 1.0,
                        Material::metal(Vec3::splat(0.8), 1.0)),
        ];

        Self { spheres, materials: Vec::new() }
    }

    // scatter up to spheres_max balls on the ground plane inside a disk,
    // rejecting any that would intersect one already placed
    pub fn random(params: &RandomSceneParameters) -> Self {
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut spheres = Vec::<Sphere>::with_capacity(params.spheres_max as usize);
        let mut materials = Vec::<Material>::new();

        for _ in 0..params.spheres_max {
            let radius = random_range_f32(&mut rng, params.sphere_radius.x, params.sphere_radius.y);
            let (x, z) = random_in_unit_disk(&mut rng);
            let position = Vec3::new(x * params.placement_radius, radius, z * params.placement_radius);
            let candidate = Sphere::with_shared_material(position, radius, 0);

            if spheres.iter().any(|other| other.intersects(&candidate)) {
                continue;
            }

            let color = random_hsv_color(&mut rng);
            let material = if random_f32(&mut rng) < 0.5 {
                Material::metal(color, random_f32(&mut rng))
            } else {
                Material::diffuse(color)
            };
            materials.push(material);
            spheres.push(Sphere::with_shared_material(position, radius, (materials.len() - 1) as u32));
        }

        Self { spheres, materials }
    }

    pub fn len(&self) -> usize {
        self.spheres.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }

    pub fn resolve(&self) -> Result<Vec<ResolvedSphere>> {
        self.spheres
            .iter()
            .enumerate()
            .map(|(i, s)| s.resolve(i, &self.materials))
            .collect()
    }
}
