use glam::Vec3;
use crate::error::{RenderError, Result};
use crate::material::{Material, MaterialRef};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sphere {
    pub position: Vec3,
    pub radius: f32,
    pub material: MaterialRef,
}

impl Sphere {
    pub fn new(position: Vec3, radius: f32, material: impl Into<MaterialRef>) -> Self {
        Self { position, radius, material: material.into() }
    }

    pub fn with_shared_material(position: Vec3, radius: f32, material_idx: u32) -> Self {
        Self { position, radius, material: MaterialRef::Shared(material_idx) }
    }

    pub fn intersects(&self, other: &Sphere) -> bool {
        let min_dist = self.radius + other.radius;
        self.position.distance_squared(other.position) < min_dist * min_dist
    }

    // idx is only used to name the sphere in the error
    pub fn resolve(&self, idx: usize, materials: &[Material]) -> Result<ResolvedSphere> {
        let material = match self.material {
            MaterialRef::Inline(material) => material,
            MaterialRef::Shared(material_idx) => *materials
                .get(material_idx as usize)
                .ok_or(RenderError::UnresolvedMaterial {
                    sphere_idx: idx,
                    material_idx,
                    material_count: materials.len(),
                })?,
        };

        Ok(ResolvedSphere { position: self.position, radius: self.radius, material })
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ResolvedSphere {
    pub position: Vec3,
    pub radius: f32,
    pub material: Material,
}
