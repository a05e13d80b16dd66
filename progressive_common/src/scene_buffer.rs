use log::info;
use crate::device::RenderDevice;
use crate::error::{RenderError, Result};
use crate::gpu_structs::{GPUIndexedSphere, GPUMaterial, GPUSphere};
use crate::material::MaterialRef;
use crate::parameters::{KernelStrides, PrimitiveLayout};
use crate::scene::Scene;
use crate::sphere::ResolvedSphere;

#[derive(Clone, Debug, PartialEq)]
pub enum PackedScene {
    Inline(Vec<GPUSphere>),
    Indexed {
        spheres: Vec<GPUIndexedSphere>,
        materials: Vec<GPUMaterial>,
    },
}

impl PackedScene {
    pub fn pack(scene: &Scene, layout: PrimitiveLayout) -> Result<Self> {
        match layout {
            PrimitiveLayout::InlineMaterial => {
                let spheres = scene
                    .resolve()?
                    .iter()
                    .map(GPUSphere::pack)
                    .collect();
                Ok(PackedScene::Inline(spheres))
            }
            PrimitiveLayout::IndexedMaterial => {
                // shared materials keep their index, inline ones are appended
                let mut materials: Vec<GPUMaterial> = scene.materials.iter().map(GPUMaterial::pack).collect();
                let mut spheres = Vec::with_capacity(scene.len());
                for (i, sphere) in scene.spheres.iter().enumerate() {
                    let material_idx = match sphere.material {
                        MaterialRef::Shared(idx) if (idx as usize) < scene.materials.len() => idx,
                        MaterialRef::Shared(idx) => {
                            return Err(RenderError::UnresolvedMaterial {
                                sphere_idx: i,
                                material_idx: idx,
                                material_count: scene.materials.len(),
                            })
                        }
                        MaterialRef::Inline(material) => {
                            materials.push(GPUMaterial::pack(&material));
                            (materials.len() - 1) as u32
                        }
                    };
                    spheres.push(GPUIndexedSphere::new(sphere.position, sphere.radius, material_idx));
                }
                Ok(PackedScene::Indexed { spheres, materials })
            }
        }
    }

    pub fn num_spheres(&self) -> usize {
        match self {
            PackedScene::Inline(spheres) => spheres.len(),
            PackedScene::Indexed { spheres, .. } => spheres.len(),
        }
    }

    pub fn sphere_bytes(&self) -> &[u8] {
        match self {
            PackedScene::Inline(spheres) => bytemuck::cast_slice(spheres),
            PackedScene::Indexed { spheres, .. } => bytemuck::cast_slice(spheres),
        }
    }

    pub fn material_records(&self) -> Option<&[GPUMaterial]> {
        match self {
            PackedScene::Inline(_) => None,
            PackedScene::Indexed { materials, .. } => Some(materials),
        }
    }

    pub fn unpack(&self) -> Result<Vec<ResolvedSphere>> {
        match self {
            PackedScene::Inline(spheres) => Ok(spheres.iter().map(GPUSphere::unpack).collect()),
            PackedScene::Indexed { spheres, materials } => spheres
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    let material = materials
                        .get(s.material_idx() as usize)
                        .ok_or(RenderError::UnresolvedMaterial {
                            sphere_idx: i,
                            material_idx: s.material_idx(),
                            material_count: materials.len(),
                        })?;
                    Ok(ResolvedSphere {
                        position: s.position(),
                        radius: s.radius(),
                        material: material.unpack(),
                    })
                })
                .collect(),
        }
    }
}

struct StructuredBuffer<B> {
    handle: B,
    count: usize,
    stride: usize,
}

// borrowed scene bindings for one dispatch
pub struct SceneBindings<'a, B> {
    pub spheres: &'a B,
    pub materials: Option<&'a B>,
    pub num_spheres: u32,
    pub reallocated: bool,
}

// Keeps the GPU copy of the scene in step with the host scene. Buffers are
// recreated whenever record count or stride changes and are fully rewritten on
// every sync, so records from a larger previous scene can never be read.
pub struct SceneBufferSynchronizer<B> {
    layout: PrimitiveLayout,
    spheres: Option<StructuredBuffer<B>>,
    materials: Option<StructuredBuffer<B>>,
}

impl<B> SceneBufferSynchronizer<B> {
    pub fn new(layout: PrimitiveLayout, expected: KernelStrides) -> Result<Self> {
        if layout.sphere_stride() != expected.sphere {
            return Err(RenderError::StrideMismatch {
                layout,
                buffer: "sphere",
                packed: layout.sphere_stride(),
                expected: expected.sphere,
            });
        }
        if layout.material_stride() != expected.material {
            return Err(RenderError::StrideMismatch {
                layout,
                buffer: "material",
                packed: layout.material_stride().unwrap_or(0),
                expected: expected.material.unwrap_or(0),
            });
        }

        Ok(Self { layout, spheres: None, materials: None })
    }

    pub fn layout(&self) -> PrimitiveLayout {
        self.layout
    }

    // record count currently allocated on the GPU for the sphere buffer
    pub fn sphere_capacity(&self) -> Option<usize> {
        self.spheres.as_ref().map(|b| b.count)
    }

    pub fn sync<D>(&mut self, device: &mut D, scene: &Scene) -> Result<SceneBindings<'_, B>>
    where D: RenderDevice<Buffer = B> {
        // pack first so a bad material reference leaves the GPU state untouched
        let packed = PackedScene::pack(scene, self.layout)?;
        let num_spheres = packed.num_spheres();

        let mut reallocated = Self::sync_buffer(device, &mut self.spheres, "sphere buffer",
                                                packed.sphere_bytes(), num_spheres,
                                                self.layout.sphere_stride())?;

        if let (Some(records), Some(stride)) = (packed.material_records(), self.layout.material_stride()) {
            reallocated |= Self::sync_buffer(device, &mut self.materials, "material buffer",
                                             bytemuck::cast_slice(records), records.len(), stride)?;
        }

        match self.spheres.as_ref() {
            Some(spheres) => Ok(SceneBindings {
                spheres: &spheres.handle,
                materials: self.materials.as_ref().map(|m| &m.handle),
                num_spheres: num_spheres as u32,
                reallocated,
            }),
            None => Err(RenderError::allocation("sphere buffer", "missing after sync")),
        }
    }

    // returns true when the buffer had to be (re)created
    fn sync_buffer<D>(device: &mut D,
                      slot: &mut Option<StructuredBuffer<B>>,
                      label: &str,
                      bytes: &[u8],
                      count: usize,
                      stride: usize) -> Result<bool>
    where D: RenderDevice<Buffer = B> {
        // the GPU API refuses zero-sized buffers, keep room for one record
        let capacity = count.max(1);

        let mut reallocated = false;
        let buffer = match slot.take() {
            Some(buffer) if buffer.count == capacity && buffer.stride == stride => buffer,
            stale => {
                if let Some(stale) = stale {
                    device.wait_idle();
                    device.release_buffer(stale.handle);
                }
                let handle = device.create_structured_buffer(label, capacity, stride)?;
                info!("allocated {} with {} records of {} bytes", label, capacity, stride);
                reallocated = true;
                StructuredBuffer { handle, count: capacity, stride }
            }
        };

        if bytes.is_empty() {
            device.upload(&buffer.handle, &vec![0u8; stride]);
        } else {
            device.upload(&buffer.handle, bytes);
        }
        *slot = Some(buffer);

        Ok(reallocated)
    }

    pub fn release<D>(&mut self, device: &mut D)
    where D: RenderDevice<Buffer = B> {
        if self.spheres.is_none() && self.materials.is_none() {
            return;
        }
        device.wait_idle();
        for buffer in [self.spheres.take(), self.materials.take()].into_iter().flatten() {
            device.release_buffer(buffer.handle);
        }
    }
}
