// In-memory stand-ins for the GPU and the pose source, used by unit tests.
// Images are simulated as one uniform value per texture so composite math
// can be checked exactly.

use std::collections::{HashMap, VecDeque};
use crate::accumulation::blend_weight;
use crate::camera::{Camera, CameraPose, Lens};
use crate::change_detector::{PoseSource, Transform, TransformId};
use crate::device::{KernelBindings, RenderDevice};
use crate::error::{RenderError, Result};
use crate::gpu_structs::KernelParameters;
use crate::parameters::{KernelStrides, PrimitiveLayout, ViewportSize};

pub struct FakePoses {
    pub camera: CameraPose,
    pub transforms: HashMap<TransformId, Transform>,
}

impl FakePoses {
    pub fn new() -> Self {
        Self {
            camera: Camera::demo_camera().pose(&Lens::default(), 4.0 / 3.0),
            transforms: HashMap::new(),
        }
    }

    pub fn with_transform(mut self, id: TransformId, transform: Transform) -> Self {
        self.transforms.insert(id, transform);
        self
    }
}

impl PoseSource for FakePoses {
    fn camera_pose(&self) -> CameraPose {
        self.camera
    }

    fn transform(&self, id: TransformId) -> Option<Transform> {
        self.transforms.get(&id).copied()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FakeTexture {
    pub id: usize,
    pub size: ViewportSize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FakeBuffer {
    pub id: usize,
    pub label: String,
    pub count: usize,
    pub stride: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    CreateTarget(usize, ViewportSize),
    ReleaseTarget(usize),
    CreateBuffer(usize, String),
    ReleaseBuffer(usize),
    Upload(usize),
    WaitIdle,
    Dispatch,
    Composite(u32),
    Present,
}

#[derive(Clone, Debug)]
pub struct DispatchRecord {
    pub params: KernelParameters,
    pub workgroups: (u32, u32),
    pub output: usize,
    pub spheres: FakeBuffer,
    pub materials: Option<FakeBuffer>,
}

pub struct RecordingDevice {
    next_id: usize,
    pub strides: KernelStrides,
    pub events: Vec<Event>,
    pub dispatches: Vec<DispatchRecord>,
    pub uploads: HashMap<usize, Vec<u8>>,
    // allocations still to fail before succeeding again
    pub fail_target_allocations: usize,
    pub fail_buffer_allocations: usize,
    // fails the next target allocation with this label
    pub fail_target_label: Option<String>,
    // present reports a lost surface while set
    pub fail_present: bool,
    // values the next dispatches write into their output; falls back to the seed
    pub sample_values: VecDeque<f32>,
    pub pixels: HashMap<usize, f32>,
    pub surface: f32,
    live_targets: HashMap<usize, ViewportSize>,
    live_buffers: HashMap<usize, FakeBuffer>,
}

impl RecordingDevice {
    pub fn new(layout: PrimitiveLayout) -> Self {
        Self {
            next_id: 0,
            strides: layout.kernel_strides(),
            events: Vec::new(),
            dispatches: Vec::new(),
            uploads: HashMap::new(),
            fail_target_allocations: 0,
            fail_buffer_allocations: 0,
            fail_target_label: None,
            fail_present: false,
            sample_values: VecDeque::new(),
            pixels: HashMap::new(),
            surface: 0.0,
            live_targets: HashMap::new(),
            live_buffers: HashMap::new(),
        }
    }

    fn next_id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn targets_created(&self) -> Vec<ViewportSize> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::CreateTarget(_, size) => Some(*size),
                _ => None,
            })
            .collect()
    }

    pub fn buffers_created(&self, label: &str) -> usize {
        self.count(|e| matches!(e, Event::CreateBuffer(_, l) if l == label))
    }

    pub fn live_target_count(&self) -> usize {
        self.live_targets.len()
    }

    pub fn live_buffer_count(&self) -> usize {
        self.live_buffers.len()
    }

    pub fn pixel(&self, texture: usize) -> f32 {
        self.pixels.get(&texture).copied().unwrap_or(0.0)
    }

    // every release must come after a wait_idle that follows the last dispatch
    pub fn releases_were_fenced(&self) -> bool {
        let mut fenced = true;
        for event in &self.events {
            match event {
                Event::Dispatch | Event::Composite(_) | Event::Present => fenced = false,
                Event::WaitIdle => fenced = true,
                Event::ReleaseTarget(_) | Event::ReleaseBuffer(_) if !fenced => return false,
                _ => {}
            }
        }
        true
    }
}

impl RenderDevice for RecordingDevice {
    type Texture = FakeTexture;
    type Buffer = FakeBuffer;

    fn create_target(&mut self, label: &str, size: ViewportSize) -> Result<FakeTexture> {
        if self.fail_target_allocations > 0 {
            self.fail_target_allocations -= 1;
            return Err(RenderError::allocation(label, "simulated out of memory"));
        }
        if self.fail_target_label.as_deref() == Some(label) {
            self.fail_target_label = None;
            return Err(RenderError::allocation(label, "simulated out of memory"));
        }
        let id = self.next_id();
        self.live_targets.insert(id, size);
        self.events.push(Event::CreateTarget(id, size));
        Ok(FakeTexture { id, size })
    }

    fn release_target(&mut self, target: FakeTexture) {
        assert!(self.live_targets.remove(&target.id).is_some(), "double release of target {}", target.id);
        self.pixels.remove(&target.id);
        self.events.push(Event::ReleaseTarget(target.id));
    }

    fn create_structured_buffer(&mut self, label: &str, count: usize, stride: usize) -> Result<FakeBuffer> {
        assert!(count > 0, "zero-length structured buffer");
        if self.fail_buffer_allocations > 0 {
            self.fail_buffer_allocations -= 1;
            return Err(RenderError::allocation(label, "simulated out of memory"));
        }
        let id = self.next_id();
        let buffer = FakeBuffer { id, label: label.to_string(), count, stride };
        self.live_buffers.insert(id, buffer.clone());
        self.events.push(Event::CreateBuffer(id, label.to_string()));
        Ok(buffer)
    }

    fn release_buffer(&mut self, buffer: FakeBuffer) {
        assert!(self.live_buffers.remove(&buffer.id).is_some(), "double release of buffer {}", buffer.id);
        self.events.push(Event::ReleaseBuffer(buffer.id));
    }

    fn upload(&mut self, buffer: &FakeBuffer, data: &[u8]) {
        assert!(data.len() <= buffer.count * buffer.stride, "upload overflows buffer {}", buffer.id);
        self.uploads.insert(buffer.id, data.to_vec());
        self.events.push(Event::Upload(buffer.id));
    }

    fn wait_idle(&mut self) {
        self.events.push(Event::WaitIdle);
    }

    fn kernel_strides(&self) -> KernelStrides {
        self.strides
    }

    fn dispatch(&mut self,
                params: &KernelParameters,
                bindings: KernelBindings<'_, Self>,
                workgroups: (u32, u32)) -> Result<()> {
        let output = bindings.output;
        assert!(self.live_targets.contains_key(&output.id), "dispatch into released target");
        assert!(self.live_buffers.contains_key(&bindings.spheres.id), "dispatch reads released buffer");
        assert_eq!(params.resolution, [output.size.width, output.size.height]);

        let value = self.sample_values.pop_front().unwrap_or(params.seed);
        self.pixels.insert(output.id, value);
        self.dispatches.push(DispatchRecord {
            params: *params,
            workgroups,
            output: output.id,
            spheres: bindings.spheres.clone(),
            materials: bindings.materials.cloned(),
        });
        self.events.push(Event::Dispatch);
        Ok(())
    }

    fn composite(&mut self, raw: &FakeTexture, converged: Option<&FakeTexture>, sample: u32) -> Result<()> {
        let w = blend_weight(sample);
        let new = self.pixel(raw.id);
        match converged {
            Some(converged) => {
                assert_eq!(raw.size, converged.size, "composite across mismatched targets");
                let acc = self.pixel(converged.id);
                self.pixels.insert(converged.id, new * w + acc * (1.0 - w));
            }
            None => {
                self.surface = new * w + self.surface * (1.0 - w);
            }
        }
        self.events.push(Event::Composite(sample));
        Ok(())
    }

    fn present(&mut self, converged: Option<&FakeTexture>) -> Result<()> {
        if self.fail_present {
            return Err(RenderError::Presentation("surface lost".to_string()));
        }
        if let Some(converged) = converged {
            self.surface = self.pixel(converged.id);
        }
        self.events.push(Event::Present);
        Ok(())
    }
}
