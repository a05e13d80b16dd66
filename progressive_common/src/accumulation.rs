use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::change_detector::{Change, ChangeDetector, PoseSource, TransformId};
use crate::device::{KernelBindings, RenderDevice};
use crate::error::Result;
use crate::frame_buffer::FrameBufferManager;
use crate::gpu_structs::KernelParameters;
use crate::parameters::{AccumulationConfig, DirectionalLight, ViewportSize, TILE_SIZE};
use crate::scene::Scene;
use crate::scene_buffer::SceneBufferSynchronizer;

// weight of the new sample when `sample` samples are already accumulated
pub fn blend_weight(sample: u32) -> f32 {
    1.0 / (sample as f32 + 1.0)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AccumulationState {
    Idle,
    Accumulating(u32),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResetReason {
    FirstActivation,
    Resized,
    CameraChanged,
    TransformMoved(TransformId),
}

// what the controller reads from the outside world once per frame
pub struct FrameContext<'a> {
    pub viewport: ViewportSize,
    pub poses: &'a dyn PoseSource,
    pub scene: &'a Scene,
    pub light: DirectionalLight,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameReport {
    // sample index the composite weight was computed from
    pub sample: u32,
    pub reset: Option<ResetReason>,
    pub targets_reallocated: bool,
    pub scene_reallocated: bool,
    pub num_spheres: u32,
}

struct Active<B> {
    detector: ChangeDetector,
    scene_buffers: SceneBufferSynchronizer<B>,
    sample_count: u32,
    pending_first_activation: bool,
}

pub struct AccumulationController<D: RenderDevice> {
    device: D,
    config: AccumulationConfig,
    frame_buffers: FrameBufferManager<D::Texture>,
    active: Option<Active<D::Buffer>>,
    rng: StdRng,
}

impl<D: RenderDevice> AccumulationController<D> {
    pub fn new(device: D, config: AccumulationConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            device,
            config,
            frame_buffers: FrameBufferManager::new(config.maintain_separate_converged_buffer),
            active: None,
            rng,
        }
    }

    pub fn initialize(&mut self, poses: &dyn PoseSource, watched: &[TransformId]) -> Result<()> {
        if self.active.is_some() {
            warn!("accumulation controller is already initialized");
            return Ok(());
        }

        let scene_buffers = SceneBufferSynchronizer::new(self.config.primitive_layout,
                                                         self.device.kernel_strides())?;
        let detector = ChangeDetector::new(poses, watched)?;
        info!("accumulation controller active, watching {} transforms", detector.watched().count());

        self.active = Some(Active {
            detector,
            scene_buffers,
            sample_count: 0,
            pending_first_activation: true,
        });
        Ok(())
    }

    pub fn state(&self) -> AccumulationState {
        match &self.active {
            Some(active) => AccumulationState::Accumulating(active.sample_count),
            None => AccumulationState::Idle,
        }
    }

    pub fn sample_count(&self) -> u32 {
        self.active.as_ref().map_or(0, |a| a.sample_count)
    }

    pub fn config(&self) -> &AccumulationConfig {
        &self.config
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    // One tick: detect, ensure targets, sync scene, dispatch, composite, present.
    // An error before the composite leaves the sample count where it was; a
    // failed present still counts the sample already blended in.
    pub fn render_frame(&mut self, ctx: &FrameContext) -> Result<Option<FrameReport>> {
        let Some(active) = self.active.as_mut() else {
            return Ok(None);
        };
        if ctx.viewport.is_empty() {
            debug!("zero-area viewport, skipping frame");
            return Ok(None);
        }

        let targets = self.frame_buffers.ensure(&mut self.device, ctx.viewport)?;

        // polled every frame so snapshots never go stale, even when a resize
        // already forces the reset
        let change = active.detector.poll(ctx.poses);
        let reset = if active.pending_first_activation {
            active.pending_first_activation = false;
            Some(ResetReason::FirstActivation)
        } else if targets.reallocated {
            Some(ResetReason::Resized)
        } else {
            change.map(|change| match change {
                Change::Camera => ResetReason::CameraChanged,
                Change::Transform(id) => ResetReason::TransformMoved(id),
            })
        };
        if let Some(reason) = reset {
            debug!("resetting accumulation after {} samples: {:?}", active.sample_count, reason);
            active.sample_count = 0;
        }
        let sample = active.sample_count;

        let scene = active.scene_buffers.sync(&mut self.device, ctx.scene)?;

        let pose = ctx.poses.camera_pose();
        let params = KernelParameters {
            camera_to_world: pose.camera_to_world(),
            camera_inverse_projection: pose.inverse_projection(),
            pixel_offset: [self.rng.gen(), self.rng.gen()],
            directional_light: ctx.light.direction,
            light_intensity: ctx.light.intensity,
            seed: self.rng.gen(),
            max_bounces: self.config.max_bounces,
            resolution: [ctx.viewport.width, ctx.viewport.height],
            num_spheres: scene.num_spheres,
        };

        self.device.dispatch(&params,
                             KernelBindings {
                                 output: targets.raw,
                                 spheres: scene.spheres,
                                 materials: scene.materials,
                             },
                             ctx.viewport.workgroups(TILE_SIZE))?;
        self.device.composite(targets.raw, targets.converged, sample)?;
        // the sample is part of the average from here on, even if presenting fails
        active.sample_count = sample + 1;
        self.device.present(targets.converged)?;

        let report = FrameReport {
            sample,
            reset,
            targets_reallocated: targets.reallocated,
            scene_reallocated: scene.reallocated,
            num_spheres: scene.num_spheres,
        };

        Ok(Some(report))
    }

    // releases every target and buffer and returns to Idle; safe to call twice
    pub fn shutdown(&mut self) {
        let active = self.active.take();
        if active.is_none() && !self.frame_buffers.is_allocated() {
            return;
        }

        self.device.wait_idle();
        self.frame_buffers.release(&mut self.device);
        if let Some(mut active) = active {
            active.scene_buffers.release(&mut self.device);
            info!("accumulation controller shut down after {} samples", active.sample_count);
        }
    }
}

impl<D: RenderDevice> Drop for AccumulationController<D> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
