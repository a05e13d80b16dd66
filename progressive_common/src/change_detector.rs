use glam::{Quat, Vec3};
use log::{debug, warn};
use crate::camera::CameraPose;
use crate::error::{RenderError, Result};

// opaque handle to a scene node whose movement invalidates accumulation
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransformId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self { position: Vec3::ZERO, rotation: Quat::IDENTITY, scale: Vec3::ONE }
    }
}

impl Transform {
    pub fn from_rotation(rotation: Quat) -> Self {
        Self { rotation, ..Default::default() }
    }

    // direction the node points along (its local -z)
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }
}

// where the detector reads current poses from, queried once per frame
pub trait PoseSource {
    fn camera_pose(&self) -> CameraPose;
    fn transform(&self, id: TransformId) -> Option<Transform>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Change {
    Camera,
    Transform(TransformId),
}

// Compares the camera and every watched transform against the value seen on
// the previous poll. Any bitwise difference counts as a change; the snapshot
// is then replaced so the same motion is reported only once.
pub struct ChangeDetector {
    last_camera: CameraPose,
    watched: Vec<Watched>,
}

struct Watched {
    id: TransformId,
    last: Transform,
    // set while the source cannot resolve the id, so the loss is logged once
    missing: bool,
}

impl ChangeDetector {
    pub fn new(source: &dyn PoseSource, watched: &[TransformId]) -> Result<Self> {
        let mut ids = watched.to_vec();
        ids.sort();
        ids.dedup();

        let watched = ids
            .into_iter()
            .map(|id| {
                source
                    .transform(id)
                    .map(|last| Watched { id, last, missing: false })
                    .ok_or(RenderError::MissingWatchedTransform(id))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            last_camera: source.camera_pose(),
            watched,
        })
    }

    pub fn watched(&self) -> impl Iterator<Item = TransformId> + '_ {
        self.watched.iter().map(|w| w.id)
    }

    // every watched entity is visited on every call, even after a change was
    // already found, so no snapshot is left stale
    pub fn poll(&mut self, source: &dyn PoseSource) -> Option<Change> {
        let mut change = None;

        let camera = source.camera_pose();
        if camera != self.last_camera {
            if camera.vfov_rad != self.last_camera.vfov_rad {
                debug!("field of view changed to {:.2} deg", camera.vfov_rad.to_degrees());
            }
            self.last_camera = camera;
            change = Some(Change::Camera);
        }

        for watched in self.watched.iter_mut() {
            match source.transform(watched.id) {
                Some(current) => {
                    watched.missing = false;
                    if current != watched.last {
                        watched.last = current;
                        change.get_or_insert(Change::Transform(watched.id));
                    }
                }
                None if !watched.missing => {
                    warn!("watched transform {:?} disappeared, keeping last pose", watched.id);
                    watched.missing = true;
                }
                None => {}
            }
        }

        change
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_device::FakePoses;

    const LIGHT: TransformId = TransformId(1);
    const BALL: TransformId = TransformId(2);

    fn poses() -> FakePoses {
        FakePoses::new()
            .with_transform(LIGHT, Transform::default())
            .with_transform(BALL, Transform::default())
    }

    #[test]
    fn static_scene_never_invalidates() {
        let poses = poses();
        let mut detector = ChangeDetector::new(&poses, &[LIGHT, BALL]).unwrap();
        for _ in 0..5 {
            assert_eq!(detector.poll(&poses), None);
        }
    }

    #[test]
    fn fov_change_reported_once() {
        let mut poses = poses();
        let mut detector = ChangeDetector::new(&poses, &[LIGHT]).unwrap();
        poses.camera.vfov_rad += 0.1;
        assert_eq!(detector.poll(&poses), Some(Change::Camera));
        assert_eq!(detector.poll(&poses), None);
    }

    #[test]
    fn smallest_delta_counts() {
        let mut poses = poses();
        let mut detector = ChangeDetector::new(&poses, &[BALL]).unwrap();
        let t = poses.transforms.get_mut(&BALL).unwrap();
        t.position.x = f32::from_bits(t.position.x.to_bits() + 1);
        assert_eq!(detector.poll(&poses), Some(Change::Transform(BALL)));
        assert_eq!(detector.poll(&poses), None);
    }

    #[test]
    fn simultaneous_changes_all_consumed() {
        let mut poses = poses();
        let mut detector = ChangeDetector::new(&poses, &[LIGHT, BALL]).unwrap();
        poses.camera.position.y += 1.0;
        poses.transforms.get_mut(&LIGHT).unwrap().rotation = Quat::from_rotation_x(0.3);
        poses.transforms.get_mut(&BALL).unwrap().scale = Vec3::splat(2.0);

        assert_eq!(detector.poll(&poses), Some(Change::Camera));
        // nothing left over for the next frame
        assert_eq!(detector.poll(&poses), None);
    }

    #[test]
    fn unwatched_transform_is_ignored() {
        let mut poses = poses();
        let mut detector = ChangeDetector::new(&poses, &[LIGHT]).unwrap();
        poses.transforms.get_mut(&BALL).unwrap().position = Vec3::ONE;
        assert_eq!(detector.poll(&poses), None);
    }

    #[test]
    fn missing_transform_fails_setup() {
        let poses = poses();
        match ChangeDetector::new(&poses, &[LIGHT, TransformId(9)]) {
            Err(RenderError::MissingWatchedTransform(id)) => assert_eq!(id, TransformId(9)),
            Err(e) => panic!("unexpected error {e}"),
            Ok(_) => panic!("setup should fail"),
        }
    }

    #[test]
    fn vanished_transform_keeps_last_pose() {
        let mut poses = poses();
        let mut detector = ChangeDetector::new(&poses, &[LIGHT, BALL]).unwrap();
        let ball = poses.transforms.remove(&BALL).unwrap();

        assert_eq!(detector.poll(&poses), None);
        assert!(detector.watched.iter().any(|w| w.id == BALL && w.missing));
        assert_eq!(detector.poll(&poses), None);

        // back at the same pose: no change, and a later loss is reported again
        poses.transforms.insert(BALL, ball);
        assert_eq!(detector.poll(&poses), None);
        assert!(detector.watched.iter().all(|w| !w.missing));

        let mut moved = ball;
        moved.position.x += 1.0;
        poses.transforms.insert(BALL, moved);
        assert_eq!(detector.poll(&poses), Some(Change::Transform(BALL)));
    }

    #[test]
    fn duplicate_ids_polled_once() {
        let poses = poses();
        let detector = ChangeDetector::new(&poses, &[BALL, LIGHT, BALL]).unwrap();
        assert_eq!(detector.watched().collect::<Vec<_>>(), vec![LIGHT, BALL]);
    }
}
