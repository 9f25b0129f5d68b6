//! Skeletal retargeter: glove sample → hand skeleton.

use manus_types::{DevicePose, DeviceSample, Finger, FingerPart};
use tracing::trace;

use crate::conversion::{TrackingMode, pose_to_local, quaternion_to_local};
use crate::pose::ReferencePose;
use crate::skeleton::{BoneHierarchy, bone_name, lookup_bone};

/// Clip time reached by a fully closed finger (bend `1.0`).
pub const DEFAULT_TIME_SCALE: f32 = 10.0;

/// Copies reference-pose rotations onto a live [`BoneHierarchy`].
///
/// For every finger the reference pose is sampled at
/// `bend * time_scale`; the four resulting rotations are written to the
/// matching `Finger_<finger><part>` bones.  The wrist (root bone) takes the
/// converted glove orientation.
pub struct Retargeter {
    pose: Box<dyn ReferencePose>,
    time_scale: f32,
    tracking: TrackingMode,
}

impl Retargeter {
    pub fn new(pose: Box<dyn ReferencePose>) -> Self {
        Self {
            pose,
            time_scale: DEFAULT_TIME_SCALE,
            tracking: TrackingMode::default(),
        }
    }

    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    pub fn with_tracking(mut self, tracking: TrackingMode) -> Self {
        self.tracking = tracking;
        self
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn tracking(&self) -> TrackingMode {
        self.tracking
    }

    /// Update `hierarchy` in place from `sample`.  Bones missing from the
    /// hierarchy are skipped.
    pub fn retarget(&self, sample: &DeviceSample, hierarchy: &mut BoneHierarchy) {
        for finger in Finger::ALL {
            let time = sample.bend(finger) * self.time_scale;
            let rotations = self.pose.sample(finger, time);
            for part in FingerPart::ALL {
                match lookup_bone(hierarchy, finger, part) {
                    Some(bone) => hierarchy.set_local_rotation(bone, rotations[part.index()]),
                    None => trace!(bone = %bone_name(finger, part), "bone missing, skipped"),
                }
            }
        }

        let root = hierarchy.root();
        hierarchy.set_local_rotation(root, quaternion_to_local(sample.quaternion));
    }

    /// Apply a palm pose to the wrist.  The position is only written in
    /// [`TrackingMode::Positional`].
    pub fn apply_palm_pose(&self, pose: &DevicePose, hierarchy: &mut BoneHierarchy) {
        let local = pose_to_local(pose, self.tracking);
        let root = hierarchy.root();
        hierarchy.set_local_rotation(root, local.rotation);
        if self.tracking == TrackingMode::Positional {
            hierarchy.set_local_translation(root, local.translation);
        }
    }
}
