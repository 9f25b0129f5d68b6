//! Device-space to engine-space conversion.
//!
//! The glove reports right-handed orientations and centimetre positions; the
//! engine is left-handed and works in metres.  These functions are total and
//! stateless.

use manus_types::{DevicePose, DeviceQuaternion, DeviceVector};
use serde::{Deserialize, Serialize};

use crate::math::{Quaternion, Transform3D, Vec3};

/// How much of a device pose is applied to the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingMode {
    /// Only orientation is applied; positions stay where the scene put them.
    #[default]
    RotationOnly,
    /// Orientation and position are applied.
    Positional,
}

impl TrackingMode {
    pub fn from_flag(positional: bool) -> Self {
        if positional {
            TrackingMode::Positional
        } else {
            TrackingMode::RotationOnly
        }
    }
}

/// `(w, x, y, z) -> (w, x, -y, -z)`.  No normalisation is applied.
pub fn quaternion_to_local(q: DeviceQuaternion) -> Quaternion {
    Quaternion::new(q.w, q.x, -q.y, -q.z)
}

/// Centimetres to metres, with the X axis mirrored.
pub fn vector_to_local(v: DeviceVector) -> Vec3 {
    Vec3::new(-v.x / 100.0, v.y / 100.0, v.z / 100.0)
}

/// Convert a device pose.  The translation is zero unless `mode` is
/// [`TrackingMode::Positional`].
pub fn pose_to_local(pose: &DevicePose, mode: TrackingMode) -> Transform3D {
    let translation = match mode {
        TrackingMode::Positional => vector_to_local(pose.position),
        TrackingMode::RotationOnly => Vec3::zero(),
    };
    Transform3D::new(translation, quaternion_to_local(pose.orientation))
}
