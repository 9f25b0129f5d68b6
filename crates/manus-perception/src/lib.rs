//! `manus-perception` – from raw glove data to a posed hand.
//!
//! Everything in this crate is pure computation over engine-space data; no
//! I/O happens here apart from loading JSON assets.
//!
//! # Modules
//!
//! - [`math`] – [`Vec3`][math::Vec3], [`Quaternion`][math::Quaternion],
//!   [`Transform3D`][math::Transform3D] and [`Ray`][math::Ray].
//! - [`conversion`] – device-space to engine-space conversion and the
//!   [`TrackingMode`][conversion::TrackingMode] switch for positional data.
//! - [`gesture`] – [`classify`][gesture::classify]: five bend values to a
//!   [`Gesture`][manus_types::Gesture].
//! - [`skeleton`] – [`BoneHierarchy`][skeleton::BoneHierarchy]: named bone
//!   tree with `Finger_<finger><part>` lookups and world transforms.
//! - [`pose`] – [`PoseClip`][pose::PoseClip]: keyframed open-to-fist
//!   reference pose.
//! - [`retarget`] – [`Retargeter`][retarget::Retargeter]: writes sampled
//!   reference rotations onto a live skeleton.

pub mod conversion;
pub mod gesture;
pub mod math;
pub mod pose;
pub mod retarget;
pub mod skeleton;

pub use conversion::{TrackingMode, pose_to_local, quaternion_to_local, vector_to_local};
pub use gesture::classify;
pub use math::{Quaternion, Ray, Transform3D, Vec3};
pub use pose::{PoseClip, ReferencePose};
pub use retarget::Retargeter;
pub use skeleton::{BoneHierarchy, BoneId, lookup_bone, lookup_fingertip};
