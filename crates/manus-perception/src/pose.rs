//! Reference pose clips.
//!
//! A clip stores keyframed local rotations for the finger bones of a hand,
//! running from a fully open hand at time `0` to a fully closed hand at the
//! end of the clip.  The retargeter samples it once per finger at
//! `bend * time_scale` and copies the resulting rotations onto the live
//! skeleton.

use std::collections::HashMap;
use std::path::Path;

use manus_types::{Finger, FingerPart, ManusError};
use serde::{Deserialize, Serialize};

use crate::math::{Quaternion, Vec3};
use crate::skeleton::bone_name;

/// Source of per-finger bone rotations for a given clip time.
pub trait ReferencePose: Send {
    /// Local rotations of the four bones of `finger` (knuckle to fingertip)
    /// at `time`.
    fn sample(&self, finger: Finger, time: f32) -> [Quaternion; 4];
}

/// One rotation key on a bone track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub rotation: Quaternion,
}

/// Keyframed animation clip keyed by bone name.
///
/// Serialised as a map from bone name to keyframes; deserialisation goes
/// through [`PoseClip::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HashMap<String, Vec<Keyframe>>", into = "HashMap<String, Vec<Keyframe>>")]
pub struct PoseClip {
    tracks: HashMap<String, Vec<Keyframe>>,
}

impl PoseClip {
    /// Build a clip from bone tracks.  Keys are sorted by time.
    ///
    /// # Errors
    ///
    /// Returns [`ManusError::Asset`] when a track is empty or holds a
    /// non-finite time.
    pub fn new(mut tracks: HashMap<String, Vec<Keyframe>>) -> Result<Self, ManusError> {
        for (bone, keys) in tracks.iter_mut() {
            if keys.is_empty() {
                return Err(ManusError::Asset(format!("track '{bone}' has no keyframes")));
            }
            if keys.iter().any(|k| !k.time.is_finite()) {
                return Err(ManusError::Asset(format!("track '{bone}' has a non-finite key time")));
            }
            keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        }
        Ok(Self { tracks })
    }

    pub fn from_json(json: &str) -> Result<Self, ManusError> {
        serde_json::from_str(json).map_err(|e| ManusError::Asset(format!("invalid pose clip: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self, ManusError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ManusError::Asset(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    /// Procedural open-to-fist clip spanning `0..=10`.  Every bone curls
    /// around its local +X axis; the thumb curls less than the fingers.
    pub fn default_curl() -> Self {
        const FINGER_CURL_DEG: [f32; 4] = [5.0, 45.0, 50.0, 30.0];
        const THUMB_CURL_DEG: [f32; 4] = [10.0, 20.0, 25.0, 20.0];
        const END: f32 = 10.0;

        let mut tracks = HashMap::new();
        for finger in Finger::ALL {
            let curl = if finger == Finger::Thumb {
                THUMB_CURL_DEG
            } else {
                FINGER_CURL_DEG
            };
            for part in FingerPart::ALL {
                let closed = Quaternion::from_axis_angle(
                    Vec3::new(1.0, 0.0, 0.0),
                    curl[part.index()].to_radians(),
                );
                tracks.insert(
                    bone_name(finger, part),
                    vec![
                        Keyframe {
                            time: 0.0,
                            rotation: Quaternion::identity(),
                        },
                        Keyframe {
                            time: END,
                            rotation: closed,
                        },
                    ],
                );
            }
        }
        Self { tracks }
    }

    /// Latest key time across all tracks.
    pub fn duration(&self) -> f32 {
        self.tracks
            .values()
            .filter_map(|keys| keys.last())
            .map(|k| k.time)
            .fold(0.0, f32::max)
    }

    /// Rotation of `bone` at `time`, clamped to the track's key range.
    /// Bones without a track stay at the identity rotation; a NaN `time`
    /// samples the first key.
    pub fn sample_bone(&self, bone: &str, time: f32) -> Quaternion {
        let Some(keys) = self.tracks.get(bone) else {
            return Quaternion::identity();
        };
        // Keys are non-empty by construction.
        let first = keys[0];
        let last = keys[keys.len() - 1];
        if time.is_nan() || time <= first.time {
            return first.rotation;
        }
        if time >= last.time {
            return last.rotation;
        }

        let next = keys.partition_point(|k| k.time <= time);
        let (a, b) = (keys[next - 1], keys[next]);
        let span = b.time - a.time;
        if span <= f32::EPSILON {
            return b.rotation;
        }
        a.rotation.slerp(b.rotation, (time - a.time) / span)
    }
}

impl TryFrom<HashMap<String, Vec<Keyframe>>> for PoseClip {
    type Error = ManusError;

    fn try_from(tracks: HashMap<String, Vec<Keyframe>>) -> Result<Self, Self::Error> {
        Self::new(tracks)
    }
}

impl From<PoseClip> for HashMap<String, Vec<Keyframe>> {
    fn from(clip: PoseClip) -> Self {
        clip.tracks
    }
}

impl ReferencePose for PoseClip {
    fn sample(&self, finger: Finger, time: f32) -> [Quaternion; 4] {
        FingerPart::ALL.map(|part| self.sample_bone(&bone_name(finger, part), time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn angle_between(a: Quaternion, b: Quaternion) -> f32 {
        2.0 * a.dot(b).abs().min(1.0).acos()
    }

    #[test]
    fn default_curl_is_open_at_zero_and_closed_at_end() {
        let clip = PoseClip::default_curl();
        assert!((clip.duration() - 10.0).abs() < f32::EPSILON);

        let open = clip.sample(Finger::Index, 0.0);
        assert!(open.iter().all(|&q| q == Quaternion::identity()));

        let closed = clip.sample(Finger::Index, 10.0);
        let expected = Quaternion::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), 50f32.to_radians());
        assert!(angle_between(closed[2], expected) < 1e-4);
    }

    #[test]
    fn sample_halfway_interpolates() {
        let clip = PoseClip::default_curl();
        let half = clip.sample_bone("Finger_12", 5.0);
        let expected = Quaternion::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), 25f32.to_radians());
        assert!(angle_between(half, expected) < 1e-4);
    }

    #[test]
    fn sample_clamps_outside_range() {
        let clip = PoseClip::default_curl();
        assert_eq!(clip.sample_bone("Finger_21", -5.0), Quaternion::identity());
        assert_eq!(
            clip.sample_bone("Finger_21", 25.0),
            clip.sample_bone("Finger_21", 10.0)
        );
    }

    #[test]
    fn nan_time_samples_first_key() {
        let clip = PoseClip::default_curl();
        assert_eq!(clip.sample_bone("Finger_12", f32::NAN), Quaternion::identity());
        let closed = clip.sample(Finger::Index, f32::INFINITY);
        assert_eq!(closed, clip.sample(Finger::Index, 10.0));
    }

    #[test]
    fn serde_rejects_invalid_tracks() {
        assert!(serde_json::from_str::<PoseClip>(r#"{ "Finger_00": [] }"#).is_err());
        let json = serde_json::to_string(&PoseClip::default_curl()).unwrap();
        let back: PoseClip = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PoseClip::default_curl());
    }

    #[test]
    fn unknown_bone_is_identity() {
        let clip = PoseClip::default_curl();
        assert_eq!(clip.sample_bone("Wrist", 3.0), Quaternion::identity());
    }

    #[test]
    fn json_clip_sorts_keys() {
        let json = r#"{
            "Finger_13": [
                { "time": 2.0, "rotation": { "w": 0.0, "x": 1.0, "y": 0.0, "z": 0.0 } },
                { "time": 0.0, "rotation": { "w": 1.0, "x": 0.0, "y": 0.0, "z": 0.0 } }
            ]
        }"#;
        let clip = PoseClip::from_json(json).unwrap();
        assert_eq!(clip.sample_bone("Finger_13", 0.0), Quaternion::identity());
        assert_eq!(
            clip.sample_bone("Finger_13", 2.0),
            Quaternion::new(0.0, 1.0, 0.0, 0.0)
        );
        assert!((clip.duration() - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_track_is_rejected() {
        let err = PoseClip::from_json(r#"{ "Finger_00": [] }"#).unwrap_err();
        assert!(matches!(err, ManusError::Asset(_)));
    }

    #[test]
    fn single_key_track_is_constant() {
        let mut tracks = HashMap::new();
        let q = Quaternion::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), 0.3);
        tracks.insert("Finger_40".to_string(), vec![Keyframe { time: 1.0, rotation: q }]);
        let clip = PoseClip::new(tracks).unwrap();
        assert_eq!(clip.sample_bone("Finger_40", 0.0), q);
        assert_eq!(clip.sample_bone("Finger_40", 7.0), q);
    }
}
