//! `manus-types` – shared data model for the glove pipeline.
//!
//! Everything that crosses a crate boundary lives here: hand / finger
//! identifiers, the raw device records returned by a transport, the discrete
//! [`Gesture`] labels, the [`HandEvent`] stream and the error taxonomy.
//!
//! Device records are kept in *device space* ([`DeviceVector`],
//! [`DeviceQuaternion`]).  Conversion into engine space happens in
//! `manus-perception::conversion`, so the two coordinate conventions can
//! never be mixed up by accident.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Identifiers
// ────────────────────────────────────────────────────────────────────────────

/// Which glove a request or sample refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandSide {
    Left,
    Right,
}

impl HandSide {
    /// Both hands, in polling order.
    pub const ALL: [HandSide; 2] = [HandSide::Left, HandSide::Right];

    /// Index used by the vendor library (`0` = left, `1` = right).
    pub fn native_index(self) -> i32 {
        match self {
            HandSide::Left => 0,
            HandSide::Right => 1,
        }
    }
}

impl fmt::Display for HandSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandSide::Left => write!(f, "left"),
            HandSide::Right => write!(f, "right"),
        }
    }
}

/// The five fingers, in the order the glove reports bend values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Finger {
    Thumb = 0,
    Index = 1,
    Middle = 2,
    Ring = 3,
    Pinky = 4,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Bone segments along a finger, from the knuckle to the fingertip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FingerPart {
    Knuckle = 0,
    Proximal = 1,
    Intermediate = 2,
    /// The fingertip bone.
    Distal = 3,
}

impl FingerPart {
    pub const ALL: [FingerPart; 4] = [
        FingerPart::Knuckle,
        FingerPart::Proximal,
        FingerPart::Intermediate,
        FingerPart::Distal,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Discrete hand pose label, recomputed from bend values every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gesture {
    #[default]
    Default,
    Point,
    ObsceneGesture,
    ThumbsUp,
    Fist,
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Gesture::Default => "default",
            Gesture::Point => "point",
            Gesture::ObsceneGesture => "obscene",
            Gesture::ThumbsUp => "thumbs-up",
            Gesture::Fist => "fist",
        };
        f.write_str(s)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Device-space records
// ────────────────────────────────────────────────────────────────────────────

/// Three-component vector in device space.  Depending on the field it holds
/// an acceleration (g), Euler angles (degrees) or a position (centimetres).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceVector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl DeviceVector {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Orientation quaternion in device space (w, x, y, z).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceQuaternion {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl DeviceQuaternion {
    pub fn new(w: f32, x: f32, y: f32, z: f32) -> Self {
        Self { w, x, y, z }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0)
    }
}

impl Default for DeviceQuaternion {
    fn default() -> Self {
        Self::identity()
    }
}

/// Number of bend sensors on a glove.
pub const FINGER_COUNT: usize = 5;

/// One raw data packet from a glove.
///
/// Samples are immutable snapshots; every poll returns a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceSample {
    /// Linear acceleration in g.
    pub acceleration: DeviceVector,
    /// Orientation as Euler angles in degrees.
    pub euler: DeviceVector,
    /// Orientation as a quaternion.
    pub quaternion: DeviceQuaternion,
    /// Normalised bend per finger, `0.0` open to `1.0` closed.
    pub fingers: [f32; FINGER_COUNT],
    /// Packet sequence number.
    pub sequence: u32,
}

impl DeviceSample {
    /// A sample carrying only bend values (identity orientation, no motion).
    pub fn with_fingers(fingers: [f32; FINGER_COUNT]) -> Self {
        Self {
            fingers,
            ..Self::default()
        }
    }

    pub fn bend(&self, finger: Finger) -> f32 {
        self.fingers[finger.index()]
    }
}

/// Orientation plus position of a single bone or the palm, in device space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DevicePose {
    pub orientation: DeviceQuaternion,
    /// Position in centimetres.
    pub position: DeviceVector,
}

/// Full skeletal model reported by transports that support it: the palm
/// pose and four bone poses per finger (knuckle to fingertip).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviceSkeletal {
    pub palm: DevicePose,
    pub fingers: [[DevicePose; 4]; FINGER_COUNT],
}

/// Which sensors a calibration run should touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationFlags {
    pub gyro: bool,
    pub accel: bool,
    pub fingers: bool,
}

impl Default for CalibrationFlags {
    fn default() -> Self {
        Self {
            gyro: true,
            accel: true,
            fingers: false,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Events
// ────────────────────────────────────────────────────────────────────────────

/// Something noteworthy that happened to a hand during a frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub hand: HandSide,
    pub payload: HandEventPayload,
}

impl HandEvent {
    pub fn new(hand: HandSide, payload: HandEventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            hand,
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HandEventPayload {
    GestureChanged { from: Gesture, to: Gesture },
    /// The transport stopped delivering samples; visual state is frozen.
    TransportLost { reason: TransportError },
    TransportRestored,
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Failure reported by a device transport.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransportError {
    #[error("glove not connected")]
    NotConnected,

    #[error("invalid argument")]
    InvalidArgument,

    #[error("value out of range")]
    OutOfRange,

    #[error("glove disconnected")]
    Disconnected,

    #[error("transport error: {0}")]
    Generic(String),
}

impl TransportError {
    /// Translate a vendor library status code.
    ///
    /// `0` is success; `1`, `2` and `3` map to their dedicated variants and
    /// anything else is reported as [`TransportError::Generic`].
    pub fn from_status(code: i32) -> Result<(), TransportError> {
        match code {
            0 => Ok(()),
            1 => Err(TransportError::InvalidArgument),
            2 => Err(TransportError::OutOfRange),
            3 => Err(TransportError::Disconnected),
            other => Err(TransportError::Generic(format!("status code {other}"))),
        }
    }
}

/// Error type spanning the whole glove pipeline.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ManusError {
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(#[from] TransportError),

    #[error("Bone not found: {path}")]
    NodeNotFound { path: String },

    #[error("Invalid sample: {0}")]
    InvalidSample(String),

    #[error("Asset error: {0}")]
    Asset(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finger_indices_follow_glove_order() {
        assert_eq!(Finger::Thumb.index(), 0);
        assert_eq!(Finger::Pinky.index(), 4);
        assert_eq!(Finger::from_index(1), Some(Finger::Index));
        assert_eq!(Finger::from_index(5), None);
        assert_eq!(FingerPart::from_index(3), Some(FingerPart::Distal));
        assert_eq!(FingerPart::from_index(4), None);
    }

    #[test]
    fn hand_side_native_index() {
        assert_eq!(HandSide::Left.native_index(), 0);
        assert_eq!(HandSide::Right.native_index(), 1);
        assert_eq!(HandSide::Right.to_string(), "right");
    }

    #[test]
    fn default_sample_has_identity_orientation() {
        let s = DeviceSample::default();
        assert_eq!(s.quaternion, DeviceQuaternion::identity());
        assert_eq!(s.fingers, [0.0; FINGER_COUNT]);
    }

    #[test]
    fn sample_bend_accessor() {
        let s = DeviceSample::with_fingers([0.1, 0.2, 0.3, 0.4, 0.5]);
        assert!((s.bend(Finger::Middle) - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn status_codes_map_to_errors() {
        assert!(TransportError::from_status(0).is_ok());
        assert_eq!(
            TransportError::from_status(1),
            Err(TransportError::InvalidArgument)
        );
        assert_eq!(TransportError::from_status(2), Err(TransportError::OutOfRange));
        assert_eq!(
            TransportError::from_status(3),
            Err(TransportError::Disconnected)
        );
        assert!(matches!(
            TransportError::from_status(-1),
            Err(TransportError::Generic(_))
        ));
    }

    #[test]
    fn transport_error_converts_into_manus_error() {
        let err: ManusError = TransportError::Disconnected.into();
        assert!(err.to_string().contains("Transport unavailable"));
        assert!(err.to_string().contains("disconnected"));
    }

    #[test]
    fn hand_event_roundtrip() {
        let event = HandEvent::new(
            HandSide::Right,
            HandEventPayload::GestureChanged {
                from: Gesture::Default,
                to: Gesture::Point,
            },
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: HandEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event.id, back.id);
        assert_eq!(back.hand, HandSide::Right);
        assert_eq!(event.payload, back.payload);
    }

    #[test]
    fn hand_side_serializes_lowercase() {
        let json = serde_json::to_string(&HandSide::Left).unwrap();
        assert_eq!(json, "\"left\"");
    }
}
