//! In-process glove simulator for tests and headless runs.
//!
//! [`SimTransport`] replays a per-hand script of samples (or failures) and
//! records every haptic command it receives, so the full pipeline can run in
//! CI without a glove attached.
//!
//! # Example
//!
//! ```rust
//! use manus_hal::sim::SimTransport;
//! use manus_hal::transport::DeviceTransport;
//! use manus_types::{DeviceSample, HandSide};
//!
//! let mut glove = SimTransport::builder()
//!     .with_samples(HandSide::Right, [DeviceSample::with_fingers([1.0, 0.0, 1.0, 1.0, 1.0])])
//!     .build();
//!
//! glove.init().unwrap();
//! let sample = glove.get_sample(HandSide::Right).unwrap();
//! assert_eq!(sample.sequence, 1);
//! ```

use std::collections::{HashMap, VecDeque};

use manus_types::{
    CalibrationFlags, DevicePose, DeviceQuaternion, DeviceSample, DeviceSkeletal, DeviceVector,
    HandSide, TransportError,
};
use tracing::debug;

use crate::transport::{DeviceTransport, check_power};

/// What a hand reports once its script has been consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AfterScript {
    /// Keep returning the last delivered sample, sequence number unchanged.
    #[default]
    RepeatLast,
    /// Report [`TransportError::Disconnected`].
    Disconnect,
    /// Start the script again from the beginning.
    Loop,
}

// ────────────────────────────────────────────────────────────────────────────
// Per-hand state
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct SimHand {
    script: VecDeque<Result<DeviceSample, TransportError>>,
    replay: Vec<Result<DeviceSample, TransportError>>,
    last: Option<DeviceSample>,
    sequence: u32,
    vibration: f32,
    calibrations: u32,
    right_handed: Option<bool>,
    palm_position: DeviceVector,
}

impl SimHand {
    fn next(&mut self, after: AfterScript) -> Result<DeviceSample, TransportError> {
        if self.script.is_empty() && after == AfterScript::Loop {
            self.script.extend(self.replay.iter().cloned());
        }
        match self.script.pop_front() {
            Some(Ok(mut sample)) => {
                self.sequence = self.sequence.wrapping_add(1);
                sample.sequence = self.sequence;
                self.last = Some(sample);
                Ok(sample)
            }
            Some(Err(e)) => Err(e),
            None => match (after, self.last) {
                (AfterScript::RepeatLast, Some(last)) => Ok(last),
                (AfterScript::RepeatLast, None) => Err(TransportError::NotConnected),
                _ => Err(TransportError::Disconnected),
            },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimTransport
// ────────────────────────────────────────────────────────────────────────────

/// Scripted [`DeviceTransport`].  Always available; never touches hardware.
///
/// Every delivered sample is stamped with a per-hand, monotonically
/// increasing sequence number starting at `1`.  Hands without a script
/// report [`TransportError::NotConnected`].
#[derive(Debug)]
pub struct SimTransport {
    hands: HashMap<HandSide, SimHand>,
    after_script: AfterScript,
    initialised: bool,
}

impl SimTransport {
    pub fn builder() -> SimTransportBuilder {
        SimTransportBuilder::default()
    }

    /// Append a sample to the script of `hand`, connecting it if needed.
    pub fn push_sample(&mut self, hand: HandSide, sample: DeviceSample) {
        self.hands.entry(hand).or_default().script.push_back(Ok(sample));
    }

    /// Append a failure to the script of `hand`.
    pub fn push_failure(&mut self, hand: HandSide, error: TransportError) {
        self.hands.entry(hand).or_default().script.push_back(Err(error));
    }

    /// Most recent vibration power set for `hand`.
    pub fn vibration(&self, hand: HandSide) -> f32 {
        self.hands.get(&hand).map_or(0.0, |h| h.vibration)
    }

    /// Number of calibration runs requested for `hand`.
    pub fn calibrations(&self, hand: HandSide) -> u32 {
        self.hands.get(&hand).map_or(0, |h| h.calibrations)
    }

    pub fn handedness(&self, hand: HandSide) -> Option<bool> {
        self.hands.get(&hand).and_then(|h| h.right_handed)
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    fn hand_mut(&mut self, hand: HandSide) -> Result<&mut SimHand, TransportError> {
        if !self.initialised {
            return Err(TransportError::NotConnected);
        }
        self.hands.get_mut(&hand).ok_or(TransportError::NotConnected)
    }
}

impl DeviceTransport for SimTransport {
    fn name(&self) -> &str {
        "sim"
    }

    fn stamps_sequence(&self) -> bool {
        true
    }

    fn init(&mut self) -> Result<(), TransportError> {
        self.initialised = true;
        debug!(hands = self.hands.len(), "sim transport initialised");
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), TransportError> {
        self.initialised = false;
        Ok(())
    }

    fn get_sample(&mut self, hand: HandSide) -> Result<DeviceSample, TransportError> {
        let after = self.after_script;
        self.hand_mut(hand)?.next(after)
    }

    fn set_vibration(&mut self, hand: HandSide, power: f32) -> Result<(), TransportError> {
        let power = check_power(power)?;
        self.hand_mut(hand)?.vibration = power;
        Ok(())
    }

    fn get_skeletal(&mut self, hand: HandSide) -> Result<DeviceSkeletal, TransportError> {
        let h = self.hand_mut(hand)?;
        let orientation = h.last.map_or(DeviceQuaternion::identity(), |s| s.quaternion);
        Ok(DeviceSkeletal {
            palm: DevicePose {
                orientation,
                position: h.palm_position,
            },
            ..DeviceSkeletal::default()
        })
    }

    fn calibrate(&mut self, hand: HandSide, flags: CalibrationFlags) -> Result<(), TransportError> {
        debug!(%hand, ?flags, "sim calibration");
        self.hand_mut(hand)?.calibrations += 1;
        Ok(())
    }

    fn set_handedness(&mut self, hand: HandSide, right_hand: bool) -> Result<(), TransportError> {
        self.hand_mut(hand)?.right_handed = Some(right_hand);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Builder
// ────────────────────────────────────────────────────────────────────────────

/// Builder for [`SimTransport`].
#[derive(Debug, Default)]
pub struct SimTransportBuilder {
    hands: HashMap<HandSide, SimHand>,
    after_script: AfterScript,
}

impl SimTransportBuilder {
    /// Connect `hand` with an empty script.
    pub fn with_hand(mut self, hand: HandSide) -> Self {
        self.hands.entry(hand).or_default();
        self
    }

    /// Queue `samples` for `hand`.
    pub fn with_samples(
        mut self,
        hand: HandSide,
        samples: impl IntoIterator<Item = DeviceSample>,
    ) -> Self {
        self.hands
            .entry(hand)
            .or_default()
            .script
            .extend(samples.into_iter().map(Ok));
        self
    }

    /// Queue a mixed script of samples and failures for `hand`.
    pub fn with_script(
        mut self,
        hand: HandSide,
        script: impl IntoIterator<Item = Result<DeviceSample, TransportError>>,
    ) -> Self {
        self.hands.entry(hand).or_default().script.extend(script);
        self
    }

    /// Queue the canonical gesture tour for `hand`, see [`gesture_tour`].
    pub fn with_gesture_tour(self, hand: HandSide, frames_per_pose: usize) -> Self {
        self.with_samples(hand, gesture_tour(frames_per_pose))
    }

    /// Palm position (centimetres) reported by skeletal queries.
    pub fn with_palm_position(mut self, hand: HandSide, position: DeviceVector) -> Self {
        self.hands.entry(hand).or_default().palm_position = position;
        self
    }

    pub fn after_script(mut self, after: AfterScript) -> Self {
        self.after_script = after;
        self
    }

    pub fn build(mut self) -> SimTransport {
        for hand in self.hands.values_mut() {
            hand.replay = hand.script.iter().cloned().collect();
        }
        SimTransport {
            hands: self.hands,
            after_script: self.after_script,
            initialised: false,
        }
    }
}

/// Bend values for an open hand, pointing, middle finger, thumbs-up and a
/// fist, in that order.
pub const TOUR_POSES: [[f32; 5]; 5] = [
    [0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0, 0.0, 1.0, 1.0, 1.0],
    [1.0, 1.0, 0.0, 1.0, 1.0],
    [0.0, 1.0, 1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0, 1.0, 1.0],
];

/// Samples that hold each of [`TOUR_POSES`] for `frames_per_pose` frames
/// while the wrist slowly yaws around the device Y axis.
pub fn gesture_tour(frames_per_pose: usize) -> Vec<DeviceSample> {
    let frames_per_pose = frames_per_pose.max(1);
    let total = TOUR_POSES.len() * frames_per_pose;
    (0..total)
        .map(|frame| {
            let half_angle = std::f32::consts::PI * frame as f32 / total as f32 / 2.0;
            DeviceSample {
                quaternion: DeviceQuaternion::new(half_angle.cos(), 0.0, half_angle.sin(), 0.0),
                acceleration: DeviceVector::new(0.0, 0.0, 1.0),
                ..DeviceSample::with_fingers(TOUR_POSES[frame / frames_per_pose])
            }
        })
        .collect()
}
