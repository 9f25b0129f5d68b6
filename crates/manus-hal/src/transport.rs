//! Generic `DeviceTransport` trait for glove backends.
//!
//! Backends implement this trait and are selected once at startup by
//! [`open_backend`][crate::backend::open_backend].  The rest of the pipeline
//! only ever talks to the trait, so a native library, a mobile platform
//! bridge and the in-process simulator are interchangeable.

use manus_types::{
    CalibrationFlags, DeviceSample, DeviceSkeletal, HandSide, TransportError,
};

/// Source of glove samples and sink for haptic commands.
pub trait DeviceTransport: Send {
    /// Short backend name for logs, e.g. `"sim"` or `"native"`.
    fn name(&self) -> &str;

    /// Open the connection to the glove driver.
    ///
    /// Gloves may connect some time after this returns; a successful `init`
    /// does not imply [`get_sample`][Self::get_sample] succeeds right away.
    fn init(&mut self) -> Result<(), TransportError>;

    /// Release the connection to the glove driver.
    fn shutdown(&mut self) -> Result<(), TransportError>;

    /// `true` when every sample carries a real packet sequence number, so a
    /// repeated number means the glove sent nothing new.  Transports that
    /// leave the sequence at `0` must keep the default.
    fn stamps_sequence(&self) -> bool {
        false
    }

    /// Fetch the latest sample for `hand`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NotConnected`] or
    /// [`TransportError::Disconnected`] while no glove is delivering data.
    fn get_sample(&mut self, hand: HandSide) -> Result<DeviceSample, TransportError>;

    /// Set the vibration motor output for `hand`, `power` in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::OutOfRange`] when `power` lies outside
    /// `[0, 1]`.
    fn set_vibration(&mut self, hand: HandSide, power: f32) -> Result<(), TransportError>;

    /// Fetch the full skeletal model for `hand`.
    fn get_skeletal(&mut self, hand: HandSide) -> Result<DeviceSkeletal, TransportError> {
        let _ = hand;
        Err(unsupported(self.name(), "skeletal queries"))
    }

    /// Run the on-glove calibration routine.
    fn calibrate(&mut self, hand: HandSide, flags: CalibrationFlags) -> Result<(), TransportError> {
        let _ = (hand, flags);
        Err(unsupported(self.name(), "calibration"))
    }

    /// Tell the driver whether the glove on `hand` is worn on the right hand.
    fn set_handedness(&mut self, hand: HandSide, right_hand: bool) -> Result<(), TransportError> {
        let _ = (hand, right_hand);
        Err(unsupported(self.name(), "handedness changes"))
    }
}

/// Validate a vibration power value before it reaches a driver.
pub fn check_power(power: f32) -> Result<f32, TransportError> {
    if (0.0..=1.0).contains(&power) {
        Ok(power)
    } else {
        Err(TransportError::OutOfRange)
    }
}

fn unsupported(backend: &str, what: &str) -> TransportError {
    TransportError::Generic(format!("{backend} backend does not support {what}"))
}
