//! Platform-bridge backend.
//!
//! On mobile platforms the glove SDK lives in a host-side object (e.g. a JVM
//! class reached through JNI) rather than a shared library.  The host exposes
//! it through [`BridgeObject`]; [`BridgeTransport`] attaches to one lazily at
//! [`init`][DeviceTransport::init] and drops it at
//! [`shutdown`][DeviceTransport::shutdown].

use manus_types::{CalibrationFlags, DeviceSample, HandSide, TransportError};
use tracing::{debug, warn};

use crate::record::decode_bridge_floats;
use crate::transport::{DeviceTransport, check_power};

/// Host-side glove SDK handle.  Methods mirror the vendor bridge calls and
/// return the vendor status codes.
pub trait BridgeObject: Send {
    /// Flat data array for the hand with native index `hand`; see
    /// [`decode_bridge_floats`] for the layout.
    fn get_data(&mut self, hand: i32) -> Vec<f32>;

    fn set_vibration(&mut self, hand: i32, power: f32) -> i32;

    fn calibrate(&mut self, hand: i32, gyro: bool, accel: bool, fingers: bool) -> i32;

    fn set_handedness(&mut self, hand: i32, right_hand: bool) -> i32;
}

/// Creates the host object on demand.  Returns `None` when the platform
/// cannot provide one (no activity, SDK missing, …).
pub type BridgeFactory = Box<dyn FnMut() -> Option<Box<dyn BridgeObject>> + Send>;

/// [`DeviceTransport`] backed by a [`BridgeObject`].
pub struct BridgeTransport {
    factory: BridgeFactory,
    object: Option<Box<dyn BridgeObject>>,
}

impl BridgeTransport {
    pub fn new(factory: BridgeFactory) -> Self {
        Self {
            factory,
            object: None,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.object.is_some()
    }

    fn object(&mut self) -> Result<&mut Box<dyn BridgeObject>, TransportError> {
        self.object.as_mut().ok_or(TransportError::NotConnected)
    }
}

impl DeviceTransport for BridgeTransport {
    fn name(&self) -> &str {
        "bridge"
    }

    fn init(&mut self) -> Result<(), TransportError> {
        if self.object.is_some() {
            return Ok(());
        }
        match (self.factory)() {
            Some(object) => {
                self.object = Some(object);
                debug!("attached to platform bridge");
                Ok(())
            }
            None => Err(TransportError::Generic(
                "platform bridge object unavailable".to_string(),
            )),
        }
    }

    fn shutdown(&mut self) -> Result<(), TransportError> {
        match self.object.take() {
            Some(_) => Ok(()),
            None => Err(TransportError::NotConnected),
        }
    }

    fn get_sample(&mut self, hand: HandSide) -> Result<DeviceSample, TransportError> {
        let data = self.object()?.get_data(hand.native_index());
        decode_bridge_floats(&data).map_err(|e| {
            warn!(%hand, error = %e, "platform bridge returned malformed data");
            TransportError::Generic(e.to_string())
        })
    }

    fn set_vibration(&mut self, hand: HandSide, power: f32) -> Result<(), TransportError> {
        let power = check_power(power)?;
        let code = self.object()?.set_vibration(hand.native_index(), power);
        TransportError::from_status(code)
    }

    fn calibrate(&mut self, hand: HandSide, flags: CalibrationFlags) -> Result<(), TransportError> {
        let code = self.object()?.calibrate(
            hand.native_index(),
            flags.gyro,
            flags.accel,
            flags.fingers,
        );
        TransportError::from_status(code)
    }

    fn set_handedness(&mut self, hand: HandSide, right_hand: bool) -> Result<(), TransportError> {
        let code = self
            .object()?
            .set_handedness(hand.native_index(), right_hand);
        TransportError::from_status(code)
    }
}
