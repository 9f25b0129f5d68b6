//! Desktop backend linking the vendor `Manus` shared library.
//!
//! Only compiled with the `native` feature so that default builds never need
//! the proprietary library on the linker path.

use std::os::raw::c_int;

use manus_types::{
    CalibrationFlags, DevicePose, DeviceQuaternion, DeviceSample, DeviceSkeletal, DeviceVector,
    HandSide, TransportError,
};
use tracing::{debug, info};

use crate::record::RawGloveData;
use crate::transport::{DeviceTransport, check_power};

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct RawPose {
    orientation: [f32; 4],
    position: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct RawFinger {
    bones: [RawPose; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct RawSkeletal {
    palm: RawPose,
    fingers: [RawFinger; 5],
}

#[link(name = "Manus")]
unsafe extern "C" {
    fn ManusInit() -> c_int;
    fn ManusExit() -> c_int;
    fn ManusGetData(hand: c_int, data: *mut RawGloveData, timeout: u32) -> c_int;
    fn ManusGetSkeletal(hand: c_int, model: *mut RawSkeletal, timeout: u32) -> c_int;
    fn ManusSetHandedness(hand: c_int, right_hand: bool) -> c_int;
    fn ManusCalibrate(hand: c_int, gyro: bool, accel: bool, fingers: bool) -> c_int;
    fn ManusSetVibration(hand: c_int, power: f32) -> c_int;
}

/// [`DeviceTransport`] over the vendor C API.
#[derive(Debug)]
pub struct NativeTransport {
    timeout_ms: u32,
}

impl NativeTransport {
    /// `timeout_ms` bounds every data query; `0` returns immediately.
    pub fn new(timeout_ms: u32) -> Self {
        Self { timeout_ms }
    }
}

impl DeviceTransport for NativeTransport {
    fn name(&self) -> &str {
        "native"
    }

    fn stamps_sequence(&self) -> bool {
        true
    }

    fn init(&mut self) -> Result<(), TransportError> {
        // SAFETY: takes no arguments; the library tolerates repeated calls.
        let code = unsafe { ManusInit() };
        info!(code, "vendor library initialised");
        TransportError::from_status(code)
    }

    fn shutdown(&mut self) -> Result<(), TransportError> {
        // SAFETY: takes no arguments.
        TransportError::from_status(unsafe { ManusExit() })
    }

    fn get_sample(&mut self, hand: HandSide) -> Result<DeviceSample, TransportError> {
        let mut raw = RawGloveData::default();
        // SAFETY: `raw` is a valid, properly aligned `#[repr(C)]` buffer that
        // outlives the call.
        let code = unsafe { ManusGetData(hand.native_index(), &mut raw, self.timeout_ms) };
        TransportError::from_status(code)?;
        Ok(raw.into())
    }

    fn set_vibration(&mut self, hand: HandSide, power: f32) -> Result<(), TransportError> {
        let power = check_power(power)?;
        // SAFETY: plain value arguments.
        TransportError::from_status(unsafe { ManusSetVibration(hand.native_index(), power) })
    }

    fn get_skeletal(&mut self, hand: HandSide) -> Result<DeviceSkeletal, TransportError> {
        let mut raw = RawSkeletal::default();
        // SAFETY: `raw` is a valid `#[repr(C)]` buffer that outlives the call.
        let code = unsafe { ManusGetSkeletal(hand.native_index(), &mut raw, self.timeout_ms) };
        TransportError::from_status(code)?;

        let mut skeletal = DeviceSkeletal {
            palm: pose(raw.palm),
            ..DeviceSkeletal::default()
        };
        for (dst, src) in skeletal.fingers.iter_mut().zip(raw.fingers.iter()) {
            for (bone, raw_bone) in dst.iter_mut().zip(src.bones.iter()) {
                *bone = pose(*raw_bone);
            }
        }
        Ok(skeletal)
    }

    fn calibrate(&mut self, hand: HandSide, flags: CalibrationFlags) -> Result<(), TransportError> {
        debug!(%hand, ?flags, "calibrating glove");
        // SAFETY: plain value arguments.
        let code = unsafe {
            ManusCalibrate(hand.native_index(), flags.gyro, flags.accel, flags.fingers)
        };
        TransportError::from_status(code)
    }

    fn set_handedness(&mut self, hand: HandSide, right_hand: bool) -> Result<(), TransportError> {
        // SAFETY: plain value arguments.
        TransportError::from_status(unsafe { ManusSetHandedness(hand.native_index(), right_hand) })
    }
}

fn pose(raw: RawPose) -> DevicePose {
    let [w, x, y, z] = raw.orientation;
    let [px, py, pz] = raw.position;
    DevicePose {
        orientation: DeviceQuaternion::new(w, x, y, z),
        position: DeviceVector::new(px, py, pz),
    }
}
