//! Fixed-layout glove data record.
//!
//! The vendor library fills a packed little-endian record:
//!
//! | Offset | Field | Type |
//! |---|---|---|
//! | 0  | acceleration (x, y, z) | 3 × f32 |
//! | 12 | euler (x, y, z)        | 3 × f32 |
//! | 24 | quaternion (w, x, y, z) | 4 × f32 |
//! | 40 | fingers (thumb … pinky) | 5 × f32 |
//! | 60 | packet sequence number | u32 |
//!
//! [`RawGloveData`] mirrors this layout for FFI; [`decode_record`] and
//! [`encode_record`] handle byte buffers received from sockets or files.
//! Mobile platform bridges hand over a flat `f32` array instead, decoded by
//! [`decode_bridge_floats`].

use manus_types::{DeviceQuaternion, DeviceSample, DeviceVector, FINGER_COUNT, ManusError};

/// Size of one encoded record in bytes.
pub const RECORD_LEN: usize = 64;

/// Number of floats in a platform-bridge data array
/// (acceleration 3, euler 3, quaternion 4, fingers 5).
pub const BRIDGE_FLOAT_COUNT: usize = 15;

/// C-compatible mirror of the vendor `GLOVE_DATA` struct.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawGloveData {
    pub acceleration: [f32; 3],
    pub euler: [f32; 3],
    pub quaternion: [f32; 4],
    pub fingers: [f32; FINGER_COUNT],
    pub packet_number: u32,
}

impl From<RawGloveData> for DeviceSample {
    fn from(raw: RawGloveData) -> Self {
        let [ax, ay, az] = raw.acceleration;
        let [ex, ey, ez] = raw.euler;
        let [qw, qx, qy, qz] = raw.quaternion;
        DeviceSample {
            acceleration: DeviceVector::new(ax, ay, az),
            euler: DeviceVector::new(ex, ey, ez),
            quaternion: DeviceQuaternion::new(qw, qx, qy, qz),
            fingers: raw.fingers,
            sequence: raw.packet_number,
        }
    }
}

/// Decode one record from `bytes`.
///
/// # Errors
///
/// Returns [`ManusError::InvalidSample`] when `bytes` is not exactly
/// [`RECORD_LEN`] bytes long.
pub fn decode_record(bytes: &[u8]) -> Result<DeviceSample, ManusError> {
    if bytes.len() != RECORD_LEN {
        return Err(ManusError::InvalidSample(format!(
            "record must be {RECORD_LEN} bytes, got {}",
            bytes.len()
        )));
    }

    let mut floats = [0f32; BRIDGE_FLOAT_COUNT];
    for (i, chunk) in bytes[..BRIDGE_FLOAT_COUNT * 4].chunks_exact(4).enumerate() {
        floats[i] = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    let tail = &bytes[BRIDGE_FLOAT_COUNT * 4..];
    let sequence = u32::from_le_bytes([tail[0], tail[1], tail[2], tail[3]]);

    let mut sample = sample_from_floats(&floats);
    sample.sequence = sequence;
    Ok(sample)
}

/// Encode `sample` into the fixed little-endian layout.
pub fn encode_record(sample: &DeviceSample) -> [u8; RECORD_LEN] {
    let q = sample.quaternion;
    let floats: [f32; BRIDGE_FLOAT_COUNT] = [
        sample.acceleration.x,
        sample.acceleration.y,
        sample.acceleration.z,
        sample.euler.x,
        sample.euler.y,
        sample.euler.z,
        q.w,
        q.x,
        q.y,
        q.z,
        sample.fingers[0],
        sample.fingers[1],
        sample.fingers[2],
        sample.fingers[3],
        sample.fingers[4],
    ];

    let mut out = [0u8; RECORD_LEN];
    for (i, f) in floats.iter().enumerate() {
        out[i * 4..i * 4 + 4].copy_from_slice(&f.to_le_bytes());
    }
    out[60..].copy_from_slice(&sample.sequence.to_le_bytes());
    out
}

/// Decode the flat float array returned by a mobile platform bridge.
///
/// Bridges carry no packet number, so `sequence` is left at `0`.
///
/// # Errors
///
/// Returns [`ManusError::InvalidSample`] unless exactly
/// [`BRIDGE_FLOAT_COUNT`] values are supplied.
pub fn decode_bridge_floats(values: &[f32]) -> Result<DeviceSample, ManusError> {
    let floats: &[f32; BRIDGE_FLOAT_COUNT] = values.try_into().map_err(|_| {
        ManusError::InvalidSample(format!(
            "bridge data must hold {BRIDGE_FLOAT_COUNT} floats, got {}",
            values.len()
        ))
    })?;
    Ok(sample_from_floats(floats))
}

fn sample_from_floats(f: &[f32; BRIDGE_FLOAT_COUNT]) -> DeviceSample {
    DeviceSample {
        acceleration: DeviceVector::new(f[0], f[1], f[2]),
        euler: DeviceVector::new(f[3], f[4], f[5]),
        quaternion: DeviceQuaternion::new(f[6], f[7], f[8], f[9]),
        fingers: [f[10], f[11], f[12], f[13], f[14]],
        sequence: 0,
    }
}
