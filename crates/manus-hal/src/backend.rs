//! Startup-time backend selection.
//!
//! The pipeline never branches on the platform itself; the host picks a
//! [`BackendKind`] from configuration and [`open_backend`] hands back a boxed
//! [`DeviceTransport`].

use std::fmt;
use std::str::FromStr;

use manus_types::{HandSide, ManusError};
use tracing::info;

use crate::bridge::{BridgeFactory, BridgeTransport};
use crate::sim::{AfterScript, SimTransport};
use crate::transport::DeviceTransport;

/// Available transport backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// In-process simulator looping the gesture tour on both hands.
    #[default]
    Sim,
    /// Host-provided platform bridge object.
    Bridge,
    /// Vendor shared library (requires the `native` feature).
    Native,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Sim => write!(f, "sim"),
            BackendKind::Bridge => write!(f, "bridge"),
            BackendKind::Native => write!(f, "native"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = ManusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sim" => Ok(BackendKind::Sim),
            "bridge" => Ok(BackendKind::Bridge),
            "native" => Ok(BackendKind::Native),
            other => Err(ManusError::Config(format!("unknown backend '{other}'"))),
        }
    }
}

/// Backend construction parameters.
#[derive(Default)]
pub struct BackendOptions {
    /// Upper bound for a single data query, in milliseconds (`0` = no wait).
    pub poll_timeout_ms: u32,
    /// Frames each pose of the simulated gesture tour is held for.
    pub sim_frames_per_pose: usize,
    /// Factory for the platform bridge object, required by
    /// [`BackendKind::Bridge`].
    pub bridge_factory: Option<BridgeFactory>,
}

/// Construct the transport selected by `kind`.
///
/// # Errors
///
/// Returns [`ManusError::Config`] when the selected backend cannot be built
/// in this binary (no bridge factory supplied, or `native` feature off).
pub fn open_backend(
    kind: BackendKind,
    options: BackendOptions,
) -> Result<Box<dyn DeviceTransport>, ManusError> {
    info!(backend = %kind, timeout_ms = options.poll_timeout_ms, "opening glove backend");
    match kind {
        BackendKind::Sim => {
            let frames = options.sim_frames_per_pose.max(1);
            let mut builder = SimTransport::builder().after_script(AfterScript::Loop);
            for hand in HandSide::ALL {
                builder = builder.with_gesture_tour(hand, frames);
            }
            Ok(Box::new(builder.build()))
        }
        BackendKind::Bridge => match options.bridge_factory {
            Some(factory) => Ok(Box::new(BridgeTransport::new(factory))),
            None => Err(ManusError::Config(
                "bridge backend selected but the host supplied no bridge object".to_string(),
            )),
        },
        BackendKind::Native => open_native(options.poll_timeout_ms),
    }
}

#[cfg(feature = "native")]
fn open_native(timeout_ms: u32) -> Result<Box<dyn DeviceTransport>, ManusError> {
    Ok(Box::new(crate::native::NativeTransport::new(timeout_ms)))
}

#[cfg(not(feature = "native"))]
fn open_native(_timeout_ms: u32) -> Result<Box<dyn DeviceTransport>, ManusError> {
    Err(ManusError::Config(
        "native backend requires building with the `native` feature".to_string(),
    ))
}
