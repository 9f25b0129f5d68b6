//! `manus-hal` – glove hardware abstraction layer.
//!
//! # Modules
//!
//! - [`transport`] – [`DeviceTransport`][transport::DeviceTransport]: the
//!   single seam between the pipeline and a glove driver.
//! - [`record`] – fixed 64-byte little-endian data record and the
//!   platform-bridge float layout.
//! - [`sim`] – [`SimTransport`][sim::SimTransport]: scripted in-process
//!   gloves for tests and headless runs.
//! - [`bridge`] – [`BridgeTransport`][bridge::BridgeTransport]: wraps a
//!   host-provided mobile SDK object.
//! - `native` – `NativeTransport` over the vendor C library (feature
//!   `native`).
//! - [`backend`] – [`open_backend`][backend::open_backend]: picks one of the
//!   above from configuration at startup.

pub mod backend;
pub mod bridge;
#[cfg(feature = "native")]
pub mod native;
pub mod record;
pub mod sim;
pub mod transport;

pub use backend::{BackendKind, BackendOptions, open_backend};
pub use transport::DeviceTransport;
