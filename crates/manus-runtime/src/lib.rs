//! `manus-runtime` – frame loop state for the glove pipeline.
//!
//! # Modules
//!
//! - [`session`] – [`HandSession`][session::HandSession] keeps one hand's
//!   skeleton, last sample and gesture, and survives transport outages with
//!   stale-but-valid state.  [`GloveSession`][session::GloveSession] owns the
//!   transport, the retargeter, every hand and the interaction trigger, and
//!   advances them with one [`tick`][session::GloveSession::tick] per frame.
//! - [`interaction`] – [`InteractionTrigger`][interaction::InteractionTrigger]:
//!   point with the index finger to cast a ray and draw a line to the hit
//!   through a host-supplied [`RenderSurface`][interaction::RenderSurface].
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: global
//!   `tracing` subscriber with optional OTLP export.

pub mod interaction;
pub mod session;
pub mod telemetry;

pub use interaction::{AimState, Hit, InteractionTrigger, RenderSurface};
pub use session::{FrameOutcome, FrameReport, GloveSession, HandSession};
pub use telemetry::{TracerProviderGuard, init_tracing};
