//! Turn analytics.
//!
//! # SAFETY INVARIANT
//! Telemetry is a side-effect layer. It must **NEVER** block or fail the
//! user-facing turn; every provider error ends in the sink.
//!
//! # PRIVACY INVARIANT
//! Dispatch records hold correlation ids and outcome kinds only. Request and
//! response bodies go to the provider and nowhere else.

pub mod event;
pub mod metrics;
pub mod pipeline;
pub mod policy;
pub mod recorder;

pub use event::{EventPayload, TrackingEvent};
pub use pipeline::{TelemetryPipeline, TrackingHandle};
pub use policy::TrackingPolicy;
