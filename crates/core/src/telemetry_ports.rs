//! Telemetry port.
//!
//! Fire-and-forget: implementations must not block the caller and have no
//! way to report failure.
//!
//! # Example
//!
//! ```
//! use feedwire_core::EventRecorder;
//!
//! struct Stdout;
//!
//! impl EventRecorder for Stdout {
//!     fn record_event(&self, name: &str, value: f64, tags: &[(&str, &str)]) {
//!         let _ = (name, value, tags);
//!     }
//! }
//! ```

/// Sink for named numeric events with string tags.
pub trait EventRecorder: Send + Sync {
    fn record_event(&self, name: &str, value: f64, tags: &[(&str, &str)]);
}

/// Recorder that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventRecorder;

impl EventRecorder for NoopEventRecorder {
    fn record_event(&self, _name: &str, _value: f64, _tags: &[(&str, &str)]) {}
}
