//! [`EventRecorder`] that writes events to the `tracing` pipeline.

use feedwire_core::EventRecorder;
use tracing::info;

/// Emits every telemetry event as an `info` record under the
/// `feedwire::events` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventRecorder;

impl EventRecorder for TracingEventRecorder {
    fn record_event(&self, name: &str, value: f64, tags: &[(&str, &str)]) {
        info!(target: "feedwire::events", event = name, value, tags = %format_tags(tags));
    }
}

fn format_tags(tags: &[(&str, &str)]) -> String {
    tags.iter().map(|(key, value)| format!("{key}={value}")).collect::<Vec<_>>().join(",")
}
