//! Event sink trait and implementations.

use async_trait::async_trait;
use tracing::{debug, info};

/// Trait for sinks that receive workflow events.
///
/// Event types are dotted names such as `stage.completed` or
/// `item.failed`; payloads are free-form JSON.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>);

    /// Emits an event without awaiting. Must never panic; sinks swallow
    /// their own errors.
    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>);
}

/// A sink that discards all events; the default when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {}

    fn try_emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {}
}

/// A sink that forwards events to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventSink {
    verbose: bool,
}

impl LoggingEventSink {
    /// Creates a sink logging at info level.
    #[must_use]
    pub fn new() -> Self {
        Self { verbose: false }
    }

    /// Creates a sink logging at debug level.
    #[must_use]
    pub fn verbose() -> Self {
        Self { verbose: true }
    }

    fn log(self, event_type: &str, data: &Option<serde_json::Value>) {
        if self.verbose {
            debug!(event_type = %event_type, event_data = ?data, "Event: {event_type}");
        } else {
            info!(event_type = %event_type, event_data = ?data, "Event: {event_type}");
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.log(event_type, &data);
    }

    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.log(event_type, &data);
    }
}

/// A sink that collects events in memory, for tests.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: parking_lot::RwLock<Vec<(String, Option<serde_json::Value>)>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<(String, Option<serde_json::Value>)> {
        self.events.read().clone()
    }

    /// Returns the collected events whose type starts with `prefix`.
    #[must_use]
    pub fn events_of_type(&self, prefix: &str) -> Vec<(String, Option<serde_json::Value>)> {
        self.events
            .read()
            .iter()
            .filter(|(t, _)| t.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.write().push((event_type.to_string(), data));
    }

    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.write().push((event_type.to_string(), data));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_sink_is_silent() {
        let sink = NoOpEventSink;
        sink.emit("stage.completed", None).await;
        sink.try_emit("item.failed", Some(serde_json::json!({"item": "x"})));
    }

    #[tokio::test]
    async fn test_logging_sink_does_not_panic() {
        let sink = LoggingEventSink::verbose();
        sink.emit("stage.started", Some(serde_json::json!({"stage": "train"}))).await;
        sink.try_emit("clean.completed", None);
    }

    #[tokio::test]
    async fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit("item.started", None).await;
        sink.try_emit("item.completed", Some(serde_json::json!({"item": "a"})));
        sink.emit("stage.completed", None).await;

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.events_of_type("item.").len(), 2);
        assert_eq!(sink.events()[0].0, "item.started");
    }
}
