//! Event emission for observability.
//!
//! Stage runs emit `stage.*` and `item.*` events; workspace cleaning
//! emits `clean.*` events. Sinks receive them for logging, monitoring,
//! or test assertions.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
