//! Event sink implementations.

use super::{EventSink, GovernanceEvent};
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

/// In-memory sink. Clones share the same buffer.
#[derive(Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<GovernanceEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything published so far, in publication order.
    pub fn events(&self) -> Vec<GovernanceEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return everything published so far.
    pub fn drain(&self) -> Vec<GovernanceEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl EventSink for MemorySink {
    fn publish(&self, event: &GovernanceEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Logs each event at `info` under the `concord::events` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, event: &GovernanceEvent) {
        match serde_json::to_string(event) {
            Ok(json) => info!(target: "concord::events", event = event.name(), "{}", json),
            Err(e) => warn!(target: "concord::events", event = event.name(), "unserializable event: {}", e),
        }
    }
}

/// Appends one JSON object per line to a writer, for an external indexer.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn publish(&self, event: &GovernanceEvent) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let result = serde_json::to_writer(&mut *writer, event)
            .map_err(std::io::Error::from)
            .and_then(|_| writer.write_all(b"\n"))
            .and_then(|_| writer.flush());

        if let Err(e) = result {
            warn!(event = event.name(), "failed to append event: {}", e);
        }
    }
}

/// Forwards each event to several sinks, in order.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanoutSink {
    fn publish(&self, event: &GovernanceEvent) {
        for sink in &self.sinks {
            sink.publish(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Address, ObjectId};

    fn forum_created(ts: u64) -> GovernanceEvent {
        GovernanceEvent::ForumCreated {
            forum_id: ObjectId::new([1; 32]),
            name: "Alpha".to_string(),
            description: "desc".to_string(),
            creator: Address::from_label("alice"),
            timestamp: ts,
        }
    }

    #[test]
    fn test_memory_sink_shares_buffer_between_clones() {
        let sink = MemorySink::new();
        let clone = sink.clone();

        clone.publish(&forum_created(1));
        clone.publish(&forum_created(2));

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.events()[1].timestamp(), 2);
    }

    #[test]
    fn test_memory_sink_drain_empties() {
        let sink = MemorySink::new();
        sink.publish(&forum_created(1));

        let drained = sink.drain();
        assert_eq!(drained.len(), 1);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_json_lines_sink_writes_one_line_per_event() {
        let sink = JsonLinesSink::new(Vec::new());
        sink.publish(&forum_created(1));
        sink.publish(&forum_created(2));

        let bytes = sink.into_inner();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: GovernanceEvent = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed, forum_created(2));
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let a = MemorySink::new();
        let b = MemorySink::new();
        let fanout = FanoutSink::new()
            .with(Arc::new(a.clone()))
            .with(Arc::new(b.clone()));

        fanout.publish(&forum_created(5));

        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn test_tracing_sink_does_not_panic() {
        TracingSink.publish(&forum_created(1));
    }
}
