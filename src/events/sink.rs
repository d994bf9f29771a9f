//! Pluggable event consumers. Sinks run on their own worker task inside
//! [`super::bus::EventBus`] and never block the node tasks publishing
//! events.

use std::any::type_name;
use std::fs::File;
use std::io::{self, IoSlice, Result as IoResult, Stdout, Write};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex as ParkingMutex;

use super::event::StateEvent;

/// Abstraction over an output target that consumes [`StateEvent`]s.
pub trait EventSink: Sync + Send {
    /// Implementations are allowed to perform blocking I/O; the bus hands
    /// the call off to a dedicated worker task to keep publishers
    /// unblocked.
    fn handle(&mut self, event: &StateEvent) -> IoResult<()>;

    /// A stable, human-friendly identifier for this sink instance.
    fn name(&self) -> String {
        type_name::<Self>().to_string()
    }
}

/// Writes one compact JSON line per event to stdout.
pub struct StdOutSink {
    handle: Stdout,
}

impl Default for StdOutSink {
    fn default() -> Self {
        Self { handle: io::stdout() }
    }
}

impl EventSink for StdOutSink {
    fn handle(&mut self, event: &StateEvent) -> IoResult<()> {
        let line = serde_json::to_string(event).unwrap_or_else(|e| format!("{{\"serializeError\":\"{e}\"}}"));
        self.handle.write_all(line.as_bytes())?;
        self.handle.write_all(b"\n")?;
        self.handle.flush()
    }
}

/// Captures every event for test assertions and snapshots.
#[derive(Clone, Default)]
pub struct MemorySink {
    entries: Arc<ParkingMutex<Vec<StateEvent>>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<StateEvent> {
        self.entries.lock().clone()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl EventSink for MemorySink {
    fn handle(&mut self, event: &StateEvent) -> IoResult<()> {
        self.entries.lock().push(event.clone());
        Ok(())
    }
}

/// JSON Lines sink writing to an arbitrary [`Write`] target — a file, a
/// socket, or anything else callers want to hand it.
pub struct JsonLinesSink {
    handle: Box<dyn Write + Send + Sync>,
    pretty: bool,
}

impl JsonLinesSink {
    #[must_use]
    pub fn new(handle: Box<dyn Write + Send + Sync>) -> Self {
        Self { handle, pretty: false }
    }

    #[must_use]
    pub fn with_pretty_print(handle: Box<dyn Write + Send + Sync>) -> Self {
        Self { handle, pretty: true }
    }

    #[must_use]
    pub fn to_stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    pub fn to_file(path: impl AsRef<Path>) -> IoResult<Self> {
        Ok(Self::new(Box::new(File::create(path)?)))
    }
}

impl EventSink for JsonLinesSink {
    fn handle(&mut self, event: &StateEvent) -> IoResult<()> {
        let body = if self.pretty {
            serde_json::to_string_pretty(event)
        } else {
            serde_json::to_string(event)
        }
        .map_err(io::Error::other)?;
        let bufs = [IoSlice::new(body.as_bytes()), IoSlice::new(b"\n")];
        self.handle.write_vectored(&bufs)?;
        self.handle.flush()
    }
}

/// Forwards events to an unbounded [`flume`] channel, e.g. for streaming
/// a run to an HTTP client over SSE.
pub struct ChannelSink {
    sender: flume::Sender<StateEvent>,
}

impl ChannelSink {
    #[must_use]
    pub fn new(sender: flume::Sender<StateEvent>) -> Self {
        Self { sender }
    }
}

impl EventSink for ChannelSink {
    fn handle(&mut self, event: &StateEvent) -> IoResult<()> {
        self.sender
            .send(event.clone())
            .map_err(|e| io::Error::other(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::WorkflowState;

    #[test]
    fn memory_sink_captures_events_in_order() {
        let mut sink = MemorySink::new();
        let state = WorkflowState::new("w", "t");
        sink.handle(&StateEvent::node_entered("exec-1", "n1", state.clone(), None))
            .unwrap();
        sink.handle(&StateEvent::node_exited("exec-1", "n1", state, None)).unwrap();
        let snapshot = sink.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(matches!(snapshot[0], StateEvent::NodeEntered { .. }));
        assert!(matches!(snapshot[1], StateEvent::NodeExited { .. }));
    }

    #[test]
    fn channel_sink_forwards_events() {
        let (tx, rx) = flume::unbounded();
        let mut sink = ChannelSink::new(tx);
        let state = WorkflowState::new("w", "t");
        sink.handle(&StateEvent::workflow_completed("exec-1", state, None)).unwrap();
        let received = rx.try_recv().unwrap();
        assert!(received.is_terminal());
    }
}
