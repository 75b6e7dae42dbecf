//! Event Bus (spec.md §4.1): per-session bounded FIFO, non-blocking
//! emit, subscriber stream that ends on a terminal envelope and pings
//! idle connections to keep intermediaries alive.
//!
//! Grounded on the teacher's session-keyed `DashMap`/`Mutex<HashMap>`
//! state pattern in `core::app_state::AppState`, generalized from the
//! teacher's request/response MCP calls to a persistent per-session
//! queue since this core streams progress over the lifetime of a run.

pub mod log_buffer;

pub use log_buffer::{LogBufferLayer, LogBuffers};

use crate::core::types::{EventEnvelope, EventType};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const QUEUE_CAPACITY: usize = 100;
const PING_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct EventBus {
    queues: Arc<DashMap<String, mpsc::Sender<EventEnvelope>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { queues: Arc::new(DashMap::new()) }
    }

    /// Register a fresh bounded queue for `session_id`, replacing any
    /// existing one (a prior subscriber that never connected is dropped).
    /// Returns the receiving half for `subscribe` to drive.
    fn register(&self, session_id: &str) -> mpsc::Receiver<EventEnvelope> {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        self.queues.insert(session_id.to_string(), tx);
        rx
    }

    /// Non-blocking, at-most-once emit. Returns whether the envelope was
    /// accepted; a full or absent queue is logged, not fatal.
    pub fn emit(&self, session_id: &str, envelope: EventEnvelope) -> bool {
        let Some(tx) = self.queues.get(session_id) else {
            tracing::debug!("emit to unknown session {session_id}, dropping");
            return false;
        };
        match tx.try_send(envelope) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("event queue full for session {session_id}, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("event queue closed for session {session_id}, dropping event");
                false
            }
        }
    }

    /// Subscribe to `session_id`, returning a stream of envelopes that
    /// ends once a `done`/`error` envelope is produced, injecting `ping`
    /// envelopes roughly every 30s of inactivity. The queue is torn down
    /// when the returned stream is dropped.
    pub fn subscribe(&self, session_id: &str) -> impl futures::Stream<Item = EventEnvelope> {
        let mut rx = self.register(session_id);
        let queues = self.queues.clone();
        let session_id = session_id.to_string();

        async_stream::stream! {
            loop {
                tokio::select! {
                    maybe_envelope = rx.recv() => {
                        match maybe_envelope {
                            Some(envelope) => {
                                let terminal = matches!(envelope.event_type, EventType::Done | EventType::Error);
                                yield envelope;
                                if terminal {
                                    break;
                                }
                            }
                            None => break,
                        }
                    }
                    _ = tokio::time::sleep(PING_INTERVAL) => {
                        yield EventEnvelope::new(EventType::Ping, "ping");
                    }
                }
            }
            queues.remove(&session_id);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn emit_before_subscribe_is_dropped_not_fatal() {
        let bus = EventBus::new();
        assert!(!bus.emit("nope", EventEnvelope::new(EventType::Status, "hi")));
    }

    #[tokio::test]
    async fn subscribe_then_emit_delivers_and_terminal_ends_stream() {
        let bus = EventBus::new();
        let stream = bus.subscribe("s1");
        tokio::pin!(stream);

        assert!(bus.emit("s1", EventEnvelope::new(EventType::Status, "working")));
        assert!(bus.emit("s1", EventEnvelope::new(EventType::Done, "finished")));

        let first = stream.next().await.unwrap();
        assert!(matches!(first.event_type, EventType::Status));
        let second = stream.next().await.unwrap();
        assert!(matches!(second.event_type, EventType::Done));
        assert!(stream.next().await.is_none());
    }
}
