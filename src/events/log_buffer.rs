//! Per-session WARN/ERROR ring buffer (spec.md §7 "Log buffer"): the last
//! N lines are flushed into the event stream as `log` envelopes after each
//! LLM call and before `done`, so the UI can surface backend diagnostics
//! without polling a log file.
//!
//! Grounded on the teacher's layered `tracing_subscriber` setup (an
//! `EnvFilter` + `fmt` layer in `main.rs`); this adds a second `Layer`
//! that taps the same event stream instead of writing to stdout,
//! correlating lines to a session via a `session_id` field recorded on
//! an enclosing span.

use crate::core::types::{EventEnvelope, EventType};
use crate::events::EventBus;
use dashmap::DashMap;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::span;
use tracing::Subscriber;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

const RING_CAPACITY: usize = 20;

#[derive(Default)]
struct SessionIdVisitor {
    session_id: Option<String>,
}

impl Visit for SessionIdVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "session_id" {
            self.session_id = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "session_id" {
            self.session_id = Some(format!("{value:?}"));
        }
    }
}

struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}

/// Holds the actual ring buffers, independent of the tracing layer that
/// feeds them — shared between `AppState` (for draining) and the layer
/// installed in `main.rs` (for writing).
#[derive(Clone, Default)]
pub struct LogBuffers {
    buffers: Arc<DashMap<String, VecDeque<String>>>,
}

impl LogBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, session_id: &str, line: String) {
        let mut entry = self.buffers.entry(session_id.to_string()).or_default();
        if entry.len() >= RING_CAPACITY {
            entry.pop_front();
        }
        entry.push_back(line);
    }

    /// Drain and return whatever WARN/ERROR lines have accumulated for a
    /// session since the last drain. Empty unless something was logged.
    pub fn drain(&self, session_id: &str) -> Vec<String> {
        self.buffers.get_mut(session_id).map(|mut lines| lines.drain(..).collect()).unwrap_or_default()
    }
}

/// Drain `session_id`'s ring and, if non-empty, emit it as a `log`
/// envelope (spec.md §7: "after each LLM call, before each `done`").
/// A no-op when nothing was logged, so ordinary runs don't pepper the
/// stream with empty envelopes.
pub fn flush(buffers: &LogBuffers, bus: &EventBus, session_id: &str) {
    let lines = buffers.drain(session_id);
    if lines.is_empty() {
        return;
    }
    bus.emit(session_id, EventEnvelope::new(EventType::Log, "backend log lines").with_data(json!({ "lines": lines })));
}

/// `tracing_subscriber::Layer` that records WARN/ERROR events into the
/// `LogBuffers` ring keyed by the `session_id` field of the nearest
/// enclosing span (set via `tracing::info_span!("session", session_id = ...)`
/// at each orchestrator's entry point).
pub struct LogBufferLayer {
    buffers: LogBuffers,
    spans: DashMap<span::Id, String>,
}

impl LogBufferLayer {
    pub fn new(buffers: LogBuffers) -> Self {
        Self { buffers, spans: DashMap::new() }
    }
}

impl<S> Layer<S> for LogBufferLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, _ctx: Context<'_, S>) {
        let mut visitor = SessionIdVisitor::default();
        attrs.record(&mut visitor);
        if let Some(session_id) = visitor.session_id {
            self.spans.insert(id.clone(), session_id);
        }
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        if level != tracing::Level::WARN && level != tracing::Level::ERROR {
            return;
        }

        let Some(scope) = ctx.event_scope(event) else {
            return;
        };
        let Some(session_id) = scope.into_iter().find_map(|span| self.spans.get(&span.id()).map(|s| s.clone())) else {
            return;
        };

        let mut visitor = MessageVisitor { message: String::new() };
        event.record(&mut visitor);
        self.buffers.push(&session_id, format!("[{level}] {}", visitor.message));
    }

    fn on_close(&self, id: span::Id, _ctx: Context<'_, S>) {
        self.spans.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn captures_warn_and_error_within_session_span_only() {
        let buffers = LogBuffers::new();
        let subscriber = tracing_subscriber::registry().with(LogBufferLayer::new(buffers.clone()));

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("session", session_id = "s1");
            let _guard = span.enter();
            tracing::warn!("disk getting full");
            tracing::info!("ignored, not warn/error");
            tracing::error!("scrape timed out");
        });

        let lines = buffers.drain("s1");
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("disk getting full"));
        assert!(lines[1].contains("scrape timed out"));
        assert!(buffers.drain("s1").is_empty());
    }

    #[test]
    fn ring_buffer_caps_at_capacity() {
        let buffers = LogBuffers::new();
        let subscriber = tracing_subscriber::registry().with(LogBufferLayer::new(buffers.clone()));

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("session", session_id = "s2");
            let _guard = span.enter();
            for i in 0..(RING_CAPACITY + 5) {
                tracing::warn!("line {}", i);
            }
        });

        let lines = buffers.drain("s2");
        assert_eq!(lines.len(), RING_CAPACITY);
        assert!(lines[0].contains(&format!("line {}", 5)));
    }
}
