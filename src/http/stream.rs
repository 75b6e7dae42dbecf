//! Streaming response helpers: NDJSON bodies for the `/research/*` run
//! endpoints and SSE wrapping for the `/research/events`/`/ask/events`
//! reconnect endpoints — both driven by the same `EventEnvelope` stream
//! off `EventBus::subscribe` (spec.md §6).

use crate::core::types::EventEnvelope;
use axum::body::{Body, Bytes};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use futures::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;

/// One NDJSON line per envelope: a compact JSON object followed by `\n`.
pub fn ndjson_response(stream: impl Stream<Item = EventEnvelope> + Send + 'static) -> Response {
    let body_stream = stream.map(|envelope| {
        let mut line = serde_json::to_vec(&envelope).unwrap_or_default();
        line.push(b'\n');
        Ok::<Bytes, Infallible>(Bytes::from(line))
    });

    let mut response = Response::new(Body::from_stream(body_stream));
    response
        .headers_mut()
        .insert(axum::http::header::CONTENT_TYPE, axum::http::HeaderValue::from_static("application/x-ndjson"));
    response
}

/// SSE framing of the same envelope stream, used by `/research/events/{id}`
/// and `/ask/events/{id}` (spec.md §6: "ping envelopes every ~30s").
/// `EventBus::subscribe` already injects its own `ping` envelopes on the
/// same cadence, so `KeepAlive` here is just a transport-level backstop.
pub fn sse_response(stream: impl Stream<Item = EventEnvelope> + Send + 'static) -> impl IntoResponse {
    let event_stream = stream.map(|envelope| {
        let data = serde_json::to_string(&envelope).unwrap_or_default();
        Ok::<Event, Infallible>(Event::default().data(data))
    });

    Sse::new(event_stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(30)).text("keep-alive"))
}
