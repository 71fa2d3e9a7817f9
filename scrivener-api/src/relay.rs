//! Stream relay: turns a completion fragment stream into SSE events.
//!
//! `StreamRelay` is the state machine (`Idle -> Streaming -> Done | Failed`)
//! and knows nothing about I/O. `relay_events` drives it from an async
//! fragment stream, and `into_sse` frames the result for axum.
//!
//! Every failure, including one while opening the upstream stream, ends the
//! event sequence with a single `{error}` event. Nothing is raised past the
//! relay, so the HTTP response itself is always a 200 event stream.

use std::convert::Infallible;
use std::future::Future;
use std::time::{Duration, Instant};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::{Stream, StreamExt};
use prometheus::Gauge;
use scrivener_core::{LlmError, ScrivenerError, ScrivenerResult};
use scrivener_llm::TextStream;
use serde::Serialize;

use crate::constants::SSE_KEEP_ALIVE_SECS;
use crate::services::{failure_label, GenerationKind, GenerationMode};
use crate::telemetry::{record_generation, METRICS};

// ============================================================================
// EVENTS
// ============================================================================

/// One SSE payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RelayEvent {
    /// A fragment plus everything received so far
    Chunk { chunk: String, accumulated: String },
    /// Validated result, serialized as a JSON string
    Done {
        done: bool,
        #[serde(rename = "final")]
        result: String,
    },
    Error { error: String },
}

impl RelayEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Chunk { .. })
    }

    fn to_sse(&self) -> Event {
        match Event::default().json_data(self) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode relay event");
                Event::default().data(r#"{"error":"Failed to encode event"}"#)
            }
        }
    }
}

// ============================================================================
// STATE MACHINE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    Streaming { accumulated: String },
    Done,
    /// Carries the failure kind for metrics
    Failed { kind: &'static str },
}

/// Relay state machine.
///
/// `finalize` turns the accumulated payload into the string sent as
/// `final`; it runs once, when the upstream stream ends cleanly.
pub struct StreamRelay<F> {
    provider: String,
    state: RelayState,
    finalize: F,
}

impl<F> StreamRelay<F>
where
    F: FnOnce(&str) -> ScrivenerResult<String>,
{
    pub fn new(provider: impl Into<String>, finalize: F) -> Self {
        Self {
            provider: provider.into(),
            state: RelayState::Idle,
            finalize,
        }
    }

    pub fn state(&self) -> &RelayState {
        &self.state
    }

    /// Forward one fragment.
    ///
    /// Empty fragments produce no event. Fragments after a terminal state
    /// are dropped.
    pub fn push(&mut self, chunk: String) -> Option<RelayEvent> {
        if chunk.is_empty() {
            return None;
        }
        let accumulated = match &mut self.state {
            RelayState::Idle => {
                self.state = RelayState::Streaming {
                    accumulated: chunk.clone(),
                };
                chunk.clone()
            }
            RelayState::Streaming { accumulated } => {
                accumulated.push_str(&chunk);
                accumulated.clone()
            }
            RelayState::Done | RelayState::Failed { .. } => return None,
        };
        Some(RelayEvent::Chunk { chunk, accumulated })
    }

    /// The upstream stream ended without error.
    pub fn finish(self) -> (RelayState, RelayEvent) {
        let Self {
            provider,
            state,
            finalize,
        } = self;
        match state {
            RelayState::Idle => Self::failed(&LlmError::EmptyResponse { provider }.into()),
            RelayState::Streaming { accumulated } => match finalize(&accumulated) {
                Ok(result) => (
                    RelayState::Done,
                    RelayEvent::Done { done: true, result },
                ),
                Err(e) => Self::failed(&e),
            },
            RelayState::Done | RelayState::Failed { .. } => Self::failed(
                &LlmError::StreamInterrupted {
                    provider,
                    message: "relay finished twice".to_string(),
                }
                .into(),
            ),
        }
    }

    /// The upstream stream failed, before or after the first fragment.
    pub fn fail(self, error: &ScrivenerError) -> (RelayState, RelayEvent) {
        Self::failed(error)
    }

    fn failed(error: &ScrivenerError) -> (RelayState, RelayEvent) {
        (
            RelayState::Failed {
                kind: failure_label(error),
            },
            RelayEvent::Error {
                error: error.user_message(),
            },
        )
    }
}

// ============================================================================
// ASYNC DRIVER
// ============================================================================

/// Holds the active-stream gauge up for as long as the relay is alive,
/// including when the client disconnects mid-stream.
struct ActiveStream {
    gauge: Option<Gauge>,
}

impl ActiveStream {
    fn open() -> Self {
        match METRICS.as_ref() {
            Ok(metrics) => Self::on(metrics.active_streams.clone()),
            Err(_) => Self { gauge: None },
        }
    }

    fn on(gauge: Gauge) -> Self {
        gauge.inc();
        Self { gauge: Some(gauge) }
    }
}

impl Drop for ActiveStream {
    fn drop(&mut self) {
        if let Some(gauge) = &self.gauge {
            gauge.dec();
        }
    }
}

fn log_outcome(kind: GenerationKind, state: &RelayState, started: Instant) {
    let elapsed = started.elapsed();
    let status = match state {
        RelayState::Done => "success",
        RelayState::Failed { kind: failure } => *failure,
        RelayState::Idle | RelayState::Streaming { .. } => "incomplete",
    };
    record_generation(kind.as_str(), GenerationMode::Stream.as_str(), status, elapsed);
    if status == "success" {
        tracing::info!(
            kind = kind.as_str(),
            latency_ms = elapsed.as_millis() as u64,
            "Streamed generation completed"
        );
    } else {
        tracing::warn!(
            kind = kind.as_str(),
            status,
            latency_ms = elapsed.as_millis() as u64,
            "Streamed generation failed"
        );
    }
}

/// Drive a relay over the stream produced by `open`.
///
/// Dropping the returned stream drops the upstream fragment stream, which
/// stops the provider read.
pub fn relay_events<O, F>(
    kind: GenerationKind,
    provider: String,
    open: O,
    finalize: F,
) -> impl Stream<Item = RelayEvent> + Send
where
    O: Future<Output = ScrivenerResult<TextStream>> + Send,
    F: FnOnce(&str) -> ScrivenerResult<String> + Send,
{
    async_stream::stream! {
        let _active = ActiveStream::open();
        let started = Instant::now();
        let mut relay = StreamRelay::new(provider, finalize);

        let mut fragments = match open.await {
            Ok(fragments) => fragments,
            Err(e) => {
                let (state, event) = relay.fail(&e);
                log_outcome(kind, &state, started);
                yield event;
                return;
            }
        };

        let mut failure = None;
        while let Some(item) = fragments.next().await {
            match item {
                Ok(chunk) => {
                    if let Some(event) = relay.push(chunk) {
                        yield event;
                    }
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        let (state, event) = match failure {
            Some(e) => relay.fail(&e),
            None => relay.finish(),
        };
        log_outcome(kind, &state, started);
        yield event;
    }
}

/// Frame relay events as `data: <JSON>\n\n` server-sent events.
pub fn into_sse<S>(events: S) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send>
where
    S: Stream<Item = RelayEvent> + Send + 'static,
{
    Sse::new(events.map(|event| Ok::<_, Infallible>(event.to_sse())))
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(SSE_KEEP_ALIVE_SECS)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use scrivener_core::ResponseError;

    fn echo(raw: &str) -> ScrivenerResult<String> {
        Ok(raw.to_string())
    }

    #[test]
    fn test_chunks_carry_running_accumulation() {
        let mut relay = StreamRelay::new("mock", echo);
        assert_eq!(relay.state(), &RelayState::Idle);

        assert_eq!(
            relay.push("{\"ti".to_string()),
            Some(RelayEvent::Chunk {
                chunk: "{\"ti".to_string(),
                accumulated: "{\"ti".to_string(),
            })
        );
        assert_eq!(
            relay.push("tle\"}".to_string()),
            Some(RelayEvent::Chunk {
                chunk: "tle\"}".to_string(),
                accumulated: "{\"title\"}".to_string(),
            })
        );

        let (state, event) = relay.finish();
        assert_eq!(state, RelayState::Done);
        assert_eq!(
            event,
            RelayEvent::Done {
                done: true,
                result: "{\"title\"}".to_string()
            }
        );
    }

    #[test]
    fn test_empty_fragments_are_skipped() {
        let mut relay = StreamRelay::new("mock", echo);
        assert_eq!(relay.push(String::new()), None);
        assert_eq!(relay.state(), &RelayState::Idle);
    }

    #[test]
    fn test_no_fragments_fails_with_no_response() {
        let relay = StreamRelay::new("mock", echo);
        let (state, event) = relay.finish();
        assert_eq!(state, RelayState::Failed { kind: "empty_response" });
        match event {
            RelayEvent::Error { error } => assert!(error.contains("No response received")),
            other => panic!("expected error event, got {:?}", other),
        }
    }

    #[test]
    fn test_finalize_failure_becomes_error_event() {
        let mut relay = StreamRelay::new("mock", |_: &str| {
            Err(ResponseError::Unparseable {
                reason: "eof".to_string(),
                raw: "{".to_string(),
            }
            .into())
        });
        relay.push("{".to_string());
        let (state, event) = relay.finish();
        assert_eq!(state, RelayState::Failed { kind: "invalid_response" });
        match event {
            RelayEvent::Error { error } => {
                assert!(error.contains("Failed to parse"));
                assert!(!error.contains('{'));
            }
            other => panic!("expected error event, got {:?}", other),
        }
    }

    #[test]
    fn test_event_wire_shapes() -> Result<(), serde_json::Error> {
        let chunk = RelayEvent::Chunk {
            chunk: "a".to_string(),
            accumulated: "ab".to_string(),
        };
        let done = RelayEvent::Done {
            done: true,
            result: "{}".to_string(),
        };
        let error = RelayEvent::Error {
            error: "boom".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&chunk)?,
            serde_json::json!({"chunk": "a", "accumulated": "ab"})
        );
        assert_eq!(
            serde_json::to_value(&done)?,
            serde_json::json!({"done": true, "final": "{}"})
        );
        assert_eq!(serde_json::to_value(&error)?, serde_json::json!({"error": "boom"}));
        assert!(!chunk.is_terminal());
        assert!(done.is_terminal() && error.is_terminal());
        Ok(())
    }

    fn collect(
        open: ScrivenerResult<Vec<ScrivenerResult<String>>>,
    ) -> Vec<RelayEvent> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        rt.block_on(async move {
            let open = async move {
                open.map(|items| Box::pin(futures_util::stream::iter(items)) as TextStream)
            };
            relay_events(GenerationKind::Outline, "mock".to_string(), open, echo)
                .collect::<Vec<_>>()
                .await
        })
    }

    #[test]
    fn test_open_failure_is_in_band() {
        let events = collect(Err(LlmError::RateLimited {
            provider: "mock".to_string(),
            retry_after_ms: 0,
        }
        .into()));
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], RelayEvent::Error { error } if error.contains("usage limit")));
    }

    #[test]
    fn test_mid_stream_failure_ends_with_error() {
        let events = collect(Ok(vec![
            Ok("{\"title\"".to_string()),
            Err(LlmError::StreamInterrupted {
                provider: "mock".to_string(),
                message: "reset by peer".to_string(),
            }
            .into()),
            Ok("never seen".to_string()),
        ]));
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], RelayEvent::Chunk { .. }));
        match &events[1] {
            RelayEvent::Error { error } => assert!(!error.contains("reset by peer")),
            other => panic!("expected error event, got {:?}", other),
        }
    }

    #[test]
    fn test_upstream_error_after_complete_payload_is_not_success() {
        // The fragments alone would validate; the trailing error must win.
        let events = collect(Ok(vec![
            Ok("{\"title\":".to_string()),
            Ok("\"T\"}".to_string()),
            Err(LlmError::RateLimited {
                provider: "openai".to_string(),
                retry_after_ms: 0,
            }
            .into()),
        ]));
        assert_eq!(events.len(), 3);
        assert!(!events
            .iter()
            .any(|e| matches!(e, RelayEvent::Done { .. })));
        match events.last() {
            Some(RelayEvent::Error { error }) => assert!(error.contains("usage limit")),
            other => panic!("expected error event, got {:?}", other),
        }
    }

    #[test]
    fn test_active_stream_guard_tracks_gauge() -> Result<(), prometheus::Error> {
        let gauge = Gauge::new("relay_guard_test_streams", "test gauge")?;
        assert_eq!(gauge.get(), 0.0);
        {
            let _first = ActiveStream::on(gauge.clone());
            assert_eq!(gauge.get(), 1.0);
            let second = ActiveStream::on(gauge.clone());
            assert_eq!(gauge.get(), 2.0);
            drop(second);
            assert_eq!(gauge.get(), 1.0);
        }
        assert_eq!(gauge.get(), 0.0);
        Ok(())
    }

    proptest! {
        #[test]
        fn prop_exactly_one_terminal_event_last(
            fragments in prop::collection::vec("[a-z{}\":,]{0,6}", 0..12),
            fail_at in prop::option::of(0usize..12),
        ) {
            let mut items: Vec<ScrivenerResult<String>> =
                fragments.iter().cloned().map(Ok).collect();
            if let Some(at) = fail_at {
                let at = at.min(items.len());
                items.insert(at, Err(LlmError::Timeout { provider: "mock".to_string(), after_ms: 1 }.into()));
            }
            let events = collect(Ok(items));

            prop_assert!(!events.is_empty());
            let terminal: Vec<_> = events.iter().filter(|e| e.is_terminal()).collect();
            prop_assert_eq!(terminal.len(), 1);
            prop_assert!(events.last().map(|e| e.is_terminal()).unwrap_or(false));

            // The last chunk's accumulation is every forwarded chunk in order.
            let chunks: Vec<_> = events.iter().filter_map(|e| match e {
                RelayEvent::Chunk { chunk, accumulated } => Some((chunk.clone(), accumulated.clone())),
                _ => None,
            }).collect();
            if let Some((_, last)) = chunks.last() {
                let joined: String = chunks.iter().map(|(c, _)| c.as_str()).collect();
                prop_assert_eq!(last, &joined);
            }
        }
    }
}
