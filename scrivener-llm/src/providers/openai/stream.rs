//! Decoding of the OpenAI server-sent-event body into text fragments.

use super::client::{error_event, timeout_ms};
use super::types::{ChatCompletionChunk, ErrorDetail};
use crate::providers::{stream_interrupted, timed_out};
use crate::TextStream;
use futures_util::StreamExt;
use reqwest::Response;
use scrivener_core::ScrivenerResult;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Fragments buffered between the body reader and the consumer.
pub const STREAM_CHANNEL_CAPACITY: usize = 64;

/// One decoded `data:` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamLine {
    /// Text delta to forward
    Fragment(String),
    /// `[DONE]` sentinel
    Done,
    /// Error event sent by the server after the stream opened
    Failed(ErrorDetail),
}

/// Incremental line splitter for an SSE body.
///
/// Bytes are buffered until a full line is available so multi-byte
/// characters split across network chunks decode intact.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw body bytes and return every complete line's payload.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<StreamLine>, String> {
        self.buffer.extend_from_slice(bytes);
        let mut out = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line);
            if let Some(parsed) = decode_line(text.trim_end_matches(['\r', '\n']))? {
                out.push(parsed);
            }
        }
        Ok(out)
    }

    /// Decode whatever is left once the body ends without a trailing newline.
    pub fn finish(&mut self) -> Result<Option<StreamLine>, String> {
        if self.buffer.is_empty() {
            return Ok(None);
        }
        let rest = std::mem::take(&mut self.buffer);
        let text = String::from_utf8_lossy(&rest);
        decode_line(text.trim_end_matches(['\r', '\n']))
    }
}

/// Decode one SSE line. Comments, blank lines, other fields and chunks with
/// no text delta yield `None`. An `error` object always surfaces, even when
/// the same chunk carries text.
pub fn decode_line(line: &str) -> Result<Option<StreamLine>, String> {
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let data = data.trim_start();
    if data == "[DONE]" {
        return Ok(Some(StreamLine::Done));
    }
    if data.is_empty() {
        return Ok(None);
    }
    let chunk: ChatCompletionChunk =
        serde_json::from_str(data).map_err(|e| format!("malformed stream chunk: {}", e))?;
    if let Some(error) = chunk.error {
        return Ok(Some(StreamLine::Failed(error)));
    }
    let text: String = chunk
        .choices
        .into_iter()
        .filter_map(|c| c.delta.content)
        .collect();
    if text.is_empty() {
        Ok(None)
    } else {
        Ok(Some(StreamLine::Fragment(text)))
    }
}

/// Spawn a reader over `response` and return its fragments as a stream.
///
/// The reader stops as soon as the receiving side is dropped, which in turn
/// drops the HTTP response and closes the upstream connection.
pub fn spawn_fragment_stream(
    provider: &'static str,
    response: Response,
    timeout: Option<Duration>,
) -> TextStream {
    let (tx, rx) = mpsc::channel::<ScrivenerResult<String>>(STREAM_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::new();

        while let Some(chunk) = body.next().await {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    let err = if e.is_timeout() {
                        timed_out(provider, timeout_ms(timeout))
                    } else {
                        stream_interrupted(provider, e.to_string())
                    };
                    let _ = tx.send(Err(err)).await;
                    return;
                }
            };

            let lines = match decoder.push(&bytes) {
                Ok(lines) => lines,
                Err(reason) => {
                    let _ = tx.send(Err(stream_interrupted(provider, reason))).await;
                    return;
                }
            };

            for line in lines {
                match line {
                    StreamLine::Fragment(text) => {
                        if tx.send(Ok(text)).await.is_err() {
                            tracing::debug!(provider, "Stream consumer went away");
                            return;
                        }
                    }
                    StreamLine::Done => return,
                    StreamLine::Failed(detail) => {
                        tracing::warn!(
                            provider,
                            error_type = detail.r#type.as_deref().unwrap_or(""),
                            error = %detail.message,
                            "Upstream error event in stream"
                        );
                        let _ = tx.send(Err(error_event(provider, &detail, timeout))).await;
                        return;
                    }
                }
            }
        }

        match decoder.finish() {
            Ok(Some(StreamLine::Fragment(text))) => {
                let _ = tx.send(Ok(text)).await;
            }
            Ok(Some(StreamLine::Failed(detail))) => {
                let _ = tx.send(Err(error_event(provider, &detail, timeout))).await;
            }
            Ok(_) => {}
            Err(reason) => {
                let _ = tx.send(Err(stream_interrupted(provider, reason))).await;
            }
        }
    });

    Box::pin(ReceiverStream::new(rx))
}
