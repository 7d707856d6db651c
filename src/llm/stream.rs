// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 The relaychat contributors

//! Response normalization
//!
//! Both delivery modes, the conversational token stream and the document
//! provider's single text, become the same sequence of events: any number
//! of `AppendText` followed by one `Complete`.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::Result;

/// Sentinel payload that ends a stream
const DONE_SENTINEL: &str = "[DONE]";

/// Incremental update targeting one assistant message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseEvent {
    /// Append a fragment to the message content
    AppendText { message_id: Uuid, text: String },
    /// The message is complete and frozen
    Complete { message_id: Uuid },
}

/// One framed server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// `data: <payload>`
    Data(String),
    /// `data: [DONE]`
    Done,
}

/// Splits a byte stream into `data:` frames. Partial lines are carried to
/// the next read. Lines are split on the raw `\n` byte, so multi-byte UTF-8
/// sequences cut across reads are reassembled before decoding.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one read and return every frame it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=line_end).collect();
            if let Some(frame) = parse_line(&String::from_utf8_lossy(&line)) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flush a final line that arrived without a trailing newline.
    pub fn finish(&mut self) -> Option<SseFrame> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        parse_line(&String::from_utf8_lossy(&line))
    }
}

fn parse_line(line: &str) -> Option<SseFrame> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return None;
    }

    let data = line.strip_prefix("data:")?.trim();
    if data == DONE_SENTINEL {
        Some(SseFrame::Done)
    } else if data.is_empty() {
        None
    } else {
        Some(SseFrame::Data(data.to_string()))
    }
}

// Delta chunk shapes: the standard `choices[0].delta.content`, or a bare
// top-level `delta` string.
#[derive(Debug, Deserialize)]
struct DeltaChunk {
    #[serde(default)]
    choices: Vec<DeltaChoice>,
    #[serde(default)]
    delta: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct DeltaChoice {
    #[serde(default)]
    delta: Option<ChoiceDelta>,
}

#[derive(Debug, Deserialize)]
struct ChoiceDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Extract the text delta from one frame payload.
///
/// Returns `Ok(None)` for well-formed frames without text (role headers,
/// finish markers) and `Err` for malformed JSON.
pub fn extract_delta(payload: &str) -> std::result::Result<Option<String>, serde_json::Error> {
    let chunk: DeltaChunk = serde_json::from_str(payload)?;

    let from_choices = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta)
        .and_then(|d| d.content);

    let text = from_choices.or_else(|| {
        chunk
            .delta
            .as_ref()
            .and_then(|v| v.as_str())
            .map(str::to_string)
    });

    Ok(text.filter(|t| !t.is_empty()))
}

fn delta_event(message_id: Uuid, payload: &str) -> Option<ResponseEvent> {
    match extract_delta(payload) {
        Ok(Some(text)) => Some(ResponseEvent::AppendText { message_id, text }),
        Ok(None) => None,
        Err(err) => {
            tracing::warn!(%err, payload, "skipping malformed stream frame");
            None
        }
    }
}

/// Streamed mode: turn a raw server-sent-event byte stream into events.
///
/// Ends with `Complete` at `[DONE]` or when the stream closes. A transport
/// error ends the stream with that error and no `Complete`.
pub fn normalize_stream<S>(
    message_id: Uuid,
    bytes: S,
) -> impl Stream<Item = Result<ResponseEvent>> + Send
where
    S: Stream<Item = Result<Bytes>> + Send + 'static,
{
    async_stream::try_stream! {
        let mut bytes = Box::pin(bytes);
        let mut decoder = SseDecoder::new();
        let mut done = false;

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk?;
            for frame in decoder.feed(&chunk) {
                match frame {
                    SseFrame::Done => {
                        done = true;
                        break;
                    }
                    SseFrame::Data(payload) => {
                        if let Some(event) = delta_event(message_id, &payload) {
                            yield event;
                        }
                    }
                }
            }
            if done {
                break;
            }
        }

        if !done {
            if let Some(SseFrame::Data(payload)) = decoder.finish() {
                if let Some(event) = delta_event(message_id, &payload) {
                    yield event;
                }
            }
        }

        yield ResponseEvent::Complete { message_id };
    }
}

/// Buffered mode: the whole text as one fragment, then `Complete`.
pub fn normalize_buffered(message_id: Uuid, text: impl Into<String>) -> Vec<ResponseEvent> {
    vec![
        ResponseEvent::AppendText {
            message_id,
            text: text.into(),
        },
        ResponseEvent::Complete { message_id },
    ]
}
