//! Streaming response parsing
//!
//! The remote model answers a chat turn with a server-sent-event stream.
//! This module turns the raw byte stream into a lazy, finite,
//! non-restartable sequence of [`TurnDelta`] values, consumed strictly in
//! arrival order. Events are `data:` blocks separated by a blank line;
//! a partial trailing event is processed when the stream ends.

use crate::error::{DocuchatError, Result};
use crate::gateway::types::{StreamChunk, TurnDelta};
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;

/// A finite ordered stream of response deltas for one chat turn
pub type TurnStream = Pin<Box<dyn Stream<Item = Result<TurnDelta>> + Send>>;

/// Build a [`TurnStream`] from a streaming HTTP response
pub fn turn_stream(response: reqwest::Response) -> TurnStream {
    let bytes = response
        .bytes_stream()
        .map(|result| result.map_err(anyhow::Error::from))
        .boxed();
    Box::pin(delta_stream(bytes))
}

struct SseState {
    bytes: BoxStream<'static, Result<Bytes>>,
    buffer: Vec<u8>,
    pending: VecDeque<Result<TurnDelta>>,
    done: bool,
}

/// Parse an SSE byte stream into response deltas
///
/// Bytes are buffered until a complete `\n\n`-terminated event block is
/// available, so chunk boundaries (including ones splitting multi-byte
/// characters) never corrupt events.
pub(crate) fn delta_stream(
    bytes: BoxStream<'static, Result<Bytes>>,
) -> impl Stream<Item = Result<TurnDelta>> + Send {
    let state = SseState {
        bytes,
        buffer: Vec::new(),
        pending: VecDeque::new(),
        done: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.done {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    state.buffer.extend_from_slice(&chunk);
                    drain_events(&mut state.buffer, &mut state.pending);
                }
                Some(Err(err)) => {
                    state.done = true;
                    let err =
                        DocuchatError::Stream(format!("response stream interrupted: {}", err));
                    return Some((Err(err.into()), state));
                }
                None => {
                    state.done = true;
                    // Process any remaining partial event in the buffer.
                    if !state.buffer.is_empty() {
                        let trailing = std::mem::take(&mut state.buffer);
                        let block = String::from_utf8_lossy(&trailing);
                        if let Some(item) = parse_event(&block) {
                            state.pending.push_back(item);
                        }
                    }
                }
            }
        }
    })
}

/// Extract every complete event block from the buffer
fn drain_events(buffer: &mut Vec<u8>, pending: &mut VecDeque<Result<TurnDelta>>) {
    while let Some(pos) = buffer.windows(2).position(|window| window == b"\n\n") {
        let rest = buffer.split_off(pos + 2);
        let block_bytes = std::mem::replace(buffer, rest);
        let block = String::from_utf8_lossy(&block_bytes[..pos]);
        if let Some(item) = parse_event(&block) {
            pending.push_back(item);
        }
    }
}

/// Parse one event block into a delta
///
/// Joins the block's `data:` lines, ignores other SSE fields, and returns
/// `None` for blocks carrying no payload.
fn parse_event(block: &str) -> Option<Result<TurnDelta>> {
    let mut data_lines = Vec::new();
    for line in block.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if let Some(value) = line.strip_prefix("data:") {
            data_lines.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }
    if data_lines.is_empty() {
        return None;
    }
    let payload = data_lines.join("\n");
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }
    Some(parse_payload(&payload))
}

fn parse_payload(payload: &str) -> Result<TurnDelta> {
    let chunk: StreamChunk = serde_json::from_str(payload)
        .map_err(|err| DocuchatError::Stream(format!("malformed stream payload: {}", err)))?;
    Ok(TurnDelta::from(chunk))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::types::FinishReason;

    fn byte_stream(chunks: Vec<&'static [u8]>) -> BoxStream<'static, Result<Bytes>> {
        futures::stream::iter(
            chunks
                .into_iter()
                .map(|chunk| Ok(Bytes::from_static(chunk))),
        )
        .boxed()
    }

    async fn collect(chunks: Vec<&'static [u8]>) -> Vec<Result<TurnDelta>> {
        delta_stream(byte_stream(chunks)).collect().await
    }

    #[tokio::test]
    async fn test_single_event() {
        let deltas = collect(vec![
            b"data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"hi\"}]}}]}\n\n",
        ])
        .await;
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].as_ref().unwrap().text, "hi");
    }

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let deltas = collect(vec![
            b"data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"one\"}]}}]}\n\n",
            b"data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"two\"}]}}]}\n\ndata: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"three\"}]}}]}\n\n",
        ])
        .await;
        let texts: Vec<_> = deltas
            .into_iter()
            .map(|delta| delta.unwrap().text)
            .collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_event_split_across_chunks() {
        let deltas = collect(vec![
            b"data: {\"candidates\":[{\"content\":{\"role\":\"mod",
            b"el\",\"parts\":[{\"text\":\"joined\"}]}}]}\n\n",
        ])
        .await;
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].as_ref().unwrap().text, "joined");
    }

    #[tokio::test]
    async fn test_trailing_event_without_separator() {
        let deltas = collect(vec![
            b"data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"tail\"}]}}]}",
        ])
        .await;
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].as_ref().unwrap().text, "tail");
    }

    #[tokio::test]
    async fn test_finish_reason_and_usage_carried() {
        let deltas = collect(vec![
            b"data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"x\"}]},\"finishReason\":\"SAFETY\"}],\"usageMetadata\":{\"promptTokenCount\":4,\"candidatesTokenCount\":1,\"totalTokenCount\":5}}\n\n",
        ])
        .await;
        let delta = deltas[0].as_ref().unwrap();
        assert_eq!(delta.finish_reason, Some(FinishReason::Safety));
        assert_eq!(delta.usage.unwrap().total, 5);
    }

    #[tokio::test]
    async fn test_malformed_payload_is_an_error() {
        let deltas = collect(vec![b"data: {not json}\n\n"]).await;
        assert_eq!(deltas.len(), 1);
        let message = deltas[0].as_ref().unwrap_err().to_string();
        assert!(message.contains("malformed stream payload"));
    }

    #[tokio::test]
    async fn test_non_data_fields_ignored() {
        let deltas = collect(vec![
            b"event: message\nid: 7\ndata: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"kept\"}]}}]}\n\n",
        ])
        .await;
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].as_ref().unwrap().text, "kept");
    }

    #[tokio::test]
    async fn test_empty_stream_yields_nothing() {
        let deltas = collect(vec![]).await;
        assert!(deltas.is_empty());
    }
}
