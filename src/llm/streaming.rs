//! Lazy stream decoding for the two backend wire formats.
//!
//! OpenRouter streams Server-Sent Events (`data: <json|[DONE]>` lines);
//! Ollama streams newline-delimited JSON objects. Both decoders turn a
//! raw byte stream into the same lazy sequence of answer fragments, so
//! callers consume either backend identically.
//!
//! Both decoders are single-pass, non-restartable, and finite. They do
//! no read-ahead: each fragment is pulled on demand and each pull may
//! block on network I/O. Dropping the returned stream drops the
//! underlying byte stream, which releases the HTTP connection.

use crate::error::GatewayError;
use crate::llm::traits::{FragmentStream, StreamFragment};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde_json::Value;

/// Distinguished SSE payload marking clean end-of-stream.
pub const SSE_DONE_SENTINEL: &str = "[DONE]";

/// Decode an SSE `text/event-stream` body into answer fragments.
///
/// Events are read in arrival order. The `[DONE]` sentinel terminates
/// the sequence cleanly; nothing is yielded after it. Each JSON payload
/// contributes its `choices[0].delta.content`, skipped when absent or
/// empty. A payload that fails to parse is skipped and logged, not
/// fatal: availability wins over strict protocol conformance here. A
/// transport failure yields its error as the final item.
pub fn decode_sse<S>(byte_stream: S) -> FragmentStream
where
    S: Stream<Item = Result<Bytes, GatewayError>> + Send + 'static,
{
    let fragments = async_stream::stream! {
        let mut byte_stream = Box::pin(byte_stream);
        let mut buffer = String::new();

        while let Some(chunk) = byte_stream.next().await {
            match chunk {
                Ok(bytes) => {
                    buffer.push_str(&String::from_utf8_lossy(&bytes));

                    // Process complete lines; partial lines stay buffered.
                    while let Some(newline_pos) = buffer.find('\n') {
                        let line = buffer[..newline_pos].trim().to_string();
                        buffer.drain(..=newline_pos);

                        let Some(data) = line.strip_prefix("data:") else {
                            continue;
                        };
                        let data = data.trim();

                        if data == SSE_DONE_SENTINEL {
                            tracing::debug!("SSE stream finished at [DONE] sentinel");
                            return;
                        }

                        match serde_json::from_str::<Value>(data) {
                            Ok(event) => {
                                if let Some(text) = delta_content(&event) {
                                    if !text.is_empty() {
                                        yield Ok(StreamFragment {
                                            text: text.to_string(),
                                        });
                                    }
                                }
                            }
                            Err(err) => {
                                // Tolerated, but visible in logs.
                                tracing::warn!(
                                    "skipping malformed SSE frame: {err} | data: {}",
                                    snippet(data)
                                );
                            }
                        }
                    }
                }
                Err(err) => {
                    tracing::error!("SSE transport failed mid-stream: {err}");
                    yield Err(err);
                    return;
                }
            }
        }

        // A final event without a trailing newline still counts.
        let tail = buffer.trim().to_string();
        if let Some(data) = tail.strip_prefix("data:") {
            let data = data.trim();
            if data != SSE_DONE_SENTINEL {
                match serde_json::from_str::<Value>(data) {
                    Ok(event) => {
                        if let Some(text) = delta_content(&event) {
                            if !text.is_empty() {
                                yield Ok(StreamFragment {
                                    text: text.to_string(),
                                });
                            }
                        }
                    }
                    Err(err) => {
                        tracing::warn!(
                            "skipping malformed SSE frame: {err} | data: {}",
                            snippet(data)
                        );
                    }
                }
            }
        }

        tracing::debug!("SSE stream ended without [DONE] sentinel");
    };

    Box::new(fragments.boxed())
}

/// Decode a newline-delimited JSON body into answer fragments.
///
/// Each non-blank line is one logical message. A `done: true` flag
/// terminates the sequence cleanly. Each message contributes its
/// `message.content`, skipped when empty. A line that fails to parse
/// yields a non-fatal [`GatewayError::DecodeError`] item and decoding
/// resumes at the next line; a transport failure yields
/// [`GatewayError::StreamAborted`] and terminates.
pub fn decode_ndjson<S>(byte_stream: S) -> FragmentStream
where
    S: Stream<Item = Result<Bytes, GatewayError>> + Send + 'static,
{
    let fragments = async_stream::stream! {
        let mut byte_stream = Box::pin(byte_stream);
        let mut buffer = String::new();

        while let Some(chunk) = byte_stream.next().await {
            match chunk {
                Ok(bytes) => {
                    buffer.push_str(&String::from_utf8_lossy(&bytes));

                    while let Some(newline_pos) = buffer.find('\n') {
                        let line = buffer[..newline_pos].trim().to_string();
                        buffer.drain(..=newline_pos);

                        if line.is_empty() {
                            continue;
                        }

                        match parse_chat_line(&line) {
                            Ok(LineEvent::Done) => {
                                tracing::debug!("line stream finished at done flag");
                                return;
                            }
                            Ok(LineEvent::Text(text)) => {
                                if !text.is_empty() {
                                    yield Ok(StreamFragment { text });
                                }
                            }
                            Err(err) => {
                                tracing::warn!("bad stream line: {err}");
                                yield Err(err);
                            }
                        }
                    }
                }
                Err(err) => {
                    tracing::error!("line stream transport failed: {err}");
                    yield Err(err);
                    return;
                }
            }
        }

        // A final line without a trailing newline is still a message.
        let tail = buffer.trim().to_string();
        if !tail.is_empty() {
            match parse_chat_line(&tail) {
                Ok(LineEvent::Done) => {}
                Ok(LineEvent::Text(text)) => {
                    if !text.is_empty() {
                        yield Ok(StreamFragment { text });
                    }
                }
                Err(err) => yield Err(err),
            }
        }
    };

    Box::new(fragments.boxed())
}

/// What one NDJSON line amounts to.
#[derive(Debug)]
enum LineEvent {
    Done,
    Text(String),
}

fn parse_chat_line(line: &str) -> Result<LineEvent, GatewayError> {
    let message: Value = serde_json::from_str(line).map_err(|err| GatewayError::DecodeError {
        message: format!("failed to parse stream line: {err} | line: {}", snippet(line)),
    })?;

    if message.get("done").and_then(Value::as_bool).unwrap_or(false) {
        return Ok(LineEvent::Done);
    }

    let text = message
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    Ok(LineEvent::Text(text.to_string()))
}

fn delta_content(event: &Value) -> Option<&str> {
    event
        .get("choices")?
        .as_array()?
        .first()?
        .get("delta")?
        .get("content")?
        .as_str()
}

/// First hundred characters, for error messages and logs.
fn snippet(raw: &str) -> String {
    raw.chars().take(100).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use futures::stream;

    fn bytes_of(chunks: &[&str]) -> Vec<Result<Bytes, GatewayError>> {
        chunks
            .iter()
            .map(|c| Ok(Bytes::copy_from_slice(c.as_bytes())))
            .collect()
    }

    async fn collect(stream: FragmentStream) -> Vec<Result<StreamFragment, GatewayError>> {
        StreamExt::collect(stream).await
    }

    fn texts(items: &[Result<StreamFragment, GatewayError>]) -> Vec<String> {
        items
            .iter()
            .filter_map(|item| item.as_ref().ok().map(|f| f.text.clone()))
            .collect()
    }

    #[tokio::test]
    async fn sse_yields_fragments_then_terminates_at_sentinel() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" there\"}}]}\n\n",
            "data: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n\n",
        );
        let items = collect(decode_sse(stream::iter(bytes_of(&[body])))).await;

        assert!(items.iter().all(Result::is_ok));
        assert_eq!(texts(&items), vec!["Hi", " there"]);
    }

    #[tokio::test]
    async fn sse_skips_malformed_frames_without_failing() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\n",
            "data: {not json\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n\n",
            "data: [DONE]\n\n",
        );
        let items = collect(decode_sse(stream::iter(bytes_of(&[body])))).await;

        assert!(items.iter().all(Result::is_ok));
        assert_eq!(texts(&items), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn sse_reassembles_frames_split_across_chunks() {
        let chunks = [
            "data: {\"choices\":[{\"del",
            "ta\":{\"content\":\"split\"}}]}\n\ndata: [DO",
            "NE]\n\n",
        ];
        let items = collect(decode_sse(stream::iter(bytes_of(&chunks)))).await;
        assert_eq!(texts(&items), vec!["split"]);
    }

    #[tokio::test]
    async fn sse_ignores_empty_deltas_and_ends_on_natural_eof() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"end\"}}]}\n\n",
        );
        let items = collect(decode_sse(stream::iter(bytes_of(&[body])))).await;
        assert_eq!(texts(&items), vec!["end"]);
    }

    #[tokio::test]
    async fn sse_reads_final_event_without_trailing_newline() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}",
        );
        let items = collect(decode_sse(stream::iter(bytes_of(&[body])))).await;
        assert_eq!(texts(&items), vec!["a", "tail"]);
    }

    #[tokio::test]
    async fn sse_sentinel_without_trailing_newline_yields_nothing() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\n",
            "data: [DONE]",
        );
        let items = collect(decode_sse(stream::iter(bytes_of(&[body])))).await;
        assert_eq!(texts(&items), vec!["a"]);
    }

    #[tokio::test]
    async fn sse_surfaces_transport_failure_as_final_item() {
        let chunks = vec![
            Ok(Bytes::from_static(
                b"data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n\n",
            )),
            Err(GatewayError::StreamAborted {
                message: "connection reset".to_string(),
            }),
        ];
        let items = collect(decode_sse(stream::iter(chunks))).await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().text, "partial");
        assert_eq!(
            items[1].as_ref().unwrap_err().kind(),
            ErrorKind::StreamAborted
        );
    }

    #[tokio::test]
    async fn ndjson_yields_fragments_then_terminates_at_done() {
        let body = concat!(
            "{\"message\":{\"content\":\"Hi\"},\"done\":false}\n",
            "{\"message\":{\"content\":\"\"},\"done\":true}\n",
            "{\"message\":{\"content\":\"late\"},\"done\":false}\n",
        );
        let items = collect(decode_ndjson(stream::iter(bytes_of(&[body])))).await;

        assert!(items.iter().all(Result::is_ok));
        assert_eq!(texts(&items), vec!["Hi"]);
    }

    #[tokio::test]
    async fn ndjson_malformed_line_is_reported_but_not_fatal() {
        let body = concat!(
            "{\"message\":{\"content\":\"a\"},\"done\":false}\n",
            "{broken\n",
            "{\"message\":{\"content\":\"b\"},\"done\":false}\n",
            "{\"message\":{\"content\":\"\"},\"done\":true}\n",
        );
        let items = collect(decode_ndjson(stream::iter(bytes_of(&[body])))).await;

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap().text, "a");
        assert_eq!(items[1].as_ref().unwrap_err().kind(), ErrorKind::DecodeError);
        assert_eq!(items[2].as_ref().unwrap().text, "b");
    }

    #[tokio::test]
    async fn ndjson_reads_final_line_without_trailing_newline() {
        let body = "{\"message\":{\"content\":\"tail\"},\"done\":false}";
        let items = collect(decode_ndjson(stream::iter(bytes_of(&[body])))).await;
        assert_eq!(texts(&items), vec!["tail"]);
    }

    #[tokio::test]
    async fn ndjson_transport_failure_terminates_the_stream() {
        let chunks = vec![
            Ok(Bytes::from_static(
                b"{\"message\":{\"content\":\"kept\"},\"done\":false}\n",
            )),
            Err(GatewayError::StreamAborted {
                message: "broken pipe".to_string(),
            }),
            Ok(Bytes::from_static(
                b"{\"message\":{\"content\":\"never\"},\"done\":false}\n",
            )),
        ];
        let items = collect(decode_ndjson(stream::iter(chunks))).await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().text, "kept");
        assert_eq!(
            items[1].as_ref().unwrap_err().kind(),
            ErrorKind::StreamAborted
        );
    }

    #[tokio::test]
    async fn decode_error_message_truncates_long_lines() {
        let long_line = format!("{{broken {}", "x".repeat(500));
        let err = parse_chat_line(&long_line).unwrap_err();
        assert!(err.message().len() < 250);
    }
}
