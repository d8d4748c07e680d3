//! Newline-delimited JSON framing
//!
//! The platform streams one JSON document per line and sends an empty line as a
//! keep-alive. [`ndjson_lines`] reassembles lines across chunk boundaries and
//! hands them on as strings; empty lines come through as empty strings so the
//! session can treat them as heartbeats.

use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, Stream, StreamExt};

struct LineState<E> {
    inner: BoxStream<'static, Result<Bytes, E>>,
    buffer: BytesMut,
    done: bool,
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Split a byte stream into lines
///
/// A trailing line without a newline is yielded at end of stream. Errors from
/// the underlying stream are passed through in order.
pub fn ndjson_lines<S, E>(bytes: S) -> BoxStream<'static, Result<String, E>>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Send + 'static,
{
    let state = LineState {
        inner: bytes.boxed(),
        buffer: BytesMut::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(newline) = state.buffer.iter().position(|b| *b == b'\n') {
                let line = state.buffer.split_to(newline + 1);
                return Some((Ok(decode_line(&line[..newline])), state));
            }
            if state.done {
                if state.buffer.is_empty() {
                    return None;
                }
                let rest = state.buffer.split();
                return Some((Ok(decode_line(&rest)), state));
            }
            match state.inner.next().await {
                Some(Ok(chunk)) => state.buffer.extend_from_slice(&chunk),
                Some(Err(e)) => return Some((Err(e), state)),
                None => state.done = true,
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = Result<Bytes, String>> + Send + 'static {
        let owned: Vec<Result<Bytes, String>> = parts.iter().map(|p| Ok(Bytes::from_static(p.as_bytes()))).collect();
        stream::iter(owned)
    }

    #[tokio::test]
    async fn test_lines_split_across_chunks() {
        //! A line broken over several chunks is reassembled
        let lines: Vec<_> = ndjson_lines(chunks(&["{\"a\":", "1}\n{\"b\"", ":2}\n"])).collect().await;
        assert_eq!(lines, vec![Ok("{\"a\":1}".to_string()), Ok("{\"b\":2}".to_string())]);
    }

    #[tokio::test]
    async fn test_empty_lines_are_heartbeats() {
        //! Keep-alive newlines come through as empty strings
        let lines: Vec<_> = ndjson_lines(chunks(&["\n", "{}\r\n", "\n"])).collect().await;
        assert_eq!(
            lines,
            vec![Ok(String::new()), Ok("{}".to_string()), Ok(String::new())]
        );
    }

    #[tokio::test]
    async fn test_trailing_partial_line_is_flushed() {
        //! Data after the last newline is yielded at end of stream
        let lines: Vec<_> = ndjson_lines(chunks(&["{}\n{\"x\":1}"])).collect().await;
        assert_eq!(lines, vec![Ok("{}".to_string()), Ok("{\"x\":1}".to_string())]);
    }

    #[tokio::test]
    async fn test_errors_pass_through() {
        //! A transport error surfaces after the lines before it
        let parts: Vec<Result<Bytes, String>> = vec![
            Ok(Bytes::from_static(b"{}\n")),
            Err("reset".to_string()),
        ];
        let lines: Vec<_> = ndjson_lines(stream::iter(parts)).collect().await;
        assert_eq!(lines, vec![Ok("{}".to_string()), Err("reset".to_string())]);
    }
}
