//! Line-oriented framing shared by every backend's `generate_stream`.
//!
//! Ollama's wire format is newline-delimited JSON; OpenAI, Anthropic, and
//! watsonx.ai all use Server-Sent Events, which are themselves
//! line-oriented (`data: {...}\n\n`). Rather than four bespoke chunk
//! parsers, every backend buffers raw HTTP body bytes into lines here and
//! only backend-specific code interprets a line's content.

use crate::provider::ProviderError;
use bytes::Bytes;
use futures::stream::{BoxStream, Stream, StreamExt};

/// Turn a stream of raw HTTP body chunks into a stream of complete lines,
/// buffering partial lines across chunk boundaries. Blank lines (common
/// as SSE event separators) are skipped.
pub fn line_stream<S, E>(bytes: S) -> BoxStream<'static, Result<String, ProviderError>>
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(futures::stream::unfold(
        (bytes, String::new(), false),
        |(mut bytes, mut buf, mut finished)| async move {
            loop {
                if let Some(idx) = buf.find('\n') {
                    let raw: String = buf.drain(..=idx).collect();
                    let line = raw.trim_end_matches(['\r', '\n']).to_string();
                    if line.is_empty() {
                        continue;
                    }
                    return Some((Ok(line), (bytes, buf, finished)));
                }

                if finished {
                    if buf.trim().is_empty() {
                        return None;
                    }
                    let line = std::mem::take(&mut buf);
                    return Some((Ok(line), (bytes, buf, finished)));
                }

                match bytes.next().await {
                    Some(Ok(chunk)) => buf.push_str(&String::from_utf8_lossy(&chunk)),
                    Some(Err(e)) => {
                        return Some((
                            Err(ProviderError::RequestFailed(e.to_string())),
                            (bytes, buf, finished),
                        ));
                    }
                    None => finished = true,
                }
            }
        },
    ))
}

/// Strip a leading Server-Sent Events `data: ` prefix, if present.
pub fn strip_sse_prefix(line: &str) -> &str {
    line.strip_prefix("data:").map(str::trim_start).unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[tokio::test]
    async fn reassembles_lines_split_across_chunks() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"data: {\"a\":1}\n")),
            Ok(Bytes::from_static(b"data: {\"a\"")),
            Ok(Bytes::from_static(b":2}\n")),
        ];
        let lines: Vec<_> = line_stream(stream::iter(chunks)).collect().await;
        let lines: Vec<String> = lines.into_iter().map(Result::unwrap).collect();
        assert_eq!(lines, vec!["data: {\"a\":1}", "data: {\"a\":2}"]);
    }

    #[tokio::test]
    async fn flushes_a_trailing_line_with_no_newline() {
        let chunks: Vec<Result<Bytes, std::io::Error>> =
            vec![Ok(Bytes::from_static(b"data: {\"a\":1}"))];
        let lines: Vec<_> = line_stream(stream::iter(chunks)).collect().await;
        assert_eq!(lines.len(), 1);
    }

    #[tokio::test]
    async fn skips_blank_lines() {
        let chunks: Vec<Result<Bytes, std::io::Error>> =
            vec![Ok(Bytes::from_static(b"data: a\n\ndata: b\n"))];
        let lines: Vec<_> = line_stream(stream::iter(chunks)).collect().await;
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn strip_sse_prefix_removes_data_marker() {
        assert_eq!(strip_sse_prefix("data: {\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_sse_prefix("{\"a\":1}"), "{\"a\":1}");
    }
}
