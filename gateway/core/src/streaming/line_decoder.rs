//! Newline-delimited framing over raw byte chunks
//!
//! Network reads split the upstream body at arbitrary points: in the middle
//! of a JSON object, between `\r` and `\n`, or inside a multi-byte UTF-8
//! character. [`LineDecoder`] keeps the unterminated tail between reads and
//! only decodes text once a full line is available.

use std::collections::VecDeque;

use futures::{Stream, StreamExt};

use crate::error::UpstreamError;

/// Partial-line buffer
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    /// Create an empty decoder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every line it completed, in order
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            lines.push(decode_line(&self.buffer[start..end]));
            start = end + 1;
        }
        self.buffer.drain(..start);

        lines
    }

    /// Flush the trailing line that never received a newline
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = decode_line(&self.buffer);
        self.buffer.clear();
        Some(line)
    }

    /// Number of bytes waiting for a newline
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

struct LineState<S> {
    bytes: S,
    decoder: LineDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

/// Adapt a fallible byte-chunk stream into a stream of lines
///
/// A transport error is yielded once, after any lines already completed,
/// and ends the stream. When the byte stream closes normally the final
/// unterminated line (if any) is still emitted.
pub fn ndjson_lines<S, B, E>(bytes: S) -> impl Stream<Item = Result<String, UpstreamError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<UpstreamError> + Send + 'static,
{
    let state = LineState {
        bytes,
        decoder: LineDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(line) = state.pending.pop_front() {
                return Some((Ok(line), state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let lines = state.decoder.push(chunk.as_ref());
                    state.pending.extend(lines);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    if state.decoder.buffered() > 0 {
                        tracing::debug!(
                            bytes = state.decoder.buffered(),
                            "Discarding partial line after transport error"
                        );
                    }
                    return Some((Err(e.into()), state));
                }
                None => {
                    state.finished = true;
                    if state.decoder.buffered() > 0 {
                        tracing::debug!(
                            bytes = state.decoder.buffered(),
                            "Upstream body ended without a trailing newline"
                        );
                    }
                    if let Some(tail) = state.decoder.finish() {
                        state.pending.push_back(tail);
                    }
                }
            }
        }
    })
}
