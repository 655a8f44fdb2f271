//! Decoding of individual upstream stream lines

use serde::{Deserialize, Serialize};

/// One decoded line of the upstream stream
///
/// Only `response` and `done` are read; every other field the backend
/// sends (timings, context, model name) is ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Text fragment, possibly empty
    #[serde(rename = "response", default)]
    pub fragment: String,
    /// Whether the backend considers the answer finished
    #[serde(default)]
    pub done: bool,
}

/// Classification of a raw line
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodedLine {
    /// Whitespace only; skipped without parsing
    Blank,
    /// A well-formed chunk
    Chunk(StreamChunk),
    /// Not a chunk object; treated as noise
    Malformed,
}

impl StreamChunk {
    /// Create a chunk (mostly useful for stub backends)
    pub fn new(fragment: impl Into<String>, done: bool) -> Self {
        Self {
            fragment: fragment.into(),
            done,
        }
    }

    /// Decode one line independently of its neighbours
    #[must_use]
    pub fn decode(line: &str) -> DecodedLine {
        let line = line.trim();
        if line.is_empty() {
            return DecodedLine::Blank;
        }
        // serde would otherwise accept `["text", true]` as a struct
        if !line.starts_with('{') {
            tracing::debug!(line_len = line.len(), "Skipping non-object stream line");
            return DecodedLine::Malformed;
        }
        match serde_json::from_str::<Self>(line) {
            Ok(chunk) => DecodedLine::Chunk(chunk),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed stream line");
                DecodedLine::Malformed
            }
        }
    }

    /// Encode as a single wire line (without the trailing newline)
    #[must_use]
    pub fn to_line(&self) -> String {
        serde_json::json!({ "response": self.fragment, "done": self.done }).to_string()
    }
}
