//! Upstream Stream Decoding
//!
//! The backend answers with newline-delimited JSON. Decoding happens in two
//! independent steps:
//!
//! ```text
//!   byte chunks ──► LineDecoder ──► raw lines ──► StreamChunk::decode ──► chunks
//!  (arbitrary cut)  (buffers tail)               (blank / chunk / noise)
//! ```
//!
//! Framing never fails: a line is whatever lies between two newlines.
//! Decoding is per line: a malformed line is classified as noise and the
//! caller moves on to the next one.

mod chunk;
mod line_decoder;

pub use chunk::{DecodedLine, StreamChunk};
pub use line_decoder::{ndjson_lines, LineDecoder};
