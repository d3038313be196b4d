//! Line framing for provider response streams.
//!
//! OpenAI-compatible endpoints stream server-sent events (`data: {...}`
//! lines terminated by `data: [DONE]`); Ollama streams newline-delimited
//! JSON. Both arrive as arbitrary byte chunks, so the clients share a small
//! buffer that reassembles complete lines across chunk boundaries.

/// Accumulates byte chunks and yields complete lines.
///
/// Chunk boundaries are arbitrary and may fall inside a multi-byte UTF-8
/// sequence, so raw bytes are buffered and only complete lines are decoded.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a byte chunk into the buffer and returns every line completed
    /// by it, with trailing carriage returns stripped. Incomplete trailing
    /// data is retained for the next chunk.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }
}

/// SSE terminator payload used by OpenAI-compatible streams.
pub const SSE_DONE: &str = "[DONE]";

/// Extracts the payload of an SSE `data:` line, if the line carries one.
pub fn sse_data(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(|payload| payload.trim_start())
}
