//! Incremental decoders for streamed response bodies.
//!
//! Network reads do not line up with records: a read may hold no record, one
//! record or several, and the last one may be cut off. Each decoder keeps the
//! incomplete tail until the next read completes it.

use serde::de::DeserializeOwned;

/// Splits a byte stream on `\n`, carrying incomplete trailing bytes over.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Complete lines contained in `bytes` plus whatever was pending, without terminators.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(decode_line(&line[..pos]));
        }
        lines
    }

    /// Remaining bytes once the stream has ended, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(decode_line(&rest))
    }
}

// Lines are only cut at '\n', so multi-byte characters are never split here.
fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\r')
        .to_string()
}

/// A record that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameError {
    pub record: String,
    pub message: String,
}

/// Newline-delimited JSON.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    lines: LineBuffer,
}

impl NdjsonDecoder {
    /// Each complete non-blank record in order, parsed independently.
    pub fn push<T: DeserializeOwned>(&mut self, bytes: &[u8]) -> Vec<Result<T, FrameError>> {
        self.lines
            .push(bytes)
            .into_iter()
            .filter(|line| !line.trim().is_empty())
            .map(parse_record)
            .collect()
    }

    /// Parses a final record that had no trailing newline.
    pub fn finish<T: DeserializeOwned>(&mut self) -> Option<Result<T, FrameError>> {
        self.lines
            .finish()
            .filter(|line| !line.trim().is_empty())
            .map(parse_record)
    }
}

fn parse_record<T: DeserializeOwned>(record: String) -> Result<T, FrameError> {
    serde_json::from_str(&record).map_err(|err| FrameError {
        message: err.to_string(),
        record,
    })
}

/// Server-sent events; yields the joined `data:` payload of each event.
#[derive(Debug, Default)]
pub struct SseDecoder {
    lines: LineBuffer,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.lines
            .push(bytes)
            .into_iter()
            .filter_map(|line| self.feed_line(&line))
            .collect()
    }

    /// Dispatches an event left open when the stream ended.
    pub fn finish(&mut self) -> Option<String> {
        if let Some(line) = self.lines.finish() {
            if let Some(payload) = self.feed_line(&line) {
                return Some(payload);
            }
        }
        self.dispatch()
    }

    fn feed_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field == "data" {
            self.data.push(value.to_string());
        }
        None
    }

    fn dispatch(&mut self) -> Option<String> {
        if self.data.is_empty() {
            return None;
        }
        let payload = self.data.join("\n");
        self.data.clear();
        Some(payload)
    }
}
