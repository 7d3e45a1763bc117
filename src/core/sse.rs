//! Incremental `text/event-stream` decoder
//!
//! Feed raw body chunks as they arrive; complete events come back in order.
//! Lines may end in LF, CRLF or CR, and chunk boundaries may fall anywhere.

use std::time::Duration;
use tracing::trace;

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// A dispatched server-sent event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SseEvent {
    /// Event name (`message` when the server sent none)
    pub event: String,
    pub data: String,
    /// Last `id:` seen on the stream so far (empty if none)
    pub last_event_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SseFrame {
    Event(SseEvent),
    /// Server-requested reconnection delay
    Retry(Duration),
}

#[derive(Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    started: bool,
    /// Previous chunk ended in CR; a leading LF completes that CRLF
    pending_cr: bool,
    event: String,
    data: String,
    last_event_id: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder for a reconnected stream that keeps the previous last event id
    pub fn resume(last_event_id: &str) -> Self {
        Self {
            last_event_id: last_event_id.to_string(),
            ..Self::default()
        }
    }

    /// Consume a chunk and return every frame it completed
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.extend_from_slice(chunk);
        if !self.started && self.buf.len() >= BOM.len() {
            if self.buf.starts_with(BOM) {
                self.buf.drain(..BOM.len());
            }
            self.started = true;
        }

        let mut frames = Vec::new();
        let mut start = 0;
        if self.pending_cr && !self.buf.is_empty() {
            if self.buf[0] == b'\n' {
                start = 1;
            }
            self.pending_cr = false;
        }
        while let Some(rel) = self.buf[start..].iter().position(|&b| b == b'\n' || b == b'\r') {
            let end = start + rel;
            let next = if self.buf[end] == b'\r' {
                match self.buf.get(end + 1) {
                    None => {
                        // CRLF may be split across chunks
                        self.pending_cr = true;
                        end + 1
                    }
                    Some(b'\n') => end + 2,
                    Some(_) => end + 1,
                }
            } else {
                end + 1
            };
            let line = String::from_utf8_lossy(&self.buf[start..end]).into_owned();
            self.process_line(&line, &mut frames);
            start = next;
        }
        self.buf.drain(..start);

        frames
    }

    pub fn last_event_id(&self) -> &str {
        &self.last_event_id
    }

    fn process_line(&mut self, line: &str, out: &mut Vec<SseFrame>) {
        if line.is_empty() {
            self.dispatch(out);
            return;
        }
        if line.starts_with(':') {
            trace!(comment = &line[1..], "SSE comment");
            return;
        }

        let (field, value) = match line.find(':') {
            Some(i) => {
                let value = &line[i + 1..];
                (&line[..i], value.strip_prefix(' ').unwrap_or(value))
            }
            None => (line, ""),
        };

        match field {
            "event" => self.event = value.to_string(),
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            "id" => {
                if !value.contains('\0') {
                    self.last_event_id = value.to_string();
                }
            }
            "retry" => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(ms) = value.parse::<u64>() {
                        out.push(SseFrame::Retry(Duration::from_millis(ms)));
                    }
                }
            }
            _ => trace!(field, "Ignoring unknown SSE field"),
        }
    }

    fn dispatch(&mut self, out: &mut Vec<SseFrame>) {
        if self.data.is_empty() {
            self.event.clear();
            return;
        }
        let mut data = std::mem::take(&mut self.data);
        if data.ends_with('\n') {
            data.pop();
        }
        let event = match std::mem::take(&mut self.event) {
            name if name.is_empty() => "message".to_string(),
            name => name,
        };
        out.push(SseFrame::Event(SseEvent {
            event,
            data,
            last_event_id: self.last_event_id.clone(),
        }));
    }
}
