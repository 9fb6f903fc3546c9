//! Incremental `text/event-stream` parsing.
//!
//! Chunks arrive at arbitrary boundaries (including mid-character); the
//! parser buffers raw bytes, splits on newlines, and dispatches one
//! [`SseMessage`] per blank line, per the SSE wire format. Comment lines
//! (leading `:`) and unknown fields are ignored.

/// One complete server-sent event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseMessage {
    pub event: Option<String>,
    pub id: Option<String>,
    /// Multi-line `data:` fields joined with `\n`.
    pub data: String,
}

#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    event: Option<String>,
    id: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    /// Feed a chunk; returns every event completed by it, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseMessage> {
        self.buffer.extend_from_slice(chunk);

        let mut out = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);
            if let Some(message) = self.take_line(line) {
                out.push(message);
            }
        }
        out
    }

    fn take_line(&mut self, line: &str) -> Option<SseMessage> {
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
        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseMessage> {
        if self.data.is_empty() && self.event.is_none() && self.id.is_none() {
            return None;
        }
        Some(SseMessage {
            event: self.event.take(),
            id: self.id.take(),
            data: std::mem::take(&mut self.data).join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_event_parses() {
        let mut parser = SseParser::default();
        let events = parser.feed(b"event: notice\ndata: {\"n\":1}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event.as_deref(), Some("notice"));
        assert_eq!(events[0].data, "{\"n\":1}");
    }

    #[test]
    fn events_split_across_chunks_are_reassembled() {
        let mut parser = SseParser::default();
        assert!(parser.feed(b"data: hel").is_empty());
        assert!(parser.feed(b"lo\n").is_empty());
        let events = parser.feed(b"\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "hello");
    }

    #[test]
    fn multibyte_characters_survive_chunk_boundaries() {
        let mut parser = SseParser::default();
        let payload = "data: 수선중\n\n".as_bytes();
        // Split inside the first Korean character.
        let events_a = parser.feed(&payload[..8]);
        assert!(events_a.is_empty());
        let events_b = parser.feed(&payload[8..]);
        assert_eq!(events_b.len(), 1);
        assert_eq!(events_b[0].data, "수선중");
    }

    #[test]
    fn multiline_data_is_joined_with_newlines() {
        let mut parser = SseParser::default();
        let events = parser.feed(b"data: one\ndata: two\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "one\ntwo");
    }

    #[test]
    fn comments_and_blank_lines_produce_nothing() {
        let mut parser = SseParser::default();
        assert!(parser.feed(b": keep-alive\n\n\n").is_empty());
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let mut parser = SseParser::default();
        let events = parser.feed(b"id: 7\r\ndata: x\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id.as_deref(), Some("7"));
        assert_eq!(events[0].data, "x");
    }

    #[test]
    fn multiple_events_in_one_chunk_arrive_in_order() {
        let mut parser = SseParser::default();
        let events = parser.feed(b"data: 1\n\ndata: 2\n\ndata: 3\n\n");
        let data: Vec<&str> = events.iter().map(|e| e.data.as_str()).collect();
        assert_eq!(data, ["1", "2", "3"]);
    }
}
