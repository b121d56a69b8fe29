use crate::{error::Result, models::GenerationEvent};

/// Splits a byte stream into `data:` lines and parses each into an event.
/// Chunks may break anywhere, including inside a UTF-8 sequence.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<GenerationEvent>> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = GenerationEvent::from_sse_line(&String::from_utf8_lossy(&line)) {
                events.push(event);
            }
        }
        events
    }

    /// Parses whatever is left once the stream has ended.
    pub fn finish(&mut self) -> Option<Result<GenerationEvent>> {
        let rest = std::mem::take(&mut self.buffer);
        GenerationEvent::from_sse_line(&String::from_utf8_lossy(&rest))
    }
}
