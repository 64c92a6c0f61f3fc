//! Newline framing for the stream transport.

use super::codec::trim_trailing_whitespace;

/// Event produced while feeding bytes into a [`FrameBuffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// One complete frame, without its `\n` delimiter.
    Frame(Vec<u8>),
    /// Pending bytes exceeded the cap; the partial frame was dropped.
    Overflow,
}

/// Per-connection receive buffer that splits input on `\n`.
///
/// When more than `max_bytes` accumulate without a delimiter, the buffer is
/// cleared, a single [`FrameEvent::Overflow`] is emitted, and the remainder of
/// the offending line is skipped up to the next `\n`. Memory use is therefore
/// bounded by the cap regardless of what the peer sends.
#[derive(Debug)]
pub struct FrameBuffer {
    buffer: Vec<u8>,
    max_bytes: usize,
    discarding: bool,
}

impl FrameBuffer {
    /// Creates an empty buffer with the given cap.
    #[must_use]
    pub const fn new(max_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_bytes,
            discarding: false,
        }
    }

    /// Appends `chunk` and returns every event it completes, in order.
    ///
    /// Blank frames (only whitespace) are skipped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<FrameEvent> {
        let mut events = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|byte| *byte == b'\n') {
            let (line, tail) = rest.split_at(pos);
            rest = tail.get(1..).unwrap_or_default();

            if self.discarding {
                self.discarding = false;
                continue;
            }
            if self.buffer.len() + line.len() > self.max_bytes {
                self.buffer.clear();
                events.push(FrameEvent::Overflow);
                continue;
            }

            self.buffer.extend_from_slice(line);
            let frame = std::mem::take(&mut self.buffer);
            if !trim_trailing_whitespace(&frame).is_empty() {
                events.push(FrameEvent::Frame(frame));
            }
        }

        if !rest.is_empty() && !self.discarding {
            if self.buffer.len() + rest.len() > self.max_bytes {
                self.buffer = Vec::new();
                self.discarding = true;
                events.push(FrameEvent::Overflow);
            } else {
                self.buffer.extend_from_slice(rest);
            }
        }

        events
    }

    /// Number of undelimited bytes currently held.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}
