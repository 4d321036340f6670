mod sync;

#[cfg(feature = "tokio")]
mod tokio;

pub use sync::SyncBoundedLineReader;

#[cfg(feature = "tokio")]
pub use self::tokio::AsyncBoundedLineReader;

const CHUNK_SIZE_BYTES: usize = 8192;

#[derive(Debug, PartialEq, Eq)]
pub enum BoundedLine {
    Line {
        line_number: usize,
        bytes: Vec<u8>,
    },
    LineTooLong {
        line_number: usize,
        observed_bytes: usize,
        max_line_bytes: usize,
    },
}

/// Splits chunks read from a source into newline-terminated lines while
/// holding at most `max_line_bytes` of any single line in memory.
///
/// Shared by the blocking and async readers; they only differ in how the
/// chunk buffer is refilled.
struct LineAssembler {
    max_line_bytes: usize,
    buffer: Box<[u8]>,
    buffer_pos: usize,
    buffer_len: usize,
    current_line: Vec<u8>,
    observed_bytes: usize,
    discard_mode: bool,
    pending_too_long: bool,
    line_number: usize,
}

impl LineAssembler {
    fn new(max_line_bytes: usize) -> Self {
        Self {
            max_line_bytes,
            buffer: vec![0u8; CHUNK_SIZE_BYTES].into_boxed_slice(),
            buffer_pos: 0,
            buffer_len: 0,
            current_line: Vec::new(),
            observed_bytes: 0,
            discard_mode: false,
            pending_too_long: false,
            line_number: 0,
        }
    }

    /// Number of the line currently being assembled.
    fn pending_line_number(&self) -> usize {
        self.line_number + 1
    }

    /// Empties the chunk buffer and hands it out for refilling.
    fn spare(&mut self) -> &mut [u8] {
        self.buffer_pos = 0;
        self.buffer_len = 0;
        &mut self.buffer
    }

    fn filled(&mut self, n: usize) {
        self.buffer_len = n;
    }

    /// Returns the next complete line from the buffered bytes, or `None`
    /// when more input is needed.
    fn next_line(&mut self) -> Option<BoundedLine> {
        if self.buffer_pos >= self.buffer_len {
            return None;
        }

        let (newline_idx, slice_len) = {
            let slice = &self.buffer[self.buffer_pos..self.buffer_len];
            (slice.iter().position(|b| *b == b'\n'), slice.len())
        };

        let Some(newline_idx) = newline_idx else {
            self.observe_bytes(slice_len);
            if !self.discard_mode {
                let slice = &self.buffer[self.buffer_pos..self.buffer_len];
                self.current_line.extend_from_slice(slice);
            }
            self.buffer_pos = self.buffer_len;
            return None;
        };

        self.observe_bytes(newline_idx);
        if !self.discard_mode {
            let segment = &self.buffer[self.buffer_pos..self.buffer_pos + newline_idx];
            self.current_line.extend_from_slice(segment);
        }
        self.buffer_pos += newline_idx + 1;
        Some(self.finish_line())
    }

    /// Flushes a final line that had no trailing newline.
    fn finish(&mut self) -> Option<BoundedLine> {
        if self.pending_too_long || !self.current_line.is_empty() {
            Some(self.finish_line())
        } else {
            None
        }
    }

    fn finish_line(&mut self) -> BoundedLine {
        let line_number = self.pending_line_number();
        self.line_number = line_number;

        if self.pending_too_long {
            let observed_bytes = self.observed_bytes;
            let max_line_bytes = self.max_line_bytes;
            self.reset_line_state();
            return BoundedLine::LineTooLong {
                line_number,
                observed_bytes,
                max_line_bytes,
            };
        }

        let bytes = std::mem::take(&mut self.current_line);
        self.reset_line_state();
        BoundedLine::Line { line_number, bytes }
    }

    fn reset_line_state(&mut self) {
        self.current_line.clear();
        self.observed_bytes = 0;
        self.discard_mode = false;
        self.pending_too_long = false;
    }

    fn observe_bytes(&mut self, additional: usize) {
        self.observed_bytes = self.observed_bytes.saturating_add(additional);
        if self.observed_bytes > self.max_line_bytes && !self.discard_mode {
            self.discard_mode = true;
            self.pending_too_long = true;
            self.current_line.clear();
        }
    }
}
