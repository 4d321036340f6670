#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct IngestLimits {
    /// Longest accepted line, excluding the newline.
    pub max_line_bytes: usize,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_line_bytes: 64 * 1024,
        }
    }
}
