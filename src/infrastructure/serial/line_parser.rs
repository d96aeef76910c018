/// Line delimiter used by the device in both directions
pub const LINE_DELIMITER: &[u8] = b"\r\n";

/// Buffers raw serial input and emits a line for every `\r\n` seen.
///
/// The delimiter is stripped and may be split across pushes. Empty lines are
/// not emitted. Invalid UTF-8 is replaced rather than rejected.
#[derive(Debug, Default)]
pub struct LineParser {
    buffer: Vec<u8>,
}

impl LineParser {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Feed a chunk of bytes, returning every line it completes
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        // A delimiter can straddle the previous chunk, so rescan its last byte.
        let scan_from = self.buffer.len().saturating_sub(LINE_DELIMITER.len() - 1);
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        let mut start = 0;
        let mut search = scan_from;
        while let Some(offset) = find_delimiter(&self.buffer[search..]) {
            let end = search + offset;
            if end > start {
                lines.push(String::from_utf8_lossy(&self.buffer[start..end]).into_owned());
            }
            start = end + LINE_DELIMITER.len();
            search = start;
        }

        self.buffer.drain(..start);
        lines
    }

    /// Bytes received since the last complete line
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}

fn find_delimiter(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(LINE_DELIMITER.len())
        .position(|window| window == LINE_DELIMITER)
}
