//! Streaming line splitter.
//!
//! Input arrives in arbitrary byte chunks. The splitter buffers bytes until
//! a complete line is available, so a line ending or a multi-byte character
//! split across two chunks is handled exactly as if it had arrived whole.
//!
//! Every emitted line is valid UTF-8, contains no NUL and ends with a
//! single `\n`, whatever ending (`\n`, `\r\n` or `\r`) it had in the source.
//! Newline scanning uses `memchr2`.

use memchr::memchr2;

/// Splits a byte stream into normalised lines.
#[derive(Debug, Default)]
pub struct LineSplitter {
    /// Bytes of the current, incomplete line.
    pending: Vec<u8>,
    /// The previous chunk ended with `\r`; a leading `\n` belongs to it.
    skip_lf: bool,
    /// Substitute invalid sequences without logging.
    validate_utf8: bool,
    /// Lines emitted so far.
    lines: usize,
}

impl LineSplitter {
    /// Create a splitter. With `validate_utf8` set, invalid input is replaced
    /// silently; otherwise each affected line logs a warning.
    pub fn new(validate_utf8: bool) -> Self {
        Self {
            validate_utf8,
            ..Self::default()
        }
    }

    /// Number of complete lines returned so far.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.lines
    }

    /// Whether bytes of an unfinished line are buffered.
    #[inline]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Consume a chunk and return every line it completes.
    pub fn feed(&mut self, mut chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        if self.skip_lf && !chunk.is_empty() {
            if chunk[0] == b'\n' {
                chunk = &chunk[1..];
            }
            self.skip_lf = false;
        }
        while let Some(pos) = memchr2(b'\n', b'\r', chunk) {
            self.pending.extend_from_slice(&chunk[..pos]);
            lines.push(self.take_line());
            let mut end = pos + 1;
            if chunk[pos] == b'\r' {
                match chunk.get(end) {
                    Some(b'\n') => end += 1,
                    Some(_) => {}
                    None => self.skip_lf = true,
                }
            }
            chunk = &chunk[end..];
        }
        self.pending.extend_from_slice(chunk);
        lines
    }

    /// Flush the final line if the input did not end with a line ending.
    pub fn finish(&mut self) -> Option<String> {
        self.skip_lf = false;
        if self.pending.is_empty() {
            return None;
        }
        Some(self.take_line())
    }

    fn take_line(&mut self) -> String {
        self.lines += 1;
        let mut line = match String::from_utf8(std::mem::take(&mut self.pending)) {
            Ok(line) => line,
            Err(err) => {
                if !self.validate_utf8 {
                    tracing::warn!(line = self.lines, "invalid UTF-8 replaced with U+FFFD");
                }
                String::from_utf8_lossy(err.as_bytes()).into_owned()
            }
        };
        if line.contains('\0') {
            line = line.replace('\0', "\u{fffd}");
        }
        line.push('\n');
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_all(chunks: &[&[u8]]) -> Vec<String> {
        let mut splitter = LineSplitter::new(true);
        let mut out = Vec::new();
        for chunk in chunks {
            out.extend(splitter.feed(chunk));
        }
        out.extend(splitter.finish());
        out
    }

    #[test]
    fn test_line_endings_normalised() {
        assert_eq!(split_all(&[b"a\nb\r\nc\rd"]), vec!["a\n", "b\n", "c\n", "d\n"]);
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        assert_eq!(split_all(&[b"a\r", b"\nb\n"]), vec!["a\n", "b\n"]);
        assert_eq!(split_all(&[b"a\r", b"", b"\nb"]), vec!["a\n", "b\n"]);
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        let text = "é\n".as_bytes();
        assert_eq!(split_all(&[&text[..1], &text[1..]]), vec!["é\n"]);
    }

    #[test]
    fn test_invalid_bytes_and_nul_replaced() {
        assert_eq!(split_all(&[b"a\xffb\0c\n"]), vec!["a\u{fffd}b\u{fffd}c\n"]);
    }

    #[test]
    fn test_empty_input_yields_no_lines() {
        assert!(split_all(&[b""]).is_empty());
        assert_eq!(split_all(&[b"\n"]), vec!["\n"]);
    }

    #[test]
    fn test_pending_partial_line() {
        let mut splitter = LineSplitter::new(false);
        assert_eq!(splitter.feed(b"one
tw"), vec!["one\n"]);
        assert!(splitter.has_pending());
        assert_eq!(splitter.line_count(), 1);
        assert_eq!(splitter.finish(), Some("tw\n".to_owned()));
        assert!(!splitter.has_pending());
        assert_eq!(splitter.line_count(), 2);
    }
}
