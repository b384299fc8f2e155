//! Source location tracking for block nodes.
//!
//! Positions are 1-based. Columns count bytes of the decoded line, so a
//! multi-byte character advances the column by its UTF-8 length.

use std::fmt;

/// Start and end of a node in the source text.
///
/// # Example
///
/// ```rust
/// use commark_core::span::SourcePos;
///
/// let pos = SourcePos::new(1, 1, 2, 5);
/// assert_eq!(pos.to_string(), "1:1-2:5");
/// assert!(pos.contains_line(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourcePos {
    /// Line of the first character.
    pub start_line: usize,
    /// Column of the first character.
    pub start_column: usize,
    /// Line of the last character.
    pub end_line: usize,
    /// Column of the last character.
    pub end_column: usize,
}

impl SourcePos {
    /// Create a position from its four components.
    #[inline]
    pub const fn new(start_line: usize, start_column: usize, end_line: usize, end_column: usize) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Check if the position covers the given line.
    #[inline]
    pub const fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}
