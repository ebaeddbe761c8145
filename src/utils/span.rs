//! Source location tracking

use std::fmt;

use serde::Serialize;

/// A span represents a range in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    /// Start char offset
    pub start: usize,
    /// End char offset (exclusive)
    pub end: usize,
    /// 1-based line of `start`
    pub line: usize,
    /// 1-based column of `start`
    pub column: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self { start, end, line, column }
    }

    /// Create a dummy span (for testing and synthesized nodes)
    pub fn dummy() -> Self {
        Self { start: 0, end: 0, line: 1, column: 1 }
    }

    /// Get the length of the span
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the span is empty
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The covered text of `source`. Offsets count chars, not bytes.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        let byte = |offset: usize| {
            source
                .char_indices()
                .nth(offset)
                .map_or(source.len(), |(i, _)| i)
        };
        let start = byte(self.start);
        let end = byte(self.end).max(start);
        &source[start..end]
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::dummy()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len() {
        assert_eq!(Span::new(4, 12, 1, 5).len(), 8);
        assert!(Span::dummy().is_empty());
    }

    #[test]
    fn test_text_counts_chars() {
        let source = "é = 'ü'\nnext";
        assert_eq!(Span::new(4, 7, 1, 5).text(source), "'ü'");
        assert_eq!(Span::new(8, 20, 2, 1).text(source), "next");
    }

    #[test]
    fn test_display() {
        assert_eq!(Span::new(0, 1, 3, 7).to_string(), "line 3, column 7");
    }
}
