use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location span as a half-open byte range `[start, end)`.
///
/// Line/column positions are derived on demand from a [`SourceFile`], so
/// spans stay small and nodes synthesized by transforms can reuse the span
/// of the node they replace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Create a new span.
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Create a zero-width span at a single byte offset.
    pub fn point(offset: u32) -> Self {
        Self::new(offset, offset)
    }

    /// Merge two spans into one that covers both.
    pub fn merge(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Returns `true` if `other` lies entirely within this span.
    pub fn contains(self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Length of the span in bytes.
    pub fn len(self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A 1-based line/column position. Columns count UTF-16 code units, the
/// unit source maps use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Holds the source text for error reporting and source maps.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
    /// Cached line start byte offsets for fast line lookup.
    line_starts: Vec<usize>,
}

impl SourceFile {
    /// Create a new source file.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            name: name.into(),
            source,
            line_starts,
        }
    }

    /// Extract a source line by 1-based line number.
    ///
    /// Returns `None` if the line number is out of range.
    pub fn line(&self, line_number: u32) -> Option<&str> {
        let idx = line_number.checked_sub(1)? as usize;
        if idx >= self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[idx];
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&s| s.saturating_sub(1))
            .unwrap_or(self.source.len());
        Some(self.source[start..end].trim_end_matches('\r'))
    }

    /// Get the total number of lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Resolve a byte offset to a 1-based line/column position.
    ///
    /// Offsets past the end clamp to the end of the source; offsets inside a
    /// multi-byte character resolve to that character's column.
    pub fn position(&self, offset: u32) -> Position {
        let offset = (offset as usize).min(self.source.len());
        let idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.line_starts[idx];
        let mut end = offset;
        while !self.source.is_char_boundary(end) {
            end -= 1;
        }
        let column = self.source[line_start..end].encode_utf16().count() as u32 + 1;
        Position {
            line: idx as u32 + 1,
            column,
        }
    }

    /// The source text covered by `span`, or `""` if the span is out of range.
    pub fn slice(&self, span: Span) -> &str {
        self.source
            .get(span.start as usize..span.end as usize)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_point() {
        let s = Span::point(5);
        assert_eq!(s.start, 5);
        assert_eq!(s.end, 5);
        assert!(s.is_empty());
    }

    #[test]
    fn test_span_merge() {
        let merged = Span::new(5, 10).merge(Span::new(2, 8));
        assert_eq!(merged, Span::new(2, 10));
    }

    #[test]
    fn test_span_contains() {
        let outer = Span::new(0, 20);
        assert!(outer.contains(Span::new(0, 20)));
        assert!(outer.contains(Span::new(3, 7)));
        assert!(!outer.contains(Span::new(15, 21)));
    }

    #[test]
    fn test_span_display() {
        assert_eq!(format!("{}", Span::new(3, 15)), "3..15");
    }

    #[test]
    fn test_source_file_line_extraction() {
        let src = SourceFile::new("test.js", "line one\nline two\nline three");
        assert_eq!(src.line(1), Some("line one"));
        assert_eq!(src.line(2), Some("line two"));
        assert_eq!(src.line(3), Some("line three"));
        assert_eq!(src.line(0), None);
        assert_eq!(src.line(4), None);
    }

    #[test]
    fn test_source_file_crlf() {
        let src = SourceFile::new("test.js", "line one\r\nline two\r\n");
        assert_eq!(src.line(1), Some("line one"));
        assert_eq!(src.line(2), Some("line two"));
    }

    #[test]
    fn test_source_file_empty() {
        let src = SourceFile::new("test.js", "");
        assert_eq!(src.line_count(), 1);
        assert_eq!(src.line(1), Some(""));
        assert_eq!(src.position(0), Position { line: 1, column: 1 });
    }

    #[test]
    fn test_position_lookup() {
        let src = SourceFile::new("test.js", "let a;\nlet bc = 1;");
        assert_eq!(src.position(0), Position { line: 1, column: 1 });
        assert_eq!(src.position(4), Position { line: 1, column: 5 });
        assert_eq!(src.position(7), Position { line: 2, column: 1 });
        assert_eq!(src.position(11), Position { line: 2, column: 5 });
        assert_eq!(src.position(1000), Position { line: 2, column: 13 });
    }

    #[test]
    fn test_position_counts_utf16_units() {
        // "é" is 2 bytes / 1 unit, "😀" is 4 bytes / 2 units.
        let src = SourceFile::new("test.js", "é😀x");
        assert_eq!(src.position(2), Position { line: 1, column: 2 });
        assert_eq!(src.position(6), Position { line: 1, column: 4 });
    }

    #[test]
    fn test_slice() {
        let src = SourceFile::new("test.js", "const answer = 42;");
        assert_eq!(src.slice(Span::new(6, 12)), "answer");
        assert_eq!(src.slice(Span::new(40, 50)), "");
    }
}
