//! Source positions, ranges, and spans.
//!
//! All offsets are byte offsets into the analyzed text. Lines are 1-indexed,
//! columns are 0-indexed byte columns within a line. Every token, comment,
//! and AST node carries both a [`Range`] and a [`Span`], derived consistently
//! from the same [`crate::LineIndex`].

use serde::{Deserialize, Serialize};

/// A half-open byte range `[start, end)` into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    /// Start offset, inclusive.
    pub start: usize,
    /// End offset, exclusive.
    pub end: usize,
}

impl Range {
    /// Creates a new range.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length of the range in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the range covers no text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns true if `offset` falls inside the range.
    #[must_use]
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Returns true if the two ranges share at least one offset.
    #[must_use]
    pub fn overlaps(&self, other: Range) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns true if `other` lies entirely inside this range.
    #[must_use]
    pub fn encloses(&self, other: Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// A (line, column) position in the source text.
///
/// `line` is 1-indexed; `column` is a 0-indexed byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column within the line (0-indexed).
    pub column: usize,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Start and end positions of a source element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Position of the first character.
    pub start: Position,
    /// Position one past the last character.
    pub end: Position,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Returns true if start and end fall on the same line.
    #[must_use]
    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_overlap_is_symmetric() {
        let a = Range::new(0, 5);
        let b = Range::new(3, 8);
        let c = Range::new(5, 8);
        assert!(a.overlaps(b));
        assert!(b.overlaps(a));
        // Adjacent ranges do not overlap
        assert!(!a.overlaps(c));
        assert!(!c.overlaps(a));
    }

    #[test]
    fn range_contains_is_half_open() {
        let r = Range::new(2, 4);
        assert!(!r.contains(1));
        assert!(r.contains(2));
        assert!(r.contains(3));
        assert!(!r.contains(4));
    }

    #[test]
    fn span_single_line() {
        let single = Span::new(Position::new(1, 0), Position::new(1, 10));
        let multi = Span::new(Position::new(1, 0), Position::new(2, 3));
        assert!(single.is_single_line());
        assert!(!multi.is_single_line());
    }
}
