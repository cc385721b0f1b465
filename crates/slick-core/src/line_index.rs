//! Line-start index for offset/position conversion.

use crate::span::{Position, Range};
use thiserror::Error;

/// Errors from offset/position queries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PositionError {
    /// Offset beyond the end of the text.
    #[error("offset {offset} is out of range (text length {len})")]
    OffsetOutOfRange {
        /// The requested offset.
        offset: usize,
        /// The text length in bytes.
        len: usize,
    },

    /// Line number outside the known line count.
    #[error("line {line} is out of range (line count {count})")]
    LineOutOfRange {
        /// The requested 1-indexed line.
        line: usize,
        /// Number of lines in the text.
        count: usize,
    },

    /// Column beyond the end of the given line.
    #[error("column {column} is out of range for line {line}")]
    ColumnOutOfRange {
        /// The requested 1-indexed line.
        line: usize,
        /// The requested 0-indexed column.
        column: usize,
    },
}

/// Byte offsets at which each line of the text begins.
///
/// Index 0 is always 0. The table is strictly increasing and is built once
/// by scanning the text for line terminators (`\n`, `\r`, `\r\n`, U+2028,
/// U+2029). Lookups are O(log n) binary searches.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    /// Builds the index by scanning `text` for line terminators.
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        let mut chars = text.char_indices().peekable();
        while let Some((i, ch)) = chars.next() {
            match ch {
                '\r' => {
                    // \r\n counts as a single terminator
                    if let Some(&(_, '\n')) = chars.peek() {
                        chars.next();
                        line_starts.push(i + 2);
                    } else {
                        line_starts.push(i + 1);
                    }
                }
                '\n' => line_starts.push(i + 1),
                '\u{2028}' | '\u{2029}' => line_starts.push(i + ch.len_utf8()),
                _ => {}
            }
        }
        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// The line-start offset table.
    #[must_use]
    pub fn line_starts(&self) -> &[usize] {
        &self.line_starts
    }

    /// Number of lines, counting a trailing empty line after a final
    /// terminator.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Length of the indexed text in bytes.
    #[must_use]
    pub fn text_len(&self) -> usize {
        self.len
    }

    /// Converts a byte offset to a (line, column) position.
    ///
    /// `offset == text_len()` is accepted and yields the synthetic
    /// end-of-file position (last line, column = remaining line length);
    /// callers frequently need "end of file" as a location.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError::OffsetOutOfRange`] if `offset` exceeds the
    /// text length.
    pub fn offset_to_position(&self, offset: usize) -> Result<Position, PositionError> {
        if offset > self.len {
            return Err(PositionError::OffsetOutOfRange {
                offset,
                len: self.len,
            });
        }
        Ok(self.position(offset))
    }

    /// Infallible variant of [`Self::offset_to_position`]; offsets past the
    /// end of the text are clamped to the end-of-file position.
    #[must_use]
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        Position::new(line + 1, offset - self.line_starts[line])
    }

    /// Converts both ends of a range to a [`crate::Span`].
    #[must_use]
    pub fn span(&self, range: Range) -> crate::span::Span {
        crate::span::Span::new(self.position(range.start), self.position(range.end))
    }

    /// Converts a (line, column) position back to a byte offset.
    ///
    /// The exact inverse of [`Self::offset_to_position`] for all positions
    /// inside the text. Requesting the position exactly at end-of-file on the
    /// last line is accepted and returns the text length.
    ///
    /// # Errors
    ///
    /// Returns [`PositionError::LineOutOfRange`] for `line == 0` or a line
    /// past the known line count, and [`PositionError::ColumnOutOfRange`] if
    /// the computed offset would fall beyond the line's actual length
    /// (computed from the next line's start, or the text length for the last
    /// line).
    pub fn position_to_offset(&self, position: Position) -> Result<usize, PositionError> {
        let count = self.line_count();
        if position.line == 0 || position.line > count {
            return Err(PositionError::LineOutOfRange {
                line: position.line,
                count,
            });
        }

        let line_start = self.line_starts[position.line - 1];
        let offset = line_start + position.column;
        let last_line = position.line == count;
        let line_end = if last_line {
            self.len
        } else {
            self.line_starts[position.line]
        };

        // Non-last lines exclude the next line's start; the last line admits
        // the end-of-file offset itself.
        let out_of_line = if last_line {
            offset > line_end
        } else {
            offset >= line_end
        };
        if out_of_line {
            return Err(PositionError::ColumnOutOfRange {
                line: position.line,
                column: position.column,
            });
        }
        Ok(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_zero_is_always_first_start() {
        assert_eq!(LineIndex::new("").line_starts(), &[0]);
        assert_eq!(LineIndex::new("abc").line_starts(), &[0]);
        assert_eq!(LineIndex::new("a\nb").line_starts(), &[0, 2]);
    }

    #[test]
    fn trailing_terminator_adds_empty_line() {
        let index = LineIndex::new("a\nb\n");
        assert_eq!(index.line_starts(), &[0, 2, 4]);
        assert_eq!(index.line_count(), 3);
    }

    #[test]
    fn crlf_is_one_terminator() {
        let index = LineIndex::new("a\r\nb");
        assert_eq!(index.line_starts(), &[0, 3]);
    }

    #[test]
    fn bare_cr_and_unicode_terminators() {
        // U+2028 is three bytes in UTF-8, so the third line starts at 6.
        let index = LineIndex::new("a\rb\u{2028}c");
        assert_eq!(index.line_starts(), &[0, 2, 6]);
    }

    #[test]
    fn offset_to_position_basic() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.offset_to_position(0), Ok(Position::new(1, 0)));
        assert_eq!(index.offset_to_position(2), Ok(Position::new(1, 2)));
        assert_eq!(index.offset_to_position(3), Ok(Position::new(2, 0)));
        assert_eq!(index.offset_to_position(4), Ok(Position::new(2, 1)));
    }

    #[test]
    fn offset_at_text_len_is_end_of_file() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.offset_to_position(5), Ok(Position::new(2, 2)));
        assert!(index.offset_to_position(6).is_err());
    }

    #[test]
    fn position_to_offset_rejects_bad_lines() {
        let index = LineIndex::new("ab\ncd");
        assert!(matches!(
            index.position_to_offset(Position::new(0, 0)),
            Err(PositionError::LineOutOfRange { .. })
        ));
        assert!(matches!(
            index.position_to_offset(Position::new(3, 0)),
            Err(PositionError::LineOutOfRange { .. })
        ));
    }

    #[test]
    fn position_to_offset_rejects_columns_past_line_end() {
        let index = LineIndex::new("ab\ncd");
        // Line 1 owns offsets 0..3 (including the terminator); column 3
        // would land on line 2's start.
        assert!(matches!(
            index.position_to_offset(Position::new(1, 3)),
            Err(PositionError::ColumnOutOfRange { .. })
        ));
        // End-of-file on the last line is accepted.
        assert_eq!(index.position_to_offset(Position::new(2, 2)), Ok(5));
        assert!(index.position_to_offset(Position::new(2, 3)).is_err());
    }

    #[test]
    fn conversions_are_mutually_inverse() {
        let text = "let a = 1;\nfn f() {\r\n  g();\n}\n";
        let index = LineIndex::new(text);
        for offset in 0..=text.len() {
            if !text.is_char_boundary(offset) {
                continue;
            }
            let position = index.offset_to_position(offset).unwrap();
            assert_eq!(index.position_to_offset(position), Ok(offset), "offset {offset}");
        }
    }

    #[test]
    fn end_of_file_on_trailing_empty_line() {
        let index = LineIndex::new("a\n");
        // The trailing terminator opens an empty line 2.
        assert_eq!(index.offset_to_position(2), Ok(Position::new(2, 0)));
        assert_eq!(index.position_to_offset(Position::new(2, 0)), Ok(2));
    }
}
