//! Line-indexed text buffer
//!
//! The tokenizer works line by line and the host tree reports positions as
//! (line, column) pairs, so the document keeps a table of line start offsets
//! next to the text.

use crate::change::ChangeSet;
use crate::error::{Error, Result};
use crate::string_utils::safe_slice;

/// One line of the document. `to` excludes the line terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    /// Zero-based line number
    pub number: usize,
    pub from: usize,
    pub to: usize,
}

impl Line {
    pub fn len(&self) -> usize {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    text: String,
    line_starts: Vec<usize>,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self { text, line_starts }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Line by zero-based number, clamped to the last line.
    pub fn line(&self, number: usize) -> Line {
        let number = number.min(self.line_starts.len() - 1);
        let from = self.line_starts[number];
        let to = match self.line_starts.get(number + 1) {
            Some(&next) => next - 1,
            None => self.text.len(),
        };
        Line { number, from, to }
    }

    /// The line containing `offset`. An offset on a line terminator belongs
    /// to the line it terminates.
    pub fn line_at(&self, offset: usize) -> Line {
        let offset = offset.min(self.text.len());
        let number = self.line_starts.partition_point(|&start| start <= offset) - 1;
        self.line(number)
    }

    pub fn line_text(&self, line: Line) -> &str {
        &self.text[line.from..line.to]
    }

    /// Start of the line after `line`, or the document end for the last line.
    pub fn next_line_start(&self, line: Line) -> usize {
        self.line_starts
            .get(line.number + 1)
            .copied()
            .unwrap_or(self.text.len())
    }

    pub fn slice(&self, from: usize, to: usize) -> &str {
        safe_slice(&self.text, from, to)
    }

    /// Byte offset of a 1-based (line, column) position as reported by
    /// comrak's sourcepos. Columns are byte columns; out-of-range values
    /// clamp to the line.
    pub fn offset_of(&self, line: usize, column: usize) -> usize {
        if line == 0 {
            return 0;
        }
        if line > self.line_starts.len() {
            return self.text.len();
        }
        let line = self.line(line - 1);
        (line.from + column.saturating_sub(1)).min(line.to)
    }

    /// Apply a change set, producing the edited document.
    pub fn apply(&self, changes: &ChangeSet) -> Result<Document> {
        if changes.old_len() != self.text.len() {
            return Err(Error::InvalidRange {
                from: 0,
                to: changes.old_len(),
                len: self.text.len(),
            });
        }
        for edit in changes.edits() {
            if !self.text.is_char_boundary(edit.from) || !self.text.is_char_boundary(edit.to) {
                return Err(Error::InvalidRange {
                    from: edit.from,
                    to: edit.to,
                    len: self.text.len(),
                });
            }
        }
        Ok(Document::new(changes.apply(&self.text)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
