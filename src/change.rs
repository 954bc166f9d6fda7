//! Text edits and change sets
//!
//! A `ChangeSet` is a batch of non-overlapping edits expressed in the
//! coordinates of the document *before* the change. The parser consumes them
//! to size its rescan window; the formatter produces them.

use crate::error::{Error, Result};
use serde::Serialize;

// ─────────────────────────────────────────────────────────────────────────────
// Text Edit
// ─────────────────────────────────────────────────────────────────────────────

/// Replace `from..to` with `insert`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextEdit {
    pub from: usize,
    pub to: usize,
    pub insert: String,
}

impl TextEdit {
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            from: at,
            to: at,
            insert: text.into(),
        }
    }

    pub fn delete(from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            insert: String::new(),
        }
    }

    pub fn replace(from: usize, to: usize, text: impl Into<String>) -> Self {
        Self {
            from,
            to,
            insert: text.into(),
        }
    }

    /// Length change introduced by this edit.
    pub fn delta(&self) -> isize {
        self.insert.len() as isize - (self.to - self.from) as isize
    }

    fn is_insertion(&self) -> bool {
        self.from == self.to
    }
}

/// Which side of an insertion a mapped position sticks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Before,
    After,
}

/// Union of everything a change set touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangedRange {
    /// Start, identical in old and new coordinates
    pub from: usize,
    /// End in pre-change coordinates
    pub old_to: usize,
    /// End in post-change coordinates
    pub new_to: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Change Set
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeSet {
    old_len: usize,
    edits: Vec<TextEdit>,
}

impl ChangeSet {
    /// Build a change set over a document of length `old_len`. Edits are
    /// sorted; overlapping or out-of-range edits are rejected.
    pub fn new(old_len: usize, mut edits: Vec<TextEdit>) -> Result<Self> {
        edits.retain(|e| !(e.is_insertion() && e.insert.is_empty()));
        edits.sort_by_key(|e| (e.from, e.to));

        let mut last_end = 0;
        for edit in &edits {
            if edit.from > edit.to || edit.to > old_len || edit.from < last_end {
                return Err(Error::InvalidRange {
                    from: edit.from,
                    to: edit.to,
                    len: old_len,
                });
            }
            last_end = edit.to;
        }

        Ok(Self { old_len, edits })
    }

    pub fn empty(old_len: usize) -> Self {
        Self {
            old_len,
            edits: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn edits(&self) -> &[TextEdit] {
        &self.edits
    }

    pub fn old_len(&self) -> usize {
        self.old_len
    }

    pub fn new_len(&self) -> usize {
        (self.old_len as isize + self.total_delta()) as usize
    }

    pub fn total_delta(&self) -> isize {
        self.edits.iter().map(TextEdit::delta).sum()
    }

    /// Apply the edits to `text`, which must be the pre-change document.
    pub fn apply(&self, text: &str) -> String {
        let mut out = String::with_capacity(self.new_len());
        let mut pos = 0;
        for edit in &self.edits {
            out.push_str(&text[pos..edit.from]);
            out.push_str(&edit.insert);
            pos = edit.to;
        }
        out.push_str(&text[pos..]);
        out
    }

    /// Map a pre-change position into post-change coordinates.
    ///
    /// Positions inside a replaced range collapse onto it: to its start with
    /// `Assoc::Before`, past the inserted text with `Assoc::After`. A pure
    /// insertion at `pos` is stepped over only with `Assoc::After`.
    pub fn map_pos(&self, pos: usize, assoc: Assoc) -> usize {
        let mut delta: isize = 0;
        for edit in &self.edits {
            if edit.from > pos {
                break;
            }
            if edit.is_insertion() && edit.from == pos {
                if assoc == Assoc::Before {
                    break;
                }
                delta += edit.insert.len() as isize;
                continue;
            }
            if edit.to <= pos {
                delta += edit.delta();
                continue;
            }
            let start = (edit.from as isize + delta) as usize;
            return match assoc {
                Assoc::Before => start,
                Assoc::After => start + edit.insert.len(),
            };
        }
        (pos as isize + delta) as usize
    }

    pub fn changed_range(&self) -> Option<ChangedRange> {
        let first = self.edits.first()?;
        let last = self.edits.last()?;
        Some(ChangedRange {
            from: first.from,
            old_to: last.to,
            new_to: (last.to as isize + self.total_delta()) as usize,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn set(len: usize, edits: Vec<TextEdit>) -> ChangeSet {
        ChangeSet::new(len, edits).unwrap()
    }

    #[test]
    fn test_apply_sorted_edits() {
        let changes = set(
            11,
            vec![TextEdit::insert(11, "!"), TextEdit::replace(0, 5, "howdy")],
        );
        assert_eq!(changes.apply("hello world"), "howdy world!");
        assert_eq!(changes.new_len(), 12);
    }

    #[test]
    fn test_rejects_overlap() {
        let result = ChangeSet::new(10, vec![TextEdit::delete(0, 5), TextEdit::delete(3, 7)]);
        assert!(matches!(result, Err(Error::InvalidRange { .. })));
    }

    #[test]
    fn test_rejects_out_of_range() {
        let result = ChangeSet::new(3, vec![TextEdit::delete(2, 5)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_insertions_dropped() {
        let changes = set(3, vec![TextEdit::insert(1, "")]);
        assert!(changes.is_empty());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Position mapping
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_map_pos_insertion_assoc() {
        let changes = set(5, vec![TextEdit::insert(2, "++")]);
        assert_eq!(changes.map_pos(1, Assoc::After), 1);
        assert_eq!(changes.map_pos(2, Assoc::Before), 2);
        assert_eq!(changes.map_pos(2, Assoc::After), 4);
        assert_eq!(changes.map_pos(3, Assoc::Before), 5);
    }

    #[test]
    fn test_map_pos_deletion() {
        let changes = set(10, vec![TextEdit::delete(2, 4)]);
        assert_eq!(changes.map_pos(2, Assoc::After), 2);
        assert_eq!(changes.map_pos(3, Assoc::Before), 2);
        assert_eq!(changes.map_pos(4, Assoc::Before), 2);
        assert_eq!(changes.map_pos(8, Assoc::After), 6);
    }

    #[test]
    fn test_map_pos_inside_replacement() {
        let changes = set(10, vec![TextEdit::replace(2, 6, "xy")]);
        assert_eq!(changes.map_pos(4, Assoc::Before), 2);
        assert_eq!(changes.map_pos(4, Assoc::After), 4);
        assert_eq!(changes.map_pos(6, Assoc::Before), 4);
    }

    #[test]
    fn test_changed_range() {
        let changes = set(
            20,
            vec![TextEdit::insert(3, "abc"), TextEdit::delete(10, 12)],
        );
        let range = changes.changed_range().unwrap();
        assert_eq!(range.from, 3);
        assert_eq!(range.old_to, 12);
        assert_eq!(range.new_to, 13);
        assert!(ChangeSet::empty(4).changed_range().is_none());
    }
}
