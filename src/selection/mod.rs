//! Selections and the selection region tracker
//!
//! A [`Selection`] is what the host reports: one or more ranges with a main
//! one. The [`SelectionObserver`] maps it onto the token arrays to decide
//! which tokens are touched and which must be redrawn.

mod observer;
mod region;

pub use observer::{LevelRegions, SelectionObserver, TouchRelation, TouchedToken};
pub use region::Region;

use serde::Serialize;

use crate::change::{Assoc, ChangeSet};

/// One selection range. `anchor` stays put while `head` moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectionRange {
    pub anchor: usize,
    pub head: usize,
}

impl SelectionRange {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    pub fn cursor(pos: usize) -> Self {
        Self::new(pos, pos)
    }

    pub fn from(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn to(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    /// Map through a change: the start sticks after insertions at it, the
    /// end before.
    pub fn map(&self, changes: &ChangeSet) -> Self {
        if self.is_empty() {
            return Self::cursor(changes.map_pos(self.head, Assoc::After));
        }
        let from = changes.map_pos(self.from(), Assoc::After);
        let to = changes.map_pos(self.to(), Assoc::Before).max(from);
        if self.anchor <= self.head {
            Self::new(from, to)
        } else {
            Self::new(to, from)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    ranges: Vec<SelectionRange>,
    main: usize,
}

impl Default for Selection {
    fn default() -> Self {
        Self::cursor(0)
    }
}

impl Selection {
    /// Build a selection; ranges are sorted by start and `main` follows its
    /// range. An empty list yields a cursor at 0.
    pub fn new(ranges: Vec<SelectionRange>, main: usize) -> Self {
        if ranges.is_empty() {
            return Self::cursor(0);
        }
        let main_range = ranges[main.min(ranges.len() - 1)];
        let mut ranges = ranges;
        ranges.sort_by_key(|r| (r.from(), r.to()));
        let main = ranges.iter().position(|r| *r == main_range).unwrap_or(0);
        Self { ranges, main }
    }

    pub fn single(anchor: usize, head: usize) -> Self {
        Self {
            ranges: vec![SelectionRange::new(anchor, head)],
            main: 0,
        }
    }

    pub fn cursor(pos: usize) -> Self {
        Self::single(pos, pos)
    }

    pub fn ranges(&self) -> &[SelectionRange] {
        &self.ranges
    }

    pub fn main(&self) -> SelectionRange {
        self.ranges[self.main]
    }

    pub fn main_index(&self) -> usize {
        self.main
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.iter().all(SelectionRange::is_empty)
    }

    /// Normalized `(from, to)` spans, sorted, with overlapping ones merged.
    pub fn merged(&self) -> Vec<(usize, usize)> {
        let mut out: Vec<(usize, usize)> = Vec::with_capacity(self.ranges.len());
        for r in &self.ranges {
            match out.last_mut() {
                Some(last) if r.from() <= last.1 => last.1 = last.1.max(r.to()),
                _ => out.push((r.from(), r.to())),
            }
        }
        out
    }

    pub fn map(&self, changes: &ChangeSet) -> Self {
        Self::new(
            self.ranges.iter().map(|r| r.map(changes)).collect(),
            self.main,
        )
    }

    /// Clamp every range into `0..=len`.
    pub fn clamp(&self, len: usize) -> Self {
        Self {
            ranges: self
                .ranges
                .iter()
                .map(|r| SelectionRange::new(r.anchor.min(len), r.head.min(len)))
                .collect(),
            main: self.main,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
