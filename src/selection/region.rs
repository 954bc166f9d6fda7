//! Sets of token indices

use crate::syntax::TokenDelta;

/// Sorted, non-overlapping, non-adjacent half-open index ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Region {
    ranges: Vec<(usize, usize)>,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    /// Region covering `from..to`.
    pub fn span(from: usize, to: usize) -> Self {
        let mut region = Self::new();
        region.push(from, to);
        region
    }

    pub fn ranges(&self) -> &[(usize, usize)] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of indices in the region.
    pub fn count(&self) -> usize {
        self.ranges.iter().map(|(a, b)| b - a).sum()
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Add `from..to`. Appending after the last range is the fast path;
    /// anything else goes through a union.
    pub fn push(&mut self, from: usize, to: usize) {
        if from >= to {
            return;
        }
        match self.ranges.last_mut() {
            None => self.ranges.push((from, to)),
            Some(last) if from >= last.0 => {
                if from <= last.1 {
                    last.1 = last.1.max(to);
                } else {
                    self.ranges.push((from, to));
                }
            }
            Some(_) => *self = self.union(&Region { ranges: vec![(from, to)] }),
        }
    }

    pub fn union(&self, other: &Region) -> Region {
        let mut all: Vec<(usize, usize)> = self.ranges.iter().chain(&other.ranges).copied().collect();
        all.sort_unstable();
        let mut out = Region::new();
        for (from, to) in all {
            out.push(from, to);
        }
        out
    }

    /// Move every range starting at or after `at` by `delta` indices.
    pub fn shift(&mut self, at: usize, delta: isize) {
        for range in self.ranges.iter_mut().filter(|r| r.0 >= at) {
            range.0 = (range.0 as isize + delta).max(0) as usize;
            range.1 = (range.1 as isize + delta).max(0) as usize;
        }
        self.ranges.retain(|r| r.0 < r.1);
    }

    /// Carry the region across a reparse. Indices inside the replaced part
    /// are dropped.
    pub fn remap(&self, delta: TokenDelta) -> Region {
        match delta {
            TokenDelta::Full => Region::new(),
            TokenDelta::Unchanged => self.clone(),
            TokenDelta::Partial {
                start,
                old_end,
                new_end,
            } => {
                let mut out = Region::new();
                for &(from, to) in &self.ranges {
                    out.push(from, to.min(start));
                }
                let mut tail = Region::new();
                for &(from, to) in &self.ranges {
                    tail.push(from.max(old_end), to);
                }
                tail.shift(0, new_end as isize - old_end as isize);
                out.union(&tail)
            }
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        let i = self.ranges.partition_point(|r| r.1 <= index);
        self.ranges.get(i).is_some_and(|r| r.0 <= index)
    }

    pub fn iter_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.ranges.iter().flat_map(|&(from, to)| from..to)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
