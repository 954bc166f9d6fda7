//! Selection region tracker
//!
//! After every parse (or plain selection move) the observer recomputes, per
//! level, which tokens the selection touches and which must be redrawn. A
//! renderer reveals delimiters and tags of touched tokens and repaints only
//! the changed ones.

use std::cell::Cell;

use log::trace;
use serde::Serialize;

use super::region::Region;
use super::Selection;
use crate::config::TagVisibility;
use crate::syntax::{Level, ParseReport, Token, TokenDelta, TokenStreams};

/// How a token relates to the selection. Later variants take precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchRelation {
    /// Touches an end of a selection range
    Adjacent,
    Intersecting,
    /// Contains a selection range (a cursor must be strictly inside)
    Covering,
    /// Lies within a non-empty selection range
    Covered,
}

impl TouchRelation {
    /// Relation of token span `a..b` to selection span `s..e`, if touching.
    pub fn between(a: usize, b: usize, s: usize, e: usize) -> Option<TouchRelation> {
        if s > b || a > e {
            return None;
        }
        let relation = if s < e && s <= a && b <= e {
            TouchRelation::Covered
        } else if a <= s && e <= b && (s < e || (a < s && s < b)) {
            TouchRelation::Covering
        } else if s < b && a < e {
            TouchRelation::Intersecting
        } else {
            TouchRelation::Adjacent
        };
        Some(relation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TouchedToken {
    pub index: usize,
    pub relation: TouchRelation,
}

/// Observation results for one token array.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelRegions {
    /// Tokens touched by the selection
    pub selected: Region,
    /// Tokens to redraw since the previous observation
    pub changed: Region,
    /// Character ranges whose decorations must be purged before redrawing
    pub filter: Vec<(usize, usize)>,
}

#[derive(Debug, Default)]
pub struct SelectionObserver {
    /// Merged, sorted selection spans
    spans: Vec<(usize, usize)>,
    inline: LevelRegions,
    block: LevelRegions,
    restart: bool,
    observed: bool,
    /// Index of the span that answered the last `touches` query
    last_hit: Cell<usize>,
}

impl SelectionObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop prior state; the next observation marks every token changed.
    pub fn restart(&mut self) {
        self.restart = true;
    }

    pub fn regions(&self, level: Level) -> &LevelRegions {
        match level {
            Level::Inline => &self.inline,
            Level::Block => &self.block,
        }
    }

    pub fn spans(&self) -> &[(usize, usize)] {
        &self.spans
    }

    /// Re-observe `selection` against freshly parsed `streams`. `report`
    /// describes the parse since the last observation (or is unchanged for
    /// a selection-only update).
    pub fn observe(&mut self, selection: &Selection, streams: &TokenStreams, report: &ParseReport, doc_len: usize) {
        self.spans = selection.merged();
        self.last_hit.set(0);
        let restart = self.restart || !self.observed;

        for level in Level::ALL {
            let tokens = streams.get(level);
            let delta = if restart { TokenDelta::Full } else { report.delta(level) };
            let regions = self.observe_level(level, tokens, delta, report.window, doc_len);
            trace!(
                "{:?}: {} selected, {} changed",
                level,
                regions.selected.count(),
                regions.changed.count()
            );
            match level {
                Level::Inline => self.inline = regions,
                Level::Block => self.block = regions,
            }
        }
        self.restart = false;
        self.observed = true;
    }

    fn observe_level(
        &self,
        level: Level,
        tokens: &[Token],
        delta: TokenDelta,
        window: Option<(usize, usize)>,
        doc_len: usize,
    ) -> LevelRegions {
        let mut selected = Region::new();
        for (i, token) in tokens.iter().enumerate() {
            if self.touches(token.from, token.to) {
                selected.push(i, i + 1);
            }
        }

        let previous = self.regions(level);
        let (changed, filter) = match delta {
            TokenDelta::Full => (Region::span(0, tokens.len()), vec![(0, doc_len)]),
            _ => {
                let mut changed = previous.selected.remap(delta).union(&selected);
                if let TokenDelta::Partial { start, new_end, .. } = delta {
                    changed.push(start, new_end);
                }
                let filter = filter_ranges(tokens, &changed, window);
                (changed, filter)
            }
        };

        LevelRegions {
            selected,
            changed,
            filter,
        }
    }

    /// Whether `[from, to]` touches (intersects or abuts) the selection.
    pub fn touches(&self, from: usize, to: usize) -> bool {
        let spans = &self.spans;
        let cached = self.last_hit.get();
        let i = if spans
            .get(cached)
            .is_some_and(|s| s.1 >= from && (cached == 0 || spans[cached - 1].1 < from))
        {
            cached
        } else {
            spans.partition_point(|s| s.1 < from)
        };
        match spans.get(i) {
            Some(&(s, _)) => {
                self.last_hit.set(i);
                s <= to
            }
            None => false,
        }
    }

    /// Tokens touching the selection with their strongest relation.
    pub fn touched_tokens(&self, tokens: &[Token]) -> Vec<TouchedToken> {
        tokens
            .iter()
            .enumerate()
            .filter_map(|(index, token)| {
                self.spans
                    .iter()
                    .filter_map(|&(s, e)| TouchRelation::between(token.from, token.to, s, e))
                    .max()
                    .map(|relation| TouchedToken { index, relation })
            })
            .collect()
    }

    /// Whether a renderer should show the tag of token `index` at `level`.
    pub fn tag_visible(&self, level: Level, index: usize, visibility: TagVisibility) -> bool {
        match visibility {
            TagVisibility::Always => true,
            TagVisibility::Never => false,
            TagVisibility::WhenTouched => self.regions(level).selected.contains(index),
        }
    }
}

/// Character spans of the changed tokens plus the rescan window, merged.
fn filter_ranges(tokens: &[Token], changed: &Region, window: Option<(usize, usize)>) -> Vec<(usize, usize)> {
    let mut spans: Vec<(usize, usize)> = changed
        .iter_indices()
        .filter_map(|i| tokens.get(i))
        .map(|t| (t.from, t.to))
        .chain(window)
        .collect();
    spans.sort_unstable();

    let mut out: Vec<(usize, usize)> = Vec::with_capacity(spans.len());
    for (from, to) in spans {
        match out.last_mut() {
            Some(last) if from <= last.1 => last.1 = last.1.max(to),
            _ => out.push((from, to)),
        }
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
