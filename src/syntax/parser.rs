//! Incremental parser
//!
//! Owns the token arrays and keeps them equal to a full tokenization of the
//! current document. After an edit it rescans only a window around the
//! change:
//!
//! 1. The window starts at a *reset point* (a line start after a blank or
//!    block-closing line) at or before the change, pulled back further over
//!    delimiter characters, host constructs whose shape the edit may alter,
//!    and tokens straddling it.
//! 2. It ends at the start of the line after the next blank line past the
//!    change, widened over verbatim blocks in either tree.
//! 3. Either bound moves further out while the host constructs the
//!    tokenizer reads differ between the old and new trees outside the
//!    window. A list marker removed above an indented line, or a link
//!    reference definition added below its uses, changes constructs far
//!    from the edit.
//! 4. Tokens before the window are kept, tokens after it are shifted by the
//!    length change, and the window is tokenized afresh.

use log::{debug, trace};

use super::lines::{classify, LineKind};
use super::rules::{is_operator_char, DelimiterTable, Level};
use super::token::{Token, TokenStreams};
use super::tokenizer::{tokenize, Tokenizer};
use crate::change::ChangeSet;
use crate::config::Settings;
use crate::document::Document;
use crate::markdown::{Construct, ConstructKind, ContextClassifier, INTERFERERS, MARKS, SHIFTERS, SKIP};
use crate::string_utils::char_before;

/// How a token array changed in the last parse, in token indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenDelta {
    /// Everything was rebuilt.
    Full,
    Unchanged,
    /// `start..old_end` of the old array became `start..new_end`; later
    /// tokens only moved.
    Partial {
        start: usize,
        old_end: usize,
        new_end: usize,
    },
}

impl TokenDelta {
    /// Map an index of the old array into the new one. Indices inside the
    /// replaced range have no counterpart.
    pub fn map_index(&self, index: usize) -> Option<usize> {
        match *self {
            TokenDelta::Full => None,
            TokenDelta::Unchanged => Some(index),
            TokenDelta::Partial {
                start,
                old_end,
                new_end,
            } => {
                if index < start {
                    Some(index)
                } else if index >= old_end {
                    Some(index - old_end + new_end)
                } else {
                    None
                }
            }
        }
    }
}

/// Outcome of one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseReport {
    /// Rescanned character range in post-change coordinates
    pub window: Option<(usize, usize)>,
    pub inline: TokenDelta,
    pub block: TokenDelta,
}

impl ParseReport {
    pub const UNCHANGED: ParseReport = ParseReport {
        window: None,
        inline: TokenDelta::Unchanged,
        block: TokenDelta::Unchanged,
    };

    pub fn delta(&self, level: Level) -> TokenDelta {
        match level {
            Level::Inline => self.inline,
            Level::Block => self.block,
        }
    }

    pub fn is_full(&self) -> bool {
        self.inline == TokenDelta::Full
    }
}

#[derive(Debug, Clone)]
pub struct Parser {
    streams: TokenStreams,
    table: DelimiterTable,
    /// End of the scanned part of the document
    stream_end: usize,
    needs_full: bool,
    last: ParseReport,
}

impl Default for Parser {
    fn default() -> Self {
        Self::with_table(DelimiterTable::default())
    }
}

impl Parser {
    pub fn new(settings: &Settings) -> Self {
        Self::with_table(DelimiterTable::from_settings(settings))
    }

    pub fn with_table(table: DelimiterTable) -> Self {
        Self {
            streams: TokenStreams::default(),
            table,
            stream_end: 0,
            needs_full: true,
            last: ParseReport::UNCHANGED,
        }
    }

    /// Rebuild the delimiter table. The next parse is a full one.
    pub fn set_settings(&mut self, settings: &Settings) {
        let table = DelimiterTable::from_settings(settings);
        if table != self.table {
            debug!("Delimiter table changed, scheduling full parse");
            self.table = table;
            self.needs_full = true;
        }
    }

    pub fn needs_full_parse(&self) -> bool {
        self.needs_full
    }

    pub fn streams(&self) -> &TokenStreams {
        &self.streams
    }

    pub fn tokens(&self, level: Level) -> &[Token] {
        self.streams.get(level)
    }

    pub fn inline_tokens(&self) -> &[Token] {
        &self.streams.inline
    }

    pub fn block_tokens(&self) -> &[Token] {
        &self.streams.block
    }

    pub fn last_report(&self) -> &ParseReport {
        &self.last
    }

    pub fn full_parse(&mut self, doc: &Document, tree: &dyn ContextClassifier) -> ParseReport {
        self.streams = tokenize(doc, tree, &self.table);
        self.stream_end = doc.len();
        self.needs_full = false;
        debug!(
            "Full parse: {} inline, {} block tokens",
            self.streams.inline.len(),
            self.streams.block.len()
        );
        self.last = ParseReport {
            window: Some((0, doc.len())),
            inline: TokenDelta::Full,
            block: TokenDelta::Full,
        };
        self.last
    }

    /// Bring the tokens up to date with `doc`, the document after `changes`.
    /// `old_tree` and `new_tree` describe the host syntax before and after.
    pub fn apply_change(
        &mut self,
        doc: &Document,
        old_tree: &dyn ContextClassifier,
        new_tree: &dyn ContextClassifier,
        changes: &ChangeSet,
    ) -> ParseReport {
        if self.needs_full || changes.old_len() != self.stream_end || changes.new_len() != doc.len() {
            return self.full_parse(doc, new_tree);
        }
        let Some(range) = changes.changed_range() else {
            self.last = ParseReport::UNCHANGED;
            return self.last;
        };
        let delta = changes.total_delta();

        let mut start = self.window_start(doc, old_tree, new_tree, range.from.min(self.stream_end));
        let mut end = window_end(doc, old_tree, new_tree, range.new_to, delta);
        loop {
            if let Some(pos) = prefix_divergence(old_tree, new_tree, start) {
                trace!("Host constructs differ at {} before window", pos);
                start = self.window_start(doc, old_tree, new_tree, pos);
            } else if let Some(pos) = suffix_divergence(old_tree, new_tree, end, delta) {
                trace!("Host constructs differ up to {} after window", pos);
                end = window_end(doc, old_tree, new_tree, pos, delta);
            } else {
                break;
            }
        }
        let old_end = (end as isize - delta) as usize;
        debug!(
            "Rescan {}..{} for change {}..{} (delta {})",
            start, end, range.from, range.old_to, delta
        );

        let rescanned = Tokenizer::new(doc, new_tree, &self.table).scan(start, end);
        let TokenStreams { inline, block } = rescanned;
        let inline_delta = splice(&mut self.streams.inline, inline, start, old_end, delta);
        let block_delta = splice(&mut self.streams.block, block, start, old_end, delta);

        self.stream_end = doc.len();
        self.last = ParseReport {
            window: Some((start, end)),
            inline: inline_delta,
            block: block_delta,
        };
        self.last
    }

    fn window_start(
        &self,
        doc: &Document,
        old_tree: &dyn ContextClassifier,
        new_tree: &dyn ContextClassifier,
        from: usize,
    ) -> usize {
        let text = doc.text();
        let reach: Vec<ConstructKind> = SHIFTERS.iter().chain(INTERFERERS).copied().collect();
        let mut start = from;
        loop {
            let before = start;

            while let Some(c) = char_before(text, start).filter(|&c| is_operator_char(c)) {
                start -= c.len_utf8();
            }
            start = reset_point(doc, start);

            for tree in [old_tree, new_tree] {
                if let Some(c) = tree.construct_at(start, &reach) {
                    start = start.min(c.from);
                }
            }

            for level in Level::ALL {
                if let Some(t) = self
                    .streams
                    .get(level)
                    .iter()
                    .find(|t| t.from < start && start < t.to)
                {
                    start = t.from;
                }
            }

            if start == before {
                trace!("Window start settled at {}", start);
                return start;
            }
        }
    }
}

/// Latest line start at or before `pos` where nothing can be pending.
fn reset_point(doc: &Document, pos: usize) -> usize {
    let mut line = doc.line_at(pos);
    while line.number > 0 {
        let prev = doc.line(line.number - 1);
        let kind = classify(doc.line_text(prev));
        if kind == LineKind::Blank || kind.is_boundary_after() {
            break;
        }
        line = prev;
    }
    line.from
}

/// Start of the line after the first blank line starting after `pos`, or
/// the document end.
fn after_next_blank(doc: &Document, pos: usize) -> usize {
    let first = doc.line_at(pos).number + 1;
    (first..doc.line_count())
        .map(|n| doc.line(n))
        .find(|line| line.from > pos && doc.line_text(*line).trim().is_empty())
        .map_or(doc.len(), |line| doc.next_line_start(line))
}

fn window_end(
    doc: &Document,
    old_tree: &dyn ContextClassifier,
    new_tree: &dyn ContextClassifier,
    new_to: usize,
    delta: isize,
) -> usize {
    let mut end = after_next_blank(doc, new_to);
    loop {
        if end >= doc.len() {
            return doc.len();
        }
        let old_pos = (end as isize - delta) as usize;
        let inside_new = new_tree
            .construct_at(end, INTERFERERS)
            .filter(|c| c.from < end && c.contains(end))
            .map(|c| c.to);
        let inside_old = old_tree
            .construct_at(old_pos, INTERFERERS)
            .filter(|c| c.from < old_pos && c.contains(old_pos))
            .map(|c| (c.to as isize + delta) as usize);

        match inside_new.into_iter().chain(inside_old).max() {
            Some(block_end) => end = after_next_blank(doc, block_end.max(end)),
            None => return end,
        }
    }
}

/// Construct kinds whose placement the tokenizer reads.
const CONSULTED: [&[ConstructKind]; 4] = [SKIP, INTERFERERS, MARKS, &[ConstructKind::TableRow]];

/// Outermost constructs of `kinds` ending after `offset`, in document order.
fn constructs_from<'a>(
    tree: &'a dyn ContextClassifier,
    offset: usize,
    kinds: &'a [ConstructKind],
) -> impl Iterator<Item = Construct> + 'a {
    let mut pos = offset;
    std::iter::from_fn(move || {
        let c = tree.next_construct(pos, kinds)?;
        pos = c.to;
        Some(c)
    })
}

fn shifted(c: Construct, delta: isize) -> Construct {
    let shift = |offset: usize| (offset as isize + delta).max(0) as usize;
    Construct::new(c.kind, shift(c.from), shift(c.to))
}

/// Earliest start of a construct present in only one tree among those
/// starting before `start`.
fn prefix_divergence(
    old_tree: &dyn ContextClassifier,
    new_tree: &dyn ContextClassifier,
    start: usize,
) -> Option<usize> {
    CONSULTED
        .iter()
        .filter_map(|kinds| {
            let mut old = constructs_from(old_tree, 0, kinds).take_while(|c| c.from < start);
            let mut new = constructs_from(new_tree, 0, kinds).take_while(|c| c.from < start);
            loop {
                match (old.next(), new.next()) {
                    (None, None) => return None,
                    (Some(a), Some(b)) if a == b => continue,
                    (Some(a), Some(b)) => return Some(a.from.min(b.from)),
                    (Some(c), None) | (None, Some(c)) => return Some(c.from),
                }
            }
        })
        .min()
}

/// Furthest end (new coordinates) of a construct present in only one tree
/// among those ending after `end`. Old constructs are compared shifted by
/// `delta`.
fn suffix_divergence(
    old_tree: &dyn ContextClassifier,
    new_tree: &dyn ContextClassifier,
    end: usize,
    delta: isize,
) -> Option<usize> {
    let old_end = (end as isize - delta).max(0) as usize;
    CONSULTED
        .iter()
        .filter_map(|kinds| {
            let old: Vec<Construct> = constructs_from(old_tree, old_end, kinds)
                .map(|c| shifted(c, delta))
                .collect();
            let new: Vec<Construct> = constructs_from(new_tree, end, kinds).collect();
            let common = old.iter().rev().zip(new.iter().rev()).take_while(|(a, b)| a == b).count();
            old[..old.len() - common]
                .iter()
                .chain(&new[..new.len() - common])
                .map(|c| c.to)
                .max()
        })
        .max()
}

/// Replace the tokens starting in `[start, old_end)` (old coordinates) with
/// `fresh`, shifting the ones after by `delta`.
fn splice(tokens: &mut Vec<Token>, fresh: Vec<Token>, start: usize, old_end: usize, delta: isize) -> TokenDelta {
    let first = tokens.partition_point(|t| t.from < start);
    let last = tokens.partition_point(|t| t.from < old_end);
    for token in &mut tokens[last..] {
        token.shift(delta);
    }

    if first == last && fresh.is_empty() {
        return TokenDelta::Unchanged;
    }
    let new_end = first + fresh.len();
    tokens.splice(first..last, fresh);
    TokenDelta::Partial {
        start: first,
        old_end: last,
        new_end,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
