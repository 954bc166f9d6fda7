//! Line scanner
//!
//! Walks the document a line at a time from a reset point, emitting tokens
//! into per-level arrays. Host constructs decide what is scanned at all:
//! verbatim blocks are jumped over whole, inline code/links/math are jumped
//! over within a line, and highlight marks arrive ready-made from the host.

use log::trace;

use super::lines::{classify, fence_opener, opens_context, LineKind};
use super::queue::TokenQueue;
use super::rules::{scan_tag, DelimiterTable, Format, Rule};
use super::token::{Status, Token, TokenStreams};
use crate::document::{Document, Line};
use crate::markdown::{Construct, ConstructKind, ContextClassifier, INTERFERERS, MARKS, SKIP};
use crate::string_utils::{char_after, char_before, is_space_or_edge, run_len_forward};

pub struct Tokenizer<'a> {
    doc: &'a Document,
    ctx: &'a dyn ContextClassifier,
    table: &'a DelimiterTable,
}

/// Tokenize the whole document.
pub fn tokenize(doc: &Document, ctx: &dyn ContextClassifier, table: &DelimiterTable) -> TokenStreams {
    Tokenizer::new(doc, ctx, table).scan(0, doc.len())
}

impl<'a> Tokenizer<'a> {
    pub fn new(doc: &'a Document, ctx: &'a dyn ContextClassifier, table: &'a DelimiterTable) -> Self {
        Self { doc, ctx, table }
    }

    /// Scan the lines starting in `[from, to)`. `from` must be a reset point:
    /// nothing can be pending when a scan starts there.
    pub fn scan(&self, from: usize, to: usize) -> TokenStreams {
        let start = self.doc.line_at(from).from;
        trace!("Scanning window {}..{}", start, to);

        let prev = if start == 0 {
            LineKind::Blank
        } else {
            classify(self.doc.line_text(self.doc.line_at(start - 1)))
        };
        let mut pass = ScanPass {
            tokenizer: self,
            streams: TokenStreams::default(),
            queue: TokenQueue::new(),
            last_content_end: start,
            prev,
        };

        let mut pos = start;
        while pos < to {
            pos = pass.line(self.doc.line_at(pos));
        }
        pass.resolve_all(false);
        pass.streams
    }

    fn verbatim_block(&self, line: Line) -> Option<Construct> {
        self.ctx
            .next_construct(line.from, INTERFERERS)
            .filter(|c| c.from <= line.to)
    }

    fn starts_table_row(&self, line: Line) -> bool {
        self.ctx
            .next_construct(line.from, &[ConstructKind::TableRow])
            .is_some_and(|c| c.from >= line.from && c.from <= line.to)
    }

    /// First highlight mark starting at or after `offset`.
    fn next_mark(&self, mut offset: usize) -> Option<Construct> {
        if !self.table.is_enabled(Format::Highlight) {
            return None;
        }
        loop {
            let mark = self.ctx.next_construct(offset, MARKS)?;
            if mark.from >= offset {
                return Some(mark);
            }
            offset = mark.to;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scan Pass
// ─────────────────────────────────────────────────────────────────────────────

struct ScanPass<'t, 'a> {
    tokenizer: &'t Tokenizer<'a>,
    streams: TokenStreams,
    queue: TokenQueue,
    /// End of the last line that carried content
    last_content_end: usize,
    prev: LineKind,
}

impl<'t, 'a> ScanPass<'t, 'a> {
    fn resolve_all(&mut self, blank_line: bool) {
        let end = self.last_content_end;
        self.queue.resolve_all(&mut self.streams, end, blank_line);
    }

    fn resolve_no_whitespace(&mut self, at: usize) {
        self.queue
            .resolve_where(&mut self.streams, at, false, |rule| rule.no_whitespace);
    }

    /// Process one line, returning the offset to continue from.
    fn line(&mut self, line: Line) -> usize {
        let doc = self.tokenizer.doc;

        if let Some(block) = self.tokenizer.verbatim_block(line) {
            self.resolve_all(false);
            let last = doc.line_at(block.to.saturating_sub(1).max(line.from));
            trace!("Skipping verbatim block {}..{}", block.from, block.to);
            self.last_content_end = last.to;
            self.prev = LineKind::Blank;
            return doc.next_line_start(last).max(doc.next_line_start(line));
        }

        let text = doc.line_text(line);
        let kind = classify(text);
        if kind == LineKind::Blank {
            self.resolve_all(true);
            self.prev = kind;
            return doc.next_line_start(line);
        }

        let table_row = self.tokenizer.starts_table_row(line);
        if opens_context(kind, self.prev) || table_row {
            self.resolve_all(false);
        }

        match fence_opener(text) {
            Some((indent, run)) if self.tokenizer.table.is_enabled(Format::FencedBlock) => {
                let rule = Format::FencedBlock.rule();
                let tag = scan_tag(rule, &text[indent + run..]);
                let token = Token::open(Format::FencedBlock, line.from + indent, run, tag.len, tag.valid);
                self.queue.open(&mut self.streams, token);
            }
            _ => self.scan_inline(line, text),
        }

        self.last_content_end = line.to;
        if kind.is_boundary_after() || table_row {
            self.resolve_all(false);
        }
        self.prev = kind;
        doc.next_line_start(line)
    }

    fn scan_inline(&mut self, line: Line, text: &str) {
        let ctx = self.tokenizer.ctx;
        let base = line.from;
        let mut next_skip = ctx.next_construct(base, SKIP);
        let mut next_mark = self.tokenizer.next_mark(base);

        let mut pos = 0;
        while pos < text.len() {
            let abs = base + pos;

            if let Some(skip) = next_skip {
                if skip.to <= abs {
                    next_skip = ctx.next_construct(abs, SKIP);
                    continue;
                }
                if skip.from <= abs {
                    self.resolve_no_whitespace(abs);
                    pos = (skip.to - base).min(text.len()).max(pos + 1);
                    continue;
                }
            }

            if let Some(mark) = next_mark {
                if mark.from < abs {
                    next_mark = self.tokenizer.next_mark(abs);
                    continue;
                }
                if mark.from == abs {
                    pos += self.highlight(mark, text, pos);
                    next_mark = self.tokenizer.next_mark(mark.to);
                    continue;
                }
            }

            let Some(c) = char_after(text, pos) else {
                break;
            };
            if c.is_whitespace() {
                self.resolve_no_whitespace(abs);
                pos += c.len_utf8();
                continue;
            }
            match self.tokenizer.table.queued_inline_rule(c) {
                Some(rule) => pos += self.delimiter_run(rule, text, pos, base),
                None => pos += c.len_utf8(),
            }
        }
        self.resolve_no_whitespace(line.to);
    }

    /// Build a highlight token from a host mark. Returns bytes consumed.
    fn highlight(&mut self, mark: Construct, text: &str, pos: usize) -> usize {
        let rule = Format::Highlight.rule();
        let open_len = rule.run.canonical();
        let tag = scan_tag(rule, text.get(pos + open_len..).unwrap_or(""));
        let doc = self.tokenizer.doc.text();
        let close_len = if mark.to >= mark.from + open_len * 2
            && doc.get(mark.to - open_len..mark.to) == Some(rule.opener().as_str())
        {
            open_len
        } else {
            0
        };

        let mut token = Token::open(Format::Highlight, mark.from, open_len, tag.len, tag.valid);
        token.to = mark.to.max(token.tag_end());
        token.close_len = close_len;
        token.status = if tag.valid {
            Status::Active
        } else {
            Status::Inactive
        };
        self.streams.push(token);
        open_len + tag.len
    }

    /// Handle a run of `rule`'s delimiter at `pos`. Returns bytes consumed.
    fn delimiter_run(&mut self, rule: &'static Rule, text: &str, pos: usize, base: usize) -> usize {
        let run = run_len_forward(text, pos, rule.delimiter);
        if !rule.run.accepts(run) {
            return run;
        }

        if self.queue.pending(rule.format).is_some() {
            if !is_space_or_edge(char_before(text, pos)) {
                self.queue.close(&mut self.streams, rule.format, base + pos, run);
            }
            return run;
        }

        if is_space_or_edge(char_after(text, pos + run)) {
            return run;
        }
        let tag = scan_tag(rule, &text[pos + run..]);
        let token = Token::open(rule.format, base + pos, run, tag.len, tag.valid);
        self.queue.open(&mut self.streams, token);
        run + tag.len
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
