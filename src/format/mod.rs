//! Formatting commands
//!
//! Turns "toggle this format" into one atomic [`ChangeSet`] against the
//! current tokens, plus the selection to show afterwards.
//!
//! # Usage
//! ```
//! use extmark::format::{format, FormatRequest};
//! use extmark::{Document, HostTree, Parser, Selection, Settings};
//! use extmark::syntax::Format;
//!
//! let doc = Document::new("Hello world");
//! let tree = HostTree::parse(&doc);
//! let mut parser = Parser::default();
//! parser.full_parse(&doc, &tree);
//!
//! let outcome = format(
//!     &doc,
//!     parser.streams(),
//!     &Selection::single(0, 5),
//!     &Settings::default(),
//!     &FormatRequest::new(Format::Underline),
//! )
//! .unwrap();
//! assert_eq!(outcome.changes.apply(doc.text()), "++Hello++ world");
//! ```

mod block;
mod inline;
mod raw;

use log::debug;
use serde::Serialize;

use crate::change::{Assoc, ChangeSet, TextEdit};
use crate::config::Settings;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::selection::{Selection, SelectionRange};
use crate::string_utils::{char_after, char_before};
use crate::syntax::{Format, Level, TokenStreams};

// ─────────────────────────────────────────────────────────────────────────────
// Request
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatRequest {
    pub format: Format,
    /// Tag to apply. `Some("")` clears an existing tag.
    pub tag: Option<String>,
    /// Remove every touched formed token instead of toggling
    pub force_remove: bool,
    /// Ask the host to open its tag menu when formatting was applied
    pub open_menu_after: bool,
}

impl FormatRequest {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            tag: None,
            force_remove: false,
            open_menu_after: false,
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn force_remove(mut self) -> Self {
        self.force_remove = true;
        self
    }

    pub fn open_menu_after(mut self) -> Self {
        self.open_menu_after = true;
        self
    }

    /// The requested tag name, if a non-empty one was given.
    fn tag_name(&self) -> Option<&str> {
        self.tag.as_deref().filter(|t| !t.is_empty())
    }

    fn validate(&self) -> Result<()> {
        let Some(tag) = &self.tag else {
            return Ok(());
        };
        let rule = self.format.rule();
        if !rule.supports_tag() {
            return Err(Error::TagUnsupported {
                format: self.format,
            });
        }
        if !tag.is_empty() && !rule.is_valid_tag_name(tag) {
            return Err(Error::InvalidTag {
                format: self.format,
                tag: tag.clone(),
            });
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Outcome
// ─────────────────────────────────────────────────────────────────────────────

/// What was done for one selection range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatAction {
    Wrap,
    Extend,
    Close,
    ChangeTag,
    Remove,
    BreakApart,
    InsertBlock,
    RetagBlock,
    RemoveBlock,
    RawWrap,
    RawUnwrap,
}

impl FormatAction {
    /// Whether the action adds formatting (as opposed to taking it away).
    pub fn adds_formatting(self) -> bool {
        matches!(
            self,
            FormatAction::Wrap
                | FormatAction::Extend
                | FormatAction::Close
                | FormatAction::ChangeTag
                | FormatAction::InsertBlock
                | FormatAction::RetagBlock
                | FormatAction::RawWrap
        )
    }
}

#[derive(Debug, Clone)]
pub struct FormatOutcome {
    pub changes: ChangeSet,
    /// Selection after the change, in post-change coordinates
    pub selection: Selection,
    pub open_tag_menu: bool,
    /// Formatting was added rather than removed
    pub applied: bool,
    pub actions: Vec<FormatAction>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Edit Plan
// ─────────────────────────────────────────────────────────────────────────────

/// Edits collected over all selection ranges, in pre-change coordinates.
#[derive(Debug, Default)]
struct EditPlan {
    edits: Vec<TextEdit>,
    /// Cursors that must land this many bytes past a pure insertion
    cursor_shifts: Vec<(usize, usize)>,
    actions: Vec<FormatAction>,
    open_menu: bool,
}

impl EditPlan {
    fn insert(&mut self, at: usize, text: impl Into<String>) {
        self.edits.push(TextEdit::insert(at, text));
    }

    fn delete(&mut self, from: usize, to: usize) {
        if from < to {
            self.edits.push(TextEdit::delete(from, to));
        }
    }

    fn replace(&mut self, from: usize, to: usize, text: impl Into<String>) {
        self.edits.push(TextEdit::replace(from, to, text));
    }

    fn shift_cursor(&mut self, at: usize, by: usize) {
        self.cursor_shifts.push((at, by));
    }

    fn action(&mut self, action: FormatAction) {
        self.actions.push(action);
    }
}

/// Move `pos` left over whitespace, not past `min`.
fn trim_back(text: &str, mut pos: usize, min: usize) -> usize {
    while pos > min {
        match char_before(text, pos) {
            Some(c) if c.is_whitespace() => pos -= c.len_utf8(),
            _ => break,
        }
    }
    pos
}

/// Move `pos` right over whitespace, not past `max`.
fn trim_forward(text: &str, mut pos: usize, max: usize) -> usize {
    while pos < max {
        match char_after(text, pos) {
            Some(c) if c.is_whitespace() => pos += c.len_utf8(),
            _ => break,
        }
    }
    pos
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry Point
// ─────────────────────────────────────────────────────────────────────────────

/// Compute the edit for `request` over every range of `selection`.
///
/// `streams` must be the tokens of `doc` as currently parsed.
pub fn format(
    doc: &Document,
    streams: &TokenStreams,
    selection: &Selection,
    settings: &Settings,
    request: &FormatRequest,
) -> Result<FormatOutcome> {
    request.validate()?;
    let selection = selection.clamp(doc.len());
    let spans = selection.merged();
    debug!(
        "Formatting {} over {} range(s)",
        request.format.name(),
        spans.len()
    );

    let level = request.format.level();
    let plan = match level {
        Level::Block => block::plan(doc, streams.get(Level::Block), &spans, request),
        Level::Inline if !settings.tidy_formatting => raw::plan(doc.text(), &spans, request),
        Level::Inline => inline::plan(doc.text(), streams.get(Level::Inline), &spans, request),
    };
    finish(doc, &selection, plan, level, request)
}

fn finish(
    doc: &Document,
    selection: &Selection,
    plan: EditPlan,
    level: Level,
    request: &FormatRequest,
) -> Result<FormatOutcome> {
    let EditPlan {
        edits,
        cursor_shifts,
        actions,
        open_menu,
    } = plan;
    let changes = ChangeSet::new(doc.len(), edits)?;

    // Inline cursors stay inside what was just inserted; block cursors
    // follow their line below a new opener line.
    let cursor_assoc = match level {
        Level::Inline => Assoc::Before,
        Level::Block => Assoc::After,
    };
    let ranges = selection
        .ranges()
        .iter()
        .map(|r| {
            if r.is_empty() {
                let shift = cursor_shifts
                    .iter()
                    .find(|(at, _)| *at == r.head)
                    .map_or(0, |(_, by)| *by);
                SelectionRange::cursor(changes.map_pos(r.head, cursor_assoc) + shift)
            } else {
                let from = changes.map_pos(r.from(), Assoc::After);
                let to = changes.map_pos(r.to(), Assoc::Before).max(from);
                if r.anchor <= r.head {
                    SelectionRange::new(from, to)
                } else {
                    SelectionRange::new(to, from)
                }
            }
        })
        .collect();

    let applied = !changes.is_empty() && actions.iter().any(|a| a.adds_formatting());
    debug!(
        "Format {}: {} edit(s), actions {:?}",
        request.format.name(),
        changes.edits().len(),
        actions
    );
    Ok(FormatOutcome {
        selection: Selection::new(ranges, selection.main_index()),
        open_tag_menu: open_menu && applied && request.open_menu_after,
        applied,
        actions,
        changes,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::markdown::HostTree;
    use crate::syntax::Parser;

    /// Format `text` with the selection `(anchor, head)` and return the new
    /// text and main selection.
    pub fn run(
        text: &str,
        selection: Selection,
        settings: &Settings,
        request: FormatRequest,
    ) -> (String, SelectionRange, FormatOutcome) {
        let doc = Document::new(text);
        let tree = HostTree::parse(&doc);
        let mut parser = Parser::new(settings);
        parser.full_parse(&doc, &tree);
        let outcome = format(&doc, parser.streams(), &selection, settings, &request).unwrap();
        let after = outcome.changes.apply(text);
        (after, outcome.selection.main(), outcome)
    }

    pub fn tidy(text: &str, anchor: usize, head: usize, request: FormatRequest) -> (String, SelectionRange) {
        let (after, sel, _) = run(text, Selection::single(anchor, head), &Settings::default(), request);
        (after, sel)
    }
}
