//! Editing session
//!
//! Owns everything derived from one document and keeps it in step: every
//! edit re-parses the host tree, updates the tokens and re-observes the
//! selection, in that order.

use log::{debug, info};

use crate::change::ChangeSet;
use crate::config::Settings;
use crate::document::Document;
use crate::error::Result;
use crate::format::{self, FormatOutcome, FormatRequest};
use crate::markdown::HostTree;
use crate::selection::{LevelRegions, Selection, SelectionObserver, TouchedToken};
use crate::syntax::{Level, ParseReport, Parser, Token};

#[derive(Debug)]
pub struct Session {
    doc: Document,
    tree: HostTree,
    parser: Parser,
    observer: SelectionObserver,
    selection: Selection,
    settings: Settings,
}

impl Session {
    pub fn new(text: impl Into<String>, settings: Settings) -> Self {
        let doc = Document::new(text);
        let tree = HostTree::parse(&doc);
        let mut parser = Parser::new(&settings);
        let report = parser.full_parse(&doc, &tree);
        let selection = Selection::default();
        let mut observer = SelectionObserver::new();
        observer.observe(&selection, parser.streams(), &report, doc.len());
        info!(
            "Session opened: {} bytes, {} inline and {} block tokens",
            doc.len(),
            parser.inline_tokens().len(),
            parser.block_tokens().len()
        );
        Self {
            doc,
            tree,
            parser,
            observer,
            selection,
            settings,
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn text(&self) -> &str {
        self.doc.text()
    }

    pub fn host_tree(&self) -> &HostTree {
        &self.tree
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn tokens(&self, level: Level) -> &[Token] {
        self.parser.tokens(level)
    }

    pub fn inline_tokens(&self) -> &[Token] {
        self.parser.inline_tokens()
    }

    pub fn block_tokens(&self) -> &[Token] {
        self.parser.block_tokens()
    }

    pub fn regions(&self, level: Level) -> &LevelRegions {
        self.observer.regions(level)
    }

    pub fn observer(&self) -> &SelectionObserver {
        &self.observer
    }

    pub fn touched_tokens(&self, level: Level) -> Vec<TouchedToken> {
        self.observer.touched_tokens(self.parser.tokens(level))
    }

    /// Whether the tag of token `index` at `level` should be shown.
    pub fn tag_visible(&self, level: Level, index: usize) -> bool {
        self.observer
            .tag_visible(level, index, self.settings.tag_visibility)
    }

    /// Apply an edit made in the host. `selection` is the selection after it,
    /// or `None` to map the current one through the change.
    pub fn apply_changes(&mut self, changes: &ChangeSet, selection: Option<Selection>) -> Result<ParseReport> {
        let doc = self.doc.apply(changes)?;
        let tree = HostTree::parse(&doc);
        let report = if self.parser.needs_full_parse() {
            self.parser.full_parse(&doc, &tree)
        } else {
            self.parser.apply_change(&doc, &self.tree, &tree, changes)
        };

        self.selection = selection
            .unwrap_or_else(|| self.selection.map(changes))
            .clamp(doc.len());
        self.doc = doc;
        self.tree = tree;
        self.observer
            .observe(&self.selection, self.parser.streams(), &report, self.doc.len());
        Ok(report)
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection.clamp(self.doc.len());
        self.observer.observe(
            &self.selection,
            self.parser.streams(),
            &ParseReport::UNCHANGED,
            self.doc.len(),
        );
    }

    /// Run a formatting command and apply its edit.
    pub fn format(&mut self, request: &FormatRequest) -> Result<FormatOutcome> {
        let outcome = format::format(
            &self.doc,
            self.parser.streams(),
            &self.selection,
            &self.settings,
            request,
        )?;
        if !outcome.changes.is_empty() {
            self.apply_changes(&outcome.changes, Some(outcome.selection.clone()))?;
        } else {
            self.set_selection(outcome.selection.clone());
        }
        Ok(outcome)
    }

    /// Replace the settings. Changes to recognized formats re-tokenize the
    /// whole document.
    pub fn set_settings(&mut self, settings: Settings) {
        self.parser.set_settings(&settings);
        self.settings = settings;
        if self.parser.needs_full_parse() {
            debug!("Settings changed recognized formats, re-tokenizing");
            self.restart();
        }
    }

    /// Full re-parse and re-observation, as after a mode switch.
    pub fn restart(&mut self) {
        let report = self.parser.full_parse(&self.doc, &self.tree);
        self.observer.restart();
        self.observer
            .observe(&self.selection, self.parser.streams(), &report, self.doc.len());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
