//! Host syntax tree backed by comrak
//!
//! Parses the document as CommonMark + GFM and flattens the nodes the
//! tokenizer cares about into a [`ConstructIndex`]. Constructs comrak does
//! not produce (front matter, `$$` math blocks, `$inline$` math and `==mark==`
//! highlights) are recognized textually on top of the comrak tree.

use comrak::{
    nodes::{NodeValue, Sourcepos},
    parse_document, Arena, Options,
};
use log::debug;

use super::context::{Construct, ConstructIndex, ConstructKind, ContextClassifier, INTERFERERS, SKIP};
use crate::document::{Document, Line};
use crate::string_utils::{ceil_char_boundary, char_after, char_before, is_space_or_edge, run_len_forward};
use crate::syntax::lines::{classify, opens_context, LineKind};

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// GFM extensions enabled for the host parse.
#[derive(Debug, Clone)]
pub struct HostOptions {
    /// Enable GitHub Flavored Markdown tables
    pub tables: bool,
    /// Enable strikethrough syntax (~~text~~)
    pub strikethrough: bool,
    /// Enable autolink URLs and emails
    pub autolink: bool,
    /// Enable task lists (- [ ] and - [x])
    pub tasklist: bool,
    /// Enable footnotes
    pub footnotes: bool,
    /// Recognize `$inline$` and `$$` block math
    pub math: bool,
}

impl Default for HostOptions {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            autolink: true,
            tasklist: true,
            footnotes: true,
            math: true,
        }
    }
}

impl HostOptions {
    fn to_comrak_options(&self) -> Options {
        let mut options = Options::default();
        options.extension.strikethrough = self.strikethrough;
        options.extension.table = self.tables;
        options.extension.autolink = self.autolink;
        options.extension.tasklist = self.tasklist;
        options.extension.footnotes = self.footnotes;
        options
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Host Tree
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct HostTree {
    index: ConstructIndex,
}

impl HostTree {
    pub fn parse(doc: &Document) -> Self {
        Self::parse_with_options(doc, &HostOptions::default())
    }

    pub fn parse_with_options(doc: &Document, options: &HostOptions) -> Self {
        let mut constructs = comrak_constructs(doc, options);
        constructs.extend(front_matter(doc));

        if options.math {
            let taken = ConstructIndex::new(constructs.clone());
            constructs.extend(math_blocks(doc, &taken));
        }

        let blocks = ConstructIndex::new(constructs.clone());
        let mut recognizer = InlineRecognizer::new(doc, &blocks, options.math);
        recognizer.run();
        constructs.extend(recognizer.found);

        debug!("Host tree built: {} constructs", constructs.len());
        Self {
            index: ConstructIndex::new(constructs),
        }
    }

    pub fn constructs(&self, kind: ConstructKind) -> &[Construct] {
        self.index.of_kind(kind)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl ContextClassifier for HostTree {
    fn construct_at(&self, offset: usize, kinds: &[ConstructKind]) -> Option<Construct> {
        self.index.construct_at(offset, kinds)
    }

    fn next_construct(&self, offset: usize, kinds: &[ConstructKind]) -> Option<Construct> {
        self.index.next_construct(offset, kinds)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// comrak Conversion
// ─────────────────────────────────────────────────────────────────────────────

fn construct_kind(value: &NodeValue) -> Option<ConstructKind> {
    let kind = match value {
        NodeValue::Code(_) => ConstructKind::CodeSpan,
        NodeValue::HtmlInline(_) => ConstructKind::InlineHtml,
        NodeValue::Link(_) => ConstructKind::Link,
        NodeValue::Image(_) => ConstructKind::Image,
        NodeValue::CodeBlock(_) => ConstructKind::CodeBlock,
        NodeValue::HtmlBlock(_) => ConstructKind::HtmlBlock,
        NodeValue::TableRow(_) => ConstructKind::TableRow,
        NodeValue::Item(_) | NodeValue::TaskItem(_) => ConstructKind::ListItem,
        NodeValue::Heading(_) => ConstructKind::Heading,
        NodeValue::BlockQuote => ConstructKind::BlockQuote,
        _ => return None,
    };
    Some(kind)
}

/// Byte span of a comrak sourcepos (1-based, inclusive end column).
fn span(doc: &Document, pos: &Sourcepos) -> Option<(usize, usize)> {
    if pos.start.line == 0 {
        return None;
    }
    let from = doc.offset_of(pos.start.line, pos.start.column);
    let to = if pos.end.column == 0 {
        doc.offset_of(pos.end.line, 1)
    } else {
        let end_line = doc.line(pos.end.line.saturating_sub(1));
        (doc.offset_of(pos.end.line, pos.end.column) + 1).min(end_line.to)
    };
    let to = ceil_char_boundary(doc.text(), to);
    (from < to).then_some((from, to))
}

fn comrak_constructs(doc: &Document, options: &HostOptions) -> Vec<Construct> {
    let arena = Arena::new();
    let root = parse_document(&arena, doc.text(), &options.to_comrak_options());

    let mut constructs = Vec::new();
    for node in root.descendants() {
        let ast = node.data.borrow();
        let Some(kind) = construct_kind(&ast.value) else {
            continue;
        };
        if let Some((from, to)) = span(doc, &ast.sourcepos) {
            constructs.push(Construct::new(kind, from, to));
        }
    }
    constructs
}

// ─────────────────────────────────────────────────────────────────────────────
// Textual Block Constructs
// ─────────────────────────────────────────────────────────────────────────────

/// `---` at the very top, closed by a `---` or `...` line.
fn front_matter(doc: &Document) -> Option<Construct> {
    if doc.line_text(doc.line(0)).trim_end() != "---" {
        return None;
    }
    (1..doc.line_count()).find_map(|n| {
        let line = doc.line(n);
        let text = doc.line_text(line).trim_end();
        (text == "---" || text == "...")
            .then(|| Construct::new(ConstructKind::FrontMatter, 0, line.to))
    })
}

/// `$$` fenced math blocks outside other verbatim blocks. An unclosed block
/// runs to the end of the document.
fn math_blocks(doc: &Document, taken: &ConstructIndex) -> Vec<Construct> {
    let mut found = Vec::new();
    let mut open: Option<usize> = None;
    for n in 0..doc.line_count() {
        let line = doc.line(n);
        if doc.line_text(line).trim() != "$$" {
            continue;
        }
        match open {
            Some(from) => {
                found.push(Construct::new(ConstructKind::MathBlock, from, line.to));
                open = None;
            }
            None if !taken
                .construct_at(line.from, INTERFERERS)
                .is_some_and(|c| c.contains(line.from)) =>
            {
                open = Some(line.from);
            }
            None => {}
        }
    }
    if let Some(from) = open {
        found.push(Construct::new(ConstructKind::MathBlock, from, doc.len()));
    }
    found
}

// ─────────────────────────────────────────────────────────────────────────────
// Inline Recognizer (highlight marks, inline math)
// ─────────────────────────────────────────────────────────────────────────────

/// Finds `==mark==` and `$math$` spans paragraph by paragraph. Pending marks
/// are dropped at the same line boundaries the tokenizer resets on.
struct InlineRecognizer<'a> {
    doc: &'a Document,
    blocks: &'a ConstructIndex,
    math: bool,
    found: Vec<Construct>,
    pending_mark: Option<usize>,
}

impl<'a> InlineRecognizer<'a> {
    fn new(doc: &'a Document, blocks: &'a ConstructIndex, math: bool) -> Self {
        Self {
            doc,
            blocks,
            math,
            found: Vec::new(),
            pending_mark: None,
        }
    }

    fn run(&mut self) {
        let mut prev = LineKind::Blank;
        let mut n = 0;
        while n < self.doc.line_count() {
            let line = self.doc.line(n);

            if let Some(block) = self.verbatim_block(line) {
                self.pending_mark = None;
                prev = LineKind::Blank;
                n = self.doc.line_at(block.to.saturating_sub(1).max(line.from)).number + 1;
                continue;
            }

            let kind = classify(self.doc.line_text(line));
            if kind == LineKind::Blank
                || opens_context(kind, prev)
                || self.starts_table_row(line)
            {
                self.pending_mark = None;
            }
            if kind != LineKind::Blank && kind != LineKind::FenceOpener {
                self.scan_line(line);
            }
            if kind.is_boundary_after() || self.starts_table_row(line) {
                self.pending_mark = None;
            }
            prev = kind;
            n += 1;
        }
    }

    fn verbatim_block(&self, line: Line) -> Option<Construct> {
        self.blocks
            .next_construct(line.from, INTERFERERS)
            .filter(|c| c.from <= line.to)
    }

    fn starts_table_row(&self, line: Line) -> bool {
        self.blocks
            .next_construct(line.from, &[ConstructKind::TableRow])
            .is_some_and(|c| c.from >= line.from && c.from <= line.to)
    }

    fn scan_line(&mut self, line: Line) {
        let (doc, blocks) = (self.doc, self.blocks);
        let text = doc.line_text(line);
        let math = if self.math {
            self.inline_math(line)
        } else {
            Vec::new()
        };
        let skipped = |pos: usize| -> Option<usize> {
            let abs = line.from + pos;
            blocks
                .construct_at(abs, SKIP)
                .filter(|c| c.contains(abs))
                .map(|c| c.to)
                .or_else(|| math.iter().find(|c| c.contains(abs)).map(|c| c.to))
                .map(|to| to.saturating_sub(line.from))
        };

        let mut pos = 0;
        while pos < text.len() {
            if let Some(end) = skipped(pos) {
                pos = end.max(pos + 1);
                continue;
            }
            let Some(c) = char_after(text, pos) else {
                break;
            };
            if c != '=' {
                pos += c.len_utf8();
                continue;
            }
            let run = run_len_forward(text, pos, '=');
            if run == 2 {
                match self.pending_mark {
                    Some(open) if !is_space_or_edge(char_before(text, pos)) => {
                        self.found
                            .push(Construct::new(ConstructKind::HighlightMark, open, line.from + pos + 2));
                        self.pending_mark = None;
                    }
                    None if !is_space_or_edge(char_after(text, pos + 2)) => {
                        self.pending_mark = Some(line.from + pos);
                    }
                    _ => {}
                }
            }
            pos += run;
        }
        self.found.extend(math);
    }

    /// `$x$` spans on one line; `$$` runs are not inline math.
    fn inline_math(&self, line: Line) -> Vec<Construct> {
        let text = self.doc.line_text(line);
        let mut spans = Vec::new();
        let mut open: Option<usize> = None;
        let mut pos = 0;
        while pos < text.len() {
            let abs = line.from + pos;
            if let Some(c) = self.blocks.construct_at(abs, SKIP).filter(|c| c.contains(abs)) {
                pos = c.to.saturating_sub(line.from).max(pos + 1);
                continue;
            }
            let Some(c) = char_after(text, pos) else {
                break;
            };
            if c != '$' {
                pos += c.len_utf8();
                continue;
            }
            let run = run_len_forward(text, pos, '$');
            if run == 1 {
                match open {
                    Some(from) if !is_space_or_edge(char_before(text, pos)) => {
                        spans.push(Construct::new(ConstructKind::InlineMath, from, abs + 1));
                        open = None;
                    }
                    None if !is_space_or_edge(char_after(text, pos + 1)) => open = Some(abs),
                    _ => {}
                }
            }
            pos += run;
        }
        spans
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
