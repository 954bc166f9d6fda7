//! Host syntax context
//!
//! The tokenizer never walks the host's syntax tree. It asks narrow questions
//! through [`ContextClassifier`]: "is there a code span at this offset?",
//! "where does the next link start?". Hosts answer from whatever tree they
//! own; [`ConstructIndex`] is the sorted lookup structure both built-in
//! implementations use.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructKind {
    CodeSpan,
    InlineHtml,
    Link,
    Image,
    InlineMath,
    CodeBlock,
    HtmlBlock,
    MathBlock,
    FrontMatter,
    TableRow,
    ListItem,
    Heading,
    BlockQuote,
    /// `==text==` highlight mark
    HighlightMark,
}

impl ConstructKind {
    pub const ALL: [ConstructKind; 14] = [
        ConstructKind::CodeSpan,
        ConstructKind::InlineHtml,
        ConstructKind::Link,
        ConstructKind::Image,
        ConstructKind::InlineMath,
        ConstructKind::CodeBlock,
        ConstructKind::HtmlBlock,
        ConstructKind::MathBlock,
        ConstructKind::FrontMatter,
        ConstructKind::TableRow,
        ConstructKind::ListItem,
        ConstructKind::Heading,
        ConstructKind::BlockQuote,
        ConstructKind::HighlightMark,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Inline constructs whose content the tokenizer jumps over.
pub const SKIP: &[ConstructKind] = &[
    ConstructKind::CodeSpan,
    ConstructKind::InlineHtml,
    ConstructKind::Link,
    ConstructKind::Image,
    ConstructKind::InlineMath,
];

/// Constructs a rescan touching them must start at the beginning of.
pub const SHIFTERS: &[ConstructKind] = &[
    ConstructKind::TableRow,
    ConstructKind::Link,
    ConstructKind::InlineMath,
    ConstructKind::ListItem,
];

/// Verbatim blocks; crossing their boundary forces a wider rescan.
pub const INTERFERERS: &[ConstructKind] = &[
    ConstructKind::CodeBlock,
    ConstructKind::HtmlBlock,
    ConstructKind::MathBlock,
    ConstructKind::FrontMatter,
];

pub const MARKS: &[ConstructKind] = &[ConstructKind::HighlightMark];

/// A host construct spanning `from..to` (byte offsets, `to` exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Construct {
    pub kind: ConstructKind,
    pub from: usize,
    pub to: usize,
}

impl Construct {
    pub fn new(kind: ConstructKind, from: usize, to: usize) -> Self {
        Self { kind, from, to }
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.from <= offset && offset < self.to
    }
}

/// Read-only view of the host's syntax tree.
pub trait ContextClassifier {
    /// The outermost construct of one of `kinds` containing `offset`, or
    /// failing that one ending exactly at `offset`.
    fn construct_at(&self, offset: usize, kinds: &[ConstructKind]) -> Option<Construct>;

    /// The construct of one of `kinds` with the smallest start among those
    /// ending after `offset` (so one containing `offset` wins).
    fn next_construct(&self, offset: usize, kinds: &[ConstructKind]) -> Option<Construct>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Construct Index
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
struct KindIndex {
    /// Sorted by `from`, wider constructs first on ties
    constructs: Vec<Construct>,
    /// Running maximum of `to`, for binary search on ends
    max_to: Vec<usize>,
}

impl KindIndex {
    fn build(mut constructs: Vec<Construct>) -> Self {
        constructs.sort_by(|a, b| a.from.cmp(&b.from).then(b.to.cmp(&a.to)));
        constructs.dedup();
        let mut max_to = Vec::with_capacity(constructs.len());
        let mut running = 0;
        for c in &constructs {
            running = running.max(c.to);
            max_to.push(running);
        }
        Self { constructs, max_to }
    }

    /// First construct (by start) ending after `offset`.
    fn first_ending_after(&self, offset: usize) -> Option<(usize, &Construct)> {
        let i = self.max_to.partition_point(|&m| m <= offset);
        self.constructs.get(i).map(|c| (i, c))
    }

    fn containing(&self, offset: usize) -> Option<Construct> {
        match self.first_ending_after(offset) {
            Some((_, c)) if c.from <= offset => Some(*c),
            _ => None,
        }
    }

    fn ending_at(&self, offset: usize) -> Option<Construct> {
        let end = self
            .first_ending_after(offset)
            .map_or(self.constructs.len(), |(i, _)| i);
        self.constructs[..end]
            .iter()
            .rev()
            .find(|c| c.to == offset)
            .copied()
    }
}

/// Per-kind sorted constructs answering [`ContextClassifier`] queries in
/// logarithmic time.
#[derive(Debug, Clone)]
pub struct ConstructIndex {
    kinds: Vec<KindIndex>,
    len: usize,
}

impl Default for ConstructIndex {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ConstructIndex {
    pub fn new(constructs: Vec<Construct>) -> Self {
        let len = constructs.len();
        let mut buckets: Vec<Vec<Construct>> = vec![Vec::new(); ConstructKind::ALL.len()];
        for c in constructs {
            if c.from < c.to {
                buckets[c.kind.index()].push(c);
            }
        }
        Self {
            kinds: buckets.into_iter().map(KindIndex::build).collect(),
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All constructs of one kind, sorted by start.
    pub fn of_kind(&self, kind: ConstructKind) -> &[Construct] {
        &self.kinds[kind.index()].constructs
    }
}

/// Outermost of two candidates: earlier start, then wider.
fn outermost(a: Option<Construct>, b: Construct) -> Option<Construct> {
    match a {
        Some(a) if a.from < b.from || (a.from == b.from && a.to >= b.to) => Some(a),
        _ => Some(b),
    }
}

impl ContextClassifier for ConstructIndex {
    fn construct_at(&self, offset: usize, kinds: &[ConstructKind]) -> Option<Construct> {
        let mut best = None;
        for kind in kinds {
            if let Some(c) = self.kinds[kind.index()].containing(offset) {
                best = outermost(best, c);
            }
        }
        if best.is_some() {
            return best;
        }
        kinds
            .iter()
            .find_map(|kind| self.kinds[kind.index()].ending_at(offset))
    }

    fn next_construct(&self, offset: usize, kinds: &[ConstructKind]) -> Option<Construct> {
        let mut best = None;
        for kind in kinds {
            if let Some((_, c)) = self.kinds[kind.index()].first_ending_after(offset) {
                best = outermost(best, *c);
            }
        }
        best
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Static Context
// ─────────────────────────────────────────────────────────────────────────────

/// An explicit list of constructs, for hosts that already own a syntax tree
/// (and for tests).
#[derive(Debug, Clone, Default)]
pub struct StaticContext {
    pending: Vec<Construct>,
    index: ConstructIndex,
}

impl StaticContext {
    pub fn new(constructs: Vec<Construct>) -> Self {
        Self {
            index: ConstructIndex::new(constructs.clone()),
            pending: constructs,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: ConstructKind, from: usize, to: usize) -> Self {
        self.pending.push(Construct::new(kind, from, to));
        self.index = ConstructIndex::new(self.pending.clone());
        self
    }
}

impl ContextClassifier for StaticContext {
    fn construct_at(&self, offset: usize, kinds: &[ConstructKind]) -> Option<Construct> {
        self.index.construct_at(offset, kinds)
    }

    fn next_construct(&self, offset: usize, kinds: &[ConstructKind]) -> Option<Construct> {
        self.index.next_construct(offset, kinds)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
