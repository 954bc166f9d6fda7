//! Textual line classification
//!
//! The tokenizer needs to know where Markdown blocks start and end without
//! walking the host tree for every line. These checks look at one line of
//! text in isolation, so a line always classifies the same way no matter
//! what surrounds it.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    AtxHeading,
    SetextUnderline,
    ThematicBreak,
    ListItem,
    TableDelimiter,
    BlockQuote,
    /// `:::` line opening a fenced block
    FenceOpener,
    Text,
}

impl LineKind {
    /// Starting this line ends whatever is pending. Block quotes only do so
    /// when entered, which the caller decides.
    pub fn is_boundary_before(self) -> bool {
        !matches!(self, LineKind::Blank | LineKind::Text | LineKind::BlockQuote)
    }

    /// Nothing stays pending past the end of this line.
    pub fn is_boundary_after(self) -> bool {
        matches!(
            self,
            LineKind::AtxHeading
                | LineKind::SetextUnderline
                | LineKind::ThematicBreak
                | LineKind::TableDelimiter
        )
    }
}

/// Whether a line of `kind` following a line of `prev` ends pending syntax.
pub fn opens_context(kind: LineKind, prev: LineKind) -> bool {
    kind.is_boundary_before() || (kind == LineKind::BlockQuote && prev != LineKind::BlockQuote)
}

struct LinePatterns {
    fence_opener: Regex,
    thematic_break: Regex,
    setext_underline: Regex,
    atx_heading: Regex,
    list_item: Regex,
    table_delimiter: Regex,
    block_quote: Regex,
}

static PATTERNS: OnceLock<LinePatterns> = OnceLock::new();

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("line classification patterns are static and valid")
}

fn patterns() -> &'static LinePatterns {
    PATTERNS.get_or_init(|| LinePatterns {
        fence_opener: compile(r"^( {0,3})(:{3,})"),
        thematic_break: compile(r"^ {0,3}(?:(?:\*[ \t]*){3,}|(?:-[ \t]*){3,}|(?:_[ \t]*){3,})$"),
        setext_underline: compile(r"^ {0,3}(?:=+|-+)[ \t]*$"),
        atx_heading: compile(r"^ {0,3}#{1,6}(?:[ \t]|$)"),
        list_item: compile(r"^ {0,3}(?:[-+*]|[0-9]{1,9}[.)])(?:[ \t]|$)"),
        table_delimiter: compile(
            r"^ {0,3}\|?[ \t]*:?-+:?[ \t]*(?:\|[ \t]*:?-+:?[ \t]*)*\|?[ \t]*$",
        ),
        block_quote: compile(r"^ {0,3}>"),
    })
}

/// Classify one line of text (without its terminator).
pub fn classify(text: &str) -> LineKind {
    if text.trim().is_empty() {
        return LineKind::Blank;
    }
    let p = patterns();
    if p.fence_opener.is_match(text) {
        LineKind::FenceOpener
    } else if p.thematic_break.is_match(text) {
        LineKind::ThematicBreak
    } else if p.setext_underline.is_match(text) {
        LineKind::SetextUnderline
    } else if p.atx_heading.is_match(text) {
        LineKind::AtxHeading
    } else if p.list_item.is_match(text) {
        LineKind::ListItem
    } else if text.contains('|') && p.table_delimiter.is_match(text) {
        LineKind::TableDelimiter
    } else if p.block_quote.is_match(text) {
        LineKind::BlockQuote
    } else {
        LineKind::Text
    }
}

/// Indentation and run length of a `:::` opener line.
pub fn fence_opener(text: &str) -> Option<(usize, usize)> {
    let caps = patterns().fence_opener.captures(text)?;
    let indent = caps.get(1)?.len();
    let run = caps.get(2)?.len();
    Some((indent, run))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_and_text() {
        assert_eq!(classify(""), LineKind::Blank);
        assert_eq!(classify("   \t"), LineKind::Blank);
        assert_eq!(classify("plain ++text++"), LineKind::Text);
    }

    #[test]
    fn test_headings() {
        assert_eq!(classify("# Title"), LineKind::AtxHeading);
        assert_eq!(classify("###"), LineKind::AtxHeading);
        assert_eq!(classify("#hashtag"), LineKind::Text);
        assert_eq!(classify("===="), LineKind::SetextUnderline);
        assert_eq!(classify("==text=="), LineKind::Text);
    }

    #[test]
    fn test_breaks_and_lists() {
        assert_eq!(classify("---"), LineKind::ThematicBreak);
        assert_eq!(classify("* * *"), LineKind::ThematicBreak);
        assert_eq!(classify("- item"), LineKind::ListItem);
        assert_eq!(classify("+ item"), LineKind::ListItem);
        assert_eq!(classify("12. item"), LineKind::ListItem);
        assert_eq!(classify("++under++"), LineKind::Text);
    }

    #[test]
    fn test_table_delimiter() {
        assert_eq!(classify("| --- | :-: |"), LineKind::TableDelimiter);
        assert_eq!(classify("---|---"), LineKind::TableDelimiter);
        assert_eq!(classify("| a | b |"), LineKind::Text);
    }

    #[test]
    fn test_block_quote_and_fence() {
        assert_eq!(classify("> quoted"), LineKind::BlockQuote);
        assert_eq!(classify("::: note"), LineKind::FenceOpener);
        assert_eq!(classify("::"), LineKind::Text);
        assert_eq!(fence_opener("  :::: warn"), Some((2, 4)));
        assert_eq!(fence_opener("text"), None);
    }

    #[test]
    fn test_boundaries() {
        assert!(LineKind::ListItem.is_boundary_before());
        assert!(!LineKind::ListItem.is_boundary_after());
        assert!(LineKind::AtxHeading.is_boundary_after());
        assert!(!LineKind::BlockQuote.is_boundary_before());
        assert!(LineKind::FenceOpener.is_boundary_before());
        assert!(!LineKind::FenceOpener.is_boundary_after());
    }

    #[test]
    fn test_block_quote_entry_opens_context() {
        assert!(opens_context(LineKind::BlockQuote, LineKind::Text));
        assert!(!opens_context(LineKind::BlockQuote, LineKind::BlockQuote));
        assert!(!opens_context(LineKind::Text, LineKind::Text));
        assert!(opens_context(LineKind::ListItem, LineKind::Text));
    }
}
