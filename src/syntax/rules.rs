//! Format rule table
//!
//! Every extended format is described by a static [`Rule`]: its delimiter
//! character and run length, the level it lives on, the shape of its tag, and
//! how it gets closed. The tokenizer and the formatter only ever consult the
//! table, so adding a format means adding a variant and a row.

use crate::config::Settings;
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Formats and Levels
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// `++text++`
    Underline,
    /// `||text||`
    Spoiler,
    /// `^text^`
    Superscript,
    /// `~text~`
    Subscript,
    /// `=={color}text==` (the `==` mark itself belongs to the host)
    Highlight,
    /// `!!{classes}text!!`
    CustomSpan,
    /// `::: tag` line opening a block that runs to the next boundary
    FencedBlock,
}

impl Format {
    pub const ALL: [Format; 7] = [
        Format::Underline,
        Format::Spoiler,
        Format::Superscript,
        Format::Subscript,
        Format::Highlight,
        Format::CustomSpan,
        Format::FencedBlock,
    ];

    pub fn rule(self) -> &'static Rule {
        match self {
            Format::Underline => &UNDERLINE,
            Format::Spoiler => &SPOILER,
            Format::Superscript => &SUPERSCRIPT,
            Format::Subscript => &SUBSCRIPT,
            Format::Highlight => &HIGHLIGHT,
            Format::CustomSpan => &CUSTOM_SPAN,
            Format::FencedBlock => &FENCED_BLOCK,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::Underline => "underline",
            Format::Spoiler => "spoiler",
            Format::Superscript => "superscript",
            Format::Subscript => "subscript",
            Format::Highlight => "highlight",
            Format::CustomSpan => "custom_span",
            Format::FencedBlock => "fenced_block",
        }
    }

    pub fn from_name(name: &str) -> Option<Format> {
        Format::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn level(self) -> Level {
        self.rule().level
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Inline,
    Block,
}

impl Level {
    pub const ALL: [Level; 2] = [Level::Inline, Level::Block];
}

// ─────────────────────────────────────────────────────────────────────────────
// Rule Definition
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLength {
    Exactly(usize),
    AtLeast(usize),
}

impl RunLength {
    pub fn accepts(self, len: usize) -> bool {
        match self {
            RunLength::Exactly(n) => len == n,
            RunLength::AtLeast(n) => len >= n,
        }
    }

    /// Length used when inserting a fresh delimiter.
    pub fn canonical(self) -> usize {
        match self {
            RunLength::Exactly(n) | RunLength::AtLeast(n) => n,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagStyle {
    None,
    /// `{name}` right after the opener
    Braced { allow_space: bool },
    /// The rest of the opener line
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closing {
    /// Needs a matching closer to become active.
    Explicit,
    /// Active as soon as the tag is valid; the host or a boundary ends it.
    TagOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub format: Format,
    pub delimiter: char,
    pub run: RunLength,
    pub level: Level,
    pub tag: TagStyle,
    pub closing: Closing,
    /// Whitespace anywhere in the content resolves the token.
    pub no_whitespace: bool,
    pub tag_as_content: bool,
    /// Opened through the token queue (as opposed to built in one step).
    pub queued: bool,
}

const UNDERLINE: Rule = Rule {
    format: Format::Underline,
    delimiter: '+',
    run: RunLength::Exactly(2),
    level: Level::Inline,
    tag: TagStyle::None,
    closing: Closing::Explicit,
    no_whitespace: false,
    tag_as_content: false,
    queued: true,
};

const SPOILER: Rule = Rule {
    format: Format::Spoiler,
    delimiter: '|',
    ..UNDERLINE
};

const SUPERSCRIPT: Rule = Rule {
    format: Format::Superscript,
    delimiter: '^',
    run: RunLength::Exactly(1),
    no_whitespace: true,
    ..UNDERLINE
};

const SUBSCRIPT: Rule = Rule {
    format: Format::Subscript,
    delimiter: '~',
    ..SUPERSCRIPT
};

const HIGHLIGHT: Rule = Rule {
    format: Format::Highlight,
    delimiter: '=',
    run: RunLength::Exactly(2),
    level: Level::Inline,
    tag: TagStyle::Braced { allow_space: false },
    closing: Closing::TagOnly,
    no_whitespace: false,
    tag_as_content: true,
    queued: false,
};

const CUSTOM_SPAN: Rule = Rule {
    format: Format::CustomSpan,
    delimiter: '!',
    tag: TagStyle::Braced { allow_space: true },
    closing: Closing::Explicit,
    queued: true,
    ..HIGHLIGHT
};

const FENCED_BLOCK: Rule = Rule {
    format: Format::FencedBlock,
    delimiter: ':',
    run: RunLength::AtLeast(3),
    level: Level::Block,
    tag: TagStyle::Line,
    closing: Closing::TagOnly,
    no_whitespace: false,
    tag_as_content: false,
    queued: true,
};

/// Characters that can end a delimiter run. An edit right after one of them
/// can change how the run before it is read.
pub const OPERATOR_CHARS: [char; 7] = ['+', '|', '^', '~', '=', '!', ':'];

pub fn is_operator_char(c: char) -> bool {
    OPERATOR_CHARS.contains(&c)
}

impl Rule {
    pub fn supports_tag(&self) -> bool {
        self.tag != TagStyle::None
    }

    pub fn must_close(&self) -> bool {
        self.closing == Closing::Explicit
    }

    pub fn tag_char_allowed(&self, c: char) -> bool {
        match self.tag {
            TagStyle::None => false,
            TagStyle::Braced { allow_space } => {
                c.is_ascii_alphanumeric() || c == '-' || (allow_space && c == ' ')
            }
            TagStyle::Line => c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ' ',
        }
    }

    /// Whether `name` (the tag without braces or leading space) is a
    /// well-formed tag for this format.
    pub fn is_valid_tag_name(&self, name: &str) -> bool {
        self.supports_tag() && !name.trim().is_empty() && name.chars().all(|c| self.tag_char_allowed(c))
    }

    /// The opening delimiter as inserted by the formatter.
    pub fn opener(&self) -> String {
        std::iter::repeat(self.delimiter)
            .take(self.run.canonical())
            .collect()
    }

    /// Tag text as it appears after the opener.
    pub fn render_tag(&self, name: &str) -> String {
        match self.tag {
            TagStyle::None => String::new(),
            TagStyle::Braced { .. } => format!("{{{}}}", name),
            TagStyle::Line => format!(" {}", name),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tag Parsing
// ─────────────────────────────────────────────────────────────────────────────

/// Result of reading a tag right after an opener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagScan {
    /// Bytes consumed, braces included
    pub len: usize,
    pub valid: bool,
}

impl TagScan {
    pub const NONE: TagScan = TagScan {
        len: 0,
        valid: false,
    };
}

/// Read a tag from the start of `rest` (the line text after the opener).
///
/// Braced tags must be closed on the same line. `{}` consumes two bytes but
/// is invalid; an unterminated tag or one interrupted by a disallowed
/// character is no tag at all.
pub fn scan_tag(rule: &Rule, rest: &str) -> TagScan {
    match rule.tag {
        TagStyle::None => TagScan::NONE,
        TagStyle::Line => TagScan {
            len: rest.len(),
            valid: rule.is_valid_tag_name(rest),
        },
        TagStyle::Braced { .. } => {
            let Some(body) = rest.strip_prefix('{') else {
                return TagScan::NONE;
            };
            for (i, c) in body.char_indices() {
                if c == '}' {
                    return TagScan {
                        len: i + 2,
                        valid: rule.is_valid_tag_name(&body[..i]),
                    };
                }
                if !rule.tag_char_allowed(c) {
                    return TagScan::NONE;
                }
            }
            TagScan::NONE
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Delimiter Table
// ─────────────────────────────────────────────────────────────────────────────

/// The formats the tokenizer recognizes, derived from settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimiterTable {
    enabled: Vec<Format>,
}

impl Default for DelimiterTable {
    fn default() -> Self {
        Self {
            enabled: Format::ALL.to_vec(),
        }
    }
}

impl DelimiterTable {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            enabled: Format::ALL
                .into_iter()
                .filter(|&f| settings.formats.get(f).in_editor())
                .collect(),
        }
    }

    pub fn is_enabled(&self, format: Format) -> bool {
        self.enabled.contains(&format)
    }

    /// Inline rule opened through the queue for this delimiter character.
    pub fn queued_inline_rule(&self, c: char) -> Option<&'static Rule> {
        self.enabled
            .iter()
            .map(|f| f.rule())
            .find(|r| r.delimiter == c && r.queued && r.level == Level::Inline)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormatMode;

    #[test]
    fn test_rule_lookup_consistent() {
        for format in Format::ALL {
            assert_eq!(format.rule().format, format);
            assert_eq!(Format::from_name(format.name()), Some(format));
            assert!(is_operator_char(format.rule().delimiter));
        }
    }

    #[test]
    fn test_run_length() {
        assert!(RunLength::Exactly(2).accepts(2));
        assert!(!RunLength::Exactly(2).accepts(3));
        assert!(RunLength::AtLeast(3).accepts(5));
        assert!(!RunLength::AtLeast(3).accepts(2));
    }

    #[test]
    fn test_openers() {
        assert_eq!(Format::Underline.rule().opener(), "++");
        assert_eq!(Format::Superscript.rule().opener(), "^");
        assert_eq!(Format::FencedBlock.rule().opener(), ":::");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tag scanning
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_braced_tag_valid() {
        let scan = scan_tag(Format::Highlight.rule(), "{abc}text");
        assert_eq!(scan, TagScan { len: 5, valid: true });
    }

    #[test]
    fn test_braced_tag_empty_is_invalid() {
        let scan = scan_tag(Format::Highlight.rule(), "{}text");
        assert_eq!(scan, TagScan { len: 2, valid: false });
    }

    #[test]
    fn test_braced_tag_unterminated() {
        assert_eq!(scan_tag(Format::Highlight.rule(), "{ab"), TagScan::NONE);
    }

    #[test]
    fn test_braced_tag_disallowed_char() {
        assert_eq!(scan_tag(Format::Highlight.rule(), "{a b}x"), TagScan::NONE);
        let span = scan_tag(Format::CustomSpan.rule(), "{a b}x");
        assert_eq!(span, TagScan { len: 5, valid: true });
    }

    #[test]
    fn test_untagged_formats_never_scan() {
        assert_eq!(scan_tag(Format::Underline.rule(), "{abc}"), TagScan::NONE);
    }

    #[test]
    fn test_line_tag() {
        let rule = Format::FencedBlock.rule();
        assert_eq!(scan_tag(rule, " note"), TagScan { len: 5, valid: true });
        assert_eq!(scan_tag(rule, "   "), TagScan { len: 3, valid: false });
        assert_eq!(scan_tag(rule, ""), TagScan { len: 0, valid: false });
        assert!(!scan_tag(rule, " a.b").valid);
    }

    #[test]
    fn test_render_tag() {
        assert_eq!(Format::Highlight.rule().render_tag("red"), "{red}");
        assert_eq!(Format::FencedBlock.rule().render_tag("note"), " note");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Delimiter table
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_table_from_settings() {
        let mut settings = Settings::default();
        settings.formats.set(Format::Spoiler, FormatMode::Preview);
        let table = DelimiterTable::from_settings(&settings);
        assert!(!table.is_enabled(Format::Spoiler));
        assert!(table.queued_inline_rule('|').is_none());
        assert_eq!(
            table.queued_inline_rule('+').map(|r| r.format),
            Some(Format::Underline)
        );
    }

    #[test]
    fn test_highlight_and_block_not_queued_inline() {
        let table = DelimiterTable::default();
        assert!(table.queued_inline_rule('=').is_none());
        assert!(table.queued_inline_rule(':').is_none());
    }
}
