//! Token records
//!
//! A token covers one unit of extended syntax: opener, optional tag, content
//! and (possibly empty) closer. Tokens of one level live in a `Vec` sorted by
//! `from`; everything else refers to them by index.

use super::rules::{Format, Level};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Opened, waiting for a closer or a boundary
    Pending,
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub format: Format,
    pub level: Level,
    pub status: Status,
    pub from: usize,
    pub to: usize,
    pub open_len: usize,
    pub close_len: usize,
    /// Braces (or the leading space of a line tag) included
    pub tag_len: usize,
    pub valid_tag: bool,
    pub tag_as_content: bool,
    pub closed_by_blank_line: bool,
}

impl Token {
    /// A freshly opened token. `to` provisionally ends after the tag.
    pub fn open(format: Format, from: usize, open_len: usize, tag_len: usize, valid_tag: bool) -> Self {
        let rule = format.rule();
        Self {
            format,
            level: rule.level,
            status: Status::Pending,
            from,
            to: from + open_len + tag_len,
            open_len,
            close_len: 0,
            tag_len,
            valid_tag,
            tag_as_content: rule.tag_as_content,
            closed_by_blank_line: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    /// End of the opener.
    pub fn open_end(&self) -> usize {
        self.from + self.open_len
    }

    /// End of the tag, where the content starts.
    pub fn tag_end(&self) -> usize {
        self.open_end() + self.tag_len
    }

    /// Start of the closer (equal to `to` when there is none).
    pub fn close_start(&self) -> usize {
        self.to - self.close_len
    }

    pub fn content_range(&self) -> (usize, usize) {
        (self.tag_end(), self.close_start().max(self.tag_end()))
    }

    pub fn has_tag(&self) -> bool {
        self.tag_len > 0
    }

    /// The tag name, without braces or leading whitespace.
    pub fn tag_name<'a>(&self, text: &'a str) -> &'a str {
        if !self.has_tag() {
            return "";
        }
        let raw = &text[self.open_end()..self.tag_end()];
        match raw.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
            Some(inner) => inner,
            None => raw.trim(),
        }
    }

    pub fn shift(&mut self, delta: isize) {
        self.from = (self.from as isize + delta) as usize;
        self.to = (self.to as isize + delta) as usize;
    }

    /// Whether `[from, to]` intersects or touches the token span.
    pub fn touches(&self, from: usize, to: usize) -> bool {
        from <= self.to && self.from <= to
    }
}

/// Token arrays, one per level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TokenStreams {
    pub inline: Vec<Token>,
    pub block: Vec<Token>,
}

impl TokenStreams {
    pub fn get(&self, level: Level) -> &Vec<Token> {
        match level {
            Level::Inline => &self.inline,
            Level::Block => &self.block,
        }
    }

    pub fn get_mut(&mut self, level: Level) -> &mut Vec<Token> {
        match level {
            Level::Inline => &mut self.inline,
            Level::Block => &mut self.block,
        }
    }

    /// Append a token to its level, returning its index.
    pub fn push(&mut self, token: Token) -> usize {
        let tokens = self.get_mut(token.level);
        tokens.push(token);
        tokens.len() - 1
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn closed(format: Format, text: &str, open_len: usize, tag_len: usize) -> Token {
        let mut token = Token::open(format, 0, open_len, tag_len, tag_len > 2);
        token.to = text.len();
        token.close_len = open_len;
        token.status = Status::Active;
        token
    }

    #[test]
    fn test_open_token_layout() {
        let token = Token::open(Format::Highlight, 4, 2, 5, true);
        assert_eq!(token.status, Status::Pending);
        assert_eq!(token.open_end(), 6);
        assert_eq!(token.tag_end(), 11);
        assert_eq!(token.to, 11);
        assert!(token.tag_as_content);
        assert_eq!(token.level, Level::Inline);
    }

    #[test]
    fn test_content_range_and_tag_name() {
        let text = "=={red}hot==";
        let token = closed(Format::Highlight, text, 2, 5);
        assert_eq!(token.content_range(), (7, 10));
        assert_eq!(token.tag_name(text), "red");
    }

    #[test]
    fn test_line_tag_name() {
        let text = "::: note";
        let mut token = Token::open(Format::FencedBlock, 0, 3, 5, true);
        token.to = text.len();
        assert_eq!(token.tag_name(text), "note");
        assert_eq!(token.level, Level::Block);
    }

    #[test]
    fn test_shift_and_touches() {
        let mut token = closed(Format::Underline, "++ab++", 2, 0);
        token.shift(3);
        assert_eq!((token.from, token.to), (3, 9));
        assert!(token.touches(9, 9));
        assert!(token.touches(0, 3));
        assert!(!token.touches(10, 12));
    }

    #[test]
    fn test_streams_push_by_level() {
        let mut streams = TokenStreams::default();
        assert_eq!(streams.push(Token::open(Format::Underline, 0, 2, 0, false)), 0);
        assert_eq!(streams.push(Token::open(Format::FencedBlock, 0, 3, 0, false)), 0);
        assert_eq!(streams.push(Token::open(Format::Spoiler, 5, 2, 0, false)), 1);
        assert_eq!(streams.inline.len(), 2);
        assert_eq!(streams.block.len(), 1);
    }
}
