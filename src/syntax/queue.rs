//! Token queue
//!
//! One pending-token slot per queued format. Opening a format parks the new
//! token's index in its slot; a closer or a context boundary resolves it. The
//! queue belongs to a single scanning pass and is dropped with it.

use super::rules::{Format, Rule};
use super::token::{Status, Token, TokenStreams};

const SLOT_COUNT: usize = 6;

fn slot(format: Format) -> usize {
    match format {
        Format::Underline => 0,
        Format::Spoiler => 1,
        Format::Superscript => 2,
        Format::Subscript => 3,
        Format::CustomSpan => 4,
        Format::FencedBlock => 5,
        Format::Highlight => panic!("highlight tokens are built from host marks, not queued"),
    }
}

#[derive(Debug, Default)]
pub struct TokenQueue {
    slots: [Option<(Format, usize)>; SLOT_COUNT],
}

impl TokenQueue {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Push a freshly opened token into its level and park it.
    ///
    /// # Panics
    /// If the format is not opened through the queue, or its slot is taken.
    pub fn open(&mut self, streams: &mut TokenStreams, token: Token) -> usize {
        let format = token.format;
        let slot = slot(format);
        assert!(
            self.slots[slot].is_none(),
            "{} already has a pending token",
            format.name()
        );
        let index = streams.push(token);
        self.slots[slot] = Some((format, index));
        index
    }

    /// Index of the pending token of `format`, if any.
    pub fn pending(&self, format: Format) -> Option<usize> {
        self.slots[slot(format)].map(|(_, index)| index)
    }

    /// Resolve the pending token of `format` with an explicit closer.
    pub fn close(&mut self, streams: &mut TokenStreams, format: Format, close_from: usize, close_len: usize) {
        if let Some((_, index)) = self.slots[slot(format)].take() {
            let token = &mut streams.get_mut(format.level())[index];
            token.to = close_from + close_len;
            token.close_len = close_len;
            token.status = Status::Active;
        }
    }

    /// Force-resolve every pending token whose rule matches `pred`.
    pub fn resolve_where(
        &mut self,
        streams: &mut TokenStreams,
        end: usize,
        blank_line: bool,
        pred: impl Fn(&Rule) -> bool,
    ) {
        for entry in self.slots.iter_mut() {
            let Some((format, index)) = *entry else {
                continue;
            };
            if !pred(format.rule()) {
                continue;
            }
            force_resolve(&mut streams.get_mut(format.level())[index], end, blank_line);
            *entry = None;
        }
    }

    /// Force-resolve everything (context boundary).
    pub fn resolve_all(&mut self, streams: &mut TokenStreams, end: usize, blank_line: bool) {
        self.resolve_where(streams, end, blank_line, |_| true);
    }
}

/// Resolve a token that never met its closer. Formats that must be closed
/// turn inactive; tag-only formats stand or fall with their tag.
fn force_resolve(token: &mut Token, end: usize, blank_line: bool) {
    let rule = token.format.rule();
    token.to = end.max(token.tag_end());
    token.close_len = 0;
    token.closed_by_blank_line = blank_line;
    token.status = if !rule.must_close() && token.valid_tag {
        Status::Active
    } else {
        Status::Inactive
    };
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_close() {
        let mut streams = TokenStreams::default();
        let mut queue = TokenQueue::new();
        let index = queue.open(&mut streams, Token::open(Format::Underline, 2, 2, 0, false));
        assert_eq!(queue.pending(Format::Underline), Some(index));

        queue.close(&mut streams, Format::Underline, 7, 2);
        assert!(queue.is_empty());
        let token = &streams.inline[index];
        assert_eq!(token.status, Status::Active);
        assert_eq!((token.from, token.to, token.close_len), (2, 9, 2));
    }

    #[test]
    fn test_resolve_all_must_close_turns_inactive() {
        let mut streams = TokenStreams::default();
        let mut queue = TokenQueue::new();
        queue.open(&mut streams, Token::open(Format::Spoiler, 0, 2, 0, false));
        queue.resolve_all(&mut streams, 6, true);

        let token = &streams.inline[0];
        assert_eq!(token.status, Status::Inactive);
        assert_eq!(token.to, 6);
        assert!(token.closed_by_blank_line);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_resolve_tag_only_depends_on_tag() {
        let mut streams = TokenStreams::default();
        let mut queue = TokenQueue::new();
        queue.open(&mut streams, Token::open(Format::FencedBlock, 0, 3, 5, true));
        queue.resolve_all(&mut streams, 20, false);
        assert_eq!(streams.block[0].status, Status::Active);

        let mut queue = TokenQueue::new();
        queue.open(&mut streams, Token::open(Format::FencedBlock, 30, 3, 0, false));
        queue.resolve_all(&mut streams, 33, false);
        assert_eq!(streams.block[1].status, Status::Inactive);
    }

    #[test]
    fn test_resolve_never_shrinks_below_tag() {
        let mut streams = TokenStreams::default();
        let mut queue = TokenQueue::new();
        queue.open(&mut streams, Token::open(Format::CustomSpan, 10, 2, 5, true));
        queue.resolve_all(&mut streams, 3, false);
        assert_eq!(streams.inline[0].to, 17);
    }

    #[test]
    fn test_resolve_where_filters() {
        let mut streams = TokenStreams::default();
        let mut queue = TokenQueue::new();
        queue.open(&mut streams, Token::open(Format::Underline, 0, 2, 0, false));
        queue.open(&mut streams, Token::open(Format::Superscript, 3, 1, 0, false));
        queue.resolve_where(&mut streams, 5, false, |rule| rule.no_whitespace);

        assert_eq!(queue.pending(Format::Superscript), None);
        assert_eq!(queue.pending(Format::Underline), Some(0));
        assert_eq!(streams.inline[1].status, Status::Inactive);
    }

    #[test]
    #[should_panic]
    fn test_highlight_cannot_be_queued() {
        let mut streams = TokenStreams::default();
        let mut queue = TokenQueue::new();
        queue.open(&mut streams, Token::open(Format::Highlight, 0, 2, 0, false));
    }
}
