//! Token-aware inline formatting
//!
//! For each selection range, the tokens of the requested format touching it
//! pick one of: wrap, extend/merge, close, change tag, remove or break
//! apart. Edits are planned against the unchanged document.

use log::trace;

use super::{trim_back, trim_forward, EditPlan, FormatAction, FormatRequest};
use crate::string_utils::{char_after, char_before, word_range_at};
use crate::syntax::{Format, Rule, Status, Token};

pub(super) fn plan(text: &str, tokens: &[Token], spans: &[(usize, usize)], request: &FormatRequest) -> EditPlan {
    let rule = request.format.rule();
    let mut plan = EditPlan::default();
    let mut handled: Vec<usize> = Vec::new();

    for (s, e) in widen_cursors(text, tokens, spans, request.format) {
        let candidates: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.format == request.format && is_candidate(t, s, e))
            .map(|(i, _)| i)
            .collect();
        // Two ranges inside one token: the first one decides.
        if candidates.iter().any(|i| handled.contains(i)) {
            continue;
        }
        handled.extend(&candidates);
        let touched: Vec<&Token> = candidates.iter().map(|&i| &tokens[i]).collect();

        let mut span = SpanPlan {
            text,
            rule,
            request,
            plan: &mut plan,
            s,
            e,
        };
        if request.force_remove {
            for t in touched.iter().filter(|t| is_formed(t)) {
                span.remove(t);
            }
            continue;
        }
        match touched.as_slice() {
            [] => span.wrap(),
            [t] if s >= t.from && e <= t.to => span.single(t),
            _ => span.extend(&touched),
        }
    }
    plan
}

/// Replace each cursor that acts on no token by the word around it, then
/// merge ranges that now overlap or touch. A widened word is classified
/// against the tokens like any selected range.
fn widen_cursors(text: &str, tokens: &[Token], spans: &[(usize, usize)], format: Format) -> Vec<(usize, usize)> {
    let mut widened: Vec<(usize, usize)> = spans
        .iter()
        .map(|&(s, e)| {
            let on_token = tokens
                .iter()
                .any(|t| t.format == format && is_candidate(t, s, e));
            if s == e && !on_token {
                word_range_at(text, s).unwrap_or((s, e))
            } else {
                (s, e)
            }
        })
        .collect();
    widened.sort_unstable();

    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(widened.len());
    for (s, e) in widened {
        match merged.last_mut() {
            Some(last) if s <= last.1 => last.1 = last.1.max(e),
            _ => merged.push((s, e)),
        }
    }
    merged
}

/// A cursor resting on a token's outer edge does not select it. The end of
/// an unclosed token is not an edge.
fn is_candidate(t: &Token, s: usize, e: usize) -> bool {
    if !t.touches(s, e) {
        return false;
    }
    s < e || !(s == t.from || (s == t.to && t.close_len > 0))
}

/// Has a closer or resolved active.
fn is_formed(t: &Token) -> bool {
    t.is_active() || t.close_len > 0
}

struct SpanPlan<'a> {
    text: &'a str,
    rule: &'static Rule,
    request: &'a FormatRequest,
    plan: &'a mut EditPlan,
    s: usize,
    e: usize,
}

impl SpanPlan<'_> {
    fn requested_tag(&self) -> String {
        self.request
            .tag_name()
            .map(|name| self.rule.render_tag(name))
            .unwrap_or_default()
    }

    /// Tag for a fresh opener: the requested one, else a copy of `t`'s.
    fn tag_from(&self, t: &Token) -> String {
        match self.request.tag_name() {
            Some(name) => self.rule.render_tag(name),
            None => self.text[t.open_end()..t.tag_end()].to_string(),
        }
    }

    fn wrap(&mut self) {
        let (s, e) = (self.s, self.e);
        let opener = self.rule.opener();
        let open = format!("{}{}", opener, self.requested_tag());

        let (a, b) = if s == e {
            (s, s)
        } else {
            let a = trim_forward(self.text, s, e);
            let b = trim_back(self.text, e, a);
            if a < b {
                (a, b)
            } else {
                (s, e)
            }
        };

        // A delimiter next to its own character would join a longer run.
        let delimiter = Some(self.rule.delimiter);
        let edges = [
            char_before(self.text, a),
            char_after(self.text, a),
            char_before(self.text, b),
            char_after(self.text, b),
        ];
        if edges.contains(&delimiter) {
            trace!("Not wrapping {}..{}: touches a '{}'", a, b, self.rule.delimiter);
            return;
        }
        if self.rule.no_whitespace && self.text[a..b].chars().any(char::is_whitespace) {
            trace!("Not wrapping {}..{}: {} rejects whitespace", a, b, self.rule.format.name());
            return;
        }

        if a == b {
            trace!("Inserting empty {} pair at {}", self.rule.format.name(), a);
            self.plan.insert(a, format!("{}{}", open, opener));
            self.plan.shift_cursor(a, open.len());
        } else {
            self.plan.insert(a, open);
            self.plan.insert(b, opener);
        }
        self.finish(FormatAction::Wrap);
    }

    fn single(&mut self, t: &Token) {
        let (s, e) = (self.s, self.e);
        if self.rule.must_close() && t.status == Status::Inactive && t.close_len == 0 {
            self.close(t);
        } else if self.request.tag.is_some() && is_formed(t) {
            self.change_tag(t);
        } else if s == e || (s, e) == t.content_range() || (s, e) == (t.from, t.to) {
            self.remove(t);
            self.plan.action(FormatAction::Remove);
        } else {
            self.break_apart(t);
        }
    }

    fn close(&mut self, t: &Token) {
        let at = trim_back(self.text, t.to, t.tag_end());
        self.plan.insert(at, self.rule.opener());
        if let Some(name) = self.request.tag_name() {
            if self.rule.supports_tag() && !t.has_tag() {
                self.plan.insert(t.open_end(), self.rule.render_tag(name));
            }
        }
        self.finish(FormatAction::Close);
    }

    fn change_tag(&mut self, t: &Token) {
        let current = &self.text[t.open_end()..t.tag_end()];
        let wanted = self.requested_tag();
        if current != wanted {
            self.plan.replace(t.open_end(), t.tag_end(), wanted);
        }
        self.finish(FormatAction::ChangeTag);
    }

    fn remove(&mut self, t: &Token) {
        self.plan.delete(t.from, t.tag_end());
        self.plan.delete(t.close_start().max(t.tag_end()), t.to);
    }

    fn break_apart(&mut self, t: &Token) {
        let (s, e) = (self.s, self.e);
        let (content_from, content_to) = t.content_range();
        let opener = self.rule.opener();

        if s <= content_from {
            self.plan.delete(t.from, t.tag_end());
        } else {
            let at = trim_back(self.text, s, content_from);
            self.plan.insert(at, opener.clone());
        }

        if t.close_len > 0 && e >= t.close_start() {
            self.plan.delete(t.close_start(), t.to);
        } else if e < content_to {
            let at = trim_forward(self.text, e, content_to);
            let open = format!("{}{}", opener, self.tag_from(t));
            self.plan.insert(at, open);
        }
        self.plan.action(FormatAction::BreakApart);
    }

    /// Merge every touched token and the selection into one token.
    fn extend(&mut self, touched: &[&Token]) {
        let (s, e) = (self.s, self.e);
        let first = touched[0];
        let Some(last) = touched.iter().copied().max_by_key(|t| t.to) else {
            return;
        };
        let opener = self.rule.opener();

        let keep_left = s >= first.from;
        let keep_right = e <= last.to && last.close_len > 0;

        if keep_left {
            if self.request.tag_name().is_some() {
                let wanted = self.requested_tag();
                if self.text[first.open_end()..first.tag_end()] != wanted {
                    self.plan.replace(first.open_end(), first.tag_end(), wanted);
                }
            }
        } else {
            let at = trim_forward(self.text, s, first.from);
            let open = format!("{}{}", opener, self.tag_from(first));
            self.plan.insert(at, open);
        }

        for t in touched {
            let is_first = std::ptr::eq(*t, first);
            let is_last = std::ptr::eq(*t, last);
            if !(keep_left && is_first) {
                self.plan.delete(t.from, t.tag_end());
            }
            if !(keep_right && is_last) && t.close_len > 0 {
                self.plan.delete(t.close_start().max(t.tag_end()), t.to);
            }
        }

        if !keep_right {
            let lo = if e > last.to { last.to } else { last.tag_end() };
            let at = trim_back(self.text, e, lo).max(lo);
            self.plan.insert(at, opener);
        }
        self.finish(FormatAction::Extend);
    }

    fn finish(&mut self, action: FormatAction) {
        self.plan.action(action);
        self.plan.open_menu |= self.rule.supports_tag();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use crate::config::Settings;
    use crate::format::test_support::{run, tidy};
    use crate::format::{FormatAction, FormatRequest};
    use crate::selection::{Selection, SelectionRange};
    use crate::syntax::Format;

    fn underline() -> FormatRequest {
        FormatRequest::new(Format::Underline)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Wrap
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_wrap_selection() {
        let (after, sel) = tidy("a bc d", 2, 4, underline());
        assert_eq!(after, "a ++bc++ d");
        assert_eq!(sel, SelectionRange::new(4, 6));
    }

    #[test]
    fn test_wrap_trims_whitespace() {
        let (after, _) = tidy("a bc d", 1, 5, underline());
        assert_eq!(after, "a ++bc++ d");
    }

    #[test]
    fn test_cursor_wraps_word() {
        let (after, sel) = tidy("one two", 5, 5, underline());
        assert_eq!(after, "one ++two++");
        assert_eq!(sel, SelectionRange::cursor(7));
    }

    #[test]
    fn test_cursor_outside_word_inserts_pair() {
        let (after, sel) = tidy("a  b", 2, 2, FormatRequest::new(Format::Superscript));
        assert_eq!(after, "a ^^ b");
        assert_eq!(sel, SelectionRange::cursor(3));
    }

    #[test]
    fn test_cursor_word_touching_token_extends_it() {
        let (after, sel, outcome) = run("++ab++cd", Selection::cursor(7), &Settings::default(), underline());
        assert_eq!(after, "++abcd++");
        assert_eq!(outcome.actions, vec![FormatAction::Extend]);
        assert_eq!(sel, SelectionRange::cursor(5));
    }

    #[test]
    fn test_cursors_in_one_word_wrap_once() {
        let selection = Selection::new(vec![SelectionRange::cursor(1), SelectionRange::cursor(3)], 0);
        let (after, _, outcome) = run("hello", selection, &Settings::default(), underline());
        assert_eq!(after, "++hello++");
        assert_eq!(outcome.actions, vec![FormatAction::Wrap]);
    }

    #[test]
    fn test_cursor_word_merges_with_range() {
        let selection = Selection::new(vec![SelectionRange::new(0, 2), SelectionRange::cursor(4)], 0);
        let (after, _, _) = run("hello world", selection, &Settings::default(), underline());
        assert_eq!(after, "++hello++ world");
    }

    #[test]
    fn test_wrap_next_to_delimiter_char_refused() {
        let (after, _, outcome) = run("b++ c", Selection::cursor(0), &Settings::default(), underline());
        assert_eq!(after, "b++ c");
        assert!(!outcome.applied);
    }

    #[test]
    fn test_superscript_refuses_whitespace() {
        let (after, _, outcome) = run(
            "x a b c",
            Selection::single(2, 7),
            &Settings::default(),
            FormatRequest::new(Format::Superscript),
        );
        assert_eq!(after, "x a b c");
        assert!(!outcome.applied);
        assert!(outcome.changes.is_empty());

        let (after, _) = tidy("x abc", 2, 5, FormatRequest::new(Format::Subscript));
        assert_eq!(after, "x ~abc~");
    }

    #[test]
    fn test_wrap_with_tag() {
        let (after, sel) = tidy("hi there", 0, 2, FormatRequest::new(Format::Highlight).tag("red"));
        assert_eq!(after, "=={red}hi== there");
        assert_eq!(sel, SelectionRange::new(7, 9));
    }

    #[test]
    fn test_wrap_then_remove_restores_text() {
        let original = "keep this text";
        let (wrapped, sel) = tidy(original, 5, 9, underline());
        assert_eq!(wrapped, "keep ++this++ text");
        let (restored, _) = tidy(&wrapped, sel.anchor, sel.head, underline());
        assert_eq!(restored, original);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Extend and merge
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_merge_two_tokens() {
        let (after, sel) = tidy("a ++b++ ++c++ d", 4, 11, underline());
        assert_eq!(after, "a ++b c++ d");
        assert_eq!(sel, SelectionRange::new(4, 7));
    }

    #[test]
    fn test_extend_right() {
        let (after, _) = tidy("++ab++cd ef", 3, 8, underline());
        assert_eq!(after, "++abcd++ ef");
    }

    #[test]
    fn test_extend_left() {
        let (after, _) = tidy("xy ++ab++", 0, 5, underline());
        assert_eq!(after, "++xy ab++");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Close, change tag, remove
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_close_unclosed_token() {
        let (after, _) = tidy("++abc", 3, 3, underline());
        assert_eq!(after, "++abc++");
    }

    #[test]
    fn test_close_trims_trailing_space() {
        let (after, _) = tidy("x ^ab cd", 4, 4, FormatRequest::new(Format::Superscript));
        assert_eq!(after, "x ^ab^ cd");
    }

    #[test]
    fn test_change_tag() {
        let text = "a =={red}b== c";
        let (after, _) = tidy(text, 10, 10, FormatRequest::new(Format::Highlight).tag("blue"));
        assert_eq!(after, "a =={blue}b== c");
    }

    #[test]
    fn test_clear_tag() {
        let (after, _) = tidy("=={red}b==", 8, 8, FormatRequest::new(Format::Highlight).tag(""));
        assert_eq!(after, "==b==");
    }

    #[test]
    fn test_cursor_inside_removes() {
        let (after, sel) = tidy("a ++bcd++ e", 5, 5, underline());
        assert_eq!(after, "a bcd e");
        assert_eq!(sel, SelectionRange::cursor(3));
    }

    #[test]
    fn test_cursor_after_closer_leaves_token_intact() {
        let (after, _, outcome) = run(
            "++ab++ cd",
            Selection::cursor(6),
            &Settings::default(),
            underline(),
        );
        assert_eq!(after, "++ab++ cd");
        assert!(outcome.actions.is_empty());
        assert!(!outcome.applied);
    }

    #[test]
    fn test_force_remove() {
        let (after, _) = tidy("++a++ b ++c++", 0, 13, underline().force_remove());
        assert_eq!(after, "a b c");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Break apart
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_break_apart_middle() {
        let (after, sel) = tidy("a ++bcd++ e", 5, 6, underline());
        assert_eq!(after, "a ++b++c++d++ e");
        assert_eq!(sel, SelectionRange::new(7, 8));
    }

    #[test]
    fn test_break_apart_prefix() {
        let (after, _) = tidy("++ab cd++", 2, 5, underline());
        assert_eq!(after, "ab ++cd++");
    }

    #[test]
    fn test_break_apart_suffix() {
        let (after, _) = tidy("!!{x}ab cd!!", 7, 10, FormatRequest::new(Format::CustomSpan));
        assert_eq!(after, "!!{x}ab!! cd");
    }

    #[test]
    fn test_break_apart_copies_tag() {
        let (after, _) = tidy("!!{x}ab cd!!", 5, 7, FormatRequest::new(Format::CustomSpan));
        assert_eq!(after, "ab !!{x}cd!!");
    }
}
