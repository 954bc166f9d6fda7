//! Raw delimiter toggling
//!
//! Used when tidy formatting is off: the tokens are ignored and the
//! delimiters are matched as plain strings, inside the selection or just
//! around it.

use super::{EditPlan, FormatAction, FormatRequest};
use crate::string_utils::{ceil_char_boundary, floor_char_boundary};
use crate::syntax::{scan_tag, Rule};

/// Start of an opener (with optional tag) ending exactly at `at`.
fn opener_before(text: &str, at: usize, rule: &Rule, opener: &str) -> Option<usize> {
    let before = &text[..at];
    if before.ends_with(opener) {
        return Some(at - opener.len());
    }
    if !rule.supports_tag() || !before.ends_with('}') {
        return None;
    }
    let brace = before.rfind('{')?;
    let scan = scan_tag(rule, &text[brace..at]);
    (scan.len == at - brace && before[..brace].ends_with(opener)).then(|| brace - opener.len())
}

pub(super) fn plan(text: &str, spans: &[(usize, usize)], request: &FormatRequest) -> EditPlan {
    let rule = request.format.rule();
    let opener = rule.opener();
    let tag = request
        .tag_name()
        .map(|name| rule.render_tag(name))
        .unwrap_or_default();
    let mut plan = EditPlan::default();

    for &(s, e) in spans {
        let s = floor_char_boundary(text, s);
        let e = ceil_char_boundary(text, e);
        let selected = &text[s..e];

        // Already formatted inside the selection: toggle off
        if selected.len() >= 2 * opener.len() && selected.starts_with(&opener) && selected.ends_with(&opener) {
            let tag_len = scan_tag(rule, &selected[opener.len()..]).len;
            if opener.len() + tag_len <= selected.len() - opener.len() {
                plan.delete(s, s + opener.len() + tag_len);
                plan.delete(e - opener.len(), e);
                plan.action(FormatAction::RawUnwrap);
                continue;
            }
        }

        // Surrounding text has the formatting
        if let Some(open_from) = opener_before(text, s, rule, &opener) {
            if text[e..].starts_with(&opener) {
                plan.delete(open_from, s);
                plan.delete(e, e + opener.len());
                plan.action(FormatAction::RawUnwrap);
                continue;
            }
        }

        let open = format!("{}{}", opener, tag);
        if s == e {
            plan.insert(s, format!("{}{}", open, opener));
            plan.shift_cursor(s, open.len());
        } else {
            plan.insert(s, open);
            plan.insert(e, opener.clone());
        }
        plan.action(FormatAction::RawWrap);
        plan.open_menu |= rule.supports_tag();
    }
    plan
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::format::test_support::run;
    use crate::selection::{Selection, SelectionRange};
    use crate::syntax::Format;

    fn raw(text: &str, anchor: usize, head: usize, request: FormatRequest) -> (String, SelectionRange) {
        let settings = Settings {
            tidy_formatting: false,
            ..Settings::default()
        };
        let (after, sel, _) = run(text, Selection::single(anchor, head), &settings, request);
        (after, sel)
    }

    #[test]
    fn test_wrap_selection() {
        let (after, sel) = raw("Hello world", 0, 5, FormatRequest::new(Format::Underline));
        assert_eq!(after, "++Hello++ world");
        assert_eq!(sel, SelectionRange::new(2, 7));
    }

    #[test]
    fn test_toggle_off_inside() {
        let (after, _) = raw("=={red}hi== x", 0, 11, FormatRequest::new(Format::Highlight));
        assert_eq!(after, "hi x");
    }

    #[test]
    fn test_toggle_off_surrounding() {
        let (after, sel) = raw("a ||b|| c", 4, 5, FormatRequest::new(Format::Spoiler));
        assert_eq!(after, "a b c");
        assert_eq!(sel, SelectionRange::new(2, 3));
    }

    #[test]
    fn test_toggle_off_surrounding_with_tag() {
        let (after, _) = raw("!!{a b}x!!", 7, 8, FormatRequest::new(Format::CustomSpan));
        assert_eq!(after, "x");
    }

    #[test]
    fn test_cursor_inserts_pair() {
        let (after, sel) = raw("ab", 1, 1, FormatRequest::new(Format::Subscript));
        assert_eq!(after, "a~~b");
        assert_eq!(sel, SelectionRange::cursor(2));
    }

    #[test]
    fn test_raw_ignores_token_state() {
        // Spaces make this an inactive token, but raw mode still unwraps it.
        let (after, _) = raw("++ a ++", 0, 7, FormatRequest::new(Format::Underline));
        assert_eq!(after, " a ");
    }
}
