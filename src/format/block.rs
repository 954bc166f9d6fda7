//! Fenced block formatting
//!
//! Works on blank-line-delimited runs of lines within the selection. A run
//! without a block gets an opener line (and a blank line after it when the
//! paragraph continues); a run with one gets its tag replaced or its opener
//! line removed.

use super::{EditPlan, FormatAction, FormatRequest};
use crate::document::{Document, Line};
use crate::syntax::Token;

/// Runs of non-blank lines touched by `from..to`. A selection on blank
/// lines only yields the line holding `from`.
fn blocks_in(doc: &Document, from: usize, to: usize) -> Vec<(Line, Line)> {
    let first = doc.line_at(from).number;
    let last = doc.line_at(to).number;
    let mut runs: Vec<(Line, Line)> = Vec::new();
    let mut current: Option<(Line, Line)> = None;

    for n in first..=last {
        let line = doc.line(n);
        if doc.line_text(line).trim().is_empty() {
            runs.extend(current.take());
        } else {
            current = Some(match current {
                Some((start, _)) => (start, line),
                None => (line, line),
            });
        }
    }
    runs.extend(current);

    if runs.is_empty() {
        let line = doc.line(first);
        runs.push((line, line));
    }
    runs
}

pub(super) fn plan(doc: &Document, tokens: &[Token], spans: &[(usize, usize)], request: &FormatRequest) -> EditPlan {
    let rule = request.format.rule();
    let mut plan = EditPlan::default();
    let mut handled: Vec<usize> = Vec::new();

    for &(s, e) in spans {
        for (first, last) in blocks_in(doc, s, e) {
            if handled.contains(&first.number) {
                continue;
            }
            handled.push(first.number);

            let existing = tokens
                .iter()
                .find(|t| doc.line_at(t.from).number == first.number);
            match existing {
                Some(t) => match request.tag_name().filter(|_| !request.force_remove) {
                    Some(name) => {
                        let wanted = rule.render_tag(name);
                        if doc.slice(t.open_end(), t.tag_end()) != wanted {
                            plan.replace(t.open_end(), t.tag_end(), wanted);
                        }
                        plan.action(FormatAction::RetagBlock);
                        plan.open_menu = true;
                    }
                    None => {
                        let opener_line = doc.line_at(t.from);
                        plan.delete(opener_line.from, doc.next_line_start(opener_line));
                        plan.action(FormatAction::RemoveBlock);
                    }
                },
                None if request.force_remove => {}
                None => {
                    let tag = request
                        .tag_name()
                        .map(|name| rule.render_tag(name))
                        .unwrap_or_default();
                    plan.insert(first.from, format!("{}{}\n", rule.opener(), tag));

                    let next = last.number + 1;
                    if next < doc.line_count() && !doc.line_text(doc.line(next)).trim().is_empty() {
                        plan.insert(last.to, "\n");
                    }
                    plan.action(FormatAction::InsertBlock);
                    plan.open_menu = true;
                }
            }
        }
    }
    plan
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
