//! Property-based tests for incremental parsing
//!
//! Whatever the edit, the tokens kept up to date by `apply_change` must equal
//! the tokens of a fresh full parse of the new document.

use extmark::change::{ChangeSet, TextEdit};
use extmark::syntax::TokenStreams;
use extmark::{Document, HostTree, Parser};
use proptest::prelude::*;

/// Helper: tokens of a fresh full parse
fn full(doc: &Document) -> TokenStreams {
    let tree = HostTree::parse(doc);
    let mut parser = Parser::default();
    parser.full_parse(doc, &tree);
    parser.streams().clone()
}

/// One edit described independently of the document length
#[derive(Debug, Clone)]
struct EditSeed {
    at: usize,
    delete: usize,
    insert: String,
}

impl EditSeed {
    fn to_edit(&self, len: usize) -> TextEdit {
        let from = self.at % (len + 1);
        let to = (from + self.delete).min(len);
        TextEdit::replace(from, to, self.insert.clone())
    }
}

/// Pieces of extension markup, plain words, line structure and the host
/// constructs that change how the markup around them is read: code spans and
/// fences, indented code, HTML, links with their reference definitions,
/// tables, list items and block quotes.
fn fragment_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "a", "bc", " ", "  ", "\n", "\n\n", "++", "||", "^", "~", "==", "!!", "{red}", "{x y}",
        "{", "}", ":::", "::: note\n", ":::\n", "x++", "++y", "*", "_", "# ", "1. ", "- ", "\\",
        "`", "```", "    ", "<div>", "[x]", "[x]: /u\n", "| a |\n", "|---|\n", "> ",
    ])
}

fn document_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(fragment_strategy(), 0..40).prop_map(|parts| parts.concat())
}

fn edit_strategy() -> impl Strategy<Value = EditSeed> {
    (
        any::<usize>(),
        0usize..6,
        prop::collection::vec(fragment_strategy(), 0..4),
    )
        .prop_map(|(at, delete, parts)| EditSeed {
            at,
            delete,
            insert: parts.concat(),
        })
}

#[cfg(test)]
mod sample_edit_tests {
    use super::*;

    fn check(before: &str, edit: TextEdit) {
        let old_doc = Document::new(before);
        let old_tree = HostTree::parse(&old_doc);
        let mut parser = Parser::default();
        parser.full_parse(&old_doc, &old_tree);

        let changes = ChangeSet::new(old_doc.len(), vec![edit]).unwrap();
        let new_doc = old_doc.apply(&changes).unwrap();
        let new_tree = HostTree::parse(&new_doc);
        parser.apply_change(&new_doc, &old_tree, &new_tree, &changes);

        assert_eq!(parser.streams(), &full(&new_doc), "after edit: {:?}", new_doc.text());
    }

    #[test]
    fn test_close_far_opener() {
        check("a ++b\nc d e", TextEdit::insert(11, "++"));
    }

    #[test]
    fn test_blank_line_splits_token() {
        check("||a\nb|| c", TextEdit::insert(4, "\n"));
    }

    #[test]
    fn test_blank_line_removed_joins_token() {
        check("||a\n\nb|| c", TextEdit::delete(4, 5));
    }

    #[test]
    fn test_fence_opened_above_content() {
        check("x\n\n=={red}y==\n\nz", TextEdit::insert(0, "::: note\n"));
    }

    #[test]
    fn test_list_marker_removed_above_indented_line() {
        check("- a\n\n    ++b++\n", TextEdit::delete(0, 2));
    }

    #[test]
    fn test_link_definition_removed_below_use() {
        check("x [p++q] r++\n\n[p++q]: /u\n", TextEdit::delete(14, 25));
    }

    #[test]
    fn test_link_definition_added_below_use() {
        check("x [p++q] r++\n\n", TextEdit::insert(14, "[p++q]: /u\n"));
    }

    #[test]
    fn test_link_definition_broken_above_use() {
        check("[x]: /u\n\na ^[x] b^ c\n", TextEdit::insert(0, "++"));
    }

    #[test]
    fn test_table_delimiter_row_added() {
        check("| a ++b++ |\n\nc", TextEdit::insert(12, "|---|\n"));
    }

    #[test]
    fn test_code_span_closed_on_next_line() {
        check("a `b ++c++\nd\n\ne", TextEdit::insert(12, "`"));
    }

    #[test]
    fn test_tag_edited() {
        check("=={red}hi== and ==x==", TextEdit::replace(3, 6, "blue"));
    }
}

/// Property-based tests for incremental parsing
#[cfg(test)]
mod proptest_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1024))]

        #[test]
        fn incremental_matches_full(
            text in document_strategy(),
            seeds in prop::collection::vec(edit_strategy(), 1..5),
        ) {
            let mut doc = Document::new(text);
            let mut tree = HostTree::parse(&doc);
            let mut parser = Parser::default();
            parser.full_parse(&doc, &tree);

            for seed in &seeds {
                let changes = ChangeSet::new(doc.len(), vec![seed.to_edit(doc.len())]).unwrap();
                let new_doc = doc.apply(&changes).unwrap();
                let new_tree = HostTree::parse(&new_doc);
                parser.apply_change(&new_doc, &tree, &new_tree, &changes);

                prop_assert_eq!(parser.streams(), &full(&new_doc), "after edit: {:?}", new_doc.text());
                doc = new_doc;
                tree = new_tree;
            }
        }

        #[test]
        fn tokens_are_sorted_and_in_bounds(text in document_strategy()) {
            let doc = Document::new(text);
            let streams = full(&doc);
            for tokens in [&streams.inline, &streams.block] {
                for pair in tokens.windows(2) {
                    prop_assert!(pair[0].from <= pair[1].from);
                }
                for token in tokens.iter() {
                    prop_assert!(token.from + token.open_len + token.tag_len <= token.to - token.close_len);
                    prop_assert!(token.to <= doc.len());
                }
            }
        }
    }
}
