//! Extension syntax: delimiter rules, tokenization and incremental parsing
//!
//! The document is tokenized into two arrays, one per [`Level`]. Tokens are
//! sorted by start offset and never overlap another token of the same
//! format. The [`Parser`] keeps them current as the document changes.

pub(crate) mod lines;
mod parser;
mod queue;
mod rules;
mod token;
mod tokenizer;

pub use lines::{classify, LineKind};
pub use parser::{ParseReport, Parser, TokenDelta};
pub use rules::{
    is_operator_char, scan_tag, Closing, DelimiterTable, Format, Level, Rule, RunLength, TagScan,
    TagStyle,
};
pub use token::{Status, Token, TokenStreams};
pub use tokenizer::{tokenize, Tokenizer};
