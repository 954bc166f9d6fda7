//! Host Markdown context
//!
//! The extension syntax lives on top of CommonMark. This module parses the
//! document with comrak and answers the tokenizer's questions about code,
//! links, math and other host constructs.

mod context;
mod host;

pub use context::{
    Construct, ConstructIndex, ConstructKind, ContextClassifier, StaticContext, INTERFERERS, MARKS,
    SHIFTERS, SKIP,
};
pub use host::{HostOptions, HostTree};
