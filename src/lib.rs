//! extmark - extended Markdown syntax engine
//!
//! Tokenizes underline, spoiler, superscript, subscript, highlight, custom
//! span and fenced block markup on top of CommonMark, keeps the tokens
//! current as the document is edited, tracks which tokens the selection
//! touches, and plans formatting edits.
//!
//! [`Session`] ties the pieces together for a host editor. The lower-level
//! [`Parser`], [`SelectionObserver`] and [`format::format`] can be driven
//! directly.

pub mod change;
pub mod config;
pub mod document;
pub mod error;
pub mod format;
pub mod markdown;
pub mod selection;
pub mod session;
pub mod string_utils;
pub mod syntax;

pub use change::{Assoc, ChangeSet, TextEdit};
pub use config::{FormatMode, Settings, TagVisibility};
pub use document::Document;
pub use error::{Error, Result};
pub use format::{FormatOutcome, FormatRequest};
pub use markdown::HostTree;
pub use selection::{Selection, SelectionObserver, SelectionRange};
pub use session::Session;
pub use syntax::{Format, Level, Parser, Status, Token};
