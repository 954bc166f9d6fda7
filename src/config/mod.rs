//! Configuration module for extmark
//!
//! This module handles user preferences, read from JSON in a
//! platform-specific config directory.

mod persistence;
mod settings;

pub use persistence::*;
pub use settings::*;
