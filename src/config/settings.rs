//! User settings for extmark
//!
//! This module defines the `Settings` struct that holds all user-configurable
//! options, read from JSON with serde.

use serde::{Deserialize, Serialize};

use crate::syntax::Format;

// ─────────────────────────────────────────────────────────────────────────────
// Format Modes
// ─────────────────────────────────────────────────────────────────────────────

/// Where a format is recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FormatMode {
    /// Decorated while editing only
    Editor,
    /// Rendered in the read-only preview only
    Preview,
    #[default]
    Both,
    Disabled,
}

impl FormatMode {
    pub fn in_editor(self) -> bool {
        matches!(self, FormatMode::Editor | FormatMode::Both)
    }
}

/// One [`FormatMode`] per format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FormatModes {
    pub underline: FormatMode,
    pub spoiler: FormatMode,
    pub superscript: FormatMode,
    pub subscript: FormatMode,
    pub highlight: FormatMode,
    pub custom_span: FormatMode,
    pub fenced_block: FormatMode,
}

impl FormatModes {
    pub fn get(&self, format: Format) -> FormatMode {
        match format {
            Format::Underline => self.underline,
            Format::Spoiler => self.spoiler,
            Format::Superscript => self.superscript,
            Format::Subscript => self.subscript,
            Format::Highlight => self.highlight,
            Format::CustomSpan => self.custom_span,
            Format::FencedBlock => self.fenced_block,
        }
    }

    pub fn set(&mut self, format: Format, mode: FormatMode) {
        let slot = match format {
            Format::Underline => &mut self.underline,
            Format::Spoiler => &mut self.spoiler,
            Format::Superscript => &mut self.superscript,
            Format::Subscript => &mut self.subscript,
            Format::Highlight => &mut self.highlight,
            Format::CustomSpan => &mut self.custom_span,
            Format::FencedBlock => &mut self.fenced_block,
        };
        *slot = mode;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tag Visibility
// ─────────────────────────────────────────────────────────────────────────────

/// When a renderer shows the tags of formatted spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TagVisibility {
    Always,
    /// Only while the selection touches the span
    #[default]
    WhenTouched,
    Never,
}

// ─────────────────────────────────────────────────────────────────────────────
// Main Settings Struct
// ─────────────────────────────────────────────────────────────────────────────

/// User preferences.
///
/// Read from JSON in the user's config directory. Missing fields take their
/// defaults through `#[serde(default)]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Per-format recognition
    pub formats: FormatModes,

    /// Format against parsed tokens (true) or by raw delimiter matching
    pub tidy_formatting: bool,

    pub tag_visibility: TagVisibility,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            formats: FormatModes::default(),
            tidy_formatting: true,
            tag_visibility: TagVisibility::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
