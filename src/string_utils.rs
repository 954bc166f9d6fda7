//! UTF-8 safe string helpers
//!
//! Every offset in the crate is a byte offset into the document. Offsets that
//! come from outside (CLI arguments, host selections, edit ranges) may land in
//! the middle of a multi-byte character; these helpers snap them to a
//! boundary and answer the neighbour questions the tokenizer and the
//! formatter keep asking ("what is the character before this delimiter?").
//!
//! # Example
//! ```
//! use extmark::string_utils::{char_before, floor_char_boundary};
//!
//! let text = "Hei på deg";
//! assert_eq!(floor_char_boundary(text, 6), 5);
//! assert_eq!(char_before(text, 7), Some('å'));
//! ```

// ─────────────────────────────────────────────────────────────────────────────
// Character Boundary Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Returns the largest index `<= index` that is on a UTF-8 character
/// boundary. Indices past the end clamp to the string length.
#[inline]
pub fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let bytes = s.as_bytes();
    let mut i = index;
    while i > 0 && !is_utf8_char_start(bytes[i]) {
        i -= 1;
    }
    i
}

/// Returns the smallest index `>= index` that is on a UTF-8 character
/// boundary. Indices past the end clamp to the string length.
#[inline]
pub fn ceil_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let bytes = s.as_bytes();
    let mut i = index;
    while i < bytes.len() && !is_utf8_char_start(bytes[i]) {
        i += 1;
    }
    i
}

/// A byte is a char start if it's NOT a continuation byte (10xxxxxx).
#[inline]
fn is_utf8_char_start(byte: u8) -> bool {
    (byte & 0b1100_0000) != 0b1000_0000
}

// ─────────────────────────────────────────────────────────────────────────────
// Safe Slicing
// ─────────────────────────────────────────────────────────────────────────────

/// Slice `s[start..end]`, flooring `start` and ceiling `end` to character
/// boundaries. Returns an empty string when the adjusted range is empty.
#[inline]
pub fn safe_slice(s: &str, start: usize, end: usize) -> &str {
    let start = floor_char_boundary(s, start);
    let end = ceil_char_boundary(s, end);
    if start >= end {
        return "";
    }
    &s[start..end]
}

// ─────────────────────────────────────────────────────────────────────────────
// Neighbour Queries
// ─────────────────────────────────────────────────────────────────────────────

/// The character ending at byte `index`, if any.
#[inline]
pub fn char_before(s: &str, index: usize) -> Option<char> {
    let index = floor_char_boundary(s, index);
    s[..index].chars().next_back()
}

/// The character starting at byte `index`, if any.
#[inline]
pub fn char_after(s: &str, index: usize) -> Option<char> {
    let index = ceil_char_boundary(s, index);
    s[index..].chars().next()
}

/// Whitespace as the tokenizer sees it. A missing neighbour (line start or
/// line end) counts as whitespace too.
#[inline]
pub fn is_space_or_edge(c: Option<char>) -> bool {
    c.map_or(true, char::is_whitespace)
}

/// Characters that make up a "word" for cursor expansion.
#[inline]
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '\''
}

/// The word surrounding (or touching) byte `index`, as a byte range.
///
/// Returns `None` when neither neighbour of `index` is a word character.
pub fn word_range_at(s: &str, index: usize) -> Option<(usize, usize)> {
    let index = floor_char_boundary(s, index);
    let mut start = index;
    for (i, c) in s[..index].char_indices().rev() {
        if !is_word_char(c) {
            break;
        }
        start = i;
    }
    let mut end = index;
    for (i, c) in s[index..].char_indices() {
        if !is_word_char(c) {
            break;
        }
        end = index + i + c.len_utf8();
    }
    if start == end {
        None
    } else {
        Some((start, end))
    }
}

/// Length in bytes of the run of `ch` starting at `index`.
pub fn run_len_forward(s: &str, index: usize, ch: char) -> usize {
    s[ceil_char_boundary(s, index)..]
        .chars()
        .take_while(|&c| c == ch)
        .map(char::len_utf8)
        .sum()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ─────────────────────────────────────────────────────────────────────────
    // Boundary Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_floor_norwegian() {
        let s = "Hei på deg"; // 'å' at byte 5-6 (2 bytes)
        assert_eq!(floor_char_boundary(s, 4), 4);
        assert_eq!(floor_char_boundary(s, 5), 5);
        assert_eq!(floor_char_boundary(s, 6), 5);
        assert_eq!(floor_char_boundary(s, 100), s.len());
    }

    #[test]
    fn test_ceil_emoji() {
        let s = "Hi🎉!"; // 🎉 is 4 bytes
        assert_eq!(ceil_char_boundary(s, 2), 2);
        assert_eq!(ceil_char_boundary(s, 3), 6);
        assert_eq!(ceil_char_boundary(s, 5), 6);
    }

    #[test]
    fn test_safe_slice_mid_char() {
        let s = "你好世界";
        assert_eq!(safe_slice(s, 1, 4), "你好");
        assert_eq!(safe_slice(s, 3, 2), "");
        assert_eq!(safe_slice(s, 0, 100), "你好世界");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Neighbour Tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_char_before_after() {
        let s = "a å+";
        assert_eq!(char_before(s, 0), None);
        assert_eq!(char_before(s, 1), Some('a'));
        assert_eq!(char_before(s, 4), Some('å'));
        assert_eq!(char_after(s, 4), Some('+'));
        assert_eq!(char_after(s, 5), None);
    }

    #[test]
    fn test_space_or_edge() {
        assert!(is_space_or_edge(None));
        assert!(is_space_or_edge(Some(' ')));
        assert!(is_space_or_edge(Some('\t')));
        assert!(!is_space_or_edge(Some('x')));
    }

    #[test]
    fn test_word_range_inside_word() {
        let s = "hello world";
        assert_eq!(word_range_at(s, 2), Some((0, 5)));
        assert_eq!(word_range_at(s, 5), Some((0, 5)));
        assert_eq!(word_range_at(s, 6), Some((6, 11)));
    }

    #[test]
    fn test_word_range_none_between_spaces() {
        assert_eq!(word_range_at("a  b", 2), None);
        assert_eq!(word_range_at("", 0), None);
    }

    #[test]
    fn test_word_range_multibyte() {
        let s = "på deg";
        assert_eq!(word_range_at(s, 1), Some((0, 3)));
    }

    #[test]
    fn test_run_len_forward() {
        assert_eq!(run_len_forward("++a", 0, '+'), 2);
        assert_eq!(run_len_forward("a:::", 1, ':'), 3);
        assert_eq!(run_len_forward("abc", 0, '+'), 0);
        assert_eq!(run_len_forward("ab", 9, '+'), 0);
    }

    #[test]
    fn test_mixed_content_never_panics() {
        let s = "Hello 世界! 🎉 Café naïve";
        for i in 0..=s.len() + 5 {
            let _ = char_before(s, i);
            let _ = char_after(s, i);
            let _ = word_range_at(s, i);
            let _ = safe_slice(s, 0, i);
        }
    }
}
