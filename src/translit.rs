//! Transliteration support for non-Latin scripts.
//!
//! The avatar font only covers a handful of scripts, so characters outside
//! of it are replaced with their closest ASCII/Latin spelling before they
//! are drawn.

use deunicode::deunicode_char;

/// ASCII spelling of a single character, if one is known.
///
/// Returns `None` for characters that transliterate to nothing (e.g.
/// control characters or unmapped symbols).
pub fn ascii_fallback(c: char) -> Option<String> {
    let mapped = deunicode_char(c)?.trim();
    if mapped.is_empty() {
        None
    } else {
        Some(mapped.to_string())
    }
}
