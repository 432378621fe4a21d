//! # Fuzzy Search Patterns
//!
//! Turns user text into a `LIKE` pattern that matches it literally as a
//! substring.
//!
//! ```text
//! user input      escaped            bound pattern
//! ──────────      ───────            ─────────────
//! 50%             50\%               %50\%%
//! A_1             A\_1               %A\_1%
//! C:\tmp          C:\\tmp            %C:\\tmp%
//! ```
//!
//! The SQL side always pairs the bound pattern with
//! `ESCAPE '\'` ([`LIKE_ESCAPE_CHAR`]).

/// Escape character used by every fuzzy predicate.
pub const LIKE_ESCAPE_CHAR: char = '\\';

/// Escapes `%`, `_` and the escape character itself.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len() + 4);
    for ch in input.chars() {
        if ch == '%' || ch == '_' || ch == LIKE_ESCAPE_CHAR {
            escaped.push(LIKE_ESCAPE_CHAR);
        }
        escaped.push(ch);
    }
    escaped
}

/// Builds a `%input%` pattern, or `None` when the input is blank.
///
/// ## Example
/// ```rust
/// use tally_core::search::fuzzy_pattern;
///
/// assert_eq!(fuzzy_pattern(" 50% "), Some("%50\\%%".to_string()));
/// assert_eq!(fuzzy_pattern("   "), None);
/// ```
pub fn fuzzy_pattern(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(format!("%{}%", escape_like(trimmed)))
}
