//! Column width of code points as rendered by the terminal.
//!
//! Redraw diffs move the cursor with `\b`, which steps one column, so every
//! cursor computation goes through these helpers rather than counting code points.

use unicode_width::UnicodeWidthChar;

/// Columns occupied by one code point. Control and zero-width code points occupy none.
pub fn cp_width(c: char) -> usize {
    c.width().unwrap_or(0)
}

/// Columns occupied by a run of code points.
pub fn cps_width(cps: &[char]) -> usize {
    cps.iter().map(|c| cp_width(*c)).sum()
}
