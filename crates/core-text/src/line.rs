//! Cursor-addressable line of code points and its redraw diff.

use crate::width::cps_width;
use std::fmt;
use std::iter;

/// Editable sequence of code points with a cursor in `0..=len`.
///
/// Cloning produces the immutable snapshot used as the "before" side of a redraw diff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    chars: Vec<char>,
    cursor: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn get_at(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    pub fn as_slice(&self) -> &[char] {
        &self.chars
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.chars.iter().copied()
    }

    /// Insert code points at the cursor; the cursor advances past them.
    pub fn insert(&mut self, code_points: &[char]) {
        let at = self.cursor;
        self.chars.splice(at..at, code_points.iter().copied());
        self.cursor += code_points.len();
    }

    /// Truncate to `size` code points (no-op when already shorter); clamps the cursor.
    pub fn set_size(&mut self, size: usize) {
        self.chars.truncate(size);
        self.cursor = self.cursor.min(self.chars.len());
    }

    pub fn set_cursor(&mut self, position: usize) {
        self.cursor = position.min(self.chars.len());
    }

    /// Move the cursor by `delta` code points, clamped to the line. Returns the applied delta.
    pub fn move_cursor(&mut self, delta: isize) -> isize {
        let before = self.cursor;
        let target = before.saturating_add_signed(delta).min(self.chars.len());
        self.cursor = target;
        target as isize - before as isize
    }

    /// Delete `delta` code points after the cursor (positive) or before it (negative).
    /// Returns how many code points were removed.
    pub fn delete(&mut self, delta: isize) -> usize {
        let (start, end) = if delta < 0 {
            (self.cursor.saturating_sub(delta.unsigned_abs()), self.cursor)
        } else {
            (
                self.cursor,
                self.cursor.saturating_add(delta.unsigned_abs()).min(self.chars.len()),
            )
        };
        self.chars.drain(start..end);
        self.cursor = start;
        end - start
    }

    /// Replace the whole content; the cursor moves to the end.
    pub fn replace(&mut self, code_points: &[char]) {
        self.chars.clear();
        self.chars.extend_from_slice(code_points);
        self.cursor = self.chars.len();
    }

    /// Output that turns a terminal showing `self` (cursor at `self.cursor`) into one
    /// showing `target` with the cursor at `target.cursor`.
    ///
    /// Only the region from the first difference (or the old cursor when it sits
    /// before it) is rewritten; an erased tail is blanked with spaces. Cursor motion
    /// left uses `\b`, motion right rewrites the crossed code points.
    pub fn compute(&self, target: &LineBuffer) -> Vec<char> {
        let mut out = Vec::new();
        let common = self
            .chars
            .iter()
            .zip(&target.chars)
            .take_while(|(a, b)| a == b)
            .count();

        if common == self.chars.len() && common == target.chars.len() {
            if target.cursor < self.cursor {
                push_backspaces(&mut out, cps_width(&self.chars[target.cursor..self.cursor]));
            } else {
                out.extend_from_slice(&target.chars[self.cursor..target.cursor]);
            }
            return out;
        }

        let start = common.min(self.cursor);
        push_backspaces(&mut out, cps_width(&self.chars[start..self.cursor]));
        out.extend_from_slice(&target.chars[start..]);
        let old_width = cps_width(&self.chars[start..]);
        let new_width = cps_width(&target.chars[start..]);
        if old_width > new_width {
            let pad = old_width - new_width;
            out.extend(iter::repeat_n(' ', pad));
            push_backspaces(&mut out, pad);
        }
        push_backspaces(&mut out, cps_width(&target.chars[target.cursor..]));
        out
    }
}

fn push_backspaces(out: &mut Vec<char>, columns: usize) {
    out.extend(iter::repeat_n('\u{8}', columns));
}

impl From<&str> for LineBuffer {
    /// Build a buffer holding `s` with the cursor at the end.
    fn from(s: &str) -> Self {
        let chars: Vec<char> = s.chars().collect();
        let cursor = chars.len();
        Self { chars, cursor }
    }
}

impl fmt::Display for LineBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.chars.iter().try_for_each(|c| fmt::Write::write_char(f, *c))
    }
}
