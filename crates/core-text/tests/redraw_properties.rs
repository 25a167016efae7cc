//! Property-based tests for LineBuffer redraw diffs.
//!
//! A tiny single-row terminal model replays the diff output: printable code
//! points overwrite the cell under the cursor and advance it, `\b` steps one
//! column left. ASCII only so every code point is one column wide.

use core_text::LineBuffer;
use proptest::prelude::*;

struct Screen {
    cells: Vec<char>,
    col: usize,
}

impl Screen {
    fn showing(line: &LineBuffer) -> Self {
        Self {
            cells: line.iter().collect(),
            col: line.cursor(),
        }
    }

    fn apply(&mut self, out: &[char]) {
        for &c in out {
            if c == '\u{8}' {
                self.col = self.col.saturating_sub(1);
            } else {
                if self.col == self.cells.len() {
                    self.cells.push(c);
                } else {
                    self.cells[self.col] = c;
                }
                self.col += 1;
            }
        }
    }
}

fn line(text: String, cursor: usize) -> LineBuffer {
    let mut b = LineBuffer::from(text.as_str());
    b.set_cursor(cursor);
    b
}

proptest! {
    // Replaying the diff over the old rendering shows the new line and cursor.
    #[test]
    fn diff_replays_to_target(
        old in "[a-z ]{0,12}", old_cur in 0usize..13,
        new in "[a-z ]{0,12}", new_cur in 0usize..13,
    ) {
        let old = line(old, old_cur);
        let new = line(new, new_cur);
        let mut screen = Screen::showing(&old);
        screen.apply(&old.compute(&new));
        let shown: String = screen.cells[..new.len()].iter().collect();
        prop_assert_eq!(shown, new.to_string());
        prop_assert!(screen.cells[new.len()..].iter().all(|c| *c == ' '));
        prop_assert_eq!(screen.col, new.cursor());
    }

    // Computing a diff twice against an unchanged state yields nothing both times.
    #[test]
    fn unchanged_state_is_idempotent(text in "[a-z ]{0,16}", cur in 0usize..17) {
        let b = line(text, cur);
        let snapshot = b.clone();
        prop_assert!(snapshot.compute(&b).is_empty());
        prop_assert!(snapshot.compute(&b).is_empty());
    }

    // Rewriting never starts before the common prefix or the old cursor.
    #[test]
    fn diff_never_backs_up_past_common_prefix(
        prefix in "[a-z]{0,8}", old_tail in "[a-z]{0,6}", new_tail in "[a-z]{0,6}",
    ) {
        let old = LineBuffer::from(format!("{prefix}{old_tail}").as_str());
        let new = LineBuffer::from(format!("{prefix}{new_tail}").as_str());
        let out = old.compute(&new);
        let leading_backspaces = out.iter().take_while(|c| **c == '\u{8}').count();
        prop_assert!(leading_backspaces <= old_tail.chars().count());
    }
}
