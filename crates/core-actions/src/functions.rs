//! Built-in editing functions.
//!
//! Names follow GNU readline so keymaps written for it read naturally.

use crate::{Function, History};
use core_text::LineBuffer;
use std::fmt;
use tracing::trace;

type Op = fn(&mut History, &mut LineBuffer);

/// A built-in function: a static name and a plain function pointer.
#[derive(Clone, Copy)]
pub struct Builtin {
    name: &'static str,
    op: Op,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin").field("name", &self.name).finish()
    }
}

impl Function for Builtin {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, history: &mut History, line: &mut LineBuffer) {
        trace!(target: "actions.function", name = self.name, cursor = line.cursor(), "apply");
        (self.op)(history, line);
    }
}

pub const BACKWARD_CHAR: Builtin = Builtin {
    name: "backward-char",
    op: backward_char,
};
pub const FORWARD_CHAR: Builtin = Builtin {
    name: "forward-char",
    op: forward_char,
};
pub const BEGINNING_OF_LINE: Builtin = Builtin {
    name: "beginning-of-line",
    op: beginning_of_line,
};
pub const END_OF_LINE: Builtin = Builtin {
    name: "end-of-line",
    op: end_of_line,
};
pub const BACKWARD_DELETE_CHAR: Builtin = Builtin {
    name: "backward-delete-char",
    op: backward_delete_char,
};
pub const DELETE_CHAR: Builtin = Builtin {
    name: "delete-char",
    op: delete_char,
};
pub const KILL_LINE: Builtin = Builtin {
    name: "kill-line",
    op: kill_line,
};
pub const UNIX_LINE_DISCARD: Builtin = Builtin {
    name: "unix-line-discard",
    op: unix_line_discard,
};
pub const PREVIOUS_HISTORY: Builtin = Builtin {
    name: "previous-history",
    op: previous_history,
};
pub const NEXT_HISTORY: Builtin = Builtin {
    name: "next-history",
    op: next_history,
};

/// Every built-in function, ready to be registered on a session.
pub fn builtin_functions() -> Vec<Builtin> {
    vec![
        BACKWARD_CHAR,
        FORWARD_CHAR,
        BEGINNING_OF_LINE,
        END_OF_LINE,
        BACKWARD_DELETE_CHAR,
        DELETE_CHAR,
        KILL_LINE,
        UNIX_LINE_DISCARD,
        PREVIOUS_HISTORY,
        NEXT_HISTORY,
    ]
}

fn backward_char(_: &mut History, line: &mut LineBuffer) {
    line.move_cursor(-1);
}

fn forward_char(_: &mut History, line: &mut LineBuffer) {
    line.move_cursor(1);
}

fn beginning_of_line(_: &mut History, line: &mut LineBuffer) {
    line.set_cursor(0);
}

fn end_of_line(_: &mut History, line: &mut LineBuffer) {
    line.set_cursor(line.len());
}

fn backward_delete_char(_: &mut History, line: &mut LineBuffer) {
    line.delete(-1);
}

fn delete_char(_: &mut History, line: &mut LineBuffer) {
    line.delete(1);
}

fn kill_line(_: &mut History, line: &mut LineBuffer) {
    line.set_size(line.cursor());
}

fn unix_line_discard(_: &mut History, line: &mut LineBuffer) {
    let cursor = line.cursor() as isize;
    line.delete(-cursor);
}

fn previous_history(history: &mut History, line: &mut LineBuffer) {
    if let Some(entry) = history.previous() {
        line.replace(entry);
    }
}

fn next_history(history: &mut History, line: &mut LineBuffer) {
    if history.position().is_none() {
        return;
    }
    match history.next() {
        Some(entry) => line.replace(entry),
        None => line.replace(&[]),
    }
}
