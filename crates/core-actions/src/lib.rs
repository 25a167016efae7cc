//! Editing functions bound by name in the keymap, and the history list they operate on.
//!
//! The interaction engine resolves a function event by name and calls
//! [`Function::apply`] with the session history and the line being edited; the
//! engine redraws the line afterwards, so functions only mutate state.

use core_text::LineBuffer;

pub mod functions;
pub mod history;

pub use functions::builtin_functions;
pub use history::History;

/// A named editing function.
pub trait Function: Send + Sync {
    /// Name used by keymap bindings (readline style, e.g. `backward-char`).
    fn name(&self) -> &str;

    fn apply(&self, history: &mut History, line: &mut LineBuffer);
}
