//! Core event types shared by the decoder, the interaction engine and transports.
//!
//! A decoded unit of terminal input is either a key event carrying the code points
//! that make up the key, or a function event naming an editing function bound in
//! the keymap. Both are immutable once produced by the decoder.

use smallvec::SmallVec;
use std::fmt;

/// Well-known key code points used as lookup keys by the interaction engine.
pub mod keys {
    /// Carriage return, produced by the Enter key.
    pub const CTRL_M: char = '\r';
    /// Horizontal tab, produced by the Tab key.
    pub const CTRL_I: char = '\t';
    pub const CTRL_A: char = '\u{1}';
    pub const CTRL_B: char = '\u{2}';
    pub const CTRL_D: char = '\u{4}';
    pub const CTRL_E: char = '\u{5}';
    pub const CTRL_F: char = '\u{6}';
    pub const CTRL_H: char = '\u{8}';
    pub const CTRL_K: char = '\u{b}';
    pub const CTRL_U: char = '\u{15}';
    pub const ESC: char = '\u{1b}';
    pub const DEL: char = '\u{7f}';
}

/// Top-level decoded input unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Event {
    Key(KeyEvent),
    Function(FunctionEvent),
}

impl Event {
    pub fn key(code_points: &[char]) -> Self {
        Event::Key(KeyEvent::new(code_points))
    }

    pub fn function(name: impl Into<String>) -> Self {
        Event::Function(FunctionEvent::new(name))
    }
}

/// A key press expressed as the code points it stands for.
///
/// Most keys are a single code point; bound multi code point sequences keep the
/// sequence the keymap associated with them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    code_points: SmallVec<[char; 4]>,
}

impl KeyEvent {
    pub fn new(code_points: &[char]) -> Self {
        Self {
            code_points: SmallVec::from_slice(code_points),
        }
    }

    pub fn code_points(&self) -> &[char] {
        &self.code_points
    }

    pub fn len(&self) -> usize {
        self.code_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code_points.is_empty()
    }

    pub fn get_at(&self, index: usize) -> Option<char> {
        self.code_points.get(index).copied()
    }
}

/// A named editing function resolved against the session's function table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionEvent {
    name: String,
}

impl FunctionEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Terminal size in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimension {
    pub columns: u16,
    pub rows: u16,
}

impl Dimension {
    pub const fn new(columns: u16, rows: u16) -> Self {
        Self { columns, rows }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.columns, self.rows)
    }
}

impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key{:?}", self.code_points.as_slice())
    }
}
