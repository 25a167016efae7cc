//! Streaming shell-style quote and escape tracking.
//!
//! | Mode   | `\`                                   | quote char                  | other |
//! |--------|---------------------------------------|-----------------------------|-------|
//! | None   | escapes the next code point           | `"` -> Weak, `'` -> Strong  | emit  |
//! | Weak   | escapes only `\` and `"`              | `"` -> None                 | emit  |
//! | Strong | literal                               | `'` -> None                 | emit  |
//!
//! An escaped line feed is a line continuation and emits nothing.

/// Quoting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Quote {
    #[default]
    None,
    /// Inside double quotes.
    Weak,
    /// Inside single quotes.
    Strong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct QuoteState {
    pub quoting: Quote,
    /// A backslash is waiting for the code point it escapes.
    pub escaped: bool,
}

/// Code points produced by one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    Nothing,
    One(char),
    Two(char, char),
}

impl Emit {
    fn push_into(self, out: &mut Vec<char>) {
        match self {
            Emit::Nothing => {}
            Emit::One(c) => out.push(c),
            Emit::Two(a, b) => {
                out.push(a);
                out.push(b);
            }
        }
    }
}

/// Pure transition: consume `c` in `state`.
pub fn transition(state: QuoteState, c: char) -> (QuoteState, Emit) {
    let unescaped = |quoting| QuoteState {
        quoting,
        escaped: false,
    };
    match state.quoting {
        Quote::None if state.escaped => {
            let emit = if c == '\n' { Emit::Nothing } else { Emit::One(c) };
            (unescaped(Quote::None), emit)
        }
        Quote::None => match c {
            '\\' => (
                QuoteState {
                    quoting: Quote::None,
                    escaped: true,
                },
                Emit::Nothing,
            ),
            '"' => (unescaped(Quote::Weak), Emit::Nothing),
            '\'' => (unescaped(Quote::Strong), Emit::Nothing),
            _ => (state, Emit::One(c)),
        },
        Quote::Weak if state.escaped => {
            let emit = match c {
                '\\' | '"' => Emit::One(c),
                '\n' => Emit::Nothing,
                _ => Emit::Two('\\', c),
            };
            (unescaped(Quote::Weak), emit)
        }
        Quote::Weak => match c {
            '\\' => (
                QuoteState {
                    quoting: Quote::Weak,
                    escaped: true,
                },
                Emit::Nothing,
            ),
            '"' => (unescaped(Quote::None), Emit::Nothing),
            _ => (state, Emit::One(c)),
        },
        Quote::Strong => match c {
            '\'' => (unescaped(Quote::None), Emit::Nothing),
            _ => (state, Emit::One(c)),
        },
    }
}

/// Accumulates the unquoted output of a code point stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteTracker {
    state: QuoteState,
    output: Vec<char>,
}

impl QuoteTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, c: char) {
        let (next, emit) = transition(self.state, c);
        self.state = next;
        emit.push_into(&mut self.output);
    }

    pub fn accept_all(&mut self, code_points: impl IntoIterator<Item = char>) {
        for c in code_points {
            self.accept(c);
        }
    }

    pub fn state(&self) -> QuoteState {
        self.state
    }

    pub fn quoting(&self) -> Quote {
        self.state.quoting
    }

    pub fn is_escaped(&self) -> bool {
        self.state.escaped
    }

    /// True while the input so far cannot end a logical line (open quote or pending escape).
    pub fn is_pending(&self) -> bool {
        self.state.quoting != Quote::None || self.state.escaped
    }

    pub fn output(&self) -> &[char] {
        &self.output
    }

    /// Reset both the output and the quoting state.
    pub fn clear(&mut self) {
        self.state = QuoteState::default();
        self.output.clear();
    }

    /// Shell-style quote removal of a whole string.
    pub fn unquote(s: &str) -> String {
        let mut t = Self::new();
        t.accept_all(s.chars());
        t.output.iter().collect()
    }
}
