//! Tab-completion negotiation between a session and a completion provider.
//!
//! Status only moves forward:
//!
//! ```text
//! Pending --complete--> Inlining ----\
//!    |                               +--end--> Completed
//!    \----suggest----> Completing ---/
//! ```
//!
//! `end` is legal from every state but `Completed`, `suggest` may repeat while
//! `Completing`, `complete` only succeeds once. Transitions are compare-and-set
//! on an atomic so any thread may drive them.

use crate::error::CompletionStatus;
use crate::{Phase, ReadlineError, ReadlineResult, Shared};
use core_events::Dimension;
use core_text::{LineBuffer, Quote, QuoteState, transition};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::{debug, trace};

const PENDING: u8 = CompletionStatus::Pending.as_u8();
const INLINING: u8 = CompletionStatus::Inlining.as_u8();
const COMPLETING: u8 = CompletionStatus::Completing.as_u8();
const COMPLETED: u8 = CompletionStatus::Completed.as_u8();

/// A pending completion handed to the provider. Cheap to clone; every clone
/// drives the same negotiation.
#[derive(Clone)]
pub struct Completion {
    inner: Arc<Inner>,
}

struct Inner {
    session: Arc<Shared>,
    interaction: u64,
    line: Vec<char>,
    prefix: Vec<char>,
    prefix_state: QuoteState,
    size: Option<Dimension>,
    status: AtomicU8,
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("interaction", &self.inner.interaction)
            .field("line", &self.inner.line.iter().collect::<String>())
            .field("prefix", &self.inner.prefix.iter().collect::<String>())
            .field("status", &self.status())
            .finish()
    }
}

impl Completion {
    pub(crate) fn new(
        session: Arc<Shared>,
        interaction: u64,
        line: Vec<char>,
        prefix: Vec<char>,
        prefix_state: QuoteState,
        size: Option<Dimension>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                session,
                interaction,
                line,
                prefix,
                prefix_state,
                size,
                status: AtomicU8::new(PENDING),
            }),
        }
    }

    /// Unquoted text of the whole logical line entered so far.
    pub fn line(&self) -> &[char] {
        &self.inner.line
    }

    /// Unquoted text of the word being completed, up to the cursor.
    pub fn prefix(&self) -> &[char] {
        &self.inner.prefix
    }

    /// Terminal size when completion started, if the transport reported one.
    pub fn size(&self) -> Option<Dimension> {
        self.inner.size
    }

    pub fn status(&self) -> CompletionStatus {
        CompletionStatus::from_u8(self.inner.status.load(Ordering::Acquire))
    }

    /// Insert `text` at the cursor, quoted for the context the prefix was typed in.
    /// With `terminal` the word is closed (closing quote and a space).
    pub fn complete(&self, text: &[char], terminal: bool) -> ReadlineResult<()> {
        if let Some(&c) = text.iter().find(|c| u32::from(**c) < 32) {
            return Err(ReadlineError::UnsupportedCodePoint(c));
        }
        let inner = &*self.inner;
        let mut guard = inner.session.lock();
        let state = &mut *guard;
        inner
            .status
            .compare_exchange(PENDING, INLINING, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|current| ReadlineError::IllegalCompletionState {
                op: "complete",
                status: CompletionStatus::from_u8(current),
            })?;
        let (Some(conn), Phase::Completing(interaction)) = (state.conn.as_ref(), &mut state.phase)
        else {
            return Err(ReadlineError::StaleCompletion);
        };
        if interaction.id != inner.interaction {
            return Err(ReadlineError::StaleCompletion);
        }
        if text.is_empty() && !terminal {
            trace!(target: "readline.completion", "complete_empty");
            return Ok(());
        }
        let insertion = inline_text(inner.prefix_state, text, terminal);
        let line = interaction.line_mut();
        let before = line.clone();
        line.insert(&insertion);
        conn.write_code_points(&before.compute(line));
        debug!(
            target: "readline.completion",
            inserted = insertion.len(),
            terminal,
            "completion_inlined"
        );
        Ok(())
    }

    /// Show `text` below the line being edited. The first suggestion moves to a
    /// fresh line; `end` then redraws the prompt and the line.
    pub fn suggest(&self, text: &[char]) -> ReadlineResult<()> {
        let inner = &*self.inner;
        let guard = inner.session.lock();
        let previous = loop {
            let current = inner.status.load(Ordering::Acquire);
            if current != PENDING && current != COMPLETING {
                return Err(ReadlineError::IllegalCompletionState {
                    op: "suggest",
                    status: CompletionStatus::from_u8(current),
                });
            }
            if inner
                .status
                .compare_exchange(current, COMPLETING, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break current;
            }
        };
        let conn = match (&guard.conn, &guard.phase) {
            (Some(conn), Phase::Completing(i)) if i.id == inner.interaction => conn,
            _ => return Err(ReadlineError::StaleCompletion),
        };
        if previous == PENDING {
            conn.write("\r\n");
        }
        conn.write_code_points(text);
        trace!(target: "readline.completion", len = text.len(), "completion_suggested");
        Ok(())
    }

    /// Finish the completion and resume input delivery. Must be called exactly once.
    pub fn end(&self) -> ReadlineResult<()> {
        let inner = &*self.inner;
        let previous = loop {
            let current = inner.status.load(Ordering::Acquire);
            if current == COMPLETED {
                return Err(ReadlineError::IllegalCompletionState {
                    op: "end",
                    status: CompletionStatus::Completed,
                });
            }
            if inner
                .status
                .compare_exchange(current, COMPLETED, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break current;
            }
        };

        let resumed = {
            let mut guard = inner.session.lock();
            let state = &mut *guard;
            match std::mem::replace(&mut state.phase, Phase::Idle) {
                Phase::Completing(interaction) if interaction.id == inner.interaction => {
                    if previous == COMPLETING
                        && let Some(conn) = &state.conn
                    {
                        conn.write(interaction.current_prompt(&state.continuation_prompt));
                        conn.write_code_points(&LineBuffer::new().compute(interaction.line()));
                    }
                    state.phase = Phase::Editing(interaction);
                    true
                }
                other => {
                    state.phase = other;
                    false
                }
            }
        };
        debug!(
            target: "readline.completion",
            previous = ?CompletionStatus::from_u8(previous),
            resumed,
            "completion_ended"
        );
        if resumed {
            inner.session.schedule_pending();
        }
        Ok(())
    }
}

/// Code points to insert so that `text` reads literally in the quoting context `state`.
fn inline_text(state: QuoteState, text: &[char], terminal: bool) -> Vec<char> {
    let mut inliner = Inliner {
        state,
        out: Vec::with_capacity(text.len() + 2),
    };
    for &c in text {
        let escaped = inliner.state.escaped;
        match (inliner.state.quoting, c) {
            (Quote::Weak, '\\' | '"') => {
                if !escaped {
                    inliner.push(&['\\']);
                }
                inliner.push(&[c]);
            }
            (Quote::Weak, _) if escaped => {
                trace!(target: "readline.completion", "code_point_dropped");
            }
            (Quote::Strong, '\'') => inliner.push(&['\'', '\\', '\'', '\'']),
            (Quote::None, ' ' | '"' | '\'' | '\\') if !escaped => inliner.push(&['\\', c]),
            _ => inliner.push(&[c]),
        }
    }
    if terminal {
        match (inliner.state.quoting, inliner.state.escaped) {
            (Quote::Weak, false) => inliner.push(&['"', ' ']),
            (Quote::Strong, _) => inliner.push(&['\'', ' ']),
            (Quote::None, false) => inliner.push(&[' ']),
            _ => {}
        }
    }
    inliner.out
}

struct Inliner {
    state: QuoteState,
    out: Vec<char>,
}

impl Inliner {
    fn push(&mut self, code_points: &[char]) {
        for &c in code_points {
            self.state = transition(self.state, c).0;
            self.out.push(c);
        }
    }
}
