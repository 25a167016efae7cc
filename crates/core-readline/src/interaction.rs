//! One line request: editing state from the prompt until a logical line is submitted.

use crate::{CompletionHandler, LineHandler};
use core_actions::{Function, History};
use core_events::{Event, FunctionEvent, KeyEvent, keys};
use core_terminal::TtyConnection;
use core_text::{LineBuffer, QuoteState, QuoteTracker};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Submit,
    Complete,
}

/// Keys handled by the interaction itself rather than inserted.
const KEY_ACTIONS: &[(char, Action)] = &[
    (keys::CTRL_M, Action::Submit),
    (keys::CTRL_I, Action::Complete),
];

fn action_for(key: &KeyEvent) -> Option<Action> {
    match key.code_points() {
        [c] => KEY_ACTIONS
            .iter()
            .find(|(k, _)| k == c)
            .map(|(_, action)| *action),
        _ => None,
    }
}

/// Session resources an interaction needs while handling one event.
pub(crate) struct Context<'a> {
    pub conn: &'a dyn TtyConnection,
    pub history: &'a mut History,
    pub functions: &'a HashMap<String, Arc<dyn Function>>,
    pub continuation_prompt: &'a str,
}

/// What the session must do once the event is handled.
pub(crate) enum Outcome {
    Continue,
    /// The logical line is complete; the interaction is finished.
    Submit(String),
    /// Start a completion with this handler.
    Complete(CompletionHandler, CompletionRequest),
}

/// Snapshot a completion is built from.
#[derive(Debug, Clone)]
pub(crate) struct CompletionRequest {
    pub line: Vec<char>,
    pub prefix: Vec<char>,
    pub prefix_state: QuoteState,
}

pub(crate) struct Interaction {
    pub id: u64,
    prompt: String,
    on_line: Option<LineHandler>,
    on_complete: Option<CompletionHandler>,
    /// Raw physical lines already entered for this logical line.
    lines: Vec<String>,
    line: LineBuffer,
    /// Cumulative quote state over every stored physical line.
    tracker: QuoteTracker,
}

impl Interaction {
    pub fn new(
        id: u64,
        prompt: String,
        on_line: LineHandler,
        on_complete: Option<CompletionHandler>,
    ) -> Self {
        Self {
            id,
            prompt,
            on_line: Some(on_line),
            on_complete,
            lines: Vec::new(),
            line: LineBuffer::new(),
            tracker: QuoteTracker::new(),
        }
    }

    pub fn line(&self) -> &LineBuffer {
        &self.line
    }

    pub fn line_mut(&mut self) -> &mut LineBuffer {
        &mut self.line
    }

    /// Prompt shown in front of the physical line being edited.
    pub fn current_prompt<'a>(&'a self, continuation: &'a str) -> &'a str {
        if self.lines.is_empty() {
            &self.prompt
        } else {
            continuation
        }
    }

    pub fn take_line_handler(&mut self) -> Option<LineHandler> {
        self.on_line.take()
    }

    pub fn handle(&mut self, event: Event, cx: &mut Context<'_>) -> Outcome {
        match event {
            Event::Key(key) => match action_for(&key) {
                Some(Action::Submit) => self.submit(cx),
                Some(Action::Complete) => self.complete(),
                None => {
                    let before = self.line.clone();
                    self.line.insert(key.code_points());
                    cx.conn.write_code_points(&before.compute(&self.line));
                    Outcome::Continue
                }
            },
            Event::Function(function) => {
                self.apply(&function, cx);
                Outcome::Continue
            }
        }
    }

    fn apply(&mut self, event: &FunctionEvent, cx: &mut Context<'_>) {
        let before = self.line.clone();
        match cx.functions.get(event.name()) {
            Some(function) => function.apply(cx.history, &mut self.line),
            None => {
                warn!(target: "readline.interaction", name = event.name(), "unimplemented_function");
            }
        }
        cx.conn.write_code_points(&before.compute(&self.line));
    }

    fn submit(&mut self, cx: &mut Context<'_>) -> Outcome {
        let raw: String = self.line.iter().collect();
        self.tracker.accept_all(self.line.iter());
        self.line = LineBuffer::new();
        self.lines.push(raw);
        if self.tracker.is_pending() {
            self.tracker.accept('\n');
            debug!(
                target: "readline.interaction",
                lines = self.lines.len(),
                quoting = ?self.tracker.quoting(),
                "line_continued"
            );
            cx.conn.write("\r\n");
            cx.conn.write(cx.continuation_prompt);
            return Outcome::Continue;
        }
        let logical = self.lines.join("\n");
        debug!(
            target: "readline.interaction",
            lines = self.lines.len(),
            len = logical.chars().count(),
            "line_submitted"
        );
        self.lines.clear();
        self.tracker.clear();
        cx.conn.write("\r\n");
        Outcome::Submit(logical)
    }

    fn complete(&self) -> Outcome {
        let Some(handler) = self.on_complete.clone() else {
            trace!(target: "readline.interaction", "completion_unavailable");
            return Outcome::Continue;
        };
        let cursor = self.line.cursor();
        let chars = self.line.as_slice();
        let start = chars[..cursor]
            .iter()
            .rposition(|c| *c == ' ')
            .map_or(0, |i| i + 1);

        let mut prefix = QuoteTracker::new();
        prefix.accept_all(chars[start..cursor].iter().copied());

        let mut full = self.tracker.clone();
        full.accept_all(self.line.iter());

        Outcome::Complete(
            handler,
            CompletionRequest {
                line: full.output().to_vec(),
                prefix: prefix.output().to_vec(),
                prefix_state: prefix.state(),
            },
        )
    }
}
