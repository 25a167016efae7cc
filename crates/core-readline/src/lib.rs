//! core-readline: per-session line editing on top of a [`TtyConnection`].
//!
//! A [`Readline`] installs itself as the connection's input and size handler,
//! decodes input into events and feeds them to the live interaction. An
//! interaction lasts from `request` until a logical line (possibly spanning
//! several physical lines while a quote is open) is handed to the caller.
//!
//! Locking: all session state sits behind one mutex. Handlers decide what to do
//! under the lock and run user callbacks (line handler, completion provider,
//! default read handler) after releasing it, so callbacks may call back into
//! the session. Writes to the connection happen under the lock.

use core_actions::{Function, History};
use core_events::Dimension;
use core_keymap::{KeyDecoder, Keymap};
use core_terminal::{SizeHandler, StdinHandler, TtyConnection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, info, trace};

mod completion;
mod error;
mod interaction;

pub use completion::Completion;
pub use error::{CompletionStatus, ReadlineError, ReadlineResult};

use interaction::{Context, Interaction, Outcome};

/// Receives the logical line once it is complete.
pub type LineHandler = Box<dyn FnOnce(String) + Send>;

/// Completion provider, invoked once per Tab press.
pub type CompletionHandler = Arc<dyn Fn(Completion) + Send + Sync>;

/// Receives raw input while no line is requested.
pub type ReadHandler = Arc<dyn Fn(Vec<char>) + Send + Sync>;

pub const DEFAULT_CONTINUATION_PROMPT: &str = "> ";

// -------------------------------------------------------------------------------------------------
// Session state
// -------------------------------------------------------------------------------------------------
pub(crate) enum Phase {
    Idle,
    Editing(Box<Interaction>),
    /// A completion provider owns the interaction; input stays queued.
    Completing(Box<Interaction>),
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Editing(_) => "editing",
            Phase::Completing(_) => "completing",
        }
    }
}

pub(crate) struct State {
    pub(crate) conn: Option<Arc<dyn TtyConnection>>,
    pub(crate) phase: Phase,
    pub(crate) continuation_prompt: String,
    decoder: KeyDecoder,
    functions: HashMap<String, Arc<dyn Function>>,
    history: History,
    size: Option<Dimension>,
    next_interaction: u64,
    saved_stdin: Option<StdinHandler>,
    saved_size: Option<SizeHandler>,
    read_handler: Option<ReadHandler>,
    size_handler: Option<SizeHandler>,
}

pub(crate) struct Shared {
    state: Mutex<State>,
}

impl Shared {
    pub(crate) fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn schedule_pending(self: &Arc<Self>) {
        let conn = {
            let state = self.lock();
            if !state.decoder.has_next() {
                return;
            }
            state.conn.clone()
        };
        if let Some(conn) = conn {
            trace!(target: "readline.session", "deliver_scheduled");
            let session = Arc::clone(self);
            conn.schedule(Box::new(move || Readline { shared: session }.deliver()));
        }
    }
}

/// Result of one delivery step taken under the lock.
enum Step {
    Stop,
    Handled,
    /// Run this once the lock is released.
    Run(Effect),
}

/// Work left over once the lock is released.
enum Effect {
    Line(LineHandler, String),
    Complete(CompletionHandler, Completion),
    Read(ReadHandler, Vec<char>),
}

impl Effect {
    fn run(self) {
        match self {
            Effect::Line(handler, line) => handler(line),
            Effect::Complete(handler, completion) => handler(completion),
            Effect::Read(handler, data) => handler(data),
        }
    }
}

// -------------------------------------------------------------------------------------------------
// Readline
// -------------------------------------------------------------------------------------------------
/// Line editing session bound to at most one connection. Cloning yields
/// another handle to the same session.
///
/// A pending line handler that owns a handle keeps the session alive after
/// every other handle is dropped. [`Readline::uninstall`] drops the pending
/// request and releases it.
#[derive(Clone)]
pub struct Readline {
    shared: Arc<Shared>,
}

impl Readline {
    pub fn new(keymap: Keymap) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    conn: None,
                    phase: Phase::Idle,
                    continuation_prompt: DEFAULT_CONTINUATION_PROMPT.to_string(),
                    decoder: KeyDecoder::new(&keymap),
                    functions: HashMap::new(),
                    history: History::new(),
                    size: None,
                    next_interaction: 0,
                    saved_stdin: None,
                    saved_size: None,
                    read_handler: None,
                    size_handler: None,
                }),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.shared.lock()
    }

    /// Register an editing function under its own name, replacing any previous one.
    pub fn add_function<F: Function + 'static>(&self, function: F) -> &Self {
        let function: Arc<dyn Function> = Arc::new(function);
        let name = function.name().to_string();
        trace!(target: "readline.session", name = %name, "function_added");
        self.lock().functions.insert(name, function);
        self
    }

    pub fn add_functions<F, I>(&self, functions: I) -> &Self
    where
        F: Function + 'static,
        I: IntoIterator<Item = F>,
    {
        for function in functions {
            self.add_function(function);
        }
        self
    }

    /// Last size reported by the connection.
    pub fn size(&self) -> Option<Dimension> {
        self.lock().size
    }

    pub fn is_installed(&self) -> bool {
        self.lock().conn.is_some()
    }

    /// True while a line request is live.
    pub fn is_reading(&self) -> bool {
        !matches!(self.lock().phase, Phase::Idle)
    }

    pub fn set_continuation_prompt(&self, prompt: impl Into<String>) -> &Self {
        self.lock().continuation_prompt = prompt.into();
        self
    }

    /// Run `f` on the history passed to editing functions.
    ///
    /// `f` runs under the session lock: calling back into this session from
    /// `f` deadlocks. Line and completion callbacks run unlocked and may call it.
    pub fn with_history<R>(&self, f: impl FnOnce(&mut History) -> R) -> R {
        f(&mut self.lock().history)
    }

    pub fn read_handler(&self) -> Option<ReadHandler> {
        self.lock().read_handler.clone()
    }

    /// Handler receiving buffered input while no line is requested.
    pub fn set_read_handler(&self, handler: Option<ReadHandler>) -> &Self {
        self.lock().read_handler = handler;
        self
    }

    pub fn size_handler(&self) -> Option<SizeHandler> {
        self.lock().size_handler.clone()
    }

    /// Handler notified after the session records a size change.
    pub fn set_size_handler(&self, handler: Option<SizeHandler>) -> &Self {
        self.lock().size_handler = handler;
        self
    }

    /// Take over `conn`'s input and size handlers. The previous handlers are
    /// restored by [`Readline::uninstall`].
    pub fn install(&self, conn: Arc<dyn TtyConnection>) -> ReadlineResult<()> {
        let mut state = self.lock();
        if state.conn.is_some() {
            return Err(ReadlineError::AlreadyInstalled);
        }
        state.saved_stdin = conn.stdin_handler();
        state.saved_size = conn.size_handler();

        let weak = Arc::downgrade(&self.shared);
        conn.set_stdin_handler(Some(Arc::new(move |data: &[char]| {
            if let Some(session) = upgrade(&weak) {
                session.on_input(data);
            }
        })));
        let weak = Arc::downgrade(&self.shared);
        conn.set_size_handler(Some(Arc::new(move |size: Dimension| {
            if let Some(session) = upgrade(&weak) {
                session.on_size(size);
            }
        })));

        state.conn = Some(conn);
        info!(target: "readline.session", "installed");
        Ok(())
    }

    /// Restore the connection's previous handlers and detach. A live request is dropped.
    pub fn uninstall(&self) -> ReadlineResult<()> {
        let mut state = self.lock();
        let Some(conn) = state.conn.take() else {
            return Err(ReadlineError::NotInstalled);
        };
        conn.set_stdin_handler(state.saved_stdin.take());
        conn.set_size_handler(state.saved_size.take());
        let dropped = std::mem::replace(&mut state.phase, Phase::Idle);
        info!(target: "readline.session", dropped = dropped.name(), "uninstalled");
        Ok(())
    }

    /// Read a line without completion support.
    pub fn readline<F>(&self, prompt: &str, on_line: F) -> ReadlineResult<()>
    where
        F: FnOnce(String) + Send + 'static,
    {
        self.request(prompt, on_line, None)
    }

    /// Write `prompt` and start editing a line. `on_line` receives the logical
    /// line; `on_complete`, when set, is called on Tab.
    pub fn request<F>(
        &self,
        prompt: &str,
        on_line: F,
        on_complete: Option<CompletionHandler>,
    ) -> ReadlineResult<()>
    where
        F: FnOnce(String) + Send + 'static,
    {
        {
            let mut guard = self.lock();
            let state = &mut *guard;
            let Some(conn) = &state.conn else {
                return Err(ReadlineError::NotInstalled);
            };
            if !matches!(state.phase, Phase::Idle) {
                debug!(target: "readline.session", phase = state.phase.name(), "request_rejected");
                return Err(ReadlineError::AlreadyReading);
            }
            let id = state.next_interaction;
            state.next_interaction += 1;
            state.phase = Phase::Editing(Box::new(Interaction::new(
                id,
                prompt.to_string(),
                Box::new(on_line),
                on_complete,
            )));
            conn.write(prompt);
            debug!(target: "readline.session", interaction = id, "request_started");
        }
        self.schedule_pending();
        Ok(())
    }

    /// Schedule a `deliver` through the connection if decoded input is waiting.
    pub fn schedule_pending(&self) {
        self.shared.schedule_pending();
    }

    /// Drain buffered input: events go to the live interaction until it
    /// completes a line or starts a completion; with no interaction, raw input
    /// goes to the read handler if one is set.
    pub fn deliver(&self) {
        loop {
            let step = self.step(&mut self.lock());
            match step {
                Step::Stop => return,
                Step::Handled => {}
                Step::Run(effect) => effect.run(),
            }
        }
    }

    fn step(&self, state: &mut State) -> Step {
        if !state.decoder.has_next() {
            return Step::Stop;
        }
        match &state.phase {
            Phase::Completing(_) => return Step::Stop,
            Phase::Idle => {
                let Some(handler) = state.read_handler.clone() else {
                    return Step::Stop;
                };
                let data = state.decoder.clear();
                trace!(target: "readline.session", len = data.len(), "raw_input_forwarded");
                return Step::Run(Effect::Read(handler, data));
            }
            Phase::Editing(_) => {}
        }
        let (Some(conn), Some(event)) = (state.conn.clone(), state.decoder.next()) else {
            return Step::Stop;
        };
        let Phase::Editing(interaction) = &mut state.phase else {
            return Step::Stop;
        };
        let mut cx = Context {
            conn: conn.as_ref(),
            history: &mut state.history,
            functions: &state.functions,
            continuation_prompt: &state.continuation_prompt,
        };
        match interaction.handle(event, &mut cx) {
            Outcome::Continue => Step::Handled,
            Outcome::Submit(line) => {
                let Phase::Editing(mut interaction) = std::mem::replace(&mut state.phase, Phase::Idle)
                else {
                    return Step::Stop;
                };
                match interaction.take_line_handler() {
                    Some(handler) => Step::Run(Effect::Line(handler, line)),
                    None => Step::Handled,
                }
            }
            Outcome::Complete(handler, request) => {
                let Phase::Editing(interaction) = std::mem::replace(&mut state.phase, Phase::Idle)
                else {
                    return Step::Stop;
                };
                let completion = Completion::new(
                    Arc::clone(&self.shared),
                    interaction.id,
                    request.line,
                    request.prefix,
                    request.prefix_state,
                    state.size,
                );
                debug!(target: "readline.completion", interaction = interaction.id, "completion_started");
                state.phase = Phase::Completing(interaction);
                Step::Run(Effect::Complete(handler, completion))
            }
        }
    }

    fn on_input(&self, data: &[char]) {
        self.lock().decoder.append(data);
        self.deliver();
    }

    fn on_size(&self, size: Dimension) {
        let handler = {
            let mut state = self.lock();
            state.size = Some(size);
            state.size_handler.clone()
        };
        trace!(target: "readline.session", size = %size, "size_changed");
        if let Some(handler) = handler {
            handler(size);
        }
    }
}

fn upgrade(weak: &Weak<Shared>) -> Option<Readline> {
    weak.upgrade().map(|shared| Readline { shared })
}
