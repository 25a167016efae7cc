#![allow(dead_code)] // Shared across integration tests; each test binary uses a subset of helpers.

use core_actions::builtin_functions;
use core_events::Dimension;
use core_keymap::Keymap;
use core_readline::{Completion, CompletionHandler, Readline};
use core_terminal::{SizeHandler, StdinHandler, Task, TtyConnection};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// In-memory connection: records output and queues scheduled tasks until
/// the test runs them.
#[derive(Default)]
pub struct FakeConnection {
    stdin: Mutex<Option<StdinHandler>>,
    size: Mutex<Option<SizeHandler>>,
    output: Mutex<String>,
    tasks: Mutex<VecDeque<Task>>,
}

impl FakeConnection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Feed code points as if the transport decoded them from the wire.
    pub fn type_chars(&self, data: &[char]) {
        let handler = self.stdin.lock().unwrap().clone();
        if let Some(handler) = handler {
            handler(data);
        }
    }

    pub fn type_str(&self, s: &str) {
        let data: Vec<char> = s.chars().collect();
        self.type_chars(&data);
    }

    pub fn resize(&self, columns: u16, rows: u16) {
        let handler = self.size.lock().unwrap().clone();
        if let Some(handler) = handler {
            handler(Dimension::new(columns, rows));
        }
    }

    pub fn output(&self) -> String {
        self.output.lock().unwrap().clone()
    }

    /// Return and forget everything written so far.
    pub fn take_output(&self) -> String {
        std::mem::take(&mut *self.output.lock().unwrap())
    }

    pub fn scheduled(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    /// Run queued tasks (including ones they schedule) until none is left.
    pub fn run_scheduled(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = self.tasks.lock().unwrap().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }
}

impl TtyConnection for FakeConnection {
    fn stdin_handler(&self) -> Option<StdinHandler> {
        self.stdin.lock().unwrap().clone()
    }

    fn set_stdin_handler(&self, handler: Option<StdinHandler>) {
        *self.stdin.lock().unwrap() = handler;
    }

    fn size_handler(&self) -> Option<SizeHandler> {
        self.size.lock().unwrap().clone()
    }

    fn set_size_handler(&self, handler: Option<SizeHandler>) {
        *self.size.lock().unwrap() = handler;
    }

    fn write(&self, text: &str) {
        self.output.lock().unwrap().push_str(text);
    }

    fn schedule(&self, task: Task) {
        self.tasks.lock().unwrap().push_back(task);
    }
}

/// Session with the standard keymap and built-in functions, installed on a fresh connection.
pub fn session() -> (Readline, Arc<FakeConnection>) {
    let readline = Readline::new(Keymap::standard());
    readline.add_functions(builtin_functions());
    let conn = FakeConnection::new();
    readline
        .install(conn.clone())
        .expect("fresh session installs");
    (readline, conn)
}

/// Collects delivered logical lines.
#[derive(Clone, Default)]
pub struct Lines(Arc<Mutex<Vec<String>>>);

impl Lines {
    pub fn sink(&self) -> impl FnOnce(String) + Send + 'static {
        let lines = self.0.clone();
        move |line| lines.lock().unwrap().push(line)
    }

    pub fn get(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Completion provider that stashes each completion for the test to drive.
#[derive(Clone, Default)]
pub struct Stash(Arc<Mutex<Vec<Completion>>>);

impl Stash {
    pub fn handler(&self) -> CompletionHandler {
        let stash = self.0.clone();
        Arc::new(move |completion| stash.lock().unwrap().push(completion))
    }

    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn last(&self) -> Completion {
        self.0
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("a completion was requested")
    }
}

pub fn cps(s: &str) -> Vec<char> {
    s.chars().collect()
}

pub fn text(cps: &[char]) -> String {
    cps.iter().collect()
}
