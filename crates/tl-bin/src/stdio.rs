//! Local terminal transport: stdin reader thread, size watcher and a
//! single-threaded dispatch queue.

use core_events::Dimension;
use core_terminal::{SizeHandler, StdinHandler, Task, TtyConnection, terminal_size};
use crossbeam_channel::{Receiver, Sender};
use std::io::{self, Read, Write};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::{debug, trace, warn};

const CTRL_C: u8 = 0x03;
const RESIZE_POLL: Duration = Duration::from_millis(250);

/// Everything the main loop dispatches, in arrival order.
pub enum Message {
    Input(Vec<char>),
    Resize(Dimension),
    Task(Task),
    Quit,
}

pub struct StdioConnection {
    stdin: Mutex<Option<StdinHandler>>,
    size: Mutex<Option<SizeHandler>>,
    out: Mutex<io::Stdout>,
    queue: Sender<Message>,
}

impl StdioConnection {
    pub fn new(queue: Sender<Message>) -> Self {
        Self {
            stdin: Mutex::new(None),
            size: Mutex::new(None),
            out: Mutex::new(io::stdout()),
            queue,
        }
    }

    /// Run the dispatch loop on the calling thread until `Quit` or until every sender is gone.
    pub fn run(&self, messages: &Receiver<Message>) {
        for message in messages {
            match message {
                Message::Input(data) => {
                    let handler = self.stdin_handler();
                    match handler {
                        Some(handler) => handler(&data),
                        None => trace!(target: "runtime.tty", len = data.len(), "input_dropped"),
                    }
                }
                Message::Resize(size) => {
                    if let Some(handler) = self.size_handler() {
                        handler(size);
                    }
                }
                Message::Task(task) => task(),
                Message::Quit => {
                    debug!(target: "runtime.tty", "quit");
                    return;
                }
            }
        }
    }
}

impl TtyConnection for StdioConnection {
    fn stdin_handler(&self) -> Option<StdinHandler> {
        self.stdin
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_stdin_handler(&self, handler: Option<StdinHandler>) {
        *self.stdin.lock().unwrap_or_else(PoisonError::into_inner) = handler;
    }

    fn size_handler(&self) -> Option<SizeHandler> {
        self.size
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_size_handler(&self, handler: Option<SizeHandler>) {
        *self.size.lock().unwrap_or_else(PoisonError::into_inner) = handler;
    }

    fn write(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|()| out.flush()) {
            warn!(target: "runtime.tty", error = %e, "write_failed");
        }
    }

    fn schedule(&self, task: Task) {
        if self.queue.send(Message::Task(task)).is_err() {
            trace!(target: "runtime.tty", "schedule_after_shutdown");
        }
    }
}

/// Incremental UTF-8 decoding of a byte stream split at arbitrary points.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn decode(&mut self, bytes: &[u8]) -> Vec<char> {
        self.pending.extend_from_slice(bytes);
        let mut out = Vec::with_capacity(self.pending.len());
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(s) => {
                    out.extend(s.chars());
                    self.pending.clear();
                    return out;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.extend(String::from_utf8_lossy(&self.pending[..valid]).chars());
                    match e.error_len() {
                        Some(invalid) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + invalid);
                        }
                        // Incomplete sequence at the end: wait for the rest.
                        None => {
                            self.pending.drain(..valid);
                            return out;
                        }
                    }
                }
            }
        }
    }
}

/// Read raw stdin bytes on a dedicated thread. Ctrl-C ends the session.
pub fn spawn_stdin_reader(queue: Sender<Message>) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            let mut stdin = io::stdin().lock();
            let mut decoder = Utf8Decoder::default();
            let mut buf = [0u8; 1024];
            loop {
                let n = match stdin.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        warn!(target: "runtime.tty", error = %e, "stdin_read_failed");
                        break;
                    }
                };
                let bytes = &buf[..n];
                if bytes.contains(&CTRL_C) {
                    debug!(target: "runtime.tty", "interrupt");
                    break;
                }
                let data = decoder.decode(bytes);
                if !data.is_empty() && queue.send(Message::Input(data)).is_err() {
                    return;
                }
            }
            let _ = queue.send(Message::Quit);
        })
}

/// Poll the terminal size and report changes.
pub fn spawn_resize_watcher(
    queue: Sender<Message>,
    initial: Option<Dimension>,
) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("resize-watcher".into())
        .spawn(move || {
            let mut last = initial;
            loop {
                thread::sleep(RESIZE_POLL);
                let Ok(size) = terminal_size() else {
                    continue;
                };
                if last != Some(size) {
                    last = Some(size);
                    if queue.send(Message::Resize(size)).is_err() {
                        return;
                    }
                }
            }
        })
}
