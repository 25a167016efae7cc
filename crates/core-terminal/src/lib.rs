//! Transport abstraction and the crossterm raw-mode backend.

use anyhow::Result;
use core_events::Dimension;
use crossterm::terminal::{self, disable_raw_mode, enable_raw_mode};

pub mod connection;
pub use connection::{SizeHandler, StdinHandler, Task, TtyConnection};

pub trait TerminalBackend {
    fn enter(&mut self) -> Result<()>;
    fn leave(&mut self) -> Result<()>;
}

/// Local terminal switched to raw mode so every key press reaches the decoder
/// unbuffered and unechoed. The line editor does its own echo.
pub struct CrosstermBackend {
    entered: bool,
}

/// RAII guard ensuring terminal state restoration even if caller early-returns or panics.
pub struct TerminalGuard<'a> {
    backend: &'a mut CrosstermBackend,
    active: bool,
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosstermBackend {
    pub fn new() -> Self {
        Self { entered: false }
    }

    /// Enter and return a guard that will leave on drop.
    pub fn enter_guard(&mut self) -> Result<TerminalGuard<'_>> {
        self.enter()?;
        Ok(TerminalGuard {
            backend: self,
            active: true,
        })
    }

    pub fn is_entered(&self) -> bool {
        self.entered
    }
}

impl TerminalBackend for CrosstermBackend {
    fn enter(&mut self) -> Result<()> {
        if !self.entered {
            enable_raw_mode()?;
            self.entered = true;
        }
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        if self.entered {
            disable_raw_mode()?;
            self.entered = false;
        }
        Ok(())
    }
}

impl Drop for CrosstermBackend {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

impl Drop for TerminalGuard<'_> {
    fn drop(&mut self) {
        if self.active {
            let _ = self.backend.leave();
        }
    }
}

/// Current size of the local terminal.
pub fn terminal_size() -> Result<Dimension> {
    let (columns, rows) = terminal::size()?;
    Ok(Dimension::new(columns, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        written: Mutex<String>,
    }

    impl TtyConnection for Recorder {
        fn stdin_handler(&self) -> Option<StdinHandler> {
            None
        }
        fn set_stdin_handler(&self, _: Option<StdinHandler>) {}
        fn size_handler(&self) -> Option<SizeHandler> {
            None
        }
        fn set_size_handler(&self, _: Option<SizeHandler>) {}
        fn write(&self, text: &str) {
            self.written.lock().unwrap().push_str(text);
        }
        fn schedule(&self, task: Task) {
            task();
        }
    }

    #[test]
    fn write_code_points_forwards_text() {
        let conn = Recorder::default();
        conn.write_code_points(&['h', 'é', '\u{8}']);
        conn.write_code_points(&[]);
        assert_eq!(*conn.written.lock().unwrap(), "hé\u{8}");
    }

    #[test]
    fn backend_starts_outside_raw_mode() {
        let backend = CrosstermBackend::new();
        assert!(!backend.is_entered());
    }
}
