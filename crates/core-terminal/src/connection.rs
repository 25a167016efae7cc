//! The transport seen by a line-editing session.

use core_events::Dimension;
use std::sync::Arc;

/// Receives decoded input code points from the transport.
pub type StdinHandler = Arc<dyn Fn(&[char]) + Send + Sync>;

/// Receives terminal size changes.
pub type SizeHandler = Arc<dyn Fn(Dimension) + Send + Sync>;

/// Unit of work run later on the transport's own execution context.
pub type Task = Box<dyn FnOnce() + Send>;

/// A character-oriented terminal connection (local tty, telnet, ssh channel...).
///
/// Handlers are replaceable so a session can install its own and restore the
/// previous ones when it detaches. Implementations must tolerate calls from
/// any thread.
pub trait TtyConnection: Send + Sync {
    fn stdin_handler(&self) -> Option<StdinHandler>;
    fn set_stdin_handler(&self, handler: Option<StdinHandler>);

    fn size_handler(&self) -> Option<SizeHandler>;
    fn set_size_handler(&self, handler: Option<SizeHandler>);

    /// Write text to the terminal as is.
    fn write(&self, text: &str);

    /// Queue `task` to run after the current handler returns. It must not run
    /// synchronously inside this call.
    fn schedule(&self, task: Task);

    fn write_code_points(&self, code_points: &[char]) {
        if code_points.is_empty() {
            return;
        }
        let text: String = code_points.iter().collect();
        self.write(&text);
    }
}
