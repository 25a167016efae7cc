//! termline entrypoint: a small shell on the local terminal driven by the line editor.
use anyhow::Result;
use clap::Parser;
use core_actions::{History, builtin_functions};
use core_readline::{Completion, CompletionHandler, Readline};
use core_terminal::{CrosstermBackend, TerminalGuard, TtyConnection, terminal_size};
use crossbeam_channel::Sender;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use std::thread;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

mod shell;
mod stdio;

use shell::Reply;
use stdio::{Message, StdioConnection};

const LOG_FILE: &str = "termline.log";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "termline", version, about = "Line editing shell demo")]
struct Args {
    /// Optional configuration file path (overrides discovery of `termline.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Prompt to show instead of the configured one.
    #[arg(long = "prompt")]
    pub prompt: Option<String>,
}

struct AppStartup {
    backend: CrosstermBackend,
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self {
            backend: CrosstermBackend::new(),
            log_guard: None,
        }
    }

    fn run(&mut self) -> Result<TerminalGuard<'_>> {
        self.configure_logging()?;
        Self::install_panic_hook();
        info!(target: "runtime", "startup");
        self.backend.enter_guard()
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join(LOG_FILE);
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => {
                self.log_guard = Some(guard);
            }
            Err(_err) => {
                // Global tracing subscriber already installed; drop guard so writer shuts down.
            }
        }

        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

/// Prompt, evaluate, repeat.
struct Shell {
    readline: Readline,
    conn: Arc<StdioConnection>,
    prompt: String,
    queue: Sender<Message>,
}

impl Shell {
    fn prompt(self: &Arc<Self>) {
        let this = Arc::clone(self);
        // Completion runs off the dispatch thread and finishes from there.
        let completer: CompletionHandler = Arc::new(|completion: Completion| {
            thread::spawn(move || shell::complete_command(completion));
        });
        if let Err(e) =
            self.readline
                .request(&self.prompt, move |line| this.on_line(line), Some(completer))
        {
            error!(target: "runtime", error = %e, "request_failed");
            let _ = self.queue.send(Message::Quit);
        }
    }

    fn on_line(self: Arc<Self>, line: String) {
        let reply = self.readline.with_history(|history| {
            history.push(&line);
            shell::evaluate(&line, history)
        });
        match reply {
            Reply::Output(text) => {
                if !text.is_empty() {
                    self.conn.write(&text.replace('\n', "\r\n"));
                    self.conn.write("\r\n");
                }
                self.prompt();
            }
            Reply::Exit => {
                info!(target: "runtime", "exit_requested");
                let _ = self.queue.send(Message::Quit);
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut startup = AppStartup::new();
    let terminal_guard = startup.run()?;

    let config = core_config::load_from(args.config.clone())?;
    let prompt = args
        .prompt
        .unwrap_or_else(|| config.file.prompt.primary.clone());

    let (tx, rx) = crossbeam_channel::unbounded();
    let conn = Arc::new(StdioConnection::new(tx.clone()));

    let readline = Readline::new(config.keymap());
    readline
        .add_functions(builtin_functions())
        .set_continuation_prompt(config.file.prompt.continuation.clone());
    readline.with_history(|h| *h = History::with_max_entries(config.file.history.max_entries));
    readline.install(conn.clone())?;

    let initial = match terminal_size() {
        Ok(size) => {
            let _ = tx.send(Message::Resize(size));
            Some(size)
        }
        Err(e) => {
            warn!(target: "runtime", error = %e, "terminal_size_unavailable");
            None
        }
    };
    stdio::spawn_stdin_reader(tx.clone())?;
    stdio::spawn_resize_watcher(tx.clone(), initial)?;
    info!(
        target: "runtime.startup",
        config_override = args.config.is_some(),
        config_source = ?config.source,
        bindings = config.file.keymap.len(),
        history_cap = config.file.history.max_entries,
        "bootstrap_complete"
    );

    let shell = Arc::new(Shell {
        readline: readline.clone(),
        conn: conn.clone(),
        prompt,
        queue: tx,
    });
    shell.prompt();
    conn.run(&rx);

    readline.uninstall()?;
    drop(terminal_guard);
    conn.write("\r\n");
    info!(target: "runtime", "shutdown");
    Ok(())
}
