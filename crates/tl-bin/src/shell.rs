//! A toy command shell on top of the line editor.

use core_actions::History;
use core_readline::Completion;
use core_text::QuoteTracker;
use tracing::{debug, warn};

pub const COMMANDS: &[&str] = &["echo", "exit", "help", "history", "quit"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Text to print, `\n` separated; may be empty.
    Output(String),
    Exit,
}

/// Evaluate one logical line.
pub fn evaluate(line: &str, history: &History) -> Reply {
    let unquoted = QuoteTracker::unquote(line);
    let trimmed = unquoted.trim_start();
    let (command, rest) = trimmed
        .split_once(char::is_whitespace)
        .unwrap_or((trimmed, ""));
    match command {
        "" => Reply::Output(String::new()),
        "exit" | "quit" => Reply::Exit,
        "echo" => Reply::Output(rest.to_string()),
        "help" => Reply::Output(format!("commands: {}", COMMANDS.join(" "))),
        "history" => Reply::Output(
            history
                .iter()
                .enumerate()
                .map(|(i, entry)| format!("{:>4}  {}", i + 1, entry.iter().collect::<String>()))
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        other => Reply::Output(format!("{other}: command not found")),
    }
}

/// Complete command names in the first word; anything else ends immediately.
pub fn complete_command(completion: Completion) {
    let line: String = completion.line().iter().collect();
    let prefix: String = completion.prefix().iter().collect();
    let first_word = line.split_whitespace().count() <= 1;
    let candidates: Vec<&str> = if first_word {
        COMMANDS
            .iter()
            .copied()
            .filter(|c| c.starts_with(prefix.as_str()))
            .collect()
    } else {
        Vec::new()
    };
    debug!(target: "shell.complete", candidates = candidates.len(), "candidates");

    let result = match candidates.as_slice() {
        [] => Ok(()),
        [only] => completion.complete(&suffix(only, &prefix), true),
        many => {
            let common = common_prefix(many);
            if common.chars().count() > prefix.chars().count() {
                completion.complete(&suffix(common, &prefix), false)
            } else {
                let listing: Vec<char> = many.join("  ").chars().collect();
                completion.suggest(&listing)
            }
        }
    };
    if let Err(e) = result {
        warn!(target: "shell.complete", error = %e, "completion_failed");
    }
    if let Err(e) = completion.end() {
        warn!(target: "shell.complete", error = %e, "completion_end_failed");
    }
}

fn suffix(word: &str, prefix: &str) -> Vec<char> {
    word.chars().skip(prefix.chars().count()).collect()
}

fn common_prefix<'a>(words: &[&'a str]) -> &'a str {
    let Some((first, rest)) = words.split_first() else {
        return "";
    };
    let mut len = first.len();
    for word in rest {
        len = first
            .char_indices()
            .zip(word.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map_or(0, |((i, a), _)| i + a.len_utf8())
            .min(len);
    }
    &first[..len]
}
