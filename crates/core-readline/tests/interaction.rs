mod common;

use common::{Lines, session};
use core_readline::{ReadlineError, Readline};
use core_text::QuoteTracker;
use pretty_assertions::assert_eq;

fn serve(rl: &Readline, lines: &Lines) {
    let sink = lines.sink();
    let again = rl.clone();
    let lines = lines.clone();
    rl.readline("% ", move |line| {
        sink(line);
        serve(&again, &lines);
    })
    .unwrap();
}

#[test]
fn single_line_is_delivered_verbatim() {
    let (rl, conn) = session();
    let lines = Lines::default();
    rl.readline("% ", lines.sink()).unwrap();
    conn.type_str("abc\r");
    assert_eq!(lines.get(), vec!["abc".to_string()]);
    assert_eq!(conn.output(), "% abc\r\n");
    assert!(!rl.is_reading());
}

#[test]
fn open_double_quote_spans_physical_lines() {
    let (rl, conn) = session();
    let lines = Lines::default();
    rl.readline("% ", lines.sink()).unwrap();
    conn.type_str("say \"hi\r");
    assert!(lines.get().is_empty());
    assert_eq!(conn.take_output(), "% say \"hi\r\n> ");
    conn.type_str("there\"\r");
    assert_eq!(lines.get(), vec!["say \"hi\nthere\"".to_string()]);
    assert_eq!(QuoteTracker::unquote(&lines.get()[0]), "say hi\nthere");
    assert_eq!(conn.take_output(), "there\"\r\n");
}

#[test]
fn one_continuation_prompt_per_pending_enter() {
    let (rl, conn) = session();
    let lines = Lines::default();
    rl.readline("% ", lines.sink()).unwrap();
    conn.type_str("echo 'a\r\rb' \"c\rd\"\r");
    assert_eq!(conn.output().matches("\r\n> ").count(), 3);
    let line = &lines.get()[0];
    assert_eq!(line, "echo 'a\n\nb' \"c\nd\"");
    assert_eq!(QuoteTracker::unquote(line), "echo a\n\nb c\nd");
}

#[test]
fn trailing_backslash_continues_the_line() {
    let (rl, conn) = session();
    let lines = Lines::default();
    rl.readline("% ", lines.sink()).unwrap();
    conn.type_str("echo a\\\r");
    assert!(rl.is_reading());
    conn.type_str("b\r");
    assert_eq!(lines.get(), vec!["echo a\\\nb".to_string()]);
    assert_eq!(QuoteTracker::unquote(&lines.get()[0]), "echo ab");
}

#[test]
fn continuation_prompt_is_configurable() {
    let (rl, conn) = session();
    rl.set_continuation_prompt("... ");
    rl.readline("% ", |_| {}).unwrap();
    conn.type_str("'\r");
    assert!(conn.output().ends_with("\r\n... "));
}

#[test]
fn second_request_fails_and_leaves_first_untouched() {
    let (rl, conn) = session();
    let first = Lines::default();
    let second = Lines::default();
    rl.readline("% ", first.sink()).unwrap();
    conn.type_str("ab");
    assert_eq!(
        rl.readline("$ ", second.sink()),
        Err(ReadlineError::AlreadyReading)
    );
    conn.type_str("c\r");
    assert_eq!(first.get(), vec!["abc".to_string()]);
    assert!(second.get().is_empty());
    assert!(!conn.output().contains("$ "));
}

#[test]
fn bound_functions_edit_and_redraw() {
    let (rl, conn) = session();
    let lines = Lines::default();
    rl.readline("% ", lines.sink()).unwrap();
    conn.type_str("abc");
    conn.take_output();
    conn.type_str("\u{1b}[D");
    assert_eq!(conn.take_output(), "\u{8}");
    conn.type_str("X");
    assert_eq!(conn.take_output(), "Xc\u{8}");
    conn.type_str("\u{1}\u{4}\r");
    assert_eq!(lines.get(), vec!["bXc".to_string()]);
}

#[test]
fn backspace_erases_on_screen() {
    let (rl, conn) = session();
    let lines = Lines::default();
    rl.readline("% ", lines.sink()).unwrap();
    conn.type_str("ab\u{7f}");
    assert_eq!(conn.output(), "% ab\u{8} \u{8}");
    conn.type_str("\r");
    assert_eq!(lines.get(), vec!["a".to_string()]);
}

#[test]
fn history_navigation_through_session() {
    let (rl, conn) = session();
    rl.with_history(|h| {
        h.push("first");
        h.push("second");
    });
    let lines = Lines::default();
    rl.readline("% ", lines.sink()).unwrap();
    conn.type_str("\u{1b}[A\u{1b}[A\u{1b}[B\r");
    assert_eq!(lines.get(), vec!["second".to_string()]);
}

#[test]
fn typed_ahead_input_reaches_the_next_request() {
    let (rl, conn) = session();
    let lines = Lines::default();
    serve(&rl, &lines);
    conn.type_str("ls\rpwd\r");
    conn.run_scheduled();
    assert_eq!(lines.get(), vec!["ls".to_string(), "pwd".to_string()]);
    assert!(rl.is_reading());
    assert_eq!(conn.output(), "% ls\r\n% pwd\r\n% ");
}

#[test]
fn input_before_request_is_kept_and_scheduled() {
    let (rl, conn) = session();
    conn.type_str("ok\r");
    let lines = Lines::default();
    rl.readline("% ", lines.sink()).unwrap();
    assert!(lines.get().is_empty());
    assert_eq!(conn.scheduled(), 1);
    conn.run_scheduled();
    assert_eq!(lines.get(), vec!["ok".to_string()]);
}
