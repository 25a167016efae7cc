mod common;

use common::{FakeConnection, Lines, session};
use core_events::{Dimension, keys};
use core_keymap::Keymap;
use core_readline::{Readline, ReadlineError};
use core_terminal::TtyConnection;
use std::sync::{Arc, Mutex};
use tracing::dispatcher::{Dispatch, with_default};
use tracing::subscriber::Interest;
use tracing::{Level, Metadata, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::Registry;

#[derive(Clone, Default)]
struct EventCapture {
    events: Arc<Mutex<Vec<(Level, String)>>>,
}

impl<S> Layer<S> for EventCapture
where
    S: Subscriber,
{
    fn register_callsite(&self, _metadata: &'static Metadata<'static>) -> Interest {
        Interest::always()
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        self.events
            .lock()
            .unwrap()
            .push((*meta.level(), meta.target().to_string()));
    }
}

#[test]
fn install_twice_fails() {
    let (rl, conn) = session();
    assert_eq!(rl.install(conn.clone()), Err(ReadlineError::AlreadyInstalled));
    assert!(rl.is_installed());
}

#[test]
fn uninstall_restores_previous_handlers() {
    let conn = FakeConnection::new();
    let seen: Arc<Mutex<Vec<char>>> = Arc::default();
    let sink = seen.clone();
    conn.set_stdin_handler(Some(Arc::new(move |data: &[char]| {
        sink.lock().unwrap().extend_from_slice(data);
    })));
    let sizes: Arc<Mutex<Vec<Dimension>>> = Arc::default();
    let size_sink = sizes.clone();
    conn.set_size_handler(Some(Arc::new(move |d| size_sink.lock().unwrap().push(d))));

    let rl = Readline::new(Keymap::standard());
    rl.install(conn.clone()).unwrap();
    conn.type_str("xy");
    conn.resize(10, 5);
    assert!(seen.lock().unwrap().is_empty());
    assert!(sizes.lock().unwrap().is_empty());

    rl.uninstall().unwrap();
    assert!(!rl.is_installed());
    conn.type_str("z");
    conn.resize(20, 6);
    assert_eq!(*seen.lock().unwrap(), vec!['z']);
    assert_eq!(*sizes.lock().unwrap(), vec![Dimension::new(20, 6)]);
    assert_eq!(rl.uninstall(), Err(ReadlineError::NotInstalled));
}

#[test]
fn session_can_be_reinstalled() {
    let (rl, conn) = session();
    rl.uninstall().unwrap();
    rl.install(conn.clone()).unwrap();
    let lines = Lines::default();
    rl.readline("% ", lines.sink()).unwrap();
    conn.type_str("again\r");
    assert_eq!(lines.get(), vec!["again".to_string()]);
}

#[test]
fn size_is_recorded_and_forwarded() {
    let (rl, conn) = session();
    assert_eq!(rl.size(), None);
    let forwarded: Arc<Mutex<Vec<Dimension>>> = Arc::default();
    let sink = forwarded.clone();
    rl.set_size_handler(Some(Arc::new(move |d| sink.lock().unwrap().push(d))));
    assert!(rl.size_handler().is_some());
    conn.resize(132, 50);
    assert_eq!(rl.size(), Some(Dimension::new(132, 50)));
    assert_eq!(*forwarded.lock().unwrap(), vec![Dimension::new(132, 50)]);
}

#[test]
fn idle_input_goes_to_read_handler() {
    let (rl, conn) = session();
    let raw: Arc<Mutex<Vec<Vec<char>>>> = Arc::default();
    let sink = raw.clone();
    rl.set_read_handler(Some(Arc::new(move |data| sink.lock().unwrap().push(data))));
    assert!(rl.read_handler().is_some());
    conn.type_str("hi\u{1b}[");
    assert_eq!(*raw.lock().unwrap(), vec![vec!['h', 'i', keys::ESC, '[']]);

    // A live request takes precedence.
    let lines = Lines::default();
    rl.readline("% ", lines.sink()).unwrap();
    conn.type_str("ok\r");
    assert_eq!(lines.get(), vec!["ok".to_string()]);
    assert_eq!(raw.lock().unwrap().len(), 1);
}

#[test]
fn read_handler_may_start_a_request() {
    let (rl, conn) = session();
    let lines = Lines::default();
    let handle = rl.clone();
    let sink = lines.clone();
    rl.set_read_handler(Some(Arc::new(move |_: Vec<char>| {
        let _ = handle.readline("% ", sink.sink());
    })));
    conn.type_str("\r");
    assert!(rl.is_reading());
    conn.type_str("go\r");
    assert_eq!(lines.get(), vec!["go".to_string()]);
}

#[test]
fn unknown_function_warns_and_leaves_line_alone() {
    let mut keymap = Keymap::standard();
    keymap.bind_function(&['\u{17}'], "no-such-function");
    let rl = Readline::new(keymap);
    let conn = FakeConnection::new();
    rl.install(conn.clone()).unwrap();
    let lines = Lines::default();
    rl.readline("% ", lines.sink()).unwrap();

    let capture = EventCapture::default();
    let events = capture.events.clone();
    let dispatch = Dispatch::new(Registry::default().with(capture.with_filter(LevelFilter::WARN)));
    with_default(&dispatch, || conn.type_str("ab\u{17}\r"));

    assert_eq!(lines.get(), vec!["ab".to_string()]);
    assert_eq!(conn.output(), "% ab\r\n");
    let recorded = events.lock().unwrap();
    assert!(
        recorded
            .iter()
            .any(|(level, target)| *level == Level::WARN && target == "readline.interaction")
    );
}

#[test]
fn dropping_the_session_releases_the_connection_handlers() {
    let conn = FakeConnection::new();
    {
        let rl = Readline::new(Keymap::standard());
        rl.install(conn.clone()).unwrap();
    }
    // The installed handler only holds a weak reference: typing is a no-op.
    conn.type_str("abc");
    assert_eq!(conn.output(), "");
}

#[test]
fn uninstall_releases_a_line_handler_holding_the_session() {
    let conn = FakeConnection::new();
    let rl = Readline::new(Keymap::standard());
    rl.install(conn.clone()).unwrap();
    let marker = Arc::new(());
    let held = (rl.clone(), marker.clone());
    rl.readline("% ", move |_: String| drop(held)).unwrap();

    // The pending handler owns a session handle, so the session outlives this one.
    let handle = rl.clone();
    drop(rl);
    conn.type_str("a");
    assert_eq!(conn.take_output(), "% a");
    assert_eq!(Arc::strong_count(&marker), 2);

    handle.uninstall().unwrap();
    assert_eq!(Arc::strong_count(&marker), 1);
    assert!(!handle.is_reading());
}

#[test]
fn history_is_reachable_from_a_line_callback() {
    let (rl, conn) = session();
    let again = rl.clone();
    rl.readline("% ", move |line: String| {
        again.with_history(|h| h.push(&line));
    })
    .unwrap();
    conn.type_str("ls\r");
    assert_eq!(rl.with_history(|h| h.len()), 1);
}
