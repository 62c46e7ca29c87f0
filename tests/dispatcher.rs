//! Dispatcher loop driven end-to-end over a real socket, with a fake
//! session behind the handler seam.

#![cfg(unix)]

use std::io::Write;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use classweave::channel::CommandChannel;
use classweave::dispatcher::{CommandHandler, Dispatcher};
use classweave::protocol::Message;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Default)]
struct FakeSession {
    loads: Mutex<Vec<(PathBuf, String)>>,
    running: Arc<AtomicBool>,
    shutdowns: Mutex<usize>,
}

impl CommandHandler for FakeSession {
    fn load_jar(&self, path: &Path, entry_class: &str) {
        self.loads
            .lock()
            .push((path.to_path_buf(), entry_class.to_string()));
    }

    fn shutdown(&self) {
        *self.shutdowns.lock() += 1;
        // Mirrors the real session: teardown clears the running flag, the
        // loop exits on its own.
        self.running.store(false, Ordering::SeqCst);
    }
}

struct Harness {
    _dir: tempfile::TempDir,
    socket: PathBuf,
    handler: Arc<FakeSession>,
    dispatcher: Dispatcher,
}

fn start_dispatcher() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("agent.sock");
    let channel = CommandChannel::bind(&socket).unwrap();
    let handler = Arc::new(FakeSession::default());
    let dispatcher = Dispatcher::spawn(
        channel,
        Arc::clone(&handler),
        Arc::clone(&handler.running),
        POLL_INTERVAL,
    );
    Harness {
        _dir: dir,
        socket,
        handler,
        dispatcher,
    }
}

fn wait_for(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("condition not met within deadline");
}

#[test]
fn decodes_and_dispatches_load_jar() {
    let mut harness = start_dispatcher();

    let mut client = UnixStream::connect(&harness.socket).unwrap();
    let frame = Message::LoadJar {
        path: PathBuf::from("/tmp/x.jar"),
        entry_class: "a.B".to_string(),
    }
    .encode();
    client.write_all(&frame).unwrap();

    wait_for(|| !harness.handler.loads.lock().is_empty());
    let loads = harness.handler.loads.lock();
    assert_eq!(loads[0], (PathBuf::from("/tmp/x.jar"), "a.B".to_string()));
    drop(loads);

    harness.dispatcher.stop();
}

#[test]
fn messages_are_handled_sequentially_in_order() {
    let mut harness = start_dispatcher();

    let mut client = UnixStream::connect(&harness.socket).unwrap();
    for i in 0..3 {
        let frame = Message::LoadJar {
            path: PathBuf::from(format!("/tmp/{i}.jar")),
            entry_class: format!("pkg.C{i}"),
        }
        .encode();
        client.write_all(&frame).unwrap();
    }

    wait_for(|| harness.handler.loads.lock().len() == 3);
    let loads = harness.handler.loads.lock();
    for (i, (path, entry)) in loads.iter().enumerate() {
        assert_eq!(path, &PathBuf::from(format!("/tmp/{i}.jar")));
        assert_eq!(entry, &format!("pkg.C{i}"));
    }
    drop(loads);

    harness.dispatcher.stop();
}

#[test]
fn partial_frame_drops_client_but_loop_survives() {
    let mut harness = start_dispatcher();

    // Tag only, then close: the dispatcher must treat it as a disconnect,
    // not an error, and keep serving.
    let mut truncated = UnixStream::connect(&harness.socket).unwrap();
    truncated
        .write_all(&classweave::protocol::TAG_LOAD_JAR.to_ne_bytes())
        .unwrap();
    drop(truncated);

    // Allow the dispatcher to notice the disconnect, then reconnect.
    std::thread::sleep(Duration::from_millis(100));
    let mut client = UnixStream::connect(&harness.socket).unwrap();
    let frame = Message::LoadJar {
        path: PathBuf::from("/tmp/after.jar"),
        entry_class: "after.Entry".to_string(),
    }
    .encode();
    client.write_all(&frame).unwrap();

    wait_for(|| !harness.handler.loads.lock().is_empty());
    assert_eq!(
        harness.handler.loads.lock()[0].1,
        "after.Entry".to_string()
    );

    harness.dispatcher.stop();
}

#[test]
fn unknown_tag_drops_client_but_loop_survives() {
    let mut harness = start_dispatcher();

    let mut bogus = UnixStream::connect(&harness.socket).unwrap();
    bogus.write_all(&0xDEAD_BEEFu32.to_ne_bytes()).unwrap();
    drop(bogus);

    std::thread::sleep(Duration::from_millis(100));
    let mut client = UnixStream::connect(&harness.socket).unwrap();
    client.write_all(&Message::Shutdown.encode()).unwrap();

    wait_for(|| *harness.handler.shutdowns.lock() == 1);
    harness.dispatcher.stop();
}

#[test]
fn shutdown_message_tears_the_loop_down() {
    let mut harness = start_dispatcher();

    let mut client = UnixStream::connect(&harness.socket).unwrap();
    client.write_all(&Message::Shutdown.encode()).unwrap();

    wait_for(|| !harness.handler.running.load(Ordering::SeqCst));
    assert_eq!(*harness.handler.shutdowns.lock(), 1);

    // Joining after a channel-initiated shutdown must not hang or error,
    // and stopping twice is a no-op.
    harness.dispatcher.stop();
    harness.dispatcher.stop();
}
