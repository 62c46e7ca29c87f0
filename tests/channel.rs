//! Command channel behavior against real Unix sockets.

#![cfg(unix)]

use std::io::Write;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::time::Duration;

use classweave::channel::CommandChannel;
use classweave::error::ChannelError;

const POLL: Option<Duration> = Some(Duration::from_millis(1000));

fn socket_path(dir: &tempfile::TempDir) -> PathBuf {
    dir.path().join("agent.sock")
}

#[test]
fn accepts_a_connection_within_the_poll_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_path(&dir);
    let mut channel = CommandChannel::bind(&path).unwrap();

    assert!(!channel.is_connected());
    assert!(!channel.poll_connection(Some(Duration::from_millis(10))));

    let _client = UnixStream::connect(&path).unwrap();
    assert!(channel.poll_connection(POLL));
    assert!(channel.is_connected());
}

#[test]
fn second_connection_does_not_replace_the_current_client() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_path(&dir);
    let mut channel = CommandChannel::bind(&path).unwrap();

    let mut first = UnixStream::connect(&path).unwrap();
    assert!(channel.poll_connection(POLL));

    // The second connect succeeds at the OS level but sits unaccepted.
    let mut second = UnixStream::connect(&path).unwrap();
    assert!(channel.poll_connection(Some(Duration::from_millis(10))));

    // Reads still come from the first client.
    first.write_all(b"from-first").unwrap();
    second.write_all(b"from-second").unwrap();
    let mut buf = [0u8; 10];
    assert!(channel.read_exact(&mut buf));
    assert_eq!(&buf, b"from-first");
}

#[test]
fn short_read_drops_the_client_and_returns_to_listening() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_path(&dir);
    let mut channel = CommandChannel::bind(&path).unwrap();

    let mut client = UnixStream::connect(&path).unwrap();
    assert!(channel.poll_connection(POLL));

    // Send only a 4-byte tag, then close.
    client.write_all(&0u32.to_ne_bytes()).unwrap();
    drop(client);

    let mut tag = [0u8; 4];
    assert!(channel.read_exact(&mut tag));

    // The payload read comes up short; no error surfaces, the client is
    // simply gone.
    let mut payload = [0u8; 64];
    assert!(!channel.read_exact(&mut payload));
    assert!(!channel.is_connected());

    // Back to listening: a new client can connect.
    let _next = UnixStream::connect(&path).unwrap();
    assert!(channel.poll_connection(POLL));
}

#[test]
fn read_without_client_reports_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut channel = CommandChannel::bind(&socket_path(&dir)).unwrap();
    let mut buf = [0u8; 4];
    assert!(!channel.read_exact(&mut buf));
}

#[test]
fn stale_socket_file_is_cleaned_up_on_bind() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_path(&dir);
    std::fs::write(&path, b"stale").unwrap();

    let channel = CommandChannel::bind(&path).unwrap();
    drop(channel);

    // Destruction releases the address entirely.
    assert!(!path.exists());
}

#[test]
fn rebinding_after_drop_works() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_path(&dir);
    drop(CommandChannel::bind(&path).unwrap());
    let _second = CommandChannel::bind(&path).unwrap();
}

#[test]
fn overlong_path_fails_fatally() {
    let long = PathBuf::from(format!("/tmp/{}.sock", "x".repeat(200)));
    match CommandChannel::bind(&long) {
        Err(ChannelError::PathTooLong { .. }) => {}
        Err(e) => panic!("expected PathTooLong, got {e}"),
        Ok(_) => panic!("bind unexpectedly succeeded"),
    }
}

#[test]
fn disconnect_is_forcible_and_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_path(&dir);
    let mut channel = CommandChannel::bind(&path).unwrap();

    let _client = UnixStream::connect(&path).unwrap();
    assert!(channel.poll_connection(POLL));

    channel.disconnect();
    assert!(!channel.is_connected());
    channel.disconnect();
    assert!(!channel.is_connected());
}
