//! Background command loop.
//!
//! One dedicated thread owns the [`CommandChannel`] for the session's
//! lifetime. Each iteration either polls for a connection (bounded timeout,
//! so a cleared running flag is noticed promptly) or reads exactly one
//! message: fixed tag, then the fixed payload for that tag. Messages are
//! handled strictly sequentially; a failed read mid-message drops the client
//! and goes back to polling, never retrying the partial frame.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::channel::CommandChannel;
use crate::protocol::{Message, TAG_SIZE};

/// Seam between the dispatcher and the session, so the loop can be driven
/// by a fake in tests.
pub trait CommandHandler: Send + Sync + 'static {
    fn load_jar(&self, path: &Path, entry_class: &str);
    fn shutdown(&self);
}

pub struct Dispatcher {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Dispatcher {
    /// Start the loop on its own thread. `running` is shared with the
    /// session so that a `Shutdown` message handled on this thread can end
    /// the loop without joining it from itself.
    pub fn spawn<H: CommandHandler>(
        channel: CommandChannel,
        handler: Arc<H>,
        running: Arc<AtomicBool>,
        poll_interval: Duration,
    ) -> Dispatcher {
        running.store(true, Ordering::SeqCst);
        let flag = Arc::clone(&running);
        let thread = std::thread::Builder::new()
            .name("classweave-dispatcher".to_string())
            .spawn(move || run_loop(channel, handler, flag, poll_interval))
            .expect("failed to spawn dispatcher thread");

        Dispatcher {
            running,
            thread: Some(thread),
        }
    }

    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Signal the loop to exit and join it. Safe to call repeatedly, and
    /// safe to call from the dispatcher thread itself (the join is skipped;
    /// the loop exits on its own once the flag is down).
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.thread().id() == std::thread::current().id() {
                return;
            }
            if thread.join().is_err() {
                warn!("dispatcher thread panicked");
            }
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop<H: CommandHandler>(
    mut channel: CommandChannel,
    handler: Arc<H>,
    running: Arc<AtomicBool>,
    poll_interval: Duration,
) {
    info!("dispatcher started");

    while running.load(Ordering::SeqCst) {
        if !channel.poll_connection(Some(poll_interval)) {
            continue;
        }

        let mut tag_buf = [0u8; TAG_SIZE];
        if !channel.read_exact(&mut tag_buf) {
            continue;
        }
        let tag = u32::from_ne_bytes(tag_buf);

        let Some(payload_size) = Message::payload_size(tag) else {
            debug!(tag, "unknown message tag; dropping client");
            channel.disconnect();
            continue;
        };

        let mut payload = vec![0u8; payload_size];
        if payload_size > 0 && !channel.read_exact(&mut payload) {
            continue;
        }

        match Message::decode(tag, &payload) {
            Some(Message::LoadJar { path, entry_class }) => {
                debug!(?path, %entry_class, "dispatching jar load");
                handler.load_jar(&path, &entry_class);
            }
            Some(Message::Shutdown) => {
                info!("shutdown requested over the channel");
                handler.shutdown();
            }
            None => channel.disconnect(),
        }
    }

    info!("dispatcher exiting");
}
