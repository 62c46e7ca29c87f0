//! Local command channel: a one-slot Unix stream socket endpoint.
//!
//! The channel owns a listening socket at a well-known path and at most one
//! connected client. There is no accept backlog draining: while a client is
//! connected, further connection attempts sit unaccepted, so they never
//! replace the current client. Any read failure drops the client and the
//! channel goes back to listening.

use std::io::{ErrorKind, Read};
use std::os::unix::io::AsRawFd;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ChannelError;

// sun_path is 108 bytes on Linux including the trailing NUL.
const SUN_PATH_MAX: usize = 107;

pub struct CommandChannel {
    listener: UnixListener,
    client: Option<UnixStream>,
    path: PathBuf,
}

impl CommandChannel {
    /// Bind the endpoint. A stale socket file from a previous run is removed
    /// first (with a warning, since it usually means an unclean shutdown).
    pub fn bind(path: &Path) -> Result<Self, ChannelError> {
        if path.as_os_str().len() > SUN_PATH_MAX {
            return Err(ChannelError::PathTooLong {
                path: path.to_path_buf(),
                limit: SUN_PATH_MAX,
            });
        }

        if path.exists() {
            warn!(?path, "stale control socket found; removing");
            if let Err(e) = std::fs::remove_file(path) {
                warn!(?path, error = %e, "failed to remove stale control socket");
            }
        }

        let listener = UnixListener::bind(path).map_err(|source| ChannelError::Bind {
            path: path.to_path_buf(),
            source,
        })?;
        listener.set_nonblocking(true)?;

        Ok(CommandChannel {
            listener,
            client: None,
            path: path.to_path_buf(),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Wait up to `timeout` for an incoming connection; `None` blocks
    /// indefinitely. Returns whether a client is connected afterwards. When
    /// a client is already attached this returns immediately.
    pub fn poll_connection(&mut self, timeout: Option<Duration>) -> bool {
        if self.client.is_some() {
            return true;
        }

        let timeout_ms: libc::c_int = match timeout {
            Some(t) => t.as_millis().min(libc::c_int::MAX as u128) as libc::c_int,
            None => -1,
        };

        let mut pfd = libc::pollfd {
            fd: self.listener.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let ready = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
        if ready <= 0 || (pfd.revents & libc::POLLIN) == 0 {
            return false;
        }

        match self.listener.accept() {
            Ok((stream, _)) => {
                // Reads block once connected; only connection polling is
                // timed.
                if let Err(e) = stream.set_nonblocking(false) {
                    warn!(error = %e, "failed to configure client socket");
                    return false;
                }
                debug!("controller connected");
                self.client = Some(stream);
                true
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => false,
            Err(e) => {
                warn!(error = %e, "accept failed");
                false
            }
        }
    }

    /// Fill `buf` exactly from the connected client. On EOF, a short read,
    /// or an error the client is dropped and `false` is returned; the
    /// channel is back to listening and no error surfaces to the caller.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> bool {
        let Some(client) = self.client.as_mut() else {
            return false;
        };

        let mut filled = 0;
        let complete = loop {
            if filled == buf.len() {
                break true;
            }
            match client.read(&mut buf[filled..]) {
                Ok(0) => {
                    debug!(wanted = buf.len(), got = filled, "short read; dropping client");
                    break false;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!(error = %e, "read failed; dropping client");
                    break false;
                }
            }
        };

        if !complete {
            self.disconnect();
        }
        complete
    }

    /// Forcibly drop the current client, returning to `LISTENING`.
    pub fn disconnect(&mut self) {
        self.client = None;
    }
}

impl Drop for CommandChannel {
    fn drop(&mut self) {
        // Release the path so the next agent instance can bind it.
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = ?self.path, error = %e, "failed to remove control socket");
            }
        }
    }
}
