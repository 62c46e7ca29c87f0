//! Error taxonomy for the agent.
//!
//! Attach and channel-construction failures are the only fatal cases; the
//! hosting glue aborts on them. Everything else is a status the caller sees
//! and decides about.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::sys::jni::jint;
use crate::sys::jvmti::jvmtiError;

/// Fatal failures while attaching to the host VM. Nothing useful can happen
/// without the attachment, so `start()` surfaces these and the glue aborts.
#[derive(Debug, Error)]
pub enum AttachError {
    #[error("failed to attach current thread to the VM (JNI error {0})")]
    AttachThread(jint),
    #[error("failed to obtain the tooling interface (JNI error {0})")]
    ToolingInterface(jint),
    #[error("VM refused required capabilities: {0:?}")]
    Capabilities(jvmtiError),
    #[error("failed to install event callbacks: {0:?}")]
    Callbacks(jvmtiError),
}

/// Fatal failures constructing the command channel endpoint.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("socket path {path:?} exceeds the platform limit of {limit} bytes")]
    PathTooLong { path: PathBuf, limit: usize },
    #[error("failed to bind control socket at {path:?}: {source}")]
    Bind { path: PathBuf, source: io::Error },
    #[error("control socket I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Outcome of a registry-backed redefine/retransform request.
///
/// `NotFound` means the name was absent from the registry; per the channel
/// contract no re-scan is attempted, the caller may `resnapshot()` and retry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OpError {
    #[error("class not present in the registry")]
    NotFound,
    #[error("runtime rejected the operation: {0:?}")]
    Ti(jvmtiError),
}

/// Status code reported to managed callers through the native entry points.
pub const STATUS_CLASS_NOT_FOUND: jint = -2;

impl OpError {
    /// Collapse into the jint status the native entry points return.
    pub fn status_code(&self) -> jint {
        match self {
            OpError::NotFound => STATUS_CLASS_NOT_FOUND,
            OpError::Ti(e) => *e as jint,
        }
    }
}

/// Top-level error for `start()`.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Attach(#[from] AttachError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
    #[error("agent already started")]
    AlreadyStarted,
}
