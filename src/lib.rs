//! # classweave
//!
//! Live JVM class patching from Rust. The agent attaches to an
//! already-running VM, snapshots its loaded classes, intercepts every class
//! about to be loaded, and lets external tooling redefine code in place
//! without a restart.
//!
//! ## What you get
//!
//! - An [`session::AgentSession`] that owns the VM attachment, the
//!   name-to-class [`registry::ClassRegistry`], and the redefine /
//!   retransform operations.
//! - A control socket ([`channel::CommandChannel`]) with a fixed binary
//!   protocol ([`protocol::Message`]) served by a background
//!   [`dispatcher::Dispatcher`] thread.
//! - A class-load hook ([`hook`]) that forwards bytecode through a
//!   first-match-wins chain of managed transformers and substitutes the
//!   result.
//! - Native entry points ([`natives`]) registered on the managed hub so
//!   JVM-side tooling can redefine and retransform directly.
//!
//! ## Lifecycle
//!
//! The core never initializes itself implicitly. The hosting glue calls
//! [`start`] once when the library lands in the process and [`stop`] when it
//! leaves; the exported `Agent_OnAttach` / `Agent_OnLoad` / `Agent_OnUnload`
//! entry points are thin wrappers that do exactly that.
//!
//! Load it into a running JVM:
//!
//! ```bash
//! cargo build --release
//! jcmd <pid> JVMTI.agent_load ./target/release/libclassweave.so
//! # or at startup:
//! java -agentpath:./target/release/libclassweave.so=socket=/tmp/cw.sock MyApp
//! ```
//!
//! ## Control protocol
//!
//! One controller at a time connects to the Unix socket and sends
//! fixed-size frames: a 4-byte tag, then a per-tag payload. `LOAD_JAR`
//! carries a zero-padded 512-byte jar path and 256-byte entry class name;
//! `SHUTDOWN` has no payload and tears the session down. Short reads drop
//! the client; the agent goes back to listening.
//!
//! ## Threading
//!
//! Three kinds of threads touch the agent: the attach thread (once), the
//! dispatcher thread (for the session's lifetime), and any number of VM
//! threads running the class-load hook. The registry is internally
//! synchronized; hook callbacks never block on the channel and never
//! unwind across the FFI boundary.

pub mod channel;
pub mod config;
pub mod dispatcher;
pub mod env;
pub mod error;
pub mod hook;
pub mod listeners;
pub mod natives;
pub mod prelude;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod sys;

// Implementation modules (use `env` for the public wrapper API)
#[doc(hidden)]
pub mod jni_wrapper;
#[doc(hidden)]
pub mod jvmti_wrapper;

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::{error, info};

use crate::channel::CommandChannel;
use crate::config::SessionConfig;
use crate::dispatcher::Dispatcher;
use crate::error::AgentError;
use crate::session::AgentSession;
use crate::sys::jni;

// The one session per process. Event trampolines and native entry points
// reach it through here; everything else is handed the session explicitly.
static SESSION: OnceLock<Arc<AgentSession>> = OnceLock::new();
static DISPATCHER: Mutex<Option<Dispatcher>> = Mutex::new(None);

/// The live session, if the agent has started.
pub fn current_session() -> Option<&'static Arc<AgentSession>> {
    SESSION.get()
}

/// Bring the agent up inside the host process. Called exactly once by the
/// lifecycle glue; a second call fails with [`AgentError::AlreadyStarted`].
///
/// Attach and channel-construction failures are fatal to the caller: there
/// is no degraded mode without the VM attachment or the control socket.
///
/// # Safety
/// `vm` must be the live `JavaVM` pointer of this process.
pub unsafe fn start(vm: *mut jni::JavaVM, options: &str) -> Result<(), AgentError> {
    init_tracing();

    let config = SessionConfig::from_options(options);
    info!(?config, "starting agent");

    let session = AgentSession::attach(vm, config)?;
    if SESSION.set(Arc::clone(&session)).is_err() {
        return Err(AgentError::AlreadyStarted);
    }

    // The global is reachable now; events may start firing as soon as the
    // hook goes in.
    if let Err(e) = session.install_hook() {
        error!(error = %e, "failed to install class load hook");
        return Err(e.into());
    }

    if let Ok(env) = session.vm().attach_current_thread_as_daemon() {
        session.init_managed(&env);
    }

    let channel = match CommandChannel::bind(&session.config().socket_path) {
        Ok(channel) => channel,
        Err(e) => {
            error!(error = %e, "failed to construct command channel");
            session.shutdown();
            return Err(e.into());
        }
    };

    let dispatcher = Dispatcher::spawn(
        channel,
        Arc::clone(&session),
        session.running_flag(),
        session.config().poll_interval,
    );
    *DISPATCHER.lock() = Some(dispatcher);

    if let Some(preload) = session.config().preload.clone() {
        if let Ok(env) = session.vm().attach_current_thread_as_daemon() {
            let status = session.load_and_run(&env, &preload.path, &preload.entry_class);
            info!(path = ?preload.path, entry = %preload.entry_class, %status, "preload jar");
        }
    }

    info!("agent started");
    Ok(())
}

/// Tear the agent down: session teardown first (hook out, capabilities
/// released, running flag cleared), then the dispatcher thread is joined.
/// Idempotent, and safe to call from the dispatcher thread itself.
pub fn stop() {
    if let Some(session) = SESSION.get() {
        session.shutdown();
    }
    if let Some(mut dispatcher) = DISPATCHER.lock().take() {
        dispatcher.stop();
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    // A host that already installed a subscriber wins.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CLASSWEAVE_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

// =============================================================================
// JVM entry points (the lifecycle glue)
//
// `Agent_OnAttach` serves dynamic attach (`jcmd <pid> JVMTI.agent_load`),
// `Agent_OnLoad` serves `-agentpath:` at startup. Both just parse the
// options string and hand control to `start`.
// =============================================================================

unsafe fn agent_entry(vm: *mut jni::JavaVM, options: *mut std::os::raw::c_char) -> jni::jint {
    let options = if options.is_null() {
        ""
    } else {
        std::ffi::CStr::from_ptr(options).to_str().unwrap_or("")
    };

    match start(vm, options) {
        Ok(()) => jni::JNI_OK,
        Err(e) => {
            error!(error = %e, "agent failed to start");
            jni::JNI_ERR
        }
    }
}

#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "system" fn Agent_OnAttach(
    vm: *mut jni::JavaVM,
    options: *mut std::os::raw::c_char,
    _reserved: *mut std::ffi::c_void,
) -> jni::jint {
    agent_entry(vm, options)
}

#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "system" fn Agent_OnLoad(
    vm: *mut jni::JavaVM,
    options: *mut std::os::raw::c_char,
    _reserved: *mut std::ffi::c_void,
) -> jni::jint {
    agent_entry(vm, options)
}

#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "system" fn Agent_OnUnload(_vm: *mut jni::JavaVM) {
    stop();
}
