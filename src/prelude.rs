//! Common imports for embedding or driving the agent.
//!
//! Intentionally small: the types a controller or host needs, nothing more.

pub use crate::config::SessionConfig;
pub use crate::env::{JavaVm, JniEnv, Jvmti};
pub use crate::error::{AgentError, AttachError, ChannelError, OpError};
pub use crate::protocol::Message;
pub use crate::registry::{ClassHandle, ClassRegistry};
pub use crate::session::{AgentSession, LoadStatus};
pub use crate::sys::{jni, jvmti};
