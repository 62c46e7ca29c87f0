//! High-level environment wrappers for JVMTI and JNI.
//!
//! [`Jvmti`] wraps the tooling interface (shared across threads); [`JniEnv`]
//! wraps a thread-local JNI environment; [`JavaVm`] hands out environments
//! to threads that attach themselves.

pub use crate::jni_wrapper::{JavaVm, JniEnv};
pub use crate::jvmti_wrapper::Jvmti;
