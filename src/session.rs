//! The agent session: owns the VM attachment and mediates every registry,
//! hook, and redefinition operation.
//!
//! Exactly one session exists per process, created by [`crate::start`] and
//! torn down once by [`AgentSession::shutdown`] (idempotent, callable from
//! any thread including the dispatcher's own).

use std::cell::Cell;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::dispatcher::CommandHandler;
use crate::env::{JavaVm, JniEnv, Jvmti};
use crate::error::{AttachError, OpError};
use crate::hook::{ClassLoadHook, ManagedChain, HUB_CLASS};
use crate::registry::{ClassHandle, ClassRegistry};
use crate::sys::jni;
use crate::sys::jvmti::jvmtiCapabilities;

/// Outcome of loading a jar through the managed hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Ok,
    ExceptionCaught,
    ClassNotLoaded,
}

impl std::fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadStatus::Ok => write!(f, "OK"),
            LoadStatus::ExceptionCaught => write!(f, "Exception caught"),
            LoadStatus::ClassNotLoaded => write!(f, "Class not loaded"),
        }
    }
}

pub struct AgentSession {
    vm: JavaVm,
    ti: Jvmti,
    caps: jvmtiCapabilities,
    registry: ClassRegistry,
    hook: ClassLoadHook,
    chain: OnceLock<ManagedChain>,
    config: SessionConfig,
    running: Arc<AtomicBool>,
    torn_down: AtomicBool,
}

impl AgentSession {
    /// Attach to the running VM: daemon-attach the calling thread, acquire
    /// the tooling interface, request the redefine/retransform capability
    /// set, and snapshot the currently loaded classes.
    ///
    /// # Safety
    /// `vm_ptr` must be the live `JavaVM` pointer of this process.
    pub unsafe fn attach(
        vm_ptr: *mut jni::JavaVM,
        config: SessionConfig,
    ) -> Result<Arc<AgentSession>, AttachError> {
        let vm = JavaVm::from_raw(vm_ptr);
        let env = vm
            .attach_current_thread_as_daemon()
            .map_err(AttachError::AttachThread)?;
        let ti = Jvmti::new(vm_ptr).map_err(AttachError::ToolingInterface)?;

        let mut caps = jvmtiCapabilities::default();
        caps.set_can_redefine_classes(true);
        caps.set_can_redefine_any_class(true);
        caps.set_can_retransform_classes(true);
        caps.set_can_retransform_any_class(true);
        caps.set_can_generate_all_class_hook_events(true);
        ti.add_capabilities(&caps).map_err(AttachError::Capabilities)?;

        let session = Arc::new(AgentSession {
            vm,
            ti,
            caps,
            registry: ClassRegistry::new(),
            hook: ClassLoadHook::new(),
            chain: OnceLock::new(),
            config,
            running: Arc::new(AtomicBool::new(false)),
            torn_down: AtomicBool::new(false),
        });

        session.snapshot_classes(&env);
        Ok(session)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn vm(&self) -> &JavaVm {
        &self.vm
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn hook_installed(&self) -> bool {
        self.hook.is_installed()
    }

    /// Install the class-load hook and VM-death notification. The global
    /// session must be reachable before this is called, since events start
    /// firing immediately.
    pub fn install_hook(&self) -> Result<(), AttachError> {
        self.hook.install(&self.ti).map_err(AttachError::Callbacks)
    }

    /// One-time resolution of the managed-side handles, plus registration
    /// of the native entry points on the hub. Harmless to call before the
    /// managed runtime classes are loaded; resolution is retried lazily by
    /// the hook and cached on first success.
    pub fn init_managed(&self, env: &JniEnv) {
        if self.managed_chain(env).is_none() {
            debug!(hub = HUB_CLASS, "managed hub not loaded yet; deferring");
            return;
        }
        if let Some(hub) = self.registry.lookup(HUB_CLASS) {
            match crate::natives::register(env, hub.as_jclass()) {
                Ok(()) => info!("native entry points registered"),
                Err(code) => warn!(code, "failed to register native entry points"),
            }
        }
    }

    /// Enumerate all currently loaded classes into the registry. Returns the
    /// number of newly inserted entries; existing entries are kept.
    pub fn snapshot_classes(&self, env: &JniEnv) -> usize {
        let classes = match self.ti.get_loaded_classes() {
            Ok(classes) => classes,
            Err(e) => {
                warn!(error = ?e, "failed to enumerate loaded classes");
                return 0;
            }
        };

        let mut added = 0;
        for klass in classes {
            if let Some(name) = self
                .ti
                .get_class_signature(klass)
                .ok()
                .as_deref()
                .and_then(signature_to_name)
            {
                if self.registry.lookup(&name).is_none() {
                    let global = env.new_global_ref(klass);
                    if !global.is_null() {
                        if self
                            .registry
                            .insert(&name, ClassHandle::from_global_ref(global))
                        {
                            added += 1;
                        } else {
                            env.delete_global_ref(global);
                        }
                    }
                }
            }
            env.delete_local_ref(klass);
        }

        info!(total = self.registry.len(), added, "class snapshot complete");
        added
    }

    /// Registry lookup by canonical dotted name. Misses do not trigger a
    /// re-scan; call [`AgentSession::snapshot_classes`] for freshness.
    pub fn resolve(&self, name: &str) -> Option<ClassHandle> {
        self.registry.lookup(name)
    }

    /// Define a class from raw bytecode and cache it under `name` (dotted).
    pub fn define_class(
        &self,
        env: &JniEnv,
        name: &str,
        loader: jni::jobject,
        bytes: &[u8],
    ) -> Option<ClassHandle> {
        let internal = name.replace('.', "/");
        let Some(local) = env.define_class(&internal, loader, bytes) else {
            if env.exception_check() {
                env.exception_describe();
                env.exception_clear();
            }
            warn!(name, "failed to define class");
            return None;
        };

        let global = env.new_global_ref(local);
        env.delete_local_ref(local);
        if global.is_null() {
            return None;
        }

        let handle = ClassHandle::from_global_ref(global);
        if !self.registry.insert(name, handle) {
            env.delete_global_ref(global);
            return self.registry.lookup(name);
        }
        Some(handle)
    }

    /// Replace one class's method bodies in place; identity is preserved.
    pub fn redefine(&self, handle: ClassHandle, new_bytes: &[u8]) -> Result<(), OpError> {
        self.redefine_target(handle.as_jclass(), new_bytes)
    }

    pub(crate) fn redefine_target(
        &self,
        klass: jni::jclass,
        new_bytes: &[u8],
    ) -> Result<(), OpError> {
        self.ti.redefine_class(klass, new_bytes).map_err(|e| {
            let name = self
                .ti
                .get_error_name(e)
                .unwrap_or_else(|| format!("{e:?}"));
            warn!(error = %name, "redefinition rejected");
            OpError::Ti(e)
        })
    }

    pub fn redefine_by_name(&self, name: &str, new_bytes: &[u8]) -> Result<(), OpError> {
        let handle = self.resolve(name).ok_or(OpError::NotFound)?;
        self.redefine(handle, new_bytes)
    }

    /// Ask the runtime to re-run the load-time transformation pipeline
    /// (which fires the hook again) for one loaded class.
    pub fn retransform(&self, handle: ClassHandle) -> Result<(), OpError> {
        self.retransform_target(handle.as_jclass())
    }

    pub(crate) fn retransform_target(&self, klass: jni::jclass) -> Result<(), OpError> {
        self.ti.retransform_class(klass).map_err(|e| {
            let name = self
                .ti
                .get_error_name(e)
                .unwrap_or_else(|| format!("{e:?}"));
            warn!(error = %name, "retransformation rejected");
            OpError::Ti(e)
        })
    }

    pub fn retransform_by_name(&self, name: &str) -> Result<(), OpError> {
        let handle = self.resolve(name).ok_or(OpError::NotFound)?;
        self.retransform(handle)
    }

    /// Load the jar at `path` and invoke `entry_class`'s agent-load routine
    /// through the managed hub.
    pub fn load_and_run(&self, env: &JniEnv, path: &Path, entry_class: &str) -> LoadStatus {
        let Some(hub) = self.registry.lookup(HUB_CLASS) else {
            return LoadStatus::ClassNotLoaded;
        };
        let hub = hub.as_jclass();

        let Some(load_agent) =
            env.get_static_method_id(hub, "loadAgent", "(Ljava/lang/String;Ljava/lang/String;)V")
        else {
            return LoadStatus::ClassNotLoaded;
        };

        let path_str = path.to_string_lossy();
        let (Some(j_path), Some(j_entry)) = (
            env.new_string_utf(&path_str),
            env.new_string_utf(entry_class),
        ) else {
            return LoadStatus::ExceptionCaught;
        };

        let args = [jni::jvalue { l: j_path }, jni::jvalue { l: j_entry }];
        env.call_static_void_method(hub, load_agent, &args);
        env.delete_local_ref(j_entry);
        env.delete_local_ref(j_path);

        if env.exception_check() {
            env.exception_describe();
            env.exception_clear();
            return LoadStatus::ExceptionCaught;
        }
        LoadStatus::Ok
    }

    /// Run the managed transformer chain for one class-load event.
    pub fn transform_class(
        &self,
        env: &JniEnv,
        class_name: &str,
        class_bytes: &[u8],
    ) -> Option<Vec<u8>> {
        let chain = self.managed_chain(env)?;
        chain.transform(env, class_name, class_bytes)
    }

    /// Cached managed-side handles, resolved on first use. Resolution loads
    /// classes and would re-enter the hook on this thread, so a thread-local
    /// guard suppresses recursive attempts.
    fn managed_chain(&self, env: &JniEnv) -> Option<&ManagedChain> {
        if let Some(chain) = self.chain.get() {
            return Some(chain);
        }

        thread_local! {
            static RESOLVING: Cell<bool> = const { Cell::new(false) };
        }
        if RESOLVING.with(|flag| flag.replace(true)) {
            return None;
        }
        let resolved = ManagedChain::resolve(env, &self.registry);
        RESOLVING.with(|flag| flag.set(false));

        let _ = self.chain.set(resolved?);
        self.chain.get()
    }

    /// Tear the session down: disable the hook, release capabilities, and
    /// signal the dispatcher loop to exit. Idempotent; safe on any thread.
    pub fn shutdown(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }

        self.hook.uninstall(&self.ti);
        if let Err(e) = self.ti.relinquish_capabilities(&self.caps) {
            debug!(error = ?e, "failed to relinquish capabilities");
        }
        self.running.store(false, Ordering::SeqCst);
        info!("session shut down");
    }
}

impl CommandHandler for AgentSession {
    fn load_jar(&self, path: &Path, entry_class: &str) {
        // The dispatcher thread attaches itself lazily; an already-attached
        // thread just gets its environment back.
        match self.vm.attach_current_thread_as_daemon() {
            Ok(env) => {
                let status = self.load_and_run(&env, path, entry_class);
                info!(?path, entry_class, %status, "jar load finished");
            }
            Err(code) => warn!(code, "could not attach dispatcher thread to the VM"),
        }
    }

    fn shutdown(&self) {
        AgentSession::shutdown(self);
    }
}

/// `Ljava/lang/String;` -> `java.lang.String`; array signatures keep their
/// bracket form, matching `Class.getName()`.
fn signature_to_name(signature: &str) -> Option<String> {
    if let Some(inner) = signature.strip_prefix('L').and_then(|s| s.strip_suffix(';')) {
        Some(inner.replace('/', "."))
    } else if signature.starts_with('[') {
        Some(signature.replace('/', "."))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signatures_convert_to_canonical_names() {
        assert_eq!(
            signature_to_name("Ljava/lang/String;").as_deref(),
            Some("java.lang.String")
        );
        assert_eq!(
            signature_to_name("[Ljava/util/Map;").as_deref(),
            Some("[Ljava.util.Map;")
        );
        assert_eq!(signature_to_name("[B").as_deref(), Some("[B"));
        assert_eq!(signature_to_name("I"), None);
    }

    #[test]
    fn load_status_display_matches_protocol_wording() {
        assert_eq!(LoadStatus::Ok.to_string(), "OK");
        assert_eq!(LoadStatus::ExceptionCaught.to_string(), "Exception caught");
        assert_eq!(LoadStatus::ClassNotLoaded.to_string(), "Class not loaded");
    }
}
