//! Class-load interception.
//!
//! The runtime invokes [`on_class_file_load`] synchronously, on its own
//! thread, for every class about to be defined or redefined. The hook
//! adapts the managed-side listener list to the [`ClassTransformer`] chain
//! and substitutes the winning replacement. It executes inline on the
//! loading thread, so everything here stays allocation-light, and nothing
//! is allowed to unwind across the FFI boundary.

use std::ffi::CStr;
use std::os::raw::{c_char, c_uchar};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::env::{JniEnv, Jvmti};
use crate::listeners::{run_chain, ClassTransformer, TransformError};
use crate::registry::{ClassHandle, ClassRegistry};
use crate::sys::jni;
use crate::sys::jvmti;

/// Managed hub class holding the listener list (canonical dotted name).
pub const HUB_CLASS: &str = "dev.classweave.runtime.Hub";
const HUB_CLASS_INTERNAL: &str = "dev/classweave/runtime/Hub";
const TRANSFORMER_CLASS_INTERNAL: &str = "dev/classweave/runtime/ClassTransformer";

// =============================================================================
// Hook install state
// =============================================================================

/// Two-state machine: `UNINSTALLED` <-> `INSTALLED`. Transitions are
/// one-shot in each direction so install and uninstall are both idempotent.
#[derive(Default)]
pub struct HookState {
    installed: AtomicBool,
}

impl HookState {
    /// Returns `true` if this call performed the transition.
    pub fn begin_install(&self) -> bool {
        !self.installed.swap(true, Ordering::SeqCst)
    }

    /// Returns `true` if this call performed the transition.
    pub fn begin_uninstall(&self) -> bool {
        self.installed.swap(false, Ordering::SeqCst)
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }
}

/// Owns the runtime's class-file-load notification.
#[derive(Default)]
pub struct ClassLoadHook {
    state: HookState,
}

impl ClassLoadHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_installed(&self) -> bool {
        self.state.is_installed()
    }

    /// Enable class-file-load and VM-death notification. Idempotent.
    pub fn install(&self, ti: &Jvmti) -> Result<(), jvmti::jvmtiError> {
        if !self.state.begin_install() {
            return Ok(());
        }

        let mut callbacks = jvmti::jvmtiEventCallbacks::default();
        callbacks.ClassFileLoadHook = Some(on_class_file_load);
        callbacks.VMDeath = Some(on_vm_death);

        let result = ti.set_event_callbacks(callbacks).and_then(|_| {
            ti.set_event_notification_mode(
                true,
                jvmti::JVMTI_EVENT_CLASS_FILE_LOAD_HOOK,
                ptr::null_mut(),
            )?;
            ti.set_event_notification_mode(true, jvmti::JVMTI_EVENT_VM_DEATH, ptr::null_mut())
        });

        if let Err(e) = result {
            self.state.begin_uninstall();
            return Err(e);
        }

        info!("class load hook installed");
        Ok(())
    }

    /// Disable notifications. Idempotent; errors during teardown are only
    /// logged since the VM may already be shutting down.
    pub fn uninstall(&self, ti: &Jvmti) {
        if !self.state.begin_uninstall() {
            return;
        }

        for event in [
            jvmti::JVMTI_EVENT_CLASS_FILE_LOAD_HOOK,
            jvmti::JVMTI_EVENT_VM_DEATH,
        ] {
            if let Err(e) = ti.set_event_notification_mode(false, event, ptr::null_mut()) {
                debug!(event, error = ?e, "failed to disable event notification");
            }
        }
        info!("class load hook uninstalled");
    }
}

// =============================================================================
// Managed listener bridge
// =============================================================================

/// Handles into the managed side, resolved once and cached in the session.
/// Method and field IDs are valid process-wide; the hub reference is global.
pub struct ManagedChain {
    hub: jni::jclass,
    listeners_field: jni::jfieldID,
    on_load: jni::jmethodID,
    iterator: jni::jmethodID,
    has_next: jni::jmethodID,
    next: jni::jmethodID,
}

unsafe impl Send for ManagedChain {}
unsafe impl Sync for ManagedChain {}

impl ManagedChain {
    /// Resolve the hub class and every handle the hook needs. Returns `None`
    /// while the managed runtime classes are not loaded yet; the caller
    /// retries on the next event and caches the first success.
    pub fn resolve(env: &JniEnv, registry: &ClassRegistry) -> Option<ManagedChain> {
        let hub = match registry.lookup(HUB_CLASS) {
            Some(handle) => handle.as_jclass(),
            None => {
                let local = env.find_class(HUB_CLASS_INTERNAL)?;
                let global = env.new_global_ref(local);
                env.delete_local_ref(local);
                if global.is_null() {
                    return None;
                }
                registry.insert(HUB_CLASS, ClassHandle::from_global_ref(global));
                global
            }
        };

        let transformer_cls = env.find_class(TRANSFORMER_CLASS_INTERNAL)?;
        let list_cls = env.find_class("java/util/List")?;
        let iterator_cls = env.find_class("java/util/Iterator")?;

        let chain = ManagedChain {
            hub,
            listeners_field: env.get_static_field_id(hub, "loadListeners", "Ljava/util/List;")?,
            on_load: env.get_method_id(transformer_cls, "onLoad", "(Ljava/lang/String;[B)[B")?,
            iterator: env.get_method_id(list_cls, "iterator", "()Ljava/util/Iterator;")?,
            has_next: env.get_method_id(iterator_cls, "hasNext", "()Z")?,
            next: env.get_method_id(iterator_cls, "next", "()Ljava/lang/Object;")?,
        };

        env.delete_local_ref(transformer_cls);
        env.delete_local_ref(list_cls);
        env.delete_local_ref(iterator_cls);

        info!(hub = HUB_CLASS, "managed listener chain resolved");
        Some(chain)
    }

    /// Run the managed listener chain for one class-load event.
    pub fn transform(&self, env: &JniEnv, class_name: &str, class_bytes: &[u8]) -> Option<Vec<u8>> {
        let listeners = env.get_static_object_field(self.hub, self.listeners_field);
        if listeners.is_null() {
            return None;
        }

        let iter = env.call_object_method(listeners, self.iterator, &[]);
        if env.exception_check() || iter.is_null() {
            env.exception_describe();
            env.exception_clear();
            env.delete_local_ref(listeners);
            return None;
        }

        let j_name = env.new_string_utf(class_name);
        let data_array = env.byte_array_from_slice(class_bytes);
        let (Some(j_name), Some(data_array)) = (j_name, data_array) else {
            env.delete_local_ref(iter);
            env.delete_local_ref(listeners);
            return None;
        };

        let mut listener_objs: Vec<jni::jobject> = Vec::new();
        loop {
            let more = env.call_boolean_method(iter, self.has_next, &[]);
            if env.exception_check() {
                env.exception_describe();
                env.exception_clear();
                break;
            }
            if !more {
                break;
            }
            let listener = env.call_object_method(iter, self.next, &[]);
            if env.exception_check() {
                env.exception_describe();
                env.exception_clear();
                break;
            }
            if !listener.is_null() {
                listener_objs.push(listener);
            }
        }

        let adapters: Vec<JvmListener<'_>> = listener_objs
            .iter()
            .map(|&listener| JvmListener {
                env,
                listener,
                on_load: self.on_load,
                j_name,
                data_array,
            })
            .collect();

        let result = run_chain(
            adapters.iter().map(|a| a as &dyn ClassTransformer),
            class_name,
            class_bytes,
        );

        for listener in listener_objs {
            env.delete_local_ref(listener);
        }
        env.delete_local_ref(data_array);
        env.delete_local_ref(j_name);
        env.delete_local_ref(iter);
        env.delete_local_ref(listeners);

        result
    }
}

/// Adapts one managed listener object to the transformer trait. The event's
/// name string and bytecode array are built once and shared across the
/// whole chain.
struct JvmListener<'a> {
    env: &'a JniEnv,
    listener: jni::jobject,
    on_load: jni::jmethodID,
    j_name: jni::jstring,
    data_array: jni::jbyteArray,
}

impl ClassTransformer for JvmListener<'_> {
    fn transform(&self, class_name: &str, _: &[u8]) -> Result<Option<Vec<u8>>, TransformError> {
        let args = [
            jni::jvalue { l: self.j_name },
            jni::jvalue { l: self.data_array },
        ];
        let value = self.env.call_object_method(self.listener, self.on_load, &args);

        if self.env.exception_check() {
            self.env.exception_describe();
            self.env.exception_clear();
            return Err(TransformError(format!(
                "listener threw while transforming {class_name}"
            )));
        }

        if value.is_null() {
            return Ok(None);
        }

        let replacement = self.env.byte_array_to_vec(value);
        self.env.delete_local_ref(value);
        Ok(Some(replacement))
    }
}

// =============================================================================
// Event trampolines
// =============================================================================

/// ClassFileLoadHook callback. Runs on whatever thread is loading the class;
/// must never unwind and must stay quick.
pub(crate) unsafe extern "system" fn on_class_file_load(
    jvmti_env: *mut jvmti::jvmtiEnv,
    jni_env: *mut jni::JNIEnv,
    class_being_redefined: jni::jclass,
    _loader: jni::jobject,
    name: *const c_char,
    _protection_domain: jni::jobject,
    class_data_len: jni::jint,
    class_data: *const c_uchar,
    new_class_data_len: *mut jni::jint,
    new_class_data: *mut *mut c_uchar,
) {
    let _ = catch_unwind(AssertUnwindSafe(|| unsafe {
        let Some(session) = crate::current_session() else {
            return;
        };
        if name.is_null() || class_data.is_null() || class_data_len < 0 {
            return;
        }

        let internal = CStr::from_ptr(name).to_string_lossy();
        let dotted = internal.replace('/', ".");
        let env = JniEnv::from_raw(jni_env);

        // Keep redefinition targets resolvable by name. Fresh loads have no
        // jclass yet; they enter the registry via snapshot or define_class.
        if !class_being_redefined.is_null() && session.resolve(&dotted).is_none() {
            let global = env.new_global_ref(class_being_redefined);
            if !global.is_null()
                && !session
                    .registry()
                    .insert(&dotted, ClassHandle::from_global_ref(global))
            {
                env.delete_global_ref(global);
            }
        }

        let data = std::slice::from_raw_parts(class_data, class_data_len as usize);
        let Some(replacement) = session.transform_class(&env, &dotted, data) else {
            return;
        };

        // The VM frees the replacement buffer, so it must come from the
        // VM's own allocator.
        let ti = Jvmti::from_raw(jvmti_env);
        match ti.allocate(replacement.len() as jni::jlong) {
            Ok(buf) => {
                ptr::copy_nonoverlapping(replacement.as_ptr(), buf, replacement.len());
                *new_class_data_len = replacement.len() as jni::jint;
                *new_class_data = buf;
                debug!(class = %dotted, bytes = replacement.len(), "substituted class bytecode");
            }
            Err(e) => warn!(class = %dotted, error = ?e, "VM allocation for replacement failed"),
        }
    }));
}

/// VMDeath callback: the runtime is going away; tear the session down.
pub(crate) unsafe extern "system" fn on_vm_death(
    _jvmti_env: *mut jvmti::jvmtiEnv,
    _jni_env: *mut jni::JNIEnv,
) {
    let _ = catch_unwind(|| {
        info!("VM death; shutting agent down");
        crate::stop();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_state_transitions_are_one_shot() {
        let state = HookState::default();
        assert!(!state.is_installed());

        assert!(state.begin_install());
        assert!(state.is_installed());
        assert!(!state.begin_install(), "second install is a no-op");

        assert!(state.begin_uninstall());
        assert!(!state.is_installed());
        assert!(!state.begin_uninstall(), "second uninstall is a no-op");
        assert!(!state.is_installed());
    }
}
