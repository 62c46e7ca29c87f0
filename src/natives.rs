//! Native entry points exposed to managed code.
//!
//! Once the managed hub class is loaded, these are registered on it so
//! managed-side tooling can trigger redefinition and retransformation
//! directly, and notify the agent when the runtime is tearing itself down.
//! Every entry resolves through the session; name-based variants fail with
//! [`crate::error::STATUS_CLASS_NOT_FOUND`] instead of re-scanning.

use std::ffi::c_void;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::env::JniEnv;
use crate::sys::jni;

/// Register the entry points on the hub class.
pub(crate) fn register(env: &JniEnv, hub: jni::jclass) -> Result<(), jni::jint> {
    let methods = [
        jni::JNINativeMethod {
            name: b"redefineClass\0".as_ptr() as *const c_char,
            signature: b"(Ljava/lang/String;[B)I\0".as_ptr() as *const c_char,
            fnPtr: redefine_by_name as *mut c_void,
        },
        jni::JNINativeMethod {
            name: b"redefineClass\0".as_ptr() as *const c_char,
            signature: b"(Ljava/lang/Class;[B)I\0".as_ptr() as *const c_char,
            fnPtr: redefine_by_class as *mut c_void,
        },
        jni::JNINativeMethod {
            name: b"retransformClass\0".as_ptr() as *const c_char,
            signature: b"(Ljava/lang/String;)I\0".as_ptr() as *const c_char,
            fnPtr: retransform_by_name as *mut c_void,
        },
        jni::JNINativeMethod {
            name: b"retransformClass\0".as_ptr() as *const c_char,
            signature: b"(Ljava/lang/Class;)I\0".as_ptr() as *const c_char,
            fnPtr: retransform_by_class as *mut c_void,
        },
        jni::JNINativeMethod {
            name: b"notifyShutdown\0".as_ptr() as *const c_char,
            signature: b"()V\0".as_ptr() as *const c_char,
            fnPtr: notify_shutdown as *mut c_void,
        },
    ];
    env.register_natives(hub, &methods)
}

unsafe extern "system" fn redefine_by_name(
    env: *mut jni::JNIEnv,
    _owner: jni::jclass,
    j_name: jni::jstring,
    new_bytes: jni::jbyteArray,
) -> jni::jint {
    catch_unwind(AssertUnwindSafe(|| unsafe {
        let Some(session) = crate::current_session() else {
            return jni::JNI_ERR;
        };
        let env = JniEnv::from_raw(env);
        let Some(name) = env.get_string_utf(j_name) else {
            return jni::JNI_ERR;
        };
        if new_bytes.is_null() {
            return jni::JNI_ERR;
        }
        let bytes = env.byte_array_to_vec(new_bytes);
        match session.redefine_by_name(&name, &bytes) {
            Ok(()) => 0,
            Err(e) => e.status_code(),
        }
    }))
    .unwrap_or(jni::JNI_ERR)
}

unsafe extern "system" fn redefine_by_class(
    env: *mut jni::JNIEnv,
    _owner: jni::jclass,
    target: jni::jclass,
    new_bytes: jni::jbyteArray,
) -> jni::jint {
    catch_unwind(AssertUnwindSafe(|| unsafe {
        let Some(session) = crate::current_session() else {
            return jni::JNI_ERR;
        };
        if target.is_null() || new_bytes.is_null() {
            return jni::JNI_ERR;
        }
        let env = JniEnv::from_raw(env);
        let bytes = env.byte_array_to_vec(new_bytes);
        match session.redefine_target(target, &bytes) {
            Ok(()) => 0,
            Err(e) => e.status_code(),
        }
    }))
    .unwrap_or(jni::JNI_ERR)
}

unsafe extern "system" fn retransform_by_name(
    env: *mut jni::JNIEnv,
    _owner: jni::jclass,
    j_name: jni::jstring,
) -> jni::jint {
    catch_unwind(AssertUnwindSafe(|| unsafe {
        let Some(session) = crate::current_session() else {
            return jni::JNI_ERR;
        };
        let env = JniEnv::from_raw(env);
        let Some(name) = env.get_string_utf(j_name) else {
            return jni::JNI_ERR;
        };
        match session.retransform_by_name(&name) {
            Ok(()) => 0,
            Err(e) => e.status_code(),
        }
    }))
    .unwrap_or(jni::JNI_ERR)
}

unsafe extern "system" fn retransform_by_class(
    _env: *mut jni::JNIEnv,
    _owner: jni::jclass,
    target: jni::jclass,
) -> jni::jint {
    catch_unwind(AssertUnwindSafe(|| {
        let Some(session) = crate::current_session() else {
            return jni::JNI_ERR;
        };
        if target.is_null() {
            return jni::JNI_ERR;
        }
        match session.retransform_target(target) {
            Ok(()) => 0,
            Err(e) => e.status_code(),
        }
    }))
    .unwrap_or(jni::JNI_ERR)
}

unsafe extern "system" fn notify_shutdown(_env: *mut jni::JNIEnv, _owner: jni::jclass) {
    let _ = catch_unwind(|| {
        crate::stop();
    });
}
