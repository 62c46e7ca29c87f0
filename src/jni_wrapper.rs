//! Safe wrappers around the JNI invocation and environment pointers.
//!
//! A [`JniEnv`] is tied to the thread it was obtained on and must not be
//! sent across threads; each thread that talks to the VM attaches itself and
//! gets its own environment via [`JavaVm`].

use std::ffi::{c_void, CStr, CString};
use std::ptr;

use crate::sys::jni;

/// Wrapper around the process-wide `JavaVM` pointer.
///
/// The pointer itself is valid on any thread; only the environments handed
/// out by the attach calls are thread-local.
#[derive(Clone, Copy)]
pub struct JavaVm {
    vm: *mut jni::JavaVM,
}

unsafe impl Send for JavaVm {}
unsafe impl Sync for JavaVm {}

impl JavaVm {
    /// # Safety
    /// `vm` must be the live `JavaVM` pointer handed to the agent entry point.
    pub unsafe fn from_raw(vm: *mut jni::JavaVM) -> Self {
        JavaVm { vm }
    }

    pub fn raw(&self) -> *mut jni::JavaVM {
        self.vm
    }

    /// Attach the calling thread as a daemon and return its environment.
    /// Already-attached threads get their existing environment back.
    pub fn attach_current_thread_as_daemon(&self) -> Result<JniEnv, jni::jint> {
        let mut env_ptr: *mut c_void = ptr::null_mut();
        unsafe {
            let attach_fn = (**self.vm).AttachCurrentThreadAsDaemon;
            let res = attach_fn(self.vm, &mut env_ptr, ptr::null_mut());
            if res != jni::JNI_OK {
                return Err(res);
            }
            Ok(JniEnv::from_raw(env_ptr as *mut jni::JNIEnv))
        }
    }

    /// Detach the calling thread. Only threads the agent itself attached may
    /// do this; detaching a VM-owned thread corrupts it.
    pub fn detach_current_thread(&self) {
        unsafe {
            let detach_fn = (**self.vm).DetachCurrentThread;
            let _ = detach_fn(self.vm);
        }
    }
}

/// Safe wrapper around a thread-local JNI environment pointer.
pub struct JniEnv {
    env: *mut jni::JNIEnv,
}

impl JniEnv {
    /// # Safety
    /// The pointer must be valid and belong to the current thread.
    pub unsafe fn from_raw(env: *mut jni::JNIEnv) -> Self {
        JniEnv { env }
    }

    pub fn raw(&self) -> *mut jni::JNIEnv {
        self.env
    }

    // =========================================================================
    // Classes
    // =========================================================================

    /// Find a class by its internal name ('/' separators).
    pub fn find_class(&self, name: &str) -> Option<jni::jclass> {
        let c_name = CString::new(name).ok()?;
        unsafe {
            let vtable = *self.env;
            let cls = ((*vtable).FindClass)(self.env, c_name.as_ptr());
            if cls.is_null() {
                // FindClass throws NoClassDefFoundError on miss.
                self.exception_clear();
                None
            } else {
                Some(cls)
            }
        }
    }

    /// Define a class from raw bytecode in the given loader.
    pub fn define_class(
        &self,
        name: &str,
        loader: jni::jobject,
        bytes: &[u8],
    ) -> Option<jni::jclass> {
        let c_name = CString::new(name).ok()?;
        unsafe {
            let vtable = *self.env;
            let cls = ((*vtable).DefineClass)(
                self.env,
                c_name.as_ptr(),
                loader,
                bytes.as_ptr() as *const jni::jbyte,
                bytes.len() as jni::jsize,
            );
            if cls.is_null() {
                None
            } else {
                Some(cls)
            }
        }
    }

    // =========================================================================
    // Exceptions
    // =========================================================================

    pub fn exception_check(&self) -> bool {
        unsafe {
            let vtable = *self.env;
            ((*vtable).ExceptionCheck)(self.env) != 0
        }
    }

    pub fn exception_describe(&self) {
        unsafe {
            let vtable = *self.env;
            ((*vtable).ExceptionDescribe)(self.env);
        }
    }

    pub fn exception_clear(&self) {
        unsafe {
            let vtable = *self.env;
            ((*vtable).ExceptionClear)(self.env);
        }
    }

    // =========================================================================
    // Strings
    // =========================================================================

    pub fn new_string_utf(&self, s: &str) -> Option<jni::jstring> {
        let c_str = CString::new(s).ok()?;
        unsafe {
            let vtable = *self.env;
            let jstr = ((*vtable).NewStringUTF)(self.env, c_str.as_ptr());
            if jstr.is_null() {
                None
            } else {
                Some(jstr)
            }
        }
    }

    pub fn get_string_utf(&self, s: jni::jstring) -> Option<String> {
        if s.is_null() {
            return None;
        }
        unsafe {
            let vtable = *self.env;
            let chars = ((*vtable).GetStringUTFChars)(self.env, s, ptr::null_mut());
            if chars.is_null() {
                return None;
            }
            let result = CStr::from_ptr(chars).to_str().ok().map(str::to_string);
            ((*vtable).ReleaseStringUTFChars)(self.env, s, chars);
            result
        }
    }

    // =========================================================================
    // Method / field lookup and calls
    // =========================================================================

    pub fn get_method_id(&self, cls: jni::jclass, name: &str, sig: &str) -> Option<jni::jmethodID> {
        let c_name = CString::new(name).ok()?;
        let c_sig = CString::new(sig).ok()?;
        unsafe {
            let vtable = *self.env;
            let mid = ((*vtable).GetMethodID)(self.env, cls, c_name.as_ptr(), c_sig.as_ptr());
            if mid.is_null() {
                self.exception_clear();
                None
            } else {
                Some(mid)
            }
        }
    }

    pub fn get_static_method_id(
        &self,
        cls: jni::jclass,
        name: &str,
        sig: &str,
    ) -> Option<jni::jmethodID> {
        let c_name = CString::new(name).ok()?;
        let c_sig = CString::new(sig).ok()?;
        unsafe {
            let vtable = *self.env;
            let mid =
                ((*vtable).GetStaticMethodID)(self.env, cls, c_name.as_ptr(), c_sig.as_ptr());
            if mid.is_null() {
                self.exception_clear();
                None
            } else {
                Some(mid)
            }
        }
    }

    pub fn get_static_field_id(
        &self,
        cls: jni::jclass,
        name: &str,
        sig: &str,
    ) -> Option<jni::jfieldID> {
        let c_name = CString::new(name).ok()?;
        let c_sig = CString::new(sig).ok()?;
        unsafe {
            let vtable = *self.env;
            let fid = ((*vtable).GetStaticFieldID)(self.env, cls, c_name.as_ptr(), c_sig.as_ptr());
            if fid.is_null() {
                self.exception_clear();
                None
            } else {
                Some(fid)
            }
        }
    }

    pub fn get_static_object_field(
        &self,
        cls: jni::jclass,
        field: jni::jfieldID,
    ) -> jni::jobject {
        unsafe {
            let vtable = *self.env;
            ((*vtable).GetStaticObjectField)(self.env, cls, field)
        }
    }

    pub fn call_object_method(
        &self,
        obj: jni::jobject,
        method: jni::jmethodID,
        args: &[jni::jvalue],
    ) -> jni::jobject {
        unsafe {
            let vtable = *self.env;
            ((*vtable).CallObjectMethodA)(self.env, obj, method, args.as_ptr())
        }
    }

    pub fn call_boolean_method(
        &self,
        obj: jni::jobject,
        method: jni::jmethodID,
        args: &[jni::jvalue],
    ) -> bool {
        unsafe {
            let vtable = *self.env;
            ((*vtable).CallBooleanMethodA)(self.env, obj, method, args.as_ptr()) != 0
        }
    }

    pub fn call_static_void_method(
        &self,
        cls: jni::jclass,
        method: jni::jmethodID,
        args: &[jni::jvalue],
    ) {
        unsafe {
            let vtable = *self.env;
            ((*vtable).CallStaticVoidMethodA)(self.env, cls, method, args.as_ptr());
        }
    }

    // =========================================================================
    // Byte arrays
    // =========================================================================

    pub fn get_array_length(&self, array: jni::jarray) -> jni::jsize {
        unsafe {
            let vtable = *self.env;
            ((*vtable).GetArrayLength)(self.env, array)
        }
    }

    /// Copy a Rust slice into a fresh Java byte array.
    pub fn byte_array_from_slice(&self, bytes: &[u8]) -> Option<jni::jbyteArray> {
        unsafe {
            let vtable = *self.env;
            let array = ((*vtable).NewByteArray)(self.env, bytes.len() as jni::jsize);
            if array.is_null() {
                return None;
            }
            ((*vtable).SetByteArrayRegion)(
                self.env,
                array,
                0,
                bytes.len() as jni::jsize,
                bytes.as_ptr() as *const jni::jbyte,
            );
            Some(array)
        }
    }

    /// Copy a Java byte array into a Rust vector.
    pub fn byte_array_to_vec(&self, array: jni::jbyteArray) -> Vec<u8> {
        let len = self.get_array_length(array) as usize;
        let mut buf = vec![0u8; len];
        unsafe {
            let vtable = *self.env;
            ((*vtable).GetByteArrayRegion)(
                self.env,
                array,
                0,
                len as jni::jsize,
                buf.as_mut_ptr() as *mut jni::jbyte,
            );
        }
        buf
    }

    // =========================================================================
    // References
    // =========================================================================

    pub fn new_global_ref(&self, obj: jni::jobject) -> jni::jobject {
        unsafe {
            let vtable = *self.env;
            ((*vtable).NewGlobalRef)(self.env, obj)
        }
    }

    pub fn delete_global_ref(&self, obj: jni::jobject) {
        unsafe {
            let vtable = *self.env;
            ((*vtable).DeleteGlobalRef)(self.env, obj);
        }
    }

    pub fn delete_local_ref(&self, obj: jni::jobject) {
        unsafe {
            let vtable = *self.env;
            ((*vtable).DeleteLocalRef)(self.env, obj);
        }
    }

    // =========================================================================
    // Native method registration
    // =========================================================================

    pub fn register_natives(
        &self,
        cls: jni::jclass,
        methods: &[jni::JNINativeMethod],
    ) -> Result<(), jni::jint> {
        unsafe {
            let vtable = *self.env;
            let result = ((*vtable).RegisterNatives)(
                self.env,
                cls,
                methods.as_ptr(),
                methods.len() as jni::jint,
            );
            if result == 0 {
                Ok(())
            } else {
                Err(result)
            }
        }
    }
}
