//! Safe wrapper around the JVMTI environment pointer.
//!
//! Unlike JNI environments, a `jvmtiEnv` may be used from any attached
//! thread, so the wrapper is shared freely inside the session.

use std::ptr;

use crate::sys::jni;
use crate::sys::jvmti;

pub struct Jvmti {
    env: *mut jvmti::jvmtiEnv,
}

unsafe impl Send for Jvmti {}
unsafe impl Sync for Jvmti {}

impl Jvmti {
    /// Obtain the tooling interface from a running VM.
    pub fn new(vm: *mut jni::JavaVM) -> Result<Self, jni::jint> {
        let mut env_ptr: *mut std::ffi::c_void = ptr::null_mut();

        unsafe {
            let get_env_fn = (**vm).GetEnv;
            let res = get_env_fn(vm, &mut env_ptr, jvmti::JVMTI_VERSION_1_2);
            if res != jni::JNI_OK {
                return Err(res);
            }
        }

        Ok(Jvmti {
            env: env_ptr as *mut jvmti::jvmtiEnv,
        })
    }

    /// # Safety
    /// The caller must ensure the pointer is a valid jvmtiEnv.
    pub unsafe fn from_raw(env: *mut jvmti::jvmtiEnv) -> Self {
        Jvmti { env }
    }

    pub fn raw(&self) -> *mut jvmti::jvmtiEnv {
        self.env
    }

    pub fn add_capabilities(
        &self,
        caps: &jvmti::jvmtiCapabilities,
    ) -> Result<(), jvmti::jvmtiError> {
        unsafe {
            let add_fn = (*(*self.env).functions).AddCapabilities.unwrap();
            let err = add_fn(self.env, caps);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn relinquish_capabilities(
        &self,
        caps: &jvmti::jvmtiCapabilities,
    ) -> Result<(), jvmti::jvmtiError> {
        unsafe {
            let rel_fn = (*(*self.env).functions).RelinquishCapabilities.unwrap();
            let err = rel_fn(self.env, caps);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn set_event_callbacks(
        &self,
        callbacks: jvmti::jvmtiEventCallbacks,
    ) -> Result<(), jvmti::jvmtiError> {
        unsafe {
            let set_fn = (*(*self.env).functions).SetEventCallbacks.unwrap();
            let size = std::mem::size_of::<jvmti::jvmtiEventCallbacks>() as i32;
            let err = set_fn(self.env, &callbacks, size);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn set_event_notification_mode(
        &self,
        enable: bool,
        event_type: u32,
        thread: jni::jthread,
    ) -> Result<(), jvmti::jvmtiError> {
        unsafe {
            let mode_fn = (*(*self.env).functions).SetEventNotificationMode.unwrap();
            let mode = if enable {
                jvmti::JVMTI_ENABLE
            } else {
                jvmti::JVMTI_DISABLE
            };
            let err = mode_fn(self.env, mode, event_type, thread);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn get_loaded_classes(&self) -> Result<Vec<jni::jclass>, jvmti::jvmtiError> {
        let mut class_count: jni::jint = 0;
        let mut classes_ptr: *mut jni::jclass = ptr::null_mut();

        unsafe {
            let get_fn = (*(*self.env).functions).GetLoadedClasses.unwrap();
            let err = get_fn(self.env, &mut class_count, &mut classes_ptr);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }

            let classes = std::slice::from_raw_parts(classes_ptr, class_count as usize).to_vec();
            self.deallocate(classes_ptr as *mut u8)?;
            Ok(classes)
        }
    }

    /// Class signature in JVM form, e.g. `Ljava/lang/String;`.
    pub fn get_class_signature(&self, klass: jni::jclass) -> Result<String, jvmti::jvmtiError> {
        let mut sig_ptr: *mut std::os::raw::c_char = ptr::null_mut();
        let mut gen_ptr: *mut std::os::raw::c_char = ptr::null_mut();

        unsafe {
            let sig_fn = (*(*self.env).functions).GetClassSignature.unwrap();
            let err = sig_fn(self.env, klass, &mut sig_ptr, &mut gen_ptr);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }

            let signature = std::ffi::CStr::from_ptr(sig_ptr)
                .to_string_lossy()
                .into_owned();
            self.deallocate(sig_ptr as *mut u8)?;
            if !gen_ptr.is_null() {
                self.deallocate(gen_ptr as *mut u8)?;
            }

            Ok(signature)
        }
    }

    pub fn allocate(&self, size: jni::jlong) -> Result<*mut u8, jvmti::jvmtiError> {
        let mut mem_ptr: *mut u8 = ptr::null_mut();
        unsafe {
            let alloc_fn = (*(*self.env).functions).Allocate.unwrap();
            let err = alloc_fn(self.env, size, &mut mem_ptr);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }
        }
        Ok(mem_ptr)
    }

    pub fn deallocate(&self, mem: *mut u8) -> Result<(), jvmti::jvmtiError> {
        if mem.is_null() {
            return Ok(());
        }
        unsafe {
            let dealloc_fn = (*(*self.env).functions).Deallocate.unwrap();
            let err = dealloc_fn(self.env, mem);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }
        }
        Ok(())
    }

    /// Replace one class's implementation in place.
    pub fn redefine_class(
        &self,
        klass: jni::jclass,
        new_bytes: &[u8],
    ) -> Result<(), jvmti::jvmtiError> {
        let definition = jvmti::jvmtiClassDefinition {
            klass,
            class_byte_count: new_bytes.len() as jni::jint,
            class_bytes: new_bytes.as_ptr(),
        };
        unsafe {
            let redefine_fn = (*(*self.env).functions).RedefineClasses.unwrap();
            let err = redefine_fn(self.env, 1, &definition);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }
        }
        Ok(())
    }

    /// Re-run the load-time transformation pipeline for one loaded class.
    pub fn retransform_class(&self, klass: jni::jclass) -> Result<(), jvmti::jvmtiError> {
        unsafe {
            let retransform_fn = (*(*self.env).functions).RetransformClasses.unwrap();
            let err = retransform_fn(self.env, 1, &klass);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }
        }
        Ok(())
    }

    /// Human-readable name for a JVMTI error code, for logs.
    pub fn get_error_name(&self, error: jvmti::jvmtiError) -> Option<String> {
        let mut name_ptr: *mut std::os::raw::c_char = ptr::null_mut();
        unsafe {
            let name_fn = (*(*self.env).functions).GetErrorName?;
            if name_fn(self.env, error, &mut name_ptr) != jvmti::jvmtiError::NONE {
                return None;
            }
            let name = std::ffi::CStr::from_ptr(name_ptr)
                .to_string_lossy()
                .into_owned();
            let _ = self.deallocate(name_ptr as *mut u8);
            Some(name)
        }
    }
}
