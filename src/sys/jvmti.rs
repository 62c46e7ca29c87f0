// classweave/src/sys/jvmti.rs
//
// JVMTI bindings trimmed to what the agent needs: capabilities, event
// plumbing, class enumeration, and the redefine/retransform primitives.
//
// The function table keeps the full 156-slot layout of jvmti.h (JDK 11+
// numbering; earlier JDKs leave the virtual-thread slots null). Untyped
// slots are bare pointers; position comments give the 1-based jvmti.h index.

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(dead_code)]

use std::ffi::c_void;
use std::os::raw::{c_char, c_uchar};

use crate::sys::jni::{jclass, jint, jlong, jobject, jthread, JNIEnv};

// =============================================================================
// Versions, events, modes
// =============================================================================

pub const JVMTI_VERSION_1_2: jint = 0x30010200;

pub const JVMTI_EVENT_VM_INIT: u32 = 50;
pub const JVMTI_EVENT_VM_DEATH: u32 = 51;
pub const JVMTI_EVENT_CLASS_FILE_LOAD_HOOK: u32 = 54;

pub const JVMTI_ENABLE: jint = 1;
pub const JVMTI_DISABLE: jint = 0;

// =============================================================================
// Error codes (subset the agent can actually encounter)
// =============================================================================

#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum jvmtiError {
    NONE = 0,
    INVALID_THREAD = 10,
    INVALID_CLASS = 21,
    INVALID_CLASS_FORMAT = 60,
    CIRCULAR_CLASS_DEFINITION = 61,
    FAILS_VERIFICATION = 62,
    UNSUPPORTED_REDEFINITION_METHOD_ADDED = 63,
    UNSUPPORTED_REDEFINITION_SCHEMA_CHANGED = 64,
    INVALID_TYPESTATE = 65,
    UNSUPPORTED_REDEFINITION_HIERARCHY_CHANGED = 66,
    UNSUPPORTED_REDEFINITION_METHOD_DELETED = 67,
    UNSUPPORTED_VERSION = 68,
    NAMES_DONT_MATCH = 69,
    UNMODIFIABLE_CLASS = 79,
    NOT_AVAILABLE = 98,
    MUST_POSSESS_CAPABILITY = 99,
    NULL_POINTER = 100,
    ABSENT_INFORMATION = 101,
    INVALID_EVENT_TYPE = 102,
    ILLEGAL_ARGUMENT = 103,
    OUT_OF_MEMORY = 110,
    WRONG_PHASE = 112,
    INTERNAL = 113,
}

pub type jlocation = jlong;

// =============================================================================
// Structs
// =============================================================================

#[repr(C)]
#[derive(Copy, Clone)]
pub struct jvmtiClassDefinition {
    pub klass: jclass,
    pub class_byte_count: jint,
    pub class_bytes: *const c_uchar,
}

// Capabilities are a 128-bit C bitfield; accessors below name only the bits
// this agent requests.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct jvmtiCapabilities {
    bits: [u32; 4],
}

impl Default for jvmtiCapabilities {
    fn default() -> Self {
        Self { bits: [0; 4] }
    }
}

impl jvmtiCapabilities {
    fn set_bit(&mut self, bit: usize, value: bool) {
        let word = bit / 32;
        let idx = bit % 32;
        if value {
            self.bits[word] |= 1 << idx;
        } else {
            self.bits[word] &= !(1 << idx);
        }
    }

    fn get_bit(&self, bit: usize) -> bool {
        (self.bits[bit / 32] & (1 << (bit % 32))) != 0
    }

    // [9]
    pub fn set_can_redefine_classes(&mut self, v: bool) {
        self.set_bit(9, v);
    }
    pub fn can_redefine_classes(&self) -> bool {
        self.get_bit(9)
    }

    // [21]
    pub fn set_can_redefine_any_class(&mut self, v: bool) {
        self.set_bit(21, v);
    }
    pub fn can_redefine_any_class(&self) -> bool {
        self.get_bit(21)
    }

    // [26]
    pub fn set_can_generate_all_class_hook_events(&mut self, v: bool) {
        self.set_bit(26, v);
    }
    pub fn can_generate_all_class_hook_events(&self) -> bool {
        self.get_bit(26)
    }

    // [37]
    pub fn set_can_retransform_classes(&mut self, v: bool) {
        self.set_bit(37, v);
    }
    pub fn can_retransform_classes(&self) -> bool {
        self.get_bit(37)
    }

    // [38]
    pub fn set_can_retransform_any_class(&mut self, v: bool) {
        self.set_bit(38, v);
    }
    pub fn can_retransform_any_class(&self) -> bool {
        self.get_bit(38)
    }
}

// =============================================================================
// Event callback signatures (only the events the agent handles)
// =============================================================================

pub type JvmtiVMInitFn =
    unsafe extern "system" fn(env: *mut jvmtiEnv, jni: *mut JNIEnv, thread: jthread);
pub type JvmtiVMDeathFn = unsafe extern "system" fn(env: *mut jvmtiEnv, jni: *mut JNIEnv);
pub type JvmtiClassFileLoadHookFn = unsafe extern "system" fn(
    env: *mut jvmtiEnv,
    jni: *mut JNIEnv,
    class_being_redefined: jclass,
    loader: jobject,
    name: *const c_char,
    protection_domain: jobject,
    class_data_len: jint,
    class_data: *const c_uchar,
    new_class_data_len: *mut jint,
    new_class_data: *mut *mut c_uchar,
);

/// Event callback table. Layout and field count match jvmti.h; events this
/// agent never registers stay as bare pointers (always null).
#[repr(C)]
#[derive(Copy, Clone)]
pub struct jvmtiEventCallbacks {
    pub VMInit: Option<JvmtiVMInitFn>,
    pub VMDeath: Option<JvmtiVMDeathFn>,
    pub ThreadStart: *mut c_void,
    pub ThreadEnd: *mut c_void,
    pub ClassFileLoadHook: Option<JvmtiClassFileLoadHookFn>,
    pub ClassLoad: *mut c_void,
    pub ClassPrepare: *mut c_void,
    pub VMStart: *mut c_void,
    pub Exception: *mut c_void,
    pub ExceptionCatch: *mut c_void,
    pub SingleStep: *mut c_void,
    pub FramePop: *mut c_void,
    pub Breakpoint: *mut c_void,
    pub FieldAccess: *mut c_void,
    pub FieldModification: *mut c_void,
    pub MethodEntry: *mut c_void,
    pub MethodExit: *mut c_void,
    pub NativeMethodBind: *mut c_void,
    pub CompiledMethodLoad: *mut c_void,
    pub CompiledMethodUnload: *mut c_void,
    pub DynamicCodeGenerated: *mut c_void,
    pub DataDumpRequest: *mut c_void,
    pub MonitorWait: *mut c_void,
    pub MonitorWaited: *mut c_void,
    pub MonitorContendedEnter: *mut c_void,
    pub MonitorContendedEntered: *mut c_void,
    pub ResourceExhausted: *mut c_void,
    pub GarbageCollectionStart: *mut c_void,
    pub GarbageCollectionFinish: *mut c_void,
    pub ObjectFree: *mut c_void,
    pub VMObjectAlloc: *mut c_void,
    pub SampledObjectAlloc: *mut c_void,
}

impl Default for jvmtiEventCallbacks {
    fn default() -> Self {
        // All-null table; repr(C) with only pointers/options makes this valid.
        unsafe { std::mem::zeroed() }
    }
}

// =============================================================================
// Typed function pointers for the slots the agent calls
// =============================================================================

pub type JvmtiSetEventNotificationModeFn = unsafe extern "system" fn(
    env: *mut jvmtiEnv,
    mode: jint,
    event_type: u32,
    event_thread: jthread,
) -> jvmtiError;
pub type JvmtiAllocateFn = unsafe extern "system" fn(
    env: *mut jvmtiEnv,
    size: jlong,
    mem_ptr: *mut *mut c_uchar,
) -> jvmtiError;
pub type JvmtiDeallocateFn =
    unsafe extern "system" fn(env: *mut jvmtiEnv, mem: *mut c_uchar) -> jvmtiError;
pub type JvmtiGetClassSignatureFn = unsafe extern "system" fn(
    env: *mut jvmtiEnv,
    klass: jclass,
    signature_ptr: *mut *mut c_char,
    generic_ptr: *mut *mut c_char,
) -> jvmtiError;
pub type JvmtiGetLoadedClassesFn = unsafe extern "system" fn(
    env: *mut jvmtiEnv,
    class_count_ptr: *mut jint,
    classes_ptr: *mut *mut jclass,
) -> jvmtiError;
pub type JvmtiRedefineClassesFn = unsafe extern "system" fn(
    env: *mut jvmtiEnv,
    class_count: jint,
    class_definitions: *const jvmtiClassDefinition,
) -> jvmtiError;
pub type JvmtiSetEventCallbacksFn = unsafe extern "system" fn(
    env: *mut jvmtiEnv,
    callbacks: *const jvmtiEventCallbacks,
    size_of_callbacks: jint,
) -> jvmtiError;
pub type JvmtiDisposeEnvironmentFn =
    unsafe extern "system" fn(env: *mut jvmtiEnv) -> jvmtiError;
pub type JvmtiGetErrorNameFn = unsafe extern "system" fn(
    env: *mut jvmtiEnv,
    error: jvmtiError,
    name_ptr: *mut *mut c_char,
) -> jvmtiError;
pub type JvmtiAddCapabilitiesFn = unsafe extern "system" fn(
    env: *mut jvmtiEnv,
    capabilities_ptr: *const jvmtiCapabilities,
) -> jvmtiError;
pub type JvmtiRelinquishCapabilitiesFn = unsafe extern "system" fn(
    env: *mut jvmtiEnv,
    capabilities_ptr: *const jvmtiCapabilities,
) -> jvmtiError;
pub type JvmtiRetransformClassesFn = unsafe extern "system" fn(
    env: *mut jvmtiEnv,
    class_count: jint,
    classes: *const jclass,
) -> jvmtiError;

// =============================================================================
// JVMTI function table
// =============================================================================

#[repr(C)]
pub struct jvmtiInterface_1_ {
    pub reserved1: *mut c_void,
    // 2
    pub SetEventNotificationMode: Option<JvmtiSetEventNotificationModeFn>,
    // 3-45
    pub GetAllModules: *mut c_void,
    pub GetAllThreads: *mut c_void,
    pub SuspendThread: *mut c_void,
    pub ResumeThread: *mut c_void,
    pub StopThread: *mut c_void,
    pub InterruptThread: *mut c_void,
    pub GetThreadInfo: *mut c_void,
    pub GetOwnedMonitorInfo: *mut c_void,
    pub GetCurrentContendedMonitor: *mut c_void,
    pub RunAgentThread: *mut c_void,
    pub GetTopThreadGroups: *mut c_void,
    pub GetThreadGroupInfo: *mut c_void,
    pub GetThreadGroupChildren: *mut c_void,
    pub GetFrameCount: *mut c_void,
    pub GetThreadState: *mut c_void,
    pub GetCurrentThread: *mut c_void,
    pub GetFrameLocation: *mut c_void,
    pub NotifyFramePop: *mut c_void,
    pub GetLocalObject: *mut c_void,
    pub GetLocalInt: *mut c_void,
    pub GetLocalLong: *mut c_void,
    pub GetLocalFloat: *mut c_void,
    pub GetLocalDouble: *mut c_void,
    pub SetLocalObject: *mut c_void,
    pub SetLocalInt: *mut c_void,
    pub SetLocalLong: *mut c_void,
    pub SetLocalFloat: *mut c_void,
    pub SetLocalDouble: *mut c_void,
    pub CreateRawMonitor: *mut c_void,
    pub DestroyRawMonitor: *mut c_void,
    pub RawMonitorEnter: *mut c_void,
    pub RawMonitorExit: *mut c_void,
    pub RawMonitorWait: *mut c_void,
    pub RawMonitorNotify: *mut c_void,
    pub RawMonitorNotifyAll: *mut c_void,
    pub SetBreakpoint: *mut c_void,
    pub ClearBreakpoint: *mut c_void,
    pub GetNamedModule: *mut c_void,
    pub SetFieldAccessWatch: *mut c_void,
    pub ClearFieldAccessWatch: *mut c_void,
    pub SetFieldModificationWatch: *mut c_void,
    pub ClearFieldModificationWatch: *mut c_void,
    pub IsModifiableClass: *mut c_void,
    // 46
    pub Allocate: Option<JvmtiAllocateFn>,
    // 47
    pub Deallocate: Option<JvmtiDeallocateFn>,
    // 48
    pub GetClassSignature: Option<JvmtiGetClassSignatureFn>,
    // 49-77
    pub GetClassStatus: *mut c_void,
    pub GetSourceFileName: *mut c_void,
    pub GetClassModifiers: *mut c_void,
    pub GetClassMethods: *mut c_void,
    pub GetClassFields: *mut c_void,
    pub GetImplementedInterfaces: *mut c_void,
    pub IsInterface: *mut c_void,
    pub IsArrayClass: *mut c_void,
    pub GetClassLoader: *mut c_void,
    pub GetObjectHashCode: *mut c_void,
    pub GetObjectMonitorUsage: *mut c_void,
    pub GetFieldName: *mut c_void,
    pub GetFieldDeclaringClass: *mut c_void,
    pub GetFieldModifiers: *mut c_void,
    pub IsFieldSynthetic: *mut c_void,
    pub GetMethodName: *mut c_void,
    pub GetMethodDeclaringClass: *mut c_void,
    pub GetMethodModifiers: *mut c_void,
    pub ClearAllFramePops: *mut c_void,
    pub GetMaxLocals: *mut c_void,
    pub GetArgumentsSize: *mut c_void,
    pub GetLineNumberTable: *mut c_void,
    pub GetMethodLocation: *mut c_void,
    pub GetLocalVariableTable: *mut c_void,
    pub SetNativeMethodPrefix: *mut c_void,
    pub SetNativeMethodPrefixes: *mut c_void,
    pub GetBytecodes: *mut c_void,
    pub IsMethodNative: *mut c_void,
    pub IsMethodSynthetic: *mut c_void,
    // 78
    pub GetLoadedClasses: Option<JvmtiGetLoadedClassesFn>,
    // 79-86
    pub GetClassLoaderClasses: *mut c_void,
    pub PopFrame: *mut c_void,
    pub ForceEarlyReturnObject: *mut c_void,
    pub ForceEarlyReturnInt: *mut c_void,
    pub ForceEarlyReturnLong: *mut c_void,
    pub ForceEarlyReturnFloat: *mut c_void,
    pub ForceEarlyReturnDouble: *mut c_void,
    pub ForceEarlyReturnVoid: *mut c_void,
    // 87
    pub RedefineClasses: Option<JvmtiRedefineClassesFn>,
    // 88-104
    pub GetVersionNumber: *mut c_void,
    pub GetCapabilities: *mut c_void,
    pub GetSourceDebugExtension: *mut c_void,
    pub IsMethodObsolete: *mut c_void,
    pub SuspendThreadList: *mut c_void,
    pub ResumeThreadList: *mut c_void,
    pub AddModuleReads: *mut c_void,
    pub AddModuleExports: *mut c_void,
    pub AddModuleOpens: *mut c_void,
    pub AddModuleUses: *mut c_void,
    pub AddModuleProvides: *mut c_void,
    pub IsModifiableModule: *mut c_void,
    pub GetAllStackTraces: *mut c_void,
    pub GetThreadListStackTraces: *mut c_void,
    pub GetThreadLocalStorage: *mut c_void,
    pub SetThreadLocalStorage: *mut c_void,
    pub GetStackTrace: *mut c_void,
    // 105
    pub reserved105: *mut c_void,
    // 106-112
    pub GetTag: *mut c_void,
    pub SetTag: *mut c_void,
    pub ForceGarbageCollection: *mut c_void,
    pub IterateOverObjectsReachableFromObject: *mut c_void,
    pub IterateOverReachableObjects: *mut c_void,
    pub IterateOverHeap: *mut c_void,
    pub IterateOverInstancesOfClass: *mut c_void,
    // 113
    pub reserved113: *mut c_void,
    // 114-116
    pub GetObjectsWithTags: *mut c_void,
    pub FollowReferences: *mut c_void,
    pub IterateThroughHeap: *mut c_void,
    // 117
    pub reserved117: *mut c_void,
    // 118-121
    pub SuspendAllVirtualThreads: *mut c_void,
    pub ResumeAllVirtualThreads: *mut c_void,
    pub SetJNIFunctionTable: *mut c_void,
    pub GetJNIFunctionTable: *mut c_void,
    // 122
    pub SetEventCallbacks: Option<JvmtiSetEventCallbacksFn>,
    // 123-126
    pub GenerateEvents: *mut c_void,
    pub GetExtensionFunctions: *mut c_void,
    pub GetExtensionEvents: *mut c_void,
    pub SetExtensionEventCallback: *mut c_void,
    // 127
    pub DisposeEnvironment: Option<JvmtiDisposeEnvironmentFn>,
    // 128
    pub GetErrorName: Option<JvmtiGetErrorNameFn>,
    // 129-139
    pub GetJLocationFormat: *mut c_void,
    pub GetSystemProperties: *mut c_void,
    pub GetSystemProperty: *mut c_void,
    pub SetSystemProperty: *mut c_void,
    pub GetPhase: *mut c_void,
    pub GetCurrentThreadCpuTimerInfo: *mut c_void,
    pub GetCurrentThreadCpuTime: *mut c_void,
    pub GetThreadCpuTimerInfo: *mut c_void,
    pub GetThreadCpuTime: *mut c_void,
    pub GetTimerInfo: *mut c_void,
    pub GetTime: *mut c_void,
    // 140
    pub GetPotentialCapabilities: *mut c_void,
    // 141
    pub reserved141: *mut c_void,
    // 142
    pub AddCapabilities: Option<JvmtiAddCapabilitiesFn>,
    // 143
    pub RelinquishCapabilities: Option<JvmtiRelinquishCapabilitiesFn>,
    // 144-151
    pub GetAvailableProcessors: *mut c_void,
    pub GetClassVersionNumbers: *mut c_void,
    pub GetConstantPool: *mut c_void,
    pub GetEnvironmentLocalStorage: *mut c_void,
    pub SetEnvironmentLocalStorage: *mut c_void,
    pub AddToBootstrapClassLoaderSearch: *mut c_void,
    pub SetVerboseFlag: *mut c_void,
    pub AddToSystemClassLoaderSearch: *mut c_void,
    // 152
    pub RetransformClasses: Option<JvmtiRetransformClassesFn>,
    // 153-156
    pub GetOwnedMonitorStackDepthInfo: *mut c_void,
    pub GetObjectSize: *mut c_void,
    pub GetLocalInstance: *mut c_void,
    pub SetHeapSamplingInterval: *mut c_void,
}

#[repr(C)]
pub struct jvmtiEnv {
    pub functions: *const jvmtiInterface_1_,
}
