//! Name-to-handle cache for loaded classes.
//!
//! Populated by the bulk snapshot at attach time and incrementally whenever
//! a class is defined through the agent or seen by the load hook. Entries
//! live for the process lifetime; there is no eviction. A stale handle is
//! acceptable (redefinition preserves class identity) but a name never maps
//! to two handles.

use std::collections::HashMap;
use std::ffi::c_void;

use parking_lot::Mutex;

use crate::sys::jni::jclass;

/// A JNI global reference to a `jclass`.
///
/// Global references are valid on any attached thread, which is what makes
/// the registry shareable between the attach thread, the dispatcher, and
/// hook threads. The registry never deletes them; they are released wholesale
/// when the VM goes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassHandle(*mut c_void);

// Global refs are not thread-affine; see above.
unsafe impl Send for ClassHandle {}
unsafe impl Sync for ClassHandle {}

impl ClassHandle {
    pub fn from_global_ref(global: jclass) -> Self {
        ClassHandle(global)
    }

    pub fn as_jclass(&self) -> jclass {
        self.0
    }
}

/// Internally synchronized class cache.
///
/// Reads and writes come from the attach thread, the dispatcher thread, and
/// any number of runtime threads running the load hook, so every access goes
/// through the mutex. Operations are O(1) map touches; the hook path stays
/// fast.
#[derive(Default)]
pub struct ClassRegistry {
    classes: Mutex<HashMap<String, ClassHandle>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a binding. First writer wins: if the name is already present
    /// the existing handle is kept and `false` is returned.
    pub fn insert(&self, name: &str, handle: ClassHandle) -> bool {
        let mut map = self.classes.lock();
        if map.contains_key(name) {
            return false;
        }
        map.insert(name.to_string(), handle);
        true
    }

    /// Look up a handle by canonical (dotted) class name.
    pub fn lookup(&self, name: &str) -> Option<ClassHandle> {
        self.classes.lock().get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.classes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;

    use super::*;

    fn handle(n: usize) -> ClassHandle {
        ClassHandle::from_global_ref(n as jclass)
    }

    #[test]
    fn lookup_miss_returns_none() {
        let registry = ClassRegistry::new();
        assert_eq!(registry.lookup("java.lang.String"), None);
    }

    #[test]
    fn insert_is_first_writer_wins() {
        let registry = ClassRegistry::new();
        assert!(registry.insert("java.lang.String", handle(1)));
        assert!(!registry.insert("java.lang.String", handle(2)));
        assert_eq!(registry.lookup("java.lang.String"), Some(handle(1)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn snapshot_completeness() {
        // Model of snapshot_classes: a bulk insert must leave every name
        // resolvable afterwards.
        let registry = ClassRegistry::new();
        let loaded: Vec<String> = (0..100).map(|i| format!("com.example.C{i}")).collect();
        for (i, name) in loaded.iter().enumerate() {
            registry.insert(name, handle(i + 1));
        }
        for name in &loaded {
            assert!(registry.lookup(name).is_some(), "missing {name}");
        }
    }

    proptest! {
        // Interleaved inserts from concurrent "hook threads" must not lose
        // updates: every inserted name resolves afterwards, and duplicated
        // names keep exactly one handle.
        #[test]
        fn concurrent_inserts_lose_nothing(names in proptest::collection::vec("[a-d]{1,3}", 1..40)) {
            let registry = Arc::new(ClassRegistry::new());
            let mid = names.len() / 2;
            let (left, right) = (names[..mid].to_vec(), names[mid..].to_vec());

            let threads: Vec<_> = [left, right]
                .into_iter()
                .enumerate()
                .map(|(t, chunk)| {
                    let registry = Arc::clone(&registry);
                    std::thread::spawn(move || {
                        for (i, name) in chunk.iter().enumerate() {
                            registry.insert(name, handle(t * 1000 + i + 1));
                        }
                    })
                })
                .collect();
            for thread in threads {
                thread.join().unwrap();
            }

            for name in &names {
                prop_assert!(registry.lookup(name).is_some());
            }
            let distinct: std::collections::HashSet<_> = names.iter().collect();
            prop_assert_eq!(registry.len(), distinct.len());
        }
    }
}
