//! Transformer chain semantics.
//!
//! Listeners are consulted in registration order and the first one that
//! returns replacement bytes wins; the rest are not consulted for that load
//! event. This is a chain of responsibility, not a pipeline: two listeners
//! never both rewrite the same class body, which would have no defined
//! ordering of semantic changes.

use thiserror::Error;
use tracing::warn;

/// A single registered bytecode transformer.
pub trait ClassTransformer {
    /// Return `Ok(None)` to leave the class untouched, or `Ok(Some(bytes))`
    /// to replace its bytecode.
    fn transform(&self, class_name: &str, class_bytes: &[u8])
        -> Result<Option<Vec<u8>>, TransformError>;
}

/// A listener failed (for managed listeners: threw). The chain logs it and
/// moves on; a broken listener must never take the hook down.
#[derive(Debug, Error)]
#[error("transformer failed: {0}")]
pub struct TransformError(pub String);

/// Run the chain for one class-load event. First non-`None` result wins;
/// errors count as "no replacement from this listener".
pub fn run_chain<'a, I>(listeners: I, class_name: &str, class_bytes: &[u8]) -> Option<Vec<u8>>
where
    I: IntoIterator<Item = &'a dyn ClassTransformer>,
{
    for listener in listeners {
        match listener.transform(class_name, class_bytes) {
            Ok(Some(replacement)) => return Some(replacement),
            Ok(None) => {}
            Err(e) => {
                warn!(class_name, error = %e, "class transformer failed; skipping");
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct Fixed {
        result: Option<Vec<u8>>,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn passthrough() -> Self {
            Fixed {
                result: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn replacing(bytes: &[u8]) -> Self {
            Fixed {
                result: Some(bytes.to_vec()),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ClassTransformer for Fixed {
        fn transform(&self, _: &str, _: &[u8]) -> Result<Option<Vec<u8>>, TransformError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.result.clone())
        }
    }

    struct Failing;

    impl ClassTransformer for Failing {
        fn transform(&self, _: &str, _: &[u8]) -> Result<Option<Vec<u8>>, TransformError> {
            Err(TransformError("boom".to_string()))
        }
    }

    #[test]
    fn first_match_wins_and_tail_is_not_consulted() {
        let l1 = Fixed::passthrough();
        let l2 = Fixed::replacing(b"bytesX");
        let l3 = Fixed::replacing(b"bytesY");

        let chain: [&dyn ClassTransformer; 3] = [&l1, &l2, &l3];
        let result = run_chain(chain, "com.example.Foo", b"original");

        assert_eq!(result.as_deref(), Some(&b"bytesX"[..]));
        assert_eq!(l1.call_count(), 1);
        assert_eq!(l2.call_count(), 1);
        assert_eq!(l3.call_count(), 0, "L3 must never be invoked");
    }

    #[test]
    fn no_replacement_leaves_original() {
        let l1 = Fixed::passthrough();
        let l2 = Fixed::passthrough();
        let chain: [&dyn ClassTransformer; 2] = [&l1, &l2];
        assert_eq!(run_chain(chain, "a.B", b"original"), None);
    }

    #[test]
    fn failing_listener_is_skipped_not_fatal() {
        let l2 = Fixed::replacing(b"patched");
        let chain: [&dyn ClassTransformer; 2] = [&Failing, &l2];
        let result = run_chain(chain, "a.B", b"original");
        assert_eq!(result.as_deref(), Some(&b"patched"[..]));
    }

    #[test]
    fn empty_chain_is_a_no_op() {
        let empty: [&dyn ClassTransformer; 0] = [];
        assert_eq!(run_chain(empty, "a.B", b"original"), None);
    }
}
