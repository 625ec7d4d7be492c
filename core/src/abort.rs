//! Caller-owned cancellation handle.
//!
//! # Design
//! The caller constructs an `AbortToken`, keeps a clone, and passes it in the
//! `RequestConfig`. The controller installs the cancellation function into the
//! token's single slot before the request is sent. Clones share the slot.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

type AbortFn = Arc<dyn Fn() -> bool + Send + Sync>;

/// Handle through which an in-flight request can be cancelled.
#[derive(Clone, Default)]
pub struct AbortToken {
    slot: Arc<Mutex<Option<AbortFn>>>,
}

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the cancellation function, replacing any previous one.
    pub(crate) fn install<F>(&self, abort: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        *self.slot.lock() = Some(Arc::new(abort));
    }

    /// Whether a request has installed its cancellation function yet.
    pub fn is_installed(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// Cancel the request this token is attached to.
    ///
    /// Returns `true` if this call settled the request as aborted, `false` if
    /// nothing is installed or the request had already settled.
    pub fn abort(&self) -> bool {
        // Release the slot before running the function; it may re-enter.
        let abort = self.slot.lock().clone();
        match abort {
            Some(abort) => abort(),
            None => false,
        }
    }
}

impl fmt::Debug for AbortToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbortToken")
            .field("installed", &self.is_installed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn fresh_token_is_inert() {
        let token = AbortToken::new();
        assert!(!token.is_installed());
        assert!(!token.abort());
    }

    #[test]
    fn clones_share_the_installed_function() {
        let token = AbortToken::new();
        let caller_copy = token.clone();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        token.install(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });

        assert!(caller_copy.is_installed());
        assert!(caller_copy.abort());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn installed_function_may_reenter_the_token() {
        let token = AbortToken::new();
        let inner = token.clone();
        token.install(move || inner.is_installed());
        assert!(token.abort());
    }
}
