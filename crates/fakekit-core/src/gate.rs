//! Awaitable per-method gates.
//!
//! Each tracked method owns exactly one outstanding [`PromiseResolver`]. A call
//! resolves it and installs a fresh one under the same name before returning,
//! so a later [`MethodGate::when_called`] never observes a call that has
//! already been consumed.

use std::collections::HashMap;
use std::fmt;

use fakekit_errors::{FakeError, FakeResult};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::recorder::RecordedCall;
use crate::resolver::{Promise, PromiseResolver};

/// Table of pending-call resolvers keyed by method name.
pub struct MethodGate {
    resolvers: Mutex<HashMap<String, PromiseResolver<RecordedCall>>>,
}

impl MethodGate {
    /// Track exactly `methods`; any other name is rejected by [`Self::when_called`].
    pub fn new<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let resolvers = methods
            .into_iter()
            .map(|method| {
                let name: String = method.into();
                let resolver = PromiseResolver::labeled(name.as_str());
                (name, resolver)
            })
            .collect();
        Self {
            resolvers: Mutex::new(resolvers),
        }
    }

    /// A promise for the next call to `method`.
    ///
    /// # Errors
    ///
    /// [`FakeError::UnknownMethod`] immediately if `method` is not tracked.
    pub fn when_called(&self, method: &str) -> FakeResult<Promise<RecordedCall>> {
        self.resolvers
            .lock()
            .get(method)
            .map(PromiseResolver::promise)
            .ok_or_else(|| FakeError::unknown_method(method))
    }

    /// Resolve the pending promise for `call.method()` and re-arm it.
    ///
    /// Returns `false` when the method is not tracked; the call is still
    /// expected to be recorded elsewhere.
    pub fn notify(&self, call: &RecordedCall) -> bool {
        let mut resolvers = self.resolvers.lock();
        let Some(slot) = resolvers.get_mut(call.method()) else {
            warn!(method = call.method(), "call to untracked method");
            return false;
        };
        let fired = std::mem::replace(slot, PromiseResolver::labeled(call.method()));
        drop(resolvers);

        if let Err(err) = fired.resolve(call.clone()) {
            // A fresh resolver is installed on every call, so this only
            // happens if someone resolved the slot out of band.
            warn!(method = call.method(), %err, "gate resolver was already resolved");
        }
        debug!(method = call.method(), seq = call.seq(), "gate resolved");
        true
    }

    /// Replace the pending resolver for `method` without a call.
    ///
    /// Outstanding promises for the replaced resolver fail with
    /// [`FakeError::Abandoned`].
    ///
    /// # Errors
    ///
    /// [`FakeError::UnknownMethod`] if `method` is not tracked.
    pub fn reset_resolver(&self, method: &str) -> FakeResult<()> {
        let mut resolvers = self.resolvers.lock();
        let slot = resolvers
            .get_mut(method)
            .ok_or_else(|| FakeError::unknown_method(method))?;
        *slot = PromiseResolver::labeled(method);
        Ok(())
    }

    /// Re-arm every tracked method.
    pub fn reset(&self) {
        for (name, slot) in self.resolvers.lock().iter_mut() {
            *slot = PromiseResolver::labeled(name.as_str());
        }
    }

    /// Whether `method` is in the tracked set.
    pub fn is_tracked(&self, method: &str) -> bool {
        self.resolvers.lock().contains_key(method)
    }

    /// Tracked method names, sorted.
    pub fn tracked_methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self.resolvers.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for MethodGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodGate")
            .field("tracked", &self.tracked_methods())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(method: &str, seq: u64) -> RecordedCall {
        RecordedCall::new(method, seq, seq)
    }

    #[test]
    fn test_unknown_method_fails_synchronously() {
        let gate = MethodGate::new(["add_observer"]);
        let err = gate.when_called("foo");
        assert!(matches!(err, Err(FakeError::UnknownMethod { ref method }) if method == "foo"));
    }

    #[tokio::test]
    async fn test_resolves_on_next_call() -> FakeResult<()> {
        let gate = MethodGate::new(["scan"]);
        let promise = gate.when_called("scan")?;
        assert!(!promise.is_resolved());
        assert!(gate.notify(&call("scan", 4)));
        let resolved = promise.await?;
        assert_eq!(resolved.seq(), 4);
        Ok(())
    }

    #[test]
    fn test_rearms_after_call() -> FakeResult<()> {
        let gate = MethodGate::new(["scan"]);
        let first = gate.when_called("scan")?;
        gate.notify(&call("scan", 0));
        assert!(first.is_resolved());

        let second = gate.when_called("scan")?;
        assert!(!second.is_resolved());
        gate.notify(&call("scan", 1));
        assert_eq!(second.try_value().map(|c| c.seq()), Some(1));
        Ok(())
    }

    #[test]
    fn test_untracked_notify_is_ignored() {
        let gate = MethodGate::new(["scan"]);
        assert!(!gate.notify(&call("other", 0)));
    }

    #[tokio::test]
    async fn test_reset_resolver_abandons_pending() -> FakeResult<()> {
        let gate = MethodGate::new(["scan"]);
        let pending = gate.when_called("scan")?;
        gate.reset_resolver("scan")?;
        assert_eq!(pending.await.map(|c| c.seq()), Err(FakeError::abandoned("scan")));
        assert!(gate.reset_resolver("nope").is_err());
        Ok(())
    }

    #[test]
    fn test_tracked_methods_sorted() {
        let gate = MethodGate::new(["b", "a", "c"]);
        assert_eq!(gate.tracked_methods(), vec!["a", "b", "c"]);
        assert!(gate.is_tracked("a"));
        assert!(!gate.is_tracked("d"));
    }
}
