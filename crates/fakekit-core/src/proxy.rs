//! Recorder, gate and canned results bundled for one fake.
//!
//! Every fake in this workspace owns a [`TestProxy`] built with the fixed list
//! of method names it implements. Interface methods call
//! [`TestProxy::method_called`] (or [`TestProxy::invoke`] when the return value
//! is scripted by the test) and tests use [`TestProxy::when_called`] and the
//! inspection accessors.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use fakekit_errors::{FakeError, FakeResult};
use futures::future::BoxFuture;
use parking_lot::Mutex;

use crate::gate::MethodGate;
use crate::recorder::{CallRecorder, RecordedCall};
use crate::resolver::Promise;

/// Future returned by [`TestProxy::when_called`].
pub type CallFuture<A> = BoxFuture<'static, FakeResult<A>>;

type AnyValue = Arc<dyn Any + Send + Sync>;
type ResultMapper = Arc<dyn Fn(&RecordedCall) -> FakeResult<AnyValue> + Send + Sync>;

#[derive(Clone)]
enum CannedResult {
    Value(AnyValue),
    Mapper(ResultMapper),
}

/// Call tracking surface shared by every fake.
pub struct TestProxy {
    recorder: CallRecorder,
    gate: MethodGate,
    results: Mutex<HashMap<String, CannedResult>>,
}

impl TestProxy {
    /// Track exactly `methods`.
    pub fn new<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            recorder: CallRecorder::new(),
            gate: MethodGate::new(methods),
            results: Mutex::new(HashMap::new()),
        }
    }

    /// Record an invocation and resolve anyone waiting on it.
    pub fn method_called<A>(&self, method: &str, args: A) -> RecordedCall
    where
        A: Any + Send + Sync,
    {
        let call = self.recorder.record(method, args);
        self.gate.notify(&call);
        call
    }

    /// Record an invocation and return the scripted result for it.
    ///
    /// # Errors
    ///
    /// [`FakeError::NoResult`] when nothing was scripted, [`FakeError::ArgType`]
    /// when the scripted value is not an `R`.
    pub fn invoke<A, R>(&self, method: &str, args: A) -> FakeResult<R>
    where
        A: Any + Send + Sync,
        R: Any + Clone,
    {
        let call = self.method_called(method, args);
        self.result_for_call(&call)
    }

    /// Wait for the next call to `method` and yield its arguments as `A`.
    ///
    /// The returned future only observes calls made after this returns.
    ///
    /// # Errors
    ///
    /// [`FakeError::UnknownMethod`] synchronously for an untracked name. The
    /// future itself fails with [`FakeError::ArgType`] on a type mismatch and
    /// [`FakeError::Abandoned`] if the gate is reset first.
    pub fn when_called<A>(&self, method: &str) -> FakeResult<CallFuture<A>>
    where
        A: Any + Clone + Send,
    {
        let promise = self.gate.when_called(method)?;
        Ok(Box::pin(async move { promise.await?.args::<A>() }))
    }

    /// Untyped variant of [`Self::when_called`].
    ///
    /// # Errors
    ///
    /// [`FakeError::UnknownMethod`] for an untracked name.
    pub fn when_called_any(&self, method: &str) -> FakeResult<Promise<RecordedCall>> {
        self.gate.when_called(method)
    }

    /// Number of recorded calls to `method`.
    pub fn count_calls(&self, method: &str) -> usize {
        self.recorder.count_calls(method)
    }

    /// Arguments of the `index`-th call to `method`.
    ///
    /// # Errors
    ///
    /// [`FakeError::OutOfRange`] or [`FakeError::ArgType`].
    pub fn args<A: Any + Clone>(&self, method: &str, index: usize) -> FakeResult<A> {
        self.recorder.call_args(method, index)
    }

    /// Arguments of the latest call to `method`.
    ///
    /// # Errors
    ///
    /// [`FakeError::OutOfRange`] or [`FakeError::ArgType`].
    pub fn last_args<A: Any + Clone>(&self, method: &str) -> FakeResult<A> {
        self.recorder.last_args(method)
    }

    /// Script the value returned by [`Self::invoke`] for `method`.
    ///
    /// # Errors
    ///
    /// [`FakeError::UnknownMethod`] for an untracked name.
    pub fn set_result_for<R>(&self, method: &str, value: R) -> FakeResult<()>
    where
        R: Any + Send + Sync,
    {
        self.ensure_tracked(method)?;
        self.results
            .lock()
            .insert(method.to_string(), CannedResult::Value(Arc::new(value)));
        Ok(())
    }

    /// Compute the result of `method` from the arguments of each call.
    ///
    /// # Errors
    ///
    /// [`FakeError::UnknownMethod`] for an untracked name.
    pub fn set_result_mapper_for<A, R, F>(&self, method: &str, mapper: F) -> FakeResult<()>
    where
        A: Any,
        R: Any + Send + Sync,
        F: Fn(&A) -> R + Send + Sync + 'static,
    {
        self.ensure_tracked(method)?;
        let mapper: ResultMapper = Arc::new(move |call: &RecordedCall| {
            let args = call
                .args_ref::<A>()
                .ok_or_else(|| FakeError::arg_type::<A>(call.method()))?;
            Ok(Arc::new(mapper(args)) as AnyValue)
        });
        self.results
            .lock()
            .insert(method.to_string(), CannedResult::Mapper(mapper));
        Ok(())
    }

    /// Scripted result for `method`, using the latest call for mappers.
    ///
    /// # Errors
    ///
    /// [`FakeError::NoResult`], [`FakeError::ArgType`], or
    /// [`FakeError::OutOfRange`] when a mapper is set but no call exists yet.
    pub fn result_for<R: Any + Clone>(&self, method: &str) -> FakeResult<R> {
        match self.canned(method)? {
            CannedResult::Value(value) => downcast(method, &value),
            CannedResult::Mapper(_) => {
                let call = self.recorder.last_call(method)?;
                self.result_for_call(&call)
            }
        }
    }

    /// Whether a result is scripted for `method`.
    pub fn has_result_for(&self, method: &str) -> bool {
        self.results.lock().contains_key(method)
    }

    /// Forget every scripted result.
    pub fn clear_results(&self) {
        self.results.lock().clear();
    }

    /// Re-arm the gate for `method` between phases of a test.
    ///
    /// # Errors
    ///
    /// [`FakeError::UnknownMethod`] for an untracked name.
    pub fn reset_resolver(&self, method: &str) -> FakeResult<()> {
        self.gate.reset_resolver(method)
    }

    /// Clear recorded calls and re-arm every gate. Scripted results are kept.
    pub fn reset(&self) {
        self.recorder.reset_all();
        self.gate.reset();
    }

    /// The underlying call log.
    pub fn recorder(&self) -> &CallRecorder {
        &self.recorder
    }

    /// The underlying gate table.
    pub fn gate(&self) -> &MethodGate {
        &self.gate
    }

    fn ensure_tracked(&self, method: &str) -> FakeResult<()> {
        if self.gate.is_tracked(method) {
            Ok(())
        } else {
            Err(FakeError::unknown_method(method))
        }
    }

    fn canned(&self, method: &str) -> FakeResult<CannedResult> {
        self.results
            .lock()
            .get(method)
            .cloned()
            .ok_or_else(|| FakeError::no_result(method))
    }

    fn result_for_call<R: Any + Clone>(&self, call: &RecordedCall) -> FakeResult<R> {
        match self.canned(call.method())? {
            CannedResult::Value(value) => downcast(call.method(), &value),
            CannedResult::Mapper(mapper) => downcast(call.method(), &mapper(call)?),
        }
    }
}

fn downcast<R: Any + Clone>(method: &str, value: &AnyValue) -> FakeResult<R> {
    value
        .downcast_ref::<R>()
        .cloned()
        .ok_or_else(|| FakeError::arg_type::<R>(method))
}

impl fmt::Debug for TestProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestProxy")
            .field("recorder", &self.recorder)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_when_called_yields_typed_args() -> FakeResult<()> {
        let proxy = TestProxy::new(["set_hotspot_config"]);
        let next = proxy.when_called::<String>("set_hotspot_config")?;
        proxy.method_called("set_hotspot_config", "ssid".to_string());
        assert_eq!(next.await?, "ssid");
        Ok(())
    }

    #[tokio::test]
    async fn test_when_called_type_mismatch() -> FakeResult<()> {
        let proxy = TestProxy::new(["scan"]);
        let next = proxy.when_called::<String>("scan")?;
        proxy.method_called("scan", 3u8);
        assert!(matches!(next.await, Err(FakeError::ArgType { .. })));
        Ok(())
    }

    #[test]
    fn test_unknown_method() {
        let proxy = TestProxy::new(["a"]);
        assert!(matches!(
            proxy.when_called::<()>("foo"),
            Err(FakeError::UnknownMethod { .. })
        ));
        assert!(proxy.set_result_for("foo", 1u8).is_err());
    }

    #[test]
    fn test_invoke_with_value() -> FakeResult<()> {
        let proxy = TestProxy::new(["get_pref"]);
        proxy.set_result_for("get_pref", 42i64)?;
        let value: i64 = proxy.invoke("get_pref", "volume".to_string())?;
        assert_eq!(value, 42);
        assert_eq!(proxy.count_calls("get_pref"), 1);
        Ok(())
    }

    #[test]
    fn test_invoke_with_mapper() -> FakeResult<()> {
        let proxy = TestProxy::new(["double"]);
        proxy.set_result_mapper_for("double", |n: &u32| n * 2)?;
        let first: u32 = proxy.invoke("double", 4u32)?;
        let second: u32 = proxy.invoke("double", 10u32)?;
        assert_eq!((first, second), (8, 20));
        assert_eq!(proxy.result_for::<u32>("double")?, 20);
        Ok(())
    }

    #[test]
    fn test_invoke_without_result() {
        let proxy = TestProxy::new(["get_pref"]);
        let result: FakeResult<u8> = proxy.invoke("get_pref", ());
        assert_eq!(result, Err(FakeError::no_result("get_pref")));
        // The call is still recorded.
        assert_eq!(proxy.count_calls("get_pref"), 1);
    }

    #[test]
    fn test_reset_keeps_results() -> FakeResult<()> {
        let proxy = TestProxy::new(["get_pref"]);
        proxy.set_result_for("get_pref", true)?;
        proxy.method_called("get_pref", ());
        proxy.reset();
        assert_eq!(proxy.count_calls("get_pref"), 0);
        assert!(proxy.result_for::<bool>("get_pref")?);
        proxy.clear_results();
        assert!(!proxy.has_result_for("get_pref"));
        Ok(())
    }
}
