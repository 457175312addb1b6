//! Ordered log of method invocations on a fake.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use fakekit_errors::{FakeError, FakeResult};
use parking_lot::Mutex;
use tracing::trace;

/// One recorded invocation.
///
/// Arguments are stored type-erased; callers read them back with the type the
/// fake recorded them as. Multi-argument methods record a tuple.
#[derive(Clone)]
pub struct RecordedCall {
    method: Arc<str>,
    seq: u64,
    args: Arc<dyn Any + Send + Sync>,
}

impl RecordedCall {
    /// Create a call record.
    pub fn new<A>(method: impl Into<Arc<str>>, seq: u64, args: A) -> Self
    where
        A: Any + Send + Sync,
    {
        Self {
            method: method.into(),
            seq,
            args: Arc::new(args),
        }
    }

    /// Method name.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Position of this call in the recorder's global log.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Borrow the arguments as `A`, if that is what was recorded.
    pub fn args_ref<A: Any>(&self) -> Option<&A> {
        self.args.downcast_ref::<A>()
    }

    /// Clone the arguments out as `A`.
    ///
    /// # Errors
    ///
    /// [`FakeError::ArgType`] when the call recorded a different type.
    pub fn args<A: Any + Clone>(&self) -> FakeResult<A> {
        self.args_ref::<A>()
            .cloned()
            .ok_or_else(|| FakeError::arg_type::<A>(self.method()))
    }
}

impl fmt::Debug for RecordedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordedCall")
            .field("method", &self.method)
            .field("seq", &self.seq)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct Log {
    calls: Vec<RecordedCall>,
    next_seq: u64,
}

/// Append-only record of every method invocation, in invocation order.
#[derive(Default)]
pub struct CallRecorder {
    log: Mutex<Log>,
}

impl CallRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `(method, args)` to the log and return the stored record.
    pub fn record<A>(&self, method: &str, args: A) -> RecordedCall
    where
        A: Any + Send + Sync,
    {
        let mut log = self.log.lock();
        let seq = log.next_seq;
        log.next_seq = log.next_seq.saturating_add(1);
        let call = RecordedCall::new(method, seq, args);
        log.calls.push(call.clone());
        trace!(method, seq, "recorded call");
        call
    }

    /// Number of times `method` was recorded since the last reset.
    pub fn count_calls(&self, method: &str) -> usize {
        self.log
            .lock()
            .calls
            .iter()
            .filter(|c| c.method() == method)
            .count()
    }

    /// Total number of recorded calls across all methods.
    pub fn total_calls(&self) -> usize {
        self.log.lock().calls.len()
    }

    /// The `index`-th call to `method`.
    ///
    /// # Errors
    ///
    /// [`FakeError::OutOfRange`] if fewer than `index + 1` calls were recorded.
    pub fn call(&self, method: &str, index: usize) -> FakeResult<RecordedCall> {
        let log = self.log.lock();
        let mut matching = log.calls.iter().filter(|c| c.method() == method);
        match matching.nth(index) {
            Some(call) => Ok(call.clone()),
            None => {
                let count = log.calls.iter().filter(|c| c.method() == method).count();
                Err(FakeError::out_of_range(method, index, count))
            }
        }
    }

    /// Arguments of the `index`-th call to `method`.
    ///
    /// # Errors
    ///
    /// [`FakeError::OutOfRange`] for an unrecorded index and
    /// [`FakeError::ArgType`] when the call stored another type.
    pub fn call_args<A: Any + Clone>(&self, method: &str, index: usize) -> FakeResult<A> {
        self.call(method, index)?.args::<A>()
    }

    /// Arguments of the most recent call to `method`.
    ///
    /// # Errors
    ///
    /// [`FakeError::OutOfRange`] if `method` was never called.
    pub fn last_args<A: Any + Clone>(&self, method: &str) -> FakeResult<A> {
        self.last_call(method)?.args::<A>()
    }

    /// Most recent call to `method`.
    ///
    /// # Errors
    ///
    /// [`FakeError::OutOfRange`] if `method` was never called.
    pub fn last_call(&self, method: &str) -> FakeResult<RecordedCall> {
        self.log
            .lock()
            .calls
            .iter()
            .rev()
            .find(|c| c.method() == method)
            .cloned()
            .ok_or_else(|| FakeError::out_of_range(method, 0, 0))
    }

    /// Arguments of every call to `method`, oldest first.
    ///
    /// # Errors
    ///
    /// [`FakeError::ArgType`] if any call stored another type.
    pub fn all_args<A: Any + Clone>(&self, method: &str) -> FakeResult<Vec<A>> {
        self.calls_for(method)
            .iter()
            .map(RecordedCall::args::<A>)
            .collect()
    }

    /// Every call to `method`, oldest first.
    pub fn calls_for(&self, method: &str) -> Vec<RecordedCall> {
        self.log
            .lock()
            .calls
            .iter()
            .filter(|c| c.method() == method)
            .cloned()
            .collect()
    }

    /// The whole log in global invocation order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.log.lock().calls.clone()
    }

    /// Clear the log for one method, leaving the others intact.
    pub fn reset(&self, method: &str) {
        self.log.lock().calls.retain(|c| c.method() != method);
    }

    /// Clear the whole log. Sequence numbers keep increasing.
    pub fn reset_all(&self) {
        self.log.lock().calls.clear();
    }
}

impl fmt::Debug for CallRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallRecorder")
            .field("total_calls", &self.total_calls())
            .finish()
    }
}
