//! Panicking unwrap helpers for test setup, and timeout-guarded awaits.
//!
//! An awaited method gate that is never triggered hangs its test forever.
//! The fakes themselves never time out; [`within`] and [`must_within`] put
//! the limit at the test-runner level instead.
//!
//! # When to use
//!
//! - `must` for a `Result` that should succeed in tests
//! - `must_some` for an `Option` that should be `Some`
//! - `within` to turn a hung await into [`FakeError::UnresolvedAwait`]
//! - `must_within` when the awaited result should also be `Ok`

use std::fmt::Debug;

use fakekit_errors::FakeError;

/// Value of a setup step that has to succeed.
///
/// ```rust
/// use fakekit_test_helpers::must;
///
/// let count: Result<usize, &str> = Ok(2);
/// assert_eq!(must(count), 2);
/// ```
///
/// # Panics
///
/// On `Err`, printing the error.
#[track_caller]
pub fn must<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must: unexpected Err: {e:?}"),
    }
}

/// Value of an `Option` the test expects to be filled, e.g. a looked-up pref.
///
/// # Panics
///
/// On `None`, printing `msg`.
#[track_caller]
pub fn must_some<T>(option: Option<T>, msg: &str) -> T {
    match option {
        Some(v) => v,
        None => panic!("must_some: {msg}"),
    }
}

/// [`must`] with a note about what was being set up.
///
/// # Panics
///
/// On `Err`, printing `context` and the error.
#[track_caller]
pub fn must_with<T, E: Debug>(result: Result<T, E>, context: &str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must_with: {context}: {e:?}"),
    }
}

/// Format an error prefixed with its category.
pub fn describe(err: &FakeError) -> String {
    format!("[{}] {err}", err.category())
}

#[cfg(feature = "async")]
mod async_helpers {
    use super::*;
    use std::future::{Future, IntoFuture};
    use std::time::Duration;

    /// Await a fallible call and panic on `Err`.
    ///
    /// # Panics
    ///
    /// When the awaited result is `Err`.
    #[track_caller]
    pub async fn must_async<F, T, E>(future: F) -> T
    where
        F: Future<Output = Result<T, E>>,
        E: Debug,
    {
        match future.await {
            Ok(v) => v,
            Err(e) => panic!("must_async: unexpected Err: {e:?}"),
        }
    }

    /// Await `future` for at most `limit`.
    ///
    /// `label` names what was awaited in the [`FakeError::UnresolvedAwait`]
    /// produced on timeout.
    ///
    /// # Errors
    ///
    /// [`FakeError::UnresolvedAwait`] if `limit` elapses first.
    pub async fn within<F>(label: &str, limit: Duration, future: F) -> Result<F::Output, FakeError>
    where
        F: IntoFuture,
    {
        match tokio::time::timeout(limit, future.into_future()).await {
            Ok(output) => Ok(output),
            Err(_elapsed) => {
                let timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
                tracing::warn!(label, timeout_ms, "await never resolved");
                Err(FakeError::unresolved(label, timeout_ms))
            }
        }
    }

    /// Await a fallible gate future for at most `limit`, flattening both errors.
    ///
    /// # Errors
    ///
    /// [`FakeError::UnresolvedAwait`] on timeout, otherwise whatever the
    /// future returned.
    pub async fn must_within<F, T>(label: &str, limit: Duration, future: F) -> Result<T, FakeError>
    where
        F: IntoFuture<Output = Result<T, FakeError>>,
    {
        within(label, limit, future).await?
    }
}

#[cfg(feature = "async")]
pub use async_helpers::{must_async, must_within, within};
