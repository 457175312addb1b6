//! Single-resolution promise cells.
//!
//! A [`PromiseResolver`] can hand out any number of [`Promise`] handles before
//! or after it resolves. Every handle observes the same value; the resolver
//! accepts exactly one value for its whole life.

use std::fmt;
use std::future::IntoFuture;
use std::sync::Arc;

use fakekit_errors::{FakeError, FakeResult};
use futures::future::BoxFuture;
use tokio::sync::watch;

/// Write side of a single-resolution promise.
pub struct PromiseResolver<T> {
    tx: watch::Sender<Option<T>>,
    label: Arc<str>,
}

impl<T> PromiseResolver<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create an unresolved resolver.
    pub fn new() -> Self {
        Self::labeled("promise")
    }

    /// Create an unresolved resolver whose errors name `label`.
    pub fn labeled(label: impl Into<Arc<str>>) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            tx,
            label: label.into(),
        }
    }

    /// A handle that completes once this resolver resolves.
    pub fn promise(&self) -> Promise<T> {
        Promise {
            rx: self.tx.subscribe(),
            label: Arc::clone(&self.label),
        }
    }

    /// Resolve every outstanding and future promise with `value`.
    ///
    /// # Errors
    ///
    /// [`FakeError::AlreadyResolved`] if a value was already delivered.
    pub fn resolve(&self, value: T) -> FakeResult<()> {
        let resolved = self.tx.send_if_modified(move |slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(value);
            true
        });
        if resolved {
            Ok(())
        } else {
            Err(FakeError::AlreadyResolved)
        }
    }

    /// Whether a value was delivered.
    pub fn is_resolved(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// The delivered value, if any.
    pub fn value(&self) -> Option<T> {
        self.tx.borrow().clone()
    }

    /// Label used in error messages.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<T> Default for PromiseResolver<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for PromiseResolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromiseResolver")
            .field("label", &self.label)
            .field("resolved", &self.tx.borrow().is_some())
            .finish()
    }
}

/// Read side of a [`PromiseResolver`]. Await it directly or call [`Promise::wait`].
pub struct Promise<T> {
    rx: watch::Receiver<Option<T>>,
    label: Arc<str>,
}

impl<T> Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// The value, if the resolver already delivered one.
    pub fn try_value(&self) -> Option<T> {
        self.rx.borrow().clone()
    }

    /// Whether awaiting would complete immediately with a value.
    pub fn is_resolved(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// Wait until the resolver delivers a value.
    ///
    /// # Errors
    ///
    /// [`FakeError::Abandoned`] if the resolver is dropped without resolving.
    pub async fn wait(mut self) -> FakeResult<T> {
        let value = match self.rx.wait_for(Option::is_some).await {
            Ok(slot) => (*slot).clone(),
            Err(_closed) => None,
        };
        value.ok_or_else(|| FakeError::abandoned(self.label.as_ref()))
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
            label: Arc::clone(&self.label),
        }
    }
}

impl<T> IntoFuture for Promise<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = FakeResult<T>;
    type IntoFuture = BoxFuture<'static, FakeResult<T>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("label", &self.label)
            .field("resolved", &self.rx.borrow().is_some())
            .finish()
    }
}
