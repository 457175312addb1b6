//! One-shot event delivery.
//!
//! Some backends push events that are not state snapshots: scan progress, a
//! completed page, a share target arriving. Those go straight to one bound
//! remote ([`EventChannel`]) or to a list of typed observers
//! ([`ObserverSet`]) rather than through an
//! [`ObservableState`](crate::ObservableState) broadcast, and tests assert on
//! the two kinds of notification separately.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use fakekit_errors::{FakeError, FakeResult};
use parking_lot::Mutex;
use tracing::{trace, warn};

use crate::state::ObserverId;

/// Slot holding the remote that receives one-shot events.
pub struct EventChannel<O: ?Sized> {
    name: String,
    remote: Mutex<Option<Arc<O>>>,
    delivered: AtomicUsize,
}

impl<O: ?Sized> EventChannel<O> {
    /// Create an unbound channel; `name` appears in errors and logs.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            remote: Mutex::new(None),
            delivered: AtomicUsize::new(0),
        }
    }

    /// Bind `remote`, returning the previously bound one.
    pub fn bind(&self, remote: Arc<O>) -> Option<Arc<O>> {
        trace!(channel = %self.name, "event channel bound");
        self.remote.lock().replace(remote)
    }

    /// Unbind the current remote.
    pub fn unbind(&self) -> Option<Arc<O>> {
        self.remote.lock().take()
    }

    /// Whether a remote is bound.
    pub fn is_bound(&self) -> bool {
        self.remote.lock().is_some()
    }

    /// The bound remote, if any.
    pub fn remote(&self) -> Option<Arc<O>> {
        self.remote.lock().clone()
    }

    /// Invoke `event` on the bound remote.
    ///
    /// # Errors
    ///
    /// [`FakeError::NoObserverBound`] when nothing is bound.
    pub fn deliver(&self, event: impl FnOnce(&O)) -> FakeResult<()> {
        let Some(remote) = self.remote() else {
            warn!(channel = %self.name, "event dropped: no observer bound");
            return Err(FakeError::no_observer(self.name.as_str()));
        };
        event(&*remote);
        let count = self.delivered.fetch_add(1, Ordering::Relaxed).saturating_add(1);
        trace!(channel = %self.name, count, "event delivered");
        Ok(())
    }

    /// Number of events delivered since construction or the last [`Self::reset`].
    pub fn delivered_count(&self) -> usize {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Unbind and zero the delivery counter.
    pub fn reset(&self) {
        self.remote.lock().take();
        self.delivered.store(0, Ordering::Relaxed);
    }

    /// Channel name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<O: ?Sized> fmt::Debug for EventChannel<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("name", &self.name)
            .field("bound", &self.is_bound())
            .field("delivered", &self.delivered_count())
            .finish()
    }
}

/// Ordered list of typed observers receiving named one-shot callbacks.
///
/// [`ObserverSet::for_each`] snapshots the list and calls each observer
/// outside the lock, in registration order.
pub struct ObserverSet<O: ?Sized> {
    name: String,
    inner: Mutex<SetInner<O>>,
}

struct SetInner<O: ?Sized> {
    observers: Vec<(ObserverId, Arc<O>)>,
    next_id: u64,
}

impl<O: ?Sized> ObserverSet<O> {
    /// Create an empty set; `name` appears in logs.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(SetInner {
                observers: Vec::new(),
                next_id: 0,
            }),
        }
    }

    /// Append `observer`.
    pub fn add(&self, observer: Arc<O>) -> ObserverId {
        let mut inner = self.inner.lock();
        let id = ObserverId::new(inner.next_id);
        inner.next_id = inner.next_id.saturating_add(1);
        inner.observers.push((id, observer));
        trace!(set = %self.name, id = id.get(), "observer added");
        id
    }

    /// Remove the observer registered under `id`.
    pub fn remove(&self, id: ObserverId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.observers.len();
        inner.observers.retain(|(existing, _)| *existing != id);
        inner.observers.len() != before
    }

    /// Call `event` on every observer. Returns how many were called.
    pub fn for_each(&self, event: impl Fn(&O)) -> usize {
        let observers: Vec<Arc<O>> = self
            .inner
            .lock()
            .observers
            .iter()
            .map(|(_, o)| Arc::clone(o))
            .collect();
        if observers.is_empty() {
            trace!(set = %self.name, "event with no observers");
        }
        for observer in &observers {
            event(&**observer);
        }
        observers.len()
    }

    /// Number of observers.
    pub fn len(&self) -> usize {
        self.inner.lock().observers.len()
    }

    /// Whether no observer is registered.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().observers.is_empty()
    }

    /// Drop every observer.
    pub fn clear(&self) {
        self.inner.lock().observers.clear();
    }
}

impl<O: ?Sized> fmt::Debug for ObserverSet<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverSet")
            .field("name", &self.name)
            .field("observers", &self.len())
            .finish()
    }
}
