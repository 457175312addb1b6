//! Observable fake backend state.
//!
//! [`ObservableState`] holds the last-known server-side snapshot for one fake
//! and pushes the full merged snapshot to every registered observer whenever
//! it changes. Observers run synchronously, in registration order, before the
//! mutating call returns, and never while the internal lock is held, so an
//! observer may read the state it is being told about.
//!
//! An observer may also write the state from its callback. The nested write
//! broadcasts the newer snapshot to everyone, and the outer broadcast stops
//! there, so no observer is left holding a snapshot that no longer exists.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, trace};

/// Shallow merge of a partial update into a snapshot.
///
/// Implementations replace each present field wholesale; nested objects are
/// swapped, not merged.
pub trait Merge {
    /// Partial update type, usually a struct of `Option` fields.
    type Patch;

    /// Apply `patch` to `self`.
    fn merge(&mut self, patch: Self::Patch);
}

/// Identifier handed out per registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl ObserverId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

type Callback<S> = Arc<dyn Fn(&S) + Send + Sync>;

struct Inner<S> {
    state: S,
    observers: Vec<(ObserverId, Callback<S>)>,
    next_id: u64,
    generation: u64,
}

/// Detach handle returned when registering an observer.
///
/// Dropping the handle leaves the observer registered; call
/// [`Subscription::unsubscribe`] to detach it.
pub struct Subscription {
    id: ObserverId,
    detach: Box<dyn FnOnce(ObserverId) -> bool + Send + Sync>,
}

impl Subscription {
    /// Id of the observer this handle detaches.
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Remove the observer. Returns `false` if it was already gone.
    pub fn unsubscribe(self) -> bool {
        (self.detach)(self.id)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Mutable snapshot plus its observer list.
pub struct ObservableState<S> {
    inner: Arc<Mutex<Inner<S>>>,
}

impl<S> Clone for ObservableState<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> ObservableState<S>
where
    S: Clone + Send + 'static,
{
    /// Create a state holding `initial` with no observers.
    pub fn new(initial: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: initial,
                observers: Vec::new(),
                next_id: 0,
                generation: 0,
            })),
        }
    }

    /// Current snapshot.
    pub fn get_state(&self) -> S {
        self.inner.lock().state.clone()
    }

    /// Read the current snapshot without cloning it.
    pub fn with_state<R>(&self, read: impl FnOnce(&S) -> R) -> R {
        read(&self.inner.lock().state)
    }

    /// Shallow-merge `patch` and notify every observer with the merged snapshot.
    pub fn set_state(&self, patch: S::Patch) -> S
    where
        S: Merge,
    {
        self.update(|state| state.merge(patch))
    }

    /// Mutate the snapshot in place and notify every observer.
    pub fn update(&self, mutate: impl FnOnce(&mut S)) -> S {
        let (snapshot, observers, generation) = {
            let mut inner = self.inner.lock();
            mutate(&mut inner.state);
            Self::start_broadcast(&mut inner)
        };
        debug!(observers = observers.len(), generation, "fake state changed");
        self.broadcast(generation, &snapshot, &observers);
        snapshot
    }

    /// Mutate the snapshot without notifying anyone.
    ///
    /// Used when a fake wants to batch several edits before one [`Self::notify`].
    pub fn update_silently(&self, mutate: impl FnOnce(&mut S)) {
        mutate(&mut self.inner.lock().state);
    }

    /// Replace the whole snapshot and notify every observer.
    pub fn replace(&self, state: S) -> S {
        self.update(move |current| *current = state)
    }

    /// Push the current snapshot to every observer without changing it.
    pub fn notify(&self) {
        let (snapshot, observers, generation) = Self::start_broadcast(&mut self.inner.lock());
        self.broadcast(generation, &snapshot, &observers);
    }

    /// Register `observer` and immediately deliver the current snapshot to it.
    pub fn add_observer<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        let callback: Callback<S> = Arc::new(observer);
        let (snapshot, subscription) = self.register(Arc::clone(&callback));
        trace!(id = subscription.id().get(), "replaying snapshot to new observer");
        callback(&snapshot);
        subscription
    }

    /// Register `observer` and hand the current snapshot back to the caller.
    ///
    /// The observer itself is only called for later changes.
    pub fn subscribe<F>(&self, observer: F) -> (S, Subscription)
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.register(Arc::new(observer))
    }

    /// Number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.inner.lock().observers.len()
    }

    /// Drop every observer.
    pub fn clear_observers(&self) {
        self.inner.lock().observers.clear();
    }

    fn register(&self, callback: Callback<S>) -> (S, Subscription) {
        let mut inner = self.inner.lock();
        let id = ObserverId(inner.next_id);
        inner.next_id = inner.next_id.saturating_add(1);
        inner.observers.push((id, callback));
        let snapshot = inner.state.clone();
        drop(inner);

        let weak: Weak<Mutex<Inner<S>>> = Arc::downgrade(&self.inner);
        let subscription = Subscription {
            id,
            detach: Box::new(move |id: ObserverId| match weak.upgrade() {
                Some(shared) => {
                    let mut inner = shared.lock();
                    let before = inner.observers.len();
                    inner.observers.retain(|(existing, _)| *existing != id);
                    inner.observers.len() != before
                }
                None => false,
            }),
        };
        (snapshot, subscription)
    }

    fn start_broadcast(inner: &mut Inner<S>) -> (S, Vec<Callback<S>>, u64) {
        inner.generation = inner.generation.wrapping_add(1);
        let observers = inner.observers.iter().map(|(_, cb)| Arc::clone(cb)).collect();
        (inner.state.clone(), observers, inner.generation)
    }

    // A broadcast started by a write from inside a callback supersedes this one.
    fn broadcast(&self, generation: u64, snapshot: &S, observers: &[Callback<S>]) {
        for observer in observers {
            if self.inner.lock().generation != generation {
                trace!(generation, "broadcast superseded by a newer snapshot");
                return;
            }
            observer(snapshot);
        }
    }
}

impl<S> Default for ObservableState<S>
where
    S: Clone + Default + Send + 'static,
{
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: fmt::Debug> fmt::Debug for ObservableState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ObservableState")
            .field("state", &inner.state)
            .field("observers", &inner.observers.len())
            .finish()
    }
}
