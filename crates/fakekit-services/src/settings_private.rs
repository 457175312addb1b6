//! Typed preference store behind the settings pages.
//!
//! Prefs are kept in an [`ObservableState`] keyed by pref name, so tests can
//! subscribe to whole-store snapshots. Listeners registered through the
//! interface get `on_prefs_changed` with only the prefs that changed, which is
//! what the settings UI consumes.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use fakekit_core::{ObservableState, ObserverId, ObserverSet, TestContext, TestProxy};
use fakekit_errors::{FakeError, FakeResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Tracked method names.
pub mod methods {
    /// [`super::SettingsPrivate::get_all_prefs`]
    pub const GET_ALL_PREFS: &str = "get_all_prefs";
    /// [`super::SettingsPrivate::get_pref`]
    pub const GET_PREF: &str = "get_pref";
    /// [`super::SettingsPrivate::set_pref`]
    pub const SET_PREF: &str = "set_pref";
    /// [`super::SettingsPrivate::add_prefs_changed_listener`]
    pub const ADD_PREFS_CHANGED_LISTENER: &str = "add_prefs_changed_listener";
    /// [`super::SettingsPrivate::remove_prefs_changed_listener`]
    pub const REMOVE_PREFS_CHANGED_LISTENER: &str = "remove_prefs_changed_listener";

    /// Every tracked name.
    pub const ALL: [&str; 5] = [
        GET_ALL_PREFS,
        GET_PREF,
        SET_PREF,
        ADD_PREFS_CHANGED_LISTENER,
        REMOVE_PREFS_CHANGED_LISTENER,
    ];
}

/// Declared type of a pref value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrefType {
    /// JSON bool
    Boolean,
    /// JSON number
    Number,
    /// JSON string
    String,
    /// JSON string holding a URL
    Url,
    /// JSON array
    List,
    /// JSON object
    Dictionary,
}

impl PrefType {
    /// Whether `value` is acceptable for this type.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            PrefType::Boolean => value.is_boolean(),
            PrefType::Number => value.is_number(),
            PrefType::String | PrefType::Url => value.is_string(),
            PrefType::List => value.is_array(),
            PrefType::Dictionary => value.is_object(),
        }
    }
}

/// Whether the user can change a pref.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Enforcement {
    /// Locked by policy
    Enforced,
    /// Default supplied by policy, user may override
    Recommended,
    /// Locked by a parent
    ParentSupervised,
}

/// Who controls an enforced pref.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlledBy {
    /// Device policy
    DevicePolicy,
    /// User policy
    UserPolicy,
    /// Device owner
    Owner,
    /// Primary user of a multi-profile session
    PrimaryUser,
    /// An extension
    Extension,
    /// Parent of a supervised user
    Parent,
}

/// One preference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefObject {
    /// Dotted pref name
    pub key: String,
    /// Declared value type
    #[serde(rename = "type")]
    pub pref_type: PrefType,
    /// Current value
    pub value: Value,
    /// Enforcement, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforcement: Option<Enforcement>,
    /// Controller of an enforced pref
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controlled_by: Option<ControlledBy>,
}

impl PrefObject {
    /// Unenforced pref.
    pub fn new(key: impl Into<String>, pref_type: PrefType, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            pref_type,
            value: value.into(),
            enforcement: None,
            controlled_by: None,
        }
    }

    /// Boolean pref.
    pub fn boolean(key: impl Into<String>, value: bool) -> Self {
        Self::new(key, PrefType::Boolean, value)
    }

    /// Mark as enforced by `controlled_by`.
    pub fn enforced(mut self, controlled_by: ControlledBy) -> Self {
        self.enforcement = Some(Enforcement::Enforced);
        self.controlled_by = Some(controlled_by);
        self
    }

    /// Whether the user is locked out of changing this pref.
    pub fn is_enforced(&self) -> bool {
        matches!(
            self.enforcement,
            Some(Enforcement::Enforced | Enforcement::ParentSupervised)
        )
    }
}

/// Receives batches of changed prefs.
pub trait PrefsChangedListener: Send + Sync {
    /// `prefs` holds only the prefs that changed.
    fn on_prefs_changed(&self, prefs: &[PrefObject]);
}

/// Client interface of the settings pref store.
#[async_trait]
pub trait SettingsPrivate: Send + Sync {
    /// Every pref, ordered by key.
    async fn get_all_prefs(&self) -> FakeResult<Vec<PrefObject>>;

    /// One pref, `None` if unknown.
    async fn get_pref(&self, key: &str) -> FakeResult<Option<PrefObject>>;

    /// Change a pref value. Returns `false` when the pref is unknown, enforced,
    /// or `value` does not match its declared type.
    async fn set_pref(&self, key: &str, value: Value) -> FakeResult<bool>;

    /// Register a change listener.
    async fn add_prefs_changed_listener(
        &self,
        listener: Arc<dyn PrefsChangedListener>,
    ) -> FakeResult<ObserverId>;

    /// Detach a change listener.
    async fn remove_prefs_changed_listener(&self, id: ObserverId) -> FakeResult<bool>;
}

/// Pref name to pref.
pub type PrefMap = BTreeMap<String, PrefObject>;

/// In-memory [`SettingsPrivate`].
pub struct FakeSettingsPrivate {
    ctx: TestContext,
    proxy: TestProxy,
    prefs: ObservableState<PrefMap>,
    listeners: ObserverSet<dyn PrefsChangedListener>,
}

impl FakeSettingsPrivate {
    /// Empty store with a default context.
    pub fn new() -> Self {
        Self::with_context(TestContext::default())
    }

    /// Empty store bound to `ctx`.
    pub fn with_context(ctx: TestContext) -> Self {
        Self {
            ctx,
            proxy: TestProxy::new(methods::ALL),
            prefs: ObservableState::new(PrefMap::new()),
            listeners: ObserverSet::new("prefs_changed"),
        }
    }

    /// Store seeded with `prefs`.
    pub fn with_prefs(prefs: impl IntoIterator<Item = PrefObject>) -> Self {
        let fake = Self::new();
        fake.prefs
            .update_silently(|map| map.extend(prefs.into_iter().map(|p| (p.key.clone(), p))));
        fake
    }

    /// Call tracking for this fake.
    pub fn proxy(&self) -> &TestProxy {
        &self.proxy
    }

    /// Context this fake was built with.
    pub fn context(&self) -> &TestContext {
        &self.ctx
    }

    /// Whole-store snapshots.
    pub fn state(&self) -> &ObservableState<PrefMap> {
        &self.prefs
    }

    /// Current value of `key`.
    pub fn pref_value(&self, key: &str) -> Option<Value> {
        self.prefs.with_state(|map| map.get(key).map(|p| p.value.clone()))
    }

    /// Number of registered change listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Insert or replace prefs and notify listeners, bypassing type checks.
    pub fn set_prefs_for_test(&self, prefs: Vec<PrefObject>) {
        self.prefs.update(|map| {
            for pref in &prefs {
                map.insert(pref.key.clone(), pref.clone());
            }
        });
        self.listeners.for_each(|l| l.on_prefs_changed(&prefs));
    }

    /// Drop every pref, listener and recorded call.
    pub fn reset_for_test(&self) {
        self.prefs.replace(PrefMap::new());
        self.listeners.clear();
        self.proxy.reset();
    }

    fn apply(&self, key: &str, value: Value) -> Option<PrefObject> {
        let Some(mut pref) = self.prefs.with_state(|map| map.get(key).cloned()) else {
            warn!(key, "set_pref for unknown pref");
            return None;
        };
        if pref.is_enforced() {
            debug!(key, "set_pref rejected: enforced");
            return None;
        }
        if !pref.pref_type.accepts(&value) {
            debug!(key, expected = ?pref.pref_type, "set_pref rejected: type mismatch");
            return None;
        }
        pref.value = value;
        let stored = pref.clone();
        self.prefs.update(move |map| {
            map.insert(stored.key.clone(), stored);
        });
        Some(pref)
    }
}

impl Default for FakeSettingsPrivate {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettingsPrivate for FakeSettingsPrivate {
    async fn get_all_prefs(&self) -> FakeResult<Vec<PrefObject>> {
        self.proxy.method_called(methods::GET_ALL_PREFS, ());
        Ok(self.prefs.with_state(|map| map.values().cloned().collect()))
    }

    async fn get_pref(&self, key: &str) -> FakeResult<Option<PrefObject>> {
        self.proxy.method_called(methods::GET_PREF, key.to_string());
        Ok(self.prefs.with_state(|map| map.get(key).cloned()))
    }

    async fn set_pref(&self, key: &str, value: Value) -> FakeResult<bool> {
        self.proxy
            .method_called(methods::SET_PREF, (key.to_string(), value.clone()));
        match self.apply(key, value) {
            Some(changed) => {
                self.listeners
                    .for_each(|l| l.on_prefs_changed(std::slice::from_ref(&changed)));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn add_prefs_changed_listener(
        &self,
        listener: Arc<dyn PrefsChangedListener>,
    ) -> FakeResult<ObserverId> {
        self.proxy
            .method_called(methods::ADD_PREFS_CHANGED_LISTENER, Arc::clone(&listener));
        Ok(self.listeners.add(listener))
    }

    async fn remove_prefs_changed_listener(&self, id: ObserverId) -> FakeResult<bool> {
        self.proxy
            .method_called(methods::REMOVE_PREFS_CHANGED_LISTENER, id);
        Ok(self.listeners.remove(id))
    }
}

/// Parse a JSON array of prefs, as stored in test fixtures.
///
/// # Errors
///
/// [`FakeError::Config`] on malformed input.
pub fn prefs_from_json(json: &str) -> FakeResult<Vec<PrefObject>> {
    serde_json::from_str(json).map_err(|e| FakeError::config(e.to_string()))
}
