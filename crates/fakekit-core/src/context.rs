//! Per-test configuration threaded explicitly into every fake.
//!
//! Page tests traditionally flip feature flags through a process-wide
//! load-time dictionary. Here the dictionary lives in a [`TestContext`] value
//! owned by the test, so concurrently running tests cannot see each other's
//! overrides.

use std::collections::BTreeMap;
use std::time::Duration;

use fakekit_errors::{FakeError, FakeResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Span;

use crate::task::{DEFAULT_FLUSH_ITERATIONS, flush_tasks_n};

/// Feature flags and strings the UI reads at load time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoadTimeData {
    values: BTreeMap<String, Value>,
}

impl LoadTimeData {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Self::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Set one value, replacing any previous one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Apply several overrides at once.
    pub fn override_values<I, K, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in values {
            self.set(key, value);
        }
    }

    /// Whether `key` is present.
    pub fn value_exists(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Raw JSON value for `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Boolean flag.
    ///
    /// # Errors
    ///
    /// [`FakeError::MissingKey`] or [`FakeError::WrongType`].
    pub fn get_bool(&self, key: &str) -> FakeResult<bool> {
        self.require(key)?
            .as_bool()
            .ok_or_else(|| wrong_type(key, "bool"))
    }

    /// Boolean flag, `default` when absent.
    ///
    /// # Errors
    ///
    /// [`FakeError::WrongType`] when present but not a boolean.
    pub fn get_bool_or(&self, key: &str, default: bool) -> FakeResult<bool> {
        match self.values.get(key) {
            None => Ok(default),
            Some(value) => value.as_bool().ok_or_else(|| wrong_type(key, "bool")),
        }
    }

    /// String value.
    ///
    /// # Errors
    ///
    /// [`FakeError::MissingKey`] or [`FakeError::WrongType`].
    pub fn get_string(&self, key: &str) -> FakeResult<String> {
        self.require(key)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| wrong_type(key, "string"))
    }

    /// Integer value.
    ///
    /// # Errors
    ///
    /// [`FakeError::MissingKey`] or [`FakeError::WrongType`].
    pub fn get_integer(&self, key: &str) -> FakeResult<i64> {
        self.require(key)?
            .as_i64()
            .ok_or_else(|| wrong_type(key, "integer"))
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no keys are set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn require(&self, key: &str) -> FakeResult<&Value> {
        self.values
            .get(key)
            .ok_or_else(|| FakeError::MissingKey(key.to_string()))
    }
}

fn wrong_type(key: &str, expected: &'static str) -> FakeError {
    FakeError::WrongType {
        key: key.to_string(),
        expected,
    }
}

/// Knobs shared by every fake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FakeOptions {
    /// Deliver the current snapshot to an observer as soon as it registers
    pub replay_on_subscribe: bool,
    /// Test-runner timeout for awaiting a method gate
    pub await_timeout_ms: u64,
    /// Yields performed by [`TestContext::flush`]
    pub flush_iterations: usize,
}

impl Default for FakeOptions {
    fn default() -> Self {
        Self {
            replay_on_subscribe: true,
            await_timeout_ms: 5_000,
            flush_iterations: DEFAULT_FLUSH_ITERATIONS,
        }
    }
}

impl FakeOptions {
    /// [`Self::await_timeout_ms`] as a [`Duration`].
    pub fn await_timeout(&self) -> Duration {
        Duration::from_millis(self.await_timeout_ms)
    }
}

/// Everything a fake needs to know about the test it runs in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestContext {
    /// Test name, used as a tracing span field
    pub name: String,
    /// Load-time flags
    pub load_time_data: LoadTimeData,
    /// Fake behaviour knobs
    pub options: FakeOptions,
}

impl TestContext {
    /// Create a context with default options and no flags.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse a context from JSON.
    ///
    /// # Errors
    ///
    /// [`FakeError::Config`] on malformed input.
    pub fn from_json_str(json: &str) -> FakeResult<Self> {
        serde_json::from_str(json).map_err(|e| FakeError::config(e.to_string()))
    }

    /// Parse a context from YAML.
    ///
    /// # Errors
    ///
    /// [`FakeError::Config`] on malformed input.
    pub fn from_yaml_str(yaml: &str) -> FakeResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| FakeError::config(e.to_string()))
    }

    /// Set one load-time value.
    pub fn with_load_time_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.load_time_data.set(key, value);
        self
    }

    /// Replace the options.
    pub fn with_options(mut self, options: FakeOptions) -> Self {
        self.options = options;
        self
    }

    /// Toggle replay-on-subscribe.
    pub fn replay_on_subscribe(mut self, replay: bool) -> Self {
        self.options.replay_on_subscribe = replay;
        self
    }

    /// Set the await timeout.
    pub fn await_timeout(mut self, timeout: Duration) -> Self {
        self.options.await_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Tracing span carrying the test name.
    pub fn span(&self) -> Span {
        tracing::info_span!("fake_test", test = %self.name)
    }

    /// Yield to the runtime [`FakeOptions::flush_iterations`] times.
    pub async fn flush(&self) {
        flush_tasks_n(self.options.flush_iterations).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() -> FakeResult<()> {
        let data = LoadTimeData::new()
            .with("isHotspotEnabled", true)
            .with("carrierName", "Example Mobile")
            .with("maxProfiles", 5);
        assert!(data.get_bool("isHotspotEnabled")?);
        assert_eq!(data.get_string("carrierName")?, "Example Mobile");
        assert_eq!(data.get_integer("maxProfiles")?, 5);
        assert_eq!(
            data.get_bool("missing"),
            Err(FakeError::MissingKey("missing".to_string()))
        );
        assert!(matches!(
            data.get_bool("carrierName"),
            Err(FakeError::WrongType { expected: "bool", .. })
        ));
        Ok(())
    }

    #[test]
    fn test_get_bool_or() -> FakeResult<()> {
        let data = LoadTimeData::new().with("flag", false);
        assert!(!data.get_bool_or("flag", true)?);
        assert!(data.get_bool_or("absent", true)?);
        Ok(())
    }

    #[test]
    fn test_override_values() {
        let mut data = LoadTimeData::new().with("a", true);
        data.override_values([("a", false), ("b", true)]);
        assert_eq!(data.get_bool("a"), Ok(false));
        assert_eq!(data.get_bool("b"), Ok(true));
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn test_from_yaml() -> FakeResult<()> {
        let ctx = TestContext::from_yaml_str(
            "name: hotspot_page\nload_time_data:\n  isHotspotEnabled: true\noptions:\n  replay_on_subscribe: false\n",
        )?;
        assert_eq!(ctx.name, "hotspot_page");
        assert!(ctx.load_time_data.get_bool("isHotspotEnabled")?);
        assert!(!ctx.options.replay_on_subscribe);
        assert_eq!(ctx.options.await_timeout_ms, 5_000);
        Ok(())
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            TestContext::from_json_str("{not json"),
            Err(FakeError::Config(_))
        ));
    }

    #[test]
    fn test_builder() {
        let ctx = TestContext::new("scan")
            .with_load_time_value("allowOrca", false)
            .replay_on_subscribe(false)
            .await_timeout(Duration::from_millis(250));
        assert_eq!(ctx.options.await_timeout(), Duration::from_millis(250));
        assert!(!ctx.options.replay_on_subscribe);
        assert!(ctx.load_time_data.value_exists("allowOrca"));
    }
}
