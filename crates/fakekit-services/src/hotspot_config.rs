//! Tethering hotspot configuration.
//!
//! Hotspot info is a single snapshot held in an [`ObservableState`]; each
//! registered [`CrosHotspotConfigObserver`] receives the full
//! [`HotspotInfo`] on every change. Control calls return results the test
//! can force in advance.
//!
//! The whole feature is behind the [`HOTSPOT_ENABLED_FLAG`] load-time value.
//! With the flag off every control call reports
//! [`HotspotControlResult::NotAllowed`] and leaves the state untouched.

use std::sync::Arc;

use async_trait::async_trait;
use fakekit_core::{Merge, ObservableState, Subscription, TestContext, TestProxy};
use fakekit_errors::FakeResult;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Load-time key gating the hotspot feature.
pub const HOTSPOT_ENABLED_FLAG: &str = "isHotspotEnabled";

/// Tracked method names.
pub mod methods {
    /// [`super::CrosHotspotConfig::get_hotspot_info`]
    pub const GET_HOTSPOT_INFO: &str = "get_hotspot_info";
    /// [`super::CrosHotspotConfig::set_hotspot_config`]
    pub const SET_HOTSPOT_CONFIG: &str = "set_hotspot_config";
    /// [`super::CrosHotspotConfig::enable_hotspot`]
    pub const ENABLE_HOTSPOT: &str = "enable_hotspot";
    /// [`super::CrosHotspotConfig::disable_hotspot`]
    pub const DISABLE_HOTSPOT: &str = "disable_hotspot";
    /// [`super::CrosHotspotConfig::add_observer`]
    pub const ADD_OBSERVER: &str = "add_observer";

    /// Every tracked name.
    pub const ALL: [&str; 5] = [
        GET_HOTSPOT_INFO,
        SET_HOTSPOT_CONFIG,
        ENABLE_HOTSPOT,
        DISABLE_HOTSPOT,
        ADD_OBSERVER,
    ];
}

/// Hotspot power state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HotspotState {
    /// Off
    #[default]
    Disabled,
    /// Turning on
    Enabling,
    /// On
    Enabled,
    /// Turning off
    Disabling,
}

/// Whether the device may start a hotspot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HotspotAllowStatus {
    /// No cellular upstream available
    DisallowedNoCellularUpstream,
    /// WiFi cannot act as downstream
    DisallowedNoWiFiDownstream,
    /// No supported security mode
    DisallowedNoWiFiSecurityModes,
    /// Mobile data turned off
    DisallowedNoMobileData,
    /// Carrier readiness check failed
    DisallowedReadinessCheckFail,
    /// Blocked by policy
    DisallowedByPolicy,
    /// Allowed
    #[default]
    Allowed,
}

/// WiFi security for hotspot clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WiFiSecurityMode {
    /// WPA2 personal
    #[default]
    Wpa2,
    /// WPA3 personal
    Wpa3,
    /// WPA2/WPA3 transitional
    Wpa2Wpa3,
}

/// WiFi band for the hotspot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WiFiBand {
    /// Let the platform pick
    #[default]
    AutoChoose,
    /// 2.4GHz
    Band2_4GHz,
    /// 5GHz
    Band5GHz,
}

/// User-editable hotspot settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotspotConfig {
    /// Network name
    pub ssid: String,
    /// Client passphrase
    pub passphrase: String,
    /// Client security
    pub security: WiFiSecurityMode,
    /// Band
    pub band: WiFiBand,
    /// Turn off when no client is connected
    pub auto_disable: bool,
    /// Randomize the BSSID
    pub bssid_randomization: bool,
}

impl HotspotConfig {
    /// WPA2, auto band, auto-disable on.
    pub fn new(ssid: impl Into<String>, passphrase: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            passphrase: passphrase.into(),
            security: WiFiSecurityMode::Wpa2,
            band: WiFiBand::AutoChoose,
            auto_disable: true,
            bssid_randomization: false,
        }
    }
}

/// Everything the UI shows about the hotspot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotspotInfo {
    /// Power state
    pub state: HotspotState,
    /// Allow status
    pub allow_status: HotspotAllowStatus,
    /// Connected clients
    pub client_count: u32,
    /// Current settings, if configured
    pub config: Option<HotspotConfig>,
    /// Security modes offered in the config dialog
    pub allowed_wifi_security_modes: Vec<WiFiSecurityMode>,
}

/// Partial [`HotspotInfo`] update; present fields replace the current ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HotspotInfoPatch {
    /// New power state
    pub state: Option<HotspotState>,
    /// New allow status
    pub allow_status: Option<HotspotAllowStatus>,
    /// New client count
    pub client_count: Option<u32>,
    /// New settings
    pub config: Option<HotspotConfig>,
}

impl Merge for HotspotInfo {
    type Patch = HotspotInfoPatch;

    fn merge(&mut self, patch: HotspotInfoPatch) {
        if let Some(state) = patch.state {
            self.state = state;
        }
        if let Some(allow_status) = patch.allow_status {
            self.allow_status = allow_status;
        }
        if let Some(client_count) = patch.client_count {
            self.client_count = client_count;
        }
        if let Some(config) = patch.config {
            self.config = Some(config);
        }
    }
}

/// Result of enable/disable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HotspotControlResult {
    /// Done
    #[default]
    Success,
    /// Not allowed right now
    NotAllowed,
    /// Carrier readiness check failed
    ReadinessCheckFailed,
    /// Stored config is invalid
    InvalidConfiguration,
    /// No upstream network
    UpstreamNotAvailable,
    /// Already in the requested state
    AlreadyFulfilled,
    /// Anything else
    UnknownFailure,
}

/// Result of saving a config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SetHotspotConfigResult {
    /// Saved
    #[default]
    Success,
    /// No user is signed in
    FailedNotLogin,
    /// Rejected
    FailedInvalidConfiguration,
}

/// Receives hotspot snapshots.
pub trait CrosHotspotConfigObserver: Send + Sync {
    /// The hotspot info changed.
    fn on_hotspot_info_changed(&self, info: &HotspotInfo);
}

/// Client interface of the hotspot configuration service.
#[async_trait]
pub trait CrosHotspotConfig: Send + Sync {
    /// Current hotspot info.
    async fn get_hotspot_info(&self) -> FakeResult<HotspotInfo>;

    /// Save new settings.
    async fn set_hotspot_config(&self, config: HotspotConfig) -> FakeResult<SetHotspotConfigResult>;

    /// Turn the hotspot on.
    async fn enable_hotspot(&self) -> FakeResult<HotspotControlResult>;

    /// Turn the hotspot off.
    async fn disable_hotspot(&self) -> FakeResult<HotspotControlResult>;

    /// Register `observer` for hotspot info changes.
    async fn add_observer(&self, observer: Arc<dyn CrosHotspotConfigObserver>) -> FakeResult<()>;
}

#[derive(Debug, Default, Clone, Copy)]
struct ForcedResults {
    enable: HotspotControlResult,
    disable: HotspotControlResult,
    set_config: SetHotspotConfigResult,
}

/// In-memory [`CrosHotspotConfig`].
pub struct FakeHotspotConfig {
    ctx: TestContext,
    proxy: TestProxy,
    info: ObservableState<HotspotInfo>,
    results: Mutex<ForcedResults>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl FakeHotspotConfig {
    /// Fake with the hotspot feature turned on.
    pub fn new() -> Self {
        Self::with_context(TestContext::default().with_load_time_value(HOTSPOT_ENABLED_FLAG, true))
    }

    /// Fake bound to `ctx`; the feature follows [`HOTSPOT_ENABLED_FLAG`].
    pub fn with_context(ctx: TestContext) -> Self {
        Self {
            ctx,
            proxy: TestProxy::new(methods::ALL),
            info: ObservableState::new(HotspotInfo::default()),
            results: Mutex::new(ForcedResults::default()),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Call tracking for this fake.
    pub fn proxy(&self) -> &TestProxy {
        &self.proxy
    }

    /// Hotspot info snapshots.
    pub fn state(&self) -> &ObservableState<HotspotInfo> {
        &self.info
    }

    /// Whether the feature flag is on. Absent means off.
    ///
    /// # Errors
    ///
    /// [`fakekit_errors::FakeError::WrongType`] if the flag is not a bool.
    pub fn is_hotspot_enabled(&self) -> FakeResult<bool> {
        self.ctx
            .load_time_data
            .get_bool_or(HOTSPOT_ENABLED_FLAG, false)
    }

    /// Replace the whole info and notify observers.
    pub fn set_hotspot_info_for_test(&self, info: HotspotInfo) {
        self.info.replace(info);
    }

    /// Change only the power state.
    pub fn set_hotspot_state_for_test(&self, state: HotspotState) {
        self.info.set_state(HotspotInfoPatch {
            state: Some(state),
            ..HotspotInfoPatch::default()
        });
    }

    /// Change only the allow status.
    pub fn set_hotspot_allow_status_for_test(&self, allow_status: HotspotAllowStatus) {
        self.info.set_state(HotspotInfoPatch {
            allow_status: Some(allow_status),
            ..HotspotInfoPatch::default()
        });
    }

    /// Change only the connected client count.
    pub fn set_hotspot_client_count_for_test(&self, client_count: u32) {
        self.info.set_state(HotspotInfoPatch {
            client_count: Some(client_count),
            ..HotspotInfoPatch::default()
        });
    }

    /// Result returned by the next `enable_hotspot` calls.
    pub fn set_enable_hotspot_result_for_test(&self, result: HotspotControlResult) {
        self.results.lock().enable = result;
    }

    /// Result returned by the next `disable_hotspot` calls.
    pub fn set_disable_hotspot_result_for_test(&self, result: HotspotControlResult) {
        self.results.lock().disable = result;
    }

    /// Result returned by the next `set_hotspot_config` calls.
    pub fn set_hotspot_config_result_for_test(&self, result: SetHotspotConfigResult) {
        self.results.lock().set_config = result;
    }

    /// Restore defaults, detach observers and clear calls.
    pub fn reset_for_test(&self) {
        for subscription in self.subscriptions.lock().drain(..) {
            subscription.unsubscribe();
        }
        self.info.replace(HotspotInfo::default());
        *self.results.lock() = ForcedResults::default();
        self.proxy.reset();
    }

    fn control(
        &self,
        forced: HotspotControlResult,
        target: HotspotState,
    ) -> FakeResult<HotspotControlResult> {
        if !self.is_hotspot_enabled()? {
            debug!("hotspot feature disabled");
            return Ok(HotspotControlResult::NotAllowed);
        }
        if forced == HotspotControlResult::Success {
            let client_count = (target == HotspotState::Disabled).then_some(0);
            self.info.set_state(HotspotInfoPatch {
                state: Some(target),
                client_count,
                ..HotspotInfoPatch::default()
            });
        }
        Ok(forced)
    }
}

impl Default for FakeHotspotConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CrosHotspotConfig for FakeHotspotConfig {
    async fn get_hotspot_info(&self) -> FakeResult<HotspotInfo> {
        self.proxy.method_called(methods::GET_HOTSPOT_INFO, ());
        Ok(self.info.get_state())
    }

    async fn set_hotspot_config(
        &self,
        config: HotspotConfig,
    ) -> FakeResult<SetHotspotConfigResult> {
        self.proxy
            .method_called(methods::SET_HOTSPOT_CONFIG, config.clone());
        let result = self.results.lock().set_config;
        if result == SetHotspotConfigResult::Success {
            self.info.set_state(HotspotInfoPatch {
                config: Some(config),
                ..HotspotInfoPatch::default()
            });
        }
        Ok(result)
    }

    async fn enable_hotspot(&self) -> FakeResult<HotspotControlResult> {
        self.proxy.method_called(methods::ENABLE_HOTSPOT, ());
        let forced = self.results.lock().enable;
        self.control(forced, HotspotState::Enabled)
    }

    async fn disable_hotspot(&self) -> FakeResult<HotspotControlResult> {
        self.proxy.method_called(methods::DISABLE_HOTSPOT, ());
        let forced = self.results.lock().disable;
        self.control(forced, HotspotState::Disabled)
    }

    async fn add_observer(&self, observer: Arc<dyn CrosHotspotConfigObserver>) -> FakeResult<()> {
        self.proxy
            .method_called(methods::ADD_OBSERVER, Arc::clone(&observer));
        let callback = move |info: &HotspotInfo| observer.on_hotspot_info_changed(info);
        let subscription = if self.ctx.options.replay_on_subscribe {
            self.info.add_observer(callback)
        } else {
            self.info.subscribe(callback).1
        };
        self.subscriptions.lock().push(subscription);
        Ok(())
    }
}
