//! Network configuration backend: network list, devices, managed properties.
//!
//! The fake keeps everything in one [`ObservableState`] snapshot and fires
//! the typed [`CrosNetworkConfigObserver`] callbacks after each change:
//! list changes, per-network changes, active-network changes and device
//! list changes are separate callbacks, as the UI subscribes to them
//! separately.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use fakekit_core::{ObservableState, ObserverSet, TestContext, TestProxy};
use fakekit_errors::FakeResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

/// Tracked method names.
pub mod methods {
    /// [`super::CrosNetworkConfig::add_observer`]
    pub const ADD_OBSERVER: &str = "add_observer";
    /// [`super::CrosNetworkConfig::get_network_state`]
    pub const GET_NETWORK_STATE: &str = "get_network_state";
    /// [`super::CrosNetworkConfig::get_network_state_list`]
    pub const GET_NETWORK_STATE_LIST: &str = "get_network_state_list";
    /// [`super::CrosNetworkConfig::get_device_state_list`]
    pub const GET_DEVICE_STATE_LIST: &str = "get_device_state_list";
    /// [`super::CrosNetworkConfig::get_managed_properties`]
    pub const GET_MANAGED_PROPERTIES: &str = "get_managed_properties";
    /// [`super::CrosNetworkConfig::set_properties`]
    pub const SET_PROPERTIES: &str = "set_properties";
    /// [`super::CrosNetworkConfig::set_network_type_enabled_state`]
    pub const SET_NETWORK_TYPE_ENABLED_STATE: &str = "set_network_type_enabled_state";
    /// [`super::CrosNetworkConfig::request_network_scan`]
    pub const REQUEST_NETWORK_SCAN: &str = "request_network_scan";
    /// [`super::CrosNetworkConfig::get_network_certificates`]
    pub const GET_NETWORK_CERTIFICATES: &str = "get_network_certificates";

    /// Every tracked name.
    pub const ALL: [&str; 9] = [
        ADD_OBSERVER,
        GET_NETWORK_STATE,
        GET_NETWORK_STATE_LIST,
        GET_DEVICE_STATE_LIST,
        GET_MANAGED_PROPERTIES,
        SET_PROPERTIES,
        SET_NETWORK_TYPE_ENABLED_STATE,
        REQUEST_NETWORK_SCAN,
        GET_NETWORK_CERTIFICATES,
    ];
}

/// Network technology, including the group values used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkType {
    /// Matches every concrete type
    All,
    /// Cellular or tether
    Mobile,
    /// WiFi, cellular or tether
    Wireless,
    /// Cellular
    Cellular,
    /// Wired ethernet
    Ethernet,
    /// Instant tethering
    Tether,
    /// VPN
    Vpn,
    /// WiFi
    WiFi,
}

impl NetworkType {
    /// Whether `concrete` belongs to this type or group.
    pub fn matches(self, concrete: NetworkType) -> bool {
        match self {
            NetworkType::All => true,
            NetworkType::Mobile => matches!(concrete, NetworkType::Cellular | NetworkType::Tether),
            NetworkType::Wireless => matches!(
                concrete,
                NetworkType::WiFi | NetworkType::Cellular | NetworkType::Tether
            ),
            other => other == concrete,
        }
    }
}

/// Connection state of one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    /// Connected with internet access
    Online,
    /// Connected, internet access unknown
    Connected,
    /// Behind a captive portal
    Portal,
    /// Connection in progress
    Connecting,
    /// Idle
    #[default]
    NotConnected,
}

impl ConnectionState {
    /// Connected in any form.
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            ConnectionState::Online | ConnectionState::Connected | ConnectionState::Portal
        )
    }

    /// Connected or connecting.
    pub fn is_active(self) -> bool {
        self.is_connected() || self == ConnectionState::Connecting
    }
}

/// Summary of one network as shown in network lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkStateProperties {
    /// Stable network id
    pub guid: String,
    /// Display name
    pub name: String,
    /// Concrete type
    pub network_type: NetworkType,
    /// Current connection state
    pub connection_state: ConnectionState,
    /// In range
    pub visible: bool,
    /// Has a saved configuration
    pub configured: bool,
}

impl NetworkStateProperties {
    /// Visible, unconfigured, idle network.
    pub fn new(guid: impl Into<String>, network_type: NetworkType) -> Self {
        let guid = guid.into();
        Self {
            name: guid.clone(),
            guid,
            network_type,
            connection_state: ConnectionState::NotConnected,
            visible: true,
            configured: false,
        }
    }

    /// Set the connection state.
    pub fn with_connection_state(mut self, state: ConnectionState) -> Self {
        self.connection_state = state;
        self
    }
}

/// Which networks a list request returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterType {
    /// Networks in range
    #[default]
    Visible,
    /// Networks with a saved configuration
    Configured,
    /// Connected or connecting networks
    Active,
    /// Everything known
    All,
}

/// Network list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkFilter {
    /// Which networks
    pub filter: FilterType,
    /// Type or group
    pub network_type: NetworkType,
    /// Maximum number of results, `0` means no limit
    pub limit: usize,
}

impl NetworkFilter {
    /// Unlimited filter.
    pub fn new(filter: FilterType, network_type: NetworkType) -> Self {
        Self {
            filter,
            network_type,
            limit: 0,
        }
    }

    /// Whether `network` passes this filter, ignoring the limit.
    pub fn accepts(&self, network: &NetworkStateProperties) -> bool {
        let by_filter = match self.filter {
            FilterType::Visible => network.visible,
            FilterType::Configured => network.configured,
            FilterType::Active => network.connection_state.is_active(),
            FilterType::All => true,
        };
        by_filter && self.network_type.matches(network.network_type)
    }
}

/// Power state of a network device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeviceState {
    /// Not yet initialized
    Uninitialized,
    /// Off
    #[default]
    Disabled,
    /// Turning off
    Disabling,
    /// Turning on
    Enabling,
    /// On
    Enabled,
    /// Prohibited by policy
    Prohibited,
    /// Hardware missing
    Unavailable,
}

/// One network device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStateProperties {
    /// Device technology
    pub network_type: NetworkType,
    /// Power state
    pub device_state: DeviceState,
    /// Scan in progress
    pub scanning: bool,
    /// Carrier lock or inhibit reason, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inhibit_reason: Option<String>,
}

impl DeviceStateProperties {
    /// Idle device.
    pub fn new(network_type: NetworkType, device_state: DeviceState) -> Self {
        Self {
            network_type,
            device_state,
            scanning: false,
            inhibit_reason: None,
        }
    }
}

/// Full configuration of one network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedProperties {
    /// Stable network id
    pub guid: String,
    /// Display name
    pub name: String,
    /// Concrete type
    pub network_type: NetworkType,
    /// Connection state
    pub connection_state: ConnectionState,
    /// Type-specific properties
    #[serde(default)]
    pub type_properties: Value,
}

impl ManagedProperties {
    /// Properties with an empty type-specific object.
    pub fn new(guid: impl Into<String>, network_type: NetworkType) -> Self {
        let guid = guid.into();
        Self {
            name: guid.clone(),
            guid,
            network_type,
            connection_state: ConnectionState::NotConnected,
            type_properties: Value::Object(serde_json::Map::new()),
        }
    }

    fn to_network_state(&self) -> NetworkStateProperties {
        NetworkStateProperties {
            guid: self.guid.clone(),
            name: self.name.clone(),
            network_type: self.network_type,
            connection_state: self.connection_state,
            visible: true,
            configured: true,
        }
    }
}

/// Certificate offered for EAP network configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCertificate {
    /// Certificate hash
    pub hash: String,
    /// Subject
    pub issued_to: String,
    /// Issuer
    pub issued_by: String,
    /// Stored in hardware
    pub hardware_backed: bool,
}

/// Server CAs and user certificates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCertificates {
    /// Server certificate authorities
    pub server_cas: Vec<NetworkCertificate>,
    /// User certificates
    pub user_certs: Vec<NetworkCertificate>,
}

/// Everything the fake backend knows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkConfigState {
    /// Known networks in insertion order
    pub networks: Vec<NetworkStateProperties>,
    /// Network devices
    pub devices: Vec<DeviceStateProperties>,
    /// Managed properties by GUID
    pub managed: BTreeMap<String, ManagedProperties>,
    /// Last `set_properties` payload
    pub properties_to_set: Option<Value>,
    /// Certificates returned by `get_network_certificates`
    pub certificates: NetworkCertificates,
}

impl NetworkConfigState {
    /// Connected or connecting networks.
    pub fn active_networks(&self) -> Vec<NetworkStateProperties> {
        self.networks
            .iter()
            .filter(|n| n.connection_state.is_active())
            .cloned()
            .collect()
    }

    fn upsert_network(&mut self, network: NetworkStateProperties) {
        match self.networks.iter_mut().find(|n| n.guid == network.guid) {
            Some(existing) => *existing = network,
            None => self.networks.push(network),
        }
    }
}

/// Receives network configuration change notifications.
///
/// Every callback has an empty default so observers implement only what
/// they use.
pub trait CrosNetworkConfigObserver: Send + Sync {
    /// The set of known networks changed.
    fn on_network_state_list_changed(&self) {}

    /// A device changed state.
    fn on_device_state_list_changed(&self) {}

    /// The connected or connecting networks.
    fn on_active_networks_changed(&self, _networks: &[NetworkStateProperties]) {}

    /// One network changed.
    fn on_network_state_changed(&self, _network: &NetworkStateProperties) {}
}

/// Client interface of the network configuration service.
#[async_trait]
pub trait CrosNetworkConfig: Send + Sync {
    /// Register `observer` for change notifications.
    async fn add_observer(&self, observer: Arc<dyn CrosNetworkConfigObserver>) -> FakeResult<()>;

    /// One network by GUID.
    async fn get_network_state(&self, guid: &str) -> FakeResult<Option<NetworkStateProperties>>;

    /// Networks passing `filter`.
    async fn get_network_state_list(
        &self,
        filter: NetworkFilter,
    ) -> FakeResult<Vec<NetworkStateProperties>>;

    /// Every network device.
    async fn get_device_state_list(&self) -> FakeResult<Vec<DeviceStateProperties>>;

    /// Full configuration of one network.
    async fn get_managed_properties(&self, guid: &str) -> FakeResult<Option<ManagedProperties>>;

    /// Apply configuration to a network. Returns `false` for an unknown GUID.
    async fn set_properties(&self, guid: &str, properties: Value) -> FakeResult<bool>;

    /// Turn the device of `network_type` on or off.
    async fn set_network_type_enabled_state(
        &self,
        network_type: NetworkType,
        enabled: bool,
    ) -> FakeResult<bool>;

    /// Ask the device of `network_type` to scan.
    async fn request_network_scan(&self, network_type: NetworkType) -> FakeResult<()>;

    /// Certificates usable for EAP configuration.
    async fn get_network_certificates(&self) -> FakeResult<NetworkCertificates>;
}

/// In-memory [`CrosNetworkConfig`].
pub struct FakeNetworkConfig {
    ctx: TestContext,
    proxy: TestProxy,
    state: ObservableState<NetworkConfigState>,
    observers: ObserverSet<dyn CrosNetworkConfigObserver>,
}

impl FakeNetworkConfig {
    /// Empty backend with a default context.
    pub fn new() -> Self {
        Self::with_context(TestContext::default())
    }

    /// Empty backend bound to `ctx`.
    pub fn with_context(ctx: TestContext) -> Self {
        Self {
            ctx,
            proxy: TestProxy::new(methods::ALL),
            state: ObservableState::new(NetworkConfigState::default()),
            observers: ObserverSet::new("cros_network_config"),
        }
    }

    /// Call tracking for this fake.
    pub fn proxy(&self) -> &TestProxy {
        &self.proxy
    }

    /// Whole-backend snapshots.
    pub fn state(&self) -> &ObservableState<NetworkConfigState> {
        &self.state
    }

    /// Drop every network, device, property and call. Observers stay
    /// registered, as the UI under test still holds its receiver, and are
    /// told the network and device lists are now empty.
    pub fn reset_for_test(&self) {
        let snapshot = self.state.replace(NetworkConfigState::default());
        self.proxy.reset();
        self.notify_list_changed(&snapshot);
        self.on_device_state_list_changed();
    }

    /// Add or replace networks, then notify list and active observers.
    pub fn add_networks_for_test(&self, networks: Vec<NetworkStateProperties>) {
        debug!(count = networks.len(), "adding networks");
        let snapshot = self.state.update(|s| {
            for network in networks {
                s.upsert_network(network);
            }
        });
        self.notify_list_changed(&snapshot);
    }

    /// Forget one network. Returns whether it existed.
    pub fn remove_network_for_test(&self, guid: &str) -> bool {
        let mut removed = false;
        let snapshot = self.state.update(|s| {
            let before = s.networks.len();
            s.networks.retain(|n| n.guid != guid);
            s.managed.remove(guid);
            removed = s.networks.len() != before;
        });
        if removed {
            self.notify_list_changed(&snapshot);
        }
        removed
    }

    /// Move one network to `connection_state`. Returns whether it exists.
    pub fn set_network_connection_state_for_test(
        &self,
        guid: &str,
        connection_state: ConnectionState,
    ) -> bool {
        let mut changed = None;
        let snapshot = self.state.update(|s| {
            if let Some(network) = s.networks.iter_mut().find(|n| n.guid == guid) {
                network.connection_state = connection_state;
                changed = Some(network.clone());
            }
            if let Some(managed) = s.managed.get_mut(guid) {
                managed.connection_state = connection_state;
            }
        });
        let Some(network) = changed else {
            return false;
        };
        self.observers
            .for_each(|o| o.on_network_state_changed(&network));
        self.notify_list_changed(&snapshot);
        true
    }

    /// Add or replace the device of `device.network_type`.
    pub fn set_device_state_for_test(&self, device: DeviceStateProperties) {
        trace!(network_type = ?device.network_type, state = ?device.device_state, "device state");
        self.state.update(|s| {
            match s
                .devices
                .iter_mut()
                .find(|d| d.network_type == device.network_type)
            {
                Some(existing) => *existing = device,
                None => s.devices.push(device),
            }
        });
        self.observers.for_each(|o| o.on_device_state_list_changed());
    }

    /// Store managed properties and upsert the matching network state.
    pub fn set_managed_properties_for_test(&self, properties: ManagedProperties) {
        let network = properties.to_network_state();
        let snapshot = self.state.update(|s| {
            s.managed.insert(properties.guid.clone(), properties);
            s.upsert_network(network.clone());
        });
        self.observers
            .for_each(|o| o.on_network_state_changed(&network));
        self.notify_list_changed(&snapshot);
    }

    /// Mark a WiFi network in or out of range. Returns whether it exists.
    pub fn set_wifi_network_visible_for_test(&self, guid: &str, visible: bool) -> bool {
        let mut found = false;
        let snapshot = self.state.update(|s| {
            if let Some(network) = s
                .networks
                .iter_mut()
                .find(|n| n.guid == guid && n.network_type == NetworkType::WiFi)
            {
                network.visible = visible;
                found = true;
            }
        });
        if found {
            self.notify_list_changed(&snapshot);
        }
        found
    }

    /// Replace the certificates returned to the UI.
    pub fn set_certificates_for_test(
        &self,
        server_cas: Vec<NetworkCertificate>,
        user_certs: Vec<NetworkCertificate>,
    ) {
        self.state.update(|s| {
            s.certificates = NetworkCertificates {
                server_cas,
                user_certs,
            };
        });
    }

    /// Payload of the latest `set_properties` call.
    pub fn properties_to_set_for_test(&self) -> Option<Value> {
        self.state.with_state(|s| s.properties_to_set.clone())
    }

    /// Fire `on_device_state_list_changed` without changing anything.
    pub fn on_device_state_list_changed(&self) {
        self.observers.for_each(|o| o.on_device_state_list_changed());
    }

    fn notify_list_changed(&self, snapshot: &NetworkConfigState) {
        let active = snapshot.active_networks();
        self.observers.for_each(|o| {
            o.on_network_state_list_changed();
            o.on_active_networks_changed(&active);
        });
    }
}

impl Default for FakeNetworkConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CrosNetworkConfig for FakeNetworkConfig {
    async fn add_observer(&self, observer: Arc<dyn CrosNetworkConfigObserver>) -> FakeResult<()> {
        self.proxy
            .method_called(methods::ADD_OBSERVER, Arc::clone(&observer));
        self.observers.add(Arc::clone(&observer));
        if self.ctx.options.replay_on_subscribe {
            let active = self.state.with_state(NetworkConfigState::active_networks);
            observer.on_active_networks_changed(&active);
        }
        Ok(())
    }

    async fn get_network_state(&self, guid: &str) -> FakeResult<Option<NetworkStateProperties>> {
        self.proxy
            .method_called(methods::GET_NETWORK_STATE, guid.to_string());
        Ok(self
            .state
            .with_state(|s| s.networks.iter().find(|n| n.guid == guid).cloned()))
    }

    async fn get_network_state_list(
        &self,
        filter: NetworkFilter,
    ) -> FakeResult<Vec<NetworkStateProperties>> {
        self.proxy
            .method_called(methods::GET_NETWORK_STATE_LIST, filter);
        let limit = if filter.limit == 0 {
            usize::MAX
        } else {
            filter.limit
        };
        Ok(self.state.with_state(|s| {
            s.networks
                .iter()
                .filter(|n| filter.accepts(n))
                .take(limit)
                .cloned()
                .collect()
        }))
    }

    async fn get_device_state_list(&self) -> FakeResult<Vec<DeviceStateProperties>> {
        self.proxy.method_called(methods::GET_DEVICE_STATE_LIST, ());
        Ok(self.state.with_state(|s| s.devices.clone()))
    }

    async fn get_managed_properties(&self, guid: &str) -> FakeResult<Option<ManagedProperties>> {
        self.proxy
            .method_called(methods::GET_MANAGED_PROPERTIES, guid.to_string());
        Ok(self.state.with_state(|s| s.managed.get(guid).cloned()))
    }

    async fn set_properties(&self, guid: &str, properties: Value) -> FakeResult<bool> {
        self.proxy
            .method_called(methods::SET_PROPERTIES, (guid.to_string(), properties.clone()));
        let known = self.state.with_state(|s| {
            s.managed.contains_key(guid) || s.networks.iter().any(|n| n.guid == guid)
        });
        self.state
            .update(|s| s.properties_to_set = Some(properties));
        Ok(known)
    }

    async fn set_network_type_enabled_state(
        &self,
        network_type: NetworkType,
        enabled: bool,
    ) -> FakeResult<bool> {
        self.proxy.method_called(
            methods::SET_NETWORK_TYPE_ENABLED_STATE,
            (network_type, enabled),
        );
        let device_state = if enabled {
            DeviceState::Enabled
        } else {
            DeviceState::Disabled
        };
        self.state.update(|s| {
            match s.devices.iter_mut().find(|d| d.network_type == network_type) {
                Some(device) => device.device_state = device_state,
                None => s
                    .devices
                    .push(DeviceStateProperties::new(network_type, device_state)),
            }
        });
        self.observers.for_each(|o| o.on_device_state_list_changed());
        Ok(true)
    }

    async fn request_network_scan(&self, network_type: NetworkType) -> FakeResult<()> {
        self.proxy
            .method_called(methods::REQUEST_NETWORK_SCAN, network_type);
        Ok(())
    }

    async fn get_network_certificates(&self) -> FakeResult<NetworkCertificates> {
        self.proxy
            .method_called(methods::GET_NETWORK_CERTIFICATES, ());
        Ok(self.state.with_state(|s| s.certificates.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Counts {
        list: Mutex<usize>,
        devices: Mutex<usize>,
        active: Mutex<Vec<Vec<String>>>,
        changed: Mutex<Vec<String>>,
    }

    impl CrosNetworkConfigObserver for Counts {
        fn on_network_state_list_changed(&self) {
            *self.list.lock() += 1;
        }

        fn on_device_state_list_changed(&self) {
            *self.devices.lock() += 1;
        }

        fn on_active_networks_changed(&self, networks: &[NetworkStateProperties]) {
            self.active
                .lock()
                .push(networks.iter().map(|n| n.guid.clone()).collect());
        }

        fn on_network_state_changed(&self, network: &NetworkStateProperties) {
            self.changed.lock().push(network.guid.clone());
        }
    }

    fn networks() -> Vec<NetworkStateProperties> {
        vec![
            NetworkStateProperties::new("eth0_guid", NetworkType::Ethernet)
                .with_connection_state(ConnectionState::Online),
            NetworkStateProperties::new("wifi1_guid", NetworkType::WiFi),
            NetworkStateProperties::new("wifi2_guid", NetworkType::WiFi),
            NetworkStateProperties::new("cellular_guid", NetworkType::Cellular),
        ]
    }

    #[tokio::test]
    async fn test_reset_tells_observers_lists_are_empty() -> FakeResult<()> {
        let fake = FakeNetworkConfig::new();
        fake.add_networks_for_test(networks());
        fake.set_network_type_enabled_state(NetworkType::WiFi, true)
            .await?;
        let counts = Arc::new(Counts::default());
        fake.add_observer(counts.clone()).await?;
        let lists_before = *counts.list.lock();
        let devices_before = *counts.devices.lock();

        fake.reset_for_test();

        assert_eq!(*counts.list.lock(), lists_before + 1);
        assert_eq!(*counts.devices.lock(), devices_before + 1);
        assert_eq!(counts.active.lock().last(), Some(&Vec::new()));
        assert!(fake.get_device_state_list().await?.is_empty());
        let all = NetworkFilter::new(FilterType::All, NetworkType::All);
        assert!(fake.get_network_state_list(all).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_network_state_list_filters() -> FakeResult<()> {
        let fake = FakeNetworkConfig::new();
        fake.add_networks_for_test(networks());

        let wifi = fake
            .get_network_state_list(NetworkFilter::new(FilterType::Visible, NetworkType::WiFi))
            .await?;
        assert_eq!(wifi.len(), 2);

        let wireless = fake
            .get_network_state_list(NetworkFilter::new(FilterType::All, NetworkType::Wireless))
            .await?;
        assert_eq!(wireless.len(), 3);

        let active = fake
            .get_network_state_list(NetworkFilter::new(FilterType::Active, NetworkType::All))
            .await?;
        assert_eq!(active.len(), 1);

        let mut limited = NetworkFilter::new(FilterType::All, NetworkType::All);
        limited.limit = 2;
        assert_eq!(fake.get_network_state_list(limited).await?.len(), 2);
        assert_eq!(fake.proxy().count_calls(methods::GET_NETWORK_STATE_LIST), 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_observer_replay_and_notifications() -> FakeResult<()> {
        let fake = FakeNetworkConfig::new();
        fake.add_networks_for_test(networks());
        let counts = Arc::new(Counts::default());
        fake.add_observer(counts.clone()).await?;
        assert_eq!(*counts.active.lock(), vec![vec!["eth0_guid".to_string()]]);

        assert!(
            fake.set_network_connection_state_for_test("wifi1_guid", ConnectionState::Connecting)
        );
        assert_eq!(*counts.changed.lock(), vec!["wifi1_guid".to_string()]);
        assert_eq!(*counts.list.lock(), 1);
        assert_eq!(
            counts.active.lock().last(),
            Some(&vec!["eth0_guid".to_string(), "wifi1_guid".to_string()])
        );
        assert!(!fake.set_network_connection_state_for_test("ghost", ConnectionState::Online));
        Ok(())
    }

    #[tokio::test]
    async fn test_replay_disabled_by_context() -> FakeResult<()> {
        let ctx = TestContext::new("no_replay").replay_on_subscribe(false);
        let fake = FakeNetworkConfig::with_context(ctx);
        let counts = Arc::new(Counts::default());
        fake.add_observer(counts.clone()).await?;
        assert!(counts.active.lock().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_set_network_type_enabled_state_updates_device() -> FakeResult<()> {
        let fake = FakeNetworkConfig::new();
        let counts = Arc::new(Counts::default());
        fake.add_observer(counts.clone()).await?;

        fake.set_device_state_for_test(DeviceStateProperties::new(
            NetworkType::WiFi,
            DeviceState::Disabled,
        ));
        assert!(fake.set_network_type_enabled_state(NetworkType::WiFi, true).await?);
        assert!(fake
            .set_network_type_enabled_state(NetworkType::Cellular, true)
            .await?);

        let devices = fake.get_device_state_list().await?;
        assert_eq!(devices.len(), 2);
        assert!(devices.iter().all(|d| d.device_state == DeviceState::Enabled));
        assert_eq!(*counts.devices.lock(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_properties_records_payload() -> FakeResult<()> {
        let fake = FakeNetworkConfig::new();
        fake.set_managed_properties_for_test(ManagedProperties::new(
            "wifi1_guid",
            NetworkType::WiFi,
        ));
        let props = serde_json::json!({"typeConfig": {"wifi": {"hiddenSsid": "enabled"}}});

        assert!(fake.set_properties("wifi1_guid", props.clone()).await?);
        assert_eq!(fake.properties_to_set_for_test(), Some(props));
        assert!(!fake.set_properties("ghost", Value::Null).await?);
        assert!(fake.get_network_state("wifi1_guid").await?.is_some_and(|n| n.configured));
        Ok(())
    }

    #[test]
    fn test_wifi_visibility_only_applies_to_wifi() {
        let fake = FakeNetworkConfig::new();
        fake.add_networks_for_test(networks());
        assert!(fake.set_wifi_network_visible_for_test("wifi2_guid", false));
        assert!(!fake.set_wifi_network_visible_for_test("eth0_guid", false));
        assert!(fake.remove_network_for_test("wifi2_guid"));
        assert_eq!(fake.state().with_state(|s| s.networks.len()), 3);
    }
}
