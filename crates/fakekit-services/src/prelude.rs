//! Prelude module for convenient imports

pub use crate::esim_manager::{
    ESimManager, ESimManagerObserver, ESimOperationResult, ESimProfile, ESimState, Euicc,
    FakeESimManager, ProfileInstallResult, ProfileState,
};
pub use crate::hotspot_config::{
    CrosHotspotConfig, CrosHotspotConfigObserver, FakeHotspotConfig, HotspotAllowStatus,
    HotspotConfig, HotspotControlResult, HotspotInfo, HotspotInfoPatch, HotspotState,
    SetHotspotConfigResult,
};
pub use crate::network_config::{
    ConnectionState, CrosNetworkConfig, CrosNetworkConfigObserver, DeviceState,
    DeviceStateProperties, FakeNetworkConfig, FilterType, ManagedProperties, NetworkConfigState,
    NetworkFilter, NetworkStateProperties, NetworkType,
};
pub use crate::scan_service::{
    FakeMultiPageScanController, FakeScanService, MultiPageScanController, ScanJobObserver,
    ScanResult, ScanService, ScanSettings, Scanner, ScannerCapabilities,
};
pub use crate::settings_private::{
    ControlledBy, Enforcement, FakeSettingsPrivate, PrefMap, PrefObject, PrefType,
    PrefsChangedListener, SettingsPrivate,
};
pub use fakekit_core::prelude::*;
