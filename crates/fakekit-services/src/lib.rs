//! Typed client interfaces and the fakes that implement them.
//!
//! Every fake in this crate implements an [`async_trait`] interface that
//! mirrors a production client surface, so UI code under test can hold an
//! `Arc<dyn Interface>` and be handed either the real client or the fake.
//! Each fake owns a [`TestProxy`](fakekit_core::TestProxy) tracking the
//! methods listed in its `methods` module, and exposes `*_for_test` helpers
//! plus `reset_for_test()` for driving backend state from the test.
//!
//! | module | fake | backend |
//! | --- | --- | --- |
//! | [`network_config`] | [`FakeNetworkConfig`] | network list, devices, managed properties |
//! | [`hotspot_config`] | [`FakeHotspotConfig`] | tethering hotspot |
//! | [`esim_manager`] | [`FakeESimManager`] | eUICCs and eSIM profiles |
//! | [`scan_service`] | [`FakeScanService`] | document scanners and scan jobs |
//! | [`settings_private`] | [`FakeSettingsPrivate`] | typed preference store |

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod esim_manager;
pub mod hotspot_config;
pub mod network_config;
pub mod prelude;
pub mod scan_service;
pub mod settings_private;

pub use esim_manager::{ESimManager, FakeESimManager};
pub use hotspot_config::{CrosHotspotConfig, FakeHotspotConfig};
pub use network_config::{CrosNetworkConfig, FakeNetworkConfig};
pub use scan_service::{
    FakeMultiPageScanController, FakeScanService, MultiPageScanController, ScanService,
};
pub use settings_private::{FakeSettingsPrivate, SettingsPrivate};
