//! Snapshot tests for the serialized shapes fixtures are written in.

use fakekit_services::prelude::*;
use insta::assert_snapshot;

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<unserializable: {e}>"))
}

mod settings_snapshots {
    use super::*;

    #[test]
    fn test_enforced_pref_json() {
        let pref = PrefObject::boolean("a.b", true).enforced(ControlledBy::UserPolicy);
        assert_snapshot!(
            to_json(&pref),
            @r#"{"key":"a.b","type":"BOOLEAN","value":true,"enforcement":"ENFORCED","controlledBy":"USER_POLICY"}"#
        );
    }

    #[test]
    fn test_plain_pref_omits_enforcement() {
        let pref = PrefObject::new("intl.app_locale", PrefType::String, "en-US");
        assert_snapshot!(
            to_json(&pref),
            @r#"{"key":"intl.app_locale","type":"STRING","value":"en-US"}"#
        );
    }
}

mod network_snapshots {
    use super::*;

    #[test]
    fn test_network_state_json() {
        let network = NetworkStateProperties::new("wifi1_guid", NetworkType::WiFi);
        assert_snapshot!(
            to_json(&network),
            @r#"{"guid":"wifi1_guid","name":"wifi1_guid","network_type":"WiFi","connection_state":"NotConnected","visible":true,"configured":false}"#
        );
    }

    #[test]
    fn test_filter_debug() {
        let filter = NetworkFilter::new(FilterType::Visible, NetworkType::WiFi);
        assert_snapshot!(
            format!("{filter:?}"),
            @"NetworkFilter { filter: Visible, network_type: WiFi, limit: 0 }"
        );
    }
}

mod hotspot_snapshots {
    use super::*;

    #[test]
    fn test_default_hotspot_info_json() {
        assert_snapshot!(
            to_json(&HotspotInfo::default()),
            @r#"{"state":"Disabled","allow_status":"Allowed","client_count":0,"config":null,"allowed_wifi_security_modes":[]}"#
        );
    }
}

mod error_snapshots {
    use super::*;

    #[test]
    fn test_unbound_scan_job_error() {
        assert_snapshot!(
            FakeError::no_observer("scan_job_observer").to_string(),
            @"No observer bound to event channel 'scan_job_observer'"
        );
    }
}
