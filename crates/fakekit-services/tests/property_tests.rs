//! Property-based tests for network filtering and pref type checks.

use fakekit_services::prelude::*;
use proptest::prelude::*;
use serde_json::{Value, json};

fn network_type() -> impl Strategy<Value = NetworkType> {
    prop::sample::select(vec![
        NetworkType::Cellular,
        NetworkType::Ethernet,
        NetworkType::Tether,
        NetworkType::Vpn,
        NetworkType::WiFi,
    ])
}

fn filter_type() -> impl Strategy<Value = NetworkType> {
    prop::sample::select(vec![
        NetworkType::All,
        NetworkType::Mobile,
        NetworkType::Wireless,
        NetworkType::WiFi,
        NetworkType::Cellular,
    ])
}

fn connection_state() -> impl Strategy<Value = ConnectionState> {
    prop::sample::select(vec![
        ConnectionState::Online,
        ConnectionState::Connected,
        ConnectionState::Portal,
        ConnectionState::Connecting,
        ConnectionState::NotConnected,
    ])
}

fn networks() -> impl Strategy<Value = Vec<NetworkStateProperties>> {
    prop::collection::vec((network_type(), connection_state(), any::<bool>()), 0..24).prop_map(
        |specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (kind, state, visible))| {
                    let mut network = NetworkStateProperties::new(format!("guid{i}"), kind)
                        .with_connection_state(state);
                    network.visible = visible;
                    network
                })
                .collect()
        },
    )
}

fn json_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::from),
        Just(json!([1, 2])),
        Just(json!({"k": "v"})),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_filtered_list_respects_filter_and_limit(
        all in networks(),
        kind in filter_type(),
        limit in 0usize..6,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let fake = FakeNetworkConfig::new();
        fake.add_networks_for_test(all.clone());

        let mut filter = NetworkFilter::new(FilterType::Visible, kind);
        filter.limit = limit;
        let listed = runtime
            .block_on(fake.get_network_state_list(filter))
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        let expected: Vec<&NetworkStateProperties> =
            all.iter().filter(|n| filter.accepts(n)).collect();
        let cap = if limit == 0 { expected.len() } else { expected.len().min(limit) };
        prop_assert_eq!(listed.len(), cap);
        prop_assert!(listed.iter().zip(expected).all(|(got, want)| got == want));
    }

    #[test]
    fn prop_set_pref_accepts_only_declared_type(value in json_value()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let fake = FakeSettingsPrivate::with_prefs([PrefObject::boolean("flag", false)]);

        let accepted = runtime
            .block_on(fake.set_pref("flag", value.clone()))
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert_eq!(accepted, value.is_boolean());
        let stored = fake.pref_value("flag");
        if accepted {
            prop_assert_eq!(stored, Some(value));
        } else {
            prop_assert_eq!(stored, Some(json!(false)));
        }
        prop_assert_eq!(fake.proxy().count_calls("set_pref"), 1);
    }
}
