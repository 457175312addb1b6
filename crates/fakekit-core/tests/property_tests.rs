//! Property-based tests for call recording and method gates.

use fakekit_core::prelude::*;
use proptest::prelude::*;

const METHODS: [&str; 3] = ["get_scanners", "start_scan", "cancel_scan"];

fn call_sequence() -> impl Strategy<Value = Vec<(&'static str, u32)>> {
    prop::collection::vec((prop::sample::select(METHODS.to_vec()), any::<u32>()), 0..64)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_recorded_args_keep_call_order(calls in call_sequence()) {
        let proxy = TestProxy::new(METHODS);
        for (method, arg) in &calls {
            proxy.method_called(method, *arg);
        }

        for method in METHODS {
            let expected: Vec<u32> = calls
                .iter()
                .filter(|(name, _)| *name == method)
                .map(|(_, arg)| *arg)
                .collect();
            prop_assert_eq!(proxy.count_calls(method), expected.len());
            let recorded = proxy.recorder().all_args::<u32>(method);
            prop_assert_eq!(recorded, Ok(expected));
        }
        prop_assert_eq!(proxy.recorder().total_calls(), calls.len());
    }

    #[test]
    fn prop_sequence_numbers_strictly_increase(calls in call_sequence()) {
        let proxy = TestProxy::new(METHODS);
        for (method, arg) in &calls {
            proxy.method_called(method, *arg);
        }
        let seqs: Vec<u64> = proxy.recorder().calls().iter().map(RecordedCall::seq).collect();
        prop_assert!(seqs.iter().zip(seqs.iter().skip(1)).all(|(a, b)| a < b));
    }

    #[test]
    fn prop_gate_resolves_once_with_first_later_call(
        before in 0usize..5,
        after in prop::collection::vec(any::<u32>(), 1..8),
    ) {
        let proxy = TestProxy::new(["start_scan"]);
        for n in 0..before {
            proxy.method_called("start_scan", u32::try_from(n).unwrap_or(u32::MAX));
        }

        let pending = proxy
            .when_called_any("start_scan")
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert!(pending.try_value().is_none());

        for arg in &after {
            proxy.method_called("start_scan", *arg);
        }

        let call = pending
            .try_value()
            .ok_or_else(|| TestCaseError::fail("gate did not resolve"))?;
        prop_assert_eq!(call.args::<u32>().ok(), after.first().copied());
        prop_assert_eq!(proxy.count_calls("start_scan"), before + after.len());
    }

    #[test]
    fn prop_untracked_names_rejected(name in "[a-z_]{1,12}") {
        let proxy = TestProxy::new(METHODS);
        let result = proxy.when_called_any(&name);
        if METHODS.contains(&name.as_str()) {
            prop_assert!(result.is_ok());
        } else {
            prop_assert_eq!(result.err(), Some(FakeError::unknown_method(name.clone())));
        }
    }
}
