//! Unit tests for the call-tracking and observable-state building blocks.

mod proxy_tests {
    use std::sync::Arc;

    use fakekit_core::prelude::*;
    use fakekit_test_helpers::prelude::*;
    use std::time::Duration;

    trait Observer: Send + Sync {
        fn id(&self) -> u32;
    }

    struct Tagged(u32);

    impl Observer for Tagged {
        fn id(&self) -> u32 {
            self.0
        }
    }

    #[tokio::test]
    async fn test_when_called_yields_next_observer_argument() -> FakeResult<()> {
        init_test_logging();
        let proxy = TestProxy::new(["add_observer"]);
        let first: Arc<dyn Observer> = Arc::new(Tagged(1));
        proxy.method_called("add_observer", first);

        let next = proxy.when_called::<Arc<dyn Observer>>("add_observer")?;
        let second: Arc<dyn Observer> = Arc::new(Tagged(2));
        proxy.method_called("add_observer", Arc::clone(&second));

        let observed = must_within("add_observer", Duration::from_secs(1), next).await?;
        assert!(Arc::ptr_eq(&observed, &second));
        assert_eq!(observed.id(), 2);
        assert_called!(proxy, "add_observer", 2);
        Ok(())
    }

    #[test]
    fn test_unknown_method_is_synchronous() {
        let proxy = TestProxy::new(["add_observer"]);
        let result = proxy.when_called::<()>("foo");
        assert!(matches!(
            result,
            Err(FakeError::UnknownMethod { ref method }) if method == "foo"
        ));
    }

    #[tokio::test]
    async fn test_sequential_awaits_each_see_a_fresh_call() -> FakeResult<()> {
        let proxy = TestProxy::new(["record_dismissed"]);

        let first = proxy.when_called::<u32>("record_dismissed")?;
        proxy.method_called("record_dismissed", 1u32);
        assert_eq!(first.await?, 1);

        let second = proxy.when_called_any("record_dismissed")?;
        assert!(second.try_value().is_none());
        proxy.method_called("record_dismissed", 2u32);
        assert_eq!(second.await?.args::<u32>()?, 2);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresolved_await_times_out_at_runner_level() -> FakeResult<()> {
        let proxy = TestProxy::new(["cancel_scan"]);
        let next = proxy.when_called::<()>("cancel_scan")?;
        let result = must_within("cancel_scan", Duration::from_millis(50), next).await;
        assert_eq!(result, Err(FakeError::unresolved("cancel_scan", 50)));
        Ok(())
    }

    #[test]
    fn test_call_args_out_of_range() {
        let proxy = TestProxy::new(["get_pref"]);
        proxy.method_called("get_pref", "a".to_string());
        assert_eq!(
            proxy.args::<String>("get_pref", 1),
            Err(FakeError::out_of_range("get_pref", 1, 1))
        );
        assert_call_args!(proxy, "get_pref", 0, "a".to_string());
    }

    #[test]
    fn test_reset_between_phases() {
        let proxy = TestProxy::new(["get_pref", "set_pref"]);
        proxy.method_called("get_pref", ());
        proxy.method_called("set_pref", ());
        proxy.recorder().reset("get_pref");
        assert_not_called!(proxy, "get_pref");
        assert_called!(proxy, "set_pref", 1);
    }
}

mod state_tests {
    use std::sync::Arc;

    use fakekit_core::prelude::*;
    use parking_lot::Mutex;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Toggle {
        enabled: bool,
    }

    #[derive(Default)]
    struct TogglePatch {
        enabled: Option<bool>,
    }

    impl Merge for Toggle {
        type Patch = TogglePatch;

        fn merge(&mut self, patch: TogglePatch) {
            if let Some(enabled) = patch.enabled {
                self.enabled = enabled;
            }
        }
    }

    #[test]
    fn test_enable_toggle_scenario() {
        let proxy = TestProxy::new(["set_enabled"]);
        let state = ObservableState::new(Toggle { enabled: false });
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = state.add_observer(move |s: &Toggle| sink.lock().push(s.enabled));
        assert_eq!(*seen.lock(), vec![false]);

        proxy.method_called("set_enabled", true);
        state.set_state(TogglePatch {
            enabled: Some(true),
        });

        assert_eq!(*seen.lock(), vec![false, true]);
        assert_eq!(proxy.count_calls("set_enabled"), 1);
    }

    #[test]
    fn test_observers_notified_in_registration_order() {
        let state = ObservableState::new(Toggle::default());
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut subs = Vec::new();
        for id in 0..4u32 {
            let sink = Arc::clone(&order);
            subs.push(state.add_observer(move |_: &Toggle| sink.lock().push(id)));
        }
        order.lock().clear();

        state.set_state(TogglePatch {
            enabled: Some(true),
        });
        assert_eq!(*order.lock(), vec![0, 1, 2, 3]);
        assert_eq!(subs.len(), 4);
    }

    #[test]
    fn test_get_state_idempotent() {
        let state = ObservableState::new(Toggle { enabled: true });
        assert_eq!(state.get_state(), state.get_state());
    }
}

mod context_tests {
    use fakekit_core::prelude::*;
    use fakekit_test_helpers::init_test_logging;

    #[test]
    fn test_context_from_json() -> FakeResult<()> {
        let ctx = TestContext::from_json_str(
            r#"{"name":"privacy_page","load_time_data":{"isSmartLockSignInRemoved":true}}"#,
        )?;
        assert_eq!(ctx.name, "privacy_page");
        assert!(ctx.load_time_data.get_bool("isSmartLockSignInRemoved")?);
        assert!(ctx.options.replay_on_subscribe);
        Ok(())
    }

    #[tokio::test]
    async fn test_context_flush() {
        init_test_logging();
        let ctx = TestContext::new("flush");
        let _span = ctx.span().entered();
        ctx.flush().await;
    }
}
