//! eUICC and eSIM profile management.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use fakekit_core::{ObservableState, ObserverSet, TestContext, TestProxy};
use fakekit_errors::FakeResult;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tracked method names.
pub mod methods {
    /// [`super::ESimManager::get_available_euiccs`]
    pub const GET_AVAILABLE_EUICCS: &str = "get_available_euiccs";
    /// [`super::ESimManager::get_profile_list`]
    pub const GET_PROFILE_LIST: &str = "get_profile_list";
    /// [`super::ESimManager::request_pending_profiles`]
    pub const REQUEST_PENDING_PROFILES: &str = "request_pending_profiles";
    /// [`super::ESimManager::install_profile_from_activation_code`]
    pub const INSTALL_PROFILE_FROM_ACTIVATION_CODE: &str = "install_profile_from_activation_code";
    /// [`super::ESimManager::set_profile_nickname`]
    pub const SET_PROFILE_NICKNAME: &str = "set_profile_nickname";
    /// [`super::ESimManager::uninstall_profile`]
    pub const UNINSTALL_PROFILE: &str = "uninstall_profile";
    /// [`super::ESimManager::add_observer`]
    pub const ADD_OBSERVER: &str = "add_observer";

    /// Every tracked name.
    pub const ALL: [&str; 7] = [
        GET_AVAILABLE_EUICCS,
        GET_PROFILE_LIST,
        REQUEST_PENDING_PROFILES,
        INSTALL_PROFILE_FROM_ACTIVATION_CODE,
        SET_PROFILE_NICKNAME,
        UNINSTALL_PROFILE,
        ADD_OBSERVER,
    ];
}

/// Lifecycle of one profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProfileState {
    /// Offered by the carrier, not installed
    Pending,
    /// Install in progress
    Installing,
    /// Installed, not in use
    #[default]
    Inactive,
    /// Installed and in use
    Active,
}

/// One eSIM profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ESimProfile {
    /// Profile ICCID
    pub iccid: String,
    /// Owning eUICC
    pub eid: String,
    /// Carrier-supplied name
    pub name: String,
    /// User-chosen nickname
    pub nickname: Option<String>,
    /// Carrier
    pub service_provider: String,
    /// Lifecycle state
    pub state: ProfileState,
    /// Activation code the profile was installed from
    pub activation_code: String,
}

impl ESimProfile {
    /// Inactive profile on `eid`.
    pub fn new(eid: impl Into<String>, iccid: impl Into<String>) -> Self {
        let iccid = iccid.into();
        Self {
            name: format!("profile{iccid}"),
            service_provider: format!("provider{iccid}"),
            activation_code: format!("activation-code-{iccid}"),
            iccid,
            eid: eid.into(),
            nickname: None,
            state: ProfileState::Inactive,
        }
    }
}

/// One embedded UICC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Euicc {
    /// eUICC id
    pub eid: String,
    /// Whether this is the primary slot
    pub is_primary: bool,
    /// Installed and pending profiles
    pub profiles: Vec<ESimProfile>,
}

/// Result of installing a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProfileInstallResult {
    /// Installed
    #[default]
    Success,
    /// Generic failure
    Failure,
    /// Carrier requires a confirmation code
    ErrorNeedsConfirmationCode,
    /// Code rejected
    ErrorInvalidActivationCode,
}

/// Result of a profile operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ESimOperationResult {
    /// Done
    #[default]
    Success,
    /// Failed
    Failure,
}

/// Everything the fake backend knows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ESimState {
    /// eUICCs in insertion order
    pub euiccs: Vec<Euicc>,
    /// Profiles returned by the next `request_pending_profiles`, by eid
    pub queued_pending: BTreeMap<String, Vec<ESimProfile>>,
}

impl ESimState {
    fn euicc_mut(&mut self, eid: &str) -> Option<&mut Euicc> {
        self.euiccs.iter_mut().find(|e| e.eid == eid)
    }

    fn profile_mut(&mut self, iccid: &str) -> Option<&mut ESimProfile> {
        self.euiccs
            .iter_mut()
            .flat_map(|e| e.profiles.iter_mut())
            .find(|p| p.iccid == iccid)
    }
}

/// Receives eSIM change notifications.
pub trait ESimManagerObserver: Send + Sync {
    /// An eUICC was added or removed.
    fn on_available_euicc_list_changed(&self) {}

    /// Profiles were added to or removed from `eid`.
    fn on_profile_list_changed(&self, _eid: &str) {}

    /// A property of `eid` changed.
    fn on_euicc_changed(&self, _eid: &str) {}

    /// A property of profile `iccid` changed.
    fn on_profile_changed(&self, _iccid: &str) {}
}

/// Client interface of the eSIM manager.
#[async_trait]
pub trait ESimManager: Send + Sync {
    /// Every eUICC.
    async fn get_available_euiccs(&self) -> FakeResult<Vec<Euicc>>;

    /// Profiles on `eid`, `None` for an unknown eUICC.
    async fn get_profile_list(&self, eid: &str) -> FakeResult<Option<Vec<ESimProfile>>>;

    /// Ask the carrier for pending profiles on `eid`.
    async fn request_pending_profiles(&self, eid: &str) -> FakeResult<ESimOperationResult>;

    /// Install a profile on `eid` from an activation code.
    async fn install_profile_from_activation_code(
        &self,
        eid: &str,
        activation_code: &str,
        confirmation_code: &str,
    ) -> FakeResult<ProfileInstallResult>;

    /// Rename a profile.
    async fn set_profile_nickname(
        &self,
        iccid: &str,
        nickname: &str,
    ) -> FakeResult<ESimOperationResult>;

    /// Remove a profile.
    async fn uninstall_profile(&self, iccid: &str) -> FakeResult<ESimOperationResult>;

    /// Register `observer` for change notifications.
    async fn add_observer(&self, observer: Arc<dyn ESimManagerObserver>) -> FakeResult<()>;
}

#[derive(Debug, Default, Clone, Copy)]
struct ForcedResults {
    install: ProfileInstallResult,
    operation: ESimOperationResult,
}

/// In-memory [`ESimManager`].
pub struct FakeESimManager {
    ctx: TestContext,
    proxy: TestProxy,
    state: ObservableState<ESimState>,
    observers: ObserverSet<dyn ESimManagerObserver>,
    results: Mutex<ForcedResults>,
}

impl FakeESimManager {
    /// No eUICCs, default context.
    pub fn new() -> Self {
        Self::with_context(TestContext::default())
    }

    /// No eUICCs, bound to `ctx`.
    pub fn with_context(ctx: TestContext) -> Self {
        Self {
            ctx,
            proxy: TestProxy::new(methods::ALL),
            state: ObservableState::new(ESimState::default()),
            observers: ObserverSet::new("esim_manager"),
            results: Mutex::new(ForcedResults::default()),
        }
    }

    /// Call tracking for this fake.
    pub fn proxy(&self) -> &TestProxy {
        &self.proxy
    }

    /// Whole-backend snapshots.
    pub fn state(&self) -> &ObservableState<ESimState> {
        &self.state
    }

    /// Add an eUICC holding `num_profiles` inactive profiles. Returns its eid.
    ///
    /// eids count up from `"1"`; profile iccids are the eid followed by the
    /// profile index.
    pub fn add_euicc_for_test(&self, num_profiles: usize) -> String {
        let mut eid = String::new();
        self.state.update(|s| {
            eid = s.euiccs.len().saturating_add(1).to_string();
            let profiles = (0..num_profiles)
                .map(|i| ESimProfile::new(eid.as_str(), format!("{eid}{i}")))
                .collect();
            s.euiccs.push(Euicc {
                is_primary: s.euiccs.is_empty(),
                eid: eid.clone(),
                profiles,
            });
        });
        debug!(%eid, num_profiles, "euicc added");
        self.observers.for_each(|o| o.on_available_euicc_list_changed());
        eid
    }

    /// Queue profiles returned as pending by the next refresh of `eid`.
    pub fn set_pending_profiles_for_test(&self, eid: &str, profiles: Vec<ESimProfile>) {
        self.state.update(|s| {
            s.queued_pending.insert(eid.to_string(), profiles);
        });
    }

    /// Result of the next installs.
    pub fn set_profile_install_result_for_test(&self, result: ProfileInstallResult) {
        self.results.lock().install = result;
    }

    /// Result of the next refresh, nickname and uninstall calls.
    pub fn set_operation_result_for_test(&self, result: ESimOperationResult) {
        self.results.lock().operation = result;
    }

    /// Fire `on_euicc_changed` for `eid`.
    pub fn notify_euicc_changed_for_test(&self, eid: &str) {
        self.observers.for_each(|o| o.on_euicc_changed(eid));
    }

    /// Drop every eUICC, observer, forced result and call.
    pub fn reset_for_test(&self) {
        self.state.replace(ESimState::default());
        self.observers.clear();
        *self.results.lock() = ForcedResults::default();
        self.proxy.reset();
    }

    fn operation_result(&self) -> ESimOperationResult {
        self.results.lock().operation
    }
}

impl Default for FakeESimManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ESimManager for FakeESimManager {
    async fn get_available_euiccs(&self) -> FakeResult<Vec<Euicc>> {
        self.proxy.method_called(methods::GET_AVAILABLE_EUICCS, ());
        Ok(self.state.with_state(|s| s.euiccs.clone()))
    }

    async fn get_profile_list(&self, eid: &str) -> FakeResult<Option<Vec<ESimProfile>>> {
        self.proxy
            .method_called(methods::GET_PROFILE_LIST, eid.to_string());
        Ok(self.state.with_state(|s| {
            s.euiccs
                .iter()
                .find(|e| e.eid == eid)
                .map(|e| e.profiles.clone())
        }))
    }

    async fn request_pending_profiles(&self, eid: &str) -> FakeResult<ESimOperationResult> {
        self.proxy
            .method_called(methods::REQUEST_PENDING_PROFILES, eid.to_string());
        let result = self.operation_result();
        if result != ESimOperationResult::Success {
            return Ok(result);
        }
        let mut added = false;
        self.state.update(|s| {
            let queued = s.queued_pending.remove(eid).unwrap_or_default();
            if let Some(euicc) = s.euicc_mut(eid) {
                for mut profile in queued {
                    profile.state = ProfileState::Pending;
                    profile.eid = eid.to_string();
                    euicc.profiles.push(profile);
                    added = true;
                }
            }
        });
        if added {
            self.observers.for_each(|o| o.on_profile_list_changed(eid));
        }
        Ok(result)
    }

    async fn install_profile_from_activation_code(
        &self,
        eid: &str,
        activation_code: &str,
        confirmation_code: &str,
    ) -> FakeResult<ProfileInstallResult> {
        self.proxy.method_called(
            methods::INSTALL_PROFILE_FROM_ACTIVATION_CODE,
            (
                eid.to_string(),
                activation_code.to_string(),
                confirmation_code.to_string(),
            ),
        );
        let result = self.results.lock().install;
        if result != ProfileInstallResult::Success {
            debug!(?result, "profile install failed");
            return Ok(result);
        }
        let mut installed = false;
        self.state.update(|s| {
            let Some(euicc) = s.euicc_mut(eid) else {
                return;
            };
            match euicc
                .profiles
                .iter_mut()
                .find(|p| p.activation_code == activation_code)
            {
                Some(pending) => pending.state = ProfileState::Inactive,
                None => {
                    let iccid = format!("{eid}{}", euicc.profiles.len());
                    let mut profile = ESimProfile::new(eid, iccid);
                    profile.activation_code = activation_code.to_string();
                    euicc.profiles.push(profile);
                }
            }
            installed = true;
        });
        if !installed {
            return Ok(ProfileInstallResult::Failure);
        }
        self.observers.for_each(|o| o.on_profile_list_changed(eid));
        Ok(result)
    }

    async fn set_profile_nickname(
        &self,
        iccid: &str,
        nickname: &str,
    ) -> FakeResult<ESimOperationResult> {
        self.proxy.method_called(
            methods::SET_PROFILE_NICKNAME,
            (iccid.to_string(), nickname.to_string()),
        );
        let result = self.operation_result();
        if result != ESimOperationResult::Success {
            return Ok(result);
        }
        let mut found = false;
        self.state.update(|s| {
            if let Some(profile) = s.profile_mut(iccid) {
                profile.nickname = Some(nickname.to_string());
                found = true;
            }
        });
        if !found {
            return Ok(ESimOperationResult::Failure);
        }
        self.observers.for_each(|o| o.on_profile_changed(iccid));
        Ok(result)
    }

    async fn uninstall_profile(&self, iccid: &str) -> FakeResult<ESimOperationResult> {
        self.proxy
            .method_called(methods::UNINSTALL_PROFILE, iccid.to_string());
        let result = self.operation_result();
        if result != ESimOperationResult::Success {
            return Ok(result);
        }
        let mut owner = None;
        self.state.update(|s| {
            for euicc in &mut s.euiccs {
                let before = euicc.profiles.len();
                euicc.profiles.retain(|p| p.iccid != iccid);
                if euicc.profiles.len() != before {
                    owner = Some(euicc.eid.clone());
                }
            }
        });
        let Some(eid) = owner else {
            return Ok(ESimOperationResult::Failure);
        };
        self.observers.for_each(|o| o.on_profile_list_changed(&eid));
        Ok(result)
    }

    async fn add_observer(&self, observer: Arc<dyn ESimManagerObserver>) -> FakeResult<()> {
        self.proxy
            .method_called(methods::ADD_OBSERVER, Arc::clone(&observer));
        self.observers.add(Arc::clone(&observer));
        if self.ctx.options.replay_on_subscribe {
            observer.on_available_euicc_list_changed();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Events(Mutex<Vec<String>>);

    impl ESimManagerObserver for Events {
        fn on_available_euicc_list_changed(&self) {
            self.0.lock().push("euicc_list".to_string());
        }

        fn on_profile_list_changed(&self, eid: &str) {
            self.0.lock().push(format!("profile_list:{eid}"));
        }

        fn on_euicc_changed(&self, eid: &str) {
            self.0.lock().push(format!("euicc:{eid}"));
        }

        fn on_profile_changed(&self, iccid: &str) {
            self.0.lock().push(format!("profile:{iccid}"));
        }
    }

    #[tokio::test]
    async fn test_add_euicc_for_test_numbers_profiles() -> FakeResult<()> {
        let fake = FakeESimManager::new();
        assert_eq!(fake.add_euicc_for_test(2), "1");
        assert_eq!(fake.add_euicc_for_test(0), "2");

        let euiccs = fake.get_available_euiccs().await?;
        assert_eq!(euiccs.len(), 2);
        assert!(euiccs.first().is_some_and(|e| e.is_primary));
        let iccids: Vec<String> = fake
            .get_profile_list("1")
            .await?
            .unwrap_or_default()
            .into_iter()
            .map(|p| p.iccid)
            .collect();
        assert_eq!(iccids, vec!["10", "11"]);
        assert_eq!(fake.get_profile_list("9").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_install_from_activation_code() -> FakeResult<()> {
        let fake = FakeESimManager::new();
        let eid = fake.add_euicc_for_test(0);
        let events = Arc::new(Events::default());
        fake.add_observer(events.clone()).await?;

        let result = fake
            .install_profile_from_activation_code(&eid, "LPA:1$code", "")
            .await?;
        assert_eq!(result, ProfileInstallResult::Success);
        assert_eq!(
            *events.0.lock(),
            vec!["euicc_list".to_string(), "profile_list:1".to_string()]
        );

        fake.set_profile_install_result_for_test(ProfileInstallResult::ErrorNeedsConfirmationCode);
        let result = fake
            .install_profile_from_activation_code(&eid, "LPA:1$other", "")
            .await?;
        assert_eq!(result, ProfileInstallResult::ErrorNeedsConfirmationCode);
        assert_eq!(fake.get_profile_list(&eid).await?.map(|p| p.len()), Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn test_pending_profiles_then_install() -> FakeResult<()> {
        let fake = FakeESimManager::new();
        let eid = fake.add_euicc_for_test(0);
        let mut offered = ESimProfile::new(eid.as_str(), "pending0");
        offered.activation_code = "LPA:pending".to_string();
        fake.set_pending_profiles_for_test(&eid, vec![offered]);

        assert_eq!(
            fake.request_pending_profiles(&eid).await?,
            ESimOperationResult::Success
        );
        let states = |profiles: Option<Vec<ESimProfile>>| -> Vec<ProfileState> {
            profiles.unwrap_or_default().into_iter().map(|p| p.state).collect()
        };
        assert_eq!(states(fake.get_profile_list(&eid).await?), vec![ProfileState::Pending]);

        fake.install_profile_from_activation_code(&eid, "LPA:pending", "")
            .await?;
        assert_eq!(states(fake.get_profile_list(&eid).await?), vec![ProfileState::Inactive]);
        Ok(())
    }

    #[tokio::test]
    async fn test_nickname_and_uninstall() -> FakeResult<()> {
        let fake = FakeESimManager::new();
        fake.add_euicc_for_test(2);
        let events = Arc::new(Events::default());
        fake.add_observer(events.clone()).await?;

        assert_eq!(
            fake.set_profile_nickname("10", "Work").await?,
            ESimOperationResult::Success
        );
        assert_eq!(
            fake.uninstall_profile("11").await?,
            ESimOperationResult::Success
        );
        assert_eq!(
            fake.uninstall_profile("11").await?,
            ESimOperationResult::Failure
        );
        assert_eq!(
            events.0.lock().iter().skip(1).cloned().collect::<Vec<_>>(),
            vec!["profile:10".to_string(), "profile_list:1".to_string()]
        );

        fake.set_operation_result_for_test(ESimOperationResult::Failure);
        assert_eq!(
            fake.set_profile_nickname("10", "Home").await?,
            ESimOperationResult::Failure
        );
        let nickname = fake.state().with_state(|s| {
            s.euiccs
                .first()
                .and_then(|e| e.profiles.first())
                .and_then(|p| p.nickname.clone())
        });
        assert_eq!(nickname.as_deref(), Some("Work"));
        Ok(())
    }
}
