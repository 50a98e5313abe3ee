//! The permission broker: request orchestration and callback correlation.
//!
//! [`PermissionBroker`] is the explicitly constructed orchestrator owned by
//! the application's composition root (there is no process-wide singleton;
//! construct one and pass the handle around). It drives the full cycle:
//!
//! ```text
//! caller ──► plan (filter granted/unknown)
//!               │
//!               ├─ empty plan ──► notify Granted immediately
//!               │
//!               └─ OS request issued ──► ... ──► OS callback
//!                                                  │
//!                                                  ▼
//!                                          reconcile + classify
//!                                                  │
//!                       ┌──────────────────────────┤
//!                       ▼                          ▼
//!               escalation dialog          notify-and-clear
//!               (accept: settings)
//! ```
//!
//! All registry mutations and every full reconciliation pass run inside one
//! mutual-exclusion domain; the waits for the OS callback and for the
//! dialog choice happen outside it.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::action::{Outcome, ResultAction};
use crate::dialog::{self, DialogCallback, DialogChoice, DialogPresenter, DialogSpec};
use crate::error::BrokerError;
use crate::events::{GrantResult, PermissionResponse};
use crate::groups::{self, PermissionGroup};
use crate::host::{NoQuirks, PermissionHost, QuirkOracle, SettingsNavigator, SettingsRoute};
use crate::planner::{KnownPermissions, RequestPlanner};
use crate::reconcile::{DescriptionLookup, Reconciliation, ResultReconciler};
use crate::registry::PendingActions;

/// Correlation token used for every batched OS request
///
/// Only one batch is ever in flight per screen, so a single fixed token is
/// sufficient; the OS echoes it back in the callback.
pub const REQUEST_CODE: u32 = 1;

/// Mutable broker state, guarded by one mutex
struct BrokerState {
    actions: PendingActions,
    pending_dialog: Option<DialogSpec>,
}

/// Runtime-permission request orchestrator
///
/// Construct one per process (or per host screen) from the platform
/// capabilities and keep it alive for the process lifetime; all state is
/// in-memory and never persisted.
///
/// # Example
///
/// ```no_run
/// use permission_broker::prelude::*;
/// use std::sync::Arc;
///
/// # async fn example(
/// #     host: Arc<dyn PermissionHost>,
/// #     presenter: Arc<dyn DialogPresenter>,
/// #     navigator: Arc<dyn SettingsNavigator>,
/// # ) -> Result<(), BrokerError> {
/// let broker = PermissionBroker::new(host, presenter, navigator);
///
/// let action: Arc<dyn ResultAction> = Arc::new(|denied: Vec<String>, outcome: Outcome| {
///     println!("{outcome:?}: {denied:?}");
/// });
/// broker
///     .request_groups(action, None, None, true, &[PermissionGroup::Camera])
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct PermissionBroker {
    host: Arc<dyn PermissionHost>,
    quirks: Arc<dyn QuirkOracle>,
    presenter: Arc<dyn DialogPresenter>,
    navigator: Arc<dyn SettingsNavigator>,
    planner: RequestPlanner,
    reconciler: ResultReconciler,
    state: Mutex<BrokerState>,
}

impl PermissionBroker {
    /// Create a broker over the given capabilities
    ///
    /// Uses the baseline known-permission table, the built-in description
    /// lookup, and no OEM quirk correction. Override with
    /// [`with_quirks`](Self::with_quirks),
    /// [`with_known_permissions`](Self::with_known_permissions) and
    /// [`with_descriptions`](Self::with_descriptions).
    pub fn new(
        host: Arc<dyn PermissionHost>,
        presenter: Arc<dyn DialogPresenter>,
        navigator: Arc<dyn SettingsNavigator>,
    ) -> Self {
        Self::assemble(
            host,
            Arc::new(NoQuirks),
            presenter,
            navigator,
            groups::baseline_known_permissions(),
            groups::permission_description,
        )
    }

    fn assemble(
        host: Arc<dyn PermissionHost>,
        quirks: Arc<dyn QuirkOracle>,
        presenter: Arc<dyn DialogPresenter>,
        navigator: Arc<dyn SettingsNavigator>,
        known: KnownPermissions,
        descriptions: DescriptionLookup,
    ) -> Self {
        let planner = RequestPlanner::new(known, host.clone(), quirks.clone());
        let reconciler = ResultReconciler::new(host.clone(), quirks.clone(), descriptions);
        Self {
            host,
            quirks,
            presenter,
            navigator,
            planner,
            reconciler,
            state: Mutex::new(BrokerState {
                actions: PendingActions::new(),
                pending_dialog: None,
            }),
        }
    }

    /// Replace the quirk oracle (OEM skins needing the corrective re-check)
    pub fn with_quirks(self, quirks: Arc<dyn QuirkOracle>) -> Self {
        Self::assemble(
            self.host,
            quirks,
            self.presenter,
            self.navigator,
            self.planner.known().clone(),
            self.reconciler.descriptions(),
        )
    }

    /// Replace the known-permission snapshot for the target platform release
    pub fn with_known_permissions(self, known: KnownPermissions) -> Self {
        Self::assemble(
            self.host,
            self.quirks,
            self.presenter,
            self.navigator,
            known,
            self.reconciler.descriptions(),
        )
    }

    /// Replace the description lookup used for escalation classification
    pub fn with_descriptions(self, descriptions: DescriptionLookup) -> Self {
        Self::assemble(
            self.host,
            self.quirks,
            self.presenter,
            self.navigator,
            self.planner.known().clone(),
            descriptions,
        )
    }

    /// Whether every permission of every group is currently satisfied
    ///
    /// Empty `groups` is trivially satisfied. A detached host always yields
    /// `false` (there is nothing to check against).
    pub fn has_group_permissions(&self, groups: &[PermissionGroup]) -> bool {
        if groups.is_empty() {
            return true;
        }
        if !self.host.is_attached() {
            return false;
        }
        groups::raw_permissions(groups)
            .iter()
            .all(|p| self.planner.is_granted(p))
    }

    /// Whether a single OS permission is currently satisfied
    ///
    /// Unknown identifiers count as satisfied; a detached host yields `false`.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.host.is_attached() && self.planner.is_granted(permission)
    }

    /// Number of actions currently awaiting an OS callback
    pub async fn pending_actions(&self) -> usize {
        self.state.lock().await.actions.len()
    }

    /// Caller-facing entry point: request abstract permission groups
    ///
    /// Expands the groups to their OS permission strings, builds the
    /// escalation dialog for the batch when `show_dialog` is set (attaching
    /// the optional accept/cancel callbacks), and hands off to
    /// [`request_permissions`](Self::request_permissions).
    ///
    /// Empty `groups` resolves immediately as granted.
    pub async fn request_groups(
        &self,
        action: Arc<dyn ResultAction>,
        ok: Option<DialogCallback>,
        cancel: Option<DialogCallback>,
        show_dialog: bool,
        groups: &[PermissionGroup],
    ) -> Result<(), BrokerError> {
        if groups.is_empty() {
            action.on_result(Vec::new(), Outcome::Granted);
            return Ok(());
        }

        let dialog = if show_dialog {
            let needing: Vec<PermissionGroup> = groups
                .iter()
                .copied()
                .filter(|g| !self.has_group_permissions(&[*g]))
                .collect();
            dialog::build_group_dialog(&needing).map(|mut spec| {
                if let Some(ok) = ok {
                    spec = spec.on_accept(ok);
                }
                if let Some(cancel) = cancel {
                    spec = spec.on_cancel(cancel);
                }
                spec
            })
        } else {
            None
        };

        self.request_permissions(action, groups::raw_permissions(groups), dialog)
            .await
    }

    /// Raw entry point: request OS permission strings directly
    ///
    /// Registers the action, plans the request, and either resolves
    /// immediately (nothing left to prompt) or issues one batched OS
    /// request under [`REQUEST_CODE`]. A detached host makes this a silent
    /// no-op.
    pub async fn request_permissions(
        &self,
        action: Arc<dyn ResultAction>,
        permissions: Vec<String>,
        dialog: Option<DialogSpec>,
    ) -> Result<(), BrokerError> {
        if !self.host.is_attached() {
            debug!("host detached, ignoring permission request");
            return Ok(());
        }

        let mut state = self.state.lock().await;
        state.actions.register(action.clone(), permissions.clone());

        let plan = self.planner.plan(&permissions);
        if plan.is_empty() {
            // Nothing to prompt: resolve synchronously and drop the entry.
            action.on_result(permissions, Outcome::Granted);
            state.actions.remove(&action);
            return Ok(());
        }

        // A batch carrying a dialog replaces the pending one; a batch
        // without a dialog leaves an earlier batch's dialog in place.
        if dialog.is_some() {
            state.pending_dialog = dialog;
        }
        // The request is issued inside the lock so registration and send
        // form one atomic section with respect to incoming callbacks.
        self.host.request_permissions(REQUEST_CODE, &plan).await?;
        Ok(())
    }

    /// Route the host OS permission callback into the broker
    ///
    /// Reconciles the result vector, runs the dialog escalation tree when
    /// needed, and notifies every pending action exactly once. Mismatched
    /// array lengths are truncated, never a fault.
    ///
    /// `finish_screen` closes the host screen after dialog resolution
    /// (transparent permission-relay screens pass `true`).
    pub async fn notify_permissions_change(
        &self,
        permissions: Vec<String>,
        results: Vec<GrantResult>,
        finish_screen: bool,
    ) -> Result<(), BrokerError> {
        let (reconciliation, dialog) = {
            let mut state = self.state.lock().await;
            let reconciliation = self.reconciler.reconcile(&permissions, &results);
            // The pending dialog belongs to this pass either way; a pass
            // without escalations simply discards it.
            let dialog = match state.pending_dialog.take() {
                Some(dialog) if reconciliation.needs_escalation() => dialog,
                _ => {
                    self.notify_plain(&mut state.actions, &reconciliation);
                    return Ok(());
                }
            };
            (reconciliation, dialog)
        };

        // Await the human outside the mutual-exclusion domain.
        let strings = dialog.resolve(&self.host.app_label());
        let choice = match self.presenter.present(strings).await {
            Ok(choice) => choice,
            Err(e) => {
                warn!(error = %e, "dialog presentation failed, reporting plain denials");
                let mut state = self.state.lock().await;
                self.notify_plain(&mut state.actions, &reconciliation);
                return Ok(());
            }
        };

        match choice {
            DialogChoice::Accept => {
                dialog.run_accept();
                self.open_settings();
                if finish_screen {
                    self.host.finish_screen();
                }
                let mut state = self.state.lock().await;
                state.actions.notify_and_clear(
                    &reconciliation.permissions,
                    &reconciliation.denied_with_escalated(),
                    Some(&reconciliation.escalated),
                );
            }
            DialogChoice::Cancel => {
                dialog.run_cancel();
                {
                    let mut state = self.state.lock().await;
                    // Escalated permissions are not reported as denied on
                    // cancel; only plain denials are.
                    self.notify_plain(&mut state.actions, &reconciliation);
                }
                if finish_screen {
                    self.host.finish_screen();
                }
            }
        }
        Ok(())
    }

    /// Route a serialized host-bridge callback payload into the broker
    ///
    /// Accepts the JSON form of [`PermissionResponse`]. A `request_id`
    /// other than [`REQUEST_CODE`] is logged and still processed: whichever
    /// OS response arrives resolves everything pending.
    pub async fn notify_from_payload(
        &self,
        payload: &str,
        finish_screen: bool,
    ) -> Result<(), BrokerError> {
        let response: PermissionResponse = serde_json::from_str(payload)?;
        if response.request_id != REQUEST_CODE {
            debug!(request_id = response.request_id, "unexpected correlation token");
        }
        self.notify_permissions_change(response.permissions, response.results, finish_screen)
            .await
    }

    fn notify_plain(&self, actions: &mut PendingActions, reconciliation: &Reconciliation) {
        actions.notify_and_clear(
            &reconciliation.permissions,
            &reconciliation.plain_denied,
            None,
        );
    }

    fn open_settings(&self) {
        let route = SettingsRoute::for_platform(
            self.quirks.applies(),
            self.host.package_name(),
            self.host.package_uid(),
        );
        if let Err(e) = self.navigator.open(&route) {
            warn!(error = %e, "could not open settings screen");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct MockHost {
        attached: AtomicBool,
        granted: StdMutex<Vec<String>>,
        rationale: StdMutex<Vec<String>>,
        requested: StdMutex<Vec<Vec<String>>>,
        finished: AtomicBool,
    }

    impl MockHost {
        fn new() -> Self {
            Self {
                attached: AtomicBool::new(true),
                granted: StdMutex::new(Vec::new()),
                rationale: StdMutex::new(Vec::new()),
                requested: StdMutex::new(Vec::new()),
                finished: AtomicBool::new(false),
            }
        }

        fn grant(&self, permission: &str) {
            self.granted.lock().unwrap().push(permission.to_string());
        }

        fn allow_rationale(&self, permission: &str) {
            self.rationale.lock().unwrap().push(permission.to_string());
        }
    }

    #[async_trait]
    impl PermissionHost for MockHost {
        fn is_attached(&self) -> bool {
            self.attached.load(Ordering::SeqCst)
        }
        fn app_label(&self) -> String {
            "MockApp".to_string()
        }
        fn package_name(&self) -> String {
            "com.example.mock".to_string()
        }
        fn package_uid(&self) -> u32 {
            10042
        }
        fn check_permission(&self, permission: &str) -> bool {
            self.granted.lock().unwrap().iter().any(|p| p == permission)
        }
        fn should_show_rationale(&self, permission: &str) -> bool {
            self.rationale.lock().unwrap().iter().any(|p| p == permission)
        }
        async fn request_permissions(
            &self,
            _request_id: u32,
            permissions: &[String],
        ) -> Result<(), BrokerError> {
            self.requested.lock().unwrap().push(permissions.to_vec());
            Ok(())
        }
        fn finish_screen(&self) {
            self.finished.store(true, Ordering::SeqCst);
        }
    }

    struct MockPresenter {
        choice: DialogChoice,
        presented: StdMutex<Vec<crate::dialog::DialogStrings>>,
    }

    impl MockPresenter {
        fn new(choice: DialogChoice) -> Self {
            Self {
                choice,
                presented: StdMutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DialogPresenter for MockPresenter {
        async fn present(
            &self,
            dialog: crate::dialog::DialogStrings,
        ) -> Result<DialogChoice, BrokerError> {
            self.presented.lock().unwrap().push(dialog);
            Ok(self.choice)
        }
    }

    #[derive(Default)]
    struct MockNavigator {
        routes: StdMutex<Vec<SettingsRoute>>,
    }

    impl SettingsNavigator for MockNavigator {
        fn open(&self, route: &SettingsRoute) -> Result<(), BrokerError> {
            self.routes.lock().unwrap().push(route.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recording {
        results: StdMutex<Vec<(Vec<String>, Outcome)>>,
    }

    impl ResultAction for Recording {
        fn on_result(&self, denied: Vec<String>, outcome: Outcome) {
            self.results.lock().unwrap().push((denied, outcome));
        }
    }

    fn broker(
        host: Arc<MockHost>,
        presenter: Arc<MockPresenter>,
        navigator: Arc<MockNavigator>,
    ) -> PermissionBroker {
        PermissionBroker::new(host, presenter, navigator)
    }

    const CAMERA: &str = "android.permission.CAMERA";

    #[tokio::test]
    async fn test_already_granted_resolves_without_os_round_trip() {
        let host = Arc::new(MockHost::new());
        host.grant(CAMERA);
        let presenter = Arc::new(MockPresenter::new(DialogChoice::Cancel));
        let navigator = Arc::new(MockNavigator::default());
        let broker = broker(host.clone(), presenter, navigator);

        let recording = Arc::new(Recording::default());
        broker
            .request_groups(
                recording.clone() as Arc<dyn ResultAction>,
                None,
                None,
                true,
                &[PermissionGroup::Camera],
            )
            .await
            .unwrap();

        assert!(host.requested.lock().unwrap().is_empty());
        assert_eq!(
            *recording.results.lock().unwrap(),
            vec![(vec![CAMERA.to_string()], Outcome::Granted)]
        );
        assert_eq!(broker.pending_actions().await, 0);
    }

    #[tokio::test]
    async fn test_empty_groups_resolve_immediately() {
        let host = Arc::new(MockHost::new());
        let broker = broker(
            host,
            Arc::new(MockPresenter::new(DialogChoice::Cancel)),
            Arc::new(MockNavigator::default()),
        );

        let recording = Arc::new(Recording::default());
        broker
            .request_groups(recording.clone() as Arc<dyn ResultAction>, None, None, true, &[])
            .await
            .unwrap();

        assert_eq!(
            *recording.results.lock().unwrap(),
            vec![(Vec::new(), Outcome::Granted)]
        );
    }

    #[tokio::test]
    async fn test_detached_host_noops() {
        let host = Arc::new(MockHost::new());
        host.attached.store(false, Ordering::SeqCst);
        let broker = broker(
            host.clone(),
            Arc::new(MockPresenter::new(DialogChoice::Cancel)),
            Arc::new(MockNavigator::default()),
        );

        let recording = Arc::new(Recording::default());
        broker
            .request_groups(
                recording.clone() as Arc<dyn ResultAction>,
                None,
                None,
                false,
                &[PermissionGroup::Camera],
            )
            .await
            .unwrap();

        assert!(recording.results.lock().unwrap().is_empty());
        assert!(host.requested.lock().unwrap().is_empty());
        assert!(!broker.has_permission(CAMERA));
        assert!(!broker.has_group_permissions(&[PermissionGroup::Camera]));
    }

    #[tokio::test]
    async fn test_plain_denial_no_dialog() {
        let host = Arc::new(MockHost::new());
        host.allow_rationale(CAMERA); // user can still be asked again
        let presenter = Arc::new(MockPresenter::new(DialogChoice::Accept));
        let broker = broker(host.clone(), presenter.clone(), Arc::new(MockNavigator::default()));

        let recording = Arc::new(Recording::default());
        broker
            .request_groups(
                recording.clone() as Arc<dyn ResultAction>,
                None,
                None,
                true,
                &[PermissionGroup::Camera],
            )
            .await
            .unwrap();

        assert_eq!(
            *host.requested.lock().unwrap(),
            vec![vec![CAMERA.to_string()]]
        );

        broker
            .notify_permissions_change(vec![CAMERA.to_string()], vec![GrantResult::Denied], false)
            .await
            .unwrap();

        assert!(presenter.presented.lock().unwrap().is_empty());
        assert_eq!(
            *recording.results.lock().unwrap(),
            vec![(vec![CAMERA.to_string()], Outcome::Denied)]
        );
        assert_eq!(broker.pending_actions().await, 0);
    }

    #[tokio::test]
    async fn test_escalation_accept_opens_settings() {
        let host = Arc::new(MockHost::new());
        let presenter = Arc::new(MockPresenter::new(DialogChoice::Accept));
        let navigator = Arc::new(MockNavigator::default());
        let broker = broker(host.clone(), presenter.clone(), navigator.clone());

        let recording = Arc::new(Recording::default());
        broker
            .request_groups(
                recording.clone() as Arc<dyn ResultAction>,
                None,
                None,
                true,
                &[PermissionGroup::Camera],
            )
            .await
            .unwrap();

        // Rationale suppressed ("never ask again") for the denial.
        broker
            .notify_permissions_change(vec![CAMERA.to_string()], vec![GrantResult::Denied], true)
            .await
            .unwrap();

        assert_eq!(presenter.presented.lock().unwrap().len(), 1);
        assert_eq!(
            *navigator.routes.lock().unwrap(),
            vec![SettingsRoute::AppDetails {
                package: "com.example.mock".to_string()
            }]
        );
        assert!(host.finished.load(Ordering::SeqCst));
        assert_eq!(
            *recording.results.lock().unwrap(),
            vec![(vec![CAMERA.to_string()], Outcome::Denied)]
        );
    }

    #[tokio::test]
    async fn test_escalation_cancel_excludes_escalated_from_denied() {
        let host = Arc::new(MockHost::new());
        let presenter = Arc::new(MockPresenter::new(DialogChoice::Cancel));
        let navigator = Arc::new(MockNavigator::default());
        let broker = broker(host.clone(), presenter, navigator.clone());

        let recording = Arc::new(Recording::default());
        broker
            .request_groups(
                recording.clone() as Arc<dyn ResultAction>,
                None,
                None,
                true,
                &[PermissionGroup::Camera],
            )
            .await
            .unwrap();

        broker
            .notify_permissions_change(vec![CAMERA.to_string()], vec![GrantResult::Denied], false)
            .await
            .unwrap();

        // Cancel: escalated set excluded, nothing plainly denied here, so
        // the batch is reported granted with the full permission set.
        assert!(navigator.routes.lock().unwrap().is_empty());
        assert_eq!(
            *recording.results.lock().unwrap(),
            vec![(vec![CAMERA.to_string()], Outcome::Granted)]
        );
    }

    #[tokio::test]
    async fn test_notify_from_payload() {
        let host = Arc::new(MockHost::new());
        host.allow_rationale(CAMERA);
        let broker = broker(
            host.clone(),
            Arc::new(MockPresenter::new(DialogChoice::Cancel)),
            Arc::new(MockNavigator::default()),
        );

        let recording = Arc::new(Recording::default());
        broker
            .request_permissions(
                recording.clone() as Arc<dyn ResultAction>,
                vec![CAMERA.to_string()],
                None,
            )
            .await
            .unwrap();

        let payload = format!(
            r#"{{"request_id": 1, "permissions": ["{CAMERA}"], "results": ["denied"]}}"#
        );
        broker.notify_from_payload(&payload, false).await.unwrap();

        assert_eq!(
            *recording.results.lock().unwrap(),
            vec![(vec![CAMERA.to_string()], Outcome::Denied)]
        );
    }

    #[tokio::test]
    async fn test_malformed_payload_is_an_error() {
        let host = Arc::new(MockHost::new());
        let broker = broker(
            host,
            Arc::new(MockPresenter::new(DialogChoice::Cancel)),
            Arc::new(MockNavigator::default()),
        );

        let err = broker.notify_from_payload("{ not json }", false).await.unwrap_err();
        assert!(matches!(err, BrokerError::Payload(_)));
    }

    #[tokio::test]
    async fn test_oem_route_when_quirks_apply() {
        struct AlwaysQuirky;
        impl QuirkOracle for AlwaysQuirky {
            fn applies(&self) -> bool {
                true
            }
            fn check_permission(&self, _p: &str) -> Result<bool, BrokerError> {
                Ok(true)
            }
        }

        let host = Arc::new(MockHost::new());
        let presenter = Arc::new(MockPresenter::new(DialogChoice::Accept));
        let navigator = Arc::new(MockNavigator::default());
        let broker = broker(host.clone(), presenter, navigator.clone())
            .with_quirks(Arc::new(AlwaysQuirky));

        let recording = Arc::new(Recording::default());
        broker
            .request_groups(
                recording as Arc<dyn ResultAction>,
                None,
                None,
                true,
                &[PermissionGroup::Camera],
            )
            .await
            .unwrap();

        broker
            .notify_permissions_change(vec![CAMERA.to_string()], vec![GrantResult::Denied], false)
            .await
            .unwrap();

        let routes = navigator.routes.lock().unwrap();
        assert!(matches!(
            routes.as_slice(),
            [SettingsRoute::OemPermissionEditor { uid: 10042, .. }]
        ));
    }
}
