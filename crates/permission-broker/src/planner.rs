//! Request planning: which permissions actually need prompting.
//!
//! Given a requested permission set, the planner filters out everything that
//! is already satisfied - permissions the OS reports as granted, and
//! permissions the platform does not even know about. Requesting a
//! nonexistent identifier is meaningless on that OS version, so an unknown
//! permission is treated as always satisfied rather than requested or
//! reported denied.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use crate::host::{PermissionHost, QuirkOracle};

/// Snapshot of all permission identifiers the host OS declares as known
///
/// Built once at startup from an explicit, versioned table for the target
/// platform release and never invalidated. An identifier absent from this
/// set means "does not exist on this OS version", never "denied".
///
/// # Examples
///
/// ```
/// use permission_broker::planner::KnownPermissions;
///
/// let known = KnownPermissions::from_iter(["android.permission.CAMERA"]);
/// assert!(known.contains("android.permission.CAMERA"));
/// assert!(!known.contains("android.permission.BODY_SENSORS"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct KnownPermissions {
    inner: HashSet<String>,
}

impl KnownPermissions {
    /// Build a snapshot from an iterator of permission identifiers
    pub fn from_iter<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner: identifiers.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the platform declares `permission`
    pub fn contains(&self, permission: &str) -> bool {
        self.inner.contains(permission)
    }

    /// Number of declared identifiers
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Computes the minimal subset of a request that must be prompted
///
/// Holds the [`KnownPermissions`] snapshot together with the oracle
/// capabilities needed to decide whether a permission is already satisfied.
pub struct RequestPlanner {
    known: KnownPermissions,
    host: Arc<dyn PermissionHost>,
    quirks: Arc<dyn QuirkOracle>,
}

impl RequestPlanner {
    /// Create a planner over the given capabilities
    pub fn new(
        known: KnownPermissions,
        host: Arc<dyn PermissionHost>,
        quirks: Arc<dyn QuirkOracle>,
    ) -> Self {
        Self { known, host, quirks }
    }

    /// The platform's known-permission snapshot
    pub fn known(&self) -> &KnownPermissions {
        &self.known
    }

    /// Whether a single permission is currently satisfied
    ///
    /// Unknown identifiers are always satisfied. On quirky platforms the
    /// authoritative oracle is consulted in addition to the standard check
    /// and wins on conflict; an oracle probe failure is logged and treated
    /// as granted.
    pub fn is_granted(&self, permission: &str) -> bool {
        if !self.known.contains(permission) {
            return true;
        }
        if self.quirks.applies() {
            let functional = self.quirks.check_permission(permission).unwrap_or_else(|e| {
                warn!(permission, error = %e, "quirk probe failed, assuming granted");
                true
            });
            return functional && self.host.check_permission(permission);
        }
        self.host.check_permission(permission)
    }

    /// Compute the subset of `requested` that must be prompted
    ///
    /// Returns, in the input's order, only the permissions that are known to
    /// the platform and not currently granted. An empty plan means the whole
    /// batch is already satisfied and the caller must resolve it as granted
    /// without any OS round-trip.
    pub fn plan(&self, requested: &[String]) -> Vec<String> {
        requested
            .iter()
            .filter(|p| self.known.contains(p.as_str()) && !self.is_granted(p))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BrokerError;
    use async_trait::async_trait;
    use std::collections::HashSet as StdHashSet;
    use std::sync::Mutex;

    struct FakeHost {
        granted: Mutex<StdHashSet<String>>,
    }

    impl FakeHost {
        fn new(granted: &[&str]) -> Self {
            Self {
                granted: Mutex::new(granted.iter().map(|s| s.to_string()).collect()),
            }
        }
    }

    #[async_trait]
    impl PermissionHost for FakeHost {
        fn is_attached(&self) -> bool {
            true
        }
        fn app_label(&self) -> String {
            "Fake".to_string()
        }
        fn package_name(&self) -> String {
            "com.example.fake".to_string()
        }
        fn package_uid(&self) -> u32 {
            10001
        }
        fn check_permission(&self, permission: &str) -> bool {
            self.granted.lock().unwrap().contains(permission)
        }
        fn should_show_rationale(&self, _permission: &str) -> bool {
            true
        }
        async fn request_permissions(
            &self,
            _request_id: u32,
            _permissions: &[String],
        ) -> Result<(), BrokerError> {
            Ok(())
        }
        fn finish_screen(&self) {}
    }

    struct DenyingQuirks {
        denied: Vec<String>,
    }

    impl QuirkOracle for DenyingQuirks {
        fn applies(&self) -> bool {
            true
        }
        fn check_permission(&self, permission: &str) -> Result<bool, BrokerError> {
            Ok(!self.denied.iter().any(|d| d == permission))
        }
    }

    struct FailingQuirks;

    impl QuirkOracle for FailingQuirks {
        fn applies(&self) -> bool {
            true
        }
        fn check_permission(&self, _permission: &str) -> Result<bool, BrokerError> {
            Err(BrokerError::QuirkProbe("op table unavailable".to_string()))
        }
    }

    fn known() -> KnownPermissions {
        KnownPermissions::from_iter(["android.permission.CAMERA", "android.permission.READ_SMS"])
    }

    #[test]
    fn test_plan_filters_granted() {
        let host = Arc::new(FakeHost::new(&["android.permission.CAMERA"]));
        let planner = RequestPlanner::new(known(), host, Arc::new(crate::host::NoQuirks));

        let plan = planner.plan(&[
            "android.permission.CAMERA".to_string(),
            "android.permission.READ_SMS".to_string(),
        ]);
        assert_eq!(plan, vec!["android.permission.READ_SMS".to_string()]);
    }

    #[test]
    fn test_plan_drops_unknown() {
        let host = Arc::new(FakeHost::new(&[]));
        let planner = RequestPlanner::new(known(), host, Arc::new(crate::host::NoQuirks));

        let plan = planner.plan(&[
            "android.permission.BODY_SENSORS".to_string(),
            "android.permission.CAMERA".to_string(),
        ]);
        assert_eq!(plan, vec!["android.permission.CAMERA".to_string()]);
    }

    #[test]
    fn test_empty_plan_when_all_satisfied() {
        let host = Arc::new(FakeHost::new(&["android.permission.CAMERA"]));
        let planner = RequestPlanner::new(known(), host, Arc::new(crate::host::NoQuirks));

        let plan = planner.plan(&[
            "android.permission.CAMERA".to_string(),
            "android.permission.NONEXISTENT".to_string(),
        ]);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_quirk_oracle_wins_over_host() {
        // Host says granted, quirky OEM oracle says functionally denied.
        let host = Arc::new(FakeHost::new(&["android.permission.CAMERA"]));
        let quirks = Arc::new(DenyingQuirks {
            denied: vec!["android.permission.CAMERA".to_string()],
        });
        let planner = RequestPlanner::new(known(), host, quirks);

        assert!(!planner.is_granted("android.permission.CAMERA"));
        let plan = planner.plan(&["android.permission.CAMERA".to_string()]);
        assert_eq!(plan, vec!["android.permission.CAMERA".to_string()]);
    }

    #[test]
    fn test_quirk_probe_failure_defaults_to_granted() {
        let host = Arc::new(FakeHost::new(&["android.permission.CAMERA"]));
        let planner = RequestPlanner::new(known(), host, Arc::new(FailingQuirks));

        assert!(planner.is_granted("android.permission.CAMERA"));
    }

    #[test]
    fn test_unknown_permission_is_always_granted() {
        let host = Arc::new(FakeHost::new(&[]));
        let planner = RequestPlanner::new(known(), host, Arc::new(crate::host::NoQuirks));

        assert!(planner.is_granted("android.permission.NONEXISTENT"));
    }

    #[test]
    fn test_known_permissions_snapshot() {
        let known = known();
        assert_eq!(known.len(), 2);
        assert!(!known.is_empty());
        assert!(known.contains("android.permission.CAMERA"));
    }
}
