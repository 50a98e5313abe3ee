//! Host OS capability traits.
//!
//! The broker never talks to the OS directly. Everything platform-specific
//! is injected behind the traits in this module:
//!
//! - [`PermissionHost`] - permission checks, the batched OS request, and
//!   host-screen plumbing
//! - [`QuirkOracle`] - authoritative per-permission re-check for OEM skins
//!   known to misreport grants
//! - [`SettingsNavigator`] - opens the OS screen for manually granting a
//!   permission, driven by a [`SettingsRoute`] value
//!
//! Implementations live in the host application (JNI/FFI bridge, test
//! doubles); this crate only defines the contracts.

use async_trait::async_trait;

use crate::error::BrokerError;

/// Capability interface onto the host screen and the OS permission
/// primitives
///
/// The synchronous checks may block briefly (the underlying primitive may
/// shell out to a system property reader); they are assumed fast relative to
/// human-interaction timescales and are never parallelized.
#[async_trait]
pub trait PermissionHost: Send + Sync {
    /// Whether the host screen reference is still valid
    ///
    /// A detached host makes the broker's request entry points no-op
    /// silently, mirroring a torn-down screen. Queries return `false`.
    fn is_attached(&self) -> bool;

    /// Display label of the application, substituted into dialog templates
    fn app_label(&self) -> String;

    /// Package identifier of the application, used for settings routes
    fn package_name(&self) -> String;

    /// OS-assigned package uid, carried in the OEM settings route extras
    fn package_uid(&self) -> u32;

    /// Whether a single OS permission string is currently granted
    fn check_permission(&self, permission: &str) -> bool;

    /// Whether the OS would still show a rationale prompt for `permission`
    ///
    /// `false` together with a denial means the user checked
    /// "never ask again" and only the settings screen can change the state.
    fn should_show_rationale(&self, permission: &str) -> bool;

    /// Issue one batched permission request to the OS
    ///
    /// The outcome arrives later through the host's single asynchronous
    /// callback, which must be routed into
    /// [`PermissionBroker::notify_permissions_change`](crate::broker::PermissionBroker::notify_permissions_change).
    ///
    /// Implementations must not invoke that callback inline from within
    /// this method: the broker issues the request while holding its state
    /// lock, so a synchronous re-entry would deadlock. Deliver the callback
    /// from a separate task or after this method returns.
    async fn request_permissions(
        &self,
        request_id: u32,
        permissions: &[String],
    ) -> Result<(), BrokerError>;

    /// Close the host screen
    ///
    /// Invoked after dialog resolution when the caller asked for the screen
    /// to be finished (transparent permission-relay screens do this).
    fn finish_screen(&self);
}

/// Authoritative per-permission check for platforms that misreport grants
///
/// Some OEM skins report a permission as granted through the standard check
/// while the underlying op is actually denied. When
/// [`applies`](QuirkOracle::applies) is `true`, the reconciler consults
/// [`check_permission`](QuirkOracle::check_permission) for every pair in the
/// OS result vector and corrects Granted results the oracle contradicts.
/// The oracle always wins.
pub trait QuirkOracle: Send + Sync {
    /// Whether this platform needs the corrective re-check at all
    fn applies(&self) -> bool;

    /// Whether the permission is functionally granted
    ///
    /// A probe failure is not fatal: the reconciler logs it and falls back
    /// to treating the permission as granted, so a broken quirk detector
    /// never blocks the user.
    fn check_permission(&self, permission: &str) -> Result<bool, BrokerError>;
}

/// Quirk oracle for stock platforms: never applies
///
/// # Examples
///
/// ```
/// use permission_broker::host::{NoQuirks, QuirkOracle};
///
/// let oracle = NoQuirks;
/// assert!(!oracle.applies());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NoQuirks;

impl QuirkOracle for NoQuirks {
    fn applies(&self) -> bool {
        false
    }

    fn check_permission(&self, _permission: &str) -> Result<bool, BrokerError> {
        Ok(true)
    }
}

/// Intent action of the OEM permission editor screen.
pub const OEM_PERM_EDITOR_ACTION: &str = "miui.intent.action.APP_PERM_EDITOR";

/// Navigation target for manually granting a permission
///
/// Route construction is a strategy selected by platform detection
/// ([`SettingsRoute::for_platform`]); the [`SettingsNavigator`] capability
/// only has to launch whatever route it is handed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsRoute {
    /// The quirky OEM family's dedicated permission editor
    OemPermissionEditor {
        /// Intent action string of the editor screen
        action: String,
        /// Package the editor should open on
        package: String,
        /// Package uid extra required by older editor versions
        uid: u32,
    },
    /// The generic per-package application details screen
    AppDetails {
        /// Package the details screen should open on
        package: String,
    },
}

impl SettingsRoute {
    /// Select the settings route for the current platform
    pub fn for_platform(quirky_oem: bool, package: String, uid: u32) -> Self {
        if quirky_oem {
            SettingsRoute::OemPermissionEditor {
                action: OEM_PERM_EDITOR_ACTION.to_string(),
                package,
                uid,
            }
        } else {
            SettingsRoute::AppDetails { package }
        }
    }
}

/// Capability that opens an OS settings screen
pub trait SettingsNavigator: Send + Sync {
    /// Launch the screen described by `route`
    fn open(&self, route: &SettingsRoute) -> Result<(), BrokerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_quirks() {
        let oracle = NoQuirks;
        assert!(!oracle.applies());
        assert!(oracle.check_permission("android.permission.CAMERA").unwrap());
    }

    #[test]
    fn test_route_selection_oem() {
        let route = SettingsRoute::for_platform(true, "com.example.app".to_string(), 10001);
        match route {
            SettingsRoute::OemPermissionEditor { action, package, uid } => {
                assert_eq!(action, OEM_PERM_EDITOR_ACTION);
                assert_eq!(package, "com.example.app");
                assert_eq!(uid, 10001);
            }
            other => panic!("unexpected route: {other:?}"),
        }
    }

    #[test]
    fn test_route_selection_stock() {
        let route = SettingsRoute::for_platform(false, "com.example.app".to_string(), 10001);
        assert_eq!(
            route,
            SettingsRoute::AppDetails {
                package: "com.example.app".to_string()
            }
        );
    }
}
