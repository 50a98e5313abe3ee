//! Reconciliation of the asynchronous OS grant/deny callback.
//!
//! One OS callback delivers a permission array and a parallel result array.
//! The reconciler zips the two (truncating to the shorter length, a mismatch
//! is never a fault), corrects platform misreports through the quirk oracle,
//! and classifies every denial as either *plain* or *escalated*:
//!
//! - **escalated**: the OS reports "do not show rationale again" for the
//!   permission AND the permission has a known user-facing description -
//!   only a settings-redirect dialog can change its state;
//! - **plain**: every other denial.
//!
//! The authoritative quirk check always wins over the OS-reported result: a
//! Granted result the oracle contradicts is forced to Denied before any
//! classification happens.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::events::GrantResult;
use crate::host::{PermissionHost, QuirkOracle};

/// Description lookup used to decide whether a permanent denial is worth a
/// dialog. Permissions without a description never enter the escalation set.
pub type DescriptionLookup = fn(&str) -> Option<&'static str>;

/// Outcome of one reconciliation pass over an OS callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// The permission array, truncated to the processed length
    pub permissions: Vec<String>,
    /// Denials without escalation
    pub plain_denied: Vec<String>,
    /// Permanently-denied permissions eligible for the settings dialog
    pub escalated: Vec<String>,
}

impl Reconciliation {
    /// Whether the pass produced any escalation candidates
    pub fn needs_escalation(&self) -> bool {
        !self.escalated.is_empty()
    }

    /// The denied set reported when the settings dialog is accepted:
    /// plain denials plus the escalated set
    pub fn denied_with_escalated(&self) -> Vec<String> {
        let mut denied = self.plain_denied.clone();
        denied.extend(self.escalated.iter().cloned());
        denied
    }
}

/// Classifies one OS result vector against the platform oracles
pub struct ResultReconciler {
    host: Arc<dyn PermissionHost>,
    quirks: Arc<dyn QuirkOracle>,
    descriptions: DescriptionLookup,
}

impl ResultReconciler {
    /// Create a reconciler over the given capabilities
    pub fn new(
        host: Arc<dyn PermissionHost>,
        quirks: Arc<dyn QuirkOracle>,
        descriptions: DescriptionLookup,
    ) -> Self {
        Self {
            host,
            quirks,
            descriptions,
        }
    }

    /// The description lookup this reconciler classifies against
    pub fn descriptions(&self) -> DescriptionLookup {
        self.descriptions
    }

    /// Corrected grant state for one (permission, result) pair
    ///
    /// On quirky platforms a Granted result is re-checked against the
    /// authoritative oracle and forced to Denied on contradiction. A probe
    /// failure is logged and the OS result stands (conservative default).
    fn corrected(&self, permission: &str, result: GrantResult) -> GrantResult {
        if result == GrantResult::Granted && self.quirks.applies() {
            let functional = self.quirks.check_permission(permission).unwrap_or_else(|e| {
                warn!(permission, error = %e, "quirk probe failed, keeping OS result");
                true
            });
            if !functional {
                debug!(permission, "quirk oracle overrides OS grant");
                return GrantResult::Denied;
            }
        }
        result
    }

    /// Run one reconciliation pass
    ///
    /// Zips `permissions` and `results` to the shorter length, applies quirk
    /// correction, then classifies every denial.
    pub fn reconcile(&self, permissions: &[String], results: &[GrantResult]) -> Reconciliation {
        let len = permissions.len().min(results.len());
        if permissions.len() != results.len() {
            warn!(
                permissions = permissions.len(),
                results = results.len(),
                "mismatched callback arrays, truncating to shorter length"
            );
        }

        let mut processed = Vec::with_capacity(len);
        let mut plain_denied = Vec::new();
        let mut escalated = Vec::new();

        for (permission, result) in permissions.iter().zip(results.iter()).take(len) {
            processed.push(permission.clone());
            if !self.corrected(permission, *result).is_denied() {
                continue;
            }

            let rationale_suppressed = !self.host.should_show_rationale(permission);
            if rationale_suppressed && (self.descriptions)(permission).is_some() {
                escalated.push(permission.clone());
            } else {
                plain_denied.push(permission.clone());
            }
        }

        Reconciliation {
            permissions: processed,
            plain_denied,
            escalated,
        }
    }
}
