//! Wire types for the host-bridge permission callback.
//!
//! The host OS delivers exactly one asynchronous callback per request batch:
//! `(request_id, permissions[], results[])`. Host bridges that marshal the
//! callback as JSON can hand the payload straight to
//! [`PermissionBroker::notify_from_payload`](crate::broker::PermissionBroker::notify_from_payload);
//! in-process hosts construct [`PermissionResponse`] directly.

use serde::{Deserialize, Serialize};

/// Grant/deny result for one permission index in the OS result vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantResult {
    /// The OS reports the permission as granted
    Granted,
    /// The OS reports the permission as denied
    Denied,
}

impl GrantResult {
    /// Whether this result is a denial
    pub fn is_denied(self) -> bool {
        matches!(self, GrantResult::Denied)
    }
}

/// One asynchronous OS callback delivering the outcome of a request batch
///
/// `results[i]` corresponds to `permissions[i]`. The reconciler zips the two
/// vectors and truncates to the shorter length; a length mismatch is
/// tolerated, never a fault.
///
/// # Examples
///
/// ```
/// use permission_broker::events::{GrantResult, PermissionResponse};
///
/// let payload = r#"{
///     "request_id": 1,
///     "permissions": ["android.permission.CAMERA"],
///     "results": ["denied"]
/// }"#;
/// let response: PermissionResponse = serde_json::from_str(payload).unwrap();
/// assert_eq!(response.results, vec![GrantResult::Denied]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionResponse {
    /// Correlation token echoed back by the OS
    pub request_id: u32,
    /// The full permission array that was requested
    pub permissions: Vec<String>,
    /// Grant/deny result per index, parallel to `permissions`
    pub results: Vec<GrantResult>,
}
