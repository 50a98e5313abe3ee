//! Caller-supplied result actions.
//!
//! A [`ResultAction`] is the completion callback a caller registers before a
//! permission request is issued. It is held in the pending registry until an
//! OS callback resolves the batch, then invoked exactly once with either a
//! [`Granted`](Outcome::Granted) outcome (full permission set) or a
//! [`Denied`](Outcome::Denied) outcome (the denied subset only).
//!
//! Actions that want special handling of permanently-denied permissions
//! override [`supports_escalation`](ResultAction::supports_escalation) and
//! [`on_escalated`](ResultAction::on_escalated); when the escalation dialog
//! is accepted, the hook is invoked *instead of* the normal callback.

use serde::{Deserialize, Serialize};

/// Final outcome of one permission request batch
///
/// # Examples
///
/// ```
/// use permission_broker::action::Outcome;
///
/// let outcome = Outcome::Granted;
/// assert_eq!(serde_json::to_string(&outcome).unwrap(), r#""granted""#);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Every requested permission is granted
    Granted,
    /// At least one requested permission was denied
    Denied,
}

/// Trait for permission result callbacks
///
/// Identity is `Arc` pointer equality: registering the same `Arc` twice
/// creates two independent registrations, and removal by identity removes
/// all of them.
///
/// This trait can be implemented directly or used with plain closures via
/// the blanket implementation.
///
/// # Examples
///
/// ## Using a closure
///
/// ```
/// use permission_broker::action::{Outcome, ResultAction};
/// use std::sync::Arc;
///
/// let action: Arc<dyn ResultAction> = Arc::new(|denied: Vec<String>, outcome: Outcome| {
///     match outcome {
///         Outcome::Granted => println!("all granted"),
///         Outcome::Denied => println!("denied: {:?}", denied),
///     }
/// });
/// ```
///
/// ## Implementing directly, with an escalation hook
///
/// ```
/// use permission_broker::action::{Outcome, ResultAction};
///
/// struct CameraAction;
///
/// impl ResultAction for CameraAction {
///     fn on_result(&self, denied: Vec<String>, outcome: Outcome) {
///         if outcome == Outcome::Granted {
///             // open the camera
///         } else {
///             eprintln!("camera unavailable, denied: {:?}", denied);
///         }
///     }
///
///     fn supports_escalation(&self) -> bool {
///         true
///     }
///
///     fn on_escalated(&self, permissions: &[String]) {
///         eprintln!("permanently denied, sent to settings: {:?}", permissions);
///     }
/// }
/// ```
pub trait ResultAction: Send + Sync {
    /// Deliver the resolution of the permission batch
    ///
    /// # Arguments
    ///
    /// * `denied` - With [`Outcome::Granted`], the *full* permission set of
    ///   the batch; with [`Outcome::Denied`], exactly the denied subset
    /// * `outcome` - Whether the batch as a whole was granted
    fn on_result(&self, denied: Vec<String>, outcome: Outcome);

    /// Whether this action carries a custom escalation hook
    ///
    /// Returns `false` by default. When `true` and the reconciliation pass
    /// produced a non-empty escalation set, [`on_escalated`](Self::on_escalated)
    /// is invoked instead of [`on_result`](Self::on_result).
    fn supports_escalation(&self) -> bool {
        false
    }

    /// Handle permanently-denied permissions after the user accepted the
    /// settings-redirect dialog
    ///
    /// Only called when [`supports_escalation`](Self::supports_escalation)
    /// returns `true`. Default implementation does nothing.
    fn on_escalated(&self, permissions: &[String]) {
        let _ = permissions;
    }
}

/// Blanket implementation for plain closures
///
/// Any `Fn(Vec<String>, Outcome)` can be registered directly as a result
/// action. Closures never carry an escalation hook.
impl<F> ResultAction for F
where
    F: Fn(Vec<String>, Outcome) + Send + Sync,
{
    fn on_result(&self, denied: Vec<String>, outcome: Outcome) {
        self(denied, outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_closure_action() {
        let calls = AtomicUsize::new(0);
        let action = |_denied: Vec<String>, outcome: Outcome| {
            assert_eq!(outcome, Outcome::Granted);
            calls.fetch_add(1, Ordering::SeqCst);
        };

        action.on_result(vec!["android.permission.CAMERA".to_string()], Outcome::Granted);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!action.supports_escalation());
    }

    struct EscalatingAction {
        escalated: Mutex<Vec<String>>,
    }

    impl ResultAction for EscalatingAction {
        fn on_result(&self, _denied: Vec<String>, _outcome: Outcome) {
            panic!("normal callback must be suppressed for escalation");
        }

        fn supports_escalation(&self) -> bool {
            true
        }

        fn on_escalated(&self, permissions: &[String]) {
            self.escalated.lock().unwrap().extend_from_slice(permissions);
        }
    }

    #[test]
    fn test_escalation_hook() {
        let action = EscalatingAction {
            escalated: Mutex::new(Vec::new()),
        };
        assert!(action.supports_escalation());

        action.on_escalated(&["android.permission.CAMERA".to_string()]);
        assert_eq!(
            *action.escalated.lock().unwrap(),
            vec!["android.permission.CAMERA".to_string()]
        );
    }

    #[test]
    fn test_outcome_serialization() {
        assert_eq!(serde_json::to_string(&Outcome::Granted).unwrap(), r#""granted""#);
        assert_eq!(serde_json::to_string(&Outcome::Denied).unwrap(), r#""denied""#);
    }
}
