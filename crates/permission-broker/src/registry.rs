//! Pending-action registry.
//!
//! Holds the caller callbacks that are awaiting an OS permission callback,
//! together with the permission sets they were registered for. One
//! reconciliation pass serves *all* currently pending actions, not just the
//! one tied to the triggering request: overlapping concurrent requests from
//! different callers are resolved together whenever the OS responds to any
//! one of them.
//!
//! The registry is a single ordered collection with an explicit entry
//! lifecycle (`Registered` → `Notified` → dropped). It carries no interior
//! locking; the broker serializes all access under its own mutex so that
//! registration, removal, and a full notify pass form one atomic section.

use std::sync::Arc;

use tracing::debug;

use crate::action::{Outcome, ResultAction};

/// Lifecycle state of one registry entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryState {
    /// Awaiting an OS callback
    Registered,
    /// Delivered during the current notify pass, about to be dropped
    Notified,
}

struct Entry {
    action: Arc<dyn ResultAction>,
    permissions: Vec<String>,
    state: EntryState,
}

/// Registry of outstanding caller callbacks
///
/// Identity is `Arc` pointer equality. The same action may be registered
/// multiple times concurrently (each registration is independent);
/// [`remove`](PendingActions::remove) removes all occurrences.
#[derive(Default)]
pub struct PendingActions {
    entries: Vec<Entry>,
}

impl PendingActions {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action for a permission set
    ///
    /// No-op when `permissions` is empty: every registered entry carries a
    /// non-empty permission set by invariant.
    pub fn register(&mut self, action: Arc<dyn ResultAction>, permissions: Vec<String>) {
        if permissions.is_empty() {
            debug!("ignoring registration with empty permission set");
            return;
        }
        self.entries.push(Entry {
            action,
            permissions,
            state: EntryState::Registered,
        });
    }

    /// Remove all registrations of `action`, by identity
    ///
    /// Safe to call when the action was never registered.
    pub fn remove(&mut self, action: &Arc<dyn ResultAction>) {
        self.entries.retain(|e| !Arc::ptr_eq(&e.action, action));
    }

    /// Number of outstanding registrations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no outstanding registrations
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Notify every registered action and clear the registry
    ///
    /// For each entry:
    /// - `escalated` non-empty and the action supports the escalation hook ⇒
    ///   invoke the hook with the escalated set; the normal callback is
    ///   suppressed for that action;
    /// - otherwise, empty `denied` ⇒ `on_result(permissions, Granted)` with
    ///   the full batch permission set; non-empty ⇒
    ///   `on_result(denied, Denied)` with exactly the denied subset.
    ///
    /// After the pass the registry is empty.
    pub fn notify_and_clear(
        &mut self,
        permissions: &[String],
        denied: &[String],
        escalated: Option<&[String]>,
    ) {
        let escalated = escalated.filter(|e| !e.is_empty());

        for entry in &mut self.entries {
            debug!(registered_for = entry.permissions.len(), "notifying action");
            if let Some(escalated) = escalated {
                if entry.action.supports_escalation() {
                    entry.action.on_escalated(escalated);
                    entry.state = EntryState::Notified;
                    continue;
                }
            }

            if denied.is_empty() {
                entry.action.on_result(permissions.to_vec(), Outcome::Granted);
            } else {
                entry.action.on_result(denied.to_vec(), Outcome::Denied);
            }
            entry.state = EntryState::Notified;
        }

        self.entries.retain(|e| e.state == EntryState::Registered);
        debug!(remaining = self.entries.len(), "notify pass complete");
    }
}
