//! Permission Broker - runtime-permission orchestration for embedded app hosts
//!
//! This crate brokers runtime-permission requests between application code and
//! a host platform whose permission prompts resolve through an asynchronous,
//! process-global callback. Callers hand the broker a permission set and a
//! result action; the broker plans the minimal OS request, correlates the
//! eventual callback back to every pending action, corrects OEM-specific
//! misreports, and drives the "permanently denied, go to settings" dialog
//! escalation.
//!
//! # Overview
//!
//! The broker supports:
//! - Request planning that skips already-granted and platform-unknown
//!   permissions (an empty plan resolves synchronously, no OS round-trip)
//! - A pending-action registry where one OS callback resolves *all*
//!   outstanding actions in a single pass
//! - Quirk correction for OEM platforms whose standard check misreports
//!   (the authoritative oracle wins over the OS-reported result)
//! - Escalation classification of permanent denials and a per-batch
//!   settings-redirect dialog
//! - OEM-specific settings routing (permission editor vs. app-details page)
//!
//! # Architecture
//!
//! The crate is organized into focused modules:
//! - `broker`: the orchestrator tying everything together
//! - `planner`: which permissions actually need prompting
//! - `registry`: pending result actions awaiting the OS callback
//! - `reconcile`: callback reconciliation and denial classification
//! - `dialog`: the settings-redirect dialog and its presenter capability
//! - `host`: platform capabilities (host screen, quirk oracle, navigator)
//! - `groups`: abstract permission groups and the baseline platform tables
//! - `events`: serialized host-bridge callback payloads
//! - `error`: error types and handling
//!
//! # Example
//!
//! ```rust,no_run
//! use permission_broker::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example(
//! #     host: Arc<dyn PermissionHost>,
//! #     presenter: Arc<dyn DialogPresenter>,
//! #     navigator: Arc<dyn SettingsNavigator>,
//! # ) -> Result<(), BrokerError> {
//! let broker = PermissionBroker::new(host, presenter, navigator);
//!
//! let action: Arc<dyn ResultAction> = Arc::new(|denied: Vec<String>, outcome: Outcome| {
//!     match outcome {
//!         Outcome::Granted => println!("all granted"),
//!         Outcome::Denied => println!("denied: {denied:?}"),
//!     }
//! });
//!
//! broker
//!     .request_groups(
//!         action,
//!         None,
//!         None,
//!         true,
//!         &[PermissionGroup::Camera, PermissionGroup::Microphone],
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # License
//!
//! Licensed under MIT. See LICENSE file for details.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Caller-facing result actions
///
/// Defines the `ResultAction` trait that callers implement (or satisfy with a
/// closure) to receive the batch outcome, plus the optional escalation hook
/// for actions that want the permanently-denied set instead of the plain
/// callback.
pub mod action;

/// The permission broker orchestrator
///
/// `PermissionBroker` is the main entry point: it owns the pending-action
/// registry, the planner and the reconciler, and drives the full
/// request/callback/dialog cycle under one mutual-exclusion domain.
pub mod broker;

/// Settings-redirect dialog types and the `DialogPresenter` capability
pub mod dialog;

/// Error types and utilities
///
/// This module defines the `BrokerError` enum covering all error cases:
///
/// - `QuirkProbe` - OEM quirk oracle probe failures
/// - `Navigation` - settings screen navigation failures
/// - `Dialog` - dialog presentation failures
/// - `Payload` - malformed host-bridge payloads (auto-converts from
///   `serde_json::Error`)
pub mod error;

/// Serialized host-bridge event payloads
pub mod events;

/// Abstract permission groups and the baseline platform tables
pub mod groups;

/// Platform capabilities: host screen, quirk oracle, settings navigation
///
/// The `PermissionHost` trait abstracts the host screen (permission checks,
/// the OS request call, app identity); `QuirkOracle` models OEM platforms
/// needing an authoritative re-check; `SettingsNavigator` opens the
/// OEM-appropriate settings route.
pub mod host;

/// Request planning: which permissions actually need prompting
pub mod planner;

/// Reconciliation of the asynchronous OS callback
pub mod reconcile;

/// Pending-action registry
pub mod registry;

// Prelude module for common imports
pub mod prelude {
    //! Common imports for permission_broker users
    //!
    //! Use `use permission_broker::prelude::*;` to import commonly used types.

    pub use crate::action::{Outcome, ResultAction};
    pub use crate::broker::{PermissionBroker, REQUEST_CODE};
    pub use crate::dialog::{
        DialogCallback, DialogChoice, DialogPresenter, DialogSpec, DialogStrings,
    };
    pub use crate::error::BrokerError;
    pub use crate::events::{GrantResult, PermissionResponse};
    pub use crate::groups::PermissionGroup;
    pub use crate::host::{
        NoQuirks, PermissionHost, QuirkOracle, SettingsNavigator, SettingsRoute,
    };
    pub use crate::planner::{KnownPermissions, RequestPlanner};
    pub use crate::reconcile::{Reconciliation, ResultReconciler};
    pub use crate::registry::PendingActions;
}
