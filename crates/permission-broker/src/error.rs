//! Error types for the permission broker
//!
//! This module defines the error hierarchy for the crate using `thiserror`.
//! Fallible broker operations return `Result<T, BrokerError>`.
//!
//! Per the error-handling design, most permission outcomes are *not* errors:
//! a detached host screen makes entry points no-op, and a permission unknown
//! to the platform is treated as always granted. The variants below cover
//! the genuinely exceptional paths only.
//!
//! # Example
//!
//! ```rust
//! use permission_broker::error::BrokerError;
//!
//! fn parse(payload: &str) -> Result<serde_json::Value, BrokerError> {
//!     // Auto-conversion from serde_json::Error
//!     Ok(serde_json::from_str(payload)?)
//! }
//! ```

use thiserror::Error;

/// The main error type for all permission-broker operations
///
/// One variant supports automatic conversion via the `?` operator:
/// - `Payload` from `serde_json::Error`
#[derive(Error, Debug)]
pub enum BrokerError {
    /// The OEM quirk oracle failed while probing a permission
    ///
    /// This typically means the platform-specific authoritative check (which
    /// may shell out to a system property reader) could not be queried. The
    /// reconciler catches this, logs it, and conservatively treats the
    /// permission as granted so a broken quirk detector never blocks the user.
    #[error("quirk oracle probe failed: {0}")]
    QuirkProbe(String),

    /// The OS settings screen could not be opened
    ///
    /// Raised by a [`SettingsNavigator`](crate::host::SettingsNavigator)
    /// implementation when the navigation intent cannot be resolved. The
    /// accept path logs this and still delivers the denial report.
    #[error("failed to open settings screen: {0}")]
    Navigation(String),

    /// The escalation dialog could not be presented
    ///
    /// Raised by a [`DialogPresenter`](crate::dialog::DialogPresenter)
    /// implementation. The broker falls back to the plain notify path.
    #[error("failed to present dialog: {0}")]
    Dialog(String),

    /// Failed to parse a host-bridge callback payload
    ///
    /// This error is automatically converted from `serde_json::Error` when
    /// decoding the serialized `(request_id, permissions, results)` callback
    /// delivered by the host bridge.
    #[error("failed to parse callback payload: {0}")]
    Payload(#[from] serde_json::Error),
}
