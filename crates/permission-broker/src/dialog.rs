//! Settings-redirect dialog: value objects and escalation decision.
//!
//! When a permission comes back permanently denied ("never ask again"), the
//! broker may show one dialog per batch offering a jump to the OS settings
//! screen. This module builds the [`DialogSpec`] for a batch and defines the
//! [`DialogPresenter`] capability that the host's rendering widget
//! implements. Building can legitimately yield `None`: some permission
//! categories are intentionally left without a dialog and a permanent denial
//! is then reported like a plain one.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BrokerError;
use crate::groups::PermissionGroup;

/// Default dialog title template.
pub const DEFAULT_TITLE: &str = "{app} permission request";
/// Default confirm-button label.
pub const DEFAULT_OK: &str = "Go to settings";
/// Default cancel-button label.
pub const DEFAULT_CANCEL: &str = "Cancel";
/// Fallback message when no description is known for any permission in the batch.
pub const GENERIC_MESSAGE: &str =
    "{app} needs additional permissions. Please enable them in settings.";

/// One piece of dialog text: fixed, or a template with app-name substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogText {
    /// Fixed string, used verbatim
    Plain(String),
    /// Template with `{app}` replaced by the application label
    Template(String),
}

impl DialogText {
    /// Resolve the text against the application label
    pub fn resolve(&self, app_label: &str) -> String {
        match self {
            DialogText::Plain(s) => s.clone(),
            DialogText::Template(t) => t.replace("{app}", app_label),
        }
    }
}

/// Caller-supplied dialog button callback.
pub type DialogCallback = Arc<dyn Fn() + Send + Sync>;

/// The settings-redirect dialog for one request batch
///
/// Built once per batch that needs it, immutable after construction, owned
/// by the pending reconciliation pass and discarded after the dialog closes.
///
/// # Examples
///
/// ```
/// use permission_broker::dialog::DialogSpec;
///
/// let spec = DialogSpec::with_message("Camera access is required.");
/// let strings = spec.resolve("MyApp");
/// assert_eq!(strings.message, "Camera access is required.");
/// assert!(strings.title.contains("MyApp"));
/// ```
#[derive(Clone)]
pub struct DialogSpec {
    message: DialogText,
    title: DialogText,
    ok: DialogText,
    cancel: DialogText,
    on_accept: Option<DialogCallback>,
    on_cancel: Option<DialogCallback>,
}

impl DialogSpec {
    /// Create a spec with a fixed message and default title/button texts
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: DialogText::Plain(message.into()),
            title: DialogText::Template(DEFAULT_TITLE.to_string()),
            ok: DialogText::Plain(DEFAULT_OK.to_string()),
            cancel: DialogText::Plain(DEFAULT_CANCEL.to_string()),
            on_accept: None,
            on_cancel: None,
        }
    }

    /// Create a spec with a `{app}` message template and default texts
    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            message: DialogText::Template(template.into()),
            ..Self::with_message("")
        }
    }

    /// Attach a callback run when the user accepts the dialog
    pub fn on_accept(mut self, callback: DialogCallback) -> Self {
        self.on_accept = Some(callback);
        self
    }

    /// Attach a callback run when the user cancels the dialog
    pub fn on_cancel(mut self, callback: DialogCallback) -> Self {
        self.on_cancel = Some(callback);
        self
    }

    /// Resolve all texts against the application label
    pub fn resolve(&self, app_label: &str) -> DialogStrings {
        DialogStrings {
            title: self.title.resolve(app_label),
            message: self.message.resolve(app_label),
            ok: self.ok.resolve(app_label),
            cancel: self.cancel.resolve(app_label),
        }
    }

    /// Run the caller's accept callback, if any
    pub(crate) fn run_accept(&self) {
        if let Some(cb) = &self.on_accept {
            cb();
        }
    }

    /// Run the caller's cancel callback, if any
    pub(crate) fn run_cancel(&self) {
        if let Some(cb) = &self.on_cancel {
            cb();
        }
    }
}

impl fmt::Debug for DialogSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogSpec")
            .field("message", &self.message)
            .field("title", &self.title)
            .field("has_accept_cb", &self.on_accept.is_some())
            .field("has_cancel_cb", &self.on_cancel.is_some())
            .finish()
    }
}

/// Fully resolved dialog texts handed to the rendering widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogStrings {
    /// Dialog title
    pub title: String,
    /// Dialog body
    pub message: String,
    /// Confirm-button label
    pub ok: String,
    /// Cancel-button label
    pub cancel: String,
}

/// The user's choice on the settings-redirect dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogChoice {
    /// Jump to settings
    Accept,
    /// Dismiss, keep the denial
    Cancel,
}

/// Capability that renders one dialog and resolves with the user's choice
///
/// Presentation suspends only in the sense that it waits for a human; the
/// broker awaits the choice outside its mutual-exclusion domain.
#[async_trait]
pub trait DialogPresenter: Send + Sync {
    /// Show the dialog and wait for the user's choice
    async fn present(&self, dialog: DialogStrings) -> Result<DialogChoice, BrokerError>;
}

/// Build the escalation dialog for the permission groups of one batch
///
/// `groups` must already be filtered to the groups that still need
/// prompting. Single-group batches get a group-specific message when the
/// group has a description and `None` otherwise; multi-group batches get a
/// comma-joined message of all known descriptions, or the generic fallback
/// when none are known. `None` means "no prompt, just report denial".
pub fn build_group_dialog(groups: &[PermissionGroup]) -> Option<DialogSpec> {
    let tips: Vec<&str> = groups.iter().filter_map(|g| g.description()).collect();

    match groups {
        [] => None,
        [single] => match single {
            PermissionGroup::Camera | PermissionGroup::Microphone => {
                Some(DialogSpec::with_message(tip_message(&tips)))
            }
            // Categories intentionally left without a dialog.
            _ => None,
        },
        _ => {
            if tips.is_empty() {
                Some(DialogSpec::with_template(GENERIC_MESSAGE.to_string()))
            } else {
                Some(DialogSpec::with_message(tip_message(&tips)))
            }
        }
    }
}

fn tip_message(tips: &[&str]) -> String {
    format!(
        "Please allow {} access in settings to continue.",
        tips.join(", ")
    )
}
