//! Abstract permission groups and static platform tables.
//!
//! Callers request app-level capabilities ("storage", "camera") rather than
//! raw OS permission strings; each group expands to one or more identifiers
//! via [`PermissionGroup::raw_permissions`]. This module also carries the
//! static description table used both for escalation classification and for
//! dialog text, and the baseline table of permission identifiers known to
//! the supported platform release.

use crate::planner::KnownPermissions;

/// OS permission identifier for coarse location.
pub const ACCESS_COARSE_LOCATION: &str = "android.permission.ACCESS_COARSE_LOCATION";
/// OS permission identifier for fine location.
pub const ACCESS_FINE_LOCATION: &str = "android.permission.ACCESS_FINE_LOCATION";
/// OS permission identifier for extra location provider commands.
pub const ACCESS_LOCATION_EXTRA_COMMANDS: &str =
    "android.permission.ACCESS_LOCATION_EXTRA_COMMANDS";
/// OS permission identifier for the camera.
pub const CAMERA: &str = "android.permission.CAMERA";
/// OS permission identifier for account enumeration.
pub const GET_ACCOUNTS: &str = "android.permission.GET_ACCOUNTS";
/// OS permission identifier for reading contacts.
pub const READ_CONTACTS: &str = "android.permission.READ_CONTACTS";
/// OS permission identifier for reading external storage.
pub const READ_EXTERNAL_STORAGE: &str = "android.permission.READ_EXTERNAL_STORAGE";
/// OS permission identifier for reading phone state.
pub const READ_PHONE_STATE: &str = "android.permission.READ_PHONE_STATE";
/// OS permission identifier for reading SMS.
pub const READ_SMS: &str = "android.permission.READ_SMS";
/// OS permission identifier for the microphone.
pub const RECORD_AUDIO: &str = "android.permission.RECORD_AUDIO";
/// OS permission identifier for writing external storage.
pub const WRITE_EXTERNAL_STORAGE: &str = "android.permission.WRITE_EXTERNAL_STORAGE";

/// App-level abstract capability request
///
/// Each group maps to one or more OS permission strings; requesting a group
/// requests the whole underlying set in one batch.
///
/// # Examples
///
/// ```
/// use permission_broker::groups::PermissionGroup;
///
/// let perms = PermissionGroup::Location.raw_permissions();
/// assert_eq!(perms.len(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionGroup {
    /// Read contacts and account list
    Contacts,
    /// Read phone state
    Phone,
    /// Camera access
    Camera,
    /// Coarse + fine location and extra provider commands
    Location,
    /// Read + write external storage
    Storage,
    /// Audio recording
    Microphone,
    /// Read SMS
    Sms,
}

impl PermissionGroup {
    /// The OS permission strings this group expands to
    pub fn raw_permissions(self) -> &'static [&'static str] {
        match self {
            PermissionGroup::Contacts => &[READ_CONTACTS, GET_ACCOUNTS],
            PermissionGroup::Phone => &[READ_PHONE_STATE],
            PermissionGroup::Camera => &[CAMERA],
            PermissionGroup::Location => &[
                ACCESS_COARSE_LOCATION,
                ACCESS_FINE_LOCATION,
                ACCESS_LOCATION_EXTRA_COMMANDS,
            ],
            PermissionGroup::Storage => &[READ_EXTERNAL_STORAGE, WRITE_EXTERNAL_STORAGE],
            PermissionGroup::Microphone => &[RECORD_AUDIO],
            PermissionGroup::Sms => &[READ_SMS],
        }
    }

    /// Human-readable description shown in the escalation dialog, if the
    /// group has one configured
    ///
    /// Some groups are intentionally left without a description: for those,
    /// no settings-redirect dialog is ever shown and a permanent denial is
    /// reported like a plain one.
    pub fn description(self) -> Option<&'static str> {
        match self {
            PermissionGroup::Camera => Some("camera"),
            PermissionGroup::Storage => Some("storage"),
            PermissionGroup::Microphone => Some("microphone"),
            PermissionGroup::Contacts
            | PermissionGroup::Phone
            | PermissionGroup::Location
            | PermissionGroup::Sms => None,
        }
    }
}

/// Expand a sequence of groups into the flat OS permission list, preserving
/// group order
///
/// Duplicates are kept as-is: overlapping groups may legitimately name the
/// same permission and the planner tolerates repeats.
pub fn raw_permissions(groups: &[PermissionGroup]) -> Vec<String> {
    groups
        .iter()
        .flat_map(|g| g.raw_permissions().iter().map(|p| p.to_string()))
        .collect()
}

/// Look up the user-facing description for a raw OS permission string
///
/// A permission with no description here never enters the escalation set:
/// there is nothing meaningful to show the user about it.
pub fn permission_description(permission: &str) -> Option<&'static str> {
    match permission {
        ACCESS_COARSE_LOCATION | ACCESS_FINE_LOCATION => Some("location"),
        READ_SMS => Some("SMS"),
        READ_CONTACTS => Some("contacts"),
        CAMERA => Some("camera"),
        RECORD_AUDIO => Some("microphone"),
        READ_PHONE_STATE => Some("phone state"),
        READ_EXTERNAL_STORAGE | WRITE_EXTERNAL_STORAGE => Some("storage"),
        _ => None,
    }
}

/// Baseline table of permission identifiers declared by the supported
/// platform release
///
/// An identifier absent from this table is treated as "does not exist on
/// this OS version", never as denied. Hosts targeting a different release
/// construct their own [`KnownPermissions`] snapshot instead.
pub const BASELINE_PERMISSIONS: &[&str] = &[
    ACCESS_COARSE_LOCATION,
    ACCESS_FINE_LOCATION,
    ACCESS_LOCATION_EXTRA_COMMANDS,
    CAMERA,
    GET_ACCOUNTS,
    READ_CONTACTS,
    READ_EXTERNAL_STORAGE,
    READ_PHONE_STATE,
    READ_SMS,
    RECORD_AUDIO,
    WRITE_EXTERNAL_STORAGE,
    "android.permission.INTERNET",
    "android.permission.ACCESS_NETWORK_STATE",
    "android.permission.ACCESS_WIFI_STATE",
    "android.permission.VIBRATE",
    "android.permission.WAKE_LOCK",
];

/// Build the [`KnownPermissions`] snapshot for the supported platform release
pub fn baseline_known_permissions() -> KnownPermissions {
    KnownPermissions::from_iter(BASELINE_PERMISSIONS.iter().copied())
}
