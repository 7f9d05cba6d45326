//! Legacy notification mapping
//!
//! One accepted mutation produces an ordered list of outbound legacy
//! notifications followed by exactly one modern event. The mapping from
//! (changed field, new value) to legacy messages is a pure function kept
//! here so it can be audited and tested in isolation from the state store.

use serde_json::Value;

use devctx_core::events::{ConfigField, FolderField, LegacyField};
use devctx_core::types::{ProjectFolder, ToolchainConfig};

/// One message bound for the deprecated single-field channel.
///
/// `value` is the loosely-typed legacy payload; `None` means the field is
/// now unset (and deletes the persisted key, when persistence is on).
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyNotification {
    pub field: LegacyField,
    pub value: Option<Value>,
}

impl LegacyNotification {
    fn new(field: LegacyField, value: Option<Value>) -> Self {
        Self { field, value }
    }
}

fn serialize<T: serde::Serialize>(value: &T) -> Option<Value> {
    serde_json::to_value(value).ok()
}

/// Legacy messages for one changed folder field, in required firing order.
///
/// - `selectedTarget` bridges to the split legacy view: the canonical id
///   first, then the resolved details. An identifier-only selection still
///   fires both, with the details side absent (details cannot be
///   synthesized from an identifier).
/// - `selectedPort` bridges only values the legacy channel can represent:
///   absent or fully resolved. Identifier-only ports fire nothing.
/// - `selectedSecondaryTool`, `customOptionsString`, and `path` have no
///   legacy equivalent.
pub fn folder_legacy_notifications(
    field: FolderField,
    folder: &ProjectFolder,
) -> Vec<LegacyNotification> {
    match field {
        FolderField::SelectedTarget => vec![
            LegacyNotification::new(
                LegacyField::TargetId,
                folder.target_id().map(|id| Value::String(id.to_string())),
            ),
            LegacyNotification::new(
                LegacyField::TargetDetails,
                folder.target_details().and_then(serialize),
            ),
        ],
        FolderField::SelectedPort => match &folder.selected_port {
            None => vec![LegacyNotification::new(LegacyField::Port, None)],
            Some(port) => match port.details() {
                Some(details) => vec![LegacyNotification::new(
                    LegacyField::Port,
                    serialize(&details),
                )],
                // identifier-only: suppressed from the legacy channel
                None => Vec::new(),
            },
        },
        FolderField::LatestBuildSummary => vec![LegacyNotification::new(
            LegacyField::LatestBuildSummary,
            folder.latest_build_summary.as_ref().and_then(serialize),
        )],
        FolderField::SelectedSecondaryTool
        | FolderField::CustomOptionsString
        | FolderField::Path => Vec::new(),
    }
}

/// Legacy message for one changed config field. Config fields map 1:1.
pub fn config_legacy_notification(
    field: ConfigField,
    config: &ToolchainConfig,
) -> LegacyNotification {
    match field {
        ConfigField::UserDirPath => LegacyNotification::new(
            LegacyField::UserDirPath,
            config.user_dir_path.clone().map(Value::String),
        ),
        ConfigField::DataDirPath => LegacyNotification::new(
            LegacyField::DataDirPath,
            config.data_dir_path.clone().map(Value::String),
        ),
    }
}
