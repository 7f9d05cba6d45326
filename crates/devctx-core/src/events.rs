//! Update requests and change events
//!
//! Producers push untrusted JSON payloads through the broker's single
//! update entry point. [`UpdateParams::parse`] classifies such a payload
//! into one of the accepted request shapes without ever panicking; the
//! `is_*` predicates are pure and side-effect free. Classification tries
//! the shapes in a fixed priority order and the first match wins, so the
//! dispatcher downstream has a closed set of cases to switch over.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{ProjectFolder, ToolchainConfig};

// ─────────────────────────────────────────────────────────
// Field Names
// ─────────────────────────────────────────────────────────

/// Fields of [`ToolchainConfig`] that can appear in a config update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfigField {
    UserDirPath,
    DataDirPath,
}

impl ConfigField {
    pub const ALL: [ConfigField; 2] = [ConfigField::UserDirPath, ConfigField::DataDirPath];

    /// The wire name of this field.
    pub fn as_key(&self) -> &'static str {
        match self {
            ConfigField::UserDirPath => "userDirPath",
            ConfigField::DataDirPath => "dataDirPath",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.as_key() == key)
    }
}

/// Fields of [`ProjectFolder`] that can appear in a folder-fields update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FolderField {
    Path,
    SelectedTarget,
    SelectedPort,
    SelectedSecondaryTool,
    LatestBuildSummary,
    CustomOptionsString,
}

impl FolderField {
    pub const ALL: [FolderField; 6] = [
        FolderField::Path,
        FolderField::SelectedTarget,
        FolderField::SelectedPort,
        FolderField::SelectedSecondaryTool,
        FolderField::LatestBuildSummary,
        FolderField::CustomOptionsString,
    ];

    /// The wire name of this field.
    pub fn as_key(&self) -> &'static str {
        match self {
            FolderField::Path => "path",
            FolderField::SelectedTarget => "selectedTarget",
            FolderField::SelectedPort => "selectedPort",
            FolderField::SelectedSecondaryTool => "selectedSecondaryTool",
            FolderField::LatestBuildSummary => "latestBuildSummary",
            FolderField::CustomOptionsString => "customOptionsString",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.as_key() == key)
    }
}

/// The deprecated flat-state field names, kept for consumers of the first
/// contract generation. `targetId`/`targetDetails` are the split view of
/// the selected target; `folderPath` is the current folder's path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LegacyField {
    FolderPath,
    TargetId,
    TargetDetails,
    Port,
    LatestBuildSummary,
    UserDirPath,
    DataDirPath,
}

impl LegacyField {
    pub const ALL: [LegacyField; 7] = [
        LegacyField::FolderPath,
        LegacyField::TargetId,
        LegacyField::TargetDetails,
        LegacyField::Port,
        LegacyField::LatestBuildSummary,
        LegacyField::UserDirPath,
        LegacyField::DataDirPath,
    ];

    /// The wire name of this field.
    pub fn as_key(&self) -> &'static str {
        match self {
            LegacyField::FolderPath => "folderPath",
            LegacyField::TargetId => "targetId",
            LegacyField::TargetDetails => "targetDetails",
            LegacyField::Port => "port",
            LegacyField::LatestBuildSummary => "latestBuildSummary",
            LegacyField::UserDirPath => "userDirPath",
            LegacyField::DataDirPath => "dataDirPath",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.as_key() == key)
    }
}

// ─────────────────────────────────────────────────────────
// Change Events
// ─────────────────────────────────────────────────────────

/// A change to `object`, with the names of the fields that changed.
///
/// Every entry of `changed_properties` is a real field of the snapshot's
/// type; the typed field enums make anything else unrepresentable.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent<T, F> {
    /// The new state of the object.
    pub object: T,
    /// The fields that changed in `object`, in producer order.
    pub changed_properties: Vec<F>,
}

/// A config update or the modern config change notification.
pub type ConfigChangeEvent = ChangeEvent<ToolchainConfig, ConfigField>;

/// A folder-fields update or the modern per-folder change notification.
pub type FolderChangeEvent = ChangeEvent<ProjectFolder, FolderField>;

/// The modern notification for folder-set membership transitions. Carries
/// only the delta; the full membership is read from the facade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderSetChange {
    pub added_paths: Vec<String>,
    pub removed_paths: Vec<String>,
}

// ─────────────────────────────────────────────────────────
// Update Requests
// ─────────────────────────────────────────────────────────

/// A folder-set update: the complete desired membership plus the delta the
/// producer claims it represents. Full-replace, not an incremental merge.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderSetParams {
    pub opened_folders: Vec<ProjectFolder>,
    pub added_paths: Vec<String>,
    pub removed_paths: Vec<String>,
}

/// A current-folder selection update. `None` clears the selection.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentFolderParams {
    pub current_folder: Option<ProjectFolder>,
}

/// The deprecated flat-state update shape: one legacy field plus a value.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LegacyParams {
    pub key: LegacyField,
    pub value: Value,
}

/// An update payload classified into one of the accepted request shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateParams {
    Config(ConfigChangeEvent),
    CurrentFolder(CurrentFolderParams),
    FolderSet(FolderSetParams),
    FolderFields(FolderChangeEvent),
    Legacy(LegacyParams),
}

impl UpdateParams {
    /// Classify an untrusted payload, trying the accepted shapes in fixed
    /// priority order: config, current-folder, folder-set, folder-fields,
    /// legacy flat-state. Returns `None` when nothing matches.
    pub fn parse(value: &Value) -> Option<UpdateParams> {
        if is_config_update(value) {
            if let Ok(params) = serde_json::from_value(value.clone()) {
                return Some(UpdateParams::Config(params));
            }
        }
        if is_current_folder_params(value) {
            if let Ok(params) = serde_json::from_value(value.clone()) {
                return Some(UpdateParams::CurrentFolder(params));
            }
        }
        if is_folder_set_params(value) {
            if let Ok(params) = serde_json::from_value(value.clone()) {
                return Some(UpdateParams::FolderSet(params));
            }
        }
        if is_folder_fields_update(value) {
            if let Ok(params) = serde_json::from_value(value.clone()) {
                return Some(UpdateParams::FolderFields(params));
            }
        }
        if is_legacy_params(value) {
            if let Ok(params) = serde_json::from_value(value.clone()) {
                return Some(UpdateParams::Legacy(params));
            }
        }
        None
    }
}

// ─────────────────────────────────────────────────────────
// Shape Predicates
// ─────────────────────────────────────────────────────────

fn as_object(value: &Value) -> Option<&Map<String, Value>> {
    value.as_object()
}

/// Key present with a string value.
fn string_entry(object: &Map<String, Value>, key: &str) -> bool {
    matches!(object.get(key), Some(Value::String(_)))
}

/// Key present with a string or null value.
fn nullable_string_entry(object: &Map<String, Value>, key: &str) -> bool {
    matches!(object.get(key), Some(Value::String(_)) | Some(Value::Null))
}

/// Key absent, null, or a string.
fn optional_string_entry(object: &Map<String, Value>, key: &str) -> bool {
    matches!(
        object.get(key),
        None | Some(Value::Null) | Some(Value::String(_))
    )
}

/// Key absent, or an array whose elements all satisfy `element`.
fn optional_array_entry(
    object: &Map<String, Value>,
    key: &str,
    element: impl Fn(&Value) -> bool,
) -> bool {
    match object.get(key) {
        None => true,
        Some(Value::Array(items)) => items.iter().all(element),
        Some(_) => false,
    }
}

/// Key absent, or an object whose values are all strings.
fn optional_string_map_entry(object: &Map<String, Value>, key: &str) -> bool {
    match object.get(key) {
        None => true,
        Some(Value::Object(entries)) => entries.values().all(Value::is_string),
        Some(_) => false,
    }
}

fn string_array(value: &Value) -> bool {
    matches!(value, Value::Array(items) if items.iter().all(Value::is_string))
}

/// Config object: both directory-path keys present, each string or null.
pub fn is_config_object(value: &Value) -> bool {
    let Some(object) = as_object(value) else {
        return false;
    };
    nullable_string_entry(object, "userDirPath") && nullable_string_entry(object, "dataDirPath")
}

/// Config update: a config object plus changed config field names.
pub fn is_config_update(value: &Value) -> bool {
    let Some(object) = as_object(value) else {
        return false;
    };
    let Some(config) = object.get("object") else {
        return false;
    };
    let Some(Value::Array(changed)) = object.get("changedProperties") else {
        return false;
    };
    is_config_object(config)
        && changed
            .iter()
            .all(|key| key.as_str().is_some_and(|key| ConfigField::from_key(key).is_some()))
}

/// Lightweight target identifier: a name plus an optional canonical id.
pub fn is_target_identifier(value: &Value) -> bool {
    let Some(object) = as_object(value) else {
        return false;
    };
    string_entry(object, "name") && optional_string_entry(object, "id")
}

/// Resolved target details: non-empty id, name, and the secondary-tool
/// list. The remaining fields are optional on the wire.
pub fn is_target_details(value: &Value) -> bool {
    let Some(object) = as_object(value) else {
        return false;
    };
    object
        .get("id")
        .and_then(Value::as_str)
        .is_some_and(|id| !id.is_empty())
        && string_entry(object, "name")
        && matches!(
            object.get("secondaryTools"),
            Some(Value::Array(tools)) if tools.iter().all(is_secondary_tool)
        )
        && optional_string_map_entry(object, "buildProperties")
}

pub fn is_secondary_tool(value: &Value) -> bool {
    let Some(object) = as_object(value) else {
        return false;
    };
    string_entry(object, "id") && string_entry(object, "name") && string_entry(object, "platform")
}

/// Address-only port identifier.
pub fn is_port_identifier(value: &Value) -> bool {
    let Some(object) = as_object(value) else {
        return false;
    };
    string_entry(object, "address") && optional_string_entry(object, "protocol")
}

/// Fully resolved port details.
pub fn is_port_details(value: &Value) -> bool {
    let Some(object) = as_object(value) else {
        return false;
    };
    string_entry(object, "address")
        && string_entry(object, "label")
        && string_entry(object, "protocol")
        && string_entry(object, "protocolLabel")
        && optional_string_map_entry(object, "properties")
        && optional_string_entry(object, "hardwareId")
}

pub fn is_build_summary(value: &Value) -> bool {
    let Some(object) = as_object(value) else {
        return false;
    };
    string_entry(object, "outputPath")
        && optional_array_entry(object, "usedLibraries", |library| {
            as_object(library).is_some_and(|library| string_entry(library, "name"))
        })
        && optional_array_entry(object, "sectionSizes", |section| {
            as_object(section).is_some_and(|section| {
                string_entry(section, "name") && section.get("size").is_some_and(Value::is_i64)
            })
        })
        && optional_string_map_entry(object, "buildProperties")
        && ["targetPlatform", "buildPlatform"].iter().all(|key| {
            matches!(object.get(*key), None | Some(Value::Null))
                || object.get(*key).is_some_and(is_platform_descriptor)
        })
}

fn is_platform_descriptor(value: &Value) -> bool {
    as_object(value).is_some_and(|descriptor| string_entry(descriptor, "id"))
}

/// Folder shape: all six folder keys must be present; each sub-state field
/// is null or matches its identifier/details shape.
pub fn is_folder(value: &Value) -> bool {
    let Some(object) = as_object(value) else {
        return false;
    };
    let sub_state_ok = |key: &str, accepts: &dyn Fn(&Value) -> bool| match object.get(key) {
        Some(Value::Null) => true,
        Some(value) => accepts(value),
        None => false,
    };
    string_entry(object, "path")
        && sub_state_ok("selectedTarget", &|value| {
            is_target_details(value) || is_target_identifier(value)
        })
        && sub_state_ok("selectedPort", &|value| {
            is_port_details(value) || is_port_identifier(value)
        })
        && sub_state_ok("selectedSecondaryTool", &|value| {
            value.is_string() || is_secondary_tool(value)
        })
        && sub_state_ok("latestBuildSummary", &is_build_summary)
        && sub_state_ok("customOptionsString", &Value::is_string)
}

/// Folder-set update: complete membership plus added/removed path arrays.
pub fn is_folder_set_params(value: &Value) -> bool {
    let Some(object) = as_object(value) else {
        return false;
    };
    matches!(
        object.get("openedFolders"),
        Some(Value::Array(folders)) if folders.iter().all(is_folder)
    ) && object.get("addedPaths").is_some_and(string_array)
        && object.get("removedPaths").is_some_and(string_array)
}

/// Current-folder selection update: the `currentFolder` key must be
/// present; null clears the selection.
pub fn is_current_folder_params(value: &Value) -> bool {
    let Some(object) = as_object(value) else {
        return false;
    };
    match object.get("currentFolder") {
        Some(Value::Null) => true,
        Some(folder) => is_folder(folder),
        None => false,
    }
}

/// Folder-fields update: a folder snapshot plus changed folder field names.
pub fn is_folder_fields_update(value: &Value) -> bool {
    let Some(object) = as_object(value) else {
        return false;
    };
    let Some(folder) = object.get("object") else {
        return false;
    };
    let Some(Value::Array(changed)) = object.get("changedProperties") else {
        return false;
    };
    is_folder(folder)
        && changed
            .iter()
            .all(|key| key.as_str().is_some_and(|key| FolderField::from_key(key).is_some()))
}

/// Deprecated flat-state update: one legacy field name plus a value key.
pub fn is_legacy_params(value: &Value) -> bool {
    let Some(object) = as_object(value) else {
        return false;
    };
    object
        .get("key")
        .and_then(Value::as_str)
        .is_some_and(|key| LegacyField::from_key(key).is_some())
        && object.contains_key("value")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn folder_json(path: &str) -> Value {
        json!({
            "path": path,
            "selectedTarget": {
                "id": "vendor:arch:model",
                "name": "Model Board",
                "secondaryTools": [
                    { "id": "t1", "name": "Tool One", "platform": "vendor:arch" }
                ],
                "buildProperties": { "build.arch": "xtensa" }
            },
            "selectedPort": {
                "address": "/dev/ttyACM0",
                "label": "/dev/ttyACM0 (Serial)",
                "protocol": "serial",
                "protocolLabel": "Serial Port",
                "properties": { "vid": "0x2341" }
            },
            "selectedSecondaryTool": "t1",
            "latestBuildSummary": {
                "outputPath": "/tmp/build",
                "usedLibraries": [],
                "sectionSizes": [ { "name": "text", "size": 4096, "maxSize": 32256 } ],
                "buildProperties": {}
            },
            "customOptionsString": "opt1=value1"
        })
    }

    #[test]
    fn test_is_config_object_table() {
        let cases: Vec<(Value, bool)> = vec![
            (Value::Null, false),
            (json!({ "other": "value" }), false),
            (json!({ "userDirPath": "path" }), false),
            (json!({ "dataDirPath": "path" }), false),
            (json!({ "userDirPath": true, "dataDirPath": 420 }), false),
            (json!({ "userDirPath": null, "dataDirPath": null }), true),
            (json!({ "userDirPath": null, "dataDirPath": "path" }), true),
            (json!({ "userDirPath": "path", "dataDirPath": "path" }), true),
        ];
        for (input, expected) in cases {
            assert_eq!(is_config_object(&input), expected, "input: {input}");
        }
    }

    #[test]
    fn test_is_target_details_requires_non_empty_id() {
        assert!(!is_target_details(
            &json!({ "name": "ABC", "secondaryTools": [] })
        ));
        assert!(!is_target_details(
            &json!({ "name": "ABC", "id": null, "secondaryTools": [] })
        ));
        assert!(!is_target_details(
            &json!({ "name": "ABC", "id": "", "secondaryTools": [] })
        ));
        assert!(is_target_details(
            &json!({ "name": "ABC", "id": "a:b:c", "secondaryTools": [] })
        ));
        // missing tool list degrades to an identifier, not details
        assert!(!is_target_details(&json!({ "name": "ABC", "id": "a:b:c" })));
        assert!(is_target_identifier(&json!({ "name": "ABC", "id": "a:b:c" })));
    }

    #[test]
    fn test_is_folder_requires_every_key() {
        let folder = folder_json("/projects/blink");
        assert!(is_folder(&folder));

        for key in [
            "path",
            "selectedTarget",
            "selectedPort",
            "selectedSecondaryTool",
            "latestBuildSummary",
            "customOptionsString",
        ] {
            let mut copy = folder.clone();
            copy.as_object_mut().unwrap().remove(key);
            assert!(!is_folder(&copy), "missing '{key}' should fail");
        }
    }

    #[test]
    fn test_is_folder_rejects_wrong_value_types() {
        let folder = folder_json("/projects/blink");
        for key in [
            "path",
            "selectedTarget",
            "selectedPort",
            "selectedSecondaryTool",
            "latestBuildSummary",
            "customOptionsString",
        ] {
            let mut copy = folder.clone();
            copy.as_object_mut().unwrap()[key] = json!(36);
            assert!(!is_folder(&copy), "invalid '{key}' should fail");
        }
    }

    #[test]
    fn test_is_folder_accepts_absent_sub_state() {
        assert!(is_folder(&json!({
            "path": "/projects/blink",
            "selectedTarget": null,
            "selectedPort": null,
            "selectedSecondaryTool": null,
            "latestBuildSummary": null,
            "customOptionsString": null
        })));
    }

    #[test]
    fn test_is_folder_set_params() {
        let valid = json!({
            "openedFolders": [folder_json("/p1")],
            "addedPaths": ["/p1"],
            "removedPaths": []
        });
        assert!(is_folder_set_params(&valid));

        for key in ["openedFolders", "addedPaths", "removedPaths"] {
            let mut copy = valid.clone();
            copy.as_object_mut().unwrap().remove(key);
            assert!(!is_folder_set_params(&copy), "missing '{key}' should fail");

            let mut copy = valid.clone();
            copy.as_object_mut().unwrap()[key] = json!([{ "other": "value" }]);
            assert!(!is_folder_set_params(&copy), "invalid '{key}' should fail");
        }
    }

    #[test]
    fn test_is_current_folder_params() {
        assert!(is_current_folder_params(
            &json!({ "currentFolder": folder_json("/p1") })
        ));
        assert!(is_current_folder_params(&json!({ "currentFolder": null })));
        assert!(!is_current_folder_params(&json!({})));
        assert!(!is_current_folder_params(
            &json!({ "currentFolder": "/p1" })
        ));
    }

    #[test]
    fn test_is_folder_fields_update() {
        let valid = json!({
            "object": folder_json("/p1"),
            "changedProperties": ["selectedTarget", "selectedPort"]
        });
        assert!(is_folder_fields_update(&valid));

        assert!(is_folder_fields_update(&json!({
            "object": folder_json("/p1"),
            "changedProperties": []
        })));

        assert!(!is_folder_fields_update(&json!({
            "object": folder_json("/p1"),
            "changedProperties": ["somethingElse"]
        })));
    }

    #[test]
    fn test_is_legacy_params() {
        assert!(is_legacy_params(
            &json!({ "key": "targetId", "value": "a:b:c" })
        ));
        assert!(is_legacy_params(&json!({ "key": "port", "value": null })));
        assert!(!is_legacy_params(&json!({ "key": "unknown", "value": 1 })));
        assert!(!is_legacy_params(&json!({ "key": "targetId" })));
    }

    #[test]
    fn test_parse_priority_and_classification() {
        let config = json!({
            "object": { "userDirPath": null, "dataDirPath": "/data" },
            "changedProperties": ["dataDirPath"]
        });
        assert!(matches!(
            UpdateParams::parse(&config),
            Some(UpdateParams::Config(_))
        ));

        let selection = json!({ "currentFolder": folder_json("/p1") });
        assert!(matches!(
            UpdateParams::parse(&selection),
            Some(UpdateParams::CurrentFolder(_))
        ));

        let folder_set = json!({
            "openedFolders": [folder_json("/p1")],
            "addedPaths": ["/p1"],
            "removedPaths": []
        });
        assert!(matches!(
            UpdateParams::parse(&folder_set),
            Some(UpdateParams::FolderSet(_))
        ));

        let folder_fields = json!({
            "object": folder_json("/p1"),
            "changedProperties": ["selectedPort"]
        });
        assert!(matches!(
            UpdateParams::parse(&folder_fields),
            Some(UpdateParams::FolderFields(_))
        ));

        let legacy = json!({ "key": "dataDirPath", "value": "/data" });
        assert!(matches!(
            UpdateParams::parse(&legacy),
            Some(UpdateParams::Legacy(_))
        ));

        assert_eq!(UpdateParams::parse(&json!({ "mystery": "♥" })), None);
        assert_eq!(UpdateParams::parse(&Value::Null), None);
    }

    #[test]
    fn test_parse_converts_typed_unions() {
        let folder_fields = json!({
            "object": {
                "path": "/p1",
                "selectedTarget": { "name": "Model Board", "id": null },
                "selectedPort": { "address": "COM2", "protocol": "serial" },
                "selectedSecondaryTool": null,
                "latestBuildSummary": null,
                "customOptionsString": null
            },
            "changedProperties": ["selectedTarget"]
        });
        let Some(UpdateParams::FolderFields(event)) = UpdateParams::parse(&folder_fields) else {
            panic!("expected a folder-fields update");
        };
        let target = event.object.selected_target.as_ref().unwrap();
        assert!(target.details().is_none());
        assert_eq!(target.canonical_id(), None);
        assert!(event.object.selected_port.as_ref().unwrap().details().is_none());
        assert_eq!(event.changed_properties, vec![FolderField::SelectedTarget]);
    }

    #[test]
    fn test_field_key_round_trips() {
        for field in ConfigField::ALL {
            assert_eq!(ConfigField::from_key(field.as_key()), Some(field));
        }
        for field in FolderField::ALL {
            assert_eq!(FolderField::from_key(field.as_key()), Some(field));
        }
        for field in LegacyField::ALL {
            assert_eq!(LegacyField::from_key(field.as_key()), Some(field));
        }
        assert_eq!(FolderField::from_key("somethingElse"), None);
    }
}
