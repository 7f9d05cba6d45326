//! Domain types for the shared project state
//!
//! Everything here is wire-facing: producers push these shapes as JSON
//! through the broker's update entry point, and consumers read them back
//! through the facade accessors. Wire keys are camelCase.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Build properties resolved for a target, as `key=value` pairs.
///
/// Stored in a `BTreeMap` so structural equality is independent of the
/// order in which a producer happened to serialize the entries.
pub type BuildProperties = BTreeMap<String, String>;

// ─────────────────────────────────────────────────────────
// Build Target
// ─────────────────────────────────────────────────────────

/// Lightweight reference to a build target: a display name plus an
/// optional canonical id. Producers use this when the target is known but
/// its platform metadata is not installed/resolved.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetIdentifier {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// Fully resolved description of a build target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDetails {
    /// Canonical target id (never empty).
    #[serde(deserialize_with = "non_empty_string")]
    pub id: String,

    /// Human-readable target name.
    pub name: String,

    /// Secondary tools available for this target.
    pub secondary_tools: Vec<SecondaryTool>,

    /// Schema of the configurable options this target accepts.
    #[serde(default)]
    pub option_schema: Vec<ConfigOption>,

    /// Id of the tool selected when the producer does not specify one.
    #[serde(default)]
    pub default_tool_id: Option<String>,

    /// Resolved `key=value` build properties.
    #[serde(default)]
    pub build_properties: BuildProperties,
}

/// A resolved target id must be non-empty; an empty string would make the
/// untagged [`TargetRef`] swallow identifier-shaped objects as details.
fn non_empty_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    if value.is_empty() {
        return Err(serde::de::Error::custom("id must not be empty"));
    }
    Ok(value)
}

/// Selected build target: either a fully resolved description or a
/// lightweight identifier. Resolution is attempted in that order when
/// deserializing, so an object carrying the full detail fields never
/// degrades to an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TargetRef {
    Details(TargetDetails),
    Id(TargetIdentifier),
}

impl TargetRef {
    /// The canonical id, if one is known.
    pub fn canonical_id(&self) -> Option<&str> {
        match self {
            TargetRef::Details(details) => Some(&details.id),
            TargetRef::Id(identifier) => identifier.id.as_deref(),
        }
    }

    /// The resolved description, if this reference carries one.
    ///
    /// A resolved target cannot be synthesized from an identifier alone,
    /// so identifiers read as `None` here.
    pub fn details(&self) -> Option<&TargetDetails> {
        match self {
            TargetRef::Details(details) => Some(details),
            TargetRef::Id(_) => None,
        }
    }
}

/// One configurable option of a target, with its accepted values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOption {
    pub option: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub values: Vec<ConfigValue>,
}

/// One accepted value of a [`ConfigOption`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigValue {
    pub value: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub selected: bool,
}

// ─────────────────────────────────────────────────────────
// Connection Port
// ─────────────────────────────────────────────────────────

/// Address-only reference to a connection port.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortIdentifier {
    pub address: String,
    #[serde(default)]
    pub protocol: Option<String>,
}

/// Fully resolved description of a connection port.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortDetails {
    pub address: String,

    /// Display label, e.g. `"COM2 (Serial Port)"`.
    pub label: String,

    /// Protocol name, e.g. `"serial"`.
    pub protocol: String,

    /// Display label of the protocol, e.g. `"Serial Port"`.
    pub protocol_label: String,

    /// Free-form properties reported by the discovery tool.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,

    #[serde(default)]
    pub hardware_id: Option<String>,
}

/// Selected port: resolved description or address-only identifier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PortRef {
    Details(PortDetails),
    Id(PortIdentifier),
}

impl PortRef {
    /// The resolved description, if this reference carries one.
    pub fn details(&self) -> Option<&PortDetails> {
        match self {
            PortRef::Details(details) => Some(details),
            PortRef::Id(_) => None,
        }
    }

    pub fn address(&self) -> &str {
        match self {
            PortRef::Details(details) => &details.address,
            PortRef::Id(identifier) => &identifier.address,
        }
    }
}

// ─────────────────────────────────────────────────────────
// Secondary Tool
// ─────────────────────────────────────────────────────────

/// Fully resolved description of a secondary tool (uploader, debugger).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecondaryTool {
    pub id: String,
    pub name: String,
    /// The platform that owns this tool.
    pub platform: String,
}

/// Selected secondary tool: resolved description or plain name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ToolRef {
    Details(SecondaryTool),
    Name(String),
}

impl ToolRef {
    pub fn details(&self) -> Option<&SecondaryTool> {
        match self {
            ToolRef::Details(details) => Some(details),
            ToolRef::Name(_) => None,
        }
    }
}

// ─────────────────────────────────────────────────────────
// Build Summary
// ─────────────────────────────────────────────────────────

/// A library that participated in a build.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Identifies a platform that participated in a build.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformDescriptor {
    pub id: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Size of one binary section of the built executable.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSize {
    pub name: String,
    pub size: i64,
    #[serde(default)]
    pub max_size: Option<i64>,
}

/// Summary of the latest build of a folder.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSummary {
    /// Directory the build output was written to.
    pub output_path: String,

    #[serde(default)]
    pub used_libraries: Vec<Library>,

    #[serde(default)]
    pub target_platform: Option<PlatformDescriptor>,

    #[serde(default)]
    pub build_platform: Option<PlatformDescriptor>,

    #[serde(default)]
    pub build_properties: BuildProperties,

    #[serde(default)]
    pub section_sizes: Vec<SectionSize>,
}

// ─────────────────────────────────────────────────────────
// Project Folder
// ─────────────────────────────────────────────────────────

/// The tracked state of one open project folder.
///
/// `path` is the folder's identity and never changes while the folder is
/// open; everything else is selection state pushed by producers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFolder {
    /// Absolute filesystem path of the folder. Unique among open folders.
    pub path: String,

    /// The selected build target, if any.
    pub selected_target: Option<TargetRef>,

    /// The selected connection port, if any.
    pub selected_port: Option<PortRef>,

    /// The selected secondary tool, if any.
    pub selected_secondary_tool: Option<ToolRef>,

    /// Summary of the latest build. Absent until the folder is first built.
    pub latest_build_summary: Option<BuildSummary>,

    /// Custom option pairs appended to the target id, encoded as
    /// `opt1=value1,opt2=value2`.
    pub custom_options_string: Option<String>,
}

impl ProjectFolder {
    /// Create a folder with no selection state.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            selected_target: None,
            selected_port: None,
            selected_secondary_tool: None,
            latest_build_summary: None,
            custom_options_string: None,
        }
    }

    /// The canonical id of the selected target, if one is known.
    pub fn target_id(&self) -> Option<&str> {
        self.selected_target.as_ref().and_then(TargetRef::canonical_id)
    }

    /// The resolved target description, if the selection carries one.
    pub fn target_details(&self) -> Option<&TargetDetails> {
        self.selected_target.as_ref().and_then(TargetRef::details)
    }

    /// The resolved port description, if the selection carries one.
    pub fn resolved_port(&self) -> Option<&PortDetails> {
        self.selected_port.as_ref().and_then(PortRef::details)
    }

    /// The custom options decoded into `(key, value)` pairs, in encoding
    /// order. Malformed segments without `=` are skipped.
    pub fn custom_options_pairs(&self) -> Vec<(String, String)> {
        let Some(encoded) = &self.custom_options_string else {
            return Vec::new();
        };
        encoded
            .split(',')
            .filter_map(|pair| {
                let (key, value) = pair.split_once('=')?;
                Some((key.to_string(), value.to_string()))
            })
            .collect()
    }

    /// The canonical target id with the custom options appended, e.g.
    /// `vendor:arch:model:opt1=value1`. `None` when no id is known.
    pub fn target_id_with_options(&self) -> Option<String> {
        let id = self.target_id()?;
        match &self.custom_options_string {
            Some(options) if !options.is_empty() => Some(format!("{id}:{options}")),
            _ => Some(id.to_string()),
        }
    }
}

// ─────────────────────────────────────────────────────────
// Toolchain Config
// ─────────────────────────────────────────────────────────

/// The two-field global toolchain configuration, independent of any
/// folder: the user projects directory and the toolchain data directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolchainConfig {
    pub user_dir_path: Option<String>,
    pub data_dir_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn details_json() -> serde_json::Value {
        json!({
            "id": "vendor:arch:model",
            "name": "Model Board",
            "secondaryTools": [
                { "id": "t1", "name": "Tool One", "platform": "vendor:arch" }
            ],
            "optionSchema": [],
            "defaultToolId": "t1",
            "buildProperties": { "build.arch": "xtensa" }
        })
    }

    #[test]
    fn test_target_ref_resolves_details_before_identifier() {
        let target: TargetRef = serde_json::from_value(details_json()).unwrap();
        let details = target.details().expect("should resolve as details");
        assert_eq!(details.id, "vendor:arch:model");
        assert_eq!(details.secondary_tools.len(), 1);
        assert_eq!(target.canonical_id(), Some("vendor:arch:model"));
    }

    #[test]
    fn test_target_ref_falls_back_to_identifier() {
        let target: TargetRef =
            serde_json::from_value(json!({ "name": "Model Board", "id": "vendor:arch:model" }))
                .unwrap();
        assert!(target.details().is_none());
        assert_eq!(target.canonical_id(), Some("vendor:arch:model"));

        let unnamed: TargetRef =
            serde_json::from_value(json!({ "name": "Model Board" })).unwrap();
        assert_eq!(unnamed.canonical_id(), None);
    }

    #[test]
    fn test_port_ref_identifier_has_no_details() {
        let port: PortRef =
            serde_json::from_value(json!({ "address": "COM2", "protocol": "serial" })).unwrap();
        assert!(port.details().is_none());
        assert_eq!(port.address(), "COM2");

        let resolved: PortRef = serde_json::from_value(json!({
            "address": "COM2",
            "label": "COM2 (Serial Port)",
            "protocol": "serial",
            "protocolLabel": "Serial Port",
            "properties": { "vid": "0x2341" }
        }))
        .unwrap();
        let details = resolved.details().expect("should resolve as details");
        assert_eq!(details.protocol_label, "Serial Port");
    }

    #[test]
    fn test_tool_ref_accepts_plain_name() {
        let tool: ToolRef = serde_json::from_value(json!("swd")).unwrap();
        assert!(matches!(tool, ToolRef::Name(ref name) if name == "swd"));

        let resolved: ToolRef = serde_json::from_value(
            json!({ "id": "swd", "name": "SWD Upload", "platform": "vendor:arch" }),
        )
        .unwrap();
        assert_eq!(resolved.details().unwrap().id, "swd");
    }

    #[test]
    fn test_folder_wire_round_trip() {
        let folder = ProjectFolder {
            path: "/projects/blink".to_string(),
            selected_target: Some(TargetRef::Id(TargetIdentifier {
                name: "Model Board".to_string(),
                id: Some("vendor:arch:model".to_string()),
            })),
            selected_port: None,
            selected_secondary_tool: Some(ToolRef::Name("swd".to_string())),
            latest_build_summary: None,
            custom_options_string: Some("opt1=value1,opt2=value2".to_string()),
        };
        let wire = serde_json::to_value(&folder).unwrap();
        assert_eq!(wire["path"], "/projects/blink");
        assert_eq!(wire["selectedTarget"]["id"], "vendor:arch:model");
        assert_eq!(wire["customOptionsString"], "opt1=value1,opt2=value2");

        let back: ProjectFolder = serde_json::from_value(wire).unwrap();
        assert_eq!(back, folder);
    }

    #[test]
    fn test_custom_options_pairs() {
        let mut folder = ProjectFolder::new("/projects/blink");
        assert!(folder.custom_options_pairs().is_empty());

        folder.custom_options_string = Some("opt1=value1,broken,opt2=value2".to_string());
        assert_eq!(
            folder.custom_options_pairs(),
            vec![
                ("opt1".to_string(), "value1".to_string()),
                ("opt2".to_string(), "value2".to_string())
            ]
        );
    }

    #[test]
    fn test_target_id_with_options() {
        let mut folder = ProjectFolder::new("/projects/blink");
        assert_eq!(folder.target_id_with_options(), None);

        folder.selected_target = Some(TargetRef::Id(TargetIdentifier {
            name: "Model Board".to_string(),
            id: Some("vendor:arch:model".to_string()),
        }));
        assert_eq!(
            folder.target_id_with_options().as_deref(),
            Some("vendor:arch:model")
        );

        folder.custom_options_string = Some("opt1=value1".to_string());
        assert_eq!(
            folder.target_id_with_options().as_deref(),
            Some("vendor:arch:model:opt1=value1")
        );
    }

    #[test]
    fn test_build_properties_equality_ignores_insertion_order() {
        let mut left = BuildProperties::new();
        left.insert("a".to_string(), "1".to_string());
        left.insert("b".to_string(), "2".to_string());

        let mut right = BuildProperties::new();
        right.insert("b".to_string(), "2".to_string());
        right.insert("a".to_string(), "1".to_string());

        assert_eq!(left, right);
    }
}
