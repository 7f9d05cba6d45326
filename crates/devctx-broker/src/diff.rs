//! Materiality detection
//!
//! Pure comparison between a proposed update and the stored snapshot,
//! restricted to the fields the producer claims changed. Structural
//! equality comes from the typed model: map-like fields live in
//! `BTreeMap`s (order-independent), lists stay order-dependent.

use devctx_core::events::{ConfigChangeEvent, ConfigField, FolderChangeEvent, FolderField};
use devctx_core::types::{ProjectFolder, ToolchainConfig};

/// True when any field named in the event differs from the stored config.
pub fn has_config_changed(event: &ConfigChangeEvent, current: &ToolchainConfig) -> bool {
    event.changed_properties.iter().any(|field| match field {
        ConfigField::UserDirPath => event.object.user_dir_path != current.user_dir_path,
        ConfigField::DataDirPath => event.object.data_dir_path != current.data_dir_path,
    })
}

/// True when any field named in the event differs from the stored folder.
///
/// A missing stored snapshot counts as different: the registry has nothing
/// to compare against, so the update is material by definition.
pub fn has_folder_changed(event: &FolderChangeEvent, current: Option<&ProjectFolder>) -> bool {
    let Some(current) = current else {
        return true;
    };
    event.changed_properties.iter().any(|field| match field {
        FolderField::Path => event.object.path != current.path,
        FolderField::SelectedTarget => event.object.selected_target != current.selected_target,
        FolderField::SelectedPort => event.object.selected_port != current.selected_port,
        FolderField::SelectedSecondaryTool => {
            event.object.selected_secondary_tool != current.selected_secondary_tool
        }
        FolderField::LatestBuildSummary => {
            event.object.latest_build_summary != current.latest_build_summary
        }
        FolderField::CustomOptionsString => {
            event.object.custom_options_string != current.custom_options_string
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use devctx_core::types::{PortIdentifier, PortRef, TargetIdentifier, TargetRef};

    fn config(user: Option<&str>, data: Option<&str>) -> ToolchainConfig {
        ToolchainConfig {
            user_dir_path: user.map(str::to_string),
            data_dir_path: data.map(str::to_string),
        }
    }

    #[test]
    fn test_config_unchanged_when_named_fields_match() {
        let event = ConfigChangeEvent {
            object: config(None, Some("/data")),
            changed_properties: vec![ConfigField::DataDirPath],
        };
        assert!(!has_config_changed(&event, &config(None, Some("/data"))));
        assert!(has_config_changed(&event, &config(None, None)));
    }

    #[test]
    fn test_config_ignores_fields_not_named() {
        // userDirPath differs but is not listed as changed
        let event = ConfigChangeEvent {
            object: config(Some("/projects"), Some("/data")),
            changed_properties: vec![ConfigField::DataDirPath],
        };
        assert!(!has_config_changed(&event, &config(None, Some("/data"))));
    }

    #[test]
    fn test_folder_missing_snapshot_is_material() {
        let event = FolderChangeEvent {
            object: ProjectFolder::new("/p1"),
            changed_properties: vec![],
        };
        assert!(has_folder_changed(&event, None));
    }

    #[test]
    fn test_folder_field_comparison() {
        let mut updated = ProjectFolder::new("/p1");
        updated.selected_target = Some(TargetRef::Id(TargetIdentifier {
            name: "Model Board".to_string(),
            id: Some("vendor:arch:model".to_string()),
        }));
        let event = FolderChangeEvent {
            object: updated.clone(),
            changed_properties: vec![FolderField::SelectedTarget],
        };

        assert!(has_folder_changed(&event, Some(&ProjectFolder::new("/p1"))));
        assert!(!has_folder_changed(&event, Some(&updated)));
    }

    #[test]
    fn test_folder_unlisted_difference_is_not_material() {
        let mut stored = ProjectFolder::new("/p1");
        stored.selected_port = Some(PortRef::Id(PortIdentifier {
            address: "COM2".to_string(),
            protocol: None,
        }));

        // The port differs, but only the target is named as changed.
        let event = FolderChangeEvent {
            object: ProjectFolder::new("/p1"),
            changed_properties: vec![FolderField::SelectedTarget],
        };
        assert!(!has_folder_changed(&event, Some(&stored)));
    }
}
