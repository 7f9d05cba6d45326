//! Canonical broker state
//!
//! One [`BrokerState`] is owned by each facade instance -- constructed
//! fresh per activation, never process-global, so independent instances
//! can coexist (and do, in tests).

use devctx_core::error::{Error, Result};
use devctx_core::events::FolderSetParams;
use devctx_core::types::{ProjectFolder, ToolchainConfig};

/// The canonical state: open folders, the current selection, and the
/// global toolchain config.
///
/// The folder collection preserves insertion order for enumeration;
/// membership is keyed by the folder `path`, which is unique at all times.
///
/// The current selection is stored as a path and resolved against the
/// registry on read. Removing the current folder from the set does *not*
/// clear the stored path -- the selection merely reads as absent until the
/// path is opened again or explicitly reassigned. This is deliberate,
/// contract-level behavior.
#[derive(Debug, Default)]
pub struct BrokerState {
    folders: Vec<ProjectFolder>,
    current_path: Option<String>,
    config: ToolchainConfig,
}

impl BrokerState {
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────
    // Folder Registry
    // ─────────────────────────────────────────────────────

    /// All open folders, in the order the last folder-set update listed them.
    pub fn folders(&self) -> &[ProjectFolder] {
        &self.folders
    }

    /// Look up an open folder by path.
    pub fn folder(&self, path: &str) -> Option<&ProjectFolder> {
        self.folders.iter().find(|folder| folder.path == path)
    }

    pub fn is_open(&self, path: &str) -> bool {
        self.folder(path).is_some()
    }

    /// Check a folder-set update against the request's own fields and the
    /// currently open set. Checks run left to right and nothing mutates;
    /// the first violation is returned.
    pub fn validate_folder_set(&self, params: &FolderSetParams) -> Result<()> {
        if params
            .added_paths
            .iter()
            .any(|path| params.removed_paths.contains(path))
        {
            return Err(Error::illegal_argument(
                "Added/removed paths must be distinct",
            ));
        }

        let paths: Vec<&str> = params
            .opened_folders
            .iter()
            .map(|folder| folder.path.as_str())
            .collect();
        if paths
            .iter()
            .enumerate()
            .any(|(index, path)| paths[..index].contains(path))
        {
            return Err(Error::illegal_argument("Folder paths must be unique"));
        }

        if params
            .added_paths
            .iter()
            .any(|path| !paths.contains(&path.as_str()))
        {
            return Err(Error::illegal_argument(
                "Added path must be in opened folders",
            ));
        }

        if params
            .removed_paths
            .iter()
            .any(|path| paths.contains(&path.as_str()))
        {
            return Err(Error::illegal_argument(
                "Removed path must not be in opened folders",
            ));
        }

        if params
            .removed_paths
            .iter()
            .any(|path| !self.is_open(path))
        {
            return Err(Error::illegal_state_update("Removed folder was not opened"));
        }

        if params.added_paths.iter().any(|path| self.is_open(path)) {
            return Err(Error::illegal_state_update(
                "Added folder was already opened",
            ));
        }

        Ok(())
    }

    /// Wholesale replace of the folder collection. Callers must have run
    /// [`Self::validate_folder_set`] first.
    pub fn replace_folders(&mut self, folders: Vec<ProjectFolder>) {
        self.folders = folders;
    }

    /// Replace the stored snapshot of one open folder.
    pub fn replace_folder(&mut self, folder: ProjectFolder) -> Result<()> {
        let Some(stored) = self
            .folders
            .iter_mut()
            .find(|stored| stored.path == folder.path)
        else {
            return Err(Error::illegal_state("Folder is not opened"));
        };
        *stored = folder;
        Ok(())
    }

    // ─────────────────────────────────────────────────────
    // Current Selection
    // ─────────────────────────────────────────────────────

    /// The path of the current selection, whether or not it is still open.
    pub fn current_path(&self) -> Option<&str> {
        self.current_path.as_deref()
    }

    /// The current folder, resolved against the registry. Absent when no
    /// selection was made or the selected path is not currently open.
    pub fn current_folder(&self) -> Option<&ProjectFolder> {
        self.current_path
            .as_deref()
            .and_then(|path| self.folder(path))
    }

    pub fn set_current_path(&mut self, path: Option<String>) {
        self.current_path = path;
    }

    // ─────────────────────────────────────────────────────
    // Toolchain Config
    // ─────────────────────────────────────────────────────

    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ToolchainConfig {
        &mut self.config
    }
}
