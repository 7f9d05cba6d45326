//! The public facade of the broker
//!
//! [`DevContext`] owns the canonical state and exposes the whole contract:
//! read accessors, modern and deprecated event subscriptions, and the
//! single `update` entry point that validates, applies, and fans out every
//! mutation. One instance per activation; instances are fully independent.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use devctx_core::error::{Error, Result};
use devctx_core::events::{
    ConfigChangeEvent, ConfigField, CurrentFolderParams, FolderChangeEvent, FolderField,
    FolderSetChange, FolderSetParams, LegacyField, LegacyParams, UpdateParams,
};
use devctx_core::types::{
    BuildSummary, PortDetails, PortRef, ProjectFolder, TargetDetails, TargetIdentifier, TargetRef,
    ToolchainConfig,
};

use crate::diff::{has_config_changed, has_folder_changed};
use crate::emitter::{Emitter, Subscription};
use crate::fanout::{config_legacy_notification, folder_legacy_notifications, LegacyNotification};
use crate::host::{RuntimeConfig, StateStore, StaticConfig};
use crate::state::BrokerState;

/// Sink for gated diagnostic lines, usually an editor output channel.
pub type LogSink = Rc<dyn Fn(&str)>;

/// Construction options for [`DevContext`].
pub struct ContextOptions {
    /// Runtime flags, read live on every use.
    pub config: Rc<dyn RuntimeConfig>,

    /// Diagnostic line sink. Only written when the `log` flag is on.
    pub sink: Option<LogSink>,

    /// Persistence backend. When absent, state lives purely in memory.
    pub store: Option<Rc<dyn StateStore>>,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            config: Rc::new(StaticConfig::default()),
            sink: None,
            store: None,
        }
    }
}

/// The shared project-state broker.
pub struct DevContext {
    state: RefCell<BrokerState>,
    disposed: Cell<bool>,
    runtime: Rc<dyn RuntimeConfig>,
    sink: Option<LogSink>,
    store: Option<Rc<dyn StateStore>>,
    config_emitter: Emitter<ConfigChangeEvent>,
    current_folder_emitter: Emitter<Option<ProjectFolder>>,
    folder_emitter: Emitter<FolderChangeEvent>,
    folder_set_emitter: Emitter<FolderSetChange>,
    legacy_emitters: HashMap<LegacyField, Emitter<Option<Value>>>,
}

impl DevContext {
    /// Create a broker instance. When a store is configured, the two
    /// config paths are re-hydrated from their persisted legacy keys;
    /// folders are host-pushed state and always start empty.
    pub fn new(options: ContextOptions) -> Self {
        let mut state = BrokerState::new();
        if let Some(store) = &options.store {
            let restore = |key: LegacyField| {
                store
                    .get(key.as_key())
                    .and_then(|value| value.as_str().map(str::to_string))
            };
            state.config_mut().user_dir_path = restore(LegacyField::UserDirPath);
            state.config_mut().data_dir_path = restore(LegacyField::DataDirPath);
        }

        let legacy_emitters = LegacyField::ALL
            .into_iter()
            .map(|field| (field, Emitter::new()))
            .collect();

        Self {
            state: RefCell::new(state),
            disposed: Cell::new(false),
            runtime: options.config,
            sink: options.sink,
            store: options.store,
            config_emitter: Emitter::new(),
            current_folder_emitter: Emitter::new(),
            folder_emitter: Emitter::new(),
            folder_set_emitter: Emitter::new(),
            legacy_emitters,
        }
    }

    fn ensure_live(&self) -> Result<()> {
        if self.disposed.get() {
            return Err(Error::Disposed);
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────
    // Read Accessors
    // ─────────────────────────────────────────────────────

    /// All open folders, in the order the last folder-set update listed them.
    pub fn opened_folders(&self) -> Result<Vec<ProjectFolder>> {
        self.ensure_live()?;
        Ok(self.state.borrow().folders().to_vec())
    }

    /// The current folder, or `None` when no open folder is selected.
    pub fn current_folder(&self) -> Result<Option<ProjectFolder>> {
        self.ensure_live()?;
        Ok(self.state.borrow().current_folder().cloned())
    }

    /// The global toolchain configuration.
    pub fn config(&self) -> Result<ToolchainConfig> {
        self.ensure_live()?;
        Ok(self.state.borrow().config().clone())
    }

    /// Path of the current folder (legacy view of the selection).
    pub fn folder_path(&self) -> Result<Option<String>> {
        Ok(self.current_folder()?.map(|folder| folder.path))
    }

    /// Canonical id of the current folder's selected target.
    pub fn target_id(&self) -> Result<Option<String>> {
        Ok(self
            .current_folder()?
            .and_then(|folder| folder.target_id().map(str::to_string)))
    }

    /// Resolved details of the current folder's selected target.
    /// Identifier-only selections read as absent.
    pub fn target_details(&self) -> Result<Option<TargetDetails>> {
        Ok(self
            .current_folder()?
            .and_then(|folder| folder.target_details().cloned()))
    }

    /// Resolved details of the current folder's selected port.
    /// Identifier-only selections read as absent.
    pub fn port(&self) -> Result<Option<PortDetails>> {
        Ok(self
            .current_folder()?
            .and_then(|folder| folder.resolved_port().cloned()))
    }

    /// The current folder's latest build summary.
    pub fn build_summary(&self) -> Result<Option<BuildSummary>> {
        Ok(self
            .current_folder()?
            .and_then(|folder| folder.latest_build_summary))
    }

    pub fn user_dir_path(&self) -> Result<Option<String>> {
        Ok(self.config()?.user_dir_path)
    }

    pub fn data_dir_path(&self) -> Result<Option<String>> {
        Ok(self.config()?.data_dir_path)
    }

    // ─────────────────────────────────────────────────────
    // Subscriptions
    // ─────────────────────────────────────────────────────

    pub fn on_did_change_config(
        &self,
        listener: impl Fn(&ConfigChangeEvent) + 'static,
    ) -> Subscription {
        if self.disposed.get() {
            return Subscription::noop();
        }
        self.config_emitter.subscribe(listener)
    }

    pub fn on_did_change_current_folder(
        &self,
        listener: impl Fn(&Option<ProjectFolder>) + 'static,
    ) -> Subscription {
        if self.disposed.get() {
            return Subscription::noop();
        }
        self.current_folder_emitter.subscribe(listener)
    }

    pub fn on_did_change_folder(
        &self,
        listener: impl Fn(&FolderChangeEvent) + 'static,
    ) -> Subscription {
        if self.disposed.get() {
            return Subscription::noop();
        }
        self.folder_emitter.subscribe(listener)
    }

    pub fn on_did_change_folders(
        &self,
        listener: impl Fn(&FolderSetChange) + 'static,
    ) -> Subscription {
        if self.disposed.get() {
            return Subscription::noop();
        }
        self.folder_set_emitter.subscribe(listener)
    }

    /// Subscribe to the deprecated single-field channel.
    #[deprecated(note = "use the typed on_did_change_* subscriptions instead")]
    pub fn on_did_change(
        &self,
        field: LegacyField,
        listener: impl Fn(&Option<Value>) + 'static,
    ) -> Subscription {
        if self.disposed.get() {
            return Subscription::noop();
        }
        self.legacy_emitters[&field].subscribe(listener)
    }

    // ─────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────

    /// The single mutation entry point.
    ///
    /// Classifies the untrusted payload into one of the accepted request
    /// shapes (fixed priority: config, current-folder, folder-set,
    /// folder-fields, legacy flat-state) and dispatches the first match.
    /// Validation runs to completion before any state changes, so a
    /// failed update never applies partially.
    pub fn update(&self, payload: &Value) -> Result<()> {
        self.ensure_live()?;
        let params = UpdateParams::parse(payload)
            .ok_or_else(|| Error::invalid_params(serialize_payload(payload)))?;
        match params {
            UpdateParams::Config(event) => self.apply_config(event),
            UpdateParams::CurrentFolder(params) => self.apply_current_folder(params),
            UpdateParams::FolderSet(params) => self.apply_folder_set(params),
            UpdateParams::FolderFields(event) => self.apply_folder_fields(event),
            UpdateParams::Legacy(params) => self.apply_legacy(params),
        }
    }

    fn apply_config(&self, event: ConfigChangeEvent) -> Result<()> {
        let compare = self.runtime.compare_before_update();
        if compare && !has_config_changed(&event, self.state.borrow().config()) {
            tracing::trace!("config update dropped as immaterial");
            return Ok(());
        }

        *self.state.borrow_mut().config_mut() = event.object.clone();

        for field in &event.changed_properties {
            self.notify_legacy(config_legacy_notification(*field, &event.object));
        }
        self.config_emitter.emit(&event);
        Ok(())
    }

    fn apply_current_folder(&self, params: CurrentFolderParams) -> Result<()> {
        if let Some(folder) = &params.current_folder {
            if !self.state.borrow().is_open(&folder.path) {
                return Err(Error::illegal_state("Folder is not opened"));
            }
        }

        // The legacy path notification fires strictly before the selection
        // is replaced and before any folder-level event; legacy consumers
        // depend on this order.
        let path = params.current_folder.as_ref().map(|folder| folder.path.clone());
        self.notify_legacy(LegacyNotification {
            field: LegacyField::FolderPath,
            value: path.clone().map(Value::String),
        });

        self.state.borrow_mut().set_current_path(path);

        let current = self.state.borrow().current_folder().cloned();
        self.current_folder_emitter.emit(&current);
        Ok(())
    }

    fn apply_folder_set(&self, params: FolderSetParams) -> Result<()> {
        self.state.borrow().validate_folder_set(&params)?;

        let FolderSetParams {
            opened_folders,
            added_paths,
            removed_paths,
        } = params;
        self.state.borrow_mut().replace_folders(opened_folders);

        let change = FolderSetChange {
            added_paths,
            removed_paths,
        };
        tracing::debug!(
            added = change.added_paths.len(),
            removed = change.removed_paths.len(),
            "folder set replaced"
        );
        self.folder_set_emitter.emit(&change);
        Ok(())
    }

    fn apply_folder_fields(&self, event: FolderChangeEvent) -> Result<()> {
        let current = self.state.borrow().folder(&event.object.path).cloned();
        if current.is_none() {
            return Err(Error::illegal_state("Folder is not opened"));
        }

        let compare = self.runtime.compare_before_update();
        if compare && !has_folder_changed(&event, current.as_ref()) {
            tracing::trace!(path = %event.object.path, "folder update dropped as immaterial");
            return Ok(());
        }

        self.state.borrow_mut().replace_folder(event.object.clone())?;

        for field in &event.changed_properties {
            for notification in folder_legacy_notifications(*field, &event.object) {
                self.notify_legacy(notification);
            }
        }
        self.folder_emitter.emit(&event);
        Ok(())
    }

    /// Route a deprecated flat-state update onto the modern pipeline, so
    /// the legacy path cannot bypass validation or materiality.
    fn apply_legacy(&self, params: LegacyParams) -> Result<()> {
        let LegacyParams { key, value } = params;
        match key {
            LegacyField::UserDirPath | LegacyField::DataDirPath => {
                let path = expect_nullable_string(key, &value)?;
                let mut config = self.state.borrow().config().clone();
                let field = match key {
                    LegacyField::UserDirPath => {
                        config.user_dir_path = path;
                        ConfigField::UserDirPath
                    }
                    _ => {
                        config.data_dir_path = path;
                        ConfigField::DataDirPath
                    }
                };
                self.apply_config(ConfigChangeEvent {
                    object: config,
                    changed_properties: vec![field],
                })
            }
            LegacyField::FolderPath => {
                let path = expect_nullable_string(key, &value)?;
                let current_folder = match path {
                    None => None,
                    Some(path) => {
                        let folder = self.state.borrow().folder(&path).cloned();
                        Some(folder.ok_or_else(|| Error::illegal_state("Folder is not opened"))?)
                    }
                };
                self.apply_current_folder(CurrentFolderParams { current_folder })
            }
            LegacyField::TargetId => {
                // a bare id synthesizes an identifier named after itself
                let target = expect_nullable_string(key, &value)?.map(|id| {
                    TargetRef::Id(TargetIdentifier {
                        name: id.clone(),
                        id: Some(id),
                    })
                });
                self.update_current_folder_field(FolderField::SelectedTarget, move |folder| {
                    folder.selected_target = target.clone();
                })
            }
            LegacyField::TargetDetails => {
                let details: Option<TargetDetails> = convert_legacy_value(key, &value)?;
                let target = details.map(TargetRef::Details);
                self.update_current_folder_field(FolderField::SelectedTarget, move |folder| {
                    folder.selected_target = target.clone();
                })
            }
            LegacyField::Port => {
                let port: Option<PortRef> = convert_legacy_value(key, &value)?;
                self.update_current_folder_field(FolderField::SelectedPort, move |folder| {
                    folder.selected_port = port.clone();
                })
            }
            LegacyField::LatestBuildSummary => {
                let summary: Option<BuildSummary> = convert_legacy_value(key, &value)?;
                self.update_current_folder_field(
                    FolderField::LatestBuildSummary,
                    move |folder| {
                        folder.latest_build_summary = summary.clone();
                    },
                )
            }
        }
    }

    fn update_current_folder_field(
        &self,
        field: FolderField,
        apply: impl Fn(&mut ProjectFolder),
    ) -> Result<()> {
        let current = self.state.borrow().current_folder().cloned();
        let mut folder = current.ok_or_else(|| Error::illegal_state("Folder is not opened"))?;
        apply(&mut folder);
        self.apply_folder_fields(FolderChangeEvent {
            object: folder,
            changed_properties: vec![field],
        })
    }

    fn notify_legacy(&self, notification: LegacyNotification) {
        let LegacyNotification { field, value } = notification;
        if let Some(store) = &self.store {
            store.update(field.as_key(), value.clone());
        }
        if self.runtime.log() {
            if let Some(sink) = &self.sink {
                let rendered = match &value {
                    Some(value) => value.to_string(),
                    None => "null".to_string(),
                };
                sink(&format!("Updated '{}': {rendered}", field.as_key()));
            }
        }
        self.legacy_emitters[&field].emit(&value);
    }

    // ─────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────

    /// Whether [`Self::dispose`] has been called.
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Detach every listener and refuse all further operations.
    /// Idempotent: disposing a disposed context is a no-op.
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.config_emitter.clear();
        self.current_folder_emitter.clear();
        self.folder_emitter.clear();
        self.folder_set_emitter.clear();
        for emitter in self.legacy_emitters.values() {
            emitter.clear();
        }
        tracing::debug!("context disposed");
    }
}

/// Best-effort serialization for the invalid-params message. Falls back
/// to the `Debug` form rather than propagating a serialization failure.
fn serialize_payload(payload: &Value) -> String {
    serde_json::to_string(payload).unwrap_or_else(|_| format!("{payload:?}"))
}

fn expect_nullable_string(key: LegacyField, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(value) => Ok(Some(value.clone())),
        other => Err(invalid_legacy(key, other)),
    }
}

fn convert_legacy_value<T: serde::de::DeserializeOwned>(
    key: LegacyField,
    value: &Value,
) -> Result<Option<T>> {
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value.clone())
        .map(Some)
        .map_err(|_| invalid_legacy(key, value))
}

fn invalid_legacy(key: LegacyField, value: &Value) -> Error {
    Error::invalid_params(serialize_payload(
        &serde_json::json!({ "key": key.as_key(), "value": value }),
    ))
}
