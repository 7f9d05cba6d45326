//! # devctx-core - Core Domain Types
//!
//! Foundation crate for the devctx project-state broker. Provides the
//! shared-state domain model, update-request classification, error
//! handling, and the logging bootstrap.
//!
//! This crate has **zero internal dependencies** -- it only depends on
//! external crates (serde, serde_json, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`ProjectFolder`] - One open project scope and its selection state
//! - [`TargetRef`], [`TargetDetails`], [`TargetIdentifier`] - Selected build target
//! - [`PortRef`], [`PortDetails`], [`PortIdentifier`] - Selected connection port
//! - [`ToolRef`], [`SecondaryTool`] - Selected secondary tool
//! - [`BuildSummary`] - Result of the latest build of a folder
//! - [`ToolchainConfig`] - The two global directory paths
//!
//! ### Update Requests (`events`)
//! - [`UpdateParams`] - Untrusted payload classified into the accepted shapes
//! - [`ChangeEvent`] - New snapshot plus the list of changed fields
//! - [`FolderSetChange`] - Folder membership delta notification
//! - [`ConfigField`], [`FolderField`], [`LegacyField`] - Typed field names
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Contract-violation taxonomy (invalid input, illegal
//!   argument, illegal state, disposed)
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//!
//! ### Logging (`logging`)
//! - [`logging::init()`] - Optional file-logging bootstrap for hosts
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use devctx_core::prelude::*;
//! ```

pub mod error;
pub mod events;
pub mod logging;
pub mod types;

/// Prelude for common imports used throughout the devctx crates
pub mod prelude {
    pub use super::error::{Error, Result};
    pub use tracing::{debug, error, info, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result};
pub use events::{
    ChangeEvent, ConfigChangeEvent, ConfigField, CurrentFolderParams, FolderChangeEvent,
    FolderField, FolderSetChange, FolderSetParams, LegacyField, LegacyParams, UpdateParams,
};
pub use types::{
    BuildProperties, BuildSummary, ConfigOption, ConfigValue, Library, PlatformDescriptor,
    PortDetails, PortIdentifier, PortRef, ProjectFolder, SecondaryTool, SectionSize,
    TargetDetails, TargetIdentifier, TargetRef, ToolRef, ToolchainConfig,
};
