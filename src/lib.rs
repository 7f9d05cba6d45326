//! devctx Library
//!
//! A shared project-state broker for editor extensions: one canonical
//! description of the open project folders, the current selection, and the
//! toolchain configuration, mutated through a single validated entry point
//! and fanned out to modern and legacy consumers.

// Module declarations
pub mod activation;

// Re-export the full public surface of the member crates
pub use devctx_broker::{
    CommandHandler, CommandHost, ContextOptions, DevContext, InMemoryStore, LogSink,
    RuntimeConfig, SharedConfig, StateStore, StaticConfig, Subscription,
    DEFAULT_COMPARE_BEFORE_UPDATE, DEFAULT_LOG,
};
pub use devctx_core::{
    BuildProperties, BuildSummary, ChangeEvent, ConfigChangeEvent, ConfigField, ConfigOption,
    ConfigValue, CurrentFolderParams, Error, FolderChangeEvent, FolderField, FolderSetChange,
    FolderSetParams, LegacyField, LegacyParams, Library, PlatformDescriptor, PortDetails,
    PortIdentifier, PortRef, ProjectFolder, Result, SecondaryTool, SectionSize, TargetDetails,
    TargetIdentifier, TargetRef, ToolRef, ToolchainConfig, UpdateParams,
};

pub use activation::{activate, ActivatedContext, UPDATE_COMMAND_ID};
