//! # devctx-broker - State-Synchronization Engine
//!
//! Holds the canonical shared project state, validates incoming change
//! requests, decides whether a change is material, applies it, and fans
//! out notifications to two generations of consumers.
//!
//! Depends on [`devctx_core`] for the domain model and error handling.
//!
//! ## Public API
//!
//! ### Facade (`facade`)
//! - [`DevContext`] - The broker: accessors, subscriptions, and `update`
//! - [`ContextOptions`] - Construction options (runtime flags, log sink,
//!   optional persistence)
//!
//! ### Host Collaborators (`host`)
//! - [`StateStore`] - Key/value persistence contract, [`InMemoryStore`]
//! - [`CommandHost`] - Command registration contract
//! - [`RuntimeConfig`] - The two live-reloaded runtime flags
//!
//! ### Building Blocks
//! - [`emitter::Emitter`], [`Subscription`] - Single-threaded event fan-out
//! - [`state::BrokerState`] - Folder registry, current selection, config
//! - [`fanout`] - The pure legacy-notification mapping table
//! - [`diff`] - Materiality detection

pub mod diff;
pub mod emitter;
pub mod facade;
pub mod fanout;
pub mod host;
pub mod state;

// Public API re-exports
pub use emitter::{Emitter, Subscription};
pub use facade::{ContextOptions, DevContext, LogSink};
pub use fanout::LegacyNotification;
pub use host::{
    CommandHandler, CommandHost, InMemoryStore, RuntimeConfig, SharedConfig, StateStore,
    StaticConfig, DEFAULT_COMPARE_BEFORE_UPDATE, DEFAULT_LOG,
};
pub use state::BrokerState;
