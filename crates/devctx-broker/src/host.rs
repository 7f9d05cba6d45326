//! Host collaborator contracts
//!
//! The broker talks to its hosting editor through the narrow traits in
//! this module: a key/value store for optional persistence, a command
//! registry so producers can push state by command id, and the two-flag
//! runtime configuration surface. Everything here is replaceable in tests.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use serde_json::Value;

use devctx_core::error::Result;

use crate::emitter::Subscription;

// ─────────────────────────────────────────────────────────
// Persisted State
// ─────────────────────────────────────────────────────────

/// Key/value store backing the persisted flat state.
///
/// `update` with `None` conventionally deletes the key. Only used when the
/// broker is configured to persist rather than hold state purely in memory.
#[cfg_attr(test, mockall::automock)]
pub trait StateStore {
    fn keys(&self) -> Vec<String>;

    fn get(&self, key: &str) -> Option<Value>;

    fn update(&self, key: &str, value: Option<Value>);
}

/// Store that holds everything in memory. The default for hosts that do
/// not wire a real persistence layer.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RefCell<BTreeMap<String, Value>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for InMemoryStore {
    fn keys(&self) -> Vec<String> {
        self.state.borrow().keys().cloned().collect()
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.state.borrow().get(key).cloned()
    }

    fn update(&self, key: &str, value: Option<Value>) {
        match value {
            None => {
                self.state.borrow_mut().remove(key);
            }
            Some(value) => {
                self.state.borrow_mut().insert(key.to_string(), value);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────
// Command Registration
// ─────────────────────────────────────────────────────────

/// Handler invoked when the host executes a registered command.
pub type CommandHandler = Box<dyn Fn(&Value) -> Result<()>>;

/// Editor facility for registering commands by stable string id, so other
/// extensions can push state without a direct reference to the facade.
#[cfg_attr(test, mockall::automock)]
pub trait CommandHost {
    fn register_command(&self, id: &str, handler: CommandHandler) -> Subscription;
}

// ─────────────────────────────────────────────────────────
// Runtime Configuration
// ─────────────────────────────────────────────────────────

/// Default for the diagnostic-logging flag.
pub const DEFAULT_LOG: bool = false;

/// Default for the change-detection flag.
pub const DEFAULT_COMPARE_BEFORE_UPDATE: bool = true;

/// The two runtime options, read live on every use so host configuration
/// changes take effect without re-activation.
pub trait RuntimeConfig {
    /// Whether accepted mutations are traced to the host log sink.
    fn log(&self) -> bool {
        DEFAULT_LOG
    }

    /// Whether updates are compared against stored state and dropped when
    /// immaterial. When `false`, every update is treated as material.
    fn compare_before_update(&self) -> bool {
        DEFAULT_COMPARE_BEFORE_UPDATE
    }
}

/// Fixed option values, decided at construction.
#[derive(Debug, Clone, Copy)]
pub struct StaticConfig {
    pub log: bool,
    pub compare_before_update: bool,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            log: DEFAULT_LOG,
            compare_before_update: DEFAULT_COMPARE_BEFORE_UPDATE,
        }
    }
}

impl RuntimeConfig for StaticConfig {
    fn log(&self) -> bool {
        self.log
    }

    fn compare_before_update(&self) -> bool {
        self.compare_before_update
    }
}

/// Option values that can be flipped after construction, standing in for
/// a live host configuration surface.
#[derive(Debug)]
pub struct SharedConfig {
    log: Cell<bool>,
    compare_before_update: Cell<bool>,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log: Cell::new(DEFAULT_LOG),
            compare_before_update: Cell::new(DEFAULT_COMPARE_BEFORE_UPDATE),
        }
    }
}

impl SharedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_log(&self, log: bool) {
        self.log.set(log);
    }

    pub fn set_compare_before_update(&self, compare: bool) {
        self.compare_before_update.set(compare);
    }
}

impl RuntimeConfig for SharedConfig {
    fn log(&self) -> bool {
        self.log.get()
    }

    fn compare_before_update(&self) -> bool {
        self.compare_before_update.get()
    }
}
