//! Tabnudge - behavioral trigger engine for browser activity
//!
//! Tabnudge watches tab, navigation, and input activity and raises celebration
//! or nudge triggers when configured behavior patterns show up: staying off
//! distracting sites, switching to entertainment right after productive work,
//! erratic typing and deleting, tab overload.
//!
//! ## Modules
//!
//! - **Catalog**: the declarative trigger table and its validation
//! - **Evaluator**: the state machine that turns timestamped events into fired triggers
//! - **Trackers**: rolling windows, cooldowns, timers, and the persistent state record
//! - **Dispatch**: callback delivery to UI and celebration collaborators

pub mod catalog;
pub mod config;
pub mod cooldown;
pub mod dispatch;
pub mod domain;
pub mod engine;
pub mod error;
pub mod events;
pub mod state;
pub mod timers;
pub mod types;
pub mod window;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use catalog::{Catalog, TriggerDefinition, TriggerId, TriggerKind};
pub use config::EngineConfig;
pub use dispatch::{CallbackId, Dispatcher};
pub use engine::{Evaluator, Visibility};
pub use error::{CatalogError, EngineError, StoreError};
pub use events::{BrowserEvent, TabSnapshot, TabSource, TimedEvent};
pub use state::{JsonFileStore, KeyValueStore, MemoryStore, PersistentState, StateStore};
pub use types::{FiredTrigger, TriggerData};

/// Engine version reported by the CLI and FFI
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "tabnudge";
