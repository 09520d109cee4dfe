//! Persistent cross-navigation state
//!
//! The evaluator keeps a small record that must survive tab and page
//! transitions: the last productive visit (for reward-switching detection) and
//! the distraction streak. The record is stored whole under one key of a
//! host-provided key-value store, and every change is a read-modify-write of
//! that single record so an update either lands completely or not at all.

use crate::catalog::TriggerId;
use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// Store key holding the serialized [`PersistentState`]
pub const STATE_KEY: &str = "triggerState";

/// Most recent visit to a productive domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductiveVisit {
    pub domain: String,
    pub start_time: i64,
}

/// Distraction streak bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistractionState {
    pub last_distraction_time: i64,
    pub distraction_free_start_time: i64,
    pub is_currently_on_distraction: bool,
    #[serde(default)]
    pub closed_distractions: BTreeSet<String>,
    #[serde(default)]
    pub last_trigger_times: BTreeMap<TriggerId, i64>,
}

impl DistractionState {
    /// A fresh streak starting at `now_ms`
    pub fn starting_at(now_ms: i64) -> Self {
        Self {
            last_distraction_time: now_ms,
            distraction_free_start_time: now_ms,
            is_currently_on_distraction: false,
            closed_distractions: BTreeSet::new(),
            last_trigger_times: BTreeMap::new(),
        }
    }
}

/// The durable record owned by the evaluator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_productive_visit: Option<ProductiveVisit>,
    pub distraction_state: DistractionState,
}

impl PersistentState {
    pub fn starting_at(now_ms: i64) -> Self {
        Self {
            last_productive_visit: None,
            distraction_state: DistractionState::starting_at(now_ms),
        }
    }

    /// Last time `id` fired, if ever
    pub fn last_fired(&self, id: TriggerId) -> Option<i64> {
        self.distraction_state.last_trigger_times.get(&id).copied()
    }
}

/// Host key-value storage
pub trait KeyValueStore {
    /// Read a record; `Ok(None)` when the key is absent
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;

    /// Write a whole record
    fn set(&mut self, key: &str, value: serde_json::Value) -> Result<(), StoreError>;

    /// Delete a record; deleting an absent key is not an error
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store, lost when the process exits
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: HashMap<String, serde_json::Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.records.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        self.records.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.records.remove(key);
        Ok(())
    }
}

/// Store persisted as a single JSON object file.
///
/// Every write rewrites the file through a temporary sibling and a rename.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    records: serde_json::Map<String, serde_json::Value>,
}

impl JsonFileStore {
    /// Open `path`, starting empty if the file does not exist yet
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let records = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                serde_json::Map::new()
            } else {
                serde_json::from_str(&content).map_err(StoreError::Corrupt)?
            }
        } else {
            serde_json::Map::new()
        };
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, records: &serde_json::Map<String, serde_json::Value>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records).map_err(StoreError::Corrupt)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.records.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        let mut next = self.records.clone();
        next.insert(key.to_string(), value);
        self.flush(&next)?;
        self.records = next;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if !self.records.contains_key(key) {
            return Ok(());
        }
        let mut next = self.records.clone();
        next.remove(key);
        self.flush(&next)?;
        self.records = next;
        Ok(())
    }
}

/// Transactional access to [`PersistentState`] over a [`KeyValueStore`]
pub struct StateStore {
    backend: Box<dyn KeyValueStore>,
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore").finish_non_exhaustive()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl StateStore {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Read the current record, if one was ever written
    pub fn load(&self) -> Result<Option<PersistentState>, StoreError> {
        match self.backend.get(STATE_KEY)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(StoreError::Corrupt),
            None => Ok(None),
        }
    }

    /// Write a fresh record unless one already exists; returns the live record
    pub fn initialize(&mut self, now_ms: i64) -> Result<PersistentState, StoreError> {
        if let Some(state) = self.load()? {
            return Ok(state);
        }
        let state = PersistentState::starting_at(now_ms);
        self.write(&state)?;
        Ok(state)
    }

    /// Read the latest record, apply `change` to a copy, write the whole copy.
    ///
    /// On any failure the stored record is left as it was and the error is
    /// returned; `change` is never observed half-applied.
    pub fn update<F>(&mut self, now_ms: i64, change: F) -> Result<PersistentState, StoreError>
    where
        F: FnOnce(&mut PersistentState),
    {
        let mut state = self
            .load()?
            .unwrap_or_else(|| PersistentState::starting_at(now_ms));
        change(&mut state);
        self.write(&state)?;
        Ok(state)
    }

    /// Drop the record entirely
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.backend.remove(STATE_KEY)
    }

    fn write(&mut self, state: &PersistentState) -> Result<(), StoreError> {
        let value = serde_json::to_value(state).map_err(StoreError::Corrupt)?;
        self.backend.set(STATE_KEY, value)
    }
}
