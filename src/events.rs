//! Inbound event model
//!
//! Everything the host environment tells the engine arrives as a
//! [`BrowserEvent`]. Events are timestamped by the host ([`TimedEvent`]);
//! the engine never reads a wall clock, so replaying a recorded stream is
//! deterministic.

use crate::error::EngineError;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Read-only projection of a browser tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabSnapshot {
    pub id: i64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub active: bool,
    /// Page description, when the host extracted one (YouTube video pages)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TabSnapshot {
    pub fn new(id: i64, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            title: String::new(),
            active: true,
            description: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// Load status reported with a tab update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    Loading,
    Complete,
}

/// Classified text-input action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    Typing,
    Deleting,
}

impl InputAction {
    /// Classify a DOM `inputType` (`insertText`, `deleteContentBackward`, ...)
    pub fn from_input_type(input_type: &str) -> Self {
        if input_type.starts_with("delete") {
            InputAction::Deleting
        } else {
            InputAction::Typing
        }
    }
}

/// Host-delivered browser signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum BrowserEvent {
    TabCreated {
        tab: TabSnapshot,
    },
    /// A tab became the foreground tab. Hosts may attach the tab itself;
    /// otherwise it is resolved through the [`TabSource`].
    TabActivated {
        tab_id: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tab: Option<TabSnapshot>,
    },
    TabUpdated {
        tab_id: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<ChangeStatus>,
        tab: TabSnapshot,
    },
    TabRemoved {
        tab_id: i64,
    },
    VisibilityChanged {
        hidden: bool,
    },
    /// Debounced scroll burst from a content script
    Scroll {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    Input {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default)]
        input_type: String,
    },
    Hover {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    /// Single-page navigation that did not reload the tab
    UrlChanged {
        tab_id: i64,
        url: String,
        #[serde(default)]
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// Open-tab count reported by the host's tab counter
    TabCountUpdated {
        tab_count: u32,
        #[serde(default)]
        is_overloaded: bool,
    },
}

impl BrowserEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            BrowserEvent::TabCreated { .. } => "tab_created",
            BrowserEvent::TabActivated { .. } => "tab_activated",
            BrowserEvent::TabUpdated { .. } => "tab_updated",
            BrowserEvent::TabRemoved { .. } => "tab_removed",
            BrowserEvent::VisibilityChanged { .. } => "visibility_changed",
            BrowserEvent::Scroll { .. } => "scroll",
            BrowserEvent::Input { .. } => "input",
            BrowserEvent::Hover { .. } => "hover",
            BrowserEvent::UrlChanged { .. } => "url_changed",
            BrowserEvent::TabCountUpdated { .. } => "tab_count_updated",
        }
    }
}

/// A [`BrowserEvent`] with the host time it was observed at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub timestamp: DateTime<FixedOffset>,
    #[serde(flatten)]
    pub event: BrowserEvent,
}

impl TimedEvent {
    pub fn new(timestamp: DateTime<FixedOffset>, event: BrowserEvent) -> Self {
        Self { timestamp, event }
    }

    /// Parse one NDJSON line
    pub fn from_json(line: &str) -> Result<Self, EngineError> {
        serde_json::from_str(line).map_err(|e| EngineError::InvalidEvent(e.to_string()))
    }
}

/// Where the evaluator resolves tab ids to snapshots
pub trait TabSource {
    fn get(&self, tab_id: i64) -> Result<TabSnapshot, EngineError>;

    /// Record the latest known state of a tab
    fn observe(&mut self, tab: TabSnapshot);

    fn forget(&mut self, tab_id: i64);
}

/// Tab source built from the create/update events the engine has seen
#[derive(Debug, Default, Clone)]
pub struct TabRegistry {
    tabs: HashMap<i64, TabSnapshot>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

impl TabSource for TabRegistry {
    fn get(&self, tab_id: i64) -> Result<TabSnapshot, EngineError> {
        self.tabs
            .get(&tab_id)
            .cloned()
            .ok_or(EngineError::TabNotFound(tab_id))
    }

    fn observe(&mut self, tab: TabSnapshot) {
        self.tabs.insert(tab.id, tab);
    }

    fn forget(&mut self, tab_id: i64) {
        self.tabs.remove(&tab_id);
    }
}
