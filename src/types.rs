//! Core types for fired triggers
//!
//! This module defines what leaves the engine: the per-trigger payload handed
//! to dispatcher callbacks and the self-describing record the CLI and FFI
//! emit for each fired trigger.

use crate::catalog::{TriggerDefinition, TriggerId, TriggerKind};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// Payload accompanying a fired trigger.
///
/// Serialized without a tag, with camelCase fields (`timeTaken`, `scrollCount`, ...)
/// so UI collaborators read the same object shape for every trigger of a kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum TriggerData {
    /// Instant domain triggers (productive site, work document, first tab, ...)
    Domain { domain: String },
    /// Morning surge: the domain and the local hour it fired in
    Morning { domain: String, hour: u32 },
    /// Productive search query
    Search { query: String },
    /// Productive video title
    Video { title: String },
    /// YouTube Shorts page
    Shorts { url: String },
    /// Content classification result
    Content { title: String, description: String },
    /// Dwell time on a domain, in milliseconds
    Duration { duration: i64, domain: String },
    /// Length of a distraction-free stretch, in milliseconds
    Elapsed { duration: i64 },
    /// Productive-to-reward switch
    Reward {
        from: String,
        to: String,
        time_taken: i64,
    },
    /// Scroll bursts
    Scroll { scroll_count: usize },
    /// Tab switch bursts
    Switches { switch_count: usize },
    /// Repeated returns to one domain
    Visits { domain: String, visits: usize },
    /// Hovering without input
    Hover { hover_count: usize },
    /// Typing/deleting pattern repetitions
    Typing {
        typing_count: usize,
        deleting_count: usize,
        pattern_count: usize,
    },
    /// Counter triggers (productive streak, tab count)
    Counter { count: u32 },
}

/// A trigger that passed the firing policy and was dispatched
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiredTrigger {
    pub trigger_id: TriggerId,
    pub name: String,
    pub kind: TriggerKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub fired_at: DateTime<FixedOffset>,
    pub data: TriggerData,
}

impl FiredTrigger {
    pub fn new(definition: &TriggerDefinition, data: TriggerData, fired_at: DateTime<FixedOffset>) -> Self {
        Self {
            trigger_id: definition.id,
            name: definition.name.clone(),
            kind: definition.kind,
            message: definition.message.clone(),
            fired_at,
            data,
        }
    }
}
