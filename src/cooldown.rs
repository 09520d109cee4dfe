//! Active trigger set
//!
//! Tracks triggers that fired recently. While an id is active, re-detections
//! are suppressed; the id leaves the set once its expiry passes.

use crate::catalog::TriggerId;
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct ActiveTriggerSet {
    expiries: HashMap<TriggerId, i64>,
}

impl ActiveTriggerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` is still cooling down at `now_ms`
    pub fn is_active(&self, id: TriggerId, now_ms: i64) -> bool {
        self.expiries.get(&id).is_some_and(|&expiry| now_ms < expiry)
    }

    /// Mark `id` active until `now_ms + cooldown_ms`.
    ///
    /// Returns `false` (and leaves the expiry alone) if `id` is already active.
    pub fn try_activate(&mut self, id: TriggerId, now_ms: i64, cooldown_ms: i64) -> bool {
        if self.is_active(id, now_ms) {
            return false;
        }
        self.expiries.insert(id, now_ms.saturating_add(cooldown_ms.max(0)));
        true
    }

    /// Remove every id whose cooldown has elapsed
    pub fn expire(&mut self, now_ms: i64) {
        self.expiries.retain(|_, &mut expiry| now_ms < expiry);
    }

    /// Expiry of `id`, if it is tracked
    pub fn expiry(&self, id: TriggerId) -> Option<i64> {
        self.expiries.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.expiries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expiries.is_empty()
    }

    pub fn clear(&mut self) {
        self.expiries.clear();
    }
}
