//! Behavioral triggers
//!
//! Rate conditions over the rolling windows (scrolling, tab switching,
//! revisits, news frequency, hovering), the two-level typing/deleting
//! pattern, and the counter triggers.

use super::{Bucket, Evaluator};
use crate::catalog::TriggerId;
use crate::domain;
use crate::events::InputAction;
use crate::types::TriggerData;
use chrono::{DateTime, FixedOffset};

impl Evaluator {
    /// Count threshold and window of a rate trigger
    fn rate_params(&self, id: TriggerId) -> Option<(usize, i64)> {
        let def = self.catalog.get(id)?;
        Some((def.count_threshold? as usize, def.time_window_ms?))
    }

    /// Record one event in `bucket` for trigger `id`; the count when it
    /// reached the threshold
    fn record_rate(&mut self, id: TriggerId, bucket: Bucket, now: i64) -> Option<usize> {
        let (threshold, window) = self.rate_params(id)?;
        self.windows.record(bucket.clone(), now);
        let count = self.windows.count_within(&bucket, window, now);
        (count > 0 && count >= threshold).then_some(count)
    }

    pub(super) fn record_tab_switch(&mut self, at: DateTime<FixedOffset>) {
        if let Some(switch_count) =
            self.record_rate(TriggerId::RapidTabSwitching, Bucket::TabSwitch, at.timestamp_millis())
        {
            self.fire(TriggerId::RapidTabSwitching, TriggerData::Switches { switch_count }, at);
        }
    }

    /// Foreground arrival on `domain`, for revisit and news frequency
    pub(super) fn record_visit(&mut self, domain: &str, at: DateTime<FixedOffset>) {
        let now = at.timestamp_millis();
        let key = domain::normalize(domain);

        if let Some(visits) = self.record_rate(TriggerId::TabLooping, Bucket::Visit(key), now) {
            let data = TriggerData::Visits {
                domain: domain.to_string(),
                visits,
            };
            self.fire(TriggerId::TabLooping, data, at);
        }

        if self.catalog.applies(TriggerId::NewsSites, domain) {
            if let Some(visits) = self.record_rate(TriggerId::NewsSites, Bucket::NewsVisit, now) {
                let data = TriggerData::Visits {
                    domain: domain.to_string(),
                    visits,
                };
                self.fire(TriggerId::NewsSites, data, at);
            }
        }
    }

    /// One more productive action toward the streak counter
    pub(super) fn count_productive_action(&mut self, at: DateTime<FixedOffset>) {
        let Some((threshold, reset)) = self
            .catalog
            .get(TriggerId::ProductiveStreak)
            .and_then(|def| Some((def.counter_threshold?, def.reset_on_threshold)))
        else {
            return;
        };

        self.session.productive_actions += 1;
        let count = self.session.productive_actions;
        if count != threshold {
            return;
        }
        if reset {
            self.session.productive_actions = 0;
        }
        self.fire(TriggerId::ProductiveStreak, TriggerData::Counter { count }, at);
    }

    pub(super) fn on_scroll(&mut self, url: Option<&str>, at: DateTime<FixedOffset>) {
        let Some(domain) = self.event_domain(url) else {
            return;
        };
        if !self.catalog.applies(TriggerId::EndlessScrolling, &domain) {
            return;
        }

        let bucket = Bucket::Scroll(domain::normalize(&domain));
        if let Some(scroll_count) =
            self.record_rate(TriggerId::EndlessScrolling, bucket, at.timestamp_millis())
        {
            self.fire(TriggerId::EndlessScrolling, TriggerData::Scroll { scroll_count }, at);
        }
    }

    pub(super) fn on_hover(&mut self, url: Option<&str>, at: DateTime<FixedOffset>) {
        if let Some(raw) = url {
            tracing::trace!(url = raw, "hover");
        }
        if let Some(hover_count) =
            self.record_rate(TriggerId::HoverWithoutAction, Bucket::Hover, at.timestamp_millis())
        {
            self.fire(TriggerId::HoverWithoutAction, TriggerData::Hover { hover_count }, at);
        }
    }

    /// Typing/deleting detection.
    ///
    /// Keystrokes land in a typing or deleting bucket. When both buckets
    /// reach their thresholds inside the short window, one pattern is
    /// recorded and both buckets restart. The trigger fires once enough
    /// patterns accumulate inside the longer pattern window.
    pub(super) fn on_input(&mut self, url: Option<&str>, input_type: &str, at: DateTime<FixedOffset>) {
        let now = at.timestamp_millis();
        self.windows.clear_key(&Bucket::Hover);

        let Some(def) = self.catalog.get(TriggerId::FrequentTypingDeleting) else {
            return;
        };
        let (Some(type_threshold), Some(window), Some(pattern)) =
            (def.count_threshold, def.time_window_ms, def.pattern.clone())
        else {
            return;
        };

        let bucket = match InputAction::from_input_type(input_type) {
            InputAction::Typing => Bucket::Typing,
            InputAction::Deleting => Bucket::Deleting,
        };
        self.windows.record(bucket, now);

        let typing_count = self.windows.count_within(&Bucket::Typing, window, now);
        let deleting_count = self.windows.count_within(&Bucket::Deleting, window, now);
        if typing_count == 0
            || typing_count < type_threshold as usize
            || deleting_count < pattern.delete_threshold as usize
        {
            return;
        }

        self.windows.record(Bucket::TypingPattern, now);
        self.windows.clear_key(&Bucket::Typing);
        self.windows.clear_key(&Bucket::Deleting);

        let pattern_count =
            self.windows
                .count_within(&Bucket::TypingPattern, pattern.pattern_window_ms, now);
        tracing::debug!(pattern_count, url = url.unwrap_or_default(), "typing/deleting pattern");
        if pattern_count < pattern.repetitions as usize {
            return;
        }

        let data = TriggerData::Typing {
            typing_count,
            deleting_count,
            pattern_count,
        };
        if self.fire(TriggerId::FrequentTypingDeleting, data, at) {
            self.windows.clear_key(&Bucket::TypingPattern);
        }
    }

    pub(super) fn on_tab_count(&mut self, tab_count: u32, is_overloaded: bool, at: DateTime<FixedOffset>) {
        let Some(threshold) = self
            .catalog
            .get(TriggerId::OverloadedTabs)
            .and_then(|def| def.counter_threshold)
        else {
            return;
        };
        if is_overloaded || tab_count >= threshold {
            self.fire(TriggerId::OverloadedTabs, TriggerData::Counter { count: tab_count }, at);
        }
    }
}
