//! Tab lifecycle transitions
//!
//! Activation, completed updates, in-page navigation, closing, and
//! visibility changes of the foreground tab, plus the reward/distraction
//! bookkeeping they drive in the persistent record.

use super::{Evaluator, ForegroundTab, Visibility};
use crate::catalog::TriggerId;
use crate::domain::{self, PageUrl};
use crate::events::{ChangeStatus, TabSnapshot};
use crate::state::{PersistentState, ProductiveVisit};
use crate::types::TriggerData;
use chrono::{DateTime, FixedOffset, Timelike};

impl Evaluator {
    pub(super) fn on_tab_activated(
        &mut self,
        tab_id: i64,
        tab: Option<&TabSnapshot>,
        at: DateTime<FixedOffset>,
    ) {
        if let Some(tab) = tab {
            self.tabs.observe(tab.clone());
        }
        let snapshot = match self.tabs.get(tab_id) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!("activation skipped: {err}");
                return;
            }
        };

        self.record_tab_switch(at);
        self.enter_foreground(TabSnapshot { active: true, ..snapshot }, at);
    }

    pub(super) fn on_tab_updated(
        &mut self,
        tab_id: i64,
        status: Option<ChangeStatus>,
        tab: &TabSnapshot,
        at: DateTime<FixedOffset>,
    ) {
        let snapshot = TabSnapshot {
            id: tab_id,
            ..tab.clone()
        };
        self.tabs.observe(snapshot.clone());

        if status != Some(ChangeStatus::Complete) || snapshot.url.is_empty() || !snapshot.active {
            return;
        }
        self.navigate(snapshot, at);
    }

    pub(super) fn on_url_changed(
        &mut self,
        tab_id: i64,
        url: &str,
        title: &str,
        description: Option<&str>,
        at: DateTime<FixedOffset>,
    ) {
        let base = self
            .tabs
            .get(tab_id)
            .unwrap_or_else(|_| TabSnapshot::new(tab_id, url));
        let snapshot = TabSnapshot {
            url: url.to_string(),
            title: if title.is_empty() { base.title.clone() } else { title.to_string() },
            description: description.map(str::to_string),
            ..base
        };
        self.tabs.observe(snapshot.clone());

        let is_current = self
            .session
            .current
            .as_ref()
            .is_some_and(|fg| fg.snapshot.id == tab_id);
        if is_current {
            self.navigate(TabSnapshot { active: true, ..snapshot }, at);
        }
    }

    /// A foreground tab now shows `snapshot`.
    ///
    /// Staying on the same domain keeps the dwell clock and only re-runs the
    /// content checks; a new domain is a full foreground arrival.
    fn navigate(&mut self, snapshot: TabSnapshot, at: DateTime<FixedOffset>) {
        let same_site = self.session.current.as_ref().is_some_and(|fg| {
            fg.snapshot.id == snapshot.id
                && PageUrl::parse(&snapshot.url)
                    .is_ok_and(|page| domain::normalize(page.host()) == domain::normalize(&fg.domain))
        });

        if !same_site {
            self.enter_foreground(snapshot, at);
            return;
        }

        let page = match PageUrl::parse(&snapshot.url) {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!("navigation skipped: {err}");
                return;
            }
        };
        if let Some(fg) = self.session.current.as_mut() {
            fg.snapshot = snapshot.clone();
            fg.page = page.clone();
        }
        self.check_content(&snapshot, &page, at);
        self.refresh_productive_visit(at);
    }

    /// Restamp the productive visit on in-site navigation; reward switching
    /// measures from the last productive page, not the first
    fn refresh_productive_visit(&mut self, at: DateTime<FixedOffset>) {
        let Some((domain, synced)) = self
            .session
            .current
            .as_ref()
            .map(|fg| (fg.domain.clone(), fg.state_synced))
        else {
            return;
        };
        if !synced {
            self.sync_foreground_state(at);
            return;
        }
        if !self.is_productive_arrival(&domain) {
            return;
        }

        let now = at.timestamp_millis();
        let result = self.store.update(now, |state| {
            state.last_productive_visit = Some(ProductiveVisit {
                domain: domain.clone(),
                start_time: now,
            });
        });
        if let Err(err) = result {
            tracing::warn!(%domain, "productive visit not refreshed: {err}");
        }
    }

    /// Productive for reward switching: a productive app or productive site
    fn is_productive_arrival(&self, domain: &str) -> bool {
        let productive_app = self
            .catalog
            .get(TriggerId::RewardSwitching)
            .and_then(|def| def.reward.as_ref())
            .is_some_and(|params| domain::is_in_list(domain, &params.productive_apps));
        productive_app || self.is_productive(domain)
    }

    fn enter_foreground(&mut self, snapshot: TabSnapshot, at: DateTime<FixedOffset>) {
        let now = at.timestamp_millis();
        self.leave_foreground(at);

        let page = match PageUrl::parse(&snapshot.url) {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(tab = snapshot.id, "foreground tab not evaluated: {err}");
                return;
            }
        };
        let domain = page.host().to_string();
        tracing::debug!(tab = snapshot.id, %domain, "tab in foreground");

        self.record_visit(&domain, at);

        self.session.current = Some(ForegroundTab {
            snapshot: snapshot.clone(),
            page: page.clone(),
            domain: domain.clone(),
            started_at: now,
            state_synced: false,
        });
        self.session.visibility = Visibility::Active;
        self.session.hidden_since = None;

        if !self.session.first_tab_seen {
            self.session.first_tab_seen = true;
            if self.catalog.applies(TriggerId::FirstTab, &domain) {
                self.fire(TriggerId::FirstTab, TriggerData::Domain { domain: domain.clone() }, at);
            }
        }

        self.check_instant(&domain, at);
        self.check_content(&snapshot, &page, at);
        self.sync_foreground_state(at);
    }

    /// Close out the foreground tab: its dwell counts toward a long
    /// productive session
    fn leave_foreground(&mut self, at: DateTime<FixedOffset>) -> Option<ForegroundTab> {
        let previous = self.session.current.take()?;
        let dwell = at.timestamp_millis() - previous.started_at;
        self.check_dwell(TriggerId::ProductiveDuration, &previous.domain, dwell, at);
        Some(previous)
    }

    /// Instant domain triggers for a fresh arrival
    fn check_instant(&mut self, domain: &str, at: DateTime<FixedOffset>) {
        let data = || TriggerData::Domain {
            domain: domain.to_string(),
        };

        if self.is_productive(domain) {
            self.fire(TriggerId::ProductiveWebsite, data(), at);
            self.count_productive_action(at);
        }

        if self.catalog.applies(TriggerId::WorkDocument, domain) {
            self.fire(TriggerId::WorkDocument, data(), at);
            self.count_productive_action(at);
        }

        let before_limit = self
            .catalog
            .get(TriggerId::MorningSurge)
            .and_then(|def| def.morning_hour_limit)
            .is_some_and(|limit| at.hour() < limit);
        if before_limit && self.catalog.applies(TriggerId::MorningSurge, domain) {
            let data = TriggerData::Morning {
                domain: domain.to_string(),
                hour: at.hour(),
            };
            self.fire(TriggerId::MorningSurge, data, at);
        }

        for id in [TriggerId::ShoppingSites, TriggerId::WebGames] {
            if self.catalog.applies(id, domain) {
                self.fire(id, data(), at);
            }
        }
    }

    /// Fire `id` if `domain` is covered and `dwell` reached its threshold
    pub(super) fn check_dwell(
        &mut self,
        id: TriggerId,
        domain: &str,
        dwell: i64,
        at: DateTime<FixedOffset>,
    ) -> bool {
        let Some(threshold) = self
            .catalog
            .get(id)
            .filter(|def| def.applies_to(domain))
            .and_then(|def| def.time_threshold_ms)
        else {
            return false;
        };
        if dwell < threshold {
            return false;
        }
        let data = TriggerData::Duration {
            duration: dwell,
            domain: domain.to_string(),
        };
        self.fire(id, data, at)
    }

    /// Every dwell trigger covering the foreground domain
    pub(super) fn check_foreground_dwell(&mut self, at: DateTime<FixedOffset>) {
        let Some((domain, started_at)) = self
            .session
            .current
            .as_ref()
            .map(|fg| (fg.domain.clone(), fg.started_at))
        else {
            return;
        };
        let dwell = at.timestamp_millis() - started_at;
        let ids: Vec<TriggerId> = self
            .catalog
            .dwell_triggers_for(&domain)
            .map(|def| def.id)
            .collect();
        for id in ids {
            self.check_dwell(id, &domain, dwell, at);
        }
    }

    /// Periodic re-evaluation of the visible foreground tab
    pub(super) fn check_foreground(&mut self, at: DateTime<FixedOffset>) {
        if self.session.visibility != Visibility::Active {
            return;
        }
        if self.session.current.as_ref().is_some_and(|fg| !fg.state_synced) {
            tracing::debug!("retrying foreground state transition");
            self.sync_foreground_state(at);
        }
        self.check_foreground_dwell(at);
    }

    /// Store the reward-switching and distraction transitions of the
    /// foreground arrival as one record update.
    ///
    /// If the store fails, nothing is applied and the arrival stays unsynced
    /// so the next duration tick retries it.
    pub(super) fn sync_foreground_state(&mut self, at: DateTime<FixedOffset>) {
        let Some((domain, arrived)) = self
            .session
            .current
            .as_ref()
            .filter(|fg| !fg.state_synced)
            .map(|fg| (fg.domain.clone(), fg.started_at))
        else {
            return;
        };

        let reward = self
            .catalog
            .get(TriggerId::RewardSwitching)
            .and_then(|def| Some((def.reward.clone()?, def.time_threshold_ms?)));
        let reward_app = reward
            .as_ref()
            .is_some_and(|(params, _)| domain::is_in_list(&domain, &params.reward_apps));
        let productive = self.is_productive_arrival(&domain);
        let distraction = self.is_distraction(&domain);
        let domain_key = domain::normalize(&domain);

        let mut reward_switch = None;
        let result = self.store.update(arrived, |state: &mut PersistentState| {
            if productive {
                state.last_productive_visit = Some(ProductiveVisit {
                    domain: domain.clone(),
                    start_time: arrived,
                });
            } else if reward_app {
                if let (Some(visit), Some((params, threshold))) =
                    (state.last_productive_visit.take(), reward.as_ref())
                {
                    let elapsed = arrived - visit.start_time;
                    if domain::is_in_list(&visit.domain, &params.productive_apps)
                        && (0..=*threshold).contains(&elapsed)
                    {
                        reward_switch = Some((visit.domain, elapsed));
                    }
                }
            } else {
                state.last_productive_visit = None;
            }

            let streak = &mut state.distraction_state;
            if distraction {
                streak.is_currently_on_distraction = true;
                streak.last_distraction_time = arrived;
                streak.closed_distractions.remove(&domain_key);
            } else if streak.is_currently_on_distraction {
                streak.is_currently_on_distraction = false;
                streak.distraction_free_start_time = arrived;
            }
        });

        match result {
            Ok(_) => {
                if let Some(fg) = self.session.current.as_mut() {
                    fg.state_synced = true;
                }
                if let Some((from, time_taken)) = reward_switch {
                    let data = TriggerData::Reward {
                        from,
                        to: domain,
                        time_taken,
                    };
                    self.fire(TriggerId::RewardSwitching, data, at);
                }
            }
            Err(err) => tracing::warn!(%domain, "trigger state not updated: {err}"),
        }
    }

    pub(super) fn on_tab_removed(&mut self, tab_id: i64, at: DateTime<FixedOffset>) {
        self.tabs.forget(tab_id);

        let is_current = self
            .session
            .current
            .as_ref()
            .is_some_and(|fg| fg.snapshot.id == tab_id);
        if !is_current {
            return;
        }
        let Some(closed) = self.leave_foreground(at) else {
            return;
        };
        if !self.catalog.applies(TriggerId::ClosedDistraction, &closed.domain) {
            return;
        }

        let domain_key = domain::normalize(&closed.domain);
        let mut newly_closed = false;
        let result = self.store.update(at.timestamp_millis(), |state| {
            let streak = &mut state.distraction_state;
            if streak.is_currently_on_distraction
                && !streak.closed_distractions.contains(&domain_key)
            {
                streak.closed_distractions.insert(domain_key.clone());
                newly_closed = true;
            }
        });

        match result {
            Ok(_) if newly_closed => {
                let data = TriggerData::Domain {
                    domain: closed.domain,
                };
                self.fire(TriggerId::ClosedDistraction, data, at);
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(tab = tab_id, "closed tab not recorded: {err}"),
        }
    }

    pub(super) fn on_visibility_changed(&mut self, hidden: bool, at: DateTime<FixedOffset>) {
        let now = at.timestamp_millis();

        if hidden {
            if self.session.visibility == Visibility::Inactive {
                return;
            }
            self.check_foreground_dwell(at);
            self.session.visibility = Visibility::Inactive;
            self.session.hidden_since = Some(now);
            return;
        }

        if self.session.visibility == Visibility::Active {
            return;
        }
        if let Some(since) = self.session.hidden_since.take() {
            if now - since > self.config.hidden_reset_ms {
                if let Some(fg) = self.session.current.as_mut() {
                    fg.started_at = now;
                }
            }
        }
        self.session.visibility = Visibility::Active;
        self.refresh_streak(at);
    }

    /// Advance the distraction-free streak, firing when it is long enough
    pub(super) fn refresh_streak(&mut self, at: DateTime<FixedOffset>) {
        let now = at.timestamp_millis();
        let Some(threshold) = self
            .catalog
            .get(TriggerId::DistractionFree)
            .and_then(|def| def.time_threshold_ms)
        else {
            return;
        };

        let state = match self.store.load() {
            Ok(state) => state.unwrap_or_else(|| PersistentState::starting_at(now)),
            Err(err) => {
                tracing::warn!("streak check skipped: {err}");
                return;
            }
        };
        let on_distraction_page = self
            .session
            .current
            .as_ref()
            .is_some_and(|fg| self.is_distraction(&fg.domain));
        if on_distraction_page {
            return;
        }

        let streak = &state.distraction_state;
        if streak.is_currently_on_distraction {
            if let Err(err) = self.store.update(now, |state| {
                state.distraction_state.is_currently_on_distraction = false;
                state.distraction_state.distraction_free_start_time = now;
            }) {
                tracing::warn!("streak transition not stored: {err}");
            }
            return;
        }

        let elapsed = now - streak.distraction_free_start_time;
        let since_last_fire = state
            .last_fired(TriggerId::DistractionFree)
            .map(|last| now - last);
        let refire_gap = self.config.distraction_free_refire_ms;
        if elapsed >= threshold && since_last_fire.map_or(true, |gap| gap >= refire_gap) {
            self.fire(
                TriggerId::DistractionFree,
                TriggerData::Elapsed { duration: elapsed },
                at,
            );
        }
    }
}
