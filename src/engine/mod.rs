//! Trigger evaluator
//!
//! The [`Evaluator`] is the state machine at the heart of the crate. It owns
//! the catalog, rolling windows, cooldowns, timers, and the persistent-state
//! store, consumes [`TimedEvent`]s and timer ticks, and decides which triggers
//! fire. Fired triggers are delivered to registered callbacks and also
//! returned from the call that fired them.
//!
//! Transient failures (unknown tab, unparsable URL, store errors) are logged
//! and turn the current evaluation into a no-op; nothing here panics or
//! returns an error for them.

mod behavior;
mod content;
mod tabs;

#[cfg(test)]
mod scenarios;

use crate::catalog::{Catalog, TriggerDefinition, TriggerId};
use crate::config::EngineConfig;
use crate::cooldown::ActiveTriggerSet;
use crate::dispatch::{CallbackId, CallbackResult, Dispatcher};
use crate::domain::PageUrl;
use crate::error::{EngineError, StoreError};
use crate::events::{BrowserEvent, TabRegistry, TabSnapshot, TabSource, TimedEvent};
use crate::state::{PersistentState, StateStore};
use crate::timers::{TimerKind, TimerSet};
use crate::types::{FiredTrigger, TriggerData};
use crate::window::RollingWindow;
use chrono::{DateTime, FixedOffset, Timelike};
use serde::Serialize;

/// Foreground visibility of the tracked tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Active,
    Inactive,
}

/// Keys of the evaluator's rolling windows
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Bucket {
    /// Scroll bursts on one normalized domain
    Scroll(String),
    TabSwitch,
    /// Foreground arrivals on one normalized domain
    Visit(String),
    /// Foreground arrivals on any news domain
    NewsVisit,
    Typing,
    Deleting,
    /// Completed typing/deleting patterns
    TypingPattern,
    Hover,
}

/// The tab currently in the foreground
#[derive(Debug, Clone)]
pub(crate) struct ForegroundTab {
    pub(crate) snapshot: TabSnapshot,
    pub(crate) page: PageUrl,
    pub(crate) domain: String,
    /// Dwell start
    pub(crate) started_at: i64,
    /// Whether the reward/distraction transition for this arrival was stored
    pub(crate) state_synced: bool,
}

#[derive(Debug, Default)]
pub(crate) struct Session {
    pub(crate) current: Option<ForegroundTab>,
    pub(crate) visibility: Visibility,
    pub(crate) hidden_since: Option<i64>,
    pub(crate) first_tab_seen: bool,
    pub(crate) productive_actions: u32,
}

/// Behavioral trigger engine for one browsing context
pub struct Evaluator {
    catalog: Catalog,
    config: EngineConfig,
    store: StateStore,
    dispatcher: Dispatcher,
    tabs: Box<dyn TabSource>,
    windows: RollingWindow<Bucket>,
    cooldowns: ActiveTriggerSet,
    timers: TimerSet,
    session: Session,
    running: bool,
    fired: Vec<FiredTrigger>,
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("triggers", &self.catalog.len())
            .field("running", &self.running)
            .field("visibility", &self.session.visibility)
            .field("callbacks", &self.dispatcher.callback_count())
            .field("active_cooldowns", &self.cooldowns.len())
            .finish_non_exhaustive()
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Evaluator {
    /// Create an evaluator over a validated catalog
    pub fn new(catalog: Catalog, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self::from_parts(catalog, config))
    }

    /// Built-in catalog with default configuration
    pub fn builtin() -> Self {
        Self::from_parts(Catalog::builtin(), EngineConfig::default())
    }

    fn from_parts(catalog: Catalog, config: EngineConfig) -> Self {
        Self {
            timers: TimerSet::new(&config),
            windows: RollingWindow::new(config.retention_ms),
            catalog,
            config,
            store: StateStore::default(),
            dispatcher: Dispatcher::new(),
            tabs: Box::new(TabRegistry::new()),
            cooldowns: ActiveTriggerSet::new(),
            session: Session::default(),
            running: false,
            fired: Vec::new(),
        }
    }

    /// Use a host-provided persistent store
    pub fn with_store(mut self, store: StateStore) -> Self {
        self.store = store;
        self
    }

    /// Resolve tab ids through a host-provided source
    pub fn with_tab_source(mut self, tabs: impl TabSource + 'static) -> Self {
        self.tabs = Box::new(tabs);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn visibility(&self) -> Visibility {
        self.session.visibility
    }

    /// Snapshot of the foreground tab, if one is tracked
    pub fn current_tab(&self) -> Option<&TabSnapshot> {
        self.session.current.as_ref().map(|fg| &fg.snapshot)
    }

    /// The stored cross-navigation record
    pub fn state(&self) -> Result<Option<PersistentState>, StoreError> {
        self.store.load()
    }

    /// Register a consumer for fired triggers
    pub fn on_trigger<F>(&mut self, callback: F) -> CallbackId
    where
        F: FnMut(&TriggerDefinition, &TriggerData) -> CallbackResult + 'static,
    {
        self.dispatcher.on_trigger(callback)
    }

    pub fn remove_callback(&mut self, id: CallbackId) -> bool {
        self.dispatcher.remove_callback(id)
    }

    /// Initialize persistent state and arm the periodic timers
    pub fn start(&mut self, at: DateTime<FixedOffset>) {
        if self.running {
            tracing::debug!("evaluator already running");
            return;
        }
        let now = at.timestamp_millis();

        if let Err(err) = self.store.initialize(now) {
            tracing::warn!("could not initialize trigger state: {err}");
        }
        self.timers.arm_all(now);
        self.running = true;

        tracing::info!(triggers = self.catalog.len(), "evaluator started");
    }

    /// Cancel timers and release every in-memory tracker.
    ///
    /// The persistent record is kept; a later `start` resumes from it.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.timers.cancel_all();
        self.windows.clear();
        self.cooldowns.clear();
        self.session = Session::default();
        self.fired.clear();
        self.running = false;

        tracing::info!("evaluator stopped");
    }

    /// Handle one host event, returning the triggers it fired
    pub fn handle(&mut self, event: &TimedEvent) -> Vec<FiredTrigger> {
        self.handle_event(&event.event, event.timestamp)
    }

    /// Handle `event` observed at `at`
    pub fn handle_event(&mut self, event: &BrowserEvent, at: DateTime<FixedOffset>) -> Vec<FiredTrigger> {
        if !self.running {
            tracing::debug!(event = event.event_type(), "evaluator stopped, event ignored");
            return Vec::new();
        }
        tracing::debug!(event = event.event_type(), "handling event");

        match event {
            BrowserEvent::TabCreated { tab } => self.tabs.observe(tab.clone()),
            BrowserEvent::TabActivated { tab_id, tab } => {
                self.on_tab_activated(*tab_id, tab.as_ref(), at)
            }
            BrowserEvent::TabUpdated {
                tab_id,
                status,
                tab,
            } => self.on_tab_updated(*tab_id, *status, tab, at),
            BrowserEvent::TabRemoved { tab_id } => self.on_tab_removed(*tab_id, at),
            BrowserEvent::VisibilityChanged { hidden } => self.on_visibility_changed(*hidden, at),
            BrowserEvent::Scroll { url } => self.on_scroll(url.as_deref(), at),
            BrowserEvent::Input { url, input_type } => {
                self.on_input(url.as_deref(), input_type, at)
            }
            BrowserEvent::Hover { url } => self.on_hover(url.as_deref(), at),
            BrowserEvent::UrlChanged {
                tab_id,
                url,
                title,
                description,
            } => self.on_url_changed(*tab_id, url, title, description.as_deref(), at),
            BrowserEvent::TabCountUpdated {
                tab_count,
                is_overloaded,
            } => self.on_tab_count(*tab_count, *is_overloaded, at),
        }

        std::mem::take(&mut self.fired)
    }

    /// Run every timer due at `at`, returning the triggers they fired
    pub fn tick(&mut self, at: DateTime<FixedOffset>) -> Vec<FiredTrigger> {
        if !self.running {
            return Vec::new();
        }
        let now = at.timestamp_millis();

        for timer in self.timers.due(now) {
            tracing::debug!(timer = timer.as_str(), "timer due");
            match timer {
                TimerKind::DurationCheck => self.check_foreground(at),
                TimerKind::StreakCheck => self.refresh_streak(at),
                TimerKind::Prune => self.prune(now),
            }
        }

        std::mem::take(&mut self.fired)
    }

    fn prune(&mut self, now: i64) {
        self.windows.prune(self.config.retention_ms, now);
        self.cooldowns.expire(now);
        tracing::debug!(
            window_keys = self.windows.key_count(),
            cooldowns = self.cooldowns.len(),
            "pruned trackers"
        );
    }

    /// Apply the firing policy to a detection.
    ///
    /// Returns whether the trigger was dispatched.
    pub(crate) fn fire(&mut self, id: TriggerId, data: TriggerData, at: DateTime<FixedOffset>) -> bool {
        if !self.running {
            return false;
        }
        let Some(definition) = self.catalog.get(id) else {
            return false;
        };
        let now = at.timestamp_millis();

        if let Some(limit) = definition.morning_hour_limit {
            if at.hour() >= limit {
                tracing::debug!(trigger = %id, hour = at.hour(), "past morning limit, not firing");
                return false;
            }
        }

        let cooldown = self.config.cooldown_for(definition);
        if !self.cooldowns.try_activate(id, now, cooldown) {
            tracing::debug!(trigger = %id, "suppressed by cooldown");
            return false;
        }

        tracing::info!(trigger = %id, kind = definition.kind.as_str(), "trigger fired");
        let report = self.dispatcher.dispatch(definition, &data);
        if report.failed > 0 {
            tracing::warn!(trigger = %id, failed = report.failed, "some callbacks failed");
        }
        self.fired.push(FiredTrigger::new(definition, data, at));

        if let Err(err) = self.store.update(now, |state| {
            state.distraction_state.last_trigger_times.insert(id, now);
        }) {
            tracing::warn!(trigger = %id, "could not record fire time: {err}");
        }

        true
    }

    fn is_productive(&self, domain: &str) -> bool {
        self.catalog.applies(TriggerId::ProductiveWebsite, domain)
    }

    fn is_distraction(&self, domain: &str) -> bool {
        self.catalog.applies(TriggerId::DistractionFree, domain)
    }

    /// Domain of an event URL, falling back to the foreground tab
    fn event_domain(&self, url: Option<&str>) -> Option<String> {
        match url {
            Some(raw) => match PageUrl::parse(raw) {
                Ok(page) => Some(page.host().to_string()),
                Err(err) => {
                    tracing::warn!("ignoring event: {err}");
                    None
                }
            },
            None => self.session.current.as_ref().map(|fg| fg.domain.clone()),
        }
    }
}
