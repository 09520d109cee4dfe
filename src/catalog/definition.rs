//! Trigger definition types
//!
//! A [`TriggerDefinition`] is one immutable row of the trigger catalog. The
//! serialized form is what catalog JSON files contain; [`TriggerDefinition::validate`]
//! enforces the per-kind invariants before a catalog is accepted.

use crate::domain;
use crate::error::CatalogError;
use serde::{Deserialize, Serialize};

/// Identifier of every trigger the engine knows how to evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerId {
    ProductiveWebsite,
    ProductiveSearch,
    ProductiveYoutube,
    ClosedDistraction,
    DistractionFree,
    WorkDocument,
    ProductiveDuration,
    FirstTab,
    MorningSurge,
    ProductiveStreak,
    ExcessiveSocialMedia,
    YoutubeShorts,
    NonEducationalYoutube,
    EndlessScrolling,
    BingeWatching,
    OverloadedTabs,
    ShoppingSites,
    NewsSites,
    RapidTabSwitching,
    FrequentTypingDeleting,
    RewardSwitching,
    ClickbaitNews,
    MessagingPlatforms,
    WebGames,
    TabLooping,
    HoverWithoutAction,
}

impl TriggerId {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerId::ProductiveWebsite => "productive_website",
            TriggerId::ProductiveSearch => "productive_search",
            TriggerId::ProductiveYoutube => "productive_youtube",
            TriggerId::ClosedDistraction => "closed_distraction",
            TriggerId::DistractionFree => "distraction_free",
            TriggerId::WorkDocument => "work_document",
            TriggerId::ProductiveDuration => "productive_duration",
            TriggerId::FirstTab => "first_tab",
            TriggerId::MorningSurge => "morning_surge",
            TriggerId::ProductiveStreak => "productive_streak",
            TriggerId::ExcessiveSocialMedia => "excessive_social_media",
            TriggerId::YoutubeShorts => "youtube_shorts",
            TriggerId::NonEducationalYoutube => "non_educational_youtube",
            TriggerId::EndlessScrolling => "endless_scrolling",
            TriggerId::BingeWatching => "binge_watching",
            TriggerId::OverloadedTabs => "overloaded_tabs",
            TriggerId::ShoppingSites => "shopping_sites",
            TriggerId::NewsSites => "news_sites",
            TriggerId::RapidTabSwitching => "rapid_tab_switching",
            TriggerId::FrequentTypingDeleting => "frequent_typing_deleting",
            TriggerId::RewardSwitching => "reward_switching",
            TriggerId::ClickbaitNews => "clickbait_news",
            TriggerId::MessagingPlatforms => "messaging_platforms",
            TriggerId::WebGames => "web_games",
            TriggerId::TabLooping => "tab_looping",
            TriggerId::HoverWithoutAction => "hover_without_action",
        }
    }

    /// Whether the trigger only applies on its own `domains` list.
    ///
    /// The remaining triggers watch session-wide signals (tab counts, input
    /// cadence, switching) or carry their own domain lists (reward switching).
    pub fn is_domain_scoped(&self) -> bool {
        !matches!(
            self,
            TriggerId::ProductiveStreak
                | TriggerId::OverloadedTabs
                | TriggerId::RapidTabSwitching
                | TriggerId::FrequentTypingDeleting
                | TriggerId::RewardSwitching
                | TriggerId::TabLooping
                | TriggerId::HoverWithoutAction
        )
    }

    /// Whether evaluation depends on keyword matching
    pub fn requires_keywords(&self) -> bool {
        matches!(
            self,
            TriggerId::ProductiveSearch
                | TriggerId::ProductiveYoutube
                | TriggerId::NonEducationalYoutube
        )
    }
}

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detection style of a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Fires as soon as a qualifying event is observed
    Instant,
    /// Fires when dwell time on a domain reaches a threshold
    Duration,
    /// Fires when a rolling-window event count reaches a threshold
    Behavior,
    /// Fires on page-content classification (titles, descriptions)
    Content,
    /// Fires when a session counter reaches a threshold
    Counter,
    /// Fires when visits to a domain set reach a threshold within a window
    Frequency,
}

impl TriggerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::Instant => "instant",
            TriggerKind::Duration => "duration",
            TriggerKind::Behavior => "behavior",
            TriggerKind::Content => "content",
            TriggerKind::Counter => "counter",
            TriggerKind::Frequency => "frequency",
        }
    }
}

/// Second-level pattern parameters for the typing/deleting trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternParams {
    /// Delete actions required alongside the typing threshold
    pub delete_threshold: u32,
    /// Pattern occurrences required before the trigger fires
    pub repetitions: u32,
    /// Window in which the repetitions must occur
    pub pattern_window_ms: i64,
}

/// Domain lists for reward-switching detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardParams {
    pub productive_apps: Vec<String>,
    pub reward_apps: Vec<String>,
}

/// One catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDefinition {
    /// Unique trigger key
    pub id: TriggerId,
    /// Display name
    pub name: String,
    /// Display description
    #[serde(default)]
    pub description: String,
    /// Celebration or nudge text handed to UI collaborators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Detection style
    pub kind: TriggerKind,
    /// Hostname patterns this trigger applies to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<String>,
    /// Case-insensitive substrings for content and search triggers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// Dwell or elapsed-time threshold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_threshold_ms: Option<i64>,
    /// Event count threshold within `time_window_ms`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_threshold: Option<u32>,
    /// Rolling window for `count_threshold`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window_ms: Option<i64>,
    /// Threshold for counter triggers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_threshold: Option<u32>,
    /// Reset the counter to zero once it reaches the threshold
    #[serde(default)]
    pub reset_on_threshold: bool,
    /// Per-trigger cooldown overriding the kind default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_ms: Option<i64>,
    /// Local hour (exclusive) before which the trigger may fire
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morning_hour_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<PatternParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<RewardParams>,
}

impl TriggerDefinition {
    /// Create a bare definition; thresholds are attached with the `with_*` builders
    pub fn new(id: TriggerId, name: impl Into<String>, kind: TriggerKind) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            message: None,
            kind,
            domains: Vec::new(),
            keywords: Vec::new(),
            time_threshold_ms: None,
            count_threshold: None,
            time_window_ms: None,
            counter_threshold: None,
            reset_on_threshold: false,
            cooldown_ms: None,
            morning_hour_limit: None,
            pattern: None,
            reward: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_domains(mut self, domains: &[&str]) -> Self {
        self.domains = domains.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn with_time_threshold(mut self, ms: i64) -> Self {
        self.time_threshold_ms = Some(ms);
        self
    }

    pub fn with_count_window(mut self, count: u32, window_ms: i64) -> Self {
        self.count_threshold = Some(count);
        self.time_window_ms = Some(window_ms);
        self
    }

    pub fn with_counter(mut self, threshold: u32, reset_on_threshold: bool) -> Self {
        self.counter_threshold = Some(threshold);
        self.reset_on_threshold = reset_on_threshold;
        self
    }

    pub fn with_cooldown(mut self, ms: i64) -> Self {
        self.cooldown_ms = Some(ms);
        self
    }

    pub fn with_morning_hour_limit(mut self, hour: u32) -> Self {
        self.morning_hour_limit = Some(hour);
        self
    }

    pub fn with_pattern(mut self, pattern: PatternParams) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn with_reward(mut self, reward: RewardParams) -> Self {
        self.reward = Some(reward);
        self
    }

    /// Whether `domain` falls under this trigger's domain list
    pub fn applies_to(&self, domain: &str) -> bool {
        domain::is_in_list(domain, &self.domains)
    }

    /// Whether `text` contains any of this trigger's keywords (case-insensitive)
    pub fn matches_keyword(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.keywords
            .iter()
            .any(|keyword| text.contains(&keyword.to_lowercase()))
    }

    /// Check the per-kind invariants
    pub fn validate(&self) -> Result<(), CatalogError> {
        let id = self.id.as_str().to_string();

        if self.id.is_domain_scoped() && self.domains.iter().all(|d| d.trim().is_empty()) {
            return Err(CatalogError::EmptyDomains { id });
        }

        if self.id.requires_keywords() && self.keywords.is_empty() {
            return Err(CatalogError::EmptyKeywords { id });
        }

        match self.kind {
            TriggerKind::Duration => {
                self.require_positive(self.time_threshold_ms, "time_threshold_ms")?;
            }
            TriggerKind::Behavior => {
                if self.time_threshold_ms.is_none() && self.time_window_ms.is_none() {
                    return Err(self.missing("time_window_ms"));
                }
                if let Some(window) = self.time_window_ms {
                    self.require_positive(Some(window), "time_window_ms")?;
                    self.require_positive(
                        self.count_threshold.map(i64::from),
                        "count_threshold",
                    )?;
                }
                if let Some(threshold) = self.time_threshold_ms {
                    self.require_positive(Some(threshold), "time_threshold_ms")?;
                }
            }
            TriggerKind::Frequency => {
                self.require_positive(self.count_threshold.map(i64::from), "count_threshold")?;
                self.require_positive(self.time_window_ms, "time_window_ms")?;
            }
            TriggerKind::Counter => {
                self.require_positive(
                    self.counter_threshold.map(i64::from),
                    "counter_threshold",
                )?;
            }
            TriggerKind::Content => {
                if self.keywords.is_empty() {
                    return Err(CatalogError::EmptyKeywords { id });
                }
            }
            TriggerKind::Instant => {}
        }

        if let Some(cooldown) = self.cooldown_ms {
            if cooldown < 0 {
                return Err(CatalogError::NonPositive {
                    id,
                    field: "cooldown_ms",
                });
            }
        }

        if let Some(limit) = self.morning_hour_limit {
            if limit == 0 || limit > 24 {
                return Err(CatalogError::NonPositive {
                    id,
                    field: "morning_hour_limit",
                });
            }
        }

        self.validate_id_specific()
    }

    fn validate_id_specific(&self) -> Result<(), CatalogError> {
        match self.id {
            TriggerId::MorningSurge if self.morning_hour_limit.is_none() => {
                Err(self.missing("morning_hour_limit"))
            }
            TriggerId::FrequentTypingDeleting => {
                let pattern = self
                    .pattern
                    .as_ref()
                    .ok_or_else(|| self.missing("pattern"))?;
                self.require_positive(
                    Some(i64::from(pattern.delete_threshold)),
                    "pattern.delete_threshold",
                )?;
                self.require_positive(
                    Some(i64::from(pattern.repetitions)),
                    "pattern.repetitions",
                )?;
                self.require_positive(Some(pattern.pattern_window_ms), "pattern.pattern_window_ms")
            }
            TriggerId::RewardSwitching => {
                let reward = self.reward.as_ref().ok_or_else(|| self.missing("reward"))?;
                if reward.productive_apps.is_empty() || reward.reward_apps.is_empty() {
                    return Err(CatalogError::EmptyDomains {
                        id: self.id.as_str().to_string(),
                    });
                }
                self.require_positive(self.time_threshold_ms, "time_threshold_ms")
            }
            _ => Ok(()),
        }
    }

    fn require_positive(&self, value: Option<i64>, field: &'static str) -> Result<(), CatalogError> {
        match value {
            None => Err(self.missing(field)),
            Some(v) if v <= 0 => Err(CatalogError::NonPositive {
                id: self.id.as_str().to_string(),
                field,
            }),
            Some(_) => Ok(()),
        }
    }

    fn missing(&self, field: &'static str) -> CatalogError {
        CatalogError::MissingField {
            id: self.id.as_str().to_string(),
            kind: self.kind.as_str().to_string(),
            field,
        }
    }
}
