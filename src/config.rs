//! Engine configuration
//!
//! Every field has a default, so an empty JSON object is a valid config.

use crate::catalog::{TriggerDefinition, TriggerKind};
use crate::error::EngineError;
use crate::window::DEFAULT_RETENTION_MS;
use serde::{Deserialize, Serialize};

const SECOND_MS: i64 = 1000;
const MINUTE_MS: i64 = 60 * SECOND_MS;

/// Default cooldown per trigger kind, used when a definition has none
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KindCooldowns {
    pub instant_ms: i64,
    pub duration_ms: i64,
    pub behavior_ms: i64,
    pub content_ms: i64,
    pub counter_ms: i64,
    pub frequency_ms: i64,
}

impl Default for KindCooldowns {
    fn default() -> Self {
        Self {
            instant_ms: 30 * SECOND_MS,
            duration_ms: 5 * MINUTE_MS,
            behavior_ms: 5 * MINUTE_MS,
            content_ms: 5 * MINUTE_MS,
            counter_ms: 30 * SECOND_MS,
            frequency_ms: 5 * MINUTE_MS,
        }
    }
}

impl KindCooldowns {
    pub fn for_kind(&self, kind: TriggerKind) -> i64 {
        match kind {
            TriggerKind::Instant => self.instant_ms,
            TriggerKind::Duration => self.duration_ms,
            TriggerKind::Behavior => self.behavior_ms,
            TriggerKind::Content => self.content_ms,
            TriggerKind::Counter => self.counter_ms,
            TriggerKind::Frequency => self.frequency_ms,
        }
    }
}

/// Timing knobs of the evaluator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Period of the dwell-time re-evaluation tick
    pub duration_tick_ms: i64,
    /// Period of the distraction-free streak re-check
    pub streak_tick_ms: i64,
    /// Period of rolling-window pruning
    pub prune_interval_ms: i64,
    /// Oldest event a rolling window keeps
    pub retention_ms: i64,
    /// Hidden for longer than this resets the active tab's dwell start
    pub hidden_reset_ms: i64,
    /// Minimum gap between two distraction-free celebrations
    pub distraction_free_refire_ms: i64,
    pub cooldowns: KindCooldowns,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            duration_tick_ms: 10 * SECOND_MS,
            streak_tick_ms: MINUTE_MS,
            prune_interval_ms: MINUTE_MS,
            retention_ms: DEFAULT_RETENTION_MS,
            hidden_reset_ms: 5 * MINUTE_MS,
            distraction_free_refire_ms: 10 * MINUTE_MS,
            cooldowns: KindCooldowns::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let periods = [
            ("duration_tick_ms", self.duration_tick_ms),
            ("streak_tick_ms", self.streak_tick_ms),
            ("prune_interval_ms", self.prune_interval_ms),
            ("retention_ms", self.retention_ms),
        ];
        for (field, value) in periods {
            if value <= 0 {
                return Err(EngineError::InvalidConfig(format!(
                    "{field} must be positive, got {value}"
                )));
            }
        }

        let gaps = [
            ("hidden_reset_ms", self.hidden_reset_ms),
            ("distraction_free_refire_ms", self.distraction_free_refire_ms),
            ("cooldowns.instant_ms", self.cooldowns.instant_ms),
            ("cooldowns.duration_ms", self.cooldowns.duration_ms),
            ("cooldowns.behavior_ms", self.cooldowns.behavior_ms),
            ("cooldowns.content_ms", self.cooldowns.content_ms),
            ("cooldowns.counter_ms", self.cooldowns.counter_ms),
            ("cooldowns.frequency_ms", self.cooldowns.frequency_ms),
        ];
        for (field, value) in gaps {
            if value < 0 {
                return Err(EngineError::InvalidConfig(format!(
                    "{field} must not be negative, got {value}"
                )));
            }
        }

        Ok(())
    }

    /// Cooldown applied after `definition` fires
    pub fn cooldown_for(&self, definition: &TriggerDefinition) -> i64 {
        definition
            .cooldown_ms
            .unwrap_or_else(|| self.cooldowns.for_kind(definition.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, TriggerId};

    #[test]
    fn test_empty_object_is_default() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.duration_tick_ms, 10_000);
    }

    #[test]
    fn test_partial_override() {
        let config =
            EngineConfig::from_json(r#"{"streak_tick_ms": 5000, "cooldowns": {"instant_ms": 0}}"#)
                .unwrap();

        assert_eq!(config.streak_tick_ms, 5_000);
        assert_eq!(config.cooldowns.instant_ms, 0);
        assert_eq!(config.cooldowns.duration_ms, 300_000);
    }

    #[test]
    fn test_non_positive_period_is_rejected() {
        let err = EngineConfig::from_json(r#"{"duration_tick_ms": 0}"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(ref msg) if msg.contains("duration_tick_ms")));
    }

    #[test]
    fn test_definition_cooldown_overrides_kind_default() {
        let config = EngineConfig::default();
        let catalog = Catalog::builtin();

        let typing = catalog.get(TriggerId::FrequentTypingDeleting).unwrap();
        assert_eq!(config.cooldown_for(typing), 120_000);

        let games = catalog.get(TriggerId::WebGames).unwrap();
        assert_eq!(config.cooldown_for(games), 30_000);

        let binge = catalog.get(TriggerId::BingeWatching).unwrap();
        assert_eq!(config.cooldown_for(binge), 300_000);
    }
}
