//! Trigger catalog
//!
//! The catalog is the declarative table the evaluator checks events against.
//! It is loaded once at engine start (built in or from JSON), validated as a
//! whole, and never mutated afterwards.

mod builtin;
mod definition;

pub use builtin::{builtin_definitions, DISTRACTION_DOMAINS, PRODUCTIVE_DOMAINS};
pub use definition::{
    PatternParams, RewardParams, TriggerDefinition, TriggerId, TriggerKind,
};

use crate::error::CatalogError;
use std::collections::HashMap;

/// Validated, immutable set of trigger definitions
#[derive(Debug, Clone)]
pub struct Catalog {
    definitions: Vec<TriggerDefinition>,
    index: HashMap<TriggerId, usize>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// The built-in table
    pub fn builtin() -> Self {
        Self::indexed(builtin_definitions())
    }

    /// Build a catalog from definitions, rejecting the whole set if any entry is invalid
    pub fn from_definitions(definitions: Vec<TriggerDefinition>) -> Result<Self, CatalogError> {
        if let Some((_, err)) = Self::validate_definitions(&definitions).into_iter().next() {
            return Err(err);
        }
        Ok(Self::indexed(definitions))
    }

    /// Parse a JSON array of definitions
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let definitions: Vec<TriggerDefinition> = serde_json::from_str(json)?;
        Self::from_definitions(definitions)
    }

    /// Validate every entry, returning `(index, error)` for each failure
    pub fn validate_definitions(definitions: &[TriggerDefinition]) -> Vec<(usize, CatalogError)> {
        let mut seen: HashMap<TriggerId, usize> = HashMap::new();
        let mut errors = Vec::new();

        for (idx, def) in definitions.iter().enumerate() {
            if seen.insert(def.id, idx).is_some() {
                errors.push((idx, CatalogError::DuplicateId(def.id.as_str().to_string())));
                continue;
            }
            if let Err(err) = def.validate() {
                errors.push((idx, err));
            }
        }

        errors
    }

    fn indexed(definitions: Vec<TriggerDefinition>) -> Self {
        let index = definitions
            .iter()
            .enumerate()
            .map(|(idx, def)| (def.id, idx))
            .collect();
        Self { definitions, index }
    }

    /// Look up a definition; absent entries are simply never evaluated
    pub fn get(&self, id: TriggerId) -> Option<&TriggerDefinition> {
        self.index.get(&id).map(|&idx| &self.definitions[idx])
    }

    /// Whether `domain` falls under the entry `id`
    pub fn applies(&self, id: TriggerId, domain: &str) -> bool {
        self.get(id).is_some_and(|def| def.applies_to(domain))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TriggerDefinition> {
        self.definitions.iter()
    }

    /// Duration triggers whose domain set covers `domain`.
    ///
    /// `DistractionFree` is excluded: it measures time *away* from its
    /// domains and is evaluated by the streak logic instead.
    pub fn dwell_triggers_for<'a>(
        &'a self,
        domain: &'a str,
    ) -> impl Iterator<Item = &'a TriggerDefinition> + 'a {
        self.definitions.iter().filter(move |def| {
            def.kind == TriggerKind::Duration
                && def.id != TriggerId::DistractionFree
                && def.applies_to(domain)
        })
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Serialize the catalog back to its JSON file form
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.definitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let errors = Catalog::validate_definitions(&builtin_definitions());
        assert!(errors.is_empty(), "builtin catalog errors: {:?}", errors);
        assert_eq!(Catalog::builtin().len(), 26);
    }

    #[test]
    fn test_builtin_literal_thresholds() {
        let catalog = Catalog::builtin();

        let clickbait = catalog.get(TriggerId::ClickbaitNews).unwrap();
        assert_eq!(clickbait.time_threshold_ms, Some(60_000));

        let reward = catalog.get(TriggerId::RewardSwitching).unwrap();
        assert_eq!(reward.time_threshold_ms, Some(5_000));

        let typing = catalog.get(TriggerId::FrequentTypingDeleting).unwrap();
        assert_eq!(typing.count_threshold, Some(10));
        assert_eq!(typing.pattern.as_ref().unwrap().repetitions, 2);
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut defs = builtin_definitions();
        defs.push(defs[0].clone());

        let err = Catalog::from_definitions(defs).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId(ref id) if id == "productive_website"));
    }

    #[test]
    fn test_json_roundtrip_of_builtin() {
        let json = Catalog::builtin().to_json_pretty().unwrap();
        let reloaded = Catalog::from_json(&json).unwrap();
        assert_eq!(reloaded.len(), Catalog::builtin().len());
    }

    #[test]
    fn test_invalid_entry_refuses_whole_catalog() {
        let json = r#"[
            { "id": "web_games", "name": "Games", "kind": "instant", "domains": ["poki.com"] },
            { "id": "binge_watching", "name": "Binge", "kind": "duration", "domains": ["netflix.com"] }
        ]"#;

        let err = Catalog::from_json(json).unwrap_err();
        assert!(matches!(err, CatalogError::MissingField { .. }));
    }

    #[test]
    fn test_dwell_triggers_exclude_distraction_free() {
        let catalog = Catalog::builtin();

        let ids: Vec<TriggerId> = catalog
            .dwell_triggers_for("www.netflix.com")
            .map(|def| def.id)
            .collect();
        assert_eq!(ids, vec![TriggerId::BingeWatching]);

        let ids: Vec<TriggerId> = catalog.dwell_triggers_for("github.com").map(|d| d.id).collect();
        assert_eq!(ids, vec![TriggerId::ProductiveDuration]);
    }

    #[test]
    fn test_missing_entry_is_absent() {
        let catalog = Catalog::from_definitions(vec![]).unwrap();
        assert!(catalog.get(TriggerId::FirstTab).is_none());
        assert!(!catalog.applies(TriggerId::FirstTab, "github.com"));
    }
}
