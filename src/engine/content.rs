//! Page content classification
//!
//! Keyword checks over search queries and YouTube video pages. These run on
//! every foreground arrival and again on in-page navigation, since YouTube
//! changes videos without reloading the tab.

use super::Evaluator;
use crate::catalog::{TriggerDefinition, TriggerId};
use crate::domain::PageUrl;
use crate::events::TabSnapshot;
use crate::types::TriggerData;
use chrono::{DateTime, FixedOffset};

/// Whether a video's title and description mention any educational keyword
pub fn is_educational(definition: &TriggerDefinition, title: &str, description: &str) -> bool {
    definition.matches_keyword(&format!("{title} {description}"))
}

impl Evaluator {
    pub(super) fn check_content(&mut self, tab: &TabSnapshot, page: &PageUrl, at: DateTime<FixedOffset>) {
        self.check_search(page, at);
        self.check_youtube(tab, page, at);
    }

    fn check_search(&mut self, page: &PageUrl, at: DateTime<FixedOffset>) {
        let Some(definition) = self.catalog.get(TriggerId::ProductiveSearch) else {
            return;
        };
        if !definition.applies_to(page.host()) || !page.path().contains("/search") {
            return;
        }
        let Some(query) = page.query_param("q").filter(|q| definition.matches_keyword(q)) else {
            return;
        };

        self.fire(TriggerId::ProductiveSearch, TriggerData::Search { query }, at);
        self.count_productive_action(at);
    }

    fn check_youtube(&mut self, tab: &TabSnapshot, page: &PageUrl, at: DateTime<FixedOffset>) {
        let host = page.host();

        if page.path().starts_with("/shorts") && self.catalog.applies(TriggerId::YoutubeShorts, host) {
            let data = TriggerData::Shorts {
                url: page.as_str().to_string(),
            };
            self.fire(TriggerId::YoutubeShorts, data, at);
        }

        if !page.path().contains("/watch") || tab.title.trim().is_empty() {
            return;
        }

        let productive = self
            .catalog
            .get(TriggerId::ProductiveYoutube)
            .is_some_and(|def| def.applies_to(host) && def.matches_keyword(&tab.title));
        if productive {
            let data = TriggerData::Video {
                title: tab.title.clone(),
            };
            self.fire(TriggerId::ProductiveYoutube, data, at);
            self.count_productive_action(at);
        }

        let description = tab.description.as_deref().unwrap_or_default();
        let entertainment = self
            .catalog
            .get(TriggerId::NonEducationalYoutube)
            .is_some_and(|def| def.applies_to(host) && !is_educational(def, &tab.title, description));
        if entertainment {
            let data = TriggerData::Content {
                title: tab.title.clone(),
                description: description.to_string(),
            };
            self.fire(TriggerId::NonEducationalYoutube, data, at);
        }
    }
}
