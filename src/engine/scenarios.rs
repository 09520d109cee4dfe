//! End-to-end evaluator scenarios driven by synthetic event streams

use super::*;
use crate::events::ChangeStatus;
use crate::state::tests::FlakyStore;
use crate::state::{MemoryStore, ProductiveVisit};
use chrono::{Duration, TimeZone};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

const SECOND: i64 = 1000;
const MINUTE: i64 = 60 * SECOND;

fn base() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2024, 1, 15, 9, 0, 0)
        .unwrap()
}

fn t(ms: i64) -> DateTime<FixedOffset> {
    base() + Duration::milliseconds(ms)
}

fn started() -> Evaluator {
    let mut evaluator = Evaluator::builtin();
    evaluator.start(base());
    evaluator
}

fn activate(evaluator: &mut Evaluator, tab_id: i64, url: &str, at: DateTime<FixedOffset>) -> Vec<FiredTrigger> {
    let event = BrowserEvent::TabActivated {
        tab_id,
        tab: Some(TabSnapshot::new(tab_id, url)),
    };
    evaluator.handle_event(&event, at)
}

fn ids(fired: &[FiredTrigger]) -> Vec<TriggerId> {
    fired.iter().map(|f| f.trigger_id).collect()
}

fn find(fired: &[FiredTrigger], id: TriggerId) -> Option<&FiredTrigger> {
    fired.iter().find(|f| f.trigger_id == id)
}

#[test]
fn test_reward_switch_within_threshold_fires() {
    let mut store = StateStore::new(MemoryStore::new());
    store
        .update(0, |s| {
            s.last_productive_visit = Some(ProductiveVisit {
                domain: "github.com".to_string(),
                start_time: base().timestamp_millis(),
            })
        })
        .unwrap();
    let mut evaluator = Evaluator::builtin().with_store(store);
    evaluator.start(base());

    let fired = activate(&mut evaluator, 2, "https://youtube.com/feed", t(3 * SECOND));

    let reward = find(&fired, TriggerId::RewardSwitching).expect("reward switch fired");
    assert_eq!(
        reward.data,
        TriggerData::Reward {
            from: "github.com".to_string(),
            to: "youtube.com".to_string(),
            time_taken: 3_000,
        }
    );
    let state = evaluator.state().unwrap().unwrap();
    assert_eq!(state.last_productive_visit, None);
}

#[test]
fn test_reward_switch_after_threshold_does_not_fire() {
    let mut evaluator = started();
    activate(&mut evaluator, 1, "https://github.com/rust-lang/rust", t(0));

    let fired = activate(&mut evaluator, 2, "https://youtube.com/feed", t(8 * SECOND));

    assert!(find(&fired, TriggerId::RewardSwitching).is_none());
    assert_eq!(evaluator.state().unwrap().unwrap().last_productive_visit, None);
}

#[test]
fn test_reward_switch_fires_once_per_productive_visit() {
    let mut evaluator = started();
    activate(&mut evaluator, 1, "https://github.com/rust-lang/rust", t(0));

    let first = activate(&mut evaluator, 2, "https://youtube.com/feed", t(2 * SECOND));
    let second = activate(&mut evaluator, 3, "https://netflix.com/browse", t(4 * SECOND));

    assert!(find(&first, TriggerId::RewardSwitching).is_some());
    assert!(find(&second, TriggerId::RewardSwitching).is_none());
}

#[test]
fn test_neutral_site_clears_productive_visit() {
    let mut evaluator = started();
    activate(&mut evaluator, 1, "https://github.com/", t(0));
    assert!(evaluator.state().unwrap().unwrap().last_productive_visit.is_some());

    activate(&mut evaluator, 2, "https://example.com/", t(SECOND));
    let fired = activate(&mut evaluator, 3, "https://youtube.com/feed", t(2 * SECOND));

    assert!(find(&fired, TriggerId::RewardSwitching).is_none());
}

#[test]
fn test_in_site_navigation_restamps_productive_visit() {
    let mut evaluator = started();
    activate(&mut evaluator, 1, "https://github.com/rust-lang/rust", t(0));

    let pulls = BrowserEvent::TabUpdated {
        tab_id: 1,
        status: Some(ChangeStatus::Complete),
        tab: TabSnapshot::new(1, "https://github.com/rust-lang/rust/pulls"),
    };
    evaluator.handle_event(&pulls, t(60 * SECOND));
    let visit = evaluator.state().unwrap().unwrap().last_productive_visit;
    assert_eq!(
        visit,
        Some(ProductiveVisit {
            domain: "github.com".to_string(),
            start_time: t(60 * SECOND).timestamp_millis(),
        })
    );

    let fired = activate(&mut evaluator, 2, "https://youtube.com/feed", t(63 * SECOND));
    let reward = find(&fired, TriggerId::RewardSwitching).expect("reward after in-site navigation");
    assert_eq!(
        reward.data,
        TriggerData::Reward {
            from: "github.com".to_string(),
            to: "youtube.com".to_string(),
            time_taken: 3_000,
        }
    );
}

#[test]
fn test_distraction_free_fires_once_per_gap() {
    let mut evaluator = started();

    let first = evaluator.tick(t(11 * MINUTE));
    let second = evaluator.tick(t(12 * MINUTE));

    assert_eq!(ids(&first), vec![TriggerId::DistractionFree]);
    assert_eq!(first[0].data, TriggerData::Elapsed { duration: 11 * MINUTE });
    assert!(second.is_empty());
}

#[test]
fn test_distraction_visit_restarts_streak() {
    let mut evaluator = started();
    activate(&mut evaluator, 1, "https://reddit.com/r/rust", t(0));
    activate(&mut evaluator, 2, "https://example.com/", t(MINUTE));

    let state = evaluator.state().unwrap().unwrap();
    assert!(!state.distraction_state.is_currently_on_distraction);
    assert_eq!(
        state.distraction_state.distraction_free_start_time,
        t(MINUTE).timestamp_millis()
    );

    assert!(evaluator.tick(t(10 * MINUTE)).is_empty());
    let fired = evaluator.tick(t(11 * MINUTE));
    assert_eq!(ids(&fired), vec![TriggerId::DistractionFree]);
}

#[test]
fn test_no_streak_while_on_distraction_page() {
    let mut evaluator = started();
    activate(&mut evaluator, 1, "https://reddit.com/r/rust", t(0));

    let fired = evaluator.tick(t(20 * MINUTE));

    assert!(find(&fired, TriggerId::DistractionFree).is_none());
}

fn type_burst(evaluator: &mut Evaluator, start: i64) -> Vec<FiredTrigger> {
    let mut fired = Vec::new();
    let kinds = std::iter::repeat("insertText")
        .take(10)
        .chain(std::iter::repeat("deleteContentBackward").take(5));
    for (i, input_type) in kinds.enumerate() {
        let event = BrowserEvent::Input {
            url: None,
            input_type: input_type.to_string(),
        };
        fired.extend(evaluator.handle_event(&event, t(start + i as i64 * 100)));
    }
    fired
}

#[test]
fn test_repeated_typing_pattern_fires() {
    let mut evaluator = started();

    let first = type_burst(&mut evaluator, 0);
    let second = type_burst(&mut evaluator, 20 * SECOND);

    assert!(first.is_empty());
    assert_eq!(ids(&second), vec![TriggerId::FrequentTypingDeleting]);
    assert_eq!(
        second[0].data,
        TriggerData::Typing {
            typing_count: 10,
            deleting_count: 5,
            pattern_count: 2,
        }
    );
}

#[test]
fn test_single_typing_pattern_does_not_fire() {
    let mut evaluator = started();

    let fired = type_burst(&mut evaluator, 0);
    let later = type_burst(&mut evaluator, 2 * MINUTE);

    assert!(fired.is_empty());
    assert!(later.is_empty(), "patterns a minute apart are not repetitions");
}

#[test]
fn test_morning_surge_boundary() {
    let local = FixedOffset::east_opt(2 * 3600).unwrap();

    let mut early = Evaluator::builtin();
    let six = local.with_ymd_and_hms(2024, 1, 15, 6, 30, 0).unwrap();
    early.start(six);
    let fired = activate(&mut early, 1, "https://github.com/", six);
    let surge = find(&fired, TriggerId::MorningSurge).expect("morning surge at 6");
    assert_eq!(
        surge.data,
        TriggerData::Morning {
            domain: "github.com".to_string(),
            hour: 6
        }
    );

    let mut late = Evaluator::builtin();
    let seven = local.with_ymd_and_hms(2024, 1, 15, 7, 0, 0).unwrap();
    late.start(seven);
    let fired = activate(&mut late, 1, "https://github.com/", seven);
    assert!(find(&fired, TriggerId::MorningSurge).is_none());
    assert!(find(&fired, TriggerId::ProductiveWebsite).is_some());
}

#[test]
fn test_cooldown_suppresses_repeat_until_expiry() {
    let mut evaluator = started();
    let overloaded = |count| BrowserEvent::TabCountUpdated {
        tab_count: count,
        is_overloaded: false,
    };

    let first = evaluator.handle_event(&overloaded(20), t(0));
    let repeat = evaluator.handle_event(&overloaded(21), t(10 * SECOND));
    let after = evaluator.handle_event(&overloaded(22), t(30 * SECOND));

    assert_eq!(ids(&first), vec![TriggerId::OverloadedTabs]);
    assert!(repeat.is_empty());
    assert_eq!(after[0].data, TriggerData::Counter { count: 22 });
}

#[test]
fn test_maximal_cooldown_config_does_not_overflow() {
    let config = EngineConfig::from_json(r#"{"cooldowns":{"instant_ms":9223372036854775807}}"#).unwrap();
    let mut evaluator = Evaluator::new(Catalog::builtin(), config).unwrap();
    evaluator.start(base());

    let fired = activate(&mut evaluator, 1, "https://poki.com/", t(0));
    assert!(find(&fired, TriggerId::WebGames).is_some());

    activate(&mut evaluator, 2, "https://example.com/", t(SECOND));
    let fired = activate(&mut evaluator, 1, "https://poki.com/", t(2 * SECOND));
    assert!(find(&fired, TriggerId::WebGames).is_none());
}

#[test]
fn test_few_tabs_are_not_overloaded() {
    let mut evaluator = started();
    let event = BrowserEvent::TabCountUpdated {
        tab_count: 4,
        is_overloaded: false,
    };
    assert!(evaluator.handle_event(&event, t(0)).is_empty());

    let flagged = BrowserEvent::TabCountUpdated {
        tab_count: 4,
        is_overloaded: true,
    };
    assert_eq!(ids(&evaluator.handle_event(&flagged, t(SECOND))), vec![TriggerId::OverloadedTabs]);
}

#[test]
fn test_pruned_window_never_fires() {
    let mut evaluator = started();
    activate(&mut evaluator, 1, "https://reddit.com/r/all", t(0));
    let scroll = BrowserEvent::Scroll { url: None };
    for i in 0..7 {
        assert!(evaluator.handle_event(&scroll, t(i * SECOND)).is_empty());
    }

    evaluator.tick(t(2 * 60 * MINUTE));
    evaluator.tick(t(2 * 60 * MINUTE + MINUTE));

    assert!(evaluator.windows.total_entries() <= 1);
    let fired = evaluator.handle_event(&scroll, t(2 * 60 * MINUTE + MINUTE + SECOND));
    assert!(find(&fired, TriggerId::EndlessScrolling).is_none());
}

#[test]
fn test_endless_scrolling() {
    let mut evaluator = started();
    let scroll = BrowserEvent::Scroll {
        url: Some("https://www.instagram.com/explore".to_string()),
    };

    let mut fired = Vec::new();
    for i in 0..8 {
        fired.extend(evaluator.handle_event(&scroll, t(i * 5 * SECOND)));
    }

    assert_eq!(ids(&fired), vec![TriggerId::EndlessScrolling]);
    assert_eq!(fired[0].data, TriggerData::Scroll { scroll_count: 8 });
}

#[test]
fn test_scrolling_elsewhere_is_ignored() {
    let mut evaluator = started();
    let scroll = BrowserEvent::Scroll {
        url: Some("https://example.com/".to_string()),
    };
    for i in 0..20 {
        assert!(evaluator.handle_event(&scroll, t(i * SECOND)).is_empty());
    }
}

#[test]
fn test_hover_without_action() {
    let mut evaluator = started();
    let hover = BrowserEvent::Hover { url: None };

    let mut fired = Vec::new();
    for i in 0..20 {
        fired.extend(evaluator.handle_event(&hover, t(i * 200)));
    }

    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].data, TriggerData::Hover { hover_count: 20 });
}

#[test]
fn test_input_resets_hover_count() {
    let mut evaluator = started();
    let hover = BrowserEvent::Hover { url: None };

    for i in 0..19 {
        evaluator.handle_event(&hover, t(i * 200));
    }
    let input = BrowserEvent::Input {
        url: None,
        input_type: "insertText".to_string(),
    };
    evaluator.handle_event(&input, t(4 * SECOND));

    assert!(evaluator.handle_event(&hover, t(5 * SECOND)).is_empty());
}

#[test]
fn test_rapid_tab_switching() {
    let mut evaluator = started();

    let mut fired = Vec::new();
    for i in 0..10 {
        let url = format!("https://site{i}.test/");
        fired.extend(activate(&mut evaluator, i, &url, t(i * 3 * SECOND)));
    }

    assert_eq!(ids(&fired), vec![TriggerId::RapidTabSwitching]);
    assert_eq!(fired[0].data, TriggerData::Switches { switch_count: 10 });
}

#[test]
fn test_tab_looping() {
    let mut evaluator = started();

    let mut fired = Vec::new();
    for i in 0..5 {
        fired.extend(activate(&mut evaluator, 1, "https://example.com/inbox", t(i * 20 * SECOND)));
        fired.extend(activate(&mut evaluator, 2, "https://example.org/", t(i * 20 * SECOND + SECOND)));
    }

    let looping = find(&fired, TriggerId::TabLooping).expect("looping detected");
    assert_eq!(
        looping.data,
        TriggerData::Visits {
            domain: "example.com".to_string(),
            visits: 5
        }
    );
}

#[test]
fn test_news_frequency() {
    let mut evaluator = started();
    let sites = ["cnn.com", "bbc.com", "reuters.com", "cnn.com", "bloomberg.com"];

    let mut fired = Vec::new();
    for (i, site) in sites.iter().enumerate() {
        let url = format!("https://www.{site}/");
        fired.extend(activate(&mut evaluator, i as i64, &url, t(i as i64 * 5 * MINUTE)));
    }

    assert_eq!(ids(&fired), vec![TriggerId::NewsSites]);
}

#[test]
fn test_hidden_tab_fires_dwell_triggers() {
    let mut evaluator = started();
    activate(&mut evaluator, 1, "https://www.netflix.com/watch/1", t(0));

    let fired = evaluator.handle_event(&BrowserEvent::VisibilityChanged { hidden: true }, t(2 * MINUTE));

    assert_eq!(ids(&fired), vec![TriggerId::BingeWatching]);
    assert_eq!(
        fired[0].data,
        TriggerData::Duration {
            duration: 2 * MINUTE,
            domain: "www.netflix.com".to_string()
        }
    );
    assert_eq!(evaluator.visibility(), Visibility::Inactive);
}

#[test]
fn test_long_hide_resets_dwell() {
    let mut evaluator = started();
    activate(&mut evaluator, 1, "https://discord.com/channels/1", t(0));
    evaluator.handle_event(&BrowserEvent::VisibilityChanged { hidden: true }, t(10 * SECOND));
    evaluator.handle_event(&BrowserEvent::VisibilityChanged { hidden: false }, t(10 * MINUTE));

    let fired = evaluator.tick(t(10 * MINUTE + 20 * SECOND));
    assert!(find(&fired, TriggerId::MessagingPlatforms).is_none());

    let fired = evaluator.tick(t(11 * MINUTE + 10 * SECOND));
    assert!(find(&fired, TriggerId::MessagingPlatforms).is_some());
}

#[test]
fn test_tick_catches_long_single_tab_session() {
    let mut evaluator = started();
    activate(&mut evaluator, 1, "https://web.whatsapp.com/", t(0));

    assert!(evaluator.tick(t(50 * SECOND)).is_empty());
    let fired = evaluator.tick(t(60 * SECOND));
    assert_eq!(ids(&fired), vec![TriggerId::MessagingPlatforms]);

    // repeated ticks stay within the cooldown
    assert!(evaluator.tick(t(70 * SECOND)).is_empty());
}

#[test]
fn test_productive_duration_on_switch_away() {
    let mut evaluator = started();
    activate(&mut evaluator, 1, "https://stackoverflow.com/questions/1", t(0));

    let fired = activate(&mut evaluator, 2, "https://example.com/", t(11 * MINUTE));

    let long = find(&fired, TriggerId::ProductiveDuration).expect("long productive session");
    assert_eq!(
        long.data,
        TriggerData::Duration {
            duration: 11 * MINUTE,
            domain: "stackoverflow.com".to_string()
        }
    );
}

#[test]
fn test_closed_distraction() {
    let mut evaluator = started();
    activate(&mut evaluator, 1, "https://www.reddit.com/r/all", t(0));

    let fired = evaluator.handle_event(&BrowserEvent::TabRemoved { tab_id: 1 }, t(5 * SECOND));

    assert_eq!(ids(&fired), vec![TriggerId::ClosedDistraction]);
    assert!(evaluator.current_tab().is_none());
    let state = evaluator.state().unwrap().unwrap();
    assert!(state.distraction_state.closed_distractions.contains("reddit.com"));
}

#[test]
fn test_closing_background_distraction_is_ignored() {
    let mut evaluator = started();
    activate(&mut evaluator, 1, "https://www.reddit.com/r/all", t(0));
    activate(&mut evaluator, 2, "https://example.com/", t(SECOND));

    let fired = evaluator.handle_event(&BrowserEvent::TabRemoved { tab_id: 1 }, t(2 * SECOND));

    assert!(fired.is_empty());
}

#[test]
fn test_first_tab_only_once() {
    let mut evaluator = started();

    let first = activate(&mut evaluator, 1, "https://github.com/", t(0));
    let second = activate(&mut evaluator, 2, "https://dev.to/", t(MINUTE));

    assert!(find(&first, TriggerId::FirstTab).is_some());
    assert!(find(&second, TriggerId::FirstTab).is_none());
    assert!(find(&second, TriggerId::ProductiveWebsite).is_some());
}

#[test]
fn test_productive_streak_counts_actions() {
    let mut evaluator = started();

    let mut fired = Vec::new();
    for i in 0..5 {
        fired.extend(activate(&mut evaluator, i, "https://leetcode.com/problems", t(i * MINUTE)));
    }

    let streak = find(&fired, TriggerId::ProductiveStreak).expect("streak reached");
    assert_eq!(streak.data, TriggerData::Counter { count: 5 });
    assert_eq!(evaluator.session.productive_actions, 0);
}

#[test]
fn test_streak_without_reset_fires_only_at_threshold() {
    let definitions = crate::catalog::builtin_definitions()
        .into_iter()
        .map(|def| match def.id {
            TriggerId::ProductiveStreak => def.with_counter(3, false).with_cooldown(0),
            _ => def,
        })
        .collect();
    let catalog = Catalog::from_definitions(definitions).unwrap();
    let mut evaluator = Evaluator::new(catalog, EngineConfig::default()).unwrap();
    evaluator.start(base());

    let mut streaks = Vec::new();
    for i in 0..6 {
        let fired = activate(&mut evaluator, i, "https://leetcode.com/problems", t(i * MINUTE));
        streaks.extend(fired.into_iter().filter(|f| f.trigger_id == TriggerId::ProductiveStreak));
    }

    assert_eq!(streaks.len(), 1);
    assert_eq!(streaks[0].data, TriggerData::Counter { count: 3 });
    assert_eq!(evaluator.session.productive_actions, 6);
}

#[test]
fn test_productive_search() {
    let mut evaluator = started();
    let tab = TabSnapshot::new(4, "https://www.google.com/search?q=how+to+learn+rust");
    let event = BrowserEvent::TabUpdated {
        tab_id: 4,
        status: Some(ChangeStatus::Complete),
        tab,
    };

    let fired = evaluator.handle_event(&event, t(0));

    let search = find(&fired, TriggerId::ProductiveSearch).expect("productive search");
    assert_eq!(
        search.data,
        TriggerData::Search {
            query: "how to learn rust".to_string()
        }
    );
}

#[test]
fn test_loading_or_background_updates_are_not_evaluated() {
    let mut evaluator = started();
    let loading = BrowserEvent::TabUpdated {
        tab_id: 1,
        status: Some(ChangeStatus::Loading),
        tab: TabSnapshot::new(1, "https://github.com/"),
    };
    let background = BrowserEvent::TabUpdated {
        tab_id: 2,
        status: Some(ChangeStatus::Complete),
        tab: TabSnapshot::new(2, "https://github.com/").inactive(),
    };

    assert!(evaluator.handle_event(&loading, t(0)).is_empty());
    assert!(evaluator.handle_event(&background, t(SECOND)).is_empty());
    assert!(evaluator.current_tab().is_none());

    // the registry still knows the background tab
    let fired = evaluator.handle_event(&BrowserEvent::TabActivated { tab_id: 2, tab: None }, t(2 * SECOND));
    assert!(find(&fired, TriggerId::ProductiveWebsite).is_some());
}

#[test]
fn test_youtube_navigation_reclassifies_content() {
    let mut evaluator = started();
    activate(&mut evaluator, 7, "https://www.youtube.com/", t(0));

    let watch = BrowserEvent::UrlChanged {
        tab_id: 7,
        url: "https://www.youtube.com/watch?v=abc".to_string(),
        title: "Funniest cat compilation".to_string(),
        description: Some("cats being cats".to_string()),
    };
    let fired = evaluator.handle_event(&watch, t(10 * SECOND));
    assert_eq!(ids(&fired), vec![TriggerId::NonEducationalYoutube]);

    let shorts = BrowserEvent::UrlChanged {
        tab_id: 7,
        url: "https://www.youtube.com/shorts/xyz".to_string(),
        title: String::new(),
        description: None,
    };
    let fired = evaluator.handle_event(&shorts, t(20 * SECOND));
    assert_eq!(ids(&fired), vec![TriggerId::YoutubeShorts]);

    // same domain: the dwell clock keeps running
    let fired = evaluator.tick(t(60 * SECOND));
    assert!(find(&fired, TriggerId::ExcessiveSocialMedia).is_some());
}

#[test]
fn test_productive_youtube_video() {
    let mut evaluator = started();
    let tab = TabSnapshot::new(3, "https://www.youtube.com/watch?v=rust")
        .with_title("Rust programming tutorial for beginners");
    let fired = evaluator.handle_event(&BrowserEvent::TabActivated { tab_id: 3, tab: Some(tab) }, t(0));

    assert!(find(&fired, TriggerId::ProductiveYoutube).is_some());
    assert!(find(&fired, TriggerId::NonEducationalYoutube).is_none());
}

#[test]
fn test_store_write_failure_degrades_and_retries() {
    let flaky = FlakyStore::default();
    let fail_writes = flaky.fail_writes.clone();
    let mut evaluator = Evaluator::builtin().with_store(StateStore::new(flaky));
    evaluator.start(base());

    fail_writes.set(true);
    activate(&mut evaluator, 1, "https://www.reddit.com/", t(SECOND));
    let state = evaluator.state().unwrap().unwrap();
    assert!(!state.distraction_state.is_currently_on_distraction);

    fail_writes.set(false);
    evaluator.tick(t(10 * SECOND));

    let state = evaluator.state().unwrap().unwrap();
    assert!(state.distraction_state.is_currently_on_distraction);
    assert_eq!(state.distraction_state.last_distraction_time, t(SECOND).timestamp_millis());
}

#[test]
fn test_store_read_failure_still_fires_instant_triggers() {
    let flaky = FlakyStore::default();
    let fail_reads = flaky.fail_reads.clone();
    let mut evaluator = Evaluator::builtin().with_store(StateStore::new(flaky));
    evaluator.start(base());

    fail_reads.set(true);
    let fired = activate(&mut evaluator, 1, "https://github.com/", t(0));

    assert!(find(&fired, TriggerId::ProductiveWebsite).is_some());
    assert!(evaluator.tick(t(11 * MINUTE)).iter().all(|f| f.trigger_id != TriggerId::DistractionFree));
}

#[test]
fn test_unknown_tab_and_bad_url_are_no_ops() {
    let mut evaluator = started();

    let missing = BrowserEvent::TabActivated { tab_id: 99, tab: None };
    assert!(evaluator.handle_event(&missing, t(0)).is_empty());

    let fired = activate(&mut evaluator, 1, "about:blank", t(SECOND));
    assert!(fired.is_empty());
    assert!(evaluator.current_tab().is_none());
}

#[test]
fn test_callbacks_receive_fired_triggers() {
    let mut evaluator = started();
    let seen = Rc::new(RefCell::new(Vec::new()));

    evaluator.on_trigger(|_, _| Err("renderer offline".into()));
    let sink = seen.clone();
    let id = evaluator.on_trigger(move |def, _| {
        sink.borrow_mut().push(def.id);
        Ok(())
    });

    let fired = activate(&mut evaluator, 1, "https://poki.com/", t(0));
    assert_eq!(*seen.borrow(), ids(&fired));
    assert_eq!(*seen.borrow(), vec![TriggerId::WebGames]);

    assert!(evaluator.remove_callback(id));
    activate(&mut evaluator, 2, "https://www.amazon.com/", t(MINUTE));
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn test_stop_cancels_timers_and_ignores_events() {
    let mut evaluator = started();
    activate(&mut evaluator, 1, "https://web.whatsapp.com/", t(0));

    evaluator.stop();

    assert!(!evaluator.is_running());
    assert!(evaluator.tick(t(20 * MINUTE)).is_empty());
    assert!(activate(&mut evaluator, 2, "https://github.com/", t(21 * MINUTE)).is_empty());
    assert_eq!(evaluator.windows.total_entries(), 0);
}

#[test]
fn test_replay_from_json_lines() {
    let mut evaluator = started();
    let lines = [
        r#"{"timestamp":"2024-01-15T09:00:00Z","event_type":"tab_created","tab":{"id":5,"url":"https://notion.so/page","active":false}}"#,
        r#"{"timestamp":"2024-01-15T09:00:01Z","event_type":"tab_activated","tab_id":5}"#,
    ];

    let fired: Vec<FiredTrigger> = lines
        .iter()
        .map(|line| TimedEvent::from_json(line).unwrap())
        .flat_map(|event| evaluator.handle(&event))
        .collect();

    assert_eq!(
        ids(&fired),
        vec![
            TriggerId::FirstTab,
            TriggerId::ProductiveWebsite,
            TriggerId::WorkDocument
        ]
    );
}
