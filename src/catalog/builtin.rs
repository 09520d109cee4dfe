//! Built-in trigger table
//!
//! Thresholds are the literal numbers the extension shipped with. Several of
//! the duration entries use one-minute values even where their display text
//! talks about longer periods.

use crate::catalog::definition::{
    PatternParams, RewardParams, TriggerDefinition, TriggerId, TriggerKind,
};

const MINUTE_MS: i64 = 60 * 1000;

/// Sites counted as productive work
pub const PRODUCTIVE_DOMAINS: &[&str] = &[
    "notion.so",
    "github.com",
    "leetcode.com",
    "docs.google.com",
    "stackoverflow.com",
    "medium.com",
    "dev.to",
    "udemy.com",
    "coursera.org",
    "office.com",
];

/// Sites counted as distractions for streak and tab-closing triggers
pub const DISTRACTION_DOMAINS: &[&str] = &[
    "instagram.com",
    "twitter.com",
    "netflix.com",
    "facebook.com",
    "tiktok.com",
    "reddit.com",
];

const NEWS_DOMAINS: &[&str] = &[
    "news.google.com",
    "cnn.com",
    "bbc.com",
    "ndtv.com",
    "foxnews.com",
    "reuters.com",
    "bloomberg.com",
];

/// All built-in definitions in display order
pub fn builtin_definitions() -> Vec<TriggerDefinition> {
    vec![
        TriggerDefinition::new(
            TriggerId::ProductiveWebsite,
            "Visited a Productive Website",
            TriggerKind::Instant,
        )
        .with_message("Power move! You're on a productive site, keep going, you're on fire 🔥")
        .with_domains(PRODUCTIVE_DOMAINS),
        TriggerDefinition::new(
            TriggerId::ProductiveSearch,
            "Searched Something Productive on Google",
            TriggerKind::Instant,
        )
        .with_message("Smart search! That query screams growth mindset 💡")
        .with_domains(&["google.com"])
        .with_keywords(&["how to", "learn", "tutorial", "guide", "documentation"]),
        TriggerDefinition::new(
            TriggerId::ProductiveYoutube,
            "Watching a Productive YouTube Video",
            TriggerKind::Instant,
        )
        .with_message("You're not just watching, you're learning. That's next-level 📈")
        .with_domains(&["youtube.com"])
        .with_keywords(&[
            "tutorial",
            "learn",
            "course",
            "documentation",
            "guide",
            "explained",
            "education",
            "development",
            "programming",
        ]),
        TriggerDefinition::new(
            TriggerId::ClosedDistraction,
            "Closed a Distracting Tab",
            TriggerKind::Instant,
        )
        .with_message("Boom 💥! You just took back control of your focus!")
        .with_domains(DISTRACTION_DOMAINS),
        TriggerDefinition::new(
            TriggerId::DistractionFree,
            "Stayed Away From Distraction Sites",
            TriggerKind::Duration,
        )
        .with_message(
            "Great going! 10 minutes without distractions - your focus is on point! 🧠💪",
        )
        .with_domains(DISTRACTION_DOMAINS)
        .with_time_threshold(10 * MINUTE_MS),
        TriggerDefinition::new(
            TriggerId::WorkDocument,
            "Opened a Work Document",
            TriggerKind::Instant,
        )
        .with_message("Docs opened. Game face on. Let's do this! 📄✅")
        .with_domains(&["docs.google.com", "notion.so", "office.com"]),
        TriggerDefinition::new(
            TriggerId::ProductiveDuration,
            "Spent Long Time on a Productive Site",
            TriggerKind::Duration,
        )
        .with_message("That's some deep grind time. Focus like yours moves mountains 🏔️")
        .with_domains(PRODUCTIVE_DOMAINS)
        .with_time_threshold(10 * MINUTE_MS),
        TriggerDefinition::new(
            TriggerId::FirstTab,
            "First Tab of the Day is Productive",
            TriggerKind::Instant,
        )
        .with_message("Started the day strong 💪 This is how winners begin mornings!")
        .with_domains(PRODUCTIVE_DOMAINS),
        TriggerDefinition::new(
            TriggerId::MorningSurge,
            "Morning Productivity Surge",
            TriggerKind::Instant,
        )
        .with_message("Early bird gets the breakthroughs. You're ahead of 99% 🌅")
        .with_domains(PRODUCTIVE_DOMAINS)
        .with_morning_hour_limit(7),
        TriggerDefinition::new(
            TriggerId::ProductiveStreak,
            "Completed 5 Productive Actions",
            TriggerKind::Counter,
        )
        .with_message("5 solid wins already. You're on a roll 🚀 Keep stacking those Ws!")
        .with_counter(5, true),
        TriggerDefinition::new(
            TriggerId::ExcessiveSocialMedia,
            "Excessive Social Media Use",
            TriggerKind::Duration,
        )
        .with_description("Staying too long on social media platforms")
        .with_domains(&[
            "twitter.com",
            "instagram.com",
            "facebook.com",
            "youtube.com",
            "tiktok.com",
        ])
        .with_time_threshold(MINUTE_MS),
        TriggerDefinition::new(
            TriggerId::YoutubeShorts,
            "YouTube Shorts Detection",
            TriggerKind::Instant,
        )
        .with_description("Why are you watching YouTube Shorts?")
        .with_domains(&["youtube.com"]),
        TriggerDefinition::new(
            TriggerId::NonEducationalYoutube,
            "Non-Educational YouTube",
            TriggerKind::Content,
        )
        .with_description("Watching entertainment instead of learning content")
        .with_domains(&["youtube.com"])
        .with_keywords(&[
            "tutorial",
            "learn",
            "course",
            "education",
            "programming",
            "development",
            "lecture",
            "study",
        ]),
        TriggerDefinition::new(
            TriggerId::EndlessScrolling,
            "Endless Scrolling",
            TriggerKind::Behavior,
        )
        .with_description("Excessive scrolling behavior")
        .with_domains(&["reddit.com", "instagram.com", "twitter.com", "facebook.com"])
        .with_count_window(8, MINUTE_MS),
        TriggerDefinition::new(
            TriggerId::BingeWatching,
            "Binge Watching",
            TriggerKind::Duration,
        )
        .with_description("Extended streaming during work hours")
        .with_domains(&["netflix.com", "primevideo.com", "hulu.com", "disney.com"])
        .with_time_threshold(MINUTE_MS),
        TriggerDefinition::new(
            TriggerId::OverloadedTabs,
            "Overloaded Tabs",
            TriggerKind::Counter,
        )
        .with_description("Too many inactive tabs")
        .with_counter(15, false),
        TriggerDefinition::new(
            TriggerId::ShoppingSites,
            "Shopping Sites",
            TriggerKind::Instant,
        )
        .with_description("Browsing shopping websites during work")
        .with_domains(&[
            "amazon",
            "flipkart.com",
            "ebay.com",
            "walmart.com",
            "etsy.com",
            "aliexpress.com",
            "bestbuy.com",
            "target.com",
        ]),
        TriggerDefinition::new(TriggerId::NewsSites, "News Browsing", TriggerKind::Frequency)
            .with_description("Excessive news browsing")
            .with_domains(NEWS_DOMAINS)
            .with_count_window(5, 60 * MINUTE_MS),
        TriggerDefinition::new(
            TriggerId::RapidTabSwitching,
            "Rapid Tab Switching",
            TriggerKind::Behavior,
        )
        .with_description("10+ tab switches within 60 seconds")
        .with_count_window(10, MINUTE_MS),
        TriggerDefinition::new(
            TriggerId::FrequentTypingDeleting,
            "Frequent Typing and Deleting",
            TriggerKind::Behavior,
        )
        .with_description("Repeatedly typing and deleting - are you unsure about what to write?")
        .with_count_window(10, 10 * 1000)
        .with_pattern(PatternParams {
            delete_threshold: 5,
            repetitions: 2,
            pattern_window_ms: MINUTE_MS,
        })
        .with_cooldown(2 * MINUTE_MS),
        TriggerDefinition::new(
            TriggerId::RewardSwitching,
            "Reward-Based Switching",
            TriggerKind::Behavior,
        )
        .with_description("Switching to entertainment after work")
        .with_time_threshold(5 * 1000)
        .with_reward(RewardParams {
            productive_apps: ["github.com", "gitlab.com", "notion.so", "docs.google.com"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
            reward_apps: ["youtube.com", "netflix.com"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
        }),
        TriggerDefinition::new(
            TriggerId::ClickbaitNews,
            "Clickbait Consumption",
            TriggerKind::Duration,
        )
        .with_description("Extended news browsing")
        .with_domains(NEWS_DOMAINS)
        .with_time_threshold(MINUTE_MS),
        TriggerDefinition::new(
            TriggerId::MessagingPlatforms,
            "Messaging Platforms",
            TriggerKind::Duration,
        )
        .with_description("Extended messaging platform use")
        .with_domains(&["web.whatsapp.com", "discord.com", "slack.com", "telegram.org"])
        .with_time_threshold(MINUTE_MS),
        TriggerDefinition::new(TriggerId::WebGames, "Web-Based Games", TriggerKind::Instant)
            .with_description("Playing browser games during work")
            .with_domains(&[
                "1v1.lol",
                "slither.io",
                "agar.io",
                "miniclip.com",
                "poki.com",
                "coolmathgames.com",
            ]),
        TriggerDefinition::new(TriggerId::TabLooping, "Tab Looping", TriggerKind::Behavior)
            .with_description("Returning to the same site over and over")
            .with_count_window(5, 5 * MINUTE_MS),
        TriggerDefinition::new(
            TriggerId::HoverWithoutAction,
            "Hovering Without Action",
            TriggerKind::Behavior,
        )
        .with_description("Lots of hovering, no clicking or typing")
        .with_count_window(20, 30 * 1000),
    ]
}
