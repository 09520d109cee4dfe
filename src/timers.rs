//! Periodic evaluation timers
//!
//! The engine owns three fixed-period timers. They are driven by the host's
//! clock: the host calls `tick(now)` and every timer whose deadline passed
//! reports itself due once. Missed periods coalesce into a single run, and the
//! next deadline stays on the original period grid.

use crate::config::EngineConfig;

/// What a timer re-evaluates when it comes due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Dwell-time triggers of the foreground tab
    DurationCheck,
    /// Distraction-free streak
    StreakCheck,
    /// Rolling-window pruning and cooldown expiry
    Prune,
}

impl TimerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerKind::DurationCheck => "duration_check",
            TimerKind::StreakCheck => "streak_check",
            TimerKind::Prune => "prune",
        }
    }
}

/// One cancellable fixed-period timer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalTimer {
    period_ms: i64,
    next_due_ms: Option<i64>,
}

impl IntervalTimer {
    pub fn new(period_ms: i64) -> Self {
        Self {
            period_ms: period_ms.max(1),
            next_due_ms: None,
        }
    }

    /// Start (or restart) the timer; the first run is one period after `now_ms`
    pub fn arm(&mut self, now_ms: i64) {
        self.next_due_ms = Some(now_ms.saturating_add(self.period_ms));
    }

    pub fn cancel(&mut self) {
        self.next_due_ms = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due_ms.is_some()
    }

    pub fn next_due(&self) -> Option<i64> {
        self.next_due_ms
    }

    /// Whether the timer is due at `now_ms`; advances the deadline if so
    pub fn poll(&mut self, now_ms: i64) -> bool {
        let Some(due) = self.next_due_ms else {
            return false;
        };
        if now_ms < due {
            return false;
        }
        let missed = now_ms.saturating_sub(due) / self.period_ms;
        let advance = missed.saturating_add(1).saturating_mul(self.period_ms);
        self.next_due_ms = Some(due.saturating_add(advance));
        true
    }
}

/// The engine's timers, polled together
#[derive(Debug, Clone)]
pub struct TimerSet {
    timers: Vec<(TimerKind, IntervalTimer)>,
}

impl TimerSet {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            timers: vec![
                (TimerKind::DurationCheck, IntervalTimer::new(config.duration_tick_ms)),
                (TimerKind::StreakCheck, IntervalTimer::new(config.streak_tick_ms)),
                (TimerKind::Prune, IntervalTimer::new(config.prune_interval_ms)),
            ],
        }
    }

    pub fn arm_all(&mut self, now_ms: i64) {
        for (_, timer) in self.timers.iter_mut() {
            timer.arm(now_ms);
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, timer) in self.timers.iter_mut() {
            timer.cancel();
        }
    }

    pub fn any_armed(&self) -> bool {
        self.timers.iter().any(|(_, timer)| timer.is_armed())
    }

    /// Timers due at `now_ms`, in a fixed order
    pub fn due(&mut self, now_ms: i64) -> Vec<TimerKind> {
        self.timers
            .iter_mut()
            .filter_map(|(kind, timer)| timer.poll(now_ms).then_some(*kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unarmed_timer_never_fires() {
        let mut timer = IntervalTimer::new(10_000);
        assert!(!timer.poll(1_000_000));
    }

    #[test]
    fn test_timer_fires_once_per_period() {
        let mut timer = IntervalTimer::new(10_000);
        timer.arm(0);

        assert!(!timer.poll(9_999));
        assert!(timer.poll(10_000));
        assert!(!timer.poll(15_000));
        assert!(timer.poll(20_000));
    }

    #[test]
    fn test_missed_periods_coalesce() {
        let mut timer = IntervalTimer::new(10_000);
        timer.arm(0);

        assert!(timer.poll(45_000));
        assert_eq!(timer.next_due(), Some(50_000));
        assert!(!timer.poll(49_999));
    }

    #[test]
    fn test_cancel_stops_future_runs() {
        let mut timers = TimerSet::new(&EngineConfig::default());
        timers.arm_all(0);
        timers.cancel_all();

        assert!(!timers.any_armed());
        assert!(timers.due(3_600_000).is_empty());
    }

    #[test]
    fn test_due_reports_each_elapsed_timer() {
        let mut timers = TimerSet::new(&EngineConfig::default());
        timers.arm_all(0);

        assert_eq!(timers.due(10_000), vec![TimerKind::DurationCheck]);
        assert_eq!(
            timers.due(60_000),
            vec![
                TimerKind::DurationCheck,
                TimerKind::StreakCheck,
                TimerKind::Prune
            ]
        );
    }

    #[test]
    fn test_huge_period_saturates() {
        let mut timer = IntervalTimer::new(i64::MAX);
        timer.arm(1_705_309_200_000);

        assert_eq!(timer.next_due(), Some(i64::MAX));
        assert!(!timer.poll(1_705_309_260_000));
        assert!(timer.poll(i64::MAX));
        assert_eq!(timer.next_due(), Some(i64::MAX));
    }
}
