//! Three independent poll cadences: dirty check, status probe, auto-fetch.

use std::time::{Duration, Instant};

use crate::app_config::EngineConfig;

#[derive(Debug, Clone)]
pub struct IntervalTimer {
    interval: Duration,
    last: Option<Instant>,
}

impl IntervalTimer {
    /// Fires on the first poll.
    pub fn immediate(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// First fires one full interval after `now`.
    pub fn starting_at(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last: Some(now),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True when the interval elapsed. Does not restart the timer.
    pub fn is_due(&self, now: Instant) -> bool {
        self.last
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }

    /// True when the interval elapsed; the timer restarts from `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        let due = self.is_due(now);
        if due {
            self.last = Some(now);
        }
        due
    }

    pub fn restart(&mut self, now: Instant) {
        self.last = Some(now);
    }
}

/// Which timers fired on one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Due {
    pub dirty_check: bool,
    pub status_check: bool,
    pub auto_fetch: bool,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    dirty: IntervalTimer,
    status: IntervalTimer,
    auto_fetch: IntervalTimer,
}

impl Scheduler {
    /// Dirty and status checks fire on the first tick; auto-fetch waits a full interval.
    pub fn new(config: &EngineConfig, now: Instant) -> Self {
        Self {
            dirty: IntervalTimer::immediate(config.dirty_check_interval()),
            status: IntervalTimer::immediate(config.status_check_interval()),
            auto_fetch: IntervalTimer::starting_at(config.auto_fetch_interval(), now),
        }
    }

    /// Dirty and status timers restart when they fire. Auto-fetch stays due
    /// until [`Scheduler::restart_auto_fetch`] records that a fetch started.
    pub fn poll(&mut self, now: Instant, auto_fetch_enabled: bool) -> Due {
        Due {
            dirty_check: self.dirty.poll(now),
            status_check: self.status.poll(now),
            auto_fetch: auto_fetch_enabled && self.auto_fetch.is_due(now),
        }
    }

    /// Called when a fetch starts and when auto-fetch is switched on or off.
    pub fn restart_auto_fetch(&mut self, now: Instant) {
        self.auto_fetch.restart(now);
    }

    /// Restart the status cadence after an out-of-band refresh.
    pub fn restart_status(&mut self, now: Instant) {
        self.status.restart(now);
    }

    /// Shortest configured interval, a sensible tick period.
    pub fn tick_period(&self) -> Duration {
        self.dirty
            .interval()
            .min(self.status.interval())
            .min(self.auto_fetch.interval())
    }
}
