/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    /// Not running; the tick was ignored.
    Idle,
    Running { remaining_secs: u32 },
    /// Reached zero on this tick. Reported once.
    Expired,
}

/// Whole-quiz time budget, decremented once per second by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    total_secs: u32,
    remaining_secs: u32,
    running: bool,
    started: bool,
    expired: bool,
}

impl Countdown {
    #[must_use]
    pub fn new(total_secs: u32) -> Self {
        Self {
            total_secs,
            remaining_secs: total_secs,
            running: false,
            started: false,
            expired: false,
        }
    }

    /// Start from the full budget. A countdown only ever starts once.
    pub fn start(&mut self) -> bool {
        if self.started {
            return false;
        }
        self.started = true;
        self.running = true;
        self.remaining_secs = self.total_secs;
        true
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn tick(&mut self) -> CountdownTick {
        if !self.running {
            return CountdownTick::Idle;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.running = false;
            self.expired = true;
            return CountdownTick::Expired;
        }
        CountdownTick::Running {
            remaining_secs: self.remaining_secs,
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn has_started(&self) -> bool {
        self.started
    }

    /// The budget ran out. Stays set; `stop` does not clear it.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    /// Remaining share of the budget, 100.0 when full.
    #[must_use]
    pub fn progress_percent(&self) -> f64 {
        if self.total_secs == 0 {
            return 0.0;
        }
        f64::from(self.remaining_secs) / f64::from(self.total_secs) * 100.0
    }
}
