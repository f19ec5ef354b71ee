use std::time::Duration;

/// Virtual clock advanced explicitly by whoever drives a sequence.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackClock {
    elapsed: Duration,
}

impl PlaybackClock {
    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    pub fn advance(&mut self, delta: Duration) {
        self.elapsed = self.elapsed.saturating_add(delta);
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Holds at most one pending timer. Scheduling replaces whatever was
/// pending, so invalidating the slot is enough to silence a sequence.
#[derive(Debug, Default)]
pub struct TimerSlot {
    due: Option<Duration>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a timer `delay` after `from`, replacing any pending one.
    pub fn schedule(&mut self, from: Duration, delay: Duration) {
        self.due = Some(from.saturating_add(delay));
    }

    pub fn invalidate(&mut self) {
        self.due = None;
    }

    pub fn is_pending(&self) -> bool {
        self.due.is_some()
    }

    /// Due time of the pending timer, if any.
    pub fn due(&self) -> Option<Duration> {
        self.due
    }

    /// Time left until the pending timer fires, measured from `now`.
    pub fn remaining(&self, now: Duration) -> Option<Duration> {
        self.due().map(|due| due.saturating_sub(now))
    }

    /// Clears the pending timer and returns its due time once it is due at
    /// `now`.
    pub fn take_due(&mut self, now: Duration) -> Option<Duration> {
        match self.due {
            Some(due) if due <= now => {
                self.due = None;
                Some(due)
            }
            _ => None,
        }
    }
}
