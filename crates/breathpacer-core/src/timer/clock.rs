/// One reading of the session clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTick {
    pub seconds_remaining: u32,
    /// Set on the tick that reaches zero, and only that one.
    pub expired: bool,
}

/// Whole-session countdown at one-second granularity.
///
/// Like the phase scheduler this has no thread of its own; the driver calls
/// [`SessionClock::tick`] once per second while the clock is armed.
#[derive(Debug, Clone, Default)]
pub struct SessionClock {
    total_seconds: u32,
    seconds_remaining: u32,
    armed: bool,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, total_seconds: u32) {
        self.total_seconds = total_seconds;
        self.seconds_remaining = total_seconds;
        self.armed = total_seconds > 0;
    }

    /// Returns `None` once stopped or expired.
    pub fn tick(&mut self) -> Option<ClockTick> {
        if !self.armed {
            return None;
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        let expired = self.seconds_remaining == 0;
        if expired {
            self.armed = false;
        }
        Some(ClockTick {
            seconds_remaining: self.seconds_remaining,
            expired,
        })
    }

    pub fn stop(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    /// 0.0 .. 1.0 share of the session already elapsed.
    pub fn elapsed_fraction(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        1.0 - (self.seconds_remaining as f64 / self.total_seconds as f64)
    }
}

/// `M:SS`, minutes unpadded.
pub fn format_countdown(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
