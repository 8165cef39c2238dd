//! Turns wall-clock time into 60Hz timer ticks for the driving loop.

use std::time::{Duration, Instant};

use chip8::clock::TIMER_FREQUENCY_HZ;

/// The most ticks delivered at once. After a long stall (window dragged,
/// machine suspended) the timers skip ahead instead of draining in a burst.
const MAX_CATCH_UP_TICKS: u32 = 6;

/// Tracks how many timer ticks are owed since the last frame.
pub struct TimerCadence {
    last_tick: Instant,
    period: Duration,
}

impl TimerCadence {
    /// Create a new [`TimerCadence`] starting at `now`.
    #[must_use]
    pub fn new(now: Instant) -> Self {
        Self {
            last_tick: now,
            period: Duration::from_secs_f64(1.0 / TIMER_FREQUENCY_HZ),
        }
    }

    /// Returns the number of ticks due at `now`. The fractional remainder is
    /// carried over to the next call.
    pub fn ticks_due(&mut self, now: Instant) -> u32 {
        let elapsed = now.saturating_duration_since(self.last_tick);
        let due = elapsed.as_nanos() / self.period.as_nanos();
        let due = u32::try_from(due).unwrap_or(u32::MAX);

        if due > MAX_CATCH_UP_TICKS {
            log::debug!("Dropping {} timer ticks after a stall", due - MAX_CATCH_UP_TICKS);
            self.last_tick = now;
            return MAX_CATCH_UP_TICKS;
        }

        self.last_tick += self.period * due;
        due
    }
}
