//! This module provides the delay and sound timers of a Chip8 emulator.
//!
//! The [`Clock`] does not measure time itself. The driving loop calls
//! [`Clock::tick`] at [`TIMER_FREQUENCY_HZ`], independent of how many
//! instructions ran in between.

/// The frequency (in Hz) at which the timers should be ticked.
pub const TIMER_FREQUENCY_HZ: f64 = 60.0;

/// Holds the [`super::Chip8`] sound and delay timers. Both count down by
/// `1` per tick and stop at `0`.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct Clock {
    /// The current value of the delay timer.
    pub delay_timer: u8,
    /// The current value of the sound timer. A beep is due when it reaches
    /// zero.
    pub sound_timer: u8,
}

impl Clock {
    /// Create a new `Clock` with both timers at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decrements both timers by one, saturating at zero.
    ///
    /// Returns `true` when the sound timer went from `1` to `0` on this tick,
    /// which is the moment a beep should be emitted.
    pub fn tick(&mut self) -> bool {
        self.delay_timer = self.delay_timer.saturating_sub(1);

        let was_sounding = self.sound_timer > 0;
        self.sound_timer = self.sound_timer.saturating_sub(1);
        was_sounding && self.sound_timer == 0
    }
}
