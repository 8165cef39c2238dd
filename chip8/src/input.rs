//! The hexadecimal keypad. The host writes key changes in; the processor
//! reads them and parks itself here while an `FX0A` waits for a key.

use crate::error::Chip8Error;

/// The number of keys on the Chip8 keypad.
pub const KEY_COUNT: usize = 16;

/// The answer to an `FX0A` wait: which key went down and which register
/// it belongs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyRequestResponse {
    /// The key that went down.
    pub key_code: u8,
    /// Index of the `VX` register named by the waiting instruction.
    pub register: usize,
}

/// Keypad state for the [`super::Chip8`]. Written only by the host, read by
/// the processor at cycle time.
#[derive(Clone, Default, Debug)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct Input {
    state: [bool; KEY_COUNT],
    /// Set while an `FX0A` is blocking the processor.
    waiting: bool,
    request_reg: usize,
    /// Filled in by the key-down that ended the wait, until the processor takes it.
    request_response: Option<KeyRequestResponse>,
}

impl Input {
    /// Creates a keypad with every key released and no wait pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `key_code` is now `pressed` or released. Only a transition
    /// from released to pressed ends a pending wait; a key that is already
    /// held does not.
    pub fn update(&mut self, key_code: u8, pressed: bool) {
        let Some(state) = self.state.get_mut(usize::from(key_code)) else {
            log::warn!("Ignoring update for unknown key code {key_code:#X}");
            return;
        };
        if *state == pressed {
            return;
        }
        *state = pressed;

        if pressed && self.waiting {
            log::debug!("Key {key_code:#X} satisfied pending key request");
            self.waiting = false;
            self.request_response = Some(KeyRequestResponse {
                key_code,
                register: self.request_reg,
            });
        }
    }

    /// Blocks the processor until the next key-down, whose key code is then
    /// destined for `VX` with `X = register`.
    pub fn request_key_press(&mut self, register: usize) {
        self.waiting = true;
        self.request_reg = register;
    }

    /// Takes the key that ended the last wait, if it has not been taken yet.
    pub fn request_response(&mut self) -> Option<KeyRequestResponse> {
        self.request_response.take()
    }

    /// Whether an `FX0A` is still waiting for a key.
    #[must_use]
    pub fn waiting(&self) -> bool {
        self.waiting
    }

    /// Checks that a pending or answered wait names one of the 16 registers.
    ///
    /// # Errors
    ///
    /// Returns [`Chip8Error::InvalidState`] if it names a register past `VF`.
    pub fn validate(&self) -> Result<(), Chip8Error> {
        let answered = self.request_response.map(|response| response.register);
        let out_of_range = |register: usize| register >= KEY_COUNT;
        if out_of_range(self.request_reg) || answered.is_some_and(out_of_range) {
            return Err(Chip8Error::InvalidState {
                reason: "key wait targets a register past VF",
            });
        }
        Ok(())
    }

    /// Returns whether the given key is currently pressed, or `None` if
    /// `key_code` is not a key on the keypad.
    #[must_use]
    pub fn is_key_pressed(&self, key_code: u8) -> Option<bool> {
        self.state.get(usize::from(key_code)).copied()
    }
}
