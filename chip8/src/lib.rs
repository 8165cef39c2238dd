//! A CHIP-8 virtual machine. The crate holds the machine state and the
//! fetch-decode-execute engine and nothing else: rendering the display
//! buffer, reading a keyboard, playing the beep and pacing the timers are
//! left to the host that drives [`Chip8`].
//!
//! A host calls [`Chip8::step`] as often as it likes and
//! [`Chip8::tick_timers`] at 60Hz, feeding key changes in through
//! [`Chip8::update_key_state`] in between.

use crate::processor::Cpu;

pub mod clock;
pub mod error;
pub mod graphics;
pub mod input;
pub mod memory;
pub mod processor;
pub mod stack;

pub use error::Chip8Error;
pub use processor::Quirks;

/// The [`Bus`] struct contains fields for different components of a computer system
#[derive(Default, Clone)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct Bus {
    /// An instance of the [`clock::Clock`] struct, which holds the delay and
    /// sound timers.
    pub clock: clock::Clock,

    /// An instance of the [`graphics::Buffer`] struct, which represents the
    /// display buffer of the computer. This is used to store the contents
    /// of the screen and update it as necessary.
    pub graphics: graphics::Buffer,

    /// An instance of the [`input::Input`] struct, which represents the
    /// keypad of the computer.
    pub input: input::Input,

    /// An instance of the [`memory::Memory`] struct, which represents the
    /// memory of the computer. This is used to store the instructions and
    /// data that the processor needs to execute.
    pub memory: memory::Memory,
}

/// The [`Chip8`] struct represents a computer system that uses the Chip-8 virtual machine.
#[derive(Default, Clone)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct Chip8 {
    /// An instance of the [`Cpu`] struct, which represents the CPU of
    /// the system. This is responsible for executing the instructions in
    /// memory.
    pub processor: Cpu,

    /// An instance of the [`Bus`] struct, which represents the different
    /// components of the system. This is used to connect the CPU to the other
    /// components of the system and facilitate communication between them.
    pub bus: Bus,
}

impl Chip8 {
    /// Creates a new instance of the [`Chip8`] struct in its power-on state:
    /// font loaded, everything else zeroed and the program counter at the
    /// program start.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new [`Chip8`] emulating the given [`Quirks`].
    #[must_use]
    pub fn with_quirks(quirks: Quirks) -> Self {
        let mut chip8 = Self::new();
        chip8.processor.quirks = quirks;
        chip8
    }

    /// Executes one instruction cycle of the Chip-8 CPU. While the CPU waits
    /// for a key press this does nothing.
    ///
    /// # Errors
    ///
    /// Returns the [`Chip8Error`] of an unbalanced call or return. The machine
    /// should not be stepped any further after an error.
    pub fn step(&mut self) -> Result<(), Chip8Error> {
        self.processor.cycle(&mut self.bus)
    }

    /// Advances the delay and sound timers by one 60Hz tick.
    ///
    /// Returns `true` if a beep should be played.
    pub fn tick_timers(&mut self) -> bool {
        self.bus.clock.tick()
    }

    /// Loads the given ROM into memory at the program start. This method is
    /// called to load a Chip-8 ROM into the memory before executing it.
    ///
    /// # Errors
    ///
    /// Returns [`Chip8Error::RomTooLarge`] if the ROM does not fit.
    pub fn load_rom(&mut self, data: &[u8]) -> Result<(), Chip8Error> {
        self.bus.memory.load_rom(data)
    }

    /// Updates the state of a key on the input device. Takes in a [`u8`] representing the
    /// key code and a boolean `pressed` indicating whether the key is pressed or released.
    /// This method is called to handle keyboard input events.
    ///
    /// # Arguments
    ///
    /// * `key_code`: A [`u8`] representing the key code of the pressed or released key.
    /// * `pressed`: A boolean indicating whether the key is pressed ([`true`]) or released ([`false`]).
    pub fn update_key_state(&mut self, key_code: u8, pressed: bool) {
        self.bus.input.update(key_code, pressed);
    }

    /// Returns whether the CPU is blocked on an `FX0A` key wait.
    #[must_use]
    pub fn is_waiting_for_key(&self) -> bool {
        self.bus.input.waiting()
    }

    /// Checks a [`Chip8`] that was restored from outside, such as a save
    /// state, for values that would make [`Chip8::step`] misbehave.
    ///
    /// # Errors
    ///
    /// Returns [`Chip8Error::InvalidState`] describing the first bad value.
    pub fn validate(&self) -> Result<(), Chip8Error> {
        self.processor.validate()?;
        self.bus.input.validate()
    }

    /// Resets the state of the Chip8 system to power-on, keeping the
    /// configured quirks. Any pending key wait is dropped, so a ROM has to be
    /// loaded again before stepping.
    pub fn reset(&mut self) {
        let quirks = self.processor.quirks;
        *self = Self::with_quirks(quirks);
    }

    /// The `reset_and_load` method is a convenience method that resets the
    /// state of the Chip8 system using the `reset` method and then loads the given
    /// ROM data into the system using the `load_rom` method.
    ///
    /// # Errors
    ///
    /// Returns [`Chip8Error::RomTooLarge`] if the ROM does not fit.
    pub fn reset_and_load(&mut self, data: &[u8]) -> Result<(), Chip8Error> {
        self.reset();
        self.load_rom(data)
    }
}
