//! Command line configuration for the emulator.

use std::path::PathBuf;

use chip8::Quirks;
use clap::Parser;

/// The amount of instructions executed per rendered frame by default.
pub const DEFAULT_STEPS_PER_FRAME: u32 = 10;

/// Run a CHIP-8 ROM.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the ROM file to run
    pub rom: PathBuf,

    /// Instructions executed per rendered frame
    #[arg(short, long, default_value_t = DEFAULT_STEPS_PER_FRAME)]
    pub steps_per_frame: u32,

    /// Shift VY into VX for 8XY6 and 8XYE instead of shifting VX in place
    #[arg(long)]
    pub shift_quirk: bool,

    /// Advance I past the copied registers for FX55 and FX65
    #[arg(long)]
    pub load_store_quirk: bool,

    /// Where F5 saves and F9 loads the machine state [default: <ROM>.state]
    #[arg(long)]
    pub state_file: Option<PathBuf>,
}

impl Args {
    /// The [`Quirks`] selected on the command line.
    #[must_use]
    pub fn quirks(&self) -> Quirks {
        Quirks {
            shift_uses_vy: self.shift_quirk,
            load_store_increments_i: self.load_store_quirk,
        }
    }

    /// The save state path, falling back to the ROM path with a `.state`
    /// extension.
    #[must_use]
    pub fn state_file(&self) -> PathBuf {
        self.state_file
            .clone()
            .unwrap_or_else(|| self.rom.with_extension("state"))
    }
}
