#![warn(clippy::all, rust_2018_idioms)]

use anyhow::Context;
use chip8::Chip8;
use chip8_host::{config::Args, App};
use clap::Parser;
use env_logger::{Builder, Target};

fn main() -> anyhow::Result<()> {
    // Log to stdout (if you run with `RUST_LOG=debug`).
    let mut builder = Builder::from_default_env();
    builder.target(Target::Stdout);
    builder.init();

    let args = Args::parse();

    let rom = std::fs::read(&args.rom)
        .with_context(|| format!("Failed to read ROM from {}", args.rom.display()))?;
    let mut chip8 = Chip8::with_quirks(args.quirks());
    chip8
        .load_rom(&rom)
        .with_context(|| format!("Failed to load ROM {}", args.rom.display()))?;
    log::info!("Loaded {} byte ROM from {}", rom.len(), args.rom.display());

    let app = App::new(chip8, rom, &args);
    let native_options = eframe::NativeOptions {
        initial_window_size: Some(egui::vec2(640.0, 320.0)),
        ..Default::default()
    };
    eframe::run_native("Chip8", native_options, Box::new(|_cc| Box::new(app)))
        .map_err(|e| anyhow::anyhow!("Failed to run the emulator window: {e}"))
}
