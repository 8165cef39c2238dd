use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::Context;
use chip8::{Chip8, Chip8Error, Quirks};
use egui::Color32;

use crate::{
    audio,
    cadence::TimerCadence,
    config::Args,
    gui::{self, Hotkey},
};

/// The driving loop: steps the [`Chip8`], ticks its timers, and connects it
/// to the window, keyboard and speaker.
pub struct App {
    chip8: Chip8,
    rom: Vec<u8>,
    audio: Option<audio::System>,
    cadence: TimerCadence,
    steps_per_frame: u32,
    /// The quirks chosen on the command line, kept across state loads.
    quirks: Quirks,
    state_file: PathBuf,
    paused: bool,
    /// The error that halted emulation, if any.
    fault: Option<Chip8Error>,
}

impl eframe::App for App {
    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        for hotkey in gui::hotkeys(ctx) {
            if hotkey == Hotkey::Quit {
                frame.close();
                return;
            }
            self.handle_hotkey(hotkey);
        }

        for (key_code, pressed) in gui::key_states(ctx) {
            self.chip8.update_key_state(key_code, pressed);
        }

        self.run_frame(Instant::now());

        if let Some(status) = self.status() {
            egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
                ui.colored_label(Color32::LIGHT_RED, status);
            });
        }
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| gui::draw_screen(ui, &self.chip8.bus.graphics));

        ctx.request_repaint();
    }
}

impl App {
    /// Creates a new [`App`] running `chip8`, which should already have
    /// `rom` loaded. Runs without sound if no audio device can be opened.
    #[must_use]
    pub fn new(chip8: Chip8, rom: Vec<u8>, args: &Args) -> Self {
        Self::with_audio(chip8, rom, args, Self::create_audio_system())
    }

    fn with_audio(chip8: Chip8, rom: Vec<u8>, args: &Args, audio: Option<audio::System>) -> Self {
        Self {
            chip8,
            rom,
            audio,
            cadence: TimerCadence::new(Instant::now()),
            steps_per_frame: args.steps_per_frame,
            quirks: args.quirks(),
            state_file: args.state_file(),
            paused: false,
            fault: None,
        }
    }

    /// Create a new [`audio::System`] and start its stream. Returns `None`
    /// after logging the reason if either step fails.
    fn create_audio_system() -> Option<audio::System> {
        audio::System::new()
            .and_then(|audio| audio.play().map(|_| audio))
            .map_err(|e| log::warn!("Running without sound: {e:#}"))
            .ok()
    }

    /// Run the instructions and timer ticks due for one frame rendered at `now`.
    fn run_frame(&mut self, now: Instant) {
        let ticks = self.cadence.ticks_due(now);
        if self.paused || self.fault.is_some() {
            return;
        }

        for _ in 0..self.steps_per_frame {
            if let Err(e) = self.chip8.step() {
                log::error!("Emulation halted at {:#05X}: {e}", self.chip8.processor.pc);
                self.fault = Some(e);
                return;
            }
        }

        for _ in 0..ticks {
            if self.chip8.tick_timers() {
                if let Some(audio) = &self.audio {
                    audio.beep();
                }
            }
        }
    }

    fn handle_hotkey(&mut self, hotkey: Hotkey) {
        match hotkey {
            Hotkey::Quit => {}
            Hotkey::TogglePause => self.paused = !self.paused,
            Hotkey::Reset => {
                if let Err(e) = self.chip8.reset_and_load(&self.rom) {
                    log::error!("Failed to reload ROM: {e}");
                }
                self.fault = None;
            }
            Hotkey::SaveState => match self.save_chip8(&self.state_file) {
                Ok(()) => log::info!("Saved state to {}", self.state_file.display()),
                Err(e) => log::error!(
                    "Failed to save Chip8 state to {}: {e:#}.",
                    self.state_file.display()
                ),
            },
            Hotkey::LoadState => match self.load_state() {
                Ok(()) => log::info!("Loaded state from {}", self.state_file.display()),
                Err(e) => log::error!(
                    "Failed to load Chip8 state from {}: {e:#}.",
                    self.state_file.display()
                ),
            },
        }
    }

    /// A line describing why the machine is not running, if it is not.
    fn status(&self) -> Option<String> {
        if let Some(fault) = &self.fault {
            Some(format!("Halted: {fault}. Press Backspace to reset."))
        } else if self.paused {
            Some("Paused".into())
        } else if self.chip8.is_waiting_for_key() {
            Some("Waiting for a key press".into())
        } else {
            None
        }
    }

    /// Replace the running machine with the one saved in the state file.
    /// On failure the running machine and any fault are left as they were.
    fn load_state(&mut self) -> anyhow::Result<()> {
        let mut chip8 = Self::load_chip8(&self.state_file)?;
        if chip8.processor.quirks != self.quirks {
            log::warn!(
                "State was saved with {:?}, continuing with {:?}",
                chip8.processor.quirks,
                self.quirks
            );
            chip8.processor.quirks = self.quirks;
        }
        self.chip8 = chip8;
        self.fault = None;
        Ok(())
    }

    /// Load [`Chip8`] state from the given `path`, rejecting states the
    /// machine could not have produced.
    fn load_chip8(path: impl AsRef<Path>) -> anyhow::Result<Chip8> {
        let bytes = std::fs::read(path)?;
        let chip8 = bincode::deserialize::<Chip8>(&bytes)?;
        chip8.validate().context("Corrupt state file")?;
        Ok(chip8)
    }

    /// Save [`Chip8`] state to a file specified by `path`.
    fn save_chip8(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let bytes = bincode::serialize(&self.chip8)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::Parser;

    use super::*;

    fn app(rom: &[u8], extra_args: &[&str]) -> App {
        let args =
            Args::try_parse_from(["chip8", "test.ch8"].iter().chain(extra_args)).unwrap();
        let mut chip8 = Chip8::with_quirks(args.quirks());
        chip8.load_rom(rom).unwrap();
        App::with_audio(chip8, rom.to_vec(), &args, None)
    }

    #[test]
    fn runs_steps_per_frame_instructions() {
        // V0 += 1 forever
        let mut app = app(&[0x70, 0x01, 0x12, 0x00], &["--steps-per-frame", "8"]);
        app.run_frame(Instant::now());
        assert_eq!(app.chip8.processor.v[0], 4);
    }

    #[test]
    fn paused_app_does_not_step() {
        let mut app = app(&[0x70, 0x01, 0x12, 0x00], &[]);
        app.handle_hotkey(Hotkey::TogglePause);
        app.run_frame(Instant::now());
        assert_eq!(app.chip8.processor.v[0], 0);
        assert_eq!(app.status().as_deref(), Some("Paused"));
    }

    #[test]
    fn stack_error_halts_until_reset() {
        let mut app = app(&[0x00, 0xEE], &[]);
        app.run_frame(Instant::now());
        assert_eq!(app.fault, Some(Chip8Error::StackUnderflow));
        assert_eq!(app.chip8.processor.pc, 0x202);

        app.run_frame(Instant::now());
        assert_eq!(app.chip8.processor.pc, 0x202);

        app.handle_hotkey(Hotkey::Reset);
        assert_eq!(app.fault, None);
        assert_eq!(app.chip8.processor.pc, 0x200);
    }

    #[test]
    fn timers_tick_with_wall_clock() {
        let mut app = app(&[0x12, 0x00], &[]);
        app.chip8.bus.clock.delay_timer = 10;
        let start = Instant::now();
        app.cadence = TimerCadence::new(start);
        app.run_frame(start + Duration::from_millis(60));
        assert_eq!(app.chip8.bus.clock.delay_timer, 7);
    }

    #[test]
    fn key_wait_keeps_frames_running() {
        let mut app = app(&[0xF1, 0x0A, 0x62, 0x01], &[]);
        app.run_frame(Instant::now());
        assert_eq!(app.status().as_deref(), Some("Waiting for a key press"));
        assert_eq!(app.chip8.processor.pc, 0x202);

        app.chip8.update_key_state(0x5, true);
        app.run_frame(Instant::now());
        assert_eq!(app.chip8.processor.v[1], 0x5);
        assert_eq!(app.chip8.processor.v[2], 0x1);
    }

    fn state_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("chip8-{}-{name}.state", std::process::id()))
    }

    fn app_with_state_file(rom: &[u8], name: &str, extra_args: &[&str]) -> App {
        let path = state_path(name);
        let path = path.to_str().unwrap();
        let mut args = vec!["--state-file", path];
        args.extend_from_slice(extra_args);
        app(rom, &args)
    }

    #[test]
    fn load_state_restores_saved_machine() {
        // V0 += 1, draw the digit in V0 at (V0, V0), loop
        let rom = [0x70, 0x01, 0xF0, 0x29, 0xD0, 0x05, 0x12, 0x00];
        let mut app = app_with_state_file(&rom, "round-trip", &[]);
        for _ in 0..6 {
            app.chip8.step().unwrap();
        }
        app.chip8.bus.clock.delay_timer = 30;
        app.chip8.bus.clock.sound_timer = 12;
        let saved = app.chip8.clone();
        app.handle_hotkey(Hotkey::SaveState);

        for _ in 0..9 {
            app.chip8.step().unwrap();
        }
        app.chip8.tick_timers();
        assert_ne!(app.chip8.processor.v, saved.processor.v);

        app.handle_hotkey(Hotkey::LoadState);
        assert_eq!(app.chip8.processor.pc, saved.processor.pc);
        assert_eq!(app.chip8.processor.i, saved.processor.i);
        assert_eq!(app.chip8.processor.v, saved.processor.v);
        assert_eq!(app.chip8.processor.stack, saved.processor.stack);
        assert_eq!(app.chip8.bus.clock.delay_timer, 30);
        assert_eq!(app.chip8.bus.clock.sound_timer, 12);
        assert!(app
            .chip8
            .bus
            .graphics
            .pixels()
            .eq(saved.bus.graphics.pixels()));

        std::fs::remove_file(state_path("round-trip")).unwrap();
    }

    #[test]
    fn missing_or_truncated_state_keeps_running_machine() {
        let _ = std::fs::remove_file(state_path("truncated"));
        let mut app = app_with_state_file(&[0x00, 0xEE], "truncated", &[]);
        app.run_frame(Instant::now());
        assert_eq!(app.fault, Some(Chip8Error::StackUnderflow));

        app.handle_hotkey(Hotkey::LoadState);
        assert_eq!(app.fault, Some(Chip8Error::StackUnderflow));
        assert_eq!(app.chip8.processor.pc, 0x202);

        let bytes = bincode::serialize(&Chip8::new()).unwrap();
        std::fs::write(state_path("truncated"), &bytes[..bytes.len() / 2]).unwrap();
        app.handle_hotkey(Hotkey::LoadState);
        assert_eq!(app.fault, Some(Chip8Error::StackUnderflow));
        assert_eq!(app.chip8.processor.pc, 0x202);

        std::fs::remove_file(state_path("truncated")).unwrap();
    }

    #[test]
    fn state_with_impossible_stack_depth_is_rejected() {
        // Call a subroutine that returns straight away
        let mut app = app_with_state_file(&[0x22, 0x04, 0x12, 0x00, 0x00, 0xEE], "depth", &[]);
        app.chip8.step().unwrap();
        assert_eq!(app.chip8.processor.stack.depth(), 1);

        // V0-VF, I and PC come before the 16 stack entries; bincode writes
        // the depth as a little-endian u64 after them.
        const DEPTH_OFFSET: usize = 16 + 2 + 2 + 16 * 2;
        let mut bytes = bincode::serialize(&app.chip8).unwrap();
        let depth = &mut bytes[DEPTH_OFFSET..DEPTH_OFFSET + 8];
        assert_eq!(depth, 1u64.to_le_bytes());
        depth.copy_from_slice(&17u64.to_le_bytes());
        std::fs::write(state_path("depth"), &bytes).unwrap();

        let err = App::load_chip8(state_path("depth")).err().unwrap();
        assert_eq!(
            err.downcast_ref::<Chip8Error>(),
            Some(&Chip8Error::InvalidState {
                reason: "stack depth exceeds 16"
            })
        );

        app.handle_hotkey(Hotkey::LoadState);
        assert_eq!(app.chip8.processor.stack.depth(), 1);
        app.chip8.step().unwrap();
        assert_eq!(app.chip8.processor.pc, 0x202);

        std::fs::remove_file(state_path("depth")).unwrap();
    }

    #[test]
    fn loading_state_keeps_command_line_quirks() {
        let rom = [0x12, 0x00];
        let mut saver = app_with_state_file(&rom, "quirks", &["--shift-quirk"]);
        saver.handle_hotkey(Hotkey::SaveState);

        let mut loader = app_with_state_file(&rom, "quirks", &[]);
        loader.handle_hotkey(Hotkey::LoadState);
        assert_eq!(loader.chip8.processor.quirks, Quirks::default());

        std::fs::remove_file(state_path("quirks")).unwrap();
    }
}
