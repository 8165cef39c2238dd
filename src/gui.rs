//! The window contents: the keypad mapping read from egui input and the
//! painter that turns the display buffer into rectangles.

use chip8::graphics::{self, Buffer};
use egui::{Color32, Context, Key, Pos2, Rect, Rounding, Ui};

/// Key mapping from a standard english keyboard to Chip8 key codes.
static KEY_MAP: [(Key, u8); 16] = [
    (Key::Num1, 0x1),
    (Key::Num2, 0x2),
    (Key::Num3, 0x3),
    (Key::Num4, 0xC),
    (Key::Q, 0x4),
    (Key::W, 0x5),
    (Key::E, 0x6),
    (Key::R, 0xD),
    (Key::A, 0x7),
    (Key::S, 0x8),
    (Key::D, 0x9),
    (Key::F, 0xE),
    (Key::Z, 0xA),
    (Key::X, 0x0),
    (Key::C, 0xB),
    (Key::V, 0xF),
];

/// The colour of lit pixels.
pub const FOREGROUND: Color32 = Color32::WHITE;
/// The colour of unlit pixels.
pub const BACKGROUND: Color32 = Color32::BLACK;

/// Commands the user issued through hotkeys this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hotkey {
    /// Close the emulator.
    Quit,
    /// Toggle the paused state.
    TogglePause,
    /// Reset the machine and reload the ROM.
    Reset,
    /// Write the machine state to the state file.
    SaveState,
    /// Restore the machine state from the state file.
    LoadState,
}

static HOTKEYS: [(Key, Hotkey); 5] = [
    (Key::Escape, Hotkey::Quit),
    (Key::P, Hotkey::TogglePause),
    (Key::Backspace, Hotkey::Reset),
    (Key::F5, Hotkey::SaveState),
    (Key::F9, Hotkey::LoadState),
];

/// Reads the keypad state as `(key_code, pressed)` for all 16 keys.
pub fn key_states(ctx: &Context) -> Vec<(u8, bool)> {
    ctx.input(|input| {
        KEY_MAP
            .iter()
            .map(|(key, key_code)| (*key_code, input.keys_down.contains(key)))
            .collect()
    })
}

/// Returns the hotkeys pressed since the last frame.
pub fn hotkeys(ctx: &Context) -> Vec<Hotkey> {
    ctx.input(|input| {
        HOTKEYS
            .iter()
            .filter(|(key, _)| input.key_pressed(*key))
            .map(|(_, hotkey)| *hotkey)
            .collect()
    })
}

/// Draw the display buffer onto a `Ui` object, scaled to fill the rest of
/// the available space.
pub fn draw_screen(ui: &mut Ui, buffer: &Buffer) {
    let (rect, _) = ui.allocate_exact_size(
        ui.available_size(),
        egui::Sense::focusable_noninteractive(),
    );
    let pixel_width = rect.width() / graphics::WIDTH as f32;
    let pixel_height = rect.height() / graphics::HEIGHT as f32;

    let painter = ui.painter();
    painter.rect_filled(rect, Rounding::ZERO, BACKGROUND);
    for (x, y, _) in buffer.pixels().filter(|&(_, _, on)| on) {
        let min = Pos2 {
            x: rect.left() + x as f32 * pixel_width,
            y: rect.top() + y as f32 * pixel_height,
        };
        let max = Pos2 {
            x: min.x + pixel_width,
            y: min.y + pixel_height,
        };
        painter.rect_filled(Rect::from_min_max(min, max), Rounding::ZERO, FOREGROUND);
    }
}
